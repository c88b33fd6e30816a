//! JSON-lines request handling for the serving binary

use crate::adapter::ConversationalProfile;
use crate::metrics::PredictionMetrics;
use crate::models::inference::InferenceEngine;
use crate::types::prediction::{ConversationalPrediction, PredictionResult};
use crate::types::record::ApplicantRecord;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

/// One request line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ServingRequest {
    /// Full applicant record, dataset or short field names
    Technical(ApplicantRecord),
    /// Sparse profile; grant year comes from the reference year
    Conversational(ConversationalProfile),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictionPayload {
    Technical(PredictionResult),
    Conversational(ConversationalPrediction),
}

/// One response line; `line` echoes the 1-based request line number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ServingResponse {
    Ok {
        line: usize,
        prediction: PredictionPayload,
    },
    Error {
        line: usize,
        kind: String,
        message: String,
    },
}

impl ServingResponse {
    pub fn line(&self) -> usize {
        match self {
            ServingResponse::Ok { line, .. } | ServingResponse::Error { line, .. } => *line,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ServingResponse::Ok { .. })
    }
}

/// Handle one raw input line. Bytes that are not UTF-8 get a `bad_request`
/// response like any other malformed request.
pub fn handle_raw_line(
    engine: &InferenceEngine,
    metrics: &PredictionMetrics,
    line: usize,
    input: &[u8],
) -> Option<ServingResponse> {
    match std::str::from_utf8(input) {
        Ok(text) => handle_line(engine, metrics, line, text),
        Err(e) => {
            metrics.record_failure("bad_request", Duration::ZERO);
            Some(ServingResponse::Error {
                line,
                kind: "bad_request".to_string(),
                message: format!("request is not valid UTF-8: {}", e),
            })
        }
    }
}

/// Handle one input line. Blank lines produce no response.
pub fn handle_line(
    engine: &InferenceEngine,
    metrics: &PredictionMetrics,
    line: usize,
    input: &str,
) -> Option<ServingResponse> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    let started = Instant::now();

    let request: ServingRequest = match serde_json::from_str(input) {
        Ok(request) => request,
        Err(e) => {
            metrics.record_failure("bad_request", started.elapsed());
            return Some(ServingResponse::Error {
                line,
                kind: "bad_request".to_string(),
                message: e.to_string(),
            });
        }
    };

    let outcome = match &request {
        ServingRequest::Technical(record) => engine
            .predict(record)
            .map(|r| (PredictionPayload::Technical(r.clone()), r)),
        ServingRequest::Conversational(profile) => engine
            .predict(&profile.to_applicant_record(engine.reference_year()))
            .map(|r| (PredictionPayload::Conversational(r.to_conversational()), r)),
    };

    let response = match outcome {
        Ok((prediction, result)) => {
            metrics.record_prediction(started.elapsed(), &result);
            ServingResponse::Ok { line, prediction }
        }
        Err(e) => {
            metrics.record_failure(e.kind(), started.elapsed());
            ServingResponse::Error {
                line,
                kind: e.kind().to_string(),
                message: e.to_string(),
            }
        }
    };

    debug!(line = line, ok = response.is_ok(), "Request handled");
    Some(response)
}
