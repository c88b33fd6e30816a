//! Labels, confidence tiers and prediction results

use crate::preprocessing::text::normalize_text;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scholarship award class
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Label {
    /// Full award
    Integral,
    /// Partial award
    Parcial,
}

impl Label {
    pub const ALL: [Label; 2] = [Label::Integral, Label::Parcial];

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Integral => "INTEGRAL",
            Label::Parcial => "PARCIAL",
        }
    }

    /// Map raw target text to a label by substring match on the normalized
    /// text. Anything matching neither label is `None`.
    pub fn from_target_text(raw: &str) -> Option<Self> {
        let normalized = normalize_text(raw);
        if normalized.contains("INTEGRAL") {
            Some(Label::Integral)
        } else if normalized.contains("PARCIAL") {
            Some(Label::Parcial)
        } else {
            None
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How decisive a prediction's probability split is. Says nothing about
/// whether the prediction is correct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    /// Tier from the absolute probability gap, in percentage points:
    /// `> 40` high, `> 20` medium, otherwise low.
    pub fn from_probabilities(proba_integral: f64, proba_parcial: f64) -> Self {
        let gap = (proba_integral - proba_parcial).abs() * 100.0;
        if gap > 40.0 {
            ConfidenceTier::High
        } else if gap > 20.0 {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }

    /// Portuguese label used in conversational responses
    pub fn localized(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "ALTA",
            ConfidenceTier::Medium => "MÉDIA",
            ConfidenceTier::Low => "BAIXA",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "HIGH",
            ConfidenceTier::Medium => "MEDIUM",
            ConfidenceTier::Low => "LOW",
        }
    }
}

/// Outcome of a single prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub label: Label,
    /// P(INTEGRAL), 0.5 when the classifier does not know the class
    pub proba_integral: f64,
    /// P(PARCIAL), 0.5 when the classifier does not know the class
    pub proba_parcial: f64,
    pub confidence: ConfidenceTier,
}

impl PredictionResult {
    pub fn new(label: Label, proba_integral: f64, proba_parcial: f64) -> Self {
        Self {
            label,
            proba_integral,
            proba_parcial,
            confidence: ConfidenceTier::from_probabilities(proba_integral, proba_parcial),
        }
    }

    /// Probability assigned to the predicted label
    pub fn label_probability(&self) -> f64 {
        match self.label {
            Label::Integral => self.proba_integral,
            Label::Parcial => self.proba_parcial,
        }
    }

    /// Humanized message for conversational clients
    pub fn to_message(&self) -> String {
        let kind = match self.label {
            Label::Integral => "INTEGRAL (100%)",
            Label::Parcial => "PARCIAL (50%)",
        };
        format!(
            "Com base no seu perfil, você tem {:.1}% de chance de conseguir uma bolsa {} no PROUNI. \
             A confiança desta predição é {}.",
            self.label_probability() * 100.0,
            kind,
            self.confidence.localized().to_lowercase()
        )
    }

    pub fn to_conversational(&self) -> ConversationalPrediction {
        ConversationalPrediction {
            tipo_bolsa: self.label,
            probabilidade_integral: round_percent(self.proba_integral),
            probabilidade_parcial: round_percent(self.proba_parcial),
            confianca: self.confidence.localized().to_string(),
            mensagem: self.to_message(),
        }
    }
}

/// Conversational response: percentages and a ready-to-present message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationalPrediction {
    pub tipo_bolsa: Label,
    /// Chance of a full award, 0 to 100
    pub probabilidade_integral: f64,
    /// Chance of a partial award, 0 to 100
    pub probabilidade_parcial: f64,
    pub confianca: String,
    pub mensagem: String,
}

fn round_percent(p: f64) -> f64 {
    (p * 1000.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_from_target_text() {
        assert_eq!(Label::from_target_text("BOLSA INTEGRAL"), Some(Label::Integral));
        assert_eq!(Label::from_target_text("bolsa parcial 50%"), Some(Label::Parcial));
        assert_eq!(Label::from_target_text("Integral"), Some(Label::Integral));
        assert_eq!(Label::from_target_text("COMPLEMENTAR"), None);
        assert_eq!(Label::from_target_text(""), None);
    }

    #[test]
    fn test_confidence_tiers() {
        assert_eq!(ConfidenceTier::from_probabilities(0.95, 0.05), ConfidenceTier::High);
        assert_eq!(ConfidenceTier::from_probabilities(0.65, 0.35), ConfidenceTier::Medium);
        assert_eq!(ConfidenceTier::from_probabilities(0.55, 0.45), ConfidenceTier::Low);
        assert_eq!(ConfidenceTier::from_probabilities(0.05, 0.95), ConfidenceTier::High);
        assert_eq!(ConfidenceTier::from_probabilities(0.5, 0.5), ConfidenceTier::Low);
    }

    #[test]
    fn test_message_uses_predicted_class_probability() {
        let result = PredictionResult::new(Label::Parcial, 0.2, 0.8);
        assert_eq!(result.confidence, ConfidenceTier::High);
        let message = result.to_message();
        assert!(message.contains("80.0%"));
        assert!(message.contains("PARCIAL (50%)"));
        assert!(message.contains("alta"));
    }

    #[test]
    fn test_conversational_rounding() {
        let conv = PredictionResult::new(Label::Integral, 0.61234, 0.38766).to_conversational();
        assert_eq!(conv.probabilidade_integral, 61.2);
        assert_eq!(conv.probabilidade_parcial, 38.8);
        assert_eq!(conv.confianca, "MÉDIA");
    }

    #[test]
    fn test_serialization() {
        let result = PredictionResult::new(Label::Integral, 0.9, 0.1);
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"label\":\"INTEGRAL\""));
        assert!(json.contains("\"confidence\":\"HIGH\""));
        let back: PredictionResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
