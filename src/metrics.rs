//! Serving metrics: prediction counts, latency and probability distribution.

use crate::types::prediction::{ConfidenceTier, Label, PredictionResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Latency samples kept before the oldest half is discarded
const MAX_LATENCY_SAMPLES: usize = 10_000;

/// Metrics collector for the serving loop
pub struct PredictionMetrics {
    /// Successful predictions
    pub predictions_served: AtomicU64,
    /// Requests that ended in an error response
    pub requests_failed: AtomicU64,
    failures_by_kind: RwLock<HashMap<String, u64>>,
    by_label: RwLock<HashMap<Label, u64>>,
    by_tier: RwLock<HashMap<ConfidenceTier, u64>>,
    /// Latencies in microseconds
    latencies: RwLock<Vec<u64>>,
    /// P(INTEGRAL) histogram, ten buckets of width 0.1
    integral_buckets: RwLock<[u64; 10]>,
    start_time: Instant,
}

impl PredictionMetrics {
    pub fn new() -> Self {
        Self {
            predictions_served: AtomicU64::new(0),
            requests_failed: AtomicU64::new(0),
            failures_by_kind: RwLock::new(HashMap::new()),
            by_label: RwLock::new(HashMap::new()),
            by_tier: RwLock::new(HashMap::new()),
            latencies: RwLock::new(Vec::with_capacity(1000)),
            integral_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record a successful prediction
    pub fn record_prediction(&self, latency: Duration, result: &PredictionResult) {
        self.predictions_served.fetch_add(1, Ordering::Relaxed);
        self.record_latency(latency);

        if let Ok(mut by_label) = self.by_label.write() {
            *by_label.entry(result.label).or_insert(0) += 1;
        }
        if let Ok(mut by_tier) = self.by_tier.write() {
            *by_tier.entry(result.confidence).or_insert(0) += 1;
        }

        let bucket = (result.proba_integral.clamp(0.0, 1.0) * 10.0).min(9.0) as usize;
        if let Ok(mut buckets) = self.integral_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    /// Record a failed request by error kind
    pub fn record_failure(&self, kind: &str, latency: Duration) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
        self.record_latency(latency);

        if let Ok(mut by_kind) = self.failures_by_kind.write() {
            *by_kind.entry(kind.to_string()).or_insert(0) += 1;
        }
    }

    fn record_latency(&self, latency: Duration) {
        if let Ok(mut times) = self.latencies.write() {
            times.push(latency.as_micros() as u64);
            if times.len() > MAX_LATENCY_SAMPLES {
                times.drain(0..MAX_LATENCY_SAMPLES / 2);
            }
        }
    }

    pub fn get_latency_stats(&self) -> LatencyStats {
        let mut sorted = match self.latencies.read() {
            Ok(times) if !times.is_empty() => times.clone(),
            _ => return LatencyStats::default(),
        };
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();
        let at = |q: f64| sorted[((count as f64 * q) as usize).min(count - 1)];

        LatencyStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: at(0.5),
            p95_us: at(0.95),
            p99_us: at(0.99),
            max_us: sorted[count - 1],
        }
    }

    /// Requests per second since startup
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let total = self.predictions_served.load(Ordering::Relaxed)
            + self.requests_failed.load(Ordering::Relaxed);
        if elapsed > 0.0 {
            total as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn get_label_counts(&self) -> HashMap<Label, u64> {
        self.by_label.read().map(|m| m.clone()).unwrap_or_default()
    }

    pub fn get_tier_counts(&self) -> HashMap<ConfidenceTier, u64> {
        self.by_tier.read().map(|m| m.clone()).unwrap_or_default()
    }

    pub fn get_failures_by_kind(&self) -> HashMap<String, u64> {
        self.failures_by_kind
            .read()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    pub fn get_integral_distribution(&self) -> [u64; 10] {
        self.integral_buckets.read().map(|b| *b).unwrap_or([0; 10])
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let served = self.predictions_served.load(Ordering::Relaxed);
        let failed = self.requests_failed.load(Ordering::Relaxed);
        let latency = self.get_latency_stats();
        let labels = self.get_label_counts();
        let tiers = self.get_tier_counts();

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║          AWARD PREDICTION SERVICE - METRICS SUMMARY          ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Predictions Served: {:>8}  │  Throughput: {:>7.1} req/s   ║",
            served,
            self.get_throughput()
        );
        info!("║ Failed Requests:    {:>8}                                 ║", failed);
        for (kind, count) in self.get_failures_by_kind() {
            info!("║   {:16}: {:>6}                                    ║", kind, count);
        }
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Latency (μs): mean={:>6} p50={:>6} p95={:>6} p99={:>6}     ║",
            latency.mean_us, latency.p50_us, latency.p95_us, latency.p99_us
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        for label in Label::ALL {
            let count = labels.get(&label).copied().unwrap_or(0);
            info!("║ {:10}: {:>6} ({:>5.1}%)                                   ║", label.as_str(), count, percent(count, served));
        }
        for tier in [ConfidenceTier::High, ConfidenceTier::Medium, ConfidenceTier::Low] {
            let count = tiers.get(&tier).copied().unwrap_or(0);
            info!("║ confidence {:6}: {:>6} ({:>5.1}%)                           ║", tier.as_str(), count, percent(count, served));
        }
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ P(INTEGRAL) Distribution:                                    ║");
        for (i, &count) in self.get_integral_distribution().iter().enumerate() {
            let pct = percent(count, served);
            let bar: String = "█".repeat(((pct / 2.0) as usize).min(20));
            info!(
                "║   {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                pct,
                bar
            );
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

impl Default for PredictionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn percent(count: u64, total: u64) -> f64 {
    if total > 0 {
        count as f64 / total as f64 * 100.0
    } else {
        0.0
    }
}

/// Request latency statistics
#[derive(Debug, Default)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Periodic metrics reporter
pub struct MetricsReporter {
    metrics: Arc<PredictionMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<PredictionMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs.max(1)));
        // first tick fires immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let metrics = PredictionMetrics::new();

        metrics.record_prediction(
            Duration::from_micros(100),
            &PredictionResult::new(Label::Integral, 0.95, 0.05),
        );
        metrics.record_prediction(
            Duration::from_micros(300),
            &PredictionResult::new(Label::Parcial, 0.45, 0.55),
        );
        metrics.record_failure("invalid_input", Duration::from_micros(10));

        assert_eq!(metrics.predictions_served.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.requests_failed.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.get_label_counts().get(&Label::Integral), Some(&1));
        assert_eq!(metrics.get_tier_counts().get(&ConfidenceTier::Low), Some(&1));
        assert_eq!(metrics.get_failures_by_kind().get("invalid_input"), Some(&1));

        let dist = metrics.get_integral_distribution();
        assert_eq!(dist[9], 1);
        assert_eq!(dist[4], 1);
    }

    #[test]
    fn test_latency_stats() {
        let metrics = PredictionMetrics::new();
        assert_eq!(metrics.get_latency_stats().count, 0);

        for us in [10, 20, 30, 40] {
            metrics.record_failure("not_loaded", Duration::from_micros(us));
        }
        let stats = metrics.get_latency_stats();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean_us, 25);
        assert_eq!(stats.p50_us, 30);
        assert_eq!(stats.max_us, 40);
    }

    #[test]
    fn test_probability_one_lands_in_last_bucket() {
        let metrics = PredictionMetrics::new();
        metrics.record_prediction(
            Duration::from_micros(1),
            &PredictionResult::new(Label::Integral, 1.0, 0.0),
        );
        assert_eq!(metrics.get_integral_distribution()[9], 1);
    }
}
