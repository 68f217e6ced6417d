//! Request metrics for the transliteration service.
//!
//! Tracks:
//! - Phrase latency samples (mean and percentiles)
//! - Token counts split by outcome (model, retained, fallback)

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

const MAX_SAMPLES: usize = 1000;

/// Per-request token tally reported to the collector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenTally {
    pub transliterated: u64,
    pub retained: u64,
    pub fallbacks: u64,
}

impl TokenTally {
    pub fn total(&self) -> u64 {
        self.transliterated + self.retained + self.fallbacks
    }
}

#[derive(Debug)]
pub struct MetricsCollector {
    /// Request latency samples in milliseconds
    latency_samples: RwLock<VecDeque<f64>>,
    total_requests: AtomicU64,
    /// Requests whose phrase provenance degraded to `stub`
    degraded_requests: AtomicU64,
    total_tokens: AtomicU64,
    transliterated_tokens: AtomicU64,
    retained_tokens: AtomicU64,
    fallback_tokens: AtomicU64,
    total_processing_time_us: AtomicU64,
    start_time: Instant,
    max_samples: usize,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            latency_samples: RwLock::new(VecDeque::with_capacity(MAX_SAMPLES)),
            total_requests: AtomicU64::new(0),
            degraded_requests: AtomicU64::new(0),
            total_tokens: AtomicU64::new(0),
            transliterated_tokens: AtomicU64::new(0),
            retained_tokens: AtomicU64::new(0),
            fallback_tokens: AtomicU64::new(0),
            total_processing_time_us: AtomicU64::new(0),
            start_time: Instant::now(),
            max_samples: MAX_SAMPLES,
        }
    }

    /// Record a completed phrase request.
    pub async fn record_request(&self, latency: Duration, tally: TokenTally) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if tally.fallbacks > 0 {
            self.degraded_requests.fetch_add(1, Ordering::Relaxed);
        }
        self.total_tokens.fetch_add(tally.total(), Ordering::Relaxed);
        self.transliterated_tokens
            .fetch_add(tally.transliterated, Ordering::Relaxed);
        self.retained_tokens
            .fetch_add(tally.retained, Ordering::Relaxed);
        self.fallback_tokens
            .fetch_add(tally.fallbacks, Ordering::Relaxed);
        self.total_processing_time_us
            .fetch_add(latency.as_micros() as u64, Ordering::Relaxed);

        let mut samples = self.latency_samples.write().await;
        if samples.len() >= self.max_samples {
            samples.pop_front();
        }
        samples.push_back(latency.as_secs_f64() * 1000.0);
    }

    pub async fn snapshot(&self) -> MetricsSnapshot {
        let latency_samples = self.latency_samples.read().await;
        let total_requests = self.total_requests.load(Ordering::Relaxed);
        let uptime = self.start_time.elapsed().as_secs_f64();

        MetricsSnapshot {
            uptime_secs: uptime,
            total_requests,
            degraded_requests: self.degraded_requests.load(Ordering::Relaxed),
            total_tokens: self.total_tokens.load(Ordering::Relaxed),
            transliterated_tokens: self.transliterated_tokens.load(Ordering::Relaxed),
            retained_tokens: self.retained_tokens.load(Ordering::Relaxed),
            fallback_tokens: self.fallback_tokens.load(Ordering::Relaxed),
            total_processing_time_secs: self.total_processing_time_us.load(Ordering::Relaxed)
                as f64
                / 1_000_000.0,
            avg_latency_ms: compute_mean(&latency_samples),
            p50_latency_ms: compute_percentile(&latency_samples, 0.50),
            p90_latency_ms: compute_percentile(&latency_samples, 0.90),
            p99_latency_ms: compute_percentile(&latency_samples, 0.99),
            requests_per_sec: if uptime > 0.0 {
                total_requests as f64 / uptime
            } else {
                0.0
            },
        }
    }

    pub async fn reset(&self) {
        for counter in [
            &self.total_requests,
            &self.degraded_requests,
            &self.total_tokens,
            &self.transliterated_tokens,
            &self.retained_tokens,
            &self.fallback_tokens,
            &self.total_processing_time_us,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        self.latency_samples.write().await.clear();
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: f64,
    pub total_requests: u64,
    pub degraded_requests: u64,
    pub total_tokens: u64,
    pub transliterated_tokens: u64,
    pub retained_tokens: u64,
    pub fallback_tokens: u64,
    pub total_processing_time_secs: f64,
    pub avg_latency_ms: f64,
    pub p50_latency_ms: f64,
    pub p90_latency_ms: f64,
    pub p99_latency_ms: f64,
    pub requests_per_sec: f64,
}

/// Timer for tracking request latency.
pub struct RequestTimer {
    start: Instant,
    metrics: Arc<MetricsCollector>,
}

impl RequestTimer {
    pub fn start(metrics: Arc<MetricsCollector>) -> Self {
        Self {
            start: Instant::now(),
            metrics,
        }
    }

    /// Stop the timer and record the request.
    pub async fn stop(self, tally: TokenTally) {
        let latency = self.start.elapsed();
        self.metrics.record_request(latency, tally).await;
    }
}

fn compute_mean(samples: &VecDeque<f64>) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

fn compute_percentile(samples: &VecDeque<f64>, percentile: f64) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    let mut sorted: Vec<f64> = samples.iter().copied().collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let index = ((percentile * sorted.len() as f64) as usize).min(sorted.len() - 1);
    sorted[index]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_metrics_collector() {
        let collector = MetricsCollector::new();

        collector
            .record_request(
                Duration::from_millis(10),
                TokenTally {
                    transliterated: 2,
                    retained: 1,
                    fallbacks: 0,
                },
            )
            .await;
        collector
            .record_request(
                Duration::from_millis(30),
                TokenTally {
                    transliterated: 0,
                    retained: 0,
                    fallbacks: 3,
                },
            )
            .await;

        let snapshot = collector.snapshot().await;
        assert_eq!(snapshot.total_requests, 2);
        assert_eq!(snapshot.degraded_requests, 1);
        assert_eq!(snapshot.total_tokens, 6);
        assert_eq!(snapshot.fallback_tokens, 3);
        assert!((snapshot.avg_latency_ms - 20.0).abs() < 1e-6);

        collector.reset().await;
        let snapshot = collector.snapshot().await;
        assert_eq!(snapshot.total_requests, 0);
        assert_eq!(snapshot.avg_latency_ms, 0.0);
    }

    #[test]
    fn test_percentile() {
        let samples: VecDeque<f64> = (1..=100).map(|i| i as f64).collect();

        assert!((compute_percentile(&samples, 0.50) - 50.0).abs() < 2.0);
        assert!((compute_percentile(&samples, 0.90) - 90.0).abs() < 2.0);
        assert_eq!(compute_percentile(&VecDeque::new(), 0.5), 0.0);
    }
}
