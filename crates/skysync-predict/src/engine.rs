use crate::heuristic::predict;
use crate::types::{ConfidenceBand, PredictionInput, PredictionResult};
use skysync_core::PredictionConfig;
use std::time::Duration;
use tracing::instrument;

/// Runs the heuristic behind a configurable artificial delay
#[derive(Debug, Clone)]
pub struct PredictionEngine {
    latency: Duration,
    band: ConfidenceBand,
}

impl Default for PredictionEngine {
    fn default() -> Self {
        Self::new(&PredictionConfig::default())
    }
}

impl PredictionEngine {
    pub fn new(config: &PredictionConfig) -> Self {
        Self {
            latency: Duration::from_millis(config.latency_millis),
            band: ConfidenceBand::new(config.confidence_min, config.confidence_max),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    pub fn band(&self) -> ConfidenceBand {
        self.band
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn run(&self, input: &PredictionInput) -> PredictionResult {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let result = predict(input, &mut rand::thread_rng(), self.band);
        tracing::info!(
            "Predicted {} ({:.0}% confidence)",
            result.condition,
            result.confidence * 100.0
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skysync_weather::Condition;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_run_waits_for_configured_latency() {
        let engine = PredictionEngine::new(&PredictionConfig {
            latency_millis: 1500,
            ..Default::default()
        });

        let start = Instant::now();
        let result = engine.run(&PredictionInput::default()).await;

        assert!(start.elapsed() >= Duration::from_millis(1500));
        assert_eq!(result.condition, Condition::Cloudy);
        assert!(engine.band().contains(result.confidence));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_latency_returns_immediately() {
        let engine = PredictionEngine::default().with_latency(Duration::ZERO);
        let start = Instant::now();
        engine.run(&PredictionInput::default()).await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_band_from_config() {
        let engine = PredictionEngine::new(&PredictionConfig {
            latency_millis: 0,
            confidence_min: 0.5,
            confidence_max: 0.6,
        });
        assert_eq!(engine.band(), ConfidenceBand::new(0.5, 0.6));
        assert_eq!(engine.latency(), Duration::ZERO);
    }
}
