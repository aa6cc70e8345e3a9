use std::time::Duration;

/// Tunables shared across the pipeline stages and the scheduler, sourced from
/// the environment variables listed in spec §6. Each stage-specific crate
/// consumes the subset it needs; `fishsub-server::Args` is the single place
/// all of these are parsed from `clap`/env.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub max_classify_workers: usize,
    pub max_extract_workers: usize,
    pub ia_max_in_flight: usize,
    pub ia_timeout: Duration,
    pub retry_max_attempts: u32,
    pub retry_initial: Duration,
    pub retry_max: Duration,
    pub max_upload_bytes: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_classify_workers: 4,
            max_extract_workers: 6,
            ia_max_in_flight: 4,
            ia_timeout: Duration::from_secs(30),
            retry_max_attempts: 3,
            retry_initial: Duration::from_millis(500),
            retry_max: Duration::from_secs(8),
            max_upload_bytes: 25 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub batch_size: i64,
    pub stale_after_days: i64,
    pub external_rpm: u32,
    pub lock_ttl: Duration,
    pub timezone: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            batch_size: 20,
            stale_after_days: 3,
            external_rpm: 60,
            lock_ttl: Duration::from_secs(30 * 60),
            timezone: "America/Sao_Paulo".to_string(),
        }
    }
}

impl SchedulerConfig {
    /// Minimum interval enforced between outbound provider calls (spec §4.8).
    pub fn min_call_interval(&self) -> Duration {
        Duration::from_secs_f64(60.0 / self.external_rpm as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_pipeline_config_matches_spec_defaults() {
        let c = PipelineConfig::default();
        assert_eq!(c.max_classify_workers, 4);
        assert_eq!(c.max_extract_workers, 6);
        assert_eq!(c.ia_max_in_flight, 4);
        assert_eq!(c.retry_max_attempts, 3);
        assert_eq!(c.max_upload_bytes, 25 * 1024 * 1024);
    }

    #[test]
    fn scheduler_min_interval_is_one_second_at_default_rpm() {
        let c = SchedulerConfig::default();
        assert_eq!(c.min_call_interval(), Duration::from_secs(1));
    }
}
