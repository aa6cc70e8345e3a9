use once_cell::sync::Lazy;
use prometheus::{IntCounter, IntCounterVec, Opts, Registry};

/// Process-wide metrics registry (C10). Lazily initialised behind a one-shot
/// lock: counters are registered once and referenced by `'static` handles
/// from every stage.
pub struct Metrics {
    pub registry: Registry,
    pub retries_classify: IntCounter,
    pub retries_extract: IntCounter,
    pub retries_evaluate: IntCounter,
    pub document_classification_errors: IntCounter,
    pub legal_case_sync_runs: IntCounter,
    pub legal_case_sync_updated: IntCounter,
    pub legal_case_sync_skipped: IntCounter,
    pub legal_case_sync_errors: IntCounter,
    pub genai_calls: IntCounterVec,
}

impl Metrics {
    fn new() -> Self {
        let registry = Registry::new();

        let retries_classify =
            IntCounter::new("retries_classify", "GenAI classify retries").unwrap();
        let retries_extract =
            IntCounter::new("retries_extract", "GenAI extract retries").unwrap();
        let retries_evaluate =
            IntCounter::new("retries_evaluate", "GenAI evaluate retries").unwrap();
        let document_classification_errors = IntCounter::new(
            "document_classification_errors",
            "Per-document classification failures swallowed by C5",
        )
        .unwrap();
        let legal_case_sync_runs =
            IntCounter::new("legal_case_sync_runs", "Legal case sync job invocations").unwrap();
        let legal_case_sync_updated =
            IntCounter::new("legal_case_sync_updated", "Legal cases updated by sync").unwrap();
        let legal_case_sync_skipped =
            IntCounter::new("legal_case_sync_skipped", "Legal cases skipped by sync (no hit)")
                .unwrap();
        let legal_case_sync_errors =
            IntCounter::new("legal_case_sync_errors", "Legal case sync per-case errors").unwrap();
        let genai_calls = IntCounterVec::new(
            Opts::new("genai_calls_total", "GenAI calls by operation and outcome"),
            &["operation", "outcome"],
        )
        .unwrap();

        for c in [
            &retries_classify,
            &retries_extract,
            &retries_evaluate,
            &document_classification_errors,
            &legal_case_sync_runs,
            &legal_case_sync_updated,
            &legal_case_sync_skipped,
            &legal_case_sync_errors,
        ] {
            registry.register(Box::new(c.clone())).unwrap();
        }
        registry.register(Box::new(genai_calls.clone())).unwrap();

        Self {
            registry,
            retries_classify,
            retries_extract,
            retries_evaluate,
            document_classification_errors,
            legal_case_sync_runs,
            legal_case_sync_updated,
            legal_case_sync_skipped,
            legal_case_sync_errors,
            genai_calls,
        }
    }

    /// Renders the current counter snapshot as Prometheus text exposition
    /// format, served at `GET /metrics`.
    pub fn render(&self) -> String {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&metric_families, &mut buf).unwrap();
        String::from_utf8(buf).unwrap_or_default()
    }
}

pub static METRICS: Lazy<Metrics> = Lazy::new(Metrics::new);

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn counters_start_at_zero_and_increment() {
        let before = METRICS.retries_classify.get();
        METRICS.retries_classify.inc();
        assert_eq!(METRICS.retries_classify.get(), before + 1);
    }

    #[test]
    fn render_includes_known_counter_names() {
        let text = METRICS.render();
        assert!(text.contains("retries_classify"));
        assert!(text.contains("genai_calls_total"));
    }
}
