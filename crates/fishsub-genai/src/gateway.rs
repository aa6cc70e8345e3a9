//! Single call envelope for every GenAI interaction (C1, spec §4.1):
//! `classify`, `extract`, `evaluate`. Each acquires a process-wide semaphore
//! slot, invokes the provider under a retry envelope, and decodes the typed
//! response.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fishsub_core::entities::{Document, DocumentClassification, Solicitation};
use fishsub_core::{Error, Result};
use serde::Deserialize;
use tokio::sync::Semaphore;

use crate::prompts::{default_registry, Prompt, PromptRegistry};
use crate::retry::{with_retry, Retryability, RetryPolicy};

/// The raw provider call: send a prompt (plus optional document bytes) and
/// get back a JSON value matching the prompt's declared response schema.
/// Swapped for a fake in pipeline-stage tests so they never hit a real
/// provider.
#[async_trait]
pub trait GenAiProvider: Send + Sync {
    async fn invoke(
        &self,
        prompt: &Prompt,
        document: Option<(&[u8], &str)>,
        timeout: Duration,
    ) -> std::result::Result<serde_json::Value, ProviderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("rate limited")]
    RateLimited,
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ProviderError {
    fn retryability(&self) -> Retryability {
        match self {
            ProviderError::Transport(_) | ProviderError::RateLimited => Retryability::Retry,
            ProviderError::Malformed(_) => Retryability::Terminal,
        }
    }
}

/// Reqwest-backed provider hitting a generic GenAI HTTP endpoint:
/// `POST {base_url}/v1/generate` with `{prompt, response_mime_type, document}`
/// and an `Authorization: Bearer {api_key}` header.
pub struct HttpGenAiProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpGenAiProvider {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl GenAiProvider for HttpGenAiProvider {
    async fn invoke(
        &self,
        prompt: &Prompt,
        document: Option<(&[u8], &str)>,
        timeout: Duration,
    ) -> std::result::Result<serde_json::Value, ProviderError> {
        let mut body = serde_json::json!({
            "prompt": prompt.build_full_prompt(),
            "response_mime_type": prompt.response_mime_type,
        });
        if let Some((bytes, mime)) = document {
            body["document"] = serde_json::json!({
                "mimetype": mime,
                "data_base64": base64::Engine::encode(
                    &base64::engine::general_purpose::STANDARD,
                    bytes,
                ),
            });
        }

        let response = self
            .http
            .post(format!("{}/v1/generate", self.base_url.trim_end_matches('/')))
            .bearer_auth(&self.api_key)
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Transport(format!("timeout: {e}"))
                } else {
                    ProviderError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if status.as_u16() == 429 || status.as_u16() == 503 {
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            return Err(ProviderError::Transport(format!("http {status}")));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        if let Some(message) = payload.get("error").and_then(|e| e.as_str()) {
            if message.contains("RESOURCE_EXHAUSTED") {
                return Err(ProviderError::RateLimited);
            }
            return Err(ProviderError::Malformed(message.to_string()));
        }

        Ok(payload)
    }
}

#[derive(Debug, Deserialize)]
struct ClassifyOutcome {
    classificacao: ClassificacaoField,
}

#[derive(Debug, Deserialize)]
struct ClassificacaoField {
    #[serde(rename = "type")]
    type_: String,
    confidence: Option<f64>,
}

/// Raw provider response for `evaluate`. `status` is free text — normalised
/// onto the closed `EligibilityStatus` pair by the eligibility stage, not
/// here (spec §4.6 step 6).
#[derive(Debug, Deserialize)]
pub struct EvaluateOutcome {
    pub status: String,
    pub score_texto: String,
    #[serde(default)]
    pub pendencias: Vec<String>,
}

/// Resolves the prompt key used to extract a document of a given
/// classification; unclassified/`Outro` documents use the generic prompt.
fn extract_prompt_key(classification: DocumentClassification) -> &'static str {
    match classification {
        DocumentClassification::Cnis => "extract_cnis",
        DocumentClassification::Caepf => "extract_caepf",
        DocumentClassification::ComprovanteResidencia
        | DocumentClassification::DeclaracaoDeResidencia => "extract_comprovante_residencia",
        DocumentClassification::TermoDeRepresentacao => "extract_termo_representacao",
        DocumentClassification::GpsEComprovante => "extract_gps",
        DocumentClassification::Biometria => "extract_biometria",
        DocumentClassification::Cin | DocumentClassification::DocumentoIdentidade => {
            "extract_documento_identidade"
        }
        DocumentClassification::Cpf => "extract_cpf",
        DocumentClassification::Reap => "extract_reap",
        DocumentClassification::CertificadoDeRegularidade => "extract_certificado_regularidade",
        DocumentClassification::Procuracao => "extract_procuracao",
        DocumentClassification::Outro => "extract_outro",
    }
}

pub struct GenAiGateway<P: GenAiProvider> {
    provider: P,
    registry: &'static PromptRegistry,
    semaphore: Arc<Semaphore>,
    retry_policy: RetryPolicy,
    call_timeout: Duration,
}

impl<P: GenAiProvider> GenAiGateway<P> {
    pub fn new(provider: P, config: &fishsub_core::config::PipelineConfig) -> Self {
        Self {
            provider,
            registry: default_registry(),
            semaphore: Arc::new(Semaphore::new(config.ia_max_in_flight)),
            retry_policy: RetryPolicy::new(
                config.retry_max_attempts,
                config.retry_initial,
                config.retry_max,
            ),
            call_timeout: config.ia_timeout,
        }
    }

    /// Classifies a document. Never propagates an error: C1 itself has no
    /// failure return (spec §4.1). `None` signals an unrecoverable call
    /// failure (retries exhausted, malformed response) for the caller to
    /// swallow per spec §4.4 step 3; `Some` carries the model's own verdict,
    /// which may legitimately be `OUTRO` with a confidence score attached.
    #[tracing::instrument(skip(self, bytes))]
    pub async fn classify(
        &self,
        bytes: &[u8],
        mime: &str,
    ) -> Option<(DocumentClassification, Option<f64>)> {
        let prompt = self.registry.get("classify_document").ok()?;

        let _permit = self.semaphore.clone().acquire_owned().await.ok()?;

        let result = with_retry(
            &self.retry_policy,
            || self.provider.invoke(prompt, Some((bytes, mime)), self.call_timeout),
            |e: &ProviderError| e.retryability(),
            || fishsub_core::metrics::METRICS.retries_classify.inc(),
        )
        .await;

        let payload = result.ok()?;
        let outcome: ClassifyOutcome = serde_json::from_value(payload).ok()?;
        Some((
            DocumentClassification::coerce(&outcome.classificacao.type_),
            outcome.classificacao.confidence,
        ))
    }

    /// Extracts structured data for a single document. Escalates on
    /// unrecoverable failure (spec §4.1).
    #[tracing::instrument(skip(self, bytes))]
    pub async fn extract(
        &self,
        classification: DocumentClassification,
        bytes: &[u8],
        mime: &str,
    ) -> Result<serde_json::Value> {
        let key = extract_prompt_key(classification);
        let prompt = self.registry.get(key)?;

        let _permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| Error::Domain(anyhow::anyhow!(e)))?;

        with_retry(
            &self.retry_policy,
            || self.provider.invoke(prompt, Some((bytes, mime)), self.call_timeout),
            |e: &ProviderError| e.retryability(),
            || fishsub_core::metrics::METRICS.retries_extract.inc(),
        )
        .await
        .map_err(|e| Error::Extraction(e.to_string()))
    }

    /// Composes and evaluates the eligibility prompt for a solicitation
    /// (spec §4.6). `rules_text` is the opaque rules document prepended to
    /// the payload.
    #[tracing::instrument(skip(self, extractions, rules_text))]
    pub async fn evaluate(
        &self,
        solicitation: &Solicitation,
        documents: &[Document],
        extractions: &[serde_json::Value],
        rules_text: &str,
    ) -> Result<EvaluateOutcome> {
        let prompt = self.registry.get("evaluate_eligibility")?;

        let payload_summary = serde_json::json!({
            "rules": rules_text,
            "solicitation": {
                "id": solicitation.id,
                "fisher_data": solicitation.fisher_data,
            },
            "documents": documents
                .iter()
                .map(|d| serde_json::json!({
                    "id": d.id,
                    "classification": d.classification.map(|c| c.as_str()),
                }))
                .collect::<Vec<_>>(),
            "extractions": extractions,
        });

        let mut enriched_prompt = prompt.clone();
        enriched_prompt.prompt = format!("{}\n\n{}", prompt.prompt, payload_summary);

        let _permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| Error::Domain(anyhow::anyhow!(e)))?;

        let raw = with_retry(
            &self.retry_policy,
            || {
                self.provider
                    .invoke(&enriched_prompt, None, self.call_timeout)
            },
            |e: &ProviderError| e.retryability(),
            || fishsub_core::metrics::METRICS.retries_evaluate.inc(),
        )
        .await
        .map_err(|e| Error::EligibilityComputation(e.to_string()))?;

        serde_json::from_value(raw)
            .map_err(|e| Error::EligibilityComputation(format!("malformed evaluation response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fishsub_core::config::PipelineConfig;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct ScriptedProvider {
        responses: std::sync::Mutex<Vec<std::result::Result<serde_json::Value, ProviderError>>>,
        calls: AtomicU32,
    }

    #[async_trait]
    impl GenAiProvider for ScriptedProvider {
        async fn invoke(
            &self,
            _prompt: &Prompt,
            _document: Option<(&[u8], &str)>,
            _timeout: Duration,
        ) -> std::result::Result<serde_json::Value, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses.lock().unwrap().remove(0)
        }
    }

    #[tokio::test]
    async fn classify_returns_none_on_malformed_response() {
        let provider = ScriptedProvider {
            responses: std::sync::Mutex::new(vec![Ok(serde_json::json!({"nonsense": true}))]),
            calls: AtomicU32::new(0),
        };
        let gateway = GenAiGateway::new(provider, &PipelineConfig::default());
        let outcome = gateway.classify(b"bytes", "application/pdf").await;
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn classify_recovers_after_transient_retry() {
        let provider = ScriptedProvider {
            responses: std::sync::Mutex::new(vec![
                Err(ProviderError::RateLimited),
                Ok(serde_json::json!({"classificacao": {"type": "CNIS", "confidence": 0.9}})),
            ]),
            calls: AtomicU32::new(0),
        };
        let gateway = GenAiGateway::new(provider, &PipelineConfig::default());
        let (classification, confidence) = gateway
            .classify(b"bytes", "application/pdf")
            .await
            .expect("classification succeeds");
        assert_eq!(classification, DocumentClassification::Cnis);
        assert_eq!(confidence, Some(0.9));
    }

    #[tokio::test]
    async fn extract_escalates_after_retries_exhausted() {
        let provider = ScriptedProvider {
            responses: std::sync::Mutex::new(vec![
                Err(ProviderError::RateLimited),
                Err(ProviderError::RateLimited),
                Err(ProviderError::RateLimited),
            ]),
            calls: AtomicU32::new(0),
        };
        let mut config = PipelineConfig::default();
        config.retry_max_attempts = 3;
        config.retry_initial = Duration::from_millis(1);
        config.retry_max = Duration::from_millis(2);

        let gateway = GenAiGateway::new(provider, &config);
        let err = gateway
            .extract(DocumentClassification::Cnis, b"bytes", "application/pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }

    #[tokio::test]
    async fn http_provider_posts_prompt_and_returns_body() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "classificacao": {"type": "CNIS", "confidence": 0.8}
            })))
            .mount(&server)
            .await;

        let provider = HttpGenAiProvider::new(server.uri(), "test-key");
        let prompt = default_registry().get("classify_document").unwrap();
        let value = provider
            .invoke(prompt, None, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(value["classificacao"]["type"], "CNIS");
    }

    #[tokio::test]
    async fn http_provider_maps_429_to_rate_limited() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/generate"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let provider = HttpGenAiProvider::new(server.uri(), "test-key");
        let prompt = default_registry().get("classify_document").unwrap();
        let err = provider
            .invoke(prompt, None, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::RateLimited));
    }
}
