use std::sync::Arc;

use fishsub_core::config::PipelineConfig;
use fishsub_genai::{GenAiGateway, HttpGenAiProvider};
use fishsub_legalcase::LegalCaseProvider;
use fishsub_pipeline::DocumentLockRegistry;
use fishsub_storage::ObjectStore;

/// Shared application state handed to every handler via axum's `State`
/// extractor.
pub struct AppState {
    pub pool: sqlx::PgPool,
    pub store: Arc<dyn ObjectStore>,
    pub genai: GenAiGateway<HttpGenAiProvider>,
    pub legal_case_provider: Arc<dyn LegalCaseProvider>,
    pub locks: Arc<DocumentLockRegistry>,
    pub pipeline_config: PipelineConfig,
    pub rules_path: String,
}

pub type SharedState = Arc<AppState>;
