use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{ok, ApiError};
use crate::state::SharedState;
use fishsub_pipeline::ExtractionTarget;

#[derive(Debug, Deserialize)]
pub struct ExtracaoRequest {
    pub solicitation_id: Option<uuid::Uuid>,
    #[serde(default)]
    pub document_ids: Vec<uuid::Uuid>,
}

#[derive(Serialize)]
struct ExtractedDocument {
    document_id: uuid::Uuid,
    document_type: String,
    payload: serde_json::Value,
}

#[derive(Serialize)]
struct ExtracaoResponse {
    solicitation_id: Option<uuid::Uuid>,
    extractions: Vec<ExtractedDocument>,
}

/// `POST /solicitacao/extracao` — runs C6 over an explicit document set or
/// a whole solicitation (spec §6).
pub async fn handle(
    State(state): State<SharedState>,
    Json(req): Json<ExtracaoRequest>,
) -> Result<axum::response::Response, ApiError> {
    let target = match (req.solicitation_id, req.document_ids.is_empty()) {
        (Some(id), true) => ExtractionTarget::SolicitationId(id),
        (_, false) => ExtractionTarget::DocumentIds(req.document_ids),
        (None, true) => {
            return Err(fishsub_core::Error::InvalidInput(
                "either solicitation_id or document_ids is required".into(),
            )
            .into())
        }
    };

    let outcome = fishsub_pipeline::extract_documents(
        &state.pool,
        state.store.as_ref(),
        &state.genai,
        &state.locks,
        &state.pipeline_config,
        target,
    )
    .await?;

    let extractions = outcome
        .extractions
        .into_iter()
        .map(|e| ExtractedDocument {
            document_id: e.document_id,
            document_type: e.document_type,
            payload: e.payload,
        })
        .collect();

    Ok(ok(ExtracaoResponse {
        solicitation_id: outcome.solicitation_id,
        extractions,
    }))
}
