use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{ok, ApiError};
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct ElegibilidadeRequest {
    pub solicitation_id: uuid::Uuid,
}

#[derive(Serialize)]
struct ElegibilidadeResponse {
    status: &'static str,
    score_texto: String,
    pendencias: Vec<String>,
}

/// `POST /solicitacao/elegibilidade` — runs C7 (spec §6).
pub async fn handle(
    State(state): State<SharedState>,
    Json(req): Json<ElegibilidadeRequest>,
) -> Result<axum::response::Response, ApiError> {
    let result = fishsub_pipeline::evaluate_eligibility(
        &state.pool,
        &state.genai,
        &state.rules_path,
        req.solicitation_id,
    )
    .await?;

    Ok(ok(ElegibilidadeResponse {
        status: result.status.as_db_str(),
        score_texto: result.score_text,
        pendencias: result.pending_items.unwrap_or_default(),
    }))
}
