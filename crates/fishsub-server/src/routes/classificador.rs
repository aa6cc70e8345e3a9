use axum::extract::{Multipart, State};
use serde::Serialize;

use crate::error::{ok, ApiError};
use crate::state::SharedState;

#[derive(Serialize)]
struct ClassificadoDocument {
    document_id: uuid::Uuid,
    classification: Option<&'static str>,
}

#[derive(Serialize)]
struct ClassificadorResponse {
    solicitation_id: uuid::Uuid,
    documents: Vec<ClassificadoDocument>,
}

/// `POST /solicitacao/classificador` — 1..15 multipart files (spec §6).
pub async fn handle(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<axum::response::Response, ApiError> {
    let mut incoming = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| fishsub_core::Error::InvalidInput(e.to_string()))?
    {
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let mimetype = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| fishsub_core::Error::InvalidInput(e.to_string()))?;

        incoming.push(fishsub_pipeline::IncomingDocument {
            file_name,
            mimetype,
            bytes,
            uploaded_by: "citizen-portal".to_string(),
        });
    }

    let outcome = fishsub_pipeline::classify_batch(
        &state.pool,
        state.store.as_ref(),
        &state.genai,
        &state.pipeline_config,
        incoming,
    )
    .await?;

    let documents = outcome
        .documents
        .into_iter()
        .map(|d| ClassificadoDocument {
            document_id: d.document_id,
            classification: d.classification.map(|c| c.as_str()),
        })
        .collect();

    Ok(ok(ClassificadorResponse {
        solicitation_id: outcome.solicitation_id,
        documents,
    }))
}
