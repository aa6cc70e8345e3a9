use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};

use crate::error::{ok, ApiError};
use crate::state::SharedState;

#[derive(Serialize)]
struct DocumentSummary {
    id: uuid::Uuid,
    file_name: String,
    mimetype: String,
    classification: Option<&'static str>,
    confidence: Option<f64>,
}

#[derive(Serialize)]
struct EligibilitySummary {
    status: &'static str,
    score_texto: String,
    pendencias: Vec<String>,
}

#[derive(Serialize)]
struct SolicitacaoDetail {
    id: uuid::Uuid,
    status: &'static str,
    priority: &'static str,
    documents: Vec<DocumentSummary>,
    eligibility: Option<EligibilitySummary>,
}

/// `GET /solicitacao/{id}` — details, documents, and the latest eligibility
/// verdict if one exists (spec §6).
pub async fn detail(
    State(state): State<SharedState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<axum::response::Response, ApiError> {
    let solicitation = fishsub_db::solicitations::get_by_id(&state.pool, id)
        .await
        .map_err(|e| fishsub_core::Error::Storage(anyhow::anyhow!(e)))?
        .ok_or(fishsub_core::Error::SolicitationNotFound(id))?;

    let documents = fishsub_db::documents::list_by_solicitation(&state.pool, id)
        .await
        .map_err(|e| fishsub_core::Error::Storage(anyhow::anyhow!(e)))?
        .into_iter()
        .map(|d| DocumentSummary {
            id: d.id,
            file_name: d.file_name,
            mimetype: d.mimetype,
            classification: d.classification.map(|c| c.as_str()),
            confidence: d.confidence,
        })
        .collect();

    let eligibility = fishsub_db::eligibility::get_latest(&state.pool, id)
        .await
        .map_err(|e| fishsub_core::Error::Storage(anyhow::anyhow!(e)))?
        .map(|e| EligibilitySummary {
            status: e.status.as_db_str(),
            score_texto: e.score_text,
            pendencias: e.pending_items.unwrap_or_default(),
        });

    Ok(ok(SolicitacaoDetail {
        id: solicitation.id,
        status: solicitation.status.as_db_str(),
        priority: solicitation.priority.as_db_str(),
        documents,
        eligibility,
    }))
}

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

#[derive(Serialize)]
struct SolicitacaoSummary {
    id: uuid::Uuid,
    status: &'static str,
    priority: &'static str,
    created_at: chrono::DateTime<chrono::Utc>,
}

/// `GET /solicitacao/dashboard` — filtered aggregations (spec §6).
pub async fn dashboard(
    State(state): State<SharedState>,
    Query(query): Query<DashboardQuery>,
) -> Result<axum::response::Response, ApiError> {
    let filter = fishsub_db::solicitations::DashboardFilter {
        status: query
            .status
            .map(|s| fishsub_core::entities::SolicitationStatus::from_db_str(&s)),
        priority: query
            .priority
            .map(|p| fishsub_core::entities::Priority::from_db_str(&p)),
        limit: query.limit,
        offset: query.offset,
    };

    let rows = fishsub_db::solicitations::dashboard(&state.pool, &filter)
        .await
        .map_err(|e| fishsub_core::Error::Storage(anyhow::anyhow!(e)))?
        .into_iter()
        .map(|s| SolicitacaoSummary {
            id: s.id,
            status: s.status.as_db_str(),
            priority: s.priority.as_db_str(),
            created_at: s.created_at,
        })
        .collect::<Vec<_>>();

    Ok(ok(rows))
}
