use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};

use crate::error::{ok, ApiError};
use crate::state::SharedState;

#[derive(Serialize)]
struct ProcessoDetail {
    numero_processo: String,
    tribunal: String,
    classe: Option<String>,
    assunto: Option<String>,
    status: Option<String>,
    ultima_movimentacao: Option<chrono::DateTime<chrono::Utc>>,
    ultima_movimentacao_descricao: Option<String>,
}

impl From<fishsub_core::entities::LegalCase> for ProcessoDetail {
    fn from(c: fishsub_core::entities::LegalCase) -> Self {
        ProcessoDetail {
            numero_processo: c.numero_processo,
            tribunal: c.court,
            classe: c.class,
            assunto: c.subject,
            status: c.status,
            ultima_movimentacao: c.ultima_movimentacao,
            ultima_movimentacao_descricao: c.ultima_movimentacao_descricao,
        }
    }
}

/// `GET /processos/consultar/{cnj}` — returns the persisted case if one
/// exists, otherwise resolves the court from the CNJ digits and fetches it
/// live via C3 (spec §6, supplemented by the court-code lookup the
/// distillation's HTTP layer left as a bare `court_acronym` parameter).
pub async fn consultar(
    State(state): State<SharedState>,
    Path(cnj): Path<String>,
) -> Result<axum::response::Response, ApiError> {
    let canonical = fishsub_legalcase::cnj::canonicalize(&cnj)?;

    if let Some(existing) = fishsub_db::legal_cases::get_by_numero_processo(&state.pool, &canonical)
        .await
        .map_err(|e| fishsub_core::Error::Storage(anyhow::anyhow!(e)))?
    {
        return Ok(ok(ProcessoDetail::from(existing)));
    }

    let court = fishsub_legalcase::cnj::resolve_court_acronym(&cnj)?.ok_or_else(|| {
        fishsub_core::Error::InvalidInput(format!(
            "no court mapping for CNJ number {canonical}"
        ))
    })?;

    let (case, movements) = state
        .legal_case_provider
        .find_case(&cnj, court)
        .await?
        .ok_or_else(|| fishsub_core::Error::LegalCaseNotFound(canonical.clone()))?;

    let movements: Vec<_> = movements
        .into_iter()
        .map(|(date, description)| fishsub_legalcase::movement_to_entity(uuid::Uuid::nil(), date, description))
        .collect();

    let persisted = fishsub_db::legal_cases::insert_from_provider(&state.pool, &case, &movements)
        .await
        .map_err(|e| fishsub_core::Error::Storage(anyhow::anyhow!(e)))?;

    Ok(ok(ProcessoDetail::from(persisted)))
}

#[derive(Debug, Deserialize)]
pub struct ProcessoDashboardQuery {
    pub court: Option<String>,
    pub status: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// `GET /processos/dashboard` — filtered aggregations over persisted legal
/// cases (spec §6).
pub async fn dashboard(
    State(state): State<SharedState>,
    Query(query): Query<ProcessoDashboardQuery>,
) -> Result<axum::response::Response, ApiError> {
    let filter = fishsub_db::legal_cases::LegalCaseDashboardFilter {
        court: query.court,
        status: query.status,
        limit: query.limit,
        offset: query.offset,
    };

    let rows = fishsub_db::legal_cases::dashboard(&state.pool, &filter)
        .await
        .map_err(|e| fishsub_core::Error::Storage(anyhow::anyhow!(e)))?
        .into_iter()
        .map(ProcessoDetail::from)
        .collect::<Vec<_>>();

    Ok(ok(rows))
}
