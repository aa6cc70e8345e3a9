use fishsub_core::entities::{Solicitation, SolicitationStatus};
use sqlx::{PgExecutor, Postgres, Transaction};
use uuid::Uuid;

use crate::SolicitationRow;

/// Creates a new solicitation in its initial state (`pendente` / `baixa`),
/// as the first step of C5 (spec §4.4 step 1).
pub async fn create<'e>(exec: impl PgExecutor<'e>) -> sqlx::Result<Solicitation> {
    let row: SolicitationRow = sqlx::query_as(
        r#"
        INSERT INTO solicitations (id, status, priority)
        VALUES (gen_random_uuid(), 'pendente', 'baixa')
        RETURNING id, status, priority, fisher_data, analysis, created_at, updated_at
        "#,
    )
    .fetch_one(exec)
    .await?;
    Ok(row.into())
}

pub async fn get_by_id<'e>(
    exec: impl PgExecutor<'e>,
    id: Uuid,
) -> sqlx::Result<Option<Solicitation>> {
    let row: Option<SolicitationRow> = sqlx::query_as(
        r#"
        SELECT id, status, priority, fisher_data, analysis, created_at, updated_at
        FROM solicitations
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(exec)
    .await?;
    Ok(row.map(Into::into))
}

/// Updates the solicitation status. Called by C7 after an eligibility
/// verdict is persisted; failures here are swallowed by the caller (spec §4.6
/// step 8, §7) since the eligibility record is the authoritative artifact.
pub async fn update_status<'e>(
    exec: impl PgExecutor<'e>,
    id: Uuid,
    status: SolicitationStatus,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        UPDATE solicitations
        SET status = $2, updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(status.as_db_str())
    .execute(exec)
    .await?;
    Ok(())
}

/// Filters supported by `GET /solicitacao/dashboard` (spec §6).
#[derive(Debug, Default, Clone)]
pub struct DashboardFilter {
    pub status: Option<SolicitationStatus>,
    pub priority: Option<fishsub_core::entities::Priority>,
    pub limit: i64,
    pub offset: i64,
}

pub async fn dashboard(
    pool: &sqlx::PgPool,
    filter: &DashboardFilter,
) -> sqlx::Result<Vec<Solicitation>> {
    let rows: Vec<SolicitationRow> = sqlx::query_as(
        r#"
        SELECT id, status, priority, fisher_data, analysis, created_at, updated_at
        FROM solicitations
        WHERE ($1::text IS NULL OR status = $1)
          AND ($2::text IS NULL OR priority = $2)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(filter.status.map(|s| s.as_db_str().to_string()))
    .bind(filter.priority.map(|p| p.as_db_str().to_string()))
    .bind(filter.limit.max(1).min(500))
    .bind(filter.offset.max(0))
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

pub async fn begin(pool: &sqlx::PgPool) -> sqlx::Result<Transaction<'_, Postgres>> {
    pool.begin().await
}
