use chrono::{DateTime, Utc};
use fishsub_core::entities::{LegalCase, LegalCaseMovement};
use sqlx::{PgExecutor, Postgres, Transaction};
use uuid::Uuid;

use crate::{LegalCaseRow, MovementRow};

pub async fn get_by_numero_processo<'e>(
    exec: impl PgExecutor<'e>,
    numero_processo: &str,
) -> sqlx::Result<Option<LegalCase>> {
    let row: Option<LegalCaseRow> = sqlx::query_as(
        r#"
        SELECT id, numero_processo, court, body, class, subject, status, filing_date,
               movimentacoes, ultima_movimentacao, ultima_movimentacao_descricao, last_synced_at
        FROM legal_cases
        WHERE numero_processo = $1
        "#,
    )
    .bind(numero_processo)
    .fetch_optional(exec)
    .await?;
    Ok(row.map(Into::into))
}

/// Cases with `last_synced_at IS NULL OR last_synced_at < now() - stale_after_days`
/// (spec §4.8 staleness selection), oldest-first, capped at `batch_size`.
pub async fn select_stale(
    pool: &sqlx::PgPool,
    batch_size: i64,
    stale_after_days: i64,
) -> sqlx::Result<Vec<LegalCase>> {
    let rows: Vec<LegalCaseRow> = sqlx::query_as(
        r#"
        SELECT id, numero_processo, court, body, class, subject, status, filing_date,
               movimentacoes, ultima_movimentacao, ultima_movimentacao_descricao, last_synced_at
        FROM legal_cases
        WHERE last_synced_at IS NULL
           OR last_synced_at < now() - make_interval(days => $2::int)
        ORDER BY last_synced_at ASC NULLS FIRST
        LIMIT $1
        "#,
    )
    .bind(batch_size)
    .bind(stale_after_days as i32)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

/// New field values computed by C8/C3 for one case, ready to apply atomically.
#[derive(Debug, Default, Clone)]
pub struct CaseFieldUpdate {
    pub body: Option<String>,
    pub class: Option<String>,
    pub subject: Option<String>,
    pub status: Option<String>,
    pub filing_date: Option<DateTime<Utc>>,
    pub movimentacoes: i64,
    pub ultima_movimentacao: Option<DateTime<Utc>>,
    pub ultima_movimentacao_descricao: Option<String>,
}

/// Atomically updates case fields, appends new movements, and bumps
/// `last_synced_at` (spec §4.8 per-case update). New movements are appended
/// with `ON CONFLICT DO NOTHING` on the unique `(case_id, movement_date,
/// description)` triple (spec §3, §8 invariant 4) so a re-run is idempotent.
pub async fn apply_case_updates(
    pool: &sqlx::PgPool,
    case_id: Uuid,
    fields: CaseFieldUpdate,
    new_movements: &[(DateTime<Utc>, String)],
) -> sqlx::Result<()> {
    let mut txn: Transaction<'_, Postgres> = pool.begin().await?;

    sqlx::query(
        r#"
        UPDATE legal_cases
        SET body = $2, class = $3, subject = $4, status = $5, filing_date = $6,
            movimentacoes = $7, ultima_movimentacao = $8, ultima_movimentacao_descricao = $9,
            last_synced_at = now()
        WHERE id = $1
        "#,
    )
    .bind(case_id)
    .bind(&fields.body)
    .bind(&fields.class)
    .bind(&fields.subject)
    .bind(&fields.status)
    .bind(fields.filing_date)
    .bind(fields.movimentacoes)
    .bind(fields.ultima_movimentacao)
    .bind(&fields.ultima_movimentacao_descricao)
    .execute(&mut *txn)
    .await?;

    for (movement_date, description) in new_movements {
        sqlx::query(
            r#"
            INSERT INTO legal_case_movements (id, case_id, movement_date, description)
            VALUES (gen_random_uuid(), $1, $2, $3)
            ON CONFLICT (case_id, movement_date, description) DO NOTHING
            "#,
        )
        .bind(case_id)
        .bind(movement_date)
        .bind(description)
        .execute(&mut *txn)
        .await?;
    }

    txn.commit().await
}

/// Inserts a brand-new case discovered via C3, used by the
/// `/processos/consultar/{cnj}` handler when no persisted row exists yet.
pub async fn insert_from_provider(
    pool: &sqlx::PgPool,
    case: &LegalCase,
    movements: &[LegalCaseMovement],
) -> sqlx::Result<LegalCase> {
    let mut txn = pool.begin().await?;

    let row: LegalCaseRow = sqlx::query_as(
        r#"
        INSERT INTO legal_cases (
            id, numero_processo, court, body, class, subject, status, filing_date,
            movimentacoes, ultima_movimentacao, ultima_movimentacao_descricao, last_synced_at
        )
        VALUES (gen_random_uuid(), $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, now())
        ON CONFLICT (numero_processo) DO UPDATE SET last_synced_at = now()
        RETURNING id, numero_processo, court, body, class, subject, status, filing_date,
                  movimentacoes, ultima_movimentacao, ultima_movimentacao_descricao, last_synced_at
        "#,
    )
    .bind(&case.numero_processo)
    .bind(&case.court)
    .bind(&case.body)
    .bind(&case.class)
    .bind(&case.subject)
    .bind(&case.status)
    .bind(case.filing_date)
    .bind(case.movimentacoes)
    .bind(case.ultima_movimentacao)
    .bind(&case.ultima_movimentacao_descricao)
    .fetch_one(&mut *txn)
    .await?;

    for m in movements {
        sqlx::query(
            r#"
            INSERT INTO legal_case_movements (id, case_id, movement_date, description)
            VALUES (gen_random_uuid(), $1, $2, $3)
            ON CONFLICT (case_id, movement_date, description) DO NOTHING
            "#,
        )
        .bind(row.id)
        .bind(m.movement_date)
        .bind(&m.description)
        .execute(&mut *txn)
        .await?;
    }

    txn.commit().await?;
    Ok(row.into())
}

pub async fn list_movements(
    pool: &sqlx::PgPool,
    case_id: Uuid,
) -> sqlx::Result<Vec<LegalCaseMovement>> {
    let rows: Vec<MovementRow> = sqlx::query_as(
        r#"
        SELECT id, case_id, movement_date, description
        FROM legal_case_movements
        WHERE case_id = $1
        ORDER BY movement_date ASC
        "#,
    )
    .bind(case_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

/// Filters supported by `GET /processos/dashboard` (spec §6).
#[derive(Debug, Default, Clone)]
pub struct LegalCaseDashboardFilter {
    pub court: Option<String>,
    pub status: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

pub async fn dashboard(
    pool: &sqlx::PgPool,
    filter: &LegalCaseDashboardFilter,
) -> sqlx::Result<Vec<LegalCase>> {
    let rows: Vec<LegalCaseRow> = sqlx::query_as(
        r#"
        SELECT id, numero_processo, court, body, class, subject, status, filing_date,
               movimentacoes, ultima_movimentacao, ultima_movimentacao_descricao, last_synced_at
        FROM legal_cases
        WHERE ($1::text IS NULL OR court = $1)
          AND ($2::text IS NULL OR status = $2)
        ORDER BY ultima_movimentacao DESC NULLS LAST
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(&filter.court)
    .bind(&filter.status)
    .bind(filter.limit.max(1).min(500))
    .bind(filter.offset.max(0))
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}
