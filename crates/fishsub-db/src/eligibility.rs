use fishsub_core::entities::{EligibilityResult, EligibilityStatus};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::EligibilityRow;

/// Upserts the eligibility verdict for a solicitation (at most one per
/// spec §3/§8 invariant 3); re-running C7 replaces the previous verdict.
pub async fn upsert<'e>(
    exec: impl PgExecutor<'e>,
    solicitation_id: Uuid,
    status: EligibilityStatus,
    score_text: &str,
    pending_items: &[String],
) -> sqlx::Result<EligibilityResult> {
    let pending_items_json = serde_json::to_value(pending_items).unwrap_or(serde_json::Value::Null);
    let row: EligibilityRow = sqlx::query_as(
        r#"
        INSERT INTO eligibility_results (id, solicitation_id, status, score_text, pending_items, created_at, updated_at)
        VALUES (gen_random_uuid(), $1, $2, $3, $4, now(), now())
        ON CONFLICT (solicitation_id) DO UPDATE SET
            status = EXCLUDED.status,
            score_text = EXCLUDED.score_text,
            pending_items = EXCLUDED.pending_items,
            updated_at = now()
        RETURNING id, solicitation_id, status, score_text, pending_items, created_at, updated_at
        "#,
    )
    .bind(solicitation_id)
    .bind(status.as_db_str())
    .bind(score_text)
    .bind(pending_items_json)
    .fetch_one(exec)
    .await?;
    Ok(row.into())
}

pub async fn get_latest<'e>(
    exec: impl PgExecutor<'e>,
    solicitation_id: Uuid,
) -> sqlx::Result<Option<EligibilityResult>> {
    let row: Option<EligibilityRow> = sqlx::query_as(
        r#"
        SELECT id, solicitation_id, status, score_text, pending_items, created_at, updated_at
        FROM eligibility_results
        WHERE solicitation_id = $1
        "#,
    )
    .bind(solicitation_id)
    .fetch_optional(exec)
    .await?;
    Ok(row.map(Into::into))
}
