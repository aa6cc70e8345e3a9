use fishsub_core::entities::DocumentExtraction;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::ExtractionRow;

/// Upserts the extraction for one document, replacing rather than
/// duplicating (spec §3, §8 invariant 2 — at most one per document).
pub async fn upsert<'e>(
    exec: impl PgExecutor<'e>,
    document_id: Uuid,
    document_type: &str,
    payload: &serde_json::Value,
) -> sqlx::Result<DocumentExtraction> {
    let row: ExtractionRow = sqlx::query_as(
        r#"
        INSERT INTO document_extractions (id, document_id, document_type, payload, created_at, updated_at)
        VALUES (gen_random_uuid(), $1, $2, $3, now(), now())
        ON CONFLICT (document_id) DO UPDATE SET
            document_type = EXCLUDED.document_type,
            payload = EXCLUDED.payload,
            updated_at = now()
        RETURNING id, document_id, document_type, payload, created_at, updated_at
        "#,
    )
    .bind(document_id)
    .bind(document_type)
    .bind(payload)
    .fetch_one(exec)
    .await?;
    Ok(row.into())
}

pub async fn list_by_document_ids<'e>(
    exec: impl PgExecutor<'e>,
    document_ids: &[Uuid],
) -> sqlx::Result<Vec<DocumentExtraction>> {
    let rows: Vec<ExtractionRow> = sqlx::query_as(
        r#"
        SELECT id, document_id, document_type, payload, created_at, updated_at
        FROM document_extractions
        WHERE document_id = ANY($1)
        "#,
    )
    .bind(document_ids)
    .fetch_all(exec)
    .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}
