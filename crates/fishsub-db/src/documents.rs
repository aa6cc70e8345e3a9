use fishsub_core::entities::{Document, DocumentClassification};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::DocumentRow;

/// A single blob awaiting persistence during C5 step 2.
pub struct NewDocument<'a> {
    pub solicitation_id: Uuid,
    pub s3_key: &'a str,
    pub mimetype: &'a str,
    pub file_name: &'a str,
    pub uploaded_by: &'a str,
}

pub async fn insert<'e>(exec: impl PgExecutor<'e>, doc: NewDocument<'_>) -> sqlx::Result<Document> {
    let row: DocumentRow = sqlx::query_as(
        r#"
        INSERT INTO documents (id, solicitation_id, s3_key, mimetype, file_name, uploaded_by, uploaded_at)
        VALUES (gen_random_uuid(), $1, $2, $3, $4, $5, now())
        RETURNING id, solicitation_id, s3_key, mimetype, file_name, uploaded_by, uploaded_at, classification, confidence
        "#,
    )
    .bind(doc.solicitation_id)
    .bind(doc.s3_key)
    .bind(doc.mimetype)
    .bind(doc.file_name)
    .bind(doc.uploaded_by)
    .fetch_one(exec)
    .await?;
    Ok(row.into())
}

/// Records the classification label assigned by C1 `classify`. Per-task
/// failures leave this unset (spec §4.4 step 3) — there is no "clear"
/// counterpart, only "set".
pub async fn set_classification<'e>(
    exec: impl PgExecutor<'e>,
    document_id: Uuid,
    classification: DocumentClassification,
    confidence: Option<f64>,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        UPDATE documents
        SET classification = $2, confidence = $3
        WHERE id = $1
        "#,
    )
    .bind(document_id)
    .bind(classification.as_str())
    .bind(confidence)
    .execute(exec)
    .await?;
    Ok(())
}

pub async fn list_by_solicitation<'e>(
    exec: impl PgExecutor<'e>,
    solicitation_id: Uuid,
) -> sqlx::Result<Vec<Document>> {
    let rows: Vec<DocumentRow> = sqlx::query_as(
        r#"
        SELECT id, solicitation_id, s3_key, mimetype, file_name, uploaded_by, uploaded_at, classification, confidence
        FROM documents
        WHERE solicitation_id = $1
        ORDER BY uploaded_at ASC, id ASC
        "#,
    )
    .bind(solicitation_id)
    .fetch_all(exec)
    .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

pub async fn list_by_ids<'e>(exec: impl PgExecutor<'e>, ids: &[Uuid]) -> sqlx::Result<Vec<Document>> {
    let rows: Vec<DocumentRow> = sqlx::query_as(
        r#"
        SELECT id, solicitation_id, s3_key, mimetype, file_name, uploaded_by, uploaded_at, classification, confidence
        FROM documents
        WHERE id = ANY($1)
        ORDER BY uploaded_at ASC, id ASC
        "#,
    )
    .bind(ids)
    .fetch_all(exec)
    .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

pub async fn get_by_id<'e>(exec: impl PgExecutor<'e>, id: Uuid) -> sqlx::Result<Option<Document>> {
    let row: Option<DocumentRow> = sqlx::query_as(
        r#"
        SELECT id, solicitation_id, s3_key, mimetype, file_name, uploaded_by, uploaded_at, classification, confidence
        FROM documents
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(exec)
    .await?;
    Ok(row.map(Into::into))
}
