//! Extraction stage (C6, spec §4.5): resolves a target set of documents,
//! downloads their bytes, and fans out one GenAI `extract` call per
//! document under `max_extract_workers` concurrency, each behind a
//! per-document mutex.

use std::sync::Arc;

use fishsub_core::entities::{Document, DocumentClassification, DocumentExtraction};
use fishsub_core::{Error, Result};
use fishsub_genai::{GenAiGateway, GenAiProvider};
use fishsub_storage::ObjectStore;
use futures::{stream, StreamExt};
use uuid::Uuid;

use crate::locks::DocumentLockRegistry;

pub enum ExtractionTarget {
    DocumentIds(Vec<Uuid>),
    SolicitationId(Uuid),
}

pub struct ExtractionOutcome {
    pub extractions: Vec<DocumentExtraction>,
    /// `None` when the resolved document set spans more than one
    /// solicitation (spec §4.5 step 3).
    pub solicitation_id: Option<Uuid>,
}

/// Normalises a provider JSON payload: recursively walks objects/arrays so
/// every leaf ends up as a JSON scalar the repository can store verbatim.
/// Dates are already strings coming out of the provider (the prompt
/// mandates `YYYY-MM-DD`), so this pass is purely structural.
fn normalize_payload(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, normalize_payload(v)))
                .collect(),
        ),
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(normalize_payload).collect())
        }
        other => other,
    }
}

async fn resolve_documents(
    pool: &sqlx::PgPool,
    target: ExtractionTarget,
) -> Result<Vec<Document>> {
    let documents = match target {
        ExtractionTarget::DocumentIds(ids) => {
            if ids.is_empty() {
                return Err(Error::InvalidInput("at least one document id is required".into()));
            }
            fishsub_db::documents::list_by_ids(pool, &ids)
                .await
                .map_err(|e| Error::Storage(anyhow::anyhow!(e)))?
        }
        ExtractionTarget::SolicitationId(solicitation_id) => {
            fishsub_db::documents::list_by_solicitation(pool, solicitation_id)
                .await
                .map_err(|e| Error::Storage(anyhow::anyhow!(e)))?
        }
    };
    if documents.is_empty() {
        return Err(Error::InvalidInput("no documents resolved for extraction".into()));
    }
    Ok(documents)
}

pub async fn extract_documents<P: GenAiProvider>(
    pool: &sqlx::PgPool,
    store: &dyn ObjectStore,
    genai: &GenAiGateway<P>,
    locks: &Arc<DocumentLockRegistry>,
    config: &fishsub_core::config::PipelineConfig,
    target: ExtractionTarget,
) -> Result<ExtractionOutcome> {
    let documents = resolve_documents(pool, target).await?;

    let solicitation_id = {
        let first = documents[0].solicitation_id;
        if documents.iter().all(|d| d.solicitation_id == first) {
            Some(first)
        } else {
            None
        }
    };

    let tasks = documents.into_iter().map(|doc| {
        let locks = locks.clone();
        async move {
            let lock = locks.lock_for(doc.id);
            let _guard = lock.lock().await;

            let bytes = store.download(&doc.s3_key).await?;
            let classification = doc.classification.unwrap_or(DocumentClassification::Outro);
            let payload = genai.extract(classification, &bytes, &doc.mimetype).await?;
            let normalized = normalize_payload(payload);

            fishsub_db::extractions::upsert(pool, doc.id, classification.as_str(), &normalized)
                .await
                .map_err(|e| Error::Storage(anyhow::anyhow!(e)))
        }
    });

    // Poll manually rather than `.collect()`: dropping the stream on the
    // first error cancels any still in-flight or not-yet-started tasks
    // (spec §4.5 step 3).
    let mut in_flight = stream::iter(tasks).buffer_unordered(config.max_extract_workers);
    let mut extractions = Vec::new();
    while let Some(result) = in_flight.next().await {
        extractions.push(result?);
    }

    Ok(ExtractionOutcome {
        extractions,
        solicitation_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn normalize_payload_walks_nested_objects_and_arrays() {
        let input = json!({
            "nome": "Maria",
            "enderecos": [
                {"rua": "Rua A", "numero": 12},
                {"rua": "Rua B", "numero": 34},
            ],
        });
        let output = normalize_payload(input.clone());
        assert_eq!(output, input);
    }

    #[test]
    fn normalize_payload_leaves_scalars_untouched() {
        assert_eq!(normalize_payload(json!("2024-06-01")), json!("2024-06-01"));
        assert_eq!(normalize_payload(json!(42)), json!(42));
        assert_eq!(normalize_payload(serde_json::Value::Null), serde_json::Value::Null);
    }
}
