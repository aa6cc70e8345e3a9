//! Classification stage (C5, spec §4.4): uploads a batch of blobs under a
//! fresh Solicitation, then fans out one GenAI `classify` call per document
//! on a bounded worker pool. Per-task failures are swallowed — the document
//! simply keeps no classification.

use bytes::Bytes;
use fishsub_core::entities::{DocumentClassification, ALLOWED_MIMETYPES, MAX_DOCUMENTS_PER_BATCH};
use fishsub_core::{Error, Result};
use fishsub_genai::{GenAiGateway, GenAiProvider};
use fishsub_storage::ObjectStore;
use futures::{stream, StreamExt};
use rand::Rng;
use uuid::Uuid;

pub struct IncomingDocument {
    pub file_name: String,
    pub mimetype: String,
    pub bytes: Bytes,
    pub uploaded_by: String,
}

pub struct ClassifiedDocument {
    pub document_id: Uuid,
    pub classification: Option<DocumentClassification>,
}

pub struct ClassificationOutcome {
    pub solicitation_id: Uuid,
    pub documents: Vec<ClassifiedDocument>,
}

fn random_hex_suffix() -> String {
    let bytes: [u8; 8] = rand::thread_rng().gen();
    hex::encode(bytes)
}

fn extension_for(mimetype: &str) -> &'static str {
    match mimetype {
        "application/pdf" => ".pdf",
        "image/jpeg" => ".jpg",
        "image/png" => ".png",
        "image/tiff" => ".tiff",
        _ => "",
    }
}

/// Runs C5 end to end: create the Solicitation, upload + persist every
/// Document (aborting on the first upload/storage failure, per spec §4.4
/// step 2), then classify them all under `max_classify_workers` concurrency.
pub async fn classify_batch<P: GenAiProvider>(
    pool: &sqlx::PgPool,
    store: &dyn ObjectStore,
    genai: &GenAiGateway<P>,
    config: &fishsub_core::config::PipelineConfig,
    incoming: Vec<IncomingDocument>,
) -> Result<ClassificationOutcome> {
    if incoming.is_empty() {
        return Err(Error::InvalidInput("at least one document is required".into()));
    }
    if incoming.len() > MAX_DOCUMENTS_PER_BATCH {
        return Err(Error::InvalidInput(format!(
            "batch exceeds the maximum of {MAX_DOCUMENTS_PER_BATCH} documents"
        )));
    }

    let solicitation = fishsub_db::solicitations::create(pool)
        .await
        .map_err(|e| Error::Storage(anyhow::anyhow!(e)))?;

    let mut documents = Vec::with_capacity(incoming.len());
    for doc in &incoming {
        if !ALLOWED_MIMETYPES.contains(&doc.mimetype.as_str()) {
            return Err(Error::UnsupportedDocument(doc.mimetype.clone()));
        }

        let s3_key = format!(
            "solicitacoes/{}/docs/{}{}",
            solicitation.id,
            random_hex_suffix(),
            extension_for(&doc.mimetype)
        );
        store.upload(&s3_key, doc.bytes.clone(), &doc.mimetype).await?;

        let row = fishsub_db::documents::insert(
            pool,
            fishsub_db::documents::NewDocument {
                solicitation_id: solicitation.id,
                s3_key: &s3_key,
                mimetype: &doc.mimetype,
                file_name: &doc.file_name,
                uploaded_by: &doc.uploaded_by,
            },
        )
        .await
        .map_err(|e| Error::Storage(anyhow::anyhow!(e)))?;

        documents.push(row);
    }

    let classified = stream::iter(documents.into_iter().zip(incoming.into_iter()).map(|(doc, incoming_doc)| {
        let incoming_bytes = incoming_doc.bytes;
        async move {
            let outcome = genai.classify(&incoming_bytes, &doc.mimetype).await;
            let persisted = outcome.map(|(classification, _)| classification);
            let confidence = outcome.and_then(|(_, confidence)| confidence);

            if let Some(c) = persisted {
                if let Err(e) =
                    fishsub_db::documents::set_classification(pool, doc.id, c, confidence).await
                {
                    tracing::warn!(document_id = %doc.id, error = %e, "failed to persist classification");
                    fishsub_core::metrics::METRICS.document_classification_errors.inc();
                    return ClassifiedDocument {
                        document_id: doc.id,
                        classification: None,
                    };
                }
            } else {
                fishsub_core::metrics::METRICS.document_classification_errors.inc();
            }

            ClassifiedDocument {
                document_id: doc.id,
                classification: persisted,
            }
        }
    }))
    .buffer_unordered(config.max_classify_workers)
    .collect::<Vec<_>>()
    .await;

    let classified: Vec<_> = classified.into_iter().filter(|c| c.classification.is_some()).collect();

    if classified.is_empty() {
        return Err(Error::Classification(
            "no document in the batch could be classified".into(),
        ));
    }

    Ok(ClassificationOutcome {
        solicitation_id: solicitation.id,
        documents: classified,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn extension_for_known_mimetypes() {
        assert_eq!(extension_for("application/pdf"), ".pdf");
        assert_eq!(extension_for("image/jpeg"), ".jpg");
        assert_eq!(extension_for("image/png"), ".png");
        assert_eq!(extension_for("image/tiff"), ".tiff");
    }

    #[test]
    fn extension_for_unknown_mimetype_is_empty() {
        assert_eq!(extension_for("application/octet-stream"), "");
    }

    #[test]
    fn random_hex_suffix_is_sixteen_hex_chars() {
        let suffix = random_hex_suffix();
        assert_eq!(suffix.len(), 16);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
