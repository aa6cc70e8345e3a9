//! Eligibility stage (C7, spec §4.6): loads a solicitation's documents and
//! extractions, evaluates them against the opaque rules text, normalises
//! the verdict, and persists it.

use fishsub_core::entities::EligibilityResult;
use fishsub_core::{Error, Result};
use fishsub_genai::{GenAiGateway, GenAiProvider};
use once_cell::sync::OnceCell;
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

/// The rules text is read once and cached for the process lifetime (spec
/// §4.6 step 4) — it never changes while the service is running.
static RULES_TEXT: OnceCell<String> = OnceCell::new();

pub fn rules_text(path: &str) -> Result<&'static str> {
    if let Some(cached) = RULES_TEXT.get() {
        return Ok(cached);
    }
    let text = std::fs::read_to_string(path).map_err(|e| Error::Domain(anyhow::anyhow!(e)))?;
    Ok(RULES_TEXT.get_or_init(|| text))
}

/// Strips accents, lowercases, and drops non-alphabetic characters, then
/// maps the remaining token onto the closed `apto`/`nao_apto` pair (spec
/// §4.6 step 6). Falls back to a contains-based heuristic, then the
/// conservative default `nao_apto`.
fn normalize_status(raw: &str) -> &'static str {
    let folded: String = raw
        .nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .collect();

    match folded.as_str() {
        "apto" | "eligible" | "eligivel" => "apto",
        "naoapto" | "naoelegivel" | "ineligible" | "noteligible" | "reprovado" => "nao_apto",
        _ if folded.contains("apto") && !folded.contains("nao") => "apto",
        _ => "nao_apto",
    }
}

pub async fn evaluate_eligibility<P: GenAiProvider>(
    pool: &sqlx::PgPool,
    genai: &GenAiGateway<P>,
    rules_path: &str,
    solicitation_id: Uuid,
) -> Result<EligibilityResult> {
    let solicitation = fishsub_db::solicitations::get_by_id(pool, solicitation_id)
        .await
        .map_err(|e| Error::Storage(anyhow::anyhow!(e)))?
        .ok_or(Error::SolicitationNotFound(solicitation_id))?;

    let documents = fishsub_db::documents::list_by_solicitation(pool, solicitation_id)
        .await
        .map_err(|e| Error::Storage(anyhow::anyhow!(e)))?;
    if documents.is_empty() {
        return Err(Error::IncompleteData(
            "solicitation has no documents".into(),
        ));
    }

    let document_ids: Vec<Uuid> = documents.iter().map(|d| d.id).collect();
    let extractions = fishsub_db::extractions::list_by_document_ids(pool, &document_ids)
        .await
        .map_err(|e| Error::Storage(anyhow::anyhow!(e)))?;
    if extractions.is_empty() {
        return Err(Error::IncompleteData(
            "solicitation has no document extractions".into(),
        ));
    }

    let rules = rules_text(rules_path)?;

    // Documents lacking an extraction are omitted from the evaluation
    // payload (spec §4.6 step 3).
    let extracted_document_ids: std::collections::HashSet<Uuid> =
        extractions.iter().map(|e| e.document_id).collect();
    let extracted_documents: Vec<_> = documents
        .into_iter()
        .filter(|d| extracted_document_ids.contains(&d.id))
        .collect();
    let extraction_payloads: Vec<serde_json::Value> =
        extractions.iter().map(|e| e.payload.clone()).collect();

    let outcome = genai
        .evaluate(&solicitation, &extracted_documents, &extraction_payloads, rules)
        .await?;

    let status = fishsub_core::entities::EligibilityStatus::from_db_str(normalize_status(&outcome.status));

    let result = fishsub_db::eligibility::upsert(
        pool,
        solicitation_id,
        status,
        &outcome.score_texto,
        &outcome.pendencias,
    )
    .await
    .map_err(|e| Error::Storage(anyhow::anyhow!(e)))?;

    // Best-effort: the eligibility record is the authoritative artifact,
    // so a failure here is logged and swallowed (spec §4.6 step 8).
    let target_status = result.target_solicitation_status();
    if let Err(e) = fishsub_db::solicitations::update_status(pool, solicitation_id, target_status).await {
        tracing::warn!(solicitation_id = %solicitation_id, error = %e, "failed to update solicitation status after eligibility verdict");
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn normalizes_accented_and_mixed_case_variants() {
        assert_eq!(normalize_status("Apto"), "apto");
        assert_eq!(normalize_status("ELEGÍVEL"), "apto");
        assert_eq!(normalize_status("Não Apto"), "nao_apto");
        assert_eq!(normalize_status("inelegível"), "nao_apto");
        assert_eq!(normalize_status("reprovado"), "nao_apto");
    }

    #[test]
    fn unrecognized_text_defaults_to_conservative_nao_apto() {
        assert_eq!(normalize_status("sem informacao suficiente"), "nao_apto");
    }

    #[test]
    fn contains_based_heuristic_catches_unlisted_positive_phrasing() {
        assert_eq!(normalize_status("candidato apto para o beneficio"), "apto");
    }
}
