//! YAML-loaded prompt registry (spec §4.1). Prompts are loaded once and
//! cached process-wide; template placeholders are substituted at load time
//! from a small constants map, mirroring the original provider's
//! `string.Template.safe_substitute` pass over `system_prompt`/`prompt`.

use std::collections::HashMap;
use std::path::Path;

use fishsub_core::{Error, Result};
use once_cell::sync::OnceCell;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
struct RawPrompt {
    key: String,
    description: Option<String>,
    system_prompt: Option<String>,
    prompt: String,
    response_schema: String,
    #[serde(default = "default_mime")]
    response_mime_type: String,
}

fn default_mime() -> String {
    "application/json".to_string()
}

#[derive(Debug, Deserialize)]
struct RawRegistry {
    prompts: Vec<RawPrompt>,
}

#[derive(Debug, Clone)]
pub struct Prompt {
    pub key: String,
    pub description: Option<String>,
    pub system_prompt: Option<String>,
    pub prompt: String,
    pub response_schema: String,
    pub response_mime_type: String,
}

impl Prompt {
    /// Concatenates `system_prompt` (if any) and `prompt` into the single
    /// text body sent to the provider.
    pub fn build_full_prompt(&self) -> String {
        match &self.system_prompt {
            Some(system) => format!("{system}\n\n{}", self.prompt),
            None => self.prompt.clone(),
        }
    }
}

/// Substitutes `${NAME}` placeholders from `vars`, leaving unknown
/// placeholders untouched (matches `safe_substitute` semantics).
fn substitute(text: &str, vars: &HashMap<&'static str, String>) -> String {
    let mut out = text.to_string();
    for (name, value) in vars {
        out = out.replace(&format!("${{{name}}}"), value);
    }
    out
}

fn common_vars() -> HashMap<&'static str, String> {
    let mut vars = HashMap::new();
    vars.insert(
        "BASE_EXTRACTOR_SYSTEM_PROMPT",
        "Responda apenas com JSON valido; se a informacao nao aparecer, nao a inclua; \
         utilize datas no formato YYYY-MM-DD; nao invente informacoes ausentes no texto."
            .to_string(),
    );
    use fishsub_core::entities::DocumentClassification as Dc;
    let categories = [
        Dc::CertificadoDeRegularidade,
        Dc::Caepf,
        Dc::DeclaracaoDeResidencia,
        Dc::Cnis,
        Dc::TermoDeRepresentacao,
        Dc::Procuracao,
        Dc::GpsEComprovante,
        Dc::Biometria,
        Dc::ComprovanteResidencia,
        Dc::DocumentoIdentidade,
        Dc::Cin,
        Dc::Cpf,
        Dc::Reap,
        Dc::Outro,
    ];
    let enumeration = categories
        .iter()
        .enumerate()
        .map(|(idx, c)| format!("{}. {}", idx + 1, c.as_str()))
        .collect::<Vec<_>>()
        .join("\n");
    vars.insert("DOCUMENT_CATEGORIES_ENUMERATION", enumeration);
    vars
}

pub struct PromptRegistry {
    prompts: HashMap<String, Prompt>,
}

impl PromptRegistry {
    pub fn load_from_str(yaml: &str) -> Result<Self> {
        let raw: RawRegistry = serde_yaml::from_str(yaml)
            .map_err(|e| Error::InvalidInput(format!("invalid prompt YAML: {e}")))?;
        let vars = common_vars();

        let mut prompts = HashMap::new();
        for p in raw.prompts {
            if p.prompt.trim().is_empty() {
                return Err(Error::InvalidInput(format!(
                    "prompt '{}' has an empty body",
                    p.key
                )));
            }
            prompts.insert(
                p.key.clone(),
                Prompt {
                    key: p.key,
                    description: p.description,
                    system_prompt: p.system_prompt.map(|s| substitute(&s, &vars)),
                    prompt: substitute(&p.prompt, &vars),
                    response_schema: p.response_schema,
                    response_mime_type: p.response_mime_type,
                },
            );
        }
        Ok(Self { prompts })
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Domain(anyhow::anyhow!(e)))?;
        Self::load_from_str(&text)
    }

    pub fn get(&self, key: &str) -> Result<&Prompt> {
        self.prompts
            .get(key)
            .ok_or_else(|| Error::InvalidInput(format!("no such prompt: {key}")))
    }
}

static PROMPTS_YAML: &str = include_str!("../prompts/prompts.yaml");

static REGISTRY: OnceCell<PromptRegistry> = OnceCell::new();

/// The default registry, loaded once from the crate's bundled
/// `prompts/prompts.yaml` (spec §4.1 "on first use").
pub fn default_registry() -> &'static PromptRegistry {
    REGISTRY.get_or_init(|| {
        PromptRegistry::load_from_str(PROMPTS_YAML).expect("bundled prompts.yaml is well-formed")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"
prompts:
  - key: classify
    description: "Classifica o documento"
    system_prompt: "${BASE_EXTRACTOR_SYSTEM_PROMPT}"
    prompt: "Classifique o documento anexado."
    response_schema: ClassificationResponse
"#;

    #[test]
    fn loads_and_substitutes_placeholders() {
        let registry = PromptRegistry::load_from_str(SAMPLE).unwrap();
        let p = registry.get("classify").unwrap();
        assert!(p.system_prompt.as_ref().unwrap().contains("JSON valido"));
        assert_eq!(p.response_mime_type, "application/json");
    }

    #[test]
    fn missing_key_is_invalid_input() {
        let registry = PromptRegistry::load_from_str(SAMPLE).unwrap();
        let err = registry.get("nope").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn empty_prompt_body_is_rejected() {
        let bad = "prompts:\n  - key: bad\n    prompt: \"\"\n    response_schema: X\n";
        let err = PromptRegistry::load_from_str(bad).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn bundled_registry_resolves_known_keys() {
        let registry = default_registry();
        assert!(registry.get("classify_document").is_ok());
        assert!(registry.get("evaluate_eligibility").is_ok());
    }
}
