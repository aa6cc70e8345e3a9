use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Closed set of solicitation lifecycle states (spec §3, §4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolicitationStatus {
    Pendente,
    EmAnalise,
    Aprovada,
    Reprovada,
    DocumentacaoIncompleta,
}

impl Default for SolicitationStatus {
    fn default() -> Self {
        SolicitationStatus::Pendente
    }
}

impl SolicitationStatus {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Self::Pendente => "pendente",
            Self::EmAnalise => "em_analise",
            Self::Aprovada => "aprovada",
            Self::Reprovada => "reprovada",
            Self::DocumentacaoIncompleta => "documentacao_incompleta",
        }
    }

    pub fn from_db_str(s: &str) -> Self {
        match s {
            "em_analise" => Self::EmAnalise,
            "aprovada" => Self::Aprovada,
            "reprovada" => Self::Reprovada,
            "documentacao_incompleta" => Self::DocumentacaoIncompleta,
            _ => Self::Pendente,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Baixa,
    Media,
    Alta,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Baixa
    }
}

impl Priority {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Self::Baixa => "baixa",
            Self::Media => "media",
            Self::Alta => "alta",
        }
    }

    pub fn from_db_str(s: &str) -> Self {
        match s {
            "media" => Self::Media,
            "alta" => Self::Alta,
            _ => Self::Baixa,
        }
    }
}

/// Closed document-classification enum (spec §6). `Outro` is the sentinel
/// fallback; unknown strings coerce to it (spec §9 Open Questions: the union
/// of both source copies of `CategoriaDocumento` is accepted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentClassification {
    CertificadoDeRegularidade,
    Caepf,
    DeclaracaoDeResidencia,
    Cnis,
    TermoDeRepresentacao,
    Procuracao,
    GpsEComprovante,
    Biometria,
    ComprovanteResidencia,
    DocumentoIdentidade,
    Cin,
    Cpf,
    Reap,
    Outro,
}

impl DocumentClassification {
    /// Parse a provider/prompt-emitted label, coercing anything unrecognised
    /// to the `Outro` sentinel rather than erroring (spec §6).
    pub fn coerce(label: &str) -> Self {
        let normalized = label.trim().to_uppercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "CERTIFICADO_DE_REGULARIDADE" => Self::CertificadoDeRegularidade,
            "CAEPF" => Self::Caepf,
            "DECLARACAO_DE_RESIDENCIA" => Self::DeclaracaoDeResidencia,
            "CNIS" => Self::Cnis,
            "TERMO_DE_REPRESENTACAO" => Self::TermoDeRepresentacao,
            "PROCURACAO" => Self::Procuracao,
            "GPS_E_COMPROVANTE" => Self::GpsEComprovante,
            "BIOMETRIA" => Self::Biometria,
            "COMPROVANTE_RESIDENCIA" => Self::ComprovanteResidencia,
            "DOCUMENTO_IDENTIDADE" => Self::DocumentoIdentidade,
            "CIN" => Self::Cin,
            "CPF" => Self::Cpf,
            "REAP" => Self::Reap,
            _ => Self::Outro,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CertificadoDeRegularidade => "CERTIFICADO_DE_REGULARIDADE",
            Self::Caepf => "CAEPF",
            Self::DeclaracaoDeResidencia => "DECLARACAO_DE_RESIDENCIA",
            Self::Cnis => "CNIS",
            Self::TermoDeRepresentacao => "TERMO_DE_REPRESENTACAO",
            Self::Procuracao => "PROCURACAO",
            Self::GpsEComprovante => "GPS_E_COMPROVANTE",
            Self::Biometria => "BIOMETRIA",
            Self::ComprovanteResidencia => "COMPROVANTE_RESIDENCIA",
            Self::DocumentoIdentidade => "DOCUMENTO_IDENTIDADE",
            Self::Cin => "CIN",
            Self::Cpf => "CPF",
            Self::Reap => "REAP",
            Self::Outro => "OUTRO",
        }
    }
}

/// Mimetypes accepted by the classification stage (spec §4.4).
pub const ALLOWED_MIMETYPES: &[&str] = &[
    "application/pdf",
    "image/jpeg",
    "image/png",
    "image/tiff",
];

pub const MAX_DOCUMENTS_PER_BATCH: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityStatus {
    Apto,
    NaoApto,
}

impl EligibilityStatus {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Self::Apto => "apto",
            Self::NaoApto => "nao_apto",
        }
    }

    pub fn from_db_str(s: &str) -> Self {
        match s {
            "apto" => Self::Apto,
            _ => Self::NaoApto,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Solicitation {
    pub id: Uuid,
    pub status: SolicitationStatus,
    pub priority: Priority,
    pub fisher_data: Option<serde_json::Value>,
    pub analysis: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub solicitation_id: Uuid,
    pub s3_key: String,
    pub mimetype: String,
    pub file_name: String,
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
    pub classification: Option<DocumentClassification>,
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentExtraction {
    pub id: Uuid,
    pub document_id: Uuid,
    pub document_type: String,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EligibilityResult {
    pub id: Uuid,
    pub solicitation_id: Uuid,
    pub status: EligibilityStatus,
    pub score_text: String,
    pub pending_items: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EligibilityResult {
    /// Maps `{status, pending_items}` onto the solicitation status per spec §4.6 step 8.
    pub fn target_solicitation_status(&self) -> SolicitationStatus {
        match self.status {
            EligibilityStatus::Apto => SolicitationStatus::Aprovada,
            EligibilityStatus::NaoApto => {
                if self
                    .pending_items
                    .as_ref()
                    .map(|items| !items.is_empty())
                    .unwrap_or(false)
                {
                    SolicitationStatus::DocumentacaoIncompleta
                } else {
                    SolicitationStatus::Reprovada
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegalCase {
    pub id: Uuid,
    pub numero_processo: String,
    pub court: String,
    pub body: Option<String>,
    pub class: Option<String>,
    pub subject: Option<String>,
    pub status: Option<String>,
    pub filing_date: Option<DateTime<Utc>>,
    pub movimentacoes: i64,
    pub ultima_movimentacao: Option<DateTime<Utc>>,
    pub ultima_movimentacao_descricao: Option<String>,
    pub last_synced_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegalCaseMovement {
    pub id: Uuid,
    pub case_id: Uuid,
    pub movement_date: DateTime<Utc>,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerLock {
    pub lock_name: String,
    pub acquired_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn unknown_classification_coerces_to_outro() {
        assert_eq!(DocumentClassification::coerce("algo_desconhecido"), DocumentClassification::Outro);
        assert_eq!(DocumentClassification::coerce("cnis"), DocumentClassification::Cnis);
        assert_eq!(DocumentClassification::coerce("Gps E Comprovante"), DocumentClassification::GpsEComprovante);
    }

    #[test]
    fn eligibility_maps_to_solicitation_status() {
        let apto = EligibilityResult {
            id: Uuid::new_v4(),
            solicitation_id: Uuid::new_v4(),
            status: EligibilityStatus::Apto,
            score_text: "80".into(),
            pending_items: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(apto.target_solicitation_status(), SolicitationStatus::Aprovada);

        let incomplete = EligibilityResult {
            status: EligibilityStatus::NaoApto,
            pending_items: Some(vec!["cnis ausente".into()]),
            ..apto.clone()
        };
        assert_eq!(
            incomplete.target_solicitation_status(),
            SolicitationStatus::DocumentacaoIncompleta
        );

        let reproved = EligibilityResult {
            status: EligibilityStatus::NaoApto,
            pending_items: Some(vec![]),
            ..apto
        };
        assert_eq!(reproved.target_solicitation_status(), SolicitationStatus::Reprovada);
    }
}
