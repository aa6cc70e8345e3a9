/// The error taxonomy surfaced by the pipeline core. Every variant maps 1:1
/// to an HTTP status class at the edge; the core itself stays agnostic to
/// presentation and never constructs localized messages.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("document not found: {0}")]
    DocumentNotFound(uuid::Uuid),

    #[error("solicitation not found: {0}")]
    SolicitationNotFound(uuid::Uuid),

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("storage error: {0}")]
    Storage(#[source] anyhow::Error),

    #[error("classification failed: {0}")]
    Classification(String),

    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("unsupported document type: {0}")]
    UnsupportedDocument(String),

    #[error("incomplete data: {0}")]
    IncompleteData(String),

    #[error("eligibility computation failed: {0}")]
    EligibilityComputation(String),

    #[error("legal case not found: {0}")]
    LegalCaseNotFound(String),

    #[error("legal case persistence failed: {0}")]
    LegalCasePersistence(#[source] anyhow::Error),

    #[error("external provider rate limit exhausted")]
    ExternalRateLimit,

    #[error("domain error: {0}")]
    Domain(#[source] anyhow::Error),
}

impl Error {
    /// The HTTP status class this error maps to, per spec §7.
    pub fn status_class(&self) -> u16 {
        match self {
            Error::InvalidInput(_) => 422,
            Error::DocumentNotFound(_) | Error::SolicitationNotFound(_) => 404,
            Error::LegalCaseNotFound(_) => 404,
            Error::Upload(_) | Error::Storage(_) | Error::LegalCasePersistence(_) => 502,
            Error::Classification(_)
            | Error::Extraction(_)
            | Error::UnsupportedDocument(_)
            | Error::IncompleteData(_)
            | Error::EligibilityComputation(_) => 422,
            Error::ExternalRateLimit => 503,
            Error::Domain(_) => 500,
        }
    }

    /// A short machine-stable code for the edge to attach alongside the
    /// localized message it composes for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidInput(_) => "invalid_input",
            Error::DocumentNotFound(_) => "document_not_found",
            Error::SolicitationNotFound(_) => "solicitation_not_found",
            Error::Upload(_) => "upload_failed",
            Error::Storage(_) => "storage_error",
            Error::Classification(_) => "classification_failed",
            Error::Extraction(_) => "extraction_failed",
            Error::UnsupportedDocument(_) => "unsupported_document",
            Error::IncompleteData(_) => "incomplete_data",
            Error::EligibilityComputation(_) => "eligibility_computation_failed",
            Error::LegalCaseNotFound(_) => "legal_case_not_found",
            Error::LegalCasePersistence(_) => "legal_case_persistence_failed",
            Error::ExternalRateLimit => "external_rate_limit",
            Error::Domain(_) => "domain_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
