use chrono::{DateTime, Utc};
use fishsub_core::entities::{
    Document, DocumentClassification, DocumentExtraction, EligibilityResult, EligibilityStatus,
    LegalCase, LegalCaseMovement, Priority, SchedulerLock, Solicitation, SolicitationStatus,
};
use sqlx::FromRow;
use uuid::Uuid;

/// Raw row shapes decoded off the wire. Enum columns are stored as `TEXT` and
/// parsed at the boundary (teacher pattern, see `lexodus::SealingLevel::from_db_str`)
/// rather than requiring a Postgres `CREATE TYPE` + `sqlx::Type` derive per enum.

#[derive(Debug, FromRow)]
pub struct SolicitationRow {
    pub id: Uuid,
    pub status: String,
    pub priority: String,
    pub fisher_data: Option<serde_json::Value>,
    pub analysis: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SolicitationRow> for Solicitation {
    fn from(r: SolicitationRow) -> Self {
        Solicitation {
            id: r.id,
            status: SolicitationStatus::from_db_str(&r.status),
            priority: Priority::from_db_str(&r.priority),
            fisher_data: r.fisher_data,
            analysis: r.analysis,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct DocumentRow {
    pub id: Uuid,
    pub solicitation_id: Uuid,
    pub s3_key: String,
    pub mimetype: String,
    pub file_name: String,
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
    pub classification: Option<String>,
    pub confidence: Option<f64>,
}

impl From<DocumentRow> for Document {
    fn from(r: DocumentRow) -> Self {
        Document {
            id: r.id,
            solicitation_id: r.solicitation_id,
            s3_key: r.s3_key,
            mimetype: r.mimetype,
            file_name: r.file_name,
            uploaded_by: r.uploaded_by,
            uploaded_at: r.uploaded_at,
            classification: r.classification.as_deref().map(DocumentClassification::coerce),
            confidence: r.confidence,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct ExtractionRow {
    pub id: Uuid,
    pub document_id: Uuid,
    pub document_type: String,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ExtractionRow> for DocumentExtraction {
    fn from(r: ExtractionRow) -> Self {
        DocumentExtraction {
            id: r.id,
            document_id: r.document_id,
            document_type: r.document_type,
            payload: r.payload,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct EligibilityRow {
    pub id: Uuid,
    pub solicitation_id: Uuid,
    pub status: String,
    pub score_text: String,
    pub pending_items: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EligibilityRow> for EligibilityResult {
    fn from(r: EligibilityRow) -> Self {
        EligibilityResult {
            id: r.id,
            solicitation_id: r.solicitation_id,
            status: EligibilityStatus::from_db_str(&r.status),
            score_text: r.score_text,
            pending_items: r
                .pending_items
                .and_then(|v| serde_json::from_value(v).ok()),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct LegalCaseRow {
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

impl From<LegalCaseRow> for LegalCase {
    fn from(r: LegalCaseRow) -> Self {
        LegalCase {
            id: r.id,
            numero_processo: r.numero_processo,
            court: r.court,
            body: r.body,
            class: r.class,
            subject: r.subject,
            status: r.status,
            filing_date: r.filing_date,
            movimentacoes: r.movimentacoes,
            ultima_movimentacao: r.ultima_movimentacao,
            ultima_movimentacao_descricao: r.ultima_movimentacao_descricao,
            last_synced_at: r.last_synced_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct MovementRow {
    pub id: Uuid,
    pub case_id: Uuid,
    pub movement_date: DateTime<Utc>,
    pub description: String,
}

impl From<MovementRow> for LegalCaseMovement {
    fn from(r: MovementRow) -> Self {
        LegalCaseMovement {
            id: r.id,
            case_id: r.case_id,
            movement_date: r.movement_date,
            description: r.description,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct SchedulerLockRow {
    pub lock_name: String,
    pub acquired_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<SchedulerLockRow> for SchedulerLock {
    fn from(r: SchedulerLockRow) -> Self {
        SchedulerLock {
            lock_name: r.lock_name,
            acquired_at: r.acquired_at,
            expires_at: r.expires_at,
        }
    }
}
