//! Transactional persistence for solicitations, documents, extractions,
//! eligibility verdicts, legal cases, and scheduler locks (spec C4).
//!
//! Free functions take `&PgPool` or `&mut Transaction<'_, Postgres>`.
//! Callers in `fishsub-pipeline` and `fishsub-scheduler` open a transaction
//! per use case and commit on clean return, rolling back on any raised error
//! (spec §5).

pub mod documents;
pub mod eligibility;
pub mod extractions;
pub mod legal_cases;
pub mod scheduler_lock;
pub mod solicitations;

mod rows;

pub use rows::*;
