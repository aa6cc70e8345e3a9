//! The three document-processing stages (C5/C6/C7) and their shared
//! concurrency primitives (spec §4.4-§4.6, §5).

pub mod classification;
pub mod eligibility;
pub mod extraction;
pub mod locks;

pub use classification::{classify_batch, ClassificationOutcome, ClassifiedDocument, IncomingDocument};
pub use eligibility::evaluate_eligibility;
pub use extraction::{extract_documents, ExtractionOutcome, ExtractionTarget};
pub use locks::DocumentLockRegistry;
