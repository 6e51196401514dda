//! Accreditation document tracking: expiry classification, alert aggregation,
//! and attachment retrieval over the submissions captured by intake.

pub mod aggregator;
pub mod attachments;
pub mod classifier;
pub mod domain;
pub mod records;
pub mod router;
pub mod service;
pub mod storage;
pub mod store;

#[cfg(test)]
mod tests;

pub use aggregator::{collect_alerts, AlertReport};
pub use attachments::{
    content_type_for, Attachment, AttachmentError, AttachmentResolver, InvalidPathConvention,
    PathConvention,
};
pub use classifier::{classify, classify_str, reference_today, ExpiryAssessment, InvalidDate};
pub use domain::{
    AccreditationSubmission, DocumentFieldDescriptor, DocumentRecord, DocumentType, ExpiryAlert,
    ExpiryStatus,
};
pub use records::{RecordError, SubmissionEncoding};
pub use router::accreditation_router;
pub use service::{AccreditationError, AccreditationService};
pub use storage::{GsutilObjectStore, LocalObjectStore, ObjectStore, ObjectStoreError};
pub use store::{latest_per_employee, ObjectSubmissionStore, StoreError, SubmissionStore};
