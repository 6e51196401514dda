use std::sync::Arc;

use axum::http::StatusCode;
use chrono::NaiveDate;
use tracing::{info, warn};

use super::aggregator::{collect_alerts, AlertReport};
use super::attachments::{Attachment, AttachmentError, AttachmentResolver};
use super::storage::ObjectStore;
use super::store::{latest_per_employee, StoreError, SubmissionStore};

/// Service composing the submission store, alert aggregation, and attachment lookup.
pub struct AccreditationService<S, O> {
    submissions: Arc<S>,
    attachments: Arc<AttachmentResolver<O>>,
}

impl<S, O> AccreditationService<S, O>
where
    S: SubmissionStore + 'static,
    O: ObjectStore + 'static,
{
    pub fn new(submissions: Arc<S>, attachments: Arc<AttachmentResolver<O>>) -> Self {
        Self {
            submissions,
            attachments,
        }
    }

    /// Recomputes every expiry alert against `today` from a fresh snapshot.
    pub fn expiry_alerts(&self, today: NaiveDate) -> Result<AlertReport, AccreditationError> {
        let submissions = self.submissions.fetch_all_submissions()?;
        let fetched = submissions.len();
        let submissions = latest_per_employee(submissions);
        let report = collect_alerts(&submissions, today);

        info!(
            %today,
            fetched,
            employees = submissions.len(),
            alerts = report.alerts.len(),
            expired = report.total_expired,
            "computed accreditation expiry alerts"
        );

        Ok(report)
    }

    /// Validates the request parameters and streams the stored attachment.
    pub fn attachment(
        &self,
        employee_id: Option<&str>,
        file: Option<&str>,
    ) -> Result<Attachment, AccreditationError> {
        let file = required("file", file)?;
        let employee_id = required("empId", employee_id)?;

        if file.contains("..") {
            warn!(%employee_id, %file, "rejected attachment path traversal");
            return Err(AccreditationError::Validation(
                "file must not contain '..'".to_string(),
            ));
        }
        if employee_id.contains("..") || employee_id.contains(['/', '\\']) {
            warn!(%employee_id, %file, "rejected malformed employee id");
            return Err(AccreditationError::Validation(
                "empId must not contain path separators or '..'".to_string(),
            ));
        }

        Ok(self.attachments.fetch_attachment(employee_id, file)?)
    }
}

fn required<'a>(name: &str, value: Option<&'a str>) -> Result<&'a str, AccreditationError> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            AccreditationError::Validation(format!("missing required parameter {name}"))
        })
}

/// Errors surfaced by the accreditation endpoints.
#[derive(Debug, thiserror::Error)]
pub enum AccreditationError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    NotFound(#[from] AttachmentError),
    #[error("failed to retrieve accreditation submissions: {0}")]
    Storage(#[from] StoreError),
}

impl AccreditationError {
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message returned to callers; storage details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::NotFound(_) => "attachment not found".to_string(),
            Self::Storage(_) => "failed to retrieve accreditation data".to_string(),
        }
    }
}
