use chrono::NaiveDate;
use serde::Serialize;

use super::classifier::classify;
use super::domain::{
    AccreditationSubmission, DocumentType, ExpiryAlert, ExpiryStatus, MISSING_DOCUMENT_NUMBER,
};

/// Alerts across every submission, most urgent first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertReport {
    pub alerts: Vec<ExpiryAlert>,
    pub total_expired: usize,
}

impl AlertReport {
    pub fn count(&self, status: ExpiryStatus) -> usize {
        self.alerts
            .iter()
            .filter(|alert| alert.status == status)
            .count()
    }

    pub fn retain_status(&mut self, status: ExpiryStatus) {
        self.alerts.retain(|alert| alert.status == status);
        self.total_expired = self.count(ExpiryStatus::Expired);
    }
}

pub fn collect_alerts(submissions: &[AccreditationSubmission], today: NaiveDate) -> AlertReport {
    let mut alerts: Vec<ExpiryAlert> = submissions
        .iter()
        .flat_map(|submission| {
            DocumentType::ordered()
                .into_iter()
                .filter_map(move |document_type| alert_for(submission, document_type, today))
        })
        .collect();

    alerts.sort_by_key(|alert| alert.days_until_expiry);
    let total_expired = alerts
        .iter()
        .filter(|alert| alert.status == ExpiryStatus::Expired)
        .count();

    AlertReport {
        alerts,
        total_expired,
    }
}

fn alert_for(
    submission: &AccreditationSubmission,
    document_type: DocumentType,
    today: NaiveDate,
) -> Option<ExpiryAlert> {
    let document = submission.document(document_type);
    let expiry_date = document.expiry_date?;
    let assessment = classify(expiry_date, today);
    if !assessment.within_alert_window() {
        return None;
    }

    Some(ExpiryAlert {
        employee_id: submission.employee_id.clone(),
        employee_name: submission.employee_name.clone(),
        document_type: document_type.descriptor().label(),
        document_number: document
            .number
            .clone()
            .unwrap_or_else(|| MISSING_DOCUMENT_NUMBER.to_string()),
        expiry_date,
        days_until_expiry: assessment.days_until_expiry,
        status: assessment.status,
        attachment_file_name: document.attachment_file_name.clone(),
    })
}
