use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::accreditation::attachments::AttachmentResolver;
use crate::accreditation::domain::AccreditationSubmission;
use crate::accreditation::service::AccreditationService;
use crate::accreditation::storage::{ObjectStore, ObjectStoreError};
use crate::accreditation::store::{StoreError, SubmissionStore};

pub(super) fn reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date")
}

pub(super) fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("valid date")
}

pub(super) fn submissions() -> Vec<AccreditationSubmission> {
    let mut first = AccreditationSubmission::new("EMP-001");
    first.employee_name = Some("Omar Farouk".to_string());
    first.emirates_id.number = Some("784-1990-1234567-1".to_string());
    first.emirates_id.expiry_date = Some(date("2024-01-20"));
    first.emirates_id.attachment_file_name = Some("eid.pdf".to_string());
    first.passport.number = Some("P7654321".to_string());
    first.passport.expiry_date = Some(date("2024-12-01"));

    let mut second = AccreditationSubmission::new("EMP-002");
    second.mol.expiry_date = Some(date("2023-06-01"));
    second.visa.number = Some("VISA-55".to_string());
    second.visa.expiry_date = Some(date("2024-03-01"));

    vec![first, second]
}

#[derive(Default)]
pub(super) struct MemorySubmissions {
    submissions: Mutex<Vec<AccreditationSubmission>>,
    fetches: Mutex<usize>,
}

impl MemorySubmissions {
    pub(super) fn with(submissions: Vec<AccreditationSubmission>) -> Self {
        Self {
            submissions: Mutex::new(submissions),
            fetches: Mutex::new(0),
        }
    }

    pub(super) fn push(&self, submission: AccreditationSubmission) {
        self.submissions
            .lock()
            .expect("submissions mutex poisoned")
            .push(submission);
    }

    pub(super) fn fetches(&self) -> usize {
        *self.fetches.lock().expect("fetch mutex poisoned")
    }
}

impl SubmissionStore for MemorySubmissions {
    fn fetch_all_submissions(&self) -> Result<Vec<AccreditationSubmission>, StoreError> {
        *self.fetches.lock().expect("fetch mutex poisoned") += 1;
        Ok(self
            .submissions
            .lock()
            .expect("submissions mutex poisoned")
            .clone())
    }
}

pub(super) struct UnavailableSubmissions;

impl SubmissionStore for UnavailableSubmissions {
    fn fetch_all_submissions(&self) -> Result<Vec<AccreditationSubmission>, StoreError> {
        Err(StoreError::Unavailable("bucket offline".to_string()))
    }
}

#[derive(Debug, Default)]
pub(super) struct MemoryObjects {
    objects: HashMap<String, Vec<u8>>,
}

impl MemoryObjects {
    pub(super) fn with(entries: &[(&str, &[u8])]) -> Self {
        Self {
            objects: entries
                .iter()
                .map(|(key, bytes)| (key.to_string(), bytes.to_vec()))
                .collect(),
        }
    }
}

impl ObjectStore for MemoryObjects {
    fn read(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        self.objects
            .get(key)
            .cloned()
            .ok_or_else(|| ObjectStoreError::NotFound {
                key: key.to_string(),
            })
    }
}

pub(super) fn attachment_objects() -> MemoryObjects {
    MemoryObjects::with(&[
        ("accreditation/EMP-001/eid.pdf", &b"%PDF-1.7 eid"[..]),
        ("uploads/EMP-002_visa.JPG", &b"\xFF\xD8\xFF"[..]),
    ])
}

pub(super) type TestService = AccreditationService<MemorySubmissions, MemoryObjects>;

pub(super) fn build_service() -> (TestService, Arc<MemorySubmissions>) {
    let submissions = Arc::new(MemorySubmissions::with(submissions()));
    let resolver = Arc::new(AttachmentResolver::with_default_conventions(Arc::new(
        attachment_objects(),
    )));
    let service = AccreditationService::new(submissions.clone(), resolver);
    (service, submissions)
}

pub(super) fn unavailable_service() -> AccreditationService<UnavailableSubmissions, MemoryObjects> {
    let resolver = Arc::new(AttachmentResolver::with_default_conventions(Arc::new(
        MemoryObjects::default(),
    )));
    AccreditationService::new(Arc::new(UnavailableSubmissions), resolver)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn read_bytes_body(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body")
        .to_vec()
}
