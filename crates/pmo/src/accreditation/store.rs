use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use super::domain::AccreditationSubmission;
use super::records::{decode_submissions, RecordError, SubmissionEncoding};
use super::storage::ObjectStore;

/// Source of every accreditation submission captured by intake.
pub trait SubmissionStore: Send + Sync {
    fn fetch_all_submissions(&self) -> Result<Vec<AccreditationSubmission>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("submission storage unavailable: {0}")]
    Unavailable(String),
    #[error("submission storage holds an invalid record: {0}")]
    InvalidRecord(#[from] RecordError),
}

/// Submissions kept as a single flat JSON or CSV blob in object storage.
#[derive(Debug)]
pub struct ObjectSubmissionStore<O> {
    objects: Arc<O>,
    key: String,
}

impl<O> ObjectSubmissionStore<O>
where
    O: ObjectStore,
{
    pub fn new(objects: Arc<O>, key: impl Into<String>) -> Self {
        Self {
            objects,
            key: key.into(),
        }
    }
}

impl<O> SubmissionStore for ObjectSubmissionStore<O>
where
    O: ObjectStore,
{
    fn fetch_all_submissions(&self) -> Result<Vec<AccreditationSubmission>, StoreError> {
        let bytes = self.objects.read(&self.key).map_err(|err| {
            warn!(key = %self.key, error = %err, "failed to read submissions");
            StoreError::Unavailable(err.to_string())
        })?;

        let encoding = SubmissionEncoding::from_key(&self.key);
        decode_submissions(&bytes, encoding).map_err(|err| {
            warn!(key = %self.key, error = %err, "failed to decode submissions");
            StoreError::InvalidRecord(err)
        })
    }
}

/// Keeps the most recent submission per employee.
///
/// Rows are append-ordered, so the last row for an employee wins. The kept row
/// takes the position where that employee first appeared.
pub fn latest_per_employee(
    submissions: Vec<AccreditationSubmission>,
) -> Vec<AccreditationSubmission> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut latest: Vec<AccreditationSubmission> = Vec::with_capacity(submissions.len());

    for submission in submissions {
        match positions.get(&submission.employee_id) {
            Some(&index) => latest[index] = submission,
            None => {
                positions.insert(submission.employee_id.clone(), latest.len());
                latest.push(submission);
            }
        }
    }

    latest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accreditation::storage::ObjectStoreError;
    use chrono::NaiveDate;

    #[derive(Debug, Default)]
    struct FixedObjects {
        objects: HashMap<String, Vec<u8>>,
    }

    impl FixedObjects {
        fn with(key: &str, body: &str) -> Self {
            let mut objects = HashMap::new();
            objects.insert(key.to_string(), body.as_bytes().to_vec());
            Self { objects }
        }
    }

    impl ObjectStore for FixedObjects {
        fn read(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
            self.objects
                .get(key)
                .cloned()
                .ok_or_else(|| ObjectStoreError::NotFound {
                    key: key.to_string(),
                })
        }
    }

    #[test]
    fn reads_and_decodes_json_blob() {
        let objects = Arc::new(FixedObjects::with(
            "accreditation/submissions.json",
            r#"[{ "employeeId": "EMP-1", "visaExpiryDate": "2024-02-10" }]"#,
        ));
        let store = ObjectSubmissionStore::new(objects, "accreditation/submissions.json");

        let submissions = store.fetch_all_submissions().expect("fetches");
        assert_eq!(submissions.len(), 1);
        assert_eq!(
            submissions[0].visa.expiry_date,
            NaiveDate::from_ymd_opt(2024, 2, 10)
        );
    }

    #[test]
    fn reads_csv_blob_by_extension() {
        let objects = Arc::new(FixedObjects::with(
            "exports/submissions.csv",
            "employeeId,molExpiryDate\nEMP-7,2024-04-01\n",
        ));
        let store = ObjectSubmissionStore::new(objects, "exports/submissions.csv");

        let submissions = store.fetch_all_submissions().expect("fetches");
        assert_eq!(submissions[0].employee_id, "EMP-7");
    }

    #[test]
    fn missing_blob_is_unavailable() {
        let store = ObjectSubmissionStore::new(
            Arc::new(FixedObjects::default()),
            "accreditation/submissions.json",
        );

        let err = store.fetch_all_submissions().expect_err("no blob");
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[test]
    fn malformed_blob_is_an_invalid_record() {
        let objects = Arc::new(FixedObjects::with("submissions.json", "{ not json"));
        let store = ObjectSubmissionStore::new(objects, "submissions.json");

        let err = store.fetch_all_submissions().expect_err("bad json");
        assert!(matches!(err, StoreError::InvalidRecord(RecordError::Json(_))));
    }

    #[test]
    fn latest_submission_replaces_earlier_in_place() {
        let mut first = AccreditationSubmission::new("EMP-1");
        first.passport.number = Some("OLD".to_string());
        let second = AccreditationSubmission::new("EMP-2");
        let mut resubmitted = AccreditationSubmission::new("EMP-1");
        resubmitted.passport.number = Some("NEW".to_string());

        let latest = latest_per_employee(vec![first, second, resubmitted]);
        let ids: Vec<&str> = latest.iter().map(|s| s.employee_id.as_str()).collect();
        assert_eq!(ids, vec!["EMP-1", "EMP-2"]);
        assert_eq!(latest[0].passport.number.as_deref(), Some("NEW"));
    }
}
