//! Decoding of stored submission rows into validated [`AccreditationSubmission`]s.
//!
//! Intake writes loosely-shaped rows (every field a string, blanks for "not
//! provided"). Everything past this module works with typed records only.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};
use tracing::warn;

use super::classifier::{parse_document_date, InvalidDate};
use super::domain::{
    AccreditationSubmission, DocumentFieldDescriptor, DocumentRecord, DocumentType,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionEncoding {
    Json,
    Csv,
}

impl SubmissionEncoding {
    /// Picks the encoding from an object key; anything not ending in `.csv` is JSON.
    pub fn from_key(key: &str) -> Self {
        let is_csv = key
            .rsplit_once('.')
            .map(|(_, ext)| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if is_csv {
            Self::Csv
        } else {
            Self::Json
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("malformed submission JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed submission CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("submission row {row} has no employeeId")]
    MissingEmployeeId { row: usize },
    #[error("employee {employee_id}: field {field} holds an {source}")]
    InvalidDate {
        employee_id: String,
        field: &'static str,
        source: InvalidDate,
    },
}

/// Wire names of the per-employee fields outside the descriptor table.
pub const EMPLOYEE_ID_FIELD: &str = "employeeId";
pub const EMPLOYEE_NAME_FIELD: &str = "employeeName";
pub const SUBMITTED_AT_FIELD: &str = "submittedAt";

pub fn decode_submissions(
    bytes: &[u8],
    encoding: SubmissionEncoding,
) -> Result<Vec<AccreditationSubmission>, RecordError> {
    let rows = match encoding {
        SubmissionEncoding::Json => decode_json_rows(bytes)?,
        SubmissionEncoding::Csv => decode_csv_rows(bytes)?,
    };

    rows.into_iter()
        .enumerate()
        .map(|(row, raw)| raw.validate(row))
        .collect()
}

fn decode_json_rows(bytes: &[u8]) -> Result<Vec<RawSubmission>, RecordError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    let rows: Vec<Map<String, Value>> = serde_json::from_slice(bytes)?;
    Ok(rows
        .into_iter()
        .map(|row| {
            RawSubmission::from_fields(
                row.into_iter()
                    .filter_map(|(field, value)| json_text(value).map(|text| (field, text))),
            )
        })
        .collect())
}

fn decode_csv_rows(bytes: &[u8]) -> Result<Vec<RawSubmission>, RecordError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);
    let mut rows = Vec::new();
    for row in reader.deserialize::<HashMap<String, String>>() {
        rows.push(RawSubmission::from_fields(row?));
    }
    Ok(rows)
}

/// Scalar JSON values are read as text; nulls and nested values count as absent.
fn json_text(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// One stored row keyed by wire field name. Blank values are already dropped.
#[derive(Debug, Default)]
struct RawSubmission {
    fields: HashMap<String, String>,
}

impl RawSubmission {
    fn from_fields<I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let fields = fields
            .into_iter()
            .filter_map(|(field, value)| non_blank(value).map(|value| (field, value)))
            .collect();
        Self { fields }
    }

    fn take(&mut self, field: &str) -> Option<String> {
        self.fields.remove(field)
    }

    fn validate(mut self, row: usize) -> Result<AccreditationSubmission, RecordError> {
        let employee_id = self
            .take(EMPLOYEE_ID_FIELD)
            .ok_or(RecordError::MissingEmployeeId { row })?;

        let mut submission = AccreditationSubmission::new(employee_id);
        submission.employee_name = self.take(EMPLOYEE_NAME_FIELD);
        submission.submitted_at = self
            .take(SUBMITTED_AT_FIELD)
            .and_then(|raw| parse_submitted_at(&submission.employee_id, &raw));

        for document_type in DocumentType::ordered() {
            let record = self.document_record(&submission.employee_id, document_type.descriptor())?;
            *submission.document_mut(document_type) = record;
        }

        Ok(submission)
    }

    /// An unreadable expiry date rejects the row; other dates degrade to absent.
    fn document_record(
        &mut self,
        employee_id: &str,
        descriptor: DocumentFieldDescriptor,
    ) -> Result<DocumentRecord, RecordError> {
        let expiry_date = self
            .take(descriptor.expiry_field)
            .map(|value| {
                parse_document_date(&value).map_err(|source| RecordError::InvalidDate {
                    employee_id: employee_id.to_string(),
                    field: descriptor.expiry_field,
                    source,
                })
            })
            .transpose()?;
        let start_date = self.take(descriptor.start_field).and_then(|value| {
            parse_informational_date(employee_id, descriptor.start_field, &value)
        });

        Ok(DocumentRecord {
            number: self.take(descriptor.number_field),
            start_date,
            expiry_date,
            attachment_file_name: descriptor.attachment_field.and_then(|field| self.take(field)),
        })
    }
}

fn parse_informational_date(employee_id: &str, field: &str, value: &str) -> Option<NaiveDate> {
    match parse_document_date(value) {
        Ok(date) => Some(date),
        Err(err) => {
            warn!(employee_id, field, error = %err, "ignoring unreadable date");
            None
        }
    }
}

fn parse_submitted_at(employee_id: &str, value: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(value) {
        Ok(timestamp) => Some(timestamp.with_timezone(&Utc)),
        Err(err) => {
            warn!(
                employee_id,
                field = SUBMITTED_AT_FIELD,
                value,
                error = %err,
                "ignoring unreadable submission timestamp"
            );
            None
        }
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
