use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, warn};

use super::aggregator::AlertReport;
use super::classifier::{parse_document_date, reference_today};
use super::service::{AccreditationError, AccreditationService};
use super::storage::ObjectStore;
use super::store::SubmissionStore;

pub const EXPIRY_PATH: &str = "/accreditation-expiry";
pub const ATTACHMENT_PATH: &str = "/accreditation-attachment";

/// Router builder exposing expiry alerts and attachment downloads.
pub fn accreditation_router<S, O>(service: Arc<AccreditationService<S, O>>) -> Router
where
    S: SubmissionStore + 'static,
    O: ObjectStore + 'static,
{
    Router::new()
        .route(EXPIRY_PATH, get(expiry_handler::<S, O>))
        .route(ATTACHMENT_PATH, get(attachment_handler::<S, O>))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ExpiryQuery {
    #[serde(default)]
    pub(crate) today: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AttachmentQuery {
    #[serde(default)]
    pub(crate) file: Option<String>,
    #[serde(default, rename = "empId")]
    pub(crate) emp_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct ExpiryResponse<'a> {
    success: bool,
    #[serde(flatten)]
    report: &'a AlertReport,
}

pub(crate) async fn expiry_handler<S, O>(
    State(service): State<Arc<AccreditationService<S, O>>>,
    query: Result<Query<ExpiryQuery>, QueryRejection>,
) -> Response
where
    S: SubmissionStore + 'static,
    O: ObjectStore + 'static,
{
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => return query_rejected(rejection),
    };
    let today = match query.today.as_deref() {
        Some(raw) => match parse_document_date(raw) {
            Ok(date) => date,
            Err(err) => {
                return error_response(AccreditationError::Validation(format!("today: {err}")))
            }
        },
        None => reference_today(),
    };

    let outcome = tokio::task::spawn_blocking(move || service.expiry_alerts(today)).await;
    match outcome {
        Ok(Ok(report)) => {
            let payload = ExpiryResponse {
                success: true,
                report: &report,
            };
            (StatusCode::OK, Json(payload)).into_response()
        }
        Ok(Err(err)) => error_response(err),
        Err(join_error) => {
            error!(error = %join_error, "expiry computation task failed");
            internal_error()
        }
    }
}

pub(crate) async fn attachment_handler<S, O>(
    State(service): State<Arc<AccreditationService<S, O>>>,
    query: Result<Query<AttachmentQuery>, QueryRejection>,
) -> Response
where
    S: SubmissionStore + 'static,
    O: ObjectStore + 'static,
{
    let AttachmentQuery { file, emp_id } = match query {
        Ok(Query(query)) => query,
        Err(rejection) => return query_rejected(rejection),
    };
    let outcome = tokio::task::spawn_blocking(move || {
        service.attachment(emp_id.as_deref(), file.as_deref())
    })
    .await;

    match outcome {
        Ok(Ok(attachment)) => {
            let content_type = HeaderValue::from_str(attachment.content_type.as_ref())
                .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
            let disposition = content_disposition(&attachment.file_name);

            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, content_type),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                attachment.bytes,
            )
                .into_response()
        }
        Ok(Err(err)) => error_response(err),
        Err(join_error) => {
            error!(error = %join_error, "attachment task failed");
            internal_error()
        }
    }
}

/// `Content-Disposition` for a download. Non-ASCII names keep an ASCII
/// `filename` fallback and carry the real name as RFC 5987 `filename*`.
pub(crate) fn content_disposition(file_name: &str) -> HeaderValue {
    let fallback: String = file_name
        .chars()
        .map(|ch| match ch {
            ' '..='~' if ch != '"' && ch != '\\' => ch,
            _ => '_',
        })
        .collect();
    let mut value = format!("attachment; filename=\"{fallback}\"");
    if !file_name.is_ascii() {
        value.push_str("; filename*=UTF-8''");
        value.push_str(&encode_ext_value(file_name));
    }
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

fn encode_ext_value(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len() * 3);
    for byte in value.bytes() {
        let keep = byte.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&byte);
        if keep {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    encoded
}

fn query_rejected(rejection: QueryRejection) -> Response {
    error_response(AccreditationError::Validation(format!(
        "invalid query: {}",
        rejection.body_text()
    )))
}

fn error_response(err: AccreditationError) -> Response {
    let status = err.status_code();
    match &err {
        AccreditationError::Storage(source) => {
            error!(error = %source, "accreditation storage failure");
        }
        AccreditationError::NotFound(source) => {
            warn!(error = %source, "accreditation attachment missing");
        }
        AccreditationError::Validation(message) => {
            warn!(%message, "rejected accreditation request");
        }
    }

    let payload = json!({ "error": err.public_message() });
    (status, Json(payload)).into_response()
}

fn internal_error() -> Response {
    let payload = json!({ "error": "internal server error" });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
}
