use crate::accreditation::StoreError;
use crate::config::ConfigError;
use crate::telemetry::TelemetryError;

/// Top-level failure for the service and command-line entry points.
///
/// Request handlers answer with their own JSON errors; this type only reaches
/// `main`, which reports it and exits non-zero.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
