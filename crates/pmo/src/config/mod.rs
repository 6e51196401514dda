use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use axum::http::HeaderName;

use crate::access::{EmailDomainPolicy, DEFAULT_EMAIL_HEADER};
use crate::accreditation::attachments::{PathConvention, DEFAULT_PATH_CONVENTIONS};

pub const DEFAULT_SUBMISSIONS_OBJECT: &str = "accreditation/submissions.json";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub storage: StorageConfig,
    pub access: AccessConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            storage: StorageConfig::from_env()?,
            access: AccessConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where submissions and attachments live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Local { data_dir: PathBuf },
    Gcs { bucket: String, gsutil: PathBuf },
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub submissions_object: String,
    pub attachment_paths: Vec<PathConvention>,
}

impl StorageConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let backend = match env::var("PMO_STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "local" | "" => StorageBackend::Local {
                data_dir: env::var("PMO_DATA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("./data")),
            },
            "gcs" => {
                let bucket = non_empty_var("PMO_GCS_BUCKET").ok_or(ConfigError::MissingBucket)?;
                let gsutil = env::var("PMO_GSUTIL_BIN")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("gsutil"));
                StorageBackend::Gcs { bucket, gsutil }
            }
            other => return Err(ConfigError::UnknownStorageBackend(other.to_string())),
        };

        let submissions_object = non_empty_var("PMO_SUBMISSIONS_OBJECT")
            .unwrap_or_else(|| DEFAULT_SUBMISSIONS_OBJECT.to_string());

        let attachment_paths = match non_empty_var("PMO_ATTACHMENT_PATHS") {
            Some(raw) => parse_path_conventions(&raw)?,
            None => PathConvention::defaults(),
        };

        Ok(Self {
            backend,
            submissions_object,
            attachment_paths,
        })
    }
}

/// Identity-provider allow-list settings.
#[derive(Debug, Clone)]
pub struct AccessConfig {
    pub allowed_email_domains: Vec<String>,
    pub email_header: HeaderName,
}

impl AccessConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let allowed_email_domains = non_empty_var("PMO_ALLOWED_EMAIL_DOMAINS")
            .map(|raw| split_list(&raw))
            .unwrap_or_default();

        let header = non_empty_var("PMO_AUTH_EMAIL_HEADER")
            .unwrap_or_else(|| DEFAULT_EMAIL_HEADER.to_string());
        let email_header = HeaderName::from_bytes(header.to_ascii_lowercase().as_bytes())
            .map_err(|_| ConfigError::InvalidAuthHeader(header.clone()))?;

        Ok(Self {
            allowed_email_domains,
            email_header,
        })
    }

    pub fn policy(&self) -> EmailDomainPolicy {
        EmailDomainPolicy::new(&self.allowed_email_domains, self.email_header.clone())
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_path_conventions(raw: &str) -> Result<Vec<PathConvention>, ConfigError> {
    let conventions = split_list(raw)
        .into_iter()
        .map(|template| {
            PathConvention::new(template)
                .map_err(|err| ConfigError::InvalidAttachmentPath(err.0))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if conventions.is_empty() {
        return Err(ConfigError::InvalidAttachmentPath(raw.to_string()));
    }
    Ok(conventions)
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    UnknownStorageBackend(String),
    MissingBucket,
    InvalidAttachmentPath(String),
    InvalidAuthHeader(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::UnknownStorageBackend(value) => write!(
                f,
                "PMO_STORAGE_BACKEND must be 'local' or 'gcs' (got '{}')",
                value
            ),
            ConfigError::MissingBucket => {
                write!(f, "PMO_GCS_BUCKET is required when PMO_STORAGE_BACKEND=gcs")
            }
            ConfigError::InvalidAttachmentPath(value) => write!(
                f,
                "PMO_ATTACHMENT_PATHS entries must contain {{file}} (got '{}'); defaults: {}",
                value,
                DEFAULT_PATH_CONVENTIONS.join(",")
            ),
            ConfigError::InvalidAuthHeader(value) => {
                write!(f, "PMO_AUTH_EMAIL_HEADER '{}' is not a valid header name", value)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
