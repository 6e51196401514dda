use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use pmo::accreditation::{
    AttachmentResolver, GsutilObjectStore, LocalObjectStore, ObjectStore, ObjectStoreError,
    ObjectSubmissionStore,
};
use pmo::config::{StorageBackend, StorageConfig};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Object store selected by `PMO_STORAGE_BACKEND`.
#[derive(Debug)]
pub(crate) enum ConfiguredObjectStore {
    Local(LocalObjectStore),
    Gcs(GsutilObjectStore),
}

impl ConfiguredObjectStore {
    pub(crate) fn from_config(config: &StorageConfig) -> Self {
        match &config.backend {
            StorageBackend::Local { data_dir } => Self::Local(LocalObjectStore::new(data_dir)),
            StorageBackend::Gcs { bucket, gsutil } => {
                Self::Gcs(GsutilObjectStore::new(bucket.clone(), gsutil.clone()))
            }
        }
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Local(store) => format!("local:{}", store.root().display()),
            Self::Gcs(store) => store.object_url(""),
        }
    }
}

impl ObjectStore for ConfiguredObjectStore {
    fn read(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        match self {
            Self::Local(store) => store.read(key),
            Self::Gcs(store) => store.read(key),
        }
    }
}

pub(crate) type ConfiguredSubmissionStore = ObjectSubmissionStore<ConfiguredObjectStore>;

/// Storage handles shared by the submission store and attachment resolver.
pub(crate) fn storage_handles(
    config: &StorageConfig,
) -> (
    Arc<ConfiguredSubmissionStore>,
    Arc<AttachmentResolver<ConfiguredObjectStore>>,
) {
    let objects = Arc::new(ConfiguredObjectStore::from_config(config));
    let submissions = Arc::new(ObjectSubmissionStore::new(
        objects.clone(),
        config.submissions_object.clone(),
    ));
    let attachments = Arc::new(AttachmentResolver::new(
        objects,
        config.attachment_paths.clone(),
    ));
    (submissions, attachments)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
