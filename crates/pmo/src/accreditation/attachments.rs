use std::path::Path;
use std::sync::Arc;

use mime::Mime;
use tracing::{debug, warn};

use super::storage::ObjectStore;

pub const EMPLOYEE_ID_PLACEHOLDER: &str = "{employee_id}";
pub const FILE_PLACEHOLDER: &str = "{file}";

/// Key layouts attachments have been stored under, newest first.
pub const DEFAULT_PATH_CONVENTIONS: [&str; 4] = [
    "accreditation/{employee_id}/{file}",
    "accreditation-attachments/{employee_id}/{file}",
    "uploads/{employee_id}_{file}",
    "uploads/{file}",
];

/// Object key template for one storage layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathConvention {
    template: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("attachment path template '{0}' must contain {{file}}")]
pub struct InvalidPathConvention(pub String);

impl PathConvention {
    pub fn new(template: impl Into<String>) -> Result<Self, InvalidPathConvention> {
        let template = template.into().trim().to_string();
        if !template.contains(FILE_PLACEHOLDER) {
            return Err(InvalidPathConvention(template));
        }
        Ok(Self { template })
    }

    pub fn defaults() -> Vec<Self> {
        DEFAULT_PATH_CONVENTIONS
            .iter()
            .map(|template| Self {
                template: (*template).to_string(),
            })
            .collect()
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn key_for(&self, employee_id: &str, file: &str) -> String {
        self.template
            .replace(EMPLOYEE_ID_PLACEHOLDER, employee_id)
            .replace(FILE_PLACEHOLDER, file)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: Mime,
    pub bytes: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    #[error("attachment {file} for employee {employee_id} not found")]
    NotFound {
        employee_id: String,
        file: String,
        attempted: Vec<String>,
    },
}

/// Probes each path convention in order; the first readable object wins.
#[derive(Debug)]
pub struct AttachmentResolver<O> {
    objects: Arc<O>,
    conventions: Vec<PathConvention>,
}

impl<O> AttachmentResolver<O>
where
    O: ObjectStore,
{
    pub fn new(objects: Arc<O>, conventions: Vec<PathConvention>) -> Self {
        Self {
            objects,
            conventions,
        }
    }

    pub fn with_default_conventions(objects: Arc<O>) -> Self {
        Self::new(objects, PathConvention::defaults())
    }

    pub fn conventions(&self) -> &[PathConvention] {
        &self.conventions
    }

    pub fn fetch_attachment(
        &self,
        employee_id: &str,
        file: &str,
    ) -> Result<Attachment, AttachmentError> {
        let mut attempted = Vec::with_capacity(self.conventions.len());

        for convention in &self.conventions {
            let key = convention.key_for(employee_id, file);
            match self.objects.read(&key) {
                Ok(bytes) => {
                    debug!(%employee_id, %file, %key, "attachment resolved");
                    return Ok(Attachment {
                        file_name: file.to_string(),
                        content_type: content_type_for(file),
                        bytes,
                    });
                }
                Err(err) if err.is_not_found() => {
                    debug!(%employee_id, %file, %key, "attachment not under convention");
                }
                Err(err) => {
                    warn!(%employee_id, %file, %key, error = %err, "attachment read failed");
                }
            }
            attempted.push(key);
        }

        warn!(%employee_id, %file, ?attempted, "attachment not found under any convention");
        Err(AttachmentError::NotFound {
            employee_id: employee_id.to_string(),
            file: file.to_string(),
            attempted,
        })
    }
}

pub fn content_type_for(file: &str) -> Mime {
    let extension = Path::new(file)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("pdf") => mime::APPLICATION_PDF,
        Some("jpg") | Some("jpeg") => mime::IMAGE_JPEG,
        Some("png") => mime::IMAGE_PNG,
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accreditation::storage::ObjectStoreError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct RecordingObjects {
        objects: HashMap<String, Vec<u8>>,
        failing: Vec<String>,
        reads: Mutex<Vec<String>>,
    }

    impl RecordingObjects {
        fn reads(&self) -> Vec<String> {
            self.reads.lock().expect("reads mutex").clone()
        }
    }

    impl ObjectStore for RecordingObjects {
        fn read(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
            self.reads.lock().expect("reads mutex").push(key.to_string());
            if self.failing.iter().any(|failing| failing == key) {
                return Err(ObjectStoreError::Unavailable {
                    key: key.to_string(),
                    reason: "permission denied".to_string(),
                });
            }
            self.objects
                .get(key)
                .cloned()
                .ok_or_else(|| ObjectStoreError::NotFound {
                    key: key.to_string(),
                })
        }
    }

    #[test]
    fn first_matching_convention_short_circuits() {
        let mut objects = RecordingObjects::default();
        objects.objects.insert(
            "accreditation-attachments/EMP-1/passport.pdf".to_string(),
            b"legacy".to_vec(),
        );
        objects
            .objects
            .insert("uploads/passport.pdf".to_string(), b"oldest".to_vec());
        let objects = Arc::new(objects);
        let resolver = AttachmentResolver::with_default_conventions(objects.clone());

        let attachment = resolver
            .fetch_attachment("EMP-1", "passport.pdf")
            .expect("resolves");
        assert_eq!(attachment.bytes, b"legacy");
        assert_eq!(attachment.content_type.essence_str(), "application/pdf");
        assert_eq!(
            objects.reads(),
            vec![
                "accreditation/EMP-1/passport.pdf",
                "accreditation-attachments/EMP-1/passport.pdf",
            ]
        );
    }

    #[test]
    fn unavailable_candidates_fall_through_to_the_next() {
        let mut objects = RecordingObjects::default();
        objects
            .failing
            .push("accreditation/EMP-2/eid.png".to_string());
        objects
            .objects
            .insert("uploads/EMP-2_eid.png".to_string(), vec![0x89, 0x50]);
        let resolver = AttachmentResolver::with_default_conventions(Arc::new(objects));

        let attachment = resolver.fetch_attachment("EMP-2", "eid.png").expect("resolves");
        assert_eq!(attachment.content_type.essence_str(), "image/png");
    }

    #[test]
    fn reports_every_attempted_key_when_missing() {
        let resolver =
            AttachmentResolver::with_default_conventions(Arc::new(RecordingObjects::default()));

        let err = resolver
            .fetch_attachment("EMP-3", "visa.jpg")
            .expect_err("missing everywhere");
        let AttachmentError::NotFound { attempted, .. } = err;
        assert_eq!(
            attempted,
            vec![
                "accreditation/EMP-3/visa.jpg",
                "accreditation-attachments/EMP-3/visa.jpg",
                "uploads/EMP-3_visa.jpg",
                "uploads/visa.jpg",
            ]
        );
    }

    #[test]
    fn templates_require_file_placeholder() {
        assert!(PathConvention::new("accreditation/{employee_id}").is_err());
        let convention = PathConvention::new(" docs/{employee_id}/{file} ").expect("valid");
        assert_eq!(convention.key_for("E", "a.pdf"), "docs/E/a.pdf");
    }

    #[test]
    fn content_types_follow_extension() {
        assert_eq!(content_type_for("scan.PDF").essence_str(), "application/pdf");
        assert_eq!(content_type_for("photo.jpeg").essence_str(), "image/jpeg");
        assert_eq!(content_type_for("photo.JPG").essence_str(), "image/jpeg");
        assert_eq!(content_type_for("badge.png").essence_str(), "image/png");
        assert_eq!(
            content_type_for("contract.docx").essence_str(),
            "application/octet-stream"
        );
        assert_eq!(
            content_type_for("README").essence_str(),
            "application/octet-stream"
        );
    }
}
