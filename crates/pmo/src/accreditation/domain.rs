use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// Placeholder reported when a tracked document has no recorded number.
pub const MISSING_DOCUMENT_NUMBER: &str = "N/A";

/// The fixed set of accreditation documents tracked per employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentType {
    Mol,
    EmiratesId,
    Passport,
    Visa,
    Certificate,
    GroupInsurance,
}

impl DocumentType {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::Mol,
            Self::EmiratesId,
            Self::Passport,
            Self::Visa,
            Self::Certificate,
            Self::GroupInsurance,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Mol => "MOL",
            Self::EmiratesId => "Emirates ID",
            Self::Passport => "Passport",
            Self::Visa => "Visa",
            Self::Certificate => "Certificate",
            Self::GroupInsurance => "Group Insurance",
        }
    }

    pub const fn descriptor(self) -> DocumentFieldDescriptor {
        match self {
            Self::Mol => DocumentFieldDescriptor {
                document_type: self,
                number_field: "molNumber",
                start_field: "molStartDate",
                expiry_field: "molExpiryDate",
                attachment_field: None,
            },
            Self::EmiratesId => DocumentFieldDescriptor {
                document_type: self,
                number_field: "emiratesIdNumber",
                start_field: "emiratesIdIssueDate",
                expiry_field: "emiratesIdExpiryDate",
                attachment_field: Some("emiratesIdAttachmentFileName"),
            },
            Self::Passport => DocumentFieldDescriptor {
                document_type: self,
                number_field: "passportNumber",
                start_field: "passportIssueDate",
                expiry_field: "passportExpiryDate",
                attachment_field: Some("passportAttachmentFileName"),
            },
            Self::Visa => DocumentFieldDescriptor {
                document_type: self,
                number_field: "visaNumber",
                start_field: "visaIssueDate",
                expiry_field: "visaExpiryDate",
                attachment_field: Some("visaAttachmentFileName"),
            },
            Self::Certificate => DocumentFieldDescriptor {
                document_type: self,
                number_field: "certificateNumber",
                start_field: "certificateIssueDate",
                expiry_field: "certificateExpiryDate",
                attachment_field: Some("certificateAttachmentFileName"),
            },
            Self::GroupInsurance => DocumentFieldDescriptor {
                document_type: self,
                number_field: "groupInsuranceNumber",
                start_field: "groupInsuranceStartDate",
                expiry_field: "groupInsuranceExpiryDate",
                attachment_field: None,
            },
        }
    }
}

/// Stored field names backing one document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentFieldDescriptor {
    pub document_type: DocumentType,
    pub number_field: &'static str,
    pub start_field: &'static str,
    pub expiry_field: &'static str,
    pub attachment_field: Option<&'static str>,
}

impl DocumentFieldDescriptor {
    pub const fn label(&self) -> &'static str {
        self.document_type.label()
    }
}

/// One tracked document as captured by the intake form.
///
/// An absent `expiry_date` means the document does not apply to the employee.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentRecord {
    pub number: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub attachment_file_name: Option<String>,
}

/// Validated accreditation submission for a single employee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccreditationSubmission {
    pub employee_id: String,
    pub employee_name: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub mol: DocumentRecord,
    pub emirates_id: DocumentRecord,
    pub passport: DocumentRecord,
    pub visa: DocumentRecord,
    pub certificate: DocumentRecord,
    pub group_insurance: DocumentRecord,
}

impl AccreditationSubmission {
    pub fn new(employee_id: impl Into<String>) -> Self {
        Self {
            employee_id: employee_id.into(),
            employee_name: None,
            submitted_at: None,
            mol: DocumentRecord::default(),
            emirates_id: DocumentRecord::default(),
            passport: DocumentRecord::default(),
            visa: DocumentRecord::default(),
            certificate: DocumentRecord::default(),
            group_insurance: DocumentRecord::default(),
        }
    }

    pub fn document(&self, document_type: DocumentType) -> &DocumentRecord {
        match document_type {
            DocumentType::Mol => &self.mol,
            DocumentType::EmiratesId => &self.emirates_id,
            DocumentType::Passport => &self.passport,
            DocumentType::Visa => &self.visa,
            DocumentType::Certificate => &self.certificate,
            DocumentType::GroupInsurance => &self.group_insurance,
        }
    }

    pub fn document_mut(&mut self, document_type: DocumentType) -> &mut DocumentRecord {
        match document_type {
            DocumentType::Mol => &mut self.mol,
            DocumentType::EmiratesId => &mut self.emirates_id,
            DocumentType::Passport => &mut self.passport,
            DocumentType::Visa => &mut self.visa,
            DocumentType::Certificate => &mut self.certificate,
            DocumentType::GroupInsurance => &mut self.group_insurance,
        }
    }
}

/// Alert bucket assigned from the distance to a document's expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ExpiryStatus {
    Expired,
    Critical,
    Warning,
    Soon,
    Valid,
}

impl ExpiryStatus {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Expired,
            Self::Critical,
            Self::Warning,
            Self::Soon,
            Self::Valid,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Expired => "Expired",
            Self::Critical => "Critical",
            Self::Warning => "Warning",
            Self::Soon => "Soon",
            Self::Valid => "Valid",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(value.trim()))
    }
}

/// Derived alert for a document expiring within the alert window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiryAlert {
    pub employee_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_name: Option<String>,
    pub document_type: &'static str,
    pub document_number: String,
    pub expiry_date: NaiveDate,
    pub days_until_expiry: i64,
    pub status: ExpiryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_file_name: Option<String>,
}
