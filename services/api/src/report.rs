use crate::infra::{storage_handles, ConfiguredObjectStore};
use chrono::NaiveDate;
use clap::Args;
use pmo::accreditation::{
    reference_today, AccreditationService, AlertReport, AttachmentResolver, ExpiryStatus,
    LocalObjectStore, ObjectSubmissionStore,
};
use pmo::config::AppConfig;
use pmo::error::AppError;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct ExpiryReportArgs {
    /// Reference date for the report (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Read submissions from a local JSON or CSV file instead of configured storage.
    #[arg(long)]
    pub(crate) submissions: Option<PathBuf>,
    /// Only list alerts in this bucket (expired, critical, warning, soon).
    #[arg(long)]
    pub(crate) status: Option<String>,
}

pub(crate) fn run_expiry_report(args: ExpiryReportArgs) -> Result<(), AppError> {
    let ExpiryReportArgs {
        today,
        submissions,
        status,
    } = args;

    let today = today.unwrap_or_else(reference_today);
    let status = status
        .as_deref()
        .map(|raw| {
            ExpiryStatus::from_label(raw)
                .ok_or_else(|| AppError::InvalidArgument(format!("unknown status '{raw}'")))
        })
        .transpose()?;

    let (mut report, source) = match submissions {
        Some(path) => (report_from_file(&path, today)?, path.display().to_string()),
        None => {
            let config = AppConfig::load()?;
            let (store, attachments) = storage_handles(&config.storage);
            let source = format!(
                "{} ({})",
                config.storage.submissions_object,
                ConfiguredObjectStore::from_config(&config.storage).describe()
            );
            let service = AccreditationService::new(store, attachments);
            (service.expiry_alerts(today).map_err(service_error)?, source)
        }
    };

    if let Some(status) = status {
        report.retain_status(status);
    }

    render_expiry_report(&report, &source, today);
    Ok(())
}

fn report_from_file(path: &Path, today: NaiveDate) -> Result<AlertReport, AppError> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| AppError::InvalidArgument(format!("{} is not a file", path.display())))?;
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let objects = Arc::new(LocalObjectStore::new(parent));
    let store = Arc::new(ObjectSubmissionStore::new(objects.clone(), file_name));
    let service = AccreditationService::new(
        store,
        Arc::new(AttachmentResolver::with_default_conventions(objects)),
    );
    service.expiry_alerts(today).map_err(service_error)
}

fn service_error(err: pmo::accreditation::AccreditationError) -> AppError {
    match err {
        pmo::accreditation::AccreditationError::Storage(source) => AppError::Storage(source),
        other => AppError::InvalidArgument(other.to_string()),
    }
}

pub(crate) fn render_expiry_report(report: &AlertReport, source: &str, today: NaiveDate) {
    println!("Accreditation expiry report");
    println!("Reference date: {today}");
    println!("Data source: {source}");

    println!("\nSummary");
    for status in ExpiryStatus::ordered() {
        if status == ExpiryStatus::Valid {
            continue;
        }
        println!("- {}: {}", status.label(), report.count(status));
    }
    println!("- Total expired: {}", report.total_expired);

    if report.alerts.is_empty() {
        println!("\nAlerts: none");
        return;
    }

    println!("\nAlerts (most urgent first)");
    for alert in &report.alerts {
        let who = match &alert.employee_name {
            Some(name) => format!("{} ({})", alert.employee_id, name),
            None => alert.employee_id.clone(),
        };
        let when = match alert.days_until_expiry {
            days if days < 0 => format!("expired {} days ago", -days),
            0 => "expires today".to_string(),
            days => format!("expires in {days} days"),
        };
        println!(
            "- [{}] {} {} #{}: {} on {}{}",
            alert.status.label(),
            who,
            alert.document_type,
            alert.document_number,
            when,
            alert.expiry_date,
            alert
                .attachment_file_name
                .as_deref()
                .map(|file| format!(" (attachment: {file})"))
                .unwrap_or_default()
        );
    }
}
