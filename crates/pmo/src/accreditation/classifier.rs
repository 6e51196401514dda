use chrono::{DateTime, Local, NaiveDate};
use serde::Serialize;

use super::domain::ExpiryStatus;

pub const CRITICAL_WITHIN_DAYS: i64 = 30;
pub const WARNING_WITHIN_DAYS: i64 = 60;
pub const SOON_WITHIN_DAYS: i64 = 90;
/// Documents further out than this never raise an alert.
pub const ALERT_WINDOW_DAYS: i64 = SOON_WITHIN_DAYS;

/// Raised when an expiry date cannot be interpreted as a calendar date.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid date '{value}': expected YYYY-MM-DD or an RFC 3339 timestamp")]
pub struct InvalidDate {
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExpiryAssessment {
    pub days_until_expiry: i64,
    pub status: ExpiryStatus,
}

impl ExpiryAssessment {
    pub const fn within_alert_window(&self) -> bool {
        self.days_until_expiry <= ALERT_WINDOW_DAYS
    }
}

/// Today's calendar date in local time; the default reference date.
pub fn reference_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Whole days between `today` and `expiry`; negative once the document has expired.
pub fn days_until_expiry(expiry: NaiveDate, today: NaiveDate) -> i64 {
    expiry.signed_duration_since(today).num_days()
}

pub fn status_for_days(days: i64) -> ExpiryStatus {
    if days < 0 {
        ExpiryStatus::Expired
    } else if days <= CRITICAL_WITHIN_DAYS {
        ExpiryStatus::Critical
    } else if days <= WARNING_WITHIN_DAYS {
        ExpiryStatus::Warning
    } else if days <= SOON_WITHIN_DAYS {
        ExpiryStatus::Soon
    } else {
        ExpiryStatus::Valid
    }
}

pub fn classify(expiry: NaiveDate, today: NaiveDate) -> ExpiryAssessment {
    let days_until_expiry = days_until_expiry(expiry, today);
    ExpiryAssessment {
        days_until_expiry,
        status: status_for_days(days_until_expiry),
    }
}

pub fn classify_str(raw: &str, today: NaiveDate) -> Result<ExpiryAssessment, InvalidDate> {
    let expiry = parse_document_date(raw)?;
    Ok(classify(expiry, today))
}

/// Parses a stored document date.
///
/// Timestamps keep the calendar date of their own offset so a value written as
/// local midnight is not shifted onto the previous day.
pub fn parse_document_date(raw: &str) -> Result<NaiveDate, InvalidDate> {
    let trimmed = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.date_naive());
    }

    Err(InvalidDate {
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn reference() -> NaiveDate {
        date(2024, 1, 1)
    }

    #[test]
    fn same_day_expiry_is_critical_not_expired() {
        let assessment = classify(reference(), reference());
        assert_eq!(assessment.days_until_expiry, 0);
        assert_eq!(assessment.status, ExpiryStatus::Critical);
    }

    #[test]
    fn yesterday_is_expired_by_one_day() {
        let assessment = classify(date(2023, 12, 31), reference());
        assert_eq!(assessment.days_until_expiry, -1);
        assert_eq!(assessment.status, ExpiryStatus::Expired);
    }

    #[test]
    fn bucket_boundaries() {
        let cases = [
            (30, ExpiryStatus::Critical),
            (31, ExpiryStatus::Warning),
            (60, ExpiryStatus::Warning),
            (61, ExpiryStatus::Soon),
            (90, ExpiryStatus::Soon),
            (91, ExpiryStatus::Valid),
        ];

        for (days, expected) in cases {
            let expiry = reference() + chrono::Duration::days(days);
            let assessment = classify(expiry, reference());
            assert_eq!(assessment.days_until_expiry, days);
            assert_eq!(assessment.status, expected, "{days} days out");
        }
    }

    #[test]
    fn emirates_id_nineteen_days_out_is_critical() {
        let assessment = classify_str("2024-01-20", reference()).expect("valid date");
        assert_eq!(assessment.days_until_expiry, 19);
        assert_eq!(assessment.status, ExpiryStatus::Critical);
        assert!(assessment.within_alert_window());
    }

    #[test]
    fn long_expired_mol_registration() {
        let assessment = classify_str("2023-06-01", reference()).expect("valid date");
        assert_eq!(assessment.days_until_expiry, -214);
        assert_eq!(assessment.status, ExpiryStatus::Expired);
        assert!(assessment.within_alert_window());
    }

    #[test]
    fn passport_outside_window_is_valid() {
        let assessment = classify_str("2024-12-01", reference()).expect("valid date");
        assert_eq!(assessment.days_until_expiry, 335);
        assert_eq!(assessment.status, ExpiryStatus::Valid);
        assert!(!assessment.within_alert_window());
    }

    #[test]
    fn timestamps_use_their_own_calendar_date() {
        let parsed = parse_document_date("2024-03-15T00:00:00+04:00").expect("rfc3339");
        assert_eq!(parsed, date(2024, 3, 15));
    }

    #[test]
    fn malformed_dates_fail_fast() {
        let err = classify_str("15/03/2024", reference()).expect_err("not a supported format");
        assert_eq!(err.value, "15/03/2024");
        assert!(err.to_string().contains("invalid date"));
        assert!(parse_document_date("").is_err());
    }
}
