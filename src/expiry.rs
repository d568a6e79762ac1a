// ⏳ Expiry Calculator - GS1 YYMMDD → calendar date + status bucket
//
// Day "00" means "last day of the month". Years are always 20YY.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Default threshold (in days) between `Soon` and `Ok`
pub const EXPIRY_SOON_DAYS: i64 = 90;

// ============================================================================
// EXPIRY STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpiryStatus {
    /// No expiry field, or it could not be decoded
    #[default]
    Missing,

    /// Expiry date is before today
    Expired,

    /// Expires within the configured window (inclusive)
    Soon,

    /// Expires later than the window
    Ok,
}

impl ExpiryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpiryStatus::Missing => "missing",
            ExpiryStatus::Expired => "expired",
            ExpiryStatus::Soon => "soon",
            ExpiryStatus::Ok => "ok",
        }
    }
}

// ============================================================================
// DECODED EXPIRY
// ============================================================================

/// Result of decoding a YYMMDD field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expiry {
    pub date: NaiveDate,

    /// DDMMYY, with the two-digit year copied from the scanned field
    pub compact: String,

    /// DD/MM/YYYY
    pub display: String,
}

impl Expiry {
    /// ISO-8601 (YYYY-MM-DD)
    pub fn iso(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    pub fn status(&self, today: NaiveDate, soon_days: i64) -> ExpiryStatus {
        classify(Some(self.date), today, soon_days)
    }
}

/// Decode a 6-char `YYMMDD` field.
///
/// Month and day are not range-checked: values outside the calendar roll
/// into the neighbouring month (month 13 → January of the next year,
/// 31 February → early March). Returns `None` only for non-digit input.
pub fn decode_yymmdd(field: &str) -> Option<Expiry> {
    if field.len() != 6 || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let yy = &field[0..2];
    let year = 2000 + yy.parse::<i32>().ok()?;
    let month = field[2..4].parse::<i32>().ok()?;
    let day = field[4..6].parse::<i64>().ok()?;

    let day = if day == 0 {
        days_in_month(year, month)?
    } else {
        day
    };

    let date = lenient_date(year, month, day)?;

    Some(Expiry {
        date,
        compact: format!("{:02}{:02}{}", date.day(), date.month(), yy),
        display: date.format("%d/%m/%Y").to_string(),
    })
}

/// Classify an expiry date relative to `today` (both calendar days).
pub fn classify(expiry: Option<NaiveDate>, today: NaiveDate, soon_days: i64) -> ExpiryStatus {
    let expiry = match expiry {
        Some(d) => d,
        None => return ExpiryStatus::Missing,
    };

    let diff_days = (expiry - today).num_days();

    if diff_days < 0 {
        ExpiryStatus::Expired
    } else if diff_days <= soon_days {
        ExpiryStatus::Soon
    } else {
        ExpiryStatus::Ok
    }
}

// ============================================================================
// CALENDAR HELPERS
// ============================================================================

/// First day of a month, normalizing month overflow in either direction
fn first_of_month(year: i32, month: i32) -> Option<NaiveDate> {
    let months = year.checked_mul(12)?.checked_add(month - 1)?;
    let y = months.div_euclid(12);
    let m = months.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(y, m, 1)
}

/// Number of days in the (normalized) month
fn days_in_month(year: i32, month: i32) -> Option<i64> {
    let start = first_of_month(year, month)?;
    let next = first_of_month(year, month + 1)?;
    Some((next - start).num_days())
}

/// Build (year, month, day) the lenient way: day 1 of the normalized month
/// plus `day - 1` days.
fn lenient_date(year: i32, month: i32, day: i64) -> Option<NaiveDate> {
    first_of_month(year, month)?.checked_add_signed(Duration::days(day - 1))
}
