//! Conversion between the civil-time fields on `Slot` (date + wall-clock
//! time in a named zone) and the UTC instants stored everywhere else.
//! Per §4.2/§9, this boundary is the *only* place a timezone is consulted.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{CoreError, Result};

/// Combine a civil date + time in `tz` into a UTC instant.
///
/// Mirrors the original implementation's pattern of naively combining
/// `slot.interview_date` with `start_time`/`end_time`, localizing via the
/// configured zone, then converting to UTC.
pub fn civil_to_utc(date: NaiveDate, time: NaiveTime, tz: &Tz) -> Result<DateTime<Utc>> {
    let naive = date.and_time(time);
    match tz.from_local_datetime(&naive) {
        chrono::LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        chrono::LocalResult::Ambiguous(dt, _) => Ok(dt.with_timezone(&Utc)),
        chrono::LocalResult::None => Err(CoreError::Validation {
            field: "slot.start_time".to_string(),
            reason: format!("{naive} does not exist in timezone {tz}"),
        }),
    }
}

/// Parse a configured timezone name, falling back to the spec default.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>().map_err(|_| CoreError::Validation {
        field: "interview_timezone".to_string(),
        reason: format!("unknown IANA timezone: {name}"),
    })
}

/// Render a UTC instant in IST (`Asia/Kolkata`) for notification text,
/// per §4.8's "IST-formatted start time" requirement.
pub fn format_ist(instant: DateTime<Utc>) -> String {
    let ist: Tz = "Asia/Kolkata".parse().expect("Asia/Kolkata is a valid IANA zone");
    instant.with_timezone(&ist).format("%Y-%m-%d %H:%M IST").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn ist_morning_converts_to_utc() {
        let tz = parse_timezone("Asia/Kolkata").unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let time = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        let utc = civil_to_utc(date, time, &tz).unwrap();
        assert_eq!(utc.to_rfc3339(), "2025-06-15T04:30:00+00:00");
    }

    #[test]
    fn unknown_timezone_rejected() {
        assert!(parse_timezone("Mars/Phobos").is_err());
    }
}
