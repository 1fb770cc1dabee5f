//! Timestamp normalization for log search parameters.
//!
//! # Design
//! The service accepts one canonical textual timestamp,
//! `YYYY-MM-DD HH:MM:SS.mmm`. Callers hold times in whatever shape is handy
//! (a chrono value, epoch seconds, a partially specified string), so
//! `ensure_time` funnels all of them through [`Timestamp`] into the
//! canonical form before anything touches the query string. Normalization
//! is idempotent: the canonical string is itself the most specific accepted
//! text format.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

use crate::error::ApiError;

/// strftime form of the canonical timestamp. `%.3f` truncates to
/// milliseconds, it never rounds up.
pub const CANONICAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// A point in time in any of the shapes `ensure_time` accepts.
///
/// `From` impls cover the common cases so call sites can pass
/// `NaiveDateTime`, `NaiveDate`, epoch seconds, or text directly.
#[derive(Debug, Clone, PartialEq)]
pub enum Timestamp {
    /// A complete date and time, used as-is.
    DateTime(NaiveDateTime),
    /// A bare date, taken at midnight.
    Date(NaiveDate),
    /// Seconds since the Unix epoch, rendered in local time.
    Epoch(f64),
    /// Text in one of the accepted formats, most specific first:
    /// `%Y-%m-%d %H:%M:%S.%f`, `%Y-%m-%d %H:%M:%S`, `%Y-%m-%d %H:%M`,
    /// `%Y-%m-%d %H`, `%Y-%m-%d`, `%Y-%m`, `%Y`. Fields a coarser format
    /// leaves out default downward: minute and second to zero, day and
    /// month to one.
    Text(String),
}

impl From<NaiveDateTime> for Timestamp {
    fn from(value: NaiveDateTime) -> Self {
        Timestamp::DateTime(value)
    }
}

impl From<NaiveDate> for Timestamp {
    fn from(value: NaiveDate) -> Self {
        Timestamp::Date(value)
    }
}

impl From<f64> for Timestamp {
    fn from(value: f64) -> Self {
        Timestamp::Epoch(value)
    }
}

impl From<i64> for Timestamp {
    fn from(value: i64) -> Self {
        Timestamp::Epoch(value as f64)
    }
}

impl From<&str> for Timestamp {
    fn from(value: &str) -> Self {
        Timestamp::Text(value.to_string())
    }
}

impl From<String> for Timestamp {
    fn from(value: String) -> Self {
        Timestamp::Text(value)
    }
}

/// Convert any accepted timestamp shape to the canonical
/// `YYYY-MM-DD HH:MM:SS.mmm` string.
///
/// Fails with [`ApiError::InvalidTimestamp`] when text matches no accepted
/// format or an epoch value is out of range. This runs before any request
/// is built, so a bad timestamp never reaches the network.
pub fn ensure_time(time: impl Into<Timestamp>) -> Result<String, ApiError> {
    let datetime = match time.into() {
        Timestamp::DateTime(dt) => dt,
        Timestamp::Date(date) => date.and_time(NaiveTime::MIN),
        Timestamp::Epoch(seconds) => epoch_to_local(seconds)
            .ok_or_else(|| ApiError::InvalidTimestamp(format!("epoch {seconds}")))?,
        Timestamp::Text(text) => {
            parse_text(&text).ok_or(ApiError::InvalidTimestamp(text))?
        }
    };
    Ok(datetime.format(CANONICAL_FORMAT).to_string())
}

/// Epoch seconds to a local wall-clock time, at microsecond precision.
fn epoch_to_local(seconds: f64) -> Option<NaiveDateTime> {
    if !seconds.is_finite() {
        return None;
    }
    let micros = (seconds * 1e6).round() as i64;
    let secs = micros.div_euclid(1_000_000);
    let sub_nanos = micros.rem_euclid(1_000_000) as u32 * 1_000;
    let local = Local.timestamp_opt(secs, sub_nanos).single()?;
    Some(local.naive_local())
}

/// Try the accepted text formats, most specific first.
///
/// chrono refuses to parse a value with fields missing, so the coarser
/// formats get their absent parts appended before parsing: a lone hour gains
/// `:0`, a bare month or year gains day/month `1`.
fn parse_text(text: &str) -> Option<NaiveDateTime> {
    const WITH_TIME: [&str; 3] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    for format in WITH_TIME {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(text, format) {
            return Some(datetime);
        }
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(&format!("{text}:0"), "%Y-%m-%d %H:%M") {
        return Some(datetime);
    }
    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{text}-1"), "%Y-%m-%d"))
        .or_else(|_| NaiveDate::parse_from_str(&format!("{text}-1-1"), "%Y-%m-%d"))
        .ok()?;
    Some(date.and_time(NaiveTime::MIN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    #[test]
    fn all_text_formats_normalize() {
        let cases = [
            ("2021-03-04 05:06:07.891234", "2021-03-04 05:06:07.891"),
            ("2021-03-04 05:06:07", "2021-03-04 05:06:07.000"),
            ("2021-03-04 05:06", "2021-03-04 05:06:00.000"),
            ("2021-03-04 05", "2021-03-04 05:00:00.000"),
            ("2021-03-04", "2021-03-04 00:00:00.000"),
            ("2021-03", "2021-03-01 00:00:00.000"),
            ("2021", "2021-01-01 00:00:00.000"),
        ];
        for (input, expected) in cases {
            assert_eq!(ensure_time(input).unwrap(), expected, "input {input:?}");
        }
    }

    #[test]
    fn normalization_is_idempotent() {
        let first = ensure_time("2021-03-04 05:06").unwrap();
        let second = ensure_time(first.as_str()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn milliseconds_truncate_rather_than_round() {
        assert_eq!(
            ensure_time("2021-03-04 05:06:07.999999").unwrap(),
            "2021-03-04 05:06:07.999"
        );
    }

    #[test]
    fn single_digit_fields_are_accepted() {
        assert_eq!(
            ensure_time("2021-3-4 5:6").unwrap(),
            "2021-03-04 05:06:00.000"
        );
    }

    #[test]
    fn datetime_and_date_inputs_normalize() {
        let date = NaiveDate::from_ymd_opt(2021, 3, 4).unwrap();
        assert_eq!(ensure_time(date).unwrap(), "2021-03-04 00:00:00.000");

        let datetime = date.and_hms_milli_opt(5, 6, 7, 891).unwrap();
        assert_eq!(ensure_time(datetime).unwrap(), "2021-03-04 05:06:07.891");
    }

    #[test]
    fn epoch_renders_in_local_time() {
        // Compute the expectation through chrono so the test holds in any
        // timezone the suite runs under.
        let expected = Local
            .timestamp_opt(1_600_000_000, 500_000_000)
            .unwrap()
            .naive_local()
            .format(CANONICAL_FORMAT)
            .to_string();
        assert_eq!(ensure_time(1_600_000_000.5).unwrap(), expected);
    }

    #[test]
    fn integer_epoch_is_accepted() {
        let expected = Local
            .timestamp_opt(0, 0)
            .unwrap()
            .naive_local()
            .format(CANONICAL_FORMAT)
            .to_string();
        assert_eq!(ensure_time(0i64).unwrap(), expected);
    }

    #[test]
    fn unrecognized_text_is_rejected() {
        for input in ["yesterday", "03/04/2021", "2021-03-04T05:06:07", "", "2021-03-04 "] {
            let err = ensure_time(input).unwrap_err();
            assert!(
                matches!(err, ApiError::InvalidTimestamp(_)),
                "input {input:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn non_finite_epoch_is_rejected() {
        let err = ensure_time(f64::NAN).unwrap_err();
        assert!(matches!(err, ApiError::InvalidTimestamp(_)));
    }
}
