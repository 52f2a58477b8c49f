use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fractional digits the remote service stores for every coordinate.
pub const DECIMAL_DIGITS: usize = 6;

/// Maximum count of integer + fractional digits (sign excluded).
pub const MAX_TOTAL_DIGITS: usize = 9;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Lat,
    Lng,
}

impl Axis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::Lat => "lat",
            Axis::Lng => "lng",
        }
    }

    /// Inclusive magnitude bound for this axis.
    pub fn limit(&self) -> f64 {
        match self {
            Axis::Lat => 90.0,
            Axis::Lng => 180.0,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PrecisionError {
    #[error("{} coordinate is missing", .0.as_str())]
    Missing(Axis),

    /// Zero never denotes a real field location; it is what an unset GPS fix
    /// reports.
    #[error("{} coordinate is zero", .0.as_str())]
    Zero(Axis),

    #[error("{} coordinate {value} is outside [-{limit}, {limit}]", axis.as_str(), limit = axis.limit())]
    OutOfRange { axis: Axis, value: f64 },

    #[error("{} coordinate {formatted} has {digits} digits (max {max})", axis.as_str(), max = MAX_TOTAL_DIGITS)]
    DigitLimit {
        axis: Axis,
        formatted: String,
        digits: usize,
    },
}

/// Format a coordinate for the remote service.
///
/// The result always carries exactly six fractional digits. The service
/// rejects numeric encodings, so the wire value is this string.
pub fn format(coordinate: Option<f64>, axis: Axis) -> Result<String, PrecisionError> {
    let value = coordinate.ok_or(PrecisionError::Missing(axis))?;

    if value == 0.0 {
        return Err(PrecisionError::Zero(axis));
    }
    if !value.is_finite() || value.abs() > axis.limit() {
        return Err(PrecisionError::OutOfRange { axis, value });
    }

    let formatted = format!("{:.*}", DECIMAL_DIGITS, value);

    // 0.0000004 survives the zero check but rounds to "0.000000".
    if formatted.trim_start_matches('-').bytes().all(|b| b == b'0' || b == b'.') {
        return Err(PrecisionError::Zero(axis));
    }

    check_digit_limit(axis, formatted)
}

/// Format both halves of a pair; latitude errors are reported first.
pub fn format_pair(lat: Option<f64>, lng: Option<f64>) -> Result<(String, String), PrecisionError> {
    Ok((format(lat, Axis::Lat)?, format(lng, Axis::Lng)?))
}

/// Not reachable through [`format`] while the range check precedes it (at most
/// 3 integer + 6 fractional digits); it states the storage limit on its own.
fn check_digit_limit(axis: Axis, formatted: String) -> Result<String, PrecisionError> {
    let digits = digit_count(&formatted);
    if digits > MAX_TOTAL_DIGITS {
        return Err(PrecisionError::DigitLimit {
            axis,
            formatted,
            digits,
        });
    }
    Ok(formatted)
}

fn digit_count(formatted: &str) -> usize {
    formatted.bytes().filter(u8::is_ascii_digit).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_six_fraction_digits() {
        assert_eq!(format(Some(45.5), Axis::Lat).unwrap(), "45.500000");
        assert_eq!(format(Some(-73.1234567), Axis::Lng).unwrap(), "-73.123457");
        assert_eq!(format(Some(180.0), Axis::Lng).unwrap(), "180.000000");
        assert_eq!(format(Some(-0.5), Axis::Lat).unwrap(), "-0.500000");
    }

    #[test]
    fn zero_and_missing_are_rejected() {
        assert_eq!(format(Some(0.0), Axis::Lat), Err(PrecisionError::Zero(Axis::Lat)));
        assert_eq!(format(Some(-0.0), Axis::Lng), Err(PrecisionError::Zero(Axis::Lng)));
        assert_eq!(format(None, Axis::Lng), Err(PrecisionError::Missing(Axis::Lng)));
    }

    #[test]
    fn values_rounding_to_zero_are_rejected() {
        assert_eq!(
            format(Some(0.0000004), Axis::Lat),
            Err(PrecisionError::Zero(Axis::Lat))
        );
        assert_eq!(
            format(Some(-0.0000001), Axis::Lng),
            Err(PrecisionError::Zero(Axis::Lng))
        );
    }

    #[test]
    fn range_is_axis_specific() {
        assert!(matches!(
            format(Some(91.0), Axis::Lat),
            Err(PrecisionError::OutOfRange { axis: Axis::Lat, .. })
        ));
        assert!(format(Some(91.0), Axis::Lng).is_ok());
        assert!(matches!(
            format(Some(-180.5), Axis::Lng),
            Err(PrecisionError::OutOfRange { .. })
        ));
        assert!(matches!(
            format(Some(f64::NAN), Axis::Lat),
            Err(PrecisionError::OutOfRange { .. })
        ));
        assert!(matches!(
            format(Some(f64::INFINITY), Axis::Lng),
            Err(PrecisionError::OutOfRange { .. })
        ));
    }

    #[test]
    fn digit_limit_counts_integer_and_fraction_without_sign() {
        assert_eq!(digit_count("-179.999999"), 9);
        assert_eq!(digit_count("1.000000"), 7);
        assert!(check_digit_limit(Axis::Lng, "-179.999999".into()).is_ok());

        let err = check_digit_limit(Axis::Lng, "1234.000000".into()).unwrap_err();
        assert_eq!(
            err,
            PrecisionError::DigitLimit {
                axis: Axis::Lng,
                formatted: "1234.000000".into(),
                digits: 10,
            }
        );

        // The widest in-range values sit exactly at the limit.
        assert_eq!(format(Some(-180.0), Axis::Lng).unwrap(), "-180.000000");
        assert_eq!(format(Some(90.0), Axis::Lat).unwrap(), "90.000000");
    }

    #[test]
    fn pair_reports_latitude_first() {
        assert_eq!(
            format_pair(Some(0.0), None),
            Err(PrecisionError::Zero(Axis::Lat))
        );
        assert_eq!(
            format_pair(Some(48.8566), Some(2.3522)).unwrap(),
            ("48.856600".to_string(), "2.352200".to_string())
        );
    }
}
