use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const LATITUDE_RANGE: (f64, f64) = (-90.0, 90.0);
pub const LONGITUDE_RANGE: (f64, f64) = (-180.0, 180.0);

/// Why a pair of coordinate strings was rejected.
///
/// The `Display` text is the message shown to the user as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter both latitude and longitude")]
    Missing,

    #[error("Please enter valid numbers for coordinates")]
    InvalidNumber,

    #[error("Latitude must be between -90 and 90")]
    LatitudeRange,

    #[error("Longitude must be between -180 and 180")]
    LongitudeRange,
}

/// A validated latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Validate raw user input.
    ///
    /// Checks run in a fixed order and the first failure wins: blank fields,
    /// then unparseable numbers, then the latitude range, then the longitude range.
    pub fn parse(latitude: &str, longitude: &str) -> Result<Self, ValidationError> {
        let latitude = latitude.trim();
        let longitude = longitude.trim();

        if latitude.is_empty() || longitude.is_empty() {
            return Err(ValidationError::Missing);
        }

        let (Some(latitude), Some(longitude)) = (parse_number(latitude), parse_number(longitude))
        else {
            return Err(ValidationError::InvalidNumber);
        };

        Self::new(latitude, longitude)
    }

    /// Range-check already numeric coordinates.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        if !(LATITUDE_RANGE.0..=LATITUDE_RANGE.1).contains(&latitude) {
            return Err(ValidationError::LatitudeRange);
        }
        if !(LONGITUDE_RANGE.0..=LONGITUDE_RANGE.1).contains(&longitude) {
            return Err(ValidationError::LongitudeRange);
        }

        Ok(Self { latitude, longitude })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// `"lat,lon"` as used by query-string based providers.
    pub fn to_query(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}°, {:.2}°", self.latitude, self.longitude)
    }
}

// NaN parses but is not a usable number; infinities fall through to the range checks.
fn parse_number(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| !v.is_nan())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_are_missing() {
        for (lat, lon) in [("", "10"), ("10", ""), ("   ", "10"), ("", ""), ("\t", " ")] {
            assert_eq!(Coordinates::parse(lat, lon), Err(ValidationError::Missing));
        }
    }

    #[test]
    fn missing_wins_over_invalid_number() {
        assert_eq!(Coordinates::parse("abc", ""), Err(ValidationError::Missing));
    }

    #[test]
    fn non_numeric_input_is_rejected() {
        for (lat, lon) in [("abc", "10"), ("10", "east"), ("1.2.3", "4"), ("NaN", "0"), ("0", "nan")] {
            assert_eq!(Coordinates::parse(lat, lon), Err(ValidationError::InvalidNumber));
        }
    }

    #[test]
    fn invalid_number_wins_over_range() {
        assert_eq!(Coordinates::parse("500", "x"), Err(ValidationError::InvalidNumber));
    }

    #[test]
    fn latitude_out_of_range() {
        for lat in ["91", "-100", "90.0001", "inf"] {
            assert_eq!(Coordinates::parse(lat, "0"), Err(ValidationError::LatitudeRange));
        }
    }

    #[test]
    fn latitude_checked_before_longitude() {
        assert_eq!(Coordinates::parse("91", "181"), Err(ValidationError::LatitudeRange));
    }

    #[test]
    fn longitude_out_of_range() {
        for lon in ["181", "-180.5", "-inf"] {
            assert_eq!(Coordinates::parse("0", lon), Err(ValidationError::LongitudeRange));
        }
    }

    #[test]
    fn boundaries_are_accepted() {
        for (lat, lon) in [("-90", "-180"), ("90", "180"), ("0", "0")] {
            assert!(Coordinates::parse(lat, lon).is_ok(), "{lat},{lon} should be valid");
        }
    }

    #[test]
    fn input_is_trimmed() {
        let coords = Coordinates::parse("  52.52 ", "\t13.41\n").expect("valid coordinates");
        assert_eq!(coords.latitude(), 52.52);
        assert_eq!(coords.longitude(), 13.41);
    }

    #[test]
    fn display_rounds_to_two_decimals() {
        let coords = Coordinates::new(52.5167, -0.1).unwrap();
        assert_eq!(coords.to_string(), "52.52°, -0.10°");
    }

    #[test]
    fn query_form_joins_with_comma() {
        let coords = Coordinates::new(48.85, 2.35).unwrap();
        assert_eq!(coords.to_query(), "48.85,2.35");
    }
}
