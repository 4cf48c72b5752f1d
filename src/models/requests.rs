//! Request contracts for the remote astrology API
//!
//! Inputs the mobile client sends to the calculation service. The cache
//! never sees these directly — callers turn them into key fingerprints
//! with the `fingerprint()` helpers, which encode every parameter that
//! affects the result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// == Ayanamsha ==
/// Sidereal zodiac offset system used for a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ayanamsha {
    Lahiri,
    Raman,
    KrishnaMurti,
}

impl Ayanamsha {
    /// Stable short tag used inside key fingerprints.
    fn tag(self) -> &'static str {
        match self {
            Ayanamsha::Lahiri => "lahiri",
            Ayanamsha::Raman => "raman",
            Ayanamsha::KrishnaMurti => "kp",
        }
    }
}

// == Birth Details ==
/// The input tuple for every natal calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BirthDetails {
    /// Birth moment in UTC
    pub birth_moment: DateTime<Utc>,
    /// Birthplace latitude in degrees
    pub latitude: f64,
    /// Birthplace longitude in degrees
    pub longitude: f64,
    /// Sidereal offset system
    pub ayanamsha: Ayanamsha,
}

impl BirthDetails {
    /// Validates the request data.
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Some("Latitude must be between -90 and 90 degrees".to_string());
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Some("Longitude must be between -180 and 180 degrees".to_string());
        }
        None
    }

    /// Cache key fingerprint: one distinct key per distinct input tuple.
    ///
    /// Coordinates are rounded to four decimals (~11 m), matching the
    /// precision the calculation service itself works at.
    pub fn fingerprint(&self) -> String {
        format!(
            "birth:{}:{:.4}:{:.4}:{}",
            self.birth_moment.timestamp(),
            self.latitude,
            self.longitude,
            self.ayanamsha.tag()
        )
    }
}

// == Compatibility Request ==
/// Inputs for a kundali-matching (compatibility) calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityRequest {
    pub person_a: BirthDetails,
    pub person_b: BirthDetails,
}

impl CompatibilityRequest {
    /// Validates both birth detail sets.
    pub fn validate(&self) -> Option<String> {
        self.person_a.validate().or_else(|| self.person_b.validate())
    }

    /// Fingerprint composed from both persons' birth fingerprints, so
    /// invalidating everything derived from one person is a substring
    /// match on their own fingerprint.
    pub fn fingerprint(&self) -> String {
        format!(
            "compat:{}:{}",
            self.person_a.fingerprint(),
            self.person_b.fingerprint()
        )
    }
}
