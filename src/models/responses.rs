//! Response contracts of the remote astrology API
//!
//! Precomputed results the calculation service returns. The field
//! vocabulary mirrors the ephemeris payloads (ecliptic position, speed,
//! house angles), so cached values round-trip the wire format unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// == Planet Position ==
/// Sidereal position of one graha at a moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetPosition {
    /// Planet name (Sun … Ketu)
    pub planet: String,
    /// Ecliptic longitude in degrees [0, 360)
    pub longitude: f64,
    /// Ecliptic latitude in degrees
    pub latitude: f64,
    /// Distance in astronomical units
    pub distance: f64,
    /// Daily motion in degrees; negative while retrograde
    pub speed: f64,
}

impl PlanetPosition {
    /// Zero-based rashi (sign) index derived from the longitude.
    pub fn rashi_index(&self) -> u8 {
        ((self.longitude.rem_euclid(360.0)) / 30.0) as u8
    }

    /// True while the planet's daily motion is negative.
    pub fn is_retrograde(&self) -> bool {
        self.speed < 0.0
    }
}

// == Ascendant Data ==
/// House-system angles for a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AscendantData {
    pub ascendant: f64,
    pub midheaven: f64,
    pub armc: f64,
    pub vertex: f64,
    pub equatorial_ascendant: f64,
}

// == Nakshatra Info ==
/// Lunar mansion occupied by a body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NakshatraInfo {
    /// Zero-based index (0 = Ashwini … 26 = Revati)
    pub index: u8,
    pub name: String,
    /// Quarter within the nakshatra, 1..=4
    pub pada: u8,
}

// == Birth Chart ==
/// Complete natal chart as returned by the calculation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BirthChart {
    pub positions: Vec<PlanetPosition>,
    pub angles: AscendantData,
    /// Nakshatra of the natal Moon
    pub moon_nakshatra: NakshatraInfo,
}

// == Dasha Period ==
/// One planetary period in a Vimshottari dasha sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashaPeriod {
    /// Ruling planet of the period
    pub lord: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

// == Compatibility Score ==
/// Kundali-matching result for two charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityScore {
    /// Guna points obtained, out of [`CompatibilityScore::MAX_POINTS`]
    pub points: f64,
    /// Human-readable verdict supplied by the service
    pub verdict: String,
}

impl CompatibilityScore {
    /// Maximum obtainable guna points in ashtakoota matching.
    pub const MAX_POINTS: f64 = 36.0;

    /// Obtained points as a fraction of the maximum.
    pub fn score_fraction(&self) -> f64 {
        (self.points / Self::MAX_POINTS).clamp(0.0, 1.0)
    }
}
