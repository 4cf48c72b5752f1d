//! Models Module
//!
//! Request/response contracts of the remote astrology API. The remote
//! service itself is an external collaborator; only its data shapes live
//! here.

pub mod requests;
pub mod responses;

pub use requests::{Ayanamsha, BirthDetails, CompatibilityRequest};
pub use responses::{
    AscendantData, BirthChart, CompatibilityScore, DashaPeriod, NakshatraInfo, PlanetPosition,
};
