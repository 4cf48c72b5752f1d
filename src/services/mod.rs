//! Service layer: cached clients for the remote calculation API.

pub mod calculations;

pub use calculations::{AstrologyApi, CalculationService, ServiceError};
