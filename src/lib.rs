//! jyotish-cache: in-process memoization for Vedic astrology calculations.
//!
//! Astrology results are expensive to compute remotely and cheap to keep:
//! a natal chart never changes for a given birth input, while planetary
//! positions drift by the hour. This crate caches calculation results
//! with TTLs classed by how the underlying data ages, bounds memory with
//! banded LRU eviction, de-duplicates concurrent lookups of the same key,
//! and supports invalidation by key, by substring pattern, by declared
//! dependency, and by caller predicate.
//!
//! The entry point is [`CalculationCache`]; [`services`] layers typed,
//! cached clients for the remote calculation API on top of it.

pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod tasks;

pub use cache::{
    CachePolicy, CacheReport, CacheStats, CalculationCache, DataClass, HealthReport,
    HealthStatus,
};
pub use config::CacheConfig;
pub use error::{CacheError, CacheResult};
pub use logging::{CacheLogger, LogLevel, NoopLogger, TracingLogger};
pub use services::{AstrologyApi, CalculationService, ServiceError};
pub use tasks::spawn_sweep_task;
