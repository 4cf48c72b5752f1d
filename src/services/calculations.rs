//! Calculation Services
//!
//! Thin clients over the remote astrology API, routing every call through
//! the calculation cache. This is where the caller-side conventions live:
//! key fingerprints, TTL classification per calculation family, and the
//! dependency chain from birth data to compatibility.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

use crate::cache::{CachePolicy, CalculationCache};
use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::models::{
    BirthChart, BirthDetails, CompatibilityRequest, CompatibilityScore, DashaPeriod,
    PlanetPosition,
};

// == Remote API Contract ==
/// The remote calculation service, reached over HTTP by the app shell.
/// Only the contract lives in this crate; transports are the caller's
/// concern.
#[allow(async_fn_in_trait)]
pub trait AstrologyApi {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Sidereal planetary positions for a moment and place.
    async fn planet_positions(
        &self,
        moment: DateTime<Utc>,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<PlanetPosition>, Self::Error>;

    /// Complete natal chart for a birth input tuple.
    async fn birth_chart(&self, birth: &BirthDetails) -> Result<BirthChart, Self::Error>;

    /// Vimshottari dasha sequence for a birth input tuple.
    async fn dasha_periods(&self, birth: &BirthDetails)
        -> Result<Vec<DashaPeriod>, Self::Error>;

    /// Kundali-matching score for two charts.
    async fn compatibility(
        &self,
        request: &CompatibilityRequest,
    ) -> Result<CompatibilityScore, Self::Error>;
}

// == Service Error ==
/// Error surface of the calculation services.
#[derive(Error, Debug)]
pub enum ServiceError<E>
where
    E: std::error::Error,
{
    /// The remote API call failed. Forwarded as-is, never cached.
    #[error(transparent)]
    Api(E),

    /// The request failed validation before any remote call.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The derived cache key violated the key preconditions.
    #[error("invalid cache key: {0}")]
    InvalidKey(String),

    /// A cached payload could not be decoded back into its result type —
    /// only possible if a key was reused across two result types.
    #[error("cached payload could not be decoded: {0}")]
    Codec(#[from] serde_json::Error),
}

impl<E> From<CacheError<ServiceError<E>>> for ServiceError<E>
where
    E: std::error::Error,
{
    fn from(err: CacheError<ServiceError<E>>) -> Self {
        match err {
            CacheError::InvalidKey(message) => ServiceError::InvalidKey(message),
            CacheError::Compute(inner) => inner,
        }
    }
}

// == Calculation Service ==
/// Cached front for the remote calculation service.
///
/// One type-erased cache backs all calculation families, the way the app
/// shell deploys it: results are stored as JSON values under prefixed key
/// fingerprints and decoded at read time. The prefixes guarantee a key is
/// never reused across result types.
pub struct CalculationService<A: AstrologyApi> {
    api: A,
    cache: Arc<CalculationCache<Value>>,
}

impl<A: AstrologyApi> CalculationService<A> {
    /// Creates a service with its own cache built from `config`.
    pub fn new(api: A, config: CacheConfig) -> Self {
        Self::with_cache(api, Arc::new(CalculationCache::new(config)))
    }

    /// Creates a service over a shared cache, e.g. one also owned by a
    /// background sweep task.
    pub fn with_cache(api: A, cache: Arc<CalculationCache<Value>>) -> Self {
        Self { api, cache }
    }

    /// The underlying cache, for statistics, health, and sweep wiring.
    pub fn cache(&self) -> &Arc<CalculationCache<Value>> {
        &self.cache
    }

    /// The wrapped API client.
    pub fn api(&self) -> &A {
        &self.api
    }

    // == Planetary Positions ==
    /// Current positions drift continuously, so they are cached under the
    /// short volatile TTL.
    pub async fn planet_positions(
        &self,
        moment: DateTime<Utc>,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<PlanetPosition>, ServiceError<A::Error>> {
        let key = format!(
            "positions:{}:{:.4}:{:.4}",
            moment.timestamp(),
            latitude,
            longitude
        );
        let value = self
            .cache
            .get_or_compute(&key, CachePolicy::volatile(), || async {
                let positions = self
                    .api
                    .planet_positions(moment, latitude, longitude)
                    .await
                    .map_err(ServiceError::Api)?;
                serde_json::to_value(positions).map_err(ServiceError::from)
            })
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    // == Birth Chart ==
    /// A natal chart is fixed for a given input tuple: user-class TTL.
    pub async fn birth_chart(
        &self,
        birth: &BirthDetails,
    ) -> Result<BirthChart, ServiceError<A::Error>> {
        if let Some(message) = birth.validate() {
            return Err(ServiceError::InvalidRequest(message));
        }
        let key = birth.fingerprint();
        let value = self
            .cache
            .get_or_compute(&key, CachePolicy::user(), || async {
                let chart = self
                    .api
                    .birth_chart(birth)
                    .await
                    .map_err(ServiceError::Api)?;
                serde_json::to_value(chart).map_err(ServiceError::from)
            })
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    // == Dasha Periods ==
    /// Dasha sequences are derived from fixed birth data: user-class TTL.
    pub async fn dasha_periods(
        &self,
        birth: &BirthDetails,
    ) -> Result<Vec<DashaPeriod>, ServiceError<A::Error>> {
        if let Some(message) = birth.validate() {
            return Err(ServiceError::InvalidRequest(message));
        }
        let key = format!("dasha:{}", birth.fingerprint());
        let value = self
            .cache
            .get_or_compute(&key, CachePolicy::user(), || async {
                let periods = self
                    .api
                    .dasha_periods(birth)
                    .await
                    .map_err(ServiceError::Api)?;
                serde_json::to_value(periods).map_err(ServiceError::from)
            })
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    // == Compatibility ==
    /// Partner-class TTL, declared dependent on both persons' birth chart
    /// keys: if either chart was re-stored more recently than this score,
    /// the score is recomputed.
    pub async fn compatibility(
        &self,
        request: &CompatibilityRequest,
    ) -> Result<CompatibilityScore, ServiceError<A::Error>> {
        if let Some(message) = request.validate() {
            return Err(ServiceError::InvalidRequest(message));
        }
        let key = request.fingerprint();
        let fingerprint_a = request.person_a.fingerprint();
        let fingerprint_b = request.person_b.fingerprint();
        let value = self
            .cache
            .get_or_compute_with_dependencies(
                &key,
                &[fingerprint_a.as_str(), fingerprint_b.as_str()],
                CachePolicy::partner(),
                || async {
                    let score = self
                        .api
                        .compatibility(request)
                        .await
                        .map_err(ServiceError::Api)?;
                    serde_json::to_value(score).map_err(ServiceError::from)
                },
            )
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    // == Person Invalidation ==
    /// Drops every cached result derived from one person's birth data:
    /// their chart, their dasha sequence, and any compatibility score
    /// involving them. Substring match on the person's fingerprint.
    pub async fn invalidate_person(&self, birth: &BirthDetails) -> usize {
        self.cache.invalidate_by_pattern(&birth.fingerprint()).await
    }
}
