//! Geocoding: free-text location to coordinates.
//!
//! [`LocationResolver`] checks the [`LocationCache`] first and only calls the
//! external [`Geocoder`] on a miss. Failures never propagate out of the
//! resolver; an unresolvable location is simply `None`.

use futures::future::BoxFuture;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cache::{CacheError, LocationCache};
use crate::domain::Coord;

/// Error type for geocoding requests.
#[derive(Debug)]
pub enum GeocodeError {
    /// Request failed or the service answered with a non-success status.
    Network(String),
    /// Response body did not have the expected shape.
    Parse(String),
}

impl std::fmt::Display for GeocodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeocodeError::Network(msg) => write!(f, "Network error: {}", msg),
            GeocodeError::Parse(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for GeocodeError {}

/// A forward geocoding provider.
pub trait Geocoder: Send + Sync {
    /// Short provider name for diagnostics.
    fn name(&self) -> &'static str;

    /// Resolves `query` to the first matching coordinate, `Ok(None)` if the
    /// provider has no match.
    fn geocode<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Result<Option<Coord>, GeocodeError>>;
}

// ============================================================================
// OpenCage
// ============================================================================

#[derive(Debug, Deserialize)]
struct OpenCageResponse {
    #[serde(default)]
    results: Vec<OpenCageResult>,
}

#[derive(Debug, Deserialize)]
struct OpenCageResult {
    geometry: OpenCageGeometry,
}

#[derive(Debug, Deserialize)]
struct OpenCageGeometry {
    lat: f64,
    lng: f64,
}

/// OpenCage forward geocoding (`/geocode/v1/json`).
pub struct OpenCageGeocoder {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenCageGeocoder {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    async fn request(&self, query: &str) -> Result<Option<Coord>, GeocodeError> {
        let url = format!("{}/geocode/v1/json", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .query(&[("q", query), ("key", self.api_key.as_str()), ("limit", "1")])
            .send()
            .await
            .map_err(|e| GeocodeError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| GeocodeError::Network(e.to_string()))?;
        parse_opencage_response(status, &body)
    }
}

/// Interprets an OpenCage response: the first result wins, no results is
/// `Ok(None)`.
pub fn parse_opencage_response(status: StatusCode, body: &[u8]) -> Result<Option<Coord>, GeocodeError> {
    if !status.is_success() {
        return Err(GeocodeError::Network(format!("OpenCage returned status {}", status)));
    }

    let response: OpenCageResponse =
        serde_json::from_slice(body).map_err(|e| GeocodeError::Parse(e.to_string()))?;

    Ok(response
        .results
        .first()
        .map(|r| Coord::new(r.geometry.lat, r.geometry.lng)))
}

impl Geocoder for OpenCageGeocoder {
    fn name(&self) -> &'static str {
        "OpenCage"
    }

    fn geocode<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Result<Option<Coord>, GeocodeError>> {
        Box::pin(self.request(query))
    }
}

// ============================================================================
// Geoapify
// ============================================================================

#[derive(Debug, Deserialize)]
struct GeoapifyResponse {
    #[serde(default)]
    features: Vec<GeoapifyFeature>,
}

#[derive(Debug, Deserialize)]
struct GeoapifyFeature {
    geometry: GeoapifyPoint,
}

#[derive(Debug, Deserialize)]
struct GeoapifyPoint {
    /// `[lng, lat]`.
    coordinates: Vec<f64>,
}

/// Geoapify address search (`/v1/geocode/search`).
///
/// Used by the dataset enrichment tool.
pub struct GeoapifyGeocoder {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GeoapifyGeocoder {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    async fn request(&self, query: &str) -> Result<Option<Coord>, GeocodeError> {
        let url = format!("{}/v1/geocode/search", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .query(&[("text", query), ("apiKey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| GeocodeError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| GeocodeError::Network(e.to_string()))?;
        parse_geoapify_response(status, &body)
    }
}

/// Interprets a Geoapify search response. Points are GeoJSON `[lng, lat]`.
pub fn parse_geoapify_response(status: StatusCode, body: &[u8]) -> Result<Option<Coord>, GeocodeError> {
    if !status.is_success() {
        return Err(GeocodeError::Network(format!("Geoapify returned status {}", status)));
    }

    let response: GeoapifyResponse =
        serde_json::from_slice(body).map_err(|e| GeocodeError::Parse(e.to_string()))?;

    match response.features.first() {
        Some(feature) => match feature.geometry.coordinates.as_slice() {
            [lng, lat, ..] => Ok(Some(Coord::new(*lat, *lng))),
            _ => Err(GeocodeError::Parse("point has fewer than two coordinates".into())),
        },
        None => Ok(None),
    }
}

impl Geocoder for GeoapifyGeocoder {
    fn name(&self) -> &'static str {
        "Geoapify"
    }

    fn geocode<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Result<Option<Coord>, GeocodeError>> {
        Box::pin(self.request(query))
    }
}

// ============================================================================
// Resolver
// ============================================================================

/// Cache-first location resolver.
///
/// SQLite statements run on the blocking pool so a slow disk does not hold up
/// other requests.
pub struct LocationResolver {
    cache: Arc<LocationCache>,
    geocoder: Arc<dyn Geocoder>,
}

impl LocationResolver {
    pub fn new(cache: LocationCache, geocoder: Arc<dyn Geocoder>) -> Self {
        Self {
            cache: Arc::new(cache),
            geocoder,
        }
    }

    pub fn cache(&self) -> &LocationCache {
        &self.cache
    }

    pub fn geocoder_name(&self) -> &'static str {
        self.geocoder.name()
    }

    /// Resolves `location` to coordinates, `None` if it cannot be found.
    ///
    /// A cache hit makes no external call. A miss calls the geocoder once and
    /// stores a successful result with no price.
    pub async fn resolve(&self, location: &str) -> Option<Coord> {
        let cache = Arc::clone(&self.cache);
        let key = location.to_string();
        match run_blocking(move || cache.get(&key)).await {
            Ok(Some(entry)) => {
                debug!("Location cache hit for {:?}", location);
                return Some(entry.coord);
            }
            Ok(None) => {}
            Err(e) => warn!("Location cache lookup failed for {:?}: {}", location, e),
        }

        info!("Geocoding {:?} via {}", location, self.geocoder.name());
        let coord = match self.geocoder.geocode(location).await {
            Ok(Some(coord)) => coord,
            Ok(None) => {
                info!("No geocoding match for {:?}", location);
                return None;
            }
            Err(e) => {
                warn!("Geocoding {:?} failed: {}", location, e);
                return None;
            }
        };

        let cache = Arc::clone(&self.cache);
        let key = location.to_string();
        if let Err(e) = run_blocking(move || cache.insert(&key, coord, None)).await {
            warn!("Could not cache coordinates for {:?}: {}", location, e);
        }
        Some(coord)
    }
}

/// Runs a cache operation on tokio's blocking pool.
async fn run_blocking<T, F>(op: F) -> Result<T, CacheError>
where
    F: FnOnce() -> Result<T, CacheError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .map_err(|e| CacheError::Task(e.to_string()))?
}
