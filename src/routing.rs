//! Driving routes from the Geoapify routing API.
//!
//! The router sends both endpoints as `lat,lng|lat,lng` waypoints with
//! `mode=drive` and returns the first feature of the response untouched,
//! since the request handler echoes it back to the caller. There is no retry
//! and no timeout beyond the HTTP client's defaults.

use futures::future::BoxFuture;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::domain::Coord;

/// User agent sent with every outbound request.
const USER_AGENT: &str = concat!("fuel-route/", env!("CARGO_PKG_VERSION"));

/// Builds the HTTP client shared by the geocoder and router.
pub fn http_client() -> Result<Client, reqwest::Error> {
    Client::builder().user_agent(USER_AGENT).build()
}

/// Error type for routing operations.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutingError {
    /// Request failed before a response arrived.
    Network(String),
    /// The service answered with a non-200 status.
    Status(u16),
    /// Response body was not JSON.
    Decode(String),
    /// Response decoded but listed no route features.
    NoRoute,
}

impl RoutingError {
    /// Message reported to API clients.
    pub fn message(&self) -> &'static str {
        match self {
            RoutingError::Network(_) | RoutingError::Status(_) => "Failed to get route from Geoapify",
            RoutingError::Decode(_) => "Failed to decode JSON response from Geoapify",
            RoutingError::NoRoute => "Routes not found",
        }
    }
}

impl std::fmt::Display for RoutingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for RoutingError {}

/// First route feature returned by the routing service.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// The GeoJSON feature as received, `geometry` included.
    pub feature: Value,
}

/// A provider of driving routes between two points.
pub trait RouteService: Send + Sync {
    fn name(&self) -> &'static str;

    fn route<'a>(&'a self, start: Coord, finish: Coord) -> BoxFuture<'a, Result<Route, RoutingError>>;
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Value>,
}

/// Formats the `waypoints` query parameter.
///
/// ```
/// use fuel_route::domain::Coord;
/// use fuel_route::routing::waypoints;
///
/// let param = waypoints(Coord::new(36.15, -95.99), Coord::new(41.88, -87.63));
/// assert_eq!(param, "36.15,-95.99|41.88,-87.63");
/// ```
pub fn waypoints(start: Coord, finish: Coord) -> String {
    format!("{}|{}", start, finish)
}

/// Interprets a routing response.
///
/// A missing `features` key counts as an empty feature list.
pub fn parse_route_response(status: StatusCode, body: &[u8]) -> Result<Route, RoutingError> {
    if status != StatusCode::OK {
        error!(
            "Routing service returned {}: {}",
            status,
            String::from_utf8_lossy(body)
        );
        return Err(RoutingError::Status(status.as_u16()));
    }

    let collection: FeatureCollection = serde_json::from_slice(body).map_err(|e| {
        error!("Routing response is not valid JSON: {}", e);
        RoutingError::Decode(e.to_string())
    })?;

    collection
        .features
        .into_iter()
        .next()
        .map(|feature| Route { feature })
        .ok_or(RoutingError::NoRoute)
}

/// Geoapify routing client (`/v1/routing`).
pub struct GeoapifyRouter {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GeoapifyRouter {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    async fn fetch(&self, start: Coord, finish: Coord) -> Result<Route, RoutingError> {
        let url = format!("{}/v1/routing", self.base_url.trim_end_matches('/'));
        let waypoints = waypoints(start, finish);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("waypoints", waypoints.as_str()),
                ("mode", "drive"),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                error!("Routing request failed: {}", e);
                RoutingError::Network(e.to_string())
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            error!("Failed to read routing response: {}", e);
            RoutingError::Network(e.to_string())
        })?;
        debug!("Routing response: status={}, {} bytes", status, body.len());

        parse_route_response(status, &body)
    }
}

impl RouteService for GeoapifyRouter {
    fn name(&self) -> &'static str {
        "Geoapify"
    }

    fn route<'a>(&'a self, start: Coord, finish: Coord) -> BoxFuture<'a, Result<Route, RoutingError>> {
        Box::pin(self.fetch(start, finish))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_feature_is_returned() {
        let body = json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"distance": 1200}, "geometry": {"type": "LineString", "coordinates": [[-95.99, 36.15]]}},
                {"type": "Feature", "properties": {"distance": 9999}}
            ]
        });
        let route = parse_route_response(StatusCode::OK, body.to_string().as_bytes()).unwrap();
        assert_eq!(route.feature["properties"]["distance"], 1200);
    }

    #[test]
    fn test_empty_feature_list_is_routes_not_found() {
        let err = parse_route_response(StatusCode::OK, br#"{"features": []}"#).unwrap_err();
        assert_eq!(err, RoutingError::NoRoute);
        assert_eq!(err.to_string(), "Routes not found");
    }

    #[test]
    fn test_missing_features_key_is_routes_not_found() {
        let err = parse_route_response(StatusCode::OK, br#"{"statusCode": 200}"#).unwrap_err();
        assert_eq!(err, RoutingError::NoRoute);
    }

    #[test]
    fn test_non_200_status() {
        let err = parse_route_response(StatusCode::UNAUTHORIZED, br#"{"error":"Invalid apiKey"}"#)
            .unwrap_err();
        assert_eq!(err, RoutingError::Status(401));
        assert_eq!(err.to_string(), "Failed to get route from Geoapify");
    }

    #[test]
    fn test_undecodable_body() {
        let err = parse_route_response(StatusCode::OK, b"<html>gateway</html>").unwrap_err();
        assert!(matches!(err, RoutingError::Decode(_)));
        assert_eq!(err.message(), "Failed to decode JSON response from Geoapify");
    }

    #[test]
    fn test_network_failure_message() {
        let err = RoutingError::Network("dns error".into());
        assert_eq!(err.message(), "Failed to get route from Geoapify");
    }
}
