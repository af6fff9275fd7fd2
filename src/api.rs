//! REST API for fuel cost estimation.
//!
//! Provides endpoints for:
//! - Route cost estimation (`GET /route`)
//! - Health and service info
//! - Swagger UI at /q/swagger-ui

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use utoipa::{IntoParams, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use crate::cost::total_cost;
use crate::domain::{Coord, FuelStop, StopPrice};
use crate::geocode::LocationResolver;
use crate::map::build_map_url;
use crate::prices::PriceTable;
use crate::routing::{RouteService, RoutingError};
use crate::sampler::{sample_fuel_stops, SampleError};

/// Application state shared across handlers.
///
/// Built once at startup; the price table is read-only from then on.
pub struct AppState {
    pub prices: PriceTable,
    pub resolver: LocationResolver,
    pub router: Arc<dyn RouteService>,
}

impl AppState {
    pub fn new(prices: PriceTable, resolver: LocationResolver, router: Arc<dyn RouteService>) -> Self {
        Self {
            prices,
            resolver,
            router,
        }
    }
}

/// Creates the API router with CORS, request tracing and Swagger UI enabled.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/info", get(info))
        .route("/route", get(get_route))
        .merge(SwaggerUi::new("/q/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Errors
// ============================================================================

/// JSON error body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Request failures, each mapped to a status and an `{"error": ..}` body.
#[derive(Debug)]
pub enum ApiError {
    /// A location is missing or could not be geocoded.
    InvalidLocation,
    /// The routing service failed or found no route.
    Routing(RoutingError),
    /// Stops could not be matched against the price table.
    Pricing(SampleError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidLocation | ApiError::Routing(_) => StatusCode::BAD_REQUEST,
            ApiError::Pricing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::InvalidLocation => "Invalid start or finish location".to_string(),
            ApiError::Routing(e) => e.to_string(),
            ApiError::Pricing(e) => e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(ErrorResponse {
                error: self.message(),
            }),
        )
            .into_response()
    }
}

// ============================================================================
// Health & Info
// ============================================================================

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Status indicator ("UP" when healthy).
    pub status: &'static str,
}

/// GET /health - Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is healthy", body = HealthResponse))
)]
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "UP" })
}

/// Application info response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    pub name: &'static str,
    pub version: &'static str,
    /// Geocoding provider name.
    pub geocoder: &'static str,
    /// Routing provider name.
    pub router: &'static str,
    /// Distinct coordinates in the price table.
    pub price_points: usize,
    /// Rows in the location cache, absent if the cache cannot be read.
    pub cached_locations: Option<usize>,
}

/// GET /info - Application info endpoint.
#[utoipa::path(
    get,
    path = "/info",
    responses((status = 200, description = "Application info", body = InfoResponse))
)]
async fn info(State(state): State<Arc<AppState>>) -> Json<InfoResponse> {
    Json(InfoResponse {
        name: "Fuel Route",
        version: env!("CARGO_PKG_VERSION"),
        geocoder: state.resolver.geocoder_name(),
        router: state.router.name(),
        price_points: state.prices.len(),
        cached_locations: state.resolver.cache().len().ok(),
    })
}

// ============================================================================
// Route estimation
// ============================================================================

/// Query parameters for `GET /route`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RouteQuery {
    /// Free-text start location.
    pub start_location: Option<String>,
    /// Free-text finish location.
    pub finish_location: Option<String>,
}

/// Estimated route with fuel stops and total cost.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RouteResponse {
    /// First route feature from the routing service, as received.
    #[schema(value_type = Object)]
    pub route: Value,
    pub fuel_stops: Vec<FuelStop>,
    pub total_cost: f64,
    pub map_url: String,
}

/// Resolves a query parameter; absent or blank values are never geocoded.
async fn resolve_param(resolver: &LocationResolver, param: Option<&str>) -> Option<Coord> {
    match param {
        Some(location) if !location.trim().is_empty() => resolver.resolve(location).await,
        _ => None,
    }
}

/// GET /route - Estimate fuel cost between two locations.
#[utoipa::path(
    get,
    path = "/route",
    params(RouteQuery),
    responses(
        (status = 200, description = "Route estimate", body = RouteResponse),
        (status = 400, description = "Invalid location or routing failure", body = ErrorResponse),
        (status = 500, description = "Price table cannot be matched", body = ErrorResponse)
    )
)]
async fn get_route(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RouteQuery>,
) -> Result<Json<RouteResponse>, ApiError> {
    let start = resolve_param(&state.resolver, query.start_location.as_deref()).await;
    let finish = resolve_param(&state.resolver, query.finish_location.as_deref()).await;
    let (Some(start), Some(finish)) = (start, finish) else {
        info!(
            "Rejecting route request: start={:?} finish={:?}",
            query.start_location, query.finish_location
        );
        return Err(ApiError::InvalidLocation);
    };

    let route = state
        .router
        .route(start, finish)
        .await
        .map_err(ApiError::Routing)?;

    let fuel_stops = match sample_fuel_stops(&route, &state.prices) {
        Ok(stops) => stops,
        Err(SampleError::GeometryDecode) => {
            warn!("Route from {} to {} has no decodable geometry", start, finish);
            Vec::new()
        }
        Err(e) => return Err(ApiError::Pricing(e)),
    };

    let total_cost = total_cost(&fuel_stops);
    let map_url = build_map_url(start, finish, &fuel_stops);
    info!(
        "Route {} -> {}: {} fuel stops, total cost {:.2}",
        start,
        finish,
        fuel_stops.len(),
        total_cost
    );

    Ok(Json(RouteResponse {
        route: route.feature,
        fuel_stops,
        total_cost,
        map_url,
    }))
}

// ============================================================================
// OpenAPI Documentation
// ============================================================================

#[derive(OpenApi)]
#[openapi(
    paths(health, info, get_route),
    components(schemas(
        HealthResponse,
        InfoResponse,
        ErrorResponse,
        RouteResponse,
        FuelStop,
        StopPrice,
        Coord,
    ))
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::LocationCache;
    use crate::geocode::tests::StubGeocoder;
    use crate::routing::Route;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use futures::future::BoxFuture;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    struct StubRouter {
        result: Result<Route, RoutingError>,
        calls: AtomicUsize,
    }

    impl StubRouter {
        fn answering(result: Result<Route, RoutingError>) -> Self {
            Self {
                result,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl RouteService for StubRouter {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn route<'a>(&'a self, _start: Coord, _finish: Coord) -> BoxFuture<'a, Result<Route, RoutingError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let result = self.result.clone();
            Box::pin(async move { result })
        }
    }

    fn tulsa() -> Coord {
        Coord::new(36.15, -95.99)
    }

    fn chicago() -> Coord {
        Coord::new(41.88, -87.63)
    }

    fn line_route() -> Route {
        Route {
            feature: json!({
                "type": "Feature",
                "properties": {"distance": 1105000},
                "geometry": {"type": "LineString", "coordinates": [[-95.99, 36.15], [-87.63, 41.88]]}
            }),
        }
    }

    fn price_table() -> PriceTable {
        PriceTable::from_points([(Coord::new(36.0, -96.0), Some(3.0)), (Coord::new(42.0, -88.0), Some(4.0))])
    }

    fn app(
        prices: PriceTable,
        geocoder: Arc<StubGeocoder>,
        router: Arc<StubRouter>,
    ) -> Router {
        let resolver = LocationResolver::new(LocationCache::open_in_memory().unwrap(), geocoder);
        create_router(Arc::new(AppState::new(prices, resolver, router)))
    }

    fn geocoder() -> Arc<StubGeocoder> {
        Arc::new(StubGeocoder::with(&[("Tulsa", tulsa()), ("Chicago", chicago())]))
    }

    async fn send(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_route_estimate() {
        let router = Arc::new(StubRouter::answering(Ok(line_route())));
        let app = app(price_table(), geocoder(), router);

        let (status, body) = send(app, "/route?start_location=Tulsa&finish_location=Chicago").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["route"]["properties"]["distance"], 1105000);
        assert_eq!(body["fuel_stops"], json!([{"location": "36.15,-95.99", "price": 3.0}]));
        assert_eq!(body["total_cost"], 150.0);
        assert_eq!(
            body["map_url"],
            "https://www.openstreetmap.org/directions?engine=mapquest_car&route=36.15,-95.99;36.15,-95.99;41.88,-87.63"
        );
    }

    #[tokio::test]
    async fn test_total_cost_is_non_negative() {
        let router = Arc::new(StubRouter::answering(Ok(line_route())));
        let prices = PriceTable::from_points([(Coord::new(36.0, -96.0), None)]);
        let (status, body) = send(
            app(prices, geocoder(), router),
            "/route?start_location=Tulsa&finish_location=Chicago",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["total_cost"].as_f64().unwrap() >= 0.0);
        assert_eq!(body["fuel_stops"][0]["price"], Value::Null);
    }

    #[tokio::test]
    async fn test_missing_parameter_is_bad_request() {
        let geocoder = geocoder();
        let router = Arc::new(StubRouter::answering(Ok(line_route())));
        let (status, body) = send(app(price_table(), geocoder.clone(), router.clone()), "/route?start_location=Tulsa").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Invalid start or finish location"}));
        assert_eq!(router.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unresolvable_location_is_bad_request() {
        let geocoder = geocoder();
        let router = Arc::new(StubRouter::answering(Ok(line_route())));
        let (status, body) = send(
            app(price_table(), geocoder.clone(), router.clone()),
            "/route?start_location=Atlantis&finish_location=Chicago",
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid start or finish location");
        // Both locations are resolved before either is checked.
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 2);
        assert_eq!(router.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_routes_not_found() {
        let router = Arc::new(StubRouter::answering(Err(RoutingError::NoRoute)));
        let (status, body) = send(
            app(price_table(), geocoder(), router),
            "/route?start_location=Tulsa&finish_location=Chicago",
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Routes not found"}));
    }

    #[tokio::test]
    async fn test_upstream_failure_is_bad_request() {
        let router = Arc::new(StubRouter::answering(Err(RoutingError::Status(503))));
        let (status, body) = send(
            app(price_table(), geocoder(), router),
            "/route?start_location=Tulsa&finish_location=Chicago",
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Failed to get route from Geoapify");
    }

    #[tokio::test]
    async fn test_missing_geometry_degrades_to_no_stops() {
        let route = Route {
            feature: json!({"type": "Feature", "properties": {}}),
        };
        let router = Arc::new(StubRouter::answering(Ok(route)));
        let (status, body) = send(
            app(price_table(), geocoder(), router),
            "/route?start_location=Tulsa&finish_location=Chicago",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["fuel_stops"], json!([]));
        assert_eq!(body["total_cost"], 0.0);
        assert_eq!(
            body["map_url"],
            "https://www.openstreetmap.org/directions?engine=mapquest_car&route=36.15,-95.99;41.88,-87.63"
        );
    }

    #[tokio::test]
    async fn test_empty_price_table_is_server_error() {
        let router = Arc::new(StubRouter::answering(Ok(line_route())));
        let (status, body) = send(
            app(PriceTable::new(), geocoder(), router),
            "/route?start_location=Tulsa&finish_location=Chicago",
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_repeat_request_hits_cache() {
        let geocoder = geocoder();
        let router = Arc::new(StubRouter::answering(Ok(line_route())));
        let app = app(price_table(), geocoder.clone(), router);
        let uri = "/route?start_location=Tulsa&finish_location=Chicago";

        send(app.clone(), uri).await;
        let (status, _) = send(app, uri).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_health() {
        let router = Arc::new(StubRouter::answering(Ok(line_route())));
        let (status, body) = send(app(price_table(), geocoder(), router), "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "UP"}));
    }

    #[tokio::test]
    async fn test_info_reports_counts() {
        let router = Arc::new(StubRouter::answering(Ok(line_route())));
        let (status, body) = send(app(price_table(), geocoder(), router), "/info").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pricePoints"], 2);
        assert_eq!(body["cachedLocations"], 0);
        assert_eq!(body["geocoder"], "stub");
    }
}
