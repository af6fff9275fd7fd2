//! Fuel Route: fuel cost estimation along a driving route.
//!
//! Resolves two free-text locations, fetches a driving route between them,
//! samples the route geometry, matches samples to the nearest known fuel
//! price and sums an estimated cost.
//!
//! # Pipeline
//!
//! - [`prices::PriceTable`]: retail prices keyed by coordinate, from CSV
//! - [`geocode::LocationResolver`]: cache-first geocoding
//! - [`routing::RouteService`]: driving route between two coordinates
//! - [`sampler::sample_fuel_stops`]: fixed-stride sampling with nearest-price matching
//! - [`cost::total_cost`] and [`map::build_map_url`]: the estimate and a map link
//!
//! [`api::create_router`] composes them behind `GET /route`.

pub mod api;
pub mod cache;
pub mod config;
pub mod console;
pub mod cost;
pub mod domain;
pub mod geocode;
pub mod map;
pub mod prices;
pub mod routing;
pub mod sampler;
