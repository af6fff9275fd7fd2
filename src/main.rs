//! Fuel Route - Axum Server

use std::error::Error;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use fuel_route::api::{self, AppState};
use fuel_route::cache::LocationCache;
use fuel_route::config::Config;
use fuel_route::console;
use fuel_route::geocode::{LocationResolver, OpenCageGeocoder};
use fuel_route::prices::PriceTable;
use fuel_route::routing::{http_client, GeoapifyRouter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("fuel_route=info".parse()?))
        .init();

    console::print_banner();

    let config = Config::from_env().inspect_err(|e| error!("Configuration error: {}", e))?;

    let prices = PriceTable::load(&config.prices_csv)
        .inspect_err(|e| error!("Cannot load {}: {}", config.prices_csv.display(), e))?;
    let cache = LocationCache::open(&config.cache_db)?;
    info!("Location cache at {}", config.cache_db.display());

    let client = http_client()?;
    let geocoder = OpenCageGeocoder::new(
        client.clone(),
        &config.opencage_base_url,
        &config.opencage_api_key,
    );
    let router = GeoapifyRouter::new(client, &config.geoapify_base_url, &config.geoapify_api_key);

    console::print_startup(config.bind_addr, prices.len(), cache.len()?);

    let resolver = LocationResolver::new(cache, Arc::new(geocoder));
    let state = Arc::new(AppState::new(prices, resolver, Arc::new(router)));
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
