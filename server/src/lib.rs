//! Parking bay aggregation backend for the map frontend.
//!
//! # Why a cache at all
//!
//! The open-data feed this service fronts is an external third party: slow,
//! rate-limited, and occasionally down. Every read endpoint therefore serves
//! from a single in-memory snapshot of the whole collection, refreshed on
//! demand once its TTL lapses. When a refresh fails we keep serving the old
//! snapshot with a warning flag rather than erroring; for a map overlay,
//! slightly outdated bays beat an empty map.
//!
//! # Surface
//!
//! Everything lives under `/parking-bays`:
//! - `GET /` — filtered, paginated listing with cache provenance metadata
//! - `GET /stats` — aggregate counts over the cached collection
//! - `GET /search?q=` — free-text lookup, 400 without a query
//! - `GET /zone/{zone_number}` — bays in one zone
//! - `GET /{id}` — single bay, 404 when absent
//! - `POST /refresh` — explicit refetch, no stale fallback
//!
//! The heavy lifting (normalization, classification, cache, query engine)
//! lives in the `bays` crate; this crate is wiring.

use std::time::Duration;

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{get, post},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use routes::{
    bay_by_id_handler, bays_handler, refresh_handler, search_handler, stats_handler, zone_handler,
};
use state::State;

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = State::new();

    info!("Starting server...");

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let bays_routes = Router::new()
        .route("/", get(bays_handler))
        .route("/stats", get(stats_handler))
        .route("/search", get(search_handler))
        .route("/refresh", post(refresh_handler))
        .route("/zone/{zone_number}", get(zone_handler))
        .route("/{id}", get(bay_by_id_handler));

    let app = Router::new()
        .nest("/parking-bays", bays_routes)
        .layer(cors)
        .with_state(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    println!("Server shutting down...");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
