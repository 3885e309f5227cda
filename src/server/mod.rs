//! HTTP surface for the validator.
//!
//! JSON API only; the consuming form lives elsewhere, hence permissive CORS.

mod handlers;
mod state;

use axum::routing::get;
use axum::Router;
use state::AppState;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::fence::GeofenceValidator;

pub fn build_router(validator: GeofenceValidator) -> Router {
    let state = Arc::new(AppState { validator });

    Router::new()
        .route("/api/validate", get(handlers::validate_address))
        .route("/api/reference", get(handlers::reference))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(host: &str, port: u16, validator: GeofenceValidator) {
    let reference = validator.reference();
    let app = build_router(validator);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            eprintln!("Error: Cannot bind to {}: {}", addr, e);
            std::process::exit(1);
        });

    eprintln!("  Geogate server listening on http://{}", addr);
    eprintln!(
        "  Reference point ({:.4}, {:.4}), radius {} km",
        reference.anchor.latitude, reference.anchor.longitude, reference.max_distance_km
    );
    eprintln!("  Press Ctrl+C to stop.");

    axum::serve(listener, app)
        .await
        .unwrap_or_else(|e| {
            eprintln!("Server error: {}", e);
            std::process::exit(1);
        });
}
