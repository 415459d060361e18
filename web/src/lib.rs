use axum::http::{header, HeaderValue, Method};
use log::*;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

pub use self::error::{Error, Result};
pub use service::AppState;

use service::config::Config;

mod controller;
mod error;
mod params;
mod router;

pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let interface = app_state
        .config
        .interface
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let listen_addr = format!("{}:{}", interface, app_state.config.port);

    info!(
        "Server starting... listening for connections on http://{} [{}]",
        listen_addr,
        app_state.config.runtime_env()
    );

    let cors_layer = cors_layer(&app_state.config);
    let listener = TcpListener::bind(&listen_addr).await?;

    axum::serve(listener, router::define_routes(app_state).layer(cors_layer)).await
}

/// Builds the CORS policy from `allowed_origins`. Origins that are not valid
/// header values are skipped with a warning.
fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| {
            HeaderValue::from_str(origin.trim())
                .inspect_err(|e| warn!("Ignoring invalid CORS origin {origin}: {e}"))
                .ok()
        })
        .collect();

    debug!("CORS allowed origins: {:?}", origins);

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}
