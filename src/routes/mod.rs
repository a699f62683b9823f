//! HTTP boundary consumed by the browser shell.
//!
//! Every route answers with a result envelope; failures are reported inside
//! the body, never as transport errors.

pub mod health;
pub mod inspect;
pub mod tabs;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::inspect::PageInspector;
use crate::tabs::TabRegistry;

#[derive(Clone)]
pub struct AppState {
    pub inspector: Arc<dyn PageInspector>,
    pub tabs: Arc<RwLock<TabRegistry>>,
}

impl AppState {
    pub fn new(inspector: Arc<dyn PageInspector>) -> Self {
        Self {
            inspector,
            tabs: Arc::new(RwLock::new(TabRegistry::new())),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/get-certificate", post(inspect::get_certificate))
        .route("/api/fetch-metadata", post(inspect::fetch_metadata))
        .route("/api/tabs", get(tabs::list_tabs).post(tabs::open_tab))
        .route(
            "/api/tabs/:id",
            axum::routing::put(tabs::update_tab).delete(tabs::close_tab),
        )
        .route("/api/tabs/:id/activate", post(tabs::activate_tab))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
