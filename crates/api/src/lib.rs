//! HTTP API server with observability for the bookstore admin core.
//!
//! Provides REST endpoints for the customer and order status admin screens,
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod demo;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use domain::{CascadingDeleter, CustomerService, OrderStatusWorkflow};
use metrics_exporter_prometheus::PrometheusHandle;
use row_store::RowSource;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: RowSource + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S>))
        .route(
            "/customers",
            get(routes::customers::list::<S>).post(routes::customers::create::<S>),
        )
        .route(
            "/customers/{id}",
            get(routes::customers::get::<S>)
                .put(routes::customers::edit::<S>)
                .delete(routes::customers::delete::<S>),
        )
        .route("/customers/{id}/orders", get(routes::customers::orders::<S>))
        .route("/countries", get(routes::customers::countries::<S>))
        .route(
            "/orders/{id}/status",
            get(routes::orders::status::<S>).post(routes::orders::change_status::<S>),
        )
        .route("/orders/{id}/history", get(routes::orders::history::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over a row source, applying the configured
/// page size and status policy.
pub fn create_default_state<S: RowSource + Clone + 'static>(
    source: S,
    config: &Config,
) -> Arc<AppState<S>> {
    Arc::new(AppState {
        customers: CustomerService::new(source.clone()),
        deleter: CascadingDeleter::new(source.clone()),
        workflow: OrderStatusWorkflow::with_policy(source.clone(), config.status_policy()),
        source,
        default_page_size: config.default_page_size,
    })
}
