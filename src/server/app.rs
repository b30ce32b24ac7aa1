use axum::{http::HeaderValue, middleware, routing::post, Router};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::api::api_routes;
use crate::triggers::receive_event;

use super::{api_key_auth, AppState};

/// Largest accepted event body
const MAX_EVENT_BYTES: usize = 1024 * 1024;

pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(&state.settings.server.cors_origins);

    let events = Router::new()
        .route("/events", post(receive_event))
        .route_layer(middleware::from_fn_with_state(state.clone(), api_key_auth))
        .layer(RequestBodyLimitLayer::new(MAX_EVENT_BYTES));

    Router::new()
        // Eventarc push endpoint
        .merge(events)
        // Health, stats, metrics
        .merge(api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Allow any origin unless `server.cors_origins` lists some
fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(allowed)
    }
}
