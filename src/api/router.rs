//! HTTP router for the labeling service.
//!
//! All routes are nested under `/api/`. Outer layers: tracing, permissive
//! CORS (the UI is served from another origin) and `Cache-Control: no-store`.

use axum::http::{header, HeaderValue};
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;

/// Build the API router over a shared context.
///
/// NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
pub fn api_router(ctx: ApiContext) -> Router {
    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/label", post(endpoints::label::label))
        .route("/completion", post(endpoints::completion::complete))
        .route(
            "/sessions",
            get(endpoints::sessions::list).post(endpoints::sessions::create),
        )
        .route(
            "/sessions/:id",
            get(endpoints::sessions::detail).delete(endpoints::sessions::remove),
        )
        .route("/sessions/:id/results", put(endpoints::sessions::update_results))
        .route("/sessions/:id/complete", post(endpoints::sessions::complete))
        .route("/sessions/:id/corrections", post(endpoints::sessions::correct))
        .route("/sessions/:id/reviews", post(endpoints::sessions::accept))
        .route("/sessions/:id/export", get(endpoints::sessions::export))
        .route("/sessions/:id/label", post(endpoints::sessions::label))
        .with_state(ctx);

    Router::new()
        .nest("/api", api)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
