//! HTTP route definitions

use crate::api::handlers;
use crate::api::models::*;
use crate::config::CorsConfig;
use crate::error::ErrorResponse;
use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "mm-backend API",
        version = "0.1.0",
        description = "Chat completion facade in front of an external text generation service.",
        license(name = "MIT"),
    ),
    servers(
        (url = "http://127.0.0.1:8080", description = "Local development server")
    ),
    paths(
        handlers::health_check,
        handlers::chat_completion,
    ),
    components(schemas(
        HealthStatus,
        Role,
        ChatMessage,
        ChatRequest,
        ChatCompletionResponse,
        ErrorResponse,
    )),
    tags(
        (name = "Chat", description = "Chat completion endpoints"),
        (name = "Health", description = "Health and monitoring endpoints"),
    )
)]
pub struct ApiDoc;

/// Build the CORS layer.
///
/// Credentialed responses may not use `*`, so "allow everything" with
/// credentials mirrors the request's origin, method and headers instead.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origin = if config.allows_any_origin() {
        if config.allow_credentials {
            AllowOrigin::mirror_request()
        } else {
            AllowOrigin::any()
        }
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    let layer = CorsLayer::new().allow_origin(origin);

    if config.allow_credentials {
        layer
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        layer.allow_methods(Any).allow_headers(Any)
    }
}

/// Create the main application router
pub fn create_router(state: Arc<crate::AppState>) -> Router {
    let cors = cors_layer(&state.settings.cors);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/chat/completion", post(handlers::chat_completion))
        // Swagger UI
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
