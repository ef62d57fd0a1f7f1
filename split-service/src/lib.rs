pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post, put},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware, rate_limit::ip_rate_limit_middleware,
    rate_limit::IpRateLimiter, security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};

use crate::config::SplitConfig;
use crate::services::SessionStore;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::split::create_split,
        handlers::split::get_split,
        handlers::split::update_totals,
        handlers::split::delete_split,
        handlers::person::add_person,
        handlers::person::rename_person,
        handlers::person::remove_person,
        handlers::assignment::assign_item,
        handlers::assignment::unassign_item,
        handlers::finalize::finalize_split,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::RawReceiptItem,
            dtos::CreateSplitRequest,
            dtos::UpdateTotalsRequest,
            dtos::AddPersonRequest,
            dtos::RenamePersonRequest,
            dtos::AssignItemRequest,
            dtos::ItemView,
            dtos::PersonView,
            dtos::TotalsView,
            dtos::SplitResponse,
            models::TipPolicy,
            models::LineItem,
            models::PersonSummary,
            models::SplitSummary,
        )
    ),
    tags(
        (name = "Splits", description = "Split session lifecycle"),
        (name = "People", description = "Participants in a split"),
        (name = "Assignment", description = "Exclusive item-to-person assignment"),
        (name = "Finalize", description = "Validation gate and shareable summary"),
        (name = "Observability", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub config: SplitConfig,
    pub store: SessionStore,
    pub ip_rate_limiter: IpRateLimiter,
}

pub async fn build_router(state: AppState) -> Result<Router, AppError> {
    let ip_limiter = state.ip_rate_limiter.clone();

    let mut app = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(handlers::metrics::metrics));

    let swagger_enabled = match state.config.environment {
        crate::config::Environment::Dev => true,
        crate::config::Environment::Prod => {
            state.config.swagger.enabled == crate::config::SwaggerMode::Public
        }
    };

    if swagger_enabled {
        app =
            app.merge(SwaggerUi::new("/docs").url("/.well-known/openapi.json", ApiDoc::openapi()));
    } else {
        app = app.route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        );
    }

    let app = app
        .route("/splits", post(handlers::split::create_split))
        .route(
            "/splits/:split_id",
            get(handlers::split::get_split).delete(handlers::split::delete_split),
        )
        .route(
            "/splits/:split_id/totals",
            patch(handlers::split::update_totals),
        )
        .route(
            "/splits/:split_id/people",
            post(handlers::person::add_person),
        )
        .route(
            "/splits/:split_id/people/:person_id",
            patch(handlers::person::rename_person).delete(handlers::person::remove_person),
        )
        .route(
            "/splits/:split_id/items/:item_id/owner",
            put(handlers::assignment::assign_item).delete(handlers::assignment::unassign_item),
        )
        .route(
            "/splits/:split_id/finalize",
            post(handlers::finalize::finalize_split),
        )
        .with_state(state.clone())
        // Global IP rate limiting
        .layer(from_fn_with_state(ip_limiter, ip_rate_limit_middleware))
        // Add metrics middleware
        .layer(from_fn(metrics_middleware))
        // Add tracing layer
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        // Add tracing middleware for request_id
        .layer(from_fn(request_id_middleware))
        // Add security headers middleware
        .layer(from_fn(security_headers_middleware))
        // Add CORS layer
        .layer(
            CorsLayer::new()
                .allow_origin(
                    state
                        .config
                        .security
                        .allowed_origins
                        .iter()
                        .map(|o| {
                            o.parse::<axum::http::HeaderValue>().unwrap_or_else(|e| {
                                tracing::error!(
                                    "Invalid CORS origin '{}': {}. Using fallback.",
                                    o,
                                    e
                                );
                                axum::http::HeaderValue::from_static("*")
                            })
                        })
                        .collect::<Vec<axum::http::HeaderValue>>(),
                )
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::PATCH,
                    axum::http::Method::PUT,
                    axum::http::Method::DELETE,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::HeaderName::from_static("x-request-id"),
                ]),
        );

    Ok(app)
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy")
    ),
    tag = "Observability"
)]
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "active_sessions": state.store.len(),
    }))
}
