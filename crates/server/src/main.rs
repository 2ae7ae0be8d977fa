use std::{net::SocketAddr, sync::Arc};

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use rules::{evaluate, EvaluationContext, StaticCatalog, VendorCatalog};
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{WebhookRequest, WebhookResponse},
};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{info, warn};

mod auth;
mod config;

use auth::verify_signature;
use config::load_settings;

const MAX_BODY_BYTES: usize = 1024 * 1024;

struct AppState {
    catalog: Box<dyn VendorCatalog + Send + Sync>,
    secret_key: String,
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    if settings.secret_key.is_empty() {
        anyhow::bail!(
            "no webhook secret configured; set WEBHOOK_SECRET_KEY or secret_key in webhook.toml"
        );
    }

    let state = AppState {
        catalog: Box::new(StaticCatalog::default()),
        secret_key: settings.secret_key,
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.bind_addr.parse()?;
    info!(%addr, "webhook listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/vendor_matching", post(vendor_matching))
        .route("/save", post(save))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

/// The core endpoint: authenticate the raw body, parse it, run the rules,
/// return messages and operations.
async fn vendor_matching(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<WebhookResponse>> {
    authenticate(&state, &headers, &body)?;

    let request: WebhookRequest = serde_json::from_slice(&body).map_err(|err| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(
                ErrorCode::Validation,
                format!("malformed webhook payload: {err}"),
            )),
        )
    })?;

    let ctx = EvaluationContext::from_request(&request);
    let response = evaluate(&request.annotation.content, &ctx, state.catalog.as_ref()).map_err(
        |err| {
            warn!(%err, "rule evaluation aborted");
            (
                StatusCode::BAD_REQUEST,
                Json(ApiError::new(ErrorCode::Validation, err.to_string())),
            )
        },
    )?;
    Ok(Json(response))
}

/// Final-save acknowledgement; the platform expects an empty success.
async fn save(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<StatusCode> {
    authenticate(&state, &headers, &body)?;
    Ok(StatusCode::OK)
}

fn authenticate(state: &AppState, headers: &HeaderMap, body: &[u8]) -> ApiResult<()> {
    verify_signature(headers, body, &state.secret_key).map_err(|err| {
        warn!(%err, "rejected webhook request");
        (
            StatusCode::UNAUTHORIZED,
            Json(ApiError::new(ErrorCode::Unauthorized, err.to_string())),
        )
    })
}
