use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderName, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use stockmind_core::assistant::{ChatAssistant, ChatError};
use stockmind_core::domain::chat::{
    ChatRequest, ChatResponse, PlainChatResponse, CHAT_APOLOGY, PLAIN_CHAT_APOLOGY,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = stockmind_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let assistant = ChatAssistant::from_settings(&settings).inspect_err(|e| {
        sentry_anyhow::capture_anyhow(e);
        tracing::error!(error = %e, "failed to build chat assistant");
    })?;
    for (provider, configured) in assistant.api_sources() {
        tracing::info!(%provider, configured, "data provider");
    }

    let state = AppState {
        assistant: Arc::new(assistant),
    };
    let app = router(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/functions/ai-chat-enhanced", post(chat_enhanced))
        .route("/functions/ai-chat-assistant", post(chat_assistant))
        .with_state(state)
        .layer(cors())
        .layer(TraceLayer::new_for_http())
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            header::CONTENT_TYPE,
        ])
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    assistant: Arc<ChatAssistant>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    response: &'static str,
}

/// Error reply for the chat functions. The `response` field is always safe to show to users.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    error: String,
    response: &'static str,
}

impl ApiError {
    fn bad_request(rejection: JsonRejection, response: &'static str) -> Self {
        tracing::warn!(error = %rejection.body_text(), "rejected chat request body");
        Self {
            status: StatusCode::BAD_REQUEST,
            error: rejection.body_text(),
            response,
        }
    }

    fn chat(err: ChatError, response: &'static str) -> Self {
        let ChatError::Llm(inner) = &err;
        sentry_anyhow::capture_anyhow(inner);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: err.to_string(),
            response,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.error,
                response: self.response,
            }),
        )
            .into_response()
    }
}

async fn chat_enhanced(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(req) = body.map_err(|r| ApiError::bad_request(r, CHAT_APOLOGY))?;

    let span = tracing::info_span!("ai_chat_enhanced", request_id = %Uuid::new_v4());
    async move {
        tracing::info!(chars = req.message.len(), "chat request");
        let res = state
            .assistant
            .respond(&req)
            .await
            .map_err(|e| ApiError::chat(e, CHAT_APOLOGY))?;
        Ok(Json(res))
    }
    .instrument(span)
    .await
}

async fn chat_assistant(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<PlainChatResponse>, ApiError> {
    let Json(req) = body.map_err(|r| ApiError::bad_request(r, PLAIN_CHAT_APOLOGY))?;

    let span = tracing::info_span!("ai_chat_assistant", request_id = %Uuid::new_v4());
    async move {
        let res = state
            .assistant
            .plain_chat(&req)
            .await
            .map_err(|e| ApiError::chat(e, PLAIN_CHAT_APOLOGY))?;
        Ok(Json(res))
    }
    .instrument(span)
    .await
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &stockmind_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
