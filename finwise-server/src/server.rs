use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderMap, Method};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use finwise_core::DeviceClass;
use finwise_market_data::SnapshotCache;

use crate::config::ServerConfig;
use crate::delivery;
use crate::error::ApiError;
use crate::handler::ChatPipeline;
use crate::interaction_log::{InteractionLogger, InteractionRecord};
use crate::protocol::{
    history_from_wire, ChatRequest, ChatResponse, MarketDataResponse, PingResponse,
};

/// Shared state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ChatPipeline>,
    pub cache: Arc<SnapshotCache>,
    pub logger: Arc<InteractionLogger>,
    pub chunk_size: usize,
}

/// Create the Axum router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/ping", get(ping))
        .route("/market-data", get(market_data))
        .route("/chat", post(chat))
        .route("/stream", post(stream))
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn run(config: ServerConfig, state: AppState) -> Result<()> {
    let app = create_router(state);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("FinWise server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        status: "ok",
        message: "Server is running",
    })
}

async fn market_data(State(state): State<AppState>) -> Json<MarketDataResponse> {
    let snapshot = state.cache.fetch().await;
    Json(MarketDataResponse::from(snapshot.as_ref()))
}

async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let agent = user_agent(&headers);
    let device = DeviceClass::from_user_agent(agent.as_deref());
    info!(
        "chat request: device={:?}, history={} turns",
        device,
        request.history.len()
    );

    let history_length = request.history.len();
    let history = history_from_wire(request.history);
    let reply = match state
        .pipeline
        .respond(&request.chat, &history, device)
        .await
    {
        Ok(reply) => reply,
        Err(err) => {
            log_interaction(
                &state,
                connect_info,
                agent,
                "/chat",
                &request.chat,
                history_length,
                &err.to_string(),
            );
            return Err(err);
        }
    };

    let text = delivery::shape_whole_reply(reply.text, device);
    log_interaction(
        &state,
        connect_info,
        agent,
        "/chat",
        &request.chat,
        history_length,
        &text,
    );

    Ok(Json(ChatResponse {
        text,
        elapsed_ms: reply.elapsed.as_millis() as u64,
        device_class: reply.device,
    }))
}

async fn stream(
    State(state): State<AppState>,
    headers: HeaderMap,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    Json(request): Json<ChatRequest>,
) -> Response {
    let request_id = new_request_id();
    let agent = user_agent(&headers);
    let device = DeviceClass::from_user_agent(agent.as_deref());
    info!(
        "[{}] stream request: device={:?}, history={} turns",
        request_id,
        device,
        request.history.len()
    );

    let history_length = request.history.len();
    let history = history_from_wire(request.history);
    match state
        .pipeline
        .respond(&request.chat, &history, device)
        .await
    {
        Ok(reply) => {
            let chunks = delivery::chunk_text(&reply.text, state.chunk_size);
            info!(
                "[{}] streaming {} chunks of up to {} chars",
                request_id,
                chunks.len(),
                state.chunk_size
            );
            log_interaction(
                &state,
                connect_info,
                agent,
                "/stream",
                &request.chat,
                history_length,
                "Stream response",
            );
            delivery::stream_response(chunks)
        }
        // Errors go out as one structured payload; no chunk is written first.
        Err(err) => {
            log_interaction(
                &state,
                connect_info,
                agent,
                "/stream",
                &request.chat,
                history_length,
                &err.to_string(),
            );
            let status = err.status();
            let mut body = err.body();
            body.request_id = Some(request_id);
            (status, Json(body)).into_response()
        }
    }
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn new_request_id() -> String {
    let now = Utc::now();
    format!(
        "{}-{:06}",
        now.format("%Y%m%d-%H%M%S"),
        now.timestamp_subsec_micros()
    )
}

fn log_interaction(
    state: &AppState,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    agent: Option<String>,
    endpoint: &str,
    query: &str,
    history_length: usize,
    response: &str,
) {
    let client_ip = connect_info
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let record = InteractionRecord::new(
        client_ip,
        agent.unwrap_or_else(|| "Unknown".to_string()),
        endpoint,
        query,
        history_length,
        response,
    );

    let logger = Arc::clone(&state.logger);
    tokio::spawn(async move { logger.record(record).await });
}
