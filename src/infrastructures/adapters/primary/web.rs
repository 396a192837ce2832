use crate::application::use_cases::list_repository_summaries::{
    ListRepositorySummariesInteractor, ListRepositorySummariesUseCase,
    ListRepositorySummariesUseCaseInput,
};
use crate::application::use_cases::stream_repository_summaries::{
    StreamRepositorySummariesInteractor, StreamRepositorySummariesUseCase,
    StreamRepositorySummariesUseCaseInput,
};
use crate::infrastructures::adapters::secondary::external_apis::github::GitHubApiAdapter;
use axum::extract::ws::Utf8Bytes;
use axum::{
    Json, Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use futures_util::StreamExt;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub list_use_case: Arc<ListRepositorySummariesInteractor<GitHubApiAdapter>>,
    pub stream_use_case: Arc<StreamRepositorySummariesInteractor<GitHubApiAdapter>>,
}

/// One-shot snapshot for the frontend's render pass.
#[axum::debug_handler]
pub async fn list_repositories(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state
        .list_use_case
        .execute(ListRepositorySummariesUseCaseInput::default())
        .await
    {
        Ok(output) => Json(output).into_response(),
        Err(e) => {
            tracing::error!("Failed to assemble repository snapshot: {:?}", e);
            (StatusCode::BAD_GATEWAY, "Upstream fetch failed").into_response()
        }
    }
}

#[axum::debug_handler]
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.stream_use_case.clone()))
}

#[tracing::instrument(name = "handle_socket", skip(socket, use_case))]
async fn handle_socket(
    mut socket: WebSocket,
    use_case: Arc<StreamRepositorySummariesInteractor<GitHubApiAdapter>>,
) {
    tracing::info!("Client connected");
    let stream = use_case.execute(StreamRepositorySummariesUseCaseInput::default());
    tokio::pin!(stream);

    loop {
        tokio::select! {
            Some(result) = stream.next() => {
                match result {
                    Ok(output) => {
                        match serde_json::to_string(&output) {
                            Ok(json_string) => {
                                if socket.send(Message::Text(Utf8Bytes::from(json_string))).await.is_err() {
                                    tracing::info!("Client disconnected (send error)");
                                    break;
                                }
                            }
                            Err(e) => {
                                tracing::error!("Failed to serialize snapshot: {:?}", e);
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!("Error from snapshot stream: {:?}", e);
                        if socket.send(Message::Text(Utf8Bytes::from(format!("Error: {e}")))).await.is_err() {
                            tracing::info!("Client disconnected (send error after stream error)");
                            break;
                        }
                    }
                }
            },
            Some(Ok(msg)) = socket.recv() => {
                match msg {
                    Message::Close(_) => {
                        tracing::info!("Client disconnected (received close message)");
                        break;
                    }
                    Message::Text(t) => {
                        tracing::debug!("Received text from client: {}", t);
                    }
                    _ => {
                        // Ping/Pong and Binary frames carry nothing for us.
                    }
                }
            },
            else => {
                tracing::info!("Client or stream ended");
                break;
            }
        };
    }
    tracing::info!("Client disconnected");
}

#[tracing::instrument(name = "health_check")]
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/repos", get(list_repositories))
        .route("/ws", get(websocket_handler))
        .route("/health", get(health_check))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
}
