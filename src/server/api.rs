use crate::error::RelayError;
use crate::models::chat::{ ChatReply, ChatRequest, ErrorReply, HistoryReply, ResetReply };
use crate::relay::RelayService;
use std::convert::Infallible;
use std::path::Path;
use std::sync::Arc;
use axum::{
    body::Body,
    extract::{ rejection::JsonRejection, State },
    http::{ header, StatusCode },
    response::{ IntoResponse, Redirect, Response },
    routing::{ get, post },
    Json,
    Router,
};
use futures::StreamExt;
use log::{ info, warn };
use tower::ServiceBuilder;
use tower_http::cors::{ Any, CorsLayer };
use tower_http::services::ServeDir;

pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

#[derive(Clone)]
struct AppState {
    relay: Arc<RelayService>,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = match &self {
            RelayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            | RelayError::UpstreamUnavailable(_)
            | RelayError::UpstreamError(_)
            | RelayError::StreamDecode(_) => StatusCode::BAD_GATEWAY,
            RelayError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ErrorReply { error: self.to_string() })).into_response()
    }
}

pub fn router(relay: Arc<RelayService>, frontend_dir: impl AsRef<Path>) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route(
            "/",
            get(|| async { Redirect::permanent("/frontend/") })
        )
        .route("/api/chat", post(chat_handler))
        .route("/api/reset", post(reset_handler))
        .route("/api/history", get(history_handler))
        .nest_service("/frontend", ServeDir::new(frontend_dir.as_ref()))
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(AppState { relay })
}

async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!("Rejected chat request: {}", rejection.body_text());
            return (
                rejection.status(),
                Json(ErrorReply { error: rejection.body_text() }),
            ).into_response();
        }
    };

    if !request.stream {
        return match state.relay.chat(request).await {
            Ok(response) => Json(ChatReply { response }).into_response(),
            Err(e) => e.into_response(),
        };
    }

    match state.relay.chat_stream(request).await {
        Ok(events) => {
            let body = events.map(|event| Ok::<_, Infallible>(event.to_line().to_ndjson()));
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, NDJSON_CONTENT_TYPE),
                    (header::CACHE_CONTROL, "no-cache"),
                ],
                Body::from_stream(body),
            ).into_response()
        }
        Err(e) => e.into_response(),
    }
}

async fn reset_handler(State(state): State<AppState>) -> Response {
    match state.relay.reset().await {
        Ok(()) => Json(ResetReply { status: "ok".to_string() }).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn history_handler(State(state): State<AppState>) -> Json<HistoryReply> {
    let history = state.relay.history().await;
    info!("Returning full conversation history ({} turns)", history.len());
    Json(HistoryReply { history })
}
