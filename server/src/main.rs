use axum::{
    body::Bytes,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use gridshift::{apply_move, choose_move, ApplyRequest, MoveRequest};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_ADDR: &str = "0.0.0.0:3000";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let app = app_router();

    let addr = std::env::var("GRIDSHIFT_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn app_router() -> Router {
    let api = Router::new()
        .route("/move", post(handle_move))
        .route("/apply", post(handle_apply))
        .route("/health", get(|| async { "ok" }));
    Router::new()
        .nest("/api", api)
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST])
                .allow_origin(axum::http::HeaderValue::from_static("*"))
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(TraceLayer::new_for_http())
}

async fn handle_move(body: Bytes) -> Result<impl IntoResponse, ApiError> {
    let req: MoveRequest = serde_json::from_slice(&body)?;
    debug!(player = %req.player, seeded = req.seed.is_some(), "move requested");
    let mv = choose_move(req);
    let headers = [(header::CACHE_CONTROL, "no-store")];
    Ok((headers, Json(mv)))
}

async fn handle_apply(body: Bytes) -> Result<impl IntoResponse, ApiError> {
    let req: ApplyRequest = serde_json::from_slice(&body)?;
    let applied = apply_move(req)?;
    let headers = [(header::CACHE_CONTROL, "no-store")];
    Ok((headers, Json(applied)))
}

#[derive(Debug)]
struct ApiError(anyhow::Error);

impl<E: Into<anyhow::Error>> From<E> for ApiError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::BAD_REQUEST;
        let body = format!("{}", self.0);
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use gridshift::{ApplyResponse, Mark, Move, MoveResponse, Reason};
    use tower::util::ServiceExt;

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn http_move_endpoint() {
        let body = r#"{
            "position": {
                "board": [".....", ".XX..", ".OO..", ".....", "....."],
                "window": {"x": 1, "y": 1},
                "remaining": {"x": 2, "o": 2}
            },
            "player": "X",
            "seed": 3
        }"#;
        let response = app_router().oneshot(post_json("/api/move", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let mv: MoveResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(mv.mv, Some(Move::Place { x: 3, y: 1 }));
        assert_eq!(mv.reason, Some(Reason::Win));
    }

    #[tokio::test]
    async fn http_apply_endpoint() {
        let body = r#"{
            "position": {
                "board": [".....", ".....", ".....", ".....", "....."],
                "window": {"x": 1, "y": 1},
                "remaining": {"x": 4, "o": 4}
            },
            "player": "X",
            "move": {"type": "place", "x": 2, "y": 2}
        }"#;
        let response = app_router().oneshot(post_json("/api/apply", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let applied: ApplyResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(applied.position.board().get(2, 2), Some(Mark::X));
        assert_eq!(applied.to_move, Mark::O);
        assert_eq!(applied.winner, None);
    }

    #[tokio::test]
    async fn rejects_window_off_board() {
        let body = r#"{
            "position": {
                "board": [".....", ".....", ".....", ".....", "....."],
                "window": {"x": 3, "y": 0},
                "remaining": {"x": 4, "o": 4}
            },
            "player": "O"
        }"#;
        let response = app_router().oneshot(post_json("/api/move", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rejects_illegal_move() {
        let body = r#"{
            "position": {
                "board": [".....", ".....", ".....", ".....", "....."],
                "window": {"x": 1, "y": 1},
                "remaining": {"x": 4, "o": 4}
            },
            "player": "X",
            "move": {"type": "place", "x": 0, "y": 0}
        }"#;
        let response = app_router().oneshot(post_json("/api/apply", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("outside the active window"));
    }
}
