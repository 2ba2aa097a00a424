//! Dashboard — Axum web server exposing the command surface and
//! read-only table state.
//!
//! JSON only; rendering is an external concern. CORS enabled for local
//! development.

pub mod routes;

use anyhow::Result;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::info;

use routes::AppState;

/// Start the dashboard web server.
///
/// This spawns a background task — it doesn't block.
pub fn spawn_dashboard(state: AppState, port: u16) -> Result<()> {
    let app = build_router(state);

    tokio::spawn(async move {
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
        info!(port, "Dashboard server starting on http://localhost:{port}");

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .expect("Failed to bind dashboard port");

        axum::serve(listener, app)
            .await
            .expect("Dashboard server error");
    });

    Ok(())
}

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin("*".parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        // Read surface
        .route("/api/status", get(routes::get_status))
        .route("/api/history", get(routes::get_history))
        .route("/health", get(routes::health))
        // Command surface
        .route("/api/bet", post(routes::place_bet))
        .route("/api/cashout", post(routes::cash_out))
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::config::GameConfig;
    use crate::engine::GameEngine;
    use crate::rng::FixedSource;
    use crate::storage::MockBalanceStore;

    fn test_engine() -> AppState {
        let mut store = MockBalanceStore::new();
        store.expect_save_balance().returning(|_, _| Ok(()));
        // An hour-long tick keeps the table deterministic for the test.
        let cfg = GameConfig {
            tick_interval_ms: 3_600_000,
            ..GameConfig::default()
        };
        Arc::new(GameEngine::spawn(
            cfg,
            "test".to_string(),
            10_000,
            Box::new(FixedSource::new(vec![0.5, 0.5])),
            Arc::new(store),
        ))
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), 100_000).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = build_router(test_engine());
        let resp = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_status_endpoint() {
        let app = build_router(test_engine());
        let resp = app.oneshot(get("/api/status")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let json = body_json(resp).await;
        assert_eq!(json["round_state"], "idle");
        assert_eq!(json["bet_state"], "none");
        assert_eq!(json["balance"], 10_000);
        assert_eq!(json["multiplier"], 1.0);
    }

    #[tokio::test]
    async fn test_history_endpoint_empty() {
        let app = build_router(test_engine());
        let resp = app.oneshot(get("/api/history")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let json = body_json(resp).await;
        assert_eq!(json, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_bet_then_cashout_flow() {
        let app = build_router(test_engine());

        let resp = app
            .clone()
            .oneshot(post_json("/api/bet", r#"{"amount":100}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["round_state"], "running");
        assert_eq!(json["bet_state"], "armed");
        assert_eq!(json["balance"], 9_900);

        let resp = app
            .clone()
            .oneshot(post_json("/api/cashout", ""))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["payout"], 100);
        assert_eq!(json["balance"], 10_000);
    }

    #[tokio::test]
    async fn test_bet_below_minimum_is_bad_request() {
        let app = build_router(test_engine());
        let resp = app
            .oneshot(post_json("/api/bet", r#"{"amount":5}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let json = body_json(resp).await;
        assert_eq!(json["error"], "invalid_amount");
    }

    #[tokio::test]
    async fn test_bet_over_balance_is_bad_request() {
        let app = build_router(test_engine());
        let resp = app
            .oneshot(post_json("/api/bet", r#"{"amount":20000}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let json = body_json(resp).await;
        assert_eq!(json["error"], "insufficient_balance");
    }

    #[tokio::test]
    async fn test_cashout_without_bet_is_conflict() {
        let app = build_router(test_engine());
        let resp = app.oneshot(post_json("/api/cashout", "")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let json = body_json(resp).await;
        assert_eq!(json["error"], "no_active_bet");
    }

    #[tokio::test]
    async fn test_double_bet_is_conflict() {
        let app = build_router(test_engine());
        app.clone()
            .oneshot(post_json("/api/bet", r#"{"amount":100}"#))
            .await
            .unwrap();

        let resp = app
            .oneshot(post_json("/api/bet", r#"{"amount":100}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let json = body_json(resp).await;
        assert_eq!(json["error"], "round_in_progress");
    }

    #[tokio::test]
    async fn test_cors_headers() {
        let app = build_router(test_engine());
        let resp = app.oneshot(get("/api/status")).await.unwrap();
        // CORS layer should allow the response through
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
