//! HTTP API over the scraper and its output directory

pub mod docs;
pub mod error;
pub mod handlers;

use crate::config::Config;
use crate::core::Scraper;
use crate::error::ScrapeError;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{error, info};

pub use error::{ApiError, ApiResult};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub scraper: Arc<Scraper>,
    /// Base URL shown in documentation examples
    pub public_url: String,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, ScrapeError> {
        let public_url = format!("http://localhost:{}", config.port);
        Ok(Self {
            scraper: Arc::new(Scraper::new(config)?),
            public_url,
        })
    }
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    let downloads = ServeDir::new(state.scraper.store().root());

    Router::new()
        .route("/", get(handlers::docs))
        .route("/api/health", get(handlers::health))
        .route("/api/videos", get(handlers::list_videos))
        .route(
            "/api/videos/{video_id}",
            get(handlers::get_video).delete(handlers::delete_video),
        )
        .route("/api/videos/{video_id}/cookies", get(handlers::get_cookies))
        .route("/api/videos/{video_id}/headers", get(handlers::get_headers))
        .route(
            "/api/videos/{video_id}/download",
            post(handlers::download_video),
        )
        .nest_service("/downloads", downloads)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until Ctrl+C
pub async fn serve(config: Config) -> Result<(), ScrapeError> {
    let output_dir = config.output_dir.clone();
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    let app = router(AppState::new(config)?);

    info!("Video Scraper API running on http://{}", listener.local_addr()?);
    info!("Output directory: {}", output_dir.display());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        error!("Failed to install Ctrl+C handler: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Engine;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use axum::response::Response;
    use mockito::Matcher;
    use serde_json::Value;
    use std::fs;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn app(dir: &TempDir, base_url: &str) -> Router {
        let config = Config::default()
            .with_output_dir(dir.path().join("output"))
            .with_base_url(base_url)
            .with_engine(Engine::Native)
            .with_max_retries(0);
        router(AppState::new(config).unwrap())
    }

    async fn send(app: Router, method: Method, uri: &str) -> Response {
        app.oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let response = send(app(&dir, "http://127.0.0.1:9"), Method::GET, "/api/health").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["message"], "Video Scraper API is running");
    }

    #[tokio::test]
    async fn test_docs_page() {
        let dir = tempfile::tempdir().unwrap();
        let response = send(app(&dir, "http://127.0.0.1:9"), Method::GET, "/").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("<h1>Video Scraper API</h1>"));
    }

    #[tokio::test]
    async fn test_list_empty_output() {
        let dir = tempfile::tempdir().unwrap();
        let response = send(app(&dir, "http://127.0.0.1:9"), Method::GET, "/api/videos").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["count"], 0);
        assert_eq!(body["data"], Value::Array(Vec::new()));
    }

    #[tokio::test]
    async fn test_cookies_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let response = send(
            app(&dir, "http://127.0.0.1:9"),
            Method::GET,
            "/api/videos/abc/cookies",
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Cookies not found. Try fetching video info first.");
        assert!(body["message"].as_str().unwrap().contains("cookies"));
    }

    #[tokio::test]
    async fn test_headers_served_from_store() {
        let dir = tempfile::tempdir().unwrap();
        let video_dir = dir.path().join("output").join("abc");
        fs::create_dir_all(&video_dir).unwrap();
        fs::write(video_dir.join("headers.json"), r#"{"requestHeaders":{"DNT":"1"}}"#).unwrap();

        let response = send(
            app(&dir, "http://127.0.0.1:9"),
            Method::GET,
            "/api/videos/abc/headers",
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["requestHeaders"]["DNT"], "1");
    }

    #[tokio::test]
    async fn test_delete() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir, "http://127.0.0.1:9");

        let response = send(app.clone(), Method::DELETE, "/api/videos/abc").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "Video not found");

        fs::create_dir_all(dir.path().join("output").join("abc")).unwrap();
        let response = send(app, Method::DELETE, "/api/videos/abc").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await["message"],
            "Video abc deleted successfully"
        );
        assert!(!dir.path().join("output").join("abc").exists());
    }

    #[tokio::test]
    async fn test_invalid_id_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let response = send(app(&dir, "http://127.0.0.1:9"), Method::GET, "/api/videos/bad.id").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["success"], false);
    }

    #[tokio::test]
    async fn test_downloads_served_statically() {
        let dir = tempfile::tempdir().unwrap();
        let video_dir = dir.path().join("output").join("abc");
        fs::create_dir_all(&video_dir).unwrap();
        fs::write(video_dir.join("abc.mp4"), b"media").unwrap();

        let response = send(
            app(&dir, "http://127.0.0.1:9"),
            Method::GET,
            "/downloads/abc/abc.mp4",
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"media");
    }

    #[tokio::test]
    async fn test_get_video_scrapes_and_lists() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/bkg/9q4yh8ji5k4w")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("set-cookie", "sess=1; Path=/")
            .with_body(format!(
                "<html><script>{}</script></html>",
                include_str!("../../tests/fixtures/packed_embed.js")
            ))
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir, &format!("{}/bkg", server.url()));

        let response = send(app.clone(), Method::GET, "/api/videos/9q4yh8ji5k4w").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["videoId"], "9q4yh8ji5k4w");
        assert_eq!(body["data"]["sources"][0]["type"], "hls");
        assert_eq!(body["data"]["rawCookies"][0], "sess=1; Path=/");

        let response = send(app.clone(), Method::GET, "/api/videos").await;
        let body = body_json(response).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["data"][0]["videoId"], "9q4yh8ji5k4w");
        assert_eq!(body["data"][0]["downloaded"], false);
        assert_eq!(body["data"][0]["cookiesUrl"], "/api/videos/9q4yh8ji5k4w/cookies");

        let response = send(app, Method::GET, "/api/videos/9q4yh8ji5k4w/cookies").await;
        let body = body_json(response).await;
        assert_eq!(body["data"]["parsedCookies"][0]["name"], "sess");
    }

    #[tokio::test]
    async fn test_download_after_delete_scrapes_again() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/bkg/9q4yh8ji5k4w")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(format!(
                "<html><script>{}</script></html>",
                include_str!("../../tests/fixtures/packed_embed.js")
            ))
            .expect(2)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default()
            .with_output_dir(dir.path().join("output"))
            .with_base_url(format!("{}/bkg", server.url()))
            .with_engine(Engine::Native)
            .with_max_retries(0)
            .with_ffmpeg_path(dir.path().join("no-such-ffmpeg"));
        let app = router(AppState::new(config).unwrap());

        let response = send(app.clone(), Method::GET, "/api/videos/9q4yh8ji5k4w").await;
        assert_eq!(response.status(), StatusCode::OK);
        let response = send(app.clone(), Method::DELETE, "/api/videos/9q4yh8ji5k4w").await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(app.clone(), Method::POST, "/api/videos/9q4yh8ji5k4w/download").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        mock.assert_async().await;

        let body = body_json(send(app, Method::GET, "/api/videos").await).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["data"][0]["videoId"], "9q4yh8ji5k4w");
        assert!(body["data"][0].get("status").is_none());
    }

    #[tokio::test]
    async fn test_scrape_failure_is_server_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/bkg/abc")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>no player here</html>")
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();

        let response = send(
            app(&dir, &format!("{}/bkg", server.url())),
            Method::GET,
            "/api/videos/abc",
        )
        .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await["error"],
            "Could not find packed code in the page"
        );
    }

    #[tokio::test]
    async fn test_download_rejects_bad_body() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(&dir, "http://127.0.0.1:9")
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/videos/abc/download")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
