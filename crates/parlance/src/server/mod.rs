//! HTTP front door: `POST /translate`, `POST /predict` and static files.

mod handlers;

use std::path::Path;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;
use parlance_core::{CaptionClient, FallbackTranslator, Parlance};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Largest accepted request body (image uploads).
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub translator: Arc<FallbackTranslator>,
    pub captioner: Option<Arc<CaptionClient>>,
}

impl AppState {
    pub fn from_parlance(parlance: &Parlance) -> Self {
        Self {
            translator: parlance.translator().clone(),
            captioner: parlance.captioner().cloned(),
        }
    }
}

/// Build the application router.
///
/// When `static_dir` is set it serves everything no API route matches,
/// including `index.html` at `/`.
pub fn router(state: AppState, static_dir: Option<&Path>) -> Router {
    let mut app = Router::new()
        .route("/translate", post(handlers::translate))
        .route("/predict", post(handlers::predict))
        .with_state(state);

    if let Some(dir) = static_dir {
        if !dir.is_dir() {
            tracing::warn!("Static directory {:?} does not exist", dir);
        }
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use parlance_core::error::{ProviderError, ProviderFailure};
    use parlance_core::{ProviderId, TranslationProvider};
    use std::sync::atomic::{AtomicU32, Ordering};
    use tower::ServiceExt;

    /// Succeeds with `"<provider>:<text>"` or fails with `UnsupportedLanguage`.
    struct StubProvider {
        id: ProviderId,
        succeed_for: &'static [&'static str],
        calls: Arc<AtomicU32>,
    }

    #[async_trait]
    impl TranslationProvider for StubProvider {
        fn id(&self) -> ProviderId {
            self.id
        }

        async fn translate(&self, text: &str, target_lang: &str) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.succeed_for.iter().any(|l| *l == target_lang) {
                Ok(format!("{}:{text}", self.id))
            } else {
                Err(ProviderError::new(
                    self.id,
                    ProviderFailure::UnsupportedLanguage(target_lang.to_string()),
                ))
            }
        }

        fn timeout(&self) -> Option<std::time::Duration> {
            None
        }
    }

    /// Chain where local knows `fr`, remote-a knows `fr` and `de`, remote-b nothing.
    fn app_with_calls(captioner: Option<CaptionClient>) -> (Router, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let stub = |id: ProviderId, succeed_for: &'static [&'static str]| {
            Arc::new(StubProvider {
                id,
                succeed_for,
                calls: calls.clone(),
            }) as Arc<dyn TranslationProvider>
        };
        let translator = FallbackTranslator::new(vec![
            stub(ProviderId::LocalModel, &["fr"]),
            stub(ProviderId::RemoteA, &["fr", "de"]),
            stub(ProviderId::RemoteB, &[]),
        ]);
        let state = AppState {
            translator: Arc::new(translator),
            captioner: captioner.map(Arc::new),
        };
        (router(state, None), calls)
    }

    fn app() -> Router {
        app_with_calls(None).0
    }

    async fn post_raw(
        app: Router,
        uri: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> (StatusCode, serde_json::Value) {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", content_type)
            .body(Body::from(body))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn post_translate(
        app: Router,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let bytes = body.to_string().into_bytes();
        post_raw(app, "/translate", "application/json", bytes).await
    }

    fn multipart_body(field: &str, bytes: &[u8]) -> (String, Vec<u8>) {
        let boundary = "parlance-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"cat.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
        (format!("multipart/form-data; boundary={boundary}"), body)
    }

    /// Upstream captioner that reports the received byte count.
    async fn fake_captioner() -> String {
        let upstream = Router::new()
            .route(
                "/ok",
                post(|body: axum::body::Bytes| async move {
                    axum::Json(serde_json::json!({ "caption": format!("{} bytes", body.len()) }))
                }),
            )
            .route("/fail", post(|| async { StatusCode::INTERNAL_SERVER_ERROR }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, upstream).await.unwrap() });
        format!("http://{addr}")
    }

    fn captioner(endpoint: String) -> CaptionClient {
        CaptionClient::from_config(&parlance_core::config::CaptionConfig {
            endpoint: Some(endpoint),
            api_key: String::new(),
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_translate_local_success() {
        let (status, body) =
            post_translate(app(), serde_json::json!({"text": "Hello", "target": "fr"})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["translatedText"], "local-model:Hello");
        assert_eq!(body["provider"], "local-model");
    }

    #[tokio::test]
    async fn test_translate_falls_back_to_remote_a() {
        let (status, body) =
            post_translate(app(), serde_json::json!({"text": "Hello", "target": "de-DE"})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["provider"], "remote-a");
    }

    #[tokio::test]
    async fn test_translate_all_fail_is_500() {
        let (status, body) =
            post_translate(app(), serde_json::json!({"text": "Hello", "target": "xx"})).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Translation failed");
        assert!(body.get("translatedText").is_none());
    }

    #[tokio::test]
    async fn test_translate_missing_fields_skip_providers() {
        let (app, calls) = app_with_calls(None);
        let (status, body) = post_translate(app, serde_json::json!({"text": "Hello"})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing text or target language");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_translate_accepts_fallback_field_names() {
        let (status, body) =
            post_translate(app(), serde_json::json!({"q": "Hi", "lang": "fr"})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["translatedText"], "local-model:Hi");
    }

    #[tokio::test]
    async fn test_translate_ignores_content_type() {
        let body = br#"{"text": "Hi", "target": "fr"}"#.to_vec();
        let (status, _) = post_raw(app(), "/translate", "text/plain", body).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_translate_invalid_json_is_400() {
        let (status, body) =
            post_raw(app(), "/translate", "application/json", b"not json".to_vec()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_translate_non_string_text_is_400() {
        let (status, _) =
            post_translate(app(), serde_json::json!({"text": 42, "target": "fr"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_predict_without_image_is_400() {
        let (content_type, body) = multipart_body("file", b"abc");
        let (status, json) = post_raw(app(), "/predict", &content_type, body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "No image uploaded");
    }

    #[tokio::test]
    async fn test_predict_not_multipart_is_400() {
        let (status, json) = post_raw(app(), "/predict", "application/json", b"{}".to_vec()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "No image uploaded");
    }

    #[tokio::test]
    async fn test_predict_unconfigured_is_503() {
        let (content_type, body) = multipart_body("image", b"abc");
        let (status, json) = post_raw(app(), "/predict", &content_type, body).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["error"], "Captioning service not configured");
    }

    #[tokio::test]
    async fn test_predict_returns_caption() {
        let base = fake_captioner().await;
        let (app, _) = app_with_calls(Some(captioner(format!("{base}/ok"))));
        let (content_type, body) = multipart_body("image", &[7u8; 32]);

        let (status, json) = post_raw(app, "/predict", &content_type, body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["caption"], "32 bytes");
    }

    #[tokio::test]
    async fn test_predict_upstream_failure_is_500() {
        let base = fake_captioner().await;
        let (app, _) = app_with_calls(Some(captioner(format!("{base}/fail"))));
        let (content_type, body) = multipart_body("image", b"abc");

        let (status, json) = post_raw(app, "/predict", &content_type, body).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Captioning failed");
    }

    #[tokio::test]
    async fn test_static_index_served() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>parlance</h1>").unwrap();
        let state = AppState {
            translator: Arc::new(FallbackTranslator::new(vec![])),
            captioner: None,
        };
        let app = router(state, Some(dir.path()));

        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"<h1>parlance</h1>");
    }
}
