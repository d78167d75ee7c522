//! Client for the upstream image-captioning service behind `/predict`.
//!
//! Images are forwarded as the raw request body. Both the plain
//! `{"caption": "..."}` shape and the Hugging Face inference shape
//! `[{"generated_text": "..."}]` are accepted.

use std::time::Duration;

use serde::Deserialize;

use crate::config::{resolve_env_var, CaptionConfig};
use crate::error::CaptionError;

pub struct CaptionClient {
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
    client: reqwest::Client,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CaptionResponse {
    Plain { caption: String },
    Generated(Vec<GeneratedText>),
}

#[derive(Deserialize)]
struct GeneratedText {
    generated_text: String,
}

impl CaptionClient {
    /// Build a client, or `None` when no endpoint is configured.
    pub fn from_config(config: &CaptionConfig) -> Option<Self> {
        let endpoint = config
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())?;

        Some(Self {
            endpoint: endpoint.to_string(),
            api_key: resolve_env_var(&config.api_key),
            timeout: Duration::from_millis(config.timeout_ms),
            client: reqwest::Client::new(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Caption one image.
    pub async fn caption(
        &self,
        image: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<String, CaptionError> {
        let mut req = self
            .client
            .post(&self.endpoint)
            .header(
                "Content-Type",
                content_type.unwrap_or("application/octet-stream"),
            )
            .timeout(self.timeout)
            .body(image);
        if let Some(key) = &self.api_key {
            req = req.header("Authorization", format!("Bearer {key}"));
        }

        let resp = req.send().await.map_err(|e| CaptionError::Request {
            message: e.to_string(),
            status_code: None,
        })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(CaptionError::Request {
                message: format!("HTTP {status}: {text}"),
                status_code: Some(status.as_u16()),
            });
        }

        let body = resp.bytes().await.map_err(|e| CaptionError::Request {
            message: e.to_string(),
            status_code: None,
        })?;
        parse_caption(&body)
    }
}

fn parse_caption(body: &[u8]) -> Result<String, CaptionError> {
    let parsed: CaptionResponse = serde_json::from_slice(body)
        .map_err(|e| CaptionError::MalformedResponse(e.to_string()))?;

    let caption = match parsed {
        CaptionResponse::Plain { caption } => Some(caption),
        CaptionResponse::Generated(items) => items.into_iter().next().map(|g| g.generated_text),
    };

    caption
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| CaptionError::MalformedResponse("empty caption".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};

    /// Reports body length and auth header back as the caption.
    async fn fake_captioner() -> String {
        let app = Router::new()
            .route(
                "/caption",
                post(|headers: HeaderMap, body: axum::body::Bytes| async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("none")
                        .to_string();
                    Json(serde_json::json!([
                        { "generated_text": format!("{} bytes, auth {auth}", body.len()) }
                    ]))
                }),
            )
            .route("/broken", post(|| async { StatusCode::SERVICE_UNAVAILABLE }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    fn client(endpoint: String, api_key: &str) -> CaptionClient {
        CaptionClient::from_config(&CaptionConfig {
            endpoint: Some(endpoint),
            api_key: api_key.to_string(),
            ..CaptionConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_unconfigured_is_none() {
        assert!(CaptionClient::from_config(&CaptionConfig::default()).is_none());
        let blank = CaptionConfig {
            endpoint: Some("  ".into()),
            ..CaptionConfig::default()
        };
        assert!(CaptionClient::from_config(&blank).is_none());
    }

    #[test]
    fn test_parse_both_shapes() {
        assert_eq!(
            parse_caption(br#"{"caption":"a dog on a beach"}"#).unwrap(),
            "a dog on a beach"
        );
        assert_eq!(
            parse_caption(br#"[{"generated_text":"a red bicycle "}]"#).unwrap(),
            "a red bicycle"
        );
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(parse_caption(b"[]").is_err());
        assert!(parse_caption(br#"{"caption":""}"#).is_err());
        assert!(parse_caption(br#"{"label":"cat"}"#).is_err());
    }

    #[tokio::test]
    async fn test_caption_forwards_bytes_and_key() {
        let base = fake_captioner().await;
        let captioner = client(format!("{base}/caption"), "secret");

        let caption = captioner
            .caption(vec![0u8; 16], Some("image/png"))
            .await
            .unwrap();
        assert_eq!(caption, "16 bytes, auth Bearer secret");
    }

    #[tokio::test]
    async fn test_caption_without_key() {
        let base = fake_captioner().await;
        let captioner = client(format!("{base}/caption"), "${PARLANCE_TEST_UNSET_TOKEN}");

        let caption = captioner.caption(vec![1, 2, 3], None).await.unwrap();
        assert_eq!(caption, "3 bytes, auth none");
    }

    #[tokio::test]
    async fn test_upstream_error_status() {
        let base = fake_captioner().await;
        let captioner = client(format!("{base}/broken"), "");

        let err = captioner.caption(vec![1], None).await.unwrap_err();
        assert!(matches!(
            err,
            CaptionError::Request {
                status_code: Some(503),
                ..
            }
        ));
    }
}
