//! Google's unauthenticated `translate_a/single` endpoint (`remote-b`).
//!
//! The body is a nested JSON array. `body[0]` lists translated segments, each
//! an array whose first element is the segment's text.

use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use super::provider::TranslationProvider;
use super::SOURCE_LANG;
use crate::config::GoogleFreeConfig;
use crate::error::{ProviderError, ProviderFailure};
use crate::types::ProviderId;

/// Characters left unescaped in the `q` parameter (RFC 3986 unreserved).
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Google free endpoint provider.
pub struct GoogleFreeProvider {
    endpoint: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl GoogleFreeProvider {
    pub fn new(config: &GoogleFreeConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
            client: reqwest::Client::new(),
        }
    }

    fn request_url(&self, text: &str, target_lang: &str) -> String {
        format!(
            "{}?client=gtx&sl={SOURCE_LANG}&tl={}&dt=t&q={}",
            self.endpoint,
            utf8_percent_encode(target_lang, QUERY_VALUE),
            utf8_percent_encode(text, QUERY_VALUE)
        )
    }

    fn failure(&self, cause: ProviderFailure) -> ProviderError {
        ProviderError::new(ProviderId::RemoteB, cause)
    }
}

/// Concatenate the text of every segment in `body[0]`.
///
/// Segments whose first element is not a string (pronunciation rows and the
/// like) are skipped.
fn parse_segments(body: &serde_json::Value) -> Result<String, ProviderFailure> {
    let segments = body
        .get(0)
        .and_then(|s| s.as_array())
        .ok_or_else(|| ProviderFailure::MalformedResponse("missing segment list".into()))?;

    let text: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(|t| t.as_str()))
        .collect();

    if text.trim().is_empty() {
        return Err(ProviderFailure::MalformedResponse(
            "no translated segments".into(),
        ));
    }
    Ok(text)
}

#[async_trait]
impl TranslationProvider for GoogleFreeProvider {
    fn id(&self) -> ProviderId {
        ProviderId::RemoteB
    }

    async fn translate(&self, text: &str, target_lang: &str) -> Result<String, ProviderError> {
        let resp = self
            .client
            .get(self.request_url(text, target_lang))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(ProviderId::RemoteB, &e, self.timeout))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(self.failure(ProviderFailure::NetworkFailure {
                message: format!("Google HTTP {status}: {body}"),
                status_code: Some(status.as_u16()),
            }));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| ProviderError::from_reqwest(ProviderId::RemoteB, &e, self.timeout))?;
        let json: serde_json::Value = serde_json::from_slice(&body).map_err(|e| {
            self.failure(ProviderFailure::MalformedResponse(format!(
                "invalid JSON: {e}"
            )))
        })?;

        parse_segments(&json).map_err(|cause| self.failure(cause))
    }

    fn timeout(&self) -> Option<Duration> {
        Some(self.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    /// Answers with two segments: the target language and the query text.
    async fn fake_google() -> String {
        let app = Router::new().route(
            "/translate_a/single",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                let tl = params.get("tl").cloned().unwrap_or_default();
                let q = params.get("q").cloned().unwrap_or_default();
                Json(json!([[[format!("[{tl}] "), "src", null], [q, "src", null]], null, "en"]))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    fn provider(endpoint: String) -> GoogleFreeProvider {
        GoogleFreeProvider::new(&GoogleFreeConfig {
            endpoint,
            ..GoogleFreeConfig::default()
        })
    }

    #[test]
    fn test_parse_concatenates_segments() {
        let body = json!([[["Bonjour. ", "Hello. ", null], ["Au revoir.", "Goodbye.", null]], null, "en"]);
        assert_eq!(parse_segments(&body).unwrap(), "Bonjour. Au revoir.");
    }

    #[test]
    fn test_parse_skips_non_string_segments() {
        let body = json!([[["Hallo", "Hello"], [null, null, "hə-ˈlō"], [42]]]);
        assert_eq!(parse_segments(&body).unwrap(), "Hallo");
    }

    #[test]
    fn test_parse_rejects_unexpected_shape() {
        assert!(parse_segments(&json!({"error": "nope"})).is_err());
        assert!(parse_segments(&json!([])).is_err());
        assert!(parse_segments(&json!([null])).is_err());
        assert!(parse_segments(&json!([[]])).is_err());
    }

    #[test]
    fn test_request_url_encoding() {
        let google = provider("https://example.test/translate_a/single".into());
        assert_eq!(
            google.request_url("a b&c=d", "fr"),
            "https://example.test/translate_a/single?client=gtx&sl=en&tl=fr&dt=t&q=a%20b%26c%3Dd"
        );
    }

    #[tokio::test]
    async fn test_translate_against_fake_upstream() {
        let base = fake_google().await;
        let google = provider(format!("{base}/translate_a/single"));

        let out = google.translate("café & crème", "es").await.unwrap();
        assert_eq!(out, "[es] café & crème");
    }

    #[tokio::test]
    async fn test_unreachable_is_network_failure() {
        let google = provider("http://127.0.0.1:9/translate_a/single".into());

        let err = google.translate("hello", "fr").await.unwrap_err();
        assert_eq!(err.provider, ProviderId::RemoteB);
        assert_eq!(err.cause.kind(), "network-failure");
    }
}
