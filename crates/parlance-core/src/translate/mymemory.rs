//! MyMemory public translation API (`remote-a`).
//!
//! `GET /get?q=<text>&langpair=en|<lang>[&de=<email>]`. The API answers
//! HTTP 200 even for quota or language errors, so success is decided by the
//! body's `responseStatus` field.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::provider::TranslationProvider;
use super::SOURCE_LANG;
use crate::config::MyMemoryConfig;
use crate::error::{ProviderError, ProviderFailure};
use crate::types::ProviderId;

/// MyMemory provider.
pub struct MyMemoryProvider {
    endpoint: String,
    email: Option<String>,
    timeout: Duration,
    client: reqwest::Client,
}

impl MyMemoryProvider {
    pub fn new(config: &MyMemoryConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            email: config.email.clone().filter(|e| !e.trim().is_empty()),
            timeout: Duration::from_millis(config.timeout_ms),
            client: reqwest::Client::new(),
        }
    }

    fn failure(&self, cause: ProviderFailure) -> ProviderError {
        ProviderError::new(ProviderId::RemoteA, cause)
    }
}

// --- Response types ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MyMemoryResponse {
    response_data: Option<ResponseData>,
    /// Number on success, sometimes a string on errors
    response_status: Option<serde_json::Value>,
    response_details: Option<serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseData {
    translated_text: Option<String>,
}

fn status_code(value: &serde_json::Value) -> Option<u64> {
    match value {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Extract the translation from a MyMemory response body.
fn parse_response(body: &[u8]) -> Result<String, ProviderFailure> {
    let response: MyMemoryResponse = serde_json::from_slice(body)
        .map_err(|e| ProviderFailure::MalformedResponse(format!("invalid JSON: {e}")))?;

    let status = response.response_status.as_ref().and_then(status_code);
    if status != Some(200) {
        let details = response
            .response_details
            .map(|d| match d {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .unwrap_or_default();
        return Err(ProviderFailure::MalformedResponse(format!(
            "responseStatus {}: {details}",
            status.map_or_else(|| "missing".to_string(), |s| s.to_string())
        )));
    }

    response
        .response_data
        .and_then(|d| d.translated_text)
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| {
            ProviderFailure::MalformedResponse("missing responseData.translatedText".into())
        })
}

#[async_trait]
impl TranslationProvider for MyMemoryProvider {
    fn id(&self) -> ProviderId {
        ProviderId::RemoteA
    }

    async fn translate(&self, text: &str, target_lang: &str) -> Result<String, ProviderError> {
        let langpair = format!("{SOURCE_LANG}|{target_lang}");
        let mut query: Vec<(&str, &str)> = vec![("q", text), ("langpair", langpair.as_str())];
        if let Some(email) = &self.email {
            query.push(("de", email.as_str()));
        }

        let resp = self
            .client
            .get(&self.endpoint)
            .query(&query)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(ProviderId::RemoteA, &e, self.timeout))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(self.failure(ProviderFailure::NetworkFailure {
                message: format!("MyMemory HTTP {status}: {body}"),
                status_code: Some(status.as_u16()),
            }));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| ProviderError::from_reqwest(ProviderId::RemoteA, &e, self.timeout))?;

        parse_response(&body).map_err(|cause| self.failure(cause))
    }

    fn timeout(&self) -> Option<Duration> {
        Some(self.timeout)
    }
}
