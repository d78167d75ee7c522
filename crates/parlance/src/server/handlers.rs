//! Request handlers.
//!
//! Error bodies are always `{"error": "..."}`. Provider and upstream detail
//! is logged, never returned.

use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use parlance_core::{TranslateError, TranslationRequest};
use serde_json::{json, Value};

use super::AppState;

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// First string-valued field among `names`.
fn string_field<'a>(body: &'a Value, names: &[&str]) -> Option<&'a str> {
    names
        .iter()
        .find_map(|name| body.get(*name).and_then(Value::as_str))
}

/// `POST /translate` with `{"text", "target"}` (or `{"q", "lang"}`).
///
/// The body is read as JSON whatever the `Content-Type` says.
pub async fn translate(State(state): State<AppState>, body: Bytes) -> Response {
    let body: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!("Rejecting unparseable /translate body: {e}");
            return error_response(StatusCode::BAD_REQUEST, "Invalid JSON body");
        }
    };

    let request = match TranslationRequest::new(
        string_field(&body, &["text", "q"]),
        string_field(&body, &["target", "lang"]),
    ) {
        Ok(request) => request,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    };

    match state.translator.translate(&request).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e @ TranslateError::Validation(_)) => {
            error_response(StatusCode::BAD_REQUEST, &e.to_string())
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

/// `POST /predict` with a multipart `image` field.
pub async fn predict(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let image = match multipart {
        Ok(mut multipart) => read_image(&mut multipart).await,
        Err(e) => {
            tracing::debug!("Rejecting /predict request: {e}");
            None
        }
    };
    let Some((bytes, content_type)) = image else {
        return error_response(StatusCode::BAD_REQUEST, "No image uploaded");
    };

    let Some(captioner) = state.captioner.as_ref() else {
        return error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "Captioning service not configured",
        );
    };

    match captioner.caption(bytes, content_type.as_deref()).await {
        Ok(caption) => (StatusCode::OK, Json(json!({ "caption": caption }))).into_response(),
        Err(e) => {
            tracing::error!(endpoint = captioner.endpoint(), "Captioning failed: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Captioning failed")
        }
    }
}

/// Pull the bytes and content type of the first non-empty `image` field.
async fn read_image(multipart: &mut Multipart) -> Option<(Vec<u8>, Option<String>)> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return None,
            Err(e) => {
                tracing::debug!("Malformed multipart body: {e}");
                return None;
            }
        };
        if field.name() != Some("image") {
            continue;
        }

        let content_type = field.content_type().map(str::to_string);
        match field.bytes().await {
            Ok(bytes) if !bytes.is_empty() => return Some((bytes.to_vec(), content_type)),
            Ok(_) => return None,
            Err(e) => {
                tracing::debug!("Failed reading image field: {e}");
                return None;
            }
        }
    }
}
