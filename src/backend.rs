//! Client for the external REST backend.
//!
//! Every call is a single request: no retries, no backoff. Non-2xx answers are
//! relayed as [`AppError::Backend`] with the backend's own message when it
//! sends one.

use std::time::Duration;

use reqwest::{
    header::ACCEPT,
    multipart::{Form, Part},
    Client, Method, Response, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    config::Config,
    error::AppError,
    models::{LoginRequest, RegisterRequest},
};

/// Fields checked, in order, for a human readable backend error.
const MESSAGE_KEYS: [&str; 3] = ["message", "detail", "error"];

/// One multipart field as received from the browser.
#[derive(Debug, Clone)]
pub struct FormField {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub enum Payload {
    Empty,
    Json(Value),
    /// Re-emitted as multipart; the boundary is left to reqwest.
    Multipart(Vec<FormField>),
}

#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.backend_timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `POST /auth/login/`. Any non-success answer means bad credentials.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<Value, AppError> {
        let response = self
            .client
            .post(self.url("/auth/login/"))
            .header(ACCEPT, "application/json")
            .json(credentials)
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "Backend rejected login");
            return Err(AppError::InvalidCredentials);
        }

        read_json(response).await
    }

    /// `POST /auth/register/`.
    pub async fn register(&self, payload: &RegisterRequest) -> Result<Value, AppError> {
        let response = self
            .client
            .post(self.url("/auth/register/"))
            .header(ACCEPT, "application/json")
            .json(payload)
            .send()
            .await?;

        into_body(response, "Error al registrar usuario").await
    }

    /// Forwards an authenticated request and returns the raw JSON body.
    ///
    /// `fallback` is the error message used when the backend fails without
    /// saying why.
    pub async fn forward(
        &self,
        method: Method,
        path: &str,
        token: &str,
        payload: Payload,
        fallback: &str,
    ) -> Result<Value, AppError> {
        let url = self.url(path);
        tracing::debug!(%method, %url, "Forwarding to backend");

        let request = self
            .client
            .request(method, url)
            .bearer_auth(token)
            .header(ACCEPT, "application/json");

        let request = match payload {
            Payload::Empty => request,
            Payload::Json(body) => request.json(&body),
            // Sin Content-Type manual: reqwest calcula el boundary
            Payload::Multipart(fields) => request.multipart(build_form(fields)?),
        };

        let response = request.send().await?;
        into_body(response, fallback).await
    }
}

fn build_form(fields: Vec<FormField>) -> Result<Form, AppError> {
    let mut form = Form::new();
    for field in fields {
        let mut part = Part::bytes(field.bytes);
        if let Some(file_name) = field.file_name {
            part = part.file_name(file_name);
        }
        if let Some(content_type) = field.content_type {
            part = part
                .mime_str(&content_type)
                .map_err(|_| AppError::Validation(format!("Tipo de contenido inválido: {}", content_type)))?;
        }
        form = form.part(field.name, part);
    }
    Ok(form)
}

async fn into_body(response: Response, fallback: &str) -> Result<Value, AppError> {
    let status = response.status();
    if status.is_success() {
        return read_json(response).await;
    }

    // El cuerpo del error puede no ser JSON
    let body = response.bytes().await.unwrap_or_default();
    let message = serde_json::from_slice::<Value>(&body)
        .ok()
        .and_then(|value| backend_message(&value))
        .unwrap_or_else(|| fallback.to_string());

    Err(AppError::Backend {
        status: relayable(status),
        message,
    })
}

/// Empty success bodies (e.g. `204 No Content`) read as `null`.
async fn read_json(response: Response) -> Result<Value, AppError> {
    let body = response.bytes().await?;
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(&body).map_err(|e| AppError::Transport(format!("Invalid JSON from backend: {}", e)))
}

/// Only 4xx/5xx are relayed as-is; anything else becomes 502.
fn relayable(status: StatusCode) -> StatusCode {
    if status.is_client_error() || status.is_server_error() {
        status
    } else {
        StatusCode::BAD_GATEWAY
    }
}

pub fn backend_message(body: &Value) -> Option<String> {
    MESSAGE_KEYS
        .iter()
        .filter_map(|key| body.get(key))
        .filter_map(Value::as_str)
        .find(|message| !message.trim().is_empty())
        .map(str::to_string)
}

/// Takes the `data` field out of `{data: ...}` envelopes; other bodies pass through.
pub fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("data") => map.remove("data").unwrap_or(Value::Null),
        other => other,
    }
}

/// Deserializes a backend payload, treating shape mismatches as transport failures.
pub fn parse_payload<T: DeserializeOwned>(body: Value) -> Result<T, AppError> {
    serde_json::from_value(body).map_err(|e| AppError::Transport(format!("Unexpected backend payload: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_precedence() {
        let body = json!({ "error": "e", "detail": "d", "message": "m" });
        assert_eq!(backend_message(&body).as_deref(), Some("m"));
        assert_eq!(backend_message(&json!({ "detail": "Not found." })).as_deref(), Some("Not found."));
        assert_eq!(backend_message(&json!({ "message": "  " })), None);
        assert_eq!(backend_message(&json!(["no", "object"])), None);
    }

    #[test]
    fn envelope_is_unwrapped_only_when_present() {
        assert_eq!(unwrap_envelope(json!({ "data": { "id": 1 }, "success": true })), json!({ "id": 1 }));
        assert_eq!(unwrap_envelope(json!({ "id": 1 })), json!({ "id": 1 }));
        assert_eq!(unwrap_envelope(json!([1, 2])), json!([1, 2]));
    }

    #[test]
    fn non_error_statuses_are_not_relayed() {
        assert_eq!(relayable(StatusCode::NOT_FOUND), StatusCode::NOT_FOUND);
        assert_eq!(relayable(StatusCode::SERVICE_UNAVAILABLE), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(relayable(StatusCode::FOUND), StatusCode::BAD_GATEWAY);
    }
}
