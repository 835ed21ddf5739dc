use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Mensaje genérico cuando falla la comunicación con el backend.
pub const TRANSPORT_MESSAGE: &str = "Error de conexión con el servidor";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),
    #[error("Unauthorized for this resource")]
    Unauthorized,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Backend response did not include an access token")]
    MissingToken,
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: StatusCode, message: String },
    #[error("Backend error ({status}): {message}")]
    Backend { status: StatusCode, message: String },
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn unauthenticated() -> Self {
        AppError::Unauthenticated("No autorizado".to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated(_) | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Unauthorized => StatusCode::FORBIDDEN,
            AppError::MissingToken => StatusCode::BAD_GATEWAY,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Backend { status, .. } | AppError::Rejected { status, .. } => *status,
            AppError::Transport(_) | AppError::Config(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Text safe to show in a notification. Internal details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Unauthenticated(msg) | AppError::Validation(msg) => msg.clone(),
            AppError::Unauthorized => "Acceso denegado".to_string(),
            AppError::InvalidCredentials => "Credenciales inválidas".to_string(),
            AppError::MissingToken => "Respuesta de autenticación inválida".to_string(),
            AppError::Backend { message, .. } | AppError::Rejected { message, .. } => message.clone(),
            AppError::Transport(_) => TRANSPORT_MESSAGE.to_string(),
            AppError::Config(_) | AppError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Transport(e.to_string())
    }
}

// Rechazos de extractores: mismo status, cuerpo `{"error": ...}`
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::MissingToken => tracing::error!("Backend login response had no extractable token"),
            AppError::Transport(e) => tracing::error!("Transport error: {}", e),
            AppError::Config(e) | AppError::Internal(e) => tracing::error!("Internal error: {}", e),
            AppError::Backend { status, message } => {
                tracing::warn!(%status, "Backend error relayed: {}", message)
            }
            AppError::Rejected { status, message } => {
                tracing::debug!(%status, "Request rejected: {}", message)
            }
            _ => {}
        }

        let body = Json(json!({
            "error": self.user_message(),
        }));

        (self.status(), body).into_response()
    }
}
