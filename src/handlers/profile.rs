use axum::{extract::State, Json};
use reqwest::Method;

use crate::{
    backend::{parse_payload, unwrap_envelope, Payload},
    error::AppError,
    extract::ApiJson,
    middleware::CurrentSession,
    models::{ProfileResponse, UpdateProfile},
    session::Session,
    state::AppState,
};

/// The profile id always comes from the signed session, never from the request.
fn profile_path(session: &Session) -> Result<String, AppError> {
    session
        .user_id
        .map(|id| format!("/users/{}/", id))
        .ok_or_else(|| AppError::Unauthenticated("Usuario no identificado".to_string()))
}

#[utoipa::path(
    get,
    path = "/api/profile",
    responses(
        (status = 200, description = "Profile of the signed-in user", body = ProfileResponse),
        (status = 401, description = "Unauthenticated or unknown user id")
    ),
    security(("session_cookie" = [])),
    tag = "profile"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<ProfileResponse>, AppError> {
    let path = profile_path(&session)?;
    let body = state
        .backend
        .forward(Method::GET, &path, &session.token, Payload::Empty, "Error al obtener el perfil")
        .await?;

    Ok(Json(ProfileResponse {
        success: true,
        data: parse_payload(unwrap_envelope(body))?,
    }))
}

#[utoipa::path(
    put,
    path = "/api/profile",
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Profile updated", body = ProfileResponse),
        (status = 401, description = "Unauthenticated or unknown user id")
    ),
    security(("session_cookie" = [])),
    tag = "profile"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    ApiJson(payload): ApiJson<UpdateProfile>,
) -> Result<Json<ProfileResponse>, AppError> {
    let path = profile_path(&session)?;
    let body = serde_json::to_value(&payload).map_err(|e| AppError::Validation(e.to_string()))?;
    let body = state
        .backend
        .forward(Method::PUT, &path, &session.token, Payload::Json(body), "Error al actualizar el perfil")
        .await?;

    Ok(Json(ProfileResponse {
        success: true,
        data: parse_payload(unwrap_envelope(body))?,
    }))
}
