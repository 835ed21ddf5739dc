use axum::{extract::State, Json};
use axum_extra::extract::cookie::CookieJar;
use serde_json::Value;

use crate::{
    backend::unwrap_envelope,
    error::AppError,
    extract::ApiJson,
    models::{LoginRequest, LoginResponse, MessageResponse, RegisterRequest, RegisterResponse},
    session::{clear_session_cookies, extract_access_token, set_session_cookies, LoginIdentity, Session},
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/api/auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session started; sets token, role and user_id cookies", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 502, description = "Backend response without access token")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    // 1. Reenviar credenciales al backend
    let body = state.backend.login(&payload).await?;

    // 2. Extraer el token con precedencia fija
    let token = extract_access_token(&body).ok_or(AppError::MissingToken)?;

    // 3. Rol, id y datos visibles del usuario
    let identity = LoginIdentity::from_backend(&body, &payload.email);
    let session = Session {
        token,
        role: identity.role,
        user_id: identity.user_id,
    };

    // 4. Firmar la sesión y escribir cookies; el token nunca va en el cuerpo
    let signed = state.signer.sign(&session)?;
    let jar = set_session_cookies(jar, signed, &session, &state.config);

    tracing::info!(role = %session.role, user_id = ?session.user_id, "Session started");

    Ok((
        jar,
        Json(LoginResponse {
            success: true,
            user: identity.user,
            role: session.role,
            user_id: session.user_id,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User registered", body = RegisterResponse),
        (status = 422, description = "Rejected by the backend; message relayed")
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<Json<RegisterResponse>, AppError> {
    let body = state.backend.register(&payload).await?;

    let message = body
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("Usuario registrado exitosamente")
        .to_string();

    Ok(Json(RegisterResponse {
        success: true,
        message,
        data: unwrap_envelope(body),
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Session cookies cleared", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    (
        clear_session_cookies(jar),
        Json(MessageResponse {
            success: true,
            message: "Sesión cerrada".to_string(),
        }),
    )
}
