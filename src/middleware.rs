use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    error::AppError,
    guard::Decision,
    session::Session,
    state::AppState,
};

/// Verified session of the caller. Rejects with 401 when the `token` cookie
/// is missing, forged or expired.
pub struct CurrentSession(pub Session);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        // 1. Leer la cookie protegida
        let jar = CookieJar::from_headers(&parts.headers);

        // 2. Verificar la firma y expiración; el rol sale de los claims, no de la cookie `role`
        state
            .signer
            .read_session(&jar)
            .map(CurrentSession)
            .ok_or_else(AppError::unauthenticated)
    }
}

/// Runs the route guard ahead of every page handler.
pub async fn route_guard(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let session = state.signer.read_session(&jar);
    let path = request.uri().path().to_owned();

    match state.guard.evaluate(&path, session.as_ref()) {
        Decision::Allow => next.run(request).await,
        Decision::Redirect(target) => {
            tracing::debug!(%path, redirect_to = target, authenticated = session.is_some(), "Route guard redirect");
            Redirect::temporary(target).into_response()
        }
    }
}
