//! Session cookies and the adapters that read a backend login response.
//!
//! The protected `token` cookie holds a JWT signed by this service. Its claims
//! carry the backend bearer token, the role and the user id, so every
//! authorization decision is made from verified claims. The readable `role`
//! cookie only feeds UI badges.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde_json::Value;

use crate::{
    config::Config,
    error::AppError,
    models::{Role, SessionClaims, SessionUser},
};

pub const TOKEN_COOKIE: &str = "token";
pub const ROLE_COOKIE: &str = "role";
pub const USER_ID_COOKIE: &str = "user_id";

/// Where the backend may put the access token, highest precedence first.
pub const TOKEN_POINTERS: [&str; 8] = [
    "/data/access_token",
    "/data/access",
    "/data/token",
    "/data/key",
    "/access_token",
    "/access",
    "/token",
    "/key",
];

const USER_POINTERS: [&str; 2] = ["/data/user", "/user"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Bearer token issued by the backend.
    pub token: String,
    pub role: Role,
    pub user_id: Option<i64>,
}

/// Returns the first non-empty token found along [`TOKEN_POINTERS`].
pub fn extract_access_token(body: &Value) -> Option<String> {
    TOKEN_POINTERS
        .iter()
        .filter_map(|pointer| body.pointer(pointer))
        .filter_map(Value::as_str)
        .find(|token| !token.trim().is_empty())
        .map(str::to_string)
}

/// Who logged in, as far as the backend response tells us.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginIdentity {
    pub role: Role,
    pub user_id: Option<i64>,
    pub user: SessionUser,
}

impl LoginIdentity {
    /// Missing email or display name fall back to the submitted email.
    pub fn from_backend(body: &Value, submitted_email: &str) -> Self {
        let user = USER_POINTERS
            .iter()
            .filter_map(|pointer| body.pointer(pointer))
            .find(|user| user.is_object());

        let role = str_field(user, "role").map(Role::parse).unwrap_or_default();
        let user_id = user
            .and_then(|u| u.get("id"))
            .and_then(|id| id.as_i64().or_else(|| id.as_str()?.parse().ok()));
        let email = str_field(user, "email").unwrap_or(submitted_email).to_string();
        let name = str_field(user, "name")
            .or_else(|| str_field(user, "username"))
            .unwrap_or(submitted_email)
            .to_string();

        Self {
            role,
            user_id,
            user: SessionUser { email, name, role },
        }
    }
}

fn str_field<'a>(user: Option<&'a Value>, name: &str) -> Option<&'a str> {
    user.and_then(|u| u.get(name))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Signs and verifies the session JWT stored in the `token` cookie.
#[derive(Clone)]
pub struct SessionSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl SessionSigner {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }

    pub fn sign(&self, session: &Session) -> Result<String, AppError> {
        let expiration = chrono::Duration::try_seconds(self.ttl_secs)
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .ok_or_else(|| AppError::Internal(format!("Session TTL out of range: {}", self.ttl_secs)))?
            .timestamp()
            .max(0) as usize;

        let claims = SessionClaims {
            sub: session.user_id.map(|id| id.to_string()).unwrap_or_default(),
            role: session.role,
            access: session.token.clone(),
            exp: expiration,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Session signing failed: {}", e)))
    }

    /// `None` for forged, malformed or expired cookies.
    pub fn verify(&self, cookie_value: &str) -> Option<Session> {
        let data = decode::<SessionClaims>(cookie_value, &self.decoding, &Validation::default())
            .map_err(|e| tracing::debug!("Rejected session cookie: {}", e))
            .ok()?;

        Some(Session {
            token: data.claims.access,
            role: data.claims.role,
            user_id: data.claims.sub.parse().ok(),
        })
    }

    /// Reads and verifies the session from a request's cookies.
    pub fn read_session(&self, jar: &CookieJar) -> Option<Session> {
        let cookie = jar.get(TOKEN_COOKIE)?;
        if cookie.value().is_empty() {
            return None;
        }
        self.verify(cookie.value())
    }
}

/// Adds the `token`, `role` and `user_id` cookies for a fresh session.
pub fn set_session_cookies(jar: CookieJar, signed: String, session: &Session, config: &Config) -> CookieJar {
    let max_age = time::Duration::seconds(config.session_ttl_secs);

    let token = Cookie::build((TOKEN_COOKIE, signed))
        .path("/")
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::Strict)
        .max_age(max_age);

    let role = Cookie::build((ROLE_COOKIE, session.role.as_str()))
        .path("/")
        .http_only(false)
        .secure(config.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(max_age);

    let jar = jar.add(token).add(role);

    match session.user_id {
        Some(id) => jar.add(
            Cookie::build((USER_ID_COOKIE, id.to_string()))
                .path("/")
                .http_only(true)
                .secure(config.cookie_secure)
                .same_site(SameSite::Strict)
                .max_age(max_age),
        ),
        None => jar.add(removal_cookie(USER_ID_COOKIE)),
    }
}

/// Expires every session cookie, whether or not the request carried them.
pub fn clear_session_cookies(jar: CookieJar) -> CookieJar {
    [TOKEN_COOKIE, ROLE_COOKIE, USER_ID_COOKIE]
        .into_iter()
        .fold(jar, |jar, name| jar.add(removal_cookie(name)))
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::build((name, "")).path("/").build();
    cookie.make_removal();
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn token_precedence_prefers_data_access_token() {
        let body = json!({
            "access": "top-level",
            "data": { "access_token": "nested", "token": "other" }
        });
        assert_eq!(extract_access_token(&body).as_deref(), Some("nested"));
    }

    #[test]
    fn token_falls_through_empty_values() {
        let body = json!({ "data": { "access_token": "" }, "key": "drf-key" });
        assert_eq!(extract_access_token(&body).as_deref(), Some("drf-key"));
        assert_eq!(extract_access_token(&json!({ "data": { "user": {} } })), None);
        assert_eq!(extract_access_token(&json!({ "token": 42 })), None);
    }

    #[test]
    fn identity_uses_submitted_email_when_backend_omits_names() {
        let body = json!({ "data": { "access_token": "t", "user": { "id": "12", "role": "admin" } } });
        let identity = LoginIdentity::from_backend(&body, "ana@example.com");

        assert_eq!(identity.role, Role::Admin);
        assert_eq!(identity.user_id, Some(12));
        assert_eq!(identity.user.email, "ana@example.com");
        assert_eq!(identity.user.name, "ana@example.com");
    }

    #[test]
    fn identity_prefers_backend_fields() {
        let body = json!({
            "token": "t",
            "user": { "id": 3, "username": "ana", "email": "ana@corp.test" }
        });
        let identity = LoginIdentity::from_backend(&body, "typed@example.com");

        assert_eq!(identity.role, Role::User);
        assert_eq!(identity.user.name, "ana");
        assert_eq!(identity.user.email, "ana@corp.test");
    }

    #[test]
    fn signed_session_round_trips_and_rejects_tampering() {
        let signer = SessionSigner::new("test-secret", 3600);
        let session = Session {
            token: "backend-token".to_string(),
            role: Role::Manager,
            user_id: Some(5),
        };
        let signed = signer.sign(&session).unwrap();

        assert_eq!(signer.verify(&signed), Some(session));
        assert_eq!(SessionSigner::new("other-secret", 3600).verify(&signed), None);
        assert_eq!(signer.verify("not-a-jwt"), None);
    }

    #[test]
    fn expired_session_is_rejected() {
        let signer = SessionSigner::new("test-secret", -600);
        let signed = signer
            .sign(&Session {
                token: "t".to_string(),
                role: Role::User,
                user_id: None,
            })
            .unwrap();
        assert_eq!(signer.verify(&signed), None);
    }

    #[test]
    fn out_of_range_ttl_fails_without_panicking() {
        let signer = SessionSigner::new("test-secret", i64::MAX);
        let result = signer.sign(&Session {
            token: "t".to_string(),
            role: Role::User,
            user_id: None,
        });
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[test]
    fn clearing_emits_removal_for_every_cookie() {
        let jar = clear_session_cookies(CookieJar::new());
        for name in [TOKEN_COOKIE, ROLE_COOKIE, USER_ID_COOKIE] {
            let cookie = jar.get(name).expect("removal cookie");
            assert_eq!(cookie.value(), "");
            assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
        }
    }
}
