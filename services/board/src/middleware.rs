//! Session gate for JWT cookie authentication
//!
//! The gate reads the `auth-token` cookie, validates it and checks the
//! access level it carries. It never touches the store: the claims are
//! trusted until the token expires.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;
use uuid::Uuid;

use crate::{
    error::AppError,
    jwt::{Claims, JwtService},
    models::AccessLevel,
};

/// Name of the session cookie
pub const AUTH_COOKIE: &str = "auth-token";

/// Authenticated user information, taken from the session token
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub access_level: Option<AccessLevel>,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            access_level: claims.access_level,
        }
    }
}

/// How a denied request is answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateMode {
    /// JSON error bodies
    Api,
    /// Redirect to the landing page
    Page,
}

/// Why a request was turned away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// No token, or a token that failed validation
    Unauthenticated,
    /// Valid token below the required access level
    Forbidden,
}

/// Gate configuration for one group of routes
#[derive(Clone)]
pub struct SessionGate {
    jwt: JwtService,
    required: Option<AccessLevel>,
    mode: GateMode,
}

impl SessionGate {
    /// Gate for JSON API routes. `None` admits any authenticated user.
    pub fn api(jwt: JwtService, required: Option<AccessLevel>) -> Self {
        Self {
            jwt,
            required,
            mode: GateMode::Api,
        }
    }

    /// Gate for server-rendered pages
    pub fn page(jwt: JwtService, required: Option<AccessLevel>) -> Self {
        Self {
            jwt,
            required,
            mode: GateMode::Page,
        }
    }

    /// Decide whether the request carrying `headers` may proceed
    pub fn admit(&self, headers: &HeaderMap) -> Result<AuthUser, Denial> {
        let jar = CookieJar::from_headers(headers);
        let token = jar
            .get(AUTH_COOKIE)
            .map(|cookie| cookie.value())
            .filter(|value| !value.is_empty())
            .ok_or(Denial::Unauthenticated)?;

        let claims = self.jwt.validate_token(token).map_err(|e| {
            warn!("Rejected session token: {}", e);
            Denial::Unauthenticated
        })?;

        if claims.access_level < self.required {
            warn!(
                "Account {} lacks required access level {:?}",
                claims.sub, self.required
            );
            return Err(Denial::Forbidden);
        }

        Ok(claims.into())
    }

    fn deny(&self, denial: Denial) -> Response {
        match (self.mode, denial) {
            (GateMode::Page, _) => Redirect::temporary("/").into_response(),
            (GateMode::Api, Denial::Unauthenticated) => {
                AppError::Auth("Authentication required".to_string()).into_response()
            }
            (GateMode::Api, Denial::Forbidden) => AppError::Forbidden(
                "Access denied, you are not authorized to access this resource".to_string(),
            )
            .into_response(),
        }
    }
}

/// Admit the request and expose [`AuthUser`] to the handler, or deny it
pub async fn session_gate(
    State(gate): State<SessionGate>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    match gate.admit(req.headers()) {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(denial) => gate.deny(denial),
    }
}

/// Build the `Set-Cookie` value carrying a session token
pub fn session_cookie(
    token: &str,
    max_age: u64,
    secure: bool,
) -> Result<HeaderValue, axum::http::header::InvalidHeaderValue> {
    let mut cookie =
        format!("{AUTH_COOKIE}={token}; HttpOnly; Path=/; Max-Age={max_age}; SameSite=Strict");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Build the `Set-Cookie` value that removes the session cookie
pub fn clear_session_cookie(secure: bool) -> HeaderValue {
    if secure {
        HeaderValue::from_static("auth-token=; HttpOnly; Path=/; Max-Age=0; SameSite=Strict; Secure")
    } else {
        HeaderValue::from_static("auth-token=; HttpOnly; Path=/; Max-Age=0; SameSite=Strict")
    }
}
