//! Board service routes

use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    AppState,
    accounts::{CredentialsRequest, UpgradeRequest, VerificationRequest},
    board::CreateMessageRequest,
    error::{AppError, AppResult},
    middleware::{AuthUser, SessionGate, clear_session_cookie, session_cookie, session_gate},
    models::{AccessLevel, MessageScope},
    pages,
};

/// Query for looking an account up by email
#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    pub email: Option<String>,
}

/// Create the router for the board service
pub fn create_router(state: AppState) -> Router {
    let jwt = state.jwt_service.clone();
    let authenticated = SessionGate::api(jwt.clone(), None);
    let readers = SessionGate::api(jwt.clone(), Some(AccessLevel::Read));
    let signed_in_pages = SessionGate::page(jwt, None);

    let public = Router::new()
        .route("/", get(pages::index))
        .route("/health", get(health_check))
        .route("/api/sendVerificationCode", post(send_verification_code))
        .route("/api/users/create", post(create_user))
        .route("/api/users/login", post(login))
        .route("/api/users/logout", post(logout))
        .route("/api/users/by-email", get(user_by_email));

    let account = Router::new()
        .route("/api/users/me", get(current_user))
        .route("/api/users/upgrade", post(upgrade))
        .route_layer(from_fn_with_state(authenticated.clone(), session_gate));

    let messages = Router::new().route(
        "/api/messages",
        post(create_message)
            .route_layer(from_fn_with_state(authenticated, session_gate))
            .merge(get(list_messages).route_layer(from_fn_with_state(readers, session_gate))),
    );

    let signed_in = Router::new()
        .route("/dashboard", get(pages::dashboard))
        .route("/profile", get(pages::profile))
        .route_layer(from_fn_with_state(signed_in_pages, session_gate));

    Router::new()
        .merge(public)
        .merge(account)
        .merge(messages)
        .merge(signed_in)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "board"
    }))
}

/// Issue a verification code for an email
pub async fn send_verification_code(
    State(state): State<AppState>,
    payload: Option<Json<VerificationRequest>>,
) -> AppResult<impl IntoResponse> {
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    state.accounts.initiate_verification(&request).await?;

    Ok(Json(json!({
        "message": "Verification code sent successfully"
    })))
}

/// Complete signup with the emailed code
pub async fn create_user(
    State(state): State<AppState>,
    payload: Option<Json<CredentialsRequest>>,
) -> AppResult<impl IntoResponse> {
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    let user = state.accounts.complete_signup(&request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User created successfully",
            "user": user
        })),
    ))
}

/// Log in and set the session cookie
pub async fn login(
    State(state): State<AppState>,
    payload: Option<Json<CredentialsRequest>>,
) -> AppResult<impl IntoResponse> {
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    let session = state.accounts.login(&request).await?;

    let cookie = session_cookie(
        &session.token,
        state.jwt_service.token_expiry(),
        state.cookie_secure,
    )
    .map_err(|e| AppError::Internal(e.into()))?;

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(json!({
            "message": "Login successful",
            "user": session.account
        })),
    ))
}

/// Clear the session cookie
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    info!("Session cookie cleared");
    (
        StatusCode::OK,
        [(header::SET_COOKIE, clear_session_cookie(state.cookie_secure))],
        Json(json!({
            "message": "Logout successful"
        })),
    )
}

/// The account behind the current session
pub async fn current_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AppResult<impl IntoResponse> {
    let account = state.accounts.current_account(user.id).await?;
    Ok(Json(json!({ "user": account.to_view() })))
}

/// Look an account up by email, including its pending code
pub async fn user_by_email(
    State(state): State<AppState>,
    Query(query): Query<LookupQuery>,
) -> AppResult<impl IntoResponse> {
    let user = state.accounts.lookup_by_email(query.email.as_deref()).await?;
    Ok(Json(json!({ "user": user })))
}

/// Grant write access and refresh the session cookie
pub async fn upgrade(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Option<Json<UpgradeRequest>>,
) -> AppResult<impl IntoResponse> {
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    let session = state.accounts.upgrade_access(user.id, &request).await?;

    let cookie = session_cookie(
        &session.token,
        state.jwt_service.token_expiry(),
        state.cookie_secure,
    )
    .map_err(|e| AppError::Internal(e.into()))?;

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(json!({
            "message": "Successfully upgraded to write level!",
            "access_level": AccessLevel::Write,
            "user": session.account
        })),
    ))
}

/// Post a message as the signed-in user
pub async fn create_message(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Option<Json<CreateMessageRequest>>,
) -> AppResult<impl IntoResponse> {
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    let message = state.board.create_message(user.id, &request).await?;

    Ok((StatusCode::CREATED, Json(json!({ "message": message }))))
}

/// Most recent messages on the board
pub async fn list_messages(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let messages = state.board.list_messages(MessageScope::Board).await?;
    Ok(Json(json!({ "messages": messages })))
}
