//! Server-rendered pages
//!
//! Pages behind the session gate receive an [`AuthUser`] and render data
//! that has already been authorized. Any failure while loading that data
//! sends the visitor back to the landing page.

use axum::{
    Extension,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use tracing::{error, warn};

use crate::{
    error::AppError,
    middleware::AuthUser,
    models::{MessageScope, MessageView},
    state::AppState,
};

/// Escape text for inclusion in HTML element content or attributes
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn layout(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n<body>\n<nav><a href=\"/dashboard\">Dashboard</a> | <a href=\"/profile\">Profile</a></nav>\n{}\n</body>\n</html>\n",
        escape_html(title),
        body
    ))
}

fn message_list(messages: &[MessageView]) -> String {
    if messages.is_empty() {
        return "<p>No messages yet.</p>".to_string();
    }

    let items: String = messages
        .iter()
        .map(|message| {
            format!(
                "<li><p>{}</p><small>{} &middot; {}</small></li>",
                escape_html(&message.body),
                escape_html(&message.author_email),
                message.created_at.format("%Y-%m-%d %H:%M UTC")
            )
        })
        .collect();
    format!("<ul class=\"messages\">{items}</ul>")
}

fn back_to_landing(page: &str, err: AppError) -> Response {
    match err {
        AppError::Internal(e) => error!("Failed to render {}: {:#}", page, e),
        other => warn!("Failed to render {}: {}", page, other),
    }
    Redirect::temporary("/").into_response()
}

/// Landing page
pub async fn index() -> Html<String> {
    layout(
        "Signup Board",
        "<h1>Signup Board</h1>\n\
         <p>Request a verification code with <code>POST /api/sendVerificationCode</code>, \
         complete signup with <code>POST /api/users/create</code>, then sign in with \
         <code>POST /api/users/login</code>.</p>",
    )
}

/// Board of the most recent messages
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Response {
    let messages = match state.board.list_messages(MessageScope::Board).await {
        Ok(messages) => messages,
        Err(e) => return back_to_landing("dashboard", e),
    };

    layout(
        "Dashboard",
        &format!(
            "<h1>Dashboard</h1>\n<p>Signed in as {}</p>\n<h2>Recent messages</h2>\n{}",
            escape_html(&user.email),
            message_list(&messages)
        ),
    )
    .into_response()
}

/// The signed-in account and its own messages
pub async fn profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Response {
    let account = match state.accounts.current_account(user.id).await {
        Ok(account) => account,
        Err(e) => return back_to_landing("profile", e),
    };
    let messages = match state
        .board
        .list_messages(MessageScope::Author(account.id))
        .await
    {
        Ok(messages) => messages,
        Err(e) => return back_to_landing("profile", e),
    };

    let access_level = account
        .access_level
        .map(|level| level.as_str())
        .unwrap_or("No access level set");

    layout(
        "Profile",
        &format!(
            "<h1>Profile</h1>\n<dl>\
             <dt>Email</dt><dd>{}</dd>\
             <dt>Access level</dt><dd>{}</dd>\
             <dt>Temporary</dt><dd>{}</dd>\
             <dt>Member since</dt><dd>{}</dd>\
             </dl>\n<h2>My messages ({})</h2>\n{}",
            escape_html(&account.email),
            access_level,
            if account.is_temporary { "Yes" } else { "No" },
            account.created_at.format("%Y-%m-%d"),
            messages.len(),
            message_list(&messages)
        ),
    )
    .into_response()
}
