//! Application state shared across handlers

use crate::{accounts::AccountService, board::MessageBoard, jwt::JwtService};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub board: MessageBoard,
    pub jwt_service: JwtService,
    pub cookie_secure: bool,
}
