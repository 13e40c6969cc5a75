//! Message model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of messages shown on the board view
pub const BOARD_PAGE_SIZE: usize = 50;

/// Message entity
#[derive(Debug, Clone)]
pub struct Message {
    pub id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New message creation payload, body already validated and trimmed
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub author_id: Uuid,
    pub body: String,
}

/// Message joined with its author's email
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: Uuid,
    pub body: String,
    pub author_id: Uuid,
    pub author_email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Which messages a listing covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageScope {
    /// Most recent [`BOARD_PAGE_SIZE`] messages from everyone
    Board,
    /// Every message by one author
    Author(Uuid),
}
