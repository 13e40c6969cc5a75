//! Board service models

pub mod account;
pub mod message;

// Re-export for convenience
pub use account::{AccessLevel, Account, AccountLookupView, AccountView, NewAccount};
pub use message::{BOARD_PAGE_SIZE, Message, MessageScope, MessageView, NewMessage};
