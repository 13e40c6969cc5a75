//! Message board controller

use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{MessageScope, MessageView, NewMessage},
    repositories::MessageStore,
    validation::validate_message_body,
};

/// Request for posting a message
#[derive(Debug, Default, Deserialize)]
pub struct CreateMessageRequest {
    pub message: Option<String>,
}

/// Posts and lists messages on behalf of authenticated authors
#[derive(Clone)]
pub struct MessageBoard {
    messages: Arc<dyn MessageStore>,
}

impl MessageBoard {
    pub fn new(messages: Arc<dyn MessageStore>) -> Self {
        Self { messages }
    }

    /// Post a message as `author_id`
    pub async fn create_message(
        &self,
        author_id: Uuid,
        request: &CreateMessageRequest,
    ) -> AppResult<MessageView> {
        let body = validate_message_body(request.message.as_deref().unwrap_or_default())
            .map_err(AppError::Validation)?;

        let message = self
            .messages
            .insert(&NewMessage { author_id, body })
            .await?;

        info!("Message {} posted by {}", message.id, message.author_email);
        Ok(message)
    }

    /// List messages newest-first
    pub async fn list_messages(&self, scope: MessageScope) -> AppResult<Vec<MessageView>> {
        Ok(self.messages.list(scope).await?)
    }
}
