use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::format_system_time,
    state::message::{Message, Operation},
};

/// Client instruction attached to a message.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Drop the current board and fetch a new one.
    Reset,
}

impl From<Operation> for OperationKind {
    fn from(operation: Operation) -> Self {
        match operation {
            Operation::Reset => OperationKind::Reset,
        }
    }
}

/// A message as delivered to one player.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    /// Message identifier.
    pub id: Uuid,
    /// HTML text of the message.
    pub text: String,
    /// Whether the message announces a bingo.
    pub bingo: bool,
    /// Instruction for the client, if any.
    pub operation: Option<OperationKind>,
    /// RFC 3339 creation time.
    pub created_at: String,
    /// Whether the requesting player already acknowledged it.
    pub received: bool,
}

impl MessageResponse {
    /// Render `message` for `email`, who reads their own name as "You".
    pub fn for_player(message: &Message, email: &str) -> Self {
        Self {
            id: message.id,
            text: message.text.clone(),
            bingo: message.bingo,
            operation: message.operation.map(Into::into),
            created_at: format_system_time(message.created_at),
            received: !message.is_pending_for(email),
        }
    }
}
