use std::{collections::BTreeSet, fmt, time::SystemTime};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Addressee of a notification: a named group or a single player.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Recipient {
    /// Every player of the game.
    All,
    /// Game and global admins.
    Admin,
    /// One player, by e-mail.
    Player(String),
}

impl Recipient {
    /// Audience of one player.
    pub fn player(email: impl Into<String>) -> Self {
        Recipient::Player(email.into())
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recipient::All => f.write_str("all"),
            Recipient::Admin => f.write_str("admin"),
            Recipient::Player(email) => f.write_str(email),
        }
    }
}

impl From<String> for Recipient {
    fn from(value: String) -> Self {
        match value.as_str() {
            "all" => Recipient::All,
            "admin" => Recipient::Admin,
            _ => Recipient::Player(value),
        }
    }
}

impl From<Recipient> for String {
    fn from(value: Recipient) -> Self {
        value.to_string()
    }
}

/// Instruction for the client attached to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// The player's board was removed and must be fetched again.
    Reset,
}

/// Notification appended to a game's message log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Identifier.
    pub id: Uuid,
    /// Text shown to the audience.
    pub text: String,
    /// Recipients.
    pub audience: Vec<Recipient>,
    /// Set on bingo announcements so clients can highlight them.
    #[serde(default)]
    pub bingo: bool,
    /// Optional client instruction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<Operation>,
    /// Creation time.
    pub created_at: SystemTime,
    /// Players who already acknowledged the message.
    #[serde(default)]
    pub received_by: BTreeSet<String>,
}

impl Message {
    /// Message with no audience yet.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            audience: Vec::new(),
            bingo: false,
            operation: None,
            created_at: SystemTime::now(),
            received_by: BTreeSet::new(),
        }
    }

    /// Add a recipient; duplicates are ignored.
    pub fn to(mut self, recipient: Recipient) -> Self {
        if !self.audience.contains(&recipient) {
            self.audience.push(recipient);
        }
        self
    }

    /// Address one player by e-mail.
    pub fn to_player(self, email: &str) -> Self {
        self.to(Recipient::player(email))
    }

    /// Flag the message as a bingo announcement.
    pub fn bingo(mut self) -> Self {
        self.bingo = true;
        self
    }

    /// Attach a client instruction.
    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operation = Some(operation);
        self
    }

    /// Whether `email` is part of the audience, given the viewer's admin status.
    pub fn is_for(&self, email: &str, is_admin: bool) -> bool {
        self.audience.iter().any(|recipient| match recipient {
            Recipient::All => true,
            Recipient::Admin => is_admin,
            Recipient::Player(target) => target == email,
        })
    }

    /// Record that `email` received the message. Returns `false` if it already had.
    pub fn acknowledge(&mut self, email: &str) -> bool {
        self.received_by.insert(email.to_owned())
    }

    /// Whether `email` has not acknowledged the message yet.
    pub fn is_pending_for(&self, email: &str) -> bool {
        !self.received_by.contains(email)
    }
}
