use serde::{Deserialize, Serialize};

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Sender {
    User,
    Assistant,
    SystemMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A message in the conversation, either typed by the user or produced by the backend
pub struct Message {
    pub sender: Sender,
    pub text: String,
}

impl Message {
    pub fn new<S: Into<String>>(sender: Sender, text: S) -> Self {
        Message {
            sender,
            text: text.into(),
        }
    }

    /// Create a new user message
    pub fn user<S: Into<String>>(text: S) -> Self {
        Message::new(Sender::User, text)
    }

    /// Create a new assistant message
    pub fn assistant<S: Into<String>>(text: S) -> Self {
        Message::new(Sender::Assistant, text)
    }

    /// Create the introductory system message
    pub fn system<S: Into<String>>(text: S) -> Self {
        Message::new(Sender::SystemMessage, text)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
