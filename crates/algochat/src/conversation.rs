use crate::errors::{ChatError, ChatResult};
use crate::models::message::{Message, Sender};

/// A single state transition of the conversation
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    SetInput(String),
    Push(Message),
    BeginReply,
    ReplaceReplyText(String),
    FinishReply,
    SetShowSystem(bool),
}

/// The single source of truth for what the chat view renders.
///
/// Messages are append-only. The only in-place change is the replacement of the
/// trailing message's text while a reply is streaming, and at most one message
/// is in progress at a time.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    input: String,
    streaming: bool,
    show_system: bool,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_show_system(mut self, show_system: bool) -> Self {
        self.show_system = show_system;
        self
    }

    pub fn apply(&mut self, update: Update) -> ChatResult<()> {
        match update {
            Update::SetInput(text) => self.input = text,
            Update::Push(message) => {
                if self.streaming {
                    return Err(ChatError::ReplyInProgress);
                }
                self.messages.push(message);
            }
            Update::BeginReply => {
                if self.streaming {
                    return Err(ChatError::ReplyInProgress);
                }
                self.messages.push(Message::assistant(""));
                self.streaming = true;
            }
            Update::ReplaceReplyText(text) => {
                if !self.streaming {
                    return Err(ChatError::NoReplyInProgress);
                }
                // streaming implies the trailing message is the reply
                if let Some(last) = self.messages.last_mut() {
                    last.text = text;
                }
            }
            Update::FinishReply => self.finish_reply(),
            Update::SetShowSystem(show) => self.show_system = show,
        }
        Ok(())
    }

    pub fn set_input<S: Into<String>>(&mut self, text: S) {
        self.input = text.into();
    }

    pub fn set_show_system(&mut self, show: bool) {
        self.show_system = show;
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Take the pending input if there is anything to send.
    ///
    /// Blank input is left in place and yields `None`, so callers never issue a
    /// request for it.
    pub fn take_submission(&mut self) -> Option<String> {
        if self.input.trim().is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.input))
    }

    pub fn push(&mut self, message: Message) -> ChatResult<()> {
        self.apply(Update::Push(message))
    }

    pub fn begin_reply(&mut self) -> ChatResult<()> {
        self.apply(Update::BeginReply)
    }

    pub fn replace_reply_text<S: Into<String>>(&mut self, text: S) -> ChatResult<()> {
        self.apply(Update::ReplaceReplyText(text.into()))
    }

    /// End the in-progress reply. A reply that never received text is removed.
    pub fn finish_reply(&mut self) {
        if self.streaming && self.messages.last().is_some_and(Message::is_empty) {
            self.messages.pop();
        }
        self.streaming = false;
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    pub fn shows_system(&self) -> bool {
        self.show_system
    }

    pub fn is_first_turn(&self) -> bool {
        !self.messages.iter().any(|m| m.sender == Sender::User)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages that should appear in the transcript.
    pub fn visible(&self) -> impl Iterator<Item = &Message> + '_ {
        self.messages.iter().filter(move |m| self.is_visible(m))
    }

    fn is_visible(&self, message: &Message) -> bool {
        match message.sender {
            Sender::User => true,
            Sender::Assistant => !message.is_empty(),
            Sender::SystemMessage => self.show_system && !message.is_empty(),
        }
    }
}
