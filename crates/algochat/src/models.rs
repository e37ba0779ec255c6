//! These models represent the objects passed between the chat view and the backend
//!
//! The chat endpoint of the multi-turn backend consumes the message list verbatim, so
//! the serialized shape of [`message::Message`] is part of the wire format. The file
//! records come from the lookup endpoint, which serves the rows of the corpus summary CSV.
pub mod file_record;
pub mod message;
