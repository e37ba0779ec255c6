use std::borrow::Cow;

use bytes::Bytes;
use futures::stream::{BoxStream, Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::conversation::Conversation;
use crate::errors::{ChatError, ChatResult};

/// Decoded text deltas of a streamed reply, in arrival order
pub type TextStream = BoxStream<'static, ChatResult<String>>;

/// How a reply stream stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyOutcome {
    Completed,
    Cancelled,
}

/// Incremental UTF-8 decoder.
///
/// A multi-byte character split across chunk boundaries is held back until the
/// rest of it arrives. Invalid sequences decode to U+FFFD, one per maximal
/// invalid subpart, so the output does not depend on where chunks were split.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let bytes: Cow<'_, [u8]> = if self.pending.is_empty() {
            Cow::Borrowed(chunk)
        } else {
            let mut joined = std::mem::take(&mut self.pending);
            joined.extend_from_slice(chunk);
            Cow::Owned(joined)
        };

        let mut out = String::with_capacity(bytes.len());
        let mut rest: &[u8] = &bytes;
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            // incomplete sequence at the end, at most 3 bytes
                            self.pending = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Flush a dangling partial character at end of stream.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            char::REPLACEMENT_CHARACTER.to_string()
        }
    }
}

/// Turn a byte stream into a cancellable stream of decoded text deltas.
///
/// The stream ends when the bytes run out or when `cancel` fires, whichever
/// comes first. Empty deltas are never yielded.
pub fn decode_stream<S, E>(bytes: S, cancel: CancellationToken) -> TextStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<ChatError> + Send + 'static,
{
    Box::pin(async_stream::try_stream! {
        let mut bytes = Box::pin(bytes);
        let mut decoder = Utf8Decoder::new();

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                next = bytes.next() => Some(next),
            };

            let Some(next) = next else {
                tracing::debug!("reply stream cancelled");
                break;
            };

            match next {
                Some(chunk) => {
                    let chunk = chunk.map_err(Into::<ChatError>::into)?;
                    let text = decoder.decode(&chunk);
                    if !text.is_empty() {
                        yield text;
                    }
                }
                None => {
                    let tail = decoder.finish();
                    if !tail.is_empty() {
                        yield tail;
                    }
                    break;
                }
            }
        }
    })
}

/// Drive a reply stream into the conversation.
///
/// Appends an empty assistant message, then after every delta replaces its text
/// with everything received so far and calls `on_update(delta, accumulated)`.
/// Whatever arrived before a cancellation or an error stays in the conversation;
/// a reply that ends before its first delta is removed again.
pub async fn pump_reply<F>(
    conversation: &mut Conversation,
    mut stream: TextStream,
    cancel: &CancellationToken,
    mut on_update: F,
) -> ChatResult<ReplyOutcome>
where
    F: FnMut(&str, &str),
{
    conversation.begin_reply()?;

    let mut accumulator = String::new();
    let result = loop {
        match stream.next().await {
            Some(Ok(delta)) => {
                accumulator.push_str(&delta);
                if let Err(e) = conversation.replace_reply_text(accumulator.as_str()) {
                    break Err(e);
                }
                on_update(&delta, &accumulator);
            }
            Some(Err(e)) => break Err(e),
            None if cancel.is_cancelled() => break Ok(ReplyOutcome::Cancelled),
            None => break Ok(ReplyOutcome::Completed),
        }
    };

    conversation.finish_reply();
    result
}
