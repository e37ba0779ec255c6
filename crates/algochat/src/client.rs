use std::time::Duration;

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use crate::config::{BackendVariant, ClientConfig};
use crate::errors::{ChatError, ChatResult};
use crate::file_index::FileIndex;
use crate::models::file_record::FileRecord;
use crate::models::message::{Message, Sender};
use crate::streaming::{decode_stream, TextStream};

#[derive(Debug, Serialize, Deserialize)]
struct SystemMessageResponse {
    system_message: String,
}

/// HTTP access to the chat backend and the file lookup table
pub struct ChatClient {
    client: Client,
    config: ClientConfig,
}

impl ChatClient {
    pub fn new(config: ClientConfig) -> ChatResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.backend.connect_timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Request body for the chat endpoint
    fn chat_payload(&self, messages: &[Message]) -> ChatResult<Value> {
        match self.config.backend.variant {
            BackendVariant::SingleTurn => {
                let latest = messages
                    .iter()
                    .rev()
                    .find(|m| m.sender == Sender::User)
                    .ok_or(ChatError::EmptyInput)?;
                Ok(json!({ "text": latest.text }))
            }
            BackendVariant::MultiTurn => Ok(serde_json::to_value(messages)
                .map_err(|e| ChatError::InvalidResponse(e.to_string()))?),
        }
    }

    /// Start a reply and return its decoded text as it arrives.
    ///
    /// Cancelling before the response headers arrive yields an empty stream.
    pub async fn stream_reply(
        &self,
        messages: &[Message],
        cancel: CancellationToken,
    ) -> ChatResult<TextStream> {
        let payload = self.chat_payload(messages)?;
        let request = self
            .client
            .post(&self.config.backend.chat_url)
            .json(&payload)
            .send();

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(Box::pin(futures::stream::empty())),
            response = request => response?,
        };
        let response = check_status(response).await?;
        tracing::debug!(status = %response.status(), "reply stream opened");

        Ok(decode_stream(response.bytes_stream(), cancel))
    }

    /// Ask the backend for the introductory message that frames the conversation.
    pub async fn system_message(&self, first: &Message) -> ChatResult<String> {
        let response = self
            .client
            .post(&self.config.backend.system_message_url)
            .json(first)
            .send()
            .await?;
        let response = check_status(response).await?;

        let body: SystemMessageResponse = response
            .json()
            .await
            .map_err(|e| ChatError::InvalidResponse(e.to_string()))?;
        Ok(body.system_message)
    }

    pub async fn fetch_file_records(&self) -> ChatResult<Vec<FileRecord>> {
        let response = self.client.get(&self.config.lookup.url).send().await?;
        let response = check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ChatError::InvalidResponse(e.to_string()))
    }

    /// Load the lookup table once at start-up.
    ///
    /// A failure is only logged: the index stays empty and file names render
    /// unlinked.
    pub async fn load_file_index(&self) -> FileIndex {
        match self.fetch_file_records().await {
            Ok(records) => {
                tracing::debug!(count = records.len(), "loaded file table");
                FileIndex::new(records)
            }
            Err(e) => {
                tracing::warn!(error = %e, url = %self.config.lookup.url, "failed to load file table");
                FileIndex::default()
            }
        }
    }
}

async fn check_status(response: Response) -> ChatResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ChatError::Status { status, body })
}
