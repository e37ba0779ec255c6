use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::client::ChatClient;
use crate::conversation::Conversation;
use crate::errors::{ChatError, ChatResult};
use crate::formatter::{format_message, Segment};
use crate::linker::{FileLinker, Span};
use crate::models::message::{Message, Sender};
use crate::streaming::{pump_reply, ReplyOutcome};

/// A finished message ready to be drawn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub sender: Sender,
    pub blocks: Vec<RenderedBlock>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedBlock {
    Text(Vec<Span>),
    Code { language: String, code: String },
}

/// One conversation with the backend: state, transport, and file linking
pub struct ChatSession {
    conversation: Conversation,
    client: ChatClient,
    linker: FileLinker,
}

impl ChatSession {
    pub fn new(client: ChatClient, linker: FileLinker) -> Self {
        Self {
            conversation: Conversation::new(),
            client,
            linker,
        }
    }

    /// Build a session, fetching the file lookup table once.
    pub async fn connect(client: ChatClient) -> Self {
        let index = client.load_file_index().await;
        let base_url = client.config().lookup.repo_base_url.clone();
        Self::new(client, FileLinker::new(Arc::new(index), base_url))
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn conversation_mut(&mut self) -> &mut Conversation {
        &mut self.conversation
    }

    pub fn linker(&self) -> &FileLinker {
        &self.linker
    }

    /// Send the pending input and stream the reply into the conversation.
    ///
    /// Blank input issues no request. The first turn is preceded by the
    /// backend's system message, so it appends the system message and then the
    /// user message before the reply. Cancelling while the system message is
    /// still pending leaves the conversation untouched.
    pub async fn submit<F>(
        &mut self,
        cancel: &CancellationToken,
        on_update: F,
    ) -> ChatResult<ReplyOutcome>
    where
        F: FnMut(&str, &str),
    {
        let text = self
            .conversation
            .take_submission()
            .ok_or(ChatError::EmptyInput)?;
        let user_message = Message::user(text);

        if self.conversation.is_first_turn() {
            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!("cancelled while waiting for the system message");
                    return Ok(ReplyOutcome::Cancelled);
                }
                fetched = self.client.system_message(&user_message) => fetched,
            };
            let system_text = match fetched {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to fetch system message");
                    String::new()
                }
            };
            self.conversation.push(Message::system(system_text))?;
        }
        self.conversation.push(user_message)?;

        let stream = self
            .client
            .stream_reply(self.conversation.messages(), cancel.clone())
            .await?;
        pump_reply(&mut self.conversation, stream, cancel, on_update).await
    }

    /// Split a message into text and code blocks, linking file mentions in the text.
    pub fn render(&self, message: &Message) -> RenderedMessage {
        let blocks = format_message(&message.text)
            .into_iter()
            .map(|segment| match segment {
                Segment::Text(text) => RenderedBlock::Text(self.linker.link(&text)),
                Segment::Code { language, code } => RenderedBlock::Code { language, code },
            })
            .collect();

        RenderedMessage {
            sender: message.sender,
            blocks,
        }
    }

    /// Every visible message, rendered
    pub fn transcript(&self) -> Vec<RenderedMessage> {
        self.conversation
            .visible()
            .map(|message| self.render(message))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::file_index::FileIndex;
    use crate::models::file_record::FileRecord;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/system_message/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"system_message": "intro"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat_stream/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("See `foo.py`:\n```py\nx = 1\n```"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/fetchCsvData"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{"file_name": "src/foo.py"}])),
            )
            .mount(&server)
            .await;
        server
    }

    fn client_for(server: &MockServer) -> ChatClient {
        let mut config = ClientConfig::default();
        config.backend.chat_url = format!("{}/chat_stream/", server.uri());
        config.backend.system_message_url = format!("{}/system_message/", server.uri());
        config.lookup.url = format!("{}/api/fetchCsvData", server.uri());
        config.lookup.repo_base_url = "https://repo.example/blob/main".to_string();
        ChatClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_first_turn_appends_system_then_user() {
        let server = setup_server().await;
        let mut session = ChatSession::connect(client_for(&server)).await;

        session.conversation_mut().set_input("Do likes matter?");
        let outcome = session
            .submit(&CancellationToken::new(), |_, _| {})
            .await
            .unwrap();

        assert_eq!(outcome, ReplyOutcome::Completed);
        let senders: Vec<_> = session
            .conversation()
            .messages()
            .iter()
            .map(|m| m.sender)
            .collect();
        assert_eq!(
            senders,
            vec![Sender::SystemMessage, Sender::User, Sender::Assistant]
        );
        assert_eq!(session.conversation().messages()[0].text, "intro");
        assert_eq!(session.conversation().messages()[1].text, "Do likes matter?");
    }

    #[tokio::test]
    async fn test_later_turns_skip_system_message() {
        let server = setup_server().await;
        let mut session = ChatSession::connect(client_for(&server)).await;

        for question in ["one", "two"] {
            session.conversation_mut().set_input(question);
            session
                .submit(&CancellationToken::new(), |_, _| {})
                .await
                .unwrap();
        }

        let system_count = session
            .conversation()
            .messages()
            .iter()
            .filter(|m| m.sender == Sender::SystemMessage)
            .count();
        assert_eq!(system_count, 1);
        assert_eq!(session.conversation().messages().len(), 5);
    }

    #[tokio::test]
    async fn test_empty_input_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let linker = FileLinker::new(Arc::new(FileIndex::default()), "https://repo.example");
        let mut session = ChatSession::new(client, linker);

        session.conversation_mut().set_input("   ");
        let result = session.submit(&CancellationToken::new(), |_, _| {}).await;

        assert!(matches!(result, Err(ChatError::EmptyInput)));
        assert!(session.conversation().messages().is_empty());
    }

    #[tokio::test]
    async fn test_failed_system_message_keeps_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/system_message/"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat_stream/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let linker = FileLinker::new(Arc::new(FileIndex::default()), "https://repo.example");
        let mut session = ChatSession::new(client_for(&server), linker);
        session.conversation_mut().set_input("hi");
        session
            .submit(&CancellationToken::new(), |_, _| {})
            .await
            .unwrap();

        let messages = session.conversation().messages();
        assert_eq!(messages[0], Message::system(""));
        assert_eq!(messages[1], Message::user("hi"));
        assert_eq!(messages[2], Message::assistant("ok"));
        assert_eq!(session.conversation().visible().count(), 2);
    }

    #[tokio::test]
    async fn test_cancel_while_fetching_system_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/system_message/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"system_message": "intro"}))
                    .set_delay(Duration::from_secs(30)),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat_stream/"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let linker = FileLinker::new(Arc::new(FileIndex::default()), "https://repo.example");
        let mut session = ChatSession::new(client_for(&server), linker);
        session.conversation_mut().set_input("hi");

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let outcome = tokio::time::timeout(
            Duration::from_secs(3),
            session.submit(&cancel, |_, _| {}),
        )
        .await
        .expect("submit should return once cancelled")
        .unwrap();

        assert_eq!(outcome, ReplyOutcome::Cancelled);
        assert!(session.conversation().messages().is_empty());
        assert!(session.conversation().is_first_turn());
    }

    #[tokio::test]
    async fn test_render_links_and_highlights() {
        let server = setup_server().await;
        let mut session = ChatSession::connect(client_for(&server)).await;
        session.conversation_mut().set_input("where?");
        session
            .submit(&CancellationToken::new(), |_, _| {})
            .await
            .unwrap();

        let transcript = session.transcript();
        assert_eq!(transcript.len(), 2);

        let reply = &transcript[1];
        assert_eq!(reply.sender, Sender::Assistant);
        assert_eq!(
            reply.blocks,
            vec![
                RenderedBlock::Text(vec![
                    Span::Text("See `".to_string()),
                    Span::Link {
                        text: "foo.py".to_string(),
                        path: "src/foo.py".to_string(),
                        url: "https://repo.example/blob/main/src/foo.py".to_string(),
                    },
                    Span::Text("`:\n".to_string()),
                ]),
                RenderedBlock::Code {
                    language: "py".to_string(),
                    code: "x = 1".to_string(),
                },
                RenderedBlock::Text(vec![]),
            ]
        );
    }

    #[test]
    fn test_render_user_message() {
        let index = FileIndex::new(vec![FileRecord::new("a/b.rs")]);
        let linker = FileLinker::new(Arc::new(index), "https://r");
        let client = ChatClient::new(ClientConfig::default()).unwrap();
        let session = ChatSession::new(client, linker);

        let rendered = session.render(&Message::user("b.rs"));
        assert_eq!(rendered.sender, Sender::User);
        assert_eq!(
            rendered.blocks,
            vec![RenderedBlock::Text(vec![Span::Link {
                text: "b.rs".to_string(),
                path: "a/b.rs".to_string(),
                url: "https://r/a/b.rs".to_string(),
            }])]
        );
    }
}
