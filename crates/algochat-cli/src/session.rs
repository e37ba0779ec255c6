use algochat::errors::ChatError;
use algochat::models::message::Sender;
use algochat::session::ChatSession;
use algochat::streaming::ReplyOutcome;
use anyhow::Result;
use tokio_util::sync::CancellationToken;

use crate::prompt::{InputType, Prompt};

pub struct Session<'a> {
    chat: ChatSession,
    prompt: Box<dyn Prompt + 'a>,
}

impl<'a> Session<'a> {
    pub fn new(chat: ChatSession, prompt: Box<impl Prompt + 'a>) -> Self {
        Session { chat, prompt }
    }

    pub async fn start(&mut self) -> Result<()> {
        self.setup_session();

        loop {
            let input = self.prompt.get_input()?;
            match input.input_type {
                InputType::Message => {
                    if let Some(content) = input.content {
                        self.chat.conversation_mut().set_input(content);
                    }
                }
                InputType::ToggleSystem => {
                    self.toggle_system_message();
                    continue;
                }
                InputType::Exit => break,
                InputType::AskAgain => continue,
            }

            self.process_turn().await;
        }
        self.close_session();
        Ok(())
    }

    pub async fn headless_start(&mut self, initial_message: String) -> Result<()> {
        self.chat.conversation_mut().set_input(initial_message);
        let ok = self.process_turn().await;

        self.close_session();
        if !ok {
            anyhow::bail!("no reply received");
        }
        Ok(())
    }

    /// Send the pending input and show the reply. Returns false when the turn failed.
    async fn process_turn(&mut self) -> bool {
        let cancel = CancellationToken::new();
        let interrupt = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            }
        });

        self.prompt.show_busy();
        let prompt = &mut self.prompt;
        let result = self
            .chat
            .submit(&cancel, |delta, _| prompt.stream_delta(delta))
            .await;
        interrupt.abort();
        self.prompt.hide_busy();

        match result {
            Ok(ReplyOutcome::Completed) => {
                let reply = self
                    .chat
                    .conversation()
                    .messages()
                    .last()
                    .filter(|message| message.sender == Sender::Assistant)
                    .map(|message| self.chat.render(message));
                self.prompt.finish_reply(reply.as_ref());
                true
            }
            Ok(ReplyOutcome::Cancelled) => {
                self.prompt.finish_reply(None);
                self.prompt
                    .notice("Interrupted. The partial answer is kept in the conversation.");
                true
            }
            Err(ChatError::EmptyInput) => {
                self.prompt.notice(&ChatError::EmptyInput.to_string());
                false
            }
            Err(e) => {
                self.prompt.finish_reply(None);
                self.prompt.error(&format!("Error: {}", e));
                false
            }
        }
    }

    fn toggle_system_message(&mut self) {
        let show = !self.chat.conversation().shows_system();
        self.chat.conversation_mut().set_show_system(show);

        if !show {
            self.prompt.notice("System message hidden.");
            return;
        }

        let system = self
            .chat
            .conversation()
            .visible()
            .find(|m| m.sender == Sender::SystemMessage)
            .map(|message| self.chat.render(message));
        match system {
            Some(rendered) => self.prompt.render(&rendered),
            None => self.prompt.notice("No system message yet."),
        }
    }

    fn setup_session(&mut self) {
        let files = self.chat.linker().index().len();
        if files == 0 {
            self.prompt
                .notice("File table unavailable, file names will not be linked.");
        } else {
            self.prompt
                .notice(&format!("Loaded {} repository files for linking.", files));
        }
        self.prompt.ready();
    }

    fn close_session(&mut self) {
        self.prompt.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::Input;
    use algochat::client::ChatClient;
    use algochat::config::ClientConfig;
    use algochat::session::{RenderedBlock, RenderedMessage};
    use std::collections::VecDeque;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Default)]
    struct MockPrompt {
        inputs: VecDeque<Input>,
        deltas: Vec<String>,
        replies: Vec<Option<RenderedMessage>>,
        rendered: Vec<RenderedMessage>,
        notices: Vec<String>,
        errors: Vec<String>,
    }

    impl MockPrompt {
        fn with_inputs(inputs: Vec<(InputType, Option<&str>)>) -> Self {
            let inputs = inputs
                .into_iter()
                .map(|(input_type, content)| Input {
                    input_type,
                    content: content.map(String::from),
                })
                .collect();
            MockPrompt {
                inputs,
                ..Default::default()
            }
        }
    }

    impl Prompt for MockPrompt {
        fn render(&mut self, message: &RenderedMessage) {
            self.rendered.push(message.clone());
        }
        fn stream_delta(&mut self, delta: &str) {
            self.deltas.push(delta.to_string());
        }
        fn finish_reply(&mut self, reply: Option<&RenderedMessage>) {
            self.replies.push(reply.cloned());
        }
        fn notice(&mut self, text: &str) {
            self.notices.push(text.to_string());
        }
        fn error(&mut self, text: &str) {
            self.errors.push(text.to_string());
        }
        fn get_input(&mut self) -> Result<Input> {
            Ok(self.inputs.pop_front().unwrap_or(Input {
                input_type: InputType::Exit,
                content: None,
            }))
        }
        fn show_busy(&mut self) {}
        fn hide_busy(&mut self) {}
        fn close(&self) {}
        fn ready(&self) {}
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    async fn chat_session(server: &MockServer) -> ChatSession {
        let mut config = ClientConfig::default();
        config.backend.chat_url = format!("{}/chat_stream/", server.uri());
        config.backend.system_message_url = format!("{}/system_message/", server.uri());
        config.lookup.url = format!("{}/api/fetchCsvData", server.uri());
        ChatSession::connect(ChatClient::new(config).unwrap()).await
    }

    async fn mount_backend(server: &MockServer, reply: &str) {
        Mock::given(method("POST"))
            .and(path("/system_message/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"system_message": "intro"})),
            )
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat_stream/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(reply.to_string()))
            .mount(server)
            .await;
    }

    fn mock<'s>(session: &'s Session<'_>) -> &'s MockPrompt {
        session
            .prompt
            .as_any()
            .downcast_ref::<MockPrompt>()
            .unwrap()
    }

    #[tokio::test]
    async fn test_session_streams_and_renders_reply() {
        let server = MockServer::start().await;
        mount_backend(&server, "```py\nprint(1)\n```").await;

        let prompt = MockPrompt::with_inputs(vec![
            (InputType::Message, Some("show me code")),
            (InputType::Exit, None),
        ]);
        let mut session = Session::new(chat_session(&server).await, Box::new(prompt));
        session.start().await.unwrap();

        let prompt = mock(&session);
        assert_eq!(prompt.deltas.concat(), "```py\nprint(1)\n```");
        assert_eq!(prompt.replies.len(), 1);
        let reply = prompt.replies[0].as_ref().unwrap();
        assert_eq!(reply.sender, Sender::Assistant);
        assert!(reply.blocks.contains(&RenderedBlock::Code {
            language: "py".to_string(),
            code: "print(1)".to_string(),
        }));
        assert!(prompt.errors.is_empty());
    }

    #[tokio::test]
    async fn test_blank_message_asks_for_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let prompt = MockPrompt::with_inputs(vec![(InputType::Message, Some("  "))]);
        let mut session = Session::new(chat_session(&server).await, Box::new(prompt));
        session.start().await.unwrap();

        let prompt = mock(&session);
        assert!(prompt.notices.contains(&"Enter some text.".to_string()));
        assert!(prompt.replies.is_empty());
    }

    #[tokio::test]
    async fn test_toggle_system_message() {
        let server = MockServer::start().await;
        mount_backend(&server, "hello").await;

        let prompt = MockPrompt::with_inputs(vec![
            (InputType::ToggleSystem, None),
            (InputType::Message, Some("hi")),
            (InputType::ToggleSystem, None),
            (InputType::ToggleSystem, None),
        ]);
        let mut session = Session::new(chat_session(&server).await, Box::new(prompt));
        session.start().await.unwrap();

        let prompt = mock(&session);
        assert!(prompt.notices.contains(&"No system message yet.".to_string()));
        assert!(prompt.notices.contains(&"System message hidden.".to_string()));
        assert_eq!(prompt.rendered.len(), 1);
        assert_eq!(prompt.rendered[0].sender, Sender::SystemMessage);
    }

    #[tokio::test]
    async fn test_backend_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat_stream/"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let prompt = MockPrompt::default();
        let mut session = Session::new(chat_session(&server).await, Box::new(prompt));
        let result = session.headless_start("hi".to_string()).await;

        assert!(result.is_err());
        let prompt = mock(&session);
        assert_eq!(prompt.errors.len(), 1);
        assert!(prompt.errors[0].contains("503"));
    }
}
