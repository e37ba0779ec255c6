use algochat::client::ChatClient;
use algochat::config::ClientConfig;
use algochat::session::ChatSession;
use anyhow::{Context, Result};

use crate::prompt::rustyline::RustylinePrompt;
use crate::prompt::Prompt;
use crate::session::Session;

pub async fn build_session<'a, P: Prompt + 'a>(
    config: ClientConfig,
    show_system: bool,
    prompt: P,
) -> Result<Session<'a>> {
    let client = ChatClient::new(config).context("failed to build HTTP client")?;
    let mut chat = ChatSession::connect(client).await;
    chat.conversation_mut().set_show_system(show_system);

    Ok(Session::new(chat, Box::new(prompt)))
}

pub async fn execute(config: ClientConfig, show_system: bool) -> Result<()> {
    let prompt = RustylinePrompt::new()?;
    let mut session = build_session(config, show_system, prompt).await?;
    session.start().await
}
