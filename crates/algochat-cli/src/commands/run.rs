use anyhow::Result;
use algochat::config::ClientConfig;

use crate::prompt::rustyline::RustylinePrompt;

/// Ask a single question and exit once the reply has been shown.
pub async fn execute(config: ClientConfig, show_system: bool, text: String) -> Result<()> {
    let prompt = RustylinePrompt::new()?;
    let mut session = super::session::build_session(config, show_system, prompt).await?;
    session.headless_start(text).await
}
