use algochat::config::{BackendVariant, ClientConfig};
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod prompt;
mod session;

use commands::run::execute as run_execute;
use commands::session::execute as session_execute;
use commands::version::execute as version_execute;

#[derive(Parser)]
#[command(author, about, long_about = None)]
struct Cli {
    #[arg(short = 'v', long = "version")]
    version: bool,

    #[command(flatten)]
    backend: BackendArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Args, Debug, Default)]
struct BackendArgs {
    /// Streaming chat endpoint (overrides ALGOCHAT_BACKEND__CHAT_URL)
    #[arg(long, global = true)]
    chat_url: Option<String>,

    /// System message endpoint
    #[arg(long, global = true)]
    system_message_url: Option<String>,

    /// Endpoint serving the repository file table
    #[arg(long, global = true)]
    lookup_url: Option<String>,

    /// Base URL that file links point into
    #[arg(long, global = true)]
    repo_url: Option<String>,

    /// Request shape the chat endpoint expects
    #[arg(long, value_enum, global = true)]
    variant: Option<CliBackendVariant>,

    /// Show the system message that opens the conversation
    #[arg(long, global = true)]
    show_system: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum CliBackendVariant {
    SingleTurn,
    MultiTurn,
}

impl From<CliBackendVariant> for BackendVariant {
    fn from(variant: CliBackendVariant) -> Self {
        match variant {
            CliBackendVariant::SingleTurn => BackendVariant::SingleTurn,
            CliBackendVariant::MultiTurn => BackendVariant::MultiTurn,
        }
    }
}

impl BackendArgs {
    fn apply(&self, config: &mut ClientConfig) {
        if let Some(url) = &self.chat_url {
            config.backend.chat_url = url.clone();
        }
        if let Some(url) = &self.system_message_url {
            config.backend.system_message_url = url.clone();
        }
        if let Some(url) = &self.lookup_url {
            config.lookup.url = url.clone();
        }
        if let Some(url) = &self.repo_url {
            config.lookup.repo_base_url = url.clone();
        }
        if let Some(variant) = self.variant {
            config.backend.variant = variant.into();
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Start an interactive chat
    #[command(about = "Start a chat session")]
    Session,

    /// Ask one question and print the reply
    #[command(about = "Ask a single question")]
    Run {
        /// The question to send
        #[arg(short, long)]
        text: String,
    },
}

fn init_logging() {
    // Logs go to stderr so they never interleave with the streamed reply.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.version {
        version_execute().await?;
        return Ok(());
    }

    init_logging();

    let mut config = ClientConfig::load()?;
    cli.backend.apply(&mut config);
    let show_system = cli.backend.show_system;

    match cli.command {
        Some(Command::Run { text }) => run_execute(config, show_system, text).await,
        Some(Command::Session) | None => session_execute(config, show_system).await,
    }
}
