use std::io::{self, Write};

use algochat::session::RenderedMessage;
use anyhow::Result;
use cliclack::spinner;
use console::{style, Term};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use super::render::{print_message, rows_for};
use super::thinking::get_random_thinking_message;
use super::{Input, InputType, Prompt, Theme};

const PROMPT: &str = "\x1b[1m\x1b[38;5;30m> \x1b[0m";
const CONTINUATION_PROMPT: &str = "\x1b[38;5;30m. \x1b[0m";

#[derive(Debug, PartialEq)]
enum Command {
    Exit,
    ToggleTheme,
    ToggleSystem,
    Help,
}

fn parse_command(text: &str) -> Option<Command> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("/exit") || text.eq_ignore_ascii_case("/quit") {
        Some(Command::Exit)
    } else if text.eq_ignore_ascii_case("/t") {
        Some(Command::ToggleTheme)
    } else if text.eq_ignore_ascii_case("/system") {
        Some(Command::ToggleSystem)
    } else if text.eq_ignore_ascii_case("/?") || text.eq_ignore_ascii_case("/help") {
        Some(Command::Help)
    } else {
        None
    }
}

pub struct RustylinePrompt {
    editor: DefaultEditor,
    spinner: cliclack::ProgressBar,
    busy: bool,
    theme: Theme,
    term: Term,
    // reply text printed so far, erased once the formatted reply is drawn
    live: String,
}

impl RustylinePrompt {
    pub fn new() -> Result<Self> {
        Ok(RustylinePrompt {
            editor: DefaultEditor::new()?,
            spinner: spinner(),
            busy: false,
            theme: Theme::Dark,
            term: Term::stdout(),
            live: String::new(),
        })
    }

    fn hyperlinks(&self) -> bool {
        self.term.is_term()
    }

    fn read_message(&mut self) -> Result<String, ReadlineError> {
        let mut text = String::new();
        let mut prompt = PROMPT;
        loop {
            let line = self.editor.readline(prompt)?;
            match line.strip_suffix('\\') {
                Some(continued) => {
                    text.push_str(continued);
                    text.push('\n');
                    prompt = CONTINUATION_PROMPT;
                }
                None => {
                    text.push_str(&line);
                    break;
                }
            }
        }
        if !text.trim().is_empty() {
            let _ = self.editor.add_history_entry(text.as_str());
        }
        Ok(text)
    }
}

fn print_help() {
    println!("Commands:");
    println!("/exit - Exit the session");
    println!("/t - Toggle Light/Dark theme");
    println!("/system - Show or hide the system message");
    println!("/? | /help - Display this help message");
    println!("End a line with \\ to continue on the next line");
    println!("Ctrl+C - Stop the current reply (the partial answer is kept)");
}

impl Prompt for RustylinePrompt {
    fn render(&mut self, message: &RenderedMessage) {
        print_message(message, self.theme.bat_theme(), self.hyperlinks());
        let _ = io::stdout().flush();
    }

    fn stream_delta(&mut self, delta: &str) {
        if self.busy {
            self.hide_busy();
        }
        print!("{}", delta);
        let _ = io::stdout().flush();
        self.live.push_str(delta);
    }

    fn finish_reply(&mut self, reply: Option<&RenderedMessage>) {
        let live = std::mem::take(&mut self.live);
        if !live.is_empty() && !live.ends_with('\n') {
            println!();
        }

        match reply {
            Some(reply) if self.hyperlinks() => {
                if !live.is_empty() {
                    let (_, columns) = self.term.size();
                    if let Err(e) = self.term.clear_last_lines(rows_for(&live, columns as usize)) {
                        tracing::debug!(error = %e, "could not clear streamed reply");
                    }
                }
                print_message(reply, self.theme.bat_theme(), true);
            }
            Some(reply) if live.is_empty() => {
                print_message(reply, self.theme.bat_theme(), false);
            }
            _ => {}
        }

        println!();
        let _ = io::stdout().flush();
    }

    fn notice(&mut self, text: &str) {
        println!("{}", style(text).dim());
    }

    fn error(&mut self, text: &str) {
        eprintln!("{}", style(text).red());
    }

    fn show_busy(&mut self) {
        self.spinner = spinner();
        self.spinner
            .start(format!("{}...", get_random_thinking_message()));
        self.busy = true;
    }

    fn hide_busy(&mut self) {
        if self.busy {
            self.spinner.stop("");
            self.busy = false;
        }
    }

    fn get_input(&mut self) -> Result<Input> {
        let message_text = match self.read_message() {
            Ok(text) => text,
            Err(e) => {
                match e {
                    ReadlineError::Interrupted | ReadlineError::Eof => (),
                    _ => eprintln!("Input error: {}", e),
                }
                return Ok(Input {
                    input_type: InputType::Exit,
                    content: None,
                });
            }
        };

        let input_type = match parse_command(&message_text) {
            Some(Command::Exit) => InputType::Exit,
            Some(Command::ToggleTheme) => {
                self.theme = self.theme.toggled();
                match self.theme {
                    Theme::Light => println!("Switching to Light theme"),
                    Theme::Dark => println!("Switching to Dark theme"),
                }
                InputType::AskAgain
            }
            Some(Command::ToggleSystem) => InputType::ToggleSystem,
            Some(Command::Help) => {
                print_help();
                InputType::AskAgain
            }
            None => {
                return Ok(Input {
                    input_type: InputType::Message,
                    content: Some(message_text),
                })
            }
        };

        Ok(Input {
            input_type,
            content: None,
        })
    }

    fn close(&self) {
        // No cleanup required
    }

    #[cfg(test)]
    fn as_any(&self) -> &dyn std::any::Any {
        panic!("Not implemented");
    }
}
