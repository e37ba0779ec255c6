use algochat::session::RenderedMessage;
use anyhow::Result;

pub mod render;
pub mod rustyline;
pub mod thinking;

pub trait Prompt {
    /// Draw a finished message
    fn render(&mut self, message: &RenderedMessage);
    /// Show newly arrived reply text
    fn stream_delta(&mut self, delta: &str);
    /// The reply stopped; replace the live text with `reply` when given.
    fn finish_reply(&mut self, reply: Option<&RenderedMessage>);
    fn notice(&mut self, text: &str);
    fn error(&mut self, text: &str);
    fn get_input(&mut self) -> Result<Input>;
    fn show_busy(&mut self);
    fn hide_busy(&mut self);
    fn close(&self);
    fn ready(&self) {
        println!("\n");
        println!("Chat With the Algorithm");
        println!("This is still a WIP, and answers may not be correct.");
        println!("Try: Do likes impact the ranking of my tweets?  (/help for commands)");
        println!("\n");
    }
    // Used for testing. Allows us to downcast to any type.
    #[cfg(test)]
    fn as_any(&self) -> &dyn std::any::Any;
}

pub struct Input {
    pub input_type: InputType,
    pub content: Option<String>, // Optional content as sometimes the user may be issuing a command eg. (Exit)
}

#[derive(Debug, PartialEq)]
pub enum InputType {
    AskAgain,     // Ask the user for input again. Control flow command.
    Message,      // User sent a message
    ToggleSystem, // Show or hide the system message
    Exit,         // User wants to exit the session
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn bat_theme(&self) -> &'static str {
        match self {
            Theme::Light => "GitHub",
            Theme::Dark => "zenburn",
        }
    }

    pub fn toggled(&self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}
