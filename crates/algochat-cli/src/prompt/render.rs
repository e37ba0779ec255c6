use algochat::linker::Span;
use algochat::models::message::Sender;
use algochat::session::{RenderedBlock, RenderedMessage};
use bat::WrappingMode;
use console::{measure_text_width, style};

/// Terminal text for linked spans.
///
/// With `hyperlinks` the links are OSC 8 escapes, otherwise the URL follows the
/// link text in angle brackets.
pub fn spans_to_string(spans: &[Span], hyperlinks: bool) -> String {
    let mut out = String::new();
    for span in spans {
        match span {
            Span::Text(text) => out.push_str(text),
            Span::Link { text, url, .. } if hyperlinks => {
                out.push_str(&format!(
                    "\x1b]8;;{}\x1b\\{}\x1b]8;;\x1b\\",
                    url,
                    style(text).cyan().underlined()
                ));
            }
            Span::Link { text, url, .. } => out.push_str(&format!("{} <{}>", text, url)),
        }
    }
    out
}

pub fn print_message(message: &RenderedMessage, theme: &str, hyperlinks: bool) {
    let mut at_line_start = true;
    for block in &message.blocks {
        match block {
            RenderedBlock::Text(spans) => {
                if spans.is_empty() {
                    continue;
                }
                let text = spans_to_string(spans, hyperlinks);
                at_line_start = text.ends_with('\n');
                if message.sender == Sender::SystemMessage {
                    print!("{}", style(text).dim().italic());
                } else {
                    print!("{}", text);
                }
            }
            RenderedBlock::Code { language, code } => {
                // bat starts drawing at the cursor
                if !at_line_start {
                    println!();
                }
                print_code(code, language, theme);
                at_line_start = true;
            }
        }
    }
    if !at_line_start {
        println!();
    }
}

fn print_code(code: &str, language: &str, theme: &str) {
    let mut printer = bat::PrettyPrinter::new();
    printer
        .input(bat::Input::from_bytes(code.as_bytes()))
        .theme(theme)
        .grid(true)
        .wrapping_mode(WrappingMode::Character);

    if is_known_language(&printer, language) {
        printer.language(language);
    }

    if let Err(e) = printer.print() {
        tracing::debug!(error = %e, "falling back to plain code block");
        println!("{}", code);
    }
}

fn is_known_language(printer: &bat::PrettyPrinter, language: &str) -> bool {
    if language.is_empty() {
        return false;
    }
    printer.syntaxes().any(|syntax| {
        syntax.name.eq_ignore_ascii_case(language)
            || syntax
                .file_extensions
                .iter()
                .any(|ext| ext.eq_ignore_ascii_case(language))
    })
}

/// Rows a block of text occupies on a terminal `columns` wide
pub fn rows_for(text: &str, columns: usize) -> usize {
    let columns = columns.max(1);
    let text = text.strip_suffix('\n').unwrap_or(text);
    text.split('\n')
        .map(|line| {
            let width = measure_text_width(line);
            width.div_ceil(columns).max(1)
        })
        .sum()
}
