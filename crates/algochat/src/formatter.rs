const FENCE: &str = "```";

/// A piece of a finished message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Code { language: String, code: String },
}

impl Segment {
    pub fn is_code(&self) -> bool {
        matches!(self, Segment::Code { .. })
    }
}

/// Split a message on fenced code blocks.
///
/// Text and code segments alternate, starting and ending with text, so a message
/// with N fenced blocks yields N code segments between N + 1 (possibly empty)
/// text segments. A fence that is never closed runs to the end of the message.
pub fn format_message(text: &str) -> Vec<Segment> {
    let mut segments: Vec<Segment> = text
        .split(FENCE)
        .enumerate()
        .map(|(i, part)| {
            if i % 2 == 0 {
                Segment::Text(part.to_string())
            } else {
                code_segment(part)
            }
        })
        .collect();

    if segments.len() % 2 == 0 {
        segments.push(Segment::Text(String::new()));
    }
    segments
}

fn code_segment(body: &str) -> Segment {
    let (language, code) = match body.split_once('\n') {
        Some((first, rest)) if is_language_tag(first.trim()) => (first.trim(), rest),
        _ => ("", body),
    };
    let code = code.strip_suffix('\n').unwrap_or(code);

    Segment::Code {
        language: language.to_string(),
        code: code.to_string(),
    }
}

fn is_language_tag(tag: &str) -> bool {
    tag.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '#' | '.' | '-'))
}
