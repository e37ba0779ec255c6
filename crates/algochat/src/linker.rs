use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;

use crate::file_index::FileIndex;

lazy_static! {
    // Path-like tokens ending in a known source or documentation extension, or
    // in a `/README` component.
    static ref FILE_MENTION: Regex = Regex::new(
        r"(?x)
        (?:[A-Za-z0-9_.\-]+/)*
        [A-Za-z0-9_\-][A-Za-z0-9_.\-]*
        \.(?:py|scala|java|rs|js|ts|jsx|tsx|go|rb|c|h|cc|cpp|hpp|kt|thrift|proto
            |md|txt|json|yaml|yml|toml|sh|bzl|sql|gradle|xml|cfg|ini|csv)
        \b
        |
        (?:[A-Za-z0-9_.\-]+/)+README\b
        "
    )
    .unwrap();
}

/// A piece of linked text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    Text(String),
    Link {
        text: String,
        path: String,
        url: String,
    },
}

/// Rewrites mentions of known repository files into links to a repository browser.
///
/// The output is a sequence of plain and link spans, never markup, so nothing in
/// the message text is ever interpreted by the view.
#[derive(Debug, Clone)]
pub struct FileLinker {
    index: Arc<FileIndex>,
    base_url: String,
}

impl FileLinker {
    pub fn new<S: Into<String>>(index: Arc<FileIndex>, base_url: S) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { index, base_url }
    }

    pub fn index(&self) -> &FileIndex {
        &self.index
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    pub fn link(&self, text: &str) -> Vec<Span> {
        let mut spans = Vec::new();
        let mut plain = String::new();
        let mut last = 0;

        for mention in FILE_MENTION.find_iter(text) {
            let Some(record) = self.index.lookup(mention.as_str()) else {
                continue;
            };

            plain.push_str(&text[last..mention.start()]);
            if !plain.is_empty() {
                spans.push(Span::Text(std::mem::take(&mut plain)));
            }
            spans.push(Span::Link {
                text: mention.as_str().to_string(),
                path: record.file_name.clone(),
                url: self.url_for(&record.file_name),
            });
            last = mention.end();
        }

        plain.push_str(&text[last..]);
        if !plain.is_empty() {
            spans.push(Span::Text(plain));
        }
        spans
    }
}
