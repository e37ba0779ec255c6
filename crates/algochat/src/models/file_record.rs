use serde::{Deserialize, Deserializer, Serialize};

/// A known repository file, as listed in the corpus summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub file_name: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_count"
    )]
    pub n_tokens: Option<u64>,
}

impl FileRecord {
    pub fn new<S: Into<String>>(file_name: S) -> Self {
        FileRecord {
            file_name: file_name.into(),
            n_tokens: None,
        }
    }

    /// The last path component, `src/foo.py` -> `foo.py`
    pub fn basename(&self) -> &str {
        self.file_name
            .rsplit('/')
            .next()
            .unwrap_or(self.file_name.as_str())
    }
}

// Lookup tables produced by CSV-to-JSON converters carry every column as a string.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u64),
        Text(String),
    }

    match Option::<Count>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Count::Number(n)) => Ok(Some(n)),
        Some(Count::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Count::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
