use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::errors::ChatResult;
use crate::models::file_record::FileRecord;

/// Read-only lookup table of known repository files.
///
/// Lookups match either the full path or the basename of a record. Full-path
/// matches win; among records sharing a basename the first one in table order
/// is used.
#[derive(Debug, Clone, Default)]
pub struct FileIndex {
    records: Vec<FileRecord>,
    by_path: HashMap<String, usize>,
    by_basename: HashMap<String, usize>,
}

impl FileIndex {
    pub fn new(records: Vec<FileRecord>) -> Self {
        let mut by_path = HashMap::new();
        let mut by_basename = HashMap::new();
        for (i, record) in records.iter().enumerate() {
            by_path.entry(record.file_name.clone()).or_insert(i);
            by_basename.entry(record.basename().to_string()).or_insert(i);
        }

        Self {
            records,
            by_path,
            by_basename,
        }
    }

    /// Parse a corpus summary CSV. A `file_name` column is required, other
    /// columns besides `n_tokens` are ignored.
    pub fn from_csv_reader<R: Read>(reader: R) -> ChatResult<Self> {
        let records = read_records(reader)?;
        Ok(Self::new(records))
    }

    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> ChatResult<Self> {
        let file = File::open(path)?;
        Self::from_csv_reader(file)
    }

    pub fn lookup(&self, candidate: &str) -> Option<&FileRecord> {
        self.by_path
            .get(candidate)
            .or_else(|| self.by_basename.get(candidate))
            .map(|&i| &self.records[i])
    }

    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Deserialize every row of a corpus summary CSV
pub fn read_records<R: Read>(reader: R) -> ChatResult<Vec<FileRecord>> {
    let mut reader = csv::Reader::from_reader(reader);
    let records = reader
        .deserialize()
        .collect::<Result<Vec<FileRecord>, csv::Error>>()?;
    Ok(records)
}
