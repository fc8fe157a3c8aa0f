//! Session Store
//!
//! Owns the uploaded dataset of each session until it is replaced or cleared.
//! Independent of the context log: either may exist without the other.

use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::dataset::{extension_of, Dataset, FileKind};
use crate::error::Result;

/// Maximum accepted upload size in bytes (10MB)
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Accepted upload extensions
pub const ALLOWED_EXTENSIONS: [&str; 3] = [".csv", ".xlsx", ".xls"];

/// Number of rows included in a schema summary sample
const SAMPLE_ROWS: usize = 3;

/// Outcome of upload validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileValidation {
    Valid,
    Invalid(String),
}

impl FileValidation {
    pub fn is_valid(&self) -> bool {
        matches!(self, FileValidation::Valid)
    }

    /// Human-readable rejection reason, empty when valid
    pub fn reason(&self) -> &str {
        match self {
            FileValidation::Valid => "",
            FileValidation::Invalid(reason) => reason,
        }
    }
}

/// Schema overview of a stored dataset
#[derive(Debug, Clone, Serialize)]
pub struct SchemaSummary {
    pub columns: Vec<String>,
    pub dtypes: Map<String, Value>,
    pub row_count: usize,
    pub sample: Vec<Map<String, Value>>,
}

/// Per-session dataset storage
#[derive(Debug, Default)]
pub struct SessionStore {
    frames: DashMap<String, Arc<Dataset>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check an upload by extension first, then by size
    pub fn validate_file(filename: &str, size: usize) -> FileValidation {
        let ext = extension_of(filename);
        if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
            return FileValidation::Invalid(format!(
                "Invalid file type. Allowed: {}",
                ALLOWED_EXTENSIONS.join(", ")
            ));
        }

        if size > MAX_FILE_SIZE {
            return FileValidation::Invalid(format!(
                "File too large. Maximum size: {}MB",
                MAX_FILE_SIZE / (1024 * 1024)
            ));
        }

        FileValidation::Valid
    }

    /// Load a dataset from disk, choosing the parser by extension
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Dataset> {
        let path = path.as_ref();
        let kind = FileKind::from_name(&path.to_string_lossy())?;
        debug!("Loading {:?} as {:?}", path, kind);
        let bytes = std::fs::read(path)?;
        Dataset::from_bytes(kind, bytes)
    }

    /// Load a dataset from an in-memory upload
    pub fn load_bytes(filename: &str, bytes: Vec<u8>) -> Result<Dataset> {
        let kind = FileKind::from_name(filename)?;
        debug!("Loading upload '{}' ({} bytes) as {:?}", filename, bytes.len(), kind);
        Dataset::from_bytes(kind, bytes)
    }

    /// Store a dataset, replacing any previous one for the session
    pub fn store_dataframe(&self, session_id: &str, dataset: Dataset) {
        let replaced = self
            .frames
            .insert(session_id.to_string(), Arc::new(dataset))
            .is_some();
        info!(session_id, replaced, "Stored dataset");
    }

    pub fn get_dataframe(&self, session_id: &str) -> Option<Arc<Dataset>> {
        self.frames.get(session_id).map(|entry| entry.value().clone())
    }

    pub fn has_data(&self, session_id: &str) -> bool {
        self.frames.contains_key(session_id)
    }

    /// Drop the session's dataset; returns whether one existed
    pub fn clear_session(&self, session_id: &str) -> bool {
        let removed = self.frames.remove(session_id).is_some();
        if removed {
            info!(session_id, "Cleared dataset");
        }
        removed
    }

    /// Number of sessions holding a dataset
    pub fn session_count(&self) -> usize {
        self.frames.len()
    }

    pub fn get_schema_summary(&self, session_id: &str) -> Option<SchemaSummary> {
        let dataset = self.get_dataframe(session_id)?;

        let dtypes = dataset
            .dtypes()
            .into_iter()
            .map(|(name, dtype)| (name, Value::String(dtype)))
            .collect();

        Some(SchemaSummary {
            columns: dataset.column_names(),
            dtypes,
            row_count: dataset.height(),
            sample: dataset.sample_records(SAMPLE_ROWS),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DataError;
    use std::io::Write;

    fn csv(rows: &str) -> Dataset {
        Dataset::from_csv_bytes(rows.as_bytes().to_vec()).unwrap()
    }

    #[test]
    fn test_validate_accepts_allowed_extensions() {
        for name in ["data.csv", "report.xlsx", "legacy.xls", "UPPER.CSV"] {
            assert!(SessionStore::validate_file(name, 1024).is_valid(), "{}", name);
        }
    }

    #[test]
    fn test_validate_rejects_extension_before_size() {
        let outcome = SessionStore::validate_file("notes.txt", MAX_FILE_SIZE * 2);
        assert!(!outcome.is_valid());
        assert!(outcome.reason().starts_with("Invalid file type"));
        assert!(outcome.reason().contains(".csv"));
    }

    #[test]
    fn test_validate_rejects_oversize() {
        let outcome = SessionStore::validate_file("data.csv", MAX_FILE_SIZE + 1);
        assert_eq!(
            outcome,
            FileValidation::Invalid("File too large. Maximum size: 10MB".to_string())
        );
        assert!(SessionStore::validate_file("data.csv", MAX_FILE_SIZE).is_valid());
    }

    #[test]
    fn test_store_replaces_dataset() {
        let store = SessionStore::new();
        store.store_dataframe("s1", csv("a\n1\n"));
        store.store_dataframe("s1", csv("b,c\n1,2\n3,4\n"));

        let dataset = store.get_dataframe("s1").unwrap();
        assert_eq!(dataset.column_names(), vec!["b", "c"]);
        assert_eq!(dataset.height(), 2);
        assert_eq!(store.session_count(), 1);
    }

    #[test]
    fn test_clear_session() {
        let store = SessionStore::new();
        store.store_dataframe("s1", csv("a\n1\n"));

        assert!(store.has_data("s1"));
        assert!(store.clear_session("s1"));
        assert!(!store.has_data("s1"));
        assert!(store.get_dataframe("s1").is_none());
        assert!(!store.clear_session("s1"));
    }

    #[test]
    fn test_schema_summary() {
        let store = SessionStore::new();
        assert!(store.get_schema_summary("missing").is_none());

        store.store_dataframe("s1", csv("region,sales\nA,10\nB,20\nA,5\nC,1\n"));
        let summary = store.get_schema_summary("s1").unwrap();

        assert_eq!(summary.columns, vec!["region", "sales"]);
        assert_eq!(summary.row_count, 4);
        assert_eq!(summary.sample.len(), 3);
        assert!(summary.dtypes.contains_key("sales"));
    }

    #[test]
    fn test_load_file_csv() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(b"name,value\nx,1\ny,2\n").unwrap();

        let dataset = SessionStore::load_file(file.path()).unwrap();
        assert_eq!(dataset.height(), 2);
        assert_eq!(dataset.column_names(), vec!["name", "value"]);
    }

    #[test]
    fn test_load_file_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        assert!(matches!(
            SessionStore::load_file(file.path()),
            Err(DataError::UnsupportedFileType(_))
        ));
    }

    #[test]
    fn test_load_bytes_malformed_excel() {
        let result = SessionStore::load_bytes("book.xlsx", b"plain text".to_vec());
        match result {
            Err(e) => assert!(e.to_string().starts_with("Error reading Excel file")),
            Ok(_) => panic!("garbage should not parse as a workbook"),
        }
    }

    #[test]
    fn test_load_bytes_empty_csv() {
        assert!(matches!(
            SessionStore::load_bytes("empty.csv", Vec::new()),
            Err(DataError::Csv(_))
        ));
    }
}
