//! Data Room Core
//!
//! Session-scoped state for the conversational data-analysis service: the
//! per-session dataset store, the bounded conversation log, the dataset model
//! with its CSV/Excel loaders, and application configuration.
//!
//! The dataset store and the context log are keyed by the same session id but
//! are deliberately independent: clearing one never touches the other.

pub mod clock;
pub mod config;
pub mod context;
pub mod dataset;
pub mod error;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AppConfig, LogFormat};
pub use context::{ContextLog, ContextSessionInfo, ConversationEntry};
pub use dataset::{Dataset, FileKind, GroupedSums};
pub use error::{ConfigError, DataError};
pub use store::{FileValidation, SchemaSummary, SessionStore, ALLOWED_EXTENSIONS, MAX_FILE_SIZE};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_store_and_log_are_independent() {
        let store = SessionStore::new();
        let log = ContextLog::default();

        store.store_dataframe("s1", Dataset::from_csv_bytes(b"a\n1\n".to_vec()).unwrap());
        log.add_message("s1", "q", "a", json!({}));

        assert!(store.clear_session("s1"));
        assert!(!store.has_data("s1"));
        assert_eq!(log.get_context("s1").len(), 1);

        log.add_message("s2", "q", "a", json!({}));
        assert!(log.clear_session("s2"));
        assert!(!store.has_data("s2"));
    }
}
