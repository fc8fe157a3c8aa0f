//! Context Log
//!
//! Bounded, per-session conversation history used to resolve follow-up
//! questions. Each session keeps at most `max_messages` entries (oldest are
//! dropped first) and is forgotten once it has gone untouched for the TTL.
//!
//! Every call sweeps expired sessions before doing its own work. The sweep is
//! a linear scan over all sessions, which is fine for the small session counts
//! this service expects.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::clock::{Clock, SystemClock};

/// Default number of turns kept per session
pub const DEFAULT_MAX_MESSAGES: usize = 5;

/// Default idle time before a session is forgotten
pub const DEFAULT_TTL_MINUTES: i64 = 60;

/// One question/answer turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub question: String,
    pub answer: String,
    pub timestamp: DateTime<Utc>,
    pub metadata: Value,
}

/// Snapshot of a session's conversation state
#[derive(Debug, Clone, Serialize)]
pub struct ContextSessionInfo {
    pub session_id: String,
    pub message_count: usize,
    pub max_messages: usize,
    pub created_at: DateTime<Utc>,
    pub last_access: DateTime<Utc>,
    pub messages: Vec<ConversationEntry>,
}

#[derive(Debug)]
struct SessionLog {
    messages: VecDeque<ConversationEntry>,
    created_at: DateTime<Utc>,
    last_access: DateTime<Utc>,
}

/// Per-session conversation history with FIFO capacity and TTL expiry
pub struct ContextLog {
    sessions: DashMap<String, SessionLog>,
    max_messages: usize,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl ContextLog {
    /// Create a log with the given window size and TTL on the system clock
    pub fn new(max_messages: usize, ttl: Duration) -> Self {
        Self::with_clock(max_messages, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(max_messages: usize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: DashMap::new(),
            max_messages: max_messages.max(1),
            ttl,
            clock,
        }
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    /// Append a turn, evicting the oldest one when the window is full
    pub fn add_message(&self, session_id: &str, question: &str, answer: &str, metadata: Value) {
        self.cleanup_expired_sessions();

        let now = self.clock.now();
        let mut log = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                debug!(session_id, "Created context session");
                SessionLog {
                    messages: VecDeque::with_capacity(self.max_messages),
                    created_at: now,
                    last_access: now,
                }
            });

        if log.messages.len() == self.max_messages {
            log.messages.pop_front();
        }
        log.messages.push_back(ConversationEntry {
            question: question.to_string(),
            answer: answer.to_string(),
            timestamp: now,
            metadata,
        });
        log.last_access = now;
    }

    /// Entries for the session, oldest first; empty if the session is unknown
    pub fn get_context(&self, session_id: &str) -> Vec<ConversationEntry> {
        self.cleanup_expired_sessions();

        match self.sessions.get_mut(session_id) {
            Some(mut log) => {
                log.last_access = self.clock.now();
                log.messages.iter().cloned().collect()
            }
            None => Vec::new(),
        }
    }

    /// Forget the session; returns whether it existed
    pub fn clear_session(&self, session_id: &str) -> bool {
        self.cleanup_expired_sessions();
        self.sessions.remove(session_id).is_some()
    }

    /// Number of live sessions
    pub fn session_count(&self) -> usize {
        self.cleanup_expired_sessions();
        self.sessions.len()
    }

    /// Inspect a session without refreshing its access time
    pub fn session_info(&self, session_id: &str) -> Option<ContextSessionInfo> {
        self.cleanup_expired_sessions();

        self.sessions.get(session_id).map(|log| ContextSessionInfo {
            session_id: session_id.to_string(),
            message_count: log.messages.len(),
            max_messages: self.max_messages,
            created_at: log.created_at,
            last_access: log.last_access,
            messages: log.messages.iter().cloned().collect(),
        })
    }

    /// Remove sessions idle for at least the TTL
    fn cleanup_expired_sessions(&self) {
        let now = self.clock.now();
        let before = self.sessions.len();
        self.sessions
            .retain(|_, log| now - log.last_access < self.ttl);

        let expired = before.saturating_sub(self.sessions.len());
        if expired > 0 {
            debug!("Expired {} idle context sessions", expired);
        }
    }
}

impl Default for ContextLog {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MESSAGES, Duration::minutes(DEFAULT_TTL_MINUTES))
    }
}

impl std::fmt::Debug for ContextLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextLog")
            .field("sessions", &self.sessions.len())
            .field("max_messages", &self.max_messages)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use serde_json::json;

    fn log_with_clock(max: usize, ttl_minutes: i64) -> (ContextLog, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let log = ContextLog::with_clock(max, Duration::minutes(ttl_minutes), clock.clone());
        (log, clock)
    }

    #[test]
    fn test_unknown_session_is_empty() {
        let log = ContextLog::default();
        assert!(log.get_context("nobody").is_empty());
        assert_eq!(log.session_count(), 0);
    }

    #[test]
    fn test_entries_are_ordered_oldest_first() {
        let log = ContextLog::default();
        log.add_message("s1", "q1", "a1", json!({}));
        log.add_message("s1", "q2", "a2", json!({"chart_type": "bar"}));

        let context = log.get_context("s1");
        assert_eq!(context.len(), 2);
        assert_eq!(context[0].question, "q1");
        assert_eq!(context[1].answer, "a2");
        assert_eq!(context[1].metadata["chart_type"], "bar");
    }

    #[test]
    fn test_window_keeps_most_recent() {
        let log = ContextLog::new(5, Duration::minutes(60));
        for i in 0..8 {
            log.add_message("s1", &format!("q{}", i), &format!("a{}", i), json!({}));
        }

        let context = log.get_context("s1");
        let questions: Vec<&str> = context.iter().map(|e| e.question.as_str()).collect();
        assert_eq!(questions, vec!["q3", "q4", "q5", "q6", "q7"]);
    }

    #[test]
    fn test_sessions_are_isolated() {
        let log = ContextLog::default();
        log.add_message("s1", "q", "a", json!({}));
        log.add_message("s2", "other", "b", json!({}));

        assert_eq!(log.get_context("s1").len(), 1);
        assert_eq!(log.get_context("s2")[0].question, "other");
        assert_eq!(log.session_count(), 2);
    }

    #[test]
    fn test_clear_session() {
        let log = ContextLog::default();
        log.add_message("s1", "q", "a", json!({}));

        assert!(log.clear_session("s1"));
        assert!(log.get_context("s1").is_empty());
        assert!(!log.clear_session("s1"));
    }

    #[test]
    fn test_idle_session_expires() {
        let (log, clock) = log_with_clock(5, 60);
        log.add_message("s1", "q", "a", json!({}));

        clock.advance(Duration::minutes(59));
        assert_eq!(log.get_context("s1").len(), 1);

        // the read above refreshed the session
        clock.advance(Duration::minutes(59));
        assert_eq!(log.get_context("s1").len(), 1);

        clock.advance(Duration::minutes(61));
        assert!(log.get_context("s1").is_empty());
        assert!(log.session_info("s1").is_none());
    }

    #[test]
    fn test_expiry_sweeps_other_sessions() {
        let (log, clock) = log_with_clock(5, 60);
        log.add_message("stale", "q", "a", json!({}));
        clock.advance(Duration::minutes(90));

        log.add_message("fresh", "q", "a", json!({}));
        assert_eq!(log.session_count(), 1);
        assert!(log.session_info("stale").is_none());
    }

    #[test]
    fn test_zero_ttl_expires_on_next_call() {
        let log = ContextLog::new(5, Duration::zero());
        log.add_message("s1", "q", "a", json!({}));
        assert!(log.get_context("s1").is_empty());
    }

    #[test]
    fn test_session_info() {
        let (log, clock) = log_with_clock(3, 60);
        assert!(log.session_info("s1").is_none());

        log.add_message("s1", "q1", "a1", json!({}));
        clock.advance(Duration::minutes(5));
        log.add_message("s1", "q2", "a2", json!({}));

        let info = log.session_info("s1").unwrap();
        assert_eq!(info.message_count, 2);
        assert_eq!(info.max_messages, 3);
        assert_eq!(info.last_access - info.created_at, Duration::minutes(5));
        assert_eq!(info.messages[1].question, "q2");
    }
}
