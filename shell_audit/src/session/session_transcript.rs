// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::time::SystemTime;

use crate::CommandRecord;

/// Transcript size (bytes) after which a chunk is flushed to the audit sink.
pub const MAX_AUDIT_LENGTH: usize = 65536;

/// One flushed piece of a session transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptChunk {
    pub commands: String,
    pub started_at: SystemTime,
    pub ended_at: SystemTime,
}

/// Commands executed so far in a session, as `"\n{timestamp}: {text}"` lines.
///
/// A chunk may exceed `limit` by at most one record: the limit is checked after each
/// append and the owner flushes as soon as it is crossed.
#[derive(Debug, Clone)]
pub struct SessionTranscript {
    accumulated: String,
    limit: usize,
    started_at: Option<SystemTime>,
}

impl Default for SessionTranscript {
    fn default() -> Self { Self::new(MAX_AUDIT_LENGTH) }
}

impl SessionTranscript {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            accumulated: String::new(),
            limit,
            started_at: None,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize { self.accumulated.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.accumulated.is_empty() }

    #[must_use]
    pub fn as_str(&self) -> &str { &self.accumulated }

    /// Appends `record`. Returns `true` once the transcript is over its limit and should
    /// be flushed.
    pub fn push(&mut self, record: &CommandRecord) -> bool {
        self.started_at.get_or_insert_with(SystemTime::now);
        self.accumulated.push('\n');
        self.accumulated.push_str(&record.to_string());
        self.accumulated.len() > self.limit
    }

    /// Empties the transcript and returns what it held. `None` if there is nothing to
    /// flush.
    pub fn take(&mut self) -> Option<TranscriptChunk> {
        if self.accumulated.is_empty() {
            return None;
        }
        let ended_at = SystemTime::now();
        Some(TranscriptChunk {
            commands: std::mem::take(&mut self.accumulated),
            started_at: self.started_at.take().unwrap_or(ended_at),
            ended_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    fn record(text: &str) -> CommandRecord {
        CommandRecord {
            timestamp: chrono::Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            text: text.into(),
        }
    }

    #[test]
    fn test_push_formats_lines() {
        let mut transcript = SessionTranscript::default();
        assert!(!transcript.push(&record("ls")));
        assert!(!transcript.push(&record("pwd")));

        assert_eq!(
            transcript.as_str(),
            "\n2024-01-02 03:04:05: ls\n2024-01-02 03:04:05: pwd"
        );
    }

    #[test]
    fn test_push_reports_when_over_limit() {
        // Each line is 1 + 19 + 2 + 2 = 24 bytes.
        let mut transcript = SessionTranscript::new(40);
        assert!(!transcript.push(&record("ab")));
        assert!(transcript.push(&record("cd")));
        assert_eq!(transcript.len(), 48);
    }

    #[test]
    fn test_take_resets() {
        let mut transcript = SessionTranscript::default();
        assert_eq!(transcript.take(), None);

        transcript.push(&record("ls"));
        let chunk = transcript.take().unwrap();
        assert_eq!(chunk.commands, "\n2024-01-02 03:04:05: ls");
        assert!(chunk.started_at <= chunk.ended_at);

        assert!(transcript.is_empty());
        assert_eq!(transcript.take(), None);
    }
}
