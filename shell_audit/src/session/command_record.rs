// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::fmt::{Display, Formatter, Result as FmtResult};

use chrono::{DateTime, Local};

/// `2024-05-01 13:37:00`.
pub const RECORD_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A command the user executed, captured when Enter was pressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRecord {
    pub timestamp: DateTime<Local>,
    pub text: String,
}

impl CommandRecord {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            text: text.into(),
        }
    }
}

/// Transcript line format, without the leading newline.
impl Display for CommandRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{}: {}",
            self.timestamp.format(RECORD_TIMESTAMP_FORMAT),
            self.text
        )
    }
}
