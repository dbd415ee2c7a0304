// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{path::Path, time::Duration};

use miette::{IntoDiagnostic, WrapErr};
use serde::{Deserialize, Serialize};

use crate::{BUFFER_MAX_SIZE, HISTORY_MAX_SIZE, MAX_AUDIT_LENGTH, StreamEncoding};

pub const DEFAULT_SINK_TIMEOUT_MS: u64 = 10_000;

/// Tunables for one audited session. Every field is optional in the JSON form:
///
/// ```json
/// { "max_audit_length": 32768, "stream_encoding": "raw" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    pub buffer_max_size: usize,
    pub history_max_size: usize,
    pub max_audit_length: usize,
    pub sink_timeout_ms: u64,
    pub stream_encoding: StreamEncoding,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            buffer_max_size: BUFFER_MAX_SIZE,
            history_max_size: HISTORY_MAX_SIZE,
            max_audit_length: MAX_AUDIT_LENGTH,
            sink_timeout_ms: DEFAULT_SINK_TIMEOUT_MS,
            stream_encoding: StreamEncoding::default(),
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn sink_timeout(&self) -> Duration { Duration::from_millis(self.sink_timeout_ms) }

    /// # Errors
    ///
    /// Returns an error if the file can't be read or isn't valid JSON for this type.
    pub fn try_load_from_file(path: impl AsRef<Path>) -> miette::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Can't read session config {}", path.display()))?;
        serde_json::from_str(&contents)
            .into_diagnostic()
            .wrap_err_with(|| format!("Invalid session config {}", path.display()))
    }
}
