// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::ops::Add;

use tracing::dispatcher;

use crate::{DisplayPreference, TracingConfig, WriterConfig, ok};

/// Both [`try_initialize_logging_global`] and [`try_initialize_logging_thread_local`]
/// receive `impl Into<TracingConfig>`, so callers can pass whichever piece of the config
/// they care about and compose the rest with `+`:
///
/// ```no_run
/// use shell_audit::{DisplayPreference, TracingConfig, WriterConfig,
///                   try_initialize_logging_global};
///
/// let level: TracingConfig = tracing_core::LevelFilter::INFO.into();
/// let file: TracingConfig = WriterConfig::File("audit.log".to_string()).into();
/// let display: TracingConfig = DisplayPreference::Stderr.into();
///
/// try_initialize_logging_global(level + file + display).ok();
/// ```
pub mod tracing_config_options {
    use super::{Add, DisplayPreference, TracingConfig, WriterConfig};

    pub const DEFAULT_LOG_FILE_NAME: &str = "shell_audit.log";

    impl From<tracing::Level> for TracingConfig {
        fn from(level: tracing::Level) -> Self {
            Self {
                level_filter: level.into(),
                writer_config: WriterConfig::File(DEFAULT_LOG_FILE_NAME.to_string()),
            }
        }
    }

    impl From<tracing_core::LevelFilter> for TracingConfig {
        fn from(level_filter: tracing_core::LevelFilter) -> Self {
            Self {
                level_filter,
                writer_config: WriterConfig::File(DEFAULT_LOG_FILE_NAME.to_string()),
            }
        }
    }

    impl From<DisplayPreference> for TracingConfig {
        fn from(preferred_display: DisplayPreference) -> Self {
            Self {
                level_filter: tracing_core::LevelFilter::DEBUG,
                writer_config: WriterConfig::Display(preferred_display),
            }
        }
    }

    impl From<WriterConfig> for TracingConfig {
        fn from(writer_config: WriterConfig) -> Self {
            Self {
                level_filter: tracing_core::LevelFilter::DEBUG,
                writer_config,
            }
        }
    }

    /// The more verbose level filter wins. Writer configs merge per [`WriterConfig`]'s
    /// `Add` impl.
    impl Add<TracingConfig> for TracingConfig {
        type Output = Self;

        fn add(self, rhs: Self) -> Self::Output {
            Self {
                level_filter: self.level_filter.max(rhs.level_filter),
                writer_config: self.writer_config + rhs.writer_config,
            }
        }
    }

    /// The `rhs` has higher specificity: on a collision it clobbers `self`.
    /// - `Display(a) + File(f) = DisplayAndFile(a, f)`.
    /// - `Display(a) + Display(b) = Display(b)`.
    /// - `DisplayAndFile(a, f) + File(g) = DisplayAndFile(a, g)`.
    impl Add<WriterConfig> for WriterConfig {
        type Output = Self;

        fn add(self, rhs: WriterConfig) -> Self::Output {
            use WriterConfig::{Display, DisplayAndFile, File, None};

            match (self, rhs) {
                (None, rhs) => rhs,
                (lhs, None) => lhs,
                (Display(dp_lhs), File(f_rhs)) => DisplayAndFile(dp_lhs, f_rhs),
                (File(f_lhs), Display(dp_rhs)) => DisplayAndFile(dp_rhs, f_lhs),
                (Display(_) | File(_), rhs @ (Display(_) | File(_))) => rhs,
                (Display(_) | File(_), rhs @ DisplayAndFile(..)) => rhs,
                (DisplayAndFile(_, f_lhs), Display(dp_rhs)) => DisplayAndFile(dp_rhs, f_lhs),
                (DisplayAndFile(dp_lhs, _), File(f_rhs)) => DisplayAndFile(dp_lhs, f_rhs),
                (DisplayAndFile(..), rhs @ DisplayAndFile(..)) => rhs,
            }
        }
    }
}

/// Global default subscriber, which once set, can't be unset or changed. Use this in
/// binaries.
///
/// Logging is **disabled** if the level filter is [`tracing_core::LevelFilter::OFF`].
///
/// # Errors
///
/// Returns an error if the log file can't be created or a global subscriber is already
/// installed.
pub fn try_initialize_logging_global(
    options: impl Into<TracingConfig>,
) -> miette::Result<()> {
    let it: TracingConfig = options.into();

    if matches!(it.get_level_filter(), tracing_core::LevelFilter::OFF) {
        return ok!();
    }

    it.install_global()
}

/// Thread local subscriber, active until the returned guard is dropped. Use this in
/// tests, so that each test can pick its own level and output.
///
/// Returns `Ok(None)` if the level filter is [`tracing_core::LevelFilter::OFF`].
///
/// # Errors
///
/// Returns an error if the log file can't be created.
pub fn try_initialize_logging_thread_local(
    options: impl Into<TracingConfig>,
) -> miette::Result<Option<dispatcher::DefaultGuard>> {
    let it: TracingConfig = options.into();

    if matches!(it.get_level_filter(), tracing_core::LevelFilter::OFF) {
        return Ok(None);
    }

    it.install_thread_local().map(Some)
}
