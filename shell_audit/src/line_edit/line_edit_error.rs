// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

/// Failures of a single line editing operation. None of these end the session: the
/// [`crate::Dispatcher`] leaves its state consistent (an overflow resets the buffer) and
/// the caller logs and keeps feeding input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum LineEditError {
    /// An insert (or search byte) would grow the line past its capacity.
    #[error("line exceeds max size of {max_size} bytes")]
    #[diagnostic(
        code(shell_audit::line_edit::out_of_length_size),
        help("The line was reset. Input that never ends in Enter can't be audited.")
    )]
    OutOfLengthSize { max_size: usize },

    /// History positions are 1 based: 1 is the newest entry.
    #[error("history index {index} out of range [1, {size}]")]
    #[diagnostic(code(shell_audit::line_edit::history_index_out_of_range))]
    HistoryIndexOutOfRange { index: usize, size: usize },
}

pub type LineEditResult<T> = Result<T, LineEditError>;
