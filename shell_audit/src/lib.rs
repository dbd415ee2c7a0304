// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! # Introduction
//!
//! Interactive shells opened through a proxy (`kubectl exec`, terminal over websocket)
//! have to be audited, but the only thing the proxy sees is the raw keystroke stream
//! that the client sends to the PTY. That stream is a visual protocol: cursor moves,
//! inserts, deletes, history recall (<kbd>Up</kbd>), incremental search
//! (<kbd>Ctrl+R</kbd>). This crate replays those keystrokes against a minimal line
//! editor to recover the command that was actually executed when the user pressed
//! <kbd>Enter</kbd>.
//!
//! ```text
//! raw bytes ─► FrameDecoder ─► vte::Parser ─► VtInputPerformer ─► Dispatcher
//!                                                                   │
//!                                     EditBuffer / CommandHistory ◄─┤
//!                                                                   ▼ CommandRecord
//!                              AuditSink ◄── SessionAccumulator task ◄── mpsc
//! ```
//!
//! # Modules
//!
//! - [`mod@line_edit`]: [`EditBuffer`], [`CommandHistory`] and the [`Dispatcher`] which
//!   implements [`TerminalEventHandler`].
//! - [`mod@session`]: [`SessionTranscript`], [`SessionConfig`], the [`AuditSink`] trait
//!   and the accumulator task.
//! - [`mod@hijack`]: the boundary with the host. [`HijackAdapter`] owns one session and
//!   [`AuditedReader`] tees any [`tokio::io::AsyncRead`] into it.
//! - [`mod@core`]: logging setup and test fixtures.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use shell_audit::{HijackAdapter, SessionConfig, SessionMeta, TracingAuditSink};
//!
//! # async fn run() {
//! let (shutdown_sender, _) = tokio::sync::broadcast::channel(1);
//! let (adapter, join_handle) = HijackAdapter::start(
//!     SessionMeta::new_with_session_id(),
//!     Arc::new(TracingAuditSink),
//!     &SessionConfig::default(),
//!     shutdown_sender.subscribe(),
//! );
//! # let mut adapter = adapter;
//! adapter.feed(b"ls -la\r");
//! adapter.close();
//! let stats = join_handle.await;
//! # }
//! ```

// Enforce strict error handling in production library code only. Tests are allowed to
// use .unwrap() (workspace `Cargo.toml` config allows it).
#![cfg_attr(not(test), deny(clippy::unwrap_in_result))]

// Attach.
pub mod core;
pub mod hijack;
pub mod line_edit;
pub mod session;

// Re-export.
pub use core::*;
pub use hijack::*;
pub use line_edit::*;
pub use session::*;
pub use shell_audit_schema::{AuditCreateRequest, AuditRecord, SessionMeta};
