// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Command line tools for [`shell_audit`].
//!
//! # audit-replay
//!
//! Replays a captured session through the same pipeline a proxy would run on a live
//! connection, and stores the recovered commands.
//!
//! ```text
//! audit-replay session.bin --endpoint https://audit.example.com/api/audits \
//!     --cluster prod-east --namespace payments --resource api-7d9f --user-id 1001
//! ```
//!
//! - Without `--endpoint` the audit records are written to the log.
//! - `--encoding raw` replays a plain PTY capture instead of `kubectl exec` websocket
//!   frames.
//!
//! # Modules
//!
//! - [`mod@audit_client`]: [`HttpAuditSink`], an [`shell_audit::AuditSink`] that POSTs
//!   to the audit backend.
//! - [`mod@replay`]: CLI args and the replay loop.

// https://github.com/rust-lang/rust-clippy
// https://rust-lang.github.io/rust-clippy/master/index.html
#![warn(clippy::all)]
#![warn(clippy::unwrap_in_result)]
#![warn(rust_2018_idioms)]
#![warn(clippy::doc_markdown)]
#![warn(clippy::redundant_closure_for_method_calls)]
#![warn(clippy::semicolon_if_nothing_returned)]
#![warn(clippy::must_use_candidate)]
#![warn(clippy::manual_let_else)]
#![warn(clippy::unnecessary_wraps)]

// Attach.
pub mod audit_client;
pub mod replay;

// Re-export.
pub use audit_client::*;
pub use replay::*;
