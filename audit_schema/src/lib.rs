// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! # Introduction
//!
//! This crate is a shared dependency of `shell_audit` and the audit backend that stores
//! session transcripts. It describes the data structures that are sent over the wire when
//! an interactive shell session is audited:
//!
//! 1. [`SessionMeta`] is supplied by the host that intercepts the connection (who is
//!    connected, to which cluster / namespace / pod / container, from where).
//! 2. [`AuditRecord`] is one flushed chunk of the session transcript along with the
//!    session metadata.
//! 3. [`AuditCreateRequest`] is the JSON body that the audit backend expects.
//!
//! All types serialize in `camelCase` to match the backend's API.

// Attach.
pub mod audit_data;

// Re-export.
pub use audit_data::*;
