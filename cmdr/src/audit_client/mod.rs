// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach files.
pub mod http_audit_sink;
pub mod http_client;

// Re-export.
pub use http_audit_sink::*;
pub use http_client::*;
