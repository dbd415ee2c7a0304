// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach sources.
pub mod audit_sink;
pub mod command_record;
pub mod session_accumulator;
pub mod session_config;
pub mod session_transcript;

// Re-export.
pub use audit_sink::*;
pub use command_record::*;
pub use session_accumulator::*;
pub use session_config::*;
pub use session_transcript::*;
