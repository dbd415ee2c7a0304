// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach files.
pub mod clap_config;
pub mod replay_capture;

// Re-export.
pub use clap_config::*;
pub use replay_capture::*;
