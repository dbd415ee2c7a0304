// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach sources.
pub mod decl_macros;
pub mod log;
pub mod test_fixtures;

// Re-export.
pub use log::*;
pub use test_fixtures::*;
