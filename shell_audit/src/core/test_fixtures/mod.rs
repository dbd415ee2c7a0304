// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Fixtures shared by the unit tests in this crate and by downstream crates' tests.

// Attach sources.
pub mod audit_sink_fixtures;
pub mod mock_socket;
pub mod ws_frame_fixtures;

// Re-export.
pub use audit_sink_fixtures::*;
pub use mock_socket::*;
pub use ws_frame_fixtures::*;
