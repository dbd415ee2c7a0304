// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach sources.
pub mod frame_decoder;
pub mod hijack_adapter;
pub mod stdin_frame_decoder;
pub mod vt_input_performer;
pub mod ws_frame_decoder;

// Re-export.
pub use frame_decoder::*;
pub use hijack_adapter::*;
pub use stdin_frame_decoder::*;
pub use vt_input_performer::*;
pub use ws_frame_decoder::*;
