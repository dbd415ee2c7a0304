// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach sources.
pub mod command_history;
pub mod dispatcher;
pub mod edit_buffer;
pub mod input_sequences;
pub mod line_edit_error;
pub mod terminal_event_handler;
pub mod word_boundaries;

// Re-export.
pub use command_history::*;
pub use dispatcher::*;
pub use edit_buffer::*;
pub use line_edit_error::*;
pub use terminal_event_handler::*;
pub use word_boundaries::*;
