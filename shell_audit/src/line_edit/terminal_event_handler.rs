// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{LineEditResult, SearchDirection};

/// The calls a terminal input parser makes while it decodes a keystroke stream. One
/// method per editing command, named after what the key does rather than which key it
/// is, so that different key bindings (`Ctrl+A`, `Home`, `ESC [ 1 ~`) land on the same
/// operation.
///
/// Implementations must keep their state consistent when an operation fails: the
/// caller logs the error and carries on with the next byte.
pub trait TerminalEventHandler {
    /// A printable byte. Inserted at the cursor, or appended to the search query while
    /// [`Self::search_direction`] is `Some`.
    fn print(&mut self, byte: u8) -> LineEditResult<()>;

    /// A C0 control byte (`0x00..=0x1F` and `0x7F`). Routes to the operation bound to
    /// it.
    fn execute(&mut self, byte: u8) -> LineEditResult<()>;

    /// Completes the line.
    fn enter(&mut self) -> LineEditResult<()>;

    fn move_forward_character(&mut self) -> LineEditResult<()>;
    fn move_backward_character(&mut self) -> LineEditResult<()>;
    fn move_forward_word(&mut self) -> LineEditResult<()>;
    fn move_backward_word(&mut self) -> LineEditResult<()>;
    fn move_line_head(&mut self) -> LineEditResult<()>;
    fn move_line_end(&mut self) -> LineEditResult<()>;

    /// `Ctrl+D`: deletes under the cursor, or closes the session on an empty line.
    fn remove_forward_character_or_close(&mut self) -> LineEditResult<()>;
    /// `Delete`: never closes.
    fn remove_forward_character(&mut self) -> LineEditResult<()>;
    fn remove_backward_character(&mut self) -> LineEditResult<()>;
    fn remove_forward_word(&mut self) -> LineEditResult<()>;
    fn remove_backward_word(&mut self) -> LineEditResult<()>;
    fn remove_forward_all(&mut self) -> LineEditResult<()>;
    fn remove_backward_all(&mut self) -> LineEditResult<()>;
    fn swap_last_two_character(&mut self) -> LineEditResult<()>;

    fn set_mark(&mut self) -> LineEditResult<()>;
    /// `Ctrl+X Ctrl+X`: exchanges cursor and mark.
    fn double_x(&mut self) -> LineEditResult<()>;

    /// Recalls the `n`th older history entry.
    fn previous_command(&mut self, n: usize) -> LineEditResult<()>;
    /// Recalls the `n`th newer history entry.
    fn next_command(&mut self, n: usize) -> LineEditResult<()>;

    /// `Ctrl+R` pressed. Starts a reverse search, or steps to the next older hit.
    fn begin_reverse_search(&mut self) -> LineEditResult<()>;
    /// `Ctrl+S` pressed. Starts a forward search, or steps to the next newer hit.
    fn begin_search(&mut self) -> LineEditResult<()>;
    /// Appends `byte` to the reverse search query.
    fn reverse_search(&mut self, byte: u8) -> LineEditResult<()>;
    /// Appends `byte` to the forward search query.
    fn search(&mut self, byte: u8) -> LineEditResult<()>;
    fn quit_search_mode(&mut self) -> LineEditResult<()>;

    /// `Ctrl+C`: abandons the line without recording it.
    fn clean(&mut self) -> LineEditResult<()>;
    /// Back to a fresh prompt: empty line, no search, no recalled history entry.
    fn reset(&mut self) -> LineEditResult<()>;
    /// Ends the session. Idempotent.
    fn close(&mut self) -> LineEditResult<()>;

    /// `Some` while an incremental search is active.
    fn search_direction(&self) -> Option<SearchDirection>;
}
