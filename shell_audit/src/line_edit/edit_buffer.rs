// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{LineEditError, LineEditResult, find_next_word_end, find_prev_word_start, ok};

/// Longest line (in bytes) that is tracked. Typing past this resets the line.
pub const BUFFER_MAX_SIZE: usize = 2048;

/// The line being typed, as the remote shell's line editor sees it.
///
/// Bytes are kept as sent: multi byte UTF-8 characters occupy several positions, which
/// is also how the cursor keys move over them on the wire. The cursor is a byte index
/// in `[0, len]`, where `len` means "after the last byte".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditBuffer {
    content: Vec<u8>,
    cursor: usize,
    /// Secondary cursor for `Ctrl+X Ctrl+X`.
    mark: Option<usize>,
    /// Last range removed by a word / kill operation. There is no yank, so this is only
    /// kept for inspection.
    cut_buffer: Vec<u8>,
    max_size: usize,
}

impl Default for EditBuffer {
    fn default() -> Self { Self::new(BUFFER_MAX_SIZE) }
}

impl EditBuffer {
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self {
            content: Vec::with_capacity(max_size.min(BUFFER_MAX_SIZE)),
            cursor: 0,
            mark: None,
            cut_buffer: Vec::new(),
            max_size,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] { &self.content }

    /// The line as text. Invalid UTF-8 (eg: a multi byte character cut in half by a
    /// delete) is replaced rather than dropped.
    #[must_use]
    pub fn text(&self) -> String { String::from_utf8_lossy(&self.content).into_owned() }

    #[must_use]
    pub fn len(&self) -> usize { self.content.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.content.is_empty() }

    #[must_use]
    pub fn cursor(&self) -> usize { self.cursor }

    #[must_use]
    pub fn mark(&self) -> Option<usize> { self.mark }

    #[must_use]
    pub fn cut_buffer(&self) -> &[u8] { &self.cut_buffer }

    #[must_use]
    pub fn max_size(&self) -> usize { self.max_size }

    /// Empties the line and forgets the mark.
    pub fn reset(&mut self) {
        self.content.clear();
        self.cursor = 0;
        self.mark = None;
    }

    /// Replaces the line (eg: with a history entry) and puts the cursor at its end.
    pub fn load(&mut self, line: &[u8]) {
        self.reset();
        let len = line.len().min(self.max_size);
        self.content.extend_from_slice(&line[..len]);
        self.cursor = len;
    }

    /// Moves the cursor, clamped to `[0, len]`.
    pub fn set_cursor(&mut self, cursor: usize) { self.cursor = cursor.min(self.len()); }

    /// Inserts `byte` at the cursor and advances it.
    ///
    /// # Errors
    ///
    /// [`LineEditError::OutOfLengthSize`] if the line is full. The line is reset, since
    /// whatever the shell now holds can't be tracked reliably.
    pub fn insert(&mut self, byte: u8) -> LineEditResult<()> {
        if self.len() >= self.max_size {
            self.reset();
            return Err(LineEditError::OutOfLengthSize {
                max_size: self.max_size,
            });
        }
        self.content.insert(self.cursor, byte);
        self.cursor += 1;
        ok!()
    }

    /// Deletes the byte before the cursor. Returns `false` at line head.
    pub fn remove_backward_char(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        self.content.remove(self.cursor);
        true
    }

    /// Deletes the byte under the cursor. Returns `false` at line end.
    pub fn remove_forward_char(&mut self) -> bool {
        if self.cursor >= self.len() {
            return false;
        }
        self.content.remove(self.cursor);
        true
    }

    pub fn move_forward_char(&mut self) {
        if self.cursor < self.len() {
            self.cursor += 1;
        }
    }

    pub fn move_backward_char(&mut self) { self.cursor = self.cursor.saturating_sub(1); }

    pub fn move_line_head(&mut self) { self.cursor = 0; }

    pub fn move_line_end(&mut self) { self.cursor = self.len(); }

    pub fn move_forward_word(&mut self) {
        self.cursor = find_next_word_end(&self.content, self.cursor);
    }

    pub fn move_backward_word(&mut self) {
        self.cursor = find_prev_word_start(&self.content, self.cursor);
    }

    /// `Alt+D`: deletes from the cursor to the end of the next word.
    pub fn remove_forward_word(&mut self) {
        let end = find_next_word_end(&self.content, self.cursor);
        self.cut(self.cursor, end);
    }

    /// `Ctrl+W`: deletes from the start of the previous word to the cursor.
    pub fn remove_backward_word(&mut self) {
        let start = find_prev_word_start(&self.content, self.cursor);
        self.cut(start, self.cursor);
    }

    /// `Ctrl+K`.
    pub fn remove_forward_all(&mut self) { self.cut(self.cursor, self.len()); }

    /// `Ctrl+U`.
    pub fn remove_backward_all(&mut self) { self.cut(0, self.cursor); }

    /// `Ctrl+T`. At line end the two bytes before the cursor are swapped and the cursor
    /// stays. Elsewhere the bytes on either side of the cursor are swapped and the
    /// cursor advances. Nothing happens at line head or on lines shorter than 2.
    pub fn swap_last_two_chars(&mut self) {
        let len = self.len();
        if len <= 1 || self.cursor == 0 {
            return;
        }
        if self.cursor == len {
            self.content.swap(len - 2, len - 1);
        } else {
            self.content.swap(self.cursor - 1, self.cursor);
            self.cursor = (self.cursor + 1).min(len);
        }
    }

    /// `Ctrl+@`.
    pub fn set_mark(&mut self) { self.mark = Some(self.cursor); }

    /// `Ctrl+X Ctrl+X`: swaps cursor and mark. An unset mark is line head. A stale mark
    /// (past the cursor) is reset to the cursor first, so the swap leaves the cursor put.
    pub fn exchange_cursor_and_mark(&mut self) {
        let mark = match self.mark {
            Some(mark) if mark > self.cursor => self.cursor,
            Some(mark) => mark,
            None => 0,
        };
        self.mark = Some(self.cursor);
        self.cursor = mark;
    }

    /// Removes `start..end` into the cut buffer and leaves the cursor at `start`.
    fn cut(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        self.cut_buffer = self.content.drain(start..end).collect();
        self.cursor = start;
    }
}
