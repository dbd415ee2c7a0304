// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! A word is a maximal run of non-space bytes. Both searches first skip the run of
//! spaces next to the cursor (in the direction of travel) and then scan across one word.
//! This matches `Alt+F` / `Alt+B` in bash's emacs mode, with only `' '` as a separator.

const WORD_SEPARATOR: u8 = b' ';

/// Returns the index just past the end of the next word, searching forward from
/// `cursor`. Returns `line.len()` if there is no more word.
#[must_use]
pub fn find_next_word_end(line: &[u8], cursor: usize) -> usize {
    let len = line.len();
    let mut index = cursor.min(len);

    while index < len && line[index] == WORD_SEPARATOR {
        index += 1;
    }
    while index < len && line[index] != WORD_SEPARATOR {
        index += 1;
    }

    index
}

/// Returns the index of the first byte of the previous word, searching backward from
/// `cursor`. Returns `0` if there is no previous word.
#[must_use]
pub fn find_prev_word_start(line: &[u8], cursor: usize) -> usize {
    let mut index = cursor.min(line.len());

    while index > 0 && line[index - 1] == WORD_SEPARATOR {
        index -= 1;
    }
    while index > 0 && line[index - 1] != WORD_SEPARATOR {
        index -= 1;
    }

    index
}
