// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Bytes and sequence parameters that a terminal client sends for editing keys, in
//! emacs mode.
//!
//! # C0 control bytes
//!
//! `Ctrl+<letter>` is sent as the letter's position in the alphabet, eg: `Ctrl+A` is
//! `0x01`. These arrive at [`vte::Perform::execute`].
//!
//! # CSI / SS3 sequences
//!
//! - Arrows: `ESC [ A..D` or, in application cursor mode, `ESC O A..D`.
//! - Home / End: `ESC [ H` / `ESC [ F`, or `ESC [ 1~` / `ESC [ 4~` (also `7~` / `8~` in
//!   rxvt).
//! - Delete: `ESC [ 3~`.
//! - Modified arrows: `ESC [ 1 ; m C`, where `m - 1` is a bitmask of Shift (1), Alt (2)
//!   and Ctrl (4).

// ==================== C0 control bytes ====================

/// `Ctrl+@` (`Ctrl+Space`): set the mark.
pub const CONTROL_AT: u8 = 0x00;

/// `Ctrl+A`: move to line head.
pub const CONTROL_A: u8 = 0x01;

/// `Ctrl+B`: move back one character.
pub const CONTROL_B: u8 = 0x02;

/// `Ctrl+C`: abandon the current line.
pub const CONTROL_C: u8 = 0x03;

/// `Ctrl+D`: delete forward, or end the session on an empty line.
pub const CONTROL_D: u8 = 0x04;

/// `Ctrl+E`: move to line end.
pub const CONTROL_E: u8 = 0x05;

/// `Ctrl+F`: move forward one character.
pub const CONTROL_F: u8 = 0x06;

/// `Ctrl+G`: abort incremental search.
pub const CONTROL_G: u8 = 0x07;

/// `Ctrl+H`: backspace on terminals that don't send DEL.
pub const BACKSPACE: u8 = 0x08;

pub const TAB: u8 = 0x09;

pub const LINE_FEED: u8 = 0x0A;

/// `Ctrl+K`: kill to line end.
pub const CONTROL_K: u8 = 0x0B;

/// `Ctrl+L`: clear screen. No effect on the line.
pub const CONTROL_L: u8 = 0x0C;

pub const CARRIAGE_RETURN: u8 = 0x0D;

/// `Ctrl+N`: next history entry.
pub const CONTROL_N: u8 = 0x0E;

/// `Ctrl+P`: previous history entry.
pub const CONTROL_P: u8 = 0x10;

/// `Ctrl+R`: reverse incremental search.
pub const CONTROL_R: u8 = 0x12;

/// `Ctrl+S`: forward incremental search.
pub const CONTROL_S: u8 = 0x13;

/// `Ctrl+T`: transpose characters.
pub const CONTROL_T: u8 = 0x14;

/// `Ctrl+U`: kill to line head.
pub const CONTROL_U: u8 = 0x15;

/// `Ctrl+W`: kill the word before the cursor.
pub const CONTROL_W: u8 = 0x17;

/// `Ctrl+X`: prefix key. `Ctrl+X Ctrl+X` exchanges point and mark.
pub const CONTROL_X: u8 = 0x18;

/// DEL, sent by the Backspace key on most terminals.
pub const ASCII_DEL: u8 = 0x7F;

// ==================== CSI / SS3 final bytes ====================

pub const ARROW_UP_FINAL: char = 'A';
pub const ARROW_DOWN_FINAL: char = 'B';
pub const ARROW_RIGHT_FINAL: char = 'C';
pub const ARROW_LEFT_FINAL: char = 'D';
pub const HOME_FINAL: char = 'H';
pub const END_FINAL: char = 'F';

/// `ESC [ n ~` final byte.
pub const FUNCTION_KEY_TERMINATOR: char = '~';

/// Second byte of `ESC O x` (SS3) sequences.
pub const SS3_O: u8 = b'O';

// ==================== CSI n~ codes ====================

pub const HOME_CODE: u16 = 1;
pub const DELETE_CODE: u16 = 3;
pub const END_CODE: u16 = 4;
pub const HOME_CODE_RXVT: u16 = 7;
pub const END_CODE_RXVT: u16 = 8;

/// Bracketed paste start / end markers. The pasted bytes arrive in between as prints.
pub const PASTE_START_CODE: u16 = 200;
pub const PASTE_END_CODE: u16 = 201;

// ==================== Modifier parameter values ====================

/// `ESC [ 1 ; 3 C`: Alt + arrow.
pub const MODIFIER_ALT: u16 = 3;

/// `ESC [ 1 ; 5 C`: Ctrl + arrow.
pub const MODIFIER_CTRL: u16 = 5;

// ==================== ESC + letter (Alt / Meta) ====================

pub const META_FORWARD_WORD: u8 = b'f';
pub const META_BACKWARD_WORD: u8 = b'b';
pub const META_DELETE_WORD: u8 = b'd';
