// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! [`vte::Perform`] shim for the *input* side of a terminal.
//!
//! [`vte::Parser`] was written for terminal output, but keystrokes use the same
//! grammar, so it parses them fine:
//!
//! ```text
//! ESC [ 1 ; 5 C   → csi_dispatch(params=[1, 5], action='C')  → move_forward_word
//! ESC O A         → esc_dispatch(byte='O') + print('A')      → previous_command(1)
//! ESC f           → esc_dispatch(byte='f')                   → move_forward_word
//! 0x17            → execute(0x17)                            → Dispatcher::execute
//! ```
//!
//! SS3 (`ESC O`) has no dispatch of its own in `vte`, so [`VtInputState`] remembers it
//! across calls (and across chunks) until the following byte arrives.

use vte::{Params, Perform};

use crate::{LineEditResult, TerminalEventHandler, input_sequences as keys};

/// Parser state that outlives one [`VtInputPerformer`]. Owned next to the
/// [`vte::Parser`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VtInputState {
    ss3_pending: bool,
}

impl VtInputState {
    #[must_use]
    pub fn is_ss3_pending(&self) -> bool { self.ss3_pending }
}

#[derive(Debug)]
pub struct VtInputPerformer<'a, H: TerminalEventHandler> {
    handler: &'a mut H,
    state: &'a mut VtInputState,
}

impl<'a, H: TerminalEventHandler> VtInputPerformer<'a, H> {
    pub fn new(handler: &'a mut H, state: &'a mut VtInputState) -> Self {
        Self { handler, state }
    }

    fn report(operation: &str, result: LineEditResult<()>) {
        if let Err(error) = result {
            tracing::warn!(message = "line edit operation failed", operation, error = %error);
        }
    }

    /// The letter after `ESC O`. `None` if it isn't a key we track.
    fn ss3_key(&mut self, letter: char) -> Option<LineEditResult<()>> {
        let result = match letter {
            keys::ARROW_UP_FINAL => self.handler.previous_command(1),
            keys::ARROW_DOWN_FINAL => self.handler.next_command(1),
            keys::ARROW_RIGHT_FINAL => self.handler.move_forward_character(),
            keys::ARROW_LEFT_FINAL => self.handler.move_backward_character(),
            keys::HOME_FINAL => self.handler.move_line_head(),
            keys::END_FINAL => self.handler.move_line_end(),
            _ => return None,
        };
        Some(result)
    }

    fn function_key(&mut self, code: u16) -> LineEditResult<()> {
        match code {
            keys::HOME_CODE | keys::HOME_CODE_RXVT => self.handler.move_line_head(),
            keys::END_CODE | keys::END_CODE_RXVT => self.handler.move_line_end(),
            keys::DELETE_CODE => self.handler.remove_forward_character(),
            // Pasted text between the markers arrives as ordinary prints.
            keys::PASTE_START_CODE | keys::PASTE_END_CODE => Ok(()),
            other => {
                tracing::trace!(message = "ignored function key", code = other);
                Ok(())
            }
        }
    }
}

fn is_word_modifier(modifier: u16) -> bool {
    modifier == keys::MODIFIER_ALT || modifier == keys::MODIFIER_CTRL
}

impl<H: TerminalEventHandler> Perform for VtInputPerformer<'_, H> {
    fn print(&mut self, ch: char) {
        if std::mem::take(&mut self.state.ss3_pending) {
            if let Some(result) = self.ss3_key(ch) {
                Self::report("ss3", result);
                return;
            }
        }

        // DEL is in the printable range as far as the parser is concerned.
        if ch == char::from(keys::ASCII_DEL) {
            Self::report("backspace", self.handler.remove_backward_character());
            return;
        }

        let mut utf8 = [0_u8; 4];
        for byte in ch.encode_utf8(&mut utf8).as_bytes() {
            Self::report("print", self.handler.print(*byte));
        }
    }

    fn execute(&mut self, byte: u8) {
        self.state.ss3_pending = false;
        Self::report("execute", self.handler.execute(byte));
    }

    fn csi_dispatch(
        &mut self,
        params: &Params,
        intermediates: &[u8],
        ignore: bool,
        action: char,
    ) {
        self.state.ss3_pending = false;

        if ignore {
            tracing::warn!(
                message = "CSI: discarding malformed sequence",
                action = %action
            );
            return;
        }
        if !intermediates.is_empty() {
            tracing::trace!(message = "CSI with intermediates ignored", action = %action);
            return;
        }

        let mut values = params.iter().map(|it| it.first().copied().unwrap_or(0));
        let first = values.next().unwrap_or(0);
        let modifier = values.next().unwrap_or(0);
        let count = usize::from(first.max(1));

        let result = match action {
            keys::ARROW_UP_FINAL => self.handler.previous_command(count),
            keys::ARROW_DOWN_FINAL => self.handler.next_command(count),
            keys::ARROW_RIGHT_FINAL if is_word_modifier(modifier) => {
                self.handler.move_forward_word()
            }
            keys::ARROW_RIGHT_FINAL => self.handler.move_forward_character(),
            keys::ARROW_LEFT_FINAL if is_word_modifier(modifier) => {
                self.handler.move_backward_word()
            }
            keys::ARROW_LEFT_FINAL => self.handler.move_backward_character(),
            keys::HOME_FINAL => self.handler.move_line_head(),
            keys::END_FINAL => self.handler.move_line_end(),
            keys::FUNCTION_KEY_TERMINATOR => self.function_key(first),
            other => {
                tracing::trace!(message = "ignored CSI", action = %other);
                Ok(())
            }
        };
        Self::report("csi", result);
    }

    fn esc_dispatch(&mut self, intermediates: &[u8], ignore: bool, byte: u8) {
        self.state.ss3_pending = false;

        if ignore {
            tracing::warn!(
                message = "ESC: discarding malformed sequence",
                byte = %char::from(byte)
            );
            return;
        }
        if !intermediates.is_empty() {
            return;
        }

        let result = match byte {
            keys::SS3_O => {
                self.state.ss3_pending = true;
                Ok(())
            }
            keys::META_FORWARD_WORD => self.handler.move_forward_word(),
            keys::META_BACKWARD_WORD => self.handler.move_backward_word(),
            keys::META_DELETE_WORD => self.handler.remove_forward_word(),
            other => {
                tracing::trace!(message = "ignored ESC", byte = other);
                Ok(())
            }
        };
        Self::report("esc", result);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_case::test_case;
    use tokio::sync::{mpsc, oneshot};

    use super::*;
    use crate::{CommandHistory, Dispatcher, EditBuffer};

    struct Harness {
        parser: vte::Parser,
        state: VtInputState,
        dispatcher: Dispatcher,
        records: mpsc::UnboundedReceiver<crate::CommandRecord>,
        _close: oneshot::Receiver<()>,
    }

    impl Harness {
        fn new() -> Self {
            let (record_sender, records) = mpsc::unbounded_channel();
            let (close_sender, close) = oneshot::channel();
            Self {
                parser: vte::Parser::new(),
                state: VtInputState::default(),
                dispatcher: Dispatcher::new(
                    EditBuffer::default(),
                    CommandHistory::default(),
                    record_sender,
                    close_sender,
                ),
                records,
                _close: close,
            }
        }

        fn feed(&mut self, bytes: &[u8]) {
            let mut performer = VtInputPerformer::new(&mut self.dispatcher, &mut self.state);
            self.parser.advance(&mut performer, bytes);
        }

        fn line(&self) -> String { self.dispatcher.buffer().text() }

        fn cursor(&self) -> usize { self.dispatcher.buffer().cursor() }

        fn texts(&mut self) -> Vec<String> {
            let mut acc = vec![];
            while let Ok(record) = self.records.try_recv() {
                acc.push(record.text);
            }
            acc
        }
    }

    #[test_case(b"abc\x1b[D", 2 ; "csi left")]
    #[test_case(b"abc\x1bOD", 2 ; "ss3 left")]
    #[test_case(b"abc\x1b[H", 0 ; "csi home")]
    #[test_case(b"abc\x1b[1~", 0 ; "vt home")]
    #[test_case(b"abc\x1b[7~", 0 ; "rxvt home")]
    #[test_case(b"abc\x1bOH", 0 ; "ss3 home")]
    #[test_case(b"abc\x01\x1b[F", 3 ; "csi end")]
    #[test_case(b"abc\x01\x1b[4~", 3 ; "vt end")]
    #[test_case(b"abc\x01\x1b[C", 1 ; "csi right")]
    #[test_case(b"abc\x01\x1bOC", 1 ; "ss3 right")]
    fn test_cursor_keys(input: &[u8], expected_cursor: usize) {
        let mut harness = Harness::new();
        harness.feed(input);
        assert_eq!(harness.line(), "abc");
        assert_eq!(harness.cursor(), expected_cursor);
    }

    #[test_case(b"\x1b[1;5D" ; "ctrl left")]
    #[test_case(b"\x1b[1;3D" ; "alt left")]
    #[test_case(b"\x1bb" ; "meta b")]
    fn test_backward_word_keys(key: &[u8]) {
        let mut harness = Harness::new();
        harness.feed(b"ls -la /tmp");
        harness.feed(key);
        assert_eq!(harness.cursor(), 7);
    }

    #[test_case(b"\x1b[1;5C" ; "ctrl right")]
    #[test_case(b"\x1b[1;3C" ; "alt right")]
    #[test_case(b"\x1bf" ; "meta f")]
    fn test_forward_word_keys(key: &[u8]) {
        let mut harness = Harness::new();
        harness.feed(b"ls -la /tmp\x01");
        harness.feed(key);
        assert_eq!(harness.cursor(), 2);
    }

    #[test]
    fn test_delete_keys() {
        let mut harness = Harness::new();
        harness.feed(b"echo hi there\x7f\x7f");
        assert_eq!(harness.line(), "echo hi the");

        harness.feed(b"\x08");
        assert_eq!(harness.line(), "echo hi th");

        harness.feed(b"\x01\x1b[3~");
        assert_eq!(harness.line(), "cho hi th");

        harness.feed(b"\x1bd");
        assert_eq!(harness.line(), " hi th");
    }

    #[test]
    fn test_history_arrows_and_enter() {
        let mut harness = Harness::new();
        harness.feed(b"ls\r");
        harness.feed(b"pwd\r");
        harness.feed(b"\x1b[A\x1b[A\r");
        harness.feed(b"\x1bOA\r");
        assert_eq!(harness.texts(), vec!["ls", "pwd", "ls", "ls"]);
    }

    #[test]
    fn test_ss3_survives_chunk_boundary() {
        let mut harness = Harness::new();
        harness.feed(b"abc\x1bO");
        assert!(harness.state.is_ss3_pending());
        harness.feed(b"D");
        assert!(!harness.state.is_ss3_pending());
        assert_eq!(harness.line(), "abc");
        assert_eq!(harness.cursor(), 2);
    }

    #[test]
    fn test_unknown_sequences_are_ignored() {
        let mut harness = Harness::new();
        // Bracketed paste markers, a focus-in report and F5.
        harness.feed(b"\x1b[200~echo\x1b[201~\x1b[I\x1b[15~");
        assert_eq!(harness.line(), "echo");
        assert_eq!(harness.cursor(), 4);
    }

    #[test]
    fn test_utf8_is_inserted_as_bytes() {
        let mut harness = Harness::new();
        harness.feed("echo é\r".as_bytes());
        assert_eq!(harness.texts(), vec!["echo é"]);
    }

    #[test]
    fn test_ctrl_r_search_through_parser() {
        let mut harness = Harness::new();
        harness.feed(b"ls\rcd /tmp\rls -la\r");
        harness.feed(b"\x12cd\r");
        assert_eq!(harness.texts(), vec!["ls", "cd /tmp", "ls -la", "cd /tmp"]);
    }
}
