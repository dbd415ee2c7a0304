// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use tokio::sync::{mpsc::UnboundedSender, oneshot};

use crate::{CommandHistory, CommandRecord, EditBuffer, LineEditError, LineEditResult,
            SearchDirection, TerminalEventHandler, input_sequences as keys, ok};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    /// Printable bytes go into the line. Browsing history (`cursor_line != 0`) is also
    /// this state.
    Idle,
    /// Printable bytes go into the search query.
    Searching(SearchDirection),
}

/// Replays one session's keystrokes against an [`EditBuffer`] and a [`CommandHistory`],
/// and emits a [`CommandRecord`] for every executed line.
///
/// Driven synchronously by a single reader, so there is no locking. Emission never
/// blocks: records go into an unbounded channel, and a closed receiver only means
/// nobody is auditing anymore.
#[derive(Debug)]
pub struct Dispatcher {
    buffer: EditBuffer,
    history: CommandHistory,
    state: DispatcherState,
    /// `Ctrl+X` was the previous byte.
    pending_ctrl_x: bool,
    record_sender: UnboundedSender<CommandRecord>,
    /// Taken on the first [`TerminalEventHandler::close`].
    close_sender: Option<oneshot::Sender<()>>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(
        buffer: EditBuffer,
        history: CommandHistory,
        record_sender: UnboundedSender<CommandRecord>,
        close_sender: oneshot::Sender<()>,
    ) -> Self {
        Self {
            buffer,
            history,
            state: DispatcherState::Idle,
            pending_ctrl_x: false,
            record_sender,
            close_sender: Some(close_sender),
        }
    }

    #[must_use]
    pub fn buffer(&self) -> &EditBuffer { &self.buffer }

    #[must_use]
    pub fn history(&self) -> &CommandHistory { &self.history }

    #[must_use]
    pub fn state(&self) -> DispatcherState { self.state }

    #[must_use]
    pub fn is_closed(&self) -> bool { self.close_sender.is_none() }

    /// Every operation other than a search byte or a search key ends the search. The
    /// recalled line stays on the buffer and the operation applies to it.
    fn leave_search(&mut self) {
        if let DispatcherState::Searching(_) = self.state {
            self.history.quit_search();
            self.state = DispatcherState::Idle;
        }
    }

    /// Runs a plain edit on the buffer. Any edit breaks a pending `Ctrl+X` prefix.
    #[allow(clippy::unnecessary_wraps)]
    fn edit(&mut self, op: impl FnOnce(&mut EditBuffer)) -> LineEditResult<()> {
        self.leave_search();
        self.pending_ctrl_x = false;
        op(&mut self.buffer);
        ok!()
    }

    fn search_byte(&mut self, direction: SearchDirection, byte: u8) -> LineEditResult<()> {
        self.state = DispatcherState::Searching(direction);
        match self.history.search_byte(direction, byte) {
            Ok(Some(hit)) => {
                self.buffer.load(self.history.get(hit.line)?);
                self.buffer.set_cursor(hit.offset);
                ok!()
            }
            Ok(None) => ok!(),
            Err(error) => {
                self.state = DispatcherState::Idle;
                Err(error)
            }
        }
    }

    fn begin_search_in(&mut self, direction: SearchDirection) -> LineEditResult<()> {
        let was_searching = matches!(self.state, DispatcherState::Searching(_));
        self.state = DispatcherState::Searching(direction);
        if !was_searching {
            return ok!();
        }
        if let Some(hit) = self.history.search_again(direction) {
            self.buffer.load(self.history.get(hit.line)?);
            self.buffer.set_cursor(hit.offset);
        }
        ok!()
    }

    fn execute_line(&mut self) -> LineEditResult<()> {
        let cursor_line = self.history.cursor_line();
        if cursor_line != 0 {
            self.history.set(cursor_line, self.buffer.as_bytes().to_vec())?;
        }
        self.enter()
    }
}

impl TerminalEventHandler for Dispatcher {
    fn print(&mut self, byte: u8) -> LineEditResult<()> {
        self.pending_ctrl_x = false;
        match self.state {
            DispatcherState::Searching(SearchDirection::Reverse) => self.reverse_search(byte),
            DispatcherState::Searching(SearchDirection::Forward) => self.search(byte),
            DispatcherState::Idle => self.buffer.insert(byte),
        }
    }

    fn execute(&mut self, byte: u8) -> LineEditResult<()> {
        if std::mem::take(&mut self.pending_ctrl_x) && byte == keys::CONTROL_X {
            return self.double_x();
        }

        match byte {
            keys::CARRIAGE_RETURN | keys::LINE_FEED => self.execute_line(),
            keys::CONTROL_AT => self.set_mark(),
            keys::CONTROL_A => self.move_line_head(),
            keys::CONTROL_B => self.move_backward_character(),
            keys::CONTROL_C => self.clean(),
            keys::CONTROL_D => self.remove_forward_character_or_close(),
            keys::CONTROL_E => self.move_line_end(),
            keys::CONTROL_F => self.move_forward_character(),
            keys::CONTROL_G => self.quit_search_mode(),
            keys::BACKSPACE | keys::ASCII_DEL => self.remove_backward_character(),
            keys::CONTROL_K => self.remove_forward_all(),
            keys::CONTROL_N => self.next_command(1),
            keys::CONTROL_P => self.previous_command(1),
            keys::CONTROL_R => self.begin_reverse_search(),
            keys::CONTROL_S => self.begin_search(),
            keys::CONTROL_T => self.swap_last_two_character(),
            keys::CONTROL_U => self.remove_backward_all(),
            keys::CONTROL_W => self.remove_backward_word(),
            keys::CONTROL_X => {
                self.pending_ctrl_x = true;
                ok!()
            }
            // Completion and screen redraws don't change the line we can see.
            keys::TAB | keys::CONTROL_L => ok!(),
            other => {
                tracing::trace!(message = "ignored control byte", byte = other);
                ok!()
            }
        }
    }

    fn enter(&mut self) -> LineEditResult<()> {
        self.leave_search();
        self.pending_ctrl_x = false;

        let line = self.buffer.as_bytes().to_vec();
        self.buffer.reset();
        self.history.reset_cursor_line();
        if line.is_empty() {
            return ok!();
        }

        let record = CommandRecord::new(String::from_utf8_lossy(&line));
        self.history.push_front(line);
        tracing::debug!(message = "command captured", command = %record.text);
        if self.record_sender.send(record).is_err() {
            tracing::debug!(message = "record receiver closed, command not audited");
        }
        ok!()
    }

    fn move_forward_character(&mut self) -> LineEditResult<()> {
        self.edit(EditBuffer::move_forward_char)
    }

    fn move_backward_character(&mut self) -> LineEditResult<()> {
        self.edit(EditBuffer::move_backward_char)
    }

    fn move_forward_word(&mut self) -> LineEditResult<()> {
        self.edit(EditBuffer::move_forward_word)
    }

    fn move_backward_word(&mut self) -> LineEditResult<()> {
        self.edit(EditBuffer::move_backward_word)
    }

    fn move_line_head(&mut self) -> LineEditResult<()> { self.edit(EditBuffer::move_line_head) }

    fn move_line_end(&mut self) -> LineEditResult<()> { self.edit(EditBuffer::move_line_end) }

    fn remove_forward_character_or_close(&mut self) -> LineEditResult<()> {
        self.leave_search();
        if self.buffer.is_empty() {
            return self.close();
        }
        self.buffer.remove_forward_char();
        ok!()
    }

    fn remove_forward_character(&mut self) -> LineEditResult<()> {
        self.edit(|it| {
            it.remove_forward_char();
        })
    }

    fn remove_backward_character(&mut self) -> LineEditResult<()> {
        self.edit(|it| {
            it.remove_backward_char();
        })
    }

    fn remove_forward_word(&mut self) -> LineEditResult<()> {
        self.edit(EditBuffer::remove_forward_word)
    }

    fn remove_backward_word(&mut self) -> LineEditResult<()> {
        self.edit(EditBuffer::remove_backward_word)
    }

    fn remove_forward_all(&mut self) -> LineEditResult<()> {
        self.edit(EditBuffer::remove_forward_all)
    }

    fn remove_backward_all(&mut self) -> LineEditResult<()> {
        self.edit(EditBuffer::remove_backward_all)
    }

    fn swap_last_two_character(&mut self) -> LineEditResult<()> {
        self.edit(EditBuffer::swap_last_two_chars)
    }

    fn set_mark(&mut self) -> LineEditResult<()> { self.edit(EditBuffer::set_mark) }

    fn double_x(&mut self) -> LineEditResult<()> {
        self.edit(EditBuffer::exchange_cursor_and_mark)
    }

    fn previous_command(&mut self, n: usize) -> LineEditResult<()> {
        self.leave_search();
        self.pending_ctrl_x = false;
        match self.history.previous(n) {
            Ok(line) => {
                self.buffer.load(line);
                ok!()
            }
            // Up on an empty history does nothing.
            Err(LineEditError::HistoryIndexOutOfRange { .. }) => ok!(),
            Err(error) => Err(error),
        }
    }

    fn next_command(&mut self, n: usize) -> LineEditResult<()> {
        self.leave_search();
        self.pending_ctrl_x = false;
        if let Some(line) = self.history.next(n) {
            self.buffer.load(line);
        }
        ok!()
    }

    fn begin_reverse_search(&mut self) -> LineEditResult<()> {
        self.begin_search_in(SearchDirection::Reverse)
    }

    fn begin_search(&mut self) -> LineEditResult<()> {
        self.begin_search_in(SearchDirection::Forward)
    }

    fn reverse_search(&mut self, byte: u8) -> LineEditResult<()> {
        self.search_byte(SearchDirection::Reverse, byte)
    }

    fn search(&mut self, byte: u8) -> LineEditResult<()> {
        self.search_byte(SearchDirection::Forward, byte)
    }

    fn quit_search_mode(&mut self) -> LineEditResult<()> {
        self.history.quit_search();
        self.state = DispatcherState::Idle;
        ok!()
    }

    fn clean(&mut self) -> LineEditResult<()> {
        tracing::trace!(message = "line abandoned", len = self.buffer.len());
        self.reset()
    }

    fn reset(&mut self) -> LineEditResult<()> {
        self.history.quit_search();
        self.state = DispatcherState::Idle;
        self.pending_ctrl_x = false;
        self.buffer.reset();
        self.history.reset_cursor_line();
        ok!()
    }

    fn close(&mut self) -> LineEditResult<()> {
        if let Some(close_sender) = self.close_sender.take() {
            tracing::debug!(message = "session close requested");
            if close_sender.send(()).is_err() {
                tracing::debug!(message = "close receiver already gone");
            }
        }
        ok!()
    }

    fn search_direction(&self) -> Option<SearchDirection> {
        match self.state {
            DispatcherState::Searching(direction) => Some(direction),
            DispatcherState::Idle => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tokio::sync::{mpsc, oneshot::error::TryRecvError};

    use super::*;

    struct Harness {
        dispatcher: Dispatcher,
        records: mpsc::UnboundedReceiver<CommandRecord>,
        close: oneshot::Receiver<()>,
    }

    fn harness() -> Harness {
        let (record_sender, records) = mpsc::unbounded_channel();
        let (close_sender, close) = oneshot::channel();
        Harness {
            dispatcher: Dispatcher::new(
                EditBuffer::default(),
                CommandHistory::default(),
                record_sender,
                close_sender,
            ),
            records,
            close,
        }
    }

    impl Harness {
        fn type_str(&mut self, text: &str) {
            for byte in text.bytes() {
                self.dispatcher.print(byte).unwrap();
            }
        }

        fn press(&mut self, byte: u8) { self.dispatcher.execute(byte).unwrap(); }

        fn run(&mut self, text: &str) {
            self.type_str(text);
            self.press(keys::CARRIAGE_RETURN);
        }

        fn texts(&mut self) -> Vec<String> {
            let mut it = vec![];
            while let Ok(record) = self.records.try_recv() {
                it.push(record.text);
            }
            it
        }
    }

    #[test]
    fn test_type_and_enter_emits_record() {
        let mut h = harness();
        h.run("ls");

        assert_eq!(h.texts(), vec!["ls".to_string()]);
        assert_eq!(h.dispatcher.history().get(1).unwrap(), b"ls");
        assert!(h.dispatcher.buffer().is_empty());
        assert_eq!(h.dispatcher.buffer().cursor(), 0);
    }

    #[test]
    fn test_empty_enter_emits_nothing() {
        let mut h = harness();
        h.press(keys::CARRIAGE_RETURN);
        h.press(keys::LINE_FEED);

        assert!(h.texts().is_empty());
        assert!(h.dispatcher.history().is_empty());
    }

    #[test]
    fn test_edits_in_the_middle_of_the_line() {
        let mut h = harness();
        h.type_str("kubectl get pod");
        h.press(keys::CONTROL_A);
        h.dispatcher.move_forward_word().unwrap();
        h.type_str(" -n kube-system");
        h.press(keys::CONTROL_E);
        h.type_str("s");
        h.press(keys::CARRIAGE_RETURN);

        assert_eq!(h.texts(), vec!["kubectl -n kube-system get pods".to_string()]);
    }

    #[test]
    fn test_ctrl_w_and_ctrl_u_and_ctrl_k() {
        let mut h = harness();
        h.type_str("rm -rf /tmp/x");
        h.press(keys::CONTROL_W);
        h.type_str("/tmp/y");
        h.press(keys::CARRIAGE_RETURN);

        h.type_str("echo secret");
        h.press(keys::CONTROL_U);
        h.type_str("echo ok");
        h.press(keys::CARRIAGE_RETURN);

        h.type_str("cat a b");
        h.press(keys::CONTROL_B);
        h.press(keys::CONTROL_B);
        h.press(keys::CONTROL_K);
        h.press(keys::CARRIAGE_RETURN);

        assert_eq!(
            h.texts(),
            vec![
                "rm -rf /tmp/y".to_string(),
                "echo ok".to_string(),
                "cat a".to_string()
            ]
        );
    }

    #[test]
    fn test_backspace_both_encodings() {
        let mut h = harness();
        h.type_str("lss");
        h.press(keys::ASCII_DEL);
        h.type_str("xx");
        h.press(keys::BACKSPACE);
        h.press(keys::BACKSPACE);
        h.press(keys::CARRIAGE_RETURN);

        assert_eq!(h.texts(), vec!["ls".to_string()]);
    }

    #[test]
    fn test_up_then_enter_repeats_command() {
        let mut h = harness();
        h.run("ls");
        h.press(keys::CONTROL_P);
        h.press(keys::CARRIAGE_RETURN);

        assert_eq!(h.texts(), vec!["ls".to_string(), "ls".to_string()]);
        assert_eq!(h.dispatcher.history().len(), 2);
    }

    #[test]
    fn test_edited_history_line_is_stored_back() {
        let mut h = harness();
        h.run("ls /");
        h.run("pwd");
        h.press(keys::CONTROL_P);
        h.press(keys::CONTROL_P);
        h.type_str("tmp");
        h.press(keys::CARRIAGE_RETURN);

        assert_eq!(h.texts().last().unwrap(), "ls /tmp");
        assert_eq!(h.dispatcher.history().get(1).unwrap(), b"ls /tmp");
        assert_eq!(h.dispatcher.history().get(3).unwrap(), b"ls /tmp");
        assert_eq!(h.dispatcher.history().cursor_line(), 0);
    }

    #[test]
    fn test_up_on_empty_history_is_noop() {
        let mut h = harness();
        h.type_str("abc");
        h.dispatcher.previous_command(1).unwrap();
        assert_eq!(h.dispatcher.buffer().text(), "abc");
    }

    #[test]
    fn test_down_past_newest_gives_fresh_line() {
        let mut h = harness();
        h.run("one");
        h.dispatcher.previous_command(1).unwrap();
        assert_eq!(h.dispatcher.buffer().text(), "one");
        h.dispatcher.next_command(1).unwrap();
        assert_eq!(h.dispatcher.buffer().text(), "");

        // Already on the fresh line, typed text survives.
        h.type_str("two");
        h.dispatcher.next_command(1).unwrap();
        assert_eq!(h.dispatcher.buffer().text(), "two");
    }

    #[test]
    fn test_reverse_search_loads_match() {
        let mut h = harness();
        h.run("ls");
        h.run("cd /tmp");
        h.run("ls -la");
        h.texts();

        h.press(keys::CONTROL_R);
        assert_eq!(h.dispatcher.search_direction(), Some(SearchDirection::Reverse));
        h.type_str("ls");

        assert_eq!(h.dispatcher.buffer().text(), "ls -la");
        assert_eq!(h.dispatcher.buffer().cursor(), 0);
        assert_eq!(h.dispatcher.history().cursor_line(), 1);

        h.press(keys::CARRIAGE_RETURN);
        assert_eq!(h.texts(), vec!["ls -la".to_string()]);
        assert_eq!(h.dispatcher.state(), DispatcherState::Idle);
    }

    #[test]
    fn test_ctrl_r_again_and_edit_after_search() {
        let mut h = harness();
        h.run("git status");
        h.run("git log");
        h.texts();

        h.press(keys::CONTROL_R);
        h.type_str("git");
        assert_eq!(h.dispatcher.buffer().text(), "git log");
        h.press(keys::CONTROL_R);
        assert_eq!(h.dispatcher.buffer().text(), "git status");

        // Ctrl+E leaves search and applies to the recalled line.
        h.press(keys::CONTROL_E);
        assert_eq!(h.dispatcher.search_direction(), None);
        h.type_str(" -s");
        h.press(keys::CARRIAGE_RETURN);

        assert_eq!(h.texts(), vec!["git status -s".to_string()]);
    }

    #[test]
    fn test_forward_search() {
        let mut h = harness();
        h.run("make build");
        h.run("make test");
        h.texts();

        h.press(keys::CONTROL_S);
        h.type_str("make");
        assert_eq!(h.dispatcher.buffer().text(), "make test");
        assert_eq!(h.dispatcher.history().cursor_line(), 1);

        // Already on the newest match.
        h.press(keys::CONTROL_S);
        assert_eq!(h.dispatcher.buffer().text(), "make test");
    }

    #[test]
    fn test_forward_search_loads_newest_match() {
        let mut h = harness();
        h.run("ls a");
        h.run("cd");
        h.run("ls b");

        h.press(keys::CONTROL_S);
        h.type_str("l");
        assert_eq!(h.dispatcher.buffer().text(), "ls b");
    }

    #[test]
    fn test_quit_search_keeps_line() {
        let mut h = harness();
        h.run("htop");
        h.press(keys::CONTROL_R);
        h.type_str("ht");
        h.press(keys::CONTROL_G);

        assert_eq!(h.dispatcher.state(), DispatcherState::Idle);
        assert_eq!(h.dispatcher.buffer().text(), "htop");
        assert!(h.dispatcher.history().search().query.is_empty());

        // Printing goes into the line again, at the match offset.
        h.type_str("!");
        assert_eq!(h.dispatcher.buffer().text(), "!htop");
    }

    #[test]
    fn test_ctrl_c_abandons_line() {
        let mut h = harness();
        h.type_str("rm -rf /");
        h.press(keys::CONTROL_C);
        h.press(keys::CARRIAGE_RETURN);

        assert!(h.texts().is_empty());
        assert!(h.dispatcher.buffer().is_empty());
    }

    #[test]
    fn test_ctrl_t_and_ctrl_x_ctrl_x() {
        let mut h = harness();
        h.type_str("sl");
        h.press(keys::CONTROL_T);
        assert_eq!(h.dispatcher.buffer().text(), "ls");

        h.press(keys::CONTROL_X);
        h.press(keys::CONTROL_X);
        assert_eq!(h.dispatcher.buffer().cursor(), 0);

        // Ctrl+X followed by something else is not an exchange.
        h.press(keys::CONTROL_X);
        h.press(keys::CONTROL_E);
        assert_eq!(h.dispatcher.buffer().cursor(), 2);
    }

    #[test]
    fn test_ctrl_x_prefix_is_broken_by_moves_and_history() {
        let mut h = harness();
        h.run("pwd");
        h.type_str("abcdef");
        h.press(keys::CONTROL_AT);

        // Left arrow arrives as a dispatched move, not as a control byte.
        h.press(keys::CONTROL_X);
        h.dispatcher.move_backward_character().unwrap();
        h.press(keys::CONTROL_X);
        assert_eq!(h.dispatcher.buffer().cursor(), 5);

        // The prefix from the line above is still pending here.
        h.dispatcher.previous_command(1).unwrap();
        h.press(keys::CONTROL_X);
        assert_eq!(h.dispatcher.buffer().text(), "pwd");
        assert_eq!(h.dispatcher.buffer().cursor(), 3);

        h.dispatcher.next_command(1).unwrap();
        h.press(keys::CONTROL_X);
        assert!(h.dispatcher.buffer().is_empty());
        assert_eq!(h.dispatcher.buffer().mark(), None);
    }

    #[test]
    fn test_stale_mark_exchange_leaves_cursor() {
        let mut h = harness();
        h.type_str("abcdef");
        h.press(keys::CONTROL_AT);
        h.press(keys::CONTROL_A);
        h.press(keys::CONTROL_X);
        h.press(keys::CONTROL_X);
        assert_eq!(h.dispatcher.buffer().cursor(), 0);
    }

    #[test]
    fn test_reset_forgets_recalled_entry() {
        let mut h = harness();
        h.run("rm -rf /");
        h.texts();

        h.dispatcher.previous_command(1).unwrap();
        h.dispatcher.reset().unwrap();
        h.run("ls");

        assert_eq!(h.texts(), vec!["ls".to_string()]);
        assert_eq!(h.dispatcher.history().get(1).unwrap(), b"ls");
        assert_eq!(h.dispatcher.history().get(2).unwrap(), b"rm -rf /");
    }

    #[test]
    fn test_reset_leaves_search() {
        let mut h = harness();
        h.run("ls");
        h.press(keys::CONTROL_R);
        h.type_str("l");
        assert_eq!(h.dispatcher.search_direction(), Some(SearchDirection::Reverse));

        h.dispatcher.reset().unwrap();
        assert_eq!(h.dispatcher.state(), DispatcherState::Idle);
        assert!(h.dispatcher.history().search().query.is_empty());
        assert_eq!(h.dispatcher.history().cursor_line(), 0);

        h.type_str("x");
        assert_eq!(h.dispatcher.buffer().text(), "x");
    }

    #[test]
    fn test_ctrl_d_on_empty_line_closes_once() {
        let mut h = harness();
        h.type_str("ab");
        h.press(keys::CONTROL_A);
        h.press(keys::CONTROL_D);
        assert_eq!(h.dispatcher.buffer().text(), "b");
        assert!(!h.dispatcher.is_closed());

        h.press(keys::CONTROL_D);
        h.press(keys::CONTROL_D);
        h.press(keys::CONTROL_D);

        assert!(h.dispatcher.is_closed());
        assert_eq!(h.close.try_recv(), Ok(()));
        assert_eq!(h.close.try_recv(), Err(TryRecvError::Closed));
    }

    #[test]
    fn test_delete_key_never_closes() {
        let mut h = harness();
        h.dispatcher.remove_forward_character().unwrap();
        assert!(!h.dispatcher.is_closed());
    }

    #[test]
    fn test_overflow_resets_line_and_session_continues() {
        let (record_sender, mut records) = mpsc::unbounded_channel();
        let (close_sender, _close) = oneshot::channel();
        let mut dispatcher = Dispatcher::new(
            EditBuffer::new(3),
            CommandHistory::default(),
            record_sender,
            close_sender,
        );
        for byte in b"abc" {
            dispatcher.print(*byte).unwrap();
        }
        assert_eq!(
            dispatcher.print(b'd'),
            Err(LineEditError::OutOfLengthSize { max_size: 3 })
        );
        assert!(dispatcher.buffer().is_empty());

        dispatcher.print(b'l').unwrap();
        dispatcher.execute(keys::CARRIAGE_RETURN).unwrap();
        assert_eq!(records.try_recv().unwrap().text, "l");
    }

    #[test]
    fn test_closed_record_receiver_does_not_fail() {
        let mut h = harness();
        h.records.close();
        h.run("ls");
        assert_eq!(h.dispatcher.history().get(1).unwrap(), b"ls");
    }
}
