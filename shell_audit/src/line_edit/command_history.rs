// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::collections::VecDeque;

use crate::{BUFFER_MAX_SIZE, LineEditError, LineEditResult, ok};

/// Number of completed commands remembered per session, like a small `HISTSIZE`.
pub const HISTORY_MAX_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDirection {
    /// `Ctrl+R`: from newer to older entries.
    Reverse,
    /// `Ctrl+S`: from older to newer entries.
    Forward,
}

/// Where the current incremental search landed: history `line` (1 based) and the byte
/// `offset` of the match inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchMatch {
    pub line: usize,
    pub offset: usize,
}

/// Accumulated search query and the last hit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncrementalSearch {
    pub query: Vec<u8>,
    pub matched: Option<SearchMatch>,
}

/// Completed commands, newest first, mirroring what the remote shell would recall.
///
/// Positions are 1 based: `get(1)` is the most recent command. `cursor_line` is the
/// entry currently shown on the line, `0` meaning a fresh line.
#[derive(Debug, Clone)]
pub struct CommandHistory {
    entries: VecDeque<Vec<u8>>,
    max_size: usize,
    max_query_size: usize,
    cursor_line: usize,
    search: IncrementalSearch,
}

impl Default for CommandHistory {
    fn default() -> Self { Self::new(HISTORY_MAX_SIZE, BUFFER_MAX_SIZE) }
}

impl CommandHistory {
    #[must_use]
    pub fn new(max_size: usize, max_query_size: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_size),
            max_size,
            max_query_size,
            cursor_line: 0,
            search: IncrementalSearch::default(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize { self.entries.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    #[must_use]
    pub fn cursor_line(&self) -> usize { self.cursor_line }

    pub fn reset_cursor_line(&mut self) { self.cursor_line = 0; }

    #[must_use]
    pub fn search(&self) -> &IncrementalSearch { &self.search }

    /// Adds the newest entry. The oldest is dropped once `max_size` is reached.
    pub fn push_front(&mut self, line: Vec<u8>) {
        self.entries.push_front(line);
        if self.entries.len() > self.max_size {
            self.entries.pop_back();
        }
    }

    /// # Errors
    ///
    /// [`LineEditError::HistoryIndexOutOfRange`] if `index` is not in `[1, len]`.
    pub fn get(&self, index: usize) -> LineEditResult<&[u8]> {
        index
            .checked_sub(1)
            .and_then(|it| self.entries.get(it))
            .map(Vec::as_slice)
            .ok_or(LineEditError::HistoryIndexOutOfRange {
                index,
                size: self.len(),
            })
    }

    /// Overwrites entry `index`, used when a recalled line is edited and then executed.
    ///
    /// # Errors
    ///
    /// [`LineEditError::HistoryIndexOutOfRange`] if `index` is not in `[1, len]`.
    pub fn set(&mut self, index: usize, line: Vec<u8>) -> LineEditResult<()> {
        let size = self.len();
        match index.checked_sub(1).and_then(|it| self.entries.get_mut(it)) {
            Some(slot) => {
                *slot = line;
                ok!()
            }
            None => Err(LineEditError::HistoryIndexOutOfRange { index, size }),
        }
    }

    /// `Up` / `Ctrl+P`, `n` times. Stops at the oldest entry.
    ///
    /// # Errors
    ///
    /// [`LineEditError::HistoryIndexOutOfRange`] if the history is empty.
    pub fn previous(&mut self, n: usize) -> LineEditResult<&[u8]> {
        if self.is_empty() {
            return Err(LineEditError::HistoryIndexOutOfRange {
                index: self.cursor_line.saturating_add(n),
                size: 0,
            });
        }
        self.cursor_line = self.cursor_line.saturating_add(n).min(self.len());
        self.get(self.cursor_line)
    }

    /// `Down` / `Ctrl+N`, `n` times. Reaching position `0` yields the fresh (empty)
    /// line. Returns `None` if already on the fresh line, so whatever is being typed
    /// there is left alone.
    pub fn next(&mut self, n: usize) -> Option<&[u8]> {
        if self.cursor_line == 0 {
            return None;
        }
        self.cursor_line = self.cursor_line.saturating_sub(n);
        match self.cursor_line {
            0 => Some(b"".as_slice()),
            line => self.get(line).ok(),
        }
    }

    /// Appends `byte` to the query and searches again.
    ///
    /// A reverse search recomputes over the whole query but falls back to shorter
    /// suffixes (longest first) when the full query has no hit. A forward search only
    /// matches the full query. Returns `None` when nothing matches, in which case the
    /// last hit is kept.
    ///
    /// # Errors
    ///
    /// [`LineEditError::OutOfLengthSize`] if the query outgrows the line capacity. The
    /// search state is reset.
    pub fn search_byte(
        &mut self,
        direction: SearchDirection,
        byte: u8,
    ) -> LineEditResult<Option<SearchMatch>> {
        if self.search.query.len() >= self.max_query_size {
            self.quit_search();
            return Err(LineEditError::OutOfLengthSize {
                max_size: self.max_query_size,
            });
        }
        self.search.query.push(byte);

        let prior = self.search.matched;
        let hit = match direction {
            SearchDirection::Reverse => {
                let start_line = prior.map_or(1, |it| it.line);
                self.find_reverse(start_line, prior.map(|it| it.offset))
            }
            SearchDirection::Forward => {
                let start_line = prior.map_or(self.len(), |it| it.line);
                self.find_forward(start_line)
            }
        };
        Ok(self.accept(hit))
    }

    /// `Ctrl+R` / `Ctrl+S` pressed again while searching: next hit for the same query,
    /// one entry further in `direction`.
    pub fn search_again(&mut self, direction: SearchDirection) -> Option<SearchMatch> {
        if self.search.query.is_empty() {
            return None;
        }
        let hit = match (direction, self.search.matched) {
            (SearchDirection::Reverse, prior) => {
                self.find_reverse(prior.map_or(1, |it| it.line + 1), None)
            }
            (SearchDirection::Forward, Some(prior)) if prior.line > 1 => {
                self.find_forward(prior.line - 1)
            }
            (SearchDirection::Forward, Some(_)) => None,
            (SearchDirection::Forward, None) => self.find_forward(self.len()),
        };
        self.accept(hit)
    }

    /// Forgets the query and the last hit. `cursor_line` is kept, so the recalled entry
    /// can still be edited or executed.
    pub fn quit_search(&mut self) { self.search = IncrementalSearch::default(); }

    fn accept(&mut self, hit: Option<SearchMatch>) -> Option<SearchMatch> {
        if let Some(it) = hit {
            self.search.matched = Some(it);
            self.cursor_line = it.line;
        }
        hit
    }

    fn find_reverse(
        &self,
        start_line: usize,
        prior_offset: Option<usize>,
    ) -> Option<SearchMatch> {
        let query = &self.search.query;
        for suffix_start in 0..query.len() {
            let pattern = &query[suffix_start..];
            for line in start_line..=self.len() {
                let Ok(entry) = self.get(line) else { continue };
                let haystack = match prior_offset {
                    // A match in the entry already shown may only grow leftwards.
                    Some(offset) if line == start_line => {
                        &entry[..(offset + pattern.len()).min(entry.len())]
                    }
                    _ => entry,
                };
                if let Some(offset) = rfind(haystack, pattern) {
                    return Some(SearchMatch { line, offset });
                }
            }
        }
        None
    }

    /// Scans from `start_line` toward the newest entry and keeps the last hit, which is
    /// the newest matching entry in range.
    fn find_forward(&self, start_line: usize) -> Option<SearchMatch> {
        let query = &self.search.query;
        (1..=start_line.min(self.len()))
            .rev()
            .filter_map(|line| {
                let entry = self.get(line).ok()?;
                find(entry, query).map(|offset| SearchMatch { line, offset })
            })
            .last()
    }
}

/// Byte offset of the first occurrence of `needle` in `haystack`.
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|it| it == needle)
}

/// Byte offset of the last occurrence of `needle` in `haystack`.
fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).rposition(|it| it == needle)
}
