// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::io::Cursor;

use smallvec::SmallVec;
use tungstenite::protocol::frame::{FrameHeader,
                                   coding::{Data, OpCode}};

use crate::FrameDecodeError;

/// Largest reassembled message kept. Keystroke messages are tiny, so anything bigger
/// is a paste or garbage.
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

pub type DecodedMessages = SmallVec<[Result<Vec<u8>, FrameDecodeError>; 4]>;

/// Turns a stream of websocket client frames into complete data messages.
///
/// Frame headers are parsed by [`tungstenite`]. Partial frames are buffered until the
/// rest arrives. Fragmented messages are reassembled. Control frames are skipped. A
/// message over `max_message_size` is reported once and its bytes are discarded as
/// they arrive.
#[derive(Debug)]
pub struct WebSocketFrameDecoder {
    pending: Vec<u8>,
    fragments: Option<Vec<u8>>,
    skip_remaining: u64,
    max_message_size: usize,
}

impl Default for WebSocketFrameDecoder {
    fn default() -> Self { Self::new(MAX_MESSAGE_SIZE) }
}

impl WebSocketFrameDecoder {
    #[must_use]
    pub fn new(max_message_size: usize) -> Self {
        Self {
            pending: Vec::new(),
            fragments: None,
            skip_remaining: 0,
            max_message_size,
        }
    }

    /// Bytes held back waiting for the rest of a frame.
    #[must_use]
    pub fn pending_len(&self) -> usize { self.pending.len() }

    pub fn push(&mut self, chunk: &[u8]) -> DecodedMessages {
        let mut acc = DecodedMessages::new();
        self.pending.extend_from_slice(chunk);

        loop {
            if self.skip_remaining > 0 {
                let skip = usize::try_from(self.skip_remaining)
                    .unwrap_or(usize::MAX)
                    .min(self.pending.len());
                self.pending.drain(..skip);
                self.skip_remaining -= skip as u64;
                if self.skip_remaining > 0 {
                    break;
                }
            }

            let (header, payload_len) =
                match FrameHeader::parse(&mut Cursor::new(self.pending.as_slice())) {
                    Ok(Some(parsed)) => parsed,
                    Ok(None) => break,
                    Err(error) => {
                        // Framing is lost, nothing after this point can be trusted.
                        acc.push(Err(FrameDecodeError::InvalidFrame(error.to_string())));
                        self.pending.clear();
                        self.fragments = None;
                        break;
                    }
                };
            let header_len = header.len(payload_len);

            let payload_len = match usize::try_from(payload_len) {
                Ok(len) if len <= self.max_message_size => len,
                _ => {
                    acc.push(Err(FrameDecodeError::FrameTooLarge {
                        size: payload_len,
                        max_size: self.max_message_size,
                    }));
                    self.pending.drain(..header_len);
                    self.skip_remaining = payload_len;
                    self.fragments = None;
                    continue;
                }
            };

            let frame_len = header_len + payload_len;
            if self.pending.len() < frame_len {
                break;
            }

            let mut payload = self.pending[header_len..frame_len].to_vec();
            self.pending.drain(..frame_len);
            if let Some(mask) = header.mask {
                for (index, byte) in payload.iter_mut().enumerate() {
                    *byte ^= mask[index % mask.len()];
                }
            }

            if let Some(message) = self.on_frame(&header, payload) {
                acc.push(message);
            }
        }

        acc
    }

    fn on_frame(
        &mut self,
        header: &FrameHeader,
        payload: Vec<u8>,
    ) -> Option<Result<Vec<u8>, FrameDecodeError>> {
        match header.opcode {
            OpCode::Data(Data::Text | Data::Binary) => {
                if self.fragments.is_some() {
                    tracing::warn!(message = "unfinished websocket message dropped");
                }
                if header.is_final {
                    self.fragments = None;
                    Some(Ok(payload))
                } else {
                    self.fragments = Some(payload);
                    None
                }
            }
            OpCode::Data(Data::Continue) => {
                let Some(fragments) = self.fragments.as_mut() else {
                    return Some(Err(FrameDecodeError::OrphanContinuation));
                };
                fragments.extend_from_slice(&payload);
                if fragments.len() > self.max_message_size {
                    let size = fragments.len() as u64;
                    self.fragments = None;
                    return Some(Err(FrameDecodeError::FrameTooLarge {
                        size,
                        max_size: self.max_message_size,
                    }));
                }
                if header.is_final { self.fragments.take().map(Ok) } else { None }
            }
            OpCode::Data(Data::Reserved(opcode)) => {
                tracing::debug!(message = "reserved websocket opcode skipped", opcode);
                None
            }
            OpCode::Control(control) => {
                tracing::trace!(message = "websocket control frame skipped", control = ?control);
                None
            }
        }
    }
}
