// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};

use crate::{WebSocketFrameDecoder, decode_stdin_message};

/// How the bytes read from an intercepted connection are framed.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::EnumString,
    strum_macros::Display,
    strum_macros::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StreamEncoding {
    /// Client websocket frames carrying `base64.channel.k8s.io` (or the binary
    /// `channel.k8s.io`) messages, as sent by `kubectl exec` and web terminals.
    #[default]
    K8sWebsocket,
    /// The bytes are terminal input already, e.g. a captured PTY stream.
    Raw,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum FrameDecodeError {
    #[error("websocket message of {size} bytes exceeds the {max_size} byte limit")]
    #[diagnostic(
        code(shell_audit::frame::too_large),
        help("The message is skipped; typed input is never this large")
    )]
    FrameTooLarge { size: u64, max_size: usize },

    #[error("websocket framing lost: {0}")]
    #[diagnostic(
        code(shell_audit::frame::invalid_frame),
        help("Buffered bytes are dropped and decoding resumes with the next read")
    )]
    InvalidFrame(String),

    #[error("continuation frame without a message to continue")]
    #[diagnostic(code(shell_audit::frame::orphan_continuation))]
    OrphanContinuation,

    #[error("stdin segment is not valid base64: {0}")]
    #[diagnostic(code(shell_audit::frame::invalid_base64))]
    InvalidBase64(#[from] base64::DecodeError),
}

/// Terminal input recovered from one chunk, in order. A failed frame or segment is an
/// `Err` in its place; the decoder carries on with the next one.
pub type DecodedStdin = SmallVec<[Result<Vec<u8>, FrameDecodeError>; 4]>;

/// Extracts terminal input from the raw bytes of a connection. Stateful: a frame may
/// be split across chunks.
pub trait FrameDecoder: Send {
    fn decode(&mut self, chunk: &[u8]) -> DecodedStdin;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RawDecoder;

impl FrameDecoder for RawDecoder {
    fn decode(&mut self, chunk: &[u8]) -> DecodedStdin {
        if chunk.is_empty() {
            return DecodedStdin::new();
        }
        smallvec![Ok(chunk.to_vec())]
    }
}

/// Websocket client frames, then the Kubernetes stream channel inside each message.
#[derive(Debug, Default)]
pub struct K8sChannelDecoder {
    frames: WebSocketFrameDecoder,
}

impl K8sChannelDecoder {
    #[must_use]
    pub fn new(frames: WebSocketFrameDecoder) -> Self { Self { frames } }
}

impl FrameDecoder for K8sChannelDecoder {
    fn decode(&mut self, chunk: &[u8]) -> DecodedStdin {
        let mut acc = DecodedStdin::new();
        for message in self.frames.push(chunk) {
            match message {
                Ok(message) => acc.extend(decode_stdin_message(&message)),
                Err(error) => acc.push(Err(error)),
            }
        }
        acc
    }
}

#[must_use]
pub fn create_frame_decoder(encoding: StreamEncoding) -> Box<dyn FrameDecoder> {
    match encoding {
        StreamEncoding::K8sWebsocket => Box::new(K8sChannelDecoder::default()),
        StreamEncoding::Raw => Box::new(RawDecoder),
    }
}
