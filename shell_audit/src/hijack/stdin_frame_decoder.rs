// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::{DecodedStdin, FrameDecodeError};

/// Stdin channel marker in `base64.channel.k8s.io`: the channel number as an ASCII
/// digit, then base64 text.
pub const STDIN_CHANNEL_BASE64: u8 = b'0';
/// Stdin channel marker in `channel.k8s.io`: the channel number as a byte, then raw
/// bytes.
pub const STDIN_CHANNEL_BINARY: u8 = 0;
pub const SEGMENT_SEPARATOR: u8 = b'\n';

/// Terminal input carried by one Kubernetes stream message. Messages for any other
/// channel (resize, stdout echo) yield nothing.
///
/// A base64 message may hold several `\n` separated segments; each decodes on its own
/// so one bad segment doesn't lose its neighbours.
#[must_use]
pub fn decode_stdin_message(message: &[u8]) -> DecodedStdin {
    let mut acc = DecodedStdin::new();
    match message.split_first() {
        Some((&STDIN_CHANNEL_BASE64, payload)) => {
            for segment in payload.split(|&it| it == SEGMENT_SEPARATOR) {
                if segment.is_empty() {
                    continue;
                }
                acc.push(STANDARD.decode(segment).map_err(FrameDecodeError::from));
            }
        }
        Some((&STDIN_CHANNEL_BINARY, payload)) if !payload.is_empty() => {
            acc.push(Ok(payload.to_vec()));
        }
        Some((channel, _)) => {
            tracing::trace!(message = "non-stdin channel skipped", channel = *channel);
        }
        None => {}
    }
    acc
}
