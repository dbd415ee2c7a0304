// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Builders for what a websocket client puts on the wire.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use tungstenite::protocol::frame::{FrameHeader,
                                   coding::{Data, OpCode}};

use crate::STDIN_CHANNEL_BASE64;

/// Masking key from the RFC 6455 examples.
pub const SAMPLE_MASKING_KEY: [u8; 4] = [0x37, 0xfa, 0x21, 0x3d];

/// One frame, masked when `masking_key` is `Some`. The header (and its 7, 16, or 64
/// bit length form) is written by [`tungstenite`].
#[must_use]
pub fn client_frame(
    is_final: bool,
    opcode: OpCode,
    payload: &[u8],
    masking_key: Option<[u8; 4]>,
) -> Vec<u8> {
    let header = FrameHeader {
        is_final,
        opcode,
        mask: masking_key,
        ..FrameHeader::default()
    };

    let mut acc = Vec::with_capacity(payload.len() + 14);
    if let Err(error) = header.format(payload.len() as u64, &mut acc) {
        tracing::error!(message = "websocket header not written", error = %error);
    }

    match masking_key {
        Some(key) => acc.extend(
            payload
                .iter()
                .enumerate()
                .map(|(index, byte)| byte ^ key[index % key.len()]),
        ),
        None => acc.extend_from_slice(payload),
    }
    acc
}

/// A complete, masked text frame, the way browsers send every message.
#[must_use]
pub fn masked_client_frame(payload: &[u8]) -> Vec<u8> {
    client_frame(true, OpCode::Data(Data::Text), payload, Some(SAMPLE_MASKING_KEY))
}

/// A `base64.channel.k8s.io` stdin message carrying `keystrokes`.
#[must_use]
pub fn k8s_stdin_message(keystrokes: &[u8]) -> Vec<u8> {
    let mut acc = vec![STDIN_CHANNEL_BASE64];
    acc.extend_from_slice(STANDARD.encode(keystrokes).as_bytes());
    acc
}
