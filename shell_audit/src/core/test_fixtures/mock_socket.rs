// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use tokio::io::{DuplexStream, ReadHalf, WriteHalf, duplex, split};

/// Bytes that can be in flight in one direction before a write waits for the reader.
pub const MOCK_SOCKET_BUFFER_SIZE: usize = 8 * 1024;

/// Both ends of an in-memory connection. The "client" side plays the browser or
/// `kubectl`; the "server" side is what the proxy reads and writes.
#[derive(Debug)]
pub struct MockSocket {
    pub client_read: ReadHalf<DuplexStream>,
    pub client_write: WriteHalf<DuplexStream>,
    pub server_read: ReadHalf<DuplexStream>,
    pub server_write: WriteHalf<DuplexStream>,
}

/// Bytes written to `client_write` can be read from `server_read`, and vice versa.
/// Call `shutdown()` on a write half to make its peer see EOF.
#[must_use]
pub fn get_mock_socket_halves() -> MockSocket {
    let (client_stream, server_stream) = duplex(MOCK_SOCKET_BUFFER_SIZE);
    let (client_read, client_write) = split(client_stream);
    let (server_read, server_write) = split(server_stream);
    MockSocket {
        client_read,
        client_write,
        server_read,
        server_write,
    }
}
