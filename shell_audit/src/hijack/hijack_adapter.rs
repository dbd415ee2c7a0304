// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{fmt::{Debug, Formatter},
          io::Result,
          pin::Pin,
          sync::Arc,
          task::{Context, Poll}};

use shell_audit_schema::SessionMeta;
use tokio::{io::{AsyncRead, ReadBuf},
            sync::{broadcast, mpsc, oneshot},
            task::JoinHandle};

use crate::{AccumulatorStats, AuditSink, CommandHistory, Dispatcher, EditBuffer,
            FrameDecoder, SessionConfig, TerminalEventHandler, VtInputPerformer,
            VtInputState, create_frame_decoder, spawn_session_accumulator};

/// One audited session, as seen from the connection that carries it.
///
/// Owns the read side of the pipeline (frame decoder, [`vte::Parser`],
/// [`Dispatcher`]) and is driven synchronously by whoever reads the connection. The
/// accumulator runs as its own task, started by [`HijackAdapter::start`].
///
/// Dropping the adapter closes the session just like [`HijackAdapter::close`].
pub struct HijackAdapter {
    session_id: String,
    decoder: Box<dyn FrameDecoder>,
    parser: vte::Parser,
    vt_state: VtInputState,
    dispatcher: Dispatcher,
}

impl Debug for HijackAdapter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HijackAdapter")
            .field("session_id", &self.session_id)
            .field("vt_state", &self.vt_state)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

impl HijackAdapter {
    /// Wires up a session and spawns its accumulator. Must be called from inside a
    /// tokio runtime.
    ///
    /// The [`JoinHandle`] resolves once the session is closed (or `shutdown_receiver`
    /// fires) and the final flush is done.
    pub fn start<S: AuditSink>(
        meta: SessionMeta,
        sink: Arc<S>,
        config: &SessionConfig,
        shutdown_receiver: broadcast::Receiver<()>,
    ) -> (Self, JoinHandle<AccumulatorStats>) {
        let decoder = create_frame_decoder(config.stream_encoding);
        Self::start_with_decoder(meta, sink, config, decoder, shutdown_receiver)
    }

    /// [`HijackAdapter::start`] with a host supplied [`FrameDecoder`].
    pub fn start_with_decoder<S: AuditSink>(
        meta: SessionMeta,
        sink: Arc<S>,
        config: &SessionConfig,
        decoder: Box<dyn FrameDecoder>,
        shutdown_receiver: broadcast::Receiver<()>,
    ) -> (Self, JoinHandle<AccumulatorStats>) {
        let (record_sender, record_receiver) = mpsc::unbounded_channel();
        let (close_sender, close_receiver) = oneshot::channel();

        let session_id = meta.session_id.clone();
        tracing::info!(
            message = "audited session started",
            session_id = %session_id,
            cluster = %meta.cluster_name,
            namespace = %meta.namespace,
            resource = %meta.resource_name,
            encoding = %config.stream_encoding
        );

        let join_handle = spawn_session_accumulator(
            meta,
            sink,
            config,
            record_receiver,
            close_receiver,
            shutdown_receiver,
        );

        let dispatcher = Dispatcher::new(
            EditBuffer::new(config.buffer_max_size),
            CommandHistory::new(config.history_max_size, config.buffer_max_size),
            record_sender,
            close_sender,
        );

        let adapter = Self {
            session_id,
            decoder,
            parser: vte::Parser::new(),
            vt_state: VtInputState::default(),
            dispatcher,
        };
        (adapter, join_handle)
    }

    #[must_use]
    pub fn session_id(&self) -> &str { &self.session_id }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher { &self.dispatcher }

    #[must_use]
    pub fn is_closed(&self) -> bool { self.dispatcher.is_closed() }

    /// Feeds bytes read from the connection, still in their transport framing.
    pub fn feed(&mut self, chunk: &[u8]) {
        for stdin in self.decoder.decode(chunk) {
            match stdin {
                Ok(bytes) => self.feed_stdin(&bytes),
                Err(error) => tracing::warn!(
                    message = "undecodable input skipped",
                    session_id = %self.session_id,
                    error = %error
                ),
            }
        }
    }

    /// Feeds terminal input that is already de-framed.
    pub fn feed_stdin(&mut self, bytes: &[u8]) {
        let mut performer = VtInputPerformer::new(&mut self.dispatcher, &mut self.vt_state);
        self.parser.advance(&mut performer, bytes);
    }

    /// Ends the session. The accumulator flushes and exits. Idempotent.
    pub fn close(&mut self) {
        if self.dispatcher.is_closed() {
            return;
        }
        tracing::debug!(message = "closing audited session", session_id = %self.session_id);
        if let Err(error) = self.dispatcher.close() {
            tracing::warn!(message = "close failed", error = %error);
        }
    }
}

/// Wraps the read half of an intercepted connection. Bytes pass through to the caller
/// unchanged and are also fed to a [`HijackAdapter`].
///
/// The session is closed on EOF, on a read error, or when the reader is dropped.
#[derive(Debug)]
pub struct AuditedReader<R> {
    inner: R,
    adapter: HijackAdapter,
}

impl<R: AsyncRead + Unpin> AuditedReader<R> {
    pub fn new(inner: R, adapter: HijackAdapter) -> Self { Self { inner, adapter } }

    #[must_use]
    pub fn adapter(&self) -> &HijackAdapter { &self.adapter }
}

impl<R: AsyncRead + Unpin> AsyncRead for AuditedReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<Result<()>> {
        let this = self.get_mut();
        let filled_before = buf.filled().len();
        let has_room = buf.remaining() > 0;

        match Pin::new(&mut this.inner).poll_read(cx, buf) {
            Poll::Ready(Ok(())) => {
                let read = &buf.filled()[filled_before..];
                if !read.is_empty() {
                    this.adapter.feed(read);
                } else if has_room {
                    // EOF.
                    this.adapter.close();
                }
                Poll::Ready(Ok(()))
            }
            Poll::Ready(Err(error)) => {
                tracing::debug!(message = "audited read failed", error = %error);
                this.adapter.close();
                Poll::Ready(Err(error))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
