// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{sync::Arc, time::Duration};

use shell_audit_schema::{AuditRecord, SessionMeta};
use tokio::{sync::{broadcast, mpsc::UnboundedReceiver, oneshot},
            task::JoinHandle};

use crate::{AuditSink, AuditSinkError, CommandRecord, SessionConfig, SessionTranscript};

/// What a session's accumulator task did, returned when it exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccumulatorStats {
    pub records: usize,
    pub flushes: usize,
    pub failed_flushes: usize,
}

/// Batches [`CommandRecord`]s into a [`SessionTranscript`] and hands chunks to an
/// [`AuditSink`]. Owned by the task started with [`spawn_session_accumulator`].
#[derive(Debug)]
pub struct SessionAccumulator<S: AuditSink> {
    meta: SessionMeta,
    sink: Arc<S>,
    sink_timeout: Duration,
    transcript: SessionTranscript,
    stats: AccumulatorStats,
}

impl<S: AuditSink> SessionAccumulator<S> {
    #[must_use]
    pub fn new(meta: SessionMeta, sink: Arc<S>, config: &SessionConfig) -> Self {
        Self {
            meta,
            sink,
            sink_timeout: config.sink_timeout(),
            transcript: SessionTranscript::new(config.max_audit_length),
            stats: AccumulatorStats::default(),
        }
    }

    #[must_use]
    pub fn stats(&self) -> AccumulatorStats { self.stats }

    /// Appends `record`, flushing right away if the transcript crossed its limit.
    pub async fn on_record(&mut self, record: &CommandRecord) {
        self.stats.records += 1;
        if self.transcript.push(record) {
            self.flush().await;
        }
    }

    /// Sends whatever has accumulated to the sink. An empty transcript is not sent.
    /// Failures (including a sink that doesn't answer in time) are logged and the chunk
    /// is dropped.
    pub async fn flush(&mut self) {
        let Some(chunk) = self.transcript.take() else {
            return;
        };
        let bytes = chunk.commands.len();
        let record =
            AuditRecord::new(&self.meta, chunk.commands, chunk.started_at, chunk.ended_at);

        let result =
            match tokio::time::timeout(self.sink_timeout, self.sink.persist(record)).await {
                Ok(result) => result,
                Err(_) => Err(AuditSinkError::Timeout {
                    timeout_ms: u64::try_from(self.sink_timeout.as_millis())
                        .unwrap_or(u64::MAX),
                }),
            };

        match result {
            Ok(()) => {
                self.stats.flushes += 1;
                tracing::info!(
                    message = "audit transcript flushed",
                    session_id = %self.meta.session_id,
                    bytes
                );
            }
            Err(error) => {
                self.stats.failed_flushes += 1;
                tracing::warn!(
                    message = "audit transcript dropped",
                    session_id = %self.meta.session_id,
                    bytes,
                    error = %error
                );
            }
        }
    }
}

/// Starts the accumulator task for one session.
///
/// The task ends, after a final flush, on whichever comes first:
/// - `close_receiver` fires (or its sender, the dispatcher, is dropped),
/// - `shutdown_receiver` fires (or its sender is dropped),
/// - the record channel closes.
///
/// Records already queued at that point are included in the final flush.
pub fn spawn_session_accumulator<S: AuditSink>(
    meta: SessionMeta,
    sink: Arc<S>,
    config: &SessionConfig,
    mut record_receiver: UnboundedReceiver<CommandRecord>,
    mut close_receiver: oneshot::Receiver<()>,
    mut shutdown_receiver: broadcast::Receiver<()>,
) -> JoinHandle<AccumulatorStats> {
    let mut accumulator = SessionAccumulator::new(meta, sink, config);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                // Records first, so nothing typed before a close is lost.
                biased;

                maybe_record = record_receiver.recv() => match maybe_record {
                    Some(record) => accumulator.on_record(&record).await,
                    None => {
                        tracing::debug!(message = "record channel closed");
                        break;
                    }
                },

                _ = &mut close_receiver => {
                    tracing::debug!(message = "session closed");
                    break;
                }

                _ = shutdown_receiver.recv() => {
                    tracing::debug!(message = "session shutdown");
                    break;
                }
            }
        }

        while let Ok(record) = record_receiver.try_recv() {
            accumulator.on_record(&record).await;
        }
        accumulator.flush().await;

        let stats = accumulator.stats();
        tracing::info!(message = "session accumulator exited", ?stats);
        stats
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc;

    use super::*;
    use crate::{InMemoryAuditSink, StalledAuditSink};

    struct Channels {
        records: mpsc::UnboundedSender<CommandRecord>,
        close: oneshot::Sender<()>,
        shutdown: broadcast::Sender<()>,
    }

    fn start<S: AuditSink>(
        sink: Arc<S>,
        config: &SessionConfig,
    ) -> (Channels, JoinHandle<AccumulatorStats>) {
        let (records, record_receiver) = mpsc::unbounded_channel();
        let (close, close_receiver) = oneshot::channel();
        let (shutdown, shutdown_receiver) = broadcast::channel(1);
        let join_handle = spawn_session_accumulator(
            SessionMeta::new_with_session_id(),
            sink,
            config,
            record_receiver,
            close_receiver,
            shutdown_receiver,
        );
        (
            Channels {
                records,
                close,
                shutdown,
            },
            join_handle,
        )
    }

    #[tokio::test]
    async fn test_close_flushes_pending_records() {
        let sink = Arc::new(InMemoryAuditSink::default());
        let (channels, join_handle) = start(sink.clone(), &SessionConfig::default());

        channels.records.send(CommandRecord::new("ls")).unwrap();
        channels.records.send(CommandRecord::new("pwd")).unwrap();
        channels.close.send(()).unwrap();

        let stats = join_handle.await.unwrap();
        assert_eq!(
            stats,
            AccumulatorStats {
                records: 2,
                flushes: 1,
                failed_flushes: 0
            }
        );

        let records = sink.records();
        assert_eq!(records.len(), 1);
        let commands = &records[0].context.commands;
        assert!(commands.starts_with('\n'));
        assert!(commands.ends_with(": pwd"));
        assert_eq!(commands.matches('\n').count(), 2);
        drop(channels.shutdown);
    }

    #[tokio::test]
    async fn test_shutdown_with_empty_transcript_does_not_flush() {
        let sink = Arc::new(InMemoryAuditSink::default());
        let (channels, join_handle) = start(sink.clone(), &SessionConfig::default());

        channels.shutdown.send(()).unwrap();

        let stats = join_handle.await.unwrap();
        assert_eq!(stats, AccumulatorStats::default());
        assert!(sink.records().is_empty());
        drop(channels.records);
    }

    #[tokio::test]
    async fn test_flushes_when_limit_is_crossed() {
        let sink = Arc::new(InMemoryAuditSink::default());
        let config = SessionConfig {
            max_audit_length: 1_000,
            ..Default::default()
        };
        let (channels, join_handle) = start(sink.clone(), &config);

        let command = "x".repeat(100);
        for _ in 0..25 {
            channels.records.send(CommandRecord::new(command.clone())).unwrap();
        }
        drop(channels.records);

        let stats = join_handle.await.unwrap();
        assert_eq!(stats.records, 25);
        assert!(stats.flushes >= 2);

        // One line is 1 + 19 + 2 + 100 bytes.
        let line = 122;
        let records = sink.records();
        for record in &records[..records.len() - 1] {
            assert!(record.context.commands.len() > 1_000);
            assert!(record.context.commands.len() <= 1_000 + line);
        }
        let total: usize = records.iter().map(|it| it.context.commands.len()).sum();
        assert_eq!(total, 25 * line);
        drop(channels.close);
    }

    #[tokio::test]
    async fn test_sink_failure_is_counted_and_session_continues() {
        let sink = Arc::new(InMemoryAuditSink::failing());
        let config = SessionConfig {
            max_audit_length: 10,
            ..Default::default()
        };
        let (channels, join_handle) = start(sink.clone(), &config);

        channels.records.send(CommandRecord::new("first")).unwrap();
        channels.records.send(CommandRecord::new("second")).unwrap();
        channels.close.send(()).unwrap();

        let stats = join_handle.await.unwrap();
        assert_eq!(stats.records, 2);
        assert_eq!(stats.flushes, 0);
        assert_eq!(stats.failed_flushes, 2);
        drop(channels.shutdown);
    }

    #[tokio::test]
    async fn test_stalled_sink_times_out() {
        let config = SessionConfig {
            sink_timeout_ms: 20,
            ..Default::default()
        };
        let (channels, join_handle) = start(Arc::new(StalledAuditSink), &config);

        channels.records.send(CommandRecord::new("sleep 1000")).unwrap();
        channels.close.send(()).unwrap();

        let stats = join_handle.await.unwrap();
        assert_eq!(stats.failed_flushes, 1);
        drop(channels.shutdown);
    }

    #[tokio::test]
    async fn test_dropped_close_sender_ends_session() {
        let sink = Arc::new(InMemoryAuditSink::default());
        let (channels, join_handle) = start(sink.clone(), &SessionConfig::default());

        channels.records.send(CommandRecord::new("exit")).unwrap();
        drop(channels.close);

        let stats = join_handle.await.unwrap();
        assert_eq!(stats.flushes, 1);
        assert_eq!(sink.records().len(), 1);
        drop(channels.records);
        drop(channels.shutdown);
    }
}
