// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{fmt::{Display, Formatter},
          path::Path,
          sync::Arc};

use miette::{IntoDiagnostic, WrapErr};
use shell_audit::{AccumulatorStats, AuditSink, AuditedReader, HijackAdapter, SessionConfig,
                  TracingAuditSink};
use shell_audit_schema::SessionMeta;
use tokio::{io::AsyncReadExt, sync::broadcast};

use crate::{CLIArg, HttpAuditSink};

/// Small enough that escape sequences regularly straddle two reads.
pub const DEFAULT_CHUNK_SIZE: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    pub session_id: String,
    pub bytes_read: usize,
    pub stats: AccumulatorStats,
}

impl Display for ReplayReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "session {}: {} bytes, {} commands, {} audit records stored, {} failed",
            self.session_id,
            self.bytes_read,
            self.stats.records,
            self.stats.flushes,
            self.stats.failed_flushes
        )
    }
}

impl ReplayReport {
    /// # Errors
    ///
    /// Returns an error if any transcript chunk was not stored by the sink.
    pub fn ensure_all_flushed(&self) -> miette::Result<()> {
        if self.stats.failed_flushes > 0 {
            miette::bail!(
                help = "Check the --endpoint URL and the log for the sink error",
                "{} of {} audit records could not be stored",
                self.stats.failed_flushes,
                self.stats.flushes + self.stats.failed_flushes
            );
        }
        Ok(())
    }
}

/// Reads `capture_file` through an [`AuditedReader`], `chunk_size` bytes at a time,
/// then waits for the session's final flush.
///
/// # Errors
///
/// Returns an error if the file can't be read or the accumulator task panicked.
pub async fn try_replay_capture<S: AuditSink>(
    capture_file: &Path,
    meta: SessionMeta,
    sink: Arc<S>,
    config: &SessionConfig,
    chunk_size: usize,
) -> miette::Result<ReplayReport> {
    let file = tokio::fs::File::open(capture_file)
        .await
        .into_diagnostic()
        .wrap_err_with(|| format!("Can't open capture {}", capture_file.display()))?;

    let (shutdown_sender, _) = broadcast::channel(1);
    let (adapter, join_handle) =
        HijackAdapter::start(meta, sink, config, shutdown_sender.subscribe());
    let session_id = adapter.session_id().to_owned();

    let mut reader = AuditedReader::new(file, adapter);
    let mut buf = vec![0_u8; chunk_size.max(1)];
    let mut bytes_read = 0;
    loop {
        let n = reader
            .read(&mut buf)
            .await
            .into_diagnostic()
            .wrap_err("Capture read failed")?;
        if n == 0 {
            break;
        }
        bytes_read += n;
    }
    drop(reader);

    let stats = join_handle
        .await
        .into_diagnostic()
        .wrap_err("Session accumulator task failed")?;

    let report = ReplayReport {
        session_id,
        bytes_read,
        stats,
    };
    tracing::info!(message = "replay finished", %report);
    Ok(report)
}

/// Runs `audit-replay` with the sink picked by `--endpoint`.
///
/// # Errors
///
/// See [`CLIArg::try_to_session_config`] and [`try_replay_capture`].
pub async fn try_run(cli_arg: &CLIArg) -> miette::Result<ReplayReport> {
    let config = cli_arg.try_to_session_config()?;
    let meta = cli_arg.session_options.to_session_meta();
    let capture_file = cli_arg.capture_file.as_path();

    match &cli_arg.endpoint {
        Some(endpoint) => {
            let sink = Arc::new(HttpAuditSink::new(endpoint.as_str()));
            try_replay_capture(capture_file, meta, sink, &config, cli_arg.chunk_size).await
        }
        None => {
            let sink = Arc::new(TracingAuditSink);
            try_replay_capture(capture_file, meta, sink, &config, cli_arg.chunk_size).await
        }
    }
}
