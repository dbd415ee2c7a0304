// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::future::Future;

use shell_audit_schema::AuditRecord;

use crate::ok;

#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum AuditSinkError {
    #[error("audit request failed: {0}")]
    #[diagnostic(
        code(shell_audit::sink::request),
        help("Check that the audit endpoint is reachable")
    )]
    Request(String),

    #[error("audit backend rejected the record with status {status}")]
    #[diagnostic(code(shell_audit::sink::rejected))]
    Rejected { status: u16 },

    #[error("audit sink did not respond within {timeout_ms} ms")]
    #[diagnostic(code(shell_audit::sink::timeout))]
    Timeout { timeout_ms: u64 },

    #[error(transparent)]
    #[diagnostic(code(shell_audit::sink::serialize))]
    Serialize(#[from] serde_json::Error),
}

/// Where flushed transcript chunks are stored. Called from the session's accumulator
/// task, at most once per flush; failures are logged by the caller and not retried.
pub trait AuditSink: Send + Sync + 'static {
    /// # Errors
    ///
    /// Any [`AuditSinkError`]. The record is dropped.
    fn persist(
        &self,
        record: AuditRecord,
    ) -> impl Future<Output = Result<(), AuditSinkError>> + Send;
}

/// Writes each record to the log at `INFO`. Useful when no audit backend is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    async fn persist(&self, record: AuditRecord) -> Result<(), AuditSinkError> {
        let json = serde_json::to_string(&record)?;
        tracing::info!(
            message = "audit record",
            session_id = %record.context.session_id,
            record = %json
        );
        ok!()
    }
}

#[cfg(test)]
mod tests {
    use std::time::UNIX_EPOCH;

    use shell_audit_schema::SessionMeta;

    use super::*;

    #[tokio::test]
    async fn test_tracing_sink_accepts_record() {
        let record =
            AuditRecord::new(&SessionMeta::default(), "\nls".into(), UNIX_EPOCH, UNIX_EPOCH);
        assert!(TracingAuditSink.persist(record).await.is_ok());
    }
}
