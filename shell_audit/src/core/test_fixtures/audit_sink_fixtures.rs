// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::sync::{Mutex, PoisonError};

use shell_audit_schema::AuditRecord;

use crate::{AuditSink, AuditSinkError};

/// Status reported by [`InMemoryAuditSink::failing`].
pub const FAILING_SINK_STATUS: u16 = 503;

/// Keeps every persisted record so tests can inspect them.
#[derive(Debug, Default)]
pub struct InMemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
    reject_all: bool,
}

impl InMemoryAuditSink {
    /// A sink that rejects every record with [`AuditSinkError::Rejected`].
    #[must_use]
    pub fn failing() -> Self {
        Self {
            reject_all: true,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AuditSink for InMemoryAuditSink {
    async fn persist(&self, record: AuditRecord) -> Result<(), AuditSinkError> {
        if self.reject_all {
            return Err(AuditSinkError::Rejected {
                status: FAILING_SINK_STATUS,
            });
        }
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
        Ok(())
    }
}

/// Never answers. Exercises the accumulator's sink timeout.
#[derive(Debug, Clone, Copy, Default)]
pub struct StalledAuditSink;

impl AuditSink for StalledAuditSink {
    async fn persist(&self, _record: AuditRecord) -> Result<(), AuditSinkError> {
        std::future::pending().await
    }
}
