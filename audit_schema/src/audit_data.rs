// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const AUDIT_SCOPE_ORG: &str = "org";
pub const AUDIT_TEMPLATE_KUBECTL_SHELL: &str = "kubectlShell";
pub const AUDIT_RESULT_SUCCESS: &str = "success";

/// Who opened the shell session and what it is attached to. The host fills this in from
/// the intercepted request; nothing here is derived from the byte stream.
#[rustfmt::skip]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionMeta {
    pub session_id: String,    /* generated per session, used to correlate log lines */
    pub cluster_name: String,
    pub namespace: String,
    pub resource_name: String, /* pod name */
    pub container: String,
    pub user_id: String,
    pub org_id: u64,
    pub client_ip: String,
    pub user_agent: String,
}

impl SessionMeta {
    /// Creates metadata for a new session with a random `session_id`. Use struct update
    /// syntax to fill in the rest.
    #[must_use]
    pub fn new_with_session_id() -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            ..Default::default()
        }
    }
}

/// Key value pairs the audit frontend uses to render a shell session entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditContext {
    pub cluster_name: String,
    pub namespace: String,
    pub name: String,
    pub container: String,
    pub session_id: String,
    /// Newline joined, timestamp prefixed commands. See `SessionTranscript` in
    /// `shell_audit`.
    pub commands: String,
}

#[rustfmt::skip]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub user_id: String,
    pub scope_type: String,     /* always "org" for shell sessions */
    pub scope_id: u64,
    pub org_id: u64,
    pub context: AuditContext,
    pub template_name: String,  /* frontend template used to render this record */
    pub result: String,
    pub start_time: String,     /* unix seconds */
    pub end_time: String,       /* unix seconds */
    pub client_ip: String,
    pub user_agent: String,
}

impl AuditRecord {
    /// Builds the record for one flushed transcript chunk. `start` is when the chunk
    /// began accumulating and `end` is when it was flushed.
    #[must_use]
    pub fn new(
        meta: &SessionMeta,
        commands: String,
        start: SystemTime,
        end: SystemTime,
    ) -> Self {
        Self {
            user_id: meta.user_id.clone(),
            scope_type: AUDIT_SCOPE_ORG.to_string(),
            scope_id: meta.org_id,
            org_id: meta.org_id,
            context: AuditContext {
                cluster_name: meta.cluster_name.clone(),
                namespace: meta.namespace.clone(),
                name: meta.resource_name.clone(),
                container: meta.container.clone(),
                session_id: meta.session_id.clone(),
                commands,
            },
            template_name: AUDIT_TEMPLATE_KUBECTL_SHELL.to_string(),
            result: AUDIT_RESULT_SUCCESS.to_string(),
            start_time: unix_seconds(start).to_string(),
            end_time: unix_seconds(end).to_string(),
            client_ip: meta.client_ip.clone(),
            user_agent: meta.user_agent.clone(),
        }
    }
}

/// The body of the audit backend's create endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AuditCreateRequest {
    pub audits: AuditRecord,
}

impl From<AuditRecord> for AuditCreateRequest {
    fn from(audits: AuditRecord) -> Self { Self { audits } }
}

fn unix_seconds(time: SystemTime) -> u64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(duration_since_epoch) => duration_since_epoch.as_secs(),
        Err(_) => 0,
    }
}
