// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use reqwest::Client;
use shell_audit::{AuditSink, AuditSinkError};
use shell_audit_schema::{AuditCreateRequest, AuditRecord};

use crate::http_client;

/// Sends each flushed transcript to the audit backend's create endpoint, wrapped in an
/// [`AuditCreateRequest`].
#[derive(Debug, Clone)]
pub struct HttpAuditSink {
    endpoint: String,
    client: Client,
}

impl HttpAuditSink {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: Client::new(),
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> &str { &self.endpoint }
}

impl AuditSink for HttpAuditSink {
    async fn persist(&self, record: AuditRecord) -> Result<(), AuditSinkError> {
        let body = serde_json::to_value(AuditCreateRequest::from(record))?;
        match http_client::make_post_request(&self.client, &self.endpoint, &body).await {
            Ok(_) => Ok(()),
            Err(error) => match error.status() {
                Some(status) => Err(AuditSinkError::Rejected {
                    status: status.as_u16(),
                }),
                None => Err(AuditSinkError::Request(error.to_string())),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::UNIX_EPOCH;

    use pretty_assertions::assert_eq;
    use shell_audit_schema::SessionMeta;
    use tokio::{io::{AsyncReadExt, AsyncWriteExt},
                net::TcpListener,
                task::JoinHandle};

    use super::*;

    const HEADER_END: &[u8] = b"\r\n\r\n";

    /// Answers one request with `status_line` and returns the request body.
    async fn serve_once(status_line: &'static str) -> (String, JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/api/audits", listener.local_addr().unwrap());

        let join_handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = vec![];
            let mut buf = [0_u8; 1024];

            let header_len = loop {
                let n = stream.read(&mut buf).await.unwrap();
                assert!(n > 0, "connection closed before headers");
                request.extend_from_slice(&buf[..n]);
                if let Some(pos) = request.windows(4).position(|it| it == HEADER_END) {
                    break pos + HEADER_END.len();
                }
            };
            let headers = String::from_utf8_lossy(&request[..header_len]).to_lowercase();
            let content_length: usize = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .map(|it| it.trim().parse().unwrap())
                .unwrap_or(0);
            while request.len() < header_len + content_length {
                let n = stream.read(&mut buf).await.unwrap();
                assert!(n > 0, "connection closed before body");
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!("{status_line}\r\ncontent-length: 0\r\n\r\n");
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
            request[header_len..].to_vec()
        });

        (url, join_handle)
    }

    fn record() -> AuditRecord {
        let meta = SessionMeta {
            session_id: "sid-1".into(),
            user_id: "42".into(),
            org_id: 3,
            ..Default::default()
        };
        AuditRecord::new(&meta, "\n2024-01-02 03:04:05: ls".into(), UNIX_EPOCH, UNIX_EPOCH)
    }

    #[tokio::test]
    async fn test_persist_posts_create_request() {
        let (url, join_handle) = serve_once("HTTP/1.1 200 OK").await;
        let sink = HttpAuditSink::new(url);

        sink.persist(record()).await.unwrap();

        let body: serde_json::Value = serde_json::from_slice(&join_handle.await.unwrap()).unwrap();
        assert_eq!(body["audits"]["userId"], "42");
        assert_eq!(body["audits"]["scopeType"], "org");
        assert_eq!(body["audits"]["scopeId"], 3);
        assert_eq!(body["audits"]["context"]["sessionId"], "sid-1");
        assert_eq!(
            body["audits"]["context"]["commands"],
            "\n2024-01-02 03:04:05: ls"
        );
    }

    #[tokio::test]
    async fn test_error_status_is_rejected() {
        let (url, join_handle) = serve_once("HTTP/1.1 500 Internal Server Error").await;
        let sink = HttpAuditSink::new(url);

        let result = sink.persist(record()).await;
        assert!(matches!(result, Err(AuditSinkError::Rejected { status: 500 })));
        join_handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_request_error() {
        // Bind then drop, so nothing listens on the port.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/api/audits", listener.local_addr().unwrap());
        drop(listener);

        let result = HttpAuditSink::new(url).persist(record()).await;
        assert!(matches!(result, Err(AuditSinkError::Request(_))));
    }
}
