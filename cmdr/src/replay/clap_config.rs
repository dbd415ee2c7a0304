// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::path::PathBuf;

use clap::{Args, Parser, ValueEnum};
use miette::WrapErr;
use shell_audit::{DisplayPreference, SessionConfig, StreamEncoding, TracingConfig,
                  WriterConfig};
use shell_audit_schema::SessionMeta;
use tracing_core::LevelFilter;

use crate::DEFAULT_CHUNK_SIZE;

#[derive(Debug, Parser)]
#[command(bin_name = "audit-replay")]
#[command(
    about = "Replays a captured shell session and audits the commands typed into it"
)]
#[command(version)]
#[command(next_line_help = true)]
#[command(arg_required_else_help(true))]
/// More info:
/// - <https://docs.rs/clap/latest/clap/_derive/#overview>
pub struct CLIArg {
    #[arg(
        value_name = "CAPTURE_FILE",
        help = "Bytes sent by the client, as read off the connection"
    )]
    pub capture_file: PathBuf,

    #[arg(long, short = 'c', help = "Session config JSON file; flags override it")]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        short = 'e',
        help = "Framing of the capture: `k8s_websocket` or `raw`"
    )]
    pub encoding: Option<StreamEncoding>,

    #[arg(
        long,
        help = "Audit create endpoint, eg: `https://audit.example.com/api/audits`. Records are logged when omitted"
    )]
    pub endpoint: Option<String>,

    #[arg(
        long,
        default_value_t = DEFAULT_CHUNK_SIZE,
        help = "Read the capture in chunks of this many bytes, like a socket would"
    )]
    pub chunk_size: usize,

    #[command(flatten)]
    pub session_options: SessionOption,

    #[command(flatten)]
    pub log_options: LogOption,
}

#[derive(Debug, Args)]
pub struct SessionOption {
    #[arg(long, default_value = "", help = "Cluster the shell was opened in")]
    pub cluster: String,

    #[arg(long, default_value = "")]
    pub namespace: String,

    #[arg(long, default_value = "", help = "Pod name")]
    pub resource: String,

    #[arg(long, default_value = "")]
    pub container: String,

    #[arg(long, default_value = "")]
    pub user_id: String,

    #[arg(long, default_value_t = 0)]
    pub org_id: u64,
}

#[derive(Debug, Args)]
pub struct LogOption {
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    #[arg(long, help = "Also write the log to this file")]
    pub log_file: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(it: LogLevel) -> Self {
        match it {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

impl LogOption {
    /// Logs go to stderr, so that stdout only carries the replay summary.
    #[must_use]
    pub fn to_tracing_config(&self) -> TracingConfig {
        let writer_config = match &self.log_file {
            Some(path) => WriterConfig::DisplayAndFile(DisplayPreference::Stderr, path.clone()),
            None => WriterConfig::Display(DisplayPreference::Stderr),
        };
        TracingConfig {
            writer_config,
            level_filter: self.log_level.into(),
        }
    }
}

impl SessionOption {
    #[must_use]
    pub fn to_session_meta(&self) -> SessionMeta {
        SessionMeta {
            cluster_name: self.cluster.clone(),
            namespace: self.namespace.clone(),
            resource_name: self.resource.clone(),
            container: self.container.clone(),
            user_id: self.user_id.clone(),
            org_id: self.org_id,
            user_agent: format!("audit-replay/{}", env!("CARGO_PKG_VERSION")),
            ..SessionMeta::new_with_session_id()
        }
    }
}

impl CLIArg {
    /// The config file (or defaults), with command line overrides applied.
    ///
    /// # Errors
    ///
    /// Returns an error if `--config` names a file that can't be loaded.
    pub fn try_to_session_config(&self) -> miette::Result<SessionConfig> {
        let mut config = match &self.config {
            Some(path) => SessionConfig::try_load_from_file(path)
                .wrap_err("Could not load the --config file")?,
            None => SessionConfig::default(),
        };
        if let Some(encoding) = self.encoding {
            config.stream_encoding = encoding;
        }
        Ok(config)
    }
}
