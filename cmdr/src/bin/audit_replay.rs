// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use audit_cmdr::{CLIArg, try_run};
use clap::Parser;
use shell_audit::try_initialize_logging_global;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> miette::Result<()> {
    // If no args are passed, help is printed thanks to `arg_required_else_help(true)`.
    let cli_arg = CLIArg::parse();

    try_initialize_logging_global(cli_arg.log_options.to_tracing_config())?;
    // % is Display, ? is Debug.
    tracing::debug!(message = "Start logging...", cli_arg = ?cli_arg);

    let report = try_run(&cli_arg).await?;
    println!("{report}");

    report.ensure_all_flushed()
}
