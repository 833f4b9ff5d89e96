//! snoopy CLI entry point.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use snoopy::cli::{list_protocols, Args, Config};
use snoopy_core::default_registry;

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // --help and --version land here too
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    // Set up logging; stdout is reserved for packets
    let filter = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(io::stderr)
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("snoopy: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let registry = default_registry();

    if let Some(name) = args.list_protocols.as_deref() {
        let mut stdout = io::stdout().lock();
        list_protocols(&registry, Some(name), &mut stdout)?;
        stdout.flush()?;
        return Ok(());
    }

    let config = Config::try_from(args)?;
    snoopy::run(&config, &registry, io::stdout().lock(), io::stderr())?;
    Ok(())
}
