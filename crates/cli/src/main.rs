// gdoc CLI entry point.

use std::process;

use clap::{Args, Parser};
use tracing_subscriber::EnvFilter;

mod auth;
mod banner;
mod commands;
mod config;
mod drive;
mod exit_code;
mod output;
mod session;

use exit_code::ExitCode;
use output::OutputFormat;
use session::Session;

const LOG_ENV: &str = "GDOC_LOG";

#[derive(Parser)]
#[command(
    name = "gdoc",
    version,
    about = "Read, edit, and comment on Google Docs with change awareness"
)]
struct Cli {
    #[command(flatten)]
    globals: GlobalArgs,

    #[command(subcommand)]
    command: commands::Command,
}

/// Flags accepted by every subcommand.
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Skip the pre-flight change check.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Machine-readable JSON on stdout.
    #[arg(long, global = true)]
    pub json: bool,

    /// Extra detail in human output.
    #[arg(long, global = true)]
    pub verbose: bool,
}

fn main() -> process::ExitCode {
    init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::Usage.into()
            } else {
                ExitCode::Success.into()
            };
        }
    };

    let format = OutputFormat::detect(cli.globals.json);
    let result = Session::new(&cli.globals).and_then(|session| commands::run(cli.command, &session));
    match result {
        Ok(status) => status.into(),
        Err(err) => {
            tracing::debug!(error = ?err, "command failed");
            output::print_anyhow_error(format, &err);
            ExitCode::from_error(&err).into()
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
