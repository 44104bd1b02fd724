use clap::Parser;
use gvc_cli::args::Args;
use gvc_cli::output::{print_error, print_report};
use gvc_cli::verify::{run, Exit};
use gvc_core::CancellationToken;
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    // SIGINT/SIGTERM stop the running child and unwind, so the ephemeral
    // keyring is removed before exit.
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    if let Err(err) = ctrlc::set_handler(move || on_signal.cancel()) {
        warn!("failed to install signal handler: {err}");
    }

    let exit = match run(&args, &cancel) {
        Ok(report) => match print_report(&report, args.json) {
            Ok(()) if report.is_verified() => Exit::Verified,
            Ok(()) => Exit::BadCommit,
            Err(err) => {
                print_error(&err);
                Exit::Internal
            }
        },
        Err(err) => {
            print_error(&err);
            Exit::from_error(&err)
        }
    };
    exit.into()
}

/// Logs go to stderr so stdout carries only the report.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
