//! Human-readable and JSON reporting.

use colored::Colorize;
use gvc_core::{ChainError, ConfigError, TrustSource, VerificationOutcome, VerificationReport};

/// Print the final report to stdout.
pub fn print_report(report: &VerificationReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", report.to_json()?);
        return Ok(());
    }

    match &report.outcome {
        VerificationOutcome::AllVerified => {
            println!(
                "{} {} commits in {} verified ({})",
                "✓".green().bold(),
                report.commits,
                report.range,
                describe_trust(&report.trust)
            );
            println!("{}", "OK".green().bold());
        }
        VerificationOutcome::FirstBadCommit { commit, diagnostic } => {
            eprintln!(
                "{} failed to verify commit {:?}:",
                "✗".red().bold(),
                commit.as_str()
            );
            if !diagnostic.is_empty() {
                eprintln!("{diagnostic}");
            }
        }
    }
    Ok(())
}

/// Print a failure that kept verification from producing a report.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {}", "error:".red().bold(), render_error(err));
}

/// Library errors already carry their cause in the message; anything else
/// gets its context chain spelled out.
fn render_error(err: &anyhow::Error) -> String {
    if err.downcast_ref::<ChainError>().is_some() || err.downcast_ref::<ConfigError>().is_some() {
        err.to_string()
    } else {
        format!("{err:#}")
    }
}

fn describe_trust(trust: &TrustSource) -> String {
    match trust {
        TrustSource::Files { dir, imported } => {
            format!("{imported} keys from {}", dir.display())
        }
        TrustSource::Keyring { home } => format!("keyring {}", home.display()),
    }
}
