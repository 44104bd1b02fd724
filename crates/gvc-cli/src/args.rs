//! Command-line arguments.

use clap::Parser;
use std::path::PathBuf;

/// Verify that every commit in a range is signed by a trusted key.
#[derive(Parser, Debug)]
#[command(name = "git-verify-chain", author = "git-verify-chain Contributors", version)]
pub struct Args {
    /// Commit or tag name to verify from (exclusive).
    #[arg(long)]
    pub from: String,

    /// Commit or tag name to verify up to (inclusive).
    #[arg(long, default_value = "HEAD")]
    pub to: String,

    /// Repository to verify (default: current directory).
    #[arg(long)]
    pub repo: Option<PathBuf>,

    /// Absolute path of a directory with exported public key files.
    #[arg(long)]
    pub keys_dir: Option<PathBuf>,

    /// Extension of key files in --keys-dir (default from config: gpg).
    #[arg(long)]
    pub key_ext: Option<String>,

    /// Absolute path of an existing GnuPG home directory.
    #[arg(long, conflicts_with = "keys_dir")]
    pub gpg_home: Option<PathBuf>,

    /// Configuration file (default: the per-user config file, if present).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_is_required() {
        assert!(Args::try_parse_from(["git-verify-chain"]).is_err());
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["git-verify-chain", "--from", "v0.12.0"]).unwrap();
        assert_eq!(args.from, "v0.12.0");
        assert_eq!(args.to, "HEAD");
        assert!(args.keys_dir.is_none());
        assert!(args.gpg_home.is_none());
        assert!(!args.json);
    }

    #[test]
    fn test_keys_dir_conflicts_with_gpg_home() {
        let result = Args::try_parse_from([
            "git-verify-chain",
            "--from",
            "v1",
            "--keys-dir",
            "/keys",
            "--gpg-home",
            "/home/me/.gnupg",
        ]);
        assert!(result.is_err());
    }
}
