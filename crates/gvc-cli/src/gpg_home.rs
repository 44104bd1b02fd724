//! Default GnuPG home resolution.
//!
//! This is the only place the invoking environment is consulted for a trust
//! store location.

use std::ffi::OsString;
use std::path::PathBuf;

/// `$GNUPGHOME` if set and non-empty, else `<home>/.gnupg`.
pub fn default_gpg_home() -> Option<PathBuf> {
    let home = directories::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf());
    resolve(std::env::var_os(gvc_core::GNUPGHOME), home)
}

fn resolve(gnupghome: Option<OsString>, home: Option<PathBuf>) -> Option<PathBuf> {
    match gnupghome {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => home.map(|home| home.join(".gnupg")),
    }
}
