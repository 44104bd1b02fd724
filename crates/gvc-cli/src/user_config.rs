//! Per-user configuration file location.
//!
//! Configuration never comes from the repository under verification: a
//! commit in the range could otherwise pick the programs that check it.

use directories::ProjectDirs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.toml";

/// `<user config dir>/git-verify-chain/config.toml`, e.g.
/// `~/.config/git-verify-chain/config.toml` on Linux.
pub fn user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "git-verify-chain").map(|dirs| config_file_in(dirs.config_dir()))
}

fn config_file_in(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_in() {
        assert_eq!(
            config_file_in(Path::new("/home/dev/.config/git-verify-chain")),
            PathBuf::from("/home/dev/.config/git-verify-chain/config.toml")
        );
    }
}
