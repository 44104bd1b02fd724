//! git-verify-chain CLI library components.
//!
//! Exposes the command implementation for testing.

pub mod args;
pub mod gpg_home;
pub mod output;
pub mod user_config;
pub mod verify;
