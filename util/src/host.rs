//! Host platform utility functions

use std::path::PathBuf;
use thiserror::Error;

/// Name of the environment variable pointing at the software root directory.
pub const SW_ROOT_ENV_VAR: &str = "SLONAV_SW_ROOT";

/// Errors raised while querying the host.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("The software root environment variable ({0}) is not set")]
    SwRootNotSet(&'static str),

    #[error("The software root ({0:?}) is not a directory")]
    SwRootNotDir(PathBuf),
}

/// Get the software root directory.
///
/// Parameter files and session directories are resolved relative to it.
pub fn get_sw_root() -> Result<PathBuf, HostError> {
    let root = match std::env::var_os(SW_ROOT_ENV_VAR) {
        Some(r) => PathBuf::from(r),
        None => return Err(HostError::SwRootNotSet(SW_ROOT_ENV_VAR)),
    };

    if !root.is_dir() {
        return Err(HostError::SwRootNotDir(root));
    }

    Ok(root)
}
