use std::path::PathBuf;

use anyhow::{Result, anyhow};
use directories::ProjectDirs;

/// Environment override for where local state lives.
pub const DATA_DIR_ENV: &str = "CERTBIND_DATA_DIR";

/// Directory holding the binding state database. `CERTBIND_DATA_DIR` wins;
/// otherwise the platform-conventional data dir for `certbind`.
pub fn data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        let dir = dir.trim();
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let dirs = ProjectDirs::from("", "", "certbind")
        .ok_or_else(|| anyhow!("could not determine a data directory; set {DATA_DIR_ENV}"))?;
    Ok(dirs.data_dir().to_path_buf())
}
