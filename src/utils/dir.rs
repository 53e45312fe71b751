use std::{
    env, io,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Result};

pub const APPLICATION_NAME: &str = "dayledger";

/// Name of the file holding the persisted key-value entries.
pub const STATE_FILE: &str = "state.json";
const LOGS_DIR: &str = "logs";

/// Where the ledger keeps its files. Everything lives under one root directory.
#[derive(Debug, Clone, PartialEq)]
pub struct AppPaths {
    root: PathBuf,
}

impl AppPaths {
    /// Uses `dir` when given, otherwise the platform state directory. The root is created if
    /// missing.
    pub fn resolve(dir: Option<PathBuf>) -> Result<Self> {
        let root = match dir {
            Some(dir) => dir,
            None => default_root()?,
        };
        Ok(Self {
            root: ensure_dir(root)?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state_file(&self) -> PathBuf {
        self.root.join(STATE_FILE)
    }

    pub fn logs(&self) -> PathBuf {
        self.root.join(LOGS_DIR)
    }
}

#[cfg(windows)]
fn default_root() -> Result<PathBuf> {
    let mut path = env::var("APPDATA")
        .map(PathBuf::from)
        .map_err(|_| anyhow!("APPDATA should be present on Windows"))?;
    path.push(APPLICATION_NAME);
    Ok(path)
}

#[cfg(not(windows))]
fn default_root() -> Result<PathBuf> {
    let mut path = match env::var("XDG_STATE_HOME") {
        Ok(state) => PathBuf::from(state),
        Err(_) => env::var("HOME")
            .map(|home| PathBuf::from(home).join(".local/state"))
            .map_err(|_| anyhow!("Couldn't find neither XDG_STATE_HOME nor HOME"))?,
    };
    path.push(APPLICATION_NAME);
    Ok(path)
}

pub fn ensure_dir(path: PathBuf) -> Result<PathBuf> {
    match std::fs::create_dir_all(&path) {
        Ok(_) => Ok(path),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(path),
        Err(v) => Err(v.into()),
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use super::AppPaths;

    #[test]
    fn explicit_directory_is_created() -> Result<()> {
        let dir = tempdir()?;
        let root = dir.path().join("nested").join("ledger");
        let paths = AppPaths::resolve(Some(root.clone()))?;

        assert!(root.is_dir());
        assert_eq!(paths.root(), root);
        assert_eq!(paths.state_file(), root.join("state.json"));
        assert_eq!(paths.logs(), root.join("logs"));
        Ok(())
    }
}
