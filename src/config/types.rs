use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Container CLI command line (`docker`, `podman --remote`, `sudo docker`).
    pub runtime: String,
    /// Where build contexts are staged, one directory per image tag.
    pub context_root: PathBuf,
    /// Seconds.
    pub build_timeout: u64,
    /// Seconds.
    pub run_timeout: u64,
    /// Seconds.
    pub stop_timeout: u64,
    pub log_file: PathBuf,
    /// `tracing` filter directive; `RUST_LOG` takes precedence.
    pub log_filter: String,
}

impl Config {
    pub fn context_root(&self, cwd: &Path) -> PathBuf {
        resolve(cwd, &self.context_root)
    }

    pub fn log_file(&self, cwd: &Path) -> PathBuf {
        resolve(cwd, &self.log_file)
    }
}

fn resolve(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            runtime: "docker".to_string(),
            context_root: PathBuf::from(".dockmenu/contexts"),
            build_timeout: 300,
            run_timeout: 120,
            stop_timeout: 60,
            log_file: PathBuf::from(".dockmenu/dockmenu.log"),
            log_filter: "info".to_string(),
        }
    }
}
