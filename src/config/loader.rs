use std::path::Path;

use anyhow::{Context, Result};

use super::types::Config;

pub const CONFIG_FILE: &str = ".dockmenu.yml";

/// Load `.dockmenu.yml` from `dir`. A missing file yields the defaults.
pub fn load(dir: &Path) -> Result<Config> {
    let path = dir.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse(&contents).with_context(|| format!("invalid config in {}", path.display()))
}

pub fn parse(contents: &str) -> Result<Config> {
    // An empty document deserializes to unit, not a map.
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    Ok(serde_yaml::from_str(contents)?)
}
