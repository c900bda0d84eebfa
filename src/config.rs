use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Rows per page when neither the command line nor the config sets one
pub const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct RegistryConfig {
    pub database: Option<String>,
    pub page_size: Option<usize>,
}

impl RegistryConfig {
    pub fn page_size(&self) -> usize {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// Configured database path, or the default one under `base`
    pub fn database_path(&self, base: &Path) -> PathBuf {
        match &self.database {
            Some(path) => PathBuf::from(path),
            None => default_database_path_in(base),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("stakeholders.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".stakeholders").join("stakeholders.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<RegistryConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: RegistryConfig = toml::from_str(&contents)?;
    if config.page_size == Some(0) {
        anyhow::bail!("page_size in {} must be at least 1", path.display());
    }
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &RegistryConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
