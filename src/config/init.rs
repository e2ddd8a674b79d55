use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::schema::{Config, DataConfig};
use super::get_config_path;

/// Write a config file atomically. Refuses to overwrite unless `force`.
pub fn write_config(path: &Path, config: &Config, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at {} (use --force to overwrite)",
            path.display()
        );
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory at {}", parent.display()))?;
    }

    let yaml = serde_saphyr::to_string(config).context("Failed to serialize config")?;

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
    file.write_all(yaml.as_bytes())
        .context("Failed to write config")?;
    file.commit().context("Failed to save config")?;

    Ok(())
}

/// The config written by `init`: every section spelled out with its default.
pub fn starter_config() -> Config {
    Config {
        data: DataConfig {
            indicators: Some(PathBuf::from("District_Data_Modified.csv")),
            boundaries: Some(PathBuf::from("districts.geojson")),
            join_key: Some("ADM2_EN".to_string()),
        },
        schema: Some(Default::default()),
        ranking: Some(Default::default()),
        theme: Some(Default::default()),
        cache: Some(Default::default()),
    }
}

/// Write the starter config to `path` (or the default location) and report
/// where it went. Returns the path written.
pub fn run_init(path: Option<PathBuf>, force: bool) -> Result<PathBuf> {
    let path = path.unwrap_or_else(get_config_path);
    write_config(&path, &starter_config(), force)?;
    Ok(path)
}
