mod schema;

pub use schema::{parse_time_cap, Athlete, AthleteScore, Competition, EventConfig};

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Get the config directory path (~/.config/wod-rank/)
pub fn get_config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("wod-rank"))
}

/// Get the default competition file path (~/.config/wod-rank/competition.yaml)
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("competition.yaml"))
}

/// Ensure the parent directory of `path` exists
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if !dir.exists() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory at {}", dir.display()))?;
        }
    }
    Ok(())
}

/// Load a competition from a YAML file
///
/// # Arguments
///
/// * `path` - Optional path to the competition file. If None, uses the default
///   path (~/.config/wod-rank/competition.yaml)
///
/// # Errors
///
/// Returns an error if:
/// - The file does not exist
/// - The file cannot be read
/// - The YAML cannot be parsed
pub fn load_config(path: Option<PathBuf>) -> Result<Competition> {
    let config_path = match path {
        Some(path) => path,
        None => get_config_path()?,
    };

    if !config_path.exists() {
        anyhow::bail!(
            "Competition file not found at {}. Create ~/.config/wod-rank/competition.yaml or pass --config",
            config_path.display()
        );
    }

    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read competition file at {}", config_path.display()))?;

    let competition: Competition = serde_saphyr::from_str(&content).with_context(|| {
        format!(
            "Failed to parse competition: invalid YAML in {}",
            config_path.display()
        )
    })?;

    log::debug!(
        "loaded '{}' from {}: {} athletes, {} events",
        competition.name,
        config_path.display(),
        competition.athletes.len(),
        competition.events.len()
    );

    Ok(competition)
}
