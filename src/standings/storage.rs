use super::Standings;
use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::fs::File;
use std::path::Path;

/// Format version written into every saved standings file
pub const STANDINGS_VERSION: u32 = 1;

/// Load previously saved standings from a JSON file
///
/// Fails if the file has an unsupported version.
pub fn load_standings(path: &Path) -> Result<Standings> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open standings file at {}", path.display()))?;

    let standings: Standings =
        serde_json::from_reader(file).context("Failed to load standings")?;

    if standings.version != STANDINGS_VERSION {
        anyhow::bail!("Unsupported standings version: {}", standings.version);
    }

    Ok(standings)
}

/// Save standings to a JSON file atomically
///
/// Creates the parent directory if it doesn't exist.
pub fn save_standings(path: &Path, standings: &Standings) -> Result<()> {
    crate::config::ensure_parent_dir(path)?;

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    serde_json::to_writer_pretty(&mut file, standings).context("Failed to serialize standings")?;

    file.commit().context("Failed to save standings")?;

    log::debug!("wrote standings to {}", path.display());
    Ok(())
}
