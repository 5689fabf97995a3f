use crate::errors::AppError;
use crate::models::AppData;
use std::{env, path::Path, path::PathBuf};
use tokio::fs;
use tracing::{debug, warn};

pub const DEFAULT_DATA_PATH: &str = "data/state.json";

pub fn resolve_data_path() -> PathBuf {
    env::var("APP_DATA_PATH")
        .ok()
        .filter(|path| !path.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH))
}

/// Reads the stored cache, progress and token. An unreadable document yields
/// defaults.
pub async fn load_data(path: &Path) -> AppData {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!("no save file at {}, starting fresh", path.display());
            return AppData::default();
        }
        Err(err) => {
            warn!("failed to read {}: {err}, starting fresh", path.display());
            return AppData::default();
        }
    };
    serde_json::from_slice(&bytes).unwrap_or_else(|err| {
        warn!("save file {} is corrupt ({err}), progress and cache reset", path.display());
        AppData::default()
    })
}

/// Writes the whole document through a sibling temp file.
pub async fn persist_data(path: &Path, data: &AppData) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(data).map_err(AppError::internal)?;
    let staging = path.with_extension("json.tmp");
    fs::write(&staging, payload).await?;
    fs::rename(&staging, path).await?;
    Ok(())
}
