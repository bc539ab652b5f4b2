//! Environment loading

use std::path::PathBuf;

/// Load variables from a `.env` file in the current directory or a parent
///
/// Variables already present in the process environment are not overridden.
/// Returns the path that was loaded, if any.
pub fn load_dotenv() -> Option<PathBuf> {
    match dotenvy::dotenv() {
        Ok(path) => {
            tracing::debug!("Loaded environment from {}", path.display());
            Some(path)
        }
        Err(e) if e.not_found() => None,
        Err(e) => {
            tracing::warn!("Failed to read .env file: {}", e);
            None
        }
    }
}
