//! Centralized path functions for statline storage locations.

use std::path::PathBuf;

/// App data root: `~/Library/Application Support/statline/` (macOS) or `~/.local/share/statline/` (Linux).
pub fn app_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("statline"))
}

/// SQLite database file: `<app_data_dir>/statline.db`.
pub fn db_path() -> Option<PathBuf> {
    app_data_dir().map(|d| d.join("statline.db"))
}
