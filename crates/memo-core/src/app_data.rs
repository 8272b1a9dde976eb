//! Where memo keeps its own files: the note store and its config.

use std::path::PathBuf;

/// Returns the directory where memo stores `notes.db` and `config.toml`.
/// On Linux: `~/.local/share/memo/`.
/// Creates the directory if it doesn't exist; returns `None` if we can't determine the path.
pub fn app_data_dir() -> Option<PathBuf> {
    let dir = directories::ProjectDirs::from("app", "Memo", "Memo")?.data_local_dir().to_path_buf();
    std::fs::create_dir_all(&dir).ok()?;
    Some(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_is_some() {
        assert!(app_data_dir().is_some());
    }
}
