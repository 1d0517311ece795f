//! Configuration utility functions.

use std::path::{Path, PathBuf};

/// Find config file by searching upward from current directory
///
/// Starts from cwd and walks up parent directories until finding `config_name`
/// Returns the absolute path to the config file if found
///
/// # Example
/// ```text
/// /home/user/app/src/components/  ← cwd
/// /home/user/app/svgstore.toml    ← found!
/// ```
pub fn find_config_file(config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    let cwd = std::env::current_dir().ok()?;
    cwd.ancestors()
        .map(|dir| dir.join(config_name))
        .find(|candidate| candidate.exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_absolute_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("svgstore.toml");
        assert_eq!(find_config_file(&path), None);

        std::fs::write(&path, "").unwrap();
        assert_eq!(find_config_file(&path), Some(path));
    }
}
