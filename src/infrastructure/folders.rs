use std::fs;
use std::path::Path;

use tracing::{error, info};

use crate::domain::{AppPaths, DomainError};

/// Create `dir` (and `dir/subfolder` when given) if it does not exist yet.
pub fn create_folder(dir: &Path, subfolder: Option<&str>) -> Result<(), DomainError> {
    let target = match subfolder {
        Some(sub) if !sub.is_empty() => dir.join(sub),
        _ => dir.to_path_buf(),
    };
    if target.is_dir() {
        return Ok(());
    }

    fs::create_dir_all(&target).map_err(|e| {
        error!(path = ?target, error = %e, "Failed to create folder");
        DomainError::Io(format!("Failed to create folder {}: {}", target.display(), e))
    })?;
    info!(path = ?target, "Folder created");
    Ok(())
}

/// Create every folder the application writes to: cache (with the source
/// subfolder), configuration, backgrounds and logs.
pub fn create_folders(paths: &AppPaths) -> Result<(), DomainError> {
    create_folder(&paths.cache_dir, Some(&paths.cache_subfolder))?;
    create_folder(&paths.config_dir, None)?;
    create_folder(&paths.background_dir, None)?;
    create_folder(&paths.logs_dir, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_folders_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::with_root(dir.path());

        create_folders(&paths).unwrap();

        assert!(paths.cache_dir.join("unsplash").is_dir());
        assert!(paths.config_dir.is_dir());
        assert!(paths.background_dir.is_dir());
        assert!(paths.logs_dir.is_dir());

        // Running again is harmless.
        create_folders(&paths).unwrap();
    }

    #[test]
    fn test_create_folder_blocked_by_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("cache");
        fs::write(&blocker, "").unwrap();

        let err = create_folder(&blocker, Some("unsplash")).unwrap_err();
        assert!(matches!(err, DomainError::Io(_)));
    }
}
