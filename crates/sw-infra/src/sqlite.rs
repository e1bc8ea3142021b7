use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use sw_core::error::InfraError;
use sw_core::types::{DatabaseConfig, ProjectId};

/// Locations checked for an existing database file, in priority order.
const CANDIDATE_PATHS: &[&str] = &[
    "data/dev.db",
    "prisma/dev.db",
    "dev.db",
    "database.db",
    "backend/data/dev.db",
    "backend/prisma/dev.db",
];

/// Creates (touches) the database file under `data/`. Idempotent.
pub fn create_for_project(
    project_id: &ProjectId,
    project_path: &Path,
) -> Result<DatabaseConfig, InfraError> {
    let data_dir = project_path.join("data");
    let db_path = data_dir.join("dev.db");

    tracing::info!(project_id = %project_id, "creating sqlite database");

    fs::create_dir_all(&data_dir).map_err(|err| InfraError::Io {
        message: err.to_string(),
    })?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&db_path)
        .map_err(|err| InfraError::Io {
            message: err.to_string(),
        })?;

    tracing::info!(path = %db_path.display(), "sqlite database created");

    Ok(DatabaseConfig::Sqlite {
        url: format!("file:{}", db_path.display()),
        file_path: db_path,
    })
}

pub fn find_database_path(project_path: &Path) -> Option<PathBuf> {
    CANDIDATE_PATHS
        .iter()
        .map(|candidate| project_path.join(candidate))
        .find(|path| path.is_file())
}

pub fn get_config(project_path: &Path) -> Option<DatabaseConfig> {
    let db_path = find_database_path(project_path)?;
    Some(DatabaseConfig::Sqlite {
        url: format!("file:{}", db_path.display()),
        file_path: db_path,
    })
}

/// Removes the database file plus any journal sidecars.
pub fn delete(project_path: &Path) -> Result<(), InfraError> {
    let Some(db_path) = find_database_path(project_path) else {
        return Ok(());
    };

    tracing::info!(path = %db_path.display(), "deleting sqlite database");
    fs::remove_file(&db_path).map_err(|err| InfraError::Io {
        message: err.to_string(),
    })?;
    for suffix in ["-journal", "-wal", "-shm"] {
        let sidecar = PathBuf::from(format!("{}{suffix}", db_path.display()));
        let _ = fs::remove_file(sidecar);
    }
    Ok(())
}

pub fn size(project_path: &Path) -> Option<u64> {
    let db_path = find_database_path(project_path)?;
    fs::metadata(db_path).ok().map(|meta| meta.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_is_idempotent_and_discoverable() {
        let dir = tempdir().unwrap();
        let id = ProjectId::generate();

        let first = create_for_project(&id, dir.path()).unwrap();
        let second = create_for_project(&id, dir.path()).unwrap();
        assert_eq!(first.url(), second.url());

        let found = find_database_path(dir.path()).unwrap();
        assert_eq!(found, dir.path().join("data/dev.db"));
        assert!(first.url().starts_with("file:"));
    }

    #[test]
    fn test_candidate_priority_prefers_data_dir() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("data")).unwrap();
        fs::create_dir_all(dir.path().join("prisma")).unwrap();
        fs::write(dir.path().join("prisma/dev.db"), b"").unwrap();
        fs::write(dir.path().join("data/dev.db"), b"").unwrap();

        let found = find_database_path(dir.path()).unwrap();
        assert_eq!(found, dir.path().join("data/dev.db"));
    }

    #[test]
    fn test_delete_removes_file_and_sidecars() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("dev.db"), b"").unwrap();
        fs::write(dir.path().join("dev.db-wal"), b"").unwrap();
        fs::write(dir.path().join("dev.db-shm"), b"").unwrap();

        delete(dir.path()).unwrap();
        assert!(!dir.path().join("dev.db").exists());
        assert!(!dir.path().join("dev.db-wal").exists());
        assert!(!dir.path().join("dev.db-shm").exists());
    }

    #[test]
    fn test_delete_without_database_is_noop() {
        let dir = tempdir().unwrap();
        delete(dir.path()).unwrap();
    }

    #[test]
    fn test_size_reports_file_length() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("dev.db"), b"12345").unwrap();
        assert_eq!(size(dir.path()), Some(5));
        let empty = tempdir().unwrap();
        assert_eq!(size(empty.path()), None);
    }
}
