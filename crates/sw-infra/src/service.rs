use crate::docker::ContainerRuntime;
use crate::postgres::PostgresContainers;
use crate::sqlite;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use sw_core::error::InfraError;
use sw_core::types::{
    DatabaseConfig, DatabaseProvider, DatabaseState, InfraStatus, ProjectDatabaseStatus,
    ProjectId, RuntimeStatus,
};
use tokio::sync::Mutex;

const RUNTIME_CACHE_TTL: Duration = Duration::from_secs(60);

/// Provisioning facade: picks a provider from runtime availability, falls
/// back to sqlite when the container path fails, and caches the docker probe.
pub struct DatabaseInfra<R> {
    runtime: Arc<R>,
    postgres: PostgresContainers<R>,
    runtime_cache: Mutex<Option<(RuntimeStatus, Instant)>>,
}

impl<R: ContainerRuntime> DatabaseInfra<R> {
    pub fn new(runtime: Arc<R>) -> Self {
        Self {
            postgres: PostgresContainers::new(Arc::clone(&runtime)),
            runtime,
            runtime_cache: Mutex::new(None),
        }
    }

    pub async fn infra_status(&self) -> InfraStatus {
        let runtime = self.runtime_status().await;
        let default_provider = if runtime.available {
            DatabaseProvider::PostgresDocker
        } else {
            DatabaseProvider::Sqlite
        };
        InfraStatus {
            runtime,
            default_provider,
        }
    }

    /// Provider selection happens here, not at the call site: Postgres when
    /// the runtime is up, sqlite otherwise or when the container path fails.
    pub async fn create_database(
        &self,
        project_id: &ProjectId,
        project_path: &Path,
    ) -> Result<DatabaseConfig, InfraError> {
        let runtime = self.runtime_status().await;

        if runtime.available {
            tracing::info!(project_id = %project_id, "docker available, creating postgres container");
            match self.postgres.create_for_project(project_id).await {
                Ok(config) => return Ok(config),
                Err(err) => {
                    tracing::warn!(project_id = %project_id, %err, "postgres creation failed, falling back to sqlite");
                }
            }
        } else {
            tracing::info!(project_id = %project_id, "docker not available, creating sqlite database");
        }

        sqlite::create_for_project(project_id, project_path)
    }

    pub async fn database_status(
        &self,
        project_id: &ProjectId,
        project_path: &Path,
        current_provider: Option<DatabaseProvider>,
    ) -> ProjectDatabaseStatus {
        if current_provider.is_none() || current_provider == Some(DatabaseProvider::PostgresDocker)
        {
            let status = self.postgres.status(project_id).await;
            if status.exists {
                return ProjectDatabaseStatus {
                    provider: DatabaseProvider::PostgresDocker,
                    status: if status.running {
                        DatabaseState::Running
                    } else {
                        DatabaseState::Stopped
                    },
                    // An inspected container has no credentials, so its config
                    // carries no usable url; never surface an empty one.
                    url: status
                        .config
                        .map(|config| config.url().to_string())
                        .filter(|url| !url.is_empty()),
                    error: None,
                };
            }
        }

        if current_provider.is_none() || current_provider == Some(DatabaseProvider::Sqlite) {
            if let Some(config) = sqlite::get_config(project_path) {
                // A sqlite file is "running" by definition.
                return ProjectDatabaseStatus {
                    provider: DatabaseProvider::Sqlite,
                    status: DatabaseState::Running,
                    url: Some(config.url().to_string()),
                    error: None,
                };
            }
        }

        ProjectDatabaseStatus {
            provider: current_provider.unwrap_or(DatabaseProvider::Sqlite),
            status: DatabaseState::NotCreated,
            url: None,
            error: None,
        }
    }

    pub async fn start_database(
        &self,
        project_id: &ProjectId,
        provider: DatabaseProvider,
    ) -> Result<(), InfraError> {
        if provider == DatabaseProvider::PostgresDocker {
            self.postgres.start(project_id).await?;
        }
        // sqlite has no lifecycle
        Ok(())
    }

    pub async fn stop_database(
        &self,
        project_id: &ProjectId,
        provider: DatabaseProvider,
    ) -> Result<(), InfraError> {
        if provider == DatabaseProvider::PostgresDocker {
            self.postgres.stop(project_id).await?;
        }
        Ok(())
    }

    pub async fn delete_database(
        &self,
        project_id: &ProjectId,
        project_path: &Path,
        provider: DatabaseProvider,
        remove_data: bool,
    ) -> Result<(), InfraError> {
        match provider {
            DatabaseProvider::PostgresDocker => {
                self.postgres.remove(project_id, remove_data).await?;
            }
            DatabaseProvider::Sqlite => {
                if remove_data {
                    sqlite::delete(project_path)?;
                }
            }
        }
        Ok(())
    }

    async fn runtime_status(&self) -> RuntimeStatus {
        let mut cache = self.runtime_cache.lock().await;
        if let Some((status, at)) = cache.as_ref()
            && at.elapsed() < RUNTIME_CACHE_TTL
        {
            return status.clone();
        }
        let status = self.runtime.check_available().await;
        *cache = Some((status.clone(), Instant::now()));
        status
    }

    /// Drops the cached probe result, e.g. after docker was started.
    pub async fn clear_runtime_cache(&self) {
        *self.runtime_cache.lock().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docker::{ContainerConfig, ContainerInfo, ContainerState};
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tempfile::tempdir;

    #[derive(Default)]
    struct MockRuntime {
        available: bool,
        fail_run: bool,
        probe_count: AtomicU32,
        containers: StdMutex<HashMap<String, ContainerState>>,
    }

    impl MockRuntime {
        fn with_docker() -> Self {
            Self {
                available: true,
                ..Default::default()
            }
        }
    }

    impl ContainerRuntime for MockRuntime {
        async fn check_available(&self) -> RuntimeStatus {
            self.probe_count.fetch_add(1, Ordering::SeqCst);
            RuntimeStatus {
                available: self.available,
                version: self.available.then(|| "27.0.1".to_string()),
                error: (!self.available).then(|| "docker daemon not running".to_string()),
            }
        }

        async fn run_container(&self, config: &ContainerConfig) -> Result<String, InfraError> {
            if self.fail_run {
                return Err(InfraError::ContainerFailed {
                    message: "image pull failed".to_string(),
                });
            }
            self.containers
                .lock()
                .unwrap()
                .insert(config.name.clone(), ContainerState::Running);
            Ok(format!("cid-{}", config.name))
        }

        async fn container_status(&self, name_or_id: &str) -> Option<ContainerInfo> {
            let state = *self.containers.lock().unwrap().get(name_or_id)?;
            Some(ContainerInfo {
                id: format!("cid-{name_or_id}"),
                name: name_or_id.to_string(),
                state,
                ports: Vec::new(),
            })
        }

        async fn start_container(&self, name_or_id: &str) -> Result<(), InfraError> {
            self.containers
                .lock()
                .unwrap()
                .insert(name_or_id.to_string(), ContainerState::Running);
            Ok(())
        }

        async fn stop_container(&self, name_or_id: &str) -> Result<(), InfraError> {
            self.containers
                .lock()
                .unwrap()
                .insert(name_or_id.to_string(), ContainerState::Exited);
            Ok(())
        }

        async fn remove_container(&self, name_or_id: &str, _force: bool) -> Result<(), InfraError> {
            self.containers.lock().unwrap().remove(name_or_id);
            Ok(())
        }

        async fn remove_volume(&self, _name: &str) -> Result<(), InfraError> {
            Ok(())
        }

        async fn exec(&self, name_or_id: &str, _command: &[&str]) -> Result<String, InfraError> {
            let containers = self.containers.lock().unwrap();
            match containers.get(name_or_id) {
                Some(ContainerState::Running) => Ok("accepting connections".to_string()),
                _ => Err(InfraError::ContainerFailed {
                    message: "container not running".to_string(),
                }),
            }
        }

        async fn list_containers(&self, _name_filter: &str) -> Vec<ContainerInfo> {
            Vec::new()
        }
    }

    #[tokio::test]
    async fn test_default_provider_follows_docker_availability() {
        let infra = DatabaseInfra::new(Arc::new(MockRuntime::with_docker()));
        let status = infra.infra_status().await;
        assert!(status.runtime.available);
        assert_eq!(status.default_provider, DatabaseProvider::PostgresDocker);

        let infra = DatabaseInfra::new(Arc::new(MockRuntime::default()));
        let status = infra.infra_status().await;
        assert!(!status.runtime.available);
        assert_eq!(status.default_provider, DatabaseProvider::Sqlite);
    }

    #[tokio::test]
    async fn test_create_prefers_postgres_when_docker_available() {
        let dir = tempdir().unwrap();
        let infra = DatabaseInfra::new(Arc::new(MockRuntime::with_docker()));
        let config = infra
            .create_database(&ProjectId::generate(), dir.path())
            .await
            .unwrap();
        assert_eq!(config.provider(), DatabaseProvider::PostgresDocker);
        assert!(config.url().starts_with("postgresql://shipwright:"));
    }

    #[tokio::test]
    async fn test_create_falls_back_to_sqlite_on_container_failure() {
        let dir = tempdir().unwrap();
        let runtime = MockRuntime {
            available: true,
            fail_run: true,
            ..Default::default()
        };
        let infra = DatabaseInfra::new(Arc::new(runtime));
        let config = infra
            .create_database(&ProjectId::generate(), dir.path())
            .await
            .unwrap();
        assert_eq!(config.provider(), DatabaseProvider::Sqlite);
        assert!(dir.path().join("data/dev.db").is_file());
    }

    #[tokio::test]
    async fn test_create_uses_sqlite_without_docker() {
        let dir = tempdir().unwrap();
        let runtime = Arc::new(MockRuntime::default());
        let infra = DatabaseInfra::new(Arc::clone(&runtime));
        let config = infra
            .create_database(&ProjectId::generate(), dir.path())
            .await
            .unwrap();
        assert_eq!(config.provider(), DatabaseProvider::Sqlite);
        // Falling back to sqlite must not touch the container runtime.
        assert!(runtime.containers.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_is_idempotent_for_existing_container() {
        let dir = tempdir().unwrap();
        let runtime = Arc::new(MockRuntime::with_docker());
        let infra = DatabaseInfra::new(Arc::clone(&runtime));
        let project_id = ProjectId::generate();

        infra.create_database(&project_id, dir.path()).await.unwrap();
        assert_eq!(runtime.containers.lock().unwrap().len(), 1);
        infra.create_database(&project_id, dir.path()).await.unwrap();
        assert_eq!(runtime.containers.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_status_lifecycle_running_stopped_not_created() {
        let dir = tempdir().unwrap();
        let infra = DatabaseInfra::new(Arc::new(MockRuntime::with_docker()));
        let project_id = ProjectId::generate();

        let status = infra.database_status(&project_id, dir.path(), None).await;
        assert_eq!(status.status, DatabaseState::NotCreated);

        infra.create_database(&project_id, dir.path()).await.unwrap();
        let status = infra.database_status(&project_id, dir.path(), None).await;
        assert_eq!(status.provider, DatabaseProvider::PostgresDocker);
        assert_eq!(status.status, DatabaseState::Running);

        infra
            .stop_database(&project_id, DatabaseProvider::PostgresDocker)
            .await
            .unwrap();
        let status = infra.database_status(&project_id, dir.path(), None).await;
        assert_eq!(status.status, DatabaseState::Stopped);

        infra
            .delete_database(&project_id, dir.path(), DatabaseProvider::PostgresDocker, true)
            .await
            .unwrap();
        let status = infra.database_status(&project_id, dir.path(), None).await;
        assert_eq!(status.status, DatabaseState::NotCreated);
    }

    #[tokio::test]
    async fn test_sqlite_status_reports_running_when_file_exists() {
        let dir = tempdir().unwrap();
        let infra = DatabaseInfra::new(Arc::new(MockRuntime::default()));
        let project_id = ProjectId::generate();

        infra.create_database(&project_id, dir.path()).await.unwrap();
        let status = infra
            .database_status(&project_id, dir.path(), Some(DatabaseProvider::Sqlite))
            .await;
        assert_eq!(status.status, DatabaseState::Running);
        assert!(status.url.unwrap().starts_with("file:"));
    }

    #[tokio::test]
    async fn test_existing_container_status_never_fabricates_url() {
        let dir = tempdir().unwrap();
        let infra = DatabaseInfra::new(Arc::new(MockRuntime::with_docker()));
        let project_id = ProjectId::generate();

        let created = infra.create_database(&project_id, dir.path()).await.unwrap();
        assert!(created.url().starts_with("postgresql://"));

        // A later status read only sees the inspected container, which has no
        // credentials; the stored project url is the caller's to overlay.
        let status = infra.database_status(&project_id, dir.path(), None).await;
        assert_eq!(status.status, DatabaseState::Running);
        assert!(status.url.is_none());
    }

    #[tokio::test]
    async fn test_sqlite_delete_without_remove_data_keeps_file() {
        let dir = tempdir().unwrap();
        let infra = DatabaseInfra::new(Arc::new(MockRuntime::default()));
        let project_id = ProjectId::generate();

        infra.create_database(&project_id, dir.path()).await.unwrap();
        let db_file = dir.path().join("data/dev.db");
        assert!(db_file.is_file());

        infra
            .delete_database(&project_id, dir.path(), DatabaseProvider::Sqlite, false)
            .await
            .unwrap();
        assert!(db_file.is_file());

        infra
            .delete_database(&project_id, dir.path(), DatabaseProvider::Sqlite, true)
            .await
            .unwrap();
        assert!(!db_file.exists());
    }

    #[tokio::test]
    async fn test_runtime_probe_is_cached_until_cleared() {
        let runtime = Arc::new(MockRuntime::with_docker());
        let infra = DatabaseInfra::new(Arc::clone(&runtime));

        infra.infra_status().await;
        infra.infra_status().await;
        assert_eq!(runtime.probe_count.load(Ordering::SeqCst), 1);

        infra.clear_runtime_cache().await;
        infra.infra_status().await;
        assert_eq!(runtime.probe_count.load(Ordering::SeqCst), 2);
    }
}
