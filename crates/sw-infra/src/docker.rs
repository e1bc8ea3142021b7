use std::net::TcpListener;
use std::process::Output;
use sw_core::error::InfraError;
use sw_core::types::RuntimeStatus;
use tokio::process::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Running,
    Exited,
    Paused,
    Created,
    Unknown,
}

impl ContainerState {
    fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "running" => Self::Running,
            "exited" => Self::Exited,
            "paused" => Self::Paused,
            "created" => Self::Created,
            _ => Self::Unknown,
        }
    }

    /// `docker ps` reports human-readable status lines ("Up 3 minutes",
    /// "Exited (0) 2 hours ago") rather than raw state names.
    fn parse_ps(value: &str) -> Self {
        let lower = value.to_lowercase();
        if lower.contains("up") {
            Self::Running
        } else if lower.contains("exited") {
            Self::Exited
        } else if lower.contains("paused") {
            Self::Paused
        } else if lower.contains("created") {
            Self::Created
        } else {
            Self::Unknown
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContainerInfo {
    pub id: String,
    pub name: String,
    pub state: ContainerState,
    pub ports: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ContainerConfig {
    pub name: String,
    pub image: String,
    pub port: u16,
    pub container_port: u16,
    pub env: Vec<(String, String)>,
    pub volume_name: Option<String>,
}

/// Container operations the infra layer needs. Implemented by the docker CLI
/// in production and by an in-memory fake in tests.
pub trait ContainerRuntime: Send + Sync {
    fn check_available(&self) -> impl Future<Output = RuntimeStatus> + Send;
    fn run_container(
        &self,
        config: &ContainerConfig,
    ) -> impl Future<Output = Result<String, InfraError>> + Send;
    fn container_status(
        &self,
        name_or_id: &str,
    ) -> impl Future<Output = Option<ContainerInfo>> + Send;
    fn start_container(
        &self,
        name_or_id: &str,
    ) -> impl Future<Output = Result<(), InfraError>> + Send;
    fn stop_container(
        &self,
        name_or_id: &str,
    ) -> impl Future<Output = Result<(), InfraError>> + Send;
    fn remove_container(
        &self,
        name_or_id: &str,
        force: bool,
    ) -> impl Future<Output = Result<(), InfraError>> + Send;
    fn remove_volume(&self, name: &str) -> impl Future<Output = Result<(), InfraError>> + Send;
    fn exec(
        &self,
        name_or_id: &str,
        command: &[&str],
    ) -> impl Future<Output = Result<String, InfraError>> + Send;
    fn list_containers(
        &self,
        name_filter: &str,
    ) -> impl Future<Output = Vec<ContainerInfo>> + Send;
}

/// Finds a free host port by attempting to bind it.
pub fn find_available_port(start: u16, end: u16) -> Result<u16, InfraError> {
    for port in start..=end {
        if TcpListener::bind(("127.0.0.1", port)).is_ok() {
            return Ok(port);
        }
    }
    Err(InfraError::NoAvailablePort { start, end })
}

/// Shells out to the `docker` CLI; every operation is a subprocess.
#[derive(Debug, Clone, Default)]
pub struct DockerCli;

impl DockerCli {
    pub fn new() -> Self {
        Self
    }

    async fn docker(&self, args: &[&str]) -> Result<Output, InfraError> {
        Command::new("docker")
            .args(args)
            .output()
            .await
            .map_err(|err| InfraError::Io {
                message: err.to_string(),
            })
    }

    async fn docker_checked(&self, args: &[&str]) -> Result<String, InfraError> {
        let output = self.docker(args).await?;
        if !output.status.success() {
            return Err(InfraError::ContainerFailed {
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl ContainerRuntime for DockerCli {
    async fn check_available(&self) -> RuntimeStatus {
        match self
            .docker_checked(&["version", "--format", "{{.Server.Version}}"])
            .await
        {
            Ok(version) => {
                tracing::info!(%version, "docker available");
                RuntimeStatus {
                    available: true,
                    version: Some(version),
                    error: None,
                }
            }
            Err(err) => {
                tracing::warn!(%err, "docker not available");
                RuntimeStatus {
                    available: false,
                    version: None,
                    error: Some(err.to_string()),
                }
            }
        }
    }

    async fn run_container(&self, config: &ContainerConfig) -> Result<String, InfraError> {
        let publish = format!("{}:{}", config.port, config.container_port);
        let mut args: Vec<String> = vec![
            "run".to_string(),
            "-d".to_string(),
            "--name".to_string(),
            config.name.clone(),
            "-p".to_string(),
            publish,
        ];
        for (key, value) in &config.env {
            args.push("-e".to_string());
            args.push(format!("{key}={value}"));
        }
        if let Some(volume) = &config.volume_name {
            args.push("-v".to_string());
            args.push(format!("{volume}:/var/lib/postgresql/data"));
        }
        args.push(config.image.clone());

        tracing::info!(name = %config.name, image = %config.image, "running container");
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let container_id = self.docker_checked(&arg_refs).await?;
        tracing::info!(id = %&container_id[..container_id.len().min(12)], "container started");
        Ok(container_id)
    }

    async fn container_status(&self, name_or_id: &str) -> Option<ContainerInfo> {
        let stdout = self
            .docker_checked(&[
                "inspect",
                "--format",
                "{{.Id}},{{.Name}},{{.State.Status}}",
                name_or_id,
            ])
            .await
            .ok()?;

        let mut parts = stdout.splitn(3, ',');
        let id = parts.next()?.to_string();
        let name = parts.next()?.trim_start_matches('/').to_string();
        let state = ContainerState::parse(parts.next()?);
        Some(ContainerInfo {
            id,
            name,
            state,
            ports: Vec::new(),
        })
    }

    async fn start_container(&self, name_or_id: &str) -> Result<(), InfraError> {
        tracing::info!(container = %name_or_id, "starting container");
        self.docker_checked(&["start", name_or_id]).await?;
        Ok(())
    }

    async fn stop_container(&self, name_or_id: &str) -> Result<(), InfraError> {
        tracing::info!(container = %name_or_id, "stopping container");
        self.docker_checked(&["stop", name_or_id]).await?;
        Ok(())
    }

    async fn remove_container(&self, name_or_id: &str, force: bool) -> Result<(), InfraError> {
        tracing::info!(container = %name_or_id, "removing container");
        if force {
            self.docker_checked(&["rm", "-f", name_or_id]).await?;
        } else {
            self.docker_checked(&["rm", name_or_id]).await?;
        }
        Ok(())
    }

    async fn remove_volume(&self, name: &str) -> Result<(), InfraError> {
        self.docker_checked(&["volume", "rm", name]).await?;
        Ok(())
    }

    async fn exec(&self, name_or_id: &str, command: &[&str]) -> Result<String, InfraError> {
        let mut args = vec!["exec", name_or_id];
        args.extend_from_slice(command);
        self.docker_checked(&args).await
    }

    async fn list_containers(&self, name_filter: &str) -> Vec<ContainerInfo> {
        let filter = format!("name={name_filter}");
        let Ok(stdout) = self
            .docker_checked(&[
                "ps",
                "-a",
                "--filter",
                &filter,
                "--format",
                "{{.ID}},{{.Names}},{{.Status}},{{.Ports}}",
            ])
            .await
        else {
            return Vec::new();
        };

        stdout
            .lines()
            .filter(|line| !line.is_empty())
            .filter_map(|line| {
                let mut parts = line.splitn(4, ',');
                let id = parts.next()?.to_string();
                let name = parts.next()?.to_string();
                let state = ContainerState::parse_ps(parts.next()?);
                let ports = parts
                    .next()
                    .map(|raw| {
                        raw.split(',')
                            .map(|p| p.trim().to_string())
                            .filter(|p| !p.is_empty())
                            .collect()
                    })
                    .unwrap_or_default();
                Some(ContainerInfo {
                    id,
                    name,
                    state,
                    ports,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_inspect_state() {
        assert_eq!(ContainerState::parse("running"), ContainerState::Running);
        assert_eq!(ContainerState::parse("Exited"), ContainerState::Exited);
        assert_eq!(ContainerState::parse("dead"), ContainerState::Unknown);
    }

    #[test]
    fn test_parse_ps_state() {
        assert_eq!(
            ContainerState::parse_ps("Up 3 minutes"),
            ContainerState::Running
        );
        assert_eq!(
            ContainerState::parse_ps("Exited (0) 2 hours ago"),
            ContainerState::Exited
        );
        assert_eq!(ContainerState::parse_ps("restarting"), ContainerState::Unknown);
    }

    #[test]
    fn test_find_available_port_returns_in_range() {
        let port = find_available_port(50420, 50440).unwrap();
        assert!((50420..=50440).contains(&port));
    }

    #[test]
    fn test_find_available_port_exhausted() {
        // Hold the only candidate port so the probe fails.
        let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let port = listener.local_addr().unwrap().port();
        let err = find_available_port(port, port).unwrap_err();
        assert!(matches!(err, InfraError::NoAvailablePort { .. }));
    }
}
