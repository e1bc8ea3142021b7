use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_DB_PATH: &str = ".shipwright/shipwright.db";
const DEFAULT_PORT: u16 = 4810;
const DEFAULT_AGENT_CMD: &str = "claude";

/// Service configuration, resolved from `shipwright.toml` when present, with
/// environment overrides taking precedence over the file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShipwrightConfig {
    pub db_path: PathBuf,
    pub port: u16,
    /// Command line used to launch the coding-agent CLI, split shell-style.
    pub agent_command: String,
}

impl Default for ShipwrightConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            port: DEFAULT_PORT,
            agent_command: DEFAULT_AGENT_CMD.to_string(),
        }
    }
}

impl ShipwrightConfig {
    pub fn load(path: &Path) -> Self {
        let mut config = match std::fs::read_to_string(path) {
            Ok(raw) => toml::from_str(&raw).unwrap_or_else(|err| {
                tracing::warn!(path = %path.display(), %err, "invalid config file, using defaults");
                Self::default()
            }),
            Err(_) => Self::default(),
        };
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        if let Ok(value) = std::env::var("SHIPWRIGHT_DB_PATH") {
            self.db_path = PathBuf::from(value);
        }
        if let Ok(value) = std::env::var("SHIPWRIGHT_PORT")
            && let Ok(port) = value.parse::<u16>()
        {
            self.port = port;
        }
        if let Ok(value) = std::env::var("SHIPWRIGHT_AGENT_CMD") {
            self.agent_command = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn defaults_when_file_missing() {
        let config = ShipwrightConfig::load(Path::new("/nonexistent/shipwright.toml"));
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.agent_command, DEFAULT_AGENT_CMD);
    }

    #[test]
    fn reads_file_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("shipwright.toml");
        let mut file = std::fs::File::create(&path).expect("create");
        writeln!(file, "port = 9999\nagent_command = \"my-agent --json\"").expect("write");
        let config = ShipwrightConfig::load(&path);
        assert_eq!(config.port, 9999);
        assert_eq!(config.agent_command, "my-agent --json");
    }
}
