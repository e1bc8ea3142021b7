use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("failed to spawn agent: {message}")]
    SpawnFailed { message: String },
    #[error("invalid agent command: {message}")]
    InvalidCommand { message: String },
}

/// Tool capability granted to the agent subprocess. `Ask` is read-oriented
/// and disallows destructive actions; `Build` has full write capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentMode {
    Ask,
    Build,
}

#[derive(Debug, Clone)]
pub struct PromptRequest {
    pub working_dir: PathBuf,
    pub prompt: String,
    pub session_id: String,
    pub resume_session_id: Option<String>,
    pub mode: AgentMode,
}

/// One event decoded from the agent's stream-json output.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    Text { content: String },
    Complete { cost: f64 },
    Error { message: String },
}

/// Completion signal from a chat-driven agent run; the Architect's auto-fix
/// path only cares whether the run finished.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatSignal {
    Completed,
    Failed { message: String },
}
