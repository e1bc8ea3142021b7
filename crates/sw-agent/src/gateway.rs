use crate::types::{AgentError, AgentEvent, AgentMode, ChatSignal, PromptRequest};
use std::path::Path;
use tokio::sync::mpsc;

/// Session-scoped streaming interface to the coding-agent CLI. Dropping the
/// returned receiver cancels consumption; the subprocess reader exits when
/// its channel closes.
pub trait AgentGateway: Send + Sync {
    fn execute_prompt(
        &self,
        request: PromptRequest,
    ) -> Result<mpsc::Receiver<AgentEvent>, AgentError>;
}

/// Chat-send collaborator used by auto-fix: submits an instruction through
/// the conversation pipeline in the given capability mode and reports only
/// the terminal outcome.
pub trait ChatGateway: Send + Sync {
    fn send_message(
        &self,
        project_id: &str,
        working_dir: &Path,
        content: &str,
        mode: AgentMode,
    ) -> Result<mpsc::Receiver<ChatSignal>, AgentError>;
}
