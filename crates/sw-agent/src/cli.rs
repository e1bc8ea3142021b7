use crate::gateway::{AgentGateway, ChatGateway};
use crate::types::{AgentError, AgentEvent, AgentMode, ChatSignal, PromptRequest};
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

const EVENT_BUFFER: usize = 256;
const STDERR_LIMIT: usize = 8 * 1024;

/// One line of the agent's stream-json output.
#[derive(Debug, Deserialize)]
struct StreamLine {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    cost: Option<f64>,
    #[serde(default)]
    message: Option<String>,
}

/// Gateway over the external coding-agent CLI. Each `execute_prompt` call
/// spawns one subprocess and a reader task that forwards decoded events until
/// the process exits or the receiver is dropped.
#[derive(Clone)]
pub struct CliAgent {
    argv: Vec<String>,
}

impl CliAgent {
    pub fn new(command: &str) -> Result<Self, AgentError> {
        let argv = shell_words::split(command).map_err(|err| AgentError::InvalidCommand {
            message: err.to_string(),
        })?;
        if argv.is_empty() {
            return Err(AgentError::InvalidCommand {
                message: "agent command empty".to_string(),
            });
        }
        Ok(Self { argv })
    }

    fn permission_mode(mode: AgentMode) -> &'static str {
        match mode {
            AgentMode::Ask => "ask",
            AgentMode::Build => "acceptEdits",
        }
    }
}

impl AgentGateway for CliAgent {
    fn execute_prompt(
        &self,
        request: PromptRequest,
    ) -> Result<mpsc::Receiver<AgentEvent>, AgentError> {
        let (program, args) =
            self.argv
                .split_first()
                .ok_or_else(|| AgentError::InvalidCommand {
                    message: "agent command empty".to_string(),
                })?;

        let mut command = Command::new(program);
        command
            .args(args)
            .arg("--print")
            .arg(&request.prompt)
            .args(["--output-format", "stream-json"])
            .args(["--session-id", &request.session_id])
            .args(["--permission-mode", Self::permission_mode(request.mode)])
            .current_dir(&request.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(resume) = &request.resume_session_id {
            command.args(["--resume", resume]);
        }

        let mut child = command.spawn().map_err(|err| AgentError::SpawnFailed {
            message: err.to_string(),
        })?;

        let stdout = child.stdout.take().ok_or_else(|| AgentError::SpawnFailed {
            message: "agent stdout not captured".to_string(),
        })?;
        let stderr = child.stderr.take();

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let session_id = request.session_id.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            let mut saw_terminal = false;
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        let Ok(decoded) = serde_json::from_str::<StreamLine>(line) else {
                            tracing::debug!(%session_id, "skipping undecodable agent line");
                            continue;
                        };
                        let event = match decoded.kind.as_str() {
                            "text" => AgentEvent::Text {
                                content: decoded.content.unwrap_or_default(),
                            },
                            "complete" => {
                                saw_terminal = true;
                                AgentEvent::Complete {
                                    cost: decoded.cost.unwrap_or(0.0),
                                }
                            }
                            "error" => {
                                saw_terminal = true;
                                AgentEvent::Error {
                                    message: decoded
                                        .message
                                        .or(decoded.content)
                                        .unwrap_or_else(|| "agent error".to_string()),
                                }
                            }
                            _ => continue,
                        };
                        if tx.send(event).await.is_err() {
                            // Consumer went away; kill_on_drop reaps the child.
                            return;
                        }
                    }
                    Ok(None) => break,
                    Err(err) => {
                        let _ = tx
                            .send(AgentEvent::Error {
                                message: format!("agent stream read failed: {err}"),
                            })
                            .await;
                        return;
                    }
                }
            }

            let status = child.wait().await;
            let failed = !matches!(&status, Ok(s) if s.success());
            if failed && !saw_terminal {
                let detail = match stderr {
                    Some(mut stderr) => {
                        let mut buf = vec![0u8; STDERR_LIMIT];
                        let read = stderr.read(&mut buf).await.unwrap_or(0);
                        buf.truncate(read);
                        String::from_utf8_lossy(&buf).trim().to_string()
                    }
                    None => String::new(),
                };
                let message = if detail.is_empty() {
                    format!("agent exited with {status:?}")
                } else {
                    detail
                };
                let _ = tx.send(AgentEvent::Error { message }).await;
            }
        });

        Ok(rx)
    }
}

/// Chat-send surface backed by the same CLI, always a fresh session in the
/// requested capability mode. The caller only observes terminal signals.
#[derive(Clone)]
pub struct CliChat {
    agent: CliAgent,
}

impl CliChat {
    pub fn new(agent: CliAgent) -> Self {
        Self { agent }
    }
}

impl ChatGateway for CliChat {
    fn send_message(
        &self,
        project_id: &str,
        working_dir: &Path,
        content: &str,
        mode: AgentMode,
    ) -> Result<mpsc::Receiver<ChatSignal>, AgentError> {
        let request = PromptRequest {
            working_dir: working_dir.to_path_buf(),
            prompt: content.to_string(),
            session_id: format!("chat-{}", ulid_like()),
            resume_session_id: None,
            mode,
        };
        let mut events = self.agent.execute_prompt(request)?;

        let (tx, rx) = mpsc::channel(4);
        let project = project_id.to_string();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if let AgentEvent::Error { message } = event {
                    tracing::warn!(project_id = %project, %message, "chat agent run failed");
                    let _ = tx.send(ChatSignal::Failed { message }).await;
                    return;
                }
            }
            let _ = tx.send(ChatSignal::Completed).await;
        });
        Ok(rx)
    }
}

fn ulid_like() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_command() {
        assert!(CliAgent::new("").is_err());
    }

    #[test]
    fn splits_command_shell_style() {
        let agent = CliAgent::new("my-agent --flag 'a b'").expect("valid");
        assert_eq!(agent.argv, vec!["my-agent", "--flag", "a b"]);
    }

    #[tokio::test]
    async fn spawn_failure_surfaces_as_error() {
        let agent = CliAgent::new("/nonexistent/sw-agent-test-binary").expect("valid");
        let result = agent.execute_prompt(PromptRequest {
            working_dir: std::env::temp_dir(),
            prompt: "hello".to_string(),
            session_id: "s1".to_string(),
            resume_session_id: None,
            mode: AgentMode::Ask,
        });
        assert!(matches!(result, Err(AgentError::SpawnFailed { .. })));
    }

    #[tokio::test]
    async fn decodes_stream_lines_from_real_subprocess() {
        // Use a shell as a stand-in agent that emits the stream contract.
        let agent = CliAgent::new(
            r#"sh -c 'printf "%s\n%s\n" "{\"type\":\"text\",\"content\":\"hi\"}" "{\"type\":\"complete\",\"cost\":0.5}"' --"#,
        )
        .expect("valid");
        let mut rx = agent
            .execute_prompt(PromptRequest {
                working_dir: std::env::temp_dir(),
                prompt: "ignored".to_string(),
                session_id: "s2".to_string(),
                resume_session_id: None,
                mode: AgentMode::Ask,
            })
            .expect("spawned");

        let mut texts = Vec::new();
        let mut cost = None;
        while let Some(event) = rx.recv().await {
            match event {
                AgentEvent::Text { content } => texts.push(content),
                AgentEvent::Complete { cost: c } => cost = Some(c),
                AgentEvent::Error { .. } => {}
            }
        }
        assert_eq!(texts, vec!["hi".to_string()]);
        assert_eq!(cost, Some(0.5));
    }
}
