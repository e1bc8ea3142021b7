pub mod cli;
pub mod gateway;
pub mod types;

pub use cli::{CliAgent, CliChat};
pub use gateway::{AgentGateway, ChatGateway};
pub use types::{AgentError, AgentEvent, AgentMode, ChatSignal, PromptRequest};
