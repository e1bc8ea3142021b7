use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("project not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("review not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("container operation failed: {message}")]
    ContainerFailed { message: String },
    #[error("database did not become ready after {attempts} attempts")]
    NotReady { attempts: u32 },
    #[error("no available port found in range {start}-{end}")]
    NoAvailablePort { start: u16, end: u16 },
    #[error("io error: {message}")]
    Io { message: String },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

#[derive(Debug, Error)]
pub enum DataError {
    #[error("no database found for project")]
    DatabaseNotFound,
    #[error("destructive queries are not allowed")]
    DestructiveQuery,
    #[error("query failed: {message}")]
    QueryFailed { message: String },
    #[error("connection failed: {message}")]
    ConnectionFailed { message: String },
}

#[derive(Debug, Error)]
pub enum ShipwrightError {
    #[error(transparent)]
    Project(#[from] ProjectError),
    #[error(transparent)]
    Review(#[from] ReviewError),
    #[error(transparent)]
    Message(#[from] MessageError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Data(#[from] DataError),
    #[error("agent error: {message}")]
    Agent { message: String },
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl From<sw_agent::AgentError> for ShipwrightError {
    fn from(value: sw_agent::AgentError) -> Self {
        ShipwrightError::Agent {
            message: value.to_string(),
        }
    }
}
