use crate::util::{encode_enum, to_rfc3339};
use rusqlite::Connection;
use sw_core::error::MessageError;
use sw_core::messages::MessageRepository;
use sw_core::types::{CreateMessageInput, Message, MessageId};

pub struct MessageRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> MessageRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl MessageRepository for MessageRepo<'_> {
    fn append(&self, input: CreateMessageInput) -> Result<Message, MessageError> {
        let now = chrono::Utc::now();
        let message = Message {
            id: MessageId::generate(),
            project_id: input.project_id,
            role: input.role,
            content: input.content,
            metadata: input.metadata,
            created_at: now,
        };

        let sql = "INSERT INTO messages (id, project_id, role, content, metadata, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)";
        let metadata = message
            .metadata
            .as_ref()
            .map(|value| value.to_string());
        let params = (
            message.id.as_str(),
            message.project_id.as_str(),
            encode_enum(&message.role).map_err(|err| MessageError::InvalidInput {
                message: err.to_string(),
            })?,
            message.content.clone(),
            metadata,
            to_rfc3339(&message.created_at),
        );
        self.conn
            .execute(sql, params)
            .map_err(|err| MessageError::InvalidInput {
                message: err.to_string(),
            })?;

        Ok(message)
    }
}
