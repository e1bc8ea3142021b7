use crate::error::MessageError;
use crate::types::{CreateMessageInput, Message};

pub trait MessageRepository {
    fn append(&self, input: CreateMessageInput) -> Result<Message, MessageError>;
}
