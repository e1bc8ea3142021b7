pub mod enums;
pub mod ids;
pub mod infra;
pub mod io;
pub mod message;
pub mod project;
pub mod review;

pub use enums::{DatabaseProvider, DatabaseState, IssueCategory, IssueSeverity, MessageRole, ReviewStatus};
pub use ids::{MessageId, ProjectId, ReviewId};
pub use infra::{DatabaseConfig, InfraStatus, ProjectDatabaseStatus, RuntimeStatus};
pub use io::{CreateMessageInput, CreateProjectInput, CreateReviewInput, ToolActivity};
pub use message::Message;
pub use project::Project;
pub use review::{Review, ReviewIssue, ReviewResult};
