use crate::error::ProjectError;
use crate::types::{CreateProjectInput, DatabaseProvider, Project, ProjectId};

pub trait ProjectRepository {
    fn create(&self, input: CreateProjectInput) -> Result<Project, ProjectError>;
    fn get(&self, id: &ProjectId) -> Result<Option<Project>, ProjectError>;
    /// Records the provisioned database on the project so container
    /// credentials survive beyond creation time.
    fn set_database(
        &self,
        id: &ProjectId,
        provider: DatabaseProvider,
        url: &str,
    ) -> Result<Project, ProjectError>;
}
