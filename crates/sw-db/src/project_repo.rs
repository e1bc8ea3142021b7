use crate::util::{decode_enum, encode_enum, from_rfc3339, to_rfc3339};
use rusqlite::Connection;
use std::path::PathBuf;
use sw_core::error::ProjectError;
use sw_core::projects::ProjectRepository;
use sw_core::types::{CreateProjectInput, DatabaseProvider, Project, ProjectId};

pub struct ProjectRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> ProjectRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl ProjectRepository for ProjectRepo<'_> {
    fn create(&self, input: CreateProjectInput) -> Result<Project, ProjectError> {
        let now = chrono::Utc::now();
        let project = Project {
            id: ProjectId::generate(),
            name: input.name,
            path: input.path,
            database_provider: input.database_provider,
            database_url: input.database_url,
            created_at: now,
        };

        let sql = "INSERT INTO projects (id, name, path, database_provider, database_url, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)";
        let provider = project
            .database_provider
            .as_ref()
            .map(encode_enum)
            .transpose()
            .map_err(|err| ProjectError::InvalidInput {
                message: err.to_string(),
            })?;
        let params = (
            project.id.as_str(),
            project.name.clone(),
            project.path.to_string_lossy().into_owned(),
            provider,
            project.database_url.clone(),
            to_rfc3339(&project.created_at),
        );
        self.conn
            .execute(sql, params)
            .map_err(|err| ProjectError::InvalidInput {
                message: err.to_string(),
            })?;

        Ok(project)
    }

    fn get(&self, id: &ProjectId) -> Result<Option<Project>, ProjectError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, path, database_provider, database_url, created_at FROM projects WHERE id = ?1")
            .map_err(|err| ProjectError::InvalidInput {
                message: err.to_string(),
            })?;
        let mut rows = stmt
            .query([id.as_str()])
            .map_err(|err| ProjectError::InvalidInput {
                message: err.to_string(),
            })?;
        let Some(row) = rows.next().map_err(|err| ProjectError::InvalidInput {
            message: err.to_string(),
        })?
        else {
            return Ok(None);
        };
        map_project_row(row).map(Some)
    }

    fn set_database(
        &self,
        id: &ProjectId,
        provider: DatabaseProvider,
        url: &str,
    ) -> Result<Project, ProjectError> {
        let mut project = self.get(id)?.ok_or(ProjectError::NotFound)?;
        project.database_provider = Some(provider);
        project.database_url = Some(url.to_string());

        let sql = "UPDATE projects SET database_provider = ?1, database_url = ?2 WHERE id = ?3";
        let params = (
            encode_enum(&provider).map_err(|err| ProjectError::InvalidInput {
                message: err.to_string(),
            })?,
            url,
            project.id.as_str(),
        );
        self.conn
            .execute(sql, params)
            .map_err(|err| ProjectError::InvalidInput {
                message: err.to_string(),
            })?;

        Ok(project)
    }
}

fn map_project_row(row: &rusqlite::Row<'_>) -> Result<Project, ProjectError> {
    let id: String = row.get(0).map_err(|err| ProjectError::InvalidInput {
        message: err.to_string(),
    })?;
    let name: String = row.get(1).map_err(|err| ProjectError::InvalidInput {
        message: err.to_string(),
    })?;
    let path: String = row.get(2).map_err(|err| ProjectError::InvalidInput {
        message: err.to_string(),
    })?;
    let database_provider: Option<String> =
        row.get(3).map_err(|err| ProjectError::InvalidInput {
            message: err.to_string(),
        })?;
    let database_url: Option<String> = row.get(4).map_err(|err| ProjectError::InvalidInput {
        message: err.to_string(),
    })?;
    let created_at: String = row.get(5).map_err(|err| ProjectError::InvalidInput {
        message: err.to_string(),
    })?;

    let id = ProjectId::new(id).map_err(|err| ProjectError::InvalidInput {
        message: err.to_string(),
    })?;
    let database_provider = database_provider
        .map(|value| decode_enum::<DatabaseProvider>(&value))
        .transpose()
        .map_err(|err| ProjectError::InvalidInput {
            message: err.to_string(),
        })?;

    Ok(Project {
        id,
        name,
        path: PathBuf::from(path),
        database_provider,
        database_url,
        created_at: from_rfc3339(&created_at).map_err(|err| ProjectError::InvalidInput {
            message: err.to_string(),
        })?,
    })
}
