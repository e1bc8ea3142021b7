use crate::util::{decode_enum, decode_json, encode_enum, encode_json, from_rfc3339, to_rfc3339};
use rusqlite::Connection;
use sw_core::error::ReviewError;
use sw_core::reviews::ReviewRepository;
use sw_core::types::{
    CreateReviewInput, MessageId, ProjectId, Review, ReviewId, ReviewIssue, ReviewResult,
    ReviewStatus,
};

const REVIEW_COLUMNS: &str = "id, project_id, status, trigger_message_id, summary, overall_score, issues, strengths, recommendations, cost, created_at, completed_at";

pub struct ReviewRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> ReviewRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl ReviewRepository for ReviewRepo<'_> {
    fn create(&self, input: CreateReviewInput) -> Result<Review, ReviewError> {
        let now = chrono::Utc::now();
        let review = Review {
            id: ReviewId::generate(),
            project_id: input.project_id,
            status: ReviewStatus::Running,
            trigger_message_id: input.trigger_message_id,
            summary: None,
            overall_score: None,
            issues: Vec::new(),
            strengths: Vec::new(),
            recommendations: Vec::new(),
            cost: None,
            created_at: now,
            completed_at: None,
        };

        let sql = "INSERT INTO reviews (id, project_id, status, trigger_message_id, created_at) VALUES (?1, ?2, ?3, ?4, ?5)";
        let params = (
            review.id.as_str(),
            review.project_id.as_str(),
            encode_enum(&review.status).map_err(|err| ReviewError::InvalidInput {
                message: err.to_string(),
            })?,
            review.trigger_message_id.as_ref().map(|id| id.as_str()),
            to_rfc3339(&review.created_at),
        );
        self.conn
            .execute(sql, params)
            .map_err(|err| ReviewError::InvalidInput {
                message: err.to_string(),
            })?;

        Ok(review)
    }

    fn get(&self, id: &ReviewId) -> Result<Option<Review>, ReviewError> {
        let sql = format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = ?1");
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|err| ReviewError::InvalidInput {
                message: err.to_string(),
            })?;
        let mut rows = stmt
            .query([id.as_str()])
            .map_err(|err| ReviewError::InvalidInput {
                message: err.to_string(),
            })?;
        let Some(row) = rows.next().map_err(|err| ReviewError::InvalidInput {
            message: err.to_string(),
        })?
        else {
            return Ok(None);
        };
        map_review_row(row).map(Some)
    }

    fn get_running_for_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<Option<Review>, ReviewError> {
        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE project_id = ?1 AND status = 'RUNNING' ORDER BY created_at DESC LIMIT 1"
        );
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|err| ReviewError::InvalidInput {
                message: err.to_string(),
            })?;
        let mut rows = stmt
            .query([project_id.as_str()])
            .map_err(|err| ReviewError::InvalidInput {
                message: err.to_string(),
            })?;
        let Some(row) = rows.next().map_err(|err| ReviewError::InvalidInput {
            message: err.to_string(),
        })?
        else {
            return Ok(None);
        };
        map_review_row(row).map(Some)
    }

    fn list_for_project(
        &self,
        project_id: &ProjectId,
        limit: u32,
    ) -> Result<Vec<Review>, ReviewError> {
        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE project_id = ?1 ORDER BY created_at DESC LIMIT ?2"
        );
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|err| ReviewError::InvalidInput {
                message: err.to_string(),
            })?;
        let mut rows = stmt
            .query((project_id.as_str(), limit))
            .map_err(|err| ReviewError::InvalidInput {
                message: err.to_string(),
            })?;
        let mut reviews = Vec::new();
        while let Some(row) = rows.next().map_err(|err| ReviewError::InvalidInput {
            message: err.to_string(),
        })? {
            reviews.push(map_review_row(row)?);
        }
        Ok(reviews)
    }

    fn set_status(&self, id: &ReviewId, status: ReviewStatus) -> Result<Review, ReviewError> {
        let mut review = self.get(id)?.ok_or(ReviewError::NotFound)?;
        review.status = status;
        if status.is_terminal() && review.completed_at.is_none() {
            review.completed_at = Some(chrono::Utc::now());
        }

        let sql = "UPDATE reviews SET status = ?1, completed_at = ?2 WHERE id = ?3";
        let params = (
            encode_enum(&review.status).map_err(|err| ReviewError::InvalidInput {
                message: err.to_string(),
            })?,
            review.completed_at.map(|value| to_rfc3339(&value)),
            review.id.as_str(),
        );
        self.conn
            .execute(sql, params)
            .map_err(|err| ReviewError::InvalidInput {
                message: err.to_string(),
            })?;

        Ok(review)
    }

    fn set_failed(&self, id: &ReviewId, summary: &str) -> Result<Review, ReviewError> {
        let mut review = self.get(id)?.ok_or(ReviewError::NotFound)?;
        review.status = ReviewStatus::Failed;
        review.summary = Some(summary.to_string());
        review.completed_at = Some(chrono::Utc::now());

        let sql = "UPDATE reviews SET status = 'FAILED', summary = ?1, completed_at = ?2 WHERE id = ?3";
        let params = (
            summary,
            review.completed_at.map(|value| to_rfc3339(&value)),
            review.id.as_str(),
        );
        self.conn
            .execute(sql, params)
            .map_err(|err| ReviewError::InvalidInput {
                message: err.to_string(),
            })?;

        Ok(review)
    }

    fn set_result(
        &self,
        id: &ReviewId,
        result: &ReviewResult,
        cost: f64,
    ) -> Result<Review, ReviewError> {
        let mut review = self.get(id)?.ok_or(ReviewError::NotFound)?;
        review.status = ReviewStatus::Completed;
        review.summary = Some(result.summary.clone());
        review.overall_score = Some(result.overall_score);
        review.issues = result.issues.clone();
        review.strengths = result.strengths.clone();
        review.recommendations = result.recommendations.clone();
        review.cost = Some(cost);
        review.completed_at = Some(chrono::Utc::now());

        let sql = "UPDATE reviews SET status = 'COMPLETED', summary = ?1, overall_score = ?2, issues = ?3, strengths = ?4, recommendations = ?5, cost = ?6, completed_at = ?7 WHERE id = ?8";
        let params = (
            result.summary.clone(),
            i64::from(result.overall_score),
            encode_json(&result.issues).map_err(|err| ReviewError::InvalidInput {
                message: err.to_string(),
            })?,
            encode_json(&result.strengths).map_err(|err| ReviewError::InvalidInput {
                message: err.to_string(),
            })?,
            encode_json(&result.recommendations).map_err(|err| ReviewError::InvalidInput {
                message: err.to_string(),
            })?,
            cost,
            review.completed_at.map(|value| to_rfc3339(&value)),
            review.id.as_str(),
        );
        self.conn
            .execute(sql, params)
            .map_err(|err| ReviewError::InvalidInput {
                message: err.to_string(),
            })?;

        Ok(review)
    }
}

fn map_review_row(row: &rusqlite::Row<'_>) -> Result<Review, ReviewError> {
    let id: String = row.get(0).map_err(|err| ReviewError::InvalidInput {
        message: err.to_string(),
    })?;
    let project_id: String = row.get(1).map_err(|err| ReviewError::InvalidInput {
        message: err.to_string(),
    })?;
    let status: String = row.get(2).map_err(|err| ReviewError::InvalidInput {
        message: err.to_string(),
    })?;
    let trigger_message_id: Option<String> =
        row.get(3).map_err(|err| ReviewError::InvalidInput {
            message: err.to_string(),
        })?;
    let summary: Option<String> = row.get(4).map_err(|err| ReviewError::InvalidInput {
        message: err.to_string(),
    })?;
    let overall_score: Option<i64> = row.get(5).map_err(|err| ReviewError::InvalidInput {
        message: err.to_string(),
    })?;
    let issues: String = row.get(6).map_err(|err| ReviewError::InvalidInput {
        message: err.to_string(),
    })?;
    let strengths: String = row.get(7).map_err(|err| ReviewError::InvalidInput {
        message: err.to_string(),
    })?;
    let recommendations: String = row.get(8).map_err(|err| ReviewError::InvalidInput {
        message: err.to_string(),
    })?;
    let cost: Option<f64> = row.get(9).map_err(|err| ReviewError::InvalidInput {
        message: err.to_string(),
    })?;
    let created_at: String = row.get(10).map_err(|err| ReviewError::InvalidInput {
        message: err.to_string(),
    })?;
    let completed_at: Option<String> = row.get(11).map_err(|err| ReviewError::InvalidInput {
        message: err.to_string(),
    })?;

    let id = ReviewId::new(id).map_err(|err| ReviewError::InvalidInput {
        message: err.to_string(),
    })?;
    let project_id = ProjectId::new(project_id).map_err(|err| ReviewError::InvalidInput {
        message: err.to_string(),
    })?;
    let status: ReviewStatus = decode_enum(&status).map_err(|err| ReviewError::InvalidInput {
        message: err.to_string(),
    })?;
    let trigger_message_id = trigger_message_id
        .map(MessageId::new)
        .transpose()
        .map_err(|err| ReviewError::InvalidInput {
            message: err.to_string(),
        })?;
    let issues: Vec<ReviewIssue> =
        decode_json(&issues).map_err(|err| ReviewError::InvalidInput {
            message: err.to_string(),
        })?;
    let strengths: Vec<String> =
        decode_json(&strengths).map_err(|err| ReviewError::InvalidInput {
            message: err.to_string(),
        })?;
    let recommendations: Vec<String> =
        decode_json(&recommendations).map_err(|err| ReviewError::InvalidInput {
            message: err.to_string(),
        })?;

    Ok(Review {
        id,
        project_id,
        status,
        trigger_message_id,
        summary,
        overall_score: overall_score.map(|value| value.clamp(0, 100) as u8),
        issues,
        strengths,
        recommendations,
        cost,
        created_at: from_rfc3339(&created_at).map_err(|err| ReviewError::InvalidInput {
            message: err.to_string(),
        })?,
        completed_at: completed_at
            .map(|value| from_rfc3339(&value))
            .transpose()
            .map_err(|err| ReviewError::InvalidInput {
                message: err.to_string(),
            })?,
    })
}
