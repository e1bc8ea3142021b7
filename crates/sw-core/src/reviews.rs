use crate::error::ReviewError;
use crate::types::{CreateReviewInput, ProjectId, Review, ReviewId, ReviewResult, ReviewStatus};

pub trait ReviewRepository {
    /// Creates a review in the Running state.
    fn create(&self, input: CreateReviewInput) -> Result<Review, ReviewError>;
    fn get(&self, id: &ReviewId) -> Result<Option<Review>, ReviewError>;
    fn get_running_for_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<Option<Review>, ReviewError>;
    /// Newest first, capped at `limit`.
    fn list_for_project(
        &self,
        project_id: &ProjectId,
        limit: u32,
    ) -> Result<Vec<Review>, ReviewError>;
    fn set_status(&self, id: &ReviewId, status: ReviewStatus) -> Result<Review, ReviewError>;
    /// Marks the review Failed with the given summary and stamps completed_at.
    fn set_failed(&self, id: &ReviewId, summary: &str) -> Result<Review, ReviewError>;
    /// Marks the review Completed with the parsed result and reported cost,
    /// and stamps completed_at.
    fn set_result(
        &self,
        id: &ReviewId,
        result: &ReviewResult,
        cost: f64,
    ) -> Result<Review, ReviewError>;
}
