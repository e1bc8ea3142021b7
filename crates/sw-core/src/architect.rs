use crate::error::{ProjectError, ShipwrightError};
use crate::messages::MessageRepository;
use crate::parser::parse_review_result;
use crate::projects::ProjectRepository;
use crate::prompts::{build_auto_fix_prompt, build_review_prompt};
use crate::reviews::ReviewRepository;
use crate::store::Store;
use crate::types::{
    CreateMessageInput, CreateReviewInput, IssueSeverity, MessageId, MessageRole, ProjectId,
    Review, ReviewId, ReviewIssue, ReviewResult, ReviewStatus, ToolActivity,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use sw_agent::{AgentEvent, AgentGateway, AgentMode, ChatGateway, ChatSignal, PromptRequest};
use sw_events::{ReviewHub, ReviewStreamEvent};
use tokio::sync::broadcast;
use ulid::Ulid;
use utoipa::ToSchema;

/// Tool names that indicate file modifications.
const FILE_MODIFY_TOOLS: &[&str] = &["Write", "Edit", "MultiEdit"];

/// Minimum gap between automatically triggered reviews for one project.
const REVIEW_COOLDOWN: Duration = Duration::from_secs(30);

const REVIEW_LIST_CAP: u32 = 20;
const PARSE_FAILURE_SUMMARY: &str = "Failed to parse review result";

/// Emitted by the build pipeline when an agent run finishes.
#[derive(Debug, Clone)]
pub struct BuildCompleteEvent {
    pub project_id: ProjectId,
    pub message_id: MessageId,
    pub tool_activities: Vec<ToolActivity>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TriggeredReview {
    pub review_id: ReviewId,
}

/// Post-build review orchestrator.
///
/// Owns the per-project cooldown map and the event hub; reviews execute on
/// detached tasks so `trigger_review` returns as soon as the Running record
/// exists. The store sits behind a mutex because review execution mutates it
/// from background tasks; every lock scope is await-free.
pub struct Architect<S> {
    store: Arc<Mutex<S>>,
    agent: Arc<dyn AgentGateway>,
    chat: Arc<dyn ChatGateway>,
    hub: ReviewHub,
    last_review: Arc<Mutex<HashMap<ProjectId, Instant>>>,
    cooldown: Duration,
}

impl<S> Clone for Architect<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            agent: Arc::clone(&self.agent),
            chat: Arc::clone(&self.chat),
            hub: self.hub.clone(),
            last_review: Arc::clone(&self.last_review),
            cooldown: self.cooldown,
        }
    }
}

impl<S: Store + Send + 'static> Architect<S> {
    pub fn new(
        store: Arc<Mutex<S>>,
        agent: Arc<dyn AgentGateway>,
        chat: Arc<dyn ChatGateway>,
        hub: ReviewHub,
    ) -> Self {
        Self {
            store,
            agent,
            chat,
            hub,
            last_review: Arc::new(Mutex::new(HashMap::new())),
            cooldown: REVIEW_COOLDOWN,
        }
    }

    #[cfg(test)]
    fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Gate sequence for automatic triggering; each check short-circuits.
    /// The manual `trigger_review` path bypasses all of these by design.
    pub async fn handle_build_complete(
        &self,
        event: BuildCompleteEvent,
    ) -> Result<(), ShipwrightError> {
        let has_file_changes = event
            .tool_activities
            .iter()
            .any(|activity| FILE_MODIFY_TOOLS.contains(&activity.name.as_str()));
        if !has_file_changes {
            tracing::info!(project_id = %event.project_id, "skipping review: no file modifications");
            return Ok(());
        }

        let cooling_down = {
            let last = self.last_review.lock().expect("cooldown lock poisoned");
            last.get(&event.project_id)
                .is_some_and(|at| at.elapsed() < self.cooldown)
        };
        if cooling_down {
            tracing::info!(project_id = %event.project_id, "skipping review: cooldown active");
            return Ok(());
        }

        let running = {
            let store = self.store.lock().expect("store lock poisoned");
            store.reviews().get_running_for_project(&event.project_id)?
        };
        if running.is_some() {
            tracing::info!(project_id = %event.project_id, "skipping review: review already running");
            return Ok(());
        }

        self.trigger_review(&event.project_id, Some(event.message_id))
            .await?;
        Ok(())
    }

    /// Creates the Running review record and launches execution on a detached
    /// task. Errors inside the task are logged, never surfaced here.
    pub async fn trigger_review(
        &self,
        project_id: &ProjectId,
        trigger_message_id: Option<MessageId>,
    ) -> Result<TriggeredReview, ShipwrightError> {
        let (review, project_path) = {
            let store = self.store.lock().expect("store lock poisoned");
            let project = store
                .projects()
                .get(project_id)?
                .ok_or(ProjectError::NotFound)?;
            let review = store.reviews().create(CreateReviewInput {
                project_id: project_id.clone(),
                trigger_message_id,
            })?;
            (review, project.path)
        };

        self.last_review
            .lock()
            .expect("cooldown lock poisoned")
            .insert(project_id.clone(), Instant::now());
        self.hub
            .emit(project_id.as_str(), ReviewStreamEvent::start(review.id.as_str()));

        let this = self.clone();
        let review_id = review.id.clone();
        let project = project_id.clone();
        tokio::spawn(async move {
            if let Err(err) = this.run_review(&review_id, &project, project_path).await {
                tracing::error!(review_id = %review_id, %err, "review failed");
            }
        });

        Ok(TriggeredReview {
            review_id: review.id,
        })
    }

    pub fn list_reviews(&self, project_id: &ProjectId) -> Result<Vec<Review>, ShipwrightError> {
        let store = self.store.lock().expect("store lock poisoned");
        Ok(store.reviews().list_for_project(project_id, REVIEW_LIST_CAP)?)
    }

    pub fn get_review(
        &self,
        project_id: &ProjectId,
        review_id: &ReviewId,
    ) -> Result<Review, ShipwrightError> {
        let store = self.store.lock().expect("store lock poisoned");
        let review = store
            .reviews()
            .get(review_id)?
            .filter(|review| &review.project_id == project_id)
            .ok_or(crate::error::ReviewError::NotFound)?;
        Ok(review)
    }

    pub fn review_stream(&self, project_id: &ProjectId) -> broadcast::Receiver<ReviewStreamEvent> {
        self.hub.subscribe(project_id.as_str())
    }

    async fn run_review(
        &self,
        review_id: &ReviewId,
        project_id: &ProjectId,
        project_path: PathBuf,
    ) -> Result<(), ShipwrightError> {
        let prompt = build_review_prompt(&project_path);
        let request = PromptRequest {
            working_dir: project_path.clone(),
            prompt,
            session_id: Ulid::new().to_string(),
            resume_session_id: None,
            mode: AgentMode::Ask,
        };

        let mut events = match self.agent.execute_prompt(request) {
            Ok(events) => events,
            Err(err) => {
                self.fail_review(review_id, project_id, &err.to_string())?;
                return Ok(());
            }
        };

        let mut response = String::new();
        let mut cost = 0.0;
        let mut stream_error = None;
        while let Some(event) = events.recv().await {
            match event {
                AgentEvent::Text { content } => response.push_str(&content),
                AgentEvent::Complete { cost: reported } => cost = reported,
                AgentEvent::Error { message } => {
                    stream_error = Some(message);
                    break;
                }
            }
        }

        if let Some(message) = stream_error {
            tracing::error!(review_id = %review_id, %message, "review agent error");
            self.fail_review(review_id, project_id, &message)?;
            return Ok(());
        }

        let result = match parse_review_result(&response) {
            Ok(result) => result,
            Err(err) => {
                tracing::error!(review_id = %review_id, %err, "failed to parse review result");
                let review = {
                    let store = self.store.lock().expect("store lock poisoned");
                    store.reviews().set_failed(review_id, PARSE_FAILURE_SUMMARY)?
                };
                self.hub.emit(
                    project_id.as_str(),
                    ReviewStreamEvent::error(review.id.as_str(), PARSE_FAILURE_SUMMARY),
                );
                return Ok(());
            }
        };

        {
            let store = self.store.lock().expect("store lock poisoned");
            store.reviews().set_result(review_id, &result, cost)?;
            store.messages().append(summary_message(
                project_id,
                review_id,
                &result,
            ))?;
        }

        self.hub.emit(
            project_id.as_str(),
            ReviewStreamEvent::complete(
                review_id.as_str(),
                serde_json::to_value(&result).unwrap_or_default(),
            ),
        );

        let auto_fix: Vec<ReviewIssue> = result
            .issues
            .iter()
            .filter(|issue| issue.qualifies_for_auto_fix())
            .cloned()
            .collect();
        if !auto_fix.is_empty() {
            self.trigger_auto_fix(project_id, review_id, &project_path, auto_fix)?;
        }

        Ok(())
    }

    fn fail_review(
        &self,
        review_id: &ReviewId,
        project_id: &ProjectId,
        message: &str,
    ) -> Result<(), ShipwrightError> {
        {
            let store = self.store.lock().expect("store lock poisoned");
            store.reviews().set_failed(review_id, message)?;
        }
        self.hub.emit(
            project_id.as_str(),
            ReviewStreamEvent::error(review_id.as_str(), message),
        );
        Ok(())
    }

    /// Dispatches qualifying issues to the write-capable chat pipeline. A fix
    /// failure only logs and leaves the review in AutoFixing; there is no
    /// terminal failure state for fixes (known gap, kept as-is).
    fn trigger_auto_fix(
        &self,
        project_id: &ProjectId,
        review_id: &ReviewId,
        project_path: &std::path::Path,
        issues: Vec<ReviewIssue>,
    ) -> Result<(), ShipwrightError> {
        tracing::info!(
            project_id = %project_id,
            review_id = %review_id,
            count = issues.len(),
            "triggering auto-fix"
        );

        {
            let store = self.store.lock().expect("store lock poisoned");
            store
                .reviews()
                .set_status(review_id, ReviewStatus::AutoFixing)?;
        }

        let prompt = build_auto_fix_prompt(&issues);
        let mut signals =
            self.chat
                .send_message(project_id.as_str(), project_path, &prompt, AgentMode::Build)?;

        let this = self.clone();
        let review = review_id.clone();
        tokio::spawn(async move {
            while let Some(signal) = signals.recv().await {
                match signal {
                    ChatSignal::Completed => {
                        let updated = {
                            let store = this.store.lock().expect("store lock poisoned");
                            store.reviews().set_status(&review, ReviewStatus::Completed)
                        };
                        match updated {
                            Ok(_) => tracing::info!(review_id = %review, "auto-fix completed"),
                            Err(err) => {
                                tracing::error!(review_id = %review, %err, "auto-fix status update failed");
                            }
                        }
                        return;
                    }
                    ChatSignal::Failed { message } => {
                        tracing::error!(review_id = %review, %message, "auto-fix failed");
                        return;
                    }
                }
            }
        });

        Ok(())
    }
}

fn summary_message(
    project_id: &ProjectId,
    review_id: &ReviewId,
    result: &ReviewResult,
) -> CreateMessageInput {
    let issue_count = result.issues.len();
    let critical_count = result
        .issues
        .iter()
        .filter(|i| i.severity == IssueSeverity::Critical)
        .count();
    let high_count = result
        .issues
        .iter()
        .filter(|i| i.severity == IssueSeverity::High)
        .count();

    let mut content = format!(
        "Code Review Complete - Score: {}/100\n{}",
        result.overall_score, result.summary
    );
    if issue_count > 0 {
        content.push_str(&format!("\n\nIssues: {issue_count} total"));
        if critical_count > 0 {
            content.push_str(&format!(" ({critical_count} critical)"));
        }
        if high_count > 0 {
            content.push_str(&format!(" ({high_count} high)"));
        }
    }

    CreateMessageInput {
        project_id: project_id.clone(),
        role: MessageRole::System,
        content,
        metadata: Some(serde_json::json!({
            "type": "review_summary",
            "reviewId": review_id.as_str(),
            "overallScore": result.overall_score,
            "issueCount": issue_count,
            "criticalCount": critical_count,
            "highCount": high_count,
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MessageError, ProjectError, ReviewError};
    use crate::types::{CreateProjectInput, Message, Project};
    use chrono::Utc;
    use std::path::Path;
    use sw_events::ReviewStreamEventKind;
    use tokio::sync::mpsc;

    // Minimal in-memory store mirroring the sqlite repos.
    #[derive(Default)]
    struct MemState {
        projects: Vec<Project>,
        reviews: Vec<Review>,
        messages: Vec<Message>,
    }

    #[derive(Default)]
    struct MemStore {
        state: std::sync::Mutex<MemState>,
    }

    struct MemProjects<'a>(&'a MemStore);
    struct MemReviews<'a>(&'a MemStore);
    struct MemMessages<'a>(&'a MemStore);
    struct MemSettings;

    impl ProjectRepository for MemProjects<'_> {
        fn create(&self, input: CreateProjectInput) -> Result<Project, ProjectError> {
            let project = Project {
                id: ProjectId::generate(),
                name: input.name,
                path: input.path,
                database_provider: input.database_provider,
                database_url: input.database_url,
                created_at: Utc::now(),
            };
            self.0.state.lock().unwrap().projects.push(project.clone());
            Ok(project)
        }

        fn get(&self, id: &ProjectId) -> Result<Option<Project>, ProjectError> {
            Ok(self
                .0
                .state
                .lock().unwrap()
                .projects
                .iter()
                .find(|p| &p.id == id)
                .cloned())
        }

        fn set_database(
            &self,
            id: &ProjectId,
            provider: crate::types::DatabaseProvider,
            url: &str,
        ) -> Result<Project, ProjectError> {
            let mut state = self.0.state.lock().unwrap();
            let project = state
                .projects
                .iter_mut()
                .find(|p| &p.id == id)
                .ok_or(ProjectError::NotFound)?;
            project.database_provider = Some(provider);
            project.database_url = Some(url.to_string());
            Ok(project.clone())
        }
    }

    impl ReviewRepository for MemReviews<'_> {
        fn create(&self, input: CreateReviewInput) -> Result<Review, ReviewError> {
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
                created_at: Utc::now(),
                completed_at: None,
            };
            self.0.state.lock().unwrap().reviews.push(review.clone());
            Ok(review)
        }

        fn get(&self, id: &ReviewId) -> Result<Option<Review>, ReviewError> {
            Ok(self
                .0
                .state
                .lock().unwrap()
                .reviews
                .iter()
                .find(|r| &r.id == id)
                .cloned())
        }

        fn get_running_for_project(
            &self,
            project_id: &ProjectId,
        ) -> Result<Option<Review>, ReviewError> {
            Ok(self
                .0
                .state
                .lock().unwrap()
                .reviews
                .iter()
                .find(|r| &r.project_id == project_id && r.status == ReviewStatus::Running)
                .cloned())
        }

        fn list_for_project(
            &self,
            project_id: &ProjectId,
            limit: u32,
        ) -> Result<Vec<Review>, ReviewError> {
            let state = self.0.state.lock().unwrap();
            let mut reviews: Vec<Review> = state
                .reviews
                .iter()
                .filter(|r| &r.project_id == project_id)
                .cloned()
                .collect();
            reviews.reverse();
            reviews.truncate(limit as usize);
            Ok(reviews)
        }

        fn set_status(&self, id: &ReviewId, status: ReviewStatus) -> Result<Review, ReviewError> {
            let mut state = self.0.state.lock().unwrap();
            let review = state
                .reviews
                .iter_mut()
                .find(|r| &r.id == id)
                .ok_or(ReviewError::NotFound)?;
            review.status = status;
            Ok(review.clone())
        }

        fn set_failed(&self, id: &ReviewId, summary: &str) -> Result<Review, ReviewError> {
            let mut state = self.0.state.lock().unwrap();
            let review = state
                .reviews
                .iter_mut()
                .find(|r| &r.id == id)
                .ok_or(ReviewError::NotFound)?;
            review.status = ReviewStatus::Failed;
            review.summary = Some(summary.to_string());
            review.completed_at = Some(Utc::now());
            Ok(review.clone())
        }

        fn set_result(
            &self,
            id: &ReviewId,
            result: &ReviewResult,
            cost: f64,
        ) -> Result<Review, ReviewError> {
            let mut state = self.0.state.lock().unwrap();
            let review = state
                .reviews
                .iter_mut()
                .find(|r| &r.id == id)
                .ok_or(ReviewError::NotFound)?;
            review.status = ReviewStatus::Completed;
            review.summary = Some(result.summary.clone());
            review.overall_score = Some(result.overall_score);
            review.issues = result.issues.clone();
            review.strengths = result.strengths.clone();
            review.recommendations = result.recommendations.clone();
            review.cost = Some(cost);
            review.completed_at = Some(Utc::now());
            Ok(review.clone())
        }
    }

    impl MessageRepository for MemMessages<'_> {
        fn append(&self, input: CreateMessageInput) -> Result<Message, MessageError> {
            let message = Message {
                id: MessageId::generate(),
                project_id: input.project_id,
                role: input.role,
                content: input.content,
                metadata: input.metadata,
                created_at: Utc::now(),
            };
            self.0.state.lock().unwrap().messages.push(message.clone());
            Ok(message)
        }
    }

    impl crate::settings::SettingsRepository for MemSettings {
        fn get(&self, _key: &str) -> Result<Option<String>, ShipwrightError> {
            Ok(None)
        }
        fn set(&self, _key: &str, _value: &str) -> Result<(), ShipwrightError> {
            Ok(())
        }
    }

    impl Store for MemStore {
        type Projects<'a> = MemProjects<'a>;
        type Reviews<'a> = MemReviews<'a>;
        type Messages<'a> = MemMessages<'a>;
        type Settings<'a> = MemSettings;

        fn projects(&self) -> Self::Projects<'_> {
            MemProjects(self)
        }
        fn reviews(&self) -> Self::Reviews<'_> {
            MemReviews(self)
        }
        fn messages(&self) -> Self::Messages<'_> {
            MemMessages(self)
        }
        fn settings(&self) -> Self::Settings<'_> {
            MemSettings
        }

        fn with_tx<F, T>(&self, f: F) -> Result<T, ShipwrightError>
        where
            F: FnOnce(&Self) -> Result<T, ShipwrightError>,
        {
            f(self)
        }
    }

    /// Agent that replies with a canned event script per call.
    struct ScriptedAgent {
        script: Vec<AgentEvent>,
    }

    impl AgentGateway for ScriptedAgent {
        fn execute_prompt(
            &self,
            _request: PromptRequest,
        ) -> Result<mpsc::Receiver<AgentEvent>, sw_agent::AgentError> {
            let (tx, rx) = mpsc::channel(16);
            let script = self.script.clone();
            tokio::spawn(async move {
                for event in script {
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
            });
            Ok(rx)
        }
    }

    /// Agent whose stream stays open until the test ends.
    struct HangingAgent;

    impl AgentGateway for HangingAgent {
        fn execute_prompt(
            &self,
            _request: PromptRequest,
        ) -> Result<mpsc::Receiver<AgentEvent>, sw_agent::AgentError> {
            let (tx, rx) = mpsc::channel(1);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                drop(tx);
            });
            Ok(rx)
        }
    }

    struct ScriptedChat {
        signal: ChatSignal,
    }

    impl ChatGateway for ScriptedChat {
        fn send_message(
            &self,
            _project_id: &str,
            _working_dir: &Path,
            _content: &str,
            _mode: AgentMode,
        ) -> Result<mpsc::Receiver<ChatSignal>, sw_agent::AgentError> {
            let (tx, rx) = mpsc::channel(4);
            let signal = self.signal.clone();
            tokio::spawn(async move {
                let _ = tx.send(signal).await;
            });
            Ok(rx)
        }
    }

    fn review_json(score: u8, issues: &str) -> String {
        format!(
            r#"{{"summary":"done","overallScore":{score},"issues":{issues},"strengths":[],"recommendations":[]}}"#
        )
    }

    fn architect_with(
        script: Vec<AgentEvent>,
        chat_signal: ChatSignal,
    ) -> (Architect<MemStore>, ProjectId) {
        let store = Arc::new(Mutex::new(MemStore::default()));
        let project = {
            let guard = store.lock().unwrap();
            guard
                .projects()
                .create(CreateProjectInput {
                    name: "demo".to_string(),
                    path: PathBuf::from("/tmp/demo"),
                    database_provider: None,
                    database_url: None,
                })
                .unwrap()
        };
        let architect = Architect::new(
            store,
            Arc::new(ScriptedAgent { script }),
            Arc::new(ScriptedChat {
                signal: chat_signal,
            }),
            ReviewHub::new(),
        );
        (architect, project.id)
    }

    async fn wait_for_status(
        architect: &Architect<MemStore>,
        project_id: &ProjectId,
        review_id: &ReviewId,
        status: ReviewStatus,
    ) -> Review {
        for _ in 0..100 {
            let review = architect.get_review(project_id, review_id).unwrap();
            if review.status == status {
                return review;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("review never reached {status:?}");
    }

    #[tokio::test]
    async fn skips_review_without_file_modifications() {
        let (architect, project_id) = architect_with(Vec::new(), ChatSignal::Completed);
        architect
            .handle_build_complete(BuildCompleteEvent {
                project_id: project_id.clone(),
                message_id: MessageId::generate(),
                tool_activities: vec![
                    ToolActivity {
                        name: "Read".to_string(),
                        input: None,
                    },
                    ToolActivity {
                        name: "Bash".to_string(),
                        input: None,
                    },
                ],
            })
            .await
            .unwrap();
        assert!(architect.list_reviews(&project_id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn cooldown_skips_second_trigger() {
        let script = vec![
            AgentEvent::Text {
                content: review_json(80, "[]"),
            },
            AgentEvent::Complete { cost: 0.1 },
        ];
        let (architect, project_id) = architect_with(script, ChatSignal::Completed);
        let event = |_: u32| BuildCompleteEvent {
            project_id: project_id.clone(),
            message_id: MessageId::generate(),
            tool_activities: vec![ToolActivity {
                name: "Write".to_string(),
                input: None,
            }],
        };
        architect.handle_build_complete(event(0)).await.unwrap();
        architect.handle_build_complete(event(1)).await.unwrap();
        assert_eq!(architect.list_reviews(&project_id).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn running_guard_skips_when_review_in_flight() {
        let (architect, project_id) = architect_with(Vec::new(), ChatSignal::Completed);
        let architect = Architect {
            agent: Arc::new(HangingAgent),
            ..architect
        }
        .with_cooldown(Duration::ZERO);
        let event = BuildCompleteEvent {
            project_id: project_id.clone(),
            message_id: MessageId::generate(),
            tool_activities: vec![ToolActivity {
                name: "Edit".to_string(),
                input: None,
            }],
        };
        // First trigger leaves a review stuck in Running; with cooldown
        // disabled the second trigger must still be skipped by the guard.
        architect.handle_build_complete(event.clone()).await.unwrap();
        architect.handle_build_complete(event).await.unwrap();
        let reviews = architect.list_reviews(&project_id).unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].status, ReviewStatus::Running);
    }

    #[tokio::test]
    async fn manual_trigger_bypasses_gates_and_unknown_project_fails() {
        let (architect, _project_id) = architect_with(Vec::new(), ChatSignal::Completed);
        let missing = ProjectId::generate();
        let err = architect.trigger_review(&missing, None).await.unwrap_err();
        assert!(matches!(
            err,
            ShipwrightError::Project(ProjectError::NotFound)
        ));
    }

    #[tokio::test]
    async fn scenario_complete_review_persists_result_and_emits_events() {
        let script = vec![
            AgentEvent::Text {
                content: review_json(85, "[]"),
            },
            AgentEvent::Complete { cost: 0.42 },
        ];
        let (architect, project_id) = architect_with(script, ChatSignal::Completed);
        let mut stream = architect.review_stream(&project_id);

        let triggered = architect.trigger_review(&project_id, None).await.unwrap();
        let review = wait_for_status(
            &architect,
            &project_id,
            &triggered.review_id,
            ReviewStatus::Completed,
        )
        .await;

        assert_eq!(review.overall_score, Some(85));
        assert_eq!(review.cost, Some(0.42));
        assert!(review.completed_at.is_some());

        let first = stream.recv().await.unwrap();
        assert_eq!(first.kind, ReviewStreamEventKind::Start);
        let second = stream.recv().await.unwrap();
        assert_eq!(second.kind, ReviewStreamEventKind::Complete);
    }

    #[tokio::test]
    async fn scenario_stream_error_marks_review_failed() {
        let script = vec![
            AgentEvent::Text {
                content: "partial".to_string(),
            },
            AgentEvent::Error {
                message: "agent crashed".to_string(),
            },
        ];
        let (architect, project_id) = architect_with(script, ChatSignal::Completed);
        let mut stream = architect.review_stream(&project_id);

        let triggered = architect.trigger_review(&project_id, None).await.unwrap();
        let review = wait_for_status(
            &architect,
            &project_id,
            &triggered.review_id,
            ReviewStatus::Failed,
        )
        .await;

        assert_eq!(review.summary.as_deref(), Some("agent crashed"));
        assert!(review.completed_at.is_some());

        let first = stream.recv().await.unwrap();
        assert_eq!(first.kind, ReviewStreamEventKind::Start);
        let second = stream.recv().await.unwrap();
        assert_eq!(second.kind, ReviewStreamEventKind::Error);
    }

    #[tokio::test]
    async fn parse_failure_marks_review_failed_with_fixed_summary() {
        let script = vec![
            AgentEvent::Text {
                content: "no json here at all".to_string(),
            },
            AgentEvent::Complete { cost: 0.0 },
        ];
        let (architect, project_id) = architect_with(script, ChatSignal::Completed);
        let triggered = architect.trigger_review(&project_id, None).await.unwrap();
        let review = wait_for_status(
            &architect,
            &project_id,
            &triggered.review_id,
            ReviewStatus::Failed,
        )
        .await;
        assert_eq!(review.summary.as_deref(), Some(PARSE_FAILURE_SUMMARY));
    }

    #[tokio::test]
    async fn scenario_auto_fix_returns_review_to_completed() {
        let issues = r#"[{"severity":"critical","category":"bug","title":"Crash","description":"boom","autoFixable":true}]"#;
        let script = vec![
            AgentEvent::Text {
                content: review_json(40, issues),
            },
            AgentEvent::Complete { cost: 0.2 },
        ];
        let (architect, project_id) = architect_with(script, ChatSignal::Completed);
        let triggered = architect.trigger_review(&project_id, None).await.unwrap();

        // COMPLETED -> AUTO_FIXING -> COMPLETED; wait for the final state and
        // confirm the fix path actually ran by checking it settles Completed
        // with the parsed issues persisted.
        let review = wait_for_status(
            &architect,
            &project_id,
            &triggered.review_id,
            ReviewStatus::Completed,
        )
        .await;
        assert_eq!(review.issues.len(), 1);
    }

    #[tokio::test]
    async fn auto_fix_failure_leaves_review_auto_fixing() {
        let issues = r#"[{"severity":"high","category":"security","title":"Leak","description":"secret in log","autoFixable":true}]"#;
        let script = vec![
            AgentEvent::Text {
                content: review_json(55, issues),
            },
            AgentEvent::Complete { cost: 0.1 },
        ];
        let (architect, project_id) = architect_with(
            script,
            ChatSignal::Failed {
                message: "fix run crashed".to_string(),
            },
        );
        let triggered = architect.trigger_review(&project_id, None).await.unwrap();
        let review = wait_for_status(
            &architect,
            &project_id,
            &triggered.review_id,
            ReviewStatus::AutoFixing,
        )
        .await;
        // Give the failure handler time to (not) change the status.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let after = architect
            .get_review(&project_id, &triggered.review_id)
            .unwrap();
        assert_eq!(after.status, ReviewStatus::AutoFixing);
        assert_eq!(review.status, ReviewStatus::AutoFixing);
    }

    #[tokio::test]
    async fn completed_review_appends_summary_message() {
        let issues = r#"[{"severity":"critical","category":"bug","title":"A","description":"d","autoFixable":false},{"severity":"high","category":"quality","title":"B","description":"d","autoFixable":false}]"#;
        let script = vec![
            AgentEvent::Text {
                content: review_json(62, issues),
            },
            AgentEvent::Complete { cost: 0.3 },
        ];
        let (architect, project_id) = architect_with(script, ChatSignal::Completed);
        let triggered = architect.trigger_review(&project_id, None).await.unwrap();
        wait_for_status(
            &architect,
            &project_id,
            &triggered.review_id,
            ReviewStatus::Completed,
        )
        .await;

        let store = architect.store.lock().unwrap();
        let state = store.state.lock().unwrap();
        assert_eq!(state.messages.len(), 1);
        let message = &state.messages[0];
        assert_eq!(message.role, MessageRole::System);
        assert!(message.content.contains("Score: 62/100"));
        assert!(message.content.contains("Issues: 2 total"));
        assert!(message.content.contains("(1 critical)"));
        assert!(message.content.contains("(1 high)"));
    }
}
