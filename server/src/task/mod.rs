use crate::entities::*;
use async_trait::async_trait;
use chrono::Utc;
use mockall::automock;
use sea_orm::*;
use uuid::Uuid;

pub mod api;

/// A user-created task record. Tasks are written once and never mutated;
/// there is no update or delete path.
#[derive(Debug, PartialEq, Clone, Eq)]
pub struct Task {
    task_id: String,
    created_at: i64,
    title: String,
    description: String,
    status: TaskStatus,
}

/// Task lifecycle state. Creation is the only transition, so `Pending` is
/// the only state a task can be in.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    #[default]
    Pending,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
        }
    }
}

impl Task {
    pub fn new(task_id: String, created_at: i64, title: String, description: String) -> Self {
        Self {
            task_id,
            created_at,
            title,
            description,
            status: TaskStatus::default(),
        }
    }

    /// Returns the unique identifier of the task.
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Returns the creation time in milliseconds since the epoch.
    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    /// Returns the title of the task.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description of the task. May be empty.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the status of the task.
    pub fn status(&self) -> TaskStatus {
        self.status
    }
}

impl From<task::Model> for Task {
    fn from(model: task::Model) -> Self {
        Task::new(
            model.task_id,
            model.created_at,
            model.title,
            model.description,
        )
    }
}

/// Error type for task store operations.
#[derive(Debug, thiserror::Error)]
pub enum TaskStoreError {
    /// The connectivity probe could not reach the store.
    #[error("store connectivity check failed: {0}")]
    Connectivity(#[source] DbErr),
    /// A scan of the task table failed.
    #[error("failed to retrieve tasks: {0}")]
    Read(#[source] DbErr),
    /// A single-item insert failed.
    #[error("failed to create task: {0}")]
    Write(#[source] DbErr),
}

/// Persistence seam for task records.
///
/// The store exposes exactly three operations: a readiness probe, a
/// single-item insert and a full scan. Handlers hold the store as
/// `Arc<dyn TaskStore>` so tests can substitute [`MockTaskStore`].
#[automock]
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Issues a bounded read (one row) against the task table.
    ///
    /// An empty table is a success; only transport-level failures count as
    /// not reachable. Never mutates state.
    async fn probe_connectivity(&self) -> Result<(), TaskStoreError>;

    /// Generates an id and timestamp, writes the task as a single insert and
    /// returns the constructed record verbatim (not a re-read).
    async fn insert_task(
        &self,
        title: String,
        description: String,
    ) -> Result<Task, TaskStoreError>;

    /// Scans the whole task table and returns the result newest-first.
    ///
    /// The scan is unbounded on purpose; pagination is out of scope for this
    /// application.
    async fn list_tasks(&self) -> Result<Vec<Task>, TaskStoreError>;
}

/// SeaORM-backed [`TaskStore`] implementation.
pub struct DbTaskStore {
    db: DatabaseConnection,
}

impl DbTaskStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TaskStore for DbTaskStore {
    #[tracing::instrument(skip(self))]
    async fn probe_connectivity(&self) -> Result<(), TaskStoreError> {
        task::Entity::find()
            .limit(1)
            .all(&self.db)
            .await
            .map(|_| ())
            .map_err(TaskStoreError::Connectivity)
    }

    #[tracing::instrument(skip(self))]
    async fn insert_task(
        &self,
        title: String,
        description: String,
    ) -> Result<Task, TaskStoreError> {
        let created = Task::new(
            Uuid::new_v4().to_string(),
            Utc::now().timestamp_millis(),
            title,
            description,
        );

        let active_model = task::ActiveModel {
            task_id: ActiveValue::Set(created.task_id.clone()),
            created_at: ActiveValue::Set(created.created_at),
            title: ActiveValue::Set(created.title.clone()),
            description: ActiveValue::Set(created.description.clone()),
            status: ActiveValue::Set(created.status.as_str().to_string()),
        };
        task::Entity::insert(active_model)
            .exec(&self.db)
            .await
            .map_err(TaskStoreError::Write)?;

        Ok(created)
    }

    #[tracing::instrument(skip(self))]
    async fn list_tasks(&self) -> Result<Vec<Task>, TaskStoreError> {
        let mut tasks: Vec<Task> = task::Entity::find()
            .all(&self.db)
            .await
            .map_err(TaskStoreError::Read)?
            .into_iter()
            .map(Task::from)
            .collect();
        sort_newest_first(&mut tasks);
        Ok(tasks)
    }
}

/// Orders tasks by creation time, newest first. `created_at` carries no
/// uniqueness guarantee; ties keep their scan order.
pub fn sort_newest_first(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, created_at: i64) -> Task {
        Task::new(id.to_string(), created_at, format!("task {}", id), String::new())
    }

    #[test]
    fn can_create_task_with_pending_status() {
        let task = Task::new(
            "a1b2c3d4".to_string(),
            1_700_000_000_000,
            "Buy milk".to_string(),
            String::new(),
        );

        assert_eq!(task.task_id(), "a1b2c3d4");
        assert_eq!(task.created_at(), 1_700_000_000_000);
        assert_eq!(task.title(), "Buy milk");
        assert_eq!(task.description(), "");
        assert_eq!(task.status(), TaskStatus::Pending);
    }

    #[test]
    fn status_serializes_as_pending() {
        assert_eq!(TaskStatus::Pending.as_str(), "pending");
    }

    #[test]
    fn can_build_task_from_entity_model() {
        let model = task::Model {
            task_id: "id-1".to_string(),
            created_at: 42,
            title: "Title".to_string(),
            description: "Description".to_string(),
            status: "pending".to_string(),
        };

        let task = Task::from(model);

        assert_eq!(task.task_id(), "id-1");
        assert_eq!(task.created_at(), 42);
        assert_eq!(task.status(), TaskStatus::Pending);
    }

    #[test]
    fn sorts_tasks_newest_first() {
        let mut tasks = vec![task("a", 10), task("b", 30), task("c", 20)];

        sort_newest_first(&mut tasks);

        let ids: Vec<&str> = tasks.iter().map(Task::task_id).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn sorting_keeps_scan_order_for_equal_timestamps() {
        let mut tasks = vec![task("a", 10), task("b", 10), task("c", 10)];

        sort_newest_first(&mut tasks);

        let ids: Vec<&str> = tasks.iter().map(Task::task_id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
