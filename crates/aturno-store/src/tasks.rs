//! Task service over the `Tasks` sheet.

use aturno_core::validation::validate_task;
use aturno_core::{NewTask, Task, TaskPatch, TaskStats, TaskStatus};
use aturno_sheets::{SheetsClient, SheetsError};
use tracing::info;

use crate::error::StoreError;
use crate::table::SheetTable;

/// CRUD, search and statistics for tasks
#[derive(Clone, Debug)]
pub struct TaskSheetService {
    table: SheetTable<Task>,
}

impl TaskSheetService {
    pub fn new(client: SheetsClient) -> Self {
        Self {
            table: SheetTable::new(client),
        }
    }

    pub async fn get_all_tasks(&self) -> Result<Vec<Task>, StoreError> {
        self.table.get_all().await.map_err(StoreError::context("get tasks"))
    }

    pub async fn get_tasks_by_project(&self, project_id: &str) -> Result<Vec<Task>, StoreError> {
        let tasks = self.get_all_tasks().await?;
        Ok(tasks.into_iter().filter(|t| t.project_id == project_id).collect())
    }

    pub async fn get_tasks_by_status(&self, status: TaskStatus) -> Result<Vec<Task>, StoreError> {
        let tasks = self.get_all_tasks().await?;
        Ok(tasks.into_iter().filter(|t| t.status == status).collect())
    }

    pub async fn get_tasks_by_assignee(&self, user_id: &str) -> Result<Vec<Task>, StoreError> {
        let tasks = self.get_all_tasks().await?;
        Ok(tasks
            .into_iter()
            .filter(|t| t.assigned_to.as_deref() == Some(user_id))
            .collect())
    }

    pub async fn get_task_by_id(&self, task_id: &str) -> Result<Option<Task>, StoreError> {
        let found = self
            .table
            .find(task_id)
            .await
            .map_err(StoreError::context("get task"))?;
        Ok(found.map(|s| s.entity))
    }

    /// Validate, assign id and timestamps, and append the task
    pub async fn create_task(&self, new: NewTask) -> Result<Task, StoreError> {
        let task = Task::create(new);
        validate_task(&task)
            .map_err(|e| StoreError::new("create task", SheetsError::validation(e.to_string())))?;

        self.table
            .insert(&task)
            .await
            .map_err(StoreError::context("create task"))?;
        info!(task_id = %task.id, project_id = %task.project_id, "Created task");
        Ok(task)
    }

    /// Merge `patch` into the stored task and overwrite its row.
    ///
    /// No version check: a concurrent update of the same row is overwritten.
    pub async fn update_task(&self, task_id: &str, patch: TaskPatch) -> Result<Task, StoreError> {
        let mut stored = self
            .table
            .require(task_id)
            .await
            .map_err(StoreError::context("update task"))?;

        stored.entity.apply(patch, aturno_core::now());
        validate_task(&stored.entity)
            .map_err(|e| StoreError::new("update task", SheetsError::validation(e.to_string())))?;

        self.table
            .overwrite(stored.row, &stored.entity)
            .await
            .map_err(StoreError::context("update task"))?;
        info!(task_id = %task_id, row = stored.row, "Updated task");
        Ok(stored.entity)
    }

    /// Clear the task's row; the row stays as a blank placeholder
    pub async fn delete_task(&self, task_id: &str) -> Result<(), StoreError> {
        let stored = self
            .table
            .require(task_id)
            .await
            .map_err(StoreError::context("delete task"))?;

        self.table
            .clear(stored.row)
            .await
            .map_err(StoreError::context("delete task"))?;
        info!(task_id = %task_id, row = stored.row, "Deleted task");
        Ok(())
    }

    pub async fn search_tasks(&self, term: &str) -> Result<Vec<Task>, StoreError> {
        self.table
            .search(term)
            .await
            .map_err(StoreError::context("search tasks"))
    }

    /// Create the `Tasks` sheet and its header row if needed
    pub async fn initialize_sheet(&self) -> Result<(), StoreError> {
        self.table
            .initialize()
            .await
            .map_err(StoreError::context("initialize Tasks sheet"))
    }

    pub async fn get_task_stats(&self) -> Result<TaskStats, StoreError> {
        let tasks = self.get_all_tasks().await?;
        Ok(TaskStats::from_tasks(&tasks))
    }
}
