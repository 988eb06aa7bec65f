//! Fixed sample records used to smoke-test a spreadsheet.

use aturno_core::{NewProject, NewTask, Project, ProjectStatus, Task, TaskPriority, TaskStatus};
use aturno_store::StoreError;
use rust_decimal::Decimal;

use crate::state::Services;

/// Project id used when no project exists yet
pub const FALLBACK_PROJECT_ID: &str = "proj_sample";

const SAMPLE_AUTHOR: &str = "api_test";

pub fn sample_project() -> NewProject {
    NewProject {
        team_id: "team_sample".into(),
        name: "Sample Project".into(),
        description: Some("This is a test project created via Google Sheets API".into()),
        budget: Decimal::from(5000),
        created_by: SAMPLE_AUTHOR.into(),
        status: ProjectStatus::Active,
        color: Some("#3B82F6".into()),
    }
}

pub fn sample_task(project_id: &str) -> NewTask {
    NewTask {
        project_id: project_id.into(),
        title: "Sample Task".into(),
        description: Some("This is a test task created via Google Sheets API".into()),
        status: TaskStatus::Todo,
        priority: TaskPriority::Medium,
        assigned_to: None,
        due_date: None,
        created_by: SAMPLE_AUTHOR.into(),
        labels: vec!["test".into(), "api".into()],
    }
}

pub async fn create_sample_project(services: &Services) -> Result<Project, StoreError> {
    services.projects.create_project(sample_project()).await
}

/// Create the sample task under the first stored project, or under
/// [`FALLBACK_PROJECT_ID`] when there is none
pub async fn create_sample_task(services: &Services) -> Result<Task, StoreError> {
    let projects = services.projects.get_all_projects().await?;
    let project_id = projects
        .first()
        .map_or(FALLBACK_PROJECT_ID, |project| project.id.as_str());
    services.tasks.create_task(sample_task(project_id)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use aturno_core::validation::{validate_project, validate_task};
    use aturno_core::{Project, Task};

    #[test]
    fn samples_pass_validation() {
        validate_project(&Project::create(sample_project())).expect("Should accept sample project");
        validate_task(&Task::create(sample_task(FALLBACK_PROJECT_ID)))
            .expect("Should accept sample task");
    }
}
