//! Project service over the `Projects` sheet.

use aturno_core::validation::validate_project;
use aturno_core::{NewProject, Project, ProjectPatch, ProjectStats, ProjectStatus};
use aturno_sheets::{SheetsClient, SheetsError};
use tracing::info;

use crate::error::StoreError;
use crate::table::SheetTable;

/// CRUD, search and statistics for projects
#[derive(Clone, Debug)]
pub struct ProjectSheetService {
    table: SheetTable<Project>,
}

impl ProjectSheetService {
    pub fn new(client: SheetsClient) -> Self {
        Self {
            table: SheetTable::new(client),
        }
    }

    pub async fn get_all_projects(&self) -> Result<Vec<Project>, StoreError> {
        self.table.get_all().await.map_err(StoreError::context("get projects"))
    }

    pub async fn get_projects_by_team(&self, team_id: &str) -> Result<Vec<Project>, StoreError> {
        let projects = self.get_all_projects().await?;
        Ok(projects.into_iter().filter(|p| p.team_id == team_id).collect())
    }

    pub async fn get_projects_by_status(&self, status: ProjectStatus) -> Result<Vec<Project>, StoreError> {
        let projects = self.get_all_projects().await?;
        Ok(projects.into_iter().filter(|p| p.status == status).collect())
    }

    pub async fn get_project_by_id(&self, project_id: &str) -> Result<Option<Project>, StoreError> {
        let found = self
            .table
            .find(project_id)
            .await
            .map_err(StoreError::context("get project"))?;
        Ok(found.map(|s| s.entity))
    }

    pub async fn create_project(&self, new: NewProject) -> Result<Project, StoreError> {
        let project = Project::create(new);
        validate_project(&project)
            .map_err(|e| StoreError::new("create project", SheetsError::validation(e.to_string())))?;

        self.table
            .insert(&project)
            .await
            .map_err(StoreError::context("create project"))?;
        info!(project_id = %project.id, team_id = %project.team_id, "Created project");
        Ok(project)
    }

    /// Merge `patch` into the stored project and overwrite its row
    pub async fn update_project(&self, project_id: &str, patch: ProjectPatch) -> Result<Project, StoreError> {
        let mut stored = self
            .table
            .require(project_id)
            .await
            .map_err(StoreError::context("update project"))?;

        stored.entity.apply(patch);
        validate_project(&stored.entity)
            .map_err(|e| StoreError::new("update project", SheetsError::validation(e.to_string())))?;

        self.table
            .overwrite(stored.row, &stored.entity)
            .await
            .map_err(StoreError::context("update project"))?;
        info!(project_id = %project_id, row = stored.row, "Updated project");
        Ok(stored.entity)
    }

    pub async fn delete_project(&self, project_id: &str) -> Result<(), StoreError> {
        let stored = self
            .table
            .require(project_id)
            .await
            .map_err(StoreError::context("delete project"))?;

        self.table
            .clear(stored.row)
            .await
            .map_err(StoreError::context("delete project"))?;
        info!(project_id = %project_id, row = stored.row, "Deleted project");
        Ok(())
    }

    pub async fn search_projects(&self, term: &str) -> Result<Vec<Project>, StoreError> {
        self.table
            .search(term)
            .await
            .map_err(StoreError::context("search projects"))
    }

    /// Create the `Projects` sheet and its header row if needed
    pub async fn initialize_sheet(&self) -> Result<(), StoreError> {
        self.table
            .initialize()
            .await
            .map_err(StoreError::context("initialize Projects sheet"))
    }

    pub async fn get_project_stats(&self) -> Result<ProjectStats, StoreError> {
        let projects = self.get_all_projects().await?;
        ProjectStats::from_projects(&projects).map_err(|e| {
            StoreError::new("get project stats", SheetsError::validation(e.to_string()))
        })
    }
}
