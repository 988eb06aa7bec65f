//! HTTP handlers.
//!
//! `GET /api/test-sheets` checks connectivity end to end: it lists the
//! spreadsheet's sheets, creates the entity sheets when missing and reads
//! both tables. `POST /api/test-sheets` runs one named action.

use aturno_core::{Project, ProjectStats, Task, TaskStats};
use aturno_sheets::SheetsError;
use aturno_store::StoreError;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

use crate::error::ApiErrorResponse;
use crate::samples;
use crate::state::{AppState, Backend, Services};

/// Number of records echoed back by the connection check
pub const SAMPLE_SIZE: usize = 3;

pub const SUPPORTED_ACTIONS: &str =
    "Supported actions: create_sample_project, create_sample_task, get_stats";

// =============================================================================
// Response Bodies
// =============================================================================

/// Body of every successful response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Success<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Success<T> {
    fn new(data: Option<T>, message: Option<&str>) -> Json<Self> {
        Json(Self {
            success: true,
            data,
            message: message.map(str::to_string),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionReport {
    pub connection: String,
    pub spreadsheet_id: String,
    pub available_sheets: Vec<String>,
    pub tasks_count: usize,
    pub projects_count: usize,
    pub sample_tasks: Vec<Task>,
    pub sample_projects: Vec<Project>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsReport {
    pub tasks: TaskStats,
    pub projects: ProjectStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionRequest {
    #[serde(default)]
    pub action: Option<String>,
    /// Accepted for compatibility; no action reads it
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    CreateSampleProject,
    CreateSampleTask,
    GetStats,
}

impl Action {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "create_sample_project" => Some(Action::CreateSampleProject),
            "create_sample_task" => Some(Action::CreateSampleTask),
            "get_stats" => Some(Action::GetStats),
            _ => None,
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// `GET /api/test-sheets`
pub async fn test_connection(
    State(state): State<AppState>,
) -> Result<Json<Success<ConnectionReport>>, ApiErrorResponse> {
    let expose = state.environment.exposes_details();
    let services = match state.backend.as_ref() {
        Backend::Ready(services) => services,
        Backend::Missing(missing) => {
            return Err(ApiErrorResponse::bad_request(
                format!("Missing environment variables: {}", missing.join(", ")),
                "Please configure Google Sheets API credentials",
            ));
        }
        Backend::Failed(err) => return Err(sheets_failure(err, expose)),
    };

    let report = connection_report(services)
        .await
        .map_err(|err| store_failure(&err, expose))?;
    info!(
        tasks = report.tasks_count,
        projects = report.projects_count,
        "Google Sheets connection verified"
    );
    Ok(Success::new(
        Some(report),
        Some("Google Sheets integration test successful"),
    ))
}

/// `POST /api/test-sheets`
pub async fn run_action(
    State(state): State<AppState>,
    payload: Result<Json<ActionRequest>, JsonRejection>,
) -> Result<Json<Success<StatsReport>>, ApiErrorResponse> {
    let expose = state.environment.exposes_details();
    let Json(request) = payload.map_err(|rejection| {
        sheets_failure(
            &SheetsError::validation(format!("Invalid request body: {}", rejection.body_text())),
            expose,
        )
    })?;
    let services = state
        .backend
        .services()
        .map_err(|err| sheets_failure(&err, expose))?;

    let Some(action) = request.action.as_deref().and_then(Action::parse) else {
        return Err(ApiErrorResponse::bad_request("Invalid action", SUPPORTED_ACTIONS));
    };

    match action {
        Action::CreateSampleProject => {
            let project = samples::create_sample_project(services)
                .await
                .map_err(|err| store_failure(&err, expose))?;
            info!(project_id = %project.id, "Sample project created");
            Ok(Success::new(None, Some("Sample project created successfully")))
        }
        Action::CreateSampleTask => {
            let task = samples::create_sample_task(services)
                .await
                .map_err(|err| store_failure(&err, expose))?;
            info!(task_id = %task.id, "Sample task created");
            Ok(Success::new(None, Some("Sample task created successfully")))
        }
        Action::GetStats => {
            let stats = collect_stats(services)
                .await
                .map_err(|err| store_failure(&err, expose))?;
            Ok(Success::new(Some(stats), None))
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

pub async fn connection_report(services: &Services) -> Result<ConnectionReport, StoreError> {
    let available_sheets = services
        .client
        .get_sheet_names()
        .await
        .map_err(StoreError::context("list sheets"))?;

    services.tasks.initialize_sheet().await?;
    services.projects.initialize_sheet().await?;

    let tasks = services.tasks.get_all_tasks().await?;
    let projects = services.projects.get_all_projects().await?;

    Ok(ConnectionReport {
        connection: "successful".into(),
        spreadsheet_id: services.client.spreadsheet_id().to_string(),
        available_sheets,
        tasks_count: tasks.len(),
        projects_count: projects.len(),
        sample_tasks: tasks.into_iter().take(SAMPLE_SIZE).collect(),
        sample_projects: projects.into_iter().take(SAMPLE_SIZE).collect(),
    })
}

pub async fn collect_stats(services: &Services) -> Result<StatsReport, StoreError> {
    Ok(StatsReport {
        tasks: services.tasks.get_task_stats().await?,
        projects: services.projects.get_project_stats().await?,
    })
}

fn sheets_failure(err: &SheetsError, expose: bool) -> ApiErrorResponse {
    error!(code = err.code(), error = %err, "Google Sheets test failed");
    ApiErrorResponse::from_sheets(err, expose)
}

fn store_failure(err: &StoreError, expose: bool) -> ApiErrorResponse {
    error!(code = err.code(), error = %err, "Google Sheets test failed");
    ApiErrorResponse::from_store(err, expose)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("create_sample_project", Some(Action::CreateSampleProject))]
    #[case("create_sample_task", Some(Action::CreateSampleTask))]
    #[case("get_stats", Some(Action::GetStats))]
    #[case("GET_STATS", None)]
    #[case("drop_tables", None)]
    fn actions_parse_by_exact_name(#[case] name: &str, #[case] expected: Option<Action>) {
        assert_eq!(Action::parse(name), expected);
    }
}
