//! Subcommand implementations.

use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use aturno_core::{Project, Task};
use aturno_server::{handlers, samples, AppState, Backend, Environment, Services};
use aturno_sheets::{MemoryTransport, SheetsClient, SheetsConfig};
use aturno_store::StoreError;
use serde::Serialize;
use serde_json::json;
use tokio::net::TcpListener;
use tracing::info;

use crate::{ProjectCommand, TaskCommand};

/// Spreadsheet id reported in `--memory` mode
const MEMORY_SPREADSHEET_ID: &str = "memory";

pub fn backend(memory: bool) -> Backend {
    if memory {
        let transport = MemoryTransport::with_sheets(["Tasks", "Projects"]);
        let client = SheetsClient::new(Arc::new(transport), MEMORY_SPREADSHEET_ID);
        return Backend::Ready(Services::new(client));
    }
    Backend::from_config(SheetsConfig::from_env())
}

fn services(backend: &Backend) -> Result<&Services> {
    backend.services().map_err(|err| anyhow!(err))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn failed(err: StoreError) -> anyhow::Error {
    anyhow!("{err} [{}]", err.code())
}

// =============================================================================
// Top-level commands
// =============================================================================

pub async fn serve(backend: Backend, environment: Environment, bind: &str) -> Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    let state = AppState::new(backend, environment);

    aturno_server::serve(listener, state, async {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutting down");
    })
    .await
    .context("Server error")
}

pub async fn check(backend: &Backend) -> Result<()> {
    let services = services(backend)?;
    let report = handlers::connection_report(services)
        .await
        .map_err(failed)?;
    print_json(&report)
}

pub async fn init(backend: &Backend) -> Result<()> {
    let services = services(backend)?;
    services.tasks.initialize_sheet().await.map_err(failed)?;
    services.projects.initialize_sheet().await.map_err(failed)?;
    println!("Initialized sheets: Tasks, Projects");
    Ok(())
}

pub async fn stats(backend: &Backend) -> Result<()> {
    let services = services(backend)?;
    let stats = handlers::collect_stats(services).await.map_err(failed)?;
    print_json(&stats)
}

pub async fn seed(backend: &Backend) -> Result<()> {
    let services = services(backend)?;
    services.tasks.initialize_sheet().await.map_err(failed)?;
    services.projects.initialize_sheet().await.map_err(failed)?;

    let project = samples::create_sample_project(services)
        .await
        .map_err(failed)?;
    let task = samples::create_sample_task(services).await.map_err(failed)?;
    print_json(&json!({ "project": project, "task": task }))
}

// =============================================================================
// Entity commands
// =============================================================================

pub async fn tasks(backend: &Backend, command: TaskCommand) -> Result<()> {
    let service = &services(backend)?.tasks;
    match command {
        TaskCommand::List {
            project,
            status,
            assignee,
        } => {
            let tasks = if let Some(project) = project {
                service.get_tasks_by_project(&project).await
            } else if let Some(status) = status {
                service.get_tasks_by_status(status).await
            } else if let Some(assignee) = assignee {
                service.get_tasks_by_assignee(&assignee).await
            } else {
                service.get_all_tasks().await
            }
            .map_err(failed)?;
            print_json(&tasks)
        }
        TaskCommand::Get { id } => {
            let task: Option<Task> = service.get_task_by_id(&id).await.map_err(failed)?;
            match task {
                Some(task) => print_json(&task),
                None => bail!("Task with ID '{id}' not found"),
            }
        }
        TaskCommand::Search { term } => {
            let tasks = service.search_tasks(&term).await.map_err(failed)?;
            print_json(&tasks)
        }
        TaskCommand::Delete { id } => {
            service.delete_task(&id).await.map_err(failed)?;
            println!("Deleted task {id}");
            Ok(())
        }
    }
}

pub async fn projects(backend: &Backend, command: ProjectCommand) -> Result<()> {
    let service = &services(backend)?.projects;
    match command {
        ProjectCommand::List { team, status } => {
            let projects = if let Some(team) = team {
                service.get_projects_by_team(&team).await
            } else if let Some(status) = status {
                service.get_projects_by_status(status).await
            } else {
                service.get_all_projects().await
            }
            .map_err(failed)?;
            print_json(&projects)
        }
        ProjectCommand::Get { id } => {
            let project: Option<Project> =
                service.get_project_by_id(&id).await.map_err(failed)?;
            match project {
                Some(project) => print_json(&project),
                None => bail!("Project with ID '{id}' not found"),
            }
        }
        ProjectCommand::Search { term } => {
            let projects = service.search_projects(&term).await.map_err(failed)?;
            print_json(&projects)
        }
        ProjectCommand::Delete { id } => {
            service.delete_project(&id).await.map_err(failed)?;
            println!("Deleted project {id}");
            Ok(())
        }
    }
}
