//! Input validation rules for tasks and projects.
//!
//! Every rule is checked and all failures are reported together.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::entity::LABEL_DELIMITER;
use crate::{Project, Task};

const MAX_TASK_TITLE: usize = 500;
const MAX_TASK_DESCRIPTION: usize = 2000;
const MAX_PROJECT_NAME: usize = 200;
const MAX_PROJECT_DESCRIPTION: usize = 1000;

static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("hex color pattern compiles"));

/// One or more failed validation rules
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .0.join("; "))]
pub struct ValidationErrors(pub Vec<String>);

impl ValidationErrors {
    pub fn messages(&self) -> &[String] {
        &self.0
    }

    fn into_result(self) -> Result<(), Self> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

fn too_long(value: &str, max: usize) -> bool {
    value.chars().count() > max
}

fn check_labels(labels: &[String], errors: &mut Vec<String>) {
    for label in labels {
        if label.trim().is_empty() {
            errors.push("Labels must not be blank".to_string());
        } else if label.contains(LABEL_DELIMITER) {
            errors.push(format!("Label '{label}' must not contain '{LABEL_DELIMITER}'"));
        }
    }
}

/// Validate a task before it is written
pub fn validate_task(task: &Task) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();

    if task.project_id.trim().is_empty() {
        errors.push("Project ID is required".to_string());
    }
    if task.title.trim().is_empty() {
        errors.push("Task title is required".to_string());
    }
    if too_long(&task.title, MAX_TASK_TITLE) {
        errors.push(format!("Task title must be less than {MAX_TASK_TITLE} characters"));
    }
    if let Some(description) = &task.description {
        if too_long(description, MAX_TASK_DESCRIPTION) {
            errors.push(format!(
                "Task description must be less than {MAX_TASK_DESCRIPTION} characters"
            ));
        }
    }
    check_labels(&task.labels, &mut errors);

    ValidationErrors(errors).into_result()
}

/// Validate a project before it is written
pub fn validate_project(project: &Project) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();

    if project.team_id.trim().is_empty() {
        errors.push("Team ID is required".to_string());
    }
    if project.name.trim().is_empty() {
        errors.push("Project name is required".to_string());
    }
    if too_long(&project.name, MAX_PROJECT_NAME) {
        errors.push(format!("Project name must be less than {MAX_PROJECT_NAME} characters"));
    }
    if let Some(description) = &project.description {
        if too_long(description, MAX_PROJECT_DESCRIPTION) {
            errors.push(format!(
                "Project description must be less than {MAX_PROJECT_DESCRIPTION} characters"
            ));
        }
    }
    if project.budget < Decimal::ZERO {
        errors.push("Budget must be a valid positive number".to_string());
    }
    if let Some(color) = &project.color {
        if !HEX_COLOR.is_match(color) {
            errors.push("Color must be a valid hex color".to_string());
        }
    }

    ValidationErrors(errors).into_result()
}
