//! # aturno-core
//!
//! Core domain model for the Aturno spreadsheet-backed store.
//!
//! This crate provides:
//! - Domain types: `Task`, `Project`, their status/priority enums and inputs
//! - Column mappings and the pure row ↔ record transforms (`mapping`)
//! - Entity codecs that turn records into typed entities (`entity`)
//! - Input validation rules (`validation`) and id generation (`id`)
//! - Aggregate statistics over entity lists
//!
//! Nothing in this crate performs I/O.
//!
//! ## Example
//!
//! ```rust
//! use aturno_core::{NewTask, Task, TaskPriority, TaskStats, TaskStatus};
//!
//! let task = Task::create(NewTask {
//!     project_id: "proj_1".into(),
//!     title: "Write release notes".into(),
//!     priority: TaskPriority::High,
//!     labels: vec!["docs".into()],
//!     ..NewTask::default()
//! });
//! assert!(task.id.starts_with("task_"));
//!
//! let stats = TaskStats::from_tasks(&[task]);
//! assert_eq!(stats.by_status[&TaskStatus::Todo], 1);
//! ```

pub mod entity;
pub mod id;
pub mod mapping;
pub mod validation;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

pub use entity::{normalize_labels, SheetEntity};
pub use mapping::{CellValue, Column, ColumnMapping, HeaderMode, Record, Row};
pub use validation::ValidationErrors;

// ============================================================================
// Type Aliases
// ============================================================================

/// Unique identifier for a task (`task_<millis>_<suffix>`)
pub type TaskId = String;

/// Unique identifier for a project (`proj_<millis>_<suffix>`)
pub type ProjectId = String;

/// Identifier of the team owning a project
pub type TeamId = String;

/// Identifier of a user (assignee or creator)
pub type UserId = String;

/// Current time, truncated to the millisecond precision kept in sheet cells
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Format a timestamp the way it is stored in a sheet cell.
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ============================================================================
// Enumerations
// ============================================================================

/// Error returned when a status or priority string is not recognized
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {kind}: '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal, default = $default:ident,
        { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every variant, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The stored (snake_case) form
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($text => Ok($name::$variant),)+
                    other => Err(UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

string_enum!(
    /// Workflow state of a task
    TaskStatus, "task status", default = Todo,
    {
        Todo => "todo",
        InProgress => "in_progress",
        Done => "done",
        Cancelled => "cancelled",
    }
);

string_enum!(
    /// Urgency of a task
    TaskPriority, "task priority", default = Medium,
    {
        Low => "low",
        Medium => "medium",
        High => "high",
        Urgent => "urgent",
    }
);

string_enum!(
    /// Lifecycle state of a project
    ProjectStatus, "project status", default = Active,
    {
        Active => "active",
        Completed => "completed",
        Archived => "archived",
        OnHold => "on_hold",
    }
);

// ============================================================================
// Task
// ============================================================================

/// A unit of work persisted as one row of the `Tasks` sheet
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub project_id: ProjectId,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assigned_to: Option<UserId>,
    pub due_date: Option<NaiveDate>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Free-form labels; stored as one comma-joined cell
    pub labels: Vec<String>,
}

/// Input for creating a task; id and timestamps are synthesized
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewTask {
    pub project_id: ProjectId,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assigned_to: Option<UserId>,
    pub due_date: Option<NaiveDate>,
    pub created_by: UserId,
    pub labels: Vec<String>,
}

/// Partial update of a task. `None` leaves a field untouched; for the
/// optional fields `Some(None)` (JSON `null`) clears the value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskPatch {
    pub project_id: Option<ProjectId>,
    pub title: Option<String>,
    #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Option<UserId>>,
    #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<NaiveDate>>,
    pub labels: Option<Vec<String>>,
}

/// A field that is present in the input, possibly as `null`
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl Task {
    /// Build a task from creation input, generating its id and timestamps
    pub fn create(new: NewTask) -> Self {
        Self::create_at(new, now())
    }

    /// Same as [`Task::create`] with an explicit clock reading
    pub fn create_at(new: NewTask, now: DateTime<Utc>) -> Self {
        Self {
            id: id::generate_at("task", now),
            project_id: new.project_id,
            title: new.title,
            description: new.description,
            status: new.status,
            priority: new.priority,
            assigned_to: new.assigned_to,
            due_date: new.due_date,
            created_by: new.created_by,
            created_at: now,
            updated_at: now,
            labels: normalize_labels(new.labels),
        }
    }

    /// Merge a patch into this task and bump `updated_at`.
    ///
    /// `id`, `created_by` and `created_at` are never touched.
    pub fn apply(&mut self, patch: TaskPatch, now: DateTime<Utc>) {
        if let Some(project_id) = patch.project_id {
            self.project_id = project_id;
        }
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(assigned_to) = patch.assigned_to {
            self.assigned_to = assigned_to;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(labels) = patch.labels {
            self.labels = normalize_labels(labels);
        }
        self.updated_at = now;
    }
}

// ============================================================================
// Project
// ============================================================================

/// A project persisted as one row of the `Projects` sheet
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub team_id: TeamId,
    pub name: String,
    pub description: Option<String>,
    /// Stored as text in the sheet and re-parsed on read
    #[serde(with = "rust_decimal::serde::float")]
    pub budget: Decimal,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub status: ProjectStatus,
    /// Hex color such as `#3B82F6`
    pub color: Option<String>,
}

/// Input for creating a project; id and timestamp are synthesized
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewProject {
    pub team_id: TeamId,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub budget: Decimal,
    pub created_by: UserId,
    pub status: ProjectStatus,
    pub color: Option<String>,
}

/// Partial update of a project. `None` leaves a field untouched;
/// `Some(None)` clears `description` or `color`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectPatch {
    pub team_id: Option<TeamId>,
    pub name: Option<String>,
    #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub budget: Option<Decimal>,
    pub status: Option<ProjectStatus>,
    #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub color: Option<Option<String>>,
}

impl Project {
    /// Build a project from creation input, generating its id and timestamp
    pub fn create(new: NewProject) -> Self {
        Self::create_at(new, now())
    }

    /// Same as [`Project::create`] with an explicit clock reading
    pub fn create_at(new: NewProject, now: DateTime<Utc>) -> Self {
        Self {
            id: id::generate_at("proj", now),
            team_id: new.team_id,
            name: new.name,
            description: new.description,
            budget: new.budget,
            created_by: new.created_by,
            created_at: now,
            status: new.status,
            color: new.color,
        }
    }

    /// Merge a patch into this project. `id` and `created_at` are never touched.
    pub fn apply(&mut self, patch: ProjectPatch) {
        if let Some(team_id) = patch.team_id {
            self.team_id = team_id;
        }
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(budget) = patch.budget {
            self.budget = budget;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// Counts over the full task list
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: usize,
    pub by_status: BTreeMap<TaskStatus, usize>,
    pub by_priority: BTreeMap<TaskPriority, usize>,
}

impl TaskStats {
    /// Aggregate in a single pass. Every status and priority is present,
    /// zero when unused, so both breakdowns always sum to `total`.
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut by_status: BTreeMap<TaskStatus, usize> =
            TaskStatus::ALL.iter().map(|s| (*s, 0)).collect();
        let mut by_priority: BTreeMap<TaskPriority, usize> =
            TaskPriority::ALL.iter().map(|p| (*p, 0)).collect();

        for task in tasks {
            *by_status.entry(task.status).or_default() += 1;
            *by_priority.entry(task.priority).or_default() += 1;
        }

        Self {
            total: tasks.len(),
            by_status,
            by_priority,
        }
    }
}

/// Counts and budget totals over the full project list
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStats {
    pub total: usize,
    pub by_status: BTreeMap<ProjectStatus, usize>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_budget: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub average_budget: Decimal,
}

/// The budget total does not fit in a [`Decimal`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Total project budget exceeds the supported range")]
pub struct BudgetOverflow;

impl ProjectStats {
    /// Aggregate in a single pass, failing instead of overflowing the
    /// budget total
    pub fn from_projects(projects: &[Project]) -> Result<Self, BudgetOverflow> {
        let mut by_status: BTreeMap<ProjectStatus, usize> =
            ProjectStatus::ALL.iter().map(|s| (*s, 0)).collect();
        let mut total_budget = Decimal::ZERO;

        for project in projects {
            *by_status.entry(project.status).or_default() += 1;
            total_budget = total_budget
                .checked_add(project.budget)
                .ok_or(BudgetOverflow)?;
        }

        let average_budget = if projects.is_empty() {
            Decimal::ZERO
        } else {
            total_budget / Decimal::from(projects.len())
        };

        Ok(Self {
            total: projects.len(),
            by_status,
            total_budget,
            average_budget,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, hour, 0, 0).unwrap()
    }

    fn task(status: TaskStatus, priority: TaskPriority) -> Task {
        Task::create_at(
            NewTask {
                project_id: "proj_1".into(),
                title: "t".into(),
                status,
                priority,
                ..NewTask::default()
            },
            at(9),
        )
    }

    fn project(budget: Decimal, status: ProjectStatus) -> Project {
        Project::create_at(
            NewProject {
                team_id: "team_1".into(),
                name: "p".into(),
                budget,
                status,
                ..NewProject::default()
            },
            at(9),
        )
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in TaskStatus::ALL {
            assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), *status);
        }
        for status in ProjectStatus::ALL {
            assert_eq!(status.as_str().parse::<ProjectStatus>().unwrap(), *status);
        }
        assert_eq!("on_hold".parse::<ProjectStatus>().unwrap(), ProjectStatus::OnHold);
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = "blocked".parse::<TaskStatus>().unwrap_err();
        assert_eq!(err.kind, "task status");
        assert_eq!(err.value, "blocked");
        assert!(err.to_string().contains("blocked"));
    }

    #[test]
    fn enums_serialize_snake_case() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        let json = serde_json::to_string(&TaskPriority::Urgent).unwrap();
        assert_eq!(json, "\"urgent\"");
    }

    #[test]
    fn defaults_match_new_entity_expectations() {
        assert_eq!(TaskStatus::default(), TaskStatus::Todo);
        assert_eq!(TaskPriority::default(), TaskPriority::Medium);
        assert_eq!(ProjectStatus::default(), ProjectStatus::Active);
    }

    #[test]
    fn create_task_sets_identity_and_timestamps() {
        let t = task(TaskStatus::Todo, TaskPriority::Low);
        assert!(t.id.starts_with("task_"));
        assert_eq!(t.created_at, at(9));
        assert_eq!(t.updated_at, at(9));
    }

    #[test]
    fn task_patch_keeps_identity() {
        let mut t = task(TaskStatus::Todo, TaskPriority::Low);
        let id = t.id.clone();
        t.apply(
            TaskPatch {
                status: Some(TaskStatus::Done),
                labels: Some(vec!["shipped".into()]),
                ..TaskPatch::default()
            },
            at(11),
        );
        assert_eq!(t.id, id);
        assert_eq!(t.created_at, at(9));
        assert_eq!(t.updated_at, at(11));
        assert_eq!(t.status, TaskStatus::Done);
        assert_eq!(t.labels, vec!["shipped".to_string()]);
        assert_eq!(t.priority, TaskPriority::Low);
    }

    #[test]
    fn task_patch_clears_optional_fields() {
        let mut t = task(TaskStatus::Todo, TaskPriority::Low);
        t.apply(
            TaskPatch {
                description: Some(Some("notes".into())),
                assigned_to: Some(Some("user_3".into())),
                due_date: Some(NaiveDate::from_ymd_opt(2025, 4, 1)),
                ..TaskPatch::default()
            },
            at(10),
        );
        assert_eq!(t.assigned_to.as_deref(), Some("user_3"));

        t.apply(
            TaskPatch {
                assigned_to: Some(None),
                due_date: Some(None),
                ..TaskPatch::default()
            },
            at(11),
        );
        assert_eq!(t.assigned_to, None);
        assert_eq!(t.due_date, None);
        assert_eq!(t.description.as_deref(), Some("notes"));
    }

    #[test]
    fn patch_json_null_clears_and_absent_keeps() {
        let patch: TaskPatch =
            serde_json::from_str(r#"{"description": null, "title": "x"}"#).unwrap();
        assert_eq!(patch.description, Some(None));
        assert_eq!(patch.assigned_to, None);

        let patch: ProjectPatch = serde_json::from_str(r##"{"color": "#FFFFFF"}"##).unwrap();
        assert_eq!(patch.color, Some(Some("#FFFFFF".to_string())));
        assert_eq!(patch.description, None);
    }

    #[test]
    fn labels_are_trimmed_on_create_and_patch() {
        let mut t = Task::create_at(
            NewTask {
                project_id: "proj_1".into(),
                title: "t".into(),
                labels: vec![" ops ".into(), "infra".into()],
                ..NewTask::default()
            },
            at(9),
        );
        assert_eq!(t.labels, vec!["ops".to_string(), "infra".to_string()]);

        t.apply(
            TaskPatch {
                labels: Some(vec!["  review".into()]),
                ..TaskPatch::default()
            },
            at(10),
        );
        assert_eq!(t.labels, vec!["review".to_string()]);
    }

    #[test]
    fn project_patch_updates_budget_only() {
        let mut p = project(dec!(100), ProjectStatus::Active);
        let before = p.clone();
        p.apply(ProjectPatch {
            budget: Some(dec!(250.50)),
            ..ProjectPatch::default()
        });
        assert_eq!(p.budget, dec!(250.50));
        assert_eq!(p.color, before.color);
        assert_eq!(p.id, before.id);
        assert_eq!(p.created_at, before.created_at);
        assert_eq!(p.name, before.name);
    }

    #[test]
    fn task_stats_sum_to_total() {
        let tasks = vec![
            task(TaskStatus::Todo, TaskPriority::Low),
            task(TaskStatus::Todo, TaskPriority::High),
            task(TaskStatus::Done, TaskPriority::High),
            task(TaskStatus::Cancelled, TaskPriority::Urgent),
            task(TaskStatus::InProgress, TaskPriority::Medium),
        ];
        let stats = TaskStats::from_tasks(&tasks);

        assert_eq!(stats.total, 5);
        assert_eq!(stats.by_status.values().sum::<usize>(), 5);
        assert_eq!(stats.by_priority.values().sum::<usize>(), 5);
        assert_eq!(stats.by_status[&TaskStatus::Todo], 2);
        assert_eq!(stats.by_priority[&TaskPriority::High], 2);
    }

    #[test]
    fn task_stats_empty_list() {
        let stats = TaskStats::from_tasks(&[]);
        assert_eq!(stats.total, 0);
        assert!(stats.by_status.values().all(|c| *c == 0));
    }

    #[test]
    fn project_stats_budget_totals() {
        let projects = vec![
            project(dec!(1000), ProjectStatus::Active),
            project(dec!(500), ProjectStatus::OnHold),
            project(dec!(0), ProjectStatus::Active),
        ];
        let stats = ProjectStats::from_projects(&projects).expect("Should sum budgets");

        assert_eq!(stats.total, 3);
        assert_eq!(stats.total_budget, dec!(1500));
        assert_eq!(stats.average_budget, dec!(500));
        assert_eq!(stats.by_status[&ProjectStatus::Active], 2);
        assert_eq!(stats.by_status[&ProjectStatus::Archived], 0);
    }

    #[test]
    fn project_stats_empty_average_is_zero() {
        let stats = ProjectStats::from_projects(&[]).expect("Should sum budgets");
        assert_eq!(stats.average_budget, Decimal::ZERO);
    }

    #[test]
    fn project_stats_report_budget_overflow() {
        let projects = vec![
            project(Decimal::MAX, ProjectStatus::Active),
            project(Decimal::MAX, ProjectStatus::Active),
        ];
        assert_eq!(ProjectStats::from_projects(&projects), Err(BudgetOverflow));

        let single = ProjectStats::from_projects(&projects[..1]).expect("Should sum budgets");
        assert_eq!(single.total_budget, Decimal::MAX);
    }

    #[test]
    fn stats_serialize_with_camel_case_keys() {
        let stats = ProjectStats::from_projects(&[project(dec!(12.5), ProjectStatus::Active)])
            .expect("Should sum budgets");
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["totalBudget"], serde_json::json!(12.5));
        assert_eq!(json["byStatus"]["active"], serde_json::json!(1));
    }

    #[test]
    fn now_has_millisecond_precision() {
        assert_eq!(now().timestamp_subsec_nanos() % 1_000_000, 0);
    }

    #[test]
    fn timestamp_format_has_millis_and_z() {
        assert_eq!(format_timestamp(&at(9)), "2025-03-14T09:00:00.000Z");
    }
}
