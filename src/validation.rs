//! Input validation for project models.
//!
//! Checks structural integrity of a [`Project`] before simulation. Detects:
//! - Dangling handles in relation sets
//! - One-sided relations (an edge recorded on only one of its two ends)
//! - Circular task dependencies (DAG validation)
//! - Cycles in the component tree
//! - Negative work amounts, space sizes and capacities
//! - Components placed beyond a workplace's capacity
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4 (Topological Sort)

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::models::{Project, TaskId, SPACE_EPSILON};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationErrorKind {
    /// A relation refers to a handle outside its arena.
    InvalidReference,
    /// A relation is recorded on one end only.
    InconsistentRelation,
    /// Task dependency graph contains a cycle.
    CyclicDependency,
    /// Component tree contains a cycle.
    ComponentCycle,
    /// A numeric attribute is out of range.
    InvalidValue,
    /// Placed components exceed a workplace's capacity.
    CapacityExceeded,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a project model.
///
/// Checks:
/// 1. All handles in relation sets point into their arenas
/// 2. Dependencies, team/workplace authorizations, component targets and
///    tree links are mirrored on both ends
/// 3. No circular task dependencies
/// 4. No cycles in the component tree
/// 5. Work amounts, space sizes and capacities are non-negative
/// 6. Placed components fit their workplace
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_project(project: &Project) -> ValidationResult {
    let mut errors = Vec::new();

    check_references(project, &mut errors);
    // Mirror checks index arenas directly, so skip them on dangling handles
    if errors.is_empty() {
        check_mirrors(project, &mut errors);
        if let Some(cycle_err) = detect_cycles(project) {
            errors.push(cycle_err);
        }
        detect_component_cycles(project, &mut errors);
    }
    check_values(project, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_references(project: &Project, errors: &mut Vec<ValidationError>) {
    let mut dangling = |owner: &str, kind: &str, index: usize, len: usize| {
        if index >= len {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidReference,
                format!("'{owner}' references unknown {kind} #{index}"),
            ));
        }
    };

    let n_tasks = project.tasks.len();
    for task in &project.tasks {
        for dep in task
            .input_dependencies
            .iter()
            .chain(&task.output_dependencies)
        {
            dangling(&task.name, "task", dep.task.0, n_tasks);
        }
        for team in &task.allocated_team_ids {
            dangling(&task.name, "team", team.0, project.teams.len());
        }
        for wp in &task.allocated_workplace_ids {
            dangling(&task.name, "workplace", wp.0, project.workplaces.len());
        }
        if let Some(c) = task.target_component {
            dangling(&task.name, "component", c.0, project.components.len());
        }
        if let Some(wf) = task.parent_workflow {
            dangling(&task.name, "workflow", wf.0, project.workflows.len());
        }
    }
    for component in &project.components {
        for child in component.child_ids.iter().chain(component.parent.iter()) {
            dangling(&component.name, "component", child.0, project.components.len());
        }
        for t in &component.targeted_task_ids {
            dangling(&component.name, "task", t.0, n_tasks);
        }
        if let Some(wp) = component.placed_workplace {
            dangling(&component.name, "workplace", wp.0, project.workplaces.len());
        }
    }
    for team in &project.teams {
        for w in &team.worker_ids {
            dangling(&team.name, "worker", w.0, project.workers.len());
        }
        for t in &team.targeted_task_ids {
            dangling(&team.name, "task", t.0, n_tasks);
        }
    }
    for workplace in &project.workplaces {
        for f in &workplace.facility_ids {
            dangling(&workplace.name, "facility", f.0, project.facilities.len());
        }
        for t in &workplace.targeted_task_ids {
            dangling(&workplace.name, "task", t.0, n_tasks);
        }
        for wp in workplace
            .input_workplace_ids
            .iter()
            .chain(&workplace.output_workplace_ids)
        {
            dangling(&workplace.name, "workplace", wp.0, project.workplaces.len());
        }
        for c in &workplace.placed_component_ids {
            dangling(&workplace.name, "component", c.0, project.components.len());
        }
    }
    for workflow in &project.workflows {
        for t in &workflow.task_ids {
            dangling(&workflow.name, "task", t.0, n_tasks);
        }
    }
    for worker in &project.workers {
        if let Some(team) = worker.team {
            dangling(&worker.name, "team", team.0, project.teams.len());
        }
    }
    for facility in &project.facilities {
        if let Some(wp) = facility.workplace {
            dangling(&facility.name, "workplace", wp.0, project.workplaces.len());
        }
    }
}

fn check_mirrors(project: &Project, errors: &mut Vec<ValidationError>) {
    let mut one_sided = |message: String| {
        errors.push(ValidationError::new(
            ValidationErrorKind::InconsistentRelation,
            message,
        ));
    };

    for (i, task) in project.tasks.iter().enumerate() {
        let id = TaskId(i);
        for dep in &task.input_dependencies {
            let pred = &project.tasks[dep.task.0];
            if !pred
                .output_dependencies
                .iter()
                .any(|d| d.task == id && d.kind == dep.kind)
            {
                one_sided(format!(
                    "Dependency '{}' -> '{}' missing on predecessor",
                    pred.name, task.name
                ));
            }
        }
        for dep in &task.output_dependencies {
            let succ = &project.tasks[dep.task.0];
            if !succ
                .input_dependencies
                .iter()
                .any(|d| d.task == id && d.kind == dep.kind)
            {
                one_sided(format!(
                    "Dependency '{}' -> '{}' missing on successor",
                    task.name, succ.name
                ));
            }
        }
        for team in &task.allocated_team_ids {
            if !project.teams[team.0].targeted_task_ids.contains(&id) {
                one_sided(format!(
                    "Team '{}' does not target task '{}'",
                    project.teams[team.0].name, task.name
                ));
            }
        }
        for wp in &task.allocated_workplace_ids {
            if !project.workplaces[wp.0].targeted_task_ids.contains(&id) {
                one_sided(format!(
                    "Workplace '{}' does not target task '{}'",
                    project.workplaces[wp.0].name, task.name
                ));
            }
        }
        if let Some(c) = task.target_component {
            if !project.components[c.0].targeted_task_ids.contains(&id) {
                one_sided(format!(
                    "Component '{}' does not list task '{}'",
                    project.components[c.0].name, task.name
                ));
            }
        }
    }
    for (i, component) in project.components.iter().enumerate() {
        for child in &component.child_ids {
            if project.components[child.0].parent.map(|p| p.0) != Some(i) {
                one_sided(format!(
                    "Component '{}' lists child '{}' without parent link",
                    component.name, project.components[child.0].name
                ));
            }
        }
    }
    for (i, team) in project.teams.iter().enumerate() {
        for w in &team.worker_ids {
            if project.workers[w.0].team.map(|t| t.0) != Some(i) {
                one_sided(format!(
                    "Worker '{}' is listed in team '{}' but belongs elsewhere",
                    project.workers[w.0].name, team.name
                ));
            }
        }
    }
    for (i, workplace) in project.workplaces.iter().enumerate() {
        for f in &workplace.facility_ids {
            if project.facilities[f.0].workplace.map(|w| w.0) != Some(i) {
                one_sided(format!(
                    "Facility '{}' is listed in workplace '{}' but installed elsewhere",
                    project.facilities[f.0].name, workplace.name
                ));
            }
        }
    }
}

fn check_values(project: &Project, errors: &mut Vec<ValidationError>) {
    for task in &project.tasks {
        if task.default_work_amount < 0.0 || task.default_work_amount.is_nan() {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidValue,
                format!("Task '{}' has negative work amount", task.name),
            ));
        }
    }
    for component in &project.components {
        if component.space_size < 0.0 || component.space_size.is_nan() {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidValue,
                format!("Component '{}' has negative space size", component.name),
            ));
        }
    }
    for (i, workplace) in project.workplaces.iter().enumerate() {
        if workplace.max_space_size < 0.0 || workplace.max_space_size.is_nan() {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidValue,
                format!("Workplace '{}' has negative capacity", workplace.name),
            ));
        }
        let all_known = workplace
            .placed_component_ids
            .iter()
            .all(|c| c.0 < project.components.len());
        if all_known {
            let used = project.used_space(crate::models::WorkplaceId(i));
            if used > workplace.max_space_size + SPACE_EPSILON {
                errors.push(ValidationError::new(
                    ValidationErrorKind::CapacityExceeded,
                    format!(
                        "Workplace '{}' holds {used} units of space but allows {}",
                        workplace.name, workplace.max_space_size
                    ),
                ));
            }
        }
    }
}

/// Detects cycles in the task dependency graph using DFS.
///
/// # Algorithm
/// Topological sort via DFS. If a back-edge is found (visiting a node
/// currently in the recursion stack), a cycle exists.
///
/// # Reference
/// Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4
fn detect_cycles(project: &Project) -> Option<ValidationError> {
    // Build adjacency list: task → successors
    let adj: Vec<Vec<usize>> = project
        .tasks
        .iter()
        .map(|t| t.output_dependencies.iter().map(|d| d.task.0).collect())
        .collect();

    let mut visited = HashSet::new();
    let mut in_stack = HashSet::new();

    for node in 0..adj.len() {
        if !visited.contains(&node) && has_cycle_dfs(node, &adj, &mut visited, &mut in_stack) {
            return Some(ValidationError::new(
                ValidationErrorKind::CyclicDependency,
                format!(
                    "Circular dependency detected involving task '{}'",
                    project.tasks[node].name
                ),
            ));
        }
    }

    None
}

fn has_cycle_dfs(
    node: usize,
    adj: &[Vec<usize>],
    visited: &mut HashSet<usize>,
    in_stack: &mut HashSet<usize>,
) -> bool {
    visited.insert(node);
    in_stack.insert(node);

    for &next in &adj[node] {
        if in_stack.contains(&next) {
            return true; // Back edge → cycle
        }
        if !visited.contains(&next) && has_cycle_dfs(next, adj, visited, in_stack) {
            return true;
        }
    }

    in_stack.remove(&node);
    false
}

fn detect_component_cycles(project: &Project, errors: &mut Vec<ValidationError>) {
    let n = project.components.len();
    for start in 0..n {
        // A parent chain longer than the arena must revisit a node
        let mut cursor = project.components[start].parent;
        let mut steps = 0;
        while let Some(c) = cursor {
            steps += 1;
            if c.0 == start || steps > n {
                errors.push(ValidationError::new(
                    ValidationErrorKind::ComponentCycle,
                    format!(
                        "Component '{}' is its own ancestor",
                        project.components[start].name
                    ),
                ));
                break;
            }
            cursor = project.components[c.0].parent;
        }
    }
}
