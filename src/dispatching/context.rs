//! Evaluation context for priority rules.

use crate::models::{Project, WorkplaceId};

/// Read-only view passed to priority rules.
///
/// Rules that rank resources for a particular task (`HSV`, workplace `SSP`)
/// need the task name; `MW` needs the workplace asking for the resource.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// Project being simulated.
    pub project: &'a Project,
    /// Name of the task requesting resources.
    pub task_name: Option<&'a str>,
    /// Workplace requesting resources.
    pub requesting_workplace: Option<WorkplaceId>,
}

impl<'a> RuleContext<'a> {
    /// Creates a context over a project.
    pub fn new(project: &'a Project) -> Self {
        Self {
            project,
            task_name: None,
            requesting_workplace: None,
        }
    }

    /// Sets the requesting task name.
    pub fn with_task_name(mut self, task_name: &'a str) -> Self {
        self.task_name = Some(task_name);
        self
    }

    /// Sets the requesting workplace.
    pub fn with_requesting_workplace(mut self, workplace: Option<WorkplaceId>) -> Self {
        self.requesting_workplace = workplace;
        self
    }
}
