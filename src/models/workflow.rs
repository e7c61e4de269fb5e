//! Workflow and product containers.

use serde::{Deserialize, Serialize};

use super::{ComponentId, TaskId};

/// An ordered collection of tasks sharing one critical path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    /// Workflow name.
    pub name: String,
    /// Member tasks in insertion order.
    pub task_ids: Vec<TaskId>,
    /// Longest path through the workflow (max `eft` over tail tasks).
    pub critical_path_length: f64,
}

impl Workflow {
    /// Creates an empty workflow.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            task_ids: Vec::new(),
            critical_path_length: 0.0,
        }
    }
}

/// A product made of components.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Product name.
    pub name: String,
    /// Member components in insertion order.
    pub component_ids: Vec<ComponentId>,
}

impl Product {
    /// Creates an empty product.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            component_ids: Vec::new(),
        }
    }
}
