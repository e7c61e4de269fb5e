//! Team model.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::record;
use super::{TaskId, TeamId, WorkerId};

/// A group of workers sharing task authorizations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    /// Team name.
    pub name: String,
    /// Members.
    pub worker_ids: BTreeSet<WorkerId>,
    /// Tasks this team is authorized to perform.
    pub targeted_task_ids: BTreeSet<TaskId>,
    /// Parent team.
    pub parent: Option<TeamId>,
    /// Sum of member costs per recorded step.
    pub cost_record: Vec<f64>,
}

impl Team {
    /// Creates an empty team.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            worker_ids: BTreeSet::new(),
            targeted_task_ids: BTreeSet::new(),
            parent: None,
            cost_record: Vec::new(),
        }
    }

    /// Resets logs.
    pub fn initialize(&mut self) {
        self.cost_record.clear();
    }

    /// Total recorded cost.
    pub fn total_cost(&self) -> f64 {
        self.cost_record.iter().sum()
    }

    /// Excises the given steps from the cost log.
    pub fn remove_absence_time_list(&mut self, absence_time_list: &[usize]) {
        record::remove_at(&mut self.cost_record, absence_time_list);
    }

    /// Inserts zero-cost steps.
    pub fn insert_absence_time_list(&mut self, absence_time_list: &[usize]) {
        record::insert_constant(&mut self.cost_record, absence_time_list, 0.0);
    }

    /// Reverses the cost log.
    pub fn reverse_log_information(&mut self) {
        self.cost_record.reverse();
    }
}
