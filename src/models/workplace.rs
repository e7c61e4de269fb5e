//! Workplace model.
//!
//! A workplace hosts facilities and holds placed components up to its
//! space capacity. Directed input/output edges between workplaces model a
//! conveyor: a workplace with inputs only accepts components arriving from
//! one of them (or not yet placed anywhere).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::record;
use super::{ComponentId, FacilityId, TaskId, WorkplaceId};

/// Tolerance applied to the space capacity check.
pub const SPACE_EPSILON: f64 = 1e-8;

/// A physical location hosting facilities and components.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workplace {
    /// Workplace name.
    pub name: String,
    /// Installed facilities.
    pub facility_ids: BTreeSet<FacilityId>,
    /// Tasks this workplace is authorized to host.
    pub targeted_task_ids: BTreeSet<TaskId>,
    /// Parent workplace.
    pub parent: Option<WorkplaceId>,
    /// Space capacity for placed components.
    pub max_space_size: f64,
    /// Upstream workplaces on the conveyor.
    pub input_workplace_ids: BTreeSet<WorkplaceId>,
    /// Downstream workplaces on the conveyor.
    pub output_workplace_ids: BTreeSet<WorkplaceId>,

    /// Components currently placed here.
    pub placed_component_ids: BTreeSet<ComponentId>,
    /// Placed components per recorded step.
    pub placed_component_record: Vec<BTreeSet<ComponentId>>,
    /// Sum of facility costs per recorded step.
    pub cost_record: Vec<f64>,
}

impl Workplace {
    /// Creates a workplace with capacity 1.0.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            facility_ids: BTreeSet::new(),
            targeted_task_ids: BTreeSet::new(),
            parent: None,
            max_space_size: 1.0,
            input_workplace_ids: BTreeSet::new(),
            output_workplace_ids: BTreeSet::new(),
            placed_component_ids: BTreeSet::new(),
            placed_component_record: Vec::new(),
            cost_record: Vec::new(),
        }
    }

    /// Sets the space capacity.
    pub fn with_max_space_size(mut self, max_space_size: f64) -> Self {
        self.max_space_size = max_space_size;
        self
    }

    /// Resets placement and logs.
    pub fn initialize(&mut self) {
        self.placed_component_ids.clear();
        self.placed_component_record.clear();
        self.cost_record.clear();
    }

    /// Whether `additional` more space fits next to `used`.
    pub fn can_put(&self, used: f64, additional: f64) -> bool {
        used + additional <= self.max_space_size + SPACE_EPSILON
    }

    /// Appends placement to the log.
    pub fn record_placed_component(&mut self) {
        self.placed_component_record
            .push(self.placed_component_ids.clone());
    }

    /// Excises the given steps from every log.
    pub fn remove_absence_time_list(&mut self, absence_time_list: &[usize]) {
        record::remove_at(&mut self.placed_component_record, absence_time_list);
        record::remove_at(&mut self.cost_record, absence_time_list);
    }

    /// Splices absence steps into every log.
    pub fn insert_absence_time_list(&mut self, absence_time_list: &[usize]) {
        record::insert_duplicating(
            &mut self.placed_component_record,
            absence_time_list,
            BTreeSet::new(),
        );
        record::insert_constant(&mut self.cost_record, absence_time_list, 0.0);
    }

    /// Reverses every log.
    pub fn reverse_log_information(&mut self) {
        self.placed_component_record.reverse();
        self.cost_record.reverse();
    }

    /// Swaps conveyor input and output edges.
    pub(crate) fn reverse_conveyor(&mut self) {
        std::mem::swap(&mut self.input_workplace_ids, &mut self.output_workplace_ids);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_put() {
        let wp = Workplace::new("wp").with_max_space_size(2.0);
        assert!(wp.can_put(1.0, 1.0));
        assert!(wp.can_put(1.0, 1.0 + 1e-9));
        assert!(!wp.can_put(1.5, 1.0));
    }

    #[test]
    fn test_placed_record_splice() {
        let mut wp = Workplace::new("wp");
        wp.record_placed_component();
        wp.placed_component_ids.insert(ComponentId(0));
        wp.record_placed_component();
        wp.cost_record = vec![0.0, 1.0];
        wp.insert_absence_time_list(&[1, 3]);
        assert_eq!(wp.placed_component_record.len(), 3);
        assert!(wp.placed_component_record[1].is_empty());
        assert!(wp.placed_component_record[2].contains(&ComponentId(0)));
        assert_eq!(wp.cost_record, vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_reverse_conveyor() {
        let mut wp = Workplace::new("wp");
        wp.input_workplace_ids.insert(WorkplaceId(3));
        wp.reverse_conveyor();
        assert!(wp.input_workplace_ids.is_empty());
        assert!(wp.output_workplace_ids.contains(&WorkplaceId(3)));
    }
}
