//! Component model.
//!
//! Components form a tree per product. A component is placed at no more
//! than one workplace at a time; placing or removing a component carries
//! its descendants along.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::record;
use super::{ComponentId, ProductId, TaskId, TaskState, WorkplaceId};

/// Lifecycle state of a component, derived from its targeted tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ComponentState {
    /// No targeted task has started or become ready.
    #[default]
    None,
    /// Some targeted task is ready and none is working.
    Ready,
    /// Some targeted task is working.
    Working,
    /// Every targeted task is finished.
    Finished,
    /// Finished and taken off the shop floor.
    Removed,
}

/// A part of a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Component {
    /// Component name.
    pub name: String,
    /// Owning product (set when added to a project).
    pub parent_product: Option<ProductId>,
    /// Parent in the component tree.
    pub parent: Option<ComponentId>,
    /// Children in the component tree.
    pub child_ids: BTreeSet<ComponentId>,
    /// Tasks that work on this component.
    pub targeted_task_ids: BTreeSet<TaskId>,
    /// Space occupied at a workplace.
    pub space_size: f64,
    /// Acceptable defect count.
    pub error_tolerance: f64,

    /// Accumulated defects.
    pub error: u32,
    /// Current state.
    pub state: ComponentState,
    /// Workplace the component currently occupies.
    pub placed_workplace: Option<WorkplaceId>,
    /// State per recorded step.
    pub state_record: Vec<ComponentState>,
    /// Placement per recorded step.
    pub placed_workplace_record: Vec<Option<WorkplaceId>>,
}

impl Component {
    /// Creates a component of size 1.0.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent_product: None,
            parent: None,
            child_ids: BTreeSet::new(),
            targeted_task_ids: BTreeSet::new(),
            space_size: 1.0,
            error_tolerance: 0.0,
            error: 0,
            state: ComponentState::None,
            placed_workplace: None,
            state_record: Vec::new(),
            placed_workplace_record: Vec::new(),
        }
    }

    /// Sets the occupied space.
    pub fn with_space_size(mut self, space_size: f64) -> Self {
        self.space_size = space_size;
        self
    }

    /// Sets the defect tolerance.
    pub fn with_error_tolerance(mut self, tolerance: f64) -> Self {
        self.error_tolerance = tolerance;
        self
    }

    /// Resets state, placement and logs.
    pub fn initialize(&mut self) {
        self.error = 0;
        self.state = ComponentState::None;
        self.placed_workplace = None;
        self.state_record.clear();
        self.placed_workplace_record.clear();
    }

    /// Derives the state from the states of the targeted tasks.
    ///
    /// `Removed` is sticky once reached.
    pub fn refresh_state(&mut self, task_states: &[TaskState]) {
        if self.state == ComponentState::Removed {
            return;
        }
        self.state = if !task_states.is_empty()
            && task_states.iter().all(|s| *s == TaskState::Finished)
        {
            ComponentState::Finished
        } else if task_states.iter().any(|s| s.is_working()) {
            ComponentState::Working
        } else if task_states.contains(&TaskState::Ready) {
            ComponentState::Ready
        } else {
            ComponentState::None
        };
    }

    /// Adds a defect with probability `1 - no_error_probability`.
    pub fn update_error_value<R: Rng + ?Sized>(&mut self, no_error_probability: f64, rng: &mut R) {
        if no_error_probability >= 1.0 {
            return;
        }
        if rng.random::<f64>() >= no_error_probability {
            self.error += 1;
        }
    }

    /// Whether accumulated defects exceed the tolerance.
    pub fn is_defective(&self) -> bool {
        f64::from(self.error) > self.error_tolerance
    }

    /// Appends state and placement to the logs.
    pub fn record(&mut self) {
        self.state_record.push(self.state);
        self.placed_workplace_record.push(self.placed_workplace);
    }

    /// Excises the given steps from every log.
    pub fn remove_absence_time_list(&mut self, absence_time_list: &[usize]) {
        record::remove_at(&mut self.state_record, absence_time_list);
        record::remove_at(&mut self.placed_workplace_record, absence_time_list);
    }

    /// Splices absence steps into every log.
    pub fn insert_absence_time_list(&mut self, absence_time_list: &[usize]) {
        record::insert_at(&mut self.state_record, absence_time_list, |prev, next| {
            match (prev, next) {
                (None, _) => ComponentState::None,
                (Some(ComponentState::Working), _) => ComponentState::Ready,
                (Some(ComponentState::None), Some(n)) if *n != ComponentState::None => {
                    ComponentState::Ready
                }
                (Some(p), _) => *p,
            }
        });
        record::insert_duplicating(&mut self.placed_workplace_record, absence_time_list, None);
    }

    /// Reverses every log.
    pub fn reverse_log_information(&mut self) {
        self.state_record.reverse();
        self.placed_workplace_record.reverse();
    }
}

/// Whether a component may be moved to a new workplace.
///
/// True when not every targeted task is finished, none is working, and at
/// least one is ready.
pub fn is_ready_for_placement(task_states: &[TaskState]) -> bool {
    let all_finished =
        !task_states.is_empty() && task_states.iter().all(|s| *s == TaskState::Finished);
    let any_working = task_states.iter().any(|s| s.is_working());
    let any_ready = task_states.contains(&TaskState::Ready);
    !all_finished && !any_working && any_ready
}
