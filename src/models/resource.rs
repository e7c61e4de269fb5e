//! Shared resource model for workers and facilities.
//!
//! Workers and facilities perform task work with a stochastic skill-based
//! rate, accrue cost while working and keep the same per-step logs. This
//! module holds the pieces they share: skill maps, the state machine with
//! its logs, and the [`Resource`] trait the allocator and priority rules
//! are written against.
//!
//! # Progress model
//! Per step, a resource contributes `max(0, N(mean, sd)) / n` to each task it
//! works on, where `n` is the number of its assigned tasks currently working.
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 1.2

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::record;
use super::{TaskId, WorkplaceId};

/// Threshold below which a skill mean counts as absent.
pub const SKILL_EPSILON: f64 = 1e-10;

/// State of a worker or facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ResourceState {
    /// Available for allocation.
    #[default]
    Free,
    /// Bound to at least one task.
    Working,
    /// Unavailable this step.
    Absence,
}

/// Work amount skills keyed by task name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkAmountSkills {
    /// Mean progress per step.
    pub mean: BTreeMap<String, f64>,
    /// Standard deviation of progress per step (0 when absent).
    pub sd: BTreeMap<String, f64>,
}

impl WorkAmountSkills {
    /// Creates an empty skill set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets mean and standard deviation for a task name.
    pub fn set(&mut self, task_name: impl Into<String>, mean: f64, sd: f64) {
        let name = task_name.into();
        self.mean.insert(name.clone(), mean);
        self.sd.insert(name, sd);
    }

    /// Whether the mean for `task_name` is meaningfully positive.
    pub fn has_skill(&self, task_name: &str) -> bool {
        self.mean
            .get(task_name)
            .is_some_and(|m| *m > SKILL_EPSILON)
    }

    /// Mean for `task_name`, if defined.
    pub fn mean_of(&self, task_name: &str) -> Option<f64> {
        self.mean.get(task_name).copied()
    }

    /// Sum of all skill means (the `SSP` key).
    pub fn total_mean(&self) -> f64 {
        self.mean.values().sum()
    }

    /// Draws one step of progress for `task_name`.
    ///
    /// Returns 0.0 when the skill is missing. Negative draws are clamped so
    /// remaining work never grows.
    pub fn sample<R: Rng + ?Sized>(&self, task_name: &str, rng: &mut R) -> f64 {
        if !self.has_skill(task_name) {
            return 0.0;
        }
        let mean = self.mean.get(task_name).copied().unwrap_or(0.0);
        let sd = self.sd.get(task_name).copied().unwrap_or(0.0);
        if sd <= 0.0 {
            return mean.max(0.0);
        }
        match Normal::new(mean, sd) {
            Ok(dist) => dist.sample(rng).max(0.0),
            Err(_) => mean.max(0.0),
        }
    }
}

/// Mutable per-run state and logs of a resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceActivity {
    /// Current state.
    pub state: ResourceState,
    /// Tasks currently assigned.
    pub assigned_task_ids: BTreeSet<TaskId>,
    /// State per recorded step.
    pub state_record: Vec<ResourceState>,
    /// Cost per recorded step.
    pub cost_record: Vec<f64>,
    /// Assigned tasks per recorded step.
    pub assigned_task_record: Vec<BTreeSet<TaskId>>,
}

impl ResourceActivity {
    /// Resets state and logs.
    pub fn initialize(&mut self) {
        *self = Self::default();
    }

    /// Recomputes state for a step from absence and assignment.
    pub fn refresh_state(&mut self, absent: bool) {
        self.state = if absent {
            ResourceState::Absence
        } else if self.assigned_task_ids.is_empty() {
            ResourceState::Free
        } else {
            ResourceState::Working
        };
    }

    /// Appends this step's cost (`cost_per_time` if working, else 0).
    pub fn add_labor_cost(&mut self, cost_per_time: f64, add_zero: bool) -> f64 {
        let cost = if !add_zero && self.state == ResourceState::Working {
            cost_per_time
        } else {
            0.0
        };
        self.cost_record.push(cost);
        cost
    }

    /// Appends state and assignment to the logs.
    pub fn record(&mut self) {
        self.state_record.push(self.state);
        self.assigned_task_record
            .push(self.assigned_task_ids.clone());
    }

    /// Excises the given steps from every log.
    pub fn remove_absence_time_list(&mut self, absence_time_list: &[usize]) {
        record::remove_at(&mut self.state_record, absence_time_list);
        record::remove_at(&mut self.cost_record, absence_time_list);
        record::remove_at(&mut self.assigned_task_record, absence_time_list);
    }

    /// Splices absence steps into every log.
    pub fn insert_absence_time_list(&mut self, absence_time_list: &[usize]) {
        record::insert_at(&mut self.state_record, absence_time_list, |prev, _| match prev {
            None | Some(ResourceState::Working) => ResourceState::Free,
            Some(s) => *s,
        });
        record::insert_constant(&mut self.cost_record, absence_time_list, 0.0);
        record::insert_duplicating(
            &mut self.assigned_task_record,
            absence_time_list,
            BTreeSet::new(),
        );
    }

    /// Reverses every log.
    pub fn reverse_log_information(&mut self) {
        self.state_record.reverse();
        self.cost_record.reverse();
        self.assigned_task_record.reverse();
    }

    /// Number of recorded steps spent in `state`.
    pub fn count_state(&self, state: ResourceState) -> usize {
        self.state_record.iter().filter(|s| **s == state).count()
    }
}

/// Common view over workers and facilities.
pub trait Resource {
    /// Resource name.
    fn name(&self) -> &str;

    /// Work amount skills.
    fn skills(&self) -> &WorkAmountSkills;

    /// Cost per working step.
    fn cost_per_time(&self) -> f64;

    /// Cannot share a task with other resources.
    fn solo_working(&self) -> bool;

    /// Steps at which the resource is absent.
    fn absence_time_list(&self) -> &[usize];

    /// Workplace the resource belongs to (`MW` rule key).
    fn home_workplace(&self) -> Option<WorkplaceId>;

    /// Run state and logs.
    fn activity(&self) -> &ResourceActivity;

    /// Mutable run state and logs.
    fn activity_mut(&mut self) -> &mut ResourceActivity;

    /// Current state.
    fn state(&self) -> ResourceState {
        self.activity().state
    }

    /// Whether the resource can perform `task_name`.
    fn has_workamount_skill(&self, task_name: &str) -> bool {
        self.skills().has_skill(task_name)
    }

    /// Whether `step` is in the resource's own absence list.
    fn is_absent_at(&self, step: usize) -> bool {
        self.absence_time_list().contains(&step)
    }
}
