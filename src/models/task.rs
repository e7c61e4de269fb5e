//! Task model.
//!
//! A task is a unit of work inside a workflow. It consumes work amount
//! through allocated workers (and facilities, when `need_facility` is set)
//! and moves through `NONE → READY → WORKING → FINISHED`.
//!
//! # PERT bounds
//! `est`/`eft`/`lst`/`lft` are recomputed every step by the PERT pass in
//! [`scheduler`](crate::scheduler). `lst`/`lft` stay negative until the
//! backward pass reaches the task.
//!
//! # Reference
//! Malcolm et al. (1959), "Application of a technique for R&D program evaluation"

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::record;
use super::{ComponentId, FacilityId, TaskId, TeamId, WorkerId, WorkflowId, WorkplaceId};
use crate::dispatching::{ResourcePriorityRule, WorkplacePriorityRule};

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TaskState {
    /// Waiting on predecessors.
    #[default]
    None,
    /// Startable, waiting for resources.
    Ready,
    /// Being performed.
    Working,
    /// Being performed on rework.
    WorkingAdditionally,
    /// Done.
    Finished,
}

impl TaskState {
    /// Whether the task is consuming work amount.
    #[inline]
    pub fn is_working(self) -> bool {
        matches!(self, Self::Working | Self::WorkingAdditionally)
    }

    /// Whether the task has started (working or finished).
    #[inline]
    pub fn has_started(self) -> bool {
        self.is_working() || self == Self::Finished
    }
}

/// Dependency kind between a predecessor and a successor task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DependencyKind {
    /// Successor starts after predecessor finishes.
    #[default]
    FinishToStart,
    /// Successor starts once predecessor has started.
    StartToStart,
    /// Successor finishes only after predecessor finishes.
    FinishToFinish,
    /// Successor finishes only after predecessor has started.
    StartToFinish,
}

/// One edge of the task graph, seen from the task that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    /// Task on the other end of the edge.
    pub task: TaskId,
    /// Edge kind.
    pub kind: DependencyKind,
}

impl Dependency {
    /// Creates a dependency edge.
    pub fn new(task: TaskId, kind: DependencyKind) -> Self {
        Self { task, kind }
    }
}

/// A task in a workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Human-readable name; skill maps are keyed by it.
    pub name: String,
    /// Owning workflow (set when added to a project).
    pub parent_workflow: Option<WorkflowId>,
    /// Total work amount.
    pub default_work_amount: f64,
    /// Fraction already done before the run (0.0..=1.0).
    pub default_progress: f64,
    /// Work amount an auto task completes per step.
    pub work_amount_progress_of_unit_step_time: f64,
    /// Due time (logical step), used by backward simulation.
    pub due_time: Option<usize>,
    /// Predecessor edges.
    pub input_dependencies: Vec<Dependency>,
    /// Successor edges.
    pub output_dependencies: Vec<Dependency>,
    /// Teams whose workers may perform this task.
    pub allocated_team_ids: BTreeSet<TeamId>,
    /// Workplaces whose facilities may host this task.
    pub allocated_workplace_ids: BTreeSet<WorkplaceId>,
    /// Component this task works on.
    pub target_component: Option<ComponentId>,
    /// Requires a facility paired with each worker.
    pub need_facility: bool,
    /// Progresses without human resources.
    pub auto_task: bool,
    /// If set, only these workers may be allocated.
    pub fixing_allocating_worker_ids: Option<BTreeSet<WorkerId>>,
    /// If set, only these facilities may be allocated.
    pub fixing_allocating_facility_ids: Option<BTreeSet<FacilityId>>,
    /// Rule ordering candidate workplaces for the target component.
    pub workplace_priority_rule: WorkplacePriorityRule,
    /// Rule ordering candidate workers.
    pub worker_priority_rule: ResourcePriorityRule,
    /// Rule ordering candidate facilities.
    pub facility_priority_rule: ResourcePriorityRule,

    /// Remaining work amount.
    pub remaining_work_amount: f64,
    /// Current state.
    pub state: TaskState,
    /// Earliest start.
    pub est: f64,
    /// Earliest finish.
    pub eft: f64,
    /// Latest start (negative until computed).
    pub lst: f64,
    /// Latest finish (negative until computed).
    pub lft: f64,
    /// Workers currently allocated.
    pub allocated_worker_ids: BTreeSet<WorkerId>,
    /// Facilities currently allocated.
    pub allocated_facility_ids: BTreeSet<FacilityId>,
    /// Worker/facility pairs bound together for facility tasks.
    pub allocated_pairs: BTreeSet<(WorkerId, FacilityId)>,

    /// State per recorded step.
    pub state_record: Vec<TaskState>,
    /// Remaining work amount per recorded step.
    pub remaining_work_amount_record: Vec<f64>,
    /// Allocated workers per recorded step.
    pub allocated_worker_record: Vec<BTreeSet<WorkerId>>,
    /// Allocated facilities per recorded step.
    pub allocated_facility_record: Vec<BTreeSet<FacilityId>>,
}

impl Task {
    /// Creates a task with 10.0 units of work.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent_workflow: None,
            default_work_amount: 10.0,
            default_progress: 0.0,
            work_amount_progress_of_unit_step_time: 1.0,
            due_time: None,
            input_dependencies: Vec::new(),
            output_dependencies: Vec::new(),
            allocated_team_ids: BTreeSet::new(),
            allocated_workplace_ids: BTreeSet::new(),
            target_component: None,
            need_facility: false,
            auto_task: false,
            fixing_allocating_worker_ids: None,
            fixing_allocating_facility_ids: None,
            workplace_priority_rule: WorkplacePriorityRule::Fss,
            worker_priority_rule: ResourcePriorityRule::Ssp,
            facility_priority_rule: ResourcePriorityRule::Ssp,
            remaining_work_amount: 10.0,
            state: TaskState::None,
            est: 0.0,
            eft: 0.0,
            lst: -1.0,
            lft: -1.0,
            allocated_worker_ids: BTreeSet::new(),
            allocated_facility_ids: BTreeSet::new(),
            allocated_pairs: BTreeSet::new(),
            state_record: Vec::new(),
            remaining_work_amount_record: Vec::new(),
            allocated_worker_record: Vec::new(),
            allocated_facility_record: Vec::new(),
        }
    }

    /// Sets the total work amount.
    pub fn with_work_amount(mut self, amount: f64) -> Self {
        self.default_work_amount = amount;
        self.remaining_work_amount = self.initial_remaining_work_amount();
        self
    }

    /// Sets the initial progress fraction.
    pub fn with_default_progress(mut self, progress: f64) -> Self {
        self.default_progress = progress;
        self.remaining_work_amount = self.initial_remaining_work_amount();
        self
    }

    /// Sets the due time.
    pub fn with_due_time(mut self, due_time: usize) -> Self {
        self.due_time = Some(due_time);
        self
    }

    /// Marks the task as an auto task progressing `progress_per_step` each step.
    pub fn auto(mut self, progress_per_step: f64) -> Self {
        self.auto_task = true;
        self.work_amount_progress_of_unit_step_time = progress_per_step;
        self
    }

    /// Requires a facility for every allocated worker.
    pub fn with_need_facility(mut self, need_facility: bool) -> Self {
        self.need_facility = need_facility;
        self
    }

    /// Sets the workplace priority rule.
    pub fn with_workplace_rule(mut self, rule: WorkplacePriorityRule) -> Self {
        self.workplace_priority_rule = rule;
        self
    }

    /// Sets the worker priority rule.
    pub fn with_worker_rule(mut self, rule: ResourcePriorityRule) -> Self {
        self.worker_priority_rule = rule;
        self
    }

    /// Sets the facility priority rule.
    pub fn with_facility_rule(mut self, rule: ResourcePriorityRule) -> Self {
        self.facility_priority_rule = rule;
        self
    }

    /// Restricts allocation to the given workers.
    pub fn with_fixed_workers(mut self, workers: impl IntoIterator<Item = WorkerId>) -> Self {
        self.fixing_allocating_worker_ids = Some(workers.into_iter().collect());
        self
    }

    /// Restricts allocation to the given facilities.
    pub fn with_fixed_facilities(
        mut self,
        facilities: impl IntoIterator<Item = FacilityId>,
    ) -> Self {
        self.fixing_allocating_facility_ids = Some(facilities.into_iter().collect());
        self
    }

    /// Remaining work at the start of a run.
    pub fn initial_remaining_work_amount(&self) -> f64 {
        (self.default_work_amount * (1.0 - self.default_progress)).max(0.0)
    }

    /// Resets state, PERT bounds, allocation and logs.
    pub fn initialize(&mut self) {
        self.remaining_work_amount = self.initial_remaining_work_amount();
        self.state = if self.default_progress >= 1.0 {
            self.remaining_work_amount = 0.0;
            TaskState::Finished
        } else {
            TaskState::None
        };
        self.est = 0.0;
        self.eft = 0.0;
        self.lst = -1.0;
        self.lft = -1.0;
        self.allocated_worker_ids.clear();
        self.allocated_facility_ids.clear();
        self.allocated_pairs.clear();
        self.state_record.clear();
        self.remaining_work_amount_record.clear();
        self.allocated_worker_record.clear();
        self.allocated_facility_record.clear();
    }

    /// Whether the task has no predecessors.
    #[inline]
    pub fn is_head(&self) -> bool {
        self.input_dependencies.is_empty()
    }

    /// Whether the task has no successors.
    #[inline]
    pub fn is_tail(&self) -> bool {
        self.output_dependencies.is_empty()
    }

    /// Slack (`lst - est`).
    #[inline]
    pub fn slack(&self) -> f64 {
        self.lst - self.est
    }

    /// Whether any resource is allocated.
    pub fn has_allocation(&self) -> bool {
        !self.allocated_worker_ids.is_empty() || !self.allocated_facility_ids.is_empty()
    }

    /// Appends the current state to every log.
    pub fn record(&mut self) {
        self.state_record.push(self.state);
        self.remaining_work_amount_record
            .push(self.remaining_work_amount);
        self.allocated_worker_record
            .push(self.allocated_worker_ids.clone());
        self.allocated_facility_record
            .push(self.allocated_facility_ids.clone());
    }

    /// State recorded at `step`, if any.
    pub fn state_at(&self, step: usize) -> Option<TaskState> {
        self.state_record.get(step).copied()
    }

    /// Number of recorded steps the task spent READY.
    pub fn ready_count(&self) -> usize {
        self.state_record
            .iter()
            .filter(|s| **s == TaskState::Ready)
            .count()
    }

    /// First recorded step at which the task was FINISHED.
    pub fn finished_at(&self) -> Option<usize> {
        self.state_record
            .iter()
            .position(|s| *s == TaskState::Finished)
    }

    /// Excises the given steps from every log.
    pub fn remove_absence_time_list(&mut self, absence_time_list: &[usize]) {
        record::remove_at(&mut self.state_record, absence_time_list);
        record::remove_at(&mut self.remaining_work_amount_record, absence_time_list);
        record::remove_at(&mut self.allocated_worker_record, absence_time_list);
        record::remove_at(&mut self.allocated_facility_record, absence_time_list);
    }

    /// Splices absence steps into every log.
    ///
    /// State entries bridge as `WORKING → READY` and `NONE → READY` (when a
    /// started state follows); other logs repeat the preceding entry.
    pub fn insert_absence_time_list(&mut self, absence_time_list: &[usize]) {
        record::insert_at(&mut self.state_record, absence_time_list, bridge_state);
        let initial = self.initial_remaining_work_amount();
        record::insert_duplicating(
            &mut self.remaining_work_amount_record,
            absence_time_list,
            initial,
        );
        record::insert_duplicating(
            &mut self.allocated_worker_record,
            absence_time_list,
            BTreeSet::new(),
        );
        record::insert_duplicating(
            &mut self.allocated_facility_record,
            absence_time_list,
            BTreeSet::new(),
        );
    }

    /// Reverses every log in place (backward simulation).
    pub fn reverse_log_information(&mut self) {
        self.state_record.reverse();
        self.remaining_work_amount_record.reverse();
        self.allocated_worker_record.reverse();
        self.allocated_facility_record.reverse();
    }

    /// Swaps predecessor and successor edges.
    pub(crate) fn reverse_dependencies(&mut self) {
        std::mem::swap(&mut self.input_dependencies, &mut self.output_dependencies);
    }
}

fn bridge_state(prev: Option<&TaskState>, next: Option<&TaskState>) -> TaskState {
    match (prev, next) {
        (None, _) => TaskState::None,
        (Some(p), _) if p.is_working() => TaskState::Ready,
        (Some(TaskState::None), Some(n)) if *n != TaskState::None => TaskState::Ready,
        (Some(p), _) => *p,
    }
}

impl Default for Task {
    fn default() -> Self {
        Self::new("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorded(states: &[TaskState]) -> Task {
        let mut task = Task::new("T").with_work_amount(6.0);
        for (i, s) in states.iter().enumerate() {
            task.state = *s;
            task.remaining_work_amount = 6.0 - i as f64;
            if s.is_working() {
                task.allocated_worker_ids.insert(WorkerId(0));
            } else {
                task.allocated_worker_ids.clear();
            }
            task.record();
        }
        task
    }

    #[test]
    fn test_task_defaults() {
        let task = Task::new("design");
        assert_eq!(task.name, "design");
        assert!((task.default_work_amount - 10.0).abs() < 1e-10);
        assert!((task.remaining_work_amount - 10.0).abs() < 1e-10);
        assert_eq!(task.state, TaskState::None);
        assert!(task.lst < 0.0 && task.lft < 0.0);
        assert_eq!(task.workplace_priority_rule, WorkplacePriorityRule::Fss);
        assert_eq!(task.worker_priority_rule, ResourcePriorityRule::Ssp);
        assert!(!task.auto_task);
    }

    #[test]
    fn test_initialize_with_default_progress() {
        let mut task = Task::new("T").with_work_amount(10.0).with_default_progress(0.3);
        task.initialize();
        assert!((task.remaining_work_amount - 7.0).abs() < 1e-10);
        assert_eq!(task.state, TaskState::None);

        let mut done = Task::new("T").with_default_progress(1.0);
        done.initialize();
        assert_eq!(done.state, TaskState::Finished);
        assert!(done.remaining_work_amount.abs() < 1e-10);
    }

    #[test]
    fn test_initialize_clears_logs() {
        let mut task = recorded(&[TaskState::None, TaskState::Ready]);
        task.initialize();
        assert!(task.state_record.is_empty());
        assert!(task.allocated_worker_record.is_empty());
        assert!(task.allocated_worker_ids.is_empty());
    }

    #[test]
    fn test_state_at_and_finished_at() {
        let task = recorded(&[
            TaskState::None,
            TaskState::Ready,
            TaskState::Working,
            TaskState::Finished,
        ]);
        assert_eq!(task.state_at(1), Some(TaskState::Ready));
        assert_eq!(task.state_at(9), None);
        assert_eq!(task.finished_at(), Some(3));
        assert_eq!(task.ready_count(), 1);
    }

    #[test]
    fn test_remove_absence_time_list() {
        let mut task = recorded(&[
            TaskState::None,
            TaskState::Ready,
            TaskState::Working,
            TaskState::Working,
            TaskState::Working,
            TaskState::Finished,
        ]);
        task.remove_absence_time_list(&[3, 4]);
        assert_eq!(
            task.state_record,
            vec![
                TaskState::None,
                TaskState::Ready,
                TaskState::Working,
                TaskState::Finished
            ]
        );
        assert_eq!(task.remaining_work_amount_record, vec![6.0, 5.0, 4.0, 1.0]);
        assert_eq!(task.allocated_worker_record.len(), 4);
        assert_eq!(task.allocated_facility_record.len(), 4);
    }

    #[test]
    fn test_insert_absence_time_list_bridges_states() {
        let mut task = recorded(&[
            TaskState::None,
            TaskState::Ready,
            TaskState::Working,
            TaskState::Finished,
        ]);
        task.insert_absence_time_list(&[3, 4]);
        assert_eq!(
            task.state_record,
            vec![
                TaskState::None,
                TaskState::Ready,
                TaskState::Working,
                TaskState::Ready,
                TaskState::Ready,
                TaskState::Finished
            ]
        );
        assert_eq!(
            task.remaining_work_amount_record,
            vec![6.0, 5.0, 4.0, 4.0, 4.0, 3.0]
        );
        assert_eq!(task.allocated_worker_record[3], task.allocated_worker_record[2]);
    }

    #[test]
    fn test_insert_at_zero_and_none_bridge() {
        let mut task = recorded(&[TaskState::None, TaskState::Working]);
        task.insert_absence_time_list(&[0, 2]);
        // index 0 -> NONE, then NONE followed by WORKING bridges through READY
        assert_eq!(
            task.state_record,
            vec![
                TaskState::None,
                TaskState::None,
                TaskState::Ready,
                TaskState::Working
            ]
        );
        assert!((task.remaining_work_amount_record[0] - 6.0).abs() < 1e-10);
        assert!(task.allocated_worker_record[0].is_empty());
    }

    #[test]
    fn test_reverse_dependencies() {
        let mut task = Task::new("T");
        task.input_dependencies
            .push(Dependency::new(TaskId(1), DependencyKind::FinishToStart));
        task.reverse_dependencies();
        assert!(task.is_head());
        assert!(!task.is_tail());
        assert_eq!(task.output_dependencies[0].task, TaskId(1));
    }
}
