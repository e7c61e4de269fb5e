//! Simulation controller.
//!
//! [`Project::simulate`] runs the forward step loop; [`Project::backward_simulate`]
//! runs it over the reversed graph to obtain the latest feasible schedule.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::dispatching::TaskPriorityRule;
use crate::error::SimulationError;
use crate::models::{
    Calendar, Dependency, DependencyKind, Project, ProjectStatus, Resource, ResourceActivity,
    ResourceState, SimulationMode, Task, TaskId, WorkplaceId,
};
use crate::validation::validate_project;

/// How many tasks a worker may perform at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WorkerPerformingMode {
    /// One task at a time.
    #[default]
    SingleTask,
    /// Several tasks at once (not supported).
    MultiTask,
}

/// How many workers a task accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TaskPerformedMode {
    /// At most one worker per task.
    SingleWorker,
    /// Any number of workers.
    #[default]
    MultiWorkers,
}

fn normalize_mode(s: &str) -> String {
    s.trim().to_ascii_lowercase().replace('_', "-")
}

impl WorkerPerformingMode {
    /// Mode name (e.g., "single-task").
    pub fn name(&self) -> &'static str {
        match self {
            Self::SingleTask => "single-task",
            Self::MultiTask => "multi-task",
        }
    }
}

impl TaskPerformedMode {
    /// Mode name (e.g., "multi-workers").
    pub fn name(&self) -> &'static str {
        match self {
            Self::SingleWorker => "single-worker",
            Self::MultiWorkers => "multi-workers",
        }
    }
}

impl FromStr for WorkerPerformingMode {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_mode(s).as_str() {
            "single-task" => Ok(Self::SingleTask),
            "multi-task" => Ok(Self::MultiTask),
            _ => Err(SimulationError::InvalidMode {
                kind: "worker performing mode",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for TaskPerformedMode {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_mode(s).as_str() {
            "single-worker" => Ok(Self::SingleWorker),
            "multi-workers" => Ok(Self::MultiWorkers),
            _ => Err(SimulationError::InvalidMode {
                kind: "task performed mode",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for WorkerPerformingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for TaskPerformedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parameters of one simulation run.
///
/// # Example
///
/// ```
/// use u_pdes::dispatching::TaskPriorityRule;
/// use u_pdes::scheduler::SimulationConfig;
///
/// let config = SimulationConfig::new()
///     .with_task_priority_rule(TaskPriorityRule::Spt)
///     .with_absence_time_list([5, 6])
///     .with_seed(42);
/// assert_eq!(config.max_time, 10000);
/// assert!(!config.calendar.is_business_time(5));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Worker performing mode.
    pub worker_performing_mode: WorkerPerformingMode,
    /// Task performed mode.
    pub task_performed_mode: TaskPerformedMode,
    /// Rule ordering tasks during allocation.
    pub task_priority_rule: TaskPriorityRule,
    /// Remaining work below this counts as done.
    pub error_tolerance: f64,
    /// Business-time calendar (project-level absences and windows).
    pub calendar: Calendar,
    /// Auto tasks keep progressing outside business time.
    pub perform_auto_task_while_absence_time: bool,
    /// Hard stop; reaching it ends the run with `FinishedFailure`.
    pub max_time: usize,
    /// Seed for skill draws. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl SimulationConfig {
    /// Creates a config with default settings.
    pub fn new() -> Self {
        Self {
            worker_performing_mode: WorkerPerformingMode::SingleTask,
            task_performed_mode: TaskPerformedMode::MultiWorkers,
            task_priority_rule: TaskPriorityRule::Tslack,
            error_tolerance: 1e-10,
            calendar: Calendar::new(),
            perform_auto_task_while_absence_time: false,
            max_time: 10000,
            seed: None,
        }
    }

    /// Sets the worker performing mode.
    pub fn with_worker_performing_mode(mut self, mode: WorkerPerformingMode) -> Self {
        self.worker_performing_mode = mode;
        self
    }

    /// Sets the task performed mode.
    pub fn with_task_performed_mode(mut self, mode: TaskPerformedMode) -> Self {
        self.task_performed_mode = mode;
        self
    }

    /// Sets the task priority rule.
    pub fn with_task_priority_rule(mut self, rule: TaskPriorityRule) -> Self {
        self.task_priority_rule = rule;
        self
    }

    /// Sets the finish tolerance.
    pub fn with_error_tolerance(mut self, tolerance: f64) -> Self {
        self.error_tolerance = tolerance;
        self
    }

    /// Sets the project-level absence steps.
    pub fn with_absence_time_list(mut self, steps: impl IntoIterator<Item = usize>) -> Self {
        self.calendar = self.calendar.with_absence(steps);
        self
    }

    /// Adds a working window repeating every `cycle_length` steps.
    pub fn with_working_window(mut self, cycle_length: usize, start: usize, end: usize) -> Self {
        self.calendar = self.calendar.with_window(cycle_length, start, end);
        self
    }

    /// Replaces the calendar.
    pub fn with_calendar(mut self, calendar: Calendar) -> Self {
        self.calendar = calendar;
        self
    }

    /// Lets auto tasks progress outside business time.
    pub fn with_auto_task_during_absence(mut self, enabled: bool) -> Self {
        self.perform_auto_task_while_absence_time = enabled;
        self
    }

    /// Sets the step limit.
    pub fn with_max_time(mut self, max_time: usize) -> Self {
        self.max_time = max_time;
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn check_modes(&self) -> Result<(), SimulationError> {
        match self.worker_performing_mode {
            WorkerPerformingMode::SingleTask => Ok(()),
            WorkerPerformingMode::MultiTask => Err(SimulationError::UnsupportedMode(format!(
                "worker performing mode {}",
                self.worker_performing_mode
            ))),
        }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Project {
    /// Runs the forward simulation until every task finishes or
    /// `config.max_time` is reached.
    ///
    /// Resets the project first. Reaching `max_time` is not an error: the
    /// returned status is [`ProjectStatus::FinishedFailure`].
    ///
    /// # Errors
    /// `UnsupportedMode` for `MultiTask`, `InvalidModel` when validation fails.
    /// Both are raised before any state changes.
    pub fn simulate(
        &mut self,
        config: &SimulationConfig,
    ) -> Result<ProjectStatus, SimulationError> {
        self.prepare(config)?;
        self.simulation_mode = SimulationMode::Forward;
        Ok(self.run(config))
    }

    /// Runs the simulation over the reversed task graph and conveyor, then
    /// reverses every log so that it reads forward in time.
    ///
    /// With `considering_due_time_of_tail_tasks`, tail tasks due earlier than
    /// the latest tail due time get a filler auto task so that they finish
    /// exactly at their due time. Fillers and reversed edges are always
    /// undone, even if the run panics.
    pub fn backward_simulate(
        &mut self,
        config: &SimulationConfig,
        considering_due_time_of_tail_tasks: bool,
    ) -> Result<ProjectStatus, SimulationError> {
        self.prepare(config)?;

        let status = {
            let mut reversal = EdgeReversal::apply(self);
            if considering_due_time_of_tail_tasks {
                reversal.add_due_time_fillers()?;
            }
            reversal.project.run(config)
        };

        self.reverse_log_information();
        self.simulation_mode = SimulationMode::Backward;
        Ok(status)
    }

    /// Reverses every entity log and the project cost history.
    pub fn reverse_log_information(&mut self) {
        self.cost_record.reverse();
        self.tasks.iter_mut().for_each(Task::reverse_log_information);
        for c in &mut self.components {
            c.reverse_log_information();
        }
        for w in &mut self.workers {
            w.activity.reverse_log_information();
        }
        for f in &mut self.facilities {
            f.activity.reverse_log_information();
        }
        for team in &mut self.teams {
            team.reverse_log_information();
        }
        for wp in &mut self.workplaces {
            wp.reverse_log_information();
        }
    }

    fn prepare(&mut self, config: &SimulationConfig) -> Result<(), SimulationError> {
        config.check_modes()?;
        validate_project(self).map_err(SimulationError::InvalidModel)?;
        self.initialize();
        self.calendar = config.calendar.clone();
        Ok(())
    }

    fn run(&mut self, config: &SimulationConfig) -> ProjectStatus {
        let mut rng = config.rng();
        log::debug!(
            "simulating {}: {} tasks, {} workers, {} facilities",
            self.name,
            self.tasks.len(),
            self.workers.len(),
            self.facilities.len()
        );

        loop {
            self.update(config.error_tolerance);

            if self.is_all_finished() {
                log::debug!("{} finished at time {}", self.name, self.time);
                self.status = ProjectStatus::FinishedSuccess;
                return self.status;
            }
            if self.time >= config.max_time {
                log::warn!(
                    "{} reached max_time {} before every task finished",
                    self.name,
                    config.max_time
                );
                self.status = ProjectStatus::FinishedFailure;
                return self.status;
            }

            let working = self.calendar.is_business_time(self.time);
            self.refresh_resource_states(working);
            if working {
                self.allocate(config);
            }
            self.check_working();
            self.add_labor_cost(working);
            self.perform(working, config.perform_auto_task_while_absence_time, &mut rng);
            self.record_all();
            self.time += 1;
        }
    }

    fn update(&mut self, error_tolerance: f64) {
        self.check_finished(error_tolerance);
        self.refresh_component_states();
        self.check_ready();
        self.refresh_component_states();
        self.update_pert_data(self.time);
    }

    fn refresh_resource_states(&mut self, working: bool) {
        let time = self.time;
        for w in &mut self.workers {
            let absent = !working || w.is_absent_at(time);
            w.activity.refresh_state(absent);
        }
        for f in &mut self.facilities {
            let absent = !working || f.is_absent_at(time);
            f.activity.refresh_state(absent);
        }
    }

    fn add_labor_cost(&mut self, working: bool) {
        let add_zero = !working;
        let mut total = 0.0;
        for w in &mut self.workers {
            total += w.activity.add_labor_cost(w.cost_per_time, add_zero);
        }
        for f in &mut self.facilities {
            total += f.activity.add_labor_cost(f.cost_per_time, add_zero);
        }

        let last = |log: &[f64]| log.last().copied().unwrap_or(0.0);
        for team in &mut self.teams {
            let cost: f64 = team
                .worker_ids
                .iter()
                .map(|w| last(&self.workers[w.0].activity.cost_record))
                .sum();
            team.cost_record.push(cost);
        }
        for wp in &mut self.workplaces {
            let cost: f64 = wp
                .facility_ids
                .iter()
                .map(|f| last(&self.facilities[f.0].activity.cost_record))
                .sum();
            wp.cost_record.push(cost);
        }
        self.cost_record.push(total);
    }

    fn perform(&mut self, working: bool, auto_during_absence: bool, rng: &mut StdRng) {
        for i in 0..self.tasks.len() {
            let id = TaskId(i);
            let task = &self.tasks[i];
            if !task.state.is_working() {
                continue;
            }
            let progress = if task.auto_task {
                if working || auto_during_absence {
                    task.work_amount_progress_of_unit_step_time
                } else {
                    0.0
                }
            } else if working {
                self.resource_progress(id, rng)
            } else {
                0.0
            };

            let task = &mut self.tasks[i];
            task.remaining_work_amount = (task.remaining_work_amount - progress).max(0.0);

            if progress > 0.0 {
                if let Some(c) = self.tasks[i].target_component {
                    let no_error_probability = 1.0 - self.quality_skill_sum(id);
                    self.components[c.0].update_error_value(no_error_probability, rng);
                }
            }
        }
    }

    /// Work done on a task this step by its non-absent resources.
    ///
    /// Each draw is divided by the number of working tasks its resource is
    /// assigned to.
    fn resource_progress(&self, id: TaskId, rng: &mut StdRng) -> f64 {
        let task = &self.tasks[id.0];
        let share = |activity: &ResourceActivity| {
            activity
                .assigned_task_ids
                .iter()
                .filter(|t| self.tasks[t.0].state.is_working())
                .count()
                .max(1) as f64
        };

        if task.need_facility {
            task.allocated_pairs
                .iter()
                .map(|&(w, f)| {
                    let worker = &self.workers[w.0];
                    let facility = &self.facilities[f.0];
                    if worker.state() == ResourceState::Absence
                        || facility.state() == ResourceState::Absence
                    {
                        return 0.0;
                    }
                    let w_part = worker.skills().sample(&task.name, rng) / share(&worker.activity);
                    let f_part =
                        facility.skills().sample(&task.name, rng) / share(&facility.activity);
                    w_part * f_part
                })
                .sum()
        } else {
            task.allocated_worker_ids
                .iter()
                .map(|w| &self.workers[w.0])
                .filter(|worker| worker.state() != ResourceState::Absence)
                .map(|worker| worker.skills().sample(&task.name, rng) / share(&worker.activity))
                .sum()
        }
    }

    fn quality_skill_sum(&self, id: TaskId) -> f64 {
        let task = &self.tasks[id.0];
        task.allocated_worker_ids
            .iter()
            .map(|w| self.workers[w.0].quality_skill(&task.name))
            .sum()
    }

    fn record_all(&mut self) {
        for t in &mut self.tasks {
            t.record();
        }
        for c in &mut self.components {
            c.record();
        }
        for w in &mut self.workers {
            w.activity.record();
        }
        for f in &mut self.facilities {
            f.activity.record();
        }
        for wp in &mut self.workplaces {
            wp.record_placed_component();
        }
    }
}

/// Reverses task and conveyor edges for the lifetime of the guard.
///
/// On drop, filler tasks are truncated away and the original edges are put
/// back.
struct EdgeReversal<'a> {
    project: &'a mut Project,
    task_edges: Vec<(Vec<Dependency>, Vec<Dependency>)>,
    conveyor_edges: Vec<(BTreeSet<WorkplaceId>, BTreeSet<WorkplaceId>)>,
    task_count: usize,
    workflow_lengths: Vec<usize>,
}

impl<'a> EdgeReversal<'a> {
    fn apply(project: &'a mut Project) -> Self {
        let task_edges = project
            .tasks
            .iter()
            .map(|t| (t.input_dependencies.clone(), t.output_dependencies.clone()))
            .collect();
        let conveyor_edges = project
            .workplaces
            .iter()
            .map(|w| (w.input_workplace_ids.clone(), w.output_workplace_ids.clone()))
            .collect();
        let task_count = project.tasks.len();
        let workflow_lengths = project.workflows.iter().map(|w| w.task_ids.len()).collect();

        for task in &mut project.tasks {
            task.reverse_dependencies();
        }
        for wp in &mut project.workplaces {
            wp.reverse_conveyor();
        }

        Self {
            project,
            task_edges,
            conveyor_edges,
            task_count,
            workflow_lengths,
        }
    }

    /// Pads early-due tail tasks so every tail ends on the latest due time.
    fn add_due_time_fillers(&mut self) -> Result<(), SimulationError> {
        // Original tails are heads of the reversed graph
        let tails: Vec<(TaskId, usize)> = (0..self.task_count)
            .filter_map(|i| {
                let task = &self.project.tasks[i];
                match (task.is_head(), task.due_time) {
                    (true, Some(due)) => Some((TaskId(i), due)),
                    _ => None,
                }
            })
            .collect();
        let Some(latest) = tails.iter().map(|(_, due)| *due).max() else {
            return Ok(());
        };

        for (tail, due) in tails {
            if due >= latest {
                continue;
            }
            let Some(workflow) = self.project.tasks[tail.0].parent_workflow else {
                log::warn!(
                    "task {} has no workflow; no due time filler added",
                    self.project.tasks[tail.0].name
                );
                continue;
            };
            let filler = Task::new(format!("{}_due_filler", self.project.tasks[tail.0].name))
                .with_work_amount((latest - due) as f64)
                .auto(1.0);
            let filler = self.project.add_task(workflow, filler)?;
            self.project
                .add_dependency(filler, tail, DependencyKind::FinishToStart)?;
        }
        self.project.initialize();
        Ok(())
    }
}

impl Drop for EdgeReversal<'_> {
    fn drop(&mut self) {
        let project = &mut *self.project;
        project.tasks.truncate(self.task_count);
        for (wf, &len) in project.workflows.iter_mut().zip(&self.workflow_lengths) {
            wf.task_ids.truncate(len);
        }
        for (task, (input, output)) in project.tasks.iter_mut().zip(self.task_edges.drain(..)) {
            task.input_dependencies = input;
            task.output_dependencies = output;
        }
        for (wp, (input, output)) in project
            .workplaces
            .iter_mut()
            .zip(self.conveyor_edges.drain(..))
        {
            wp.input_workplace_ids = input;
            wp.output_workplace_ids = output;
        }
    }
}
