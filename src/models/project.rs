//! Project arena.
//!
//! [`Project`] owns every entity of a simulation model in flat vectors and
//! exposes the construction API that keeps both sides of each relation in
//! sync (task ↔ task, task ↔ component, task ↔ team, task ↔ workplace,
//! workplace ↔ workplace). Entities are addressed by typed handles and can
//! be indexed directly: `project[task_id]`.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

use super::{
    Calendar, Component, ComponentId, Dependency, DependencyKind, Facility, FacilityId, Product,
    ProductId, Task, TaskId, TaskState, Team, TeamId, Worker, WorkerId, Workflow, WorkflowId,
    Workplace, WorkplaceId,
};
use crate::error::ModelError;

/// Direction the last simulation ran in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SimulationMode {
    /// Not simulated yet.
    #[default]
    None,
    /// Forward run (earliest schedule).
    Forward,
    /// Backward run (latest schedule).
    Backward,
}

/// Outcome of the last simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProjectStatus {
    /// Not simulated yet.
    #[default]
    None,
    /// Every task finished.
    FinishedSuccess,
    /// `max_time` reached before every task finished.
    FinishedFailure,
}

/// A complete simulation model: product, workflow and organization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Project {
    /// Project name.
    pub name: String,
    /// Task arena.
    pub tasks: Vec<Task>,
    /// Component arena.
    pub components: Vec<Component>,
    /// Worker arena.
    pub workers: Vec<Worker>,
    /// Facility arena.
    pub facilities: Vec<Facility>,
    /// Team arena.
    pub teams: Vec<Team>,
    /// Workplace arena.
    pub workplaces: Vec<Workplace>,
    /// Workflow arena.
    pub workflows: Vec<Workflow>,
    /// Product arena.
    pub products: Vec<Product>,

    /// Current logical time.
    pub time: usize,
    /// Total cost per recorded step.
    pub cost_record: Vec<f64>,
    /// Business-time calendar of the last run.
    pub calendar: Calendar,
    /// Direction of the last run.
    pub simulation_mode: SimulationMode,
    /// Outcome of the last run.
    pub status: ProjectStatus,
}

macro_rules! arena_index {
    ($id:ty, $entity:ty, $field:ident) => {
        impl Index<$id> for Project {
            type Output = $entity;

            fn index(&self, id: $id) -> &$entity {
                &self.$field[id.0]
            }
        }

        impl IndexMut<$id> for Project {
            fn index_mut(&mut self, id: $id) -> &mut $entity {
                &mut self.$field[id.0]
            }
        }
    };
}

arena_index!(TaskId, Task, tasks);
arena_index!(ComponentId, Component, components);
arena_index!(WorkerId, Worker, workers);
arena_index!(FacilityId, Facility, facilities);
arena_index!(TeamId, Team, teams);
arena_index!(WorkplaceId, Workplace, workplaces);
arena_index!(WorkflowId, Workflow, workflows);
arena_index!(ProductId, Product, products);

fn ensure(kind: &'static str, index: usize, len: usize) -> Result<(), ModelError> {
    if index < len {
        Ok(())
    } else {
        Err(ModelError::UnknownEntity { kind, index })
    }
}

impl Project {
    /// Creates an empty project.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    // ======================== Entities ========================

    /// Adds a workflow.
    pub fn add_workflow(&mut self, workflow: Workflow) -> WorkflowId {
        self.workflows.push(workflow);
        WorkflowId(self.workflows.len() - 1)
    }

    /// Adds a task to a workflow.
    pub fn add_task(&mut self, workflow: WorkflowId, mut task: Task) -> Result<TaskId, ModelError> {
        ensure(WorkflowId::KIND, workflow.0, self.workflows.len())?;
        task.parent_workflow = Some(workflow);
        self.tasks.push(task);
        let id = TaskId(self.tasks.len() - 1);
        self.workflows[workflow.0].task_ids.push(id);
        Ok(id)
    }

    /// Adds a product.
    pub fn add_product(&mut self, product: Product) -> ProductId {
        self.products.push(product);
        ProductId(self.products.len() - 1)
    }

    /// Adds a component to a product.
    pub fn add_component(
        &mut self,
        product: ProductId,
        mut component: Component,
    ) -> Result<ComponentId, ModelError> {
        ensure(ProductId::KIND, product.0, self.products.len())?;
        component.parent_product = Some(product);
        self.components.push(component);
        let id = ComponentId(self.components.len() - 1);
        self.products[product.0].component_ids.push(id);
        Ok(id)
    }

    /// Adds a team.
    pub fn add_team(&mut self, team: Team) -> TeamId {
        self.teams.push(team);
        TeamId(self.teams.len() - 1)
    }

    /// Adds a worker to a team.
    pub fn add_worker(&mut self, team: TeamId, mut worker: Worker) -> Result<WorkerId, ModelError> {
        ensure(TeamId::KIND, team.0, self.teams.len())?;
        worker.team = Some(team);
        self.workers.push(worker);
        let id = WorkerId(self.workers.len() - 1);
        self.teams[team.0].worker_ids.insert(id);
        Ok(id)
    }

    /// Adds a workplace.
    pub fn add_workplace(&mut self, workplace: Workplace) -> WorkplaceId {
        self.workplaces.push(workplace);
        WorkplaceId(self.workplaces.len() - 1)
    }

    /// Installs a facility at a workplace.
    pub fn add_facility(
        &mut self,
        workplace: WorkplaceId,
        mut facility: Facility,
    ) -> Result<FacilityId, ModelError> {
        ensure(WorkplaceId::KIND, workplace.0, self.workplaces.len())?;
        facility.workplace = Some(workplace);
        self.facilities.push(facility);
        let id = FacilityId(self.facilities.len() - 1);
        self.workplaces[workplace.0].facility_ids.insert(id);
        Ok(id)
    }

    // ======================== Relations ========================

    /// Makes `successor` depend on `predecessor`.
    ///
    /// Re-adding an edge between the same pair is ignored with a warning.
    pub fn add_dependency(
        &mut self,
        predecessor: TaskId,
        successor: TaskId,
        kind: DependencyKind,
    ) -> Result<(), ModelError> {
        ensure(TaskId::KIND, predecessor.0, self.tasks.len())?;
        ensure(TaskId::KIND, successor.0, self.tasks.len())?;
        if predecessor == successor {
            return Err(ModelError::SelfDependency(predecessor.0));
        }
        if self.tasks[successor.0]
            .input_dependencies
            .iter()
            .any(|d| d.task == predecessor)
        {
            log::warn!(
                "dependency {} -> {} already exists; ignored",
                self.tasks[predecessor.0].name,
                self.tasks[successor.0].name
            );
            return Ok(());
        }
        self.tasks[successor.0]
            .input_dependencies
            .push(Dependency::new(predecessor, kind));
        self.tasks[predecessor.0]
            .output_dependencies
            .push(Dependency::new(successor, kind));
        Ok(())
    }

    /// Sets the component a task works on.
    pub fn set_target_component(
        &mut self,
        task: TaskId,
        component: ComponentId,
    ) -> Result<(), ModelError> {
        ensure(TaskId::KIND, task.0, self.tasks.len())?;
        ensure(ComponentId::KIND, component.0, self.components.len())?;
        match self.tasks[task.0].target_component {
            Some(current) if current == component => {
                log::warn!(
                    "task {} already targets component {}; ignored",
                    self.tasks[task.0].name,
                    self.components[component.0].name
                );
                return Ok(());
            }
            Some(current) => {
                self.components[current.0].targeted_task_ids.remove(&task);
            }
            None => {}
        }
        self.tasks[task.0].target_component = Some(component);
        self.components[component.0].targeted_task_ids.insert(task);
        Ok(())
    }

    /// Attaches `child` under `parent` in the component tree.
    pub fn add_child_component(
        &mut self,
        parent: ComponentId,
        child: ComponentId,
    ) -> Result<(), ModelError> {
        ensure(ComponentId::KIND, parent.0, self.components.len())?;
        ensure(ComponentId::KIND, child.0, self.components.len())?;
        match self.components[child.0].parent {
            Some(p) if p == parent => {
                log::warn!(
                    "component {} is already a child of {}; ignored",
                    self.components[child.0].name,
                    self.components[parent.0].name
                );
                return Ok(());
            }
            Some(p) => {
                return Err(ModelError::ParentAlreadySet {
                    parent: p.0,
                    child: child.0,
                })
            }
            None => {}
        }
        // Walk up from parent; reaching child means a cycle
        let mut cursor = Some(parent);
        while let Some(c) = cursor {
            if c == child {
                return Err(ModelError::ComponentCycle {
                    parent: parent.0,
                    child: child.0,
                });
            }
            cursor = self.components[c.0].parent;
        }
        self.components[child.0].parent = Some(parent);
        self.components[parent.0].child_ids.insert(child);
        Ok(())
    }

    /// Authorizes a team's workers to perform a task.
    pub fn assign_team(&mut self, task: TaskId, team: TeamId) -> Result<(), ModelError> {
        ensure(TaskId::KIND, task.0, self.tasks.len())?;
        ensure(TeamId::KIND, team.0, self.teams.len())?;
        if !self.tasks[task.0].allocated_team_ids.insert(team) {
            log::warn!(
                "team {} already assigned to task {}; ignored",
                self.teams[team.0].name,
                self.tasks[task.0].name
            );
        }
        self.teams[team.0].targeted_task_ids.insert(task);
        Ok(())
    }

    /// Authorizes a workplace to host a task.
    pub fn assign_workplace(
        &mut self,
        task: TaskId,
        workplace: WorkplaceId,
    ) -> Result<(), ModelError> {
        ensure(TaskId::KIND, task.0, self.tasks.len())?;
        ensure(WorkplaceId::KIND, workplace.0, self.workplaces.len())?;
        if !self.tasks[task.0].allocated_workplace_ids.insert(workplace) {
            log::warn!(
                "workplace {} already assigned to task {}; ignored",
                self.workplaces[workplace.0].name,
                self.tasks[task.0].name
            );
        }
        self.workplaces[workplace.0].targeted_task_ids.insert(task);
        Ok(())
    }

    /// Sets a team's parent team.
    pub fn set_parent_team(&mut self, child: TeamId, parent: TeamId) -> Result<(), ModelError> {
        ensure(TeamId::KIND, child.0, self.teams.len())?;
        ensure(TeamId::KIND, parent.0, self.teams.len())?;
        self.teams[child.0].parent = Some(parent);
        Ok(())
    }

    /// Sets a workplace's parent workplace.
    pub fn set_parent_workplace(
        &mut self,
        child: WorkplaceId,
        parent: WorkplaceId,
    ) -> Result<(), ModelError> {
        ensure(WorkplaceId::KIND, child.0, self.workplaces.len())?;
        ensure(WorkplaceId::KIND, parent.0, self.workplaces.len())?;
        self.workplaces[child.0].parent = Some(parent);
        Ok(())
    }

    /// Adds a conveyor edge: components flow from `from` into `to`.
    pub fn connect_workplaces(
        &mut self,
        from: WorkplaceId,
        to: WorkplaceId,
    ) -> Result<(), ModelError> {
        ensure(WorkplaceId::KIND, from.0, self.workplaces.len())?;
        ensure(WorkplaceId::KIND, to.0, self.workplaces.len())?;
        if !self.workplaces[to.0].input_workplace_ids.insert(from) {
            log::warn!(
                "conveyor {} -> {} already exists; ignored",
                self.workplaces[from.0].name,
                self.workplaces[to.0].name
            );
        }
        self.workplaces[from.0].output_workplace_ids.insert(to);
        Ok(())
    }

    // ======================== Queries ========================

    /// Finds a task by name.
    pub fn task_by_name(&self, name: &str) -> Option<TaskId> {
        self.tasks.iter().position(|t| t.name == name).map(TaskId)
    }

    /// Finds a worker by name.
    pub fn worker_by_name(&self, name: &str) -> Option<WorkerId> {
        self.workers.iter().position(|w| w.name == name).map(WorkerId)
    }

    /// All task handles.
    pub fn task_ids(&self) -> impl Iterator<Item = TaskId> {
        (0..self.tasks.len()).map(TaskId)
    }

    /// Whether every task is finished.
    pub fn is_all_finished(&self) -> bool {
        self.tasks.iter().all(|t| t.state == TaskState::Finished)
    }

    /// States of the tasks targeting a component.
    pub fn targeted_task_states(&self, component: ComponentId) -> Vec<TaskState> {
        self.components[component.0]
            .targeted_task_ids
            .iter()
            .map(|t| self.tasks[t.0].state)
            .collect()
    }

    /// A component followed by all of its descendants (pre-order).
    pub fn component_subtree(&self, root: ComponentId) -> Vec<ComponentId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(c) = stack.pop() {
            out.push(c);
            stack.extend(self.components[c.0].child_ids.iter().rev().copied());
        }
        out
    }

    /// Occupied space at a workplace.
    pub fn used_space(&self, workplace: WorkplaceId) -> f64 {
        self.workplaces[workplace.0]
            .placed_component_ids
            .iter()
            .map(|c| self.components[c.0].space_size)
            .sum()
    }

    /// Free space at a workplace.
    pub fn free_space(&self, workplace: WorkplaceId) -> f64 {
        self.workplaces[workplace.0].max_space_size - self.used_space(workplace)
    }

    /// Sum of facility skill means for `task_name` at a workplace.
    ///
    /// Only facilities that actually have the skill are counted.
    pub fn total_workamount_skill(&self, workplace: WorkplaceId, task_name: &str) -> f64 {
        self.workplaces[workplace.0]
            .facility_ids
            .iter()
            .map(|f| &self.facilities[f.0].workamount_skills)
            .filter(|s| s.has_skill(task_name))
            .filter_map(|s| s.mean_of(task_name))
            .sum()
    }

    /// Total recorded cost.
    pub fn total_cost(&self) -> f64 {
        self.cost_record.iter().sum()
    }

    // ======================== Lifecycle ========================

    /// Resets time, cost history, status and every entity's run state.
    pub fn initialize(&mut self) {
        self.time = 0;
        self.cost_record.clear();
        self.status = ProjectStatus::None;
        self.simulation_mode = SimulationMode::None;
        self.tasks.iter_mut().for_each(Task::initialize);
        self.components.iter_mut().for_each(Component::initialize);
        self.workers.iter_mut().for_each(|w| w.activity.initialize());
        self.facilities
            .iter_mut()
            .for_each(|f| f.activity.initialize());
        self.teams.iter_mut().for_each(Team::initialize);
        self.workplaces.iter_mut().for_each(Workplace::initialize);
        self.workflows
            .iter_mut()
            .for_each(|w| w.critical_path_length = 0.0);
    }
}
