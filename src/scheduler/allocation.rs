//! Greedy, non-backtracking allocation of workplaces, facilities and workers.
//!
//! Tasks are visited in task-priority order. Each task first tries to place
//! its target component, then binds resources from the step's free pools.
//! A resource bound to one task is gone from the pool for every later task
//! in the same pass.

use std::collections::BTreeSet;

use super::simulation::{SimulationConfig, TaskPerformedMode};
use crate::dispatching::RuleContext;
use crate::models::{
    is_ready_for_placement, ComponentId, FacilityId, Project, Resource, ResourceState, TaskId,
    TaskState, WorkerId, WorkplaceId, SKILL_EPSILON,
};

impl Project {
    /// Runs one allocation pass over READY and working tasks.
    pub(crate) fn allocate(&mut self, config: &SimulationConfig) {
        let mut free_workers: Vec<WorkerId> = (0..self.workers.len())
            .map(WorkerId)
            .filter(|w| self.workers[w.0].activity.state == ResourceState::Free)
            .collect();
        let mut free_facilities: Vec<FacilityId> = (0..self.facilities.len())
            .map(FacilityId)
            .filter(|f| self.facilities[f.0].activity.state == ResourceState::Free)
            .collect();

        let mut candidates: Vec<TaskId> = self
            .task_ids()
            .filter(|t| {
                let state = self.tasks[t.0].state;
                state == TaskState::Ready || state.is_working()
            })
            .collect();
        config
            .task_priority_rule
            .sort(&mut candidates, &RuleContext::new(self));

        for id in candidates {
            self.place_target_component(id);
            if self.tasks[id.0].auto_task {
                continue;
            }
            if self.tasks[id.0].need_facility {
                self.bind_facility_pairs(
                    id,
                    &mut free_workers,
                    &mut free_facilities,
                    config.task_performed_mode,
                );
            } else {
                self.bind_workers(id, &mut free_workers, config.task_performed_mode);
            }
        }
    }

    // ======================== Placement ========================

    /// Moves a task's target component to the best allowed workplace.
    ///
    /// A workplace qualifies when the conveyor admits the component's current
    /// placement, the component subtree fits, and its facilities can perform
    /// the task.
    fn place_target_component(&mut self, id: TaskId) {
        let task = &self.tasks[id.0];
        let Some(component) = task.target_component else {
            return;
        };
        if !is_ready_for_placement(&self.targeted_task_states(component)) {
            return;
        }
        let current = self.components[component.0].placed_workplace;
        if current.is_some_and(|wp| task.allocated_workplace_ids.contains(&wp)) {
            return;
        }

        let mut workplaces: Vec<WorkplaceId> =
            task.allocated_workplace_ids.iter().copied().collect();
        let context = RuleContext::new(self).with_task_name(&task.name);
        task.workplace_priority_rule.sort(&mut workplaces, &context);

        let chosen = workplaces.into_iter().find(|&wp| {
            let workplace = &self.workplaces[wp.0];
            let conveyor_ok = match current {
                None => true,
                Some(from) => {
                    workplace.input_workplace_ids.is_empty()
                        || workplace.input_workplace_ids.contains(&from)
                }
            };
            conveyor_ok
                && workplace.can_put(self.used_space(wp), self.required_space(component, wp))
                && self.total_workamount_skill(wp, &task.name) > SKILL_EPSILON
        });

        if let Some(wp) = chosen {
            log::trace!(
                "placing component {} at workplace {} for task {}",
                self.components[component.0].name,
                self.workplaces[wp.0].name,
                task.name
            );
            self.place_component(component, wp);
        }
    }

    /// Places a component and all of its descendants at `workplace`.
    pub(crate) fn place_component(&mut self, component: ComponentId, workplace: WorkplaceId) {
        for c in self.component_subtree(component) {
            if let Some(previous) = self.components[c.0].placed_workplace.take() {
                self.workplaces[previous.0].placed_component_ids.remove(&c);
            }
            self.components[c.0].placed_workplace = Some(workplace);
            self.workplaces[workplace.0].placed_component_ids.insert(c);
        }
    }

    /// Space a component subtree would add to `workplace`.
    fn required_space(&self, component: ComponentId, workplace: WorkplaceId) -> f64 {
        self.component_subtree(component)
            .into_iter()
            .map(|c| &self.components[c.0])
            .filter(|c| c.placed_workplace != Some(workplace))
            .map(|c| c.space_size)
            .sum()
    }

    // ======================== Binding ========================

    fn worker_eligible(&self, id: TaskId, worker: WorkerId) -> bool {
        let task = &self.tasks[id.0];
        let worker = &self.workers[worker.0];
        worker.has_workamount_skill(&task.name)
            && worker
                .team
                .is_some_and(|team| task.allocated_team_ids.contains(&team))
    }

    fn bind_workers(
        &mut self,
        id: TaskId,
        free_workers: &mut Vec<WorkerId>,
        mode: TaskPerformedMode,
    ) {
        let candidates = {
            let task = &self.tasks[id.0];
            let mut candidates: Vec<WorkerId> = free_workers
                .iter()
                .copied()
                .filter(|&w| self.worker_eligible(id, w))
                .collect();
            let requesting = task
                .target_component
                .and_then(|c| self.components[c.0].placed_workplace);
            let context = RuleContext::new(self)
                .with_task_name(&task.name)
                .with_requesting_workplace(requesting);
            task.worker_priority_rule
                .sort_workers(&mut candidates, &context);
            candidates
        };

        for w in candidates {
            if self.can_add_resources(id, Some(w), None, mode) {
                self.bind(id, Some(w), None);
                free_workers.retain(|x| *x != w);
            }
        }
    }

    fn bind_facility_pairs(
        &mut self,
        id: TaskId,
        free_workers: &mut Vec<WorkerId>,
        free_facilities: &mut Vec<FacilityId>,
        mode: TaskPerformedMode,
    ) {
        let facilities = {
            let task = &self.tasks[id.0];
            let placed = task
                .target_component
                .and_then(|c| self.components[c.0].placed_workplace);
            let workplaces: BTreeSet<WorkplaceId> = match task.target_component {
                Some(_) => placed
                    .into_iter()
                    .filter(|wp| task.allocated_workplace_ids.contains(wp))
                    .collect(),
                None => task.allocated_workplace_ids.clone(),
            };
            let mut facilities: Vec<FacilityId> = free_facilities
                .iter()
                .copied()
                .filter(|f| {
                    let facility = &self.facilities[f.0];
                    facility.workplace.is_some_and(|wp| workplaces.contains(&wp))
                        && facility.has_workamount_skill(&task.name)
                })
                .collect();
            let context = RuleContext::new(self)
                .with_task_name(&task.name)
                .with_requesting_workplace(placed);
            task.facility_priority_rule
                .sort_facilities(&mut facilities, &context);
            facilities
        };

        for f in facilities {
            if !self.can_add_resources(id, None, Some(f), mode) {
                continue;
            }
            let worker = {
                let task = &self.tasks[id.0];
                let facility = &self.facilities[f.0];
                let mut workers: Vec<WorkerId> = free_workers
                    .iter()
                    .copied()
                    .filter(|&w| {
                        self.worker_eligible(id, w)
                            && self.workers[w.0].has_facility_skill(&facility.name)
                    })
                    .collect();
                let context = RuleContext::new(self)
                    .with_task_name(&task.name)
                    .with_requesting_workplace(facility.workplace);
                task.worker_priority_rule.sort_workers(&mut workers, &context);
                workers
                    .into_iter()
                    .find(|&w| self.can_add_resources(id, Some(w), Some(f), mode))
            };
            if let Some(w) = worker {
                self.bind(id, Some(w), Some(f));
                free_workers.retain(|x| *x != w);
                free_facilities.retain(|x| *x != f);
            }
        }
    }

    /// Whether a worker and/or facility may join a task.
    ///
    /// Rejects finished or not-yet-ready tasks, any addition to a task that
    /// already holds a solo resource, a solo resource joining a task that
    /// already has resources of its kind, resources outside the task's fixed
    /// sets, and a second worker under [`TaskPerformedMode::SingleWorker`].
    pub(crate) fn can_add_resources(
        &self,
        id: TaskId,
        worker: Option<WorkerId>,
        facility: Option<FacilityId>,
        mode: TaskPerformedMode,
    ) -> bool {
        let task = &self.tasks[id.0];
        if matches!(task.state, TaskState::None | TaskState::Finished) {
            return false;
        }
        let solo_bound = task
            .allocated_worker_ids
            .iter()
            .any(|w| self.workers[w.0].solo_working)
            || task
                .allocated_facility_ids
                .iter()
                .any(|f| self.facilities[f.0].solo_working);
        if solo_bound {
            return false;
        }

        if let Some(w) = worker {
            if self.workers[w.0].solo_working && !task.allocated_worker_ids.is_empty() {
                return false;
            }
            if let Some(fixed) = &task.fixing_allocating_worker_ids {
                if !fixed.contains(&w) {
                    return false;
                }
            }
            if mode == TaskPerformedMode::SingleWorker && !task.allocated_worker_ids.is_empty() {
                return false;
            }
        }

        if let Some(f) = facility {
            if self.facilities[f.0].solo_working && !task.allocated_facility_ids.is_empty() {
                return false;
            }
            if let Some(fixed) = &task.fixing_allocating_facility_ids {
                if !fixed.contains(&f) {
                    return false;
                }
            }
        }
        true
    }

    fn bind(&mut self, id: TaskId, worker: Option<WorkerId>, facility: Option<FacilityId>) {
        let task = &mut self.tasks[id.0];
        if let Some(w) = worker {
            task.allocated_worker_ids.insert(w);
        }
        if let Some(f) = facility {
            task.allocated_facility_ids.insert(f);
        }
        if let (Some(w), Some(f)) = (worker, facility) {
            task.allocated_pairs.insert((w, f));
        }

        if let Some(w) = worker {
            self.workers[w.0].activity.assigned_task_ids.insert(id);
            log::trace!(
                "worker {} bound to task {}",
                self.workers[w.0].name,
                self.tasks[id.0].name
            );
        }
        if let Some(f) = facility {
            self.facilities[f.0].activity.assigned_task_ids.insert(id);
            log::trace!(
                "facility {} bound to task {}",
                self.facilities[f.0].name,
                self.tasks[id.0].name
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatching::{ResourcePriorityRule, TaskPriorityRule};
    use crate::models::{
        Component, Facility, Product, Task, Team, TeamId, Worker, Workflow, Workplace,
    };

    struct Fixture {
        project: Project,
        team: TeamId,
    }

    fn fixture(tasks: &[&str]) -> Fixture {
        let mut project = Project::new("p");
        let wf = project.add_workflow(Workflow::new("wf"));
        let team = project.add_team(Team::new("team"));
        for name in tasks {
            let t = project.add_task(wf, Task::new(*name)).unwrap();
            project.assign_team(t, team).unwrap();
            project[t].state = TaskState::Ready;
        }
        Fixture { project, team }
    }

    fn skilled(name: &str, tasks: &[&str]) -> Worker {
        tasks
            .iter()
            .fold(Worker::new(name), |w, t| w.with_skill(*t, 1.0, 0.0))
    }

    #[test]
    fn test_worker_goes_to_first_priority_task() {
        let Fixture { mut project, team } = fixture(&["a", "b"]);
        let w = project.add_worker(team, skilled("w", &["a", "b"])).unwrap();
        project[TaskId(1)].default_work_amount = 1.0;

        let config = SimulationConfig::new().with_task_priority_rule(TaskPriorityRule::Spt);
        project.allocate(&config);

        // SPT puts the shorter task "b" first; the worker is consumed there
        assert!(project[TaskId(1)].allocated_worker_ids.contains(&w));
        assert!(project[TaskId(0)].allocated_worker_ids.is_empty());
        assert!(project[w].activity.assigned_task_ids.contains(&TaskId(1)));
    }

    #[test]
    fn test_unskilled_or_unauthorized_worker_skipped() {
        let Fixture { mut project, team } = fixture(&["a"]);
        let other = project.add_team(Team::new("other"));
        project.add_worker(team, Worker::new("novice")).unwrap();
        project.add_worker(other, skilled("outsider", &["a"])).unwrap();

        project.allocate(&SimulationConfig::new());
        assert!(project[TaskId(0)].allocated_worker_ids.is_empty());
    }

    #[test]
    fn test_multi_workers_bind_all_eligible() {
        let Fixture { mut project, team } = fixture(&["a"]);
        project.add_worker(team, skilled("w1", &["a"])).unwrap();
        project.add_worker(team, skilled("w2", &["a"])).unwrap();

        project.allocate(&SimulationConfig::new());
        assert_eq!(project[TaskId(0)].allocated_worker_ids.len(), 2);
    }

    #[test]
    fn test_single_worker_mode_caps_allocation() {
        let Fixture { mut project, team } = fixture(&["a"]);
        project.add_worker(team, skilled("w1", &["a"])).unwrap();
        project.add_worker(team, skilled("w2", &["a"])).unwrap();

        let config =
            SimulationConfig::new().with_task_performed_mode(TaskPerformedMode::SingleWorker);
        project.allocate(&config);
        assert_eq!(project[TaskId(0)].allocated_worker_ids.len(), 1);
    }

    #[test]
    fn test_solo_worker_blocks_others() {
        let Fixture { mut project, team } = fixture(&["a"]);
        let solo = project
            .add_worker(team, skilled("solo", &["a"]).with_solo_working(true))
            .unwrap();
        let other = project.add_worker(team, skilled("other", &["a"])).unwrap();
        project[TaskId(0)].worker_priority_rule = ResourcePriorityRule::Ssp;

        project.allocate(&SimulationConfig::new());
        let allocated = &project[TaskId(0)].allocated_worker_ids;
        assert_eq!(allocated.len(), 1);
        assert!(allocated.contains(&solo));
        assert!(!project.can_add_resources(
            TaskId(0),
            Some(other),
            None,
            TaskPerformedMode::MultiWorkers
        ));
    }

    #[test]
    fn test_fixed_workers_enforced() {
        let Fixture { mut project, team } = fixture(&["a"]);
        let w1 = project.add_worker(team, skilled("w1", &["a"])).unwrap();
        let w2 = project.add_worker(team, skilled("w2", &["a"])).unwrap();
        project[TaskId(0)].fixing_allocating_worker_ids = Some([w2].into_iter().collect());

        project.allocate(&SimulationConfig::new());
        let allocated = &project[TaskId(0)].allocated_worker_ids;
        assert!(allocated.contains(&w2));
        assert!(!allocated.contains(&w1));
    }

    #[test]
    fn test_can_add_rejects_unready_task() {
        let Fixture { mut project, team } = fixture(&["a"]);
        let w = project.add_worker(team, skilled("w", &["a"])).unwrap();
        project[TaskId(0)].state = TaskState::None;
        assert!(!project.can_add_resources(
            TaskId(0),
            Some(w),
            None,
            TaskPerformedMode::MultiWorkers
        ));
    }

    fn placement_project(capacity: f64) -> (Project, TaskId, TaskId, WorkplaceId) {
        let Fixture { mut project, team } = fixture(&["a", "b"]);
        let prod = project.add_product(Product::new("prod"));
        let wp = project.add_workplace(Workplace::new("wp").with_max_space_size(capacity));
        project
            .add_facility(
                wp,
                Facility::new("f").with_skill("a", 1.0, 0.0).with_skill("b", 1.0, 0.0),
            )
            .unwrap();
        for (i, name) in ["a", "b"].iter().enumerate() {
            let c = project
                .add_component(prod, Component::new(format!("c{i}")))
                .unwrap();
            let t = TaskId(i);
            project.set_target_component(t, c).unwrap();
            project.assign_workplace(t, wp).unwrap();
            project[t].need_facility = true;
            project
                .add_worker(
                    team,
                    skilled(&format!("w{i}"), &[*name]).with_facility_skill("f", 1.0),
                )
                .unwrap();
        }
        (project, TaskId(0), TaskId(1), wp)
    }

    #[test]
    fn test_placement_respects_capacity() {
        let (mut project, a, b, wp) = placement_project(1.0);
        project.allocate(&SimulationConfig::new());

        assert_eq!(project[wp].placed_component_ids.len(), 1);
        assert!((project.used_space(wp) - 1.0).abs() < 1e-10);
        assert_eq!(project[ComponentId(0)].placed_workplace, Some(wp));
        assert_eq!(project[ComponentId(1)].placed_workplace, None);
        // Facility task binds a worker/facility pair at the placed workplace
        assert_eq!(project[a].allocated_pairs.len(), 1);
        assert!(project[b].allocated_worker_ids.is_empty());
    }

    #[test]
    fn test_placement_moves_subtree() {
        let (mut project, _, _, wp) = placement_project(3.0);
        let child = project
            .add_component(crate::models::ProductId(0), Component::new("child"))
            .unwrap();
        project.add_child_component(ComponentId(0), child).unwrap();

        project.allocate(&SimulationConfig::new());
        assert_eq!(project[child].placed_workplace, Some(wp));
        assert!((project.used_space(wp) - 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_conveyor_requires_input_workplace() {
        let (mut project, a, _, wp) = placement_project(2.0);
        let upstream = project.add_workplace(Workplace::new("upstream"));
        let elsewhere = project.add_workplace(Workplace::new("elsewhere"));
        project.connect_workplaces(upstream, wp).unwrap();

        // Component sits at a workplace that does not feed `wp`
        project.place_component(ComponentId(0), elsewhere);
        project.allocate(&SimulationConfig::new());
        assert_eq!(project[ComponentId(0)].placed_workplace, Some(elsewhere));
        assert!(project[a].allocated_pairs.is_empty());

        project.place_component(ComponentId(0), upstream);
        project.allocate(&SimulationConfig::new());
        assert_eq!(project[ComponentId(0)].placed_workplace, Some(wp));
    }

    #[test]
    fn test_auto_task_binds_nothing() {
        let Fixture { mut project, team } = fixture(&["a"]);
        project.add_worker(team, skilled("w", &["a"])).unwrap();
        project[TaskId(0)].auto_task = true;

        project.allocate(&SimulationConfig::new());
        assert!(!project[TaskId(0)].has_allocation());
    }
}
