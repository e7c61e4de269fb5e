//! State-transition sweeps.
//!
//! `NONE → READY` depends on predecessors' start/finish, `READY → WORKING`
//! on allocation, `WORKING → FINISHED` on remaining work and the finish-gating
//! dependency kinds (FF, SF).

use crate::models::{
    ComponentId, ComponentState, DependencyKind, Project, Resource, ResourceActivity,
    ResourceState, Task, TaskId, TaskState,
};

impl Project {
    /// Promotes NONE tasks whose start-gating predecessors are satisfied.
    ///
    /// FS requires the predecessor FINISHED, SS requires it started. FF and
    /// SF only gate finishing.
    pub(crate) fn check_ready(&mut self) {
        for i in 0..self.tasks.len() {
            if self.tasks[i].state != TaskState::None {
                continue;
            }
            let startable = self.tasks[i].input_dependencies.iter().all(|dep| {
                let pred = self.tasks[dep.task.0].state;
                match dep.kind {
                    DependencyKind::FinishToStart => pred == TaskState::Finished,
                    DependencyKind::StartToStart => pred.has_started(),
                    DependencyKind::FinishToFinish | DependencyKind::StartToFinish => true,
                }
            });
            if startable {
                self.tasks[i].state = TaskState::Ready;
            }
        }
    }

    /// Starts READY tasks that got resources and flips newly bound free
    /// resources of working tasks to WORKING.
    pub(crate) fn check_working(&mut self) {
        for i in 0..self.tasks.len() {
            let state = self.tasks[i].state;
            if state == TaskState::Ready {
                let starts = if self.tasks[i].auto_task {
                    self.auto_task_in_place(TaskId(i))
                } else {
                    !self.tasks[i].allocated_worker_ids.is_empty()
                };
                if starts {
                    self.tasks[i].state = TaskState::Working;
                    self.mark_allocated_working(TaskId(i));
                }
            } else if state.is_working() {
                self.mark_allocated_working(TaskId(i));
            }
        }
    }

    /// Whether an auto task's component sits in one of its workplaces.
    fn auto_task_in_place(&self, id: TaskId) -> bool {
        let task = &self.tasks[id.0];
        let Some(component) = task.target_component else {
            return true;
        };
        if task.allocated_workplace_ids.is_empty() {
            return true;
        }
        self.components[component.0]
            .placed_workplace
            .is_some_and(|wp| task.allocated_workplace_ids.contains(&wp))
    }

    fn mark_allocated_working(&mut self, id: TaskId) {
        let (workers, facilities) = {
            let task = &self.tasks[id.0];
            (
                task.allocated_worker_ids.clone(),
                task.allocated_facility_ids.clone(),
            )
        };
        for w in workers {
            let activity = self.workers[w.0].activity_mut();
            if activity.state == ResourceState::Free {
                activity.state = ResourceState::Working;
            }
        }
        for f in facilities {
            let activity = self.facilities[f.0].activity_mut();
            if activity.state == ResourceState::Free {
                activity.state = ResourceState::Working;
            }
        }
    }

    /// Finishes working tasks with no remaining work whose finish-gating
    /// predecessors allow it, then releases fully finished resources.
    pub(crate) fn check_finished(&mut self, error_tolerance: f64) {
        for i in 0..self.tasks.len() {
            let task = &self.tasks[i];
            if !task.state.is_working() || task.remaining_work_amount >= error_tolerance {
                continue;
            }
            let finishable = task.input_dependencies.iter().all(|dep| {
                let pred = self.tasks[dep.task.0].state;
                match dep.kind {
                    DependencyKind::FinishToStart | DependencyKind::StartToStart => true,
                    DependencyKind::StartToFinish => pred.has_started(),
                    DependencyKind::FinishToFinish => pred == TaskState::Finished,
                }
            });
            if !finishable {
                continue;
            }

            let task = &mut self.tasks[i];
            task.state = TaskState::Finished;
            task.remaining_work_amount = 0.0;
            self.release_finished_resources(TaskId(i));
        }
    }

    /// Detaches a finished task from its resources.
    ///
    /// Every resource drops the task from its assignment set. A resource with
    /// nothing left but finished tasks goes back to FREE.
    fn release_finished_resources(&mut self, id: TaskId) {
        let task = &mut self.tasks[id.0];
        let workers = std::mem::take(&mut task.allocated_worker_ids);
        let facilities = std::mem::take(&mut task.allocated_facility_ids);
        task.allocated_pairs.clear();

        for w in workers {
            let activity = self.workers[w.0].activity_mut();
            activity.assigned_task_ids.remove(&id);
            release_if_done(activity, &self.tasks);
        }
        for f in facilities {
            let activity = self.facilities[f.0].activity_mut();
            activity.assigned_task_ids.remove(&id);
            release_if_done(activity, &self.tasks);
        }
    }

    /// Releases finished components from their workplaces, then derives
    /// every component's state from its targeted tasks.
    pub(crate) fn refresh_component_states(&mut self) {
        for i in 0..self.components.len() {
            let component = &self.components[i];
            let Some(wp) = component.placed_workplace else {
                continue;
            };
            let states = self.targeted_task_states(ComponentId(i));
            if !all_finished(&states) {
                continue;
            }
            // A child travels with a parent placed at the same workplace
            let parent_here = component
                .parent
                .is_some_and(|p| self.components[p.0].placed_workplace == Some(wp));
            if parent_here {
                continue;
            }

            for c in self.component_subtree(ComponentId(i)) {
                if self.components[c.0].placed_workplace != Some(wp) {
                    continue;
                }
                self.workplaces[wp.0].placed_component_ids.remove(&c);
                self.components[c.0].placed_workplace = None;
                if all_finished(&self.targeted_task_states(c)) {
                    self.components[c.0].state = ComponentState::Removed;
                }
            }
            log::trace!("released component {} from workplace {}", self.components[i].name, wp);
        }

        for i in 0..self.components.len() {
            let states = self.targeted_task_states(ComponentId(i));
            self.components[i].refresh_state(&states);
        }
    }
}

fn release_if_done(activity: &mut ResourceActivity, tasks: &[Task]) {
    let done = activity
        .assigned_task_ids
        .iter()
        .all(|t| tasks[t.0].state == TaskState::Finished);
    if done {
        activity.assigned_task_ids.clear();
        activity.state = ResourceState::Free;
    }
}

fn all_finished(states: &[TaskState]) -> bool {
    !states.is_empty() && states.iter().all(|s| *s == TaskState::Finished)
}

#[cfg(test)]
mod tests {
    use crate::models::{
        Component, ComponentState, DependencyKind, Product, Project, ResourceState, Task,
        TaskId, TaskState, Team, Worker, WorkerId, Workflow, Workplace,
    };

    fn pair(kind: DependencyKind) -> (Project, TaskId, TaskId) {
        let mut p = Project::new("p");
        let wf = p.add_workflow(Workflow::new("wf"));
        let a = p.add_task(wf, Task::new("a")).unwrap();
        let b = p.add_task(wf, Task::new("b")).unwrap();
        p.add_dependency(a, b, kind).unwrap();
        (p, a, b)
    }

    #[test]
    fn test_ready_fs_waits_for_finish() {
        let (mut p, a, b) = pair(DependencyKind::FinishToStart);
        p.check_ready();
        assert_eq!(p[a].state, TaskState::Ready);
        assert_eq!(p[b].state, TaskState::None);

        p[a].state = TaskState::Working;
        p.check_ready();
        assert_eq!(p[b].state, TaskState::None);

        p[a].state = TaskState::Finished;
        p.check_ready();
        assert_eq!(p[b].state, TaskState::Ready);
    }

    #[test]
    fn test_ready_ss_waits_for_start() {
        let (mut p, a, b) = pair(DependencyKind::StartToStart);
        p.check_ready();
        assert_eq!(p[b].state, TaskState::None);
        p[a].state = TaskState::Working;
        p.check_ready();
        assert_eq!(p[b].state, TaskState::Ready);
    }

    #[test]
    fn test_ready_ff_sf_do_not_gate_start() {
        for kind in [DependencyKind::FinishToFinish, DependencyKind::StartToFinish] {
            let (mut p, _, b) = pair(kind);
            p.check_ready();
            assert_eq!(p[b].state, TaskState::Ready);
        }
    }

    fn working_with_worker(kind: DependencyKind) -> (Project, TaskId, TaskId, WorkerId) {
        let (mut p, a, b) = pair(kind);
        let team = p.add_team(Team::new("team"));
        let w = p.add_worker(team, Worker::new("w")).unwrap();
        p[b].state = TaskState::Working;
        p[b].remaining_work_amount = 0.0;
        p[b].allocated_worker_ids.insert(w);
        p[w].activity.assigned_task_ids.insert(b);
        p[w].activity.state = ResourceState::Working;
        (p, a, b, w)
    }

    #[test]
    fn test_finish_ff_waits_for_predecessor() {
        let (mut p, a, b, w) = working_with_worker(DependencyKind::FinishToFinish);
        p.check_finished(1e-10);
        assert_eq!(p[b].state, TaskState::Working);

        p[a].state = TaskState::Finished;
        p.check_finished(1e-10);
        assert_eq!(p[b].state, TaskState::Finished);
        assert!(p[b].allocated_worker_ids.is_empty());
        assert_eq!(p[w].activity.state, ResourceState::Free);
        assert!(p[w].activity.assigned_task_ids.is_empty());
    }

    #[test]
    fn test_finish_sf_accepts_working_or_finished() {
        let (mut p, a, b, _) = working_with_worker(DependencyKind::StartToFinish);
        p.check_finished(1e-10);
        assert_eq!(p[b].state, TaskState::Working);

        p[a].state = TaskState::Working;
        p.check_finished(1e-10);
        assert_eq!(p[b].state, TaskState::Finished);
    }

    #[test]
    fn test_finish_respects_tolerance() {
        let (mut p, a, b, _) = working_with_worker(DependencyKind::FinishToStart);
        p[a].state = TaskState::Finished;
        p[b].remaining_work_amount = 0.5;
        p.check_finished(1e-10);
        assert_eq!(p[b].state, TaskState::Working);
    }

    #[test]
    fn test_finish_keeps_shared_resource() {
        let (mut p, a, b, w) = working_with_worker(DependencyKind::StartToStart);
        // Worker is also bound to a still-working task
        p[a].state = TaskState::Working;
        p[a].allocated_worker_ids.insert(w);
        p[w].activity.assigned_task_ids.insert(a);

        p.check_finished(1e-10);
        assert_eq!(p[b].state, TaskState::Finished);
        assert!(p[b].allocated_worker_ids.is_empty());
        assert_eq!(p[w].activity.state, ResourceState::Working);
        assert_eq!(
            p[w].activity.assigned_task_ids.iter().copied().collect::<Vec<_>>(),
            vec![a]
        );
        assert!(p[a].allocated_worker_ids.contains(&w));
    }

    #[test]
    fn test_working_needs_workers() {
        let (mut p, a, _) = pair(DependencyKind::FinishToStart);
        let team = p.add_team(Team::new("team"));
        let w = p.add_worker(team, Worker::new("w")).unwrap();
        p[a].state = TaskState::Ready;
        p.check_working();
        assert_eq!(p[a].state, TaskState::Ready);

        p[a].allocated_worker_ids.insert(w);
        p[w].activity.assigned_task_ids.insert(a);
        p.check_working();
        assert_eq!(p[a].state, TaskState::Working);
        assert_eq!(p[w].activity.state, ResourceState::Working);
    }

    #[test]
    fn test_auto_task_waits_for_placement() {
        let mut p = Project::new("p");
        let wf = p.add_workflow(Workflow::new("wf"));
        let t = p.add_task(wf, Task::new("cure").auto(1.0)).unwrap();
        let prod = p.add_product(Product::new("prod"));
        let c = p.add_component(prod, Component::new("c")).unwrap();
        let wp = p.add_workplace(Workplace::new("wp"));
        p.set_target_component(t, c).unwrap();
        p.assign_workplace(t, wp).unwrap();

        p[t].state = TaskState::Ready;
        p.check_working();
        assert_eq!(p[t].state, TaskState::Ready);

        p[c].placed_workplace = Some(wp);
        p.check_working();
        assert_eq!(p[t].state, TaskState::Working);
    }

    #[test]
    fn test_finished_component_released() {
        let mut p = Project::new("p");
        let wf = p.add_workflow(Workflow::new("wf"));
        let t = p.add_task(wf, Task::new("t")).unwrap();
        let prod = p.add_product(Product::new("prod"));
        let parent = p.add_component(prod, Component::new("parent")).unwrap();
        let child = p.add_component(prod, Component::new("child")).unwrap();
        p.add_child_component(parent, child).unwrap();
        p.set_target_component(t, parent).unwrap();
        let wp = p.add_workplace(Workplace::new("wp").with_max_space_size(2.0));
        for c in [parent, child] {
            p[c].placed_workplace = Some(wp);
            p[wp].placed_component_ids.insert(c);
        }

        p.refresh_component_states();
        assert_eq!(p[parent].state, ComponentState::None);
        assert_eq!(p[wp].placed_component_ids.len(), 2);

        p[t].state = TaskState::Finished;
        p.refresh_component_states();
        assert!(p[wp].placed_component_ids.is_empty());
        assert_eq!(p[parent].placed_workplace, None);
        assert_eq!(p[child].placed_workplace, None);
        assert_eq!(p[parent].state, ComponentState::Removed);
        // Child has no targeting tasks, so it is not removed
        assert_eq!(p[child].state, ComponentState::None);
    }
}
