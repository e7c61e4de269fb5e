//! End-to-end simulation scenarios.

use u_pdes::dispatching::TaskPriorityRule;
use u_pdes::models::{
    Component, DependencyKind, Facility, Product, Project, ProjectStatus, SimulationMode, Task,
    TaskId, TaskState, Team, TeamId, Worker, Workflow, WorkflowId, Workplace,
};
use u_pdes::scheduler::{ProjectKpi, SimulationConfig, WorkerPerformingMode};
use u_pdes::timeline::resource_intervals;
use u_pdes::SimulationError;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

struct Builder {
    project: Project,
    wf: WorkflowId,
    team: TeamId,
}

impl Builder {
    fn new(name: &str) -> Self {
        let mut project = Project::new(name);
        let wf = project.add_workflow(Workflow::new("wf"));
        let team = project.add_team(Team::new("team"));
        Self { project, wf, team }
    }

    /// Adds a task authorized for the default team.
    fn task(&mut self, task: Task) -> TaskId {
        let id = self.project.add_task(self.wf, task).unwrap();
        self.project.assign_team(id, self.team).unwrap();
        id
    }

    /// Adds a worker with unit skill (sd = `sd`) on the given tasks.
    fn worker(&mut self, name: &str, tasks: &[&str], sd: f64) {
        let worker = tasks
            .iter()
            .fold(Worker::new(name).with_cost(1.0), |w, t| {
                w.with_skill(*t, 1.0, sd)
            });
        self.project.add_worker(self.team, worker).unwrap();
    }

    fn fs(&mut self, from: TaskId, to: TaskId) {
        self.project
            .add_dependency(from, to, DependencyKind::FinishToStart)
            .unwrap();
    }
}

fn abc_chain() -> Project {
    let mut b = Builder::new("abc");
    let a = b.task(Task::new("A"));
    let bb = b.task(Task::new("B"));
    let c = b.task(Task::new("C"));
    b.fs(a, bb);
    b.fs(bb, c);
    b.worker("w", &["A", "B", "C"], 0.0);
    b.project
}

#[test]
fn test_sequential_chain_finishes_at_30() {
    init_logger();
    let mut p = abc_chain();
    let status = p.simulate(&SimulationConfig::new().with_seed(0)).unwrap();

    assert_eq!(status, ProjectStatus::FinishedSuccess);
    assert_eq!(p.time, 30);
    assert_eq!(p.simulation_mode, SimulationMode::Forward);
    assert_eq!(p[TaskId(0)].finished_at(), Some(10));
    assert_eq!(p[TaskId(1)].finished_at(), Some(20));
}

#[test]
fn test_due_time_does_not_throttle() {
    init_logger();
    let mut b = Builder::new("due");
    b.task(Task::new("T").with_due_time(5));
    b.worker("w", &["T"], 0.0);
    let mut p = b.project;

    p.simulate(&SimulationConfig::new()).unwrap();
    assert_eq!(p.time, 10);

    let kpi = ProjectKpi::calculate(&p);
    assert_eq!(kpi.max_tardiness, 5);
}

#[test]
fn test_single_workplace_capacity() {
    init_logger();
    let mut b = Builder::new("capacity");
    let t1 = b.task(Task::new("weld").with_work_amount(2.0).with_need_facility(true));
    let t2 = b.task(Task::new("paint").with_work_amount(2.0).with_need_facility(true));
    let mut p = b.project;

    let prod = p.add_product(Product::new("prod"));
    let c1 = p.add_component(prod, Component::new("c1")).unwrap();
    let c2 = p.add_component(prod, Component::new("c2")).unwrap();
    p.set_target_component(t1, c1).unwrap();
    p.set_target_component(t2, c2).unwrap();

    let wp = p.add_workplace(Workplace::new("cell").with_max_space_size(1.0));
    p.add_facility(
        wp,
        Facility::new("robot")
            .with_skill("weld", 1.0, 0.0)
            .with_skill("paint", 1.0, 0.0),
    )
    .unwrap();
    p.assign_workplace(t1, wp).unwrap();
    p.assign_workplace(t2, wp).unwrap();
    for (name, task) in [("welder", "weld"), ("painter", "paint")] {
        p.add_worker(
            TeamId(0),
            Worker::new(name)
                .with_skill(task, 1.0, 0.0)
                .with_facility_skill("robot", 1.0),
        )
        .unwrap();
    }

    let status = p.simulate(&SimulationConfig::new()).unwrap();
    assert_eq!(status, ProjectStatus::FinishedSuccess);
    assert_eq!(p.time, 4);

    for placed in &p[wp].placed_component_record {
        let used: f64 = placed.iter().map(|c| p[*c].space_size).sum();
        assert!(used <= p[wp].max_space_size + 1e-10);
    }
    assert_eq!(
        p[t2].state_record,
        vec![
            TaskState::Ready,
            TaskState::Ready,
            TaskState::Working,
            TaskState::Working
        ]
    );
    assert_eq!(p[c1].placed_workplace_record[0], Some(wp));
    assert_eq!(p[c2].placed_workplace_record[0], None);
    assert_eq!(p[c2].placed_workplace_record[2], Some(wp));
}

fn noisy_project() -> Project {
    let mut b = Builder::new("noisy");
    let a = b.task(Task::new("a").with_work_amount(8.0));
    let c = b.task(Task::new("c").with_work_amount(5.0));
    let d = b.task(Task::new("d").with_work_amount(6.0));
    b.fs(a, c);
    b.project
        .add_dependency(a, d, DependencyKind::StartToStart)
        .unwrap();
    b.worker("w1", &["a", "c", "d"], 0.4);
    b.worker("w2", &["a", "d"], 0.4);
    b.project
}

#[test]
fn test_seeded_runs_are_deterministic() {
    init_logger();
    let config = SimulationConfig::new().with_seed(42);
    let mut first = noisy_project();
    let mut second = noisy_project();
    first.simulate(&config).unwrap();
    second.simulate(&config).unwrap();

    assert_eq!(first.time, second.time);
    assert_eq!(first.cost_record, second.cost_record);
    for (x, y) in first.tasks.iter().zip(&second.tasks) {
        assert_eq!(x.state_record, y.state_record);
        assert_eq!(x.remaining_work_amount_record, y.remaining_work_amount_record);
    }
}

#[test]
fn test_remaining_work_is_monotone() {
    let mut p = noisy_project();
    p.simulate(&SimulationConfig::new().with_seed(7)).unwrap();

    for task in &p.tasks {
        for pair in task.remaining_work_amount_record.windows(2) {
            assert!(pair[1] <= pair[0] + 1e-12, "{}: {:?}", task.name, pair);
        }
        for (state, rem) in task
            .state_record
            .iter()
            .zip(&task.remaining_work_amount_record)
        {
            if *state == TaskState::Finished {
                assert!(rem.abs() < 1e-10);
            }
        }
        assert_eq!(task.state, TaskState::Finished);
        assert!(task.remaining_work_amount.abs() < 1e-10);
    }
}

#[test]
fn test_pert_consistency() {
    let mut b = Builder::new("pert");
    let ids: Vec<TaskId> = (0..6)
        .map(|i| b.task(Task::new(format!("t{i}")).with_work_amount(1.0 + i as f64)))
        .collect();
    let kinds = [
        (0, 1, DependencyKind::FinishToStart),
        (0, 2, DependencyKind::StartToStart),
        (1, 3, DependencyKind::FinishToFinish),
        (2, 4, DependencyKind::StartToFinish),
        (3, 5, DependencyKind::FinishToStart),
        (4, 5, DependencyKind::FinishToStart),
    ];
    for (from, to, kind) in kinds {
        b.project.add_dependency(ids[from], ids[to], kind).unwrap();
    }
    let mut p = b.project;
    p.initialize();
    p.update_pert_data(0);

    for task in &p.tasks {
        assert!(task.est <= task.eft + 1e-10, "{}", task.name);
        assert!(task.lst <= task.lft + 1e-10, "{}", task.name);
        assert!(task.lft >= 0.0, "{} unreached", task.name);
    }
    let max_tail_eft = p
        .tasks
        .iter()
        .filter(|t| t.is_tail())
        .map(|t| t.eft)
        .fold(0.0, f64::max);
    assert!((p.workflows[0].critical_path_length - max_tail_eft).abs() < 1e-10);
}

#[test]
fn test_absence_and_round_trip() {
    init_logger();
    let mut plain = abc_chain();
    plain.simulate(&SimulationConfig::new()).unwrap();

    let absence = [1, 3, 5, 7, 9];
    let mut p = abc_chain();
    p.simulate(&SimulationConfig::new().with_absence_time_list(absence))
        .unwrap();
    assert_eq!(p.time, 35);
    assert_eq!(p.calendar.absence_steps(), absence.to_vec());

    p.remove_absence_time_list();
    assert_eq!(p.time, 30);
    assert_eq!(p[TaskId(0)].state_record, plain[TaskId(0)].state_record);
    assert_eq!(p.cost_record, plain.cost_record);

    p.insert_absence_time_list(&absence);
    assert_eq!(p.time, 35);
    for task in &p.tasks {
        assert_eq!(task.state_record.len(), 35);
    }
    assert_eq!(p.workers[0].activity.cost_record.len(), 35);
}

#[test]
fn test_absence_past_finish_round_trip() {
    init_logger();
    // Finish lands on step 31; 31, 32 and 50 are never recorded
    let absence = [1, 31, 32, 50];
    let mut p = abc_chain();
    p.simulate(&SimulationConfig::new().with_absence_time_list(absence))
        .unwrap();
    assert_eq!(p.time, 31);

    let lengths = |p: &Project| {
        let mut lens = vec![p.time, p.cost_record.len()];
        for task in &p.tasks {
            lens.push(task.state_record.len());
            lens.push(task.remaining_work_amount_record.len());
            lens.push(task.allocated_worker_record.len());
        }
        for w in &p.workers {
            lens.push(w.activity.state_record.len());
            lens.push(w.activity.cost_record.len());
        }
        for team in &p.teams {
            lens.push(team.cost_record.len());
        }
        lens
    };
    let before = lengths(&p);
    assert!(before.iter().all(|len| *len == 31));

    p.remove_absence_time_list();
    assert_eq!(p.time, 30);
    p.insert_absence_time_list(&absence);
    assert_eq!(lengths(&p), before);
    p.remove_absence_time_list();
    p.insert_absence_time_list(&absence);
    assert_eq!(lengths(&p), before);
    assert_eq!(p.calendar.absence_steps(), vec![1]);
}

#[test]
fn test_auto_task_during_absence() {
    let build = || {
        let mut b = Builder::new("auto");
        b.task(Task::new("cure").with_work_amount(3.0).auto(1.0));
        b.project
    };
    let config = SimulationConfig::new().with_absence_time_list([1]);

    let mut paused = build();
    paused.simulate(&config).unwrap();
    assert_eq!(paused.time, 4);

    let mut running = build();
    running
        .simulate(&config.clone().with_auto_task_during_absence(true))
        .unwrap();
    assert_eq!(running.time, 3);
}

#[test]
fn test_working_window() {
    let mut b = Builder::new("window");
    b.task(Task::new("T").with_work_amount(4.0));
    b.worker("w", &["T"], 0.0);
    let mut p = b.project;

    // Two business steps out of every four
    p.simulate(&SimulationConfig::new().with_working_window(4, 0, 2))
        .unwrap();
    assert_eq!(p.time, 6);
    let bars = resource_intervals(&p.workers[0].activity.state_record, 1.0);
    assert_eq!(bars.absence, vec![(2, 2.0)]);
    assert!((p.total_cost() - 4.0).abs() < 1e-10);
}

#[test]
fn test_solo_worker_never_shares() {
    let mut b = Builder::new("solo");
    let t1 = b.task(Task::new("a").with_work_amount(3.0));
    let t2 = b.task(Task::new("b").with_work_amount(3.0));
    let mut p = b.project;
    let solo = p
        .add_worker(
            TeamId(0),
            Worker::new("solo")
                .with_skill("a", 1.0, 0.0)
                .with_skill("b", 1.0, 0.0)
                .with_solo_working(true),
        )
        .unwrap();
    p.add_worker(
        TeamId(0),
        Worker::new("helper")
            .with_skill("a", 1.0, 0.0)
            .with_skill("b", 1.0, 0.0),
    )
    .unwrap();

    p.simulate(&SimulationConfig::new().with_task_priority_rule(TaskPriorityRule::Spt))
        .unwrap();
    for task in [t1, t2] {
        for allocated in &p[task].allocated_worker_record {
            if allocated.contains(&solo) {
                assert_eq!(allocated.len(), 1);
            }
        }
    }
}

#[test]
fn test_unsupported_mode_is_immediate() {
    let mut p = abc_chain();
    let config =
        SimulationConfig::new().with_worker_performing_mode(WorkerPerformingMode::MultiTask);
    let err = p.simulate(&config).unwrap_err();
    assert!(matches!(err, SimulationError::UnsupportedMode(_)));
    assert!(p[TaskId(0)].state_record.is_empty());
}

#[test]
fn test_invalid_model_rejected() {
    let mut p = abc_chain();
    p.tasks[0].default_work_amount = -3.0;
    let err = p.simulate(&SimulationConfig::new()).unwrap_err();
    assert!(matches!(err, SimulationError::InvalidModel(ref errors) if !errors.is_empty()));
}

#[test]
fn test_max_time_failure() {
    init_logger();
    let mut b = Builder::new("stuck");
    b.task(Task::new("nobody can do this"));
    let mut p = b.project;

    let status = p
        .simulate(&SimulationConfig::new().with_max_time(25))
        .unwrap();
    assert_eq!(status, ProjectStatus::FinishedFailure);
    assert_eq!(p.status, ProjectStatus::FinishedFailure);
    assert_eq!(p.time, 25);
}

#[test]
fn test_backward_with_due_time_fillers() {
    init_logger();
    let mut p = Project::new("backward");
    let wf = p.add_workflow(Workflow::new("wf"));
    let add = |p: &mut Project, name: &str, work: f64, due: Option<usize>| {
        let team = p.add_team(Team::new(format!("{name}-team")));
        let mut task = Task::new(name).with_work_amount(work);
        task.due_time = due;
        let id = p.add_task(wf, task).unwrap();
        p.assign_team(id, team).unwrap();
        p.add_worker(team, Worker::new(format!("{name}-w")).with_skill(name, 1.0, 0.0))
            .unwrap();
        id
    };
    let head = add(&mut p, "H", 2.0, None);
    let late = add(&mut p, "T1", 3.0, Some(10));
    let early = add(&mut p, "T2", 3.0, Some(6));
    p.add_dependency(head, late, DependencyKind::FinishToStart)
        .unwrap();
    p.add_dependency(head, early, DependencyKind::FinishToStart)
        .unwrap();

    let status = p.backward_simulate(&SimulationConfig::new(), true).unwrap();
    assert_eq!(status, ProjectStatus::FinishedSuccess);
    assert_eq!(p.simulation_mode, SimulationMode::Backward);
    assert_eq!(p.time, 9);

    // Fillers are gone and edges are back in their original direction
    assert_eq!(p.tasks.len(), 3);
    assert_eq!(p.workflows[0].task_ids.len(), 3);
    assert!(p[head].is_head());
    assert!(p[late].is_tail() && p[early].is_tail());

    let last_working = |id: TaskId| {
        p[id]
            .state_record
            .iter()
            .rposition(|s| s.is_working())
            .unwrap()
    };
    assert_eq!(last_working(late), 8);
    assert_eq!(last_working(early), 4);
    assert_eq!(p[head].state_record[0], TaskState::Working);
}

#[test]
fn test_json_round_trip() {
    let mut p = abc_chain();
    p.simulate(&SimulationConfig::new().with_absence_time_list([2]))
        .unwrap();

    let json = serde_json::to_string(&p).unwrap();
    let back: Project = serde_json::from_str(&json).unwrap();
    assert_eq!(serde_json::to_string(&back).unwrap(), json);
    assert_eq!(back.time, p.time);
    assert_eq!(back.status, ProjectStatus::FinishedSuccess);
    assert_eq!(back[TaskId(2)].state_record, p[TaskId(2)].state_record);
    assert_eq!(back.calendar, p.calendar);
}
