//! Discrete-event simulation for project management.
//!
//! Models a project as a product (components), a workflow (tasks with
//! FS/SS/FF/SF dependencies) and an organization (teams of workers,
//! workplaces with facilities), then simulates it step by step: PERT/CPM
//! bounds, priority-rule dispatching, greedy resource allocation and
//! stochastic work progress.
//!
//! # Modules
//!
//! - **`models`**: Domain types held in the `Project` arena: `Task`,
//!   `Component`, `Worker`, `Facility`, `Team`, `Workplace`, `Workflow`,
//!   `Calendar`, plus the log splice helpers in `record`
//! - **`dispatching`**: Task, resource and workplace priority rules
//! - **`scheduler`**: Simulation controller, PERT/CPM pass, allocation,
//!   absence surgery and KPIs
//! - **`validation`**: Model integrity checks (dangling handles, one-sided
//!   relations, DAG cycles, capacities)
//! - **`timeline`**: State-log to Gantt interval transforms
//! - **`error`**: `ModelError` and `SimulationError`
//!
//! # Example
//!
//! ```
//! use u_pdes::models::{DependencyKind, Project, ProjectStatus, Task, Team, Worker, Workflow};
//! use u_pdes::scheduler::SimulationConfig;
//!
//! let mut project = Project::new("demo");
//! let wf = project.add_workflow(Workflow::new("wf"));
//! let team = project.add_team(Team::new("team"));
//! let a = project.add_task(wf, Task::new("a").with_work_amount(3.0)).unwrap();
//! let b = project.add_task(wf, Task::new("b").with_work_amount(2.0)).unwrap();
//! project.add_dependency(a, b, DependencyKind::FinishToStart).unwrap();
//! project.assign_team(a, team).unwrap();
//! project.assign_team(b, team).unwrap();
//! project
//!     .add_worker(team, Worker::new("w").with_skill("a", 1.0, 0.0).with_skill("b", 1.0, 0.0))
//!     .unwrap();
//!
//! let status = project.simulate(&SimulationConfig::new().with_seed(7)).unwrap();
//! assert_eq!(status, ProjectStatus::FinishedSuccess);
//! assert_eq!(project.time, 5);
//! ```
//!
//! # References
//!
//! - Mitsuyuki et al. (2017), "pDESy: Discrete-event simulation framework for project
//!   management"
//! - Kelley & Walker (1959), "Critical-path planning and scheduling"
//! - Kolisch (1996), "Serial and parallel resource-constrained project scheduling methods
//!   revisited"

pub mod dispatching;
pub mod error;
pub mod models;
pub mod scheduler;
pub mod timeline;
pub mod validation;

pub use error::{ModelError, SimulationError};
