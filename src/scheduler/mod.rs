//! Discrete-event project simulation and KPI evaluation.
//!
//! The simulator advances a [`Project`](crate::models::Project) one logical
//! step at a time until every task is finished or `max_time` is hit.
//!
//! # Algorithm
//!
//! Each step runs a fixed pipeline:
//!
//! 1. Update: finish check, component refresh, ready check, component
//!    refresh, PERT/CPM recomputation.
//! 2. Termination check.
//! 3. Business-time check and resource state refresh.
//! 4. Greedy resource allocation in task-priority order (business time only).
//! 5. Working check for newly bound resources.
//! 6. Cost accrual.
//! 7. Work progression with stochastic skill draws.
//! 8. Log snapshots.
//!
//! Backward simulation reverses every edge, runs the same loop and then
//! reverses the logs, yielding a latest-feasible schedule.
//!
//! # KPI
//!
//! `ProjectKpi` computes makespan, cost, tardiness against due times, and
//! resource utilization from the recorded logs.
//!
//! # References
//!
//! - Malcolm et al. (1959), "Application of a technique for R&D program evaluation"
//! - Kelley & Walker (1959), "Critical-path planning and scheduling"
//! - Mitsuyuki et al. (2017), "pDESy: Discrete-event simulation framework for project management"

mod absence;
mod allocation;
mod checker;
mod kpi;
mod pert;
mod simulation;

pub use kpi::ProjectKpi;
pub use simulation::{SimulationConfig, TaskPerformedMode, WorkerPerformingMode};
