//! Project quality metrics (KPIs).
//!
//! Computes performance indicators from a simulated project's logs.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Makespan | Final logical time |
//! | Total Cost | Sum of the project cost record |
//! | Total Tardiness | Sum of max(0, finish step - due time) |
//! | Maximum Tardiness | Largest single delay |
//! | On-Time Rate | Fraction of finished tasks meeting their due time |
//! | Avg Utilization | Mean WORKING share of recorded steps |
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 1.2: Performance Measures

use std::collections::HashMap;

use crate::models::{Project, ResourceActivity, ResourceState, Task, TaskState};

/// Project performance indicators.
///
/// All time values are logical steps.
#[derive(Debug, Clone)]
pub struct ProjectKpi {
    /// Makespan: final simulation time.
    pub makespan: usize,
    /// Total recorded cost.
    pub total_cost: f64,
    /// Number of finished tasks.
    pub finished_tasks: usize,
    /// Sum of tardiness across tasks with a due time.
    pub total_tardiness: usize,
    /// Maximum tardiness of any single task.
    pub max_tardiness: usize,
    /// Fraction of finished tasks completing on time (0.0..1.0).
    pub on_time_rate: f64,
    /// Average utilization over workers and facilities (0.0..1.0).
    pub avg_utilization: f64,
    /// Per-worker utilization, keyed by worker name.
    pub utilization_by_worker: HashMap<String, f64>,
    /// Per-facility utilization, keyed by facility name.
    pub utilization_by_facility: HashMap<String, f64>,
}

impl ProjectKpi {
    /// Computes KPIs from a simulated project.
    pub fn calculate(project: &Project) -> Self {
        let mut total_tardiness = 0;
        let mut max_tardiness = 0;
        let mut on_time_count = 0;
        let mut finished_tasks = 0;

        for task in &project.tasks {
            let Some(completion) = completion_step(task) else {
                continue;
            };
            finished_tasks += 1;

            match task.due_time {
                Some(due) if completion > due => {
                    let tardiness = completion - due;
                    total_tardiness += tardiness;
                    max_tardiness = max_tardiness.max(tardiness);
                }
                // No due time → considered on-time
                _ => on_time_count += 1,
            }
        }

        let utilization_by_worker: HashMap<String, f64> = project
            .workers
            .iter()
            .map(|w| (w.name.clone(), utilization(&w.activity)))
            .collect();
        let utilization_by_facility: HashMap<String, f64> = project
            .facilities
            .iter()
            .map(|f| (f.name.clone(), utilization(&f.activity)))
            .collect();

        let resource_count = utilization_by_worker.len() + utilization_by_facility.len();
        let avg_utilization = if resource_count == 0 {
            0.0
        } else {
            let sum: f64 = utilization_by_worker
                .values()
                .chain(utilization_by_facility.values())
                .sum();
            sum / resource_count as f64
        };

        let on_time_rate = if finished_tasks == 0 {
            1.0
        } else {
            on_time_count as f64 / finished_tasks as f64
        };

        Self {
            makespan: project.time,
            total_cost: project.total_cost(),
            finished_tasks,
            total_tardiness,
            max_tardiness,
            on_time_rate,
            avg_utilization,
            utilization_by_worker,
            utilization_by_facility,
        }
    }

    /// Whether the project meets the given quality thresholds.
    pub fn meets_thresholds(&self, max_tardiness: usize, min_utilization: f64) -> bool {
        self.max_tardiness <= max_tardiness && self.avg_utilization >= min_utilization
    }
}

/// Step at which a task finished.
///
/// The run stops as soon as the last task finishes, before that step is
/// recorded, so a finished task without a FINISHED entry completed at the
/// end of its log.
fn completion_step(task: &Task) -> Option<usize> {
    task.finished_at().or_else(|| {
        (task.state == TaskState::Finished && !task.state_record.is_empty())
            .then_some(task.state_record.len())
    })
}

fn utilization(activity: &ResourceActivity) -> f64 {
    let recorded = activity.state_record.len();
    if recorded == 0 {
        0.0
    } else {
        activity.count_state(ResourceState::Working) as f64 / recorded as f64
    }
}
