//! Log-to-interval transforms for Gantt rendering.
//!
//! Each function scans a state log and returns, per state of interest, the
//! maximal runs of that state as `(start_index, length)` pairs where
//! `length = run_length - 1 + finish_margin`. A state that never occurs
//! yields the single placeholder `(0, 0.0)` so renderers always get a bar.

use serde::{Deserialize, Serialize};

use crate::models::{ComponentState, ResourceState, TaskState};

/// One rendered bar: start step and drawn length.
pub type Interval = (usize, f64);

/// Task bars by state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskIntervals {
    /// READY runs.
    pub ready: Vec<Interval>,
    /// WORKING and WORKING_ADDITIONALLY runs.
    pub working: Vec<Interval>,
    /// FINISHED runs.
    pub finished: Vec<Interval>,
}

/// Worker/facility bars by state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceIntervals {
    /// FREE runs.
    pub free: Vec<Interval>,
    /// WORKING runs.
    pub working: Vec<Interval>,
    /// ABSENCE runs.
    pub absence: Vec<Interval>,
}

/// Component bars by state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentIntervals {
    /// READY runs.
    pub ready: Vec<Interval>,
    /// WORKING runs.
    pub working: Vec<Interval>,
}

/// Maximal runs of entries matching `pred`.
fn runs<T, F>(log: &[T], finish_margin: f64, mut pred: F) -> Vec<Interval>
where
    F: FnMut(&T) -> bool,
{
    let mut out = Vec::new();
    let mut start = None;
    for (i, entry) in log.iter().enumerate() {
        match (pred(entry), start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                out.push((s, (i - s - 1) as f64 + finish_margin));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        out.push((s, (log.len() - s - 1) as f64 + finish_margin));
    }
    if out.is_empty() {
        out.push((0, 0.0));
    }
    out
}

/// Splits a task state log into READY, working and FINISHED bars.
pub fn task_intervals(log: &[TaskState], finish_margin: f64) -> TaskIntervals {
    TaskIntervals {
        ready: runs(log, finish_margin, |s| *s == TaskState::Ready),
        working: runs(log, finish_margin, |s| s.is_working()),
        finished: runs(log, finish_margin, |s| *s == TaskState::Finished),
    }
}

/// Splits a resource state log into FREE, WORKING and ABSENCE bars.
pub fn resource_intervals(log: &[ResourceState], finish_margin: f64) -> ResourceIntervals {
    ResourceIntervals {
        free: runs(log, finish_margin, |s| *s == ResourceState::Free),
        working: runs(log, finish_margin, |s| *s == ResourceState::Working),
        absence: runs(log, finish_margin, |s| *s == ResourceState::Absence),
    }
}

/// Splits a component state log into READY and WORKING bars.
pub fn component_intervals(log: &[ComponentState], finish_margin: f64) -> ComponentIntervals {
    ComponentIntervals {
        ready: runs(log, finish_margin, |s| *s == ComponentState::Ready),
        working: runs(log, finish_margin, |s| *s == ComponentState::Working),
    }
}
