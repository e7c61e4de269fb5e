//! Business-time calendar for a project.
//!
//! Time is a logical step counter. A step is business time iff:
//! - it is NOT in the absence time list, AND
//! - it falls within at least one daily time window (or no windows are set).
//!
//! Absence steps are recorded in every log and can later be spliced out
//! (see `Project::remove_absence_time_list`); non-window steps are not.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A step interval [start, end) within one cycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeWindow {
    /// Interval start (inclusive).
    pub start: usize,
    /// Interval end (exclusive).
    pub end: usize,
}

impl TimeWindow {
    /// Creates a new window.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Whether a step offset falls within this window.
    #[inline]
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }
}

/// Project calendar.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Calendar {
    /// Steps during which nobody works.
    pub absence_time_list: BTreeSet<usize>,
    /// Length of one working cycle (e.g. steps per day).
    pub cycle_length: Option<usize>,
    /// Working windows within a cycle. Empty = always working.
    pub time_windows: Vec<TimeWindow>,
}

impl Calendar {
    /// Creates an always-working calendar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the absence steps.
    pub fn with_absence(mut self, steps: impl IntoIterator<Item = usize>) -> Self {
        self.absence_time_list = steps.into_iter().collect();
        self
    }

    /// Adds a working window repeating every `cycle_length` steps.
    pub fn with_window(mut self, cycle_length: usize, start: usize, end: usize) -> Self {
        self.cycle_length = Some(cycle_length);
        self.time_windows.push(TimeWindow::new(start, end));
        self
    }

    /// Whether `step` is business time.
    pub fn is_business_time(&self, step: usize) -> bool {
        // Absence overrides windows
        if self.absence_time_list.contains(&step) {
            return false;
        }
        match self.cycle_length {
            Some(cycle) if cycle > 0 && !self.time_windows.is_empty() => {
                let offset = step % cycle;
                self.time_windows.iter().any(|w| w.contains(offset))
            }
            _ => true,
        }
    }

    /// Absence steps in ascending order.
    pub fn absence_steps(&self) -> Vec<usize> {
        self.absence_time_list.iter().copied().collect()
    }
}
