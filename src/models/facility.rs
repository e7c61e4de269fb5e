//! Facility model.

use serde::{Deserialize, Serialize};

use super::resource::{Resource, ResourceActivity, WorkAmountSkills};
use super::WorkplaceId;

/// A machine or station installed at a workplace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Facility {
    /// Facility name; worker facility skills are keyed by it.
    pub name: String,
    /// Workplace the facility is installed at.
    pub workplace: Option<WorkplaceId>,
    /// Cost per working step.
    pub cost_per_time: f64,
    /// Cannot share a task with other facilities.
    pub solo_working: bool,
    /// Work amount skills keyed by task name.
    pub workamount_skills: WorkAmountSkills,
    /// Steps at which the facility is unavailable.
    pub absence_time_list: Vec<usize>,
    /// Run state and logs.
    pub activity: ResourceActivity,
}

impl Facility {
    /// Creates a facility with no skills.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            workplace: None,
            cost_per_time: 0.0,
            solo_working: false,
            workamount_skills: WorkAmountSkills::new(),
            absence_time_list: Vec::new(),
            activity: ResourceActivity::default(),
        }
    }

    /// Adds a work amount skill.
    pub fn with_skill(mut self, task_name: impl Into<String>, mean: f64, sd: f64) -> Self {
        self.workamount_skills.set(task_name, mean, sd);
        self
    }

    /// Sets the cost per working step.
    pub fn with_cost(mut self, cost_per_time: f64) -> Self {
        self.cost_per_time = cost_per_time;
        self
    }

    /// Marks the facility as solo-working.
    pub fn with_solo_working(mut self, solo: bool) -> Self {
        self.solo_working = solo;
        self
    }

    /// Sets the absence steps.
    pub fn with_absence(mut self, steps: impl IntoIterator<Item = usize>) -> Self {
        self.absence_time_list = steps.into_iter().collect();
        self
    }
}

impl Resource for Facility {
    fn name(&self) -> &str {
        &self.name
    }

    fn skills(&self) -> &WorkAmountSkills {
        &self.workamount_skills
    }

    fn cost_per_time(&self) -> f64 {
        self.cost_per_time
    }

    fn solo_working(&self) -> bool {
        self.solo_working
    }

    fn absence_time_list(&self) -> &[usize] {
        &self.absence_time_list
    }

    fn home_workplace(&self) -> Option<WorkplaceId> {
        self.workplace
    }

    fn activity(&self) -> &ResourceActivity {
        &self.activity
    }

    fn activity_mut(&mut self) -> &mut ResourceActivity {
        &mut self.activity
    }
}
