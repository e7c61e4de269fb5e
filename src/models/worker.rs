//! Worker model.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::resource::{Resource, ResourceActivity, WorkAmountSkills, SKILL_EPSILON};
use super::{TeamId, WorkplaceId};

/// A human resource belonging to a team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    /// Worker name.
    pub name: String,
    /// Owning team (set when added to a project).
    pub team: Option<TeamId>,
    /// Home workplace, preferred by the `MW` rule.
    pub main_workplace: Option<WorkplaceId>,
    /// Cost per working step.
    pub cost_per_time: f64,
    /// Cannot share a task with other resources.
    pub solo_working: bool,
    /// Work amount skills keyed by task name.
    pub workamount_skills: WorkAmountSkills,
    /// Ability to operate facilities, keyed by facility name.
    pub facility_skill_map: BTreeMap<String, f64>,
    /// Probability mass of defects removed per task name.
    pub quality_skill_mean: BTreeMap<String, f64>,
    /// Steps at which the worker is absent.
    pub absence_time_list: Vec<usize>,
    /// Run state and logs.
    pub activity: ResourceActivity,
}

impl Worker {
    /// Creates a worker with no skills.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            team: None,
            main_workplace: None,
            cost_per_time: 0.0,
            solo_working: false,
            workamount_skills: WorkAmountSkills::new(),
            facility_skill_map: BTreeMap::new(),
            quality_skill_mean: BTreeMap::new(),
            absence_time_list: Vec::new(),
            activity: ResourceActivity::default(),
        }
    }

    /// Adds a work amount skill.
    pub fn with_skill(mut self, task_name: impl Into<String>, mean: f64, sd: f64) -> Self {
        self.workamount_skills.set(task_name, mean, sd);
        self
    }

    /// Adds a facility operating skill.
    pub fn with_facility_skill(mut self, facility_name: impl Into<String>, level: f64) -> Self {
        self.facility_skill_map.insert(facility_name.into(), level);
        self
    }

    /// Adds a quality skill.
    pub fn with_quality_skill(mut self, task_name: impl Into<String>, level: f64) -> Self {
        self.quality_skill_mean.insert(task_name.into(), level);
        self
    }

    /// Sets the cost per working step.
    pub fn with_cost(mut self, cost_per_time: f64) -> Self {
        self.cost_per_time = cost_per_time;
        self
    }

    /// Marks the worker as solo-working.
    pub fn with_solo_working(mut self, solo: bool) -> Self {
        self.solo_working = solo;
        self
    }

    /// Sets the absence steps.
    pub fn with_absence(mut self, steps: impl IntoIterator<Item = usize>) -> Self {
        self.absence_time_list = steps.into_iter().collect();
        self
    }

    /// Sets the home workplace.
    pub fn with_main_workplace(mut self, workplace: WorkplaceId) -> Self {
        self.main_workplace = Some(workplace);
        self
    }

    /// Whether the worker can operate the named facility.
    pub fn has_facility_skill(&self, facility_name: &str) -> bool {
        self.facility_skill_map
            .get(facility_name)
            .is_some_and(|v| *v > SKILL_EPSILON)
    }

    /// Quality skill for a task name (0.0 if not defined).
    pub fn quality_skill(&self, task_name: &str) -> f64 {
        self.quality_skill_mean
            .get(task_name)
            .copied()
            .unwrap_or(0.0)
    }
}

impl Resource for Worker {
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
        self.main_workplace
    }

    fn activity(&self) -> &ResourceActivity {
        &self.activity
    }

    fn activity_mut(&mut self) -> &mut ResourceActivity {
        &mut self.activity
    }
}
