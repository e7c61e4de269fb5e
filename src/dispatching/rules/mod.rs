//! Built-in priority rules.
//!
//! # Categories
//!
//! - **Task**: TSLACK, EST, SPT, LPT, FIFO, LRPT, SRPT, LWRPT, SWRPT
//! - **Worker/Facility**: MW, SSP, VC, HSV
//! - **Workplace**: FSS, SSP
//!
//! # Score Convention
//! All rules return lower scores for higher priority entities.
//!
//! # References
//! - Haupt (1989), "A Survey of Priority Rule-Based Scheduling"
//! - Kolisch (1996), "Serial and parallel resource-constrained project scheduling methods
//!   revisited"

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{sort_by_score, RuleContext, RuleScore};
use crate::error::SimulationError;
use crate::models::{
    FacilityId, Resource, Task, TaskId, WorkerId, WorkplaceId,
};

// ======================== Task rules ========================

/// Rule ordering tasks that compete for resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TaskPriorityRule {
    /// Total slack: smallest `lst - est` first.
    #[default]
    Tslack,
    /// Earliest start first.
    Est,
    /// Shortest default work amount first.
    Spt,
    /// Longest default work amount first.
    Lpt,
    /// Task that has waited READY the longest first.
    Fifo,
    /// Largest remaining work first.
    Lrpt,
    /// Smallest remaining work first.
    Srpt,
    /// Task in the workflow with the longest critical path first.
    Lwrpt,
    /// Task in the workflow with the shortest critical path first.
    Swrpt,
}

impl TaskPriorityRule {
    /// Rule name (e.g., "TSLACK").
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tslack => "TSLACK",
            Self::Est => "EST",
            Self::Spt => "SPT",
            Self::Lpt => "LPT",
            Self::Fifo => "FIFO",
            Self::Lrpt => "LRPT",
            Self::Srpt => "SRPT",
            Self::Lwrpt => "LWRPT",
            Self::Swrpt => "SWRPT",
        }
    }

    /// Scores a task. Lower = higher priority.
    pub fn evaluate(&self, task: &Task, context: &RuleContext<'_>) -> RuleScore {
        match self {
            Self::Tslack => task.slack(),
            Self::Est => task.est,
            Self::Spt => task.default_work_amount,
            Self::Lpt => -task.default_work_amount,
            Self::Fifo => -(task.ready_count() as f64),
            Self::Lrpt => -task.remaining_work_amount,
            Self::Srpt => task.remaining_work_amount,
            Self::Lwrpt => -workflow_length(task, context),
            Self::Swrpt => workflow_length(task, context),
        }
    }

    /// Stable-sorts task handles by this rule.
    pub fn sort(&self, tasks: &mut Vec<TaskId>, context: &RuleContext<'_>) {
        sort_by_score(tasks, |id| self.evaluate(&context.project[id], context));
    }
}

fn workflow_length(task: &Task, context: &RuleContext<'_>) -> f64 {
    task.parent_workflow
        .and_then(|wf| context.project.workflows.get(wf.index()))
        .map(|wf| wf.critical_path_length)
        .unwrap_or(0.0)
}

// ======================== Resource rules ========================

/// Rule ordering candidate workers or facilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ResourcePriorityRule {
    /// Resources whose home workplace is the requesting one first.
    Mw,
    /// Smallest total skill point sum first (keep generalists free).
    #[default]
    Ssp,
    /// Cheapest cost per time first.
    Vc,
    /// Highest skill for the requesting task first; missing skill last.
    Hsv,
}

impl ResourcePriorityRule {
    /// Rule name (e.g., "SSP").
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mw => "MW",
            Self::Ssp => "SSP",
            Self::Vc => "VC",
            Self::Hsv => "HSV",
        }
    }

    /// Scores a resource. Lower = higher priority.
    pub fn evaluate<R: Resource + ?Sized>(
        &self,
        resource: &R,
        context: &RuleContext<'_>,
    ) -> RuleScore {
        match self {
            Self::Mw => {
                let home = resource.home_workplace();
                if home.is_some() && home == context.requesting_workplace {
                    0.0
                } else {
                    1.0
                }
            }
            Self::Ssp => resource.skills().total_mean(),
            Self::Vc => resource.cost_per_time(),
            Self::Hsv => match context
                .task_name
                .and_then(|name| resource.skills().mean_of(name))
            {
                Some(mean) => -mean,
                None => f64::INFINITY,
            },
        }
    }

    /// Stable-sorts worker handles by this rule.
    pub fn sort_workers(&self, workers: &mut Vec<WorkerId>, context: &RuleContext<'_>) {
        sort_by_score(workers, |id| self.evaluate(&context.project[id], context));
    }

    /// Stable-sorts facility handles by this rule.
    pub fn sort_facilities(&self, facilities: &mut Vec<FacilityId>, context: &RuleContext<'_>) {
        sort_by_score(facilities, |id| {
            self.evaluate(&context.project[id], context)
        });
    }
}

// ======================== Workplace rules ========================

/// Rule ordering candidate workplaces for a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WorkplacePriorityRule {
    /// Most free space first.
    #[default]
    Fss,
    /// Largest facility skill sum for the requesting task first.
    Ssp,
}

impl WorkplacePriorityRule {
    /// Rule name (e.g., "FSS").
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fss => "FSS",
            Self::Ssp => "SSP",
        }
    }

    /// Scores a workplace. Lower = higher priority.
    pub fn evaluate(&self, workplace: WorkplaceId, context: &RuleContext<'_>) -> RuleScore {
        match self {
            Self::Fss => -context.project.free_space(workplace),
            Self::Ssp => -context
                .task_name
                .map(|name| context.project.total_workamount_skill(workplace, name))
                .unwrap_or(0.0),
        }
    }

    /// Stable-sorts workplace handles by this rule.
    pub fn sort(&self, workplaces: &mut Vec<WorkplaceId>, context: &RuleContext<'_>) {
        sort_by_score(workplaces, |id| self.evaluate(id, context));
    }
}

// ======================== Parsing ========================

macro_rules! rule_names {
    ($rule:ty, $kind:literal, [$($variant:ident),+]) => {
        impl FromStr for $rule {
            type Err = SimulationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let upper = s.trim().to_ascii_uppercase();
                $(
                    if upper == <$rule>::$variant.name() {
                        return Ok(<$rule>::$variant);
                    }
                )+
                Err(SimulationError::InvalidMode {
                    kind: $kind,
                    value: s.to_string(),
                })
            }
        }

        impl fmt::Display for $rule {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

rule_names!(
    TaskPriorityRule,
    "task priority rule",
    [Tslack, Est, Spt, Lpt, Fifo, Lrpt, Srpt, Lwrpt, Swrpt]
);
rule_names!(ResourcePriorityRule, "resource priority rule", [Mw, Ssp, Vc, Hsv]);
rule_names!(WorkplacePriorityRule, "workplace priority rule", [Fss, Ssp]);
