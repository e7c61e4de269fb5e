//! Priority rules for contention resolution.
//!
//! Every simulation step, ready and working tasks compete for free workers,
//! facilities and workplace space. The rules here decide who goes first:
//! tasks are ordered by a [`TaskPriorityRule`], candidate workers and
//! facilities by a [`ResourcePriorityRule`], candidate workplaces by a
//! [`WorkplacePriorityRule`].
//!
//! # Score Convention
//! **Lower score = higher priority.** Each rule maps an entity to a
//! [`RuleScore`]; "descending" rules return negated keys. Sorting is stable,
//! so entities with equal scores keep their input order.
//!
//! # Usage
//!
//! ```
//! use u_pdes::dispatching::{RuleContext, TaskPriorityRule};
//! use u_pdes::models::{Project, Task, Workflow};
//!
//! let mut project = Project::new("demo");
//! let wf = project.add_workflow(Workflow::new("wf"));
//! let long = project.add_task(wf, Task::new("long").with_work_amount(8.0)).unwrap();
//! let short = project.add_task(wf, Task::new("short").with_work_amount(2.0)).unwrap();
//!
//! let mut ids = vec![long, short];
//! TaskPriorityRule::Spt.sort(&mut ids, &RuleContext::new(&project));
//! assert_eq!(ids, vec![short, long]);
//! ```
//!
//! # References
//!
//! - Haupt (1989), "A Survey of Priority Rule-Based Scheduling"
//! - Kolisch (1996), "Serial and parallel resource-constrained project scheduling methods
//!   revisited"

mod context;
pub mod rules;

pub use context::RuleContext;
pub use rules::{ResourcePriorityRule, TaskPriorityRule, WorkplacePriorityRule};

/// Score returned by a priority rule. Lower = higher priority.
pub type RuleScore = f64;

/// Stable-sorts `items` by ascending score.
///
/// Scores are computed once per item and ordered by [`f64::total_cmp`], so a
/// NaN score sorts after every finite and infinite one.
pub fn sort_by_score<T, F>(items: &mut Vec<T>, mut score: F)
where
    T: Copy,
    F: FnMut(T) -> RuleScore,
{
    // `+ 0.0` folds -0.0 into 0.0 so negated keys still tie
    let mut keyed: Vec<(RuleScore, T)> =
        items.iter().map(|&item| (score(item) + 0.0, item)).collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    items.clear();
    items.extend(keyed.into_iter().map(|(_, item)| item));
}
