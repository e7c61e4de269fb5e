//! PERT/CPM bounds.
//!
//! Recomputed from scratch every step over the whole task graph in
//! topological order. The forward pass sets `est`/`eft`, the backward pass
//! sets `lst`/`lft` and each workflow's critical path length.
//!
//! # Reference
//! Kelley & Walker (1959), "Critical-path planning and scheduling"

use std::collections::VecDeque;

use crate::models::{DependencyKind, Project, TaskId};

impl Project {
    /// Task handles in topological order (Kahn's algorithm).
    ///
    /// Tasks left over by a cycle are appended in arena order.
    pub(crate) fn topological_order(&self) -> Vec<TaskId> {
        let n = self.tasks.len();
        let mut in_degree: Vec<usize> = self
            .tasks
            .iter()
            .map(|t| t.input_dependencies.len())
            .collect();
        let mut queue: VecDeque<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);

        while let Some(i) = queue.pop_front() {
            order.push(TaskId(i));
            for dep in &self.tasks[i].output_dependencies {
                let j = dep.task.0;
                if in_degree[j] > 0 {
                    in_degree[j] -= 1;
                    if in_degree[j] == 0 {
                        queue.push_back(j);
                    }
                }
            }
        }

        if order.len() < n {
            log::warn!(
                "task graph of {} has a cycle; PERT bounds are approximate",
                self.name
            );
            let mut seen = vec![false; n];
            for id in &order {
                seen[id.0] = true;
            }
            order.extend((0..n).filter(|&i| !seen[i]).map(TaskId));
        }
        order
    }

    /// Recomputes `est`/`eft`/`lst`/`lft` of every task and the critical
    /// path length of every workflow, with heads starting at `time`.
    pub fn update_pert_data(&mut self, time: usize) {
        let order = self.topological_order();
        self.forward_pass(time as f64, &order);
        self.backward_pass(&order);
    }

    /// Longest earliest finish over all tail tasks.
    pub fn critical_path_length(&self) -> f64 {
        self.tasks
            .iter()
            .filter(|t| t.is_tail())
            .map(|t| t.eft)
            .fold(0.0, f64::max)
    }

    fn forward_pass(&mut self, start: f64, order: &[TaskId]) {
        for task in &mut self.tasks {
            task.est = start;
            task.eft = start + task.remaining_work_amount;
        }

        for &id in order {
            let pred = &self.tasks[id.0];
            let (est, eft, rem) = (pred.est, pred.eft, pred.remaining_work_amount);
            let outputs = pred.output_dependencies.clone();

            for dep in outputs {
                let succ = &mut self.tasks[dep.task.0];
                let succ_rem = succ.remaining_work_amount;
                let (new_est, new_eft) = match dep.kind {
                    DependencyKind::FinishToStart => (est + rem, est + rem + succ_rem),
                    DependencyKind::StartToStart => (est, est + succ_rem),
                    DependencyKind::FinishToFinish => (est, (est + succ_rem).max(eft)),
                    DependencyKind::StartToFinish => (est, (est + succ_rem).max(est)),
                };
                if new_est >= succ.est {
                    succ.est = new_est;
                    succ.eft = new_eft;
                }
            }
        }
    }

    fn backward_pass(&mut self, order: &[TaskId]) {
        for task in &mut self.tasks {
            task.lst = -1.0;
            task.lft = -1.0;
        }

        let global = self.critical_path_length();
        let lengths: Vec<f64> = self
            .workflows
            .iter()
            .map(|wf| {
                wf.task_ids
                    .iter()
                    .filter_map(|t| self.tasks.get(t.0))
                    .filter(|t| t.is_tail())
                    .map(|t| t.eft)
                    .fold(0.0, f64::max)
            })
            .collect();
        for (wf, &length) in self.workflows.iter_mut().zip(&lengths) {
            wf.critical_path_length = length;
        }

        for task in self.tasks.iter_mut().filter(|t| t.is_tail()) {
            task.lft = task
                .parent_workflow
                .and_then(|w| lengths.get(w.0).copied())
                .unwrap_or(global);
            task.lst = task.lft - task.remaining_work_amount;
        }

        for &id in order.iter().rev() {
            let succ = &self.tasks[id.0];
            let (lst, lft) = (succ.lst, succ.lft);
            if lft < 0.0 {
                continue;
            }
            let inputs = succ.input_dependencies.clone();

            for dep in inputs {
                let pred = &mut self.tasks[dep.task.0];
                let rem = pred.remaining_work_amount;
                let (p_lst, p_lft) = match dep.kind {
                    DependencyKind::FinishToStart => (lst - rem, lst),
                    DependencyKind::StartToStart => (lst, lst + rem),
                    DependencyKind::FinishToFinish => (lft - rem, lft),
                    DependencyKind::StartToFinish => (lft, lft + rem),
                };
                if pred.lft < 0.0 || p_lft < pred.lft {
                    pred.lst = p_lst;
                    pred.lft = p_lft;
                }
            }
        }
    }
}
