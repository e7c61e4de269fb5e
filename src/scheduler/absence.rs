//! Absence surgery on recorded logs.
//!
//! Removing absence steps compresses a finished run onto business time only;
//! inserting them stretches it back. Every log of every entity is spliced at
//! the same indices, and `time` moves by the number of steps spliced.
//!
//! The calendar's absence list tracks the absence steps present in the logs.
//! Steps at or past `time` were never recorded and are ignored. A run of
//! absence steps at the very end of the logs is left in place, since no
//! recorded step follows it to anchor a later insertion.
//!
//! Removal followed by insertion of the same steps restores every log's
//! length. Contents at the splice points are rebuilt from neighbouring
//! entries (see [`record`](crate::models::record)), so a step that was READY
//! or ABSENCE before removal may come back as a bridged state.

use crate::models::{record, Project};

impl Project {
    /// Excises the calendar's absence steps from every log.
    ///
    /// `time` shrinks by the number of steps actually removed. Afterwards the
    /// calendar only lists the trailing absence steps still in the logs.
    pub fn remove_absence_time_list(&mut self) {
        let (steps, trailing) = record::removable(&self.calendar.absence_steps(), self.time);
        if !steps.is_empty() {
            self.splice_out(&steps);
        }
        self.time -= steps.len();
        self.calendar.absence_time_list = (self.time - trailing..self.time).collect();
        log::debug!("removed {} absence steps from {}", steps.len(), self.name);
    }

    /// Splices absence steps into every log.
    ///
    /// Any previously inserted absence list is removed first. Steps that would
    /// land at or past the end of the extended logs are skipped. `time` grows
    /// by the number of steps inserted, and the calendar lists exactly the
    /// absence steps now in the logs.
    pub fn insert_absence_time_list(&mut self, absence_time_list: &[usize]) {
        self.remove_absence_time_list();
        let trailing = self.calendar.absence_time_list.len();
        let steps = record::insertable(absence_time_list, self.time, trailing);
        if steps.is_empty() {
            return;
        }

        self.splice_in(&steps);
        self.time += steps.len();
        log::debug!("inserted {} absence steps into {}", steps.len(), self.name);
        self.calendar.absence_time_list = steps
            .into_iter()
            .chain(self.time - trailing..self.time)
            .collect();
    }

    fn splice_out(&mut self, steps: &[usize]) {
        for task in &mut self.tasks {
            task.remove_absence_time_list(steps);
        }
        for c in &mut self.components {
            c.remove_absence_time_list(steps);
        }
        for w in &mut self.workers {
            w.activity.remove_absence_time_list(steps);
        }
        for f in &mut self.facilities {
            f.activity.remove_absence_time_list(steps);
        }
        for team in &mut self.teams {
            team.remove_absence_time_list(steps);
        }
        for wp in &mut self.workplaces {
            wp.remove_absence_time_list(steps);
        }
        record::remove_at(&mut self.cost_record, steps);
    }

    fn splice_in(&mut self, steps: &[usize]) {
        for task in &mut self.tasks {
            task.insert_absence_time_list(steps);
        }
        for c in &mut self.components {
            c.insert_absence_time_list(steps);
        }
        for w in &mut self.workers {
            w.activity.insert_absence_time_list(steps);
        }
        for f in &mut self.facilities {
            f.activity.insert_absence_time_list(steps);
        }
        for team in &mut self.teams {
            team.insert_absence_time_list(steps);
        }
        for wp in &mut self.workplaces {
            wp.insert_absence_time_list(steps);
        }
        record::insert_constant(&mut self.cost_record, steps, 0.0);
    }
}
