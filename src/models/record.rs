//! Per-step record logs and the splice helpers used for absence surgery.
//!
//! Every entity keeps chronological logs (one entry per simulated step).
//! Absence insertion and removal rewrite those logs at the same indices
//! across all entities, so the index arithmetic lives here once.

/// Removes the entries at `indices` from `log`.
///
/// Indices are applied from highest to lowest so earlier removals do not
/// shift later ones. Out-of-range indices are ignored.
pub fn remove_at<T>(log: &mut Vec<T>, indices: &[usize]) {
    for i in descending(indices) {
        if i < log.len() {
            log.remove(i);
        }
    }
}

/// Inserts one entry per index into `log`.
///
/// Indices are applied from lowest to highest, each relative to the log as
/// already extended. `fill(prev, next)` builds the new entry from the entries
/// that will surround it. An index at or past the end of the log is skipped,
/// so every inserted entry has a recorded step after it.
pub fn insert_at<T, F>(log: &mut Vec<T>, indices: &[usize], mut fill: F)
where
    F: FnMut(Option<&T>, Option<&T>) -> T,
{
    for at in ascending(indices) {
        if at >= log.len() {
            break;
        }
        let prev = at.checked_sub(1).and_then(|p| log.get(p));
        let value = fill(prev, log.get(at));
        log.insert(at, value);
    }
}

/// Inserts copies of the preceding entry, or `first` at index 0.
pub fn insert_duplicating<T: Clone>(log: &mut Vec<T>, indices: &[usize], first: T) {
    insert_at(log, indices, |prev, _| prev.cloned().unwrap_or_else(|| first.clone()));
}

/// Inserts `value` at every index.
pub fn insert_constant<T: Clone>(log: &mut Vec<T>, indices: &[usize], value: T) {
    insert_at(log, indices, |_, _| value.clone());
}

/// Splits absence steps of a log of length `len` into the steps that can be
/// excised and the trailing run that must stay.
///
/// Steps at or past `len` were never recorded and are dropped. Steps forming
/// a contiguous run up to the last entry stay in place: nothing follows them,
/// so [`insertable`] could not put them back at the same index.
///
/// Returns `(removable, trailing)`.
pub fn removable(steps: &[usize], len: usize) -> (Vec<usize>, usize) {
    let recorded: Vec<usize> = ascending(steps).into_iter().filter(|&s| s < len).collect();
    let trailing = recorded
        .iter()
        .rev()
        .zip((0..len).rev())
        .take_while(|(s, i)| *s == i)
        .count();
    let removable = recorded[..recorded.len() - trailing].to_vec();
    (removable, trailing)
}

/// Absence steps that can be spliced into a log of length `len` whose last
/// `trailing` entries are already absence steps.
///
/// Each kept step must land before that trailing run in the extended log.
pub fn insertable(steps: &[usize], len: usize, trailing: usize) -> Vec<usize> {
    let mut end = len.saturating_sub(trailing);
    let mut kept = Vec::new();
    for s in ascending(steps) {
        if s >= end {
            break;
        }
        kept.push(s);
        end += 1;
    }
    kept
}

fn ascending(indices: &[usize]) -> Vec<usize> {
    let mut sorted = indices.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted
}

fn descending(indices: &[usize]) -> Vec<usize> {
    let mut sorted = ascending(indices);
    sorted.reverse();
    sorted
}
