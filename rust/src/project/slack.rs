//! Float time and critical paths.

use std::hash::Hash;

use crate::log_debug;
use crate::models::TaskId;

use super::{Project, Schedule};

/// Recompute slack for every task in the tree.
///
/// With dependants, slack is the gap before the earliest of them starts;
/// without, it is the distance to the project's latest end. Parts are not
/// in the tree and keep whatever slack they had.
pub(crate) fn recalculate_slack(s: &mut Schedule) {
    let tasks: Vec<TaskId> = s.tree.walk().collect();
    let Some(max_end) = tasks.iter().map(|id| s.task(*id).end).max() else {
        return;
    };

    for id in tasks {
        let end = s.task(id).end;
        let earliest = s.graph.dependants(id).iter().map(|d| s.task(*d).start).min();
        let slack = match earliest {
            Some(start) => start - end - 1,
            None => max_end - end,
        };
        s.task_mut(id).slack = slack;
    }
    log_debug!(s.verbosity, "slack: recomputed against project end {max_end}");
}

impl<R: Eq + Hash> Project<R> {
    /// One path per task ending at the project's latest end: the task
    /// itself followed by all of its transitive precedents.
    ///
    /// Paths are listed in tree order and may share tasks.
    pub fn critical_paths(&self) -> Vec<Vec<TaskId>> {
        let tree = &self.schedule.tree;
        let Some(max_end) = tree.walk().map(|id| self.schedule.task(id).end).max() else {
            return Vec::new();
        };

        tree.walk()
            .filter(|id| self.schedule.task(*id).end == max_end)
            .map(|id| std::iter::once(id).chain(self.precedents_of(id)).collect())
            .collect()
    }
}
