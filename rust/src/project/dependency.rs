//! Precedence relations between tasks and schedule propagation along them.

use rustc_hash::{FxHashMap, FxHashSet};
use std::hash::Hash;

use crate::models::TaskId;
use crate::{log_changes, log_debug};

use super::{slack, Project, ProjectResult, Schedule};

/// Adjacency in both directions so reverse lookups stay O(1).
///
/// Edges only connect plain or split tasks; parts are resolved to their split
/// task and groups never take part in relations.
#[derive(Debug, Default)]
pub(crate) struct DependencyGraph {
    dependants: FxHashMap<TaskId, Vec<TaskId>>,
    precedents: FxHashMap<TaskId, Vec<TaskId>>,
}

impl DependencyGraph {
    /// Record `precedent -> dependant`. Returns false if the edge exists.
    pub(crate) fn insert(&mut self, precedent: TaskId, dependant: TaskId) -> bool {
        let out = self.dependants.entry(precedent).or_default();
        if out.contains(&dependant) {
            return false;
        }
        out.push(dependant);
        self.precedents.entry(dependant).or_default().push(precedent);
        true
    }

    pub(crate) fn remove(&mut self, precedent: TaskId, dependant: TaskId) -> bool {
        let Some(out) = self.dependants.get_mut(&precedent) else {
            return false;
        };
        let before = out.len();
        out.retain(|d| *d != dependant);
        if out.len() == before {
            return false;
        }
        if let Some(inc) = self.precedents.get_mut(&dependant) {
            inc.retain(|p| *p != precedent);
        }
        true
    }

    /// Drop every outgoing edge of `precedent`; returns how many were removed.
    pub(crate) fn clear_dependants(&mut self, precedent: TaskId) -> usize {
        let removed = self.dependants.remove(&precedent).unwrap_or_default();
        for dependant in &removed {
            if let Some(inc) = self.precedents.get_mut(dependant) {
                inc.retain(|p| *p != precedent);
            }
        }
        removed.len()
    }

    /// Drop every edge touching `id`, in both directions.
    pub(crate) fn remove_task(&mut self, id: TaskId) {
        self.clear_dependants(id);
        for precedent in self.precedents.remove(&id).unwrap_or_default() {
            if let Some(out) = self.dependants.get_mut(&precedent) {
                out.retain(|d| *d != id);
            }
        }
    }

    pub(crate) fn dependants(&self, id: TaskId) -> &[TaskId] {
        self.dependants.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn precedents(&self, id: TaskId) -> &[TaskId] {
        self.precedents.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn has_relations(&self, id: TaskId) -> bool {
        !self.dependants(id).is_empty() || !self.precedents(id).is_empty()
    }

    pub(crate) fn reachable_dependants(&self, id: TaskId) -> Reachable<'_> {
        Reachable::new(&self.dependants, id)
    }

    pub(crate) fn reachable_precedents(&self, id: TaskId) -> Reachable<'_> {
        Reachable::new(&self.precedents, id)
    }
}

/// Depth-first walk of the transitive closure along one edge direction.
///
/// Each task is yielded once even when several chains reach it.
pub struct Reachable<'a> {
    edges: &'a FxHashMap<TaskId, Vec<TaskId>>,
    stack: Vec<TaskId>,
    seen: FxHashSet<TaskId>,
}

impl<'a> Reachable<'a> {
    fn new(edges: &'a FxHashMap<TaskId, Vec<TaskId>>, origin: TaskId) -> Self {
        let stack = edges
            .get(&origin)
            .map(|next| next.iter().rev().copied().collect())
            .unwrap_or_default();
        let mut seen = FxHashSet::default();
        seen.insert(origin);
        Self { edges, stack, seen }
    }
}

impl Iterator for Reachable<'_> {
    type Item = TaskId;

    fn next(&mut self) -> Option<TaskId> {
        while let Some(id) = self.stack.pop() {
            if !self.seen.insert(id) {
                continue;
            }
            if let Some(next) = self.edges.get(&id) {
                self.stack.extend(next.iter().rev().copied());
            }
            return Some(id);
        }
        None
    }
}

/// Push every direct dependant of `precedent` that starts at or before its
/// end to `end + 1`, cascading down the chain.
pub(crate) fn propagate_from(s: &mut Schedule, precedent: TaskId) {
    let end = s.task(precedent).end;
    let dependants = s.graph.dependants(precedent).to_vec();
    for dependant in dependants {
        let start = s.task(dependant).start;
        if start <= end {
            log_debug!(
                s.verbosity,
                "propagate: {dependant} pushed from {start} to {} after {precedent}",
                end.saturating_add(1)
            );
            push_start(s, dependant, end.saturating_add(1));
        }
    }
}

/// Move a plain or split task to start at `value`, keeping its duration.
///
/// The start never goes below 0 nor at or before the end of a direct
/// precedent. A split task carries its parts along by the same offset.
pub(crate) fn push_start(s: &mut Schedule, id: TaskId, value: i32) {
    let current = s.task(id).start;
    if current == value {
        return;
    }

    let mut value = value.max(0);
    let latest_precedent = s.graph.precedents(id).iter().map(|p| s.task(*p).end).max();
    if let Some(max_end) = latest_precedent {
        if value <= max_end {
            value = max_end.saturating_add(1);
        }
    }

    s.task_mut(id).shift_to(value);
    let offset = s.task(id).start - current;
    propagate_from(s, id);

    if offset != 0 {
        let parts = s.splits.parts(id).to_vec();
        for part in parts {
            let task = s.task_mut(part);
            let start = task.start.saturating_add(offset);
            task.shift_to(start);
        }
    }
}

impl<R: Eq + Hash> Project<R> {
    /// Make `dependant` wait for `precedent` to finish.
    ///
    /// Parts resolve to their split task. Rejected when both ends resolve to
    /// the same task, either end is a group, or `precedent` can already be
    /// reached from `dependant`.
    pub fn relate(&mut self, precedent: TaskId, dependant: TaskId) -> ProjectResult<()> {
        self.ensure("relate", precedent)?;
        self.ensure("relate", dependant)?;
        let s = &self.schedule;
        let precedent = s.resolve(precedent);
        let dependant = s.resolve(dependant);

        if precedent == dependant {
            return self.invalid("relate", "a task cannot depend on itself");
        }
        if s.tree.is_group(precedent) || s.tree.is_group(dependant) {
            return self.invalid("relate", "groups cannot have relations");
        }
        if s.graph.reachable_dependants(dependant).any(|d| d == precedent) {
            return self.invalid("relate", "relation would create a cycle");
        }
        if !self.schedule.graph.insert(precedent, dependant) {
            return self.unchanged("relate", "tasks are already related");
        }

        propagate_from(&mut self.schedule, precedent);
        self.settle();
        log_changes!(self.schedule.verbosity, "relate: {precedent} -> {dependant}");
        Ok(())
    }

    /// Remove the relation between `precedent` and `dependant`.
    pub fn unrelate(&mut self, precedent: TaskId, dependant: TaskId) -> ProjectResult<()> {
        self.ensure("unrelate", precedent)?;
        self.ensure("unrelate", dependant)?;
        let precedent = self.schedule.resolve(precedent);
        let dependant = self.schedule.resolve(dependant);

        if !self.schedule.graph.remove(precedent, dependant) {
            return self.unchanged("unrelate", "tasks are not related");
        }
        slack::recalculate_slack(&mut self.schedule);
        log_changes!(self.schedule.verbosity, "unrelate: {precedent} -> {dependant}");
        Ok(())
    }

    /// Remove every relation where `precedent` is the precedent.
    pub fn unrelate_all(&mut self, precedent: TaskId) -> ProjectResult<()> {
        self.ensure("unrelate_all", precedent)?;
        let precedent = self.schedule.resolve(precedent);

        let removed = self.schedule.graph.clear_dependants(precedent);
        if removed == 0 {
            return self.unchanged("unrelate_all", "task has no dependants");
        }
        slack::recalculate_slack(&mut self.schedule);
        log_changes!(
            self.schedule.verbosity,
            "unrelate_all: {precedent} lost {removed} dependants"
        );
        Ok(())
    }

    pub fn direct_precedents_of(&self, task: TaskId) -> &[TaskId] {
        self.schedule.graph.precedents(task)
    }

    pub fn direct_dependants_of(&self, task: TaskId) -> &[TaskId] {
        self.schedule.graph.dependants(task)
    }

    /// Every task `task` waits on, directly or through a chain.
    pub fn precedents_of(&self, task: TaskId) -> Reachable<'_> {
        self.schedule.graph.reachable_precedents(task)
    }

    /// Every task waiting on `task`, directly or through a chain.
    pub fn dependants_of(&self, task: TaskId) -> Reachable<'_> {
        self.schedule.graph.reachable_dependants(task)
    }

    /// Tasks that have at least one dependant, in tree order then id order.
    pub fn precedents(&self) -> Vec<TaskId> {
        let graph = &self.schedule.graph;
        let mut found: Vec<TaskId> = graph
            .dependants
            .iter()
            .filter(|(_, out)| !out.is_empty())
            .map(|(id, _)| *id)
            .collect();
        found.sort_by_key(|id| (self.index_of(*id).unwrap_or(usize::MAX), *id));
        found
    }

    /// Whether `task` has any dependant or precedent.
    pub fn has_relations(&self, task: TaskId) -> bool {
        self.contains(task) && self.schedule.graph.has_relations(task)
    }
}
