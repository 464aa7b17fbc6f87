//! Split tasks: a task broken into ordered, non-overlapping parts.

use rustc_hash::FxHashMap;
use std::hash::Hash;

use crate::models::{Task, TaskId};
use crate::{log_changes, log_debug};

use super::{aggregation, dependency, Project, ProjectResult, Schedule};

/// Forward and reverse lookup between split tasks and their parts.
#[derive(Debug, Default)]
pub(crate) struct SplitTable {
    /// Split task -> parts in time order.
    parts: FxHashMap<TaskId, Vec<TaskId>>,
    /// Part -> owning split task.
    owners: FxHashMap<TaskId, TaskId>,
}

impl SplitTable {
    pub(crate) fn is_split(&self, id: TaskId) -> bool {
        self.parts.contains_key(&id)
    }

    pub(crate) fn is_part(&self, id: TaskId) -> bool {
        self.owners.contains_key(&id)
    }

    pub(crate) fn owner(&self, part: TaskId) -> Option<TaskId> {
        self.owners.get(&part).copied()
    }

    pub(crate) fn parts(&self, split: TaskId) -> &[TaskId] {
        self.parts.get(&split).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Turn `split` into a split task whose only part is `first`.
    fn begin(&mut self, split: TaskId, first: TaskId) {
        self.parts.insert(split, vec![first]);
        self.owners.insert(first, split);
    }

    /// Insert `other` right after `part` in the owning split task.
    fn insert_after(&mut self, part: TaskId, other: TaskId) -> Option<TaskId> {
        let split = self.owner(part)?;
        let list = self.parts.get_mut(&split)?;
        let at = list.iter().position(|p| *p == part).map_or(list.len(), |i| i + 1);
        list.insert(at, other);
        self.owners.insert(other, split);
        Some(split)
    }

    pub(crate) fn remove_part(&mut self, part: TaskId) -> Option<TaskId> {
        let split = self.owners.remove(&part)?;
        if let Some(list) = self.parts.get_mut(&split) {
            list.retain(|p| *p != part);
        }
        Some(split)
    }

    /// Forget `split` as a split task, returning its parts.
    fn dissolve(&mut self, split: TaskId) -> Vec<TaskId> {
        let parts = self.parts.remove(&split).unwrap_or_default();
        for part in &parts {
            self.owners.remove(part);
        }
        parts
    }
}

/// Walk left to right, pushing any part that overlaps its predecessor to
/// start one period after it. Durations are preserved.
pub(crate) fn pack_forward(tasks: &mut FxHashMap<TaskId, Task>, parts: &[TaskId]) {
    for pair in parts.windows(2) {
        let previous_end = tasks[&pair[0]].end;
        if let Some(current) = tasks.get_mut(&pair[1]) {
            if previous_end >= current.start {
                current.shift_to(previous_end.saturating_add(1));
            }
        }
    }
}

/// Walk right to left (never moving the first part), pulling any part that
/// overlaps its successor back to end one period before it. A forward pass
/// then restores the gaps against the first part.
pub(crate) fn pack_backward(tasks: &mut FxHashMap<TaskId, Task>, parts: &[TaskId]) {
    for i in (1..parts.len().saturating_sub(1)).rev() {
        let later_start = tasks[&parts[i + 1]].start;
        if let Some(earlier) = tasks.get_mut(&parts[i]) {
            if later_start <= earlier.end {
                let duration = earlier.duration;
                earlier.set_span(later_start - 1 - duration, later_start - 1);
            }
        }
    }
    pack_forward(tasks, parts);
}

/// Duration-weighted completion of `ids`; 0 when the total duration is 0.
pub(crate) fn weighted_complete(tasks: &FxHashMap<TaskId, Task>, ids: &[TaskId]) -> f32 {
    let (weighted, total) = ids.iter().fold((0.0f64, 0i64), |(w, t), id| {
        let task = &tasks[id];
        (
            w + f64::from(task.complete) * f64::from(task.duration),
            t + i64::from(task.duration),
        )
    });
    if total > 0 {
        (weighted / total as f64) as f32
    } else {
        0.0
    }
}

/// Re-derive a split task's span and completion from its parts.
pub(crate) fn refresh_split(s: &mut Schedule, split: TaskId) {
    let parts = s.splits.parts(split);
    let (Some(first), Some(last)) = (parts.first(), parts.last()) else {
        return;
    };
    let start = s.tasks[first].start;
    let end = s.tasks[last].end;
    let complete = weighted_complete(&s.tasks, parts);
    let task = s.task_mut(split);
    task.set_span(start, end);
    task.complete = complete;
}

impl<R: Eq + Hash> Project<R> {
    /// Split a plain task into two consecutive parts.
    ///
    /// `part1` takes the task's start and `duration` periods (adjusted to
    /// leave at least one period for `part2`); `part2` starts one period
    /// after `part1` ends with the remaining duration. The task's completion
    /// resets to 0.
    pub fn split(
        &mut self,
        task: TaskId,
        part1: Task,
        part2: Task,
        duration: i32,
    ) -> ProjectResult<(TaskId, TaskId)> {
        self.ensure("split", task)?;
        let s = &self.schedule;
        if s.splits.is_split(task) {
            return self.invalid("split", "task is already split");
        }
        if s.splits.is_part(task) {
            return self.invalid("split", "task is a part; use split_part");
        }
        if s.tree.is_group(task) {
            return self.invalid("split", "groups cannot be split");
        }

        let (start, end, whole) = {
            let t = s.task(task);
            (t.start, t.end, t.duration)
        };
        let first = self.register(part1);
        let part = self.schedule.task_mut(first);
        part.set_span(start, end);
        part.complete = 0.0;
        self.schedule.task_mut(task).complete = 0.0;
        self.schedule.splits.begin(task, first);

        let duration = if duration >= whole { duration - 1 } else { duration };
        let second = self.split_part(first, part2, duration)?;
        log_changes!(self.schedule.verbosity, "split: {task} into {first} and {second}");
        Ok((first, second))
    }

    /// Split an existing part, inserting `other` right after it.
    ///
    /// The part keeps `duration` periods (clamped so both pieces get at
    /// least one) and `other` takes the rest, one period later. Following
    /// parts are pushed forward as needed.
    pub fn split_part(&mut self, part: TaskId, other: Task, duration: i32) -> ProjectResult<TaskId> {
        self.ensure("split_part", part)?;
        if !self.schedule.splits.is_part(part) {
            return self.invalid("split_part", "task is not a part of a split task");
        }

        let other = self.register(other);
        let s = &mut self.schedule;
        let Some(split) = s.splits.insert_after(part, other) else {
            unreachable!("part {part} has an owner");
        };

        let start = s.task(part).start;
        let total = s.task(part).duration.max(2);
        let keep = duration.clamp(1, total - 1);
        s.task_mut(part).place(start, keep);
        let other_start = s.task(part).end.saturating_add(1);
        let task = s.task_mut(other);
        task.place(other_start, total - keep);
        task.complete = 0.0;

        pack_forward(&mut s.tasks, &s.splits.parts[&split]);
        refresh_split(s, split);
        log_debug!(
            s.verbosity,
            "split_part: {part} keeps {keep}, {other} takes {}",
            total - keep
        );
        dependency::propagate_from(s, split);
        self.settle();
        log_changes!(self.schedule.verbosity, "split_part: {part} gave {other}");
        Ok(other)
    }

    /// Join `part2` into `part1`; `part2` is deleted.
    ///
    /// The joined part starts at the earlier of the two starts and lasts
    /// their combined duration, and it picks up `part2`'s resources. When
    /// only two parts remain the split task is merged instead.
    pub fn join(&mut self, part1: TaskId, part2: TaskId) -> ProjectResult<()> {
        self.ensure("join", part1)?;
        self.ensure("join", part2)?;
        if part1 == part2 {
            return self.invalid("join", "cannot join a part with itself");
        }
        let splits = &self.schedule.splits;
        let (Some(split), Some(other)) = (splits.owner(part1), splits.owner(part2)) else {
            return self.invalid("join", "both tasks must be parts");
        };
        if split != other {
            return self.invalid("join", "parts belong to different split tasks");
        }
        if splits.parts(split).len() <= 2 {
            self.merge_parts(split);
            log_changes!(self.schedule.verbosity, "join: last two parts, merged {split}");
            return Ok(());
        }

        let s = &mut self.schedule;
        let (a, b) = (s.task(part1).clone(), s.task(part2).clone());
        let forward = a.start < b.start;
        let start = a.start.min(b.start);
        let duration = a.duration.saturating_add(b.duration);
        let complete = weighted_complete(&s.tasks, &[part1, part2]);
        let joined = s.task_mut(part1);
        joined.place(start, duration);
        joined.complete = complete;

        self.ledger.absorb(part1, part2);
        self.schedule.splits.remove_part(part2);
        self.unregister(part2);

        let s = &mut self.schedule;
        let parts = &s.splits.parts[&split];
        if forward {
            pack_forward(&mut s.tasks, parts);
        } else {
            pack_backward(&mut s.tasks, parts);
        }
        refresh_split(s, split);
        dependency::propagate_from(s, split);
        self.settle();
        log_changes!(self.schedule.verbosity, "join: {part2} into {part1}");
        Ok(())
    }

    /// Collapse a split task back into one plain task.
    ///
    /// Its duration becomes the sum of the parts' durations and it takes the
    /// union of their resources. Every part is deleted.
    pub fn merge(&mut self, split: TaskId) -> ProjectResult<()> {
        self.ensure("merge", split)?;
        if !self.schedule.splits.is_split(split) {
            return self.invalid("merge", "task is not split");
        }
        self.merge_parts(split);
        log_changes!(self.schedule.verbosity, "merge: {split}");
        Ok(())
    }

    pub(super) fn merge_parts(&mut self, split: TaskId) {
        let parts = self.schedule.splits.dissolve(split);
        let duration = parts
            .iter()
            .map(|p| self.schedule.task(*p).duration)
            .fold(0i32, i32::saturating_add);
        let complete = weighted_complete(&self.schedule.tasks, &parts);

        for part in &parts {
            self.ledger.absorb(split, *part);
            self.unregister(*part);
        }

        let s = &mut self.schedule;
        s.task_mut(split).complete = complete;
        let end = s.task(split).start.saturating_add(duration);
        aggregation::stretch_end(s, split, end);
        self.settle();
    }

    /// Parts of `split` in time order; empty for other tasks.
    pub fn parts_of(&self, split: TaskId) -> &[TaskId] {
        self.schedule.splits.parts(split)
    }

    pub fn split_task_of(&self, part: TaskId) -> Option<TaskId> {
        self.schedule.splits.owner(part)
    }

    pub fn is_split(&self, task: TaskId) -> bool {
        self.schedule.splits.is_split(task)
    }

    pub fn is_part(&self, task: TaskId) -> bool {
        self.schedule.splits.is_part(task)
    }
}
