//! Derived schedule data: group and split spans, completion, and the direct
//! schedule setters that feed them.

use std::hash::Hash;

use crate::models::TaskId;
use crate::{log_changes, log_debug};

use super::split::{pack_backward, pack_forward, refresh_split, weighted_complete};
use super::{dependency, Project, ProjectResult, Schedule};

/// Re-derive every group's span and completion from its members.
///
/// Groups are visited in reverse pre-order, so a nested group is always
/// settled before the group that contains it.
pub(crate) fn recalculate_ancestors(s: &mut Schedule) {
    let groups: Vec<TaskId> = s.tree.walk().filter(|id| s.tree.is_group(*id)).collect();
    for group in groups.into_iter().rev() {
        let members = s.tree.members(group);
        let start = members.iter().map(|m| s.task(*m).start).min();
        let end = members.iter().map(|m| s.task(*m).end).max();
        let complete = weighted_complete(&s.tasks, members);
        let (Some(start), Some(end)) = (start, end) else {
            continue;
        };

        let verbosity = s.verbosity;
        let task = s.task_mut(group);
        if (task.start, task.end) != (start, end) {
            log_debug!(
                verbosity,
                "aggregate: {group} [{}, {}) -> [{start}, {end})",
                task.start,
                task.end
            );
        }
        task.set_span(start, end);
        task.complete = complete;
    }
}

/// Re-derive completion only: split tasks from their parts, groups from
/// their members, bottom-up.
pub(crate) fn recalculate_complete(s: &mut Schedule) {
    let derived: Vec<TaskId> = s
        .tree
        .walk()
        .filter(|id| s.tree.is_group(*id) || s.splits.is_split(*id))
        .collect();
    for id in derived.into_iter().rev() {
        let sources = if s.splits.is_split(id) {
            s.splits.parts(id)
        } else {
            s.tree.members(id)
        };
        let complete = weighted_complete(&s.tasks, sources);
        s.task_mut(id).complete = complete;
    }
}

/// Set the end of a plain or split task, keeping its start.
///
/// A split task's last part ends with it, so the end can't reach back past
/// that part's start.
pub(crate) fn stretch_end(s: &mut Schedule, id: TaskId, value: i32) {
    let last = s.splits.parts(id).last().copied();
    let mut value = value;
    if let Some(last) = last {
        value = value.max(s.task(last).start + 1);
    }
    let start = s.task(id).start;
    value = value.max(start + 1);

    s.task_mut(id).set_span(start, value);
    if let Some(last) = last {
        let part = s.task_mut(last);
        let part_start = part.start;
        part.set_span(part_start, value);
    }
    dependency::propagate_from(s, id);
}

/// Move one part, keeping its duration, then re-pack its siblings.
fn move_part_start(s: &mut Schedule, part: TaskId, value: i32) {
    let Some(split) = s.splits.owner(part) else {
        return;
    };

    let mut value = value;
    let latest_precedent = s.graph.precedents(split).iter().map(|p| s.task(*p).end).max();
    if let Some(max_end) = latest_precedent {
        if value <= max_end {
            value = max_end.saturating_add(1);
        }
    }
    let value = value.max(0);

    let backwards = value < s.task(part).start;
    s.task_mut(part).shift_to(value);
    if backwards {
        pack_backward(&mut s.tasks, s.splits.parts(split));
    } else {
        pack_forward(&mut s.tasks, s.splits.parts(split));
    }
    log_debug!(s.verbosity, "part start: {part} of {split} to {value}");
    refresh_split(s, split);
    dependency::propagate_from(s, split);
}

/// Resize one part; a longer part pushes the following parts forward.
fn move_part_end(s: &mut Schedule, part: TaskId, value: i32) {
    let Some(split) = s.splits.owner(part) else {
        return;
    };

    let (start, end) = (s.task(part).start, s.task(part).end);
    let value = value.max(start + 1);
    s.task_mut(part).set_span(start, value);
    if value > end {
        pack_forward(&mut s.tasks, s.splits.parts(split));
    }
    log_debug!(s.verbosity, "part end: {part} of {split} to {value}");
    refresh_split(s, split);
    dependency::propagate_from(s, split);
}

impl<R: Eq + Hash> Project<R> {
    /// Move a task to start at `value`, keeping its duration.
    ///
    /// The start is clamped to 0 and past the end of every direct
    /// precedent. Moving a part re-packs the other parts of its split task.
    pub fn set_start(&mut self, task: TaskId, value: i32) -> ProjectResult<()> {
        self.ensure("set_start", task)?;
        if self.schedule.tree.is_group(task) {
            return self.invalid("set_start", "group schedules are derived from members");
        }
        if self.schedule.task(task).start == value {
            return self.unchanged("set_start", "task already starts there");
        }

        let s = &mut self.schedule;
        if s.splits.is_part(task) {
            move_part_start(s, task, value);
        } else {
            dependency::push_start(s, task, value);
        }
        self.settle();
        log_changes!(
            self.schedule.verbosity,
            "set_start: {task} now starts at {}",
            self.schedule.task(task).start
        );
        Ok(())
    }

    /// Move the end of a task, keeping its start. The end always stays
    /// after the start.
    pub fn set_end(&mut self, task: TaskId, value: i32) -> ProjectResult<()> {
        self.ensure("set_end", task)?;
        if self.schedule.tree.is_group(task) {
            return self.invalid("set_end", "group schedules are derived from members");
        }
        if self.schedule.task(task).end == value {
            return self.unchanged("set_end", "task already ends there");
        }

        let s = &mut self.schedule;
        if s.splits.is_part(task) {
            move_part_end(s, task, value);
        } else {
            stretch_end(s, task, value);
        }
        self.settle();
        log_changes!(
            self.schedule.verbosity,
            "set_end: {task} now ends at {}",
            self.schedule.task(task).end
        );
        Ok(())
    }

    /// Set the end to `start + duration`, stopping at the end of the axis.
    pub fn set_duration(&mut self, task: TaskId, duration: i32) -> ProjectResult<()> {
        self.ensure("set_duration", task)?;
        let start = self.schedule.task(task).start;
        self.set_end(task, start.saturating_add(duration))
    }

    /// Set completion, clamped to `[0, 1]`.
    ///
    /// Groups and split tasks derive their completion, so only plain tasks
    /// and parts accept it.
    pub fn set_complete(&mut self, task: TaskId, complete: f32) -> ProjectResult<()> {
        self.ensure("set_complete", task)?;
        let s = &self.schedule;
        if s.tree.is_group(task) {
            return self.invalid("set_complete", "group completion is derived from members");
        }
        if s.splits.is_split(task) {
            return self.invalid("set_complete", "split completion is derived from parts");
        }
        if complete.is_nan() {
            return self.invalid("set_complete", "completion must be a number");
        }
        let complete = complete.clamp(0.0, 1.0);
        if s.task(task).complete == complete {
            return self.unchanged("set_complete", "completion unchanged");
        }

        let s = &mut self.schedule;
        s.task_mut(task).complete = complete;
        if let Some(split) = s.splits.owner(task) {
            let derived = weighted_complete(&s.tasks, s.splits.parts(split));
            s.task_mut(split).complete = derived;
        }
        recalculate_complete(s);
        log_changes!(s.verbosity, "set_complete: {task} at {complete}");
        Ok(())
    }

    /// Collapse or expand a group. Display only.
    pub fn set_collapse(&mut self, task: TaskId, collapsed: bool) -> ProjectResult<()> {
        self.ensure("set_collapse", task)?;
        if !self.schedule.tree.is_group(task) {
            return self.invalid("set_collapse", "only groups can collapse");
        }
        if self.schedule.task(task).is_collapsed == collapsed {
            return self.unchanged("set_collapse", "group already in that state");
        }
        self.schedule.task_mut(task).is_collapsed = collapsed;
        log_changes!(self.schedule.verbosity, "set_collapse: {task} = {collapsed}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::models::{Task, TaskId};
    use crate::project::{Project, ProjectError};

    fn span(project: &Project, id: TaskId) -> (i32, i32) {
        let task = project.task(id).unwrap();
        (task.start(), task.end())
    }

    fn complete(project: &Project, id: TaskId) -> f32 {
        project.task(id).unwrap().complete()
    }

    #[test]
    fn test_group_aggregates_members() {
        let mut project: Project = Project::new();
        let g = project.add(Task::new("g"));
        let a = project.add(Task::new("a").with_span(0, 5).with_complete(0.4));
        let b = project.add(Task::new("b").with_span(5, 10).with_complete(0.8));
        project.group(g, a).unwrap();
        project.group(g, b).unwrap();

        assert_eq!(span(&project, g), (0, 10));
        assert_eq!(project.task(g).unwrap().duration(), 10);
        assert!((complete(&project, g) - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_nan_completion_does_not_reach_group() {
        let mut project: Project = Project::new();
        let g = project.add(Task::new("g"));
        let a = project.add(Task::new("a").with_span(0, 5).with_complete(f32::NAN));
        let b = project.add(Task::new("b").with_span(5, 10).with_complete(0.8));
        project.group(g, a).unwrap();
        project.group(g, b).unwrap();

        assert_eq!(complete(&project, a), 0.0);
        assert!((complete(&project, g) - 0.4).abs() < 1e-6);
        assert!(matches!(
            project.set_complete(b, f32::NAN),
            Err(ProjectError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_nested_groups_settle_bottom_up() {
        let mut project: Project = Project::new();
        let outer = project.add(Task::new("outer"));
        let inner = project.add(Task::new("inner"));
        let x = project.add(Task::new("x").with_span(2, 4));
        let y = project.add(Task::new("y").with_span(6, 8));
        project.group(outer, inner).unwrap();
        project.group(inner, x).unwrap();
        project.group(outer, y).unwrap();
        assert_eq!(span(&project, outer), (2, 8));

        project.set_end(x, 20).unwrap();

        assert_eq!(span(&project, inner), (2, 20));
        assert_eq!(span(&project, outer), (2, 20));
        for task in project.tasks() {
            for member in project.children_of(task) {
                let (g, m) = (project.task(task).unwrap(), project.task(*member).unwrap());
                assert!(g.start() <= m.start() && m.end() <= g.end());
            }
        }
    }

    #[test]
    fn test_setters_reject_groups() {
        let mut project: Project = Project::new();
        let g = project.add(Task::new("g"));
        let m = project.add(Task::new("m"));
        project.group(g, m).unwrap();

        assert!(matches!(project.set_start(g, 5), Err(ProjectError::InvalidOperation(_))));
        assert!(matches!(project.set_end(g, 5), Err(ProjectError::InvalidOperation(_))));
        assert!(matches!(project.set_duration(g, 5), Err(ProjectError::InvalidOperation(_))));
        assert!(matches!(
            project.set_complete(g, 0.5),
            Err(ProjectError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_set_start_and_end_bounds() {
        let mut project: Project = Project::new();
        let a = project.add(Task::new("a").with_span(4, 8));

        assert!(matches!(project.set_start(a, 4), Err(ProjectError::NoOp(_))));
        project.set_start(a, -3).unwrap();
        assert_eq!(span(&project, a), (0, 4));

        project.set_end(a, -1).unwrap();
        assert_eq!(span(&project, a), (0, 1));

        project.set_duration(a, 10).unwrap();
        assert_eq!(span(&project, a), (0, 10));
        assert!(matches!(project.set_duration(a, 10), Err(ProjectError::NoOp(_))));
    }

    #[test]
    fn test_setters_stop_at_axis_end() {
        let mut project: Project = Project::new();
        let a = project.add(Task::new("a").with_span(2, 5));
        project.set_duration(a, i32::MAX).unwrap();
        assert_eq!(span(&project, a), (2, i32::MAX));

        let b = project.add(Task::new("b").with_span(0, 10));
        project.set_start(b, i32::MAX - 3).unwrap();
        assert_eq!(span(&project, b), (i32::MAX - 10, i32::MAX));
        assert_eq!(project.task(b).unwrap().duration(), 10);
    }

    #[test]
    fn test_set_start_on_part_packs_forward() {
        let mut project: Project = Project::new();
        let t = project.add(Task::new("t").with_span(0, 10));
        let (p1, p2) = project.split(t, Task::new("p1"), Task::new("p2"), 4).unwrap();
        // p1 [0,4) p2 [5,11)

        project.set_start(p1, 3).unwrap();

        assert_eq!(span(&project, p1), (3, 7));
        assert_eq!(span(&project, p2), (8, 14));
        assert_eq!(span(&project, t), (3, 14));
    }

    #[test]
    fn test_part_cannot_overlap_earlier_part() {
        let mut project: Project = Project::new();
        let t = project.add(Task::new("t").with_span(0, 10));
        let (p1, p2) = project.split(t, Task::new("p1"), Task::new("p2"), 4).unwrap();

        project.set_start(p2, 2).unwrap();

        assert_eq!(span(&project, p1), (0, 4));
        assert_eq!(span(&project, p2), (5, 11));
    }

    #[test]
    fn test_part_start_respects_split_precedents() {
        let mut project: Project = Project::new();
        let a = project.add(Task::new("a").with_span(0, 5));
        let t = project.add(Task::new("t").with_span(0, 4));
        project.relate(a, t).unwrap();
        let (p1, _) = project.split(t, Task::new("p1"), Task::new("p2"), 2).unwrap();
        assert_eq!(span(&project, p1), (6, 8));

        project.set_start(p1, 2).unwrap();

        assert_eq!(span(&project, p1), (6, 8));
        assert_eq!(project.task(t).unwrap().start(), 6);
    }

    #[test]
    fn test_part_end_pushes_parts_and_dependants() {
        let mut project: Project = Project::new();
        let t = project.add(Task::new("t").with_span(0, 10));
        let d = project.add(Task::new("d").with_span(0, 2));
        let (p1, p2) = project.split(t, Task::new("p1"), Task::new("p2"), 4).unwrap();
        project.relate(t, d).unwrap();
        assert_eq!(span(&project, d), (12, 14));

        project.set_end(p1, 7).unwrap();

        assert_eq!(span(&project, p1), (0, 7));
        assert_eq!(span(&project, p2), (8, 14));
        assert_eq!(span(&project, t), (0, 14));
        assert_eq!(span(&project, d), (15, 17));
    }

    #[test]
    fn test_set_end_on_split_moves_last_part() {
        let mut project: Project = Project::new();
        let t = project.add(Task::new("t").with_span(0, 10));
        let (_, p2) = project.split(t, Task::new("p1"), Task::new("p2"), 4).unwrap();

        project.set_end(t, 20).unwrap();
        assert_eq!(span(&project, t), (0, 20));
        assert_eq!(span(&project, p2), (5, 20));

        // can't end before the last part starts
        project.set_end(t, 3).unwrap();
        assert_eq!(span(&project, t), (0, 6));
        assert_eq!(span(&project, p2), (5, 6));
    }

    #[test]
    fn test_set_start_on_split_carries_parts() {
        let mut project: Project = Project::new();
        let t = project.add(Task::new("t").with_span(0, 10));
        let (p1, p2) = project.split(t, Task::new("p1"), Task::new("p2"), 4).unwrap();

        project.set_start(t, 10).unwrap();

        assert_eq!(span(&project, t), (10, 21));
        assert_eq!(span(&project, p1), (10, 14));
        assert_eq!(span(&project, p2), (15, 21));
    }

    #[test]
    fn test_set_complete() {
        let mut project: Project = Project::new();
        let g = project.add(Task::new("g"));
        let a = project.add(Task::new("a").with_span(0, 2));
        let b = project.add(Task::new("b").with_span(0, 6));
        project.group(g, a).unwrap();
        project.group(g, b).unwrap();

        project.set_complete(a, 1.5).unwrap();
        assert_eq!(complete(&project, a), 1.0);
        assert!((complete(&project, g) - 0.25).abs() < 1e-6);
        assert!(matches!(project.set_complete(a, 1.0), Err(ProjectError::NoOp(_))));
        assert!(matches!(
            project.set_complete(a, f32::NAN),
            Err(ProjectError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_set_complete_on_parts_updates_split() {
        let mut project: Project = Project::new();
        let g = project.add(Task::new("g"));
        let t = project.add(Task::new("t").with_span(0, 6));
        project.group(g, t).unwrap();
        let (p1, _) = project.split(t, Task::new("p1"), Task::new("p2"), 2).unwrap();
        // p1 [0,2) p2 [3,7)

        project.set_complete(p1, 0.5).unwrap();

        assert!((complete(&project, t) - 1.0 / 6.0).abs() < 1e-6);
        assert!((complete(&project, g) - 1.0 / 6.0).abs() < 1e-6);
        assert!(matches!(
            project.set_complete(t, 0.2),
            Err(ProjectError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_set_collapse_groups_only() {
        let mut project: Project = Project::new();
        let g = project.add(Task::new("g"));
        let m = project.add(Task::new("m"));
        project.group(g, m).unwrap();

        project.set_collapse(g, true).unwrap();
        assert!(project.task(g).unwrap().is_collapsed());
        assert!(matches!(project.set_collapse(g, true), Err(ProjectError::NoOp(_))));
        assert!(matches!(
            project.set_collapse(m, true),
            Err(ProjectError::InvalidOperation(_))
        ));
    }
}
