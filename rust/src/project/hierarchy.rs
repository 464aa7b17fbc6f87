//! Group hierarchy: root ordering, member lists and parent lookup.

use rustc_hash::FxHashMap;
use std::hash::Hash;

use crate::log_changes;
use crate::models::TaskId;

use super::ordering::TreeWalk;
use super::{Project, ProjectError, ProjectResult};

/// Parent/child tables for every task in the tree.
///
/// Split parts never appear here. Each tree task sits in exactly one
/// container: the root list, or the member list of its parent.
#[derive(Debug, Default)]
pub(crate) struct Hierarchy {
    roots: Vec<TaskId>,
    members: FxHashMap<TaskId, Vec<TaskId>>,
    parents: FxHashMap<TaskId, TaskId>,
}

impl Hierarchy {
    pub(crate) fn insert_root(&mut self, id: TaskId) {
        self.roots.push(id);
        self.members.insert(id, Vec::new());
    }

    /// Take a task out of the tree. Its members must already be gone.
    pub(crate) fn remove(&mut self, id: TaskId) {
        self.detach(id);
        self.members.remove(&id);
    }

    pub(crate) fn members(&self, id: TaskId) -> &[TaskId] {
        self.members.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn parent(&self, id: TaskId) -> Option<TaskId> {
        self.parents.get(&id).copied()
    }

    pub(crate) fn is_group(&self, id: TaskId) -> bool {
        !self.members(id).is_empty()
    }

    pub(crate) fn walk(&self) -> TreeWalk<'_> {
        TreeWalk::new(self, &self.roots)
    }

    pub(crate) fn descendants(&self, id: TaskId) -> TreeWalk<'_> {
        TreeWalk::new(self, self.members(id))
    }

    pub(crate) fn ancestors(&self, id: TaskId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            current: self.parent(id),
        }
    }

    /// Leave the current container; the task stays registered.
    pub(crate) fn detach(&mut self, id: TaskId) {
        match self.parents.remove(&id) {
            Some(parent) => {
                if let Some(list) = self.members.get_mut(&parent) {
                    list.retain(|m| *m != id);
                }
            }
            None => self.roots.retain(|r| *r != id),
        }
    }

    /// Append `member` to the member list of `group`.
    pub(crate) fn attach(&mut self, group: TaskId, member: TaskId) {
        self.members.entry(group).or_default().push(member);
        self.parents.insert(member, group);
    }

    /// Position of `id` within its container.
    pub(crate) fn position(&self, id: TaskId) -> Option<usize> {
        self.container(self.parent(id)).iter().position(|t| *t == id)
    }

    /// Insert `id` at `index` of the container owned by `parent` (None = roots).
    pub(crate) fn insert_at(&mut self, parent: Option<TaskId>, index: usize, id: TaskId) {
        let list = self.container_mut(parent);
        let index = index.min(list.len());
        list.insert(index, id);
        match parent {
            Some(parent) => {
                self.parents.insert(id, parent);
            }
            None => {
                self.parents.remove(&id);
            }
        }
    }

    /// Empty the member list of `group`, splicing the members into the
    /// group's own container right after it. Returns the promoted members.
    pub(crate) fn dissolve(&mut self, group: TaskId) -> Vec<TaskId> {
        let promoted = self
            .members
            .get_mut(&group)
            .map(std::mem::take)
            .unwrap_or_default();
        let parent = self.parent(group);
        let at = self.position(group).map_or(0, |i| i + 1);
        for (offset, member) in promoted.iter().enumerate() {
            self.insert_at(parent, at + offset, *member);
        }
        promoted
    }

    fn container(&self, parent: Option<TaskId>) -> &[TaskId] {
        match parent {
            Some(parent) => self.members(parent),
            None => &self.roots,
        }
    }

    fn container_mut(&mut self, parent: Option<TaskId>) -> &mut Vec<TaskId> {
        match parent {
            Some(parent) => self.members.entry(parent).or_default(),
            None => &mut self.roots,
        }
    }
}

/// Iterator over the parent, grandparent, ... of a task.
pub struct Ancestors<'a> {
    tree: &'a Hierarchy,
    current: Option<TaskId>,
}

impl Iterator for Ancestors<'_> {
    type Item = TaskId;

    fn next(&mut self) -> Option<TaskId> {
        let id = self.current?;
        self.current = self.tree.parent(id);
        Some(id)
    }
}

impl<R: Eq + Hash> Project<R> {
    /// Put `member` under `group`.
    ///
    /// A part is resolved to its split task. Rejected when `group` is the
    /// member itself, a split task or part, a descendant of the member, or
    /// has relations of its own.
    pub fn group(&mut self, group: TaskId, member: TaskId) -> ProjectResult<()> {
        self.ensure("group", group)?;
        self.ensure("group", member)?;
        let member = self.schedule.resolve(member);
        let s = &self.schedule;

        if group == member {
            return self.invalid("group", "a task cannot be grouped under itself");
        }
        if s.splits.is_split(group) || s.splits.is_part(group) {
            return self.invalid("group", "split tasks and parts cannot become groups");
        }
        if s.tree.descendants(member).any(|d| d == group) {
            return self.invalid("group", "grouping would make a task its own ancestor");
        }
        if s.graph.has_relations(group) {
            return self.invalid("group", "a task with relations cannot become a group");
        }

        let tree = &mut self.schedule.tree;
        tree.detach(member);
        tree.attach(group, member);
        self.order.invalidate();
        self.settle();
        log_changes!(self.schedule.verbosity, "group: {member} under {group}");
        Ok(())
    }

    /// Take `member` out of `group` and place it in the root list right after
    /// the group's top-most ancestor.
    pub fn ungroup(&mut self, group: TaskId, member: TaskId) -> ProjectResult<()> {
        self.ensure("ungroup", group)?;
        self.ensure("ungroup", member)?;
        let member = self.schedule.resolve(member);
        let tree = &self.schedule.tree;

        if !tree.is_group(group) {
            return self.invalid("ungroup", "task is not a group");
        }
        if tree.parent(member) != Some(group) {
            return self.invalid("ungroup", "task is not a member of the group");
        }

        let anchor = tree.ancestors(group).last().unwrap_or(group);
        let tree = &mut self.schedule.tree;
        tree.detach(member);
        let at = tree.position(anchor).map_or(0, |i| i + 1);
        tree.insert_at(None, at, member);
        self.order.invalidate();
        self.settle();
        log_changes!(self.schedule.verbosity, "ungroup: {member} from {group}");
        Ok(())
    }

    /// Promote every member of `group` to the group's own container. The
    /// group becomes a plain task.
    pub fn ungroup_all(&mut self, group: TaskId) -> ProjectResult<()> {
        self.ensure("ungroup_all", group)?;
        if !self.schedule.tree.is_group(group) {
            return self.unchanged("ungroup_all", "task has no members");
        }
        self.dissolve_group(group);
        log_changes!(self.schedule.verbosity, "ungroup_all: {group}");
        Ok(())
    }

    pub(super) fn dissolve_group(&mut self, group: TaskId) {
        self.schedule.tree.dissolve(group);
        self.order.invalidate();
        self.settle();
    }

    /// Reposition `task` by `offset` steps in the pre-order traversal.
    ///
    /// The task takes the place of the element found at `index + offset`
    /// (clamped), joining that element's container. An offset past the end
    /// appends the task to the root list.
    pub fn move_by(&mut self, task: TaskId, offset: i32) -> ProjectResult<()> {
        self.ensure("move_by", task)?;
        if self.schedule.splits.is_part(task) {
            return self.invalid("move_by", "parts are not positioned in the task tree");
        }
        if offset == 0 {
            return self.unchanged("move_by", "offset is zero");
        }
        let Some(index) = self.index_of(task) else {
            return self.reject("move_by", ProjectError::TaskNotFound(task));
        };

        let tree = &self.schedule.tree;
        let count = tree.walk().count() as i64;
        let target = (index as i64 + i64::from(offset)).clamp(0, count) as usize;
        let displaced = tree.walk().nth(target);

        match displaced {
            None => {
                let tree = &mut self.schedule.tree;
                tree.detach(task);
                tree.insert_at(None, usize::MAX, task);
            }
            Some(displaced) if displaced == task => {
                return self.unchanged("move_by", "task is already at that position");
            }
            Some(displaced) => {
                if tree.descendants(task).any(|d| d == displaced) {
                    return self.invalid("move_by", "a group cannot move into its own subtree");
                }
                // position is taken before the task leaves its container
                let parent = tree.parent(displaced);
                let at = tree.position(displaced).unwrap_or(0);
                let tree = &mut self.schedule.tree;
                tree.detach(task);
                tree.insert_at(parent, at, task);
            }
        }

        self.order.invalidate();
        self.settle();
        log_changes!(self.schedule.verbosity, "move_by: {task} by {offset}");
        Ok(())
    }

    /// Pre-order traversal of the whole forest: roots in order, each followed
    /// by its members, recursively. Parts are not included.
    pub fn tasks(&self) -> TreeWalk<'_> {
        self.schedule.tree.walk()
    }

    /// Direct members of `group`, in order.
    pub fn children_of(&self, group: TaskId) -> &[TaskId] {
        self.schedule.tree.members(group)
    }

    /// Members, their members, and so on, in pre-order.
    pub fn descendants_of(&self, group: TaskId) -> TreeWalk<'_> {
        self.schedule.tree.descendants(group)
    }

    /// Parent first, then up to the root.
    pub fn ancestors_of(&self, task: TaskId) -> Ancestors<'_> {
        self.schedule.tree.ancestors(task)
    }

    pub fn parent_of(&self, task: TaskId) -> Option<TaskId> {
        self.schedule.tree.parent(task)
    }

    pub fn is_group(&self, task: TaskId) -> bool {
        self.schedule.tree.is_group(task)
    }

    pub fn is_member(&self, task: TaskId) -> bool {
        self.parent_of(task).is_some()
    }
}
