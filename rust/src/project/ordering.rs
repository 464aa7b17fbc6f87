//! Pre-order traversal of the task tree and the cached position index.

use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::hash::Hash;

use crate::models::TaskId;

use super::hierarchy::Hierarchy;
use super::Project;

/// Depth-first, pre-order walk over part of the task tree.
///
/// Uses an explicit stack, so deep hierarchies don't recurse. Each call to
/// [`Project::tasks`] starts a fresh walk.
pub struct TreeWalk<'a> {
    tree: &'a Hierarchy,
    stack: Vec<TaskId>,
}

impl<'a> TreeWalk<'a> {
    pub(crate) fn new(tree: &'a Hierarchy, start: &[TaskId]) -> Self {
        Self {
            tree,
            stack: start.iter().rev().copied().collect(),
        }
    }
}

impl Iterator for TreeWalk<'_> {
    type Item = TaskId;

    fn next(&mut self) -> Option<TaskId> {
        let visited = self.stack.pop()?;
        // push in reverse so the first member is visited next
        self.stack
            .extend(self.tree.members(visited).iter().rev().copied());
        Some(visited)
    }
}

/// Lazily built map from task to its position in the full pre-order walk.
///
/// Cleared by every structural change and rebuilt on the next query.
#[derive(Debug, Default)]
pub(crate) struct OrderingIndex {
    positions: RefCell<Option<FxHashMap<TaskId, usize>>>,
}

impl OrderingIndex {
    pub(crate) fn invalidate(&mut self) {
        self.positions.get_mut().take();
    }

    pub(crate) fn position(&self, tree: &Hierarchy, id: TaskId) -> Option<usize> {
        let mut cache = self.positions.borrow_mut();
        let positions = cache.get_or_insert_with(|| {
            tree.walk()
                .enumerate()
                .map(|(index, task)| (task, index))
                .collect()
        });
        positions.get(&id).copied()
    }

    #[cfg(test)]
    pub(crate) fn is_built(&self) -> bool {
        self.positions.borrow().is_some()
    }
}

impl<R: Eq + Hash> Project<R> {
    /// Zero-based position of `task` in [`Project::tasks`].
    ///
    /// `None` for unregistered tasks and split parts.
    pub fn index_of(&self, task: TaskId) -> Option<usize> {
        if !self.contains(task) {
            return None;
        }
        self.order.position(&self.schedule.tree, task)
    }
}

#[cfg(test)]
mod tests {
    use crate::models::Task;
    use crate::project::Project;

    #[test]
    fn test_pre_order_visits_members_before_next_root() {
        let mut project: Project = Project::new();
        let r1 = project.add(Task::new("r1"));
        let a = project.add(Task::new("a"));
        let a1 = project.add(Task::new("a1"));
        let b = project.add(Task::new("b"));
        let r2 = project.add(Task::new("r2"));
        project.group(r1, a).unwrap();
        project.group(a, a1).unwrap();
        project.group(r1, b).unwrap();

        assert_eq!(project.tasks().collect::<Vec<_>>(), vec![r1, a, a1, b, r2]);
        // restartable
        assert_eq!(project.tasks().count(), 5);
    }

    #[test]
    fn test_index_cache_lifecycle() {
        let mut project: Project = Project::new();
        let a = project.add(Task::new("a"));
        let b = project.add(Task::new("b"));
        assert!(!project.order.is_built());

        assert_eq!(project.index_of(b), Some(1));
        assert!(project.order.is_built());

        project.move_by(b, -1).unwrap();
        assert!(!project.order.is_built());
        assert_eq!(project.index_of(b), Some(0));
        assert_eq!(project.index_of(a), Some(1));
    }

    #[test]
    fn test_index_of_parts_and_unknown() {
        let mut project: Project = Project::new();
        let t = project.add(Task::new("t").with_span(0, 5));
        let (p1, _) = project.split(t, Task::new("p1"), Task::new("p2"), 2).unwrap();
        assert_eq!(project.index_of(t), Some(0));
        assert_eq!(project.index_of(p1), None);
        assert_eq!(project.index_of(crate::models::TaskId::from(99)), None);
    }
}
