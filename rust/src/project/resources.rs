//! Many-to-many assignment of caller resources to tasks.

use rustc_hash::{FxHashMap, FxHashSet};
use std::hash::Hash;

use crate::log_changes;
use crate::models::TaskId;

use super::{Project, ProjectResult};

/// Resources per registered task. Every registered task has an entry, so
/// the inverse lookup is a scan over the entries.
#[derive(Debug)]
pub(crate) struct ResourceLedger<R> {
    assignments: FxHashMap<TaskId, FxHashSet<R>>,
}

impl<R> Default for ResourceLedger<R> {
    fn default() -> Self {
        Self {
            assignments: FxHashMap::default(),
        }
    }
}

impl<R: Eq + Hash> ResourceLedger<R> {
    pub(crate) fn register(&mut self, task: TaskId) {
        self.assignments.entry(task).or_default();
    }

    pub(crate) fn remove_task(&mut self, task: TaskId) {
        self.assignments.remove(&task);
    }

    /// Returns false if the pair already existed.
    pub(crate) fn assign(&mut self, task: TaskId, resource: R) -> bool {
        self.assignments.entry(task).or_default().insert(resource)
    }

    pub(crate) fn unassign(&mut self, task: TaskId, resource: &R) -> bool {
        self.assignments
            .get_mut(&task)
            .is_some_and(|set| set.remove(resource))
    }

    /// Drop every resource of `task`; returns how many were dropped.
    pub(crate) fn clear(&mut self, task: TaskId) -> usize {
        self.assignments
            .get_mut(&task)
            .map_or(0, |set| std::mem::take(set).len())
    }

    /// Remove `resource` from every task; returns how many tasks lost it.
    pub(crate) fn unassign_everywhere(&mut self, resource: &R) -> usize {
        self.assignments
            .values_mut()
            .map(|set| set.remove(resource))
            .filter(|removed| *removed)
            .count()
    }

    /// Move every resource of `from` onto `into`.
    pub(crate) fn absorb(&mut self, into: TaskId, from: TaskId) {
        let moved = self
            .assignments
            .get_mut(&from)
            .map(std::mem::take)
            .unwrap_or_default();
        self.assignments.entry(into).or_default().extend(moved);
    }

    pub(crate) fn resources(&self) -> FxHashSet<&R> {
        self.assignments.values().flatten().collect()
    }

    pub(crate) fn resources_of(&self, task: TaskId) -> impl Iterator<Item = &R> {
        self.assignments.get(&task).into_iter().flatten()
    }

    pub(crate) fn tasks_of(&self, resource: &R) -> Vec<TaskId> {
        let mut tasks: Vec<TaskId> = self
            .assignments
            .iter()
            .filter(|(_, set)| set.contains(resource))
            .map(|(task, _)| *task)
            .collect();
        tasks.sort_unstable();
        tasks
    }
}

impl<R: Eq + Hash> Project<R> {
    /// Assign `resource` to `task`. Assigning twice is harmless.
    pub fn assign(&mut self, task: TaskId, resource: R) -> ProjectResult<()> {
        self.ensure("assign", task)?;
        if self.ledger.assign(task, resource) {
            log_changes!(self.schedule.verbosity, "assign: resource added to {task}");
        }
        Ok(())
    }

    pub fn unassign(&mut self, task: TaskId, resource: &R) -> ProjectResult<()> {
        self.ensure("unassign", task)?;
        if !self.ledger.unassign(task, resource) {
            return self.unchanged("unassign", "resource is not assigned to task");
        }
        log_changes!(self.schedule.verbosity, "unassign: resource removed from {task}");
        Ok(())
    }

    /// Remove every resource from `task`.
    pub fn unassign_task(&mut self, task: TaskId) -> ProjectResult<()> {
        self.ensure("unassign_task", task)?;
        let removed = self.ledger.clear(task);
        if removed == 0 {
            return self.unchanged("unassign_task", "task has no resources");
        }
        log_changes!(self.schedule.verbosity, "unassign_task: {task} lost {removed}");
        Ok(())
    }

    /// Remove `resource` from every task; returns how many tasks had it.
    pub fn unassign_resource(&mut self, resource: &R) -> usize {
        let removed = self.ledger.unassign_everywhere(resource);
        log_changes!(
            self.schedule.verbosity,
            "unassign_resource: removed from {removed} tasks"
        );
        removed
    }

    /// Every resource assigned to at least one task, in no particular order.
    pub fn resources(&self) -> Vec<&R> {
        self.ledger.resources().into_iter().collect()
    }

    /// Resources of `task`; empty when the task is unknown.
    pub fn resources_of(&self, task: TaskId) -> impl Iterator<Item = &R> {
        self.ledger.resources_of(task)
    }

    /// Tasks holding `resource`, by id.
    pub fn tasks_of(&self, resource: &R) -> Vec<TaskId> {
        self.ledger.tasks_of(resource)
    }
}

#[cfg(test)]
mod tests {
    use crate::models::{Task, TaskId};
    use crate::project::{Project, ProjectError};

    #[test]
    fn test_assign_is_idempotent() {
        let mut project: Project = Project::new();
        let a = project.add(Task::new("a"));
        project.assign(a, "alice".to_string()).unwrap();
        project.assign(a, "alice".to_string()).unwrap();

        assert_eq!(project.resources_of(a).count(), 1);
        assert_eq!(project.tasks_of(&"alice".to_string()), vec![a]);
    }

    #[test]
    fn test_assign_requires_registered_task() {
        let mut project: Project = Project::new();
        let ghost = TaskId::from(7);
        assert_eq!(
            project.assign(ghost, "alice".to_string()),
            Err(ProjectError::TaskNotFound(ghost))
        );
        assert_eq!(project.resources_of(ghost).count(), 0);
    }

    #[test]
    fn test_many_to_many() {
        let mut project: Project<u32> = Project::new();
        let a = project.add(Task::new("a"));
        let b = project.add(Task::new("b"));
        project.assign(a, 1).unwrap();
        project.assign(a, 2).unwrap();
        project.assign(b, 2).unwrap();

        let mut all: Vec<u32> = project.resources().into_iter().copied().collect();
        all.sort_unstable();
        assert_eq!(all, vec![1, 2]);
        assert_eq!(project.tasks_of(&2), vec![a, b]);
        assert!(project.tasks_of(&3).is_empty());
    }

    #[test]
    fn test_unassign_variants() {
        let mut project: Project<u32> = Project::new();
        let a = project.add(Task::new("a"));
        let b = project.add(Task::new("b"));
        project.assign(a, 1).unwrap();
        project.assign(a, 2).unwrap();
        project.assign(b, 2).unwrap();

        project.unassign(a, &1).unwrap();
        assert!(matches!(project.unassign(a, &1), Err(ProjectError::NoOp(_))));
        assert_eq!(project.resources_of(a).copied().collect::<Vec<_>>(), vec![2]);

        assert_eq!(project.unassign_resource(&2), 2);
        assert!(project.resources().is_empty());

        project.assign(b, 5).unwrap();
        project.assign(b, 6).unwrap();
        project.unassign_task(b).unwrap();
        assert_eq!(project.resources_of(b).count(), 0);
        assert!(matches!(project.unassign_task(b), Err(ProjectError::NoOp(_))));
    }

    #[test]
    fn test_resources_need_not_be_clone() {
        #[derive(Debug, PartialEq, Eq, Hash)]
        struct Crew(&'static str);

        let mut project: Project<Crew> = Project::new();
        let a = project.add(Task::new("a"));
        project.assign(a, Crew("riggers")).unwrap();

        assert_eq!(project.tasks_of(&Crew("riggers")), vec![a]);
        assert_eq!(project.resources(), vec![&Crew("riggers")]);
    }
}
