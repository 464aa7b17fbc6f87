//! Project scheduling engine.
//!
//! A [`Project`] owns every task and all relations between them: the group
//! hierarchy, precedence edges, split parts and resource assignments. Each
//! public mutation updates the minimal local state, then runs the
//! recalculation passes in a fixed order before returning:
//!
//! 1. dependency propagation from whatever moved
//! 2. bottom-up aggregation of group spans and completion
//! 3. slack for every task in the tree
//!
//! Tasks live in an arena keyed by [`TaskId`]; relations are separate lookup
//! tables so there are no back-pointers between tasks.
//!
//! The model is single-threaded. Iterators returned by queries borrow the
//! project, so it can't be mutated while an enumeration is in progress;
//! collect into a `Vec` first when that is needed.

mod aggregation;
mod dependency;
mod error;
mod hierarchy;
mod ordering;
mod resources;
mod slack;
mod split;

use rustc_hash::FxHashMap;
use std::hash::Hash;

use crate::config::ProjectConfig;
use crate::models::{Task, TaskId};
use crate::timescale::{TimeScale, Timeline};
use crate::{log_changes, log_checks};

use dependency::DependencyGraph;
use hierarchy::Hierarchy;
use ordering::OrderingIndex;
use resources::ResourceLedger;
use split::SplitTable;

pub use dependency::Reachable;
pub use error::{ProjectError, ProjectResult};
pub use hierarchy::Ancestors;
pub use ordering::TreeWalk;

/// Task arena plus the relation tables the recalculation passes work over.
#[derive(Debug, Default)]
pub(crate) struct Schedule {
    pub(crate) tasks: FxHashMap<TaskId, Task>,
    pub(crate) tree: Hierarchy,
    pub(crate) graph: DependencyGraph,
    pub(crate) splits: SplitTable,
    pub(crate) verbosity: u8,
}

impl Schedule {
    /// Borrow a registered task.
    ///
    /// Every id stored in a relation table is registered, so a miss here is
    /// a broken invariant rather than a caller error.
    #[inline]
    pub(crate) fn task(&self, id: TaskId) -> &Task {
        &self.tasks[&id]
    }

    #[inline]
    pub(crate) fn task_mut(&mut self, id: TaskId) -> &mut Task {
        self.tasks
            .get_mut(&id)
            .unwrap_or_else(|| unreachable!("task {id} is not registered"))
    }

    /// Map a part to its split task; any other task maps to itself.
    #[inline]
    pub(crate) fn resolve(&self, id: TaskId) -> TaskId {
        self.splits.owner(id).unwrap_or(id)
    }
}

/// A schedule of tasks and the resources assigned to them.
///
/// `R` is the caller's resource type; the project only compares and hashes it.
#[derive(Debug)]
pub struct Project<R = String> {
    schedule: Schedule,
    ledger: ResourceLedger<R>,
    order: OrderingIndex,
    timeline: Timeline,
    next_id: u32,
}

impl<R: Eq + Hash> Default for Project<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Eq + Hash> Project<R> {
    /// Create an empty project starting today on a daily time scale.
    pub fn new() -> Self {
        Self {
            schedule: Schedule::default(),
            ledger: ResourceLedger::default(),
            order: OrderingIndex::default(),
            timeline: Timeline::new(chrono::Local::now().date_naive(), TimeScale::Day),
            next_id: 0,
        }
    }

    /// Create an empty project from a configuration.
    pub fn with_config(config: &ProjectConfig) -> ProjectResult<Self> {
        let scale: TimeScale = config.time_scale.parse()?;
        let mut project = Self::new();
        project.schedule.verbosity = config.verbosity;
        project.timeline.scale = scale;
        project.timeline.now = config.now;
        if let Some(start) = config.start_date {
            project.timeline.start = start;
        }
        Ok(project)
    }

    /// Current log level, one of the `VERBOSITY_*` constants in [`crate::logging`].
    pub fn verbosity(&self) -> u8 {
        self.schedule.verbosity
    }

    /// Change the log level; takes effect from the next operation.
    pub fn set_verbosity(&mut self, verbosity: u8) {
        self.schedule.verbosity = verbosity;
    }

    /// Calendar anchoring of the time axis: start date, scale and `now`.
    /// Not used by the scheduling passes.
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Re-anchor the time axis. Task periods are left as they are, only
    /// their calendar reading changes.
    pub fn timeline_mut(&mut self) -> &mut Timeline {
        &mut self.timeline
    }

    /// Borrow a registered task (tree task or part).
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.schedule.tasks.get(&id)
    }

    /// Whether `id` is registered, either in the tree or as a split part.
    pub fn contains(&self, id: TaskId) -> bool {
        self.schedule.tasks.contains_key(&id)
    }

    /// Number of registered tasks, parts included.
    pub fn len(&self) -> usize {
        self.schedule.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schedule.tasks.is_empty()
    }

    /// Register `task` as the last root, with no members, relations or resources.
    pub fn add(&mut self, task: Task) -> TaskId {
        let id = self.register(task);
        self.schedule.tree.insert_root(id);
        self.order.invalidate();
        self.settle();
        log_changes!(self.schedule.verbosity, "add: {id} as root");
        id
    }

    /// Remove a task and every reference to it.
    ///
    /// A group is ungrouped first and a split task merged first. Deleting a
    /// part drops it from its split task, or merges the split task back into
    /// a plain task when only two parts remain.
    pub fn delete(&mut self, id: TaskId) -> ProjectResult<()> {
        self.ensure("delete", id)?;

        if let Some(split) = self.schedule.splits.owner(id) {
            if self.schedule.splits.parts(split).len() > 2 {
                self.schedule.splits.remove_part(id);
                self.unregister(id);
                split::refresh_split(&mut self.schedule, split);
                dependency::propagate_from(&mut self.schedule, split);
                self.settle();
                log_changes!(self.schedule.verbosity, "delete: part {id} of {split}");
            } else {
                self.merge_parts(split);
                log_changes!(
                    self.schedule.verbosity,
                    "delete: part {id} was one of two, merged {split}"
                );
            }
            return Ok(());
        }

        if self.schedule.tree.is_group(id) {
            self.dissolve_group(id);
        }
        if self.schedule.splits.is_split(id) {
            self.merge_parts(id);
        }

        self.schedule.tree.remove(id);
        self.schedule.graph.remove_task(id);
        self.unregister(id);
        self.order.invalidate();
        self.settle();
        log_changes!(self.schedule.verbosity, "delete: {id}");
        Ok(())
    }

    /// Put a task in the arena without placing it in the tree.
    fn register(&mut self, task: Task) -> TaskId {
        let id = TaskId::from(self.next_id);
        self.next_id += 1;
        self.schedule.tasks.insert(id, task);
        self.ledger.register(id);
        id
    }

    /// Drop a task from the arena and the resource ledger.
    fn unregister(&mut self, id: TaskId) -> Option<Task> {
        self.ledger.remove_task(id);
        self.schedule.tasks.remove(&id)
    }

    /// Run the passes that follow every accepted mutation: ancestor
    /// aggregation, then slack.
    fn settle(&mut self) {
        aggregation::recalculate_ancestors(&mut self.schedule);
        slack::recalculate_slack(&mut self.schedule);
    }

    fn ensure(&self, op: &str, id: TaskId) -> ProjectResult<()> {
        if self.contains(id) {
            Ok(())
        } else {
            self.reject(op, ProjectError::TaskNotFound(id))
        }
    }

    fn reject<T>(&self, op: &str, err: ProjectError) -> ProjectResult<T> {
        log_checks!(self.schedule.verbosity, "{op}: rejected: {err}");
        Err(err)
    }

    fn invalid<T>(&self, op: &str, reason: &str) -> ProjectResult<T> {
        self.reject(op, ProjectError::InvalidOperation(reason.to_string()))
    }

    fn unchanged<T>(&self, op: &str, reason: &str) -> ProjectResult<T> {
        self.reject(op, ProjectError::NoOp(reason.to_string()))
    }
}
