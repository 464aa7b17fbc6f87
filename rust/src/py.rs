//! Python bindings for the project engine.
//!
//! Task ids cross the boundary as plain integers. Requests that would change
//! nothing return normally, matching the permissive API Python callers
//! expect; unknown tasks raise `KeyError` and rejected operations raise
//! `ValueError`.

use chrono::NaiveDate;
use pyo3::exceptions::{PyKeyError, PyValueError};
use pyo3::prelude::*;

use crate::config::ProjectConfig;
use crate::models::{Task, TaskId};
use crate::project::{Project, ProjectError, ProjectResult};

fn to_py_err(err: ProjectError) -> PyErr {
    match &err {
        ProjectError::TaskNotFound(_) => PyKeyError::new_err(err.to_string()),
        _ => PyValueError::new_err(err.to_string()),
    }
}

/// Swallow `NoOp`, raise everything else.
fn permissive(result: ProjectResult<()>) -> PyResult<()> {
    match result {
        Ok(()) | Err(ProjectError::NoOp(_)) => Ok(()),
        Err(err) => Err(to_py_err(err)),
    }
}

fn raw_ids(ids: impl IntoIterator<Item = TaskId>) -> Vec<u32> {
    ids.into_iter().map(TaskId::raw).collect()
}

/// Read-only snapshot of a task's schedule.
#[pyclass(name = "Task")]
#[derive(Clone, Debug, PartialEq)]
pub struct PyTask {
    #[pyo3(get)]
    pub id: u32,
    #[pyo3(get)]
    pub name: String,
    #[pyo3(get)]
    pub start: i32,
    #[pyo3(get)]
    pub end: i32,
    #[pyo3(get)]
    pub duration: i32,
    #[pyo3(get)]
    pub complete: f32,
    #[pyo3(get)]
    pub slack: i32,
    #[pyo3(get)]
    pub is_collapsed: bool,
}

impl PyTask {
    fn snapshot(id: TaskId, task: &Task) -> Self {
        Self {
            id: id.raw(),
            name: task.name().to_string(),
            start: task.start(),
            end: task.end(),
            duration: task.duration(),
            complete: task.complete(),
            slack: task.slack(),
            is_collapsed: task.is_collapsed(),
        }
    }
}

#[pymethods]
impl PyTask {
    fn __repr__(&self) -> String {
        format!(
            "Task(id={}, name={:?}, start={}, end={}, complete={}, slack={})",
            self.id, self.name, self.start, self.end, self.complete, self.slack
        )
    }
}

/// A project schedule with string resources.
#[pyclass(name = "Project")]
#[derive(Debug)]
pub struct PyProject {
    inner: Project<String>,
}

#[pymethods]
impl PyProject {
    #[new]
    #[pyo3(signature = (config=None))]
    fn new(config: Option<ProjectConfig>) -> PyResult<Self> {
        let config = config.unwrap_or_default();
        let inner = Project::with_config(&config).map_err(to_py_err)?;
        Ok(Self { inner })
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn __contains__(&self, task: u32) -> bool {
        self.inner.contains(task.into())
    }

    fn __repr__(&self) -> String {
        format!(
            "Project(tasks={}, time_scale={}, start={})",
            self.inner.len(),
            self.inner.timeline().scale,
            self.inner.timeline().start
        )
    }

    /// Snapshot of one task. Raises KeyError if it is not registered.
    fn task(&self, task: u32) -> PyResult<PyTask> {
        let id = TaskId::from(task);
        self.inner
            .task(id)
            .map(|t| PyTask::snapshot(id, t))
            .ok_or_else(|| to_py_err(ProjectError::TaskNotFound(id)))
    }

    // -- registry and hierarchy --

    #[pyo3(signature = (name, start=0, end=1, complete=0.0))]
    fn add(&mut self, name: String, start: i32, end: i32, complete: f32) -> u32 {
        let task = Task::new(name).with_span(start, end).with_complete(complete);
        self.inner.add(task).raw()
    }

    fn delete(&mut self, task: u32) -> PyResult<()> {
        permissive(self.inner.delete(task.into()))
    }

    fn group(&mut self, group: u32, member: u32) -> PyResult<()> {
        permissive(self.inner.group(group.into(), member.into()))
    }

    /// Detach `member` from `group`, or every member when `member` is None.
    #[pyo3(signature = (group, member=None))]
    fn ungroup(&mut self, group: u32, member: Option<u32>) -> PyResult<()> {
        permissive(match member {
            Some(member) => self.inner.ungroup(group.into(), member.into()),
            None => self.inner.ungroup_all(group.into()),
        })
    }

    fn move_by(&mut self, task: u32, offset: i32) -> PyResult<()> {
        permissive(self.inner.move_by(task.into(), offset))
    }

    fn index_of(&self, task: u32) -> Option<usize> {
        self.inner.index_of(task.into())
    }

    fn tasks(&self) -> Vec<u32> {
        raw_ids(self.inner.tasks())
    }

    fn children_of(&self, group: u32) -> Vec<u32> {
        raw_ids(self.inner.children_of(group.into()).iter().copied())
    }

    fn descendants_of(&self, group: u32) -> Vec<u32> {
        raw_ids(self.inner.descendants_of(group.into()))
    }

    fn ancestors_of(&self, task: u32) -> Vec<u32> {
        raw_ids(self.inner.ancestors_of(task.into()))
    }

    fn parent_of(&self, task: u32) -> Option<u32> {
        self.inner.parent_of(task.into()).map(TaskId::raw)
    }

    fn is_group(&self, task: u32) -> bool {
        self.inner.is_group(task.into())
    }

    fn is_member(&self, task: u32) -> bool {
        self.inner.is_member(task.into())
    }

    // -- dependencies --

    fn relate(&mut self, precedent: u32, dependant: u32) -> PyResult<()> {
        permissive(self.inner.relate(precedent.into(), dependant.into()))
    }

    /// Remove one relation, or every dependant of `precedent` when
    /// `dependant` is None.
    #[pyo3(signature = (precedent, dependant=None))]
    fn unrelate(&mut self, precedent: u32, dependant: Option<u32>) -> PyResult<()> {
        permissive(match dependant {
            Some(dependant) => self.inner.unrelate(precedent.into(), dependant.into()),
            None => self.inner.unrelate_all(precedent.into()),
        })
    }

    fn direct_precedents_of(&self, task: u32) -> Vec<u32> {
        raw_ids(self.inner.direct_precedents_of(task.into()).iter().copied())
    }

    fn direct_dependants_of(&self, task: u32) -> Vec<u32> {
        raw_ids(self.inner.direct_dependants_of(task.into()).iter().copied())
    }

    fn precedents_of(&self, task: u32) -> Vec<u32> {
        raw_ids(self.inner.precedents_of(task.into()))
    }

    fn dependants_of(&self, task: u32) -> Vec<u32> {
        raw_ids(self.inner.dependants_of(task.into()))
    }

    fn precedents(&self) -> Vec<u32> {
        raw_ids(self.inner.precedents())
    }

    fn has_relations(&self, task: u32) -> bool {
        self.inner.has_relations(task.into())
    }

    fn critical_paths(&self) -> Vec<Vec<u32>> {
        self.inner.critical_paths().into_iter().map(raw_ids).collect()
    }

    // -- split tasks --

    /// Split `task` into two parts; returns their ids. Parts are named after
    /// the task unless names are given.
    #[pyo3(signature = (task, duration, part1_name=None, part2_name=None))]
    fn split(
        &mut self,
        task: u32,
        duration: i32,
        part1_name: Option<String>,
        part2_name: Option<String>,
    ) -> PyResult<(u32, u32)> {
        let id = TaskId::from(task);
        let base = self.task(task)?.name;
        let part1 = Task::new(part1_name.unwrap_or_else(|| base.clone()));
        let part2 = Task::new(part2_name.unwrap_or(base));
        let (first, second) = self
            .inner
            .split(id, part1, part2, duration)
            .map_err(to_py_err)?;
        Ok((first.raw(), second.raw()))
    }

    #[pyo3(signature = (part, duration, name=None))]
    fn split_part(&mut self, part: u32, duration: i32, name: Option<String>) -> PyResult<u32> {
        let name = match name {
            Some(name) => name,
            None => self.task(part)?.name,
        };
        self.inner
            .split_part(part.into(), Task::new(name), duration)
            .map(TaskId::raw)
            .map_err(to_py_err)
    }

    fn join(&mut self, part1: u32, part2: u32) -> PyResult<()> {
        permissive(self.inner.join(part1.into(), part2.into()))
    }

    fn merge(&mut self, split: u32) -> PyResult<()> {
        permissive(self.inner.merge(split.into()))
    }

    fn parts_of(&self, split: u32) -> Vec<u32> {
        raw_ids(self.inner.parts_of(split.into()).iter().copied())
    }

    fn split_task_of(&self, part: u32) -> Option<u32> {
        self.inner.split_task_of(part.into()).map(TaskId::raw)
    }

    fn is_split(&self, task: u32) -> bool {
        self.inner.is_split(task.into())
    }

    fn is_part(&self, task: u32) -> bool {
        self.inner.is_part(task.into())
    }

    // -- schedule --

    fn set_start(&mut self, task: u32, value: i32) -> PyResult<()> {
        permissive(self.inner.set_start(task.into(), value))
    }

    fn set_end(&mut self, task: u32, value: i32) -> PyResult<()> {
        permissive(self.inner.set_end(task.into(), value))
    }

    fn set_duration(&mut self, task: u32, duration: i32) -> PyResult<()> {
        permissive(self.inner.set_duration(task.into(), duration))
    }

    fn set_complete(&mut self, task: u32, complete: f32) -> PyResult<()> {
        permissive(self.inner.set_complete(task.into(), complete))
    }

    fn set_collapse(&mut self, task: u32, collapsed: bool) -> PyResult<()> {
        permissive(self.inner.set_collapse(task.into(), collapsed))
    }

    // -- resources --

    fn assign(&mut self, task: u32, resource: String) -> PyResult<()> {
        permissive(self.inner.assign(task.into(), resource))
    }

    /// Remove one resource from `task`, or all of them when `resource` is None.
    #[pyo3(signature = (task, resource=None))]
    fn unassign(&mut self, task: u32, resource: Option<String>) -> PyResult<()> {
        permissive(match resource {
            Some(resource) => self.inner.unassign(task.into(), &resource),
            None => self.inner.unassign_task(task.into()),
        })
    }

    fn unassign_resource(&mut self, resource: String) -> usize {
        self.inner.unassign_resource(&resource)
    }

    fn resources(&self) -> Vec<String> {
        let mut resources: Vec<String> = self.inner.resources().into_iter().cloned().collect();
        resources.sort();
        resources
    }

    fn resources_of(&self, task: u32) -> Vec<String> {
        let mut resources: Vec<String> = self.inner.resources_of(task.into()).cloned().collect();
        resources.sort();
        resources
    }

    fn tasks_of(&self, resource: String) -> Vec<u32> {
        raw_ids(self.inner.tasks_of(&resource))
    }

    // -- calendar --

    fn date_of(&self, period: i32) -> Option<NaiveDate> {
        self.inner.timeline().date_of(period)
    }

    fn period_of(&self, date: NaiveDate) -> i32 {
        self.inner.timeline().period_of(date)
    }

    fn now_date(&self) -> Option<NaiveDate> {
        self.inner.timeline().now_date()
    }

    #[getter]
    fn now(&self) -> i32 {
        self.inner.timeline().now
    }

    #[setter]
    fn set_now(&mut self, now: i32) {
        self.inner.timeline_mut().now = now;
    }
}
