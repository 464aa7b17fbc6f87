//! Core data types for the scheduling engine.

use std::fmt;

/// Stable identifier of a task registered in a [`Project`](crate::Project).
///
/// Ids are handed out by the project and never reused, so the id of a
/// deleted task can't alias a task added later.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u32);

impl TaskId {
    /// Raw integer form, used by the Python binding.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for TaskId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A schedulable unit of work.
///
/// Times are integer periods on the project's time axis. The schedule fields
/// can only be read from outside the crate: every write goes through
/// [`Project`](crate::Project) so the derived data stays consistent.
#[derive(Clone, Debug, PartialEq)]
pub struct Task {
    name: String,
    pub(crate) start: i32,
    pub(crate) end: i32,
    pub(crate) duration: i32,
    pub(crate) complete: f32,
    pub(crate) slack: i32,
    pub(crate) is_collapsed: bool,
}

impl Task {
    /// Create a detached task spanning `[0, 1)`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: 0,
            end: 1,
            duration: 1,
            complete: 0.0,
            slack: 0,
            is_collapsed: false,
        }
    }

    /// Set the initial span. Start is clamped to 0 and end kept past start.
    pub fn with_span(mut self, start: i32, end: i32) -> Self {
        let start = start.clamp(0, i32::MAX - 1);
        self.set_span(start, end.max(start + 1));
        self
    }

    /// Set the initial completion, clamped to `[0, 1]`. NaN counts as 0.
    pub fn with_complete(mut self, complete: f32) -> Self {
        self.complete = if complete.is_nan() {
            0.0
        } else {
            complete.clamp(0.0, 1.0)
        };
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn end(&self) -> i32 {
        self.end
    }

    pub fn duration(&self) -> i32 {
        self.duration
    }

    pub fn complete(&self) -> f32 {
        self.complete
    }

    /// Float time before this task delays a dependant or the project end.
    pub fn slack(&self) -> i32 {
        self.slack
    }

    /// Display hint for groups; has no scheduling effect.
    pub fn is_collapsed(&self) -> bool {
        self.is_collapsed
    }

    /// Assign both ends and refresh the cached duration.
    #[inline]
    pub(crate) fn set_span(&mut self, start: i32, end: i32) {
        self.start = start;
        self.end = end;
        self.duration = end - start;
    }

    /// Move the task to `start`, keeping its duration.
    #[inline]
    pub(crate) fn shift_to(&mut self, start: i32) {
        self.place(start, self.end - self.start);
    }

    /// Lay the task out as `duration` periods from `start`. The axis ends at
    /// `i32::MAX`: a span that would run past it is pulled back to end there.
    pub(crate) fn place(&mut self, start: i32, duration: i32) {
        let duration = duration.max(1);
        let start = start.min(i32::MAX - duration);
        self.set_span(start, start + duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_task_defaults() {
        let task = Task::new("design");
        assert_eq!(task.name(), "design");
        assert_eq!((task.start(), task.end(), task.duration()), (0, 1, 1));
        assert_eq!(task.complete(), 0.0);
        assert!(!task.is_collapsed());
    }

    #[test]
    fn test_with_span_normalizes() {
        let task = Task::new("a").with_span(-4, -10);
        assert_eq!((task.start(), task.end(), task.duration()), (0, 1, 1));

        let task = Task::new("b").with_span(3, 8);
        assert_eq!((task.start(), task.end(), task.duration()), (3, 8, 5));
    }

    #[test]
    fn test_with_complete_clamps() {
        assert_eq!(Task::new("a").with_complete(1.7).complete(), 1.0);
        assert_eq!(Task::new("a").with_complete(-0.2).complete(), 0.0);
        assert_eq!(Task::new("a").with_complete(f32::NAN).complete(), 0.0);
    }

    #[test]
    fn test_shift_to_keeps_duration() {
        let mut task = Task::new("a").with_span(2, 6);
        task.shift_to(10);
        assert_eq!((task.start(), task.end(), task.duration()), (10, 14, 4));
    }

    #[test]
    fn test_span_stays_on_axis() {
        let mut task = Task::new("a").with_span(0, 10);
        task.shift_to(i32::MAX - 3);
        assert_eq!((task.start(), task.end()), (i32::MAX - 10, i32::MAX));

        let task = Task::new("b").with_span(i32::MAX, i32::MAX);
        assert_eq!((task.start(), task.end(), task.duration()), (i32::MAX - 1, i32::MAX, 1));

        let mut task = Task::new("c");
        task.place(5, i32::MAX);
        assert_eq!((task.start(), task.end()), (0, i32::MAX));
    }

    #[test]
    fn test_task_id_display() {
        assert_eq!(TaskId::from(7).to_string(), "#7");
        assert_eq!(TaskId::from(7).raw(), 7);
    }
}
