//! Error types returned by project operations.

use thiserror::Error;

use crate::models::TaskId;
use crate::timescale::UnknownTimeScale;

/// Errors that can occur when mutating a project.
///
/// A rejected operation leaves the model untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProjectError {
    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    #[error("Nothing to change: {0}")]
    NoOp(String),
    #[error("Unknown time scale: {0}")]
    UnknownTimeScale(String),
}

impl From<UnknownTimeScale> for ProjectError {
    fn from(err: UnknownTimeScale) -> Self {
        ProjectError::UnknownTimeScale(err.0)
    }
}

pub type ProjectResult<T> = Result<T, ProjectError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ProjectError::TaskNotFound(TaskId::from(3));
        assert_eq!(err.to_string(), "Task not found: #3");

        let err: ProjectError = UnknownTimeScale("month".to_string()).into();
        assert_eq!(err, ProjectError::UnknownTimeScale("month".to_string()));
    }
}
