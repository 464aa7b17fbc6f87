//! Rust implementation of the Gantt project scheduling engine.
//!
//! The engine owns tasks, their group hierarchy, precedence relations, split
//! parts and resource assignments, and keeps the derived schedule (spans,
//! completion, slack) consistent after every mutation. See [`Project`].

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use pyo3::prelude::*;

mod config;
pub mod logging;
mod models;
pub mod project;
mod py;
pub mod timescale;

pub use config::ProjectConfig;
pub use models::{Task, TaskId};
pub use project::{Ancestors, Project, ProjectError, ProjectResult, Reachable, TreeWalk};
pub use py::{PyProject, PyTask};
pub use timescale::{TimeScale, Timeline, UnknownTimeScale};

/// The gantt.rust Python module.
#[pymodule]
fn rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Model
    m.add_class::<PyProject>()?;
    m.add_class::<PyTask>()?;

    // Config types
    m.add_class::<ProjectConfig>()?;

    Ok(())
}
