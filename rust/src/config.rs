//! Configuration types for the project engine.

use chrono::NaiveDate;
use pyo3::prelude::*;

/// Configuration for a [`Project`](crate::Project).
#[pyclass]
#[derive(Clone, Debug)]
pub struct ProjectConfig {
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug.
    #[pyo3(get, set)]
    pub verbosity: u8,
    /// Length of one period on the time axis: "day" or "week"
    #[pyo3(get, set)]
    pub time_scale: String,
    /// Calendar date of period 0 (None = today)
    #[pyo3(get, set)]
    pub start_date: Option<NaiveDate>,
    /// Period marking "now" for display collaborators
    #[pyo3(get, set)]
    pub now: i32,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            verbosity: 0,
            time_scale: "day".to_string(),
            start_date: None,
            now: 0,
        }
    }
}

#[pymethods]
impl ProjectConfig {
    #[new]
    #[pyo3(signature = (verbosity=None, time_scale=None, start_date=None, now=None))]
    fn new(
        verbosity: Option<u8>,
        time_scale: Option<String>,
        start_date: Option<NaiveDate>,
        now: Option<i32>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            verbosity: verbosity.unwrap_or(defaults.verbosity),
            time_scale: time_scale.unwrap_or(defaults.time_scale),
            start_date,
            now: now.unwrap_or(defaults.now),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "ProjectConfig(verbosity={}, time_scale={:?}, start_date={:?}, now={})",
            self.verbosity, self.time_scale, self.start_date, self.now
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ProjectConfig::default();
        assert_eq!(config.verbosity, 0);
        assert_eq!(config.time_scale, "day");
        assert!(config.start_date.is_none());
        assert_eq!(config.now, 0);
    }

    #[test]
    fn test_new_falls_back_to_defaults() {
        let config = ProjectConfig::new(Some(2), None, None, Some(14));
        assert_eq!(config.verbosity, 2);
        assert_eq!(config.time_scale, "day");
        assert_eq!(config.now, 14);
    }
}
