//! Verbosity-gated diagnostics for the project engine.
//!
//! Every [`Project`](crate::Project) carries a verbosity level; each log call
//! names the level it belongs to and is skipped, arguments included, below it.
//! - 0: SILENT
//! - 1: CHANGES (accepted mutations: grouping, relations, splits, moves)
//! - 2: CHECKS (rejected preconditions and why)
//! - 3: DEBUG (recalculation internals: propagation pushes, packing, slack)

pub const VERBOSITY_SILENT: u8 = 0;
pub const VERBOSITY_CHANGES: u8 = 1;
pub const VERBOSITY_CHECKS: u8 = 2;
pub const VERBOSITY_DEBUG: u8 = 3;

/// Whether a message at `level` is printed for a project at `verbosity`.
#[inline]
pub const fn enabled(verbosity: u8, level: u8) -> bool {
    level != VERBOSITY_SILENT && verbosity >= level
}

/// Report a mutation that was applied to the model.
#[macro_export]
macro_rules! log_changes {
    ($verbosity:expr, $($arg:tt)*) => {
        if $crate::logging::enabled($verbosity, $crate::logging::VERBOSITY_CHANGES) {
            eprintln!("gantt: {}", format_args!($($arg)*));
        }
    };
}

/// Report an operation turned away by a precondition.
#[macro_export]
macro_rules! log_checks {
    ($verbosity:expr, $($arg:tt)*) => {
        if $crate::logging::enabled($verbosity, $crate::logging::VERBOSITY_CHECKS) {
            eprintln!("gantt: {}", format_args!($($arg)*));
        }
    };
}

/// Report a schedule shift made by a recalculation pass.
#[macro_export]
macro_rules! log_debug {
    ($verbosity:expr, $($arg:tt)*) => {
        if $crate::logging::enabled($verbosity, $crate::logging::VERBOSITY_DEBUG) {
            eprintln!("gantt: {}", format_args!($($arg)*));
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Task;
    use crate::project::Project;
    use std::cell::Cell;

    #[test]
    fn test_enabled_thresholds() {
        assert!(!enabled(VERBOSITY_SILENT, VERBOSITY_CHANGES));
        assert!(enabled(VERBOSITY_CHANGES, VERBOSITY_CHANGES));
        assert!(!enabled(VERBOSITY_CHANGES, VERBOSITY_CHECKS));
        assert!(enabled(VERBOSITY_DEBUG, VERBOSITY_CHECKS));
        assert!(!enabled(VERBOSITY_DEBUG, VERBOSITY_SILENT));
    }

    #[test]
    fn test_arguments_skipped_below_level() {
        let calls = Cell::new(0);
        let task_count = || {
            calls.set(calls.get() + 1);
            calls.get()
        };

        log_changes!(VERBOSITY_SILENT, "grouped {}", task_count());
        log_checks!(VERBOSITY_CHANGES, "rejected {}", task_count());
        log_debug!(VERBOSITY_CHECKS, "pushed {}", task_count());
        assert_eq!(calls.get(), 0);

        log_debug!(VERBOSITY_DEBUG, "pushed {}", task_count());
        log_changes!(VERBOSITY_DEBUG, "grouped {}", task_count());
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_debug_project_runs_every_log_site() {
        let mut project: Project = Project::new();
        project.set_verbosity(VERBOSITY_DEBUG);
        let g = project.add(Task::new("g"));
        let a = project.add(Task::new("a").with_span(0, 4));
        let b = project.add(Task::new("b").with_span(0, 6));
        project.group(g, a).unwrap();
        project.relate(a, b).unwrap();
        project.split(b, Task::new("b1"), Task::new("b2"), 2).unwrap();
        assert!(project.relate(b, a).is_err());

        assert_eq!(project.verbosity(), VERBOSITY_DEBUG);
        assert_eq!(project.task(b).unwrap().start(), 5);
    }
}
