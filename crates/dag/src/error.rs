//! Error types for flow construction, compilation and execution.

use miette::Diagnostic;
use thiserror::Error;

/// Result type for flow operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the flow engine.
///
/// Task kinds may use this type as their own error type, in which case the
/// [`Error::Execution`] variant carries their failures. Kinds with a
/// different error type get engine errors converted through `From<Error>`
/// while their own errors pass through [`Flow::run`](crate::Flow::run) as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum Error {
    /// A task or flow was constructed with an invalid name or dependency list.
    #[error("Configuration error: {message}")]
    #[diagnostic(code(sloth_dag::config::invalid))]
    Configuration {
        /// What was wrong with the configuration
        message: String,
    },

    /// A task declares a dependency that is not part of the flow.
    #[error("Task '{dependency}' (dependency of '{task}') not found in flow")]
    #[diagnostic(
        code(sloth_dag::compile::missing_dependency),
        help("add the missing task to the flow or remove it from the dependency list")
    )]
    MissingDependency {
        /// The task declaring the dependency
        task: String,
        /// The dependency name that could not be resolved
        dependency: String,
    },

    /// The dependency relation contains a cycle.
    #[error("Cycle detected: {}", .path.join(" -> "))]
    #[diagnostic(code(sloth_dag::compile::cycle))]
    CycleDetected {
        /// Task names along the cycle, ending with the task it started from
        path: Vec<String>,
    },

    /// The number of root inputs does not match the number of root tasks.
    #[error("Expected {expected} root inputs, got {actual}")]
    #[diagnostic(code(sloth_dag::run::arity))]
    Arity {
        /// Number of root tasks in the flow
        expected: usize,
        /// Number of values supplied to `run`
        actual: usize,
    },

    /// A task failed while executing.
    #[error("Task '{task}' failed: {message}")]
    #[diagnostic(code(sloth_dag::run::execution))]
    Execution {
        /// The failing task
        task: String,
        /// Failure description
        message: String,
    },
}

impl Error {
    /// Create a configuration error with a message
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a missing dependency error
    #[must_use]
    pub fn missing_dependency(task: impl Into<String>, dependency: impl Into<String>) -> Self {
        Self::MissingDependency {
            task: task.into(),
            dependency: dependency.into(),
        }
    }

    /// Create a cycle error from the ordered cycle path
    #[must_use]
    pub fn cycle(path: Vec<String>) -> Self {
        Self::CycleDetected { path }
    }

    /// Create an arity error
    #[must_use]
    pub const fn arity(expected: usize, actual: usize) -> Self {
        Self::Arity { expected, actual }
    }

    /// Create an execution error for a task
    #[must_use]
    pub fn execution(task: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Execution {
            task: task.into(),
            message: message.into(),
        }
    }

    /// The cycle path, if this is a cycle error.
    #[must_use]
    pub fn cycle_path(&self) -> Option<&[String]> {
        match self {
            Self::CycleDetected { path } => Some(path),
            _ => None,
        }
    }
}
