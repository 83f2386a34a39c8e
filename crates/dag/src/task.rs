//! The task contract: a named unit of work with declared upstream dependencies.

use crate::validation::{ensure_name, ensure_names};
use crate::{Error, Result};
use indexmap::IndexMap;
use std::fmt;

/// Values produced by a task's dependencies, keyed by dependency name.
///
/// Entries follow the order in which the task declared its dependencies.
pub type Inputs<V> = IndexMap<String, V>;

/// Compile-time tag for a task kind.
///
/// The tag names tasks constructed without an explicit name.
pub trait TaskKind {
    /// Default task name for this kind.
    const KIND: &'static str;
}

/// Identity and wiring shared by every task: its name and dependency list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskHeader {
    name: String,
    input_tasks: Vec<String>,
}

impl TaskHeader {
    /// Create a header with an explicit name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the name or any dependency name is empty.
    pub fn new<I, S>(name: impl Into<String>, input_tasks: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let input_tasks: Vec<String> = input_tasks.into_iter().map(Into::into).collect();
        ensure_name("name of a task", &name)?;
        ensure_names("input_tasks", &input_tasks)?;
        Ok(Self { name, input_tasks })
    }

    /// Create a root header (no dependencies).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the name is empty.
    pub fn root(name: impl Into<String>) -> Result<Self> {
        Self::new(name, Vec::<String>::new())
    }

    /// Create a header for kind `K`, falling back to [`TaskKind::KIND`] when
    /// no name is given.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the name or any dependency name is empty.
    pub fn for_kind<K, I, S>(name: Option<&str>, input_tasks: I) -> Result<Self>
    where
        K: TaskKind + ?Sized,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name.unwrap_or(K::KIND), input_tasks)
    }

    /// The task name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of the tasks this task consumes, in declared order.
    #[must_use]
    pub fn input_tasks(&self) -> &[String] {
        &self.input_tasks
    }
}

impl fmt::Display for TaskHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.input_tasks.is_empty() {
            write!(f, "{} (root)", self.name)
        } else {
            write!(f, "{} <- [{}]", self.name, self.input_tasks.join(", "))
        }
    }
}

/// A unit of work in a [`Flow`](crate::Flow).
///
/// Implementations compute one output from the outputs of their declared
/// dependencies. The engine only talks to tasks through this trait.
pub trait Task<V, E = Error>: Send + Sync {
    /// Name and dependency list.
    fn header(&self) -> &TaskHeader;

    /// Compute this task's output.
    ///
    /// `inputs` holds exactly one entry per declared dependency.
    ///
    /// # Errors
    ///
    /// Whatever the task kind reports; the flow returns it unchanged.
    fn execute(&self, inputs: &Inputs<V>) -> std::result::Result<V, E>;

    /// The task name.
    fn name(&self) -> &str {
        self.header().name()
    }

    /// Declared dependency names.
    fn input_tasks(&self) -> &[String] {
        self.header().input_tasks()
    }

    /// Whether the task has no dependencies and is seeded by the caller.
    fn is_root(&self) -> bool {
        self.input_tasks().is_empty()
    }
}

/// A task backed by a closure.
pub struct FnTask<F> {
    header: TaskHeader,
    func: F,
}

impl<F> FnTask<F> {
    /// Wrap `func` as a task with the given name and dependencies.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the name or any dependency name is empty.
    pub fn new<I, S>(name: impl Into<String>, input_tasks: I, func: F) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self {
            header: TaskHeader::new(name, input_tasks)?,
            func,
        })
    }
}

impl<F> fmt::Debug for FnTask<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTask")
            .field("header", &self.header)
            .finish_non_exhaustive()
    }
}

impl<V, E, F> Task<V, E> for FnTask<F>
where
    F: Fn(&Inputs<V>) -> std::result::Result<V, E> + Send + Sync,
{
    fn header(&self) -> &TaskHeader {
        &self.header
    }

    fn execute(&self, inputs: &Inputs<V>) -> std::result::Result<V, E> {
        (self.func)(inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sum {
        header: TaskHeader,
    }

    impl TaskKind for Sum {
        const KIND: &'static str = "Sum";
    }

    impl Task<i64> for Sum {
        fn header(&self) -> &TaskHeader {
            &self.header
        }

        fn execute(&self, inputs: &Inputs<i64>) -> Result<i64> {
            Ok(inputs.values().sum())
        }
    }

    #[test]
    fn test_header_defaults_to_kind_name() {
        let header = TaskHeader::for_kind::<Sum, _, String>(None, vec![]).unwrap();
        assert_eq!(header.name(), "Sum");
        assert!(header.input_tasks().is_empty());
    }

    #[test]
    fn test_header_prefers_explicit_name() {
        let header = TaskHeader::for_kind::<Sum, _, _>(Some("total"), ["a", "b"]).unwrap();
        assert_eq!(header.name(), "total");
        assert_eq!(header.input_tasks(), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_header_rejects_empty_name() {
        let err = TaskHeader::root("").unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_header_accepts_whitespace_name() {
        let header = TaskHeader::root("  ").unwrap();
        assert_eq!(header.name(), "  ");
        assert_eq!(header.to_string(), "   (root)");
    }

    #[test]
    fn test_header_rejects_empty_dependency() {
        let err = TaskHeader::new("C", ["A", ""]).unwrap_err();
        assert!(err.to_string().contains("input_tasks"));
    }

    #[test]
    fn test_header_display() {
        assert_eq!(TaskHeader::root("A").unwrap().to_string(), "A (root)");
        assert_eq!(
            TaskHeader::new("C", ["A", "B"]).unwrap().to_string(),
            "C <- [A, B]"
        );
    }

    #[test]
    fn test_task_trait_defaults() {
        let task = Sum {
            header: TaskHeader::new("C", ["A", "B"]).unwrap(),
        };
        assert_eq!(Task::<i64>::name(&task), "C");
        assert!(!Task::<i64>::is_root(&task));

        let mut inputs = Inputs::new();
        inputs.insert("A".to_string(), 2);
        inputs.insert("B".to_string(), 3);
        assert_eq!(task.execute(&inputs).unwrap(), 5);
    }

    #[test]
    fn test_fn_task_executes_closure() {
        let task = FnTask::new("double", ["x"], |inputs: &Inputs<i64>| {
            Ok::<_, Error>(inputs["x"] * 2)
        })
        .unwrap();

        let mut inputs = Inputs::new();
        inputs.insert("x".to_string(), 21);
        assert_eq!(Task::<i64>::execute(&task, &inputs).unwrap(), 42);
        assert_eq!(Task::<i64>::input_tasks(&task), &["x".to_string()]);
    }
}
