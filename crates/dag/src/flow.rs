//! Flows: named collections of tasks compiled into an execution plan.

use crate::plan::{ExecutionPlan, compile_plan, leaf_names};
use crate::task::{Inputs, Task};
use crate::validation::ensure_unique;
use crate::{Error, Result};
use indexmap::IndexMap;
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, trace};

/// A task shared by a flow.
pub type SharedTask<V, E = Error> = Arc<dyn Task<V, E>>;

/// A directed acyclic graph of tasks.
///
/// Tasks are kept in the order they were supplied. That order decides which
/// root task receives which positional input in [`Flow::run`] and the order
/// of the returned leaf outputs.
pub struct Flow<V, E = Error> {
    name: String,
    tasks: IndexMap<String, SharedTask<V, E>>,
    root_tasks: Vec<String>,
    plan: Option<ExecutionPlan>,
}

impl<V, E> Flow<V, E> {
    /// Create a flow from tasks in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if two tasks share a name.
    pub fn new<I>(name: impl Into<String>, tasks: I) -> Result<Self>
    where
        I: IntoIterator<Item = SharedTask<V, E>>,
    {
        let tasks: Vec<SharedTask<V, E>> = tasks.into_iter().collect();
        ensure_unique(tasks.iter().map(|task| task.name()))?;

        let root_tasks = tasks
            .iter()
            .filter(|task| task.is_root())
            .map(|task| task.name().to_string())
            .collect();
        let tasks = tasks
            .into_iter()
            .map(|task| (task.name().to_string(), task))
            .collect();

        Ok(Self {
            name: name.into(),
            tasks,
            root_tasks,
            plan: None,
        })
    }

    /// Start building a flow task by task.
    pub fn builder(name: impl Into<String>) -> FlowBuilder<V, E> {
        FlowBuilder {
            name: name.into(),
            tasks: Vec::new(),
        }
    }

    /// The flow's descriptive name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of tasks in the flow.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the flow has no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Look up a task by name.
    #[must_use]
    pub fn task(&self, name: &str) -> Option<&SharedTask<V, E>> {
        self.tasks.get(name)
    }

    /// Task names in insertion order.
    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }

    /// Tasks without dependencies, in insertion order.
    #[must_use]
    pub fn root_tasks(&self) -> &[String] {
        &self.root_tasks
    }

    /// Tasks no other task depends on, in insertion order.
    #[must_use]
    pub fn leaf_tasks(&self) -> Vec<String> {
        leaf_names(self.tasks.keys().map(String::as_str), |name| {
            self.tasks.get(name).map(|task| task.input_tasks())
        })
    }

    /// Whether a plan has been compiled.
    #[must_use]
    pub fn is_compiled(&self) -> bool {
        self.plan.is_some()
    }

    /// The compiled plan, if any.
    #[must_use]
    pub fn plan(&self) -> Option<&ExecutionPlan> {
        self.plan.as_ref()
    }

    /// Validate the graph and compute its execution order.
    ///
    /// Safe to call repeatedly; every call recomputes the plan.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingDependency`] or [`Error::CycleDetected`].
    #[instrument(skip_all, fields(flow = %self.name))]
    pub fn compile(&mut self) -> Result<&ExecutionPlan> {
        let tasks = &self.tasks;
        let plan = compile_plan(tasks.keys().map(String::as_str), |name| {
            tasks.get(name).map(|task| task.input_tasks())
        })?;
        debug!("Execution order: {}", plan.order().join(", "));
        Ok(self.plan.insert(plan))
    }

    /// Execute the flow and return the outputs of its leaf tasks.
    ///
    /// `root_inputs` seeds the root tasks positionally, in the order
    /// reported by [`Flow::root_tasks`]. The flow is compiled first if it
    /// has not been already.
    ///
    /// # Errors
    ///
    /// Compilation errors and [`Error::Arity`] are converted into `E`.
    /// Errors returned by a task are passed through unchanged and stop the
    /// run immediately.
    #[instrument(skip_all, fields(flow = %self.name))]
    pub fn run<I>(&mut self, root_inputs: I) -> std::result::Result<IndexMap<String, V>, E>
    where
        I: IntoIterator<Item = V>,
        V: Clone,
        E: From<Error>,
    {
        if self.plan.is_none() {
            self.compile()?;
        }

        let leaves = self.leaf_tasks();
        let root_inputs: Vec<V> = root_inputs.into_iter().collect();
        if root_inputs.len() != self.root_tasks.len() {
            return Err(Error::arity(self.root_tasks.len(), root_inputs.len()).into());
        }

        let mut results: HashMap<&str, V> = self
            .root_tasks
            .iter()
            .map(String::as_str)
            .zip(root_inputs)
            .collect();

        let order = self.plan.as_ref().map(ExecutionPlan::order).unwrap_or_default();
        for name in order {
            let Some(task) = self.tasks.get(name) else {
                continue;
            };
            if task.is_root() {
                continue;
            }

            let inputs: Inputs<V> = task
                .input_tasks()
                .iter()
                .filter_map(|dep| {
                    results
                        .get(dep.as_str())
                        .map(|value| (dep.clone(), value.clone()))
                })
                .collect();

            trace!("Executing task '{}'", name);
            let output = task.execute(&inputs)?;
            results.insert(name.as_str(), output);
        }

        debug!("Flow finished with {} leaf outputs", leaves.len());
        Ok(leaves
            .into_iter()
            .filter_map(|leaf| results.remove(leaf.as_str()).map(|value| (leaf, value)))
            .collect())
    }

    /// Human-readable listing of every task and its dependencies, sorted by name.
    #[must_use]
    pub fn visualize(&self) -> String {
        let mut names: Vec<&String> = self.tasks.keys().collect();
        names.sort();

        let mut lines = vec![format!("Flow: {}", self.name)];
        lines.extend(
            names
                .into_iter()
                .filter_map(|name| self.tasks.get(name))
                .map(|task| format!("  {}", task.header())),
        );
        lines.join("\n")
    }

    /// Graphviz DOT rendering of the dependency graph.
    ///
    /// Edges point from a dependency to the task consuming it. Dependencies
    /// that do not resolve to a task are left out.
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut graph: DiGraph<&str, &str> = DiGraph::new();
        let nodes: HashMap<&str, NodeIndex> = self
            .tasks
            .keys()
            .map(|name| (name.as_str(), graph.add_node(name.as_str())))
            .collect();

        for (name, task) in &self.tasks {
            let Some(&to) = nodes.get(name.as_str()) else {
                continue;
            };
            for dep in task.input_tasks() {
                if let Some(&from) = nodes.get(dep.as_str()) {
                    graph.add_edge(from, to, "");
                }
            }
        }

        format!("{}", Dot::with_config(&graph, &[Config::EdgeNoLabel]))
    }
}

impl<V, E> fmt::Display for Flow<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.visualize())
    }
}

impl<V, E> fmt::Debug for Flow<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flow")
            .field("name", &self.name)
            .field("tasks", &self.tasks.keys().collect::<Vec<_>>())
            .field("root_tasks", &self.root_tasks)
            .field("plan", &self.plan)
            .finish()
    }
}

/// Incremental construction of a [`Flow`].
pub struct FlowBuilder<V, E = Error> {
    name: String,
    tasks: Vec<SharedTask<V, E>>,
}

impl<V, E> FlowBuilder<V, E> {
    /// Append a task.
    #[must_use]
    pub fn task<T>(mut self, task: T) -> Self
    where
        T: Task<V, E> + 'static,
    {
        self.tasks.push(Arc::new(task));
        self
    }

    /// Append an already shared task.
    #[must_use]
    pub fn shared(mut self, task: SharedTask<V, E>) -> Self {
        self.tasks.push(task);
        self
    }

    /// Finish the flow.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if two tasks share a name.
    pub fn build(self) -> Result<Flow<V, E>> {
        Flow::new(self.name, self.tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{FnTask, TaskHeader};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sum(name: &str, deps: &[&str], add: i64) -> FnTask<impl Fn(&Inputs<i64>) -> Result<i64>> {
        FnTask::new(name, deps.iter().copied(), move |inputs: &Inputs<i64>| {
            Ok::<_, Error>(inputs.values().sum::<i64>() + add)
        })
        .unwrap()
    }

    fn scaled(
        name: &str,
        deps: &[&str],
        factor: i64,
    ) -> FnTask<impl Fn(&Inputs<i64>) -> Result<i64>> {
        FnTask::new(name, deps.iter().copied(), move |inputs: &Inputs<i64>| {
            Ok::<_, Error>(inputs.values().sum::<i64>() * factor)
        })
        .unwrap()
    }

    fn basic_flow() -> Flow<i64> {
        Flow::builder("test")
            .task(sum("A", &[], 0))
            .task(sum("B", &[], 0))
            .task(scaled("C", &["A", "B"], 10))
            .task(sum("D", &["C"], 1))
            .build()
            .unwrap()
    }

    #[test]
    fn test_roots_follow_insertion_order() {
        let flow = Flow::<i64>::builder("roots")
            .task(sum("Z", &[], 0))
            .task(sum("A", &[], 0))
            .task(sum("M", &["Z", "A"], 0))
            .build()
            .unwrap();
        assert_eq!(flow.root_tasks(), &["Z", "A"]);
        assert_eq!(flow.leaf_tasks(), vec!["M".to_string()]);
    }

    #[test]
    fn test_duplicate_task_names_rejected() {
        let err = Flow::<i64>::builder("dup")
            .task(sum("A", &[], 0))
            .task(sum("A", &[], 1))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_run_basic_flow() {
        let mut flow = basic_flow();
        let out = flow.run([2, 3]).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out["D"], 51);
        assert!(flow.is_compiled());
    }

    #[test]
    fn test_run_compiles_lazily() {
        let mut flow = basic_flow();
        assert!(!flow.is_compiled());
        assert!(flow.plan().is_none());
        flow.run([1, 1]).unwrap();
        assert_eq!(flow.plan().map(ExecutionPlan::len), Some(4));
    }

    #[test]
    fn test_run_arity_mismatch() {
        let mut flow = basic_flow();
        let err = flow.run([2]).unwrap_err();
        assert_eq!(err, Error::arity(2, 1));

        let err = flow.run([1, 2, 3]).unwrap_err();
        assert_eq!(err, Error::arity(2, 3));
    }

    #[test]
    fn test_run_is_repeatable() {
        let mut flow = basic_flow();
        let first = flow.run([2, 3]).unwrap();
        let second = flow.run([2, 3]).unwrap();
        assert_eq!(first, second);
        assert_eq!(flow.run([0, 0]).unwrap()["D"], 1);
    }

    #[test]
    fn test_compile_is_idempotent() {
        let mut flow = basic_flow();
        let first = flow.compile().unwrap().clone();
        let second = flow.compile().unwrap().clone();
        assert_eq!(first, second);
        assert_eq!(first.order(), &["A", "B", "C", "D"]);
    }

    #[test]
    fn test_compiled_plan_matches_flow_roots_and_leaves() {
        let mut flow = Flow::<i64>::builder("fan")
            .task(sum("B", &[], 0))
            .task(sum("A", &[], 0))
            .task(sum("Y", &["A", "B"], 1))
            .task(sum("X", &["A"], 2))
            .build()
            .unwrap();
        let plan = flow.compile().unwrap().clone();

        assert_eq!(plan.roots(), flow.root_tasks());
        assert_eq!(plan.roots(), &["B", "A"]);
        assert_eq!(plan.leaves(), flow.leaf_tasks().as_slice());
        assert_eq!(plan.leaves(), &["Y", "X"]);
    }

    #[test]
    fn test_leaves_returned_in_insertion_order() {
        let mut flow = Flow::<i64>::builder("fan")
            .task(sum("A", &[], 0))
            .task(sum("Y", &["A"], 1))
            .task(sum("X", &["A"], 2))
            .build()
            .unwrap();
        let out = flow.run([10]).unwrap();
        let keys: Vec<&String> = out.keys().collect();
        assert_eq!(keys, vec!["Y", "X"]);
        assert_eq!(out["Y"], 11);
        assert_eq!(out["X"], 12);
    }

    #[test]
    fn test_root_only_flow_echoes_inputs() {
        let mut flow = Flow::<i64>::builder("roots")
            .task(sum("A", &[], 100))
            .task(sum("B", &[], 100))
            .build()
            .unwrap();
        let out = flow.run([1, 2]).unwrap();
        assert_eq!(out["A"], 1);
        assert_eq!(out["B"], 2);
    }

    #[test]
    fn test_empty_flow_runs_to_empty_result() {
        let mut flow: Flow<i64> = Flow::new("empty", Vec::new()).unwrap();
        assert!(flow.is_empty());
        assert!(flow.run(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn test_inputs_follow_declared_order() {
        let mut flow = Flow::<String>::builder("concat")
            .task(
                FnTask::new("a", Vec::<String>::new(), |_: &Inputs<String>| {
                    Ok::<_, Error>(String::new())
                })
                .unwrap(),
            )
            .task(
                FnTask::new("b", Vec::<String>::new(), |_: &Inputs<String>| {
                    Ok::<_, Error>(String::new())
                })
                .unwrap(),
            )
            .task(
                FnTask::new("joined", ["b", "a"], |inputs: &Inputs<String>| {
                    Ok::<_, Error>(inputs.values().cloned().collect::<Vec<_>>().join("+"))
                })
                .unwrap(),
            )
            .build()
            .unwrap();
        let out = flow.run(["x".to_string(), "y".to_string()]).unwrap();
        assert_eq!(out["joined"], "y+x");
    }

    #[test]
    fn test_task_error_propagates_unchanged() {
        #[derive(Debug, PartialEq)]
        enum Domain {
            Engine(Error),
            DivideByZero,
        }

        impl From<Error> for Domain {
            fn from(err: Error) -> Self {
                Self::Engine(err)
            }
        }

        let mut flow = Flow::<i64, Domain>::builder("div")
            .task(
                FnTask::new("n", Vec::<String>::new(), |_: &Inputs<i64>| {
                    Ok::<_, Domain>(0)
                })
                .unwrap(),
            )
            .task(
                FnTask::new("inv", ["n"], |inputs: &Inputs<i64>| {
                    let n = inputs["n"];
                    if n == 0 {
                        Err(Domain::DivideByZero)
                    } else {
                        Ok(100 / n)
                    }
                })
                .unwrap(),
            )
            .build()
            .unwrap();

        assert_eq!(flow.run([0]).unwrap_err(), Domain::DivideByZero);
        assert_eq!(flow.run([4]).unwrap()["inv"], 25);
        assert_eq!(
            flow.run(Vec::new()).unwrap_err(),
            Domain::Engine(Error::arity(1, 0))
        );
    }

    #[test]
    fn test_failing_task_stops_run() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let mut flow = Flow::<i64>::builder("stop")
            .task(sum("A", &[], 0))
            .task(
                FnTask::new("B", ["A"], |_: &Inputs<i64>| {
                    Err::<i64, _>(Error::execution("B", "boom"))
                })
                .unwrap(),
            )
            .task(
                FnTask::new("C", ["B"], move |_: &Inputs<i64>| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, Error>(0)
                })
                .unwrap(),
            )
            .build()
            .unwrap();

        let err = flow.run([1]).unwrap_err();
        assert_eq!(err, Error::execution("B", "boom"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_each_task_runs_once_per_run() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let mut flow = Flow::<i64>::builder("once")
            .task(sum("A", &[], 0))
            .task(
                FnTask::new("B", ["A"], move |inputs: &Inputs<i64>| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, Error>(inputs["A"])
                })
                .unwrap(),
            )
            .task(sum("C", &["B"], 0))
            .task(sum("D", &["B"], 0))
            .build()
            .unwrap();

        flow.run([5]).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_run_reports_cycle() {
        let mut flow = Flow::<i64>::builder("cycle")
            .task(sum("A", &["B"], 0))
            .task(sum("B", &["A"], 0))
            .build()
            .unwrap();
        let err = flow.run(Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), "Cycle detected: A -> B -> A");
        assert!(!flow.is_compiled());
    }

    #[test]
    fn test_visualize_sorted_by_name() {
        let flow = Flow::<i64>::builder("test")
            .task(sum("D", &["C"], 1))
            .task(scaled("C", &["A", "B"], 10))
            .task(sum("B", &[], 0))
            .task(sum("A", &[], 0))
            .build()
            .unwrap();

        let expected = "Flow: test\n  A (root)\n  B (root)\n  C <- [A, B]\n  D <- [C]";
        assert_eq!(flow.visualize(), expected);
        assert_eq!(flow.to_string(), expected);
    }

    #[test]
    fn test_visualize_works_with_missing_dependency() {
        let flow = Flow::<i64>::builder("broken")
            .task(sum("E", &["F"], 0))
            .build()
            .unwrap();
        assert_eq!(flow.visualize(), "Flow: broken\n  E <- [F]");
    }

    #[test]
    fn test_to_dot_lists_nodes_and_edges() {
        let flow = basic_flow();
        let dot = flow.to_dot();
        assert!(dot.starts_with("digraph {"));
        for name in ["A", "B", "C", "D"] {
            assert!(dot.contains(&format!("\"{name}\"")), "{dot}");
        }
        assert_eq!(dot.matches("->").count(), 3);
    }

    #[test]
    fn test_shared_tasks_can_be_reused_across_flows() {
        let a: SharedTask<i64> = Arc::new(sum("A", &[], 0));
        let b: SharedTask<i64> = Arc::new(sum("B", &["A"], 1));

        let mut first = Flow::new("first", [Arc::clone(&a), Arc::clone(&b)]).unwrap();
        let mut second = Flow::builder("second").shared(a).shared(b).build().unwrap();
        assert_eq!(first.run([1]).unwrap(), second.run([1]).unwrap());
    }

    #[test]
    fn test_header_lookup() {
        let flow = basic_flow();
        let header: &TaskHeader = flow.task("C").map(|t| t.header()).unwrap();
        assert_eq!(header.input_tasks(), &["A", "B"]);
        assert!(flow.task("missing").is_none());
        assert_eq!(flow.task_names().collect::<Vec<_>>(), vec!["A", "B", "C", "D"]);
    }
}
