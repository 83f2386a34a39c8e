//! Flow compilation: structural validation and topological ordering.
//!
//! Compilation walks every task depth-first, dependencies in declared
//! order, and emits tasks in post-order so that each task follows all of
//! its dependencies. The walk keeps an explicit stack instead of recursing,
//! so deep chains do not exhaust the thread stack; the stack doubles as the
//! current path for cycle reporting.

use crate::{Error, Result};
use std::collections::HashSet;
use tracing::{debug, trace};

/// A validated execution order for a flow.
///
/// Roots and leaves are recorded in insertion order as of compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionPlan {
    order: Vec<String>,
    roots: Vec<String>,
    leaves: Vec<String>,
}

impl ExecutionPlan {
    /// Task names in execution order.
    #[must_use]
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Tasks without dependencies.
    #[must_use]
    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    /// Tasks no other task depends on.
    #[must_use]
    pub fn leaves(&self) -> &[String] {
        &self.leaves
    }

    /// Position of a task in the execution order.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.order.iter().position(|n| n == name)
    }

    /// Whether the plan schedules the named task.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Number of scheduled tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the plan is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

struct Frame<'a> {
    name: &'a str,
    deps: &'a [String],
    next: usize,
}

/// Compile a set of tasks into an [`ExecutionPlan`].
///
/// `names` lists every task in insertion order and `get_deps` returns the
/// declared dependencies of a task, or `None` if no such task exists. The
/// plan's roots and leaves keep the order of `names`.
///
/// # Errors
///
/// - [`Error::MissingDependency`] when a dependency does not resolve to a task.
/// - [`Error::CycleDetected`] when the walk re-enters a task on the current
///   path; the reported path starts at that task and returns to it.
pub fn compile_plan<'a, I, G>(names: I, get_deps: G) -> Result<ExecutionPlan>
where
    I: IntoIterator<Item = &'a str>,
    G: Fn(&str) -> Option<&'a [String]>,
{
    let names: Vec<&'a str> = names.into_iter().collect();
    let mut done: HashSet<&'a str> = HashSet::new();
    let mut on_path: HashSet<&'a str> = HashSet::new();
    let mut order = Vec::new();

    for &start in &names {
        if done.contains(start) {
            continue;
        }
        let deps = get_deps(start).unwrap_or_default();
        let mut stack = vec![Frame {
            name: start,
            deps,
            next: 0,
        }];
        on_path.insert(start);

        while let Some(frame) = stack.last_mut() {
            let Some(dep) = frame.deps.get(frame.next) else {
                let name = frame.name;
                stack.pop();
                on_path.remove(name);
                done.insert(name);
                trace!("Scheduled task '{}'", name);
                order.push(name.to_string());
                continue;
            };
            frame.next += 1;
            let dependent = frame.name;

            let Some(dep_deps) = get_deps(dep) else {
                return Err(Error::missing_dependency(dependent, dep.as_str()));
            };

            if on_path.contains(dep.as_str()) {
                let start_at = stack
                    .iter()
                    .position(|f| f.name == dep.as_str())
                    .unwrap_or_default();
                let mut path: Vec<String> = stack[start_at..]
                    .iter()
                    .map(|f| f.name.to_string())
                    .collect();
                path.push(dep.clone());
                debug!("Cycle detected: {}", path.join(" -> "));
                return Err(Error::cycle(path));
            }

            if done.contains(dep.as_str()) {
                continue;
            }

            on_path.insert(dep.as_str());
            stack.push(Frame {
                name: dep.as_str(),
                deps: dep_deps,
                next: 0,
            });
        }
    }

    let roots = names
        .iter()
        .filter(|name| get_deps(name).is_some_and(<[String]>::is_empty))
        .map(|name| (*name).to_string())
        .collect();
    let leaves = leaf_names(names.iter().copied(), &get_deps);

    debug!("Compiled execution plan with {} tasks", order.len());
    Ok(ExecutionPlan {
        order,
        roots,
        leaves,
    })
}

/// Names of tasks that no other task depends on, in insertion order.
pub fn leaf_names<'a, I, G>(names: I, get_deps: G) -> Vec<String>
where
    I: IntoIterator<Item = &'a str> + Clone,
    G: Fn(&str) -> Option<&'a [String]>,
{
    let referenced: HashSet<&str> = names
        .clone()
        .into_iter()
        .filter_map(&get_deps)
        .flatten()
        .map(String::as_str)
        .collect();

    names
        .into_iter()
        .filter(|name| !referenced.contains(name))
        .map(str::to_string)
        .collect()
}
