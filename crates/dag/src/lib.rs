//! Minimal DAG task executor for sloth.
//!
//! Users define named [`Task`]s that declare upstream dependencies by name,
//! group them into a [`Flow`], and run it. The flow is compiled first:
//! missing dependencies and cycles are reported before any task executes,
//! and a topological order is fixed. Running seeds root tasks with the
//! caller's positional inputs, feeds every other task the outputs of its
//! dependencies, and returns the outputs of the leaf tasks.
//!
//! # Key Types
//!
//! - [`Task`]: the contract every unit of work implements
//! - [`TaskHeader`]: validated name and dependency list of a task
//! - [`Flow`]: a named set of tasks with `compile`, `run` and `visualize`
//! - [`ExecutionPlan`]: the compiled execution order
//!
//! # Example
//!
//! ```ignore
//! use sloth_dag::{Flow, FnTask, Inputs};
//!
//! let add = |name: &str, deps: &[&str]| {
//!     FnTask::new(name, deps.iter().copied(), |inputs: &Inputs<i64>| {
//!         Ok::<_, sloth_dag::Error>(inputs.values().sum())
//!     })
//! };
//!
//! let mut flow = Flow::builder("example")
//!     .task(add("a", &[])?)
//!     .task(add("b", &[])?)
//!     .task(add("total", &["a", "b"])?)
//!     .build()?;
//!
//! let outputs = flow.run([2, 3])?;
//! assert_eq!(outputs["total"], 5);
//! ```

mod error;
mod flow;
mod plan;
mod task;
pub mod validation;

pub use error::{Error, Result};
pub use flow::{Flow, FlowBuilder, SharedTask};
pub use plan::{ExecutionPlan, compile_plan, leaf_names};
pub use task::{FnTask, Inputs, Task, TaskHeader, TaskKind};
