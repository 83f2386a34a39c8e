//! Canned flows exercised by the CLI.

use crate::tasks::{AddTask, MultiplyTask, ScaleTask};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use sloth_dag::{Flow, Result};
use std::fmt;

/// A demo flow layout.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, ValueEnum, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    /// A and B feed C = 10 * (A + B), D = C + 1
    #[default]
    Basic,
    /// Like basic, but D also consumes A directly
    Rewired,
    /// A and B feed C = 10 * A * B, D = C + 1
    Product,
    /// E depends on a task that is never defined
    Missing,
    /// A and B depend on each other
    Cycle,
}

impl Scenario {
    /// Build the flow for this scenario.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a task cannot be constructed.
    pub fn build(self) -> Result<Flow<i64>> {
        let name = self.to_string();
        match self {
            Self::Basic => Flow::builder(name)
                .task(AddTask::root("A")?)
                .task(AddTask::root("B")?)
                .task(ScaleTask::new(Some("C"), &["A", "B"], 10)?)
                .task(AddTask::new(Some("D"), &["C"], 1)?)
                .build(),
            Self::Rewired => Flow::builder(name)
                .task(AddTask::root("A")?)
                .task(AddTask::root("B")?)
                .task(ScaleTask::new(Some("C"), &["A", "B"], 10)?)
                .task(AddTask::new(Some("D"), &["A", "C"], 1)?)
                .build(),
            Self::Product => Flow::builder(name)
                .task(AddTask::root("A")?)
                .task(AddTask::root("B")?)
                .task(MultiplyTask::new(Some("C"), &["A", "B"], 10)?)
                .task(AddTask::new(Some("D"), &["C"], 1)?)
                .build(),
            Self::Missing => Flow::builder(name)
                .task(AddTask::root("A")?)
                .task(AddTask::new(Some("E"), &["F"], 0)?)
                .build(),
            Self::Cycle => Flow::builder(name)
                .task(AddTask::new(Some("A"), &["B"], 0)?)
                .task(AddTask::new(Some("B"), &["A"], 0)?)
                .build(),
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Basic => "basic",
            Self::Rewired => "rewired",
            Self::Product => "product",
            Self::Missing => "missing",
            Self::Cycle => "cycle",
        };
        write!(f, "{s}")
    }
}
