//! Arithmetic task kinds used by the demo flows.

use sloth_dag::{Error, Inputs, Result, Task, TaskHeader, TaskKind};

/// Sums all input values and adds a constant.
#[derive(Debug, Clone)]
pub struct AddTask {
    header: TaskHeader,
    add_value: i64,
}

impl AddTask {
    /// Create an add task. Without a name the task is called `AddTask`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an empty name or dependency.
    pub fn new(name: Option<&str>, input_tasks: &[&str], add_value: i64) -> Result<Self> {
        Ok(Self {
            header: TaskHeader::for_kind::<Self, _, _>(name, input_tasks.iter().copied())?,
            add_value,
        })
    }

    /// A root task seeded by the caller.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an empty name.
    pub fn root(name: &str) -> Result<Self> {
        Self::new(Some(name), &[], 0)
    }
}

impl TaskKind for AddTask {
    const KIND: &'static str = "AddTask";
}

impl Task<i64> for AddTask {
    fn header(&self) -> &TaskHeader {
        &self.header
    }

    fn execute(&self, inputs: &Inputs<i64>) -> Result<i64> {
        inputs
            .values()
            .try_fold(self.add_value, |acc, value| acc.checked_add(*value))
            .ok_or_else(|| Error::execution(self.name(), "integer overflow in addition"))
    }
}

/// Multiplies all input values together and scales by a factor.
#[derive(Debug, Clone)]
pub struct MultiplyTask {
    header: TaskHeader,
    factor: i64,
}

impl MultiplyTask {
    /// Create a multiply task. Without a name the task is called `MultiplyTask`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an empty name or dependency.
    pub fn new(name: Option<&str>, input_tasks: &[&str], factor: i64) -> Result<Self> {
        Ok(Self {
            header: TaskHeader::for_kind::<Self, _, _>(name, input_tasks.iter().copied())?,
            factor,
        })
    }
}

impl TaskKind for MultiplyTask {
    const KIND: &'static str = "MultiplyTask";
}

impl Task<i64> for MultiplyTask {
    fn header(&self) -> &TaskHeader {
        &self.header
    }

    fn execute(&self, inputs: &Inputs<i64>) -> Result<i64> {
        inputs
            .values()
            .try_fold(1_i64, |acc, value| acc.checked_mul(*value))
            .and_then(|product| product.checked_mul(self.factor))
            .ok_or_else(|| Error::execution(self.name(), "integer overflow in multiplication"))
    }
}

/// Sums all input values and scales the total by a factor.
#[derive(Debug, Clone)]
pub struct ScaleTask {
    header: TaskHeader,
    factor: i64,
}

impl ScaleTask {
    /// Create a scale task. Without a name the task is called `ScaleTask`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an empty name or dependency.
    pub fn new(name: Option<&str>, input_tasks: &[&str], factor: i64) -> Result<Self> {
        Ok(Self {
            header: TaskHeader::for_kind::<Self, _, _>(name, input_tasks.iter().copied())?,
            factor,
        })
    }
}

impl TaskKind for ScaleTask {
    const KIND: &'static str = "ScaleTask";
}

impl Task<i64> for ScaleTask {
    fn header(&self) -> &TaskHeader {
        &self.header
    }

    fn execute(&self, inputs: &Inputs<i64>) -> Result<i64> {
        inputs
            .values()
            .try_fold(0_i64, |acc, value| acc.checked_add(*value))
            .and_then(|total| total.checked_mul(self.factor))
            .ok_or_else(|| Error::execution(self.name(), "integer overflow in scaling"))
    }
}
