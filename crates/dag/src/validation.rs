//! Construction-time validation helpers.
//!
//! These run when tasks and flows are assembled so that malformed names
//! surface as [`Error::Configuration`] before anything is compiled.

use crate::{Error, Result};
use std::collections::HashSet;

/// Check that every item satisfies `predicate`.
///
/// On the first failing item, `describe` builds the error message for it.
///
/// # Errors
///
/// Returns [`Error::Configuration`] for the first item rejected by `predicate`.
pub fn ensure_all<'a, T, P, D>(items: &'a [T], predicate: P, describe: D) -> Result<()>
where
    P: Fn(&T) -> bool,
    D: Fn(usize, &'a T) -> String,
{
    match items.iter().enumerate().find(|(_, item)| !predicate(*item)) {
        Some((index, item)) => Err(Error::configuration(describe(index, item))),
        None => Ok(()),
    }
}

/// Whether `name` can identify a task.
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
}

/// Validate a single task name.
///
/// # Errors
///
/// Returns [`Error::Configuration`] if the name is empty.
pub fn ensure_name(what: &str, name: &str) -> Result<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(Error::configuration(format!("{what} must be a non-empty string")))
    }
}

/// Validate a dependency list.
///
/// # Errors
///
/// Returns [`Error::Configuration`] naming the first invalid entry.
pub fn ensure_names(field: &str, names: &[String]) -> Result<()> {
    ensure_all(
        names,
        |name| is_valid_name(name),
        |index, name| {
            format!("{field} must be a list of non-empty strings (entry {index}: {name:?})")
        },
    )
}

/// Reject duplicate task names.
///
/// # Errors
///
/// Returns [`Error::Configuration`] naming the first repeated task.
pub fn ensure_unique<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(Error::configuration(format!(
                "duplicate task name '{name}' in flow"
            )));
        }
    }
    Ok(())
}
