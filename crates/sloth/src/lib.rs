//! sloth command-line front end.
//!
//! Wraps [`sloth_dag`] with a handful of arithmetic task kinds and canned
//! demo flows so the engine can be driven from a terminal.

// The CLI renders results and errors to stdout/stderr - this is intentional
#![allow(clippy::print_stdout, clippy::print_stderr)]

pub mod cli;
pub mod demo;
pub mod tasks;
pub mod tracing;
