//! Argument parsing, command dispatch, error rendering and exit codes.

use crate::demo::Scenario;
use crate::tracing::LogLevel;
use clap::{Parser, Subcommand};
use indexmap::IndexMap;
use miette::{Diagnostic, Report};
use serde::Serialize;
use std::io::{self, Write};
use thiserror::Error;

/// Exit codes for the CLI application
pub const EXIT_OK: i32 = 0;
/// CLI or configuration error exit code
pub const EXIT_CLI: i32 = 2;
/// Flow compilation or execution error exit code
pub const EXIT_FLOW: i32 = 3;

/// CLI-specific error types with proper exit code mapping
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum CliError {
    /// CLI or configuration error (exit code 2)
    #[error("CLI/configuration error: {message}")]
    #[diagnostic(code(sloth::cli::config))]
    Config {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// Flow compilation or execution error (exit code 3)
    #[error("Flow error: {message}")]
    #[diagnostic(code(sloth::cli::flow))]
    Flow {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
}

impl CliError {
    /// Create a new configuration error with help text
    #[must_use]
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a new flow error
    #[must_use]
    pub fn flow(message: impl Into<String>) -> Self {
        Self::Flow {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new flow error with help text
    #[must_use]
    pub fn flow_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Flow {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

/// Convert `sloth_dag::Error` to the matching `CliError` variant.
///
/// Construction problems are configuration errors (exit code 2); anything
/// found while compiling or running the flow is a flow error (exit code 3).
impl From<sloth_dag::Error> for CliError {
    fn from(err: sloth_dag::Error) -> Self {
        match err {
            sloth_dag::Error::Configuration { message } => Self::config_with_help(
                message,
                "Task names and dependency names must be non-empty and unique",
            ),
            sloth_dag::Error::Arity { expected, .. } => Self::flow_with_help(
                err.to_string(),
                format!("Pass exactly {expected} value(s), one per root task"),
            ),
            sloth_dag::Error::MissingDependency { .. } => Self::flow_with_help(
                err.to_string(),
                "Every name in a task's dependency list must be a task in the flow",
            ),
            sloth_dag::Error::CycleDetected { .. } | sloth_dag::Error::Execution { .. } => {
                Self::flow(err.to_string())
            }
        }
    }
}

/// Map CLI error to appropriate exit code
#[must_use]
pub const fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::Config { .. } => EXIT_CLI,
        CliError::Flow { .. } => EXIT_FLOW,
    }
}

/// Render error appropriately based on JSON flag
pub fn render_error(err: &CliError, json_mode: bool) {
    if json_mode {
        let error_envelope = ErrorEnvelope::new(serde_json::json!({
            "code": match err {
                CliError::Config { .. } => "config",
                CliError::Flow { .. } => "flow",
            },
            "message": err.to_string()
        }));

        match serde_json::to_string(&error_envelope) {
            Ok(json) => println!("{json}"),
            Err(_) => eprintln!("Error serializing error response"),
        }
    } else {
        let report = Report::new(err.clone());
        eprintln!("{report:?}");
        let _ = io::stderr().flush();
    }
}

/// Success response envelope for JSON output
#[derive(Debug, Clone, Serialize)]
pub struct OkEnvelope<T> {
    /// Status indicator - always "ok" for success
    pub status: &'static str,
    /// The actual data payload
    pub data: T,
}

impl<T> OkEnvelope<T> {
    /// Create a new success envelope
    #[must_use]
    pub const fn new(data: T) -> Self {
        Self { status: "ok", data }
    }
}

/// Error response envelope for JSON output
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope<E> {
    /// Status indicator - always "error" for failures
    pub status: &'static str,
    /// The error details
    pub error: E,
}

impl<E> ErrorEnvelope<E> {
    /// Create a new error envelope
    #[must_use]
    pub const fn new(error: E) -> Self {
        Self {
            status: "error",
            error,
        }
    }
}

/// Main CLI entry point for sloth.
///
/// Builds one of the demo flows, then visualizes or runs it.
#[derive(Parser, Debug)]
#[command(name = "sloth")]
#[command(about = "Compile and run small DAG task flows")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Logging verbosity level.
    #[arg(
        short = 'L',
        long,
        global = true,
        help = "Set logging level",
        default_value = "warn",
        env = "SLOTH_LOG_LEVEL",
        value_enum
    )]
    pub level: LogLevel,

    /// Emit JSON envelope instead of text.
    #[arg(long, global = true, help = "Emit JSON envelope instead of text")]
    pub json: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the structure of a demo flow.
    #[command(about = "Print the structure of a demo flow", visible_alias = "viz")]
    Visualize {
        /// Demo flow to show.
        #[arg(long, short = 's', value_enum, default_value_t = Scenario::Basic)]
        scenario: Scenario,
        /// Also print the flowchart as Graphviz DOT.
        #[arg(long, help = "Also print the flowchart as Graphviz DOT")]
        dot: bool,
    },
    /// Run a demo flow with values for its root tasks.
    #[command(about = "Run a demo flow with values for its root tasks")]
    Run {
        /// Demo flow to run.
        #[arg(long, short = 's', value_enum, default_value_t = Scenario::Basic)]
        scenario: Scenario,
        /// One value per root task, in declaration order.
        #[arg(
            value_name = "VALUE",
            allow_negative_numbers = true,
            help = "One value per root task, in declaration order"
        )]
        values: Vec<i64>,
    },
}

/// Execute a parsed command and return the text to print on stdout.
///
/// # Errors
///
/// Returns a [`CliError`] when the flow cannot be built, compiled or run.
#[tracing::instrument(skip_all)]
pub fn execute(command: Commands, json: bool) -> Result<String, CliError> {
    match command {
        Commands::Visualize { scenario, dot } => {
            let flow = scenario.build()?;
            ::tracing::debug!("Visualizing scenario '{}'", scenario);
            if json {
                let data = serde_json::json!({
                    "flow": flow.name(),
                    "text": flow.visualize(),
                    "dot": dot.then(|| flow.to_dot()),
                });
                return to_json(&OkEnvelope::new(data));
            }
            let mut out = flow.visualize();
            if dot {
                out.push_str("\nFlowchart-style DAG visualization:\n");
                out.push_str(&flow.to_dot());
            }
            Ok(out)
        }
        Commands::Run { scenario, values } => {
            let mut flow = scenario.build()?;
            ::tracing::debug!("Running scenario '{}' with {:?}", scenario, values);
            let result: IndexMap<String, i64> = flow.run(values)?;
            if json {
                return to_json(&OkEnvelope::new(result));
            }
            Ok(result
                .iter()
                .map(|(name, value)| format!("{name} = {value}"))
                .collect::<Vec<_>>()
                .join("\n"))
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string(value)
        .map_err(|e| CliError::flow(format!("Failed to serialize output: {e}")))
}

/// Parse the process arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}
