//! sloth CLI Application
//!
//! Builds one of the bundled demo flows, then prints its structure or runs it
//! with the root values given on the command line.

// CLI binary needs to output to stdout/stderr - this is intentional
#![allow(clippy::print_stdout, clippy::print_stderr)]

use sloth::cli::{self, CliError, EXIT_OK, exit_code_for, render_error};
use sloth::tracing::{Level, TracingConfig, TracingFormat, init_tracing};

fn main() {
    let cli = cli::parse();

    let tracing_config = TracingConfig {
        format: if cli.json {
            TracingFormat::Json
        } else {
            TracingFormat::Pretty
        },
        level: Level::from(cli.level),
    };
    // Ignore error if tracing already initialized (e.g., in tests)
    let _ = init_tracing(tracing_config);

    let exit_code = run(cli);
    std::process::exit(exit_code);
}

#[tracing::instrument(skip_all)]
fn run(cli: cli::Cli) -> i32 {
    let Some(command) = cli.command else {
        render_error(
            &CliError::config_with_help(
                "No subcommand provided",
                "Run 'sloth --help' for usage information",
            ),
            cli.json,
        );
        return cli::EXIT_CLI;
    };

    match cli::execute(command, cli.json) {
        Ok(output) => {
            println!("{output}");
            EXIT_OK
        }
        Err(err) => {
            render_error(&err, cli.json);
            exit_code_for(&err)
        }
    }
}
