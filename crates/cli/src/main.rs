mod cmd;
mod invocation;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use orca_lib::error::EXIT_ACTION_FAILED;
use orca_lib::{Error, Manifest};

use cmd::{RunOptions, cmd_list, cmd_run};
use invocation::Invocation;
use output::{OutputFormat, print_error, print_warning};

/// orca - run named targets after their dependencies
///
/// Arguments of the form NAME=VALUE override variables; all other arguments
/// are targets. With no targets, the default target runs.
#[derive(Parser)]
#[command(name = "orca")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Targets to run and NAME=VALUE variable overrides
  #[arg(value_name = "TARGET|NAME=VALUE")]
  args: Vec<String>,

  /// List targets and variables
  #[arg(short, long)]
  list: bool,

  /// Print the commands that would run without running them
  #[arg(short = 'n', long)]
  dry_run: bool,

  /// Run actions in DIR
  #[arg(short = 'C', long, value_name = "DIR")]
  directory: Option<PathBuf>,

  /// Shell used to run actions (default: /bin/sh, or PowerShell on Windows)
  #[arg(long)]
  shell: Option<String>,

  /// Output format for --list and --dry-run
  #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
  format: OutputFormat,

  /// Enable verbose output
  #[arg(short, long)]
  verbose: bool,
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let filter = EnvFilter::try_from_env("ORCA_LOG")
    .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "warn" }));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match run(cli) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      print_error(&format!("{err:#}"));
      let code = err
        .downcast_ref::<Error>()
        .map(Error::exit_code)
        .unwrap_or(EXIT_ACTION_FAILED);
      ExitCode::from(code)
    }
  }
}

fn run(cli: Cli) -> Result<()> {
  let manifest = Manifest::builtin().map_err(Error::from)?;
  let invocation = Invocation::parse(&cli.args).map_err(Error::from)?;

  if cli.list {
    if !invocation.targets.is_empty() {
      print_warning("ignoring targets with --list");
    }
    return cmd_list(&manifest, &invocation.overrides, cli.format);
  }

  let options = RunOptions {
    dry_run: cli.dry_run,
    directory: cli.directory,
    shell: cli.shell,
    format: cli.format,
  };

  cmd_run(&manifest, &invocation, &options)
}
