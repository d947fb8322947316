//! Implementation of the default `orca [TARGET]...` command.
//!
//! Resolves variables, plans the requested targets, renders every action and
//! only then starts running, so an invalid request never has side effects.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use orca_lib::execute::{ExecuteConfig, Reporter, Step, StepOutcome, StepResult, execute_steps, render};
use orca_lib::{ConfigResolver, Error, Manifest, plan};

use crate::invocation::Invocation;
use crate::output::{OutputFormat, format_duration, print_json, print_skipped, print_step, print_success};

pub struct RunOptions {
  pub dry_run: bool,
  pub directory: Option<PathBuf>,
  pub shell: Option<String>,
  pub format: OutputFormat,
}

#[derive(Serialize)]
struct DryRun<'a> {
  requested: &'a [String],
  steps: &'a [Step],
}

/// Prints each step as it starts, like make echoing commands.
struct TermReporter;

impl Reporter for TermReporter {
  fn step_started(&mut self, step: &Step) {
    print_step(&step.target, step.command.as_deref());
  }

  fn step_finished(&mut self, result: &StepResult) {
    if result.outcome == StepOutcome::Succeeded {
      info!(step = %result.target, duration = %format_duration(result.duration), "step succeeded");
    }
  }
}

pub fn cmd_run(manifest: &Manifest, invocation: &Invocation, options: &RunOptions) -> Result<()> {
  let vars = ConfigResolver::from_process(invocation.overrides.clone()).resolve_all(&manifest.variables);

  let requested = invocation.requested(&manifest.registry).map_err(Error::from)?;
  let plan = plan(&manifest.registry, &requested).map_err(Error::from)?;
  let steps = render(&plan, &manifest.registry, &vars).map_err(Error::from)?;

  if options.dry_run {
    return print_dry_run(&requested, &steps, options.format);
  }

  let config = ExecuteConfig {
    shell: options.shell.clone(),
    cwd: options.directory.clone(),
  };

  // One subprocess at a time; the runtime only drives waits and signals
  let rt = tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()
    .context("Failed to create async runtime")?;

  let result = rt
    .block_on(execute_steps(steps, &config, &mut TermReporter))
    .map_err(Error::from)?;

  for target in &result.skipped {
    print_skipped(target);
  }

  match result.failed {
    Some((_, err)) => Err(Error::from(err).into()),
    None => {
      print_success(&format!(
        "{} target(s) done in {}",
        result.completed.len(),
        format_duration(result.duration)
      ));
      Ok(())
    }
  }
}

fn print_dry_run(requested: &[String], steps: &[Step], format: OutputFormat) -> Result<()> {
  if format.is_json() {
    return print_json(&DryRun { requested, steps });
  }

  for step in steps {
    if let Some(command) = &step.command {
      println!("{command}");
    }
  }
  Ok(())
}

