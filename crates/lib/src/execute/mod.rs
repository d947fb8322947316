//! Plan execution.
//!
//! Runs an execution plan one step at a time:
//! - Every action is rendered against the resolved variables before anything
//!   runs, so a bad variable reference fails the run with no side effects
//! - Steps run strictly in plan order, each waiting for the previous one
//! - The first failing step stops the run; later steps are recorded as skipped
//! - An interrupt, during a step or between two, fails the run the same way

pub mod cmd;
pub mod signal;
pub mod types;

use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::config::ResolvedVars;
use crate::placeholder;
use crate::plan::ExecutionPlan;
use crate::registry::{Registry, TargetKind};

pub use cmd::execute_cmd;
pub use signal::Interrupts;
pub use types::{
  ExecuteConfig, ExecuteError, ExecutionResult, FailureStatus, Reporter, Step, StepOutcome, StepResult,
};

/// Render every step of a plan.
///
/// # Errors
///
/// Returns `UnknownTarget` if the plan names a target missing from the
/// registry and `Placeholder` if any action has a malformed or undefined
/// variable reference.
pub fn render(plan: &ExecutionPlan, registry: &Registry, vars: &ResolvedVars) -> Result<Vec<Step>, ExecuteError> {
  plan
    .targets()
    .iter()
    .map(|name| {
      let target = registry
        .lookup(name)
        .map_err(|_| ExecuteError::UnknownTarget(name.clone()))?;

      let command = target
        .action
        .as_deref()
        .map(|action| placeholder::substitute(action, vars))
        .transpose()
        .map_err(|source| ExecuteError::Placeholder {
          target: name.clone(),
          source,
        })?;

      Ok(Step {
        target: name.clone(),
        command,
        kind: target.kind,
      })
    })
    .collect()
}

/// Execute a plan.
///
/// This is the main entry point for running targets. It:
/// 1. Renders all steps up front
/// 2. Runs each step in order, awaiting its completion
/// 3. Stops at the first failure, recording remaining steps as skipped
///
/// # Returns
///
/// An `ExecutionResult` with completed, failed and skipped steps. Rendering
/// errors are returned as `Err` since nothing has run yet.
pub async fn execute(
  plan: &ExecutionPlan,
  registry: &Registry,
  vars: &ResolvedVars,
  config: &ExecuteConfig,
  reporter: &mut impl Reporter,
) -> Result<ExecutionResult, ExecuteError> {
  let steps = render(plan, registry, vars)?;
  execute_steps(steps, config, reporter).await
}

/// Execute already rendered steps.
///
/// Must be called within a tokio runtime with signals enabled.
pub async fn execute_steps(
  steps: Vec<Step>,
  config: &ExecuteConfig,
  reporter: &mut impl Reporter,
) -> Result<ExecutionResult, ExecuteError> {
  info!(step_count = steps.len(), "starting execution");

  let mut interrupts = Interrupts::listen().map_err(ExecuteError::Listen)?;
  let run_start = Instant::now();
  let mut result = ExecutionResult::default();
  let mut remaining = steps.into_iter();

  while let Some(step) = remaining.next() {
    reporter.step_started(&step);
    let start = Instant::now();

    let outcome = if interrupts.pending().await {
      warn!(step = %step.target, "interrupted before start");
      Err(ExecuteError::Interrupted {
        target: step.target.clone(),
      })
    } else {
      run_step(&step, config, &mut interrupts).await
    };

    match outcome {
      Ok(outcome) => {
        let step_result = StepResult {
          target: step.target,
          outcome,
          duration: start.elapsed(),
        };
        debug!(step = %step_result.target, outcome = ?outcome, "step finished");
        reporter.step_finished(&step_result);
        result.completed.push(step_result);
      }
      Err(e) => {
        error!(step = %step.target, error = %e, "step failed");
        reporter.step_failed(&step.target, &e);
        result.failed = Some((step.target, e));
        result.skipped = remaining.by_ref().map(|s| s.target).collect();
        break;
      }
    }
  }

  result.duration = run_start.elapsed();

  info!(
    completed = result.completed.len(),
    failed = result.failed.is_some(),
    skipped = result.skipped.len(),
    "execution complete"
  );

  Ok(result)
}

async fn run_step(
  step: &Step,
  config: &ExecuteConfig,
  interrupts: &mut Interrupts,
) -> Result<StepOutcome, ExecuteError> {
  let Some(command) = &step.command else {
    debug!(step = %step.target, "no action");
    return Ok(StepOutcome::NoAction);
  };

  if step.kind == TargetKind::File {
    debug!(step = %step.target, "file target has no freshness check, running unconditionally");
  }

  execute_cmd(
    &step.target,
    command,
    config.cwd.as_deref(),
    config.shell.as_deref(),
    interrupts,
  )
  .await?;
  Ok(StepOutcome::Succeeded)
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeMap;
  use std::path::Path;

  use super::*;
  use crate::config::{ConfigResolver, VarDecl};
  use crate::placeholder::PlaceholderError;
  use crate::plan::plan;
  use crate::registry::Target;
  use tempfile::TempDir;
  use tracing_test::traced_test;

  #[derive(Default)]
  struct RecordingReporter {
    events: Vec<String>,
  }

  impl Reporter for RecordingReporter {
    fn step_started(&mut self, step: &Step) {
      self.events.push(format!("start {}", step.target));
    }

    fn step_finished(&mut self, result: &StepResult) {
      self.events.push(format!("finish {}", result.target));
    }

    fn step_failed(&mut self, target: &str, _error: &ExecuteError) {
      self.events.push(format!("fail {}", target));
    }
  }

  fn vars(pairs: &[(&str, &str)]) -> ResolvedVars {
    let decls: Vec<_> = pairs.iter().map(|(k, v)| VarDecl::new(*k, *v)).collect();
    ConfigResolver::new(BTreeMap::new(), BTreeMap::new()).resolve_all(&decls)
  }

  /// Registry whose actions append their target name to `log` in `dir`.
  /// `failing` targets exit non-zero after logging.
  fn logging_registry(failing: &[&str]) -> Registry {
    let action = |name: &str| {
      if failing.contains(&name) {
        format!("echo {name} >> log && exit 7")
      } else {
        format!("echo {name} >> log")
      }
    };

    let mut registry = Registry::new();
    registry.register(Target::phony("clean").action(action("clean"))).unwrap();
    registry.register(Target::phony("fmt").action(action("fmt"))).unwrap();
    registry
      .register(Target::phony("clippy").deps(["clean"]).action(action("clippy")))
      .unwrap();
    registry.register(Target::phony("all").deps(["fmt", "clippy"])).unwrap();
    registry.set_default("all").unwrap();
    registry
  }

  fn read_log(dir: &Path) -> Vec<String> {
    std::fs::read_to_string(dir.join("log"))
      .unwrap_or_default()
      .lines()
      .map(str::to_string)
      .collect()
  }

  fn config_in(dir: &TempDir) -> ExecuteConfig {
    ExecuteConfig {
      cwd: Some(dir.path().to_path_buf()),
      ..Default::default()
    }
  }

  #[test]
  fn render_substitutes_variables() {
    let mut registry = Registry::new();
    registry
      .register(Target::phony("clean").action("$${CARGO} clean -p $${PKG}"))
      .unwrap();
    let plan = plan(&registry, &["clean"]).unwrap();

    let steps = render(&plan, &registry, &vars(&[("CARGO", "cargo"), ("PKG", "kilo")])).unwrap();

    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].command.as_deref(), Some("cargo clean -p kilo"));
    assert_eq!(steps[0].kind, TargetKind::Phony);
  }

  #[test]
  fn render_keeps_actionless_targets() {
    let registry = logging_registry(&[]);
    let plan = plan(&registry, &["all"]).unwrap();

    let steps = render(&plan, &registry, &ResolvedVars::default()).unwrap();
    let all = steps.last().unwrap();
    assert_eq!(all.target, "all");
    assert_eq!(all.command, None);
  }

  #[cfg(unix)]
  #[tokio::test]
  #[traced_test]
  async fn full_plan_runs_in_order() {
    let dir = TempDir::new().unwrap();
    let registry = logging_registry(&[]);
    let plan = plan(&registry, &["all"]).unwrap();
    let mut reporter = RecordingReporter::default();

    let result = execute(&plan, &registry, &ResolvedVars::default(), &config_in(&dir), &mut reporter)
      .await
      .unwrap();

    assert!(result.is_success());
    assert_eq!(read_log(dir.path()), vec!["fmt", "clean", "clippy"]);
    assert_eq!(result.started(), vec!["fmt", "clean", "clippy", "all"]);
    assert_eq!(result.completed[3].outcome, StepOutcome::NoAction);
    assert!(result.skipped.is_empty());
    assert!(logs_contain("execution complete"));
  }

  #[cfg(unix)]
  #[tokio::test]
  async fn failure_stops_remaining_steps() {
    let dir = TempDir::new().unwrap();
    let registry = logging_registry(&["clean"]);
    let plan = plan(&registry, &["all"]).unwrap();
    assert_eq!(plan.targets(), ["fmt", "clean", "clippy", "all"]);
    let mut reporter = RecordingReporter::default();

    let result = execute(&plan, &registry, &ResolvedVars::default(), &config_in(&dir), &mut reporter)
      .await
      .unwrap();

    assert!(!result.is_success());
    assert_eq!(read_log(dir.path()), vec!["fmt", "clean"]);
    assert_eq!(result.skipped, vec!["clippy", "all"]);
    assert_eq!(
      reporter.events,
      vec!["start fmt", "finish fmt", "start clean", "fail clean"]
    );

    let (target, err) = result.failed.unwrap();
    assert_eq!(target, "clean");
    assert!(matches!(
      err,
      ExecuteError::ActionFailed {
        status: FailureStatus::Code(7),
        ..
      }
    ));
  }

  #[cfg(unix)]
  #[tokio::test]
  async fn kth_failure_runs_exactly_first_k() {
    let names: Vec<String> = (0..6).map(|i| format!("s{i}")).collect();

    for k in 0..names.len() {
      let dir = TempDir::new().unwrap();
      let mut registry = Registry::new();
      for (i, name) in names.iter().enumerate() {
        let action = if i == k {
          format!("echo {name} >> log; false")
        } else {
          format!("echo {name} >> log")
        };
        let deps: Vec<String> = if i == 0 { vec![] } else { vec![names[i - 1].clone()] };
        registry.register(Target::phony(name.clone()).deps(deps).action(action)).unwrap();
      }
      let plan = plan(&registry, &[names.last().unwrap()]).unwrap();

      let result = execute(&plan, &registry, &ResolvedVars::default(), &config_in(&dir), &mut ())
        .await
        .unwrap();

      assert_eq!(read_log(dir.path()), names[..=k].to_vec());
      assert_eq!(result.failed.as_ref().map(|(t, _)| t.as_str()), Some(names[k].as_str()));
      assert_eq!(result.skipped, names[k + 1..].to_vec());
    }
  }

  #[cfg(unix)]
  #[tokio::test]
  async fn undefined_variable_runs_nothing() {
    let dir = TempDir::new().unwrap();
    let mut registry = Registry::new();
    registry.register(Target::phony("fmt").action("echo fmt >> log")).unwrap();
    registry
      .register(Target::phony("clean").deps(["fmt"]).action("$${CARGO} clean -p $${PKG}"))
      .unwrap();
    let plan = plan(&registry, &["clean"]).unwrap();

    let err = execute(
      &plan,
      &registry,
      &vars(&[("CARGO", "cargo")]),
      &config_in(&dir),
      &mut (),
    )
    .await
    .unwrap_err();

    assert!(err.is_validation());
    assert!(matches!(
      err,
      ExecuteError::Placeholder {
        ref target,
        source: PlaceholderError::Undefined(ref name),
      } if target == "clean" && name == "PKG"
    ));
    assert!(read_log(dir.path()).is_empty());
  }

  #[cfg(unix)]
  #[tokio::test]
  async fn file_targets_run_unconditionally() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("out.txt"), "already here").unwrap();

    let mut registry = Registry::new();
    registry
      .register(
        Target::phony("out.txt")
          .kind(TargetKind::File)
          .action("echo out.txt >> log"),
      )
      .unwrap();
    let plan = plan(&registry, &["out.txt"]).unwrap();

    let result = execute(&plan, &registry, &ResolvedVars::default(), &config_in(&dir), &mut ())
      .await
      .unwrap();

    assert!(result.is_success());
    assert_eq!(read_log(dir.path()), vec!["out.txt"]);
  }

  #[tokio::test]
  async fn empty_plan_succeeds() {
    let registry = Registry::new();
    let plan = plan::<&str>(&registry, &[]).unwrap();

    let result = execute(
      &plan,
      &registry,
      &ResolvedVars::default(),
      &ExecuteConfig::default(),
      &mut (),
    )
    .await
    .unwrap();

    assert!(result.is_success());
    assert!(result.completed.is_empty());
  }
}
