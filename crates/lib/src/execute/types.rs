//! Types for target execution.
//!
//! This module defines the error types, result types, and configuration
//! for running an execution plan.

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::placeholder::PlaceholderError;
use crate::registry::TargetKind;

/// How a failed action terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStatus {
  /// Exited with a non-zero code.
  Code(i32),
  /// Killed by a signal (Unix only).
  Signal(i32),
  /// The platform reported neither a code nor a signal.
  Unknown,
}

impl From<ExitStatus> for FailureStatus {
  fn from(status: ExitStatus) -> Self {
    if let Some(code) = status.code() {
      return FailureStatus::Code(code);
    }

    #[cfg(unix)]
    {
      use std::os::unix::process::ExitStatusExt;
      if let Some(signal) = status.signal() {
        return FailureStatus::Signal(signal);
      }
    }

    FailureStatus::Unknown
  }
}

impl std::fmt::Display for FailureStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      FailureStatus::Code(code) => write!(f, "exit code {code}"),
      FailureStatus::Signal(signal) => write!(f, "signal {signal}"),
      FailureStatus::Unknown => f.write_str("unknown status"),
    }
  }
}

/// Errors that can occur while running a plan.
#[derive(Debug, Error)]
pub enum ExecuteError {
  /// An action references a variable that cannot be resolved.
  #[error("target '{target}' has an invalid action")]
  Placeholder {
    target: String,
    #[source]
    source: PlaceholderError,
  },

  /// The plan names a target missing from the registry.
  #[error("unknown target: {0}")]
  UnknownTarget(String),

  /// The shell could not be started.
  #[error("target '{target}': failed to start command")]
  Spawn {
    target: String,
    #[source]
    source: std::io::Error,
  },

  /// The action ran and reported failure.
  #[error("target '{target}' failed with {status}: {cmd}")]
  ActionFailed {
    target: String,
    cmd: String,
    status: FailureStatus,
  },

  /// The operator interrupted the run while the target was executing or
  /// before it started.
  #[error("target '{target}' interrupted")]
  Interrupted { target: String },

  /// Interrupt handlers could not be installed.
  #[error("failed to listen for interrupts")]
  Listen(#[source] std::io::Error),
}

impl ExecuteError {
  /// Returns true for errors raised before any subprocess is started.
  pub fn is_validation(&self) -> bool {
    matches!(self, ExecuteError::Placeholder { .. } | ExecuteError::UnknownTarget(_))
  }
}

/// A plan entry with its action rendered against the run's variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
  pub target: String,
  /// Rendered command; `None` for targets that only group dependencies.
  pub command: Option<String>,
  pub kind: TargetKind,
}

/// What happened when a step ran successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
  /// The command ran and exited successfully.
  Succeeded,
  /// The target has no action.
  NoAction,
}

/// Result of running a single step.
#[derive(Debug, Clone)]
pub struct StepResult {
  pub target: String,
  pub outcome: StepOutcome,
  pub duration: Duration,
}

/// Result of running a whole plan.
#[derive(Debug, Default)]
pub struct ExecutionResult {
  /// Steps that finished successfully, in order.
  pub completed: Vec<StepResult>,

  /// The step that failed (at most one, stops execution).
  pub failed: Option<(String, ExecuteError)>,

  /// Steps that never ran because an earlier step failed.
  pub skipped: Vec<String>,

  /// Wall-clock time for the run.
  pub duration: Duration,
}

impl ExecutionResult {
  pub fn is_success(&self) -> bool {
    self.failed.is_none()
  }

  /// Names of the targets whose step was started, in order.
  pub fn started(&self) -> Vec<&str> {
    self
      .completed
      .iter()
      .map(|r| r.target.as_str())
      .chain(self.failed.iter().map(|(target, _)| target.as_str()))
      .collect()
  }
}

/// Configuration for plan execution.
#[derive(Debug, Clone, Default)]
pub struct ExecuteConfig {
  /// Shell used to run actions.
  /// If None, uses /bin/sh (Unix) or powershell.exe (Windows).
  pub shell: Option<String>,

  /// Working directory for actions. If None, the current directory is used.
  pub cwd: Option<PathBuf>,
}

/// Receives progress notifications while a plan runs.
pub trait Reporter {
  fn step_started(&mut self, _step: &Step) {}

  fn step_finished(&mut self, _result: &StepResult) {}

  fn step_failed(&mut self, _target: &str, _error: &ExecuteError) {}
}

/// No-op reporter.
impl Reporter for () {}
