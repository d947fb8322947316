//! Crate-level error type.

use thiserror::Error;

use crate::config::ConfigError;
use crate::execute::ExecuteError;
use crate::plan::PlanError;
use crate::registry::RegistryError;

/// Process exit code for a failed or interrupted action.
pub const EXIT_ACTION_FAILED: u8 = 1;

/// Process exit code for requests that cannot be planned (unknown target,
/// cycle, duplicate declaration, bad variable reference or override).
pub const EXIT_INVALID_REQUEST: u8 = 2;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error(transparent)]
  Registry(#[from] RegistryError),

  #[error(transparent)]
  Plan(#[from] PlanError),

  #[error(transparent)]
  Execute(#[from] ExecuteError),
}

impl Error {
  /// Exit code distinguishing "the build broke" from "the request is invalid".
  pub fn exit_code(&self) -> u8 {
    match self {
      Error::Execute(e) if !e.is_validation() => EXIT_ACTION_FAILED,
      _ => EXIT_INVALID_REQUEST,
    }
  }
}

pub type Result<T> = std::result::Result<T, Error>;
