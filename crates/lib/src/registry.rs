//! Target registry.
//!
//! Targets live in an arena and are looked up through a name index. The
//! registry is populated once at startup and only read afterwards; it has no
//! interior mutability, so `&Registry` can be shared freely.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

/// Index of a target in the registry arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(usize);

/// Whether a target is gated on file freshness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
  /// Always runs when reached in a plan.
  #[default]
  Phony,
  /// Named after a file it produces. No freshness check is done, so it runs
  /// like a phony target.
  File,
}

/// A named unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
  pub name: String,
  pub deps: Vec<String>,
  /// Command template; `None` means the target only groups its dependencies.
  pub action: Option<String>,
  pub kind: TargetKind,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
}

impl Target {
  /// A phony target with no dependencies and no action.
  pub fn phony(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      deps: Vec::new(),
      action: None,
      kind: TargetKind::Phony,
      description: None,
    }
  }

  pub fn deps<I, S>(mut self, deps: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.deps = deps.into_iter().map(Into::into).collect();
    self
  }

  pub fn action(mut self, action: impl Into<String>) -> Self {
    self.action = Some(action.into());
    self
  }

  pub fn kind(mut self, kind: TargetKind) -> Self {
    self.kind = kind;
    self
  }

  pub fn description(mut self, description: impl Into<String>) -> Self {
    self.description = Some(description.into());
    self
  }

  pub fn is_phony(&self) -> bool {
    self.kind == TargetKind::Phony
  }
}

/// Errors from declaring or looking up targets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
  #[error("target '{0}' is declared more than once")]
  DuplicateTarget(String),

  #[error("unknown target: {0}")]
  UnknownTarget(String),

  #[error("no default target declared")]
  NoDefaultTarget,
}

/// The static set of declared targets.
#[derive(Debug, Clone, Default)]
pub struct Registry {
  targets: Vec<Target>,
  index: HashMap<String, TargetId>,
  default: Option<TargetId>,
}

impl Registry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Declare a target.
  ///
  /// Dependencies are not checked here; they may name targets registered
  /// later. Missing dependencies surface when a plan is computed.
  pub fn register(&mut self, target: Target) -> Result<TargetId, RegistryError> {
    if self.index.contains_key(&target.name) {
      return Err(RegistryError::DuplicateTarget(target.name));
    }

    let id = TargetId(self.targets.len());
    self.index.insert(target.name.clone(), id);
    self.targets.push(target);
    Ok(id)
  }

  /// Designate the target used when an invocation names none.
  pub fn set_default(&mut self, name: &str) -> Result<(), RegistryError> {
    let id = self.id_of(name)?;
    self.default = Some(id);
    Ok(())
  }

  pub fn default_target(&self) -> Result<&Target, RegistryError> {
    self
      .default
      .map(|id| &self.targets[id.0])
      .ok_or(RegistryError::NoDefaultTarget)
  }

  pub fn id_of(&self, name: &str) -> Result<TargetId, RegistryError> {
    self
      .index
      .get(name)
      .copied()
      .ok_or_else(|| RegistryError::UnknownTarget(name.to_string()))
  }

  pub fn lookup(&self, name: &str) -> Result<&Target, RegistryError> {
    self.id_of(name).map(|id| &self.targets[id.0])
  }

  pub fn get(&self, id: TargetId) -> &Target {
    &self.targets[id.0]
  }

  /// Targets in declaration order.
  pub fn iter(&self) -> impl Iterator<Item = &Target> {
    self.targets.iter()
  }
}
