//! Dependency resolution.
//!
//! Computes the linear execution order for one or more requested targets with
//! a depth-first traversal: each target's dependencies are visited in declared
//! order and emitted before the target itself. Nodes carry an in-progress mark
//! while their dependencies are being visited and a done mark once emitted.
//! Reaching an in-progress node means the graph has a cycle.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::registry::{Registry, TargetId};

/// Errors from computing an execution plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
  #[error("unknown target: {name}")]
  UnknownTarget { name: String },

  #[error("unknown target '{name}' (required by '{required_by}')")]
  UnknownDependency { name: String, required_by: String },

  #[error("cyclic dependency: {}", .cycle.join(" -> "))]
  CyclicDependency {
    /// Target names along the cycle; the first name is repeated at the end.
    cycle: Vec<String>,
  },
}

/// An ordered, duplicate-free sequence of targets to run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExecutionPlan {
  targets: Vec<String>,
}

impl ExecutionPlan {
  pub fn targets(&self) -> &[String] {
    &self.targets
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
  InProgress,
  Done,
}

struct Planner<'a> {
  registry: &'a Registry,
  marks: HashMap<TargetId, Mark>,
  /// Targets currently being visited, outermost first.
  stack: Vec<TargetId>,
  order: Vec<String>,
}

impl<'a> Planner<'a> {
  fn new(registry: &'a Registry) -> Self {
    Self {
      registry,
      marks: HashMap::new(),
      stack: Vec::new(),
      order: Vec::new(),
    }
  }

  fn visit(&mut self, id: TargetId) -> Result<(), PlanError> {
    match self.marks.get(&id) {
      Some(Mark::Done) => return Ok(()),
      Some(Mark::InProgress) => return Err(self.cycle_error(id)),
      None => {}
    }

    self.marks.insert(id, Mark::InProgress);
    self.stack.push(id);

    let registry = self.registry;
    let target = registry.get(id);
    for dep in &target.deps {
      let dep_id = registry
        .id_of(dep)
        .map_err(|_| PlanError::UnknownDependency {
          name: dep.clone(),
          required_by: target.name.clone(),
        })?;
      self.visit(dep_id)?;
    }

    self.stack.pop();
    self.marks.insert(id, Mark::Done);
    self.order.push(target.name.clone());
    Ok(())
  }

  fn cycle_error(&self, id: TargetId) -> PlanError {
    let start = self.stack.iter().position(|&s| s == id).unwrap_or(0);
    let mut cycle: Vec<String> = self.stack[start..]
      .iter()
      .map(|&s| self.registry.get(s).name.clone())
      .collect();
    cycle.push(self.registry.get(id).name.clone());
    PlanError::CyclicDependency { cycle }
  }
}

/// Compute the execution plan for the requested targets.
///
/// Targets are expanded in the order given and share one set of marks, so a
/// target reachable from several requests (or requested twice) appears once.
///
/// # Errors
///
/// Fails without a partial plan if any requested target or transitive
/// dependency is unknown, or if a cycle is reachable from a requested target.
pub fn plan<S: AsRef<str>>(registry: &Registry, requested: &[S]) -> Result<ExecutionPlan, PlanError> {
  let mut planner = Planner::new(registry);

  for name in requested {
    let name = name.as_ref();
    let id = registry.id_of(name).map_err(|_| PlanError::UnknownTarget {
      name: name.to_string(),
    })?;
    planner.visit(id)?;
  }

  debug!(requested = requested.len(), planned = planner.order.len(), "computed execution plan");

  Ok(ExecutionPlan { targets: planner.order })
}
