//! orca-lib: task-graph orchestration
//!
//! This crate provides the pieces behind the `orca` command:
//! - `Registry`: the static set of named targets and the default target
//! - `plan`: dependency ordering of requested targets
//! - `ConfigResolver`: variable values from overrides, environment and defaults
//! - `execute`: fail-fast sequential execution of a plan
//! - `Manifest`: the built-in declaration of variables and targets

pub mod config;
pub mod error;
pub mod execute;
pub mod manifest;
pub mod placeholder;
pub mod plan;
pub mod registry;

pub use config::{ConfigResolver, ResolvedVars, VarDecl};
pub use error::{Error, Result};
pub use execute::{ExecuteConfig, ExecuteError, ExecutionResult};
pub use manifest::Manifest;
pub use plan::{ExecutionPlan, PlanError, plan};
pub use registry::{Registry, RegistryError, Target, TargetKind};
