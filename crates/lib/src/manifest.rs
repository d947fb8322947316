//! The built-in task manifest.
//!
//! The declarative list of targets and variables this tool ships with: thin
//! wrappers around the cargo toolchain for one package.

use crate::config::VarDecl;
use crate::registry::{Registry, RegistryError, Target};

/// Variable holding the path of the cargo executable.
pub const CARGO_VAR: &str = "CARGO";

/// Variable holding the package passed to package-scoped commands.
pub const PKG_VAR: &str = "PKG";

pub const DEFAULT_TARGET: &str = "all";

/// Variables and targets declared together.
#[derive(Debug, Clone)]
pub struct Manifest {
  pub variables: Vec<VarDecl>,
  pub registry: Registry,
}

impl Manifest {
  /// The built-in manifest.
  pub fn builtin() -> Result<Self, RegistryError> {
    let variables = vec![VarDecl::new(CARGO_VAR, "cargo"), VarDecl::new(PKG_VAR, "kilo")];

    let mut registry = Registry::new();
    registry.register(
      Target::phony("all")
        .deps(["fmt", "clippy"])
        .description("Format, then lint from a clean package"),
    )?;
    registry.register(Target::phony("run").description("Placeholder; runs nothing"))?;
    registry.register(
      Target::phony("fmt")
        .action("$${CARGO} fmt")
        .description("Format sources"),
    )?;
    registry.register(
      Target::phony("clippy")
        .deps(["clean"])
        .action("$${CARGO} clippy")
        .description("Lint with clippy"),
    )?;
    registry.register(
      Target::phony("clean")
        .action("$${CARGO} clean -p $${PKG}")
        .description("Remove the package's build artifacts"),
    )?;
    registry.set_default(DEFAULT_TARGET)?;

    Ok(Self { variables, registry })
  }
}
