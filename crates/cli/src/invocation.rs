//! Splitting positional arguments into targets and variable overrides.

use std::collections::BTreeMap;

use orca_lib::Registry;
use orca_lib::config::{ConfigError, parse_override};
use orca_lib::registry::RegistryError;

/// What the user asked for on the command line.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Invocation {
  /// Requested targets, in the order given.
  pub targets: Vec<String>,
  /// `NAME=VALUE` overrides; a later value for the same name wins.
  pub overrides: BTreeMap<String, String>,
}

impl Invocation {
  /// Arguments containing `=` are overrides, everything else is a target.
  pub fn parse<I, S>(args: I) -> Result<Self, ConfigError>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let mut invocation = Self::default();

    for arg in args {
      let arg = arg.as_ref();
      if arg.contains('=') {
        let (name, value) = parse_override(arg)?;
        invocation.overrides.insert(name, value);
      } else {
        invocation.targets.push(arg.to_string());
      }
    }

    Ok(invocation)
  }

  /// The targets to plan: the requested ones, or the default target.
  pub fn requested(&self, registry: &Registry) -> Result<Vec<String>, RegistryError> {
    if self.targets.is_empty() {
      return Ok(vec![registry.default_target()?.name.clone()]);
    }
    Ok(self.targets.clone())
  }
}
