//! Variable resolution.
//!
//! A variable's value comes from, in order of precedence:
//! 1. an invocation-time override (`NAME=value` on the command line)
//! 2. the process environment (`NAME`)
//! 3. its declared default
//!
//! The environment is captured once when the resolver is built, so resolution
//! is a pure function of (overrides, environment) for the rest of the run.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::placeholder::{PlaceholderError, Resolver, is_valid_name};

/// A declared configuration variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarDecl {
  pub name: String,
  pub default: String,
}

impl VarDecl {
  pub fn new(name: impl Into<String>, default: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      default: default.into(),
    }
  }
}

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VarSource {
  Override,
  Environment,
  Default,
}

impl std::fmt::Display for VarSource {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let s = match self {
      VarSource::Override => "override",
      VarSource::Environment => "environment",
      VarSource::Default => "default",
    };
    f.write_str(s)
  }
}

/// A variable's value for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedVar {
  pub value: String,
  pub source: VarSource,
}

/// Errors from parsing invocation overrides.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
  #[error("invalid override '{0}': expected NAME=VALUE")]
  InvalidOverride(String),

  #[error("invalid variable name '{0}'")]
  InvalidName(String),
}

/// Parse a `NAME=VALUE` invocation argument.
///
/// The value may be empty or contain further `=` characters.
pub fn parse_override(arg: &str) -> Result<(String, String), ConfigError> {
  let (name, value) = arg
    .split_once('=')
    .ok_or_else(|| ConfigError::InvalidOverride(arg.to_string()))?;

  if !is_valid_name(name) {
    return Err(ConfigError::InvalidName(name.to_string()));
  }

  Ok((name.to_string(), value.to_string()))
}

/// Resolves variables against invocation overrides and an environment snapshot.
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
  overrides: BTreeMap<String, String>,
  env: BTreeMap<String, String>,
}

impl ConfigResolver {
  /// Create a resolver over an explicit environment.
  pub fn new(overrides: BTreeMap<String, String>, env: BTreeMap<String, String>) -> Self {
    Self { overrides, env }
  }

  /// Create a resolver over a snapshot of the current process environment.
  ///
  /// Variables whose value is not valid unicode are skipped.
  pub fn from_process(overrides: BTreeMap<String, String>) -> Self {
    let env = std::env::vars_os()
      .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
      .collect();
    Self::new(overrides, env)
  }

  /// Resolve a single variable.
  pub fn resolve(&self, name: &str, default: &str) -> String {
    self.resolve_with_source(name, default).value
  }

  fn resolve_with_source(&self, name: &str, default: &str) -> ResolvedVar {
    if let Some(value) = self.overrides.get(name) {
      return ResolvedVar {
        value: value.clone(),
        source: VarSource::Override,
      };
    }

    if let Some(value) = self.env.get(name) {
      return ResolvedVar {
        value: value.clone(),
        source: VarSource::Environment,
      };
    }

    ResolvedVar {
      value: default.to_string(),
      source: VarSource::Default,
    }
  }

  /// Resolve every declared variable.
  ///
  /// Overrides for names that are not declared are ignored.
  pub fn resolve_all(&self, decls: &[VarDecl]) -> ResolvedVars {
    for name in self.overrides.keys() {
      if !decls.iter().any(|d| &d.name == name) {
        warn!(var = %name, "ignoring override for undeclared variable");
      }
    }

    let values = decls
      .iter()
      .map(|decl| {
        let resolved = self.resolve_with_source(&decl.name, &decl.default);
        debug!(var = %decl.name, value = %resolved.value, source = %resolved.source, "resolved variable");
        (decl.name.clone(), resolved)
      })
      .collect();

    ResolvedVars { values }
  }
}

/// The immutable set of variable values for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResolvedVars {
  values: BTreeMap<String, ResolvedVar>,
}

impl ResolvedVars {
  pub fn get(&self, name: &str) -> Option<&str> {
    self.values.get(name).map(|v| v.value.as_str())
  }

  pub fn source(&self, name: &str) -> Option<VarSource> {
    self.values.get(name).map(|v| v.source)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &ResolvedVar)> {
    self.values.iter().map(|(k, v)| (k.as_str(), v))
  }
}

impl Resolver for ResolvedVars {
  fn resolve_var(&self, name: &str) -> Result<&str, PlaceholderError> {
    self.get(name).ok_or_else(|| PlaceholderError::Undefined(name.to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
  }

  #[test]
  fn override_beats_environment_beats_default() {
    let resolver = ConfigResolver::new(
      map(&[("CARGO", "from-arg")]),
      map(&[("CARGO", "from-env"), ("PKG", "env-pkg")]),
    );

    assert_eq!(resolver.resolve("CARGO", "cargo"), "from-arg");
    assert_eq!(resolver.resolve("PKG", "kilo"), "env-pkg");
    assert_eq!(resolver.resolve("OTHER", "fallback"), "fallback");
  }

  #[test]
  fn precedence_is_per_variable() {
    let decls = vec![VarDecl::new("CARGO", "cargo"), VarDecl::new("PKG", "kilo")];
    let resolver = ConfigResolver::new(map(&[("PKG", "arg-pkg")]), map(&[("CARGO", "/usr/bin/cargo")]));

    let vars = resolver.resolve_all(&decls);

    assert_eq!(vars.get("CARGO"), Some("/usr/bin/cargo"));
    assert_eq!(vars.source("CARGO"), Some(VarSource::Environment));
    assert_eq!(vars.get("PKG"), Some("arg-pkg"));
    assert_eq!(vars.source("PKG"), Some(VarSource::Override));
  }

  #[test]
  fn empty_override_still_wins() {
    let resolver = ConfigResolver::new(map(&[("PKG", "")]), map(&[("PKG", "env-pkg")]));
    assert_eq!(resolver.resolve("PKG", "kilo"), "");
  }

  #[test]
  fn resolution_is_repeatable() {
    let resolver = ConfigResolver::new(map(&[]), map(&[("CARGO", "x")]));
    let first = resolver.resolve("CARGO", "cargo");
    let second = resolver.resolve("CARGO", "cargo");
    assert_eq!(first, second);
  }

  #[test]
  fn undeclared_overrides_are_ignored() {
    let decls = vec![VarDecl::new("CARGO", "cargo")];
    let resolver = ConfigResolver::new(map(&[("NOPE", "1")]), map(&[]));

    let vars = resolver.resolve_all(&decls);
    assert_eq!(vars.iter().count(), 1);
    assert_eq!(vars.get("NOPE"), None);
  }

  #[test]
  fn resolved_vars_implement_resolver() {
    let decls = vec![VarDecl::new("PKG", "kilo")];
    let vars = ConfigResolver::default().resolve_all(&decls);

    assert_eq!(vars.resolve_var("PKG"), Ok("kilo"));
    assert_eq!(
      vars.resolve_var("CARGO"),
      Err(PlaceholderError::Undefined("CARGO".to_string()))
    );
  }

  #[test]
  #[serial]
  fn from_process_snapshots_environment() {
    temp_env::with_vars([("ORCA_TEST_TOOL", Some("/opt/tool"))], || {
      let resolver = ConfigResolver::from_process(BTreeMap::new());
      assert_eq!(resolver.resolve("ORCA_TEST_TOOL", "tool"), "/opt/tool");
    });
  }

  #[test]
  #[serial]
  fn from_process_ignores_later_environment_changes() {
    temp_env::with_vars([("ORCA_TEST_TOOL", None::<&str>)], || {
      let resolver = ConfigResolver::from_process(BTreeMap::new());

      temp_env::with_var("ORCA_TEST_TOOL", Some("late"), || {
        assert_eq!(resolver.resolve("ORCA_TEST_TOOL", "tool"), "tool");
      });
    });
  }

  #[test]
  fn parse_override_splits_on_first_equals() {
    assert_eq!(
      parse_override("CARGO=cargo +nightly").unwrap(),
      ("CARGO".to_string(), "cargo +nightly".to_string())
    );
    assert_eq!(
      parse_override("FLAGS=a=b").unwrap(),
      ("FLAGS".to_string(), "a=b".to_string())
    );
    assert_eq!(parse_override("PKG=").unwrap(), ("PKG".to_string(), String::new()));
  }

  #[test]
  fn parse_override_rejects_bad_input() {
    assert_eq!(
      parse_override("CARGO"),
      Err(ConfigError::InvalidOverride("CARGO".to_string()))
    );
    assert_eq!(parse_override("=x"), Err(ConfigError::InvalidName(String::new())));
    assert_eq!(
      parse_override("MY-VAR=x"),
      Err(ConfigError::InvalidName("MY-VAR".to_string()))
    );
  }
}
