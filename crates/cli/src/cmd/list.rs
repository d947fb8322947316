//! Implementation of `orca --list`.

use std::collections::BTreeMap;

use anyhow::Result;
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;

use orca_lib::config::ResolvedVar;
use orca_lib::{ConfigResolver, Manifest, Target};

use crate::output::{OutputFormat, print_json};

#[derive(Serialize)]
struct Listing<'a> {
  default: Option<&'a str>,
  targets: Vec<&'a Target>,
  variables: BTreeMap<&'a str, &'a ResolvedVar>,
}

pub fn cmd_list(manifest: &Manifest, overrides: &BTreeMap<String, String>, format: OutputFormat) -> Result<()> {
  let vars = ConfigResolver::from_process(overrides.clone()).resolve_all(&manifest.variables);
  let default = manifest.registry.default_target().ok().map(|t| t.name.as_str());

  if format.is_json() {
    return print_json(&Listing {
      default,
      targets: manifest.registry.iter().collect(),
      variables: vars.iter().collect(),
    });
  }

  let width = manifest.registry.iter().map(|t| t.name.len()).max().unwrap_or(0);

  println!("Targets:");
  for target in manifest.registry.iter() {
    let marker = if Some(target.name.as_str()) == default { "*" } else { " " };
    let deps = if target.deps.is_empty() {
      String::new()
    } else {
      format!(" [{}]", target.deps.join(", "))
    };

    println!(
      " {}{:<width$}  {}{}",
      marker,
      target.name,
      target.description.as_deref().unwrap_or(""),
      deps.if_supports_color(Stream::Stdout, |s| s.dimmed()),
      width = width
    );
  }

  println!();
  println!("Variables:");
  for (name, var) in vars.iter() {
    println!(
      "  {} = {} {}",
      name,
      var.value,
      format!("({})", var.source).if_supports_color(Stream::Stdout, |s| s.dimmed())
    );
  }

  Ok(())
}
