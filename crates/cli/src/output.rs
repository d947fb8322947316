//! CLI output formatting utilities.
//!
//! Status lines go to stderr so that stdout carries only the wrapped tools'
//! output, dry-run commands, or JSON.

use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const WARNING: &str = "⚠";
  pub const ARROW: &str = "→";
  pub const SKIP: &str = "-";
}

pub fn format_duration(duration: Duration) -> String {
  let secs = duration.as_secs();
  let millis = duration.subsec_millis();

  if secs >= 60 {
    let mins = secs / 60;
    let remaining_secs = secs % 60;
    format!("{}m {}s", mins, remaining_secs)
  } else if secs > 0 {
    format!("{}.{:02}s", secs, millis / 10)
  } else {
    format!("{}ms", millis)
  }
}

pub fn print_step(target: &str, command: Option<&str>) {
  match command {
    Some(command) => eprintln!(
      "{} {} {}",
      symbols::ARROW.if_supports_color(Stream::Stderr, |s| s.cyan()),
      target.if_supports_color(Stream::Stderr, |s| s.bold()),
      command.if_supports_color(Stream::Stderr, |s| s.dimmed())
    ),
    None => eprintln!(
      "{} {}",
      symbols::ARROW.if_supports_color(Stream::Stderr, |s| s.cyan()),
      target.if_supports_color(Stream::Stderr, |s| s.bold())
    ),
  }
}

pub fn print_skipped(target: &str) {
  eprintln!(
    "{} {}",
    symbols::SKIP.if_supports_color(Stream::Stderr, |s| s.dimmed()),
    format!("{target} (skipped)").if_supports_color(Stream::Stderr, |s| s.dimmed())
  );
}

pub fn print_success(message: &str) {
  eprintln!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stderr, |s| s.green()),
    message
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_warning(message: &str) {
  eprintln!(
    "{} {}",
    symbols::WARNING.if_supports_color(Stream::Stderr, |s| s.yellow()),
    message.if_supports_color(Stream::Stderr, |s| s.yellow())
  );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}
