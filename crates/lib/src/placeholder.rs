//! Placeholder parsing and substitution for variable references in actions.
//!
//! Target actions are command templates. Variable values are not known until
//! the run's configuration is resolved, so actions carry placeholders that are
//! substituted just before execution.
//!
//! # Placeholder Format
//!
//! - `$${NAME}` - value of the variable `NAME`
//!
//! Names are made of ASCII alphanumerics and `_`.
//!
//! # Shell Variables
//!
//! Single `$` characters pass through unchanged, so shell variables like
//! `$HOME` and `$PATH` work naturally without any escaping.
//!
//! # Escaping
//!
//! Use `$$$` before `{` to produce a literal `$${` sequence.
//!
//! # Example
//!
//! ```
//! use orca_lib::placeholder::{parse, Segment};
//!
//! let segments = parse("$${CARGO} clean -p $PKG").unwrap();
//! assert_eq!(segments, vec![
//!     Segment::Variable("CARGO".to_string()),
//!     Segment::Literal(" clean -p $PKG".to_string()),
//! ]);
//! ```

use thiserror::Error;

/// A segment of parsed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
  /// Literal text (no placeholders)
  Literal(String),

  /// A variable reference to be resolved
  Variable(String),
}

/// Errors that can occur during placeholder parsing or resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaceholderError {
  #[error("unclosed placeholder at position {0}")]
  Unclosed(usize),

  #[error("malformed placeholder: {0}")]
  Malformed(String),

  #[error("undefined variable: {0}")]
  Undefined(String),
}

/// Trait for resolving variable values during substitution.
pub trait Resolver {
  /// Resolve a variable by name.
  fn resolve_var(&self, name: &str) -> Result<&str, PlaceholderError>;
}

/// Returns true if `name` is a valid variable name.
pub fn is_valid_name(name: &str) -> bool {
  !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parse a string containing placeholders into segments.
///
/// # Errors
///
/// Returns an error if a placeholder is unclosed or its name is not valid.
pub fn parse(input: &str) -> Result<Vec<Segment>, PlaceholderError> {
  let mut segments = Vec::new();
  let mut literal = String::new();
  let mut chars = input.char_indices().peekable();

  while let Some((pos, ch)) = chars.next() {
    if ch != '$' {
      literal.push(ch);
      continue;
    }

    match chars.peek() {
      Some((_, '$')) => {
        chars.next(); // consume the second $

        match chars.peek() {
          Some((_, '$')) => {
            chars.next(); // consume the third $

            if let Some((_, '{')) = chars.peek() {
              // Escaped: $$${ -> $${ (literal)
              literal.push_str("$${");
              chars.next();
            } else {
              literal.push_str("$$$");
            }
          }
          Some((_, '{')) => {
            chars.next(); // consume the {

            if !literal.is_empty() {
              segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }

            let mut name = String::new();
            let mut found_close = false;

            for (_, c) in chars.by_ref() {
              if c == '}' {
                found_close = true;
                break;
              }
              name.push(c);
            }

            if !found_close {
              return Err(PlaceholderError::Unclosed(pos));
            }

            if !is_valid_name(&name) {
              return Err(PlaceholderError::Malformed(format!("invalid variable name '{name}'")));
            }

            segments.push(Segment::Variable(name));
          }
          _ => literal.push_str("$$"),
        }
      }
      // A lone $ is literal, so shell variables pass through
      _ => literal.push('$'),
    }
  }

  if !literal.is_empty() {
    segments.push(Segment::Literal(literal));
  }

  Ok(segments)
}

/// Substitute all placeholders in a string using the provided resolver.
///
/// # Errors
///
/// Returns an error if parsing fails or if any variable cannot be resolved.
pub fn substitute(input: &str, resolver: &impl Resolver) -> Result<String, PlaceholderError> {
  let segments = parse(input)?;
  substitute_segments(&segments, resolver)
}

/// Substitute placeholders in pre-parsed segments.
pub fn substitute_segments(segments: &[Segment], resolver: &impl Resolver) -> Result<String, PlaceholderError> {
  let mut result = String::new();

  for segment in segments {
    match segment {
      Segment::Literal(s) => result.push_str(s),
      Segment::Variable(name) => result.push_str(resolver.resolve_var(name)?),
    }
  }

  Ok(result)
}

/// Names of all variables referenced by `input`, in order of appearance.
pub fn referenced_vars(input: &str) -> Result<Vec<String>, PlaceholderError> {
  Ok(
    parse(input)?
      .into_iter()
      .filter_map(|segment| match segment {
        Segment::Variable(name) => Some(name),
        Segment::Literal(_) => None,
      })
      .collect(),
  )
}
