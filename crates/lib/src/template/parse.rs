//! Splitting template strings into literal text and tags.

use std::collections::BTreeMap;

use super::TemplateError;
use super::expr::{Expr, parse_expr};
use crate::consts::CONFIG_DELIMITERS;

/// Open and close markers of a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiters {
  pub open: String,
  pub close: String,
}

impl Delimiters {
  pub fn new(open: impl Into<String>, close: impl Into<String>) -> Result<Self, TemplateError> {
    let open = open.into();
    let close = close.into();
    if open.is_empty() || close.is_empty() {
      return Err(TemplateError::InvalidDelimiters(format!(
        "delimiters must not be empty (open '{open}', close '{close}')"
      )));
    }
    Ok(Self { open, close })
  }
}

impl Default for Delimiters {
  fn default() -> Self {
    Self {
      open: "<%".to_string(),
      close: "%>".to_string(),
    }
  }
}

/// Named delimiter sets. Always contains the `config` set.
#[derive(Debug, Clone)]
pub struct DelimiterSet {
  sets: BTreeMap<String, Delimiters>,
}

impl Default for DelimiterSet {
  fn default() -> Self {
    let mut sets = BTreeMap::new();
    sets.insert(CONFIG_DELIMITERS.to_string(), Delimiters::default());
    Self { sets }
  }
}

impl DelimiterSet {
  /// Register (or replace) a named delimiter set.
  pub fn insert(&mut self, name: impl Into<String>, delimiters: Delimiters) {
    self.sets.insert(name.into(), delimiters);
  }

  pub fn get(&self, name: &str) -> Result<&Delimiters, TemplateError> {
    self
      .sets
      .get(name)
      .ok_or_else(|| TemplateError::UnknownDelimiters(name.to_string()))
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.sets.keys().map(String::as_str)
  }
}

/// How a tag's value is written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
  /// `<%= expr %>`
  Interpolate,
  /// `<%- expr %>`, HTML-escaped
  Escape,
}

/// A segment of parsed text.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
  Literal(String),
  Tag { kind: TagKind, expr: Expr },
}

/// Parse `input` into segments using the given delimiters.
///
/// Only interpolating tags are accepted. Evaluation blocks (`<% if ... %>`)
/// fail with [`TemplateError::Unsupported`].
pub fn parse(input: &str, delimiters: &Delimiters) -> Result<Vec<Segment>, TemplateError> {
  let mut segments = Vec::new();
  let mut literal = String::new();
  let mut pos = 0;

  while let Some(found) = input[pos..].find(&delimiters.open) {
    let start = pos + found;
    literal.push_str(&input[pos..start]);

    let body_start = start + delimiters.open.len();
    let kind = match input[body_start..].chars().next() {
      Some('=') => TagKind::Interpolate,
      Some('-') => TagKind::Escape,
      _ => {
        return Err(TemplateError::Unsupported {
          position: start,
          tag: snippet(&input[start..]),
        });
      }
    };
    let expr_start = body_start + 1;

    let close = input[expr_start..]
      .find(&delimiters.close)
      .ok_or(TemplateError::Unclosed { position: start })?;
    let expr_end = expr_start + close;

    if !literal.is_empty() {
      segments.push(Segment::Literal(std::mem::take(&mut literal)));
    }
    segments.push(Segment::Tag {
      kind,
      expr: parse_expr(&input[expr_start..expr_end])?,
    });

    pos = expr_end + delimiters.close.len();
  }

  literal.push_str(&input[pos..]);
  if !literal.is_empty() {
    segments.push(Segment::Literal(literal));
  }

  Ok(segments)
}

/// Cheap check for whether a string could contain a tag.
pub fn has_tags(input: &str, delimiters: &Delimiters) -> bool {
  input.contains(&delimiters.open)
}

fn snippet(s: &str) -> String {
  s.chars().take(24).collect()
}
