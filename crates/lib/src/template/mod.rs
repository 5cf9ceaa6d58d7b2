//! Placeholder templates resolved against the context.
//!
//! Option values in a taskfile may embed tags that reference the context:
//!
//! ```text
//! "<%= dirs.lib.dest %>/<%= pkg.name %>.date.js"
//! ```
//!
//! Resolution happens when a task target is invoked, not when the taskfile is
//! loaded, so function values such as `today()` reflect the moment of the
//! invocation.
//!
//! # Rules
//!
//! - `<%= path %>` interpolates, `<%- path %>` interpolates and HTML-escapes.
//! - A value reached through a path is resolved itself before use, so a
//!   banner defined in terms of other values expands fully.
//! - A string that is exactly one `<%= path %>` tag resolves to the referenced
//!   value itself, keeping lists and mappings intact.
//! - A missing path is an error. It never renders as an empty string.
//!
//! # Example
//!
//! ```
//! use conveyor_lib::context::Context;
//! use conveyor_lib::template::process;
//! use serde_json::json;
//!
//! let context = Context::from_value(json!({ "dirs": { "lib": { "dest": "lib" } } })).unwrap();
//! let out = process("<%= dirs.lib.dest %>/foo.js", &Default::default(), &context.scope()).unwrap();
//! assert_eq!(out, "lib/foo.js");
//! ```

pub mod dateformat;
pub mod expr;
pub mod parse;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::trace;

pub use expr::{Expr, Path, PathSegment};
pub use parse::{DelimiterSet, Delimiters, Segment, TagKind};

/// Errors raised while parsing or resolving templates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
  #[error("unclosed tag at position {position}")]
  Unclosed { position: usize },

  #[error("unsupported tag at position {position}: '{tag}' (only '=' and '-' tags are allowed)")]
  Unsupported { position: usize, tag: String },

  #[error("malformed expression: {0}")]
  Malformed(String),

  #[error("reference error: '{path}' is not defined")]
  Reference { path: String },

  #[error("'{path}' refers to itself")]
  Cycle { path: String },

  #[error("'{path}' is a mapping and cannot be written into a string")]
  NotInterpolable { path: String },

  #[error("unknown function: {0}")]
  UnknownFunction(String),

  #[error("invalid argument to {function}: {message}")]
  InvalidArgument { function: String, message: String },

  #[error("unknown delimiters: {0}")]
  UnknownDelimiters(String),

  #[error("invalid delimiters: {0}")]
  InvalidDelimiters(String),
}

/// Source of values for template expressions.
pub trait Resolver {
  /// Look up a path. The returned value is raw and may contain tags itself.
  fn lookup(&self, path: &Path) -> Result<Value, TemplateError>;

  /// Call a named function with literal arguments.
  fn call(&self, name: &str, args: &[Value]) -> Result<Value, TemplateError>;
}

/// Render a string with the given delimiters.
///
/// Values looked up along the way are resolved with the default delimiters.
pub fn process(input: &str, delimiters: &Delimiters, resolver: &(impl Resolver + ?Sized)) -> Result<String, TemplateError> {
  Expander::new(resolver).render(input, delimiters)
}

/// Resolve every tag in a value tree with the default delimiters.
///
/// Mapping keys are processed too, since file mappings use templated
/// destinations as keys.
pub fn resolve_value(value: &Value, resolver: &(impl Resolver + ?Sized)) -> Result<Value, TemplateError> {
  Expander::new(resolver).value(value)
}

struct Expander<'r, R: Resolver + ?Sized> {
  resolver: &'r R,
  config: Delimiters,
  active: Vec<String>,
}

impl<'r, R: Resolver + ?Sized> Expander<'r, R> {
  fn new(resolver: &'r R) -> Self {
    Self {
      resolver,
      config: Delimiters::default(),
      active: Vec::new(),
    }
  }

  fn value(&mut self, value: &Value) -> Result<Value, TemplateError> {
    match value {
      Value::String(s) => self.string(s),
      Value::Array(items) => items.iter().map(|item| self.value(item)).collect::<Result<_, _>>().map(Value::Array),
      Value::Object(map) => {
        let mut out = Map::with_capacity(map.len());
        for (key, item) in map {
          let config = self.config.clone();
          let key = self.render(key, &config)?;
          out.insert(key, self.value(item)?);
        }
        Ok(Value::Object(out))
      }
      other => Ok(other.clone()),
    }
  }

  fn string(&mut self, input: &str) -> Result<Value, TemplateError> {
    if !parse::has_tags(input, &self.config) {
      return Ok(Value::String(input.to_string()));
    }

    let config = self.config.clone();
    let segments = parse::parse(input, &config)?;

    // A lone path tag keeps the referenced value's shape
    if let [Segment::Tag {
      kind: TagKind::Interpolate,
      expr: expr @ Expr::Path(_),
    }] = segments.as_slice()
    {
      return self.eval(expr);
    }

    self.render_segments(&segments).map(Value::String)
  }

  fn render(&mut self, input: &str, delimiters: &Delimiters) -> Result<String, TemplateError> {
    if !parse::has_tags(input, delimiters) {
      return Ok(input.to_string());
    }
    let segments = parse::parse(input, delimiters)?;
    self.render_segments(&segments)
  }

  fn render_segments(&mut self, segments: &[Segment]) -> Result<String, TemplateError> {
    let mut out = String::new();
    for segment in segments {
      match segment {
        Segment::Literal(text) => out.push_str(text),
        Segment::Tag { kind, expr } => {
          let value = self.eval(expr)?;
          let text = stringify(&value, expr)?;
          match kind {
            TagKind::Interpolate => out.push_str(&text),
            TagKind::Escape => out.push_str(&escape_html(&text)),
          }
        }
      }
    }
    Ok(out)
  }

  fn eval(&mut self, expr: &Expr) -> Result<Value, TemplateError> {
    match expr {
      Expr::Path(path) => {
        let key = path.to_string();
        if self.active.contains(&key) {
          return Err(TemplateError::Cycle { path: key });
        }
        let raw = self.resolver.lookup(path)?;
        self.active.push(key);
        let resolved = self.value(&raw);
        self.active.pop();
        trace!(path = %path, "resolved path");
        resolved
      }
      Expr::Call { name, args } => self.resolver.call(name, args),
    }
  }
}

fn stringify(value: &Value, expr: &Expr) -> Result<String, TemplateError> {
  match value {
    Value::String(s) => Ok(s.clone()),
    Value::Null => Ok(String::new()),
    Value::Bool(b) => Ok(b.to_string()),
    Value::Number(n) => Ok(n.to_string()),
    Value::Array(items) => {
      let parts = items.iter().map(|item| stringify(item, expr)).collect::<Result<Vec<_>, _>>()?;
      Ok(parts.join(","))
    }
    Value::Object(_) => Err(TemplateError::NotInterpolable {
      path: match expr {
        Expr::Path(path) => path.to_string(),
        Expr::Call { name, .. } => format!("{name}()"),
      },
    }),
  }
}

/// Escape the characters significant in HTML.
pub fn escape_html(input: &str) -> String {
  let mut out = String::with_capacity(input.len());
  for c in input.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      c => out.push(c),
    }
  }
  out
}
