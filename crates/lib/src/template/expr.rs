//! Expressions allowed inside a template tag.
//!
//! Two forms are supported:
//!
//! - a path into the context: `dirs.lib.dest`, `pkg.licenses[0].type`, `pkg["title"]`
//! - a function call with literal arguments: `today("yyyy-mm-dd")`
//!
//! Anything else is rejected as malformed instead of being evaluated.

use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

use serde_json::Value;

use super::TemplateError;

/// One step of a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
  Key(String),
  Index(usize),
}

/// A dotted path into the context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path(pub Vec<PathSegment>);

impl Path {
  /// Parse a path expression such as `dirs.lib.dest` or `licenses[0].type`.
  pub fn parse(input: &str) -> Result<Self, TemplateError> {
    match parse_expr(input)? {
      Expr::Path(path) => Ok(path),
      Expr::Call { .. } => Err(TemplateError::Malformed(format!("expected a path, found a call: '{input}'"))),
    }
  }

  pub fn segments(&self) -> &[PathSegment] {
    &self.0
  }

  /// First key of the path, if it starts with one.
  pub fn root(&self) -> Option<&str> {
    match self.0.first() {
      Some(PathSegment::Key(key)) => Some(key),
      _ => None,
    }
  }

  /// Walk `root` along this path.
  ///
  /// Returns `None` as soon as a segment is missing, an index is out of
  /// bounds, or a segment is applied to a scalar.
  pub fn lookup<'a>(&self, root: &'a Value) -> Option<&'a Value> {
    let mut current = root;
    for segment in &self.0 {
      current = match (segment, current) {
        (PathSegment::Key(key), Value::Object(map)) => map.get(key)?,
        (PathSegment::Index(index), Value::Array(items)) => items.get(*index)?,
        // `list.0` reads like an index in JS configs
        (PathSegment::Key(key), Value::Array(items)) => items.get(key.parse::<usize>().ok()?)?,
        _ => return None,
      };
    }
    Some(current)
  }
}

impl fmt::Display for Path {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, segment) in self.0.iter().enumerate() {
      match segment {
        PathSegment::Key(key) if i == 0 => write!(f, "{key}")?,
        PathSegment::Key(key) if is_identifier(key) => write!(f, ".{key}")?,
        PathSegment::Key(key) => write!(f, "[{key:?}]")?,
        PathSegment::Index(index) => write!(f, "[{index}]")?,
      }
    }
    Ok(())
  }
}

/// A parsed tag expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
  Path(Path),
  Call { name: String, args: Vec<Value> },
}

fn is_ident_char(c: char) -> bool {
  c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

fn is_identifier(s: &str) -> bool {
  !s.is_empty() && s.chars().all(is_ident_char) && !s.starts_with(|c: char| c.is_ascii_digit())
}

struct Cursor<'a> {
  input: &'a str,
  chars: Peekable<CharIndices<'a>>,
}

impl<'a> Cursor<'a> {
  fn new(input: &'a str) -> Self {
    Self {
      input,
      chars: input.char_indices().peekable(),
    }
  }

  fn peek(&mut self) -> Option<char> {
    self.chars.peek().map(|(_, c)| *c)
  }

  fn bump(&mut self) -> Option<char> {
    self.chars.next().map(|(_, c)| c)
  }

  fn skip_ws(&mut self) {
    while self.peek().is_some_and(char::is_whitespace) {
      self.bump();
    }
  }

  fn expect(&mut self, expected: char) -> Result<(), TemplateError> {
    match self.bump() {
      Some(c) if c == expected => Ok(()),
      Some(c) => Err(self.malformed(&format!("expected '{expected}', found '{c}'"))),
      None => Err(self.malformed(&format!("expected '{expected}', found end of expression"))),
    }
  }

  fn malformed(&self, message: &str) -> TemplateError {
    TemplateError::Malformed(format!("{message} in '{}'", self.input))
  }

  fn ident(&mut self) -> Result<String, TemplateError> {
    let mut ident = String::new();
    while let Some(c) = self.peek() {
      if !is_ident_char(c) {
        break;
      }
      ident.push(c);
      self.bump();
    }
    if ident.is_empty() {
      return Err(self.malformed("expected an identifier"));
    }
    Ok(ident)
  }

  fn string_literal(&mut self) -> Result<String, TemplateError> {
    let quote = match self.bump() {
      Some(q @ ('"' | '\'')) => q,
      _ => return Err(self.malformed("expected a quoted string")),
    };
    let mut out = String::new();
    loop {
      match self.bump() {
        Some('\\') => match self.bump() {
          Some('n') => out.push('\n'),
          Some('t') => out.push('\t'),
          Some(c) => out.push(c),
          None => return Err(self.malformed("unterminated string")),
        },
        Some(c) if c == quote => return Ok(out),
        Some(c) => out.push(c),
        None => return Err(self.malformed("unterminated string")),
      }
    }
  }

  fn integer(&mut self) -> Result<i64, TemplateError> {
    let mut digits = String::new();
    if self.peek() == Some('-') {
      digits.push('-');
      self.bump();
    }
    while let Some(c) = self.peek().filter(char::is_ascii_digit) {
      digits.push(c);
      self.bump();
    }
    digits
      .parse()
      .map_err(|_| self.malformed(&format!("invalid number '{digits}'")))
  }

  fn argument(&mut self) -> Result<Value, TemplateError> {
    match self.peek() {
      Some('"' | '\'') => Ok(Value::String(self.string_literal()?)),
      Some(c) if c == '-' || c.is_ascii_digit() => Ok(Value::from(self.integer()?)),
      _ => Err(self.malformed("function arguments must be string or integer literals")),
    }
  }
}

/// Parse the trimmed contents of a tag.
pub fn parse_expr(input: &str) -> Result<Expr, TemplateError> {
  let input = input.trim();
  if input.is_empty() {
    return Err(TemplateError::Malformed("empty expression".to_string()));
  }

  let mut cursor = Cursor::new(input);
  let mut segments = vec![PathSegment::Key(cursor.ident()?)];

  loop {
    cursor.skip_ws();
    match cursor.peek() {
      None => return Ok(Expr::Path(Path(segments))),
      Some('.') => {
        cursor.bump();
        segments.push(PathSegment::Key(cursor.ident()?));
      }
      Some('[') => {
        cursor.bump();
        cursor.skip_ws();
        let segment = match cursor.peek() {
          Some('"' | '\'') => PathSegment::Key(cursor.string_literal()?),
          _ => {
            let index = cursor.integer()?;
            let index = usize::try_from(index).map_err(|_| cursor.malformed("negative index"))?;
            PathSegment::Index(index)
          }
        };
        cursor.skip_ws();
        cursor.expect(']')?;
        segments.push(segment);
      }
      Some('(') => {
        cursor.bump();
        let name = call_name(&segments).ok_or_else(|| cursor.malformed("only dotted names can be called"))?;
        let args = parse_args(&mut cursor)?;
        cursor.skip_ws();
        if cursor.peek().is_some() {
          return Err(cursor.malformed("unexpected input after call"));
        }
        return Ok(Expr::Call { name, args });
      }
      Some(c) => return Err(cursor.malformed(&format!("unexpected character '{c}'"))),
    }
  }
}

fn call_name(segments: &[PathSegment]) -> Option<String> {
  let mut parts = Vec::with_capacity(segments.len());
  for segment in segments {
    match segment {
      PathSegment::Key(key) if is_identifier(key) => parts.push(key.as_str()),
      _ => return None,
    }
  }
  Some(parts.join("."))
}

fn parse_args(cursor: &mut Cursor<'_>) -> Result<Vec<Value>, TemplateError> {
  let mut args = Vec::new();
  cursor.skip_ws();
  if cursor.peek() == Some(')') {
    cursor.bump();
    return Ok(args);
  }
  loop {
    cursor.skip_ws();
    args.push(cursor.argument()?);
    cursor.skip_ws();
    match cursor.bump() {
      Some(',') => continue,
      Some(')') => return Ok(args),
      _ => return Err(cursor.malformed("expected ',' or ')'")),
    }
  }
}
