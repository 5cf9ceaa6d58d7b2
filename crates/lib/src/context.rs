//! The context placeholders resolve against.
//!
//! A [`Context`] owns the data tree loaded from the taskfile and the package
//! manifest, plus the functions callable from templates. It is built once at
//! startup and only read afterwards. Each step invocation resolves through a
//! [`Scope`], which pins the clock and overlays `task.current`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Local};
use serde_json::{Map, Value, json};

use crate::template::{Path, PathSegment, Resolver, TemplateError, dateformat};

/// Environment handed to template functions.
#[derive(Debug, Clone)]
pub struct FnEnv {
  /// Timestamp of the invocation being resolved.
  pub now: DateTime<Local>,
}

/// A function callable from a template tag.
pub type TemplateFn = Arc<dyn Fn(&FnEnv, &[Value]) -> Result<Value, TemplateError> + Send + Sync>;

/// Data tree and template functions.
#[derive(Clone)]
pub struct Context {
  data: Value,
  functions: BTreeMap<String, TemplateFn>,
}

impl fmt::Debug for Context {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Context")
      .field("data", &self.data)
      .field("functions", &self.functions.keys().collect::<Vec<_>>())
      .finish()
  }
}

impl Default for Context {
  fn default() -> Self {
    Self::new(Map::new())
  }
}

impl Context {
  /// Create a context over `data` with the built-in functions registered.
  pub fn new(data: Map<String, Value>) -> Self {
    let mut context = Self {
      data: Value::Object(data),
      functions: BTreeMap::new(),
    };
    context.register_builtins();
    context
  }

  /// Create a context from a value, which must be an object.
  pub fn from_value(data: Value) -> Result<Self, TemplateError> {
    match data {
      Value::Object(map) => Ok(Self::new(map)),
      other => Err(TemplateError::Malformed(format!(
        "context must be a mapping, found {}",
        value_kind(&other)
      ))),
    }
  }

  pub fn data(&self) -> &Value {
    &self.data
  }

  /// Top-level entry by key.
  pub fn section(&self, key: &str) -> Option<&Value> {
    self.data.get(key)
  }

  /// Raw (unresolved) value at a dotted path.
  pub fn get(&self, path: &str) -> Option<&Value> {
    Path::parse(path).ok()?.lookup(&self.data)
  }

  /// Set a top-level entry. Meant for load time only.
  pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
    match &mut self.data {
      Value::Object(map) => map.insert(key.into(), value),
      _ => unreachable!("context data is always an object"),
    }
  }

  /// Register a template function, replacing any function of the same name.
  pub fn register_function<F>(&mut self, name: impl Into<String>, function: F)
  where
    F: Fn(&FnEnv, &[Value]) -> Result<Value, TemplateError> + Send + Sync + 'static,
  {
    self.functions.insert(name.into(), Arc::new(function));
  }

  pub fn function_names(&self) -> impl Iterator<Item = &str> {
    self.functions.keys().map(String::as_str)
  }

  /// A resolution scope pinned to the current time.
  pub fn scope(&self) -> Scope<'_> {
    self.scope_at(Local::now())
  }

  /// A resolution scope pinned to `now`.
  pub fn scope_at(&self, now: DateTime<Local>) -> Scope<'_> {
    Scope {
      context: self,
      current: None,
      env: FnEnv { now },
    }
  }

  fn register_builtins(&mut self) {
    let today = |env: &FnEnv, args: &[Value]| -> Result<Value, TemplateError> {
      let mask = match args {
        [] => "yyyy-mm-dd",
        [Value::String(mask)] => mask.as_str(),
        _ => {
          return Err(TemplateError::InvalidArgument {
            function: "today".to_string(),
            message: "expected a single format string".to_string(),
          });
        }
      };
      Ok(Value::String(dateformat::format(&env.now, mask)))
    };
    self.register_function("today", today);
    self.register_function("grunt.template.today", today);

    self.register_function("env", |_env: &FnEnv, args: &[Value]| match args {
      [Value::String(name)] => std::env::var(name)
        .map(Value::String)
        .map_err(|_| TemplateError::Reference { path: format!("env.{name}") }),
      _ => Err(TemplateError::InvalidArgument {
        function: "env".to_string(),
        message: "expected a variable name".to_string(),
      }),
    });
  }
}

/// Identity of the step being resolved, exposed as `task.current`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentTask {
  pub name: String,
  pub target: Option<String>,
  pub args: Vec<String>,
  pub files_src: Vec<String>,
}

impl CurrentTask {
  /// `name:target:args` as typed on the command line.
  pub fn name_args(&self) -> String {
    let mut parts = vec![self.name.as_str()];
    parts.extend(self.target.as_deref());
    parts.extend(self.args.iter().map(String::as_str));
    parts.join(":")
  }

  fn to_value(&self) -> Value {
    json!({
      "name": self.name,
      "target": self.target,
      "nameArgs": self.name_args(),
      "args": self.args,
      "filesSrc": self.files_src,
    })
  }
}

/// Per-invocation view of a [`Context`].
#[derive(Clone)]
pub struct Scope<'a> {
  context: &'a Context,
  current: Option<Value>,
  env: FnEnv,
}

impl<'a> Scope<'a> {
  /// Expose `task.current` for the given step.
  pub fn with_current(mut self, current: &CurrentTask) -> Self {
    self.current = Some(current.to_value());
    self
  }

  pub fn now(&self) -> DateTime<Local> {
    self.env.now
  }

  pub fn context(&self) -> &'a Context {
    self.context
  }

  fn lookup_current(&self, path: &Path) -> Option<Value> {
    let current = self.current.as_ref()?;
    let segments = match path.segments() {
      [PathSegment::Key(grunt), rest @ ..] if grunt == "grunt" => rest,
      all => all,
    };
    match segments {
      [PathSegment::Key(task), PathSegment::Key(cur), rest @ ..] if task == "task" && cur == "current" => {
        Path(rest.to_vec()).lookup(current).cloned()
      }
      _ => None,
    }
  }
}

impl Resolver for Scope<'_> {
  fn lookup(&self, path: &Path) -> Result<Value, TemplateError> {
    if let Some(value) = self.lookup_current(path) {
      return Ok(value);
    }
    path
      .lookup(&self.context.data)
      .cloned()
      .ok_or_else(|| TemplateError::Reference { path: path.to_string() })
  }

  fn call(&self, name: &str, args: &[Value]) -> Result<Value, TemplateError> {
    let function = self
      .context
      .functions
      .get(name)
      .ok_or_else(|| TemplateError::UnknownFunction(name.to_string()))?;
    function(&self.env, args)
  }
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Array(_) => "a list",
    Value::Object(_) => "a mapping",
  }
}
