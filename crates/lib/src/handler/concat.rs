//! `concat`: join sources into one file with an optional banner and footer.

use std::fs;

use tracing::info;

use super::{Handler, HandlerError, Invocation, StepOutput, ensure_parent};

/// Joins each mapping's sources, in order, with `separator` (default `"\n"`),
/// then wraps the result in `banner` and `footer`. Both are already resolved
/// against the context when the handler runs.
pub struct ConcatHandler;

impl Handler for ConcatHandler {
  fn run(&self, invocation: &Invocation<'_>) -> Result<StepOutput, HandlerError> {
    invocation.require_sources()?;
    let separator = invocation.option_str("separator")?.unwrap_or("\n");
    let banner = invocation.option_str("banner")?.unwrap_or_default();
    let footer = invocation.option_str("footer")?.unwrap_or_default();

    let mut output = StepOutput::default();

    for mapping in invocation.files {
      let Some(dest) = &mapping.dest else {
        return Err(HandlerError::option("dest", "concat needs a destination for every mapping"));
      };

      let mut parts = Vec::with_capacity(mapping.src.len());
      for src in &mapping.src {
        let path = invocation.path(src);
        if path.is_dir() {
          continue;
        }
        parts.push(fs::read_to_string(&path).map_err(|e| HandlerError::io("failed to read", &path, e))?);
      }

      let mut content = String::from(banner);
      content.push_str(&parts.join(separator));
      content.push_str(footer);

      let to = invocation.path(dest);
      ensure_parent(&to)?;
      fs::write(&to, content).map_err(|e| HandlerError::io("failed to write", &to, e))?;
      info!(dest = %dest.display(), sources = parts.len(), "concatenated");
      output.written.push(dest.clone());
    }

    Ok(output)
  }
}
