//! Error types for document conversion.

use std::fmt;

/// Boxed error returned by caller-supplied render hooks and the highlighter
/// callback.
pub type HookError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for conversion operations.
pub type ConvertResult<T> = Result<T, ConvertError>;

/// A resolved source position, rendered as `file:line:col`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Position {
  /// Name of the source file, usually the document filename.
  pub filename: String,
  /// 1-based line number.
  pub line:     usize,
  /// 1-based column number.
  pub column:   usize,
}

impl Position {
  #[must_use]
  pub fn new(filename: impl Into<String>, line: usize, column: usize) -> Self {
    Self {
      filename: filename.into(),
      line,
      column,
    }
  }
}

impl fmt::Display for Position {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.filename.is_empty() {
      write!(f, "{}:{}", self.line, self.column)
    } else {
      write!(f, "{}:{}:{}", self.filename, self.line, self.column)
    }
  }
}

/// Errors that abort conversion of a single document.
///
/// Failures never cross document boundaries: a `ConvertError` for one
/// document has no effect on any other conversion in flight.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
  /// Malformed `{...}` attribute syntax on a fenced code block.
  /// Fatal to the document; surfaced before rendering starts.
  #[error("{position}: malformed attribute list: {reason}")]
  AttributeParse { reason: String, position: Position },

  /// A code block whose language has neither an external render hook nor a
  /// configured highlighter. Fatal to the document.
  #[error(
    "{position}: no render hook or highlighter found for code block language \
     {language:?}"
  )]
  UnresolvedCodeBlock { language: String, position: Position },

  /// An externally supplied render hook returned an error. The error is
  /// wrapped with the originating node's source position and aborts the
  /// remainder of this document's render only.
  #[error("{position}: render hook failed: {source}")]
  Hook {
    #[source]
    source:   HookError,
    position: Position,
  },

  /// The highlighter callback failed for a code block.
  #[error("{position}: highlighting failed for language {language:?}: {source}")]
  Highlight {
    language: String,
    #[source]
    source:   HookError,
    position: Position,
  },

  /// A panic escaped the conversion pipeline, most likely from a render
  /// hook. Converted to an error so one document cannot take down a build.
  #[error("conversion of {document:?} panicked: {message}")]
  Internal { document: String, message: String },
}

/// Errors from the sandboxed external-command executor. Consumed by the
/// external-process converters that live outside this crate; defined here so
/// "binary missing" can be told apart from "binary failed".
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
  /// The binary could not be resolved at all.
  #[error("binary {0:?} not found in PATH")]
  NotFound(String),

  /// The binary exists but is not on the configured allow-list.
  #[error("binary {0:?} is not allow-listed for execution")]
  Denied(String),

  /// The process ran but exited with a non-zero status.
  #[error("{binary} exited with status {status}: {stderr}")]
  Failed {
    binary: String,
    status: i32,
    stderr: String,
  },
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn position_display_includes_filename_when_set() {
    let pos = Position::new("content/post.md", 12, 3);
    assert_eq!(pos.to_string(), "content/post.md:12:3");

    let anon = Position::new("", 1, 1);
    assert_eq!(anon.to_string(), "1:1");
  }

  #[test]
  fn unresolved_code_block_error_names_the_language() {
    let err = ConvertError::UnresolvedCodeBlock {
      language: "brainfuck".to_string(),
      position: Position::new("doc.md", 4, 1),
    };
    let msg = err.to_string();
    assert!(msg.contains("brainfuck"), "error should name the language: {msg}");
    assert!(msg.contains("doc.md:4:1"));
  }
}
