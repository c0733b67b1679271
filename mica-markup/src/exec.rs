//! Sandboxed external-command contract.
//!
//! Alternate external-process converters live outside this crate, but they
//! share one execution policy, expressed by this interface:
//!
//! - the binary is resolved through `PATH` only, never through the current
//!   directory, so a checked-out repository cannot shadow a system tool
//! - the resolved binary must be on the embedder's allow-list
//! - the child environment is filtered down to an explicit set instead of
//!   inheriting the parent's
//! - "binary missing" and "binary exited non-zero" are distinct errors
//!   ([`ExecError::NotFound`] vs [`ExecError::Failed`]), because the former
//!   degrades to leaving the source unrendered with a logged warning while
//!   the latter is a document error
//!
//! This crate ships no implementation; the embedder supplies one through
//! [`crate::converter::ProviderConfig`].

use crate::error::ExecError;

/// One external-command invocation.
#[derive(Debug, Clone, Default)]
pub struct Command {
  /// Binary name, resolved by the executor per the policy above.
  pub binary: String,
  pub args:   Vec<String>,

  /// Complete child environment. Unlisted variables are not inherited.
  pub env: Vec<(String, String)>,

  /// Fed to the child's stdin.
  pub stdin: String,
}

/// Captured output of a successful invocation.
#[derive(Debug, Clone, Default)]
pub struct Output {
  pub stdout: String,
  pub stderr: String,
}

/// Policy-enforcing command runner.
pub trait Executor: Send + Sync {
  /// Whether `binary` resolves and passes the allow-list, without running
  /// it. Used to pick a converter before any document is processed.
  fn is_available(&self, binary: &str) -> bool;

  /// Run the command to completion.
  ///
  /// # Errors
  ///
  /// [`ExecError::NotFound`] when the binary cannot be resolved,
  /// [`ExecError::Denied`] when it is not allow-listed, and
  /// [`ExecError::Failed`] when it exits non-zero.
  fn run(&self, command: &Command) -> Result<Output, ExecError>;
}
