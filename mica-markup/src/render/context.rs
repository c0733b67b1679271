//! Per-render mutable state.
//!
//! One [`RenderState`] exists per document render and is dropped with it;
//! nothing here is shared between conversions.

use std::collections::HashMap;

use crate::ast::NodeKind;

/// Output buffer for one render.
///
/// Keeps the writer interface render hooks may probe: capacity is reported
/// as effectively infinite and `flush` does nothing, since the buffer grows
/// in memory and is handed over whole at the end of the render.
#[derive(Debug, Default)]
pub struct RenderBuffer {
  out: String,
}

impl RenderBuffer {
  #[must_use]
  pub fn available(&self) -> usize {
    usize::MAX
  }

  pub fn flush(&mut self) {}

  pub fn push_str(&mut self, s: &str) {
    self.out.push_str(s);
  }

  pub fn push(&mut self, c: char) {
    self.out.push(c);
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.out.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.out.is_empty()
  }

  #[must_use]
  pub fn as_str(&self) -> &str {
    &self.out
  }

  /// Remove and return everything written at or after `mark`.
  pub fn split_off(&mut self, mark: usize) -> String {
    self.out.split_off(mark)
  }

  /// Consume the buffer, yielding the rendered document.
  #[must_use]
  pub fn into_string(self) -> String {
    self.out
  }
}

/// Mutable state threaded through one render pass.
#[derive(Debug, Default)]
pub struct RenderState {
  pub buf: RenderBuffer,

  positions: Vec<usize>,
  ordinals:  HashMap<NodeKind, usize>,
}

impl RenderState {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Record the current buffer length on node entry. Must be paired with
  /// exactly one [`Self::pop_position`] on exit.
  pub fn push_position(&mut self) {
    self.positions.push(self.buf.len());
  }

  /// Detach everything rendered since the matching [`Self::push_position`]
  /// and return it, leaving the buffer as it was on entry.
  pub fn pop_position(&mut self) -> String {
    match self.positions.pop() {
      Some(mark) => self.buf.split_off(mark),
      None => String::new(),
    }
  }

  /// Next ordinal for the given node kind, starting at zero.
  pub fn ordinal(&mut self, kind: NodeKind) -> usize {
    let counter = self.ordinals.entry(kind).or_insert(0);
    let ordinal = *counter;
    *counter += 1;
    ordinal
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn buffer_reports_infinite_capacity() {
    let mut buf = RenderBuffer::default();
    assert_eq!(buf.available(), usize::MAX);
    buf.push_str("x");
    buf.flush();
    assert_eq!(buf.as_str(), "x");
  }

  #[test]
  fn position_capture_detaches_nested_content() {
    let mut state = RenderState::new();
    state.buf.push_str("<h2>");
    state.push_position();
    state.buf.push_str("inner ");
    state.push_position();
    state.buf.push_str("<em>deep</em>");
    assert_eq!(state.pop_position(), "<em>deep</em>");
    assert_eq!(state.pop_position(), "inner ");
    assert_eq!(state.buf.as_str(), "<h2>");
  }

  #[test]
  fn ordinals_count_per_kind() {
    let mut state = RenderState::new();
    assert_eq!(state.ordinal(NodeKind::Heading), 0);
    assert_eq!(state.ordinal(NodeKind::Link), 0);
    assert_eq!(state.ordinal(NodeKind::Heading), 1);
  }
}
