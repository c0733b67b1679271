//! Render hooks.
//!
//! Templates (or any embedder) can take over rendering of individual element
//! kinds. The renderer asks the provider for a hook per element kind, once
//! per document, through [`GetRendererFn`]; a `None` answer keeps the
//! built-in HTML output for that kind.
//!
//! Hook contexts are built from the element subtree after the inner content
//! has already been rendered, so `text` fields carry finished HTML and
//! `plain_text` fields carry the flattened text.

use std::sync::Arc;

use crate::{
  ast::Alignment,
  attributes::AttributesHolder,
  error::{HookError, Position},
};

/// Element kinds a hook can be registered for.
///
/// Code-block and passthrough lookups carry a subkey (the language name, or
/// the opening delimiter) so a provider can register per-language renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RendererKind {
  Heading,
  Link,
  Image,
  CodeBlock,
  Table,
  Blockquote,
  BlockquoteAlert,
  PassthroughInline,
  PassthroughBlock,
  Footnote,
  FootnoteList,
}

/// Hook lookup function supplied per render call.
pub type GetRendererFn =
  Arc<dyn Fn(RendererKind, Option<&str>) -> Option<Hook> + Send + Sync>;

/// A resolved hook, one variant per renderer trait.
#[derive(Clone)]
pub enum Hook {
  Heading(Arc<dyn HeadingRenderer>),
  Link(Arc<dyn LinkRenderer>),
  Image(Arc<dyn ImageRenderer>),
  CodeBlock(Arc<dyn CodeBlockRenderer>),
  Table(Arc<dyn TableRenderer>),
  Blockquote(Arc<dyn BlockquoteRenderer>),
  Passthrough(Arc<dyn PassthroughRenderer>),
  Footnote(Arc<dyn FootnoteRenderer>),
}

impl std::fmt::Debug for Hook {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let name = match self {
      Self::Heading(_) => "Heading",
      Self::Link(_) => "Link",
      Self::Image(_) => "Image",
      Self::CodeBlock(_) => "CodeBlock",
      Self::Table(_) => "Table",
      Self::Blockquote(_) => "Blockquote",
      Self::Passthrough(_) => "Passthrough",
      Self::Footnote(_) => "Footnote",
    };
    f.debug_tuple("Hook").field(&name).finish()
  }
}

pub trait HeadingRenderer: Send + Sync {
  fn render_heading(
    &self,
    out: &mut String,
    ctx: &HeadingContext,
  ) -> Result<(), HookError>;
}

pub trait LinkRenderer: Send + Sync {
  fn render_link(
    &self,
    out: &mut String,
    ctx: &LinkContext,
  ) -> Result<(), HookError>;
}

pub trait ImageRenderer: Send + Sync {
  fn render_image(
    &self,
    out: &mut String,
    ctx: &ImageContext,
  ) -> Result<(), HookError>;
}

pub trait CodeBlockRenderer: Send + Sync {
  fn render_code_block(
    &self,
    out: &mut String,
    ctx: &CodeBlockContext,
  ) -> Result<(), HookError>;
}

pub trait TableRenderer: Send + Sync {
  fn render_table(
    &self,
    out: &mut String,
    ctx: &TableContext,
  ) -> Result<(), HookError>;
}

pub trait BlockquoteRenderer: Send + Sync {
  fn render_blockquote(
    &self,
    out: &mut String,
    ctx: &BlockquoteContext,
  ) -> Result<(), HookError>;
}

pub trait PassthroughRenderer: Send + Sync {
  fn render_passthrough(
    &self,
    out: &mut String,
    ctx: &PassthroughContext,
  ) -> Result<(), HookError>;
}

/// Handles both the inline footnote reference and the end-of-document list.
pub trait FootnoteRenderer: Send + Sync {
  fn render_reference(
    &self,
    out: &mut String,
    ctx: &FootnoteContext,
  ) -> Result<(), HookError>;

  fn render_list(
    &self,
    out: &mut String,
    ctx: &FootnoteListContext,
  ) -> Result<(), HookError>;
}

#[derive(Debug, Clone)]
pub struct HeadingContext {
  /// Rendered inner HTML of the heading.
  pub text:       String,
  /// Flattened plain text of the heading.
  pub plain_text: String,
  pub level:      u8,
  /// Resolved anchor ID, after collision handling.
  pub anchor:     String,
  pub attributes: AttributesHolder,
  /// Zero-based index among headings in the document.
  pub ordinal:    usize,
  pub position:   Option<Position>,
  /// Identifier of the document the element belongs to, when the embedder
  /// set one.
  pub page_id:    Option<String>,
}

#[derive(Debug, Clone)]
pub struct LinkContext {
  pub destination: String,
  pub title:       String,
  pub text:        String,
  pub plain_text:  String,
  pub ordinal:     usize,
  pub position:    Option<Position>,
  pub page_id:     Option<String>,
}

#[derive(Debug, Clone)]
pub struct ImageContext {
  pub destination: String,
  pub title:       String,
  pub text:        String,
  pub plain_text:  String,
  /// True when the image stood alone in its paragraph and was promoted to a
  /// block element.
  pub is_block:    bool,
  pub attributes:  AttributesHolder,
  pub ordinal:     usize,
  pub position:    Option<Position>,
  pub page_id:     Option<String>,
}

#[derive(Debug, Clone)]
pub struct CodeBlockContext {
  /// Language name from the info string. Empty for plain fences.
  pub language:   String,
  /// Verbatim code content.
  pub inner:      String,
  pub attributes: AttributesHolder,
  pub ordinal:    usize,
  pub position:   Option<Position>,
  pub page_id:    Option<String>,
}

/// One rendered table cell.
#[derive(Debug, Clone)]
pub struct TableCell {
  pub text:      String,
  pub alignment: Alignment,
}

#[derive(Debug, Clone)]
pub struct TableContext {
  pub header:     Vec<Vec<TableCell>>,
  pub body:       Vec<Vec<TableCell>>,
  pub attributes: AttributesHolder,
  pub ordinal:    usize,
  pub position:   Option<Position>,
  pub page_id:    Option<String>,
}

/// Whether a blockquote was classified as a GitHub-style alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockquoteKind {
  Regular,
  Alert,
}

#[derive(Debug, Clone)]
pub struct BlockquoteContext {
  pub kind:       BlockquoteKind,
  /// Lowercased alert name (`note`, `tip`, `warning`, `important`,
  /// `caution`) when `kind` is [`BlockquoteKind::Alert`].
  pub alert_type: Option<String>,
  /// Rendered inner HTML, with the alert marker line already stripped.
  pub text:       String,
  pub attributes: AttributesHolder,
  pub ordinal:    usize,
  pub position:   Option<Position>,
  pub page_id:    Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassthroughKind {
  Inline,
  Block,
}

#[derive(Debug, Clone)]
pub struct PassthroughContext {
  pub kind:    PassthroughKind,
  /// Content between the delimiters, delimiters excluded.
  pub inner:   String,
  /// Shared ordinal across inline and block passthrough elements.
  pub ordinal: usize,
  pub page_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FootnoteContext {
  pub name:    String,
  pub ref_num: u32,
  /// Suffix appended to footnote anchors to keep them unique across
  /// documents rendered into one page.
  pub anchor_suffix: String,
  pub page_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FootnoteListContext {
  /// Rendered HTML of the footnote definitions.
  pub inner:         String,
  pub anchor_suffix: String,
  pub page_id:       Option<String>,
}
