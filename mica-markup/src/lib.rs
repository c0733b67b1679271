//! # mica-markup - document conversion core for static sites
//!
//! Markdown-to-HTML conversion with render hooks, built for a static-site
//! build pipeline: templates can take over rendering of headings, links,
//! images, code blocks, tables, blockquotes and footnotes, while documents
//! accumulate a table of contents and collision-free anchor IDs as they
//! convert.
//!
//! ## Quick Start
//!
//! ```rust
//! use mica_markup::{
//!   Converter,
//!   ConverterProvider,
//!   DocumentContext,
//!   ProviderConfig,
//!   RenderContext,
//!   TableOfContentsProvider,
//! };
//!
//! let provider = ConverterProvider::new(ProviderConfig::default());
//! let converter = provider.new_converter(DocumentContext {
//!   document_name: "guide.md".into(),
//!   filename: "guide.md".into(),
//!   ..DocumentContext::default()
//! });
//!
//! let rendered = converter
//!   .convert(RenderContext {
//!     src: "## Hello\n\nSome **bold** text.\n".to_string(),
//!     render_toc: true,
//!     get_renderer: None,
//!   })
//!   .expect("conversion failed");
//!
//! println!("{}", rendered.html);
//! println!("{}", rendered.table_of_contents().to_html(2, 3, false));
//! ```
//!
//! ## Architecture
//!
//! Comrak parses the source; the parse tree is immediately lowered into this
//! crate's own closed AST. A fixed sequence of transform passes then merges
//! `{...}` attribute lists, classifies images, isolates fenced code and raw
//! passthrough spans, and assigns anchor IDs while building the table of
//! contents. A single streaming render pass emits HTML, dispatching each
//! element kind to a caller-supplied render hook when one is registered.
//!
//! Conversion state is per-document, so documents convert in parallel
//! freely; the only shared state is the process-wide highlighter lexer-name
//! cache.

pub mod anchors;
pub mod ast;
pub mod attributes;
pub mod config;
pub mod converter;
pub mod error;
pub mod exec;
pub mod highlight;
pub mod hooks;
pub mod render;
pub mod toc;
pub mod transform;

pub use crate::{
  anchors::{AutoIdKind, IdOwner, IdRegistry, sanitize_anchor_name},
  attributes::{Attribute, AttributeValue, AttributesHolder, AttributesOwner},
  config::{Extensions, MarkupConfig, ParserConfig, RendererConfig},
  converter::{
    AnchorNameSanitizer,
    Converter,
    ConverterProvider,
    DocumentContext,
    DocumentInfo,
    MarkdownConverter,
    Parsed,
    ProviderConfig,
    RenderContext,
    Rendered,
    TableOfContentsProvider,
  },
  error::{ConvertError, ConvertResult, ExecError, HookError, Position},
  exec::{Command, Executor, Output},
  highlight::{HighlightFn, Highlighter},
  hooks::{GetRendererFn, Hook, RendererKind},
  toc::{Fragments, TocBuilder, TocConfig, TocEntry},
  transform::ParserContext,
};
