//! Converter façade: parse → transform → render.
//!
//! A [`ConverterProvider`] is built once from configuration and handed to
//! the build; it creates one cheap [`MarkdownConverter`] per document. The
//! provider is immutable after construction, so documents convert in
//! parallel without coordination.

use std::{
  panic::{AssertUnwindSafe, catch_unwind},
  sync::Arc,
};

use comrak::{Arena, Options, parse_document};

use crate::{
  anchors::sanitize_anchor_name,
  ast::{self, Node},
  config::MarkupConfig,
  error::{ConvertError, ConvertResult},
  exec::Executor,
  highlight::Highlighter,
  hooks::GetRendererFn,
  render::{self, RenderOptions},
  toc::Fragments,
  transform,
};

/// Per-document identity, set once when the converter is created.
#[derive(Debug, Clone, Default)]
pub struct DocumentContext {
  /// Human-readable name used in error reports.
  pub document_name: String,

  /// Stable identifier passed through to render-hook contexts.
  pub document_id: Option<String>,

  /// Source filename for positions.
  pub filename: String,

  /// Suffix appended to footnote anchors so several documents can render
  /// into one page without ID collisions.
  pub anchor_suffix: String,

  /// Full replacement for the provider's markup configuration, for
  /// documents that opt out of site defaults.
  pub config_overrides: Option<MarkupConfig>,
}

/// Per-render inputs.
pub struct RenderContext {
  pub src: String,

  /// Whether to accumulate a table of contents during the transform pass.
  pub render_toc: bool,

  /// Render-hook lookup for this render, usually backed by the template
  /// layer. `None` uses the default emitters throughout.
  pub get_renderer: Option<GetRendererFn>,
}

/// A parsed and transformed document, ready to render. Keeping this around
/// lets callers extract the table of contents without rendering twice.
#[derive(Debug)]
pub struct Parsed {
  doc: Node,
  toc: Fragments,
}

impl Parsed {
  #[must_use]
  pub fn table_of_contents(&self) -> &Fragments {
    &self.toc
  }
}

/// The result of a full conversion.
#[derive(Debug)]
pub struct Rendered {
  pub html: String,
  toc:      Fragments,
}

/// Access to the table of contents accumulated during conversion.
pub trait TableOfContentsProvider {
  fn table_of_contents(&self) -> &Fragments;
}

impl TableOfContentsProvider for Rendered {
  fn table_of_contents(&self) -> &Fragments {
    &self.toc
  }
}

/// Anchor sanitization with the converter's configured strategy, exposed so
/// templates can predict generated fragment IDs.
pub trait AnchorNameSanitizer {
  fn sanitize_anchor_name(&self, name: &str) -> String;
}

/// Identity details other layers need about a converter's document.
pub trait DocumentInfo {
  /// Suffix appended to footnote anchors of this document.
  fn anchor_suffix(&self) -> &str;
}

/// A converter bound to one document.
pub trait Converter: Send + Sync {
  /// Convert the source in one step.
  ///
  /// # Errors
  ///
  /// Any [`ConvertError`]; a panic escaping a render hook is caught and
  /// reported as [`ConvertError::Internal`] so one bad document cannot take
  /// down a parallel build.
  fn convert(&self, ctx: RenderContext) -> ConvertResult<Rendered>;
}

/// Everything a provider needs to create converters.
#[derive(Clone, Default)]
pub struct ProviderConfig {
  pub markup:      MarkupConfig,
  pub highlighter: Option<Highlighter>,

  /// Sandboxed runner handed to external-process converters built on top of
  /// this provider. Unused by the Markdown path.
  pub executor: Option<Arc<dyn Executor>>,
}

impl std::fmt::Debug for ProviderConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ProviderConfig")
      .field("markup", &self.markup)
      .field("highlighter", &self.highlighter)
      .finish_non_exhaustive()
  }
}

/// Creates one [`MarkdownConverter`] per document.
#[derive(Debug)]
pub struct ConverterProvider {
  config: ProviderConfig,
}

impl ConverterProvider {
  #[must_use]
  pub fn new(config: ProviderConfig) -> Self {
    Self { config }
  }

  /// Build a converter for one document. Document-level configuration
  /// overrides replace the provider's markup configuration wholesale.
  #[must_use]
  pub fn new_converter(&self, ctx: DocumentContext) -> MarkdownConverter {
    let config = ctx
      .config_overrides
      .clone()
      .unwrap_or_else(|| self.config.markup.clone());
    MarkdownConverter {
      config,
      highlighter: self.config.highlighter.clone(),
      ctx,
    }
  }
}

/// Markdown converter for a single document.
#[derive(Debug)]
pub struct MarkdownConverter {
  config:      MarkupConfig,
  highlighter: Option<Highlighter>,
  ctx:         DocumentContext,
}

impl MarkdownConverter {
  /// Parse and transform the source without rendering.
  ///
  /// # Errors
  ///
  /// Fails on transform errors, currently only malformed fenced code block
  /// attribute lists.
  pub fn parse(&self, ctx: &RenderContext) -> ConvertResult<Parsed> {
    let arena = Arena::new();
    let options = self.comrak_options();
    let root = parse_document(&arena, &ctx.src, &options);

    let mut doc = ast::lower_document(root, &self.ctx.filename);
    let mut parser_ctx =
      transform::ParserContext::new(&self.config, ctx.render_toc);
    if let Some(id) = &self.ctx.document_id {
      parser_ctx.push_page(id.clone());
    }
    transform::run_transforms(
      &mut doc,
      &self.config,
      self.highlighter.as_ref(),
      &mut parser_ctx,
    )?;
    parser_ctx.pop_page();
    Ok(Parsed {
      doc,
      toc: parser_ctx.into_fragments(),
    })
  }

  /// Render a previously parsed document.
  ///
  /// # Errors
  ///
  /// Fails on unresolved code block languages, highlighter failures, and
  /// hook errors.
  pub fn render(
    &self,
    parsed: &Parsed,
    ctx: &RenderContext,
  ) -> ConvertResult<String> {
    render::render_document(&parsed.doc, &RenderOptions {
      config:        &self.config,
      highlighter:   self.highlighter.as_ref(),
      get_renderer:  ctx.get_renderer.as_ref(),
      page_id:       self.ctx.document_id.clone(),
      anchor_suffix: self.ctx.anchor_suffix.clone(),
    })
  }

  /// Map configured extensions onto comrak's. Raw HTML is let through here
  /// and filtered by this crate's renderer instead, so safe mode is applied
  /// uniformly to default output and hook contexts.
  fn comrak_options(&self) -> Options<'_> {
    let extensions = &self.config.extensions;
    let mut options = Options::default();
    options.extension.table = extensions.table;
    options.extension.strikethrough = extensions.strikethrough;
    options.extension.superscript = extensions.superscript;
    options.extension.tasklist = extensions.task_list;
    options.extension.description_lists = extensions.definition_list;
    options.extension.footnotes = extensions.footnote;
    options.extension.autolink = extensions.autolink;
    options.extension.header_id_prefix = None;
    options.render.r#unsafe = true;
    options.render.hardbreaks = false;
    options
  }
}

impl Converter for MarkdownConverter {
  fn convert(&self, ctx: RenderContext) -> ConvertResult<Rendered> {
    let outcome = catch_unwind(AssertUnwindSafe(|| {
      let parsed = self.parse(&ctx)?;
      let html = self.render(&parsed, &ctx)?;
      Ok(Rendered {
        html,
        toc: parsed.toc,
      })
    }));

    match outcome {
      Ok(result) => result,
      Err(payload) => Err(ConvertError::Internal {
        document: self.ctx.document_name.clone(),
        message:  panic_message(&payload),
      }),
    }
  }
}

impl AnchorNameSanitizer for MarkdownConverter {
  fn sanitize_anchor_name(&self, name: &str) -> String {
    sanitize_anchor_name(name, self.config.parser.auto_id_kind())
  }
}

impl DocumentInfo for MarkdownConverter {
  fn anchor_suffix(&self) -> &str {
    &self.ctx.anchor_suffix
  }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
  if let Some(message) = payload.downcast_ref::<&str>() {
    (*message).to_string()
  } else if let Some(message) = payload.downcast_ref::<String>() {
    message.clone()
  } else {
    "unknown panic".to_string()
  }
}

#[cfg(test)]
mod tests {
  #![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    reason = "Fine in tests"
  )]

  use std::sync::Arc;

  use super::*;
  use crate::hooks::{
    HeadingContext,
    HeadingRenderer,
    Hook,
    RendererKind,
  };

  fn provider() -> ConverterProvider {
    ConverterProvider::new(ProviderConfig::default())
  }

  fn converter() -> MarkdownConverter {
    provider().new_converter(DocumentContext {
      document_name: "page.md".into(),
      filename: "page.md".into(),
      ..DocumentContext::default()
    })
  }

  fn render_ctx(src: &str) -> RenderContext {
    RenderContext {
      src: src.to_string(),
      render_toc: true,
      get_renderer: None,
    }
  }

  #[test]
  fn converts_basic_markdown() {
    let rendered = converter()
      .convert(render_ctx("## Hello\n\nSome *text*.\n"))
      .expect("conversion should succeed");

    assert!(rendered.html.contains("<h2 id=\"hello\">Hello</h2>"));
    assert!(rendered.html.contains("<em>text</em>"));
    assert_eq!(rendered.table_of_contents().identifiers, vec!["hello"]);
  }

  #[test]
  fn parse_exposes_the_toc_without_rendering() {
    let parsed = converter()
      .parse(&render_ctx("## One\n\n### Two\n"))
      .expect("parse should succeed");
    assert_eq!(parsed.table_of_contents().identifiers.len(), 2);
  }

  #[test]
  fn document_overrides_replace_provider_config() {
    let mut overrides = MarkupConfig::default();
    overrides.parser.auto_heading_id = false;

    let converter = provider().new_converter(DocumentContext {
      config_overrides: Some(overrides),
      ..DocumentContext::default()
    });
    let rendered = converter
      .convert(render_ctx("## Hello\n"))
      .expect("conversion should succeed");
    assert!(rendered.html.contains("<h2>Hello</h2>"));
  }

  #[test]
  fn a_panicking_hook_becomes_an_internal_error() {
    struct Panics;
    impl HeadingRenderer for Panics {
      fn render_heading(
        &self,
        _out: &mut String,
        _ctx: &HeadingContext,
      ) -> Result<(), crate::error::HookError> {
        panic!("boom");
      }
    }

    let hook = Hook::Heading(Arc::new(Panics));
    let get: GetRendererFn = Arc::new(move |kind, _| {
      (kind == RendererKind::Heading).then(|| hook.clone())
    });

    let err = converter()
      .convert(RenderContext {
        src: "## Hello\n".into(),
        render_toc: false,
        get_renderer: Some(get),
      })
      .expect_err("should fail");
    assert!(matches!(err, ConvertError::Internal { .. }));
  }

  #[test]
  fn sanitizer_capability_uses_the_configured_strategy() {
    let converter = converter();
    assert_eq!(converter.sanitize_anchor_name("Hello World"), "hello-world");
  }
}
