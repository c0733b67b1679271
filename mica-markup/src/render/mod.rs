//! Hook-dispatch HTML renderer.
//!
//! A single streaming pass over the transformed tree. For every element
//! kind that can be taken over by a render hook, the renderer first emits
//! the element's inner content into the output buffer, then detaches it
//! using the position-capture protocol in [`context::RenderState`] and hands
//! it to the hook; without a hook, a default emitter writes the HTML
//! directly. Inner content is therefore rendered exactly once either way.

pub mod context;

use std::sync::LazyLock;

use log::error;
use regex::Regex;

use crate::{
  ast::{Alignment, Node, NodeData, NodeKind},
  attributes::render_attributes,
  config::MarkupConfig,
  error::{ConvertError, ConvertResult, Position},
  highlight::{Highlighter, options_string, write_code_tag},
  hooks::{
    BlockquoteContext,
    BlockquoteKind,
    CodeBlockContext,
    FootnoteContext,
    FootnoteListContext,
    GetRendererFn,
    HeadingContext,
    Hook,
    ImageContext,
    LinkContext,
    PassthroughContext,
    PassthroughKind,
    RendererKind,
    TableCell,
    TableContext,
  },
};

use self::context::RenderState;

/// GitHub alert marker at the start of a rendered blockquote.
static ALERT_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)^<p>\[!(NOTE|TIP|WARNING|IMPORTANT|CAUTION)\]")
    .unwrap_or_else(|e| {
      error!("Failed to compile ALERT_RE regex: {e}");
      crate::transform::never_matching_regex()
    })
});

/// Everything one render call needs besides the document tree.
pub struct RenderOptions<'a> {
  pub config:      &'a MarkupConfig,
  pub highlighter: Option<&'a Highlighter>,

  /// Hook lookup; `None` renders everything with the default emitters.
  pub get_renderer: Option<&'a GetRendererFn>,

  /// Identifier of the document, passed through to hook contexts.
  pub page_id: Option<String>,

  /// Suffix appended to footnote anchors.
  pub anchor_suffix: String,
}

/// Render a transformed document tree to HTML.
///
/// # Errors
///
/// Fails on an unresolvable fenced code block language, a failed
/// highlighter callback, or a hook error; each aborts this document only.
pub fn render_document(
  doc: &Node,
  opts: &RenderOptions,
) -> ConvertResult<String> {
  let mut renderer = Renderer::new(opts);
  renderer.render_node(doc)?;
  renderer.render_footnote_section()?;
  Ok(renderer.state.buf.into_string())
}

struct Renderer<'a> {
  opts:  &'a RenderOptions<'a>,
  state: RenderState,

  // Hooks without a subkey are resolved once per render.
  heading_hook:         Option<Hook>,
  link_hook:            Option<Hook>,
  image_hook:           Option<Hook>,
  table_hook:           Option<Hook>,
  blockquote_hook:      Option<Hook>,
  blockquote_alert_hook: Option<Hook>,
  footnote_hook:        Option<Hook>,
  footnote_list_hook:   Option<Hook>,

  footnotes: Vec<&'a Node>,
}

impl<'a> Renderer<'a> {
  fn new(opts: &'a RenderOptions<'a>) -> Self {
    let lookup = |kind| opts.get_renderer.and_then(|f| f(kind, None));
    Self {
      opts,
      state: RenderState::new(),
      heading_hook: lookup(RendererKind::Heading),
      link_hook: lookup(RendererKind::Link),
      image_hook: lookup(RendererKind::Image),
      table_hook: lookup(RendererKind::Table),
      blockquote_hook: lookup(RendererKind::Blockquote),
      blockquote_alert_hook: lookup(RendererKind::BlockquoteAlert),
      footnote_hook: lookup(RendererKind::Footnote),
      footnote_list_hook: lookup(RendererKind::FootnoteList),
      footnotes: Vec::new(),
    }
  }

  fn lookup(&self, kind: RendererKind, subkey: &str) -> Option<Hook> {
    let f = self.opts.get_renderer?;
    if subkey.is_empty() {
      f(kind, None)
    } else {
      f(kind, Some(subkey)).or_else(|| f(kind, None))
    }
  }

  fn position(node: &Node) -> Position {
    node
      .position
      .clone()
      .unwrap_or_else(|| Position::new("", 0, 0))
  }

  fn br(&self) -> &'static str {
    if self.opts.config.renderer.xhtml {
      "<br />\n"
    } else {
      "<br>\n"
    }
  }

  fn render_children(&mut self, node: &'a Node) -> ConvertResult<()> {
    for child in &node.children {
      self.render_node(child)?;
    }
    Ok(())
  }

  fn render_node(&mut self, node: &'a Node) -> ConvertResult<()> {
    match &node.data {
      NodeData::Document | NodeData::FootnoteList => {
        self.render_children(node)
      },
      NodeData::Paragraph => self.render_paragraph(node, true),
      NodeData::Heading { level } => self.render_heading(node, *level),
      NodeData::Text(text) => {
        self
          .state
          .buf
          .push_str(&html_escape::encode_text(text));
        Ok(())
      },
      NodeData::SoftBreak => {
        if self.opts.config.renderer.hard_wraps {
          self.state.buf.push_str(self.br());
        } else {
          self.state.buf.push('\n');
        }
        Ok(())
      },
      NodeData::LineBreak => {
        self.state.buf.push_str(self.br());
        Ok(())
      },
      NodeData::Emph => self.render_wrapped(node, "<em>", "</em>"),
      NodeData::Strong => self.render_wrapped(node, "<strong>", "</strong>"),
      NodeData::Strikethrough => self.render_wrapped(node, "<del>", "</del>"),
      NodeData::Superscript => self.render_wrapped(node, "<sup>", "</sup>"),
      NodeData::Code(literal) => {
        self.state.buf.push_str("<code>");
        self
          .state
          .buf
          .push_str(&html_escape::encode_text(literal));
        self.state.buf.push_str("</code>");
        Ok(())
      },
      NodeData::CodeBlock {
        language,
        literal,
        ordinal,
        fenced,
      } => self.render_code_block(node, language, literal, *ordinal, *fenced),
      NodeData::HtmlInline(html) => {
        if self.opts.config.renderer.unsafe_ {
          self.state.buf.push_str(html);
        } else {
          self.state.buf.push_str("<!-- raw HTML omitted -->");
        }
        Ok(())
      },
      NodeData::HtmlBlock(html) => {
        if self.opts.config.renderer.unsafe_ {
          self.state.buf.push_str(html);
        } else {
          self.state.buf.push_str("<!-- raw HTML omitted -->\n");
        }
        Ok(())
      },
      NodeData::Link { destination, title } => {
        self.render_link(node, destination, title)
      },
      NodeData::Image {
        destination,
        title,
        ordinal,
        block,
      } => self.render_image(node, destination, title, *ordinal, *block),
      NodeData::Blockquote => self.render_blockquote(node),
      NodeData::List {
        ordered,
        start,
        tight,
      } => self.render_list(node, *ordered, *start, *tight),
      NodeData::Item | NodeData::TaskItem { .. } => {
        // Items are rendered by their list so tightness is known.
        self.render_item(node, false)
      },
      NodeData::ThematicBreak => {
        self.state.buf.push_str(if self.opts.config.renderer.xhtml {
          "<hr />\n"
        } else {
          "<hr>\n"
        });
        Ok(())
      },
      NodeData::Table { alignments } => self.render_table(node, alignments),
      NodeData::TableRow { .. } | NodeData::TableCell => {
        // Reached only for rows outside a table; render transparently.
        self.render_children(node)
      },
      NodeData::FootnoteDefinition { .. } => {
        self.footnotes.push(node);
        Ok(())
      },
      NodeData::FootnoteReference { name, ref_num } => {
        self.render_footnote_reference(node, name, *ref_num)
      },
      NodeData::DefinitionList => {
        self.state.buf.push_str("<dl>\n");
        self.render_children(node)?;
        self.state.buf.push_str("</dl>\n");
        Ok(())
      },
      NodeData::DefinitionItem => self.render_children(node),
      NodeData::DefinitionTerm => {
        self.state.buf.push_str("<dt");
        self.write_attributes(node);
        self.state.buf.push('>');
        self.render_children(node)?;
        self.state.buf.push_str("</dt>\n");
        Ok(())
      },
      NodeData::DefinitionDetails => {
        self.state.buf.push_str("<dd>");
        self.render_children(node)?;
        self.state.buf.push_str("</dd>\n");
        Ok(())
      },
      NodeData::Passthrough {
        inline,
        inner,
        open,
        close,
      } => self.render_passthrough(*inline, inner, open, close),
    }
  }

  fn write_attributes(&mut self, node: &Node) {
    let mut out = String::new();
    render_attributes(&mut out, false, node.attributes.attributes_slice());
    self.state.buf.push_str(&out);
  }

  fn render_wrapped(
    &mut self,
    node: &'a Node,
    open: &str,
    close: &str,
  ) -> ConvertResult<()> {
    self.state.buf.push_str(open);
    self.render_children(node)?;
    self.state.buf.push_str(close);
    Ok(())
  }

  fn render_paragraph(
    &mut self,
    node: &'a Node,
    wrap: bool,
  ) -> ConvertResult<()> {
    if !wrap {
      return self.render_children(node);
    }
    self.state.buf.push_str("<p");
    self.write_attributes(node);
    self.state.buf.push('>');
    self.render_children(node)?;
    self.state.buf.push_str("</p>\n");
    Ok(())
  }

  fn render_heading(&mut self, node: &'a Node, level: u8) -> ConvertResult<()> {
    let ordinal = self.state.ordinal(NodeKind::Heading);
    self.state.push_position();
    self.render_children(node)?;
    let inner = self.state.pop_position();

    if let Some(Hook::Heading(hook)) = self.heading_hook.clone() {
      let position = Self::position(node);
      let ctx = HeadingContext {
        text: inner,
        plain_text: node.text_content(),
        level,
        anchor: node.attributes.id().unwrap_or_default().to_string(),
        attributes: node.attributes.clone(),
        ordinal,
        position: node.position.clone(),
        page_id: self.opts.page_id.clone(),
      };
      let mut out = String::new();
      hook
        .render_heading(&mut out, &ctx)
        .map_err(|source| ConvertError::Hook { source, position })?;
      self.state.buf.push_str(&out);
      return Ok(());
    }

    self.state.buf.push_str("<h");
    self.state.buf.push_str(&level.to_string());
    self.write_attributes(node);
    self.state.buf.push('>');
    self.state.buf.push_str(&inner);
    self.state.buf.push_str("</h");
    self.state.buf.push_str(&level.to_string());
    self.state.buf.push_str(">\n");
    Ok(())
  }

  fn render_link(
    &mut self,
    node: &'a Node,
    destination: &str,
    title: &str,
  ) -> ConvertResult<()> {
    let ordinal = self.state.ordinal(NodeKind::Link);
    self.state.push_position();
    self.render_children(node)?;
    let inner = self.state.pop_position();

    if let Some(Hook::Link(hook)) = self.link_hook.clone() {
      let position = Self::position(node);
      let ctx = LinkContext {
        destination: destination.to_string(),
        title: title.to_string(),
        text: inner,
        plain_text: node.text_content(),
        ordinal,
        position: node.position.clone(),
        page_id: self.opts.page_id.clone(),
      };
      let mut out = String::new();
      hook
        .render_link(&mut out, &ctx)
        .map_err(|source| ConvertError::Hook { source, position })?;
      self.state.buf.push_str(&out);
      return Ok(());
    }

    self.state.buf.push_str("<a href=\"");
    if self.opts.config.renderer.unsafe_ || !dangerous_url(destination) {
      self.state.buf.push_str(&html_escape::encode_double_quoted_attribute(
        destination,
      ));
    }
    self.state.buf.push('"');
    if !title.is_empty() {
      self.state.buf.push_str(" title=\"");
      self
        .state
        .buf
        .push_str(&html_escape::encode_double_quoted_attribute(title));
      self.state.buf.push('"');
    }
    self.state.buf.push('>');
    self.state.buf.push_str(&inner);
    self.state.buf.push_str("</a>");
    Ok(())
  }

  fn render_image(
    &mut self,
    node: &'a Node,
    destination: &str,
    title: &str,
    ordinal: usize,
    block: bool,
  ) -> ConvertResult<()> {
    self.state.push_position();
    self.render_children(node)?;
    let inner = self.state.pop_position();

    if let Some(Hook::Image(hook)) = self.image_hook.clone() {
      let position = Self::position(node);
      let ctx = ImageContext {
        destination: destination.to_string(),
        title: title.to_string(),
        text: inner,
        plain_text: node.text_content(),
        is_block: block,
        attributes: node.attributes.clone(),
        ordinal,
        position: node.position.clone(),
        page_id: self.opts.page_id.clone(),
      };
      let mut out = String::new();
      hook
        .render_image(&mut out, &ctx)
        .map_err(|source| ConvertError::Hook { source, position })?;
      self.state.buf.push_str(&out);
      if block {
        self.state.buf.push('\n');
      }
      return Ok(());
    }

    self.state.buf.push_str("<img src=\"");
    if self.opts.config.renderer.unsafe_ || !dangerous_url(destination) {
      self.state.buf.push_str(&html_escape::encode_double_quoted_attribute(
        destination,
      ));
    }
    self.state.buf.push_str("\" alt=\"");
    self
      .state
      .buf
      .push_str(&html_escape::encode_double_quoted_attribute(
        &node.text_content(),
      ));
    self.state.buf.push('"');
    if !title.is_empty() {
      self.state.buf.push_str(" title=\"");
      self
        .state
        .buf
        .push_str(&html_escape::encode_double_quoted_attribute(title));
      self.state.buf.push('"');
    }
    self.write_attributes(node);
    self.state.buf.push_str(if self.opts.config.renderer.xhtml {
      " />"
    } else {
      ">"
    });
    if block {
      self.state.buf.push('\n');
    }
    Ok(())
  }

  fn render_blockquote(&mut self, node: &'a Node) -> ConvertResult<()> {
    let ordinal = self.state.ordinal(NodeKind::Blockquote);
    self.state.push_position();
    self.render_children(node)?;
    let inner = self.state.pop_position();

    let alert = classify_alert(&inner);
    let hook = match alert {
      Some(_) => self
        .blockquote_alert_hook
        .clone()
        .or_else(|| self.blockquote_hook.clone()),
      None => self.blockquote_hook.clone(),
    };

    if let Some(Hook::Blockquote(hook)) = hook {
      let position = Self::position(node);
      let (kind, alert_type, text) = match alert {
        Some(alert_type) => (
          BlockquoteKind::Alert,
          Some(alert_type),
          strip_alert_marker(&inner),
        ),
        None => (BlockquoteKind::Regular, None, inner),
      };
      let ctx = BlockquoteContext {
        kind,
        alert_type,
        text,
        attributes: node.attributes.clone(),
        ordinal,
        position: node.position.clone(),
        page_id: self.opts.page_id.clone(),
      };
      let mut out = String::new();
      hook
        .render_blockquote(&mut out, &ctx)
        .map_err(|source| ConvertError::Hook { source, position })?;
      self.state.buf.push_str(&out);
      return Ok(());
    }

    self.state.buf.push_str("<blockquote");
    self.write_attributes(node);
    self.state.buf.push_str(">\n");
    self.state.buf.push_str(&inner);
    self.state.buf.push_str("</blockquote>\n");
    Ok(())
  }

  fn render_list(
    &mut self,
    node: &'a Node,
    ordered: bool,
    start: usize,
    tight: bool,
  ) -> ConvertResult<()> {
    if ordered {
      self.state.buf.push_str("<ol");
      if start != 1 {
        self.state.buf.push_str(" start=\"");
        self.state.buf.push_str(&start.to_string());
        self.state.buf.push('"');
      }
    } else {
      self.state.buf.push_str("<ul");
    }
    self.write_attributes(node);
    self.state.buf.push_str(">\n");

    for item in &node.children {
      self.render_item(item, tight)?;
    }

    self
      .state
      .buf
      .push_str(if ordered { "</ol>\n" } else { "</ul>\n" });
    Ok(())
  }

  fn render_item(&mut self, item: &'a Node, tight: bool) -> ConvertResult<()> {
    self.state.buf.push_str("<li>");
    if let NodeData::TaskItem { checked } = &item.data {
      self.state.buf.push_str("<input type=\"checkbox\"");
      if *checked {
        self.state.buf.push_str(" checked=\"\"");
      }
      self.state.buf.push_str(" disabled=\"\"");
      self.state.buf.push_str(if self.opts.config.renderer.xhtml {
        " /> "
      } else {
        "> "
      });
    }

    for child in &item.children {
      // Tight lists drop the paragraph wrapper around item text.
      if tight && child.kind() == NodeKind::Paragraph {
        self.render_paragraph(child, false)?;
      } else {
        self.render_node(child)?;
      }
    }
    self.state.buf.push_str("</li>\n");
    Ok(())
  }

  fn render_code_block(
    &mut self,
    node: &'a Node,
    language: &str,
    literal: &str,
    ordinal: usize,
    fenced: bool,
  ) -> ConvertResult<()> {
    if let Some(Hook::CodeBlock(hook)) =
      self.lookup(RendererKind::CodeBlock, language)
    {
      let position = Self::position(node);
      let ctx = CodeBlockContext {
        language: language.to_string(),
        inner: literal.to_string(),
        attributes: node.attributes.clone(),
        ordinal,
        position: node.position.clone(),
        page_id: self.opts.page_id.clone(),
      };
      let mut out = String::new();
      hook
        .render_code_block(&mut out, &ctx)
        .map_err(|source| ConvertError::Hook { source, position })?;
      self.state.buf.push_str(&out);
      return Ok(());
    }

    if language.is_empty() || !fenced {
      self.state.buf.push_str("<pre>");
      let mut tag = String::new();
      write_code_tag(&mut tag, language);
      self.state.buf.push_str(&tag);
      self
        .state
        .buf
        .push_str(&html_escape::encode_text(literal));
      self.state.buf.push_str("</code></pre>\n");
      return Ok(());
    }

    if let Some(highlighter) = self.opts.highlighter
      && highlighter.is_known(language)
    {
      let options = options_string(node.attributes.options_slice());
      let html = (highlighter.highlight)(literal, language, &options)
        .map_err(|source| ConvertError::Highlight {
          language: language.to_string(),
          source,
          position: Self::position(node),
        })?;
      self.state.buf.push_str(&html);
      self.state.buf.push('\n');
      return Ok(());
    }

    Err(ConvertError::UnresolvedCodeBlock {
      language: language.to_string(),
      position: Self::position(node),
    })
  }

  fn render_table(
    &mut self,
    node: &'a Node,
    alignments: &[Alignment],
  ) -> ConvertResult<()> {
    let ordinal = self.state.ordinal(NodeKind::Table);

    let mut header: Vec<Vec<TableCell>> = Vec::new();
    let mut body: Vec<Vec<TableCell>> = Vec::new();
    for row in &node.children {
      let NodeData::TableRow { header: is_header } = &row.data else {
        continue;
      };
      let mut cells = Vec::with_capacity(row.children.len());
      for (column, cell) in row.children.iter().enumerate() {
        self.state.push_position();
        self.render_children(cell)?;
        cells.push(TableCell {
          text:      self.state.pop_position(),
          alignment: alignments.get(column).copied().unwrap_or_default(),
        });
      }
      if *is_header {
        header.push(cells);
      } else {
        body.push(cells);
      }
    }

    if let Some(Hook::Table(hook)) = self.table_hook.clone() {
      let position = Self::position(node);
      let ctx = TableContext {
        header,
        body,
        attributes: node.attributes.clone(),
        ordinal,
        position: node.position.clone(),
        page_id: self.opts.page_id.clone(),
      };
      let mut out = String::new();
      hook
        .render_table(&mut out, &ctx)
        .map_err(|source| ConvertError::Hook { source, position })?;
      self.state.buf.push_str(&out);
      return Ok(());
    }

    self.state.buf.push_str("<table");
    self.write_attributes(node);
    self.state.buf.push_str(">\n<thead>\n");
    for row in &header {
      self.write_table_row(row, "th");
    }
    self.state.buf.push_str("</thead>\n<tbody>\n");
    for row in &body {
      self.write_table_row(row, "td");
    }
    self.state.buf.push_str("</tbody>\n</table>\n");
    Ok(())
  }

  fn write_table_row(&mut self, row: &[TableCell], tag: &str) {
    self.state.buf.push_str("<tr>\n");
    for cell in row {
      self.state.buf.push('<');
      self.state.buf.push_str(tag);
      if let Some(style) = cell.alignment.style() {
        self.state.buf.push_str(" style=\"text-align: ");
        self.state.buf.push_str(style);
        self.state.buf.push('"');
      }
      self.state.buf.push('>');
      self.state.buf.push_str(&cell.text);
      self.state.buf.push_str("</");
      self.state.buf.push_str(tag);
      self.state.buf.push_str(">\n");
    }
    self.state.buf.push_str("</tr>\n");
  }

  fn render_passthrough(
    &mut self,
    inline: bool,
    inner: &str,
    open: &str,
    close: &str,
  ) -> ConvertResult<()> {
    let ordinal = self.state.ordinal(NodeKind::Passthrough);
    let kind = if inline {
      RendererKind::PassthroughInline
    } else {
      RendererKind::PassthroughBlock
    };

    if let Some(Hook::Passthrough(hook)) = self.lookup(kind, open) {
      let ctx = PassthroughContext {
        kind: if inline {
          PassthroughKind::Inline
        } else {
          PassthroughKind::Block
        },
        inner: inner.to_string(),
        ordinal,
        page_id: self.opts.page_id.clone(),
      };
      let mut out = String::new();
      hook.render_passthrough(&mut out, &ctx).map_err(|source| {
        ConvertError::Hook {
          source,
          position: Position::new("", 0, 0),
        }
      })?;
      self.state.buf.push_str(&out);
      if !inline {
        self.state.buf.push('\n');
      }
      return Ok(());
    }

    // No hook: the span passes through to the output verbatim, delimiters
    // included, for client-side processing.
    self.state.buf.push_str(open);
    self.state.buf.push_str(inner);
    self.state.buf.push_str(close);
    if !inline {
      self.state.buf.push('\n');
    }
    Ok(())
  }

  fn render_footnote_reference(
    &mut self,
    node: &'a Node,
    name: &str,
    ref_num: u32,
  ) -> ConvertResult<()> {
    let suffix = &self.opts.anchor_suffix;

    if let Some(Hook::Footnote(hook)) = self.footnote_hook.clone() {
      let position = Self::position(node);
      let ctx = FootnoteContext {
        name: name.to_string(),
        ref_num,
        anchor_suffix: suffix.clone(),
        page_id: self.opts.page_id.clone(),
      };
      let mut out = String::new();
      hook
        .render_reference(&mut out, &ctx)
        .map_err(|source| ConvertError::Hook { source, position })?;
      self.state.buf.push_str(&out);
      return Ok(());
    }

    let name = html_escape::encode_double_quoted_attribute(name).to_string();
    self.state.buf.push_str("<sup id=\"fnref:");
    self.state.buf.push_str(&name);
    self.state.buf.push_str(suffix);
    self.state.buf.push_str("\"><a href=\"#fn:");
    self.state.buf.push_str(&name);
    self.state.buf.push_str(suffix);
    self.state.buf.push_str("\" class=\"footnote-ref\">");
    self.state.buf.push_str(&ref_num.to_string());
    self.state.buf.push_str("</a></sup>");
    Ok(())
  }

  /// Emit the end-of-document footnote section from the definitions
  /// collected during the main pass.
  fn render_footnote_section(&mut self) -> ConvertResult<()> {
    if self.footnotes.is_empty() {
      return Ok(());
    }
    let suffix = self.opts.anchor_suffix.clone();

    self.state.push_position();
    let definitions = std::mem::take(&mut self.footnotes);
    for definition in definitions {
      let NodeData::FootnoteDefinition { name } = &definition.data else {
        continue;
      };
      let name = html_escape::encode_double_quoted_attribute(name).to_string();

      self.state.buf.push_str("<li id=\"fn:");
      self.state.buf.push_str(&name);
      self.state.buf.push_str(&suffix);
      self.state.buf.push_str("\">");

      self.state.push_position();
      self.render_children(definition)?;
      let mut content = self.state.pop_position();
      append_backref(&mut content, &name, &suffix);
      self.state.buf.push_str(&content);

      self.state.buf.push_str("</li>\n");
    }
    let inner = self.state.pop_position();

    if let Some(Hook::Footnote(hook)) = self.footnote_list_hook.clone() {
      let ctx = FootnoteListContext {
        inner,
        anchor_suffix: suffix,
        page_id: self.opts.page_id.clone(),
      };
      let mut out = String::new();
      hook.render_list(&mut out, &ctx).map_err(|source| {
        ConvertError::Hook {
          source,
          position: Position::new("", 0, 0),
        }
      })?;
      self.state.buf.push_str(&out);
      return Ok(());
    }

    self.state.buf.push_str("<section class=\"footnotes\">\n");
    self.state.buf.push_str(if self.opts.config.renderer.xhtml {
      "<hr />\n"
    } else {
      "<hr>\n"
    });
    self.state.buf.push_str("<ol>\n");
    self.state.buf.push_str(&inner);
    self.state.buf.push_str("</ol>\n</section>\n");
    Ok(())
  }
}

/// Back-reference link from a footnote definition to its call site. Placed
/// inside the closing paragraph only when the definition actually ends with
/// one; a definition ending in a code block or list gets the link appended
/// after it instead.
fn append_backref(content: &mut String, name: &str, suffix: &str) {
  let backref = format!(
    "&#160;<a href=\"#fnref:{name}{suffix}\" \
     class=\"footnote-backref\">\u{21a9}\u{fe0e}</a>"
  );
  let trimmed = content.trim_end_matches('\n');
  if trimmed.ends_with("</p>") {
    content.insert_str(trimmed.len() - "</p>".len(), &backref);
  } else {
    content.push_str(&backref);
  }
}

/// Lowercased alert name when the rendered blockquote starts with a GitHub
/// alert marker.
fn classify_alert(inner: &str) -> Option<String> {
  ALERT_RE
    .captures(inner)
    .and_then(|captures| captures.get(1))
    .map(|name| name.as_str().to_lowercase())
}

/// Drop the alert marker line and re-open the paragraph.
fn strip_alert_marker(inner: &str) -> String {
  match inner.find('\n') {
    Some(newline) => format!("<p>{}", &inner[newline + 1..]),
    None => inner.to_string(),
  }
}

/// Schemes that never reach the output in safe mode. `data:` images in the
/// common raster formats are allowed through.
fn dangerous_url(url: &str) -> bool {
  let lower = url.to_lowercase();
  if lower.starts_with("data:") {
    return !(lower.starts_with("data:image/gif")
      || lower.starts_with("data:image/png")
      || lower.starts_with("data:image/jpeg")
      || lower.starts_with("data:image/webp"));
  }
  lower.starts_with("javascript:")
    || lower.starts_with("vbscript:")
    || lower.starts_with("file:")
}

/// Render inline content without hooks, for table-of-contents titles.
#[must_use]
pub fn inline_html(nodes: &[Node]) -> String {
  let mut out = String::new();
  for node in nodes {
    inline_node(node, &mut out);
  }
  out
}

fn inline_node(node: &Node, out: &mut String) {
  match &node.data {
    NodeData::Text(text) => out.push_str(&html_escape::encode_text(text)),
    NodeData::Code(literal) => {
      out.push_str("<code>");
      out.push_str(&html_escape::encode_text(literal));
      out.push_str("</code>");
    },
    NodeData::SoftBreak | NodeData::LineBreak => out.push(' '),
    NodeData::Emph => wrap_inline(node, out, "<em>", "</em>"),
    NodeData::Strong => wrap_inline(node, out, "<strong>", "</strong>"),
    NodeData::Strikethrough => wrap_inline(node, out, "<del>", "</del>"),
    NodeData::Superscript => wrap_inline(node, out, "<sup>", "</sup>"),
    NodeData::Passthrough {
      inner, open, close, ..
    } => {
      out.push_str(open);
      out.push_str(inner);
      out.push_str(close);
    },
    // Raw HTML and footnote markers have no place in a ToC title.
    NodeData::HtmlInline(_) | NodeData::FootnoteReference { .. } => {},
    _ => {
      for child in &node.children {
        inline_node(child, out);
      }
    },
  }
}

fn wrap_inline(node: &Node, out: &mut String, open: &str, close: &str) {
  out.push_str(open);
  for child in &node.children {
    inline_node(child, out);
  }
  out.push_str(close);
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn alert_markers_are_classified_case_insensitively() {
    assert_eq!(
      classify_alert("<p>[!NOTE]\nBe careful</p>\n"),
      Some("note".to_string())
    );
    assert_eq!(
      classify_alert("<p>[!caution]\nHot</p>\n"),
      Some("caution".to_string())
    );
    assert_eq!(classify_alert("<p>[!BOGUS]\nNo</p>\n"), None);
    assert_eq!(classify_alert("<p>plain</p>\n"), None);
  }

  #[test]
  fn alert_marker_stripping_reopens_the_paragraph() {
    assert_eq!(
      strip_alert_marker("<p>[!NOTE]\nBe careful</p>\n"),
      "<p>Be careful</p>\n"
    );
  }

  #[test]
  fn dangerous_urls_are_detected() {
    assert!(dangerous_url("javascript:alert(1)"));
    assert!(dangerous_url("JavaScript:alert(1)"));
    assert!(dangerous_url("vbscript:x"));
    assert!(dangerous_url("file:///etc/passwd"));
    assert!(dangerous_url("data:text/html;base64,xx"));
    assert!(!dangerous_url("data:image/png;base64,xx"));
    assert!(!dangerous_url("https://example.org/"));
    assert!(!dangerous_url("/relative/path"));
  }

  #[test]
  fn backrefs_join_a_closing_paragraph_or_follow_other_blocks() {
    let mut para = "<p>the note</p>\n".to_string();
    append_backref(&mut para, "1", "");
    assert_eq!(
      para,
      "<p>the note&#160;<a href=\"#fnref:1\" \
       class=\"footnote-backref\">\u{21a9}\u{fe0e}</a></p>\n"
    );

    // A definition ending in a code block keeps its earlier paragraph
    // intact; the link goes after the final block.
    let mut mixed = "<p>intro</p>\n<pre><code>x\n</code></pre>\n".to_string();
    append_backref(&mut mixed, "1", "");
    assert!(mixed.ends_with("</a>"), "backref should be appended: {mixed}");
    assert!(
      mixed.contains("<p>intro</p>"),
      "paragraph should be untouched: {mixed}"
    );
  }

  #[test]
  fn inline_html_flattens_links_and_escapes_text() {
    use crate::ast::Node;

    let heading = Node::with_children(
      NodeData::Heading { level: 2 },
      vec![
        Node::new(NodeData::Text("a < b ".into())),
        Node::with_children(
          NodeData::Link {
            destination: "https://example.org".into(),
            title:       String::new(),
          },
          vec![Node::new(NodeData::Text("link".into()))],
        ),
      ],
    );
    assert_eq!(inline_html(&heading.children), "a &lt; b link");
  }
}
