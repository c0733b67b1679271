//! Ordered transform passes over the document tree.
//!
//! Runs after lowering and before rendering, in a fixed order:
//!
//! 1. attribute merging (heading `{...}` suffixes, standalone attribute
//!    block paragraphs)
//! 2. image classification (ordinals, standalone-image promotion)
//! 3. code-block isolation (info-string parsing, highlighter-vs-custom
//!    attribute ownership)
//! 4. passthrough isolation (raw spans between configured delimiters)
//! 5. anchor assignment and table-of-contents accumulation
//!
//! The order matters: anchors must see explicit `id` attributes from pass 1,
//! and the ToC title is rendered from the heading subtree after passes 1-4
//! have cleaned it up.

use std::sync::LazyLock;

use log::error;
use regex::Regex;

use crate::{
  anchors::{IdOwner, IdRegistry},
  ast::{Node, NodeData, NodeKind},
  attributes::{AttributeValue, AttributesHolder, AttributesOwner, parse_attribute_list},
  config::{AttributeConfig, MarkupConfig},
  error::{ConvertError, ConvertResult, Position},
  highlight::Highlighter,
  render,
  toc::{Fragments, TocBuilder, TocEntry},
};

/// Trailing `{...}` group on a heading line.
static TITLE_ATTRIBUTES_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"\{[^{}]*\}\s*$").unwrap_or_else(|e| {
    error!("Failed to compile TITLE_ATTRIBUTES_RE regex: {e}");
    never_matching_regex()
  })
});

/// A paragraph that is nothing but an attribute list.
static BLOCK_ATTRIBUTES_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^\{[^{}]*\}\s*$").unwrap_or_else(|e| {
    error!("Failed to compile BLOCK_ATTRIBUTES_RE regex: {e}");
    never_matching_regex()
  })
});

/// Fallback for a regex that failed to compile. `[^\s\S]` asserts an
/// impossible class, so it never matches any input.
pub(crate) fn never_matching_regex() -> Regex {
  #[allow(clippy::expect_used, reason = "The pattern is a literal")]
  Regex::new(r"[^\s\S]").expect("Failed to compile never-matching regex")
}

/// State for one `parse` call. Owns the ID registry and the
/// table-of-contents builder, tracks which virtual page is being parsed when
/// content inclusion re-enters the converter, and records whether a table of
/// contents was requested. Created per parse and never shared across
/// documents; inclusion pushes the included document's page ID onto the same
/// context so generated anchors stay unique across the composite page.
pub struct ParserContext {
  ids:   IdRegistry,
  toc:   TocBuilder,
  row:   i64,
  pages: Vec<String>,
  auto_heading_id: bool,
  auto_definition_term_id: bool,
  render_toc: bool,
}

impl ParserContext {
  #[must_use]
  pub fn new(config: &MarkupConfig, render_toc: bool) -> Self {
    Self {
      ids: IdRegistry::new(config.parser.auto_id_kind()),
      toc: TocBuilder::new(),
      row: -1,
      pages: Vec::new(),
      auto_heading_id: config.parser.auto_heading_id,
      auto_definition_term_id: config.parser.auto_definition_term_id,
      render_toc,
    }
  }

  /// Whether a table of contents was requested for this parse.
  #[must_use]
  pub fn toc_requested(&self) -> bool {
    self.render_toc
  }

  /// Enter a virtual page before transforming an included document.
  pub fn push_page(&mut self, id: impl Into<String>) {
    self.pages.push(id.into());
  }

  /// Leave the innermost virtual page.
  pub fn pop_page(&mut self) -> Option<String> {
    self.pages.pop()
  }

  /// The page currently being transformed, when one was entered.
  #[must_use]
  pub fn current_page(&self) -> Option<&str> {
    self.pages.last().map(String::as_str)
  }

  /// Consume the context, yielding the accumulated table of contents.
  #[must_use]
  pub fn into_fragments(self) -> Fragments {
    self.toc.build()
  }
}

/// Run all transform passes over `doc`, accumulating anchors and the table
/// of contents into `ctx`.
///
/// # Errors
///
/// Fails on a malformed attribute list in a fenced code block info string.
/// Attribute lists elsewhere degrade to literal text instead.
pub fn run_transforms(
  doc: &mut Node,
  config: &MarkupConfig,
  highlighter: Option<&Highlighter>,
  ctx: &mut ParserContext,
) -> ConvertResult<()> {
  if config.parser.attribute.title || config.parser.attribute.block {
    merge_attributes(doc, &config.parser.attribute);
  }

  let mut image_ordinal = 0;
  classify_images(
    doc,
    config.parser.wrap_standalone_image_within_paragraph,
    &mut image_ordinal,
  );

  let mut code_ordinal = 0;
  isolate_code_blocks(doc, highlighter, &mut code_ordinal)?;

  if config.extensions.passthrough.enable {
    let delimiters = &config.extensions.passthrough.delimiters;
    let inline = prepare_delimiters(&delimiters.inline);
    let block = prepare_delimiters(&delimiters.block);
    isolate_passthrough(doc, &inline, &block);
  }

  assign_anchors(doc, ctx);

  Ok(())
}

// Pass 1: attribute merging.

fn merge_attributes(node: &mut Node, config: &AttributeConfig) {
  if config.title && node.kind() == NodeKind::Heading {
    strip_title_attributes(node);
  }

  // An attribute line directly below a paragraph is absorbed into the
  // paragraph by lazy continuation, so it shows up as the paragraph's
  // last line rather than as a sibling.
  if config.block && node.kind() == NodeKind::Paragraph {
    strip_paragraph_attributes(node);
  }

  for child in &mut node.children {
    merge_attributes(child, config);
  }

  // Merge sibling attribute paragraphs after the children are done, so a
  // heading's own `{...}` suffix is already in place and wins over an
  // attribute line below it.
  if config.block {
    merge_block_attributes(&mut node.children);
  }
}

/// Pull a final attribute-list line out of a multi-line paragraph.
fn strip_paragraph_attributes(paragraph: &mut Node) {
  let n = paragraph.children.len();
  if n < 3 {
    return;
  }
  if !matches!(paragraph.children[n - 2].data, NodeData::SoftBreak) {
    return;
  }
  let NodeData::Text(text) = &paragraph.children[n - 1].data else {
    return;
  };
  if !BLOCK_ATTRIBUTES_RE.is_match(text) {
    return;
  }
  let Ok(attrs) = parse_attribute_list(text.trim()) else {
    return;
  };

  paragraph.children.truncate(n - 2);
  let holder = AttributesHolder::new(attrs, AttributesOwner::General);
  if paragraph.attributes.is_empty() {
    paragraph.attributes = holder;
  } else {
    paragraph.attributes.merge_missing(&holder);
  }
}

/// Pull a trailing `{...}` group off the heading's last text child. A group
/// that fails to parse stays in the text untouched.
fn strip_title_attributes(heading: &mut Node) {
  let Some(last) = heading.children.last_mut() else {
    return;
  };
  let NodeData::Text(text) = &last.data else {
    return;
  };
  let Some(found) = TITLE_ATTRIBUTES_RE.find(text) else {
    return;
  };

  let Ok(attrs) = parse_attribute_list(found.as_str().trim()) else {
    return;
  };

  let remainder = text[..found.start()].trim_end().to_string();
  if remainder.is_empty() {
    heading.children.pop();
  } else {
    last.data = NodeData::Text(remainder);
  }
  heading.attributes = AttributesHolder::new(attrs, AttributesOwner::General);
}

/// Fold standalone attribute paragraphs into the directly preceding block.
/// The paragraph must start on the line right after its target. A recognized
/// attribute list never renders: with no eligible target it is dropped from
/// the tree. Only a list that fails to parse stays as literal text.
fn merge_block_attributes(children: &mut Vec<Node>) {
  let mut i = children.len();
  while i > 0 {
    i -= 1;

    let Some(text) = attribute_paragraph_text(&children[i]) else {
      continue;
    };
    let Ok(attrs) = parse_attribute_list(text.trim()) else {
      continue;
    };

    let eligible = i > 0
      && attachable(&children[i - 1])
      && match children[i].position.as_ref() {
        Some(pos) => children[i - 1].end_line + 1 == pos.line,
        None => false,
      };

    if eligible {
      let holder = AttributesHolder::new(attrs, AttributesOwner::General);
      let target = &mut children[i - 1];
      if target.attributes.is_empty() {
        target.attributes = holder;
      } else {
        // Attributes set on the element line itself win.
        target.attributes.merge_missing(&holder);
      }
    }
    children.remove(i);
  }
}

fn attribute_paragraph_text(node: &Node) -> Option<&str> {
  if node.kind() != NodeKind::Paragraph || node.children.len() != 1 {
    return None;
  }
  match &node.children[0].data {
    NodeData::Text(text) if BLOCK_ATTRIBUTES_RE.is_match(text) => Some(text),
    _ => None,
  }
}

fn attachable(node: &Node) -> bool {
  match &node.data {
    // Fenced code blocks take attributes through the info string instead.
    NodeData::CodeBlock { fenced, .. } => !*fenced,
    NodeData::Paragraph
    | NodeData::Heading { .. }
    | NodeData::List { .. }
    | NodeData::Blockquote
    | NodeData::Table { .. }
    | NodeData::Image { .. }
    | NodeData::DefinitionList => true,
    _ => false,
  }
}

// Pass 2: image classification.

fn classify_images(node: &mut Node, wrap_standalone: bool, ordinal: &mut usize) {
  if !wrap_standalone
    && node.kind() == NodeKind::Paragraph
    && node.children.len() == 1
    && node.children[0].kind() == NodeKind::Image
  {
    let mut image = match node.children.pop() {
      Some(image) => image,
      None => return,
    };
    // The image's own attributes win over ones attached to the paragraph.
    image.attributes.merge_missing(&node.attributes);
    if let NodeData::Image { block, .. } = &mut image.data {
      *block = true;
    }
    *node = image;
  }

  if let NodeData::Image { ordinal: ord, .. } = &mut node.data {
    *ord = *ordinal;
    *ordinal += 1;
  }

  for child in &mut node.children {
    classify_images(child, wrap_standalone, ordinal);
  }
}

// Pass 3: code-block isolation.

fn isolate_code_blocks(
  node: &mut Node,
  highlighter: Option<&Highlighter>,
  ordinal: &mut usize,
) -> ConvertResult<()> {
  if let NodeData::CodeBlock {
    language,
    ordinal: ord,
    fenced,
    ..
  } = &mut node.data
  {
    let info = std::mem::take(language);
    let (lang, attrs_src) = split_info_string(&info);

    let attrs = if attrs_src.is_empty() {
      Vec::new()
    } else {
      parse_attribute_list(attrs_src).map_err(|reason| {
        ConvertError::AttributeParse {
          reason,
          position: node.position.clone().unwrap_or_else(|| {
            Position::new("", 0, 0)
          }),
        }
      })?
    };

    let owner = if *fenced
      && !lang.is_empty()
      && highlighter.is_some_and(|h| h.is_known(lang))
    {
      AttributesOwner::CodeBlockHighlight
    } else {
      AttributesOwner::CodeBlockCustom
    };

    *language = lang.to_string();
    *ord = *ordinal;
    *ordinal += 1;
    node.attributes = AttributesHolder::new(attrs, owner);
  }

  for child in &mut node.children {
    isolate_code_blocks(child, highlighter, ordinal)?;
  }
  Ok(())
}

/// Split a fence info string into the language name and the `{...}` group.
/// Words after the language that are not an attribute list are ignored.
fn split_info_string(info: &str) -> (&str, &str) {
  let info = info.trim();
  let split = info
    .find(|c: char| c.is_whitespace() || c == '{')
    .unwrap_or(info.len());
  let (lang, rest) = info.split_at(split);
  let rest = rest.trim();
  if rest.starts_with('{') {
    (lang, rest)
  } else {
    (lang, "")
  }
}

// Pass 4: passthrough isolation.

/// A delimiter pair ready for matching against lowered text.
///
/// Backslash escapes in the configured delimiters (`\(`, `\]`) are resolved
/// by the Markdown parser before this pass sees the text, so matching uses
/// the escape-processed form while the emitted passthrough node keeps the
/// configured form verbatim.
struct DelimiterPair {
  open:   String,
  close:  String,
  source: [String; 2],
}

fn prepare_delimiters(configured: &[[String; 2]]) -> Vec<DelimiterPair> {
  configured
    .iter()
    .map(|pair| DelimiterPair {
      open:   unescape_delimiter(&pair[0]),
      close:  unescape_delimiter(&pair[1]),
      source: pair.clone(),
    })
    .collect()
}

/// Resolve backslash escapes the way the parser does: a backslash followed
/// by ASCII punctuation yields the punctuation character.
fn unescape_delimiter(delimiter: &str) -> String {
  let mut out = String::with_capacity(delimiter.len());
  let mut chars = delimiter.chars().peekable();
  while let Some(c) = chars.next() {
    if c == '\\'
      && let Some(next) = chars.peek()
      && next.is_ascii_punctuation()
    {
      continue;
    }
    out.push(c);
  }
  out
}

fn isolate_passthrough(
  node: &mut Node,
  inline: &[DelimiterPair],
  block: &[DelimiterPair],
) {
  for child in &mut node.children {
    if !block.is_empty()
      && child.kind() == NodeKind::Paragraph
      && let Some(replacement) = block_passthrough(child, block)
    {
      *child = replacement;
      continue;
    }
    isolate_passthrough(child, inline, block);
  }

  if !inline.is_empty() {
    split_inline_passthrough(&mut node.children, inline);
  }
}

/// A paragraph made of plain text that starts with a block open delimiter
/// and ends with the matching close delimiter becomes one raw block.
fn block_passthrough(
  paragraph: &Node,
  delimiters: &[DelimiterPair],
) -> Option<Node> {
  let mut raw = String::new();
  for child in &paragraph.children {
    match &child.data {
      NodeData::Text(text) => raw.push_str(text),
      NodeData::SoftBreak | NodeData::LineBreak => raw.push('\n'),
      _ => return None,
    }
  }

  for pair in delimiters {
    if raw.len() >= pair.open.len() + pair.close.len()
      && raw.starts_with(pair.open.as_str())
      && raw.ends_with(pair.close.as_str())
    {
      let inner = raw[pair.open.len()..raw.len() - pair.close.len()].to_string();
      let mut node = Node::new(NodeData::Passthrough {
        inline: false,
        inner,
        open: pair.source[0].clone(),
        close: pair.source[1].clone(),
      });
      node.position = paragraph.position.clone();
      node.end_line = paragraph.end_line;
      return Some(node);
    }
  }
  None
}

fn split_inline_passthrough(
  children: &mut Vec<Node>,
  delimiters: &[DelimiterPair],
) {
  let mut out = Vec::with_capacity(children.len());
  for child in children.drain(..) {
    match &child.data {
      NodeData::Text(text) => match split_text(text, delimiters) {
        Some(mut pieces) => {
          for piece in &mut pieces {
            piece.position = child.position.clone();
            piece.end_line = child.end_line;
          }
          out.extend(pieces);
        },
        None => out.push(child),
      },
      _ => out.push(child),
    }
  }
  *children = out;
}

/// Split one text run around inline delimiter pairs. Returns `None` when no
/// complete delimited span is present. An opener without a matching closer
/// stays literal text.
fn split_text(text: &str, delimiters: &[DelimiterPair]) -> Option<Vec<Node>> {
  let mut pieces = Vec::new();
  let mut rest = text;

  loop {
    let mut earliest: Option<(usize, usize, &DelimiterPair)> = None;
    for pair in delimiters {
      let Some(start) = rest.find(pair.open.as_str()) else {
        continue;
      };
      let Some(end) = rest[start + pair.open.len()..].find(pair.close.as_str())
      else {
        continue;
      };
      let end = start + pair.open.len() + end;
      if earliest.is_none_or(|(s, ..)| start < s) {
        earliest = Some((start, end, pair));
      }
    }

    let Some((start, end, pair)) = earliest else {
      break;
    };

    if start > 0 {
      pieces.push(Node::new(NodeData::Text(rest[..start].to_string())));
    }
    pieces.push(Node::new(NodeData::Passthrough {
      inline: true,
      inner:  rest[start + pair.open.len()..end].to_string(),
      open:   pair.source[0].clone(),
      close:  pair.source[1].clone(),
    }));
    rest = &rest[end + pair.close.len()..];
  }

  if pieces.is_empty() {
    return None;
  }
  if !rest.is_empty() {
    pieces.push(Node::new(NodeData::Text(rest.to_string())));
  }
  Some(pieces)
}

// Pass 5: anchors and table of contents.

fn assign_anchors(node: &mut Node, state: &mut ParserContext) {
  match &node.data {
    NodeData::Heading { level } => {
      let level = usize::from(*level);
      let id = resolve_id(node, state, state.auto_heading_id, IdOwner::Heading);

      if state.render_toc {
        if level == 1 || state.row == -1 {
          state.row += 1;
        }
        let entry = TocEntry {
          id,
          title: render::inline_html(&node.children),
          level,
          children: Vec::new(),
        };
        #[allow(clippy::cast_sign_loss, reason = "row is non-negative here")]
        state.toc.add_at(entry, state.row as usize, level - 1);
      }
    },
    NodeData::DefinitionTerm => {
      resolve_id(node, state, state.auto_definition_term_id, IdOwner::Term);
    },
    _ => {},
  }

  for child in &mut node.children {
    assign_anchors(child, state);
  }
}

/// Register an explicit ID, or generate one when auto IDs are on for this
/// element kind. Returns the resolved ID, empty when there is none.
fn resolve_id(
  node: &mut Node,
  state: &mut ParserContext,
  auto: bool,
  owner: IdOwner,
) -> String {
  if let Some(id) = node.attributes.id() {
    let id = id.to_string();
    state.ids.register(&id);
    return id;
  }
  if !auto {
    return String::new();
  }
  let id = state.ids.generate(&node.text_content(), owner);
  node
    .attributes
    .set("id", AttributeValue::String(id.clone()));
  id
}

#[cfg(test)]
mod tests {
  #![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    reason = "Fine in tests"
  )]

  use comrak::{Arena, Options, parse_document};

  use super::*;
  use crate::ast::lower_document;

  fn parse(markdown: &str) -> Node {
    let arena = Arena::new();
    let mut options = Options::default();
    options.extension.table = true;
    options.extension.description_lists = true;
    let root = parse_document(&arena, markdown, &options);
    lower_document(root, "test.md")
  }

  fn config_with_block_attributes() -> MarkupConfig {
    let mut config = MarkupConfig::default();
    config.parser.attribute.block = true;
    config
  }

  fn transform(doc: &mut Node, config: &MarkupConfig) -> Fragments {
    let mut ctx = ParserContext::new(config, true);
    run_transforms(doc, config, None, &mut ctx)
      .expect("transforms should pass");
    ctx.into_fragments()
  }

  #[test]
  fn heading_attributes_are_stripped_from_the_title() {
    let mut doc = parse("## Fancy title {#fancy .wide}\n");
    transform(&mut doc, &MarkupConfig::default());

    let heading = &doc.children[0];
    assert_eq!(heading.attributes.id(), Some("fancy"));
    assert_eq!(heading.text_content(), "Fancy title");
  }

  #[test]
  fn malformed_heading_attributes_stay_literal() {
    let mut doc = parse("## Title {#}\n");
    transform(&mut doc, &MarkupConfig::default());

    let heading = &doc.children[0];
    assert!(heading.attributes.id().is_some());
    // Auto ID generated from the full literal text.
    assert_eq!(heading.text_content(), "Title {#}");
  }

  #[test]
  fn block_attributes_attach_to_the_previous_block() {
    let config = config_with_block_attributes();
    let mut doc = parse("some paragraph\n{.lead #intro}\n");
    transform(&mut doc, &config);

    assert_eq!(doc.children.len(), 1);
    assert_eq!(doc.children[0].attributes.id(), Some("intro"));
  }

  #[test]
  fn block_attributes_attach_to_a_preceding_heading() {
    let config = config_with_block_attributes();
    let mut doc = parse("## Title\n{.wide}\n");
    transform(&mut doc, &config);

    assert_eq!(doc.children.len(), 1);
    assert_eq!(
      doc.children[0].attributes.get("class"),
      Some(&AttributeValue::String("wide".into()))
    );
  }

  #[test]
  fn explicit_id_precedence() {
    let config = config_with_block_attributes();
    let mut doc = parse("## Title {#explicit}\n{id=other .x}\n");
    transform(&mut doc, &config);

    assert_eq!(doc.children.len(), 1);
    let heading = &doc.children[0];
    assert_eq!(heading.attributes.id(), Some("explicit"));
    assert_eq!(
      heading.attributes.get("class"),
      Some(&AttributeValue::String("x".into()))
    );
  }

  #[test]
  fn blank_line_detaches_a_block_attribute_paragraph() {
    let config = config_with_block_attributes();
    let mut doc = parse("some paragraph\n\n{.lead}\n");
    transform(&mut doc, &config);

    // The paragraph keeps no attributes and the list never renders.
    assert_eq!(doc.children.len(), 1);
    assert!(doc.children[0].attributes.is_empty());
    assert_eq!(doc.children[0].text_content(), "some paragraph");
  }

  #[test]
  fn leading_block_attributes_are_dropped() {
    let config = config_with_block_attributes();
    let mut doc = parse("{.lead}\n\nsome paragraph\n");
    transform(&mut doc, &config);

    assert_eq!(doc.children.len(), 1);
    assert_eq!(doc.children[0].text_content(), "some paragraph");
  }

  #[test]
  fn malformed_block_attributes_stay_literal() {
    let config = config_with_block_attributes();
    let mut doc = parse("{.lead\n\nsome paragraph\n");
    transform(&mut doc, &config);

    assert_eq!(doc.children.len(), 2);
    assert_eq!(doc.children[0].text_content(), "{.lead");
  }

  #[test]
  fn standalone_images_are_promoted_when_unwrapped() {
    let mut config = MarkupConfig::default();
    config.parser.wrap_standalone_image_within_paragraph = false;
    let mut doc = parse("![alt](a.png)\n\ntext ![inline](b.png) more\n");
    transform(&mut doc, &config);

    let NodeData::Image { block, ordinal, .. } = &doc.children[0].data else {
      panic!("expected promoted image, got {:?}", doc.children[0].data);
    };
    assert!(*block);
    assert_eq!(*ordinal, 0);

    // The inline image keeps its paragraph and gets the next ordinal.
    let inline = &doc.children[1].children[1];
    assert_eq!(
      inline.data,
      NodeData::Image {
        destination: "b.png".into(),
        title:       String::new(),
        ordinal:     1,
        block:       false,
      }
    );
  }

  #[test]
  fn standalone_image_keeps_grandparent_attributes() {
    let mut config = MarkupConfig::default();
    config.parser.wrap_standalone_image_within_paragraph = false;
    let mut doc = parse("> ![alt](a.png)\n");
    doc.children[0].attributes = AttributesHolder::new(
      parse_attribute_list("{.note}").expect("attribute list should parse"),
      AttributesOwner::General,
    );
    transform(&mut doc, &config);

    // The class stays on the blockquote; promotion only pulls attributes
    // from the wrapping paragraph, never from further up.
    let blockquote = &doc.children[0];
    assert_eq!(
      blockquote.attributes.get("class"),
      Some(&AttributeValue::String("note".into()))
    );
    let image = &blockquote.children[0];
    assert!(matches!(image.data, NodeData::Image { block: true, .. }));
    assert!(image.attributes.get("class").is_none());
  }

  #[test]
  fn code_block_info_strings_split_language_and_attributes() {
    let mut doc = parse("```rust {linenos=true}\nfn main() {}\n```\n");
    transform(&mut doc, &MarkupConfig::default());

    let NodeData::CodeBlock { language, .. } = &doc.children[0].data else {
      panic!("expected code block");
    };
    assert_eq!(language, "rust");
    // No highlighter registered, so options stay plain attributes.
    assert!(doc.children[0].attributes.get("linenos").is_some());
  }

  #[test]
  fn malformed_code_block_attributes_are_fatal() {
    let config = MarkupConfig::default();
    let mut doc = parse("```rust {linenos=\n_\n```\n");
    let mut ctx = ParserContext::new(&config, false);
    let err = run_transforms(&mut doc, &config, None, &mut ctx)
      .expect_err("should fail");
    assert!(matches!(err, ConvertError::AttributeParse { .. }));
  }

  #[test]
  fn inline_passthrough_splits_text_runs() {
    let mut config = MarkupConfig::default();
    config.extensions.passthrough.enable = true;
    config.extensions.passthrough.delimiters.inline =
      vec![["$".into(), "$".into()]];

    let mut doc = parse("before $a^2$ after\n");
    transform(&mut doc, &config);

    let paragraph = &doc.children[0];
    assert_eq!(paragraph.children.len(), 3);
    assert_eq!(
      paragraph.children[1].data,
      NodeData::Passthrough {
        inline: true,
        inner:  "a^2".into(),
        open:   "$".into(),
        close:  "$".into(),
      }
    );
  }

  #[test]
  fn escaped_delimiters_match_after_parsing() {
    let mut config = MarkupConfig::default();
    config.extensions.passthrough.enable = true;
    config.extensions.passthrough.delimiters.inline =
      vec![["\\(".into(), "\\)".into()]];

    // The parser resolves `\(` to `(` before this pass runs; the emitted
    // node still carries the configured delimiter spelling.
    let mut doc = parse("inline \\(a^2 + b^2\\) math\n");
    transform(&mut doc, &config);

    let paragraph = &doc.children[0];
    assert_eq!(paragraph.children.len(), 3);
    assert_eq!(
      paragraph.children[1].data,
      NodeData::Passthrough {
        inline: true,
        inner:  "a^2 + b^2".into(),
        open:   "\\(".into(),
        close:  "\\)".into(),
      }
    );
  }

  #[test]
  fn unterminated_inline_passthrough_stays_text() {
    let mut config = MarkupConfig::default();
    config.extensions.passthrough.enable = true;
    config.extensions.passthrough.delimiters.inline =
      vec![["$".into(), "$".into()]];

    let mut doc = parse("price is $5 today\n");
    transform(&mut doc, &config);
    assert_eq!(doc.children[0].children.len(), 1);
  }

  #[test]
  fn block_passthrough_consumes_whole_paragraphs() {
    let mut config = MarkupConfig::default();
    config.extensions.passthrough.enable = true;
    config.extensions.passthrough.delimiters.block =
      vec![["$$".into(), "$$".into()]];

    let mut doc = parse("$$\n1 + 2\n$$\n");
    transform(&mut doc, &config);

    let NodeData::Passthrough { inline, inner, .. } = &doc.children[0].data
    else {
      panic!("expected passthrough block");
    };
    assert!(!inline);
    assert_eq!(inner, "\n1 + 2\n");
  }

  #[test]
  fn duplicate_heading_titles_get_suffixed_ids() {
    let mut doc = parse("## Setup\n\n## Setup\n");
    transform(&mut doc, &MarkupConfig::default());

    assert_eq!(doc.children[0].attributes.id(), Some("setup"));
    assert_eq!(doc.children[1].attributes.id(), Some("setup-1"));
  }

  #[test]
  fn toc_rows_advance_on_level_one_headings() {
    let mut doc = parse("# A\n\n## A1\n\n# B\n\n## B1\n");
    let toc = transform(&mut doc, &MarkupConfig::default());

    assert_eq!(toc.entries.len(), 2);
    assert_eq!(toc.entries[0].id, "a");
    assert_eq!(toc.entries[0].children[0].id, "a1");
    assert_eq!(toc.entries[1].id, "b");
  }

  #[test]
  fn explicit_ids_block_later_auto_ids() {
    let mut doc = parse("## Intro {#setup}\n\n## Setup\n");
    transform(&mut doc, &MarkupConfig::default());

    assert_eq!(doc.children[0].attributes.id(), Some("setup"));
    assert_eq!(doc.children[1].attributes.id(), Some("setup-1"));
  }

  #[test]
  fn one_context_spans_included_documents() {
    let config = MarkupConfig::default();
    let mut ctx = ParserContext::new(&config, false);
    ctx.push_page("outer");

    let mut outer = parse("## Setup\n");
    run_transforms(&mut outer, &config, None, &mut ctx)
      .expect("transforms should pass");

    ctx.push_page("inner");
    assert_eq!(ctx.current_page(), Some("inner"));
    let mut inner = parse("## Setup\n");
    run_transforms(&mut inner, &config, None, &mut ctx)
      .expect("transforms should pass");
    ctx.pop_page();

    // The shared registry keeps anchors unique across the composite page.
    assert_eq!(outer.children[0].attributes.id(), Some("setup"));
    assert_eq!(inner.children[0].attributes.id(), Some("setup-1"));
    assert_eq!(ctx.current_page(), Some("outer"));
    assert!(!ctx.toc_requested());
  }
}
