//! Document tree used by the transform passes and the renderer.
//!
//! Comrak owns parsing only. Immediately after parsing, the arena-allocated
//! comrak tree is lowered into this owned representation so every later stage
//! works against a closed set of node kinds with attributes and source
//! positions attached. Comrak node payloads the converter has no use for
//! (fence offsets, list padding) are dropped during lowering.

use comrak::nodes::{
  AstNode,
  ListType,
  NodeValue,
  TableAlignment,
};

use crate::{attributes::AttributesHolder, error::Position};

/// Horizontal alignment of a table column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Alignment {
  #[default]
  None,
  Left,
  Center,
  Right,
}

impl Alignment {
  /// The `text-align` style value, or `None` for default alignment.
  #[must_use]
  pub fn style(self) -> Option<&'static str> {
    match self {
      Self::None => None,
      Self::Left => Some("left"),
      Self::Center => Some("center"),
      Self::Right => Some("right"),
    }
  }
}

impl From<TableAlignment> for Alignment {
  fn from(value: TableAlignment) -> Self {
    match value {
      TableAlignment::None => Self::None,
      TableAlignment::Left => Self::Left,
      TableAlignment::Center => Self::Center,
      TableAlignment::Right => Self::Right,
    }
  }
}

/// Node payload. One variant per supported element, nothing open-ended.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
  Document,
  Paragraph,
  Heading {
    level: u8,
  },
  Text(String),
  SoftBreak,
  LineBreak,
  Emph,
  Strong,
  Strikethrough,
  Superscript,
  Code(String),
  /// Fenced or indented code block. `language` holds the raw info string
  /// right after lowering; the code-block pass splits it into the language
  /// name and highlight attributes.
  CodeBlock {
    language: String,
    literal:  String,
    ordinal:  usize,
    fenced:   bool,
  },
  HtmlInline(String),
  HtmlBlock(String),
  Link {
    destination: String,
    title:       String,
  },
  /// `ordinal` and `block` are zero/false until the image pass runs.
  Image {
    destination: String,
    title:       String,
    ordinal:     usize,
    block:       bool,
  },
  Blockquote,
  List {
    ordered: bool,
    start:   usize,
    tight:   bool,
  },
  Item,
  TaskItem {
    checked: bool,
  },
  ThematicBreak,
  Table {
    alignments: Vec<Alignment>,
  },
  TableRow {
    header: bool,
  },
  TableCell,
  FootnoteDefinition {
    name: String,
  },
  FootnoteReference {
    name:    String,
    ref_num: u32,
  },
  /// Synthesized container for the end-of-document footnote section. Never
  /// produced by lowering.
  FootnoteList,
  DefinitionList,
  DefinitionItem,
  DefinitionTerm,
  DefinitionDetails,
  /// Raw span between configured passthrough delimiters. Never produced by
  /// lowering; the passthrough pass splits these out of text and paragraphs.
  Passthrough {
    inline: bool,
    inner:  String,
    open:   String,
    close:  String,
  },
}

/// Fieldless discriminant of [`NodeData`], usable as a map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
  Document,
  Paragraph,
  Heading,
  Text,
  SoftBreak,
  LineBreak,
  Emph,
  Strong,
  Strikethrough,
  Superscript,
  Code,
  CodeBlock,
  HtmlInline,
  HtmlBlock,
  Link,
  Image,
  Blockquote,
  List,
  Item,
  TaskItem,
  ThematicBreak,
  Table,
  TableRow,
  TableCell,
  FootnoteDefinition,
  FootnoteReference,
  FootnoteList,
  DefinitionList,
  DefinitionItem,
  DefinitionTerm,
  DefinitionDetails,
  Passthrough,
}

impl NodeData {
  #[must_use]
  pub fn kind(&self) -> NodeKind {
    match self {
      Self::Document => NodeKind::Document,
      Self::Paragraph => NodeKind::Paragraph,
      Self::Heading { .. } => NodeKind::Heading,
      Self::Text(_) => NodeKind::Text,
      Self::SoftBreak => NodeKind::SoftBreak,
      Self::LineBreak => NodeKind::LineBreak,
      Self::Emph => NodeKind::Emph,
      Self::Strong => NodeKind::Strong,
      Self::Strikethrough => NodeKind::Strikethrough,
      Self::Superscript => NodeKind::Superscript,
      Self::Code(_) => NodeKind::Code,
      Self::CodeBlock { .. } => NodeKind::CodeBlock,
      Self::HtmlInline(_) => NodeKind::HtmlInline,
      Self::HtmlBlock(_) => NodeKind::HtmlBlock,
      Self::Link { .. } => NodeKind::Link,
      Self::Image { .. } => NodeKind::Image,
      Self::Blockquote => NodeKind::Blockquote,
      Self::List { .. } => NodeKind::List,
      Self::Item => NodeKind::Item,
      Self::TaskItem { .. } => NodeKind::TaskItem,
      Self::ThematicBreak => NodeKind::ThematicBreak,
      Self::Table { .. } => NodeKind::Table,
      Self::TableRow { .. } => NodeKind::TableRow,
      Self::TableCell => NodeKind::TableCell,
      Self::FootnoteDefinition { .. } => NodeKind::FootnoteDefinition,
      Self::FootnoteReference { .. } => NodeKind::FootnoteReference,
      Self::FootnoteList => NodeKind::FootnoteList,
      Self::DefinitionList => NodeKind::DefinitionList,
      Self::DefinitionItem => NodeKind::DefinitionItem,
      Self::DefinitionTerm => NodeKind::DefinitionTerm,
      Self::DefinitionDetails => NodeKind::DefinitionDetails,
      Self::Passthrough { .. } => NodeKind::Passthrough,
    }
  }
}

/// One node of the document tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
  pub data:       NodeData,
  pub children:   Vec<Node>,
  pub attributes: AttributesHolder,

  /// Start of the node in the source document, when known.
  pub position: Option<Position>,

  /// Last source line covered by the node, for adjacency checks between
  /// block siblings. Zero when unknown.
  pub end_line: usize,
}

impl Node {
  #[must_use]
  pub fn new(data: NodeData) -> Self {
    Self {
      data,
      children: Vec::new(),
      attributes: AttributesHolder::default(),
      position: None,
      end_line: 0,
    }
  }

  #[must_use]
  pub fn with_children(data: NodeData, children: Vec<Node>) -> Self {
    Self {
      children,
      ..Self::new(data)
    }
  }

  #[must_use]
  pub fn kind(&self) -> NodeKind {
    self.data.kind()
  }

  /// Plain-text content of the subtree, used for anchor generation.
  #[must_use]
  pub fn text_content(&self) -> String {
    let mut out = String::new();
    self.collect_text(&mut out);
    out
  }

  fn collect_text(&self, out: &mut String) {
    match &self.data {
      NodeData::Text(text) | NodeData::Code(text) => out.push_str(text),
      NodeData::SoftBreak | NodeData::LineBreak => out.push(' '),
      _ => {},
    }
    for child in &self.children {
      child.collect_text(out);
    }
  }
}

/// Lower a parsed comrak tree into the owned document tree.
///
/// The returned node is always a [`NodeData::Document`]. Comrak nodes with no
/// counterpart here (front matter, math, wiki links from extensions this
/// converter does not enable) are dissolved: their children are spliced into
/// the parent.
#[must_use]
pub fn lower_document<'a>(root: &'a AstNode<'a>, filename: &str) -> Node {
  let mut doc = Node::new(NodeData::Document);
  doc.children = lower_children(root, filename);
  doc
}

fn lower_children<'a>(parent: &'a AstNode<'a>, filename: &str) -> Vec<Node> {
  let mut out = Vec::new();
  for child in parent.children() {
    out.extend(lower_node(child, filename));
  }
  out
}

fn lower_node<'a>(node: &'a AstNode<'a>, filename: &str) -> Vec<Node> {
  let data = node.data.borrow();
  let sourcepos = data.sourcepos;

  let lowered = match &data.value {
    NodeValue::Paragraph => Some(NodeData::Paragraph),
    NodeValue::Heading(heading) => Some(NodeData::Heading {
      level: heading.level,
    }),
    NodeValue::Text(text) => Some(NodeData::Text(text.to_string())),
    NodeValue::SoftBreak => Some(NodeData::SoftBreak),
    NodeValue::LineBreak => Some(NodeData::LineBreak),
    NodeValue::Emph => Some(NodeData::Emph),
    NodeValue::Strong => Some(NodeData::Strong),
    NodeValue::Strikethrough => Some(NodeData::Strikethrough),
    NodeValue::Superscript => Some(NodeData::Superscript),
    NodeValue::Code(code) => Some(NodeData::Code(code.literal.clone())),
    NodeValue::CodeBlock(block) => Some(NodeData::CodeBlock {
      language: block.info.clone(),
      literal:  block.literal.clone(),
      ordinal:  0,
      fenced:   block.fenced,
    }),
    NodeValue::HtmlInline(html) => Some(NodeData::HtmlInline(html.clone())),
    NodeValue::HtmlBlock(block) => {
      Some(NodeData::HtmlBlock(block.literal.clone()))
    },
    NodeValue::Link(link) => Some(NodeData::Link {
      destination: link.url.clone(),
      title:       link.title.clone(),
    }),
    NodeValue::Image(link) => Some(NodeData::Image {
      destination: link.url.clone(),
      title:       link.title.clone(),
      ordinal:     0,
      block:       false,
    }),
    NodeValue::BlockQuote => Some(NodeData::Blockquote),
    NodeValue::List(list) => Some(NodeData::List {
      ordered: list.list_type == ListType::Ordered,
      start:   list.start,
      tight:   list.tight,
    }),
    NodeValue::Item(_) => Some(NodeData::Item),
    NodeValue::TaskItem(item) => Some(NodeData::TaskItem {
      checked: item.symbol.is_some(),
    }),
    NodeValue::ThematicBreak => Some(NodeData::ThematicBreak),
    NodeValue::Table(table) => Some(NodeData::Table {
      alignments: table.alignments.iter().map(|a| (*a).into()).collect(),
    }),
    NodeValue::TableRow(header) => Some(NodeData::TableRow {
      header: *header,
    }),
    NodeValue::TableCell => Some(NodeData::TableCell),
    NodeValue::FootnoteDefinition(def) => Some(NodeData::FootnoteDefinition {
      name: def.name.clone(),
    }),
    NodeValue::FootnoteReference(footnote) => {
      Some(NodeData::FootnoteReference {
        name:    footnote.name.clone(),
        ref_num: footnote.ref_num,
      })
    },
    NodeValue::DescriptionList => Some(NodeData::DefinitionList),
    NodeValue::DescriptionItem(_) => Some(NodeData::DefinitionItem),
    NodeValue::DescriptionTerm => Some(NodeData::DefinitionTerm),
    NodeValue::DescriptionDetails => Some(NodeData::DefinitionDetails),
    NodeValue::Document => Some(NodeData::Document),
    _ => None,
  };

  let Some(lowered) = lowered else {
    drop(data);
    return lower_children(node, filename);
  };
  drop(data);

  let mut out = Node::new(lowered);
  out.position = Some(Position::new(
    filename,
    sourcepos.start.line,
    sourcepos.start.column,
  ));
  out.end_line = sourcepos.end.line;
  out.children = lower_children(node, filename);
  vec![out]
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

  fn lower(markdown: &str) -> Node {
    let arena = Arena::new();
    let mut options = Options::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.tasklist = true;
    let root = parse_document(&arena, markdown, &options);
    lower_document(root, "test.md")
  }

  #[test]
  fn lowers_headings_with_positions() {
    let doc = lower("# One\n\ntext\n\n## Two\n");
    assert_eq!(doc.kind(), NodeKind::Document);
    assert_eq!(doc.children.len(), 3);

    assert_eq!(doc.children[0].data, NodeData::Heading { level: 1 });
    let pos = doc.children[0].position.as_ref().unwrap();
    assert_eq!(pos.line, 1);
    assert_eq!(pos.filename, "test.md");

    assert_eq!(doc.children[2].data, NodeData::Heading { level: 2 });
    assert_eq!(doc.children[2].position.as_ref().unwrap().line, 5);
  }

  #[test]
  fn lowers_tables_with_alignments() {
    let doc = lower("| a | b | c |\n|:--|:-:|--:|\n| 1 | 2 | 3 |\n");
    let NodeData::Table { alignments } = &doc.children[0].data else {
      panic!("expected table, got {:?}", doc.children[0].data);
    };
    assert_eq!(
      alignments,
      &vec![Alignment::Left, Alignment::Center, Alignment::Right]
    );
    assert_eq!(
      doc.children[0].children[0].data,
      NodeData::TableRow { header: true }
    );
  }

  #[test]
  fn text_content_flattens_inline_markup() {
    let doc = lower("## Hello *world* with `code`\n");
    assert_eq!(doc.children[0].text_content(), "Hello world with code");
  }

  #[test]
  fn paragraph_end_line_tracks_multiline_blocks() {
    let doc = lower("one\ntwo\nthree\n");
    assert_eq!(doc.children[0].position.as_ref().unwrap().line, 1);
    assert_eq!(doc.children[0].end_line, 3);
  }

  #[test]
  fn lowers_definition_lists() {
    let arena = Arena::new();
    let mut options = Options::default();
    options.extension.description_lists = true;
    let root = parse_document(&arena, "term\n\n: details\n", &options);
    let doc = lower_document(root, "test.md");

    let list = &doc.children[0];
    assert_eq!(list.kind(), NodeKind::DefinitionList);
    let item = &list.children[0];
    assert_eq!(item.kind(), NodeKind::DefinitionItem);
    assert_eq!(item.children[0].kind(), NodeKind::DefinitionTerm);
    assert_eq!(item.children[1].kind(), NodeKind::DefinitionDetails);
  }

  #[test]
  fn task_items_record_checked_state() {
    let doc = lower("- [x] done\n- [ ] open\n");
    let list = &doc.children[0];
    assert_eq!(list.children[0].data, NodeData::TaskItem { checked: true });
    assert_eq!(list.children[1].data, NodeData::TaskItem { checked: false });
  }
}
