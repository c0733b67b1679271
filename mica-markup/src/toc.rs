//! Table-of-contents construction and rendering.
//!
//! The builder receives a flat, ordered stream of headings addressed by a
//! `(row, level)` coordinate pair and grows a possibly ragged tree from it.
//! Headings may jump levels (H2 straight to H5); the missing ancestors are
//! synthesized as empty placeholder entries that render as anchor-less list
//! items, never dropped.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One node of the table-of-contents tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TocEntry {
  /// Anchor ID the entry links to. Empty for placeholders.
  pub id:       String,
  /// Rendered inline HTML of the heading text. Empty for placeholders.
  pub title:    String,
  /// Heading level (1-6). Zero for placeholders.
  pub level:    usize,
  /// Nested child entries.
  pub children: Vec<TocEntry>,
}

impl TocEntry {
  /// True when neither an ID nor a title is set.
  #[must_use]
  pub fn is_zero(&self) -> bool {
    self.id.is_empty() && self.title.is_empty()
  }

  fn walk<'a>(&'a self, f: &mut impl FnMut(&'a TocEntry)) {
    f(self);
    for child in &self.children {
      child.walk(f);
    }
  }
}

/// Incremental ToC builder, fed in document order.
#[derive(Debug, Default)]
pub struct TocBuilder {
  entries: Vec<TocEntry>,
}

impl TocBuilder {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Insert `entry` at the given `(row, level)` coordinate.
  ///
  /// Rows beyond the current top-level length are padded with placeholders.
  /// `level == 0` sets the row entry directly; otherwise we descend
  /// `level - 1` steps, appending a placeholder child at each step where
  /// none exists yet, and append the entry as the final child.
  pub fn add_at(&mut self, entry: TocEntry, row: usize, level: usize) {
    while self.entries.len() <= row {
      self.entries.push(TocEntry::default());
    }

    if level == 0 {
      self.entries[row] = entry;
      return;
    }

    let mut current = &mut self.entries[row];
    for _ in 1..level {
      if current.children.is_empty() {
        current.children.push(TocEntry::default());
      }
      let last = current.children.len() - 1;
      current = &mut current.children[last];
    }
    current.children.push(entry);
  }

  /// Whether any heading has been added.
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Finalize into [`Fragments`], collecting the identifier index.
  #[must_use]
  pub fn build(self) -> Fragments {
    let mut identifiers = Vec::new();
    let mut map = HashMap::new();
    for entry in &self.entries {
      entry.walk(&mut |e| {
        if !e.id.is_empty() {
          identifiers.push(e.id.clone());
          // With duplicate IDs the last one wins.
          map.insert(e.id.clone(), e.clone());
        }
      });
    }
    identifiers.sort();

    Fragments {
      entries: self.entries,
      identifiers,
      map,
    }
  }
}

/// The finished table of contents for one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragments {
  /// Top-level entries, one per row.
  pub entries: Vec<TocEntry>,

  /// All identifiers in the ToC, sorted. Duplicates are kept so callers can
  /// detect ID collisions across included content.
  pub identifiers: Vec<String>,

  map: HashMap<String, TocEntry>,
}

impl Fragments {
  /// Look up an entry by anchor ID.
  #[must_use]
  pub fn get(&self, id: &str) -> Option<&TocEntry> {
    self.map.get(id)
  }

  /// All entries matching the predicate, in document order.
  #[must_use]
  pub fn filter_by(&self, predicate: impl Fn(&TocEntry) -> bool) -> Vec<&TocEntry> {
    let mut out = Vec::new();
    for entry in &self.entries {
      entry.walk(&mut |e| {
        if predicate(e) {
          out.push(e);
        }
      });
    }
    out
  }

  /// Render to nested list markup wrapped in `<nav id="TableOfContents">`.
  ///
  /// `start_level` and `end_level` are inclusive heading-depth bounds.
  /// Entries shallower than `start_level` are skipped transparently (their
  /// children are promoted); entries deeper than `end_level` are pruned.
  /// An `end_level` of `-1` means unbounded depth.
  #[must_use]
  pub fn to_html(&self, start_level: i32, end_level: i32, ordered: bool) -> String {
    let mut w = TocWriter {
      out: String::new(),
      start_level,
      end_level,
      ordered,
    };
    w.out.push_str("<nav id=\"TableOfContents\">");
    w.write_list(1, &self.entries);
    w.out.push_str("</nav>");
    w.out
  }
}

struct TocWriter {
  out:         String,
  start_level: i32,
  end_level:   i32,
  ordered:     bool,
}

impl TocWriter {
  fn write_list(&mut self, level: i32, entries: &[TocEntry]) {
    if level < self.start_level {
      for entry in entries {
        self.write_list(level + 1, &entry.children);
      }
      return;
    }

    if self.end_level != -1 && level > self.end_level {
      return;
    }

    if entries.is_empty() {
      return;
    }

    self.out.push_str(if self.ordered { "<ol>" } else { "<ul>" });
    for entry in entries {
      self.write_entry(level, entry);
    }
    self.out.push_str(if self.ordered { "</ol>" } else { "</ul>" });
  }

  fn write_entry(&mut self, level: i32, entry: &TocEntry) {
    self.out.push_str("<li>");
    if !entry.is_zero() {
      self.out.push_str("<a href=\"#");
      self.out.push_str(&entry.id);
      self.out.push_str("\">");
      self.out.push_str(&entry.title);
      self.out.push_str("</a>");
    }
    self.write_list(level + 1, &entry.children);
    self.out.push_str("</li>");
  }
}

/// Table-of-contents configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct TocConfig {
  /// Heading start level to include, starting at h1 (inclusive).
  pub start_level: i32,

  /// Heading end level, inclusive. `-1` includes everything.
  pub end_level: i32,

  /// Produce an ordered list instead of an unordered one.
  pub ordered: bool,
}

impl Default for TocConfig {
  fn default() -> Self {
    Self {
      start_level: 2,
      end_level:   3,
      ordered:     false,
    }
  }
}
