//! Attribute model for AST nodes.
//!
//! Attributes come from `{...}` attribute lists in the source markup. The
//! holder keeps the ordered list plus a lazily built name/value map, and
//! splits off values that are really highlighter *options* rather than HTML
//! attributes. Any attribute whose lower-cased name starts with `on` is
//! dropped before either list is populated, so event-handler injection is
//! blocked uniformly for both the default renderers and render hooks.

use std::{
  collections::HashMap,
  fmt::Write as _,
  sync::{LazyLock, OnceLock},
};

/// Attribute names the syntax highlighter consumes as processing options
/// rather than HTML attributes, lower-cased.
static HIGHLIGHT_PROCESSING_ATTRIBUTES: LazyLock<Vec<&'static str>> =
  LazyLock::new(|| {
    vec![
      "anchorlinenos",
      "guesssyntax",
      "hl_lines",
      "hl_inline",
      "lineanchors",
      "linenos",
      "linenostart",
      "linenumbersintable",
      "noclasses",
      "nohl",
      "style",
      "tabwidth",
    ]
  });

/// Attributes with special meaning that make no sense as rendered HTML.
const ATTRIBUTE_EXCLUDES: &[&str] =
  &["hl_lines", "hl_style", "linenos", "linenostart"];

/// Classification of the node owning a set of attributes; decides whether
/// highlighter option names are reclassified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributesOwner {
  /// Headings, blockquotes, images and the like.
  General,
  /// A fenced code block whose language resolves to a known highlighter
  /// lexer; highlighter option names become options.
  CodeBlockHighlight,
  /// A fenced code block handled by a custom render hook; everything stays
  /// an attribute.
  CodeBlockCustom,
}

/// A typed attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
  String(String),
  Bool(bool),
  Float(f64),
  /// Inclusive 0-based line ranges, from list syntax like `[2,"4-6"]`.
  Ranges(Vec<[usize; 2]>),
}

impl AttributeValue {
  /// The value coerced to a display string, as handed to render hooks.
  #[must_use]
  pub fn value_string(&self) -> String {
    match self {
      Self::String(s) => s.clone(),
      Self::Bool(b) => b.to_string(),
      Self::Float(f) => {
        if f.fract() == 0.0 {
          format!("{}", *f as i64)
        } else {
          f.to_string()
        }
      },
      Self::Ranges(ranges) => {
        let mut out = String::new();
        for (i, r) in ranges.iter().enumerate() {
          if i > 0 {
            out.push(',');
          }
          if r[0] == r[1] {
            let _ = write!(out, "{}", r[0] + 1);
          } else {
            let _ = write!(out, "{}-{}", r[0] + 1, r[1] + 1);
          }
        }
        out
      },
    }
  }
}

/// A single named attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
  pub name:  String,
  pub value: AttributeValue,
}

impl Attribute {
  #[must_use]
  pub fn new(name: impl Into<String>, value: AttributeValue) -> Self {
    Self {
      name: name.into(),
      value,
    }
  }
}

/// Ordered attribute storage with lazily built lookup maps.
#[derive(Debug, Default)]
pub struct AttributesHolder {
  attributes: Vec<Attribute>,
  options:    Vec<Attribute>,

  attributes_map: OnceLock<HashMap<String, AttributeValue>>,
  options_map:    OnceLock<HashMap<String, AttributeValue>>,
}

impl Clone for AttributesHolder {
  fn clone(&self) -> Self {
    // The lazy maps are derived state; rebuild on demand in the clone.
    Self {
      attributes:     self.attributes.clone(),
      options:        self.options.clone(),
      attributes_map: OnceLock::new(),
      options_map:    OnceLock::new(),
    }
  }
}

impl PartialEq for AttributesHolder {
  fn eq(&self, other: &Self) -> bool {
    self.attributes == other.attributes && self.options == other.options
  }
}

impl AttributesHolder {
  /// Build a holder from parsed attributes, dropping event-handler names and
  /// reclassifying highlighter options for the given owner type.
  #[must_use]
  pub fn new(attributes: Vec<Attribute>, owner: AttributesOwner) -> Self {
    let mut attrs = Vec::new();
    let mut opts = Vec::new();

    for attr in attributes {
      let name_lower = attr.name.to_lowercase();
      if name_lower.starts_with("on") {
        continue;
      }

      if owner == AttributesOwner::CodeBlockHighlight
        && HIGHLIGHT_PROCESSING_ATTRIBUTES.contains(&name_lower.as_str())
      {
        // Keep the original casing for options; the highlighter matches
        // case-insensitively.
        opts.push(attr);
      } else {
        attrs.push(Attribute {
          name:  name_lower,
          value: attr.value,
        });
      }
    }

    Self {
      attributes: attrs,
      options: opts,
      attributes_map: OnceLock::new(),
      options_map: OnceLock::new(),
    }
  }

  /// True when neither attributes nor options are present.
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.attributes.is_empty() && self.options.is_empty()
  }

  /// Name to value mapping of the general attributes, built on first use.
  pub fn attributes(&self) -> &HashMap<String, AttributeValue> {
    self.attributes_map.get_or_init(|| {
      self
        .attributes
        .iter()
        .map(|a| (a.name.clone(), a.value.clone()))
        .collect()
    })
  }

  /// Name to value mapping of the highlighter options, built on first use.
  pub fn options(&self) -> &HashMap<String, AttributeValue> {
    self.options_map.get_or_init(|| {
      self
        .options
        .iter()
        .map(|a| (a.name.clone(), a.value.clone()))
        .collect()
    })
  }

  /// The general attributes in source order.
  #[must_use]
  pub fn attributes_slice(&self) -> &[Attribute] {
    &self.attributes
  }

  /// The highlighter options in source order.
  #[must_use]
  pub fn options_slice(&self) -> &[Attribute] {
    &self.options
  }

  /// Look up a single attribute value by (lower-cased) name.
  #[must_use]
  pub fn get(&self, name: &str) -> Option<&AttributeValue> {
    self.attributes.iter().find(|a| a.name == name).map(|a| &a.value)
  }

  /// The `id` attribute, if present.
  #[must_use]
  pub fn id(&self) -> Option<&str> {
    match self.get("id") {
      Some(AttributeValue::String(s)) => Some(s),
      _ => None,
    }
  }

  /// Set an attribute, replacing any existing value with the same name.
  ///
  /// Only valid before the lazy maps have been materialized; transform
  /// passes run strictly before rendering, so this holds by construction.
  pub fn set(&mut self, name: impl Into<String>, value: AttributeValue) {
    debug_assert!(self.attributes_map.get().is_none());
    let name = name.into();
    if let Some(existing) = self.attributes.iter_mut().find(|a| a.name == name)
    {
      existing.value = value;
    } else {
      self.attributes.push(Attribute { name, value });
    }
  }

  /// Merge attributes from `other` that are not already present.
  pub fn merge_missing(&mut self, other: &Self) {
    for attr in &other.attributes {
      if self.get(&attr.name).is_none() {
        self.attributes.push(attr.clone());
      }
    }
    for opt in &other.options {
      if !self.options.iter().any(|o| o.name == opt.name) {
        self.options.push(opt.clone());
      }
    }
  }
}

/// Write the general attributes of a holder as escaped HTML element
/// attributes. Used by the default renderers when no hook is registered.
pub fn render_attributes(
  out: &mut String,
  skip_class: bool,
  attributes: &[Attribute],
) {
  for attr in attributes {
    if skip_class && attr.name == "class" {
      continue;
    }
    if ATTRIBUTE_EXCLUDES.contains(&attr.name.as_str())
      || attr.name.starts_with("on")
    {
      continue;
    }

    out.push(' ');
    out.push_str(&attr.name);
    out.push_str("=\"");
    match &attr.value {
      AttributeValue::String(s) => {
        out.push_str(&html_escape::encode_double_quoted_attribute(s));
      },
      other => out.push_str(&other.value_string()),
    }
    out.push('"');
  }
}

/// Parse the inside of a `{...}` attribute list.
///
/// Supported forms, separated by whitespace and/or commas:
/// `#id`, `.class` (repeatable, joined with spaces), `key=value` with a
/// quoted string, bare word, boolean, number, or a bracketed range list
/// (`hl_lines=[2,"4-6"]`).
///
/// # Errors
///
/// Returns a human-readable reason when the list is malformed; the caller
/// decides whether that is fatal (fenced code block info strings) or a
/// plain-text fallback (everything else).
pub fn parse_attribute_list(input: &str) -> Result<Vec<Attribute>, String> {
  let inner = input.trim();
  let inner = inner
    .strip_prefix('{')
    .and_then(|s| s.strip_suffix('}'))
    .ok_or_else(|| format!("expected {{...}}, got {input:?}"))?;

  let mut attrs: Vec<Attribute> = Vec::new();
  let mut classes: Vec<String> = Vec::new();

  let mut rest = inner.trim();
  while !rest.is_empty() {
    let (token, remainder) = next_token(rest)?;
    rest = remainder.trim_start_matches([' ', '\t', ',']).trim();

    if let Some(id) = token.strip_prefix('#') {
      if id.is_empty() {
        return Err("empty #id".to_string());
      }
      attrs.push(Attribute::new("id", AttributeValue::String(id.to_string())));
    } else if let Some(class) = token.strip_prefix('.') {
      if class.is_empty() {
        return Err("empty .class".to_string());
      }
      classes.push(class.to_string());
    } else if let Some((name, raw)) = token.split_once('=') {
      if name.is_empty() {
        return Err(format!("attribute with empty name: {token:?}"));
      }
      attrs.push(Attribute::new(name, parse_value(raw)?));
    } else {
      return Err(format!("unrecognized attribute token {token:?}"));
    }
  }

  if !classes.is_empty() {
    attrs.push(Attribute::new(
      "class",
      AttributeValue::String(classes.join(" ")),
    ));
  }

  Ok(attrs)
}

/// Split off one token, honoring quotes and brackets inside `key=value`.
fn next_token(s: &str) -> Result<(&str, &str), String> {
  let mut in_quote = false;
  let mut in_bracket = false;
  for (i, c) in s.char_indices() {
    match c {
      '"' => in_quote = !in_quote,
      '[' if !in_quote => in_bracket = true,
      ']' if !in_quote => in_bracket = false,
      ' ' | '\t' | ',' if !in_quote && !in_bracket => {
        return Ok((&s[..i], &s[i..]));
      },
      _ => {},
    }
  }
  if in_quote {
    return Err("unterminated quoted value".to_string());
  }
  if in_bracket {
    return Err("unterminated bracketed value".to_string());
  }
  Ok((s, ""))
}

fn parse_value(raw: &str) -> Result<AttributeValue, String> {
  if let Some(quoted) = raw.strip_prefix('"') {
    let inner = quoted
      .strip_suffix('"')
      .ok_or_else(|| "unterminated quoted value".to_string())?;
    return Ok(AttributeValue::String(inner.to_string()));
  }

  if let Some(list) = raw.strip_prefix('[') {
    let inner = list
      .strip_suffix(']')
      .ok_or_else(|| "unterminated bracketed value".to_string())?;
    return parse_ranges(inner);
  }

  match raw {
    "true" => return Ok(AttributeValue::Bool(true)),
    "false" => return Ok(AttributeValue::Bool(false)),
    "" => return Err("empty attribute value".to_string()),
    _ => {},
  }

  if let Ok(f) = raw.parse::<f64>() {
    return Ok(AttributeValue::Float(f));
  }

  Ok(AttributeValue::String(raw.to_string()))
}

/// Parse `2,"4-6",9` into 0-based inclusive ranges.
fn parse_ranges(inner: &str) -> Result<AttributeValue, String> {
  let mut ranges = Vec::new();
  for part in inner.split(',') {
    let part = part.trim().trim_matches('"');
    if part.is_empty() {
      continue;
    }
    let (lhs, rhs) = match part.split_once('-') {
      Some((a, b)) => (a, b),
      None => (part, part),
    };
    let lhs: usize = lhs
      .trim()
      .parse()
      .map_err(|_| format!("invalid range bound {lhs:?}"))?;
    let rhs: usize = rhs
      .trim()
      .parse()
      .map_err(|_| format!("invalid range bound {rhs:?}"))?;
    if lhs == 0 || rhs < lhs {
      return Err(format!("invalid line range {part:?}"));
    }
    ranges.push([lhs - 1, rhs - 1]);
  }
  Ok(AttributeValue::Ranges(ranges))
}

#[cfg(test)]
mod tests {
  #![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    reason = "Fine in tests"
  )]

  use super::*;

  fn holder(input: &str, owner: AttributesOwner) -> AttributesHolder {
    let attrs =
      parse_attribute_list(input).expect("attribute list should parse");
    AttributesHolder::new(attrs, owner)
  }

  #[test]
  fn parses_id_classes_and_pairs() {
    let attrs = parse_attribute_list(
      r#"{#intro .lead .wide data-weight=3 title="A, B"}"#,
    )
    .expect("should parse");

    assert_eq!(attrs[0], Attribute::new("id", AttributeValue::String("intro".into())));
    assert_eq!(
      attrs[1],
      Attribute::new("data-weight", AttributeValue::Float(3.0))
    );
    assert_eq!(
      attrs[2],
      Attribute::new("title", AttributeValue::String("A, B".into()))
    );
    assert_eq!(
      attrs[3],
      Attribute::new("class", AttributeValue::String("lead wide".into()))
    );
  }

  #[test]
  fn parses_line_ranges() {
    let attrs = parse_attribute_list(r#"{hl_lines=[2,"4-6"]}"#)
      .expect("should parse");
    assert_eq!(
      attrs[0].value,
      AttributeValue::Ranges(vec![[1, 1], [3, 5]])
    );
    assert_eq!(attrs[0].value.value_string(), "2,4-6");
  }

  #[test]
  fn rejects_malformed_lists() {
    assert!(parse_attribute_list("{unclosed=\"x}").is_err());
    assert!(parse_attribute_list("no braces").is_err());
    assert!(parse_attribute_list("{#}").is_err());
    assert!(parse_attribute_list("{=3}").is_err());
  }

  #[test]
  fn event_handler_attributes_are_dropped() {
    let h = holder(
      "{onclick=alert onLoad=x .safe id-ish=ok}",
      AttributesOwner::General,
    );
    assert!(h.attributes().get("onclick").is_none());
    assert!(h.attributes().get("onload").is_none());
    assert!(h.get("id-ish").is_some());
    assert_eq!(
      h.get("class"),
      Some(&AttributeValue::String("safe".into()))
    );
  }

  #[test]
  fn highlighter_options_are_reclassified_for_highlight_owner() {
    let h = holder(
      "{linenos=true hl_lines=[2] .chroma}",
      AttributesOwner::CodeBlockHighlight,
    );
    assert_eq!(h.options_slice().len(), 2);
    assert_eq!(h.attributes_slice().len(), 1);

    // A custom hook owner keeps everything as attributes.
    let h = holder(
      "{linenos=true hl_lines=[2] .chroma}",
      AttributesOwner::CodeBlockCustom,
    );
    assert!(h.options_slice().is_empty());
    assert_eq!(h.attributes_slice().len(), 3);
  }

  #[test]
  fn render_attributes_escapes_and_excludes() {
    let h = holder(
      r#"{.note title="a<b" hl_lines=[1] onclick=x}"#,
      AttributesOwner::General,
    );
    let mut out = String::new();
    render_attributes(&mut out, false, h.attributes_slice());
    assert!(out.contains(r#"title="a&lt;b""#));
    assert!(out.contains(r#"class="note""#));
    assert!(!out.contains("hl_lines"));
    assert!(!out.contains("onclick"));
  }
}
