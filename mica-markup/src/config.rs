//! Markup configuration.
//!
//! Plain data structs with serde derives; decoding configuration files is the
//! caller's job. Enum-valued options arrive as strings and are mapped
//! leniently: an unknown value is logged and replaced with the default rather
//! than failing the build.

use serde::{Deserialize, Serialize};

use crate::{anchors::AutoIdKind, toc::TocConfig};

/// Site-wide markup configuration for the Markdown converter.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct MarkupConfig {
  pub extensions: Extensions,
  pub parser:     ParserConfig,
  pub renderer:   RendererConfig,
  pub toc:        TocConfig,
}

/// Which Markdown extensions are enabled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
#[allow(
  clippy::struct_excessive_bools,
  reason = "Config struct with related boolean flags"
)]
pub struct Extensions {
  pub table:           bool,
  pub strikethrough:   bool,
  pub superscript:     bool,
  pub task_list:       bool,
  pub definition_list: bool,
  pub footnote:        bool,
  pub autolink:        bool,
  pub passthrough:     PassthroughConfig,
}

impl Default for Extensions {
  fn default() -> Self {
    Self {
      table:           true,
      strikethrough:   true,
      superscript:     false,
      task_list:       true,
      definition_list: true,
      footnote:        true,
      autolink:        true,
      passthrough:     PassthroughConfig::default(),
    }
  }
}

/// Raw passthrough spans, e.g. for embedding LaTeX math. Delimiter pairs are
/// `[open, close]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct PassthroughConfig {
  pub enable:     bool,
  pub delimiters: PassthroughDelimiters,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct PassthroughDelimiters {
  pub inline: Vec<[String; 2]>,
  pub block:  Vec<[String; 2]>,
}

/// Parser behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
#[allow(
  clippy::struct_excessive_bools,
  reason = "Config struct with related boolean flags"
)]
pub struct ParserConfig {
  /// Assign anchor IDs to headings that lack an explicit one.
  pub auto_heading_id: bool,

  /// Sanitization strategy for generated anchors. One of `github`,
  /// `github-ascii` or `blackfriday`; anything else falls back to `github`
  /// with a logged warning.
  pub auto_heading_id_type: String,

  /// Assign anchor IDs to definition terms that lack an explicit one.
  pub auto_definition_term_id: bool,

  /// Enable `{...}` attribute lists on headings and blocks.
  pub attribute: AttributeConfig,

  /// When false, an image that is the sole content of a paragraph is
  /// promoted out of it and rendered as a block-level element.
  pub wrap_standalone_image_within_paragraph: bool,
}

impl Default for ParserConfig {
  fn default() -> Self {
    Self {
      auto_heading_id: true,
      auto_heading_id_type: AutoIdKind::Github.as_str().to_string(),
      auto_definition_term_id: false,
      attribute: AttributeConfig::default(),
      wrap_standalone_image_within_paragraph: true,
    }
  }
}

impl ParserConfig {
  /// Resolve the configured anchor sanitization strategy, substituting the
  /// default for unknown values.
  #[must_use]
  pub fn auto_id_kind(&self) -> AutoIdKind {
    AutoIdKind::from_config(&self.auto_heading_id_type)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct AttributeConfig {
  /// Attribute lists on heading lines (`## Title {#id .cls}`).
  pub title: bool,
  /// Attribute lists on the line following a block.
  pub block: bool,
}

impl Default for AttributeConfig {
  fn default() -> Self {
    Self {
      title: true,
      block: false,
    }
  }
}

/// HTML renderer behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
#[allow(
  clippy::struct_excessive_bools,
  reason = "Config struct with related boolean flags"
)]
pub struct RendererConfig {
  /// Pass raw HTML through and keep `javascript:`-style URLs. When false,
  /// raw HTML is replaced with a comment and dangerous URLs are omitted.
  #[serde(rename = "unsafe")]
  pub unsafe_: bool,

  /// Render soft line breaks as `<br>`.
  pub hard_wraps: bool,

  /// Emit self-closing tags (`<br />`).
  pub xhtml: bool,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_enable_common_extensions() {
    let cfg = MarkupConfig::default();
    assert!(cfg.extensions.table);
    assert!(cfg.extensions.footnote);
    assert!(!cfg.extensions.passthrough.enable);
    assert!(cfg.parser.auto_heading_id);
    assert!(!cfg.renderer.unsafe_);
  }

  #[test]
  fn unknown_auto_id_type_falls_back_to_default() {
    let parser = ParserConfig {
      auto_heading_id_type: "not-a-strategy".to_string(),
      ..ParserConfig::default()
    };
    assert_eq!(parser.auto_id_kind(), AutoIdKind::Github);
  }
}
