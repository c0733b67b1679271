//! Syntax-highlighting seam.
//!
//! The converter never highlights code itself. The embedder supplies a
//! [`Highlighter`] whose callback produces finished HTML for a code block;
//! the converter only decides per fence whether the configured highlighter
//! claims the language, caching that answer process-wide since lexer lookups
//! are not cheap and documents repeat the same handful of languages.

use std::{
  collections::HashMap,
  sync::{Arc, LazyLock, RwLock},
};

use crate::{
  attributes::Attribute,
  error::HookError,
};

/// Produces highlighted HTML for `(code, language, options)`. The options
/// string carries highlighter-directed attributes from the fence info string
/// in `key=value,key=value` form.
pub type HighlightFn =
  Arc<dyn Fn(&str, &str, &str) -> Result<String, HookError> + Send + Sync>;

/// An embedder-supplied syntax highlighter.
#[derive(Clone)]
pub struct Highlighter {
  /// Renders one code block to HTML.
  pub highlight: HighlightFn,

  /// Whether the highlighter has a lexer for the language. Consulted through
  /// the shared [`LexerCache`].
  pub has_lexer: Arc<dyn Fn(&str) -> bool + Send + Sync>,
}

impl Highlighter {
  /// Cached lexer lookup.
  #[must_use]
  pub fn is_known(&self, language: &str) -> bool {
    LEXER_CACHE.check(language, |lang| (self.has_lexer)(lang))
  }
}

impl std::fmt::Debug for Highlighter {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Highlighter").finish_non_exhaustive()
  }
}

/// Process-wide cache of which languages the highlighter has a lexer for.
#[derive(Debug, Default)]
pub struct LexerCache {
  known: RwLock<HashMap<String, bool>>,
}

pub static LEXER_CACHE: LazyLock<LexerCache> = LazyLock::new(LexerCache::default);

impl LexerCache {
  /// Look up `language`, computing and storing the answer on a miss.
  ///
  /// The read lock is taken first so the hot path never blocks writers out
  /// of order; a racing duplicate insert writes the same value, so losing
  /// the race is harmless.
  pub fn check(
    &self,
    language: &str,
    probe: impl FnOnce(&str) -> bool,
  ) -> bool {
    if let Ok(known) = self.known.read()
      && let Some(answer) = known.get(language)
    {
      return *answer;
    }

    let answer = probe(language);
    if let Ok(mut known) = self.known.write() {
      known.insert(language.to_string(), answer);
    }
    answer
  }
}

/// Write the `<code>` open tag carrying the language class, matching the
/// markup produced for highlighted blocks.
pub fn write_code_tag(out: &mut String, language: &str) {
  if language.is_empty() {
    out.push_str("<code>");
    return;
  }
  out.push_str("<code class=\"language-");
  html_escape::encode_double_quoted_attribute_to_string(language, out);
  out.push_str("\" data-lang=\"");
  html_escape::encode_double_quoted_attribute_to_string(language, out);
  out.push_str("\">");
}

/// Serialize highlighter-directed options as `key=value,key=value`, sorted
/// by key so the output is stable.
#[must_use]
pub fn options_string(options: &[Attribute]) -> String {
  let mut pairs: Vec<(String, String)> = options
    .iter()
    .map(|attr| (attr.name.clone(), attr.value.value_string()))
    .collect();
  pairs.sort();
  pairs
    .into_iter()
    .map(|(name, value)| format!("{name}={value}"))
    .collect::<Vec<_>>()
    .join(",")
}

#[cfg(test)]
mod tests {
  #![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    reason = "Fine in tests"
  )]

  use crate::attributes::AttributeValue;

  use super::*;

  #[test]
  fn lexer_cache_probes_once_per_language() {
    let cache = LexerCache::default();
    let mut probes = 0;

    assert!(cache.check("rust", |_| {
      probes += 1;
      true
    }));
    assert!(cache.check("rust", |_| {
      probes += 1;
      panic!("cached answer should be used");
    }));
    assert_eq!(probes, 1);

    assert!(!cache.check("klingon", |_| false));
    assert!(!cache.check("klingon", |_| true));
  }

  #[test]
  fn code_tag_escapes_language() {
    let mut out = String::new();
    write_code_tag(&mut out, "c++");
    assert_eq!(out, "<code class=\"language-c++\" data-lang=\"c++\">");

    let mut plain = String::new();
    write_code_tag(&mut plain, "");
    assert_eq!(plain, "<code>");
  }

  #[test]
  fn options_string_is_sorted_and_joined() {
    let options = vec![
      Attribute::new("linenos", AttributeValue::Bool(true)),
      Attribute::new("hl_lines", AttributeValue::String("2-3".into())),
    ];
    assert_eq!(options_string(&options), "hl_lines=2-3,linenos=true");
  }
}
