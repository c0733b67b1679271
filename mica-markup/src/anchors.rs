//! Anchor ID generation.
//!
//! Maps heading and definition-term text to unique, URL-safe anchor strings.
//! Three interchangeable sanitization strategies are supported, selected by
//! configuration; the registry on top resolves collisions by suffixing `-N`.

use std::collections::HashSet;

use log::warn;

/// Anchor sanitization strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AutoIdKind {
  /// Unicode-aware GitHub style: lower-cased letters/digits/underscores by
  /// Unicode category, `-` and space map to `-`, everything else dropped.
  #[default]
  Github,
  /// Like [`Self::Github`], but diacritics are stripped first and any
  /// remaining multi-byte character is dropped.
  GithubAscii,
  /// The legacy normalization rule: alphanumeric runs joined by single
  /// dashes, lower-cased and trimmed.
  Blackfriday,
}

impl AutoIdKind {
  #[must_use]
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::Github => "github",
      Self::GithubAscii => "github-ascii",
      Self::Blackfriday => "blackfriday",
    }
  }

  /// Map a configuration string to a strategy. Unknown values are logged
  /// and replaced with the default.
  #[must_use]
  pub fn from_config(value: &str) -> Self {
    match value {
      "" | "github" => Self::Github,
      "github-ascii" => Self::GithubAscii,
      "blackfriday" => Self::Blackfriday,
      other => {
        warn!("unsupported autoHeadingIDType {other:?}, using \"github\"");
        Self::Github
      },
    }
  }
}

/// What kind of node an ID is generated for; decides the placeholder used
/// when the sanitized text is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdOwner {
  Heading,
  Term,
  Other,
}

impl IdOwner {
  const fn placeholder(self) -> &'static str {
    match self {
      Self::Heading => "heading",
      Self::Term => "term",
      Self::Other => "id",
    }
  }
}

/// Sanitize arbitrary text into an anchor string using the given strategy.
///
/// Sanitization is idempotent: applying it twice yields the same string.
#[must_use]
pub fn sanitize_anchor_name(text: &str, kind: AutoIdKind) -> String {
  match kind {
    AutoIdKind::Github => sanitize_github(text, false),
    AutoIdKind::GithubAscii => {
      let folded: String = text.chars().filter_map(fold_diacritic).collect();
      sanitize_github(&folded, true)
    },
    AutoIdKind::Blackfriday => sanitize_blackfriday(text),
  }
}

fn sanitize_github(text: &str, ascii_only: bool) -> String {
  let mut out = String::with_capacity(text.len());
  for c in text.trim().chars() {
    match c {
      '-' | ' ' => out.push('-'),
      _ if c.is_alphanumeric() || c == '_' => {
        if ascii_only && !c.is_ascii() {
          continue;
        }
        for lc in c.to_lowercase() {
          out.push(lc);
        }
      },
      _ => {},
    }
  }
  out
}

fn sanitize_blackfriday(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  let mut pending_dash = false;
  for c in text.chars() {
    if c.is_alphanumeric() {
      if pending_dash && !out.is_empty() {
        out.push('-');
      }
      pending_dash = false;
      for lc in c.to_lowercase() {
        out.push(lc);
      }
    } else {
      pending_dash = true;
    }
  }
  out
}

/// Fold common Latin diacritics to their ASCII base character. Combining
/// marks are removed outright; anything unmapped passes through unchanged
/// (and is later dropped by the ASCII filter).
#[allow(clippy::match_same_arms)]
fn fold_diacritic(c: char) -> Option<char> {
  // Combining diacritical marks.
  if ('\u{0300}'..='\u{036f}').contains(&c) {
    return None;
  }
  let folded = match c {
    'à'..='å' | 'ā' | 'ă' | 'ą' => 'a',
    'À'..='Å' | 'Ā' | 'Ă' | 'Ą' => 'A',
    'ç' | 'ć' | 'ĉ' | 'ċ' | 'č' => 'c',
    'Ç' | 'Ć' | 'Ĉ' | 'Ċ' | 'Č' => 'C',
    'ď' | 'đ' => 'd',
    'Ď' | 'Đ' => 'D',
    'è'..='ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => 'e',
    'È'..='Ë' | 'Ē' | 'Ĕ' | 'Ė' | 'Ę' | 'Ě' => 'E',
    'ĝ' | 'ğ' | 'ġ' | 'ģ' => 'g',
    'Ĝ' | 'Ğ' | 'Ġ' | 'Ģ' => 'G',
    'ĥ' | 'ħ' => 'h',
    'Ĥ' | 'Ħ' => 'H',
    'ì'..='ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' | 'ı' => 'i',
    'Ì'..='Ï' | 'Ĩ' | 'Ī' | 'Ĭ' | 'Į' | 'İ' => 'I',
    'ĵ' => 'j',
    'Ĵ' => 'J',
    'ķ' => 'k',
    'Ķ' => 'K',
    'ĺ' | 'ļ' | 'ľ' | 'ł' => 'l',
    'Ĺ' | 'Ļ' | 'Ľ' | 'Ł' => 'L',
    'ñ' | 'ń' | 'ņ' | 'ň' => 'n',
    'Ñ' | 'Ń' | 'Ņ' | 'Ň' => 'N',
    'ò'..='ö' | 'ø' | 'ō' | 'ŏ' | 'ő' => 'o',
    'Ò'..='Ö' | 'Ø' | 'Ō' | 'Ŏ' | 'Ő' => 'O',
    'ŕ' | 'ŗ' | 'ř' => 'r',
    'Ŕ' | 'Ŗ' | 'Ř' => 'R',
    'ś' | 'ŝ' | 'ş' | 'š' => 's',
    'Ś' | 'Ŝ' | 'Ş' | 'Š' => 'S',
    'ţ' | 'ť' | 'ŧ' => 't',
    'Ţ' | 'Ť' | 'Ŧ' => 'T',
    'ù'..='ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => 'u',
    'Ù'..='Ü' | 'Ũ' | 'Ū' | 'Ŭ' | 'Ů' | 'Ű' | 'Ų' => 'U',
    'ŵ' => 'w',
    'Ŵ' => 'W',
    'ý' | 'ÿ' | 'ŷ' => 'y',
    'Ý' | 'Ÿ' | 'Ŷ' => 'Y',
    'ź' | 'ż' | 'ž' => 'z',
    'Ź' | 'Ż' | 'Ž' => 'Z',
    other => other,
  };
  Some(folded)
}

/// Per-document registry of issued anchor IDs.
///
/// Every issued ID, explicit or generated, is recorded so later-generated
/// IDs cannot collide with earlier explicit ones and vice versa.
#[derive(Debug)]
pub struct IdRegistry {
  kind:   AutoIdKind,
  issued: HashSet<String>,
}

impl IdRegistry {
  #[must_use]
  pub fn new(kind: AutoIdKind) -> Self {
    Self {
      kind,
      issued: HashSet::new(),
    }
  }

  /// The sanitization strategy this registry was configured with.
  #[must_use]
  pub const fn kind(&self) -> AutoIdKind {
    self.kind
  }

  /// Generate a unique anchor for the given text, recording it as issued.
  pub fn generate(&mut self, text: &str, owner: IdOwner) -> String {
    let mut id = sanitize_anchor_name(text, self.kind);
    if id.is_empty() {
      id = owner.placeholder().to_string();
    }

    if self.issued.contains(&id) {
      let mut n = 1usize;
      loop {
        let candidate = format!("{id}-{n}");
        if !self.issued.contains(&candidate) {
          id = candidate;
          break;
        }
        n += 1;
      }
    }

    self.issued.insert(id.clone());
    id
  }

  /// Record an explicit ID so future generated IDs avoid it.
  pub fn register(&mut self, id: &str) {
    self.issued.insert(id.to_string());
  }

  /// Whether the given ID has been issued or registered.
  #[must_use]
  pub fn contains(&self, id: &str) -> bool {
    self.issued.contains(id)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sanitize_is_idempotent_for_all_strategies() {
    let inputs = [
      "  GitHub FTW!!  ",
      "Äøñchör nàmes",
      "a - b -- c",
      "日本語 heading",
      "",
      "100% done_here",
    ];
    for kind in
      [AutoIdKind::Github, AutoIdKind::GithubAscii, AutoIdKind::Blackfriday]
    {
      for input in inputs {
        let once = sanitize_anchor_name(input, kind);
        let twice = sanitize_anchor_name(&once, kind);
        assert_eq!(once, twice, "{kind:?} not idempotent for {input:?}");
      }
    }
  }

  #[test]
  fn github_strategy_keeps_unicode_letters() {
    assert_eq!(
      sanitize_anchor_name("Gérard Depardieu", AutoIdKind::Github),
      "gérard-depardieu"
    );
    assert_eq!(
      sanitize_anchor_name("Hello, World! 2_3", AutoIdKind::Github),
      "hello-world-2_3"
    );
  }

  #[test]
  fn ascii_strategy_strips_diacritics_and_multibyte() {
    assert_eq!(
      sanitize_anchor_name("Gérard Depardieu", AutoIdKind::GithubAscii),
      "gerard-depardieu"
    );
    assert_eq!(
      sanitize_anchor_name("日本語 café", AutoIdKind::GithubAscii),
      "-cafe"
    );
  }

  #[test]
  fn blackfriday_strategy_collapses_runs() {
    assert_eq!(
      sanitize_anchor_name("This  --  is a Heading!", AutoIdKind::Blackfriday),
      "this-is-a-heading"
    );
    assert_eq!(sanitize_anchor_name("--x--", AutoIdKind::Blackfriday), "x");
  }

  #[test]
  fn duplicate_headings_get_suffixed_in_first_seen_order() {
    let mut ids = IdRegistry::new(AutoIdKind::Github);
    assert_eq!(ids.generate("Foo", IdOwner::Heading), "foo");
    assert_eq!(ids.generate("Foo", IdOwner::Heading), "foo-1");
    assert_eq!(ids.generate("Foo", IdOwner::Heading), "foo-2");
  }

  #[test]
  fn empty_text_uses_owner_placeholder() {
    let mut ids = IdRegistry::new(AutoIdKind::Github);
    assert_eq!(ids.generate("!!!", IdOwner::Heading), "heading");
    assert_eq!(ids.generate("!!!", IdOwner::Heading), "heading-1");
    assert_eq!(ids.generate("???", IdOwner::Term), "term");
    assert_eq!(ids.generate("***", IdOwner::Other), "id");
  }

  #[test]
  fn explicit_ids_block_generated_ones() {
    let mut ids = IdRegistry::new(AutoIdKind::Github);
    ids.register("setup");
    assert_eq!(ids.generate("Setup", IdOwner::Heading), "setup-1");

    // And generated IDs block later explicit duplicates from being unique.
    assert!(ids.contains("setup-1"));
  }
}
