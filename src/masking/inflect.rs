//! Heuristic surface forms for patterns the variant table does not know.
//!
//! Two independent fallbacks live here:
//!   - generic inflection: drop the dictionary-form ending and append the
//!     polite / past / te / negative / volitional / conditional endings;
//!   - bracketed patterns: constructions that surface as a leading marker and
//!     a trailing marker around arbitrary content (たとえ…ても).

use std::sync::OnceLock;

use regex::Regex;
use tracing::error;

/// Endings appended to the stem (pattern minus its final kana), longest first.
fn endings_for(last: char) -> &'static [&'static str] {
  match last {
    'う' => &["いました", "います", "わない", "った", "って", "おう", "えば"],
    'く' => &["きました", "きます", "かない", "いた", "いて", "こう", "けば"],
    'ぐ' => &["ぎました", "ぎます", "がない", "いだ", "いで", "げば"],
    'す' => &["しました", "します", "さない", "した", "して", "そう", "せば"],
    'つ' => &["ちました", "ちます", "たない", "った", "って", "てば"],
    'む' => &["みました", "みます", "まない", "んだ", "んで", "めば"],
    'ぶ' => &["びました", "びます", "ばない", "んだ", "んで", "べば"],
    'る' => &["ました", "ます", "ない", "よう", "れば", "た", "て"],
    'だ' => &["でした", "だった", "です", "な", "の"],
    'い' => &["かった", "くない", "ければ", "くて", "く"],
    _ => &[],
  }
}

/// Copula endings tried on the whole form when it does not end in a
/// conjugating kana (noun-like patterns such as 予定).
const NOMINAL_ENDINGS: &[&str] = &["でした", "だった", "です", "だ"];

/// Strip a trailing sense qualifier such as `（推測）` or `(purpose)`.
pub fn bare_form(pattern_id: &str) -> &str {
  let trimmed = pattern_id.trim();
  for (open, close) in [('（', '）'), ('(', ')')] {
    if trimmed.ends_with(close) {
      if let Some(idx) = trimmed.rfind(open) {
        let head = trimmed[..idx].trim_end();
        if !head.is_empty() {
          return head;
        }
      }
    }
  }
  trimmed
}

/// Candidate surface strings for `pattern_id`, most specific first.
/// The qualifier-free form leads when it differs from the catalog id.
pub fn inflected_forms(pattern_id: &str) -> Vec<String> {
  let bare = bare_form(pattern_id);
  let mut out: Vec<String> = Vec::new();
  if bare.is_empty() {
    return out;
  }

  let Some(last) = bare.chars().last() else {
    return out;
  };
  let stem = &bare[..bare.len() - last.len_utf8()];

  if !stem.is_empty() {
    out.extend(endings_for(last).iter().map(|e| format!("{stem}{e}")));
  }
  if endings_for(last).is_empty() {
    out.extend(NOMINAL_ENDINGS.iter().map(|e| format!("{bare}{e}")));
  }
  // The bare form itself goes last so it never shadows a longer inflection.
  if bare != pattern_id {
    out.push(bare.to_string());
  }
  out
}

struct BracketDef {
  pattern: &'static str,
  regex: &'static str,
}

const BRACKETED: &[BracketDef] = &[
  BracketDef { pattern: "たとえても", regex: r"たとえ.+?[てで]も" },
  BracketDef { pattern: "たとえ～ても", regex: r"たとえ.+?[てで]も" },
  BracketDef { pattern: "いくら～ても", regex: r"いくら.+?[てで]も" },
  BracketDef { pattern: "どんなに～ても", regex: r"どんなに.+?[てで]も" },
  BracketDef { pattern: "あまりない", regex: r"あまり.+?(?:ませんでした|ません|なかった|ないです|くない|ない)" },
  BracketDef { pattern: "全然ない", regex: r"(?:全然|ぜんぜん).+?(?:ませんでした|ません|なかった|ない)" },
];

static BRACKET_REGEXES: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();

fn bracket_regexes() -> &'static [(&'static str, Regex)] {
  BRACKET_REGEXES.get_or_init(|| {
    BRACKETED
      .iter()
      .filter_map(|def| match Regex::new(def.regex) {
        Ok(re) => Some((def.pattern, re)),
        Err(e) => {
          error!(target: "masking", pattern = def.pattern, error = %e, "Invalid bracket regex; entry disabled");
          None
        }
      })
      .collect()
  })
}

/// Leftmost, shortest `marker … counter-marker` span for a bracketed
/// pattern, as a byte range into `text`.
pub fn find_bracketed(text: &str, pattern_id: &str) -> Option<(usize, usize)> {
  bracket_regexes()
    .iter()
    .find(|(pattern, _)| *pattern == pattern_id)
    .and_then(|(_, re)| re.find(text))
    .map(|m| (m.start(), m.end()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn bare_form_strips_full_and_half_width_qualifiers() {
    assert_eq!(bare_form("そうだ（推測）"), "そうだ");
    assert_eq!(bare_form("ために (purpose)"), "ために");
    assert_eq!(bare_form("ておく"), "ておく");
    assert_eq!(bare_form("（推測）"), "（推測）");
  }

  #[test]
  fn verb_patterns_get_stem_plus_endings() {
    let forms = inflected_forms("てあげる");
    assert_eq!(forms[0], "てあげました");
    assert!(forms.contains(&"てあげて".to_string()));
    assert!(!forms.contains(&"てあげる".to_string()));
  }

  #[test]
  fn qualified_pattern_tries_inflections_then_bare_form() {
    let forms = inflected_forms("ばかりだ（限定）");
    assert_eq!(forms.first().map(String::as_str), Some("ばかりでした"));
    assert_eq!(forms.last().map(String::as_str), Some("ばかりだ"));
  }

  #[test]
  fn nominal_patterns_get_copula_endings() {
    let forms = inflected_forms("予定");
    assert_eq!(forms, vec!["予定でした", "予定だった", "予定です", "予定だ"]);
  }

  #[test]
  fn bracketed_match_is_non_greedy() {
    let text = "たとえ雨が降っても、たとえ風が強くても行きます。";
    let (s, e) = find_bracketed(text, "たとえても").expect("match");
    assert_eq!(&text[s..e], "たとえ雨が降っても");
    assert!(find_bracketed(text, "ておく").is_none());
  }
}
