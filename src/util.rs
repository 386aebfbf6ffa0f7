//! Small utility helpers used across modules.

use wana_kana::{IsJapaneseChar, IsJapaneseStr};

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// True for precomposed Hangul syllables.
pub fn is_hangul(ch: char) -> bool {
  ('\u{AC00}'..='\u{D7AF}').contains(&ch)
}

/// Hangul inside a Japanese field signals a broken export.
pub fn contains_hangul(s: &str) -> bool {
  s.chars().any(is_hangul)
}

/// Empty cells and pandas-style `nan` both count as missing.
pub fn is_missing(s: &str) -> bool {
  let t = s.trim();
  t.is_empty() || t.eq_ignore_ascii_case("nan")
}

/// True when `reading` is worth showing next to `term`.
pub fn has_distinct_reading(term: &str, reading: &str) -> bool {
  !is_missing(reading) && reading != term
}

/// True when the term is written in kana only.
pub fn is_kana_only(s: &str) -> bool {
  !s.is_empty() && s.is_kana()
}

/// Monospace display width: Japanese characters take two cells.
pub fn display_width(s: &str) -> usize {
  s.chars().map(|c| if c.is_japanese() { 2 } else { 1 }).sum()
}

/// Right-pad `s` with spaces up to `width` display cells.
pub fn pad_to_width(s: &str, width: usize) -> String {
  let w = display_width(s);
  format!("{s}{}", " ".repeat(width.saturating_sub(w)))
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Short hex digest for ids: 64-bit FNV-1a over the parts, each followed by
/// a 0xff byte (never valid UTF-8) so `["ab", "c"]` and `["a", "bc"]` differ.
/// Fixed algorithm, so ids survive toolchain upgrades.
pub fn stable_hash(parts: &[&str]) -> String {
  let mut h = FNV_OFFSET;
  for part in parts {
    for b in part.bytes().chain(std::iter::once(0xff)) {
      h ^= u64::from(b);
      h = h.wrapping_mul(FNV_PRIME);
    }
  }
  format!("{h:016x}")
}

/// Log-safe truncation for large strings, on a char boundary.
pub fn trunc_for_log(s: &str, max_chars: usize) -> String {
  let count = s.chars().count();
  if count <= max_chars {
    s.to_string()
  } else {
    let head: String = s.chars().take(max_chars).collect();
    format!("{head}… ({count} chars total)")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn template_fills_every_occurrence() {
    let out = fill_template("{a}-{b}-{a}", &[("a", "x"), ("b", "y")]);
    assert_eq!(out, "x-y-x");
  }

  #[test]
  fn hangul_and_missing_detection() {
    assert!(contains_hangul("친구를 만났습니다"));
    assert!(!contains_hangul("友達に会いました"));
    assert!(is_missing(" NaN "));
    assert!(is_missing(""));
    assert!(!is_missing("0"));
  }

  #[test]
  fn japanese_characters_are_double_width() {
    assert_eq!(display_width("食べる"), 6);
    assert_eq!(display_width("(a)"), 3);
    assert_eq!(pad_to_width("本", 5), "本   ");
  }

  #[test]
  fn reading_is_shown_only_when_it_adds_information() {
    assert!(has_distinct_reading("食べる", "たべる"));
    assert!(!has_distinct_reading("ここ", "ここ"));
    assert!(!has_distinct_reading("ここ", "nan"));
    assert!(is_kana_only("たべる"));
    assert!(!is_kana_only("食べる"));
  }

  #[test]
  fn stable_hash_is_pinned() {
    assert_eq!(stable_hash(&[]), "cbf29ce484222325");
    assert_eq!(stable_hash(&["ておく", "1"]), "25ed1d41b621f36b");
    assert_eq!(stable_hash(&["ab", "c"]), "20ba9b3025a8b421");
    assert_eq!(stable_hash(&["a", "bc"]), "a0a3542c19b900ab");
  }

  #[test]
  fn truncation_respects_char_boundaries() {
    assert_eq!(trunc_for_log("日本語", 5), "日本語");
    assert_eq!(trunc_for_log("日本語です", 2), "日本… (5 chars total)");
  }
}
