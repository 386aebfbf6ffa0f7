//! Pattern masking: find the span of a sentence that realizes a grammar
//! pattern and blank it out.
//!
//! Steps, first success wins:
//!   1. exact pattern text
//!   2. known variants (`variants::VARIANT_TABLE`)
//!   3. generic inflections of the pattern (`inflect::inflected_forms`)
//!   4. bracketed `marker … counter-marker` spans, capped at 60% of the text
//!   5. a short slice at the middle of the text (approximate)
//!   6. overwrite the final character for very short text (approximate)
//!
//! Steps 5 and 6 guarantee a blank, not the right blank. Callers that care
//! about data quality feed every `MaskedText::step` into a `MaskAudit`.
//!
//! The engine is pure: same input, same output, no shared state.

pub mod inflect;
pub mod variants;

use serde::Serialize;
use tracing::{debug, warn};

use crate::util::trunc_for_log;

/// Blank used for the primary (kanji) sentence, whatever the span length.
pub const FIXED_BLANK: &str = "____";
const BLANK_CHAR: char = '_';

const MAX_BRACKET_SHARE: f32 = 0.6;
/// Middle excision needs more than this many characters.
const MIN_EXCISION_CHARS: usize = 6;
const LONG_TEXT_CHARS: usize = 12;
const MAX_EXCISION_CHARS: usize = 5;
const SHORT_EXCISION_CHARS: usize = 3;

/// How wide the blank is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlankWidth {
  /// Always `FIXED_BLANK`. Kanji and kana differ in visual width, so span
  /// length would leak information about the answer.
  Fixed,
  /// One underscore per replaced character, keeping the reading aligned.
  Span,
}

impl BlankWidth {
  fn blank(self, replaced_chars: usize) -> String {
    match self {
      BlankWidth::Fixed => FIXED_BLANK.to_string(),
      BlankWidth::Span => BLANK_CHAR.to_string().repeat(replaced_chars.max(1)),
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskStep {
  /// Empty text or pattern, or the fallback region was already blank.
  Unchanged,
  Exact,
  Variant,
  Inflection,
  Bracketed,
  MiddleExcision,
  TailOverwrite,
}

impl MaskStep {
  /// True when the blank was placed without locating the pattern.
  pub fn is_approximate(self) -> bool {
    matches!(self, MaskStep::MiddleExcision | MaskStep::TailOverwrite)
  }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MaskedText {
  pub original: String,
  pub masked: String,
  /// Character (not byte) range of the located span in `original`.
  /// `None` when the blank was placed approximately or nothing was done.
  pub matched_span: Option<(usize, usize)>,
  pub step: MaskStep,
}

impl MaskedText {
  fn unchanged(text: &str) -> Self {
    Self {
      original: text.to_string(),
      masked: text.to_string(),
      matched_span: None,
      step: MaskStep::Unchanged,
    }
  }

  /// The literal text that was blanked, when a span was located.
  pub fn matched_text(&self) -> Option<String> {
    self.matched_span.map(|(s, e)| self.original.chars().skip(s).take(e - s).collect())
  }
}

/// Hide all of `text` (used for vocabulary readings).
pub fn blank_all(text: &str, width: BlankWidth) -> String {
  width.blank(text.chars().count())
}

/// Blank the span of `text` that realizes `pattern_id`.
///
/// Never fails. Empty `text` or `pattern_id` returns the text unchanged, as
/// does text whose fallback region is already blanked.
pub fn mask(text: &str, pattern_id: &str, width: BlankWidth) -> MaskedText {
  if text.is_empty() || pattern_id.is_empty() {
    return MaskedText::unchanged(text);
  }

  if let Some(m) = mask_literal(text, pattern_id, width, MaskStep::Exact) {
    return m;
  }

  for variant in variants::variants_for(pattern_id) {
    if let Some(m) = mask_literal(text, variant, width, MaskStep::Variant) {
      debug!(target: "masking", pattern = pattern_id, variant, "Masked known variant");
      return m;
    }
  }

  for form in inflect::inflected_forms(pattern_id) {
    if let Some(m) = mask_literal(text, &form, width, MaskStep::Inflection) {
      debug!(target: "masking", pattern = pattern_id, form = %form, "Masked generic inflection");
      return m;
    }
  }

  if let Some(m) = mask_bracketed(text, pattern_id, width) {
    return m;
  }

  let m = mask_fallback(text, width);
  warn!(
    target: "masking",
    pattern = pattern_id,
    step = ?m.step,
    text_chars = text.chars().count(),
    excerpt = %trunc_for_log(text, 12),
    "Pattern not located; blank placed approximately"
  );
  m
}

/// Blank `literal` where it first occurs; the span records that occurrence.
///
/// The exact step blanks every occurrence instead, so a pattern used twice in
/// one sentence does not leak; `masked` then differs from `original` outside
/// the span too. Variant and inflection steps only run once the pattern itself
/// is absent, so they splice the single matched occurrence.
fn mask_literal(text: &str, literal: &str, width: BlankWidth, step: MaskStep) -> Option<MaskedText> {
  if literal.is_empty() {
    return None;
  }
  let start_byte = text.find(literal)?;
  let start = text[..start_byte].chars().count();
  let len = literal.chars().count();
  let blank = width.blank(len);
  let masked = match step {
    MaskStep::Exact => text.replace(literal, &blank),
    _ => {
      let end_byte = start_byte + literal.len();
      format!("{}{}{}", &text[..start_byte], blank, &text[end_byte..])
    }
  };
  Some(MaskedText {
    original: text.to_string(),
    masked,
    matched_span: Some((start, start + len)),
    step,
  })
}

fn mask_bracketed(text: &str, pattern_id: &str, width: BlankWidth) -> Option<MaskedText> {
  let (s, e) = inflect::find_bracketed(text, pattern_id)?;
  let total = text.chars().count();
  let start = text[..s].chars().count();
  let len = text[s..e].chars().count();
  if len as f32 > total as f32 * MAX_BRACKET_SHARE {
    debug!(target: "masking", pattern = pattern_id, span_chars = len, total, "Bracketed span too wide; skipped");
    return None;
  }
  let mut masked = String::with_capacity(text.len());
  masked.push_str(&text[..s]);
  masked.push_str(&width.blank(len));
  masked.push_str(&text[e..]);
  Some(MaskedText {
    original: text.to_string(),
    masked,
    matched_span: Some((start, start + len)),
    step: MaskStep::Bracketed,
  })
}

fn mask_fallback(text: &str, width: BlankWidth) -> MaskedText {
  let chars: Vec<char> = text.chars().collect();
  let n = chars.len();

  let (start, end, step) = if n > MIN_EXCISION_CHARS {
    let size = if n > LONG_TEXT_CHARS {
      (n / 4).min(MAX_EXCISION_CHARS)
    } else {
      SHORT_EXCISION_CHARS
    };
    let start = n / 2 - size / 2;
    (start, start + size, MaskStep::MiddleExcision)
  } else {
    (n - 1, n, MaskStep::TailOverwrite)
  };

  // Already blanked there; overwriting would change nothing.
  if chars[start..end].iter().all(|c| *c == BLANK_CHAR) {
    return MaskedText::unchanged(text);
  }

  let mut masked: String = chars[..start].iter().collect();
  masked.push_str(&width.blank(end - start));
  masked.extend(&chars[end..]);

  MaskedText {
    original: text.to_string(),
    masked,
    matched_span: None,
    step,
  }
}

/// Tally of masking steps over a batch, used for data-quality auditing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MaskAudit {
  pub exact: usize,
  pub variant: usize,
  pub inflection: usize,
  pub bracketed: usize,
  pub middle_excision: usize,
  pub tail_overwrite: usize,
  pub unchanged: usize,
}

impl MaskAudit {
  pub fn record(&mut self, step: MaskStep) {
    match step {
      MaskStep::Unchanged => self.unchanged += 1,
      MaskStep::Exact => self.exact += 1,
      MaskStep::Variant => self.variant += 1,
      MaskStep::Inflection => self.inflection += 1,
      MaskStep::Bracketed => self.bracketed += 1,
      MaskStep::MiddleExcision => self.middle_excision += 1,
      MaskStep::TailOverwrite => self.tail_overwrite += 1,
    }
  }

  pub fn merge(&mut self, other: &MaskAudit) {
    self.exact += other.exact;
    self.variant += other.variant;
    self.inflection += other.inflection;
    self.bracketed += other.bracketed;
    self.middle_excision += other.middle_excision;
    self.tail_overwrite += other.tail_overwrite;
    self.unchanged += other.unchanged;
  }

  /// Blanks placed without locating the pattern.
  pub fn approximate(&self) -> usize {
    self.middle_excision + self.tail_overwrite
  }

  pub fn total(&self) -> usize {
    self.exact
      + self.variant
      + self.inflection
      + self.bracketed
      + self.middle_excision
      + self.tail_overwrite
      + self.unchanged
  }
}
