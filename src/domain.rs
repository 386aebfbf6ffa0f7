//! Domain models: levels, categories, question kinds, catalog records and the
//! assembled question handed to presentation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::masking::MaskStep;

/// Number of options every multiple-choice question carries.
pub const OPTION_COUNT: usize = 4;

/// JLPT proficiency level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Level {
  N5,
  #[default]
  N4,
  N3,
  N2,
  N1,
}

impl Level {
  pub const ALL: [Level; 5] = [Level::N5, Level::N4, Level::N3, Level::N2, Level::N1];

  pub fn as_str(self) -> &'static str {
    match self {
      Level::N5 => "N5",
      Level::N4 => "N4",
      Level::N3 => "N3",
      Level::N2 => "N2",
      Level::N1 => "N1",
    }
  }

  /// Lower-case prefix used in catalog file names (`n4_grammar.csv`).
  pub fn file_prefix(self) -> String {
    self.as_str().to_ascii_lowercase()
  }
}

impl fmt::Display for Level {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Level {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Level::ALL
      .into_iter()
      .find(|l| l.as_str().eq_ignore_ascii_case(s.trim()))
      .ok_or_else(|| format!("unknown level '{s}' (expected N5..N1)"))
  }
}

/// Which catalog a record (and its question) comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
  Grammar,
  Vocabulary,
}

impl Category {
  pub fn as_str(self) -> &'static str {
    match self {
      Category::Grammar => "grammar",
      Category::Vocabulary => "vocabulary",
    }
  }
}

impl fmt::Display for Category {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Which catalogs a quiz session draws from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizMode {
  Vocabulary,
  Grammar,
  /// Shuffled union of both categories.
  Mixed,
}

impl QuizMode {
  pub fn as_str(self) -> &'static str {
    match self {
      QuizMode::Vocabulary => "vocabulary",
      QuizMode::Grammar => "grammar",
      QuizMode::Mixed => "mixed",
    }
  }
}

impl fmt::Display for QuizMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for QuizMode {
  type Err = crate::error::SessionError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "vocabulary" => Ok(QuizMode::Vocabulary),
      "grammar" => Ok(QuizMode::Grammar),
      "mixed" => Ok(QuizMode::Mixed),
      other => Err(crate::error::SessionError::UnknownMode(other.to_string())),
    }
  }
}

/// When the user sees whether an answer was right.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackMode {
  #[default]
  Immediate,
  /// All answers are reviewed after the last question.
  Deferred,
}

/// Question kind as declared in the catalog's `question_type` column.
///
/// Unrecognized strings are kept as `Unknown` so the file still loads; the
/// assembler rejects them per record.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QuestionKind {
  SentenceCompletion,
  MeaningComprehension,
  PatternIdentification,
  Reading,
  MeaningToJapanese,
  JapaneseToMeaning,
  Unknown(String),
}

impl QuestionKind {
  pub fn as_str(&self) -> &str {
    match self {
      QuestionKind::SentenceCompletion => "sentence_completion",
      QuestionKind::MeaningComprehension => "meaning_comprehension",
      QuestionKind::PatternIdentification => "pattern_identification",
      QuestionKind::Reading => "reading",
      QuestionKind::MeaningToJapanese => "meaning_to_japanese",
      QuestionKind::JapaneseToMeaning => "japanese_to_meaning",
      QuestionKind::Unknown(s) => s,
    }
  }

  /// Catalog this kind belongs to; `None` for unknown kinds.
  pub fn category(&self) -> Option<Category> {
    match self {
      QuestionKind::SentenceCompletion
      | QuestionKind::MeaningComprehension
      | QuestionKind::PatternIdentification => Some(Category::Grammar),
      QuestionKind::Reading | QuestionKind::MeaningToJapanese | QuestionKind::JapaneseToMeaning => {
        Some(Category::Vocabulary)
      }
      QuestionKind::Unknown(_) => None,
    }
  }

  /// The primary sentence is shown with the answer blanked out.
  pub fn requires_masking(&self) -> bool {
    matches!(self, QuestionKind::SentenceCompletion)
  }
}

impl From<String> for QuestionKind {
  fn from(s: String) -> Self {
    match s.trim() {
      "sentence_completion" => QuestionKind::SentenceCompletion,
      "meaning_comprehension" => QuestionKind::MeaningComprehension,
      "pattern_identification" => QuestionKind::PatternIdentification,
      "reading" => QuestionKind::Reading,
      "meaning_to_japanese" => QuestionKind::MeaningToJapanese,
      "japanese_to_meaning" => QuestionKind::JapaneseToMeaning,
      other => QuestionKind::Unknown(other.to_string()),
    }
  }
}

impl From<&str> for QuestionKind {
  fn from(s: &str) -> Self {
    QuestionKind::from(s.to_string())
  }
}

impl From<QuestionKind> for String {
  fn from(k: QuestionKind) -> Self {
    k.as_str().to_string()
  }
}

impl fmt::Display for QuestionKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// One row of a grammar catalog. Immutable once loaded.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct PatternRecord {
  /// Canonical grammar form; the answer key.
  pub pattern_id: String,
  /// Example sentence in kanji/kana.
  pub primary_text: String,
  /// Same sentence, fully in hiragana.
  pub phonetic_text: String,
  pub translation: String,
  pub kind: QuestionKind,
  /// 1..=3 in clean data; 0 when the cell was not an integer.
  pub difficulty: u8,
  /// 1-based data row (header excluded).
  pub row: usize,
}

/// One row of a vocabulary catalog. Immutable once loaded.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct VocabRecord {
  pub term: String,
  pub reading: String,
  pub pos: String,
  pub meaning: String,
  pub kind: QuestionKind,
  pub difficulty: u8,
  pub row: usize,
}

/// A fully assembled multiple-choice question.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QuestionRecord {
  pub id: String,
  pub level: Level,
  pub category: Category,
  pub kind: QuestionKind,
  pub difficulty: u8,
  pub prompt_text: String,
  /// Primary text, optionally followed by `\n(phonetic)`.
  pub display_text: String,
  /// Exactly `OPTION_COUNT` pairwise-distinct strings.
  pub options: Vec<String>,
  pub correct_index: usize,
  pub explanation: String,
  /// Translation or meaning of the item, for review.
  pub meaning: String,
  pub show_phonetic: bool,
  /// Post-answer annotations, one block per option that could be resolved.
  pub option_notes: Vec<String>,
  /// Masking step used for each masked text, primary first.
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub mask_steps: Vec<MaskStep>,
}

impl QuestionRecord {
  pub fn correct_answer(&self) -> &str {
    &self.options[self.correct_index]
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn level_parses_case_insensitively() {
    assert_eq!("n3".parse::<Level>().expect("level"), Level::N3);
    assert_eq!(Level::N4.file_prefix(), "n4");
    assert!("N6".parse::<Level>().is_err());
  }

  #[test]
  fn unknown_kind_round_trips_through_serde() {
    let k: QuestionKind = serde_json::from_str("\"listening\"").expect("kind");
    assert_eq!(k, QuestionKind::Unknown("listening".into()));
    assert_eq!(k.category(), None);
    assert_eq!(serde_json::to_string(&QuestionKind::MeaningToJapanese).expect("json"), "\"meaning_to_japanese\"");
  }

  #[test]
  fn mode_parse_reports_unknown_mode() {
    assert_eq!("Mixed".parse::<QuizMode>().expect("mode"), QuizMode::Mixed);
    assert!(matches!(
      "kanji".parse::<QuizMode>(),
      Err(crate::error::SessionError::UnknownMode(m)) if m == "kanji"
    ));
  }
}
