//! Catalog validation: per-row issues, statistics and a masking audit.
//!
//! Used by `jlpt-quiz validate [LEVEL]` and `GET /api/v1/validate`.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::{info, instrument};

use crate::catalog::{kind_counts, CatalogStore};
use crate::domain::{Category, Level, PatternRecord, QuestionKind, VocabRecord};
use crate::error::DataLoadError;
use crate::masking::{mask, BlankWidth, MaskAudit, MaskStep};
use crate::util::{is_kana_only, is_missing};

pub const EXIT_CLEAN: i32 = 0;
pub const EXIT_ISSUES: i32 = 1;
pub const EXIT_LOAD_FAILURE: i32 = 2;

const DIFFICULTY_RANGE: std::ops::RangeInclusive<u8> = 1..=3;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RowIssue {
  pub category: Category,
  /// 1-based data row, header excluded.
  pub row: usize,
  pub message: String,
}

/// A sentence-completion row whose pattern was not found literally.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ApproximateRow {
  pub row: usize,
  pub pattern_id: String,
  pub step: MaskStep,
  pub masked: String,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct CategoryStats {
  pub rows: usize,
  pub kinds: BTreeMap<QuestionKind, usize>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ValidationReport {
  pub level: Level,
  pub grammar: CategoryStats,
  pub vocabulary: CategoryStats,
  pub issues: Vec<RowIssue>,
  pub mask_audit: MaskAudit,
  pub approximate_rows: Vec<ApproximateRow>,
}

impl ValidationReport {
  pub fn is_clean(&self) -> bool {
    self.issues.is_empty()
  }
}

#[instrument(level = "info", skip(store))]
pub fn validate_level(store: &CatalogStore, level: Level) -> Result<ValidationReport, DataLoadError> {
  let grammar = store.grammar(level)?;
  let vocabulary = store.vocabulary(level)?;
  let report = build_report(level, &grammar, &vocabulary);
  info!(
    target: "catalog",
    %level,
    issues = report.issues.len(),
    approximate = report.approximate_rows.len(),
    "Validation finished"
  );
  Ok(report)
}

/// Exit status for a set of validation outcomes: any load failure wins,
/// then any row issue.
pub fn exit_code(outcomes: &[Result<ValidationReport, DataLoadError>]) -> i32 {
  if outcomes.is_empty() || outcomes.iter().any(|o| o.is_err()) {
    EXIT_LOAD_FAILURE
  } else if outcomes.iter().flatten().all(ValidationReport::is_clean) {
    EXIT_CLEAN
  } else {
    EXIT_ISSUES
  }
}

pub fn build_report(level: Level, grammar: &[PatternRecord], vocabulary: &[VocabRecord]) -> ValidationReport {
  let mut issues = Vec::new();
  let mut mask_audit = MaskAudit::default();
  let mut approximate_rows = Vec::new();

  for r in grammar {
    let mut push = |message: String| issues.push(RowIssue { category: Category::Grammar, row: r.row, message });
    if is_missing(&r.pattern_id) {
      push("missing grammar_pattern".into());
    }
    if is_missing(&r.primary_text) {
      push("missing japanese_sentence".into());
    }
    if is_missing(&r.translation) {
      push("missing korean_translation".into());
    }
    check_common(&r.kind, Category::Grammar, r.difficulty, &mut push);

    if r.kind.requires_masking() && !is_missing(&r.pattern_id) && !is_missing(&r.primary_text) {
      let m = mask(&r.primary_text, &r.pattern_id, BlankWidth::Fixed);
      mask_audit.record(m.step);
      if m.step.is_approximate() || m.step == MaskStep::Unchanged {
        approximate_rows.push(ApproximateRow {
          row: r.row,
          pattern_id: r.pattern_id.clone(),
          step: m.step,
          masked: m.masked,
        });
      }
    }
  }

  for r in vocabulary {
    let mut push = |message: String| issues.push(RowIssue { category: Category::Vocabulary, row: r.row, message });
    if is_missing(&r.term) {
      push("missing kanji".into());
    }
    if is_missing(&r.reading) {
      push("missing hiragana".into());
    }
    if is_missing(&r.meaning) {
      push("missing korean_meaning".into());
    }
    check_common(&r.kind, Category::Vocabulary, r.difficulty, &mut push);
    if r.kind == QuestionKind::Reading && is_kana_only(&r.term) {
      push("reading question on a kana-only term".into());
    }
  }

  ValidationReport {
    level,
    grammar: CategoryStats { rows: grammar.len(), kinds: kind_counts(grammar) },
    vocabulary: CategoryStats { rows: vocabulary.len(), kinds: kind_counts(vocabulary) },
    issues,
    mask_audit,
    approximate_rows,
  }
}

fn check_common(kind: &QuestionKind, category: Category, difficulty: u8, push: &mut impl FnMut(String)) {
  match kind.category() {
    Some(c) if c == category => {}
    Some(_) => push(format!("question_type '{kind}' belongs to the other catalog")),
    None => push(format!("unknown question_type '{kind}'")),
  }
  if !DIFFICULTY_RANGE.contains(&difficulty) {
    push(format!("difficulty {difficulty} outside 1..=3"));
  }
}

impl fmt::Display for ValidationReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "== {} ==", self.level)?;
    for (name, stats) in [("grammar", &self.grammar), ("vocabulary", &self.vocabulary)] {
      writeln!(f, "{name}: {} rows", stats.rows)?;
      for (kind, n) in &stats.kinds {
        writeln!(f, "  {kind}: {n}")?;
      }
    }

    let a = &self.mask_audit;
    writeln!(
      f,
      "masking: exact {} / variant {} / inflection {} / bracketed {} / excision {} / tail {} / unchanged {}",
      a.exact, a.variant, a.inflection, a.bracketed, a.middle_excision, a.tail_overwrite, a.unchanged
    )?;
    for r in &self.approximate_rows {
      writeln!(f, "  row {} [{}] {:?}: {}", r.row, r.pattern_id, r.step, r.masked)?;
    }

    if self.issues.is_empty() {
      writeln!(f, "no issues")?;
    } else {
      writeln!(f, "{} issues:", self.issues.len())?;
      for i in &self.issues {
        writeln!(f, "  {} row {}: {}", i.category, i.row, i.message)?;
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::tests::{temp_dir, write_n4};

  #[test]
  fn fixture_catalog_reports_the_bad_difficulty() {
    let dir = temp_dir();
    write_n4(&dir);
    let store = CatalogStore::new(dir);
    let report = validate_level(&store, Level::N4).expect("validate");

    assert_eq!(report.grammar.rows, 3);
    assert_eq!(report.vocabulary.rows, 3);
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].row, 3);
    assert!(report.issues[0].message.contains("difficulty 0"));
    // Only the sentence-completion row is audited.
    assert_eq!(report.mask_audit.total(), 1);
    assert!(report.approximate_rows.is_empty());
    assert_eq!(exit_code(&[Ok(report)]), EXIT_ISSUES);
  }

  #[test]
  fn approximate_masks_are_listed() {
    let grammar = vec![PatternRecord {
      pattern_id: "ぜったいにありえない".into(),
      primary_text: "今日はとても良い天気ですね。".into(),
      phonetic_text: String::new(),
      translation: "오늘은 날씨가 좋네요.".into(),
      kind: QuestionKind::SentenceCompletion,
      difficulty: 2,
      row: 1,
    }];
    let report = build_report(Level::N3, &grammar, &[]);
    assert!(report.is_clean());
    assert_eq!(report.approximate_rows.len(), 1);
    assert_eq!(report.approximate_rows[0].step, MaskStep::MiddleExcision);
    assert_eq!(report.mask_audit.approximate(), 1);
  }

  #[test]
  fn vocabulary_rows_are_checked() {
    let vocab = vec![
      VocabRecord {
        term: "ここ".into(),
        reading: "ここ".into(),
        pos: "noun".into(),
        meaning: "nan".into(),
        kind: QuestionKind::Reading,
        difficulty: 1,
        row: 1,
      },
      VocabRecord {
        term: "本".into(),
        reading: "ほん".into(),
        pos: "noun".into(),
        meaning: "책".into(),
        kind: QuestionKind::SentenceCompletion,
        difficulty: 4,
        row: 2,
      },
    ];
    let report = build_report(Level::N5, &[], &vocab);
    let messages: Vec<_> = report.issues.iter().map(|i| (i.row, i.message.as_str())).collect();
    assert!(messages.contains(&(1, "missing korean_meaning")));
    assert!(messages.contains(&(1, "reading question on a kana-only term")));
    assert!(messages.iter().any(|(row, m)| *row == 2 && m.contains("other catalog")));
    assert!(messages.iter().any(|(row, m)| *row == 2 && m.contains("difficulty 4")));
  }

  #[test]
  fn exit_codes() {
    let store = CatalogStore::new(temp_dir());
    assert_eq!(exit_code(&[validate_level(&store, Level::N4)]), EXIT_LOAD_FAILURE);
    assert_eq!(exit_code(&[]), EXIT_LOAD_FAILURE);
    assert_eq!(exit_code(&[Ok(build_report(Level::N5, &[], &[]))]), EXIT_CLEAN);
  }

  #[test]
  fn report_renders_as_text() {
    let text = build_report(Level::N2, &[], &[]).to_string();
    assert!(text.starts_with("== N2 =="));
    assert!(text.contains("no issues"));
  }
}
