//! Quiz session controller: prepares a question list from the catalogs,
//! records answers and computes the final results.
//!
//! Records that fail to assemble are logged and skipped; the skip count is
//! part of the results so an operator can see how much data was dropped.

use std::collections::BTreeMap;
use std::time::Instant;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::catalog::{filter_by_difficulty, filter_by_kind, CatalogRecord, CatalogStore};
use crate::config::Messages;
use crate::domain::{Category, FeedbackMode, Level, PatternRecord, QuestionKind, QuestionRecord, QuizMode, VocabRecord};
use crate::error::SessionError;
use crate::generator::Assembler;
use crate::masking::MaskAudit;
use crate::seeds::{recommendations_for, FOCUS_ON_MISTAKES, REVIEW_FROM_BASICS};

/// Below this percentage a question kind is reported as a weak area.
pub const WEAK_AREA_THRESHOLD: f32 = 70.0;
const BASICS_THRESHOLD: f32 = 50.0;
const MAX_WRONG_EXAMPLES: usize = 3;
const MAX_RECOMMENDATIONS: usize = 3;

fn default_true() -> bool {
  true
}

/// What the learner asked for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
  pub level: Level,
  pub mode: QuizMode,
  /// `None` means every question the catalogs can produce.
  #[serde(default)]
  pub count: Option<usize>,
  #[serde(default)]
  pub feedback_mode: FeedbackMode,
  #[serde(default = "default_true")]
  pub show_phonetic: bool,
  /// Only records with this difficulty.
  #[serde(default)]
  pub difficulty: Option<u8>,
  /// Only records of this question kind.
  #[serde(default)]
  pub kind: Option<QuestionKind>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Feedback {
  pub is_correct: bool,
  pub submitted_answer: String,
  pub correct_answer: String,
  pub explanation: String,
  pub option_notes: Vec<String>,
  pub question_number: usize,
  pub total_questions: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct AnswerRecord {
  pub question_index: usize,
  pub question_id: String,
  pub category: Category,
  pub kind: QuestionKind,
  pub display_text: String,
  pub submitted_index: usize,
  pub submitted_answer: String,
  pub correct_answer: String,
  pub is_correct: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Progress {
  /// 1-based; equals `total_questions` once finished.
  pub current_question: usize,
  pub total_questions: usize,
  pub answered_questions: usize,
  pub correct_so_far: usize,
  pub percentage_complete: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Score {
  pub correct: usize,
  pub total: usize,
  pub percentage: f32,
}

impl Score {
  fn new(correct: usize, total: usize) -> Self {
    let percentage = if total > 0 { correct as f32 / total as f32 * 100.0 } else { 0.0 };
    Self { correct, total, percentage }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
  Excellent,
  Good,
  NeedsImprovement,
}

impl Grade {
  pub fn from_percentage(p: f32) -> Self {
    if p >= 90.0 {
      Grade::Excellent
    } else if p >= WEAK_AREA_THRESHOLD {
      Grade::Good
    } else {
      Grade::NeedsImprovement
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      Grade::Excellent => "우수",
      Grade::Good => "양호",
      Grade::NeedsImprovement => "개선 필요",
    }
  }
}

#[derive(Clone, Debug, Serialize)]
pub struct WeakArea {
  pub kind: QuestionKind,
  pub performance: Score,
  pub wrong_questions: Vec<AnswerRecord>,
  pub recommendations: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ResultsSummary {
  pub config: SessionConfig,
  pub total_questions: usize,
  pub correct_answers: usize,
  pub incorrect_answers: usize,
  pub score: Score,
  pub grade: Grade,
  pub total_time_seconds: u64,
  pub average_time_per_question: f32,
  pub category_scores: BTreeMap<Category, Score>,
  pub weak_areas: Vec<WeakArea>,
  /// Records that could not be turned into questions.
  pub skipped_records: usize,
  pub mask_audit: MaskAudit,
  pub answers: Vec<AnswerRecord>,
}

pub struct QuizSession {
  config: SessionConfig,
  questions: Vec<QuestionRecord>,
  current: usize,
  answers: Vec<AnswerRecord>,
  skipped: usize,
  mask_audit: MaskAudit,
  started: Instant,
  finished: Option<Instant>,
}

impl QuizSession {
  /// Load the catalogs for `config.level`, assemble every eligible record,
  /// and select `config.count` questions.
  #[instrument(level = "info", skip(store, messages, rng), fields(level = %config.level, mode = %config.mode))]
  pub fn prepare<R: Rng + ?Sized>(
    store: &CatalogStore,
    messages: &Messages,
    config: SessionConfig,
    rng: &mut R,
  ) -> Result<Self, SessionError> {
    let grammar = match config.mode {
      QuizMode::Grammar | QuizMode::Mixed => Some(store.grammar(config.level)?),
      QuizMode::Vocabulary => None,
    };
    let vocabulary = match config.mode {
      QuizMode::Vocabulary | QuizMode::Mixed => Some(store.vocabulary(config.level)?),
      QuizMode::Grammar => None,
    };
    let grammar: &[PatternRecord] = grammar.as_deref().unwrap_or(&[]);
    let vocabulary: &[VocabRecord] = vocabulary.as_deref().unwrap_or(&[]);

    // Distractors still come from the full catalogs.
    let asm = Assembler::new(config.level, grammar, vocabulary, messages);
    let grammar_rows = narrow(grammar, &config);
    let vocabulary_rows = narrow(vocabulary, &config);
    let mut pool = Vec::with_capacity(grammar_rows.len() + vocabulary_rows.len());
    let mut skipped = 0usize;

    for record in &vocabulary_rows {
      // The reading would be printed right under the term.
      if config.show_phonetic && record.kind == QuestionKind::Reading {
        continue;
      }
      match asm.vocabulary_question(record, config.show_phonetic, rng) {
        Ok(q) => pool.push(q),
        Err(e) => {
          warn!(target: "quiz", row = record.row, error = %e, "Skipping vocabulary record");
          skipped += 1;
        }
      }
    }
    for record in &grammar_rows {
      match asm.grammar_question(record, config.show_phonetic, rng) {
        Ok(q) => pool.push(q),
        Err(e) => {
          warn!(target: "quiz", row = record.row, error = %e, "Skipping grammar record");
          skipped += 1;
        }
      }
    }

    let mut mask_audit = MaskAudit::default();
    for q in &pool {
      for step in &q.mask_steps {
        mask_audit.record(*step);
      }
    }

    if config.mode == QuizMode::Mixed {
      pool.shuffle(rng);
    }
    let questions = match config.count {
      Some(n) if n < pool.len() => pool.choose_multiple(rng, n).cloned().collect(),
      Some(_) | None => pool,
    };

    if questions.is_empty() {
      warn!(target: "quiz", skipped, "No questions available for this selection");
      return Err(SessionError::NoQuestions);
    }
    info!(
      target: "quiz",
      questions = questions.len(),
      skipped,
      approximate_masks = mask_audit.approximate(),
      "Quiz prepared"
    );

    Ok(Self {
      config,
      questions,
      current: 0,
      answers: Vec::new(),
      skipped,
      mask_audit,
      started: Instant::now(),
      finished: None,
    })
  }

  pub fn config(&self) -> &SessionConfig {
    &self.config
  }

  pub fn questions(&self) -> &[QuestionRecord] {
    &self.questions
  }

  pub fn current_question(&self) -> Option<&QuestionRecord> {
    self.questions.get(self.current)
  }

  pub fn skipped(&self) -> usize {
    self.skipped
  }

  pub fn mask_audit(&self) -> &MaskAudit {
    &self.mask_audit
  }

  /// Record the answer to the current question and advance.
  #[instrument(level = "debug", skip(self), fields(question = self.current + 1))]
  pub fn submit_answer(&mut self, index: usize) -> Result<Feedback, SessionError> {
    let q = self.questions.get(self.current).ok_or(SessionError::Finished)?;
    if index >= q.options.len() {
      return Err(SessionError::AnswerOutOfRange { index, len: q.options.len() });
    }

    let is_correct = index == q.correct_index;
    let feedback = Feedback {
      is_correct,
      submitted_answer: q.options[index].clone(),
      correct_answer: q.correct_answer().to_string(),
      explanation: q.explanation.clone(),
      option_notes: q.option_notes.clone(),
      question_number: self.current + 1,
      total_questions: self.questions.len(),
    };
    self.answers.push(AnswerRecord {
      question_index: self.current,
      question_id: q.id.clone(),
      category: q.category,
      kind: q.kind.clone(),
      display_text: q.display_text.clone(),
      submitted_index: index,
      submitted_answer: feedback.submitted_answer.clone(),
      correct_answer: feedback.correct_answer.clone(),
      is_correct,
    });

    self.current += 1;
    if self.is_finished() {
      self.finished = Some(Instant::now());
    }
    Ok(feedback)
  }

  pub fn is_finished(&self) -> bool {
    self.current >= self.questions.len()
  }

  pub fn progress(&self) -> Progress {
    let total = self.questions.len();
    let answered = self.answers.len();
    Progress {
      current_question: (self.current + 1).min(total),
      total_questions: total,
      answered_questions: answered,
      correct_so_far: self.answers.iter().filter(|a| a.is_correct).count(),
      percentage_complete: if total > 0 { answered as f32 / total as f32 * 100.0 } else { 0.0 },
    }
  }

  pub fn results(&self) -> Result<ResultsSummary, SessionError> {
    if !self.is_finished() {
      return Err(SessionError::NotFinished);
    }
    let total = self.questions.len();
    let correct = self.answers.iter().filter(|a| a.is_correct).count();
    let end = self.finished.unwrap_or_else(Instant::now);
    let total_time_seconds = end.duration_since(self.started).as_secs();
    let score = Score::new(correct, total);

    let mut by_category: BTreeMap<Category, (usize, usize)> = BTreeMap::new();
    for a in &self.answers {
      let e = by_category.entry(a.category).or_insert((0, 0));
      e.1 += 1;
      if a.is_correct {
        e.0 += 1;
      }
    }

    let summary = ResultsSummary {
      config: self.config.clone(),
      total_questions: total,
      correct_answers: correct,
      incorrect_answers: total - correct,
      grade: Grade::from_percentage(score.percentage),
      score,
      total_time_seconds,
      average_time_per_question: if total > 0 { total_time_seconds as f32 / total as f32 } else { 0.0 },
      category_scores: by_category.into_iter().map(|(c, (ok, n))| (c, Score::new(ok, n))).collect(),
      weak_areas: weak_areas(&self.answers),
      skipped_records: self.skipped,
      mask_audit: self.mask_audit.clone(),
      answers: self.answers.clone(),
    };
    info!(
      target: "quiz",
      correct = summary.correct_answers,
      total = summary.total_questions,
      grade = ?summary.grade,
      "Quiz finished"
    );
    Ok(summary)
  }
}

fn narrow<R: CatalogRecord + Clone>(records: &[R], config: &SessionConfig) -> Vec<R> {
  let mut out = match config.difficulty {
    Some(d) => filter_by_difficulty(records, d),
    None => records.to_vec(),
  };
  if let Some(kind) = &config.kind {
    out = filter_by_kind(&out, kind);
  }
  out
}

/// Question kinds scoring under `WEAK_AREA_THRESHOLD`, with a few wrong
/// answers and study advice for each.
pub fn weak_areas(answers: &[AnswerRecord]) -> Vec<WeakArea> {
  let mut by_kind: BTreeMap<QuestionKind, Vec<&AnswerRecord>> = BTreeMap::new();
  for a in answers {
    by_kind.entry(a.kind.clone()).or_default().push(a);
  }

  by_kind
    .into_iter()
    .filter_map(|(kind, list)| {
      let correct = list.iter().filter(|a| a.is_correct).count();
      let performance = Score::new(correct, list.len());
      if performance.percentage >= WEAK_AREA_THRESHOLD {
        return None;
      }
      let wrong_questions = list
        .iter()
        .filter(|a| !a.is_correct)
        .take(MAX_WRONG_EXAMPLES)
        .map(|a| (*a).clone())
        .collect();
      let recommendations = recommendations(&kind, performance.percentage);
      Some(WeakArea { kind, performance, wrong_questions, recommendations })
    })
    .collect()
}

/// Kind-specific advice, with the score-band advice always kept as the last item.
fn recommendations(kind: &QuestionKind, percentage: f32) -> Vec<String> {
  let band = if percentage < BASICS_THRESHOLD { REVIEW_FROM_BASICS } else { FOCUS_ON_MISTAKES };
  let mut out: Vec<String> = recommendations_for(kind)
    .iter()
    .take(MAX_RECOMMENDATIONS - 1)
    .map(|s| s.to_string())
    .collect();
  out.push(band.to_string());
  out
}

#[cfg(test)]
mod tests {
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  use super::*;
  use crate::catalog::tests::{temp_dir, write_n4};

  fn config(mode: QuizMode, count: Option<usize>, show_phonetic: bool) -> SessionConfig {
    SessionConfig {
      level: Level::N4,
      mode,
      count,
      feedback_mode: FeedbackMode::Immediate,
      show_phonetic,
      difficulty: None,
      kind: None,
    }
  }

  fn store() -> CatalogStore {
    let dir = temp_dir();
    write_n4(&dir);
    CatalogStore::new(dir)
  }

  #[test]
  fn mixed_mode_uses_both_catalogs() {
    let store = store();
    let messages = Messages::default();
    let mut rng = StdRng::seed_from_u64(1);
    let s = QuizSession::prepare(&store, &messages, config(QuizMode::Mixed, None, false), &mut rng).expect("prepare");
    assert_eq!(s.questions().len(), 6);
    assert_eq!(s.skipped(), 0);
    assert_eq!(s.mask_audit().variant, 1);
  }

  #[test]
  fn reading_questions_are_skipped_when_readings_are_shown() {
    let store = store();
    let messages = Messages::default();
    let mut rng = StdRng::seed_from_u64(1);
    let s = QuizSession::prepare(&store, &messages, config(QuizMode::Vocabulary, None, true), &mut rng).expect("prepare");
    assert_eq!(s.questions().len(), 2);
    assert!(s.questions().iter().all(|q| q.kind != QuestionKind::Reading));
  }

  #[test]
  fn count_limits_the_selection() {
    let store = store();
    let messages = Messages::default();
    let mut rng = StdRng::seed_from_u64(2);
    let s = QuizSession::prepare(&store, &messages, config(QuizMode::Grammar, Some(2), false), &mut rng).expect("prepare");
    assert_eq!(s.questions().len(), 2);
    let all = QuizSession::prepare(&store, &messages, config(QuizMode::Grammar, Some(50), false), &mut rng).expect("prepare");
    assert_eq!(all.questions().len(), 3);
  }

  #[test]
  fn bad_records_are_skipped_and_counted() {
    let dir = temp_dir();
    std::fs::write(
      dir.join("n5_grammar.csv"),
      "\
grammar_pattern,japanese_sentence,hiragana_reading,korean_translation,question_type,difficulty
ので,雨なので行きません。,あめなのでいきません。,비가 와서 가지 않습니다.,listening,1
ておく,買っておきます。,かっておきます。,사 두겠습니다.,sentence_completion,1
",
    )
    .expect("write");
    let store = CatalogStore::new(dir);
    let messages = Messages::default();
    let mut cfg = config(QuizMode::Grammar, None, false);
    cfg.level = Level::N5;
    let s = QuizSession::prepare(&store, &messages, cfg, &mut StdRng::seed_from_u64(0)).expect("prepare");
    assert_eq!(s.questions().len(), 1);
    assert_eq!(s.skipped(), 1);
  }

  #[test]
  fn difficulty_and_kind_narrow_the_pool() {
    let store = store();
    let messages = Messages::default();
    let mut cfg = config(QuizMode::Mixed, None, false);
    cfg.difficulty = Some(1);
    let s = QuizSession::prepare(&store, &messages, cfg.clone(), &mut StdRng::seed_from_u64(4)).expect("prepare");
    assert_eq!(s.questions().len(), 3);
    assert!(s.questions().iter().all(|q| q.difficulty == 1));

    cfg.difficulty = None;
    cfg.kind = Some(QuestionKind::Reading);
    let s = QuizSession::prepare(&store, &messages, cfg.clone(), &mut StdRng::seed_from_u64(4)).expect("prepare");
    assert_eq!(s.questions().len(), 1);

    cfg.kind = Some(QuestionKind::Unknown("listening".into()));
    let err = QuizSession::prepare(&store, &messages, cfg, &mut StdRng::seed_from_u64(4));
    assert!(matches!(err, Err(SessionError::NoQuestions)));
  }

  #[test]
  fn missing_catalog_is_a_load_error() {
    let store = CatalogStore::new(temp_dir());
    let messages = Messages::default();
    let err = QuizSession::prepare(&store, &messages, config(QuizMode::Grammar, None, false), &mut StdRng::seed_from_u64(0));
    assert!(matches!(err, Err(SessionError::Load(_))));
  }

  #[test]
  fn answering_everything_produces_results() {
    let store = store();
    let messages = Messages::default();
    let mut rng = StdRng::seed_from_u64(5);
    let mut s = QuizSession::prepare(&store, &messages, config(QuizMode::Grammar, None, false), &mut rng).expect("prepare");
    assert!(matches!(s.results(), Err(SessionError::NotFinished)));

    // First question right, the rest wrong.
    let mut first = true;
    while let Some(q) = s.current_question() {
      let pick = if first { q.correct_index } else { (q.correct_index + 1) % q.options.len() };
      first = false;
      let fb = s.submit_answer(pick).expect("submit");
      assert_eq!(fb.total_questions, 3);
    }
    assert!(s.is_finished());
    assert!(matches!(s.submit_answer(0), Err(SessionError::Finished)));

    let r = s.results().expect("results");
    assert_eq!(r.correct_answers, 1);
    assert_eq!(r.incorrect_answers, 2);
    assert_eq!(r.grade, Grade::NeedsImprovement);
    assert_eq!(r.category_scores[&Category::Grammar].total, 3);
    // Three kinds, one question each; the two wrong ones are weak areas.
    assert_eq!(r.weak_areas.len(), 2);
    assert!(r.weak_areas.iter().all(|w| w.wrong_questions.len() == 1));
    assert_eq!(s.progress().percentage_complete, 100.0);
  }

  #[test]
  fn out_of_range_answer_is_rejected_without_advancing() {
    let store = store();
    let messages = Messages::default();
    let mut s =
      QuizSession::prepare(&store, &messages, config(QuizMode::Grammar, None, false), &mut StdRng::seed_from_u64(3)).expect("prepare");
    assert!(matches!(s.submit_answer(4), Err(SessionError::AnswerOutOfRange { index: 4, len: 4 })));
    assert_eq!(s.progress().answered_questions, 0);
    assert_eq!(s.progress().current_question, 1);
  }

  #[test]
  fn recommendations_end_with_score_band_advice() {
    let low = recommendations(&QuestionKind::Reading, 20.0);
    assert_eq!(low.len(), 3);
    assert_eq!(low.last().map(String::as_str), Some(REVIEW_FROM_BASICS));
    let mid = recommendations(&QuestionKind::PatternIdentification, 60.0);
    assert_eq!(mid, vec![FOCUS_ON_MISTAKES.to_string()]);
  }

  #[test]
  fn grade_bands() {
    assert_eq!(Grade::from_percentage(95.0), Grade::Excellent);
    assert_eq!(Grade::from_percentage(70.0), Grade::Good);
    assert_eq!(Grade::from_percentage(69.9).label(), "개선 필요");
  }
}
