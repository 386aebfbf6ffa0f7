//! Question assembly: turns one catalog record into a multiple-choice
//! `QuestionRecord`, masking the answer where the question kind requires it.
//!
//! Distractors are drawn without replacement from the same-level catalog
//! (and, for patterns and readings, topped up from `seeds`). When the pool
//! is still short, clearly synthetic labels from `Messages::option_padding`
//! fill the set so every question has exactly `OPTION_COUNT` distinct options.

use std::borrow::Cow;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, instrument, warn};

use crate::config::Messages;
use crate::domain::{Category, Level, PatternRecord, QuestionKind, QuestionRecord, VocabRecord, OPTION_COUNT};
use crate::error::GenerationError;
use crate::masking::{blank_all, mask, BlankWidth};
use crate::seeds::{GRAMMAR_PATTERN_POOL, READING_POOL};
use crate::util::{contains_hangul, display_width, fill_template, has_distinct_reading, is_missing, pad_to_width, stable_hash};

const DISTRACTORS: usize = OPTION_COUNT - 1;

/// Builds questions for one level. Borrows the level's catalogs for
/// distractor sampling and annotation lookups.
pub struct Assembler<'a> {
  level: Level,
  grammar: &'a [PatternRecord],
  vocabulary: &'a [VocabRecord],
  messages: &'a Messages,
}

impl<'a> Assembler<'a> {
  pub fn new(level: Level, grammar: &'a [PatternRecord], vocabulary: &'a [VocabRecord], messages: &'a Messages) -> Self {
    Self { level, grammar, vocabulary, messages }
  }

  #[instrument(level = "debug", skip(self, record, rng), fields(row = record.row, kind = %record.kind))]
  pub fn grammar_question<R: Rng + ?Sized>(
    &self,
    record: &PatternRecord,
    show_phonetic: bool,
    rng: &mut R,
  ) -> Result<QuestionRecord, GenerationError> {
    let record = repair_corrupted(record, self.messages);
    let q = match record.kind {
      QuestionKind::SentenceCompletion => self.sentence_completion(&record, show_phonetic, rng)?,
      QuestionKind::MeaningComprehension => self.meaning_comprehension(&record, show_phonetic, rng)?,
      QuestionKind::PatternIdentification => self.pattern_identification(&record, show_phonetic, rng)?,
      ref other => {
        return Err(GenerationError::UnsupportedKind { kind: other.clone(), category: Category::Grammar });
      }
    };
    debug!(target: "quiz", id = %q.id, steps = ?q.mask_steps, "Grammar question assembled");
    Ok(q)
  }

  #[instrument(level = "debug", skip(self, record, rng), fields(row = record.row, kind = %record.kind))]
  pub fn vocabulary_question<R: Rng + ?Sized>(
    &self,
    record: &VocabRecord,
    show_phonetic: bool,
    rng: &mut R,
  ) -> Result<QuestionRecord, GenerationError> {
    if is_missing(&record.term) {
      return Err(GenerationError::MissingField { field: "kanji" });
    }
    let q = match record.kind {
      QuestionKind::Reading => self.reading(record, show_phonetic, rng)?,
      QuestionKind::MeaningToJapanese => self.meaning_to_japanese(record, show_phonetic, rng)?,
      QuestionKind::JapaneseToMeaning => self.japanese_to_meaning(record, show_phonetic, rng)?,
      ref other => {
        return Err(GenerationError::UnsupportedKind { kind: other.clone(), category: Category::Vocabulary });
      }
    };
    debug!(target: "quiz", id = %q.id, "Vocabulary question assembled");
    Ok(q)
  }

  // ---- grammar kinds ----

  fn sentence_completion<R: Rng + ?Sized>(
    &self,
    record: &PatternRecord,
    show_phonetic: bool,
    rng: &mut R,
  ) -> Result<QuestionRecord, GenerationError> {
    require(&record.pattern_id, "grammar_pattern")?;
    require(&record.primary_text, "japanese_sentence")?;

    let primary = mask(&record.primary_text, &record.pattern_id, BlankWidth::Fixed);
    let mut steps = vec![primary.step];
    debug!(target: "masking", pattern = %record.pattern_id, matched = ?primary.matched_text(), step = ?primary.step, "Primary sentence masked");
    let phonetic = phonetic_if_shown(&record.phonetic_text, show_phonetic).map(|text| {
      let m = mask(text, &record.pattern_id, BlankWidth::Span);
      steps.push(m.step);
      m.masked
    });

    let wrong = self.pattern_distractors(&record.pattern_id, rng);
    let (options, correct_index) = build_options(record.pattern_id.clone(), wrong, &self.messages.option_padding, rng);
    let explanation = fill_template(
      self.messages.explanation_for(&record.kind),
      &[("pattern", &record.pattern_id), ("sentence", &record.primary_text), ("translation", &record.translation)],
    );

    Ok(QuestionRecord {
      id: grammar_id(record),
      level: self.level,
      category: Category::Grammar,
      kind: record.kind.clone(),
      difficulty: record.difficulty,
      prompt_text: self.messages.prompt_for(&record.kind).to_string(),
      display_text: with_reading(&primary.masked, phonetic.as_deref()),
      options,
      correct_index,
      explanation,
      meaning: record.translation.clone(),
      show_phonetic,
      option_notes: Vec::new(),
      mask_steps: steps,
    })
  }

  fn meaning_comprehension<R: Rng + ?Sized>(
    &self,
    record: &PatternRecord,
    show_phonetic: bool,
    rng: &mut R,
  ) -> Result<QuestionRecord, GenerationError> {
    require(&record.primary_text, "japanese_sentence")?;
    require(&record.translation, "korean_translation")?;

    // Asking for the translation; the pattern in the sentence gives nothing away.
    let phonetic = phonetic_if_shown(&record.phonetic_text, show_phonetic);
    let wrong = sample_distinct(self.grammar.iter().map(|r| r.translation.clone()), &record.translation, DISTRACTORS, rng);
    let (options, correct_index) = build_options(record.translation.clone(), wrong, &self.messages.option_padding, rng);

    let option_notes = options
      .iter()
      .filter_map(|opt| {
        let row = if *opt == record.translation {
          Some(record)
        } else {
          self.grammar.iter().find(|r| r.translation == *opt)
        }?;
        sentence_note(&row.primary_text, &row.phonetic_text, opt)
      })
      .collect();

    let explanation = fill_template(
      self.messages.explanation_for(&record.kind),
      &[("pattern", &record.pattern_id), ("sentence", &record.primary_text), ("translation", &record.translation)],
    );

    Ok(QuestionRecord {
      id: grammar_id(record),
      level: self.level,
      category: Category::Grammar,
      kind: record.kind.clone(),
      difficulty: record.difficulty,
      prompt_text: self.messages.prompt_for(&record.kind).to_string(),
      display_text: with_reading(&record.primary_text, phonetic),
      options,
      correct_index,
      explanation,
      meaning: record.translation.clone(),
      show_phonetic,
      option_notes,
      mask_steps: Vec::new(),
    })
  }

  fn pattern_identification<R: Rng + ?Sized>(
    &self,
    record: &PatternRecord,
    show_phonetic: bool,
    rng: &mut R,
  ) -> Result<QuestionRecord, GenerationError> {
    require(&record.pattern_id, "grammar_pattern")?;
    require(&record.primary_text, "japanese_sentence")?;

    // The primary sentence stays intact; only the reading is masked.
    let mut steps = Vec::new();
    let phonetic = phonetic_if_shown(&record.phonetic_text, show_phonetic).map(|text| {
      let m = mask(text, &record.pattern_id, BlankWidth::Span);
      steps.push(m.step);
      m.masked
    });

    let wrong = self.pattern_distractors(&record.pattern_id, rng);
    let (options, correct_index) = build_options(record.pattern_id.clone(), wrong, &self.messages.option_padding, rng);
    let explanation = fill_template(
      self.messages.explanation_for(&record.kind),
      &[("pattern", &record.pattern_id), ("sentence", &record.primary_text), ("translation", &record.translation)],
    );

    Ok(QuestionRecord {
      id: grammar_id(record),
      level: self.level,
      category: Category::Grammar,
      kind: record.kind.clone(),
      difficulty: record.difficulty,
      prompt_text: self.messages.prompt_for(&record.kind).to_string(),
      display_text: with_reading(&record.primary_text, phonetic.as_deref()),
      options,
      correct_index,
      explanation,
      meaning: record.translation.clone(),
      show_phonetic,
      option_notes: Vec::new(),
      mask_steps: steps,
    })
  }

  /// Other catalog patterns first, then the built-in pool.
  fn pattern_distractors<R: Rng + ?Sized>(&self, correct: &str, rng: &mut R) -> Vec<String> {
    let picked = sample_distinct(self.grammar.iter().map(|r| r.pattern_id.clone()), correct, DISTRACTORS, rng);
    top_up(picked, GRAMMAR_PATTERN_POOL, correct, rng)
  }

  // ---- vocabulary kinds ----

  fn reading<R: Rng + ?Sized>(&self, record: &VocabRecord, show_phonetic: bool, rng: &mut R) -> Result<QuestionRecord, GenerationError> {
    require(&record.reading, "hiragana")?;

    let candidates = self.vocab_candidates(record).into_iter().map(|r| r.reading.clone());
    let picked = sample_distinct(candidates, &record.reading, DISTRACTORS, rng);
    let wrong = top_up(picked, READING_POOL, &record.reading, rng);
    let (options, correct_index) = build_options(record.reading.clone(), wrong, &self.messages.option_padding, rng);

    // The reading is the answer: when readings are on, show only its length.
    let hidden = show_phonetic.then(|| blank_all(&record.reading, BlankWidth::Span));
    let notes = options
      .iter()
      .filter_map(|opt| self.vocab_note_row(record, |r| r.reading == *opt))
      .collect::<Vec<_>>();

    Ok(self.vocab_record(record, show_phonetic, with_reading(&record.term, hidden.as_deref()), options, correct_index, aligned_notes(&notes)))
  }

  fn meaning_to_japanese<R: Rng + ?Sized>(
    &self,
    record: &VocabRecord,
    show_phonetic: bool,
    rng: &mut R,
  ) -> Result<QuestionRecord, GenerationError> {
    require(&record.meaning, "korean_meaning")?;

    let candidates = self.vocab_candidates(record).into_iter().map(|r| r.term.clone());
    let wrong = sample_distinct(candidates, &record.term, DISTRACTORS, rng);
    let (terms, correct_index) = build_options(record.term.clone(), wrong, &self.messages.option_padding, rng);

    let rows: Vec<Option<&VocabRecord>> = terms.iter().map(|t| self.vocab_row(record, |r| r.term == *t)).collect();
    let options = if show_phonetic && has_distinct_reading(&record.term, &record.reading) {
      let pairs: Vec<(String, String)> = terms
        .iter()
        .zip(&rows)
        .map(|(t, row)| {
          let reading = row.filter(|r| has_distinct_reading(&r.term, &r.reading)).map(|r| r.reading.clone());
          (t.clone(), reading.unwrap_or_default())
        })
        .collect();
      align_term_options(&pairs)
    } else {
      terms
    };

    let notes: Vec<(String, String, String)> = rows.iter().flatten().map(|r| note_row(r)).collect();
    Ok(self.vocab_record(record, show_phonetic, record.meaning.clone(), options, correct_index, aligned_notes(&notes)))
  }

  fn japanese_to_meaning<R: Rng + ?Sized>(
    &self,
    record: &VocabRecord,
    show_phonetic: bool,
    rng: &mut R,
  ) -> Result<QuestionRecord, GenerationError> {
    require(&record.meaning, "korean_meaning")?;

    let candidates = self.vocab_candidates(record).into_iter().map(|r| r.meaning.clone());
    let wrong = sample_distinct(candidates, &record.meaning, DISTRACTORS, rng);
    let (options, correct_index) = build_options(record.meaning.clone(), wrong, &self.messages.option_padding, rng);

    let reading = (show_phonetic && has_distinct_reading(&record.term, &record.reading)).then_some(record.reading.as_str());
    let notes = options
      .iter()
      .filter_map(|opt| self.vocab_note_row(record, |r| r.meaning == *opt))
      .collect::<Vec<_>>();

    Ok(self.vocab_record(record, show_phonetic, with_reading(&record.term, reading), options, correct_index, aligned_notes(&notes)))
  }

  /// Same part of speech first; any other term when that leaves fewer than
  /// three candidates.
  fn vocab_candidates(&self, record: &VocabRecord) -> Vec<&'a VocabRecord> {
    let same_pos: Vec<&VocabRecord> = self
      .vocabulary
      .iter()
      .filter(|r| r.pos == record.pos && r.term != record.term)
      .collect();
    if same_pos.len() >= DISTRACTORS {
      return same_pos;
    }
    self.vocabulary.iter().filter(|r| r.term != record.term).collect()
  }

  /// The record itself when it matches, else the first catalog row that does.
  fn vocab_row<'r>(&'r self, record: &'r VocabRecord, pred: impl Fn(&VocabRecord) -> bool) -> Option<&'r VocabRecord> {
    if pred(record) {
      Some(record)
    } else {
      self.vocabulary.iter().find(|r| pred(*r))
    }
  }

  fn vocab_note_row(&self, record: &VocabRecord, pred: impl Fn(&VocabRecord) -> bool) -> Option<(String, String, String)> {
    self.vocab_row(record, pred).map(note_row)
  }

  fn vocab_record(
    &self,
    record: &VocabRecord,
    show_phonetic: bool,
    display_text: String,
    options: Vec<String>,
    correct_index: usize,
    option_notes: Vec<String>,
  ) -> QuestionRecord {
    let reading = if is_missing(&record.reading) { "" } else { record.reading.as_str() };
    let explanation = fill_template(
      self.messages.explanation_for(&record.kind),
      &[("term", &record.term), ("reading", reading), ("meaning", &record.meaning)],
    );
    QuestionRecord {
      id: vocabulary_id(record),
      level: self.level,
      category: Category::Vocabulary,
      kind: record.kind.clone(),
      difficulty: record.difficulty,
      prompt_text: self.messages.prompt_for(&record.kind).to_string(),
      display_text,
      options,
      correct_index,
      explanation,
      meaning: record.meaning.clone(),
      show_phonetic,
      option_notes,
      mask_steps: Vec::new(),
    }
  }
}

/// Hangul in the primary sentence means the export swapped columns. Use the
/// reading instead, or a placeholder naming the pattern when that is also bad.
pub fn repair_corrupted<'r>(record: &'r PatternRecord, messages: &Messages) -> Cow<'r, PatternRecord> {
  if !contains_hangul(&record.primary_text) {
    return Cow::Borrowed(record);
  }
  let mut fixed = record.clone();
  if !is_missing(&record.phonetic_text) && !contains_hangul(&record.phonetic_text) {
    fixed.primary_text = record.phonetic_text.clone();
    warn!(target: "quiz", row = record.row, pattern = %record.pattern_id, "Hangul in primary sentence; using reading");
  } else {
    let placeholder = fill_template(&messages.placeholder_sentence, &[("pattern", &record.pattern_id)]);
    fixed.primary_text = placeholder.clone();
    fixed.phonetic_text = placeholder;
    warn!(target: "quiz", row = record.row, pattern = %record.pattern_id, "Hangul in primary sentence and reading; using placeholder");
  }
  Cow::Owned(fixed)
}

fn require(value: &str, field: &'static str) -> Result<(), GenerationError> {
  if is_missing(value) {
    Err(GenerationError::MissingField { field })
  } else {
    Ok(())
  }
}

fn phonetic_if_shown(text: &str, show_phonetic: bool) -> Option<&str> {
  (show_phonetic && !is_missing(text)).then_some(text)
}

fn with_reading(primary: &str, reading: Option<&str>) -> String {
  match reading {
    Some(r) => format!("{primary}\n({r})"),
    None => primary.to_string(),
  }
}

fn question_id(category: Category, kind: &QuestionKind, fields: &[&str]) -> String {
  format!("{}_{}_{}", category, kind, stable_hash(fields))
}

fn grammar_id(r: &PatternRecord) -> String {
  let row = r.row.to_string();
  let fields = [r.pattern_id.as_str(), r.primary_text.as_str(), r.phonetic_text.as_str(), r.translation.as_str(), row.as_str()];
  question_id(Category::Grammar, &r.kind, &fields)
}

fn vocabulary_id(r: &VocabRecord) -> String {
  let row = r.row.to_string();
  let fields = [r.term.as_str(), r.reading.as_str(), r.pos.as_str(), r.meaning.as_str(), row.as_str()];
  question_id(Category::Vocabulary, &r.kind, &fields)
}

/// Up to `n` distinct, non-missing candidates other than `correct`, sampled
/// without replacement.
fn sample_distinct<R: Rng + ?Sized>(candidates: impl IntoIterator<Item = String>, correct: &str, n: usize, rng: &mut R) -> Vec<String> {
  let mut pool: Vec<String> = Vec::new();
  for c in candidates {
    if c != correct && !is_missing(&c) && !pool.contains(&c) {
      pool.push(c);
    }
  }
  pool.choose_multiple(rng, n).cloned().collect()
}

fn top_up<R: Rng + ?Sized>(mut picked: Vec<String>, fallback: &[&str], correct: &str, rng: &mut R) -> Vec<String> {
  if picked.len() < DISTRACTORS {
    let fresh: Vec<String> = fallback.iter().map(|s| s.to_string()).filter(|s| !picked.contains(s)).collect();
    let extra = sample_distinct(fresh, correct, DISTRACTORS - picked.len(), rng);
    picked.extend(extra);
  }
  picked
}

/// Correct answer plus three distractors, padded with numbered labels when
/// short, shuffled. Returns the options and the correct answer's index.
fn build_options<R: Rng + ?Sized>(correct: String, wrong: Vec<String>, padding: &str, rng: &mut R) -> (Vec<String>, usize) {
  let mut others: Vec<String> = Vec::with_capacity(OPTION_COUNT);
  for w in wrong {
    if others.len() == DISTRACTORS {
      break;
    }
    if w != correct && !others.contains(&w) {
      others.push(w);
    }
  }

  // Labels are numbered by option position so they read as placeholders.
  let mut n = others.len() + 1;
  while others.len() < DISTRACTORS {
    let label = if padding.contains("{n}") {
      fill_template(padding, &[("n", &n.to_string())])
    } else {
      format!("{padding} {n}")
    };
    n += 1;
    if label != correct && !others.contains(&label) {
      others.push(label);
    }
  }

  others.shuffle(rng);
  let correct_index = rng.gen_range(0..OPTION_COUNT);
  others.insert(correct_index, correct);
  (others, correct_index)
}

/// `term  (reading)` with the reading column aligned across options.
fn align_term_options(pairs: &[(String, String)]) -> Vec<String> {
  let term_width = pairs.iter().map(|(t, _)| display_width(t)).max().unwrap_or(0);
  pairs
    .iter()
    .map(|(t, r)| {
      if r.is_empty() {
        t.clone()
      } else {
        format!("{}({})", pad_to_width(t, term_width + 2), r)
      }
    })
    .collect()
}

fn note_row(r: &VocabRecord) -> (String, String, String) {
  let reading = if has_distinct_reading(&r.term, &r.reading) { r.reading.clone() } else { String::new() };
  (r.term.clone(), reading, r.meaning.clone())
}

/// `term    (reading)    meaning` lines with both leading columns aligned.
fn aligned_notes(rows: &[(String, String, String)]) -> Vec<String> {
  let term_width = rows.iter().map(|(t, _, _)| display_width(t)).max().unwrap_or(0);
  let reading_width = rows
    .iter()
    .filter(|(_, r, _)| !r.is_empty())
    .map(|(_, r, _)| display_width(r))
    .max()
    .unwrap_or(0);
  rows
    .iter()
    .filter(|(t, _, m)| !is_missing(t) && !is_missing(m))
    .map(|(t, r, m)| {
      if r.is_empty() {
        format!("{}{}", pad_to_width(t, term_width + 4 + reading_width + 2 + 4), m)
      } else {
        let reading = format!("({r})");
        format!("{}{}{}", pad_to_width(t, term_width + 4), pad_to_width(&reading, reading_width + 2 + 4), m)
      }
    })
    .collect()
}

/// Three-line review block: sentence, reading, translation.
fn sentence_note(sentence: &str, reading: &str, translation: &str) -> Option<String> {
  if is_missing(sentence) || is_missing(translation) {
    return None;
  }
  let reading = if is_missing(reading) { "" } else { reading };
  Some(format!("• {sentence}\n    {reading}\n    {translation}"))
}
