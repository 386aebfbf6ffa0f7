//! Catalog store: loads per-level grammar and vocabulary CSV files once and
//! caches them for the life of the process (or until `clear`).
//!
//! File layout under the data directory:
//!   - `<level>_grammar.csv`    (e.g. `n4_grammar.csv`)
//!   - `<level>_vocabulary.csv`
//!
//! The cache is guarded by a read-mostly lock so the HTTP server can share
//! one store between requests.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::domain::{Category, Level, PatternRecord, QuestionKind, VocabRecord};
use crate::error::DataLoadError;

pub const GRAMMAR_COLUMNS: &[&str] = &[
  "grammar_pattern",
  "japanese_sentence",
  "hiragana_reading",
  "korean_translation",
  "question_type",
  "difficulty",
];

pub const VOCABULARY_COLUMNS: &[&str] = &["kanji", "hiragana", "pos", "korean_meaning", "question_type", "difficulty"];

/// Fields shared by both record types, for generic filtering.
pub trait CatalogRecord {
  fn kind(&self) -> &QuestionKind;
  fn difficulty(&self) -> u8;
}

impl CatalogRecord for PatternRecord {
  fn kind(&self) -> &QuestionKind { &self.kind }
  fn difficulty(&self) -> u8 { self.difficulty }
}

impl CatalogRecord for VocabRecord {
  fn kind(&self) -> &QuestionKind { &self.kind }
  fn difficulty(&self) -> u8 { self.difficulty }
}

pub fn filter_by_difficulty<R: CatalogRecord + Clone>(records: &[R], difficulty: u8) -> Vec<R> {
  records.iter().filter(|r| r.difficulty() == difficulty).cloned().collect()
}

pub fn filter_by_kind<R: CatalogRecord + Clone>(records: &[R], kind: &QuestionKind) -> Vec<R> {
  records.iter().filter(|r| r.kind() == kind).cloned().collect()
}

pub fn kind_counts<R: CatalogRecord>(records: &[R]) -> BTreeMap<QuestionKind, usize> {
  let mut out = BTreeMap::new();
  for r in records {
    *out.entry(r.kind().clone()).or_insert(0) += 1;
  }
  out
}

#[derive(Deserialize)]
struct GrammarRow {
  grammar_pattern: String,
  japanese_sentence: String,
  hiragana_reading: String,
  korean_translation: String,
  question_type: String,
  difficulty: String,
}

#[derive(Deserialize)]
struct VocabularyRow {
  kanji: String,
  hiragana: String,
  pos: String,
  korean_meaning: String,
  question_type: String,
  difficulty: String,
}

/// Integer cells, tolerating spreadsheet floats like `2.0`. Anything else is 0.
fn parse_difficulty(cell: &str) -> u8 {
  let t = cell.trim();
  if let Ok(n) = t.parse::<u8>() {
    return n;
  }
  match t.parse::<f32>() {
    Ok(f) if f.fract() == 0.0 && (0.0..=255.0).contains(&f) => f as u8,
    _ => 0,
  }
}

fn malformed(path: &Path, e: csv::Error) -> DataLoadError {
  DataLoadError::Malformed {
    path: path.to_path_buf(),
    line: e.position().map(|p| p.line()).unwrap_or(0),
    message: e.to_string(),
  }
}

/// Open `path`, check the header row against `required`, and deserialize
/// every data row through `convert` (which receives the 1-based row index).
fn load_csv<Row, Rec>(path: &Path, required: &[&str], convert: impl Fn(Row, usize) -> Rec) -> Result<Vec<Rec>, DataLoadError>
where
  Row: DeserializeOwned,
{
  if !path.exists() {
    return Err(DataLoadError::NotFound { path: path.to_path_buf() });
  }
  let file = File::open(path).map_err(|source| DataLoadError::Io { path: path.to_path_buf(), source })?;
  let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);

  let headers = reader.headers().map_err(|e| malformed(path, e))?.clone();
  if headers.iter().all(|h| h.is_empty()) {
    return Err(DataLoadError::Empty { path: path.to_path_buf() });
  }
  let missing: Vec<String> = required
    .iter()
    .filter(|col| !headers.iter().any(|h| h == **col))
    .map(|col| col.to_string())
    .collect();
  if !missing.is_empty() {
    return Err(DataLoadError::MissingColumns { path: path.to_path_buf(), columns: missing });
  }

  let mut out = Vec::new();
  for (i, row) in reader.deserialize::<Row>().enumerate() {
    let row = row.map_err(|e| malformed(path, e))?;
    out.push(convert(row, i + 1));
  }
  if out.is_empty() {
    return Err(DataLoadError::Empty { path: path.to_path_buf() });
  }
  Ok(out)
}

pub fn load_grammar_file(path: &Path) -> Result<Vec<PatternRecord>, DataLoadError> {
  load_csv(path, GRAMMAR_COLUMNS, |r: GrammarRow, row| PatternRecord {
    pattern_id: r.grammar_pattern,
    primary_text: r.japanese_sentence,
    phonetic_text: r.hiragana_reading,
    translation: r.korean_translation,
    kind: QuestionKind::from(r.question_type),
    difficulty: parse_difficulty(&r.difficulty),
    row,
  })
}

pub fn load_vocabulary_file(path: &Path) -> Result<Vec<VocabRecord>, DataLoadError> {
  load_csv(path, VOCABULARY_COLUMNS, |r: VocabularyRow, row| VocabRecord {
    term: r.kanji,
    reading: r.hiragana,
    pos: r.pos,
    meaning: r.korean_meaning,
    kind: QuestionKind::from(r.question_type),
    difficulty: parse_difficulty(&r.difficulty),
    row,
  })
}

type Cache<T> = RwLock<HashMap<Level, Arc<[T]>>>;

/// Load-once cache of catalog records, keyed by level.
pub struct CatalogStore {
  data_dir: PathBuf,
  grammar: Cache<PatternRecord>,
  vocabulary: Cache<VocabRecord>,
}

impl CatalogStore {
  pub fn new(data_dir: impl Into<PathBuf>) -> Self {
    Self {
      data_dir: data_dir.into(),
      grammar: RwLock::new(HashMap::new()),
      vocabulary: RwLock::new(HashMap::new()),
    }
  }

  pub fn data_dir(&self) -> &Path {
    &self.data_dir
  }

  pub fn path_for(&self, level: Level, category: Category) -> PathBuf {
    self.data_dir.join(format!("{}_{}.csv", level.file_prefix(), category.as_str()))
  }

  #[instrument(level = "debug", skip(self), fields(%level))]
  pub fn grammar(&self, level: Level) -> Result<Arc<[PatternRecord]>, DataLoadError> {
    cached_or_load(&self.grammar, level, || load_grammar_file(&self.path_for(level, Category::Grammar)))
  }

  #[instrument(level = "debug", skip(self), fields(%level))]
  pub fn vocabulary(&self, level: Level) -> Result<Arc<[VocabRecord]>, DataLoadError> {
    cached_or_load(&self.vocabulary, level, || load_vocabulary_file(&self.path_for(level, Category::Vocabulary)))
  }

  /// Drop every cached catalog; the next access reloads from disk.
  pub fn clear(&self) {
    self.grammar.write().unwrap_or_else(PoisonError::into_inner).clear();
    self.vocabulary.write().unwrap_or_else(PoisonError::into_inner).clear();
    info!(target: "catalog", "Catalog cache cleared");
  }

  /// Levels for which both catalog files exist on disk.
  pub fn available_levels(&self) -> Vec<Level> {
    Level::ALL
      .into_iter()
      .filter(|l| self.path_for(*l, Category::Grammar).exists() && self.path_for(*l, Category::Vocabulary).exists())
      .collect()
  }

  /// Rows per question kind, sorted by kind.
  pub fn kind_counts(&self, level: Level, category: Category) -> Result<BTreeMap<QuestionKind, usize>, DataLoadError> {
    Ok(match category {
      Category::Grammar => kind_counts(&self.grammar(level)?),
      Category::Vocabulary => kind_counts(&self.vocabulary(level)?),
    })
  }
}

fn cached_or_load<T>(
  cache: &Cache<T>,
  level: Level,
  load: impl FnOnce() -> Result<Vec<T>, DataLoadError>,
) -> Result<Arc<[T]>, DataLoadError> {
  if let Some(hit) = cache.read().unwrap_or_else(PoisonError::into_inner).get(&level) {
    debug!(target: "catalog", %level, rows = hit.len(), "Catalog cache hit");
    return Ok(hit.clone());
  }
  let records: Arc<[T]> = load()?.into();
  info!(target: "catalog", %level, rows = records.len(), "Catalog loaded");
  let mut guard = cache.write().unwrap_or_else(PoisonError::into_inner);
  // A concurrent loader may have won the race; keep the first snapshot.
  Ok(guard.entry(level).or_insert(records).clone())
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;

  /// Fresh, uniquely named directory under the system temp dir.
  pub(crate) fn temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("jlpt-quiz-test-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
  }

  pub(crate) const N4_GRAMMAR: &str = "\
grammar_pattern,japanese_sentence,hiragana_reading,korean_translation,question_type,difficulty
ておく,明日の会議のために資料を準備しておきました。,あしたのかいぎのためにしりょうをじゅんびしておきました。,내일 회의를 위해 자료를 준비해 두었습니다.,sentence_completion,2
ので,昨日は雨が降ったので、家にいた。,きのうはあめがふったので、いえにいた。,어제는 비가 와서 집에 있었다.,meaning_comprehension,1
と思う,彼は学生だと思います。,かれはがくせいだとおもいます。,그는 학생이라고 생각합니다.,pattern_identification,x
";

  pub(crate) const N4_VOCABULARY: &str = "\
kanji,hiragana,pos,korean_meaning,question_type,difficulty
食べる,たべる,verb,먹다,meaning_to_japanese,1
飲む,のむ,verb,마시다,japanese_to_meaning,1
学校,がっこう,noun,학교,reading,2
";

  pub(crate) fn write_n4(dir: &Path) {
    std::fs::write(dir.join("n4_grammar.csv"), N4_GRAMMAR).expect("write grammar");
    std::fs::write(dir.join("n4_vocabulary.csv"), N4_VOCABULARY).expect("write vocabulary");
  }

  #[test]
  fn loads_and_caches_grammar() {
    let dir = temp_dir();
    write_n4(&dir);
    let store = CatalogStore::new(&dir);

    let first = store.grammar(Level::N4).expect("load");
    assert_eq!(first.len(), 3);
    assert_eq!(first[0].pattern_id, "ておく");
    assert_eq!(first[0].kind, QuestionKind::SentenceCompletion);
    assert_eq!(first[0].row, 1);
    // Non-integer difficulty loads as 0 so validation can flag it.
    assert_eq!(first[2].difficulty, 0);

    // Cached: the file can disappear without affecting reads.
    std::fs::remove_file(dir.join("n4_grammar.csv")).expect("remove");
    let second = store.grammar(Level::N4).expect("cached");
    assert!(Arc::ptr_eq(&first, &second));

    store.clear();
    assert!(matches!(store.grammar(Level::N4), Err(DataLoadError::NotFound { .. })));
  }

  #[test]
  fn missing_columns_are_named() {
    let dir = temp_dir();
    std::fs::write(dir.join("n5_grammar.csv"), "grammar_pattern,japanese_sentence\nて,食べて\n").expect("write");
    let store = CatalogStore::new(&dir);
    match store.grammar(Level::N5) {
      Err(DataLoadError::MissingColumns { columns, .. }) => {
        assert_eq!(columns, vec!["hiragana_reading", "korean_translation", "question_type", "difficulty"]);
      }
      other => panic!("expected MissingColumns, got {other:?}"),
    }
  }

  #[test]
  fn empty_and_header_only_files_are_distinct_from_not_found() {
    let dir = temp_dir();
    std::fs::write(dir.join("n3_vocabulary.csv"), "").expect("write");
    std::fs::write(dir.join("n2_vocabulary.csv"), format!("{}\n", VOCABULARY_COLUMNS.join(","))).expect("write");
    let store = CatalogStore::new(&dir);
    assert!(matches!(store.vocabulary(Level::N3), Err(DataLoadError::Empty { .. })));
    assert!(matches!(store.vocabulary(Level::N2), Err(DataLoadError::Empty { .. })));
    assert!(matches!(store.vocabulary(Level::N1), Err(DataLoadError::NotFound { .. })));
  }

  #[test]
  fn ragged_row_is_malformed_with_line() {
    let dir = temp_dir();
    let body = format!("{}\n食べる,たべる,verb\n", VOCABULARY_COLUMNS.join(","));
    std::fs::write(dir.join("n4_vocabulary.csv"), body).expect("write");
    let store = CatalogStore::new(&dir);
    match store.vocabulary(Level::N4) {
      Err(DataLoadError::Malformed { line, message, .. }) => {
        assert!(line >= 1);
        assert!(!message.is_empty());
      }
      other => panic!("expected Malformed, got {other:?}"),
    }
  }

  #[test]
  fn kinds_counts_and_filters() {
    let dir = temp_dir();
    write_n4(&dir);
    let store = CatalogStore::new(&dir);
    assert_eq!(store.available_levels(), vec![Level::N4]);

    let kinds = store.kind_counts(Level::N4, Category::Vocabulary).expect("kinds");
    assert_eq!(kinds.len(), 3);

    let counts = store.kind_counts(Level::N4, Category::Grammar).expect("counts");
    assert_eq!(counts.get(&QuestionKind::SentenceCompletion), Some(&1));

    let vocab = store.vocabulary(Level::N4).expect("vocab");
    assert_eq!(filter_by_difficulty(&vocab, 1).len(), 2);
    assert_eq!(filter_by_kind(&vocab, &QuestionKind::Reading)[0].term, "学校");
  }

  #[test]
  fn difficulty_cells_tolerate_floats() {
    assert_eq!(parse_difficulty("2"), 2);
    assert_eq!(parse_difficulty(" 3.0 "), 3);
    assert_eq!(parse_difficulty("2.5"), 0);
    assert_eq!(parse_difficulty("nan"), 0);
  }
}
