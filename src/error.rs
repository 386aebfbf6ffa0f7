//! Error types: catalog loading, per-record question generation, and quiz sessions.
//!
//! Masking never fails; a masking fallback is reported through `MaskStep`
//! and `MaskAudit`, not through these types.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::{Category, QuestionKind};

/// Fatal for the operation that asked for the catalog.
#[derive(Debug, Error)]
pub enum DataLoadError {
  #[error("catalog file not found: {}", path.display())]
  NotFound { path: PathBuf },

  #[error("missing required columns in {}: {}", path.display(), columns.join(", "))]
  MissingColumns { path: PathBuf, columns: Vec<String> },

  #[error("catalog file is empty: {}", path.display())]
  Empty { path: PathBuf },

  #[error("malformed catalog {} (line {line}): {message}", path.display())]
  Malformed { path: PathBuf, line: u64, message: String },

  #[error("I/O error reading {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Raised for a single record; callers skip the record and keep going.
#[derive(Debug, Error)]
pub enum GenerationError {
  #[error("question kind '{kind}' is not supported for {category} records")]
  UnsupportedKind { kind: QuestionKind, category: Category },

  #[error("record is missing required field '{field}'")]
  MissingField { field: &'static str },
}

#[derive(Debug, Error)]
pub enum SessionError {
  #[error(transparent)]
  Load(#[from] DataLoadError),

  #[error("no questions could be generated for this selection")]
  NoQuestions,

  #[error("quiz is already finished")]
  Finished,

  #[error("quiz is not finished yet")]
  NotFinished,

  #[error("answer index {index} is out of range (0..{len})")]
  AnswerOutOfRange { index: usize, len: usize },

  #[error("unknown quiz mode: {0}")]
  UnknownMode(String),
}
