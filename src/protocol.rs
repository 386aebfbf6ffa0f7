//! Public protocol structs for the HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{Category, Level, QuestionKind, QuestionRecord};
use crate::session::{Feedback, Progress};

/// A question as shown to the learner; the answer stays on the server.
#[derive(Debug, Serialize)]
pub struct QuestionOut {
  pub id: String,
  pub number: usize,
  pub total: usize,
  pub level: Level,
  pub category: Category,
  pub kind: QuestionKind,
  pub prompt_text: String,
  pub display_text: String,
  pub options: Vec<String>,
  pub show_phonetic: bool,
}

/// Convert an assembled question (internal) to the public DTO.
pub fn to_out(q: &QuestionRecord, progress: &Progress) -> QuestionOut {
  QuestionOut {
    id: q.id.clone(),
    number: progress.current_question,
    total: progress.total_questions,
    level: q.level,
    category: q.category,
    kind: q.kind.clone(),
    prompt_text: q.prompt_text.clone(),
    display_text: q.display_text.clone(),
    options: q.options.clone(),
    show_phonetic: q.show_phonetic,
  }
}

#[derive(Serialize)]
pub struct StartQuizOut {
  pub session_id: String,
  pub skipped_records: usize,
  pub progress: Progress,
  pub question: QuestionOut,
}

#[derive(Deserialize)]
pub struct AnswerIn {
  /// 0-based option index.
  pub answer: usize,
}

#[derive(Serialize)]
pub struct AnswerOut {
  pub progress: Progress,
  pub finished: bool,
  /// Only present in immediate feedback mode.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub feedback: Option<Feedback>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub next_question: Option<QuestionOut>,
}

#[derive(Debug, Deserialize)]
pub struct MaskIn {
  pub text: String,
  pub pattern: String,
  /// Blank proportional to the replaced span instead of the fixed `____`.
  #[serde(default)]
  pub span_width: bool,
}

#[derive(Debug, Deserialize)]
pub struct ValidateQuery {
  pub level: Option<String>,
}

#[derive(Serialize)]
pub struct HealthOut {
  pub ok: bool,
  pub levels: Vec<Level>,
}

#[derive(Serialize)]
pub struct ErrorOut {
  pub error: String,
}
