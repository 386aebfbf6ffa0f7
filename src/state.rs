//! Application state for `serve` mode: the shared catalog cache, message
//! templates, and the in-memory quiz sessions keyed by UUID.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::catalog::CatalogStore;
use crate::config::AppConfig;
use crate::error::SessionError;
use crate::protocol::{to_out, AnswerOut, QuestionOut, StartQuizOut};
use crate::session::{QuizSession, ResultsSummary, SessionConfig};
use crate::domain::FeedbackMode;

pub struct AppState {
  pub store: CatalogStore,
  pub config: AppConfig,
  pub sessions: RwLock<HashMap<String, QuizSession>>,
}

impl AppState {
  #[instrument(level = "info", skip_all, fields(data_dir = %config.data_dir.display()))]
  pub fn new(config: AppConfig) -> Self {
    let store = CatalogStore::new(config.data_dir.clone());
    let levels = store.available_levels();
    info!(target: "jlpt_quiz", ?levels, "Startup catalog inventory");
    Self { store, config, sessions: RwLock::new(HashMap::new()) }
  }

  /// Prepare a session and register it under a fresh id.
  #[instrument(level = "info", skip(self))]
  pub async fn start_quiz(&self, cfg: SessionConfig) -> Result<StartQuizOut, SessionError> {
    // ThreadRng is !Send; keep it out of the await below.
    let session = {
      let mut rng = rand::thread_rng();
      QuizSession::prepare(&self.store, &self.config.messages, cfg, &mut rng)?
    };
    let id = Uuid::new_v4().to_string();
    let out = StartQuizOut {
      session_id: id.clone(),
      skipped_records: session.skipped(),
      progress: session.progress(),
      question: current_out(&session).ok_or(SessionError::NoQuestions)?,
    };
    self.sessions.write().await.insert(id.clone(), session);
    info!(target: "quiz", session = %id, total = out.progress.total_questions, "Session registered");
    Ok(out)
  }

  /// `None` when the session id is unknown.
  pub async fn current_question(&self, id: &str) -> Option<Result<QuestionOut, SessionError>> {
    let sessions = self.sessions.read().await;
    let s = sessions.get(id)?;
    Some(current_out(s).ok_or(SessionError::Finished))
  }

  #[instrument(level = "debug", skip(self))]
  pub async fn answer(&self, id: &str, answer: usize) -> Option<Result<AnswerOut, SessionError>> {
    let mut sessions = self.sessions.write().await;
    let s = sessions.get_mut(id)?;
    Some(s.submit_answer(answer).map(|fb| AnswerOut {
      progress: s.progress(),
      finished: s.is_finished(),
      feedback: match s.config().feedback_mode {
        FeedbackMode::Immediate => Some(fb),
        FeedbackMode::Deferred => None,
      },
      next_question: current_out(s),
    }))
  }

  pub async fn results(&self, id: &str) -> Option<Result<ResultsSummary, SessionError>> {
    let sessions = self.sessions.read().await;
    sessions.get(id).map(QuizSession::results)
  }
}

fn current_out(s: &QuizSession) -> Option<QuestionOut> {
  s.current_question().map(|q| to_out(q, &s.progress()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::tests::{temp_dir, write_n4};
  use crate::domain::{Level, QuizMode};

  fn state() -> AppState {
    let dir = temp_dir();
    write_n4(&dir);
    AppState::new(AppConfig { data_dir: dir, ..AppConfig::default() })
  }

  fn cfg(feedback_mode: FeedbackMode) -> SessionConfig {
    SessionConfig {
      level: Level::N4,
      mode: QuizMode::Grammar,
      count: None,
      feedback_mode,
      show_phonetic: true,
      difficulty: None,
      kind: None,
    }
  }

  #[tokio::test]
  async fn session_round_trip_over_state() {
    let state = state();
    let started = state.start_quiz(cfg(FeedbackMode::Immediate)).await.expect("start");
    assert_eq!(started.progress.total_questions, 3);
    assert_eq!(started.question.number, 1);

    let id = started.session_id;
    for _ in 0..3 {
      let out = state.answer(&id, 0).await.expect("known session").expect("answer");
      assert!(out.feedback.is_some());
    }
    assert!(matches!(state.current_question(&id).await, Some(Err(SessionError::Finished))));
    let summary = state.results(&id).await.expect("known session").expect("results");
    assert_eq!(summary.total_questions, 3);
  }

  #[tokio::test]
  async fn deferred_mode_hides_feedback() {
    let state = state();
    let id = state.start_quiz(cfg(FeedbackMode::Deferred)).await.expect("start").session_id;
    let out = state.answer(&id, 1).await.expect("known session").expect("answer");
    assert!(out.feedback.is_none());
    assert!(out.next_question.is_some());
    assert!(matches!(state.results(&id).await, Some(Err(SessionError::NotFinished))));
  }

  #[tokio::test]
  async fn unknown_session_is_none() {
    let state = state();
    assert!(state.current_question("nope").await.is_none());
    assert!(state.answer("nope", 0).await.is_none());
  }
}
