//! Loading application configuration (data directory, default level and
//! user-facing message templates) from TOML.
//!
//! See `AppConfig` and `Messages` for the expected schema. Every field is
//! optional; a missing file section falls back to the built-in defaults.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::{Level, QuestionKind};

const DEFAULT_DATA_DIR: &str = "./data";

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  pub data_dir: PathBuf,
  pub default_level: Level,
  pub messages: Messages,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      data_dir: PathBuf::from(DEFAULT_DATA_DIR),
      default_level: Level::default(),
      messages: Messages::default(),
    }
  }
}

/// Prompt and explanation templates shown to the learner. `{key}`
/// placeholders are filled by `util::fill_template`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Messages {
  // Prompts, one per question kind
  pub sentence_completion_prompt: String,
  pub meaning_comprehension_prompt: String,
  pub pattern_identification_prompt: String,
  pub reading_prompt: String,
  pub meaning_to_japanese_prompt: String,
  pub japanese_to_meaning_prompt: String,
  // Explanations
  pub sentence_completion_explanation: String,
  pub meaning_comprehension_explanation: String,
  pub pattern_identification_explanation: String,
  pub reading_explanation: String,
  pub meaning_to_japanese_explanation: String,
  pub japanese_to_meaning_explanation: String,
  // Synthetic content
  pub option_padding: String,
  pub placeholder_sentence: String,
}

impl Default for Messages {
  fn default() -> Self {
    Self {
      sentence_completion_prompt: "다음 문장의 빈 칸에 들어갈 알맞은 문법을 선택하세요:".into(),
      meaning_comprehension_prompt: "다음 일본어 문장의 올바른 한국어 뜻을 선택하세요:".into(),
      pattern_identification_prompt: "다음 문장에서 사용된 문법 패턴을 선택하세요:".into(),
      reading_prompt: "다음 한자의 올바른 읽기를 선택하세요:".into(),
      meaning_to_japanese_prompt: "다음 뜻에 해당하는 일본어를 선택하세요:".into(),
      japanese_to_meaning_prompt: "다음 일본어의 한국어 뜻을 선택하세요:".into(),
      sentence_completion_explanation: "정답은 '{pattern}'입니다. 전체 문장: {sentence}\n의미: {translation}".into(),
      meaning_comprehension_explanation: "'{sentence}'는 '{translation}'을(를) 의미합니다.".into(),
      pattern_identification_explanation: "문장에서 사용된 문법은 '{pattern}'입니다.\n의미: {translation}".into(),
      reading_explanation: "{term}({reading})는 '{meaning}'을(를) 의미합니다.".into(),
      meaning_to_japanese_explanation: "'{meaning}'은(는) {term}({reading})입니다.".into(),
      japanese_to_meaning_explanation: "{term}({reading})는 '{meaning}'을(를) 의미합니다.".into(),
      option_padding: "옵션 {n}".into(),
      placeholder_sentence: "[Example with {pattern}]".into(),
    }
  }
}

impl Messages {
  pub fn prompt_for(&self, kind: &QuestionKind) -> &str {
    match kind {
      QuestionKind::SentenceCompletion => &self.sentence_completion_prompt,
      QuestionKind::MeaningComprehension => &self.meaning_comprehension_prompt,
      QuestionKind::PatternIdentification => &self.pattern_identification_prompt,
      QuestionKind::Reading => &self.reading_prompt,
      QuestionKind::MeaningToJapanese => &self.meaning_to_japanese_prompt,
      QuestionKind::JapaneseToMeaning => &self.japanese_to_meaning_prompt,
      QuestionKind::Unknown(_) => "",
    }
  }

  pub fn explanation_for(&self, kind: &QuestionKind) -> &str {
    match kind {
      QuestionKind::SentenceCompletion => &self.sentence_completion_explanation,
      QuestionKind::MeaningComprehension => &self.meaning_comprehension_explanation,
      QuestionKind::PatternIdentification => &self.pattern_identification_explanation,
      QuestionKind::Reading => &self.reading_explanation,
      QuestionKind::MeaningToJapanese => &self.meaning_to_japanese_explanation,
      QuestionKind::JapaneseToMeaning => &self.japanese_to_meaning_explanation,
      QuestionKind::Unknown(_) => "",
    }
  }
}

/// Load `AppConfig` from QUIZ_CONFIG_PATH (if set), then apply QUIZ_DATA_DIR.
/// Read or parse errors are logged and defaults are used.
pub fn load_app_config_from_env() -> AppConfig {
  let mut cfg = std::env::var("QUIZ_CONFIG_PATH")
    .ok()
    .and_then(|path| load_config_file(&path))
    .unwrap_or_default();
  if let Ok(dir) = std::env::var("QUIZ_DATA_DIR") {
    if !dir.trim().is_empty() {
      cfg.data_dir = PathBuf::from(dir);
    }
  }
  cfg
}

fn load_config_file(path: &str) -> Option<AppConfig> {
  match std::fs::read_to_string(path) {
    Ok(s) => match toml::from_str::<AppConfig>(&s) {
      Ok(cfg) => {
        info!(target: "jlpt_quiz", %path, data_dir = %cfg.data_dir.display(), "Loaded app config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "jlpt_quiz", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "jlpt_quiz", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn partial_toml_keeps_defaults() {
    let cfg: AppConfig = toml::from_str(
      r#"
        data_dir = "/srv/quiz"
        default_level = "N3"

        [messages]
        reading_prompt = "Pick the reading:"
      "#,
    )
    .expect("toml");
    assert_eq!(cfg.data_dir, PathBuf::from("/srv/quiz"));
    assert_eq!(cfg.default_level, Level::N3);
    assert_eq!(cfg.messages.reading_prompt, "Pick the reading:");
    assert_eq!(cfg.messages.option_padding, "옵션 {n}");
  }

  #[test]
  fn unreadable_file_yields_none() {
    assert!(load_config_file("/definitely/not/here/quiz.toml").is_none());
  }
}
