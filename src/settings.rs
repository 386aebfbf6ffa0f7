//! Persisted learner preferences (`settings.json` under the user config dir).
//!
//! A missing or unreadable file never stops the quiz: defaults are used and
//! the problem is logged.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::{FeedbackMode, Level};

const APP_DIR: &str = "jlpt-quiz";
const FILE_NAME: &str = "settings.json";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
  pub level: Level,
  pub show_phonetic: bool,
  pub feedback_mode: FeedbackMode,
}

impl Default for Preferences {
  fn default() -> Self {
    Self { level: Level::N4, show_phonetic: true, feedback_mode: FeedbackMode::Immediate }
  }
}

/// `<config dir>/jlpt-quiz/settings.json`, if the platform has a config dir.
pub fn settings_path() -> Option<PathBuf> {
  dirs::config_dir().map(|d| d.join(APP_DIR).join(FILE_NAME))
}

pub fn load_from(path: &Path) -> Preferences {
  let text = match fs::read_to_string(path) {
    Ok(t) => t,
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Preferences::default(),
    Err(e) => {
      warn!(target: "jlpt_quiz", path = %path.display(), error = %e, "Failed to read preferences");
      return Preferences::default();
    }
  };
  match serde_json::from_str(&text) {
    Ok(p) => p,
    Err(e) => {
      warn!(target: "jlpt_quiz", path = %path.display(), error = %e, "Corrupt preferences; using defaults");
      Preferences::default()
    }
  }
}

pub fn save_to(path: &Path, prefs: &Preferences) {
  if let Some(parent) = path.parent() {
    if let Err(e) = fs::create_dir_all(parent) {
      warn!(target: "jlpt_quiz", path = %parent.display(), error = %e, "Failed to create settings directory");
      return;
    }
  }
  let result = serde_json::to_string_pretty(prefs)
    .map_err(|e| e.to_string())
    .and_then(|json| fs::write(path, json).map_err(|e| e.to_string()));
  match result {
    Ok(()) => info!(target: "jlpt_quiz", path = %path.display(), "Preferences saved"),
    Err(e) => warn!(target: "jlpt_quiz", path = %path.display(), error = %e, "Failed to save preferences"),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::tests::temp_dir;

  #[test]
  fn missing_file_gives_defaults() {
    let prefs = load_from(&temp_dir().join(FILE_NAME));
    assert_eq!(prefs, Preferences::default());
    assert!(prefs.show_phonetic);
  }

  #[test]
  fn saved_preferences_load_back() {
    let path = temp_dir().join("nested").join(FILE_NAME);
    let prefs = Preferences { level: Level::N2, show_phonetic: false, feedback_mode: FeedbackMode::Deferred };
    save_to(&path, &prefs);
    assert_eq!(load_from(&path), prefs);
  }

  #[test]
  fn corrupt_or_partial_files_fall_back() {
    let dir = temp_dir();
    let corrupt = dir.join("corrupt.json");
    fs::write(&corrupt, "{ not json").expect("write");
    assert_eq!(load_from(&corrupt), Preferences::default());

    let partial = dir.join("partial.json");
    fs::write(&partial, r#"{"level":"N3"}"#).expect("write");
    let p = load_from(&partial);
    assert_eq!(p.level, Level::N3);
    assert!(p.show_phonetic);
  }
}
