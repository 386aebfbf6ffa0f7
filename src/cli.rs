//! Interactive terminal quiz: main menu, question loop, feedback and results.
//!
//! Reads choices line by line from any `BufRead` and writes to any `Write`,
//! so the whole flow can be scripted. End of input exits cleanly.

use std::io::{self, BufRead, Write};
use std::ops::RangeInclusive;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::catalog::CatalogStore;
use crate::config::Messages;
use crate::domain::{Category, FeedbackMode, Level, QuestionRecord, QuizMode};
use crate::session::{AnswerRecord, Feedback, QuizSession, ResultsSummary, SessionConfig};
use crate::settings::{self, Preferences};

const RULE: &str = "────────────────────────────────────────";
const COUNT_CHOICES: [Option<usize>; 4] = [Some(25), Some(50), Some(100), None];

/// `93%`
pub fn format_score(percentage: f32) -> String {
  format!("{percentage:.0}%")
}

/// `2분 5초`, or `45초` under a minute.
pub fn format_time(seconds: u64) -> String {
  let (m, s) = (seconds / 60, seconds % 60);
  if m > 0 {
    format!("{m}분 {s}초")
  } else {
    format!("{s}초")
  }
}

fn category_label(c: Category) -> &'static str {
  match c {
    Category::Vocabulary => "어휘",
    Category::Grammar => "독해",
  }
}

fn level_label(l: Level) -> &'static str {
  match l {
    Level::N5 => "N5 (기초)",
    Level::N4 => "N4 (초급)",
    Level::N3 => "N3 (중급)",
    Level::N2 => "N2 (중상급)",
    Level::N1 => "N1 (상급)",
  }
}

fn phonetic_label(on: bool) -> &'static str {
  if on {
    "한자+히라가나"
  } else {
    "한자만"
  }
}

fn feedback_label(mode: FeedbackMode) -> &'static str {
  match mode {
    FeedbackMode::Immediate => "즉시 표시",
    FeedbackMode::Deferred => "마지막에 표시",
  }
}

pub struct Terminal<R, W> {
  store: CatalogStore,
  messages: Messages,
  prefs: Preferences,
  /// Where preference changes are saved; `None` keeps them in memory.
  prefs_path: Option<PathBuf>,
  input: R,
  out: W,
}

impl<R: BufRead, W: Write> Terminal<R, W> {
  pub fn new(store: CatalogStore, messages: Messages, prefs_path: Option<PathBuf>, input: R, out: W) -> Self {
    let prefs = prefs_path.as_deref().map(settings::load_from).unwrap_or_default();
    Self { store, messages, prefs, prefs_path, input, out }
  }

  pub fn preferences(&self) -> &Preferences {
    &self.prefs
  }

  pub fn run(&mut self) -> io::Result<()> {
    loop {
      self.landing()?;
      let Some(choice) = self.ask("선택하세요", 1..=5)? else { break };
      match choice {
        1 => self.quiz_flow(QuizMode::Vocabulary)?,
        2 => self.quiz_flow(QuizMode::Grammar)?,
        3 => self.quiz_flow(QuizMode::Mixed)?,
        4 => self.settings_menu()?,
        _ => break,
      }
    }
    writeln!(self.out, "안녕히 가세요!")?;
    Ok(())
  }

  fn landing(&mut self) -> io::Result<()> {
    writeln!(self.out, "{RULE}")?;
    writeln!(self.out, "  JLPT 학습 퀴즈 · 일본어능력시험 학습도구")?;
    writeln!(
      self.out,
      "  현재 설정: {} | {} | {}",
      self.prefs.level,
      phonetic_label(self.prefs.show_phonetic),
      feedback_label(self.prefs.feedback_mode)
    )?;
    writeln!(self.out, "{RULE}")?;
    writeln!(self.out, "[1] 어휘 학습\n[2] 독해 학습\n[3] 혼합 학습\n[4] 설정\n[5] 종료")?;
    Ok(())
  }

  /// Prompt until a number in `range` is entered. `None` at end of input.
  fn ask(&mut self, prompt: &str, range: RangeInclusive<usize>) -> io::Result<Option<usize>> {
    loop {
      write!(self.out, "{prompt} ({}-{}): ", range.start(), range.end())?;
      self.out.flush()?;
      let mut line = String::new();
      if self.input.read_line(&mut line)? == 0 {
        return Ok(None);
      }
      match line.trim().parse::<usize>() {
        Ok(n) if range.contains(&n) => return Ok(Some(n)),
        _ => writeln!(self.out, "잘못된 입력입니다.")?,
      }
    }
  }

  fn quiz_flow(&mut self, mode: QuizMode) -> io::Result<()> {
    let level = self.prefs.level;
    writeln!(self.out, "\n{} 학습 - {}", mode_label(mode), level)?;
    self.show_inventory(level, mode)?;
    writeln!(self.out, "[1] 25문제\n[2] 50문제\n[3] 100문제\n[4] 전체 문제\n[5] 뒤로 가기")?;
    let Some(choice) = self.ask("선택하세요", 1..=5)? else { return Ok(()) };
    if choice == 5 {
      return Ok(());
    }

    let config = SessionConfig {
      level,
      mode,
      count: COUNT_CHOICES[choice - 1],
      feedback_mode: self.prefs.feedback_mode,
      show_phonetic: self.prefs.show_phonetic,
      difficulty: None,
      kind: None,
    };
    let prepared = QuizSession::prepare(&self.store, &self.messages, config, &mut rand::thread_rng());
    let mut session = match prepared {
      Ok(s) => s,
      Err(e) => {
        warn!(target: "quiz", error = %e, "Could not start quiz");
        writeln!(self.out, "퀴즈를 시작할 수 없습니다: {e}")?;
        return Ok(());
      }
    };
    if session.skipped() > 0 {
      writeln!(self.out, "({}개의 항목은 문제로 만들 수 없어 제외되었습니다)", session.skipped())?;
    }

    let mut deferred: Vec<(QuestionRecord, Feedback)> = Vec::new();
    while let Some(q) = session.current_question().cloned() {
      self.show_question(&q, &session)?;
      let Some(pick) = self.ask("답을 선택하세요", 1..=q.options.len())? else { return Ok(()) };
      let feedback = match session.submit_answer(pick - 1) {
        Ok(fb) => fb,
        Err(e) => {
          writeln!(self.out, "{e}")?;
          continue;
        }
      };
      match session.config().feedback_mode {
        FeedbackMode::Immediate => self.show_feedback(&feedback)?,
        FeedbackMode::Deferred => deferred.push((q, feedback)),
      }
    }

    if !deferred.is_empty() {
      self.show_review(&deferred)?;
    }
    match session.results() {
      Ok(summary) => {
        info!(target: "quiz", score = summary.score.percentage, "Terminal quiz finished");
        self.show_results(&summary)?;
      }
      Err(e) => writeln!(self.out, "{e}")?,
    }
    Ok(())
  }

  /// Row counts per question kind for the catalogs this mode draws from.
  fn show_inventory(&mut self, level: Level, mode: QuizMode) -> io::Result<()> {
    let categories: &[Category] = match mode {
      QuizMode::Vocabulary => &[Category::Vocabulary],
      QuizMode::Grammar => &[Category::Grammar],
      QuizMode::Mixed => &[Category::Vocabulary, Category::Grammar],
    };
    for c in categories {
      match self.store.kind_counts(level, *c) {
        Ok(counts) => {
          let total: usize = counts.values().sum();
          let kinds: Vec<String> = counts.iter().map(|(k, n)| format!("{k} {n}")).collect();
          writeln!(self.out, "{}: 총 {total}개 ({})", category_label(*c), kinds.join(", "))?;
        }
        Err(e) => writeln!(self.out, "{}: {e}", category_label(*c))?,
      }
    }
    Ok(())
  }

  fn show_question(&mut self, q: &QuestionRecord, session: &QuizSession) -> io::Result<()> {
    let p = session.progress();
    writeln!(self.out, "\n{RULE}")?;
    writeln!(
      self.out,
      "문제 {}/{} | {} | {}",
      p.current_question,
      p.total_questions,
      category_label(q.category),
      q.level
    )?;
    writeln!(self.out, "{RULE}")?;
    writeln!(self.out, "{}\n", q.prompt_text)?;
    let mut lines = q.display_text.lines();
    if let Some(first) = lines.next() {
      writeln!(self.out, "        {first}")?;
    }
    for rest in lines {
      writeln!(self.out, "      {rest}")?;
    }
    writeln!(self.out)?;
    for (i, opt) in q.options.iter().enumerate() {
      writeln!(self.out, "{}. {opt}", i + 1)?;
    }
    writeln!(self.out, "진행: {}/{} | 정답: {}개", p.answered_questions, p.total_questions, p.correct_so_far)?;
    Ok(())
  }

  fn show_feedback(&mut self, fb: &Feedback) -> io::Result<()> {
    writeln!(self.out, "{}", if fb.is_correct { "✓ 정답" } else { "✗ 오답" })?;
    writeln!(self.out, "선택한 답: {}", fb.submitted_answer)?;
    writeln!(self.out, "정답: {}\n", fb.correct_answer)?;
    writeln!(self.out, "해설:\n{}", fb.explanation)?;
    if !fb.option_notes.is_empty() {
      writeln!(self.out, "\n선택지 정보:")?;
      for note in &fb.option_notes {
        writeln!(self.out, "{note}")?;
      }
    }
    Ok(())
  }

  fn show_review(&mut self, items: &[(QuestionRecord, Feedback)]) -> io::Result<()> {
    writeln!(self.out, "\n{RULE}\n답안 확인\n{RULE}")?;
    for (i, (q, fb)) in items.iter().enumerate() {
      writeln!(self.out, "\n문제 {} {}", i + 1, if fb.is_correct { "✓ 정답" } else { "✗ 오답" })?;
      writeln!(self.out, "질문: {}", q.prompt_text)?;
      writeln!(self.out, "내용: {}", q.display_text)?;
      writeln!(self.out, "선택한 답: {}", fb.submitted_answer)?;
      writeln!(self.out, "정답: {}", fb.correct_answer)?;
      writeln!(self.out, "해설: {}", fb.explanation)?;
    }
    Ok(())
  }

  fn show_results(&mut self, r: &ResultsSummary) -> io::Result<()> {
    writeln!(self.out, "\n{RULE}\n퀴즈 결과 - {}\n{RULE}", r.grade.label())?;
    writeln!(self.out, "전체 점수: {}", format_score(r.score.percentage))?;
    writeln!(self.out, "정답: {}/{}개", r.correct_answers, r.total_questions)?;
    writeln!(self.out, "소요시간: {}", format_time(r.total_time_seconds))?;

    if r.category_scores.len() > 1 {
      writeln!(self.out, "\n분야별 점수:")?;
      for (c, s) in &r.category_scores {
        writeln!(self.out, "• {} {}", category_label(*c), format_score(s.percentage))?;
      }
    }

    if r.weak_areas.is_empty() {
      writeln!(self.out, "\n모든 분야에서 우수한 성과를 보였습니다!")?;
      return Ok(());
    }
    writeln!(self.out, "\n개선이 필요한 분야:")?;
    for w in &r.weak_areas {
      writeln!(self.out, "• {} ({})", w.kind, format_score(w.performance.percentage))?;
      for a in &w.wrong_questions {
        writeln!(self.out, "    {}", wrong_line(a))?;
      }
    }
    writeln!(self.out, "\n학습 권장사항:")?;
    let mut seen = Vec::new();
    for rec in r.weak_areas.iter().flat_map(|w| &w.recommendations) {
      if !seen.contains(&rec) {
        writeln!(self.out, "• {rec}")?;
        seen.push(rec);
      }
    }
    Ok(())
  }

  fn settings_menu(&mut self) -> io::Result<()> {
    loop {
      writeln!(self.out, "\n설정")?;
      writeln!(self.out, "[1] 레벨: {}", level_label(self.prefs.level))?;
      writeln!(self.out, "[2] 히라가나 표시: {}", phonetic_label(self.prefs.show_phonetic))?;
      writeln!(self.out, "[3] 답안 표시: {}", feedback_label(self.prefs.feedback_mode))?;
      writeln!(self.out, "[4] 뒤로")?;
      let Some(choice) = self.ask("선택하세요", 1..=4)? else { return Ok(()) };
      match choice {
        1 => {
          let available = self.store.available_levels();
          for (i, l) in Level::ALL.iter().enumerate() {
            let status = if available.contains(l) { "사용가능" } else { "준비중" };
            writeln!(self.out, "[{}] {} [{status}]", i + 1, level_label(*l))?;
          }
          let Some(n) = self.ask("레벨을 선택하세요", 1..=Level::ALL.len())? else { return Ok(()) };
          self.prefs.level = Level::ALL[n - 1];
        }
        2 => self.prefs.show_phonetic = !self.prefs.show_phonetic,
        3 => {
          self.prefs.feedback_mode = match self.prefs.feedback_mode {
            FeedbackMode::Immediate => FeedbackMode::Deferred,
            FeedbackMode::Deferred => FeedbackMode::Immediate,
          }
        }
        _ => return Ok(()),
      }
      if let Some(path) = &self.prefs_path {
        settings::save_to(path, &self.prefs);
      }
    }
  }
}

fn mode_label(mode: QuizMode) -> &'static str {
  match mode {
    QuizMode::Vocabulary => "어휘",
    QuizMode::Grammar => "독해",
    QuizMode::Mixed => "혼합",
  }
}

fn wrong_line(a: &AnswerRecord) -> String {
  let shown = a.display_text.lines().next().unwrap_or_default();
  format!("{shown} → {} (선택: {})", a.correct_answer, a.submitted_answer)
}

#[cfg(test)]
mod tests {
  use std::io::Cursor;

  use super::*;
  use crate::catalog::tests::{temp_dir, write_n4};

  fn terminal(script: &str, prefs_path: Option<PathBuf>) -> Terminal<Cursor<Vec<u8>>, Vec<u8>> {
    let dir = temp_dir();
    write_n4(&dir);
    Terminal::new(CatalogStore::new(dir), Messages::default(), prefs_path, Cursor::new(script.as_bytes().to_vec()), Vec::new())
  }

  fn output(t: &Terminal<Cursor<Vec<u8>>, Vec<u8>>) -> String {
    String::from_utf8_lossy(&t.out).into_owned()
  }

  #[test]
  fn score_and_time_formatting() {
    assert_eq!(format_score(66.666), "67%");
    assert_eq!(format_score(100.0), "100%");
    assert_eq!(format_time(45), "45초");
    assert_eq!(format_time(125), "2분 5초");
    assert_eq!(format_time(60), "1분 0초");
  }

  #[test]
  fn full_grammar_quiz_from_the_menu() {
    // Grammar, all questions, answer 1 three times, then exit.
    let mut t = terminal("2\n4\n1\n1\n1\n5\n", None);
    t.run().expect("run");
    let out = output(&t);
    assert!(out.contains("문제 1/3"));
    assert!(out.contains("문제 3/3"));
    assert!(out.contains("정답: "));
    assert!(out.contains("퀴즈 결과 - "));
    assert!(out.trim_end().ends_with("안녕히 가세요!"));
  }

  #[test]
  fn invalid_input_is_reprompted() {
    let mut t = terminal("9\nabc\n5\n", None);
    t.run().expect("run");
    assert_eq!(output(&t).matches("잘못된 입력입니다.").count(), 2);
  }

  #[test]
  fn end_of_input_exits_cleanly() {
    let mut t = terminal("2\n", None);
    t.run().expect("run");
    assert!(output(&t).contains("안녕히 가세요!"));
  }

  #[test]
  fn settings_changes_are_persisted() {
    let path = temp_dir().join("settings.json");
    // Settings: level -> N3, toggle phonetic, toggle feedback, back, exit.
    let mut t = terminal("4\n1\n3\n2\n3\n4\n5\n", Some(path.clone()));
    t.run().expect("run");
    let expected = Preferences { level: Level::N3, show_phonetic: false, feedback_mode: FeedbackMode::Deferred };
    assert_eq!(t.preferences(), &expected);
    assert_eq!(settings::load_from(&path), expected);
  }

  #[test]
  fn missing_level_reports_instead_of_crashing() {
    // Settings: level N1 (no files), back, then start a vocabulary quiz.
    let mut t = terminal("4\n1\n5\n4\n1\n4\n5\n", None);
    t.run().expect("run");
    assert!(output(&t).contains("퀴즈를 시작할 수 없습니다"));
  }

  #[test]
  fn deferred_mode_reviews_at_the_end() {
    let mut t = terminal("4\n3\n4\n2\n4\n1\n1\n1\n5\n", None);
    t.run().expect("run");
    let out = output(&t);
    assert!(out.contains("답안 확인"));
    assert!(!out.contains("선택지 정보:"));
  }
}
