//! Built-in content: fallback distractor pools and study recommendations.

use crate::domain::QuestionKind;

/// Common grammar patterns offered as sentence-completion distractors.
pub const GRAMMAR_PATTERN_POOL: &[&str] = &[
  "てしまう", "ている", "た", "てある", "てみる", "てくる", "ていく",
  "たことがある", "たり", "ながら", "とき", "まえに", "あとで",
];

/// Short kanji readings offered as reading-question distractors.
pub const READING_POOL: &[&str] = &[
  "あい", "こい", "めい", "らい", "きょう", "じょう", "せい", "かい",
  "だん", "ぜん", "しん", "きん", "ほん", "にち", "がつ", "つき",
];

/// Study advice per weak question kind, most useful first.
pub fn recommendations_for(kind: &QuestionKind) -> &'static [&'static str] {
  match kind {
    QuestionKind::Reading => &[
      "한자 읽기 연습을 늘려보세요",
      "히라가나 표기를 함께 보며 학습하세요",
      "N4 한자 목록을 체계적으로 복습하세요",
    ],
    QuestionKind::MeaningToJapanese => &[
      "한국어-일본어 단어 매칭 연습을 하세요",
      "단어의 품사별로 분류해서 학습하세요",
      "일상생활 어휘를 늘려보세요",
    ],
    QuestionKind::JapaneseToMeaning => &[
      "일본어 문맥에서 단어 의미 파악 연습을 하세요",
      "유사한 의미의 단어들을 비교 학습하세요",
      "예문과 함께 단어를 암기하세요",
    ],
    QuestionKind::SentenceCompletion => &[
      "문법 패턴별로 체계적인 학습을 하세요",
      "예문을 많이 읽고 패턴을 익히세요",
      "비슷한 문법의 차이점을 정리하세요",
    ],
    QuestionKind::MeaningComprehension => &[
      "일본어 문장 해석 연습을 늘려보세요",
      "문법과 어휘를 함께 학습하세요",
      "긴 문장 읽기 연습을 하세요",
    ],
    QuestionKind::PatternIdentification | QuestionKind::Unknown(_) => &[],
  }
}

/// Extra advice for scores under 50%.
pub const REVIEW_FROM_BASICS: &str = "기초부터 다시 차근차근 복습하세요";
/// Extra advice for scores from 50% up to the weak-area threshold.
pub const FOCUS_ON_MISTAKES: &str = "틀린 문제를 중심으로 집중 학습하세요";

#[cfg(test)]
mod tests {
  use std::collections::HashSet;

  use super::*;

  #[test]
  fn pools_have_no_duplicates() {
    fn unique(items: &[&str]) -> bool {
      items.iter().collect::<HashSet<_>>().len() == items.len()
    }
    assert!(unique(GRAMMAR_PATTERN_POOL));
    assert!(unique(READING_POOL));
    assert!(GRAMMAR_PATTERN_POOL.len() > 3 && READING_POOL.len() > 3);
  }

  #[test]
  fn every_known_scored_kind_has_advice() {
    assert_eq!(recommendations_for(&QuestionKind::Reading).len(), 3);
    assert!(recommendations_for(&QuestionKind::PatternIdentification).is_empty());
  }
}
