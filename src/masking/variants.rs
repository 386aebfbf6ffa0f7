//! Known surface forms for grammar patterns.
//!
//! Each entry maps a canonical pattern (as written in the catalog) to the
//! conjugated / compound / alternate-script strings it takes inside real
//! sentences. Lists are tried in order and the first hit wins, so a variant
//! must never come after a shorter variant it contains.
//!
//! Kanji and kana spellings share one list: the engine runs separately on
//! the primary sentence and on its reading, and each text simply hits the
//! spelling it actually contains.

pub struct VariantEntry {
  pub pattern: &'static str,
  pub variants: &'static [&'static str],
}

macro_rules! variants {
  ($pattern:expr => [$($v:expr),* $(,)?]) => {
    VariantEntry { pattern: $pattern, variants: &[$($v),*] }
  };
}

pub const VARIANT_TABLE: &[VariantEntry] = &[
  // Auxiliary verb constructions (て-form + verb)
  variants!("てしまう" => ["てしまいました", "てしまいます", "てしまった", "てしまって", "てしまえば"]),
  variants!("ておく" => ["ておきました", "ておきます", "ておいた", "ておいて", "ておけば", "ておこう"]),
  variants!("てみる" => ["てみました", "てみます", "てみよう", "てみれば", "てみた", "てみて", "みよう"]),
  variants!("てくる" => ["てきました", "てきます", "てくれば", "てきた", "てきて"]),
  variants!("ていく" => ["ていきました", "ていきます", "ていった", "ていって", "ていけば"]),
  variants!("てある" => ["てありました", "てあります", "てあった", "てあって", "てあれば"]),
  variants!("ていた" => ["ていました", "ています", "ていれば", "ていて"]),
  variants!("てほしい" => ["てほしかった", "てほしがる", "てほしいです"]),

  // Compound verbs, kanji and kana spellings
  variants!("始める" => [
    "始めました", "始めます", "始めた", "始めて",
    "はじめました", "はじめます", "はじめれば", "はじめた", "はじめて",
  ]),
  variants!("終わる" => [
    "終わりました", "終わります", "終わった", "終わって",
    "おわりました", "おわります", "おわった", "おわって", "おわれば",
  ]),
  variants!("続ける" => [
    "続けました", "続けます", "続けた", "続けて",
    "つづけました", "つづけます", "つづければ", "つづけた", "つづけて",
  ]),
  variants!("出す" => [
    "出しました", "出します", "出した", "出して",
    "だしました", "だします", "だした", "だして", "だせば",
  ]),
  variants!("すぎる" => [
    "すぎました", "すぎます", "すぎれば", "すぎた", "すぎて",
    "過ぎました", "過ぎます", "過ぎる", "過ぎた", "過ぎて",
  ]),
  variants!("がする" => ["がしました", "がします", "がすれば", "がした", "がして"]),
  variants!("がる" => ["がりました", "がります", "がった", "がって", "がれば"]),
  variants!("なる" => ["なりました", "なります", "なった", "なって", "なれば"]),
  variants!("ようになる" => ["ようになりました", "ようになります", "ようになった", "ようになって"]),

  // Quoting / thinking
  variants!("と思う" => [
    "と思いました", "とおもいました", "と思いません", "とおもいません",
    "と思います", "とおもいます", "と思わない", "とおもわない",
    "と思った", "とおもった", "と思って", "とおもって", "とおもう",
  ]),
  variants!("と言う" => [
    "と言いました", "といいました", "と言います", "といいます",
    "と言った", "といった", "と言って", "といって", "という", "といい",
  ]),

  // Copula-final patterns
  variants!("予定だ" => [
    "よていでした", "よていだった", "予定でした", "予定だった", "よていです", "予定です",
    "よていだ", "よていの", "予定だ", "予定の", "よてい", "予定",
  ]),
  variants!("ものだ" => ["ものでした", "ものだった", "ものです", "ものの", "もの"]),
  variants!("べきだ" => ["べきでした", "べきだった", "べきです", "べき"]),
  variants!("つもりだ" => ["つもりでした", "つもりだった", "つもりです", "つもりで", "つもり"]),
  variants!("はずだ" => ["はずでした", "はずだった", "はずです", "はずで", "はず"]),
  variants!("わけだ" => ["わけでした", "わけだった", "わけです", "わけ"]),
  variants!("わけではない" => ["わけではありません", "わけじゃありません", "わけじゃない", "訳ではない", "わけ"]),
  variants!("ようだ" => ["ようでした", "ようだった", "ようです", "ような", "ように"]),
  variants!("みたいだ" => ["みたいでした", "みたいだった", "みたいです", "みたいな", "みたいに", "みたい"]),
  variants!("みたい" => ["みたいでした", "みたいだった", "みたいです", "みたいな", "みたいに"]),
  variants!("そうだ（推測）" => ["そうでした", "そうだった", "そうです", "そうだ", "そう"]),
  variants!("そうだ（様態）" => ["そうでした", "そうだった", "そうです", "そうだ", "そうな", "そうに", "そう"]),
  variants!("だろう" => ["でしょう"]),
  variants!("らしい" => ["らしかった", "らしいです", "らしく"]),

  // Modality / possibility
  variants!("かもしれない" => ["かもしれませんでした", "かもしれなかった", "かもしれません"]),
  variants!("しかない" => ["しかありませんでした", "しかありません", "しかなかった", "するしか"]),
  variants!("ことにする" => ["ことにしています", "ことにしました", "ことにします", "ことにしよう", "ことにした", "ことにして"]),
  variants!("ことになる" => ["ことになりました", "ことになります", "ことになった", "ことになって"]),
  variants!("ことがある" => ["ことがありませんでした", "ことがありました", "ことがあります", "ことがありません", "ことがあった"]),
  variants!("ことができる" => [
    "ことができませんでした", "ことができません", "ことができました", "ことができます",
    "ことができた", "ことができて", "ことが出来る", "ができません",
  ]),

  // Compound particles, purpose / cause
  variants!("ために（目的）" => ["ために", "ための", "ため"]),
  variants!("ために（原因）" => ["ために", "ための", "ため"]),
  variants!("ように（目的）" => ["ような", "ように"]),
  variants!("ように（様態）" => ["ような", "ように"]),
  variants!("のように" => ["ように"]),
  variants!("のに（逆接）" => ["のに"]),
  variants!("によって" => ["によっては", "による", "により"]),
  variants!("に比べて" => ["にくらべて", "に比べ", "にくらべ"]),
  variants!("に関して" => ["にかんして", "に関し"]),
  variants!("に関する" => ["にかんする"]),
  variants!("に対して" => ["にたいして", "に対する", "にたいする"]),
  variants!("を通して" => ["をとおして", "を通じて"]),
  variants!("が必要" => ["がひつよう"]),
  variants!("ずに" => ["ないで"]),
  variants!("なら" => ["ならば"]),
  variants!("とき" => ["ときには", "ときは", "ときに"]),

  // Conditional ば: the stem-final kana varies by verb class
  variants!("ば（仮定）" => ["れば", "せば", "けば", "げば", "べば", "めば", "てば", "ねば", "えば", "ば"]),
];

/// Ordered variants for `pattern_id`, or an empty slice for unknown patterns.
pub fn variants_for(pattern_id: &str) -> &'static [&'static str] {
  VARIANT_TABLE
    .iter()
    .find(|e| e.pattern == pattern_id)
    .map(|e| e.variants)
    .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
  use std::collections::HashSet;

  use super::*;

  #[test]
  fn no_variant_is_shadowed_by_an_earlier_one() {
    for entry in VARIANT_TABLE {
      for (i, earlier) in entry.variants.iter().enumerate() {
        for later in &entry.variants[i + 1..] {
          assert!(
            !later.contains(earlier),
            "{}: '{}' can never win because '{}' comes first",
            entry.pattern, later, earlier
          );
        }
      }
    }
  }

  #[test]
  fn patterns_are_unique_and_lists_non_empty() {
    let mut seen = HashSet::new();
    for entry in VARIANT_TABLE {
      assert!(seen.insert(entry.pattern), "duplicate entry for {}", entry.pattern);
      assert!(!entry.variants.is_empty(), "{} has no variants", entry.pattern);
      assert!(entry.variants.iter().all(|v| !v.is_empty()));
    }
  }

  #[test]
  fn lookup_returns_ordered_list_or_nothing() {
    assert_eq!(variants_for("ておく")[0], "ておきました");
    assert!(variants_for("存在しないパターン").is_empty());
  }
}
