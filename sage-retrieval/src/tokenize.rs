//! Chinese word segmentation for the lexical ranker.

use jieba_rs::Jieba;

/// Function words that carry no retrieval signal.
const STOP_WORDS: &[&str] = &[
    "的", "了", "和", "与", "及", "或", "在", "是", "为", "以", "对", "等", "将", "由",
];

/// Segment `text` and drop stop words and whitespace-only tokens.
pub fn tokenize(jieba: &Jieba, text: &str) -> Vec<String> {
    jieba
        .cut(text, false)
        .into_iter()
        .filter(|word| !word.trim().is_empty() && !STOP_WORDS.contains(word))
        .map(str::to_string)
        .collect()
}
