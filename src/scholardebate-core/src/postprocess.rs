//! Post-processing applied to raw model output before it becomes a turn.

use std::sync::LazyLock;

use regex::Regex;

/// Phrases a model uses when it gives up the debate.
///
/// Detection depends on models echoing these verbatim, so the set must not
/// be reworded.
pub const DEFAULT_CONCESSION_PHRASES: [&str; 5] = [
    "I cannot continue the debate",
    "I don't have a rational counter-argument",
    "I concede the point",
    "I admit I can't refute this argument",
    "The evidence does not support further argumentation",
];

/// Reasoning/internal tags stripped with their content.
const REASONING_TAGS: [&str; 15] = [
    "thinking",
    "think",
    "reflection",
    "reflect",
    "internal",
    "reasoning",
    "thought",
    "scratch",
    "scratchpad",
    "plan",
    "analysis",
    "analyze",
    "consider",
    "pondering",
    "deliberation",
];

static REASONING_BLOCKS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    REASONING_TAGS
        .iter()
        .map(|tag| {
            Regex::new(&format!(r"(?is)<{tag}[^>]*>.*?</{tag}>"))
                .expect("Invalid reasoning tag regex")
        })
        .collect()
});

static ORPHAN_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?\w+[^>]*>").expect("Invalid orphan tag regex"));

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

/// Result of cutting text down to a word ceiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Truncation {
    pub text: String,
    pub truncated: bool,
}

/// Cut `text` to at most `limit` whitespace-delimited words.
///
/// Text within the limit is returned untouched. Longer text is rebuilt from
/// its first `limit` words joined by single spaces, so original line breaks
/// are not preserved.
pub fn truncate(text: &str, limit: usize) -> Truncation {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= limit {
        return Truncation {
            text: text.to_string(),
            truncated: false,
        };
    }

    Truncation {
        text: words[..limit].join(" "),
        truncated: true,
    }
}

/// Case-insensitive phrase matcher for concessions.
#[derive(Debug, Clone)]
pub struct ConcessionDetector {
    phrases: Vec<String>,
}

impl ConcessionDetector {
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            phrases: phrases
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .filter(|p| !p.trim().is_empty())
                .collect(),
        }
    }

    /// True if any phrase occurs anywhere in `text`, ignoring case.
    pub fn detect(&self, text: &str) -> bool {
        let haystack = text.to_lowercase();
        self.phrases.iter().any(|phrase| haystack.contains(phrase.as_str()))
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }
}

impl Default for ConcessionDetector {
    fn default() -> Self {
        Self::new(DEFAULT_CONCESSION_PHRASES)
    }
}

/// Strip reasoning blocks such as `<think>...</think>` emitted by local
/// reasoning models, drop leftover tags and collapse whitespace.
pub fn strip_reasoning(response: &str) -> String {
    let mut result = response.to_string();

    for block in REASONING_BLOCKS.iter() {
        result = block.replace_all(&result, "").into_owned();
    }

    result = ORPHAN_TAG.replace_all(&result, "").into_owned();
    result = WHITESPACE_RUN.replace_all(&result, " ").into_owned();

    result.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_under_limit_is_unchanged() {
        let text = "Line one\n\nline   two";
        let result = truncate(text, 10);
        assert_eq!(result.text, text);
        assert!(!result.truncated);
    }

    #[test]
    fn test_truncate_exactly_at_limit() {
        let result = truncate("one two three", 3);
        assert_eq!(result.text, "one two three");
        assert!(!result.truncated);
    }

    #[test]
    fn test_truncate_over_limit() {
        let result = truncate("one\ntwo  three four five", 3);
        assert_eq!(result.text, "one two three");
        assert!(result.truncated);
    }

    #[test]
    fn test_truncate_is_idempotent() {
        let once = truncate("a b c d e f g", 4);
        let twice = truncate(&once.text, 4);
        assert_eq!(once.text, twice.text);
        assert!(!twice.truncated);
        assert_eq!(twice.text.split_whitespace().count(), 4);
    }

    #[test]
    fn test_truncate_zero_limit() {
        let result = truncate("some words", 0);
        assert_eq!(result.text, "");
        assert!(result.truncated);
    }

    #[test]
    fn test_detect_concession_phrase() {
        let detector = ConcessionDetector::default();
        assert!(detector.detect(
            "I have no further points. I concede the point to my opponent."
        ));
    }

    #[test]
    fn test_detect_concession_ignores_case() {
        let detector = ConcessionDetector::default();
        assert!(detector.detect("Frankly, I CANNOT CONTINUE THE DEBATE here."));
        assert!(detector.detect("i admit i can't refute this argument"));
    }

    #[test]
    fn test_no_concession_in_regular_argument() {
        let detector = ConcessionDetector::default();
        assert!(!detector.detect(
            "The evidence strongly favors my position (Smith, 2020)."
        ));
    }

    #[test]
    fn test_custom_phrases_replace_defaults() {
        let detector = ConcessionDetector::new(["I yield"]);
        assert!(detector.detect("Very well, I yield."));
        assert!(!detector.detect("I concede the point"));
    }

    #[test]
    fn test_empty_phrases_are_ignored() {
        let detector = ConcessionDetector::new(["", "I yield"]);
        assert_eq!(detector.phrases().len(), 1);
        assert!(!detector.detect("anything at all"));
    }

    #[test]
    fn test_strip_reasoning_think_block() {
        let input = "<think>Let me plan the rebuttal...</think>The thesis holds (Lee, 2019).";
        assert_eq!(strip_reasoning(input), "The thesis holds (Lee, 2019).");
    }

    #[test]
    fn test_strip_reasoning_multiline_blocks() {
        let input = "<reasoning>\nstep one\nstep two\n</reasoning>\nIntroduction.\n\nBody.";
        assert_eq!(strip_reasoning(input), "Introduction. Body.");
    }

    #[test]
    fn test_strip_reasoning_leaves_plain_text() {
        assert_eq!(strip_reasoning("No tags here."), "No tags here.");
    }
}
