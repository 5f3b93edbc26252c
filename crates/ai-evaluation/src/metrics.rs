//! Mechanical metrics: filler-word counting, words-per-minute, and a
//! fixed-lexicon sentiment polarity score. Ported from the original
//! implementation's `FILLER_WORDS` list and `TextBlob`-based sentiment
//! (§4.7 item 7, §9 "simple, deterministic, stored-not-authoritative"),
//! without pulling in an NLP dependency the teacher stack doesn't carry.

/// Same list, same order, as the original `ai_interview/services.py`.
pub const FILLER_WORDS: &[&str] = &[
    "um", "uh", "er", "ah", "like", "okay", "right", "so", "you know", "i mean", "basically",
    "actually", "literally",
];

/// Small fixed-polarity lexicon standing in for `TextBlob`'s sentiment
/// scorer. Positive and negative word lists, scored `(positive - negative) /
/// total_words`, bounded to `[-1.0, 1.0]` exactly like `TextBlob.polarity`.
const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "excellent", "strong", "confident", "clear", "solid", "effective",
    "successful", "efficient", "positive", "happy", "pleased", "love", "enjoy", "best",
];
const NEGATIVE_WORDS: &[&str] = &[
    "bad", "poor", "weak", "confused", "unsure", "difficult", "struggle", "fail", "failed",
    "negative", "worried", "frustrated", "hate", "worst", "unclear", "problem",
];

/// Count of filler-word occurrences in `text`, case-insensitive substring
/// match (mirrors `lower_text.count(word) for word in FILLER_WORDS`).
pub fn count_filler_words(text: &str) -> u32 {
    let lower = text.to_lowercase();
    FILLER_WORDS.iter().map(|w| lower.matches(w).count() as u32).sum()
}

/// Words-per-minute given an elapsed duration. Zero duration yields zero
/// rather than dividing by zero.
pub fn words_per_minute(text: &str, duration_seconds: f64) -> f64 {
    if duration_seconds <= 0.0 {
        return 0.0;
    }
    let word_count = text.split_whitespace().count() as f64;
    word_count / (duration_seconds / 60.0)
}

/// Polarity in `[-1.0, 1.0]`. Empty/neutral text scores `0.0`.
pub fn sentiment_polarity(text: &str) -> f64 {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower.split_whitespace().collect();
    if words.is_empty() {
        return 0.0;
    }
    let positive = words.iter().filter(|w| POSITIVE_WORDS.contains(w)).count() as f64;
    let negative = words.iter().filter(|w| NEGATIVE_WORDS.contains(w)).count() as f64;
    if positive == 0.0 && negative == 0.0 {
        return 0.0;
    }
    ((positive - negative) / words.len() as f64).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_filler_words_case_insensitively() {
        assert_eq!(count_filler_words("Um, so, like, I mean, basically I think it's fine"), 4);
    }

    #[test]
    fn wpm_handles_zero_duration() {
        assert_eq!(words_per_minute("one two three", 0.0), 0.0);
    }

    #[test]
    fn wpm_computes_rate() {
        assert_eq!(words_per_minute("one two three four five six", 60.0), 6.0);
    }

    #[test]
    fn sentiment_detects_positive_and_negative() {
        assert!(sentiment_polarity("this was a great and excellent experience") > 0.0);
        assert!(sentiment_polarity("I struggled and failed, it was a poor attempt") < 0.0);
        assert_eq!(sentiment_polarity(""), 0.0);
        assert_eq!(sentiment_polarity("the weather today is cloudy"), 0.0);
    }
}
