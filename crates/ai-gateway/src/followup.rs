//! Follow-up generation heuristic (§4.5): only probe an answer that
//! expresses uncertainty, and only keep a follow-up that isn't the sentinel
//! or a too-short response.

/// Phrases grounded on the original's conversational-probe prompt intent —
/// the spec names these three as the canonical examples.
const UNCERTAINTY_PHRASES: &[&str] = &["i don't know", "basic knowledge", "not sure"];

/// `None` sentinel value a `LlmCapability::generate_follow_up` impl may
/// return in place of an actual probe.
pub const NO_FOLLOW_UP_SENTINEL: &str = "NO_FOLLOW_UP";

/// Minimum transcript length (in words) below which no follow-up is
/// requested at all — a one-word "no" isn't worth probing.
const MIN_WORDS_FOR_FOLLOW_UP: usize = 3;

pub fn expresses_uncertainty(transcript: &str) -> bool {
    let lower = transcript.to_lowercase();
    UNCERTAINTY_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

pub fn should_request_follow_up(transcript: &str) -> bool {
    let word_count = transcript.split_whitespace().count();
    word_count >= MIN_WORDS_FOR_FOLLOW_UP && expresses_uncertainty(transcript)
}

/// Normalize a capability's raw follow-up text into the gateway's `Option`:
/// the sentinel and empty/whitespace-only text both collapse to `None`.
pub fn normalize_follow_up(raw: Option<String>) -> Option<String> {
    raw.and_then(|text| {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed == NO_FOLLOW_UP_SENTINEL {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_uncertainty_phrases() {
        assert!(should_request_follow_up("I am not sure about generics"));
        assert!(should_request_follow_up("Honestly I don't know much about that"));
        assert!(!should_request_follow_up("I have five years of experience with Rust"));
    }

    #[test]
    fn short_responses_never_trigger_follow_up() {
        assert!(!should_request_follow_up("not sure"));
    }

    #[test]
    fn sentinel_and_empty_normalize_to_none() {
        assert_eq!(normalize_follow_up(Some("NO_FOLLOW_UP".to_string())), None);
        assert_eq!(normalize_follow_up(Some("   ".to_string())), None);
        assert_eq!(normalize_follow_up(None), None);
    }

    #[test]
    fn real_followup_passes_through_trimmed() {
        assert_eq!(
            normalize_follow_up(Some("  Can you elaborate on that?  ".to_string())),
            Some("Can you elaborate on that?".to_string())
        );
    }
}
