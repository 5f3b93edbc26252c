//! Markdown question-sheet parser and the deterministic fallback set (§4.5).
//!
//! Grounded on the original prompt/parser pair in
//! `examples/original_source/ai_interview/services.py::generate_questions`:
//! the prompt demands `## Technical Questions` / `## Behavioral Questions`
//! headers with hyphen-prefixed bullets; the parser here is the Rust
//! equivalent of that regex scan, generalized to also recognize an
//! ice-breaker section and a coding section (the original treated the
//! ice-breaker as a single hardcoded line rather than a parsed section).

use ai_directory::types::CodingLanguage;

use crate::capability::{GeneratedQuestion, QuestionCategory};

/// Parse a Markdown question sheet into categorized questions.
///
/// Returns `None` if no recognizable `##` section with at least one
/// hyphen-prefixed bullet was found — the caller falls back to
/// [`fallback_questions`] in that case (§4.5 "On parse failure... emit the
/// fallback set").
pub fn parse_question_sheet(markdown: &str, coding_language: CodingLanguage) -> Option<Vec<GeneratedQuestion>> {
    let mut questions = Vec::new();
    let mut current_category: Option<QuestionCategory> = None;

    for line in markdown.lines() {
        let trimmed = line.trim();
        if let Some(header) = trimmed.strip_prefix("##") {
            current_category = classify_header(header.trim());
            continue;
        }
        if let Some(bullet) = trimmed.strip_prefix('-') {
            let Some(category) = current_category else {
                continue;
            };
            let text = bullet.trim().to_string();
            if text.is_empty() {
                continue;
            }
            let coding_language = matches!(category, QuestionCategory::Coding).then_some(coding_language);
            questions.push(GeneratedQuestion {
                category,
                text,
                coding_language,
            });
        }
    }

    if questions.is_empty() {
        None
    } else {
        Some(questions)
    }
}

fn classify_header(header: &str) -> Option<QuestionCategory> {
    let lower = header.to_lowercase();
    if lower.contains("ice") {
        Some(QuestionCategory::IceBreaker)
    } else if lower.contains("technical") {
        Some(QuestionCategory::Technical)
    } else if lower.contains("behavioral") || lower.contains("behavioural") {
        Some(QuestionCategory::Behavioral)
    } else if lower.contains("coding") || lower.contains("code") {
        Some(QuestionCategory::Coding)
    } else {
        None
    }
}

/// The deterministic default content served when the AI Gateway is degraded
/// (§4.5, §9 "Open questions": the fallback CODING question must match the
/// job's coding language, not hardcode JavaScript as the original source did).
pub fn fallback_questions(candidate_name: &str, coding_language: CodingLanguage) -> Vec<GeneratedQuestion> {
    vec![
        GeneratedQuestion {
            category: QuestionCategory::IceBreaker,
            text: format!(
                "Welcome {candidate_name}! Can you tell me about a challenging project you have worked on?"
            ),
            coding_language: None,
        },
        GeneratedQuestion {
            category: QuestionCategory::Technical,
            text: format!("What are the core strengths of {coding_language} that make it a good fit for this role?"),
            coding_language: None,
        },
        GeneratedQuestion {
            category: QuestionCategory::Behavioral,
            text: "Describe a time you had a conflict with a coworker and how you resolved it.".to_string(),
            coding_language: None,
        },
        GeneratedQuestion {
            category: QuestionCategory::Coding,
            text: "Write a function `solve` that reverses a given string.".to_string(),
            coding_language: Some(coding_language),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET: &str = "\
## Ice Breaker
- Welcome! Tell me about yourself.

## Technical Questions
- What is the difference between `let`, `const`, and `var`?
- Explain closures.

## Behavioral Questions
- Tell me about a conflict you resolved.
";

    #[test]
    fn parses_all_sections() {
        let parsed = parse_question_sheet(SHEET, CodingLanguage::Python).unwrap();
        assert_eq!(parsed.len(), 4);
        assert_eq!(parsed[0].category, QuestionCategory::IceBreaker);
        assert_eq!(parsed[1].category, QuestionCategory::Technical);
        assert_eq!(parsed[3].category, QuestionCategory::Behavioral);
    }

    #[test]
    fn unparseable_text_returns_none() {
        assert!(parse_question_sheet("no headers or bullets here", CodingLanguage::Python).is_none());
    }

    #[test]
    fn fallback_set_matches_job_coding_language() {
        let fallback = fallback_questions("Ada", CodingLanguage::Ruby);
        let coding = fallback
            .iter()
            .find(|q| q.category == QuestionCategory::Coding)
            .expect("fallback always includes a coding question");
        assert_eq!(coding.coding_language, Some(CodingLanguage::Ruby));
        assert!(fallback.iter().any(|q| q.category == QuestionCategory::IceBreaker));
        assert!(fallback.iter().any(|q| q.category == QuestionCategory::Technical));
        assert!(fallback.iter().any(|q| q.category == QuestionCategory::Behavioral));
    }
}
