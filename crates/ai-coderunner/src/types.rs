use ai_core::ids::{QuestionId, TestCaseId};
use ai_directory::types::CodingLanguage;
use serde::{Deserialize, Serialize};

/// A single test case attached to a CODING question. Ordering within a
/// suite is non-hidden first (by id), then hidden (§3, §4.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub id: TestCaseId,
    pub question_id: QuestionId,
    pub input: String,
    pub expected_output: String,
    pub is_hidden: bool,
}

/// Outcome of running one test case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestOutcome {
    pub test_case_id: TestCaseId,
    pub is_hidden: bool,
    pub passed: bool,
    pub log_line: String,
}

/// Aggregated result of a full submission run (§4.6: stop at first failure).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub passed_all_tests: bool,
    pub outcomes: Vec<TestOutcome>,
    pub output_log: String,
}

/// The language-specific entry point a harness invokes when the submitted
/// source doesn't define its own top-level function (§4.6: "default `solve`").
pub const DEFAULT_ENTRY_POINT: &str = "solve";

pub fn order_test_cases(mut cases: Vec<TestCase>) -> Vec<TestCase> {
    cases.sort_by(|a, b| match (a.is_hidden, b.is_hidden) {
        (false, true) => std::cmp::Ordering::Less,
        (true, false) => std::cmp::Ordering::Greater,
        _ => a.id.as_str().cmp(b.id.as_str()),
    });
    cases
}

pub fn supported_language(lang: CodingLanguage) -> bool {
    matches!(
        lang,
        CodingLanguage::Python
            | CodingLanguage::Javascript
            | CodingLanguage::Java
            | CodingLanguage::CSharp
            | CodingLanguage::Php
            | CodingLanguage::Ruby
            | CodingLanguage::Sql
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(id: &str, hidden: bool) -> TestCase {
        TestCase {
            id: TestCaseId::from(id),
            question_id: QuestionId::new(),
            input: "1".to_string(),
            expected_output: "1".to_string(),
            is_hidden: hidden,
        }
    }

    #[test]
    fn non_hidden_sort_before_hidden() {
        let cases = vec![case("b", true), case("a", false), case("c", false)];
        let ordered = order_test_cases(cases);
        assert_eq!(ordered[0].id.as_str(), "a");
        assert_eq!(ordered[1].id.as_str(), "c");
        assert_eq!(ordered[2].id.as_str(), "b");
    }
}
