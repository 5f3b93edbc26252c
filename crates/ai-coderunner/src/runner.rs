//! `CodeRunner` — the top-level entry point C6 exposes (§4.6).

use std::time::Duration;

use ai_directory::types::CodingLanguage;
use tracing::instrument;

use crate::error::{CodeRunnerError, Result};
use crate::executor;
use crate::harness;
use crate::sandbox;
use crate::types::{order_test_cases, supported_language, SubmissionResult, TestCase, TestOutcome};

pub struct CodeRunner {
    timeout: Duration,
}

impl CodeRunner {
    pub fn new(timeout_seconds: u64) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_seconds),
        }
    }

    /// Run `source` against every test case for a question, non-hidden
    /// first then hidden, stopping at the first failure (§4.6).
    #[instrument(skip(self, source, test_cases))]
    pub async fn run_submission(
        &self,
        source: &str,
        language: CodingLanguage,
        test_cases: Vec<TestCase>,
    ) -> Result<SubmissionResult> {
        if test_cases.is_empty() {
            return Err(CodeRunnerError::QuestionHasNoTests);
        }
        if !supported_language(language) {
            return Err(CodeRunnerError::LanguageUnsupported(language.to_string()));
        }
        sandbox::check_sandbox_available()?;

        let ordered = order_test_cases(test_cases);
        let mut outcomes = Vec::with_capacity(ordered.len());
        let mut log_lines = Vec::new();
        let mut all_passed = true;

        for (idx, case) in ordered.iter().enumerate() {
            let mut label = format!("Test Case {}", idx + 1);
            if case.is_hidden {
                label.push_str(" (Hidden)");
            }

            let work_dir = tempfile_dir()?;
            let harness = harness::build_harness(source, language, &case.input);
            let run_result = executor::run_harness(&work_dir, &harness, self.timeout).await;
            let _ = tokio::fs::remove_dir_all(&work_dir).await;

            let raw = run_result?;

            if !raw.stderr.is_empty() {
                all_passed = false;
                log_lines.push(format!("{label}: FAILED (Error)"));
                log_lines.push(format!("  Error: {}", raw.stderr));
                outcomes.push(TestOutcome {
                    test_case_id: case.id.clone(),
                    is_hidden: case.is_hidden,
                    passed: false,
                    log_line: log_lines.last().cloned().unwrap_or_default(),
                });
                break;
            }

            let actual = raw.stdout.trim();
            if actual == case.expected_output {
                log_lines.push(format!("{label}: PASSED"));
                outcomes.push(TestOutcome {
                    test_case_id: case.id.clone(),
                    is_hidden: case.is_hidden,
                    passed: true,
                    log_line: format!("{label}: PASSED"),
                });
            } else {
                all_passed = false;
                log_lines.push(format!("{label}: FAILED"));
                log_lines.push(format!("  Input: {}", case.input));
                log_lines.push(format!("  Expected: '{}'", case.expected_output));
                log_lines.push(format!("  Got: '{actual}'"));
                outcomes.push(TestOutcome {
                    test_case_id: case.id.clone(),
                    is_hidden: case.is_hidden,
                    passed: false,
                    log_line: format!("{label}: FAILED"),
                });
                break;
            }
        }

        Ok(SubmissionResult {
            passed_all_tests: all_passed,
            outcomes,
            output_log: log_lines.join("\n"),
        })
    }
}

fn tempfile_dir() -> Result<std::path::PathBuf> {
    let dir = std::env::temp_dir().join(format!("ai-coderunner-{}", ai_core::ids::new_id()));
    std::fs::create_dir_all(&dir).map_err(|e| CodeRunnerError::Io(e.to_string()))?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_test_cases_is_an_error() {
        let runner = CodeRunner::new(15);
        let err = runner.run_submission("def solve(s): return s", CodingLanguage::Python, vec![]).await.unwrap_err();
        assert_eq!(err.code(), "QUESTION_HAS_NO_TESTS");
    }

    #[test]
    fn every_coding_language_variant_is_supported() {
        for lang in [
            CodingLanguage::Python,
            CodingLanguage::Javascript,
            CodingLanguage::Java,
            CodingLanguage::CSharp,
            CodingLanguage::Php,
            CodingLanguage::Ruby,
            CodingLanguage::Sql,
        ] {
            assert!(supported_language(lang));
        }
    }
}
