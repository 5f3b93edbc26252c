use ai_core::ids::{CandidateId, JobId};
use serde::{Deserialize, Serialize};

/// Required coding language for a Job's bound interviews. Non-null is enforced
/// before any session created against this job is allowed to start (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CodingLanguage {
    Python,
    Javascript,
    Java,
    CSharp,
    Php,
    Ruby,
    Sql,
}

impl CodingLanguage {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodingLanguage::Python => "PYTHON",
            CodingLanguage::Javascript => "JAVASCRIPT",
            CodingLanguage::Java => "JAVA",
            CodingLanguage::CSharp => "C_SHARP",
            CodingLanguage::Php => "PHP",
            CodingLanguage::Ruby => "RUBY",
            CodingLanguage::Sql => "SQL",
        }
    }
}

impl std::str::FromStr for CodingLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PYTHON" => Ok(Self::Python),
            "JAVASCRIPT" => Ok(Self::Javascript),
            "JAVA" => Ok(Self::Java),
            "C_SHARP" | "CSHARP" => Ok(Self::CSharp),
            "PHP" => Ok(Self::Php),
            "RUBY" => Ok(Self::Ruby),
            "SQL" => Ok(Self::Sql),
            other => Err(format!("unknown coding language: {other}")),
        }
    }
}

impl std::fmt::Display for CodingLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recruiter-owned job. Immutable for the duration of any open session
/// bound to it — enforced by callers (C2/C3), not this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub tenant_id: String,
    pub title: String,
    pub company: String,
    pub domain: String,
    pub coding_language: CodingLanguage,
    pub description: String,
    pub tech_stack: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A candidate, unique by email within a tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub tenant_id: String,
    pub display_name: String,
    pub email: String,
    pub resume_text: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct NewJob {
    pub tenant_id: String,
    pub title: String,
    pub company: String,
    pub domain: String,
    pub coding_language: CodingLanguage,
    pub description: String,
    pub tech_stack: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NewCandidate {
    pub tenant_id: String,
    pub display_name: String,
    pub email: String,
    pub resume_text: Option<String>,
}
