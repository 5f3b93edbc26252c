use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generate a new UUIDv7 string — time-sortable, used for every row's
/// primary key so log correlation and `ORDER BY id` stay meaningful.
pub fn new_id() -> String {
    Uuid::now_v7().to_string()
}

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new() -> Self {
                Self(new_id())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

id_newtype!(JobId);
id_newtype!(CandidateId);
id_newtype!(SlotId);
id_newtype!(InterviewId);
id_newtype!(ScheduleId);
id_newtype!(SessionId);
id_newtype!(QuestionId);
id_newtype!(ResponseId);
id_newtype!(CodeSubmissionId);
id_newtype!(TestCaseId);
id_newtype!(WarningLogId);
id_newtype!(EvaluationResultId);

/// Opaque 128-bit session key carried on the candidate URL, distinct from
/// the HMAC link token. Rendered as a UUIDv4 hex string (no dashes) so it
/// reads as a single opaque token rather than a structured id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey(pub String);

impl SessionKey {
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
