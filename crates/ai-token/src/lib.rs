//! HMAC-signed single-use interview link tokens (C1).
//!
//! The token is self-verifying and derived from interview state: mutating
//! `started_at` (e.g. on reschedule) changes the signature input and so
//! invalidates every previously minted token without a revocation list.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Minimal snapshot of interview state the token service needs. Callers
/// (C2/C3/C8) own the real `Interview` row; this crate never touches SQLite.
#[derive(Debug, Clone)]
pub struct InterviewSnapshot {
    pub interview_id: String,
    pub candidate_email: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

/// Outcome of `verify`. Never panics or returns `Err` — verification always
/// produces a tagged reason so callers can log it without leaking it to the
/// public endpoint (§4.1 failure semantics).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerifyReason {
    Ok,
    BadEncoding,
    UnknownInterview,
    SignatureMismatch,
    Expired,
    NotYetActive,
}

impl std::fmt::Display for VerifyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            VerifyReason::Ok => "OK",
            VerifyReason::BadEncoding => "BAD_ENCODING",
            VerifyReason::UnknownInterview => "UNKNOWN_INTERVIEW",
            VerifyReason::SignatureMismatch => "SIGNATURE_MISMATCH",
            VerifyReason::Expired => "EXPIRED",
            VerifyReason::NotYetActive => "NOT_YET_ACTIVE",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone)]
pub struct VerifyOutcome {
    pub interview_id: Option<String>,
    pub valid: bool,
    pub reason: VerifyReason,
}

impl VerifyOutcome {
    fn fail(reason: VerifyReason, interview_id: Option<String>) -> Self {
        Self {
            interview_id,
            valid: false,
            reason,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MintedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Grace windows governing the token's active time-window, per §6 env vars.
#[derive(Debug, Clone, Copy)]
pub struct GraceWindow {
    pub early_grace_secs: i64,
    pub late_grace_secs: i64,
}

impl Default for GraceWindow {
    fn default() -> Self {
        Self {
            early_grace_secs: 900,
            late_grace_secs: 7200,
        }
    }
}

/// Mints and verifies interview link tokens against a process-wide HMAC secret.
pub struct TokenService {
    secret: Vec<u8>,
    grace: GraceWindow,
}

impl TokenService {
    pub fn new(secret: impl Into<Vec<u8>>, grace: GraceWindow) -> Self {
        Self {
            secret: secret.into(),
            grace,
        }
    }

    /// `mint(interview) → token, expires_at`.
    pub fn mint(&self, interview: &InterviewSnapshot) -> MintedToken {
        let signature = self.sign(interview);
        let payload = format!("{}:{}", interview.interview_id, hex::encode(signature));
        let token = URL_SAFE_NO_PAD.encode(payload.as_bytes());
        let expires_at = interview.ended_at + chrono::Duration::seconds(self.grace.late_grace_secs);
        MintedToken { token, expires_at }
    }

    /// Extract the interview id from a token without verifying its signature,
    /// so callers can look up the `InterviewSnapshot` needed by `verify`.
    pub fn peek_interview_id(token: &str) -> Result<String, VerifyReason> {
        let (interview_id, _sig_hex) = decode_payload(token)?;
        Ok(interview_id)
    }

    /// `verify(token) → {interview_id, valid, reason}`.
    ///
    /// `snapshot` is `None` when the caller could not find a matching
    /// interview for the id embedded in the token (`UNKNOWN_INTERVIEW`).
    pub fn verify(
        &self,
        token: &str,
        snapshot: Option<&InterviewSnapshot>,
        now: DateTime<Utc>,
    ) -> VerifyOutcome {
        let (interview_id, sig_hex) = match decode_payload(token) {
            Ok(parts) => parts,
            Err(reason) => return VerifyOutcome::fail(reason, None),
        };

        let Some(interview) = snapshot else {
            tracing::warn!(interview_id = %interview_id, "verify: unknown interview");
            return VerifyOutcome::fail(VerifyReason::UnknownInterview, Some(interview_id));
        };

        let expected = hex::decode(&sig_hex).unwrap_or_default();
        let actual = self.sign(interview);
        // Constant-time compare via HMAC's own verify_slice.
        let mut mac = HmacSha256::new_from_slice(&self.secret).expect("hmac key of any length");
        mac.update(signing_input(interview).as_bytes());
        if mac.verify_slice(&expected).is_err() || actual.is_empty() {
            tracing::warn!(interview_id = %interview_id, "verify: signature mismatch");
            return VerifyOutcome::fail(VerifyReason::SignatureMismatch, Some(interview_id));
        }

        let not_before = interview.started_at - chrono::Duration::seconds(self.grace.early_grace_secs);
        let expires_at = interview.ended_at + chrono::Duration::seconds(self.grace.late_grace_secs);

        if now < not_before {
            tracing::info!(interview_id = %interview_id, "verify: not yet active");
            return VerifyOutcome::fail(VerifyReason::NotYetActive, Some(interview_id));
        }
        if now > expires_at {
            tracing::info!(interview_id = %interview_id, "verify: expired");
            return VerifyOutcome::fail(VerifyReason::Expired, Some(interview_id));
        }

        VerifyOutcome {
            interview_id: Some(interview_id),
            valid: true,
            reason: VerifyReason::Ok,
        }
    }

    fn sign(&self, interview: &InterviewSnapshot) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(&self.secret).expect("hmac key of any length");
        mac.update(signing_input(interview).as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

fn signing_input(interview: &InterviewSnapshot) -> String {
    format!(
        "{}:{}:{}",
        interview.interview_id,
        interview.candidate_email,
        interview.started_at.to_rfc3339()
    )
}

fn decode_payload(token: &str) -> Result<(String, String), VerifyReason> {
    let raw = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|_| VerifyReason::BadEncoding)?;
    let payload = String::from_utf8(raw).map_err(|_| VerifyReason::BadEncoding)?;
    let colon = payload.rfind(':').ok_or(VerifyReason::BadEncoding)?;
    let (interview_id, rest) = payload.split_at(colon);
    let sig_hex = &rest[1..];
    if interview_id.is_empty() || sig_hex.is_empty() {
        return Err(VerifyReason::BadEncoding);
    }
    Ok((interview_id.to_string(), sig_hex.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn snapshot() -> InterviewSnapshot {
        InterviewSnapshot {
            interview_id: "interview-1".to_string(),
            candidate_email: "c@example.com".to_string(),
            started_at: Utc.with_ymd_and_hms(2025, 6, 15, 4, 30, 0).unwrap(),
            ended_at: Utc.with_ymd_and_hms(2025, 6, 15, 5, 0, 0).unwrap(),
        }
    }

    fn service() -> TokenService {
        TokenService::new(b"top-secret".to_vec(), GraceWindow::default())
    }

    #[test]
    fn mint_then_verify_ok_within_window() {
        let svc = service();
        let snap = snapshot();
        let minted = svc.mint(&snap);
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 4, 20, 0).unwrap();
        let outcome = svc.verify(&minted.token, Some(&snap), now);
        assert_eq!(outcome.reason, VerifyReason::Ok);
        assert!(outcome.valid);
    }

    #[test]
    fn verify_before_early_grace_is_not_yet_active() {
        let svc = service();
        let snap = snapshot();
        let minted = svc.mint(&snap);
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 3, 0, 0).unwrap();
        let outcome = svc.verify(&minted.token, Some(&snap), now);
        assert_eq!(outcome.reason, VerifyReason::NotYetActive);
    }

    #[test]
    fn verify_after_late_grace_is_expired() {
        let svc = service();
        let snap = snapshot();
        let minted = svc.mint(&snap);
        let now = minted.expires_at + chrono::Duration::seconds(1);
        let outcome = svc.verify(&minted.token, Some(&snap), now);
        assert_eq!(outcome.reason, VerifyReason::Expired);
    }

    #[test]
    fn reschedule_invalidates_old_token() {
        let svc = service();
        let snap = snapshot();
        let minted = svc.mint(&snap);

        let mut rescheduled = snap.clone();
        rescheduled.started_at = Utc.with_ymd_and_hms(2025, 6, 15, 9, 0, 0).unwrap();
        rescheduled.ended_at = Utc.with_ymd_and_hms(2025, 6, 15, 9, 30, 0).unwrap();

        let now = Utc.with_ymd_and_hms(2025, 6, 15, 8, 50, 0).unwrap();
        let outcome = svc.verify(&minted.token, Some(&rescheduled), now);
        assert_eq!(outcome.reason, VerifyReason::SignatureMismatch);

        let new_token = svc.mint(&rescheduled);
        let outcome2 = svc.verify(&new_token.token, Some(&rescheduled), now);
        assert_eq!(outcome2.reason, VerifyReason::Ok);
    }

    #[test]
    fn unknown_interview_returns_reason() {
        let svc = service();
        let snap = snapshot();
        let minted = svc.mint(&snap);
        let outcome = svc.verify(&minted.token, None, Utc::now());
        assert_eq!(outcome.reason, VerifyReason::UnknownInterview);
        assert_eq!(outcome.interview_id.as_deref(), Some("interview-1"));
    }

    #[test]
    fn malformed_token_is_bad_encoding() {
        let svc = service();
        let outcome = svc.verify("not-base64!!", None, Utc::now());
        assert_eq!(outcome.reason, VerifyReason::BadEncoding);
    }
}
