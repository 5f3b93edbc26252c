//! Evidence capture on warning activation. The object store that durably
//! holds screenshots is an external collaborator (§1 Non-goals); this crate
//! only needs somewhere to hand the bytes off to, so `EvidenceSink` stays a
//! thin trait the way `ai-edge`'s `NotificationSink` will.

pub trait EvidenceSink: Send + Sync {
    /// Persists a screenshot captured at activation time and returns an
    /// opaque reference stored on the `WarningLog` row.
    fn capture(&self, session_id: &str, warning_type: &str, frame_bytes: &[u8]) -> Option<String>;
}

/// Default sink: records that a capture happened without actually storing
/// bytes anywhere, producing a deterministic reference. Good enough for a
/// deployment with no object store configured, and for tests.
pub struct LoggingEvidenceSink;

impl EvidenceSink for LoggingEvidenceSink {
    fn capture(&self, session_id: &str, warning_type: &str, frame_bytes: &[u8]) -> Option<String> {
        tracing::info!(
            session_id,
            warning_type,
            bytes = frame_bytes.len(),
            "captured proctor evidence frame"
        );
        Some(format!("evidence://{session_id}/{warning_type}/{}", ai_core::ids::new_id()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logging_sink_returns_a_reference() {
        let sink = LoggingEvidenceSink;
        let reference = sink.capture("sess-1", "NO_PERSON", b"fake-jpeg-bytes");
        assert!(reference.unwrap().starts_with("evidence://sess-1/NO_PERSON/"));
    }
}
