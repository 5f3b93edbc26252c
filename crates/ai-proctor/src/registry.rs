//! Session-id → Monitor worker registry (§4.4 "Monitor registry"), the same
//! "map of live per-entity workers" shape `skynet-terminal::TerminalManager`
//! uses for its sessions and background jobs.

use std::sync::{Arc, Mutex as StdMutex};

use dashmap::DashMap;
use rusqlite::Connection;

use ai_core::ids::SessionId;

use crate::db;
use crate::error::{ProctorError, Result};
use crate::evidence::EvidenceSink;
use crate::health::DetectorHealthTracker;
use crate::monitor::{Monitor, MonitorConfig, MonitorHandle};
use crate::types::{AudioSignal, DetectorHealthEntry, FrameSignal, WarningLog};

pub struct ProctorRegistry {
    conn: Arc<StdMutex<Connection>>,
    health: Arc<DetectorHealthTracker>,
    evidence: Arc<dyn EvidenceSink>,
    monitors: DashMap<String, MonitorHandle>,
}

impl ProctorRegistry {
    pub fn new(conn: Connection, evidence: Arc<dyn EvidenceSink>) -> Result<Self> {
        db::init_db(&conn)?;
        Ok(Self {
            conn: Arc::new(StdMutex::new(conn)),
            health: Arc::new(DetectorHealthTracker::new()),
            evidence,
            monitors: DashMap::new(),
        })
    }

    pub fn start_monitor(&self, session_id: SessionId, config: MonitorConfig) -> Result<()> {
        let key = session_id.as_str().to_string();
        if self.monitors.contains_key(&key) {
            return Err(ProctorError::MonitorAlreadyActive(key));
        }
        let monitor = Arc::new(Monitor::new(
            session_id,
            self.conn.clone(),
            self.health.clone(),
            self.evidence.clone(),
            config,
        ));
        let handle = MonitorHandle::spawn(monitor);
        self.monitors.insert(key, handle);
        Ok(())
    }

    pub async fn stop_monitor(&self, session_id: &str) -> Result<()> {
        let (_, handle) = self
            .monitors
            .remove(session_id)
            .ok_or_else(|| ProctorError::MonitorNotFound(session_id.to_string()))?;
        handle.stop().await;
        self.health.clear_session(session_id);
        Ok(())
    }

    pub async fn submit_frame(&self, session_id: &str, signal: FrameSignal, frame_bytes: Option<Vec<u8>>) -> Result<()> {
        let handle = self
            .monitors
            .get(session_id)
            .ok_or_else(|| ProctorError::MonitorNotFound(session_id.to_string()))?;
        handle.submit_frame(signal, frame_bytes).await;
        Ok(())
    }

    pub async fn submit_audio(&self, session_id: &str, signal: AudioSignal) -> Result<()> {
        let handle = self
            .monitors
            .get(session_id)
            .ok_or_else(|| ProctorError::MonitorNotFound(session_id.to_string()))?;
        handle.submit_audio(signal).await;
        Ok(())
    }

    pub async fn report_tab_switch(&self, session_id: &str) -> Result<()> {
        let handle = self
            .monitors
            .get(session_id)
            .ok_or_else(|| ProctorError::MonitorNotFound(session_id.to_string()))?;
        handle.submit_tab_switch().await;
        Ok(())
    }

    pub fn is_active(&self, session_id: &str) -> bool {
        self.monitors.contains_key(session_id)
    }

    pub fn health_snapshot(&self, session_id: &str) -> Vec<DetectorHealthEntry> {
        self.health.snapshot(session_id)
    }

    pub fn list_warnings(&self, session_id: &SessionId) -> Result<Vec<WarningLog>> {
        let conn = self.conn.lock().unwrap();
        db::list_for_session(&conn, session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::LoggingEvidenceSink;

    fn registry() -> ProctorRegistry {
        let conn = Connection::open_in_memory().unwrap();
        ProctorRegistry::new(conn, Arc::new(LoggingEvidenceSink)).unwrap()
    }

    #[tokio::test]
    async fn start_submit_stop_roundtrip() {
        let registry = registry();
        let session_id = SessionId::new();
        registry.start_monitor(session_id.clone(), MonitorConfig::default()).unwrap();
        assert!(registry.is_active(session_id.as_str()));

        for _ in 0..16 {
            registry
                .submit_frame(session_id.as_str(), FrameSignal { face_count: 0, ..Default::default() }, None)
                .await
                .unwrap();
        }
        // Give the camera loop a chance to drain the channel.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        registry.stop_monitor(session_id.as_str()).await.unwrap();
        assert!(!registry.is_active(session_id.as_str()));

        let warnings = registry.list_warnings(&session_id).unwrap();
        assert!(warnings.iter().any(|w| w.warning_type == crate::types::WarningType::NoPerson));
    }

    #[tokio::test]
    async fn double_start_is_rejected() {
        let registry = registry();
        let session_id = SessionId::new();
        registry.start_monitor(session_id.clone(), MonitorConfig::default()).unwrap();
        let err = registry.start_monitor(session_id.clone(), MonitorConfig::default()).unwrap_err();
        assert_eq!(err.code(), "MONITOR_ALREADY_ACTIVE");
        registry.stop_monitor(session_id.as_str()).await.unwrap();
    }

    #[tokio::test]
    async fn stop_unknown_session_errors() {
        let registry = registry();
        let err = registry.stop_monitor("missing").await.unwrap_err();
        assert_eq!(err.code(), "MONITOR_NOT_FOUND");
    }
}
