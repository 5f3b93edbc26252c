//! The per-session decision engine: feeds frame/audio signals through the
//! detector set, turns activation edges into persisted `WarningLog` rows,
//! and exposes a cancellable async worker shape grounded on
//! `skynet-terminal`'s `exec` — a timeout/cancellation race around a
//! spawned task, swapped here for a `CancellationToken` instead of a
//! process kill signal.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use chrono::Utc;
use rusqlite::Connection;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use ai_core::ids::SessionId;

use crate::db;
use crate::detectors::{
    AudioDetector, ExcessiveNoiseDetector, FrameDetector, LowConcentrationDetector,
    MultiplePeopleDetector, MultipleSpeakersDetector, NoPersonDetector, PhoneDetector,
};
use crate::error::Result;
use crate::evidence::EvidenceSink;
use crate::grace::{DurationSustainTracker, FrameSustainTracker};
use crate::health::DetectorHealthTracker;
use crate::types::{
    AudioSignal, FrameSignal, WarningLog, WarningType, DEFAULT_HEAVY_DETECTOR_STRIDE,
    LOW_CONCENTRATION_CONSECUTIVE_FRAMES, NO_PERSON_SUSTAIN_SECS,
};

/// Time the cancellation contract allows a monitor's worker loop to notice
/// the signal and return (§4.4 "a cancellable worker").
pub const CANCELLATION_GRACE: Duration = Duration::from_secs(2);

#[derive(Clone)]
pub struct MonitorConfig {
    pub heavy_detector_stride: u32,
    pub no_person_sustain_secs: i64,
    pub low_concentration_frames: u32,
    pub excessive_noise_threshold: f64,
    pub excessive_noise_sustain_secs: i64,
    pub multiple_speakers_sustain_secs: i64,
    pub suppressed: HashSet<WarningType>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            heavy_detector_stride: DEFAULT_HEAVY_DETECTOR_STRIDE,
            no_person_sustain_secs: NO_PERSON_SUSTAIN_SECS,
            low_concentration_frames: LOW_CONCENTRATION_CONSECUTIVE_FRAMES,
            excessive_noise_threshold: 0.75,
            excessive_noise_sustain_secs: 5,
            multiple_speakers_sustain_secs: 3,
            suppressed: HashSet::new(),
        }
    }
}

struct DetectorState {
    no_person: DurationSustainTracker,
    multiple_people: FrameSustainTracker,
    phone: FrameSustainTracker,
    low_concentration: FrameSustainTracker,
    excessive_noise: DurationSustainTracker,
    multiple_speakers: DurationSustainTracker,
}

impl DetectorState {
    fn new(config: &MonitorConfig) -> Self {
        Self {
            no_person: DurationSustainTracker::new(chrono::Duration::seconds(config.no_person_sustain_secs)),
            multiple_people: FrameSustainTracker::new(1),
            phone: FrameSustainTracker::new(1),
            low_concentration: FrameSustainTracker::new(config.low_concentration_frames),
            excessive_noise: DurationSustainTracker::new(chrono::Duration::seconds(
                config.excessive_noise_sustain_secs,
            )),
            multiple_speakers: DurationSustainTracker::new(chrono::Duration::seconds(
                config.multiple_speakers_sustain_secs,
            )),
        }
    }
}

/// Synchronous decision core for one session. Kept free of any async or I/O
/// concerns beyond SQLite so its logic can be driven directly in tests;
/// [`MonitorHandle`] wraps it with the channel-fed worker loops.
pub struct Monitor {
    session_id: SessionId,
    conn: Arc<StdMutex<Connection>>,
    health: Arc<DetectorHealthTracker>,
    evidence: Arc<dyn EvidenceSink>,
    config: MonitorConfig,
    frame_counter: AtomicU32,
    state: StdMutex<DetectorState>,
}

impl Monitor {
    pub fn new(
        session_id: SessionId,
        conn: Arc<StdMutex<Connection>>,
        health: Arc<DetectorHealthTracker>,
        evidence: Arc<dyn EvidenceSink>,
        config: MonitorConfig,
    ) -> Self {
        let state = StdMutex::new(DetectorState::new(&config));
        Self {
            session_id,
            conn,
            health,
            evidence,
            config,
            frame_counter: AtomicU32::new(0),
            state,
        }
    }

    fn on_activation(&self, warning_type: WarningType, detail: Option<String>, frame_bytes: Option<&[u8]>) -> Result<WarningLog> {
        let suppressed = self.config.suppressed.contains(&warning_type);
        let evidence_ref = if warning_type.captures_evidence() && !suppressed {
            frame_bytes.and_then(|bytes| self.evidence.capture(self.session_id.as_str(), warning_type.as_str(), bytes))
        } else {
            None
        };
        warn!(
            session_id = self.session_id.as_str(),
            warning_type = warning_type.as_str(),
            suppressed,
            "proctor warning activated"
        );
        let conn = self.conn.lock().unwrap();
        db::insert_warning(&conn, &self.session_id, warning_type, suppressed, evidence_ref, detail)
    }

    /// Evaluates one camera frame. Heavy detectors (face geometry, phone,
    /// landmarks) only run every `heavy_detector_stride`th frame;
    /// `NO_PERSON` runs on every frame since absence is the cheapest signal
    /// to compute and the one most valuable to catch quickly.
    pub fn process_frame(&self, signal: &FrameSignal, frame_bytes: Option<&[u8]>) -> Result<Vec<WarningLog>> {
        let now = Utc::now();
        let mut activations = Vec::new();
        let count = self.frame_counter.fetch_add(1, Ordering::SeqCst) + 1;

        let raw_no_person = self.evaluate_frame(&NoPersonDetector, signal);
        let mut state = self.state.lock().unwrap();
        if let Some(raw) = raw_no_person {
            if state.no_person.observe(raw, now) {
                drop(state);
                activations.push(self.on_activation(WarningType::NoPerson, None, frame_bytes)?);
                state = self.state.lock().unwrap();
            }
        }

        if count % self.config.heavy_detector_stride == 0 {
            if let Some(raw) = self.evaluate_frame(&MultiplePeopleDetector, signal) {
                if state.multiple_people.observe(raw) {
                    drop(state);
                    activations.push(self.on_activation(WarningType::MultiplePeople, None, frame_bytes)?);
                    state = self.state.lock().unwrap();
                }
            }
            if let Some(raw) = self.evaluate_frame(&PhoneDetector, signal) {
                if state.phone.observe(raw) {
                    drop(state);
                    activations.push(self.on_activation(WarningType::PhoneDetected, None, frame_bytes)?);
                    state = self.state.lock().unwrap();
                }
            }
            if let Some(raw) = self.evaluate_frame(&LowConcentrationDetector, signal) {
                if state.low_concentration.observe(raw) {
                    drop(state);
                    activations.push(self.on_activation(WarningType::LowConcentration, None, frame_bytes)?);
                }
            }
        }

        Ok(activations)
    }

    pub fn process_audio(&self, signal: &AudioSignal) -> Result<Vec<WarningLog>> {
        let now = Utc::now();
        let mut activations = Vec::new();
        let noise_detector = ExcessiveNoiseDetector {
            threshold: self.config.excessive_noise_threshold,
        };
        let mut state = self.state.lock().unwrap();
        if let Some(raw) = self.evaluate_audio(&noise_detector, signal) {
            if state.excessive_noise.observe(raw, now) {
                drop(state);
                activations.push(self.on_activation(WarningType::ExcessiveNoise, None, None)?);
                state = self.state.lock().unwrap();
            }
        }
        if let Some(raw) = self.evaluate_audio(&MultipleSpeakersDetector, signal) {
            if state.multiple_speakers.observe(raw, now) {
                drop(state);
                activations.push(self.on_activation(
                    WarningType::MultipleSpeakers,
                    Some(format!("{} speakers detected", signal.speaker_count)),
                    None,
                )?);
            }
        }
        Ok(activations)
    }

    /// A client-reported visibility change. Each call represents a discrete
    /// event already debounced by the caller, so it always logs (no grace
    /// window applies).
    pub fn report_tab_switch(&self) -> Result<WarningLog> {
        self.on_activation(WarningType::TabSwitched, None, None)
    }

    /// Logs the full-monitor-degraded marker when the worker loop itself
    /// fails outside of ID verification (§4.4).
    pub fn report_degraded(&self, reason: &str) -> Result<WarningLog> {
        self.on_activation(WarningType::ProctorDegraded, Some(reason.to_string()), None)
    }

    pub fn health_snapshot(&self) -> Vec<crate::types::DetectorHealthEntry> {
        self.health.snapshot(self.session_id.as_str())
    }

    fn evaluate_frame(&self, detector: &dyn FrameDetector, signal: &FrameSignal) -> Option<bool> {
        match detector.evaluate(signal) {
            Ok(raw) => {
                self.health.record_success(self.session_id.as_str(), detector.name());
                Some(raw)
            }
            Err(err) => {
                self.health
                    .record_failure(self.session_id.as_str(), detector.name(), &err.to_string());
                None
            }
        }
    }

    fn evaluate_audio(&self, detector: &dyn AudioDetector, signal: &AudioSignal) -> Option<bool> {
        match detector.evaluate(signal) {
            Ok(raw) => {
                self.health.record_success(self.session_id.as_str(), detector.name());
                Some(raw)
            }
            Err(err) => {
                self.health
                    .record_failure(self.session_id.as_str(), detector.name(), &err.to_string());
                None
            }
        }
    }
}

/// Channel-fed async wrapper around [`Monitor`]. Two independent loops
/// (camera, audio) run until cancelled; neither ever awaits the AI Gateway
/// or any other network call, so a slow provider can't stall proctoring
/// (§4.4 "never blocks on AI Gateway").
pub struct MonitorHandle {
    pub monitor: Arc<Monitor>,
    frame_tx: mpsc::Sender<(FrameSignal, Option<Vec<u8>>)>,
    audio_tx: mpsc::Sender<AudioSignal>,
    tab_tx: mpsc::Sender<()>,
    cancel: CancellationToken,
    camera_task: tokio::task::JoinHandle<()>,
    audio_task: tokio::task::JoinHandle<()>,
}

impl MonitorHandle {
    pub fn spawn(monitor: Arc<Monitor>) -> Self {
        let cancel = CancellationToken::new();
        let (frame_tx, mut frame_rx) = mpsc::channel::<(FrameSignal, Option<Vec<u8>>)>(64);
        let (audio_tx, mut audio_rx) = mpsc::channel::<AudioSignal>(32);
        let (tab_tx, mut tab_rx) = mpsc::channel::<()>(8);

        let camera_monitor = monitor.clone();
        let camera_cancel = cancel.clone();
        let camera_task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = camera_cancel.cancelled() => break,
                    maybe = frame_rx.recv() => {
                        match maybe {
                            Some((signal, bytes)) => {
                                if let Err(err) = camera_monitor.process_frame(&signal, bytes.as_deref()) {
                                    warn!(error = %err, "camera detector tick failed");
                                }
                            }
                            None => break,
                        }
                    }
                    maybe = tab_rx.recv() => {
                        match maybe {
                            Some(()) => {
                                if let Err(err) = camera_monitor.report_tab_switch() {
                                    warn!(error = %err, "failed to log tab switch");
                                }
                            }
                            None => {}
                        }
                    }
                }
            }
            info!(session_id = camera_monitor.session_id.as_str(), "camera monitor loop stopped");
        });

        let audio_monitor = monitor.clone();
        let audio_cancel = cancel.clone();
        let audio_task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = audio_cancel.cancelled() => break,
                    maybe = audio_rx.recv() => {
                        match maybe {
                            Some(signal) => {
                                if let Err(err) = audio_monitor.process_audio(&signal) {
                                    warn!(error = %err, "audio detector tick failed");
                                }
                            }
                            None => break,
                        }
                    }
                }
            }
            info!(session_id = audio_monitor.session_id.as_str(), "audio monitor loop stopped");
        });

        Self {
            monitor,
            frame_tx,
            audio_tx,
            tab_tx,
            cancel,
            camera_task,
            audio_task,
        }
    }

    pub async fn submit_frame(&self, signal: FrameSignal, frame_bytes: Option<Vec<u8>>) {
        let _ = self.frame_tx.send((signal, frame_bytes)).await;
    }

    pub async fn submit_audio(&self, signal: AudioSignal) {
        let _ = self.audio_tx.send(signal).await;
    }

    pub async fn submit_tab_switch(&self) {
        let _ = self.tab_tx.send(()).await;
    }

    /// Signals cancellation and waits up to [`CANCELLATION_GRACE`] for both
    /// loops to exit. If either misses the deadline a `PROCTOR_DEGRADED`
    /// warning is logged — the worker is abandoned either way since the
    /// session is ending.
    pub async fn stop(self) {
        self.cancel.cancel();
        let joined = tokio::time::timeout(CANCELLATION_GRACE, async {
            let _ = self.camera_task.await;
            let _ = self.audio_task.await;
        })
        .await;
        if joined.is_err() {
            let _ = self.monitor.report_degraded("monitor worker did not stop within the cancellation grace period");
        }
    }
}
