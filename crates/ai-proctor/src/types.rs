use ai_core::ids::{SessionId, WarningLogId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The seven warning types the decision pipeline can raise, plus the
/// synthetic `ProctorDegraded` marker for full-monitor failure (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningType {
    NoPerson,
    MultiplePeople,
    PhoneDetected,
    LowConcentration,
    TabSwitched,
    ExcessiveNoise,
    MultipleSpeakers,
    ProctorDegraded,
}

impl WarningType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningType::NoPerson => "NO_PERSON",
            WarningType::MultiplePeople => "MULTIPLE_PEOPLE",
            WarningType::PhoneDetected => "PHONE_DETECTED",
            WarningType::LowConcentration => "LOW_CONCENTRATION",
            WarningType::TabSwitched => "TAB_SWITCHED",
            WarningType::ExcessiveNoise => "EXCESSIVE_NOISE",
            WarningType::MultipleSpeakers => "MULTIPLE_SPEAKERS",
            WarningType::ProctorDegraded => "PROCTOR_DEGRADED",
        }
    }

    /// Evidence capture never fires for these — a tab-switch has no frame to
    /// attach, and a degradation marker isn't an observed behavior (§4.4).
    pub fn captures_evidence(&self) -> bool {
        !matches!(self, WarningType::TabSwitched | WarningType::ProctorDegraded)
    }
}

impl std::str::FromStr for WarningType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NO_PERSON" => Ok(Self::NoPerson),
            "MULTIPLE_PEOPLE" => Ok(Self::MultiplePeople),
            "PHONE_DETECTED" => Ok(Self::PhoneDetected),
            "LOW_CONCENTRATION" => Ok(Self::LowConcentration),
            "TAB_SWITCHED" => Ok(Self::TabSwitched),
            "EXCESSIVE_NOISE" => Ok(Self::ExcessiveNoise),
            "MULTIPLE_SPEAKERS" => Ok(Self::MultipleSpeakers),
            "PROCTOR_DEGRADED" => Ok(Self::ProctorDegraded),
            other => Err(format!("unknown warning type: {other}")),
        }
    }
}

/// One logged activation edge. Append-only: a warning is never updated or
/// deleted once persisted (§6 "Persisted state layout").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarningLog {
    pub id: WarningLogId,
    pub session_id: SessionId,
    pub warning_type: WarningType,
    pub suppressed: bool,
    pub evidence_ref: Option<String>,
    pub detail: Option<String>,
    pub created_at: String,
}

/// Feature vector for one processed camera frame. The model that produces
/// this (face detection, bounding boxes, landmarks) lives outside this
/// crate's scope; `ai-proctor` only decides from the extracted features,
/// mirroring how `ai-gateway` decides from provider responses rather than
/// running inference itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameSignal {
    pub face_count: u32,
    /// Area of the second-largest detected face as a fraction of the frame,
    /// relative to the largest face's area. `None` when fewer than 2 faces.
    pub secondary_face_area_ratio: Option<f64>,
    pub phone_detected: bool,
    pub eye_aspect_ratio: Option<f64>,
    pub landmarks_present: bool,
}

/// Feature vector for one ~1-second audio chunk.
#[derive(Debug, Clone, Copy, Default)]
pub struct AudioSignal {
    pub energy_level: f64,
    pub speaker_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DetectorStatus {
    Ok,
    Degraded,
    Down,
    Unknown,
}

impl std::fmt::Display for DetectorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DetectorStatus::Ok => "OK",
            DetectorStatus::Degraded => "DEGRADED",
            DetectorStatus::Down => "DOWN",
            DetectorStatus::Unknown => "UNKNOWN",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorHealthEntry {
    pub name: String,
    pub status: DetectorStatus,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
    pub total_evaluations: u64,
    pub total_failures: u64,
    pub last_run_at: Option<DateTime<Utc>>,
}

/// Detector names, stable strings used as health-tracker keys and in
/// `WarningLog.detail` / log lines.
pub const DETECTOR_NO_PERSON: &str = "no_person";
pub const DETECTOR_MULTIPLE_PEOPLE: &str = "multiple_people";
pub const DETECTOR_PHONE: &str = "phone_detected";
pub const DETECTOR_LOW_CONCENTRATION: &str = "low_concentration";
pub const DETECTOR_EXCESSIVE_NOISE: &str = "excessive_noise";
pub const DETECTOR_MULTIPLE_SPEAKERS: &str = "multiple_speakers";

/// Heavy detectors (face geometry, phone, landmarks) run every Nth processed
/// frame; `NO_PERSON` is cheap and runs on every frame (§4.4).
pub const DEFAULT_HEAVY_DETECTOR_STRIDE: u32 = 15;

/// MULTIPLE_PEOPLE activates when a second face's area is at least this
/// fraction of the largest face's area (§4.4).
pub const MULTIPLE_PEOPLE_AREA_RATIO: f64 = 0.35;

/// LOW_CONCENTRATION activates below this eye-aspect-ratio, or when
/// landmarks can't be located at all (§4.4).
pub const LOW_CONCENTRATION_EAR_THRESHOLD: f64 = 0.25;

/// LOW_CONCENTRATION requires this many consecutive qualifying frames
/// before it activates (§4.4).
pub const LOW_CONCENTRATION_CONSECUTIVE_FRAMES: u32 = 8;

/// NO_PERSON must be sustained this long before it activates (§4.4).
pub const NO_PERSON_SUSTAIN_SECS: i64 = 30;
