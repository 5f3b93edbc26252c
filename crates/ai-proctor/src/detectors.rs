//! Pure decision logic for each detector, plus the `FrameDetector` /
//! `AudioDetector` trait seam that lets a single detector be marked
//! `Degraded` on failure without taking the whole monitor down — the same
//! shape `ai-gateway`'s capability traits use to isolate one provider's
//! failure from the others.

use chrono::{DateTime, Utc};

use crate::error::{ProctorError, Result};
use crate::types::{
    AudioSignal, FrameSignal, LOW_CONCENTRATION_EAR_THRESHOLD, MULTIPLE_PEOPLE_AREA_RATIO,
};

pub trait FrameDetector: Send + Sync {
    fn name(&self) -> &'static str;
    fn evaluate(&self, signal: &FrameSignal) -> Result<bool>;
}

pub trait AudioDetector: Send + Sync {
    fn name(&self) -> &'static str;
    fn evaluate(&self, signal: &AudioSignal) -> Result<bool>;
}

pub struct NoPersonDetector;
impl FrameDetector for NoPersonDetector {
    fn name(&self) -> &'static str {
        crate::types::DETECTOR_NO_PERSON
    }
    fn evaluate(&self, signal: &FrameSignal) -> Result<bool> {
        Ok(signal.face_count == 0)
    }
}

pub struct MultiplePeopleDetector;
impl FrameDetector for MultiplePeopleDetector {
    fn name(&self) -> &'static str {
        crate::types::DETECTOR_MULTIPLE_PEOPLE
    }
    fn evaluate(&self, signal: &FrameSignal) -> Result<bool> {
        Ok(signal.face_count > 1
            && signal.secondary_face_area_ratio.unwrap_or(0.0) >= MULTIPLE_PEOPLE_AREA_RATIO)
    }
}

pub struct PhoneDetector;
impl FrameDetector for PhoneDetector {
    fn name(&self) -> &'static str {
        crate::types::DETECTOR_PHONE
    }
    fn evaluate(&self, signal: &FrameSignal) -> Result<bool> {
        Ok(signal.phone_detected)
    }
}

pub struct LowConcentrationDetector;
impl FrameDetector for LowConcentrationDetector {
    fn name(&self) -> &'static str {
        crate::types::DETECTOR_LOW_CONCENTRATION
    }
    fn evaluate(&self, signal: &FrameSignal) -> Result<bool> {
        if !signal.landmarks_present {
            return Ok(true);
        }
        match signal.eye_aspect_ratio {
            Some(ear) => Ok(ear < LOW_CONCENTRATION_EAR_THRESHOLD),
            None => Ok(true),
        }
    }
}

pub struct ExcessiveNoiseDetector {
    pub threshold: f64,
}
impl AudioDetector for ExcessiveNoiseDetector {
    fn name(&self) -> &'static str {
        crate::types::DETECTOR_EXCESSIVE_NOISE
    }
    fn evaluate(&self, signal: &AudioSignal) -> Result<bool> {
        Ok(signal.energy_level > self.threshold)
    }
}

pub struct MultipleSpeakersDetector;
impl AudioDetector for MultipleSpeakersDetector {
    fn name(&self) -> &'static str {
        crate::types::DETECTOR_MULTIPLE_SPEAKERS
    }
    fn evaluate(&self, signal: &AudioSignal) -> Result<bool> {
        Ok(signal.speaker_count > 1)
    }
}

/// A detector whose `evaluate` always errs, used to exercise the
/// degrade-in-isolation path in tests.
#[cfg(test)]
pub struct FailingFrameDetector;
#[cfg(test)]
impl FrameDetector for FailingFrameDetector {
    fn name(&self) -> &'static str {
        "failing"
    }
    fn evaluate(&self, _signal: &FrameSignal) -> Result<bool> {
        Err(ProctorError::DetectorFailure(
            "failing".to_string(),
            "model unavailable".to_string(),
        ))
    }
}

/// No-op clock-carrying marker so frame detectors (stateless) and the
/// duration-based sustain trackers (which need `now`) share one call site.
pub fn now_marker() -> DateTime<Utc> {
    Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_person_fires_on_zero_faces() {
        let d = NoPersonDetector;
        assert!(d
            .evaluate(&FrameSignal {
                face_count: 0,
                ..Default::default()
            })
            .unwrap());
        assert!(!d
            .evaluate(&FrameSignal {
                face_count: 1,
                ..Default::default()
            })
            .unwrap());
    }

    #[test]
    fn multiple_people_requires_area_ratio() {
        let d = MultiplePeopleDetector;
        assert!(!d
            .evaluate(&FrameSignal {
                face_count: 2,
                secondary_face_area_ratio: Some(0.1),
                ..Default::default()
            })
            .unwrap());
        assert!(d
            .evaluate(&FrameSignal {
                face_count: 2,
                secondary_face_area_ratio: Some(0.4),
                ..Default::default()
            })
            .unwrap());
    }

    #[test]
    fn low_concentration_fires_on_missing_landmarks_or_low_ear() {
        let d = LowConcentrationDetector;
        assert!(d
            .evaluate(&FrameSignal {
                landmarks_present: false,
                ..Default::default()
            })
            .unwrap());
        assert!(d
            .evaluate(&FrameSignal {
                landmarks_present: true,
                eye_aspect_ratio: Some(0.1),
                ..Default::default()
            })
            .unwrap());
        assert!(!d
            .evaluate(&FrameSignal {
                landmarks_present: true,
                eye_aspect_ratio: Some(0.4),
                ..Default::default()
            })
            .unwrap());
    }

    #[test]
    fn excessive_noise_respects_threshold() {
        let d = ExcessiveNoiseDetector { threshold: 0.7 };
        assert!(!d
            .evaluate(&AudioSignal {
                energy_level: 0.5,
                speaker_count: 1,
            })
            .unwrap());
        assert!(d
            .evaluate(&AudioSignal {
                energy_level: 0.9,
                speaker_count: 1,
            })
            .unwrap());
    }
}
