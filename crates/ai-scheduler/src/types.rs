use ai_core::ids::{CandidateId, InterviewId, JobId, ScheduleId, SlotId};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// `status` is a pure function of `(current_bookings, max_candidates,
/// cancelled)` — never set directly except via `recompute`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotStatus {
    Available,
    Partial,
    Full,
    Cancelled,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::Available => "AVAILABLE",
            SlotStatus::Partial => "PARTIAL",
            SlotStatus::Full => "FULL",
            SlotStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn recompute(current: u32, max: u32, cancelled: bool) -> Self {
        if cancelled {
            SlotStatus::Cancelled
        } else if current == 0 {
            SlotStatus::Available
        } else if current >= max {
            SlotStatus::Full
        } else {
            SlotStatus::Partial
        }
    }
}

impl std::str::FromStr for SlotStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AVAILABLE" => Ok(Self::Available),
            "PARTIAL" => Ok(Self::Partial),
            "FULL" => Ok(Self::Full),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(format!("unknown slot status: {other}")),
        }
    }
}

/// Civil-time fields (`date`, `start_time`, `end_time`) are wall-clock in the
/// configured interview timezone, never UTC instants (§4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    pub id: SlotId,
    pub job_id: JobId,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub max_candidates: u32,
    pub current_bookings: u32,
    pub status: SlotStatus,
    pub recurrence: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl ScheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Pending => "PENDING",
            ScheduleStatus::Confirmed => "CONFIRMED",
            ScheduleStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::str::FromStr for ScheduleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(format!("unknown schedule status: {other}")),
        }
    }
}

/// Links one Interview to one Slot. Non-owning pointers only, per §9's
/// "no shared mutable cycle" resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingSchedule {
    pub id: ScheduleId,
    pub interview_id: InterviewId,
    pub slot_id: SlotId,
    pub status: ScheduleStatus,
    pub note: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterviewStatus {
    New,
    PendingScheduling,
    Scheduled,
    InProgress,
    Completed,
    Rejected,
    OnHold,
}

impl InterviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewStatus::New => "NEW",
            InterviewStatus::PendingScheduling => "PENDING_SCHEDULING",
            InterviewStatus::Scheduled => "SCHEDULED",
            InterviewStatus::InProgress => "IN_PROGRESS",
            InterviewStatus::Completed => "COMPLETED",
            InterviewStatus::Rejected => "REJECTED",
            InterviewStatus::OnHold => "ON_HOLD",
        }
    }
}

impl std::str::FromStr for InterviewStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(Self::New),
            "PENDING_SCHEDULING" => Ok(Self::PendingScheduling),
            "SCHEDULED" => Ok(Self::Scheduled),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "COMPLETED" => Ok(Self::Completed),
            "REJECTED" => Ok(Self::Rejected),
            "ON_HOLD" => Ok(Self::OnHold),
            other => Err(format!("unknown interview status: {other}")),
        }
    }
}

/// `started_at`/`ended_at` are UTC instants, set only by `book`/`release`;
/// they always equal the bound Slot's civil time projected to UTC (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interview {
    pub id: InterviewId,
    pub candidate_id: CandidateId,
    pub job_id: JobId,
    pub round_label: String,
    pub status: InterviewStatus,
    pub schedule_id: Option<ScheduleId>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub link_expires_at: Option<DateTime<Utc>>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct ConflictRecord {
    pub interview_id: InterviewId,
    pub other_interview_id: InterviewId,
    pub candidate_id: CandidateId,
}
