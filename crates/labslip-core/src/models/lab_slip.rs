//! Lab slip models and the lifecycle status vocabulary.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lab::Lab;

/// Days between slip creation and the lab's expected return date.
pub const LAB_TURNAROUND_DAYS: i64 = 14;

/// Lab slip lifecycle status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SlipStatus {
    /// Created, not yet sent to the lab
    Pending,
    /// Physically or electronically handed to the lab
    Sent,
    /// Lab confirmed receipt and started fabrication
    InProgress,
    /// Work returned from the lab
    Completed,
    /// Order withdrawn; terminal, records are never deleted
    Cancelled,
}

impl SlipStatus {
    /// Stored string form (matches the serde wire form).
    pub fn as_str(&self) -> &'static str {
        match self {
            SlipStatus::Pending => "pending",
            SlipStatus::Sent => "sent",
            SlipStatus::InProgress => "in_progress",
            SlipStatus::Completed => "completed",
            SlipStatus::Cancelled => "cancelled",
        }
    }

    /// Parse the stored string form.
    pub fn parse(s: &str) -> Option<SlipStatus> {
        match s {
            "pending" => Some(SlipStatus::Pending),
            "sent" => Some(SlipStatus::Sent),
            "in_progress" => Some(SlipStatus::InProgress),
            "completed" => Some(SlipStatus::Completed),
            "cancelled" => Some(SlipStatus::Cancelled),
            _ => None,
        }
    }

    /// Terminal states never show up in the overdue report.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SlipStatus::Completed | SlipStatus::Cancelled)
    }
}

/// One audit entry in a slip's status history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusHistoryEntry {
    /// Status the slip moved to
    pub status: SlipStatus,
    /// Caller-supplied notes for this transition
    pub notes: String,
    /// When the transition was recorded
    pub timestamp: String,
}

/// Free-form extension bag stored beside the typed slip columns.
///
/// `status_history` is append-only and insertion-ordered; `extra` carries
/// any other keys the submitting system attached, preserved verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SlipData {
    /// Append-only status audit trail
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub status_history: Vec<StatusHistoryEntry>,
    /// Unmodeled keys, round-tripped untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A lab work order for a single procedure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabSlip {
    /// Unique slip ID, immutable once assigned
    pub id: String,
    /// Patient name
    pub patient_name: String,
    /// Patient date of birth
    pub patient_dob: Option<String>,
    /// CDT procedure code (e.g. "D2740")
    pub procedure_code: String,
    /// Human-readable procedure description
    pub procedure_description: Option<String>,
    /// Tooth number the work is for
    pub tooth_number: Option<String>,
    /// Shade specification for the restoration
    pub shade: Option<String>,
    /// Free-text instructions for the lab
    pub special_instructions: Option<String>,
    /// ISO date the work is expected back; fixed at creation
    pub due_date: String,
    /// Current lifecycle status
    pub status: SlipStatus,
    /// Receiving lab
    pub lab_id: Option<String>,
    /// Patient ID in the upstream practice-management system
    pub pms_patient_id: Option<i64>,
    /// Procedure ID in the upstream practice-management system
    pub pms_procedure_id: Option<i64>,
    /// Appointment ID in the upstream practice-management system
    pub pms_appointment_id: Option<i64>,
    /// Extension bag (status history plus arbitrary extras)
    pub slip_data: SlipData,
    /// When the slip entered `sent`, stamped on every entry
    pub sent_at: Option<String>,
    /// When the slip entered `completed`, stamped on every entry
    pub completed_at: Option<String>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
    /// Joined lab record, populated by store reads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lab: Option<Lab>,
}

impl LabSlip {
    /// Create a new pending slip with required fields.
    ///
    /// The due date is set `LAB_TURNAROUND_DAYS` out from today and never
    /// changes afterwards.
    pub fn new(patient_name: String, procedure_code: String) -> Self {
        let now = chrono::Utc::now();
        let due_date = (now + chrono::Duration::days(LAB_TURNAROUND_DAYS))
            .date_naive()
            .to_string();
        let now = now.to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_name,
            patient_dob: None,
            procedure_code,
            procedure_description: None,
            tooth_number: None,
            shade: None,
            special_instructions: None,
            due_date,
            status: SlipStatus::Pending,
            lab_id: None,
            pms_patient_id: None,
            pms_procedure_id: None,
            pms_appointment_id: None,
            slip_data: SlipData::default(),
            sent_at: None,
            completed_at: None,
            created_at: now.clone(),
            updated_at: now,
            lab: None,
        }
    }

    /// The recorded status history, oldest first.
    pub fn history(&self) -> &[StatusHistoryEntry] {
        &self.slip_data.status_history
    }
}

/// Field changes computed for a single status transition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusUpdate {
    /// New status
    pub status: SlipStatus,
    /// Always refreshed
    pub updated_at: String,
    /// Set when the transition enters `sent`
    pub sent_at: Option<String>,
    /// Set when the transition enters `completed`
    pub completed_at: Option<String>,
    /// Audit entry, present when the caller supplied notes
    pub history_entry: Option<StatusHistoryEntry>,
}

impl StatusUpdate {
    /// Compute the writes for a transition to `status` at the current time.
    ///
    /// `sent_at`/`completed_at` carry the current timestamp whenever their
    /// state is entered, re-entries included. The history entry exists only
    /// when non-empty notes accompany the transition; empty notes count as
    /// none.
    pub fn for_transition(status: SlipStatus, notes: Option<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        let sent_at = if status == SlipStatus::Sent {
            Some(now.clone())
        } else {
            None
        };
        let completed_at = if status == SlipStatus::Completed {
            Some(now.clone())
        } else {
            None
        };
        let history_entry = notes
            .filter(|notes| !notes.is_empty())
            .map(|notes| StatusHistoryEntry {
                status,
                notes,
                timestamp: now.clone(),
            });
        Self {
            status,
            updated_at: now,
            sent_at,
            completed_at,
            history_entry,
        }
    }
}
