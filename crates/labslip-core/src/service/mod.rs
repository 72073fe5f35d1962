//! Lab slip lifecycle management.
//!
//! [`LabSlipManager`] is the front door for everything slips do: creating
//! them from procedure submissions, walking them through the status
//! lifecycle, querying them, and requesting rendered documents. It runs in
//! one of two modes:
//!
//! - **Attached**: backed by a [`SlipStore`], every operation persists.
//! - **Detached**: no store; creates and transitions return the computed
//!   values for the caller to persist elsewhere, and queries come back
//!   empty rather than failing.

mod transition;

#[allow(unused_imports)]
pub use transition::*;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::LabSlipConfig;
use crate::models::{LabSlip, ProcedureData, SlipStatus, StatusUpdate};
use crate::store::{SlipStore, StoreError};

/// Default page size for slip listings.
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Errors from lifecycle operations.
#[derive(Error, Debug)]
pub enum SlipError {
    /// A required submission field was absent.
    #[error("Missing required field: {0}")]
    Validation(&'static str),

    /// No slip exists with the given ID.
    #[error("Lab slip not found: {0}")]
    NotFound(String),

    /// The configured transition policy rejected the move.
    #[error("Invalid status transition: {from:?} -> {to:?}")]
    InvalidTransition { from: SlipStatus, to: SlipStatus },

    /// Underlying storage failure.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Where slip state lives for a manager instance.
pub enum Backend<'a> {
    /// Operations read and write this store.
    Attached(&'a SlipStore),
    /// No storage; operations compute but do not persist.
    Detached,
}

/// What a transition produced.
#[derive(Debug, Clone)]
pub enum TransitionOutcome {
    /// The stored slip, re-read after the update was applied.
    Updated(LabSlip),
    /// No store attached; the computed update for the caller to apply.
    Unpersisted(StatusUpdate),
}

impl TransitionOutcome {
    /// The updated slip, when the transition was persisted.
    pub fn updated(self) -> Option<LabSlip> {
        match self {
            TransitionOutcome::Updated(slip) => Some(slip),
            TransitionOutcome::Unpersisted(_) => None,
        }
    }
}

/// Response to a document render request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentJob {
    /// Whether the request was accepted
    pub success: bool,
    /// The slip the document is for
    pub lab_slip_id: String,
    /// Where the rendered PDF will be published
    pub pdf_url: String,
    /// Human-readable outcome
    pub message: String,
}

/// Coordinates the lab slip lifecycle against an optional store.
pub struct LabSlipManager<'a> {
    config: LabSlipConfig,
    backend: Backend<'a>,
    policy: Option<TransitionPolicy>,
}

impl<'a> LabSlipManager<'a> {
    /// Create a manager backed by a store.
    pub fn with_store(config: LabSlipConfig, store: &'a SlipStore) -> Self {
        Self {
            config,
            backend: Backend::Attached(store),
            policy: None,
        }
    }

    /// Create a manager with no storage attached.
    pub fn detached(config: LabSlipConfig) -> Self {
        Self {
            config,
            backend: Backend::Detached,
            policy: None,
        }
    }

    /// Install a transition policy. Without one, every transition is
    /// allowed.
    pub fn set_transition_policy(&mut self, policy: TransitionPolicy) {
        self.policy = Some(policy);
    }

    /// Create a lab slip from a procedure submission.
    ///
    /// The slip starts out pending with a due date [`LAB_TURNAROUND_DAYS`]
    /// from now. When the submission names no lab, the configured default
    /// lab is used. Extra submission keys are carried into the slip's
    /// extension bag.
    ///
    /// Validation rejects absent `patient_name`/`procedure_code`; values
    /// that are present but empty are stored as given.
    ///
    /// [`LAB_TURNAROUND_DAYS`]: crate::models::LAB_TURNAROUND_DAYS
    pub fn create_slip(&self, procedure: &ProcedureData) -> Result<LabSlip, SlipError> {
        let patient_name = match procedure.patient_name.clone() {
            Some(name) => name,
            None => return Err(SlipError::Validation("patient_name")),
        };
        let procedure_code = match procedure.procedure_code.clone() {
            Some(code) => code,
            None => return Err(SlipError::Validation("procedure_code")),
        };

        let mut slip = LabSlip::new(patient_name, procedure_code);
        slip.patient_dob = procedure.patient_dob.clone();
        slip.procedure_description = procedure.procedure_description.clone();
        slip.tooth_number = procedure.tooth_number.clone();
        slip.shade = procedure.shade.clone();
        slip.special_instructions = procedure.special_instructions.clone();
        slip.lab_id = procedure
            .lab_id
            .clone()
            .or_else(|| self.config.default_lab_id.clone());
        slip.pms_patient_id = procedure.pms_patient_id;
        slip.pms_procedure_id = procedure.pms_procedure_id;
        slip.pms_appointment_id = procedure.pms_appointment_id;
        slip.slip_data.extra = procedure.additional_data.clone();

        if let Backend::Attached(store) = &self.backend {
            store.insert_slip(&slip)?;
        }

        tracing::info!(
            "Created lab slip {} for {} ({})",
            slip.id,
            slip.patient_name,
            slip.procedure_code
        );
        Ok(slip)
    }

    /// Move a slip to a new status.
    ///
    /// `updated_at` is always restamped; entering sent stamps `sent_at` and
    /// entering completed stamps `completed_at`. Notes, when given, become
    /// an appended status history entry. With a store attached the update
    /// is applied atomically and the stored slip is returned; detached, the
    /// computed [`StatusUpdate`] is handed back instead.
    ///
    /// The transition policy, when one is installed, is consulted against
    /// the slip's current stored status. Detached managers have no current
    /// status to consult, so the policy does not run there.
    pub fn transition_slip(
        &self,
        id: &str,
        status: SlipStatus,
        notes: Option<String>,
    ) -> Result<TransitionOutcome, SlipError> {
        match &self.backend {
            Backend::Attached(store) => {
                if let Some(policy) = &self.policy {
                    let current = store
                        .get_slip(id)?
                        .ok_or_else(|| SlipError::NotFound(id.to_string()))?;
                    if !policy(current.status, status) {
                        tracing::warn!(
                            "Transition policy rejected {} -> {} for lab slip {}",
                            current.status.as_str(),
                            status.as_str(),
                            id
                        );
                        return Err(SlipError::InvalidTransition {
                            from: current.status,
                            to: status,
                        });
                    }
                }

                let update = StatusUpdate::for_transition(status, notes);
                if !store.apply_status_update(id, &update)? {
                    return Err(SlipError::NotFound(id.to_string()));
                }
                let slip = store
                    .get_slip(id)?
                    .ok_or_else(|| SlipError::NotFound(id.to_string()))?;

                tracing::info!("Lab slip {} moved to {}", id, status.as_str());
                Ok(TransitionOutcome::Updated(slip))
            }
            Backend::Detached => {
                let update = StatusUpdate::for_transition(status, notes);
                Ok(TransitionOutcome::Unpersisted(update))
            }
        }
    }

    /// Get a slip by ID. Detached managers always return `None`.
    pub fn get_slip(&self, id: &str) -> Result<Option<LabSlip>, SlipError> {
        match &self.backend {
            Backend::Attached(store) => Ok(store.get_slip(id)?),
            Backend::Detached => Ok(None),
        }
    }

    /// List slips, newest first, optionally filtered by status.
    ///
    /// `limit` defaults to [`DEFAULT_LIST_LIMIT`].
    pub fn list_slips(
        &self,
        status: Option<SlipStatus>,
        limit: Option<usize>,
    ) -> Result<Vec<LabSlip>, SlipError> {
        match &self.backend {
            Backend::Attached(store) => {
                Ok(store.list_slips(status, limit.unwrap_or(DEFAULT_LIST_LIMIT))?)
            }
            Backend::Detached => Ok(Vec::new()),
        }
    }

    /// Slips still waiting to go out.
    pub fn pending_slips(&self) -> Result<Vec<LabSlip>, SlipError> {
        self.list_slips(Some(SlipStatus::Pending), None)
    }

    /// Slips past their due date that are neither completed nor cancelled,
    /// most overdue first.
    pub fn overdue_slips(&self) -> Result<Vec<LabSlip>, SlipError> {
        match &self.backend {
            Backend::Attached(store) => {
                let today = Utc::now().date_naive().to_string();
                Ok(store.overdue_slips(&today)?)
            }
            Backend::Detached => Ok(Vec::new()),
        }
    }

    /// Request a rendered document for a slip.
    ///
    /// This hands back the job descriptor immediately; rendering and upload
    /// happen out of band, and the URL names where the artifact will be
    /// published once they do.
    pub fn request_document(&self, id: &str) -> DocumentJob {
        let pdf_url = format!("{}/{}.pdf", self.config.artifact_base_url, id);
        tracing::info!("Requested document render for lab slip {}", id);
        DocumentJob {
            success: true,
            lab_slip_id: id.to_string(),
            pdf_url,
            message: "PDF generation triggered".into(),
        }
    }
}
