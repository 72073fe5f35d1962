//! Lab Slip Tracker Core Library
//!
//! Lab work-order tracking for dental practices: crown procedures picked
//! out of the practice-management feed become lab slips that move through
//! a status lifecycle and render as printable prescriptions.
//!
//! # Architecture
//!
//! ```text
//! PMS procedure feed → Crown Detection → create_slip
//!                                             │
//!                              [SQLite: lab_slips + labs]
//!                                             │
//!                                    Status Transitions
//!                          pending → sent → in_progress → completed
//!                              (cancelled from any state)
//!                                             │
//!                           append-only status_history (JSON1)
//!                                             │
//!                     ┌───────────────────────┼───────────────────────┐
//!                     │                       │                       │
//!                     ▼                       ▼                       ▼
//!                  Queries               PDF Renderer           Document Jobs
//!             (pending, overdue,      (printable slip)       (artifact URLs,
//!              by status)                                     async render)
//! ```
//!
//! # Core Principle
//!
//! **Status history is append-only.** Transitions restamp the lifecycle
//! timestamps, but notes land as appended history entries that are never
//! rewritten. The slip carries its own audit trail.
//!
//! # Modules
//!
//! - [`config`]: Practice letterhead, default lab, artifact URLs
//! - [`crown`]: CDT crown code detection
//! - [`models`]: Domain types (LabSlip, Lab, ProcedureData, etc.)
//! - [`render`]: Printable PDF prescriptions
//! - [`service`]: Lifecycle manager and transition policies
//! - [`store`]: SQLite persistence with server-side history appends

pub mod config;
pub mod crown;
pub mod models;
pub mod render;
pub mod service;
pub mod store;

// Re-export commonly used types
pub use config::{LabSlipConfig, PracticeInfo};
pub use crown::{detect_crown_procedures, is_crown_code, CROWN_CODES};
pub use models::{
    Lab, LabSlip, ProcedureData, SlipData, SlipStatus, StatusHistoryEntry, StatusUpdate,
    LAB_TURNAROUND_DAYS,
};
pub use render::SlipRenderer;
pub use service::{
    forward_only_policy, Backend, DocumentJob, LabSlipManager, SlipError, TransitionOutcome,
    TransitionPolicy, DEFAULT_LIST_LIMIT,
};
pub use store::SlipStore;
