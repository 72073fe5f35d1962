//! SQLite schema definition.

/// Complete database schema for the lab slip tracker.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Labs
-- ============================================================================

CREATE TABLE IF NOT EXISTS labs (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    contact TEXT,
    email TEXT,
    phone TEXT,
    address TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_labs_name ON labs(name);

-- ============================================================================
-- Lab Slips
-- ============================================================================

CREATE TABLE IF NOT EXISTS lab_slips (
    id TEXT PRIMARY KEY,
    patient_name TEXT NOT NULL,
    patient_dob TEXT,
    procedure_code TEXT NOT NULL,
    procedure_description TEXT,
    tooth_number TEXT,
    shade TEXT,
    special_instructions TEXT,
    due_date TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',      -- pending, sent, in_progress, completed, cancelled
    lab_id TEXT REFERENCES labs(id),
    pms_patient_id INTEGER,
    pms_procedure_id INTEGER,
    pms_appointment_id INTEGER,
    slip_data TEXT NOT NULL DEFAULT '{}',        -- JSON object; status_history array lives here
    sent_at TEXT,
    completed_at TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_slips_status ON lab_slips(status);
CREATE INDEX IF NOT EXISTS idx_slips_due_date ON lab_slips(due_date);
CREATE INDEX IF NOT EXISTS idx_slips_created ON lab_slips(created_at);
CREATE INDEX IF NOT EXISTS idx_slips_lab ON lab_slips(lab_id);
"#;
