//! Procedure submissions from the practice-management feed.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::crown::is_crown_code;

/// A procedure record as submitted by the upstream scheduling system.
///
/// Everything is optional at this stage; required fields are enforced when
/// a slip is actually created, so submissions with missing data are still
/// representable and filterable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProcedureData {
    /// Patient name
    pub patient_name: Option<String>,
    /// Patient date of birth
    pub patient_dob: Option<String>,
    /// CDT procedure code
    pub procedure_code: Option<String>,
    /// Human-readable procedure description
    pub procedure_description: Option<String>,
    /// Tooth number
    pub tooth_number: Option<String>,
    /// Shade specification
    pub shade: Option<String>,
    /// Free-text instructions for the lab
    pub special_instructions: Option<String>,
    /// Receiving lab, when the submission names one
    pub lab_id: Option<String>,
    /// Patient ID in the upstream system
    pub pms_patient_id: Option<i64>,
    /// Procedure ID in the upstream system
    pub pms_procedure_id: Option<i64>,
    /// Appointment ID in the upstream system
    pub pms_appointment_id: Option<i64>,
    /// Arbitrary extra keys, seeded into the slip's extension bag
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub additional_data: Map<String, Value>,
}

impl ProcedureData {
    /// Create a submission with the two fields slip creation requires.
    pub fn new(patient_name: String, procedure_code: String) -> Self {
        Self {
            patient_name: Some(patient_name),
            procedure_code: Some(procedure_code),
            ..Self::default()
        }
    }

    /// Whether this procedure's code is in the crown vocabulary.
    ///
    /// A missing code never matches.
    pub fn is_crown(&self) -> bool {
        is_crown_code(self.procedure_code.as_deref().unwrap_or(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sets_required_fields() {
        let procedure = ProcedureData::new("Bob Wilson".into(), "D2740".into());
        assert_eq!(procedure.patient_name.as_deref(), Some("Bob Wilson"));
        assert_eq!(procedure.procedure_code.as_deref(), Some("D2740"));
        assert!(procedure.tooth_number.is_none());
    }

    #[test]
    fn test_is_crown() {
        assert!(ProcedureData::new("A".into(), "D2740".into()).is_crown());
        assert!(ProcedureData::new("A".into(), "d2750".into()).is_crown());
        assert!(!ProcedureData::new("A".into(), "D1110".into()).is_crown());
    }

    #[test]
    fn test_missing_code_is_not_a_crown() {
        let procedure = ProcedureData {
            patient_name: Some("Alice".into()),
            ..Default::default()
        };
        assert!(!procedure.is_crown());
    }

    #[test]
    fn test_additional_data_round_trip() {
        let mut procedure = ProcedureData::new("Bob Wilson".into(), "D2740".into());
        procedure
            .additional_data
            .insert("operatory".into(), serde_json::json!("OP-3"));

        let json = serde_json::to_string(&procedure).unwrap();
        let back: ProcedureData = serde_json::from_str(&json).unwrap();
        assert_eq!(back, procedure);
        assert_eq!(back.additional_data["operatory"], serde_json::json!("OP-3"));
    }
}
