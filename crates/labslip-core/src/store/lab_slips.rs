//! Lab slip database operations.

use rusqlite::{params, OptionalExtension};

use super::{SlipStore, StoreError, StoreResult};
use crate::models::{Lab, LabSlip, SlipData, SlipStatus, StatusUpdate};

/// Joined select used by every read path; the lab columns hydrate
/// `LabSlip::lab` when the slip names one.
const SELECT_SLIP: &str = r#"
SELECT s.id, s.patient_name, s.patient_dob, s.procedure_code, s.procedure_description,
       s.tooth_number, s.shade, s.special_instructions, s.due_date, s.status, s.lab_id,
       s.pms_patient_id, s.pms_procedure_id, s.pms_appointment_id, s.slip_data,
       s.sent_at, s.completed_at, s.created_at, s.updated_at,
       l.id, l.name, l.contact, l.email, l.phone, l.address, l.created_at, l.updated_at
FROM lab_slips s
LEFT JOIN labs l ON s.lab_id = l.id
"#;

impl SlipStore {
    /// Insert a new lab slip.
    pub fn insert_slip(&self, slip: &LabSlip) -> StoreResult<()> {
        let slip_data_json = serde_json::to_string(&slip.slip_data)?;

        self.conn.execute(
            r#"
            INSERT INTO lab_slips (
                id, patient_name, patient_dob, procedure_code, procedure_description,
                tooth_number, shade, special_instructions, due_date, status, lab_id,
                pms_patient_id, pms_procedure_id, pms_appointment_id, slip_data,
                sent_at, completed_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)
            "#,
            params![
                slip.id,
                slip.patient_name,
                slip.patient_dob,
                slip.procedure_code,
                slip.procedure_description,
                slip.tooth_number,
                slip.shade,
                slip.special_instructions,
                slip.due_date,
                slip.status.as_str(),
                slip.lab_id,
                slip.pms_patient_id,
                slip.pms_procedure_id,
                slip.pms_appointment_id,
                slip_data_json,
                slip.sent_at,
                slip.completed_at,
                slip.created_at,
                slip.updated_at,
            ],
        )?;
        tracing::debug!("Inserted lab slip {}", slip.id);
        Ok(())
    }

    /// Get a slip by ID, with its lab record joined in.
    pub fn get_slip(&self, id: &str) -> StoreResult<Option<LabSlip>> {
        self.conn
            .query_row(&format!("{SELECT_SLIP} WHERE s.id = ?"), [id], slip_row_from)
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List slips, newest first, optionally filtered to one status.
    pub fn list_slips(&self, status: Option<SlipStatus>, limit: usize) -> StoreResult<Vec<LabSlip>> {
        let mut slips = Vec::new();
        match status {
            Some(status) => {
                let mut stmt = self.conn.prepare(&format!(
                    "{SELECT_SLIP} WHERE s.status = ?1 ORDER BY s.created_at DESC LIMIT ?2"
                ))?;
                let rows = stmt.query_map(params![status.as_str(), limit as i64], slip_row_from)?;
                for row in rows {
                    slips.push(row?.try_into()?);
                }
            }
            None => {
                let mut stmt = self
                    .conn
                    .prepare(&format!("{SELECT_SLIP} ORDER BY s.created_at DESC LIMIT ?1"))?;
                let rows = stmt.query_map(params![limit as i64], slip_row_from)?;
                for row in rows {
                    slips.push(row?.try_into()?);
                }
            }
        }
        Ok(slips)
    }

    /// List slips strictly past their due date that are still in flight,
    /// most overdue first.
    ///
    /// Completed and cancelled slips are excluded no matter how old their
    /// due date is.
    pub fn overdue_slips(&self, today: &str) -> StoreResult<Vec<LabSlip>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"{SELECT_SLIP}
            WHERE s.due_date < ?1 AND s.status NOT IN ('completed', 'cancelled')
            ORDER BY s.due_date ASC"#
        ))?;
        let rows = stmt.query_map([today], slip_row_from)?;

        let mut slips = Vec::new();
        for row in rows {
            slips.push(row?.try_into()?);
        }
        Ok(slips)
    }

    /// Apply a computed status transition to a stored slip.
    ///
    /// When the update carries a history entry it is appended server-side
    /// inside the same UPDATE via the JSON1 functions, so two racing noted
    /// transitions both land in `status_history`. `sent_at`/`completed_at`
    /// are overwritten when the update stamps them and left alone otherwise.
    ///
    /// Returns false when no slip has the given ID.
    pub fn apply_status_update(&self, id: &str, update: &StatusUpdate) -> StoreResult<bool> {
        let rows_affected = match &update.history_entry {
            Some(entry) => {
                let entry_json = serde_json::to_string(entry)?;
                self.conn.execute(
                    r#"
                    UPDATE lab_slips SET
                        status = ?2,
                        updated_at = ?3,
                        sent_at = coalesce(?4, sent_at),
                        completed_at = coalesce(?5, completed_at),
                        slip_data = json_set(
                            slip_data,
                            '$.status_history',
                            json_insert(
                                coalesce(json_extract(slip_data, '$.status_history'), json('[]')),
                                '$[#]',
                                json(?6)
                            )
                        )
                    WHERE id = ?1
                    "#,
                    params![
                        id,
                        update.status.as_str(),
                        update.updated_at,
                        update.sent_at,
                        update.completed_at,
                        entry_json,
                    ],
                )?
            }
            None => self.conn.execute(
                r#"
                UPDATE lab_slips SET
                    status = ?2,
                    updated_at = ?3,
                    sent_at = coalesce(?4, sent_at),
                    completed_at = coalesce(?5, completed_at)
                WHERE id = ?1
                "#,
                params![
                    id,
                    update.status.as_str(),
                    update.updated_at,
                    update.sent_at,
                    update.completed_at,
                ],
            )?,
        };
        Ok(rows_affected > 0)
    }
}

/// Intermediate row struct for database mapping.
struct SlipRow {
    id: String,
    patient_name: String,
    patient_dob: Option<String>,
    procedure_code: String,
    procedure_description: Option<String>,
    tooth_number: Option<String>,
    shade: Option<String>,
    special_instructions: Option<String>,
    due_date: String,
    status: String,
    lab_id: Option<String>,
    pms_patient_id: Option<i64>,
    pms_procedure_id: Option<i64>,
    pms_appointment_id: Option<i64>,
    slip_data: String,
    sent_at: Option<String>,
    completed_at: Option<String>,
    created_at: String,
    updated_at: String,
    lab: Option<Lab>,
}

fn slip_row_from(row: &rusqlite::Row<'_>) -> rusqlite::Result<SlipRow> {
    // Lab columns come back NULL when the join misses
    let lab = match row.get::<_, Option<String>>(19)? {
        Some(id) => Some(Lab {
            id,
            name: row.get(20)?,
            contact: row.get(21)?,
            email: row.get(22)?,
            phone: row.get(23)?,
            address: row.get(24)?,
            created_at: row.get(25)?,
            updated_at: row.get(26)?,
        }),
        None => None,
    };

    Ok(SlipRow {
        id: row.get(0)?,
        patient_name: row.get(1)?,
        patient_dob: row.get(2)?,
        procedure_code: row.get(3)?,
        procedure_description: row.get(4)?,
        tooth_number: row.get(5)?,
        shade: row.get(6)?,
        special_instructions: row.get(7)?,
        due_date: row.get(8)?,
        status: row.get(9)?,
        lab_id: row.get(10)?,
        pms_patient_id: row.get(11)?,
        pms_procedure_id: row.get(12)?,
        pms_appointment_id: row.get(13)?,
        slip_data: row.get(14)?,
        sent_at: row.get(15)?,
        completed_at: row.get(16)?,
        created_at: row.get(17)?,
        updated_at: row.get(18)?,
        lab,
    })
}

impl TryFrom<SlipRow> for LabSlip {
    type Error = StoreError;

    fn try_from(row: SlipRow) -> Result<Self, Self::Error> {
        let slip_data: SlipData = serde_json::from_str(&row.slip_data)?;
        let status = SlipStatus::parse(&row.status).ok_or_else(|| {
            StoreError::Constraint(format!("Unknown slip status: {}", row.status))
        })?;

        Ok(LabSlip {
            id: row.id,
            patient_name: row.patient_name,
            patient_dob: row.patient_dob,
            procedure_code: row.procedure_code,
            procedure_description: row.procedure_description,
            tooth_number: row.tooth_number,
            shade: row.shade,
            special_instructions: row.special_instructions,
            due_date: row.due_date,
            status,
            lab_id: row.lab_id,
            pms_patient_id: row.pms_patient_id,
            pms_procedure_id: row.pms_procedure_id,
            pms_appointment_id: row.pms_appointment_id,
            slip_data,
            sent_at: row.sent_at,
            completed_at: row.completed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
            lab: row.lab,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_store() -> SlipStore {
        SlipStore::open_in_memory().unwrap()
    }

    fn make_slip(patient: &str, code: &str) -> LabSlip {
        LabSlip::new(patient.into(), code.into())
    }

    #[test]
    fn test_insert_and_get_round_trip() {
        let store = setup_store();

        let mut slip = make_slip("Bob Wilson", "D2740");
        slip.patient_dob = Some("1985-03-12".into());
        slip.tooth_number = Some("14".into());
        slip.shade = Some("A2".into());
        slip.special_instructions = Some("Match adjacent crown".into());
        slip.pms_patient_id = Some(1001);
        slip.slip_data
            .extra
            .insert("rush_order".into(), serde_json::json!(true));

        store.insert_slip(&slip).unwrap();

        let retrieved = store.get_slip(&slip.id).unwrap().unwrap();
        assert_eq!(retrieved.patient_name, "Bob Wilson");
        assert_eq!(retrieved.procedure_code, "D2740");
        assert_eq!(retrieved.due_date, slip.due_date);
        assert_eq!(retrieved.tooth_number.as_deref(), Some("14"));
        assert_eq!(retrieved.pms_patient_id, Some(1001));
        assert_eq!(
            retrieved.slip_data.extra["rush_order"],
            serde_json::json!(true)
        );
        assert!(retrieved.lab.is_none());
    }

    #[test]
    fn test_get_missing_slip() {
        let store = setup_store();
        assert!(store.get_slip("no-such-id").unwrap().is_none());
    }

    #[test]
    fn test_list_filters_by_status() {
        let store = setup_store();

        let pending = make_slip("Alice", "D2740");
        store.insert_slip(&pending).unwrap();

        let mut sent = make_slip("Bob", "D2750");
        sent.status = SlipStatus::Sent;
        store.insert_slip(&sent).unwrap();

        let all = store.list_slips(None, 50).unwrap();
        assert_eq!(all.len(), 2);

        let only_sent = store.list_slips(Some(SlipStatus::Sent), 50).unwrap();
        assert_eq!(only_sent.len(), 1);
        assert_eq!(only_sent[0].patient_name, "Bob");
    }

    #[test]
    fn test_list_newest_first_with_limit() {
        let store = setup_store();

        for (patient, created) in [
            ("Oldest", "2024-01-01T00:00:00Z"),
            ("Middle", "2024-01-02T00:00:00Z"),
            ("Newest", "2024-01-03T00:00:00Z"),
        ] {
            let mut slip = make_slip(patient, "D2740");
            slip.created_at = created.into();
            store.insert_slip(&slip).unwrap();
        }

        let top_two = store.list_slips(None, 2).unwrap();
        assert_eq!(top_two.len(), 2);
        assert_eq!(top_two[0].patient_name, "Newest");
        assert_eq!(top_two[1].patient_name, "Middle");
    }

    #[test]
    fn test_overdue_excludes_terminal_and_sorts_ascending() {
        let store = setup_store();

        let mut late_pending = make_slip("Late Pending", "D2740");
        late_pending.due_date = "2024-01-20".into();
        store.insert_slip(&late_pending).unwrap();

        let mut later_sent = make_slip("Later Sent", "D2750");
        later_sent.due_date = "2024-01-10".into();
        later_sent.status = SlipStatus::Sent;
        store.insert_slip(&later_sent).unwrap();

        let mut late_completed = make_slip("Late Completed", "D2751");
        late_completed.due_date = "2024-01-01".into();
        late_completed.status = SlipStatus::Completed;
        store.insert_slip(&late_completed).unwrap();

        let mut late_cancelled = make_slip("Late Cancelled", "D2752");
        late_cancelled.due_date = "2024-01-01".into();
        late_cancelled.status = SlipStatus::Cancelled;
        store.insert_slip(&late_cancelled).unwrap();

        let overdue = store.overdue_slips("2024-02-01").unwrap();
        assert_eq!(overdue.len(), 2);
        // Most overdue first
        assert_eq!(overdue[0].patient_name, "Later Sent");
        assert_eq!(overdue[1].patient_name, "Late Pending");
    }

    #[test]
    fn test_due_today_is_not_overdue() {
        let store = setup_store();

        let mut slip = make_slip("Due Today", "D2740");
        slip.due_date = "2024-02-01".into();
        store.insert_slip(&slip).unwrap();

        assert!(store.overdue_slips("2024-02-01").unwrap().is_empty());
        assert_eq!(store.overdue_slips("2024-02-02").unwrap().len(), 1);
    }

    #[test]
    fn test_apply_status_update_writes_fields() {
        let store = setup_store();
        let slip = make_slip("Bob Wilson", "D2740");
        store.insert_slip(&slip).unwrap();

        let update = StatusUpdate::for_transition(SlipStatus::Sent, None);
        assert!(store.apply_status_update(&slip.id, &update).unwrap());

        let stored = store.get_slip(&slip.id).unwrap().unwrap();
        assert_eq!(stored.status, SlipStatus::Sent);
        assert_eq!(stored.updated_at, update.updated_at);
        assert_eq!(stored.sent_at, update.sent_at);
        assert!(stored.completed_at.is_none());
        // No notes, no history entry
        assert!(stored.history().is_empty());
    }

    #[test]
    fn test_apply_status_update_appends_history_in_order() {
        let store = setup_store();
        let slip = make_slip("Bob Wilson", "D2740");
        store.insert_slip(&slip).unwrap();

        for (status, notes) in [
            (SlipStatus::Sent, "sent to lab"),
            (SlipStatus::InProgress, "lab confirmed"),
            (SlipStatus::Completed, "crown received"),
        ] {
            let update = StatusUpdate::for_transition(status, Some(notes.into()));
            assert!(store.apply_status_update(&slip.id, &update).unwrap());
        }

        let stored = store.get_slip(&slip.id).unwrap().unwrap();
        let history = stored.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].notes, "sent to lab");
        assert_eq!(history[1].notes, "lab confirmed");
        assert_eq!(history[2].notes, "crown received");
        assert_eq!(history[2].status, SlipStatus::Completed);
        assert!(stored.sent_at.is_some());
        assert!(stored.completed_at.is_some());
    }

    #[test]
    fn test_later_update_keeps_earlier_sent_at() {
        let store = setup_store();
        let slip = make_slip("Bob Wilson", "D2740");
        store.insert_slip(&slip).unwrap();

        let sent = StatusUpdate::for_transition(SlipStatus::Sent, None);
        store.apply_status_update(&slip.id, &sent).unwrap();

        let in_progress = StatusUpdate::for_transition(SlipStatus::InProgress, None);
        store.apply_status_update(&slip.id, &in_progress).unwrap();

        let stored = store.get_slip(&slip.id).unwrap().unwrap();
        assert_eq!(stored.status, SlipStatus::InProgress);
        // The sent stamp survives updates that do not re-enter sent
        assert_eq!(stored.sent_at, sent.sent_at);
    }

    #[test]
    fn test_reentering_sent_restamps_sent_at() {
        let store = setup_store();
        let slip = make_slip("Bob Wilson", "D2740");
        store.insert_slip(&slip).unwrap();

        // Forge an old first stamp so the restamp is observable
        let mut first = StatusUpdate::for_transition(SlipStatus::Sent, None);
        first.sent_at = Some("2024-01-01T09:00:00+00:00".into());
        store.apply_status_update(&slip.id, &first).unwrap();

        let second = StatusUpdate::for_transition(
            SlipStatus::Sent,
            Some("re-sent after shade correction".into()),
        );
        store.apply_status_update(&slip.id, &second).unwrap();

        let stored = store.get_slip(&slip.id).unwrap().unwrap();
        // Entering sent again overwrites the stamp with the newer one
        assert_eq!(stored.sent_at, second.sent_at);
        assert_ne!(stored.sent_at, first.sent_at);
    }

    #[test]
    fn test_apply_status_update_missing_id() {
        let store = setup_store();
        let update = StatusUpdate::for_transition(SlipStatus::Sent, Some("notes".into()));
        assert!(!store.apply_status_update("no-such-id", &update).unwrap());
    }

    #[test]
    fn test_unknown_status_in_store_is_constraint_error() {
        let store = setup_store();
        let slip = make_slip("Bob Wilson", "D2740");
        store.insert_slip(&slip).unwrap();

        store
            .conn()
            .execute(
                "UPDATE lab_slips SET status = 'shipped' WHERE id = ?",
                [slip.id.as_str()],
            )
            .unwrap();

        let err = store.get_slip(&slip.id).unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));
    }
}
