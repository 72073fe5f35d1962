//! Dental lab database operations.

use rusqlite::OptionalExtension;

use super::{SlipStore, StoreResult};
use crate::models::Lab;

impl SlipStore {
    /// Insert a new lab.
    pub fn insert_lab(&self, lab: &Lab) -> StoreResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO labs (
                id, name, contact, email, phone, address, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            rusqlite::params![
                lab.id,
                lab.name,
                lab.contact,
                lab.email,
                lab.phone,
                lab.address,
                lab.created_at,
                lab.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Get a lab by ID.
    pub fn get_lab(&self, id: &str) -> StoreResult<Option<Lab>> {
        self.conn
            .query_row(
                r#"
                SELECT id, name, contact, email, phone, address, created_at, updated_at
                FROM labs
                WHERE id = ?
                "#,
                [id],
                |row| {
                    Ok(Lab {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        contact: row.get(2)?,
                        email: row.get(3)?,
                        phone: row.get(4)?,
                        address: row.get(5)?,
                        created_at: row.get(6)?,
                        updated_at: row.get(7)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all labs, alphabetically.
    pub fn list_labs(&self) -> StoreResult<Vec<Lab>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, name, contact, email, phone, address, created_at, updated_at
            FROM labs
            ORDER BY name
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(Lab {
                id: row.get(0)?,
                name: row.get(1)?,
                contact: row.get(2)?,
                email: row.get(3)?,
                phone: row.get(4)?,
                address: row.get(5)?,
                created_at: row.get(6)?,
                updated_at: row.get(7)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
