//! Dental laboratory records.

use serde::{Deserialize, Serialize};

/// A dental laboratory that receives slips.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Lab {
    /// Unique lab ID
    pub id: String,
    /// Lab name
    pub name: String,
    /// Contact person
    pub contact: Option<String>,
    /// Order intake email
    pub email: Option<String>,
    /// Phone number
    pub phone: Option<String>,
    /// Mailing address
    pub address: Option<String>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl Lab {
    /// Create a new lab with the required name.
    pub fn new(name: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            contact: None,
            email: None,
            phone: None,
            address: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_lab() {
        let lab = Lab::new("Crown Masters".into());
        assert_eq!(lab.name, "Crown Masters");
        assert!(lab.contact.is_none());
        assert_eq!(lab.id.len(), 36); // UUID format
    }
}
