//! Reservable resource domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A reservable unit. Each resource is a single exclusive unit: at most one
/// user holds it at a time, everyone else queues.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: i64,
    pub name: String,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_optional_comment_as_null() {
        let resource = Resource {
            id: 3,
            name: "Meeting Room A".to_string(),
            comment: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&resource).unwrap();
        assert!(json.contains("\"comment\":null"));
    }
}
