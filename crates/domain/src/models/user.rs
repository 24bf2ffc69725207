//! User account domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user account. Created by an administrator; never deleted while it owns
/// an active reservation record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)] // Never serialize password hash to API responses
    pub password_hash: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: 1,
            name: "jane".to_string(),
            email: "jane@example.com".to_string(),
            password_hash: Some("$argon2id$secret".to_string()),
            is_admin: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let json = serde_json::to_string(&sample_user()).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("passwordHash"));
    }

    #[test]
    fn fields_serialize_camel_case() {
        let json = serde_json::to_string(&sample_user()).unwrap();
        assert!(json.contains("\"isAdmin\":false"));
        assert!(json.contains("\"createdAt\""));
    }
}
