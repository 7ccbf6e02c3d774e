//! Session record model.

use serde::{Deserialize, Serialize};

/// Persisted proof of authentication plus its expiry.
///
/// A stored record with `expires_at <= now` is treated as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Identity-provider subject. Stored as `uuid` for compatibility.
    #[serde(rename = "uuid")]
    pub subject: String,
    /// Unix epoch milliseconds.
    pub expires_at: i64,
}

impl SessionRecord {
    pub fn new(subject: impl Into<String>, expires_at: i64) -> Self {
        Self {
            subject: subject.into(),
            expires_at,
        }
    }

    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        self.expires_at <= now_ms
    }

    /// Remaining lifetime in whole seconds, rounded up; zero once expired.
    pub fn remaining_secs_at(&self, now_ms: i64) -> u64 {
        let remaining_ms = self.expires_at.saturating_sub(now_ms);
        if remaining_ms <= 0 {
            return 0;
        }
        u64::try_from(remaining_ms).map_or(0, |ms| ms.div_ceil(1_000))
    }
}

#[cfg(test)]
mod tests {
    use super::SessionRecord;

    #[test]
    fn serializes_with_browser_field_names() {
        let record = SessionRecord::new("user-1", 1_700_000_000_000);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["uuid"], "user-1");
        assert_eq!(json["expiresAt"], 1_700_000_000_000_i64);
        assert_eq!(json.as_object().map(|o| o.len()), Some(2));
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let record = SessionRecord::new("user-1", 5_000);
        assert!(!record.is_expired_at(4_999));
        assert!(record.is_expired_at(5_000));
    }

    #[test]
    fn remaining_secs_rounds_up() {
        let record = SessionRecord::new("user-1", 10_000);
        assert_eq!(record.remaining_secs_at(8_999), 2);
        assert_eq!(record.remaining_secs_at(9_000), 1);
        assert_eq!(record.remaining_secs_at(9_999), 1);
        assert_eq!(record.remaining_secs_at(10_000), 0);
    }
}
