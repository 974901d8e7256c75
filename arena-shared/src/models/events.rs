use chrono::{DateTime, Utc};

/// Published once per successful claim; fanned out to availability streams.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct ReservationClaimedEvent {
    pub item_id: String,
    pub event_id: String,
    pub category: String,
    /// "suite" or "table"
    pub kind: String,
    pub claimed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claimed_event_json_shape() {
        let event = ReservationClaimedEvent {
            item_id: "350".to_string(),
            event_id: "15-feb-2026".to_string(),
            category: "Verde Suite Gold".to_string(),
            kind: "suite".to_string(),
            claimed_at: Utc::now(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["item_id"], "350");
        assert_eq!(json["kind"], "suite");
        assert!(json["claimed_at"].is_string());
    }
}
