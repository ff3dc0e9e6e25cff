use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clinicstock_core::ItemId;

use crate::reason::ReasonCode;

/// One row of the append-only audit trail (`inventory_transactions`).
///
/// Only the backend procedures create these; the client reads them for
/// display and never writes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub created_at: DateTime<Utc>,
    pub qty_change: i64,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub item_id: Option<ItemId>,
}

impl TransactionRecord {
    /// `+3` / `-3`; zero renders as `+0`.
    pub fn display_change(&self) -> String {
        if self.qty_change >= 0 {
            format!("+{}", self.qty_change)
        } else {
            self.qty_change.to_string()
        }
    }

    /// Label for known codes, the raw text for legacy free-text reasons.
    pub fn reason_label(&self) -> &str {
        match self.reason.as_deref() {
            None => "—",
            Some(raw) => raw
                .parse::<ReasonCode>()
                .map(|code| code.label())
                .unwrap_or(raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(change: i64, reason: Option<&str>) -> TransactionRecord {
        TransactionRecord {
            created_at: Utc::now(),
            qty_change: change,
            reason: reason.map(str::to_string),
            item_id: None,
        }
    }

    #[test]
    fn signed_display() {
        assert_eq!(record(3, None).display_change(), "+3");
        assert_eq!(record(-3, None).display_change(), "-3");
    }

    #[test]
    fn reason_labels() {
        assert_eq!(record(1, Some("receive")).reason_label(), "Receive/Restock");
        assert_eq!(
            record(1, Some("Cycle count adjustment")).reason_label(),
            "Cycle count adjustment"
        );
        assert_eq!(record(1, None).reason_label(), "—");
    }

    #[test]
    fn deserializes_projection_without_item() {
        let row = json!({
            "created_at": "2024-05-01T10:15:00+00:00",
            "qty_change": -2,
            "reason": "waste"
        });
        let rec: TransactionRecord = serde_json::from_value(row).unwrap();
        assert_eq!(rec.qty_change, -2);
        assert_eq!(rec.item_id, None);
    }
}
