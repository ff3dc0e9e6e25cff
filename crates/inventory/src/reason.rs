//! Standardized reason codes attached to every quantity mutation.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use clinicstock_core::{DomainError, DomainResult, ValueObject};

/// Why a quantity changed. Stored verbatim in the audit trail.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    Dispense,
    Administer,
    Waste,
    Expired,
    Damaged,
    CountAdjustment,
    Receive,
}

impl ReasonCode {
    /// All codes in the order they are offered to the user.
    pub const ALL: [ReasonCode; 7] = [
        ReasonCode::Dispense,
        ReasonCode::Administer,
        ReasonCode::Waste,
        ReasonCode::Expired,
        ReasonCode::Damaged,
        ReasonCode::CountAdjustment,
        ReasonCode::Receive,
    ];

    /// Wire value sent as `p_reason`.
    pub fn code(&self) -> &'static str {
        match self {
            ReasonCode::Dispense => "dispense",
            ReasonCode::Administer => "administer",
            ReasonCode::Waste => "waste",
            ReasonCode::Expired => "expired",
            ReasonCode::Damaged => "damaged",
            ReasonCode::CountAdjustment => "count_adjustment",
            ReasonCode::Receive => "receive",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReasonCode::Dispense => "Dispense",
            ReasonCode::Administer => "Administer",
            ReasonCode::Waste => "Waste",
            ReasonCode::Expired => "Expired",
            ReasonCode::Damaged => "Damaged",
            ReasonCode::CountAdjustment => "Count Adjustment",
            ReasonCode::Receive => "Receive/Restock",
        }
    }

    /// A mutation must never be dispatched without a reason.
    pub fn require(reason: Option<ReasonCode>) -> DomainResult<ReasonCode> {
        reason.ok_or_else(|| DomainError::validation("select a reason first"))
    }
}

impl ValueObject for ReasonCode {}

impl core::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ReasonCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        if wanted.is_empty() {
            return Err(DomainError::validation("select a reason first"));
        }
        ReasonCode::ALL
            .into_iter()
            .find(|r| r.code().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DomainError::validation(format!("unknown reason code: {wanted}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_parse_back() {
        for reason in ReasonCode::ALL {
            assert_eq!(reason.code().parse::<ReasonCode>().unwrap(), reason);
        }
    }

    #[test]
    fn serde_uses_wire_code() {
        let json = serde_json::to_string(&ReasonCode::CountAdjustment).unwrap();
        assert_eq!(json, "\"count_adjustment\"");
    }

    #[test]
    fn empty_and_unknown_are_validation_errors() {
        assert!("".parse::<ReasonCode>().unwrap_err().is_validation());
        assert!("   ".parse::<ReasonCode>().is_err());
        assert!("Cycle count adjustment".parse::<ReasonCode>().is_err());
    }

    #[test]
    fn require_rejects_missing_reason() {
        assert!(ReasonCode::require(None).unwrap_err().is_validation());
        assert_eq!(
            ReasonCode::require(Some(ReasonCode::Waste)).unwrap(),
            ReasonCode::Waste
        );
    }
}
