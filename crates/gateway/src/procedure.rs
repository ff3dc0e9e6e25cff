//! The two remote quantity procedures.

use serde::Serialize;

use clinicstock_core::ItemId;
use clinicstock_inventory::{Adjustment, Magnitude, ReasonCode};

/// Backend procedures that mutate quantity.
///
/// Each one atomically adjusts `qty_on_hand` and appends exactly one
/// transaction record.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Procedure {
    AddInventory,
    DeductInventory,
}

impl Procedure {
    pub fn name(&self) -> &'static str {
        match self {
            Procedure::AddInventory => "add_inventory",
            Procedure::DeductInventory => "deduct_inventory",
        }
    }

    /// Sign applied to the magnitude by this procedure.
    pub fn sign(&self) -> i64 {
        match self {
            Procedure::AddInventory => 1,
            Procedure::DeductInventory => -1,
        }
    }
}

impl core::fmt::Display for Procedure {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// A fully validated procedure invocation.
///
/// Can only be built from a non-trivial [`Adjustment`] and a [`ReasonCode`],
/// so a zero-magnitude or reason-less call is unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureCall {
    procedure: Procedure,
    item_id: ItemId,
    magnitude: Magnitude,
    reason: ReasonCode,
}

/// JSON body accepted by both procedures.
#[derive(Debug, Serialize)]
pub struct ProcedureArgs {
    pub p_item_id: ItemId,
    pub p_qty: i64,
    pub p_reason: &'static str,
}

impl ProcedureCall {
    /// `None` for [`Adjustment::NoChange`]: nothing to send.
    pub fn for_adjustment(
        item_id: ItemId,
        adjustment: Adjustment,
        reason: ReasonCode,
    ) -> Option<Self> {
        let (procedure, magnitude) = match adjustment {
            Adjustment::NoChange => return None,
            Adjustment::Increase(m) => (Procedure::AddInventory, m),
            Adjustment::Decrease(m) => (Procedure::DeductInventory, m),
        };
        Some(Self {
            procedure,
            item_id,
            magnitude,
            reason,
        })
    }

    pub fn procedure(&self) -> Procedure {
        self.procedure
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn magnitude(&self) -> Magnitude {
        self.magnitude
    }

    pub fn reason(&self) -> ReasonCode {
        self.reason
    }

    pub fn signed_delta(&self) -> i64 {
        self.procedure.sign() * self.magnitude.get()
    }

    pub fn args(&self) -> ProcedureArgs {
        ProcedureArgs {
            p_item_id: self.item_id,
            p_qty: self.magnitude.get(),
            p_reason: self.reason.code(),
        }
    }
}
