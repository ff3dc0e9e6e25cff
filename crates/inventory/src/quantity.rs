//! Quantities, magnitudes and the signed adjustments derived from them.

use serde::{Deserialize, Serialize};

use clinicstock_core::{DomainError, DomainResult, ValueObject};

/// A non-negative stock quantity.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Quantity(i64);

impl Quantity {
    pub const ZERO: Quantity = Quantity(0);

    pub fn new(value: i64) -> DomainResult<Self> {
        if value < 0 {
            return Err(DomainError::validation("quantity cannot be negative"));
        }
        Ok(Self(value))
    }

    /// Clamp user-entered values to zero instead of rejecting them.
    pub fn clamped(value: i64) -> Self {
        Self(value.max(0))
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl ValueObject for Quantity {}

impl TryFrom<i64> for Quantity {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for i64 {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// A strictly positive amount sent to one of the two quantity procedures.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Magnitude(i64);

impl Magnitude {
    pub fn new(value: i64) -> DomainResult<Self> {
        if value <= 0 {
            return Err(DomainError::validation(
                "enter a quantity greater than zero",
            ));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl ValueObject for Magnitude {}

impl core::fmt::Display for Magnitude {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Signed change to apply to an item, split by direction.
///
/// `NoChange` is a deliberate no-op: it never turns into a remote call.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Adjustment {
    NoChange,
    Increase(Magnitude),
    Decrease(Magnitude),
}

impl Adjustment {
    pub fn from_delta(delta: i64) -> Self {
        match delta {
            0 => Adjustment::NoChange,
            d if d > 0 => Adjustment::Increase(Magnitude(d)),
            d => Adjustment::Decrease(Magnitude(d.saturating_abs())),
        }
    }

    /// Adjustment that moves `baseline` to `desired`.
    pub fn between(baseline: Quantity, desired: Quantity) -> Self {
        Self::from_delta(desired.get() - baseline.get())
    }

    pub fn signed_delta(&self) -> i64 {
        match self {
            Adjustment::NoChange => 0,
            Adjustment::Increase(m) => m.get(),
            Adjustment::Decrease(m) => -m.get(),
        }
    }

    pub fn magnitude(&self) -> Option<Magnitude> {
        match self {
            Adjustment::NoChange => None,
            Adjustment::Increase(m) | Adjustment::Decrease(m) => Some(*m),
        }
    }

    pub fn is_no_change(&self) -> bool {
        matches!(self, Adjustment::NoChange)
    }

    /// Display-only projection of the adjustment onto a known quantity.
    ///
    /// Never feed the result back into a delta computation; it may already be
    /// stale relative to other clients.
    pub fn apply_to(&self, quantity: Quantity) -> Quantity {
        Quantity::clamped(quantity.get().saturating_add(self.signed_delta()))
    }
}

impl ValueObject for Adjustment {}

/// What the user asked for, held locally until submitted or discarded.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AdjustmentIntent {
    /// Cycle count: the quantity should become exactly this value.
    SetTo(Quantity),
    /// Quick adjust: change the quantity by a signed amount.
    ChangeBy(Adjustment),
}

impl AdjustmentIntent {
    /// Resolve the intent against a freshly read baseline.
    pub fn resolve(&self, baseline: Quantity) -> Adjustment {
        match self {
            AdjustmentIntent::SetTo(desired) => Adjustment::between(baseline, *desired),
            AdjustmentIntent::ChangeBy(adjustment) => *adjustment,
        }
    }
}

impl From<Quantity> for AdjustmentIntent {
    fn from(desired: Quantity) -> Self {
        AdjustmentIntent::SetTo(desired)
    }
}

impl From<Adjustment> for AdjustmentIntent {
    fn from(adjustment: Adjustment) -> Self {
        AdjustmentIntent::ChangeBy(adjustment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn q(v: i64) -> Quantity {
        Quantity::new(v).unwrap()
    }

    #[test]
    fn decrease_from_ten_to_seven() {
        let adj = Adjustment::between(q(10), q(7));
        assert_eq!(adj, Adjustment::Decrease(Magnitude::new(3).unwrap()));
        assert_eq!(adj.signed_delta(), -3);
    }

    #[test]
    fn unchanged_count_is_no_change() {
        assert!(Adjustment::between(q(10), q(10)).is_no_change());
        assert_eq!(Adjustment::between(q(10), q(10)).magnitude(), None);
    }

    #[test]
    fn magnitude_rejects_zero_and_negative() {
        assert!(Magnitude::new(0).unwrap_err().is_validation());
        assert!(Magnitude::new(-4).is_err());
        assert_eq!(Magnitude::new(1).unwrap().get(), 1);
    }

    #[test]
    fn quantity_rejects_negative_but_clamps_on_request() {
        assert!(Quantity::new(-1).is_err());
        assert_eq!(Quantity::clamped(-7), Quantity::ZERO);
        assert!(serde_json::from_str::<Quantity>("-2").is_err());
    }

    #[test]
    fn optimistic_projection_never_goes_negative() {
        let adj = Adjustment::from_delta(-5);
        assert_eq!(adj.apply_to(q(2)), Quantity::ZERO);
        assert_eq!(Adjustment::from_delta(1).apply_to(q(2)), q(3));
    }

    #[test]
    fn intent_resolution() {
        let set = AdjustmentIntent::SetTo(q(4));
        assert_eq!(set.resolve(q(1)).signed_delta(), 3);

        let bump = AdjustmentIntent::from(Adjustment::from_delta(-1));
        assert_eq!(bump.resolve(q(100)).signed_delta(), -1);
        assert_eq!(AdjustmentIntent::from(q(4)), set);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// The adjustment direction and size always match `desired - baseline`.
        #[test]
        fn adjustment_matches_difference(
            baseline in 0i64..1_000_000,
            desired in 0i64..1_000_000,
        ) {
            let adj = Adjustment::between(q(baseline), q(desired));
            prop_assert_eq!(adj.signed_delta(), desired - baseline);

            match adj {
                Adjustment::NoChange => prop_assert_eq!(desired, baseline),
                Adjustment::Increase(m) => {
                    prop_assert!(desired > baseline);
                    prop_assert_eq!(m.get(), desired - baseline);
                }
                Adjustment::Decrease(m) => {
                    prop_assert!(desired < baseline);
                    prop_assert_eq!(m.get(), baseline - desired);
                }
            }
        }

        /// Every non-trivial adjustment carries a strictly positive magnitude.
        #[test]
        fn magnitude_is_positive(delta in -1_000_000i64..1_000_000) {
            let adj = Adjustment::from_delta(delta);
            match adj.magnitude() {
                Some(m) => prop_assert!(m.get() > 0),
                None => prop_assert_eq!(delta, 0),
            }
        }
    }
}
