//! Cycle count entries.
//!
//! A blank entry and an entered zero are different things: blank means "not
//! counted yet" and produces no intent at all, while zero is a real count that
//! may drain the item.

use std::collections::BTreeMap;

use clinicstock_core::{DomainError, DomainResult, ItemId};

use crate::quantity::{AdjustmentIntent, Quantity};

/// One parsed count field.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CountInput {
    Blank,
    Counted(Quantity),
}

impl CountInput {
    /// Parse raw text from a count field.
    ///
    /// Whitespace-only input is `Blank`; negative integers clamp to zero;
    /// anything that is not a whole number is rejected.
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(CountInput::Blank);
        }
        let value: i64 = trimmed
            .parse()
            .map_err(|_| DomainError::validation(format!("not a whole number: {trimmed}")))?;
        Ok(CountInput::Counted(Quantity::clamped(value)))
    }

    pub fn counted(&self) -> Option<Quantity> {
        match self {
            CountInput::Blank => None,
            CountInput::Counted(q) => Some(*q),
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, CountInput::Blank)
    }
}

/// Counted quantities keyed by item, pending submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountSheet {
    counted: BTreeMap<ItemId, Quantity>,
}

impl CountSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entry. `Blank` removes any previous count for the item.
    pub fn enter(&mut self, item_id: ItemId, input: CountInput) {
        match input {
            CountInput::Blank => {
                self.counted.remove(&item_id);
            }
            CountInput::Counted(q) => {
                self.counted.insert(item_id, q);
            }
        }
    }

    /// Parse and record raw text. On a parse error the previous entry is kept.
    pub fn enter_text(&mut self, item_id: ItemId, raw: &str) -> DomainResult<CountInput> {
        let input = CountInput::parse(raw)?;
        self.enter(item_id, input);
        Ok(input)
    }

    pub fn get(&self, item_id: &ItemId) -> CountInput {
        self.counted
            .get(item_id)
            .copied()
            .map_or(CountInput::Blank, CountInput::Counted)
    }

    pub fn is_edited(&self, item_id: &ItemId) -> bool {
        self.counted.contains_key(item_id)
    }

    /// `counted - system`, or `None` while the item is blank.
    pub fn variance(&self, item_id: &ItemId, system_qty: i64) -> Option<i64> {
        self.counted.get(item_id).map(|q| q.get() - system_qty)
    }

    pub fn entered_count(&self) -> usize {
        self.counted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counted.is_empty()
    }

    /// Every counted entry as a "set to" intent, for submission.
    pub fn intents(&self) -> Vec<(ItemId, AdjustmentIntent)> {
        self.counted
            .iter()
            .map(|(id, q)| (*id, AdjustmentIntent::SetTo(*q)))
            .collect()
    }

    pub fn clear_item(&mut self, item_id: &ItemId) {
        self.counted.remove(item_id);
    }

    pub fn clear(&mut self) {
        self.counted.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn blank_is_not_zero() {
        assert_eq!(CountInput::parse("").unwrap(), CountInput::Blank);
        assert_eq!(CountInput::parse("  ").unwrap(), CountInput::Blank);
        assert_eq!(
            CountInput::parse("0").unwrap(),
            CountInput::Counted(Quantity::ZERO)
        );
    }

    #[test]
    fn negative_clamps_and_garbage_fails() {
        assert_eq!(
            CountInput::parse("-3").unwrap(),
            CountInput::Counted(Quantity::ZERO)
        );
        assert!(CountInput::parse("3.5").unwrap_err().is_validation());
        assert!(CountInput::parse("ten").is_err());
    }

    #[test]
    fn sheet_tracks_variance_only_for_entered_items() {
        let mut sheet = CountSheet::new();
        let counted = ItemId::new();
        let untouched = ItemId::new();

        sheet.enter_text(counted, "7").unwrap();

        assert_eq!(sheet.variance(&counted, 10), Some(-3));
        assert_eq!(sheet.variance(&untouched, 10), None);
        assert_eq!(sheet.entered_count(), 1);
        assert_eq!(
            sheet.intents(),
            [(counted, AdjustmentIntent::SetTo(Quantity::clamped(7)))]
        );
        assert!(sheet.is_edited(&counted));
        assert!(!sheet.is_edited(&untouched));
    }

    #[test]
    fn blank_entry_removes_intent() {
        let mut sheet = CountSheet::new();
        let id = ItemId::new();

        sheet.enter_text(id, "4").unwrap();
        sheet.enter_text(id, "").unwrap();

        assert!(sheet.is_empty());
        assert_eq!(sheet.get(&id), CountInput::Blank);
    }

    #[test]
    fn bad_input_keeps_previous_entry() {
        let mut sheet = CountSheet::new();
        let id = ItemId::new();

        sheet.enter_text(id, "4").unwrap();
        assert!(sheet.enter_text(id, "4x").is_err());

        assert_eq!(sheet.get(&id).counted().map(Quantity::get), Some(4));
    }

    proptest! {
        #[test]
        fn parsed_counts_are_never_negative(value in any::<i64>()) {
            let parsed = CountInput::parse(&value.to_string()).unwrap();
            let q = parsed.counted().unwrap();
            prop_assert!(q.get() >= 0);
            prop_assert_eq!(q.get(), value.max(0));
        }

        #[test]
        fn whitespace_is_always_blank(ws in "[ \t]{0,8}") {
            prop_assert!(CountInput::parse(&ws).unwrap().is_blank());
        }
    }
}
