use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use skuhub_catalog::ItemId;
use skuhub_core::{DomainError, DomainResult, Entity, RecordId, RecordMeta};
use skuhub_supply::SupplyOrderDetailId;

use crate::batch_code::BatchCode;

/// Inventory batch identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InventoryId(pub RecordId);

impl InventoryId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for InventoryId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Sale state of a batch. Stored under the legacy three-letter codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BatchState {
    #[default]
    #[serde(rename = "RFS")]
    ReadyForSale,
    #[serde(rename = "RSV")]
    Reserved,
    #[serde(rename = "SLD")]
    Sold,
    #[serde(rename = "NFS")]
    NotForSale,
}

/// A warehouse inventory batch: one lot of one item, received from one
/// supply-order line.
///
/// `batch_code` is `None` until the store issues one on first save, and
/// immutable afterwards. `stock` is derived; when `entries`/`exits` change is
/// the fulfillment workflow's concern, not this crate's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub id: InventoryId,
    pub item: ItemId,
    /// Provenance: the supply-order line this lot was received from.
    pub source_detail: SupplyOrderDetailId,
    pub batch_code: Option<BatchCode>,
    pub entries: i32,
    pub exits: i32,
    /// Derived: `entries - exits`.
    pub stock: i32,
    pub unit_cost: Decimal,
    pub last_entry_at: DateTime<Utc>,
    pub last_exit_at: Option<DateTime<Utc>>,
    pub state: BatchState,
    pub meta: RecordMeta,
}

impl Inventory {
    pub fn new(
        id: InventoryId,
        item: ItemId,
        source_detail: SupplyOrderDetailId,
        entries: i32,
        unit_cost: Decimal,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            item,
            source_detail,
            batch_code: None,
            entries,
            exits: 0,
            stock: 0,
            unit_cost,
            last_entry_at: received_at,
            last_exit_at: None,
            state: BatchState::default(),
            meta: RecordMeta::now(),
        }
    }

    /// Re-derive `stock` from the entry/exit counters.
    pub fn recompute(&mut self) -> DomainResult<()> {
        if self.entries < 0 {
            return Err(DomainError::validation("entries cannot be negative"));
        }
        if self.exits < 0 {
            return Err(DomainError::validation("exits cannot be negative"));
        }
        if self.exits > self.entries {
            return Err(DomainError::invariant("exits cannot exceed entries"));
        }
        if self.unit_cost < Decimal::ZERO {
            return Err(DomainError::validation("unit_cost cannot be negative"));
        }
        self.stock = self.entries - self.exits;
        Ok(())
    }

    /// Value of the units still on hand. Computed on access, never stored.
    pub fn total_cost(&self) -> Decimal {
        Decimal::from(self.stock) * self.unit_cost
    }
}

impl Entity for Inventory {
    type Id = InventoryId;

    fn id(&self) -> InventoryId {
        self.id
    }

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_batch(entries: i32, unit_cost: Decimal) -> Inventory {
        Inventory::new(
            InventoryId::new(RecordId::new()),
            ItemId::new(RecordId::new()),
            SupplyOrderDetailId::new(RecordId::new()),
            entries,
            unit_cost,
            Utc::now(),
        )
    }

    #[test]
    fn stock_is_entries_minus_exits() {
        let mut batch = test_batch(40, dec!(2500));
        batch.exits = 15;
        batch.recompute().unwrap();
        assert_eq!(batch.stock, 25);
    }

    #[test]
    fn total_cost_scales_with_stock() {
        let mut batch = test_batch(40, dec!(2500));
        batch.exits = 15;
        batch.recompute().unwrap();
        assert_eq!(batch.total_cost(), dec!(62500));
    }

    #[test]
    fn rejects_exits_exceeding_entries() {
        let mut batch = test_batch(10, dec!(100));
        batch.exits = 11;
        let err = batch.recompute().unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn rejects_negative_counters() {
        let mut batch = test_batch(-1, dec!(100));
        assert!(batch.recompute().is_err());

        let mut batch = test_batch(5, dec!(100));
        batch.exits = -2;
        assert!(batch.recompute().is_err());
    }

    #[test]
    fn new_batch_defaults_to_ready_for_sale_without_code() {
        let batch = test_batch(5, dec!(100));
        assert_eq!(batch.state, BatchState::ReadyForSale);
        assert!(batch.batch_code.is_none());
        assert!(batch.last_exit_at.is_none());
    }

    #[test]
    fn batch_state_serializes_to_legacy_codes() {
        assert_eq!(serde_json::to_string(&BatchState::ReadyForSale).unwrap(), "\"RFS\"");
        assert_eq!(serde_json::to_string(&BatchState::Reserved).unwrap(), "\"RSV\"");
        assert_eq!(serde_json::to_string(&BatchState::Sold).unwrap(), "\"SLD\"");
        assert_eq!(serde_json::to_string(&BatchState::NotForSale).unwrap(), "\"NFS\"");
    }
}
