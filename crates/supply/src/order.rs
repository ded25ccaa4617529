use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use skuhub_catalog::{ItemId, PurchaseUrl};
use skuhub_core::{DomainError, DomainResult, Entity, RecordId, RecordMeta};

use crate::supplier::{PaymentMethodId, SupplierId};

/// Supply order identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SupplyOrderId(pub RecordId);

impl SupplyOrderId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for SupplyOrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Supply order line identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SupplyOrderDetailId(pub RecordId);

impl SupplyOrderDetailId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for SupplyOrderDetailId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Supply order lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    Draft,
    OnTheWay,
    Finished,
    Cancelled,
}

/// A purchase order placed with a supplier.
///
/// `sub_total` and `total` are system-computed from the order's details; the
/// optional `trm` carries the exchange rate when the order is priced in a
/// foreign currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyOrder {
    pub id: SupplyOrderId,
    pub supplier: SupplierId,
    pub payment_method: PaymentMethodId,
    pub order_date: NaiveDate,
    /// Derived: sum of the order's detail sub-totals.
    pub sub_total: Decimal,
    pub shipping_fee: Decimal,
    pub taxes: Decimal,
    /// Derived: `sub_total + shipping_fee + taxes`.
    pub total: Decimal,
    pub related_urls: Vec<PurchaseUrl>,
    pub trm: Option<Decimal>,
    pub state: OrderState,
    pub meta: RecordMeta,
}

impl SupplyOrder {
    pub fn new(
        id: SupplyOrderId,
        supplier: SupplierId,
        payment_method: PaymentMethodId,
        order_date: NaiveDate,
    ) -> Self {
        Self {
            id,
            supplier,
            payment_method,
            order_date,
            sub_total: Decimal::ZERO,
            shipping_fee: Decimal::ZERO,
            taxes: Decimal::ZERO,
            total: Decimal::ZERO,
            related_urls: Vec::new(),
            trm: None,
            state: OrderState::Draft,
            meta: RecordMeta::now(),
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.shipping_fee < Decimal::ZERO {
            return Err(DomainError::validation("shipping_fee cannot be negative"));
        }
        if self.taxes < Decimal::ZERO {
            return Err(DomainError::validation("taxes cannot be negative"));
        }
        Ok(())
    }

    /// Re-derive the order totals from its detail lines.
    ///
    /// `details` must be exactly the lines belonging to this order; the store
    /// collects them before calling. Lines for other orders are rejected.
    pub fn recompute(&mut self, details: &[SupplyOrderDetail]) -> DomainResult<()> {
        if let Some(stray) = details.iter().find(|d| d.order != self.id) {
            return Err(DomainError::invariant(format!(
                "detail {} belongs to another order",
                stray.id
            )));
        }
        self.sub_total = details.iter().map(|d| d.sub_total).sum();
        self.total = self.sub_total + self.shipping_fee + self.taxes;
        Ok(())
    }

    /// Effective tax rate: `taxes / sub_total` when taxes were charged, else
    /// zero. Computed on access, never stored.
    pub fn taxes_percentage(&self) -> Decimal {
        if self.taxes > Decimal::ZERO && !self.sub_total.is_zero() {
            self.taxes / self.sub_total
        } else {
            Decimal::ZERO
        }
    }
}

impl Entity for SupplyOrder {
    type Id = SupplyOrderId;

    fn id(&self) -> SupplyOrderId {
        self.id
    }

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

/// One line of a supply order: a quantity of one item at a unit cost.
///
/// Cascade-soft-deleted with its order by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyOrderDetail {
    pub id: SupplyOrderDetailId,
    pub order: SupplyOrderId,
    pub item: ItemId,
    pub quantity: i32,
    pub unit_cost: Decimal,
    /// Derived: `quantity * unit_cost`.
    pub sub_total: Decimal,
    pub shipping_fee: Decimal,
    pub taxes: Decimal,
    /// Derived: `sub_total + shipping_fee + taxes`.
    pub total: Decimal,
    pub purchase_url: Option<String>,
    pub meta: RecordMeta,
}

impl SupplyOrderDetail {
    pub fn new(
        id: SupplyOrderDetailId,
        order: SupplyOrderId,
        item: ItemId,
        quantity: i32,
        unit_cost: Decimal,
    ) -> Self {
        Self {
            id,
            order,
            item,
            quantity,
            unit_cost,
            sub_total: Decimal::ZERO,
            shipping_fee: Decimal::ZERO,
            taxes: Decimal::ZERO,
            total: Decimal::ZERO,
            purchase_url: None,
            meta: RecordMeta::now(),
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if self.unit_cost < Decimal::ZERO {
            return Err(DomainError::validation("unit_cost cannot be negative"));
        }
        if self.shipping_fee < Decimal::ZERO {
            return Err(DomainError::validation("shipping_fee cannot be negative"));
        }
        if self.taxes < Decimal::ZERO {
            return Err(DomainError::validation("taxes cannot be negative"));
        }
        Ok(())
    }

    /// Re-derive the line totals from quantity and unit cost.
    pub fn recompute(&mut self) {
        self.sub_total = Decimal::from(self.quantity) * self.unit_cost;
        self.total = self.sub_total + self.shipping_fee + self.taxes;
    }
}

impl Entity for SupplyOrderDetail {
    type Id = SupplyOrderDetailId;

    fn id(&self) -> SupplyOrderDetailId {
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

    fn test_order() -> SupplyOrder {
        SupplyOrder::new(
            SupplyOrderId::new(RecordId::new()),
            SupplierId::new(RecordId::new()),
            PaymentMethodId::new(RecordId::new()),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        )
    }

    fn test_detail(order: SupplyOrderId, quantity: i32, unit_cost: Decimal) -> SupplyOrderDetail {
        SupplyOrderDetail::new(
            SupplyOrderDetailId::new(RecordId::new()),
            order,
            ItemId::new(RecordId::new()),
            quantity,
            unit_cost,
        )
    }

    #[test]
    fn detail_totals_derive_from_quantity_and_unit_cost() {
        let order = test_order();
        let mut detail = test_detail(order.id, 12, dec!(2500));
        detail.shipping_fee = dec!(400);
        detail.taxes = dec!(600);
        detail.recompute();

        assert_eq!(detail.sub_total, dec!(30000));
        assert_eq!(detail.total, dec!(31000));
    }

    #[test]
    fn order_sub_total_sums_its_details() {
        let mut order = test_order();
        order.shipping_fee = dec!(1000);
        order.taxes = dec!(500);

        let mut first = test_detail(order.id, 2, dec!(1500));
        first.recompute();
        let mut second = test_detail(order.id, 5, dec!(800));
        second.recompute();

        order.recompute(&[first, second]).unwrap();
        assert_eq!(order.sub_total, dec!(7000));
        assert_eq!(order.total, dec!(8500));
    }

    #[test]
    fn order_with_no_details_totals_fees_only() {
        let mut order = test_order();
        order.shipping_fee = dec!(1000);
        order.recompute(&[]).unwrap();

        assert_eq!(order.sub_total, Decimal::ZERO);
        assert_eq!(order.total, dec!(1000));
    }

    #[test]
    fn recompute_rejects_details_of_other_orders() {
        let mut order = test_order();
        let stray = test_detail(SupplyOrderId::new(RecordId::new()), 1, dec!(100));

        let err = order.recompute(&[stray]).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn taxes_percentage_is_ratio_of_sub_total() {
        let mut order = test_order();
        order.taxes = dec!(1900);
        let mut detail = test_detail(order.id, 1, dec!(10000));
        detail.recompute();
        order.recompute(&[detail]).unwrap();

        assert_eq!(order.taxes_percentage(), dec!(0.19));
    }

    #[test]
    fn taxes_percentage_is_zero_when_untaxed() {
        let mut order = test_order();
        let mut detail = test_detail(order.id, 1, dec!(10000));
        detail.recompute();
        order.recompute(&[detail]).unwrap();

        assert_eq!(order.taxes_percentage(), Decimal::ZERO);
    }

    #[test]
    fn taxes_percentage_is_zero_on_empty_order() {
        let mut order = test_order();
        order.taxes = dec!(100);
        order.recompute(&[]).unwrap();

        assert_eq!(order.taxes_percentage(), Decimal::ZERO);
    }

    #[test]
    fn detail_rejects_non_positive_quantity() {
        let order = test_order();
        let detail = test_detail(order.id, 0, dec!(100));
        assert!(matches!(
            detail.validate().unwrap_err(),
            DomainError::Validation(_)
        ));
    }
}
