//! `skuhub-supply` — suppliers, payment methods and purchase orders.
//!
//! Order and line totals are system-computed: the store recomputes them
//! through [`SupplyOrderDetail::recompute`] and [`SupplyOrder::recompute`]
//! before every write, so callers never set `sub_total`/`total` directly.

pub mod order;
pub mod supplier;

pub use order::{
    OrderState, SupplyOrder, SupplyOrderDetail, SupplyOrderDetailId, SupplyOrderId,
};
pub use supplier::{PaymentKind, PaymentMethodId, Supplier, SupplierId, SupplyPaymentMethod};
