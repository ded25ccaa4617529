use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use skuhub_core::{DomainError, DomainResult, Entity, RecordId, RecordMeta};

use crate::product::{discount, min_price, Product, ProductId};

/// Item (product variant) identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub RecordId);

impl ItemId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// A concrete variant of a product: one size/color/attribute combination.
///
/// Prices are optional and inherit from the parent product when neither is
/// set at save time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub product: ProductId,
    pub size: Option<String>,
    pub color: Option<String>,
    pub other_attributes: BTreeMap<String, String>,
    /// System-managed; maintained by the fulfillment workflow.
    pub stock: i32,
    pub price_fake: Option<Decimal>,
    pub price_real: Option<Decimal>,
    pub meta: RecordMeta,
}

impl Item {
    pub fn new(id: ItemId, product: ProductId) -> Self {
        Self {
            id,
            product,
            size: None,
            color: None,
            other_attributes: BTreeMap::new(),
            stock: 0,
            price_fake: None,
            price_real: None,
            meta: RecordMeta::now(),
        }
    }

    /// Reject explicitly-set prices below the configured minimum. Absent
    /// prices are fine: they inherit from the parent product.
    pub fn validate_prices(&self) -> DomainResult<()> {
        for (field, price) in [("price_fake", self.price_fake), ("price_real", self.price_real)] {
            if let Some(price) = price {
                if price < min_price() {
                    return Err(DomainError::validation(format!(
                        "{field} must be at least {}",
                        min_price()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Save-time price normalization with inheritance. Exactly one branch
    /// fires, checked in this order:
    ///
    /// 1. both prices absent: inherit both from the parent product;
    /// 2. `price_fake` absent: default it to `price_real`;
    /// 3. inverted pair: swap so `price_real <= price_fake`.
    ///
    /// `product` must be the resolved parent for `self.product`.
    pub fn normalize_prices(&mut self, product: &Product) -> DomainResult<()> {
        if product.id != self.product {
            return Err(DomainError::invariant("resolved product does not match product id"));
        }

        if self.price_fake.is_none() && self.price_real.is_none() {
            self.price_fake = product.price_fake;
            self.price_real = Some(product.price_real);
        } else if self.price_fake.is_none() {
            self.price_fake = self.price_real;
        } else if let (Some(fake), Some(real)) = (self.price_fake, self.price_real) {
            if real > fake {
                self.price_fake = Some(real);
                self.price_real = Some(fake);
            }
        }
        Ok(())
    }

    /// Same discount rule as the parent product; zero when either price is
    /// absent or zero. Computed on access, never stored.
    pub fn discount_percentage(&self) -> Decimal {
        discount(self.price_fake, self.price_real)
    }

    /// Render `other_attributes` as `"key: value, key: value"`.
    pub fn attributes_summary(&self) -> String {
        self.other_attributes
            .iter()
            .map(|(key, value)| format!("{key}: {value}"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Human-readable variant label for pick lists and logs.
    pub fn label(&self) -> String {
        let mut details = Vec::new();
        if let Some(size) = &self.size {
            details.push(format!("size: {size}"));
        }
        if let Some(color) = &self.color {
            details.push(format!("color: {color}"));
        }
        if !self.other_attributes.is_empty() {
            details.push(self.attributes_summary());
        }
        details.join(", ")
    }
}

impl Entity for Item {
    type Id = ItemId;

    fn id(&self) -> ItemId {
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

    fn test_product(price_real: Decimal) -> Product {
        Product::new(ProductId::new(RecordId::new()), price_real)
    }

    fn test_item(product: &Product) -> Item {
        Item::new(ItemId::new(RecordId::new()), product.id)
    }

    #[test]
    fn inherits_both_prices_from_product() {
        let mut product = test_product(dec!(90000));
        product.price_fake = Some(dec!(120000));
        product.normalize_prices();

        let mut item = test_item(&product);
        item.normalize_prices(&product).unwrap();

        assert_eq!(item.price_fake, Some(dec!(120000)));
        assert_eq!(item.price_real, Some(dec!(90000)));
    }

    #[test]
    fn missing_fake_price_defaults_to_real_price() {
        let product = test_product(dec!(50000));
        let mut item = test_item(&product);
        item.price_real = Some(dec!(45000));
        item.normalize_prices(&product).unwrap();

        assert_eq!(item.price_fake, Some(dec!(45000)));
        assert_eq!(item.price_real, Some(dec!(45000)));
    }

    #[test]
    fn inverted_prices_are_swapped() {
        let product = test_product(dec!(50000));
        let mut item = test_item(&product);
        item.price_fake = Some(dec!(30000));
        item.price_real = Some(dec!(60000));
        item.normalize_prices(&product).unwrap();

        assert_eq!(item.price_fake, Some(dec!(60000)));
        assert_eq!(item.price_real, Some(dec!(30000)));
    }

    #[test]
    fn inheritance_wins_over_defaulting() {
        // Both prices absent: the first branch fires even though the second
        // also "matches" an absent price_fake. Branch order is behavior.
        let mut product = test_product(dec!(80000));
        product.price_fake = Some(dec!(100000));

        let mut item = test_item(&product);
        item.normalize_prices(&product).unwrap();

        assert_eq!(item.price_fake, Some(dec!(100000)));
        assert_eq!(item.price_real, Some(dec!(80000)));
    }

    #[test]
    fn discount_is_exact_quarter_for_90000_over_120000() {
        let product = test_product(dec!(50000));
        let mut item = test_item(&product);
        item.price_fake = Some(dec!(120000));
        item.price_real = Some(dec!(90000));
        item.normalize_prices(&product).unwrap();

        assert_eq!(item.discount_percentage(), dec!(0.25));
    }

    #[test]
    fn discount_is_zero_without_prices() {
        let product = test_product(dec!(50000));
        let item = test_item(&product);
        assert_eq!(item.discount_percentage(), Decimal::ZERO);
    }

    #[test]
    fn rejects_mismatched_product_record() {
        let product = test_product(dec!(50000));
        let other = test_product(dec!(70000));
        let mut item = test_item(&product);

        let err = item.normalize_prices(&other).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn validate_rejects_explicit_price_below_minimum() {
        let product = test_product(dec!(50000));
        let mut item = test_item(&product);
        item.price_real = Some(dec!(10));

        let err = item.validate_prices().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn attributes_summary_joins_pairs_in_key_order() {
        let product = test_product(dec!(50000));
        let mut item = test_item(&product);
        item.size = Some("M".to_string());
        item.color = Some("red".to_string());
        item.other_attributes.insert("material".to_string(), "wool".to_string());
        item.other_attributes.insert("fit".to_string(), "slim".to_string());

        assert_eq!(item.attributes_summary(), "fit: slim, material: wool");
        assert_eq!(item.label(), "size: M, color: red, fit: slim, material: wool");
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: whatever combination of explicit and absent prices an
            /// item is saved with, afterwards both prices are present and
            /// `price_real <= price_fake`.
            #[test]
            fn prices_are_present_and_ordered_after_normalization(
                product_real in 100u32..10_000_000,
                product_fake in proptest::option::of(100u32..10_000_000),
                item_real in proptest::option::of(100u32..10_000_000),
                item_fake in proptest::option::of(100u32..10_000_000),
            ) {
                let mut product = test_product(Decimal::from(product_real));
                product.price_fake = product_fake.map(Decimal::from);
                product.normalize_prices();

                let mut item = test_item(&product);
                item.price_real = item_real.map(Decimal::from);
                item.price_fake = item_fake.map(Decimal::from);
                item.normalize_prices(&product).unwrap();

                // The only save shape that can leave price_real absent is an
                // explicit fake with no real price; everything else fills both.
                if item_real.is_some() || item_fake.is_none() {
                    let fake = item.price_fake.unwrap();
                    let real = item.price_real.unwrap();
                    prop_assert!(real <= fake);
                }
            }

            /// Property: an item saved with no explicit prices mirrors its
            /// parent product exactly.
            #[test]
            fn full_inheritance_mirrors_parent(
                product_real in 100u32..10_000_000,
                product_fake in proptest::option::of(100u32..10_000_000),
            ) {
                let mut product = test_product(Decimal::from(product_real));
                product.price_fake = product_fake.map(Decimal::from);
                product.normalize_prices();

                let mut item = test_item(&product);
                item.normalize_prices(&product).unwrap();

                prop_assert_eq!(item.price_fake, product.price_fake);
                prop_assert_eq!(item.price_real, Some(product.price_real));
            }
        }
    }
}
