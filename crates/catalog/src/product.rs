use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use skuhub_core::{DomainError, DomainResult, Entity, RecordId, RecordMeta};

use crate::category::CategoryId;

/// Product identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub RecordId);

impl ProductId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Minimum accepted price, in currency units.
///
/// Enforced by the store before the normalization rule runs; the rule itself
/// is total and never rejects.
pub fn min_price() -> Decimal {
    Decimal::ONE_HUNDRED
}

/// A labelled URL where the product can be purchased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseUrl {
    pub label: String,
    pub url: String,
}

/// A sellable product.
///
/// `price_fake` is the displayed "original" price used to render a discount;
/// `price_real` is what the customer actually pays. After normalization
/// `price_real <= price_fake` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub category: Option<CategoryId>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub purchase_urls: Vec<PurchaseUrl>,
    /// System-managed; maintained by the fulfillment workflow, not edited
    /// directly.
    pub stock: i32,
    pub price_fake: Option<Decimal>,
    pub price_real: Decimal,
    pub meta: RecordMeta,
}

impl Product {
    pub fn new(id: ProductId, price_real: Decimal) -> Self {
        Self {
            id,
            category: None,
            name: None,
            description: None,
            purchase_urls: Vec::new(),
            stock: 0,
            price_fake: None,
            price_real,
            meta: RecordMeta::now(),
        }
    }

    /// Reject prices below the configured minimum. Runs before
    /// [`Product::normalize_prices`] in the store's save path.
    pub fn validate_prices(&self) -> DomainResult<()> {
        if self.price_real < min_price() {
            return Err(DomainError::validation(format!(
                "price_real must be at least {}",
                min_price()
            )));
        }
        if let Some(fake) = self.price_fake {
            if fake < min_price() {
                return Err(DomainError::validation(format!(
                    "price_fake must be at least {}",
                    min_price()
                )));
            }
        }
        Ok(())
    }

    /// Save-time price normalization:
    ///
    /// 1. a missing `price_fake` defaults to `price_real`;
    /// 2. an inverted pair is swapped so `price_real <= price_fake`.
    pub fn normalize_prices(&mut self) {
        let fake = self.price_fake.get_or_insert(self.price_real);
        if self.price_real > *fake {
            core::mem::swap(&mut self.price_real, fake);
        }
    }

    /// Fraction of the displayed price the customer saves, in `[0, 1)` after
    /// normalization. Zero when either price is missing or zero. Computed on
    /// access, never stored.
    pub fn discount_percentage(&self) -> Decimal {
        discount(self.price_fake, Some(self.price_real))
    }
}

/// Shared discount rule for products and item variants:
/// `1 - price_real / price_fake`, or zero when either side is absent or zero.
pub(crate) fn discount(price_fake: Option<Decimal>, price_real: Option<Decimal>) -> Decimal {
    match (price_fake, price_real) {
        (Some(fake), Some(real)) if !fake.is_zero() && !real.is_zero() => Decimal::ONE - real / fake,
        _ => Decimal::ZERO,
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> ProductId {
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

    #[test]
    fn missing_fake_price_defaults_to_real_price() {
        let mut product = test_product(dec!(60000));
        product.normalize_prices();

        assert_eq!(product.price_fake, Some(dec!(60000)));
        assert_eq!(product.price_real, dec!(60000));
        assert_eq!(product.discount_percentage(), Decimal::ZERO);
    }

    #[test]
    fn inverted_prices_are_swapped() {
        let mut product = test_product(dec!(60000));
        product.price_fake = Some(dec!(30000));
        product.normalize_prices();

        assert_eq!(product.price_fake, Some(dec!(60000)));
        assert_eq!(product.price_real, dec!(30000));
    }

    #[test]
    fn discount_reflects_price_gap() {
        let mut product = test_product(dec!(90000));
        product.price_fake = Some(dec!(120000));
        product.normalize_prices();

        assert_eq!(product.discount_percentage(), dec!(0.25));
    }

    #[test]
    fn discount_is_zero_without_fake_price() {
        let product = test_product(dec!(50000));
        assert_eq!(product.discount_percentage(), Decimal::ZERO);
    }

    #[test]
    fn validate_rejects_price_below_minimum() {
        let product = test_product(dec!(99.99));
        let err = product.validate_prices().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn validate_rejects_fake_price_below_minimum() {
        let mut product = test_product(dec!(500));
        product.price_fake = Some(dec!(50));
        let err = product.validate_prices().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn validate_accepts_minimum_price() {
        let product = test_product(dec!(100));
        product.validate_prices().unwrap();
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: after normalization, `price_real <= price_fake`
            /// whatever the inputs were.
            #[test]
            fn real_never_exceeds_fake_after_normalization(
                real in 100u32..10_000_000,
                fake in proptest::option::of(100u32..10_000_000),
            ) {
                let mut product = test_product(Decimal::from(real));
                product.price_fake = fake.map(Decimal::from);
                product.normalize_prices();

                let fake = product.price_fake.unwrap();
                prop_assert!(product.price_real <= fake);
            }

            /// Property: the discount of a normalized product lies in `[0, 1)`
            /// and equals `1 - real/fake`.
            #[test]
            fn discount_stays_in_unit_interval(
                real in 100u32..10_000_000,
                fake in 100u32..10_000_000,
            ) {
                let mut product = test_product(Decimal::from(real));
                product.price_fake = Some(Decimal::from(fake));
                product.normalize_prices();

                let discount = product.discount_percentage();
                let fake = product.price_fake.unwrap();
                prop_assert_eq!(discount, Decimal::ONE - product.price_real / fake);
                prop_assert!(discount >= Decimal::ZERO);
                prop_assert!(discount < Decimal::ONE);
            }
        }
    }
}
