//! `skuhub-catalog` — product catalog entities and their save-time rules.
//!
//! Categories form a self-referential tree with a materialized `path`;
//! products and item variants carry a displayed "original" price
//! (`price_fake`) alongside the actual selling price (`price_real`), kept
//! consistent by explicit normalization rules the store runs before every
//! write.

pub mod category;
pub mod item;
pub mod product;

pub use category::{Category, CategoryId};
pub use item::{Item, ItemId};
pub use product::{min_price, Product, ProductId, PurchaseUrl};
