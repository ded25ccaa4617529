//! `skuhub-inventory` — warehouse inventory batches.
//!
//! A batch is one discrete lot received from one supply-order line, tracked
//! under a unique seven-character batch code. The code is drawn from a
//! cryptographically unpredictable source because it doubles as an
//! externally visible identifier.

pub mod batch;
pub mod batch_code;

pub use batch::{BatchState, Inventory, InventoryId};
pub use batch_code::{BatchCode, BATCH_CODE_LEN, SUFFIX_COMBINATIONS};
