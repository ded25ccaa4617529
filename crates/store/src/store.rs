use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{RwLock, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::{CryptoRng, Rng};
use tracing::{debug, warn};

use skuhub_catalog::{Category, CategoryId, Item, ItemId, Product, ProductId};
use skuhub_core::{DomainError, Entity, RecordMeta, UserId};
use skuhub_inventory::{BatchCode, Inventory, InventoryId};
use skuhub_supply::{
    PaymentMethodId, Supplier, SupplierId, SupplyOrder, SupplyOrderDetail, SupplyOrderDetailId,
    SupplyOrderId, SupplyPaymentMethod,
};

use crate::error::{StoreError, StoreResult};

/// Bound on the batch-code rejection-sampling loop. An unbounded loop is an
/// availability risk once a category prefix fills up; past this many
/// collisions the save fails loudly instead.
pub const MAX_BATCH_CODE_ATTEMPTS: u32 = 10;

#[derive(Debug, Default)]
struct Tables {
    categories: HashMap<CategoryId, Category>,
    products: HashMap<ProductId, Product>,
    items: HashMap<ItemId, Item>,
    suppliers: HashMap<SupplierId, Supplier>,
    payment_methods: HashMap<PaymentMethodId, SupplyPaymentMethod>,
    orders: HashMap<SupplyOrderId, SupplyOrder>,
    order_details: HashMap<SupplyOrderDetailId, SupplyOrderDetail>,
    inventories: HashMap<InventoryId, Inventory>,
}

impl Tables {
    /// Soft-deleted batches keep their code reserved, so the scan covers
    /// every row, live or not.
    fn batch_code_taken(&self, code: &BatchCode, except: InventoryId) -> bool {
        self.inventories
            .values()
            .any(|i| i.id != except && i.batch_code.as_ref() == Some(code))
    }

    fn live_details_of(&self, order: SupplyOrderId) -> Vec<SupplyOrderDetail> {
        self.order_details
            .values()
            .filter(|d| d.order == order && !d.meta.is_deleted())
            .cloned()
            .collect()
    }
}

/// In-memory store keyed by typed ids.
///
/// Each save resolves references, runs the entity's derivation rule,
/// enforces uniqueness and commits the record, all-or-nothing, under a
/// single write lock.
#[derive(Debug, Default)]
pub struct Store {
    tables: RwLock<Tables>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(|_| StoreError::LockPoisoned)
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(|_| StoreError::LockPoisoned)
    }

    // ----- catalog -----

    pub fn save_category(
        &self,
        mut category: Category,
        actor: Option<UserId>,
    ) -> StoreResult<Category> {
        let mut t = self.write()?;

        let parent = match category.parent {
            Some(parent_id) if parent_id != category.id => Some(
                t.categories
                    .get(&parent_id)
                    .filter(|c| !c.meta.is_deleted())
                    .cloned()
                    .ok_or(DomainError::NotFound)?,
            ),
            _ => None,
        };
        category.resolve(parent.as_ref())?;

        // Uniqueness backstop on code and name. Soft-deleted rows still hold
        // their slot, as they would under a database unique index.
        let this_id = category.id;
        for other in t.categories.values().filter(|c| c.id != this_id) {
            if other.code == category.code {
                return Err(StoreError::UniqueViolation {
                    entity: "category",
                    field: "code",
                    value: category.code.clone(),
                });
            }
            if other.name == category.name {
                return Err(StoreError::UniqueViolation {
                    entity: "category",
                    field: "name",
                    value: category.name.clone(),
                });
            }
        }

        let prev = t.categories.get(&category.id).map(|c| c.meta.clone());
        stamp(&mut category, prev, Utc::now(), actor);
        debug!(id = %category.id, path = %category.path, "saving category");
        t.categories.insert(category.id, category.clone());
        Ok(category)
    }

    pub fn save_product(
        &self,
        mut product: Product,
        actor: Option<UserId>,
    ) -> StoreResult<Product> {
        let mut t = self.write()?;

        if let Some(category_id) = product.category {
            t.categories
                .get(&category_id)
                .filter(|c| !c.meta.is_deleted())
                .ok_or(DomainError::NotFound)?;
        }

        product.validate_prices()?;
        product.normalize_prices();

        let prev = t.products.get(&product.id).map(|p| p.meta.clone());
        stamp(&mut product, prev, Utc::now(), actor);
        debug!(id = %product.id, "saving product");
        t.products.insert(product.id, product.clone());
        Ok(product)
    }

    pub fn save_item(&self, mut item: Item, actor: Option<UserId>) -> StoreResult<Item> {
        let mut t = self.write()?;

        let product = t
            .products
            .get(&item.product)
            .filter(|p| !p.meta.is_deleted())
            .cloned()
            .ok_or(DomainError::NotFound)?;

        item.validate_prices()?;
        item.normalize_prices(&product)?;

        let prev = t.items.get(&item.id).map(|i| i.meta.clone());
        stamp(&mut item, prev, Utc::now(), actor);
        debug!(id = %item.id, product = %item.product, "saving item");
        t.items.insert(item.id, item.clone());
        Ok(item)
    }

    // ----- supply -----

    pub fn save_supplier(
        &self,
        mut supplier: Supplier,
        actor: Option<UserId>,
    ) -> StoreResult<Supplier> {
        let mut t = self.write()?;
        supplier.validate()?;
        let prev = t.suppliers.get(&supplier.id).map(|s| s.meta.clone());
        stamp(&mut supplier, prev, Utc::now(), actor);
        t.suppliers.insert(supplier.id, supplier.clone());
        Ok(supplier)
    }

    pub fn save_payment_method(
        &self,
        mut method: SupplyPaymentMethod,
        actor: Option<UserId>,
    ) -> StoreResult<SupplyPaymentMethod> {
        let mut t = self.write()?;
        method.validate()?;
        let prev = t.payment_methods.get(&method.id).map(|m| m.meta.clone());
        stamp(&mut method, prev, Utc::now(), actor);
        t.payment_methods.insert(method.id, method.clone());
        Ok(method)
    }

    pub fn save_supply_order(
        &self,
        mut order: SupplyOrder,
        actor: Option<UserId>,
    ) -> StoreResult<SupplyOrder> {
        let mut t = self.write()?;

        t.suppliers
            .get(&order.supplier)
            .filter(|s| !s.meta.is_deleted())
            .ok_or(DomainError::NotFound)?;
        t.payment_methods
            .get(&order.payment_method)
            .filter(|m| !m.meta.is_deleted())
            .ok_or(DomainError::NotFound)?;

        order.validate()?;
        let details = t.live_details_of(order.id);
        order.recompute(&details)?;

        let prev = t.orders.get(&order.id).map(|o| o.meta.clone());
        stamp(&mut order, prev, Utc::now(), actor);
        debug!(id = %order.id, total = %order.total, "saving supply order");
        t.orders.insert(order.id, order.clone());
        Ok(order)
    }

    /// Save a line and refresh the owning order's derived totals in the same
    /// atomic step.
    pub fn save_order_detail(
        &self,
        mut detail: SupplyOrderDetail,
        actor: Option<UserId>,
    ) -> StoreResult<SupplyOrderDetail> {
        let mut t = self.write()?;

        let mut order = t
            .orders
            .get(&detail.order)
            .filter(|o| !o.meta.is_deleted())
            .cloned()
            .ok_or(DomainError::NotFound)?;
        t.items
            .get(&detail.item)
            .filter(|i| !i.meta.is_deleted())
            .ok_or(DomainError::NotFound)?;

        detail.validate()?;
        detail.recompute();

        let now = Utc::now();
        let prev = t.order_details.get(&detail.id).map(|d| d.meta.clone());
        stamp(&mut detail, prev, now, actor);
        t.order_details.insert(detail.id, detail.clone());

        let details = t.live_details_of(order.id);
        order.recompute(&details)?;
        order.meta.touch(now, actor);
        debug!(id = %detail.id, order = %order.id, order_total = %order.total, "saving order detail");
        t.orders.insert(order.id, order);
        Ok(detail)
    }

    // ----- inventory -----

    pub fn save_inventory(
        &self,
        mut inventory: Inventory,
        actor: Option<UserId>,
    ) -> StoreResult<Inventory> {
        let mut t = self.write()?;

        let item = t
            .items
            .get(&inventory.item)
            .filter(|i| !i.meta.is_deleted())
            .cloned()
            .ok_or(DomainError::NotFound)?;
        // Provenance may point at a line that was since soft-deleted; it only
        // has to have existed.
        if !t.order_details.contains_key(&inventory.source_detail) {
            return Err(DomainError::NotFound.into());
        }

        let prev_code = t
            .inventories
            .get(&inventory.id)
            .and_then(|e| e.batch_code.clone());
        match (inventory.batch_code.clone(), prev_code) {
            (Some(code), Some(prev)) => {
                if code != prev {
                    return Err(
                        DomainError::conflict("batch_code is immutable once assigned").into()
                    );
                }
            }
            // Callers may drop the code from an update payload; keep the
            // assigned one.
            (None, Some(prev)) => inventory.batch_code = Some(prev),
            // A caller-chosen code (e.g. a data import) is accepted but never
            // retried: a collision here is genuine duplicate data.
            (Some(code), None) => {
                if t.batch_code_taken(&code, inventory.id) {
                    return Err(StoreError::UniqueViolation {
                        entity: "inventory",
                        field: "batch_code",
                        value: code.to_string(),
                    });
                }
            }
            (None, None) => {
                let product = t
                    .products
                    .get(&item.product)
                    .ok_or(DomainError::NotFound)?;
                let category_id = product.category.ok_or_else(|| {
                    DomainError::invariant(
                        "product has no category; cannot derive a batch code prefix",
                    )
                })?;
                let prefix = t
                    .categories
                    .get(&category_id)
                    .ok_or(DomainError::NotFound)?
                    .code
                    .clone();
                // Check-and-insert happen under the same write lock, so the
                // pre-check below carries the storage-level uniqueness
                // guarantee; a colliding draw is simply redrawn.
                let code = issue_batch_code(
                    &prefix,
                    |candidate| t.batch_code_taken(candidate, inventory.id),
                    &mut OsRng,
                )?;
                inventory.batch_code = Some(code);
            }
        }

        inventory.recompute()?;

        let prev = t.inventories.get(&inventory.id).map(|i| i.meta.clone());
        stamp(&mut inventory, prev, Utc::now(), actor);
        debug!(
            id = %inventory.id,
            batch_code = %inventory.batch_code.as_ref().map(|c| c.as_str()).unwrap_or("-"),
            stock = inventory.stock,
            "saving inventory batch"
        );
        t.inventories.insert(inventory.id, inventory.clone());
        Ok(inventory)
    }

    // ----- reads (soft-deleted rows are invisible) -----

    pub fn get_category(&self, id: CategoryId) -> StoreResult<Option<Category>> {
        Ok(live(self.read()?.categories.get(&id)))
    }

    pub fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        Ok(live(self.read()?.products.get(&id)))
    }

    pub fn get_item(&self, id: ItemId) -> StoreResult<Option<Item>> {
        Ok(live(self.read()?.items.get(&id)))
    }

    pub fn get_supplier(&self, id: SupplierId) -> StoreResult<Option<Supplier>> {
        Ok(live(self.read()?.suppliers.get(&id)))
    }

    pub fn get_payment_method(
        &self,
        id: PaymentMethodId,
    ) -> StoreResult<Option<SupplyPaymentMethod>> {
        Ok(live(self.read()?.payment_methods.get(&id)))
    }

    pub fn get_supply_order(&self, id: SupplyOrderId) -> StoreResult<Option<SupplyOrder>> {
        Ok(live(self.read()?.orders.get(&id)))
    }

    pub fn get_order_detail(
        &self,
        id: SupplyOrderDetailId,
    ) -> StoreResult<Option<SupplyOrderDetail>> {
        Ok(live(self.read()?.order_details.get(&id)))
    }

    pub fn get_inventory(&self, id: InventoryId) -> StoreResult<Option<Inventory>> {
        Ok(live(self.read()?.inventories.get(&id)))
    }

    pub fn order_details(&self, order: SupplyOrderId) -> StoreResult<Vec<SupplyOrderDetail>> {
        Ok(self.read()?.live_details_of(order))
    }

    pub fn find_inventory_by_batch_code(
        &self,
        code: &BatchCode,
    ) -> StoreResult<Option<Inventory>> {
        Ok(self
            .read()?
            .inventories
            .values()
            .find(|i| !i.meta.is_deleted() && i.batch_code.as_ref() == Some(code))
            .cloned())
    }

    // ----- soft deletes -----

    pub fn delete_category(&self, id: CategoryId, actor: Option<UserId>) -> StoreResult<()> {
        soft_delete(&mut self.write()?.categories, &id, Utc::now(), actor)
    }

    pub fn delete_product(&self, id: ProductId, actor: Option<UserId>) -> StoreResult<()> {
        soft_delete(&mut self.write()?.products, &id, Utc::now(), actor)
    }

    pub fn delete_item(&self, id: ItemId, actor: Option<UserId>) -> StoreResult<()> {
        soft_delete(&mut self.write()?.items, &id, Utc::now(), actor)
    }

    pub fn delete_supplier(&self, id: SupplierId, actor: Option<UserId>) -> StoreResult<()> {
        soft_delete(&mut self.write()?.suppliers, &id, Utc::now(), actor)
    }

    pub fn delete_payment_method(
        &self,
        id: PaymentMethodId,
        actor: Option<UserId>,
    ) -> StoreResult<()> {
        soft_delete(&mut self.write()?.payment_methods, &id, Utc::now(), actor)
    }

    /// Deleting an order cascades to its detail lines.
    pub fn delete_supply_order(&self, id: SupplyOrderId, actor: Option<UserId>) -> StoreResult<()> {
        let mut t = self.write()?;
        let now = Utc::now();
        soft_delete(&mut t.orders, &id, now, actor)?;
        for detail in t
            .order_details
            .values_mut()
            .filter(|d| d.order == id && !d.meta.is_deleted())
        {
            detail.meta.mark_deleted(now, actor);
        }
        Ok(())
    }

    /// Deleting a line refreshes the owning order's derived totals.
    pub fn delete_order_detail(
        &self,
        id: SupplyOrderDetailId,
        actor: Option<UserId>,
    ) -> StoreResult<()> {
        let mut t = self.write()?;
        let now = Utc::now();
        let order_id = t
            .order_details
            .get(&id)
            .filter(|d| !d.meta.is_deleted())
            .map(|d| d.order)
            .ok_or(DomainError::NotFound)?;
        soft_delete(&mut t.order_details, &id, now, actor)?;

        if let Some(mut order) = t.orders.get(&order_id).cloned() {
            let details = t.live_details_of(order_id);
            order.recompute(&details)?;
            order.meta.touch(now, actor);
            t.orders.insert(order_id, order);
        }
        Ok(())
    }

    pub fn delete_inventory(&self, id: InventoryId, actor: Option<UserId>) -> StoreResult<()> {
        soft_delete(&mut self.write()?.inventories, &id, Utc::now(), actor)
    }
}

/// Stamp audit metadata: fresh attribution on first persist, preserved
/// creation fields on updates.
fn stamp<E: Entity>(
    record: &mut E,
    prev: Option<RecordMeta>,
    now: DateTime<Utc>,
    actor: Option<UserId>,
) {
    match prev {
        Some(prev) => {
            let meta = record.meta_mut();
            meta.created_at = prev.created_at;
            meta.created_by = prev.created_by;
            meta.deleted = prev.deleted;
            meta.deleted_at = prev.deleted_at;
            meta.updated_by = prev.updated_by;
            meta.touch(now, actor);
        }
        None => record.meta_mut().stamp_created(now, actor),
    }
}

fn live<E: Entity + Clone>(record: Option<&E>) -> Option<E> {
    record.filter(|r| !r.meta().is_deleted()).cloned()
}

fn soft_delete<K: Eq + Hash, E: Entity>(
    map: &mut HashMap<K, E>,
    id: &K,
    now: DateTime<Utc>,
    actor: Option<UserId>,
) -> StoreResult<()> {
    let record = map
        .get_mut(id)
        .filter(|r| !r.meta().is_deleted())
        .ok_or(DomainError::NotFound)?;
    record.meta_mut().mark_deleted(now, actor);
    Ok(())
}

/// Rejection-sampling loop for a fresh batch code under `prefix`.
///
/// `taken` is the storage-side uniqueness check; a hit means the draw lost
/// and is redrawn with fresh randomness, up to [`MAX_BATCH_CODE_ATTEMPTS`]
/// times.
fn issue_batch_code<R: Rng + CryptoRng>(
    prefix: &str,
    taken: impl Fn(&BatchCode) -> bool,
    rng: &mut R,
) -> StoreResult<BatchCode> {
    for attempt in 1..=MAX_BATCH_CODE_ATTEMPTS {
        let candidate = BatchCode::generate(prefix, rng)?;
        if taken(&candidate) {
            warn!(%candidate, attempt, "batch code collision, redrawing");
            continue;
        }
        return Ok(candidate);
    }
    Err(StoreError::BatchCodeSpaceExhausted {
        prefix: prefix.to_string(),
        attempts: MAX_BATCH_CODE_ATTEMPTS,
    })
}
