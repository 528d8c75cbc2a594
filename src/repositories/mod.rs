//! Narrow async interfaces to the backing stores.
//!
//! The engine never talks to a concrete persistence mechanism; everything it
//! needs from the outside world is expressed through these three traits. The
//! production deployment implements them over the remote store's generated
//! procedures; tests and embedders can use [`memory::InMemoryStore`].

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{IngredientStock, Order, OrderLine, RecipeEntry};

pub mod memory;

/// Read access to recipe entries (menu item ↔ ingredient usage rules).
#[async_trait]
pub trait RecipeStore: Send + Sync {
    async fn fetch_all_recipe_entries(&self) -> Result<Vec<RecipeEntry>, ServiceError>;

    /// Entries for the given menu items only. Implementations may over-fetch;
    /// callers re-group by menu item regardless.
    async fn fetch_recipe_entries_for_menu_items(
        &self,
        menu_item_ids: &[Uuid],
    ) -> Result<Vec<RecipeEntry>, ServiceError>;
}

/// Read/write access to ingredient stock records.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn fetch_ingredient_stock(
        &self,
        ingredient_id: Uuid,
    ) -> Result<Option<IngredientStock>, ServiceError>;

    /// Full stock listing, used to prefetch in one round trip before a
    /// deduction/restoration pass.
    async fn fetch_all_ingredient_stock(&self) -> Result<Vec<IngredientStock>, ServiceError>;

    async fn persist_ingredient_stock(&self, stock: IngredientStock)
        -> Result<(), ServiceError>;
}

/// Read/write access to orders and their lines.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn fetch_order(&self, order_id: Uuid) -> Result<Option<Order>, ServiceError>;

    async fn fetch_order_lines(&self, order_id: Uuid) -> Result<Vec<OrderLine>, ServiceError>;

    async fn persist_order(&self, order: Order) -> Result<(), ServiceError>;
}
