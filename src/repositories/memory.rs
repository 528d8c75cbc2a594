//! Seedable in-memory store, primarily for tests and single-process
//! deployments without a remote backend.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{IngredientStock, Order, OrderLine, RecipeEntry};

use super::{InventoryStore, OrderStore, RecipeStore};

/// In-memory implementation of all three store traits over concurrent maps.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    recipes: DashMap<Uuid, RecipeEntry>,
    stock: DashMap<Uuid, IngredientStock>,
    orders: DashMap<Uuid, Order>,
    order_lines: DashMap<Uuid, Vec<OrderLine>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_recipe_entry(&self, entry: RecipeEntry) {
        self.recipes.insert(entry.id, entry);
    }

    pub fn insert_stock(&self, stock: IngredientStock) {
        self.stock.insert(stock.id, stock);
    }

    pub fn insert_order(&self, order: Order, lines: Vec<OrderLine>) {
        self.order_lines.insert(order.id, lines);
        self.orders.insert(order.id, order);
    }

    /// Current stock quantity, for test assertions.
    pub fn stock_quantity(&self, ingredient_id: &Uuid) -> Option<f64> {
        self.stock.get(ingredient_id).map(|s| s.quantity)
    }
}

#[async_trait]
impl RecipeStore for InMemoryStore {
    async fn fetch_all_recipe_entries(&self) -> Result<Vec<RecipeEntry>, ServiceError> {
        Ok(self.recipes.iter().map(|e| e.value().clone()).collect())
    }

    async fn fetch_recipe_entries_for_menu_items(
        &self,
        menu_item_ids: &[Uuid],
    ) -> Result<Vec<RecipeEntry>, ServiceError> {
        Ok(self
            .recipes
            .iter()
            .filter(|e| menu_item_ids.contains(&e.value().menu_item_id))
            .map(|e| e.value().clone())
            .collect())
    }
}

#[async_trait]
impl InventoryStore for InMemoryStore {
    async fn fetch_ingredient_stock(
        &self,
        ingredient_id: Uuid,
    ) -> Result<Option<IngredientStock>, ServiceError> {
        Ok(self.stock.get(&ingredient_id).map(|s| s.value().clone()))
    }

    async fn fetch_all_ingredient_stock(&self) -> Result<Vec<IngredientStock>, ServiceError> {
        Ok(self.stock.iter().map(|s| s.value().clone()).collect())
    }

    async fn persist_ingredient_stock(
        &self,
        stock: IngredientStock,
    ) -> Result<(), ServiceError> {
        self.stock.insert(stock.id, stock);
        Ok(())
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn fetch_order(&self, order_id: Uuid) -> Result<Option<Order>, ServiceError> {
        Ok(self.orders.get(&order_id).map(|o| o.value().clone()))
    }

    async fn fetch_order_lines(&self, order_id: Uuid) -> Result<Vec<OrderLine>, ServiceError> {
        Ok(self
            .order_lines
            .get(&order_id)
            .map(|l| l.value().clone())
            .unwrap_or_default())
    }

    async fn persist_order(&self, order: Order) -> Result<(), ServiceError> {
        self.orders.insert(order.id, order);
        Ok(())
    }
}
