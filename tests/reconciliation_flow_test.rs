//! End-to-end reconciliation flows over the in-memory store: availability
//! checks, deduction, restoration and the structured mutation outcome.

mod common;

use std::collections::HashMap;
use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use proptest::prelude::*;
use uuid::Uuid;

use common::{order_line, recipe_entry, stock};
use pos_core::errors::ServiceError;
use pos_core::models::{IngredientStock, RecipeEntry, UsageType};
use pos_core::repositories::memory::InMemoryStore;
use pos_core::repositories::{InventoryStore, RecipeStore};
use pos_core::services::costing;
use pos_core::services::reconciliation::ReconciliationService;

fn service(store: &Arc<InMemoryStore>) -> ReconciliationService<InMemoryStore, InMemoryStore> {
    ReconciliationService::new(Arc::clone(store), Arc::clone(store))
}

#[tokio::test]
async fn deduct_aggregates_usage_across_lines_and_menu_items() {
    let store = Arc::new(InMemoryStore::new());
    let menu_a = Uuid::new_v4();
    let menu_b = Uuid::new_v4();
    let shared = Uuid::new_v4();
    let eggs = Uuid::new_v4();

    store.insert_recipe_entry(recipe_entry(menu_a, shared, 2.5, UsageType::PerOrder));
    store.insert_recipe_entry(recipe_entry(menu_b, shared, 1.0, UsageType::PerOrder));
    store.insert_recipe_entry(recipe_entry(menu_a, eggs, 1.0, UsageType::PerOrder));
    store.insert_stock(stock(shared, "Flour", 10.0));
    store.insert_stock(stock(eggs, "Eggs", 20.0));

    let order_id = Uuid::new_v4();
    let lines = vec![order_line(order_id, menu_a, 2), order_line(order_id, menu_b, 1)];

    let outcome = service(&store)
        .deduct_inventory_for_order(&lines)
        .await
        .expect("deduct");

    assert!(outcome.fully_applied());
    assert_eq!(outcome.applied.len(), 2);
    assert!(outcome.missing.is_empty());

    // shared: 10 - (2.5*2 + 1.0*1) = 4, eggs: 20 - (1.0*2) = 18
    assert_eq!(store.stock_quantity(&shared), Some(4.0));
    assert_eq!(store.stock_quantity(&eggs), Some(18.0));

    let flour_change = outcome
        .applied
        .iter()
        .find(|c| c.ingredient_id == shared)
        .expect("flour change");
    assert_eq!(flour_change.previous_quantity, 10.0);
    assert_eq!(flour_change.new_quantity, 4.0);
    assert_eq!(flour_change.delta, -6.0);
}

#[tokio::test]
async fn restore_is_the_exact_inverse_of_deduct() {
    let store = Arc::new(InMemoryStore::new());
    let menu = Uuid::new_v4();
    let flour = Uuid::new_v4();
    store.insert_recipe_entry(recipe_entry(menu, flour, 2.5, UsageType::PerOrder));
    store.insert_stock(stock(flour, "Flour", 10.0));

    let svc = service(&store);
    let lines = vec![order_line(Uuid::new_v4(), menu, 2)];

    svc.deduct_inventory_for_order(&lines).await.expect("deduct");
    assert_eq!(store.stock_quantity(&flour), Some(5.0));

    svc.restore_inventory_for_order(&lines).await.expect("restore");
    assert_eq!(store.stock_quantity(&flour), Some(10.0));
}

#[test]
fn deduct_restore_round_trip_preserves_stock() {
    proptest!(|(initial in 0.0f64..1000.0, usage in 0.0f64..100.0)| {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let store = Arc::new(InMemoryStore::new());
            let menu = Uuid::new_v4();
            let flour = Uuid::new_v4();
            store.insert_recipe_entry(recipe_entry(menu, flour, usage, UsageType::PerOrder));
            store.insert_stock(stock(flour, "Flour", initial));

            let svc = service(&store);
            let lines = vec![order_line(Uuid::new_v4(), menu, 1)];
            svc.deduct_inventory_for_order(&lines).await.unwrap();
            svc.restore_inventory_for_order(&lines).await.unwrap();

            let final_quantity = store.stock_quantity(&flour).unwrap();
            prop_assert!((final_quantity - initial).abs() < 1e-9);
            Ok(())
        })?;
    });
}

#[tokio::test]
async fn availability_boundary_is_inclusive() {
    let store = Arc::new(InMemoryStore::new());
    let menu = Uuid::new_v4();
    let flour = Uuid::new_v4();
    store.insert_recipe_entry(recipe_entry(menu, flour, 5.0, UsageType::PerOrder));
    store.insert_stock(stock(flour, "Flour", 5.0));

    let svc = service(&store);
    let lines = vec![order_line(Uuid::new_v4(), menu, 1)];

    // exactly enough stock is available, not a shortfall
    let report = svc.check_availability(&lines).await.expect("check");
    assert!(report.is_available);
    assert!(report.shortfalls.is_empty());

    store.insert_stock(stock(flour, "Flour", 4.999));
    let report = svc.check_availability(&lines).await.expect("check");
    assert!(!report.is_available);
    assert_eq!(report.shortfalls.len(), 1);
    let shortfall = &report.shortfalls[0];
    assert_eq!(shortfall.ingredient_id, flour);
    assert_eq!(shortfall.ingredient_name, "Flour");
    assert_eq!(shortfall.required, 5.0);
    assert_eq!(shortfall.available, 4.999);
}

#[tokio::test]
async fn order_with_no_resolvable_recipes_is_trivially_available() {
    let store = Arc::new(InMemoryStore::new());
    // no recipe entries at all: nothing to require, nothing to check
    let lines = vec![order_line(Uuid::new_v4(), Uuid::new_v4(), 2)];

    let report = service(&store).check_availability(&lines).await.expect("check");
    assert!(report.is_available);
    assert!(report.shortfalls.is_empty());
}

#[tokio::test]
async fn untracked_ingredients_never_block_an_order() {
    let store = Arc::new(InMemoryStore::new());
    let menu = Uuid::new_v4();
    let untracked = Uuid::new_v4();
    store.insert_recipe_entry(recipe_entry(menu, untracked, 100.0, UsageType::PerOrder));

    let svc = service(&store);
    let lines = vec![order_line(Uuid::new_v4(), menu, 1)];

    let report = svc.check_availability(&lines).await.expect("check");
    assert!(report.is_available);

    // deduction records the miss but still succeeds
    let outcome = svc.deduct_inventory_for_order(&lines).await.expect("deduct");
    assert!(outcome.applied.is_empty());
    assert_eq!(outcome.missing, vec![untracked]);
    assert!(outcome.fully_applied());
}

#[tokio::test]
async fn batch_only_orders_cause_zero_stock_writes_but_nonzero_cost() {
    let store = Arc::new(InMemoryStore::new());
    let menu = Uuid::new_v4();
    let sauce = Uuid::new_v4();
    let mut batch = recipe_entry(menu, sauce, 0.0, UsageType::PerBatch);
    batch.purchase_price = 300.0;
    store.insert_recipe_entry(batch.clone());
    store.insert_stock(stock(sauce, "Cheese Sauce", 50.0));

    let svc = service(&store);
    let lines = vec![order_line(Uuid::new_v4(), menu, 3)];

    let outcome = svc.deduct_inventory_for_order(&lines).await.expect("deduct");
    assert!(outcome.applied.is_empty());
    assert!(outcome.missing.is_empty());
    assert_eq!(store.stock_quantity(&sauce), Some(50.0));

    let servings = HashMap::from([(sauce, 100.0)]);
    let cost = costing::ingredient_cost_per_order_with_batches(&[batch], &servings, 2);
    assert_eq!(cost, 3.0);
}

#[tokio::test]
async fn zero_quantity_lines_change_nothing() {
    let store = Arc::new(InMemoryStore::new());
    let menu = Uuid::new_v4();
    let flour = Uuid::new_v4();
    store.insert_recipe_entry(recipe_entry(menu, flour, 2.0, UsageType::PerOrder));
    store.insert_stock(stock(flour, "Flour", 10.0));

    let outcome = service(&store)
        .deduct_inventory_for_order(&[order_line(Uuid::new_v4(), menu, 0)])
        .await
        .expect("deduct");

    // zero aggregated usage is short-circuited, no write happens
    assert!(outcome.applied.is_empty());
    assert_eq!(store.stock_quantity(&flour), Some(10.0));
}

#[tokio::test]
async fn impact_summary_projects_remaining_stock() {
    let store = Arc::new(InMemoryStore::new());
    let menu = Uuid::new_v4();
    let flour = Uuid::new_v4();
    store.insert_recipe_entry(recipe_entry(menu, flour, 2.5, UsageType::PerOrder));
    store.insert_stock(stock(flour, "Flour", 10.0));

    let impacts = service(&store)
        .inventory_impact_summary(&[order_line(Uuid::new_v4(), menu, 2)])
        .await
        .expect("summary");

    assert_eq!(impacts.len(), 1);
    assert_eq!(impacts[0].current_stock, 10.0);
    assert_eq!(impacts[0].usage, 5.0);
    assert_eq!(impacts[0].remaining_stock, 5.0);
    // nothing was mutated
    assert_eq!(store.stock_quantity(&flour), Some(10.0));
}

/// Recipe store whose fetches always fail at the transport level.
struct FailingRecipeStore;

#[async_trait]
impl RecipeStore for FailingRecipeStore {
    async fn fetch_all_recipe_entries(&self) -> Result<Vec<RecipeEntry>, ServiceError> {
        Err(ServiceError::StoreError("recipe store unreachable".into()))
    }

    async fn fetch_recipe_entries_for_menu_items(
        &self,
        _menu_item_ids: &[Uuid],
    ) -> Result<Vec<RecipeEntry>, ServiceError> {
        Err(ServiceError::StoreError("recipe store unreachable".into()))
    }
}

#[tokio::test]
async fn recipe_fetch_failure_aborts_with_no_writes() {
    let inventory = Arc::new(InMemoryStore::new());
    let flour = Uuid::new_v4();
    inventory.insert_stock(stock(flour, "Flour", 10.0));

    let svc = ReconciliationService::new(Arc::new(FailingRecipeStore), Arc::clone(&inventory));
    let lines = vec![order_line(Uuid::new_v4(), Uuid::new_v4(), 2)];

    let result = svc.deduct_inventory_for_order(&lines).await;
    assert_matches!(result, Err(ServiceError::StoreError(_)));
    assert_eq!(inventory.stock_quantity(&flour), Some(10.0));

    let result = svc.check_availability(&lines).await;
    assert_matches!(result, Err(ServiceError::StoreError(_)));
}

/// Inventory store that refuses writes for one ingredient, to exercise the
/// partial-failure path.
struct FlakyInventoryStore {
    inner: InMemoryStore,
    reject: Uuid,
}

#[async_trait]
impl InventoryStore for FlakyInventoryStore {
    async fn fetch_ingredient_stock(
        &self,
        ingredient_id: Uuid,
    ) -> Result<Option<IngredientStock>, ServiceError> {
        self.inner.fetch_ingredient_stock(ingredient_id).await
    }

    async fn fetch_all_ingredient_stock(&self) -> Result<Vec<IngredientStock>, ServiceError> {
        self.inner.fetch_all_ingredient_stock().await
    }

    async fn persist_ingredient_stock(
        &self,
        stock: IngredientStock,
    ) -> Result<(), ServiceError> {
        if stock.id == self.reject {
            return Err(ServiceError::StoreError("write rejected".into()));
        }
        self.inner.persist_ingredient_stock(stock).await
    }
}

#[tokio::test]
async fn write_failure_is_recorded_and_other_ingredients_proceed() {
    let menu = Uuid::new_v4();
    let flour = Uuid::new_v4();
    let eggs = Uuid::new_v4();

    let recipes = Arc::new(InMemoryStore::new());
    recipes.insert_recipe_entry(recipe_entry(menu, flour, 1.0, UsageType::PerOrder));
    recipes.insert_recipe_entry(recipe_entry(menu, eggs, 2.0, UsageType::PerOrder));

    let inventory = Arc::new(FlakyInventoryStore {
        inner: InMemoryStore::new(),
        reject: flour,
    });
    inventory.inner.insert_stock(stock(flour, "Flour", 10.0));
    inventory.inner.insert_stock(stock(eggs, "Eggs", 10.0));

    let svc = ReconciliationService::new(recipes, Arc::clone(&inventory));
    let outcome = svc
        .deduct_inventory_for_order(&[order_line(Uuid::new_v4(), menu, 1)])
        .await
        .expect("deduct itself succeeds");

    assert!(!outcome.fully_applied());
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].ingredient_id, flour);
    assert_eq!(outcome.applied.len(), 1);
    assert_eq!(outcome.applied[0].ingredient_id, eggs);

    // the failed ingredient kept its stock, the other one was deducted
    assert_eq!(inventory.inner.stock_quantity(&flour), Some(10.0));
    assert_eq!(inventory.inner.stock_quantity(&eggs), Some(8.0));
}
