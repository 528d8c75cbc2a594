//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;
use uuid::Uuid;

use pos_core::models::{
    IngredientStock, Order, OrderLine, OrderStatus, PaymentMethod, RecipeEntry, UsageType,
};

pub fn recipe_entry(
    menu_item_id: Uuid,
    ingredient_id: Uuid,
    usage_per_order: f64,
    usage_type: UsageType,
) -> RecipeEntry {
    RecipeEntry {
        id: Uuid::new_v4(),
        menu_item_id,
        ingredient_id,
        usage_per_order,
        usage_type,
        purchase_price: 100.0,
        purchase_quantity: 10.0,
        purchase_unit: "kg".to_string(),
        created_at: None,
        updated_at: None,
    }
}

pub fn stock(ingredient_id: Uuid, name: &str, quantity: f64) -> IngredientStock {
    IngredientStock {
        id: ingredient_id,
        name: name.to_string(),
        unit: "kg".to_string(),
        quantity,
        reorder_level: 2.0,
        supplier_id: Some(Uuid::new_v4()),
        is_active: Some(true),
    }
}

pub fn order_line(order_id: Uuid, menu_item_id: Uuid, quantity: u32) -> OrderLine {
    OrderLine {
        id: Uuid::new_v4(),
        order_id: Some(order_id),
        menu_item_id: Some(menu_item_id),
        quantity,
        subtotal: dec!(50),
        created_at: Some(Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()),
    }
}

pub fn pending_order(order_id: Uuid) -> Order {
    Order {
        id: order_id,
        status: OrderStatus::Pending,
        total_amount: dec!(100),
        payment_method: PaymentMethod::Cash,
        created_at: Some(Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()),
    }
}
