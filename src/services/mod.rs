// Reconciliation engine
pub mod reconciliation;
pub mod recipes;
pub mod usage;

// Costing and pricing
pub mod costing;

// Order status machine and order-level helpers
pub mod orders;
