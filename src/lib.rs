//! POS Core Library
//!
//! This crate provides the order fulfillment inventory reconciliation engine
//! for a retail point-of-sale back office: resolving ordered menu items to
//! their recipes, aggregating ingredient usage, checking stock availability,
//! deducting or restoring ingredient stock, and computing ingredient costs
//! and pricing suggestions for menu screens.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod errors;
pub mod events;
pub mod models;
pub mod repositories;
pub mod services;

/// Initializes the global tracing subscriber from `RUST_LOG`, falling back to
/// the given default directive. Intended for binaries and test harnesses;
/// embedders that install their own subscriber should skip this.
pub fn init_tracing(default_directive: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    // try_init so a second call (parallel tests) is a no-op
    let _ = fmt().with_env_filter(filter).try_init();
}
