//! Fluxo API Library
//!
//! This crate provides the business services for multi-tenant reseller
//! order management: each reseller owns its clients and products, and
//! orders are validated against that ownership.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod logging;
pub mod services;

use sea_orm::DatabaseConnection;
use services::orders::OrderService;
use std::sync::Arc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub orders: Arc<OrderService>,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        let orders = Arc::new(OrderService::new(db.clone()));
        Self { db, config, orders }
    }

    pub fn order_service(&self) -> Arc<OrderService> {
        self.orders.clone()
    }
}
