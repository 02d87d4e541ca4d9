use chrono::Utc;
use fluxo_api::{
    config::AppConfig,
    db::{self, DbPool},
    entities::{
        client,
        order::{self, Entity as OrderEntity, OrderStatus},
        product, reseller,
    },
    logging, AppState,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use std::sync::Arc;
use uuid::Uuid;

/// Helper harness for spinning up an application state backed by an
/// in-memory SQLite database.
pub struct TestApp {
    pub state: AppState,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        // A single connection keeps every query on the same in-memory
        // database.
        let mut cfg = AppConfig::new("sqlite::memory:", "127.0.0.1", 18_080, "test");
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        logging::init_tracing(&cfg.log_level, cfg.log_json);

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");

        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg);

        Self { state }
    }

    pub fn db(&self) -> &DbPool {
        &self.state.db
    }

    pub async fn seed_reseller(&self, legal_name: &str) -> reseller::Model {
        let cnpj = format!("{:014}", Uuid::new_v4().as_u128() % 100_000_000_000_000);

        reseller::ActiveModel {
            id: Set(Uuid::new_v4()),
            legal_name: Set(legal_name.to_string()),
            trade_name: Set(None),
            cnpj: Set(cnpj),
            email: Set(format!(
                "{}@example.com",
                legal_name.to_lowercase().replace(' ', ".")
            )),
            phone: Set(None),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(self.db())
        .await
        .expect("seed reseller")
    }

    pub async fn seed_client(&self, reseller_id: Uuid, name: &str) -> client::Model {
        client::ActiveModel {
            id: Set(Uuid::new_v4()),
            reseller_id: Set(reseller_id),
            name: Set(name.to_string()),
            email: Set(None),
            phone: Set(None),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(self.db())
        .await
        .expect("seed client")
    }

    pub async fn seed_product(
        &self,
        reseller_id: Uuid,
        name: &str,
        price: Decimal,
    ) -> product::Model {
        product::ActiveModel {
            id: Set(Uuid::new_v4()),
            reseller_id: Set(reseller_id),
            name: Set(name.to_string()),
            description: Set(None),
            price: Set(price),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(self.db())
        .await
        .expect("seed product")
    }

    /// Flips an order to completed directly in the store, standing in for
    /// the external completion flow.
    pub async fn mark_order_completed(&self, order_id: Uuid) {
        let existing = OrderEntity::find_by_id(order_id)
            .one(self.db())
            .await
            .expect("query order")
            .expect("order should exist");

        let mut active: order::ActiveModel = existing.into();
        active.status = Set(OrderStatus::Completed);
        active.updated_at = Set(Some(Utc::now()));
        active.update(self.db()).await.expect("mark order completed");
    }
}
