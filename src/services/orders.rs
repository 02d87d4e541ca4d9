use crate::{
    db::DbPool,
    entities::{
        client::Entity as ClientEntity,
        order::{self, Entity as OrderEntity, Model as OrderModel, OrderStatus},
        order_item::{self, Entity as OrderItemEntity, Model as OrderItemModel},
        product::Entity as ProductEntity,
        reseller::Entity as ResellerEntity,
    },
    errors::ServiceError,
};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// Literal prefix of every generated order number
const ORDER_NUMBER_PREFIX: &str = "PED";

/// Timestamp layout appended to the prefix, millisecond precision,
/// 17 digits with no separators
const ORDER_NUMBER_TIME_FORMAT: &str = "%Y%m%d%H%M%S%3f";

/// Upper bound on uniqueness retries when allocating an order number
const MAX_NUMBER_ATTEMPTS: u32 = 5;

/// Request/Response types for the order service
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub client_id: Uuid,
    #[validate]
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: Uuid,
    pub number: String,
    pub reseller_id: Uuid,
    pub client_id: Uuid,
    pub status: OrderStatus,
    pub placed_at: DateTime<Utc>,
    pub total_amount: Decimal,
    pub items: Vec<OrderItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

/// Service for managing the order lifecycle of a reseller's clients
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DbPool>,
}

impl OrderService {
    /// Creates a new order service instance
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Creates a new order with its line items in one transaction.
    ///
    /// The client and every referenced product must belong to the given
    /// reseller. Unit prices are snapshotted from the products at this
    /// moment; later price changes do not affect the order.
    #[instrument(skip(self, request), fields(reseller_id = %reseller_id, client_id = %request.client_id))]
    pub async fn create_order(
        &self,
        reseller_id: Uuid,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for order creation");
            ServiceError::DatabaseError(e)
        })?;

        let reseller = ResellerEntity::find_by_id(reseller_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Reseller {} not found", reseller_id)))?;

        let client = ClientEntity::find_by_id(request.client_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Client {} not found", request.client_id))
            })?;

        if client.reseller_id != reseller.id {
            return Err(ServiceError::BusinessRule(
                "client does not belong to the given reseller".to_string(),
            ));
        }

        if request.items.is_empty() {
            return Err(ServiceError::BusinessRule(
                "order must have at least one item".to_string(),
            ));
        }

        let now = Utc::now();
        let order_id = Uuid::new_v4();

        let mut lines = Vec::with_capacity(request.items.len());
        let mut total_amount = Decimal::ZERO;

        for item in &request.items {
            let product = ProductEntity::find_by_id(item.product_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Product {} not found", item.product_id))
                })?;

            if product.reseller_id != reseller.id {
                return Err(ServiceError::BusinessRule(format!(
                    "product does not belong to the given reseller: {}",
                    product.name
                )));
            }

            let unit_price = product.price;
            let total_price = unit_price * Decimal::from(item.quantity);
            total_amount += total_price;

            lines.push(order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(product.id),
                quantity: Set(item.quantity),
                unit_price: Set(unit_price),
                total_price: Set(total_price),
                created_at: Set(now),
            });
        }

        let number = generate_order_number(&txn).await?;

        let order_model = order::ActiveModel {
            id: Set(order_id),
            number: Set(number),
            reseller_id: Set(reseller.id),
            client_id: Set(client.id),
            status: Set(OrderStatus::Pending),
            placed_at: Set(now),
            total_amount: Set(total_amount),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to create order in database");
            ServiceError::DatabaseError(e)
        })?;

        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            items.push(line.insert(&txn).await?);
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit order creation transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %order_model.id, number = %order_model.number, "Order created successfully");

        Ok(self.to_response(order_model, items))
    }

    /// Retrieves an order by ID
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db;

        let order = OrderEntity::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let items = order.find_related(OrderItemEntity).all(db).await?;

        Ok(self.to_response(order, items))
    }

    /// Retrieves an order by its unique order number
    #[instrument(skip(self), fields(number = %number))]
    pub async fn get_order_by_number(&self, number: &str) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db;

        let order = OrderEntity::find()
            .filter(order::Column::Number.eq(number))
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order with number {} not found", number))
            })?;

        let items = order.find_related(OrderItemEntity).all(db).await?;

        Ok(self.to_response(order, items))
    }

    /// Lists all orders of a reseller
    #[instrument(skip(self), fields(reseller_id = %reseller_id))]
    pub async fn list_orders_by_reseller(
        &self,
        reseller_id: Uuid,
    ) -> Result<Vec<OrderResponse>, ServiceError> {
        let db = &*self.db;

        if ResellerEntity::find_by_id(reseller_id).one(db).await?.is_none() {
            return Err(ServiceError::NotFound(format!(
                "Reseller {} not found",
                reseller_id
            )));
        }

        let orders = OrderEntity::find()
            .filter(order::Column::ResellerId.eq(reseller_id))
            .order_by_asc(order::Column::PlacedAt)
            .all(db)
            .await?;

        self.to_responses(orders).await
    }

    /// Lists all orders placed by a client
    #[instrument(skip(self), fields(client_id = %client_id))]
    pub async fn list_orders_by_client(
        &self,
        client_id: Uuid,
    ) -> Result<Vec<OrderResponse>, ServiceError> {
        let db = &*self.db;

        if ClientEntity::find_by_id(client_id).one(db).await?.is_none() {
            return Err(ServiceError::NotFound(format!(
                "Client {} not found",
                client_id
            )));
        }

        let orders = OrderEntity::find()
            .filter(order::Column::ClientId.eq(client_id))
            .order_by_asc(order::Column::PlacedAt)
            .all(db)
            .await?;

        self.to_responses(orders).await
    }

    /// Cancels a pending order.
    ///
    /// Completed and already-canceled orders reject the transition;
    /// canceling is deliberately not idempotent.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn cancel_order(&self, order_id: Uuid) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db;
        let now = Utc::now();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to start transaction for order cancellation");
            ServiceError::DatabaseError(e)
        })?;

        let order = OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                warn!(order_id = %order_id, "Order not found for cancellation");
                ServiceError::NotFound(format!("Order {} not found", order_id))
            })?;

        match order.status {
            OrderStatus::Completed => {
                return Err(ServiceError::BusinessRule(
                    "cannot cancel a completed order".to_string(),
                ))
            }
            OrderStatus::Canceled => {
                return Err(ServiceError::BusinessRule(
                    "order is already canceled".to_string(),
                ))
            }
            OrderStatus::Pending => {}
        }

        let mut active: order::ActiveModel = order.into();
        active.status = Set(OrderStatus::Canceled);
        active.updated_at = Set(Some(now));

        let updated = active.update(&txn).await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to cancel order");
            ServiceError::DatabaseError(e)
        })?;

        let items = updated.find_related(OrderItemEntity).all(&txn).await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit order cancellation transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %updated.id, number = %updated.number, "Order canceled");

        Ok(self.to_response(updated, items))
    }

    async fn to_responses(
        &self,
        orders: Vec<OrderModel>,
    ) -> Result<Vec<OrderResponse>, ServiceError> {
        let db = &*self.db;

        let mut responses = Vec::with_capacity(orders.len());
        for order in orders {
            let items = order.find_related(OrderItemEntity).all(db).await?;
            responses.push(self.to_response(order, items));
        }

        Ok(responses)
    }

    /// Converts an order model and its item models to response format
    fn to_response(&self, order: OrderModel, items: Vec<OrderItemModel>) -> OrderResponse {
        OrderResponse {
            id: order.id,
            number: order.number,
            reseller_id: order.reseller_id,
            client_id: order.client_id,
            status: order.status,
            placed_at: order.placed_at,
            total_amount: order.total_amount,
            items: items
                .into_iter()
                .map(|item| OrderItemResponse {
                    id: item.id,
                    product_id: item.product_id,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    total_price: item.total_price,
                })
                .collect(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

/// Allocates an order number that is not yet present in the store.
///
/// Numbers are timestamp-based, so two calls in the same millisecond
/// would collide; the lookup-and-bump loop resolves that against the
/// store instead of trusting the clock.
async fn generate_order_number<C: ConnectionTrait>(db: &C) -> Result<String, ServiceError> {
    let mut stamp = Utc::now();

    for _ in 0..MAX_NUMBER_ATTEMPTS {
        let candidate = format_order_number(stamp);

        let taken = OrderEntity::find()
            .filter(order::Column::Number.eq(candidate.as_str()))
            .one(db)
            .await?
            .is_some();

        if !taken {
            return Ok(candidate);
        }

        warn!(number = %candidate, "Order number already taken, retrying");
        stamp = stamp + Duration::milliseconds(1);
    }

    Err(ServiceError::InternalError(
        "could not allocate a unique order number".to_string(),
    ))
}

fn format_order_number(stamp: DateTime<Utc>) -> String {
    format!(
        "{}{}",
        ORDER_NUMBER_PREFIX,
        stamp.format(ORDER_NUMBER_TIME_FORMAT)
    )
}
