//! Order persistence.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use orderdesk_common::{NewOrder, Order, OrderError, OrderId, OrderStatus, Result};

/// Record store for orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Validate and insert a new order, assigning its id.
    async fn create(&self, request: NewOrder) -> Result<Order>;

    /// Get an order by id.
    async fn get(&self, id: OrderId) -> Result<Option<Order>>;

    /// Change an order's status, returning the updated order.
    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<Order>;

    /// List orders by ascending id, optionally only those with `status`.
    async fn list(&self, status: Option<OrderStatus>) -> Result<Vec<Order>>;
}

/// Order store held in process memory.
pub struct InMemoryOrderStore {
    orders: DashMap<OrderId, Order>,
    next_id: AtomicI64,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self {
            orders: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

impl Default for InMemoryOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, request: NewOrder) -> Result<Order> {
        request.validate()?;

        let id = OrderId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let order = Order::new(id, request);
        self.orders.insert(id, order.clone());

        debug!(order_id = %id, "Order stored");
        Ok(order)
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.get(&id).map(|o| o.clone()))
    }

    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<Order> {
        let mut order = self.orders.get_mut(&id).ok_or(OrderError::NotFound(id))?;
        order.set_status(status);
        Ok(order.clone())
    }

    async fn list(&self, status: Option<OrderStatus>) -> Result<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|o| status.map_or(true, |s| o.status == s))
            .map(|o| o.clone())
            .collect();
        orders.sort_by_key(|o| o.id);
        Ok(orders)
    }
}
