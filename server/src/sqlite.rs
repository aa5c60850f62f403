//! SQLite-backed order store.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use tracing::{debug, info};

use orderdesk_common::{NewOrder, Order, OrderError, OrderId, OrderStatus, Result};

use crate::store::OrderStore;

const CREATE_ORDERS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS orders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        customer_name TEXT NOT NULL,
        total_amount TEXT NOT NULL,
        currency TEXT NOT NULL,
        status TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )";

const INSERT_ORDER: &str = "
    INSERT INTO orders (customer_name, total_amount, currency, status, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?)";

const SELECT_ORDER: &str = "
    SELECT id, customer_name, total_amount, currency, status, created_at, updated_at
    FROM orders WHERE id = ?";

const SELECT_ORDERS: &str = "
    SELECT id, customer_name, total_amount, currency, status, created_at, updated_at
    FROM orders ORDER BY id";

const SELECT_ORDERS_BY_STATUS: &str = "
    SELECT id, customer_name, total_amount, currency, status, created_at, updated_at
    FROM orders WHERE status = ? ORDER BY id";

const UPDATE_STATUS: &str = "UPDATE orders SET status = ?, updated_at = ? WHERE id = ?";

/// Amounts are stored as decimal text so they read back exactly.
#[derive(FromRow)]
struct OrderRow {
    id: i64,
    customer_name: String,
    total_amount: String,
    currency: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self) -> Result<Order> {
        let total_amount = Decimal::from_str(&self.total_amount).map_err(|e| {
            OrderError::Storage(format!("order {} has amount {:?}: {}", self.id, self.total_amount, e))
        })?;
        let currency = self
            .currency
            .parse()
            .map_err(|e| OrderError::Storage(format!("order {}: {}", self.id, e)))?;
        let status = self
            .status
            .parse()
            .map_err(|e| OrderError::Storage(format!("order {}: {}", self.id, e)))?;

        Ok(Order {
            id: OrderId::new(self.id),
            customer_name: self.customer_name,
            total_amount,
            currency,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn storage_error(e: sqlx::Error) -> OrderError {
    OrderError::Storage(e.to_string())
}

/// Order store persisted in a SQLite database.
pub struct SqliteOrderStore {
    pool: SqlitePool,
}

impl SqliteOrderStore {
    /// Open the database at `url`, creating the file and the orders table if missing.
    ///
    /// Accepts sqlx SQLite URLs such as `sqlite://orders.db` or `sqlite::memory:`.
    pub async fn connect(url: &str) -> std::result::Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        // Each connection to an in-memory database gets its own empty database,
        // so those pools hold exactly one connection for their whole life.
        let pool_options = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options.connect_with(options).await?;

        sqlx::query(CREATE_ORDERS_TABLE).execute(&pool).await?;

        info!(database_url = %url, "Order database ready");
        Ok(Self { pool })
    }
}

#[async_trait]
impl OrderStore for SqliteOrderStore {
    async fn create(&self, request: NewOrder) -> Result<Order> {
        request.validate()?;

        let mut order = Order::new(OrderId::new(0), request);
        let result = sqlx::query(INSERT_ORDER)
            .bind(order.customer_name.as_str())
            .bind(order.total_amount.to_string())
            .bind(order.currency.code())
            .bind(order.status.as_str())
            .bind(order.created_at)
            .bind(order.updated_at)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        order.id = OrderId::new(result.last_insert_rowid());

        debug!(order_id = %order.id, "Order stored");
        Ok(order)
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(SELECT_ORDER)
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        row.map(OrderRow::into_order).transpose()
    }

    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<Order> {
        let result = sqlx::query(UPDATE_STATUS)
            .bind(status.as_str())
            .bind(Utc::now())
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        if result.rows_affected() == 0 {
            return Err(OrderError::NotFound(id));
        }

        self.get(id).await?.ok_or(OrderError::NotFound(id))
    }

    async fn list(&self, status: Option<OrderStatus>) -> Result<Vec<Order>> {
        let rows = match status {
            Some(status) => {
                sqlx::query_as::<_, OrderRow>(SELECT_ORDERS_BY_STATUS)
                    .bind(status.as_str())
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                sqlx::query_as::<_, OrderRow>(SELECT_ORDERS)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(storage_error)?;

        rows.into_iter().map(OrderRow::into_order).collect()
    }
}
