use async_trait::async_trait;
use chrono::{DateTime, Utc};
use orderflow_core::{CollaboratorResult, CoreError, OrderRepository};
use orderflow_shared::{NewOrder, Order, OrderId, OrderItem, OrderStatus};
use sqlx::PgPool;
use tracing::debug;

pub struct StoreOrderRepository {
    pool: PgPool,
}

impl StoreOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    user_id: i64,
    status: String,
    total_price: f64,
    created_at: DateTime<Utc>,
    delivery_id: Option<String>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Order {
            id: row.id,
            user_id: row.user_id,
            status: OrderStatus::from(row.status),
            total_price: row.total_price,
            created_at: row.created_at,
            delivery_id: row.delivery_id,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    order_id: i64,
    line_no: i32,
    product_id: i64,
    quantity: i32,
    price: f64,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            order_id: row.order_id,
            line_no: row.line_no,
            product_id: row.product_id,
            quantity: row.quantity,
            price: row.price,
        }
    }
}

const ORDER_COLUMNS: &str = "id, user_id, status, total_price, created_at, delivery_id";

#[async_trait]
impl OrderRepository for StoreOrderRepository {
    async fn create_order(&self, order: &NewOrder) -> CollaboratorResult<Order> {
        let row: OrderRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO orders (user_id, status, total_price, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            ORDER_COLUMNS
        ))
        .bind(order.user_id)
        .bind(order.status.as_str())
        .bind(order.total_price)
        .bind(order.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn add_order_item(&self, item: &OrderItem) -> CollaboratorResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO order_items (order_id, line_no, product_id, quantity, price)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (order_id, line_no) DO NOTHING
            "#,
        )
        .bind(item.order_id)
        .bind(item.line_no)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.price)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            debug!(order_id = item.order_id, line_no = item.line_no, "order item already stored");
        }
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> CollaboratorResult<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {} FROM orders WHERE id = $1",
            ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Order::from))
    }

    async fn list_order_items(&self, order_id: OrderId) -> CollaboratorResult<Vec<OrderItem>> {
        let rows: Vec<OrderItemRow> = sqlx::query_as(
            "SELECT order_id, line_no, product_id, quantity, price FROM order_items WHERE order_id = $1 ORDER BY line_no",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(OrderItem::from).collect())
    }

    async fn attach_delivery(&self, order_id: OrderId, delivery_id: &str) -> CollaboratorResult<()> {
        let result = sqlx::query(
            "UPDATE orders SET delivery_id = $2 WHERE id = $1 AND (delivery_id IS NULL OR delivery_id = $2)",
        )
        .bind(order_id)
        .bind(delivery_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        // Either the order is gone or it already points at another delivery
        match self.get_order(order_id).await? {
            None => Err(CoreError::NotFound(format!("order {}", order_id)).into()),
            Some(order) => Err(CoreError::Conflict(format!(
                "order {} already has delivery {}",
                order_id,
                order.delivery_id.unwrap_or_default()
            ))
            .into()),
        }
    }
}
