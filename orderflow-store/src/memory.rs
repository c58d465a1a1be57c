use async_trait::async_trait;
use orderflow_core::{CollaboratorResult, CoreError, CoreResult, OrderRepository, ProductRepository};
use orderflow_shared::{NewOrder, Order, OrderId, OrderItem, Product, ProductId};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory product catalog
#[derive(Default)]
pub struct InMemoryCatalog {
    products: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let products = products.into_iter().map(|p| (p.id, p)).collect();
        Self {
            products: RwLock::new(products),
        }
    }

    pub async fn upsert(&self, product: Product) {
        self.products.write().await.insert(product.id, product);
    }

    /// Overwrite the stock on hand of a product
    pub async fn set_available(&self, id: ProductId, quantity: i32) -> CoreResult<()> {
        let mut products = self.products.write().await;
        let product = products
            .get_mut(&id)
            .ok_or_else(|| CoreError::NotFound(format!("product {}", id)))?;
        product.available_quantity = quantity;
        Ok(())
    }
}

#[async_trait]
impl ProductRepository for InMemoryCatalog {
    async fn get_product(&self, id: ProductId) -> CollaboratorResult<Option<Product>> {
        Ok(self.products.read().await.get(&id).cloned())
    }
}

#[derive(Default)]
struct OrderBook {
    next_id: OrderId,
    orders: HashMap<OrderId, Order>,
    items: BTreeMap<(OrderId, i32), OrderItem>,
    writes: usize,
}

/// In-memory order store.
///
/// Ids start at 1. Every accepted mutation bumps a write counter so callers
/// can check that a rejected request left the store untouched.
#[derive(Default)]
pub struct InMemoryOrderStore {
    book: RwLock<OrderBook>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn order_count(&self) -> usize {
        self.book.read().await.orders.len()
    }

    pub async fn item_count(&self) -> usize {
        self.book.read().await.items.len()
    }

    /// Number of mutations the store has accepted
    pub async fn writes(&self) -> usize {
        self.book.read().await.writes
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderStore {
    async fn create_order(&self, order: &NewOrder) -> CollaboratorResult<Order> {
        let mut book = self.book.write().await;
        book.next_id += 1;
        let stored = order.clone().into_order(book.next_id);
        book.orders.insert(stored.id, stored.clone());
        book.writes += 1;
        Ok(stored)
    }

    async fn add_order_item(&self, item: &OrderItem) -> CollaboratorResult<()> {
        let mut book = self.book.write().await;
        if !book.orders.contains_key(&item.order_id) {
            return Err(CoreError::NotFound(format!("order {}", item.order_id)).into());
        }

        let key = (item.order_id, item.line_no);
        if book.items.contains_key(&key) {
            debug!(order_id = item.order_id, line_no = item.line_no, "order item already stored");
            return Ok(());
        }

        book.items.insert(key, item.clone());
        book.writes += 1;
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> CollaboratorResult<Option<Order>> {
        Ok(self.book.read().await.orders.get(&id).cloned())
    }

    async fn list_order_items(&self, order_id: OrderId) -> CollaboratorResult<Vec<OrderItem>> {
        let book = self.book.read().await;
        Ok(book
            .items
            .range((order_id, i32::MIN)..=(order_id, i32::MAX))
            .map(|(_, item)| item.clone())
            .collect())
    }

    async fn attach_delivery(&self, order_id: OrderId, delivery_id: &str) -> CollaboratorResult<()> {
        let mut book = self.book.write().await;
        let order = book
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| CoreError::NotFound(format!("order {}", order_id)))?;

        if order.delivery_id.as_deref() == Some(delivery_id) {
            return Ok(());
        }
        if !order.attach_delivery(delivery_id) {
            return Err(CoreError::Conflict(format!(
                "order {} already has delivery {}",
                order_id,
                order.delivery_id.as_deref().unwrap_or_default()
            ))
            .into());
        }

        book.writes += 1;
        Ok(())
    }
}
