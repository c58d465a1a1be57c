#![allow(dead_code)]

use async_trait::async_trait;
use orderflow_core::{CollaboratorResult, CoreError, DeliveryGateway, OrderRepository, ProductRepository};
use orderflow_order::{InMemoryDeliveryGateway, OrderService, PricingPolicy, RetryConfig, WorkflowSettings};
use orderflow_shared::{DeliveryId, NewOrder, Order, OrderId, OrderItem, Product, ProductId};
use orderflow_store::{InMemoryCatalog, InMemoryOrderStore};
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const ADDRESS: &str = "221B Baker Street, London";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "orderflow_order=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Short timeouts and near-zero backoff so failure paths stay fast
pub fn fast_settings() -> WorkflowSettings {
    WorkflowSettings {
        call_timeout: Duration::from_millis(200),
        retry: RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            multiplier: 2.0,
        },
        pricing_policy: PricingPolicy::CartSupplied,
    }
}

fn injected(what: &str) -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(CoreError::Unavailable(format!("injected {} failure", what)))
}

/// Take one unit from a failure budget, if any is left
fn consume(budget: &AtomicU32) -> bool {
    budget
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

/// Catalog that can fail the next N lookups or hang forever
#[derive(Default)]
pub struct FlakyCatalog {
    pub inner: InMemoryCatalog,
    pub failures: AtomicU32,
    pub stalled: AtomicBool,
    pub calls: AtomicUsize,
}

impl FlakyCatalog {
    pub fn with_products(products: Vec<Product>) -> Self {
        Self {
            inner: InMemoryCatalog::with_products(products),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProductRepository for FlakyCatalog {
    async fn get_product(&self, id: ProductId) -> CollaboratorResult<Option<Product>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.stalled.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if consume(&self.failures) {
            return Err(injected("catalog"));
        }
        self.inner.get_product(id).await
    }
}

/// Order store with switchable failures on each write
pub struct FaultyOrderStore {
    pub inner: InMemoryOrderStore,
    pub fail_create: AtomicBool,
    /// Line number whose next write fails; -1 disables
    pub fail_line: AtomicI32,
    pub attach_failures: AtomicU32,
    pub lookup_failures: AtomicU32,
}

impl Default for FaultyOrderStore {
    fn default() -> Self {
        Self {
            inner: InMemoryOrderStore::new(),
            fail_create: AtomicBool::new(false),
            fail_line: AtomicI32::new(-1),
            attach_failures: AtomicU32::new(0),
            lookup_failures: AtomicU32::new(0),
        }
    }
}

impl FaultyOrderStore {
    pub async fn writes(&self) -> usize {
        self.inner.writes().await
    }
}

#[async_trait]
impl OrderRepository for FaultyOrderStore {
    async fn create_order(&self, order: &NewOrder) -> CollaboratorResult<Order> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(injected("order create"));
        }
        self.inner.create_order(order).await
    }

    async fn add_order_item(&self, item: &OrderItem) -> CollaboratorResult<()> {
        if self
            .fail_line
            .compare_exchange(item.line_no, -1, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            return Err(injected("order item"));
        }
        self.inner.add_order_item(item).await
    }

    async fn get_order(&self, id: OrderId) -> CollaboratorResult<Option<Order>> {
        if consume(&self.lookup_failures) {
            return Err(injected("order lookup"));
        }
        self.inner.get_order(id).await
    }

    async fn list_order_items(&self, order_id: OrderId) -> CollaboratorResult<Vec<OrderItem>> {
        self.inner.list_order_items(order_id).await
    }

    async fn attach_delivery(&self, order_id: OrderId, delivery_id: &str) -> CollaboratorResult<()> {
        if consume(&self.attach_failures) {
            return Err(injected("attach delivery"));
        }
        self.inner.attach_delivery(order_id, delivery_id).await
    }
}

/// Delivery gateway that can fail the next N registrations or status lookups
#[derive(Default)]
pub struct FaultyGateway {
    pub inner: InMemoryDeliveryGateway,
    pub registration_failures: AtomicU32,
    pub status_failures: AtomicU32,
    pub registration_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
}

impl FaultyGateway {
    pub fn registration_calls(&self) -> usize {
        self.registration_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeliveryGateway for FaultyGateway {
    async fn register_delivery(&self, order_id: OrderId, address: &str) -> CollaboratorResult<DeliveryId> {
        self.registration_calls.fetch_add(1, Ordering::SeqCst);
        if consume(&self.registration_failures) {
            return Err(injected("delivery registration"));
        }
        self.inner.register_delivery(order_id, address).await
    }

    async fn get_delivery_status(&self, delivery_id: &str) -> CollaboratorResult<String> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if consume(&self.status_failures) {
            return Err(injected("delivery status"));
        }
        self.inner.get_delivery_status(delivery_id).await
    }
}

/// Service wired to fault-injecting in-memory collaborators
pub struct Harness {
    pub service: OrderService,
    pub orders: Arc<FaultyOrderStore>,
    pub catalog: Arc<FlakyCatalog>,
    pub gateway: Arc<FaultyGateway>,
}

impl Harness {
    pub fn new(products: Vec<Product>) -> Self {
        Self::with_settings(products, fast_settings())
    }

    pub fn with_settings(products: Vec<Product>, settings: WorkflowSettings) -> Self {
        init_tracing();

        let orders = Arc::new(FaultyOrderStore::default());
        let catalog = Arc::new(FlakyCatalog::with_products(products));
        let gateway = Arc::new(FaultyGateway::default());
        let service = OrderService::new(orders.clone(), catalog.clone(), gateway.clone(), settings);

        Self {
            service,
            orders,
            catalog,
            gateway,
        }
    }
}

/// Product 1 with stock 5 and product 2 with stock 1
pub fn basic_catalog() -> Vec<Product> {
    vec![
        Product::new(1, "Espresso machine", 10.0, 5),
        Product::new(2, "Milk jug", 5.0, 1),
    ]
}
