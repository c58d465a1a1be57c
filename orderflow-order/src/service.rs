use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use orderflow_core::{CollaboratorResult, DeliveryGateway, OrderRepository, ProductRepository};
use orderflow_shared::{CartItem, DeliveryId, NewOrder, Order, OrderId, OrderItem, Product, ProductId, UserId};
use orderflow_store::app_config::WorkflowConfig;
use orderflow_store::PricingPolicy;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{Collaborator, IncompleteStage, OrderError};
use crate::pricing::{self, PricedLine};
use crate::resilience::{retry_on_transient, with_timeout, RetryConfig};

/// Tunables of the order workflow
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    pub call_timeout: Duration,
    pub retry: RetryConfig,
    pub pricing_policy: PricingPolicy,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self::from(&WorkflowConfig::default())
    }
}

impl From<&WorkflowConfig> for WorkflowSettings {
    fn from(config: &WorkflowConfig) -> Self {
        Self {
            call_timeout: Duration::from_millis(config.call_timeout_ms),
            retry: RetryConfig::from(&config.retry),
            pricing_policy: config.pricing_policy,
        }
    }
}

/// Places orders and reports their delivery status.
///
/// Holds no mutable state of its own; clones share the same collaborators.
#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
    products: Arc<dyn ProductRepository>,
    delivery: Arc<dyn DeliveryGateway>,
    settings: WorkflowSettings,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        products: Arc<dyn ProductRepository>,
        delivery: Arc<dyn DeliveryGateway>,
        settings: WorkflowSettings,
    ) -> Self {
        Self {
            orders,
            products,
            delivery,
            settings,
        }
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    /// Validate the cart against the catalog, persist the order and its lines,
    /// then register the delivery.
    ///
    /// Validation failures leave no trace. Once the order row exists, later
    /// failures come back as [`OrderError::Incomplete`] carrying the order id,
    /// to be finished with [`OrderService::resume_order`].
    #[instrument(skip(self, cart, delivery_address), fields(lines = cart.len()))]
    pub async fn create_order(
        &self,
        user_id: UserId,
        cart: &[CartItem],
        delivery_address: &str,
    ) -> Result<Order, OrderError> {
        validate_user(user_id)?;
        validate_cart(cart, delivery_address)?;

        let products = self.check_stock(cart).await?;
        let lines = pricing::price_lines(self.settings.pricing_policy, cart, &products);
        let total = pricing::order_total(&lines);

        let new_order = NewOrder::pending(user_id, total, Utc::now());
        let mut order = self
            .write(self.orders.create_order(&new_order))
            .await
            .map_err(|source| {
                error!(error = %source, "Failed to persist order");
                OrderError::from_collaborator(Collaborator::OrderStore, source)
            })?;
        info!(order_id = order.id, total = order.total_price, "Order persisted");

        self.store_lines(order.id, &lines).await?;

        let delivery_id = self.register_delivery(order.id, delivery_address).await?;
        info!(order_id = order.id, delivery_id = %delivery_id, "Order placed");

        // The store accepted the id, so it is the order's only delivery
        order.delivery_id = Some(delivery_id);
        Ok(order)
    }

    /// Delivery status of an order, exactly as the delivery gateway reports it
    #[instrument(skip(self))]
    pub async fn get_order_status(&self, order_id: OrderId) -> Result<String, OrderError> {
        let order = self.get_order(order_id).await?;
        let delivery_id = order
            .delivery_id
            .ok_or(OrderError::DeliveryNotRegistered(order_id))?;

        let delivery_id = delivery_id.as_str();
        self.read(Collaborator::DeliveryGateway, move || {
            self.delivery.get_delivery_status(delivery_id)
        })
        .await
    }

    pub async fn get_order(&self, order_id: OrderId) -> Result<Order, OrderError> {
        self.read(Collaborator::OrderStore, move || self.orders.get_order(order_id))
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))
    }

    pub async fn order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, OrderError> {
        // Distinguish "no items yet" from "no such order"
        self.get_order(order_id).await?;
        self.read(Collaborator::OrderStore, move || {
            self.orders.list_order_items(order_id)
        })
        .await
    }

    /// Finish an order that [`OrderService::create_order`] left incomplete.
    ///
    /// `cart` and `delivery_address` must be those of the original request.
    /// Stored lines are kept as they are and only checked against the cart's
    /// products and quantities. Missing lines are priced now; they must bring
    /// the stored lines up to the order total, otherwise the order is left
    /// alone ([`OrderError::PriceChanged`] under catalog pricing,
    /// [`OrderError::InvalidRequest`] for a cart that differs). The delivery
    /// gateway is then asked for the order's delivery and the id recorded.
    /// Calling this on a complete order returns it untouched.
    #[instrument(skip(self, cart, delivery_address), fields(lines = cart.len()))]
    pub async fn resume_order(
        &self,
        order_id: OrderId,
        cart: &[CartItem],
        delivery_address: &str,
    ) -> Result<Order, OrderError> {
        validate_cart(cart, delivery_address)?;

        let mut order = self.get_order(order_id).await?;
        if order.has_delivery() {
            debug!(order_id, "Order already complete, nothing to resume");
            return Ok(order);
        }

        let stored = self
            .read(Collaborator::OrderStore, move || {
                self.orders.list_order_items(order_id)
            })
            .await?;
        let present = match_stored_lines(order_id, cart, &stored)?;

        if present.len() < cart.len() {
            warn!(order_id, missing = cart.len() - present.len(), "Resuming order with missing lines");
            let missing = self.price_missing_lines(cart, &present).await?;
            self.check_resumed_total(&order, &stored, &missing)?;
            self.store_lines(order_id, &missing).await?;
        }

        let delivery_id = self.register_delivery(order_id, delivery_address).await?;
        info!(order_id, delivery_id = %delivery_id, "Order resumed");

        order.delivery_id = Some(delivery_id);
        Ok(order)
    }

    /// Resolve every cart line and check the requested quantities against
    /// stock, in cart order. Repeated products are checked on their running sum.
    async fn check_stock(&self, cart: &[CartItem]) -> Result<Vec<Product>, OrderError> {
        let mut requested: HashMap<ProductId, i64> = HashMap::new();
        let mut products = Vec::with_capacity(cart.len());

        for item in cart {
            let product = self.find_product(item.product_id).await?;

            let total_requested = requested.entry(item.product_id).or_insert(0);
            *total_requested += i64::from(item.quantity);

            if !product.has_stock_for(*total_requested) {
                warn!(
                    product_id = item.product_id,
                    requested = *total_requested,
                    available = product.available_quantity,
                    "Insufficient stock"
                );
                return Err(OrderError::InsufficientStock {
                    product_id: item.product_id,
                    requested: *total_requested,
                    available: product.available_quantity,
                });
            }

            products.push(product);
        }

        Ok(products)
    }

    /// Price the cart lines that are not in `present`, in line order
    async fn price_missing_lines(
        &self,
        cart: &[CartItem],
        present: &HashSet<i32>,
    ) -> Result<Vec<PricedLine>, OrderError> {
        let mut lines = Vec::new();
        for (line_no, item) in cart.iter().enumerate() {
            if present.contains(&(line_no as i32)) {
                continue;
            }
            let unit_price = match self.settings.pricing_policy {
                PricingPolicy::CartSupplied => item.price,
                PricingPolicy::Catalog => self.find_product(item.product_id).await?.price,
            };
            lines.push(PricedLine::new(line_no, item, unit_price));
        }
        Ok(lines)
    }

    /// Stored lines plus the lines about to be stored must make up the order total
    fn check_resumed_total(
        &self,
        order: &Order,
        stored: &[OrderItem],
        missing: &[PricedLine],
    ) -> Result<(), OrderError> {
        let repriced_total = resumed_total(stored, missing);
        if pricing::totals_match(repriced_total, order.total_price) {
            return Ok(());
        }

        warn!(
            order_id = order.id,
            order_total = order.total_price,
            repriced_total,
            "Resumed lines do not add up to the order total"
        );
        match self.settings.pricing_policy {
            PricingPolicy::CartSupplied => Err(OrderError::InvalidRequest(format!(
                "cart does not add up to the total of order {}",
                order.id
            ))),
            PricingPolicy::Catalog => Err(OrderError::PriceChanged {
                order_id: order.id,
                order_total: order.total_price,
                repriced_total,
            }),
        }
    }

    async fn find_product(&self, product_id: ProductId) -> Result<Product, OrderError> {
        self.read(Collaborator::ProductCatalog, move || {
            self.products.get_product(product_id)
        })
        .await?
        .ok_or(OrderError::ProductNotFound(product_id))
    }

    /// Persist `lines` in order, stopping at the first failure
    async fn store_lines(&self, order_id: OrderId, lines: &[PricedLine]) -> Result<(), OrderError> {
        for line in lines {
            let item = line.to_item(order_id);
            self.write(self.orders.add_order_item(&item))
                .await
                .map_err(|source| {
                    error!(order_id, line_no = line.line_no, error = %source, "Failed to persist order item");
                    OrderError::incomplete(order_id, IncompleteStage::Items, source)
                })?;
        }
        Ok(())
    }

    /// Register the delivery and record its id on the stored order
    async fn register_delivery(&self, order_id: OrderId, address: &str) -> Result<DeliveryId, OrderError> {
        let delivery_id = self
            .write(self.delivery.register_delivery(order_id, address))
            .await
            .map_err(|source| {
                error!(order_id, error = %source, "Delivery registration failed");
                OrderError::incomplete(order_id, IncompleteStage::Delivery, source)
            })?;

        self.write(self.orders.attach_delivery(order_id, &delivery_id))
            .await
            .map_err(|source| {
                error!(order_id, delivery_id = %delivery_id, error = %source, "Failed to record delivery id");
                OrderError::incomplete(order_id, IncompleteStage::Delivery, source)
            })?;

        Ok(delivery_id)
    }

    /// Idempotent call: bounded by the timeout, outages retried with backoff
    async fn read<T, F, Fut>(&self, collaborator: Collaborator, mut call: F) -> Result<T, OrderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = CollaboratorResult<T>>,
    {
        let limit = self.settings.call_timeout;
        retry_on_transient(&self.settings.retry, |_attempt| with_timeout(limit, call()))
            .await
            .map_err(|source| OrderError::from_collaborator(collaborator, source))
    }

    /// Non-idempotent call: bounded by the timeout, attempted once
    async fn write<T>(&self, call: impl Future<Output = CollaboratorResult<T>>) -> CollaboratorResult<T> {
        with_timeout(self.settings.call_timeout, call).await
    }
}

fn validate_user(user_id: UserId) -> Result<(), OrderError> {
    if user_id <= 0 {
        return Err(OrderError::InvalidRequest(format!("invalid user id {}", user_id)));
    }
    Ok(())
}

fn validate_cart(cart: &[CartItem], delivery_address: &str) -> Result<(), OrderError> {
    if cart.is_empty() {
        return Err(OrderError::InvalidRequest("cart is empty".to_string()));
    }
    if delivery_address.trim().is_empty() {
        return Err(OrderError::InvalidRequest("delivery address is empty".to_string()));
    }
    for (line_no, item) in cart.iter().enumerate() {
        if item.quantity <= 0 {
            return Err(OrderError::InvalidRequest(format!(
                "line {}: quantity must be positive, got {}",
                line_no, item.quantity
            )));
        }
        if !item.price.is_finite() || item.price < 0.0 {
            return Err(OrderError::InvalidRequest(format!(
                "line {}: invalid price {}",
                line_no, item.price
            )));
        }
    }
    Ok(())
}

/// Line numbers already stored, after checking their products and
/// quantities agree with the cart. Prices are not compared.
fn match_stored_lines(
    order_id: OrderId,
    cart: &[CartItem],
    stored: &[OrderItem],
) -> Result<HashSet<i32>, OrderError> {
    let mut present = HashSet::with_capacity(stored.len());
    for item in stored {
        let matches = usize::try_from(item.line_no)
            .ok()
            .and_then(|line_no| cart.get(line_no))
            .map(|line| line.product_id == item.product_id && line.quantity == item.quantity)
            .unwrap_or(false);
        if !matches {
            return Err(OrderError::InvalidRequest(format!(
                "stored line {} of order {} does not match the cart",
                item.line_no, order_id
            )));
        }
        present.insert(item.line_no);
    }
    Ok(present)
}

/// Order total rebuilt from stored and freshly priced lines, summed in line order
fn resumed_total(stored: &[OrderItem], missing: &[PricedLine]) -> f64 {
    let mut totals: Vec<(i32, f64)> = stored
        .iter()
        .map(|item| (item.line_no, item.line_total()))
        .chain(missing.iter().map(|line| (line.line_no, line.total())))
        .collect();
    totals.sort_by_key(|(line_no, _)| *line_no);
    totals.into_iter().map(|(_, total)| total).sum()
}
