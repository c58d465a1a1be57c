use orderflow_shared::{CartItem, OrderId, OrderItem, Product, ProductId};
use orderflow_store::PricingPolicy;

/// A validated cart line with the unit price that will be persisted
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub line_no: i32,
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: f64,
}

impl PricedLine {
    /// Line `line_no` of a cart, charged at `unit_price`
    pub fn new(line_no: usize, item: &CartItem, unit_price: f64) -> Self {
        PricedLine {
            line_no: line_no as i32,
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price,
        }
    }

    pub fn total(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }

    pub fn to_item(&self, order_id: OrderId) -> OrderItem {
        OrderItem {
            order_id,
            line_no: self.line_no,
            product_id: self.product_id,
            quantity: self.quantity,
            price: self.unit_price,
        }
    }
}

/// Price every cart line under `policy`.
///
/// `products` must hold the resolved catalog entry for each cart line, in cart
/// order. It is ignored under [`PricingPolicy::CartSupplied`].
pub fn price_lines(policy: PricingPolicy, cart: &[CartItem], products: &[Product]) -> Vec<PricedLine> {
    match policy {
        PricingPolicy::CartSupplied => cart
            .iter()
            .enumerate()
            .map(|(line_no, item)| PricedLine::new(line_no, item, item.price))
            .collect(),
        PricingPolicy::Catalog => cart
            .iter()
            .zip(products)
            .enumerate()
            .map(|(line_no, (item, product))| PricedLine::new(line_no, item, product.price))
            .collect(),
    }
}

/// Sum of price × quantity, accumulated in line order
pub fn order_total(lines: &[PricedLine]) -> f64 {
    lines.iter().map(PricedLine::total).sum()
}

/// Whether two totals describe the same order, allowing for float noise
pub fn totals_match(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cart() -> Vec<CartItem> {
        vec![CartItem::new(1, 2, 10.0), CartItem::new(2, 1, 5.0)]
    }

    fn catalog() -> Vec<Product> {
        vec![Product::new(1, "Kettle", 12.0, 5), Product::new(2, "Mug", 4.0, 1)]
    }

    #[test]
    fn test_cart_supplied_prices() {
        let lines = price_lines(PricingPolicy::CartSupplied, &cart(), &catalog());

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].unit_price, 10.0);
        assert_eq!(lines[1].line_no, 1);
        assert_eq!(order_total(&lines), 25.0);
    }

    #[test]
    fn test_catalog_prices() {
        let lines = price_lines(PricingPolicy::Catalog, &cart(), &catalog());

        assert_eq!(lines[0].unit_price, 12.0);
        assert_eq!(lines[1].unit_price, 4.0);
        assert_eq!(order_total(&lines), 28.0);
    }

    #[test]
    fn test_cart_supplied_ignores_missing_catalog() {
        let lines = price_lines(PricingPolicy::CartSupplied, &cart(), &[]);
        assert_eq!(order_total(&lines), 25.0);
    }

    #[test]
    fn test_item_keeps_line_position() {
        let lines = price_lines(PricingPolicy::CartSupplied, &cart(), &[]);
        let item = lines[1].to_item(9);

        assert_eq!(item.order_id, 9);
        assert_eq!(item.line_no, 1);
        assert_eq!(item.line_total(), 5.0);
    }

    #[test]
    fn test_totals_match_tolerates_rounding() {
        assert!(totals_match(0.1 + 0.2, 0.3));
        assert!(!totals_match(25.0, 25.01));
    }
}
