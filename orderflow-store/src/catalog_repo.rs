use async_trait::async_trait;
use orderflow_core::{CollaboratorResult, ProductRepository};
use orderflow_shared::{Product, ProductId};
use sqlx::PgPool;

pub struct StoreProductRepository {
    pool: PgPool,
}

impl StoreProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    price: f64,
    available_quantity: i32,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            price: row.price,
            available_quantity: row.available_quantity,
        }
    }
}

#[async_trait]
impl ProductRepository for StoreProductRepository {
    async fn get_product(&self, id: ProductId) -> CollaboratorResult<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(
            "SELECT id, name, price, available_quantity FROM products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }
}
