use async_trait::async_trait;
use chrono::Utc;
use common::{CustomerId, Money, OrderId, PaymentId, ProductId};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::Result;
use crate::error::RecordStoreError;
use crate::records::{
    Customer, NewCustomer, NewOrder, NewOrderItem, NewPayment, NewProduct, Order, OrderFilter,
    OrderItem, OrderStatus, Payment, PaymentFilter, PaymentMethod, PaymentStatus, Product,
    ProductFilter, ProductPatch,
};
use crate::store::RecordStore;

/// PostgreSQL-backed record store.
///
/// Each trait method issues exactly one statement; there is no shared
/// transaction across calls, matching the consistency model the domain
/// layer is written against.
#[derive(Clone)]
pub struct PostgresRecordStore {
    pool: PgPool,
}

impl PostgresRecordStore {
    /// Creates a new PostgreSQL record store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a fresh pool to the given database URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
            sku: row.try_get("sku")?,
            name: row.try_get("name")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            stock: row.try_get("stock")?,
            category: row.try_get("category")?,
        })
    }

    fn row_to_customer(row: PgRow) -> Result<Customer> {
        Ok(Customer {
            id: CustomerId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            city: row.try_get("city")?,
        })
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let status: String = row.try_get("status")?;
        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            customer_id: CustomerId::from_uuid(row.try_get::<Uuid, _>("customer_id")?),
            total_amount: Money::from_cents(row.try_get("total_amount_cents")?),
            status: status.parse().map_err(|_| RecordStoreError::Decode {
                field: "status",
                value: status.clone(),
            })?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_order_item(row: PgRow) -> Result<OrderItem> {
        let quantity: i64 = row.try_get("quantity")?;
        Ok(OrderItem {
            order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            quantity: u32::try_from(quantity).map_err(|_| RecordStoreError::Decode {
                field: "quantity",
                value: quantity.to_string(),
            })?,
            price: Money::from_cents(row.try_get("price_cents")?),
        })
    }

    fn row_to_payment(row: PgRow) -> Result<Payment> {
        let status: String = row.try_get("status")?;
        let method: Option<String> = row.try_get("payment_method")?;
        Ok(Payment {
            id: PaymentId::from_uuid(row.try_get::<Uuid, _>("id")?),
            order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            amount: Money::from_cents(row.try_get("amount_cents")?),
            status: status.parse().map_err(|_| RecordStoreError::Decode {
                field: "status",
                value: status.clone(),
            })?,
            method: method
                .map(|m| {
                    m.parse::<PaymentMethod>()
                        .map_err(|_| RecordStoreError::Decode {
                            field: "payment_method",
                            value: m.clone(),
                        })
                })
                .transpose()?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn map_unique_violation(
        e: sqlx::Error,
        constraint: &'static str,
        entity: &'static str,
        field: &'static str,
        value: &str,
    ) -> RecordStoreError {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.constraint() == Some(constraint)
        {
            return RecordStoreError::Conflict {
                entity,
                field,
                value: value.to_string(),
            };
        }
        RecordStoreError::Database(e)
    }
}

/// Caps a usize limit into a non-negative i64 for LIMIT binds.
fn limit_i64(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    async fn insert_product(&self, new: NewProduct) -> Result<Product> {
        let id = ProductId::new();
        sqlx::query(
            r#"
            INSERT INTO products (id, sku, name, price_cents, stock, category)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id.as_uuid())
        .bind(&new.sku)
        .bind(&new.name)
        .bind(new.price.cents())
        .bind(new.stock)
        .bind(&new.category)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Self::map_unique_violation(e, "unique_product_sku", "product", "sku", &new.sku)
        })?;

        Ok(Product {
            id,
            sku: new.sku,
            name: new.name,
            price: new.price,
            stock: new.stock,
            category: new.category,
        })
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query("SELECT * FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_product).transpose()
    }

    async fn get_product_by_sku(&self, sku: &str) -> Result<Option<Product>> {
        let row = sqlx::query("SELECT * FROM products WHERE sku = $1")
            .bind(sku)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_product).transpose()
    }

    async fn update_product(&self, id: ProductId, patch: ProductPatch) -> Result<Option<Product>> {
        let row = sqlx::query(
            r#"
            UPDATE products SET
                name = COALESCE($2, name),
                price_cents = COALESCE($3, price_cents),
                stock = COALESCE($4, stock),
                category = COALESCE($5, category)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id.as_uuid())
        .bind(patch.name)
        .bind(patch.price.map(|p| p.cents()))
        .bind(patch.stock)
        .bind(patch.category)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_product).transpose()
    }

    async fn delete_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query("DELETE FROM products WHERE id = $1 RETURNING *")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_product).transpose()
    }

    async fn list_products(&self, filter: ProductFilter, limit: usize) -> Result<Vec<Product>> {
        let rows = match filter.category {
            Some(category) => {
                sqlx::query(
                    "SELECT * FROM products WHERE category = $1 ORDER BY sku ASC LIMIT $2",
                )
                .bind(category)
                .bind(limit_i64(limit))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query("SELECT * FROM products ORDER BY sku ASC LIMIT $1")
                    .bind(limit_i64(limit))
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn insert_customer(&self, new: NewCustomer) -> Result<Customer> {
        let id = CustomerId::new();
        sqlx::query(
            r#"
            INSERT INTO customers (id, name, email, phone, city)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id.as_uuid())
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(&new.city)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Self::map_unique_violation(e, "unique_customer_email", "customer", "email", &new.email)
        })?;

        Ok(Customer {
            id,
            name: new.name,
            email: new.email,
            phone: new.phone,
            city: new.city,
        })
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>> {
        let row = sqlx::query("SELECT * FROM customers WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_customer).transpose()
    }

    async fn get_customer_by_email(&self, email: &str) -> Result<Option<Customer>> {
        let row = sqlx::query("SELECT * FROM customers WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_customer).transpose()
    }

    async fn delete_customer(&self, id: CustomerId) -> Result<Option<Customer>> {
        let row = sqlx::query("DELETE FROM customers WHERE id = $1 RETURNING *")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_customer).transpose()
    }

    async fn list_customers(&self, limit: usize) -> Result<Vec<Customer>> {
        let rows = sqlx::query("SELECT * FROM customers ORDER BY email ASC LIMIT $1")
            .bind(limit_i64(limit))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Self::row_to_customer).collect()
    }

    async fn insert_order(&self, new: NewOrder) -> Result<Order> {
        let id = OrderId::new();
        let created_at = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO orders (id, customer_id, total_amount_cents, status, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id.as_uuid())
        .bind(new.customer_id.as_uuid())
        .bind(new.total_amount.cents())
        .bind(new.status.as_str())
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(Order {
            id,
            customer_id: new.customer_id,
            total_amount: new.total_amount,
            status: new.status,
            created_at,
        })
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query("SELECT * FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_order).transpose()
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Option<Order>> {
        let row = sqlx::query("UPDATE orders SET status = $2 WHERE id = $1 RETURNING *")
            .bind(id.as_uuid())
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_order).transpose()
    }

    async fn delete_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query("DELETE FROM orders WHERE id = $1 RETURNING *")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_order).transpose()
    }

    async fn list_orders(&self, filter: OrderFilter, limit: usize) -> Result<Vec<Order>> {
        let mut sql = String::from("SELECT * FROM orders WHERE 1=1");
        let mut param_count = 0;

        if filter.customer_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND customer_id = ${param_count}"));
        }
        if filter.status.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND status = ${param_count}"));
        }
        param_count += 1;
        sql.push_str(&format!(" ORDER BY created_at ASC LIMIT ${param_count}"));

        let mut query = sqlx::query(&sql);
        if let Some(customer_id) = filter.customer_id {
            query = query.bind(customer_id.as_uuid());
        }
        if let Some(status) = filter.status {
            query = query.bind(status.as_str());
        }
        query = query.bind(limit_i64(limit));

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn insert_order_item(&self, new: NewOrderItem) -> Result<OrderItem> {
        sqlx::query(
            r#"
            INSERT INTO order_items (id, order_id, product_id, quantity, price_cents, position)
            VALUES ($1, $2, $3, $4, $5,
                    (SELECT COUNT(*) FROM order_items WHERE order_id = $2))
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.order_id.as_uuid())
        .bind(new.product_id.as_uuid())
        .bind(i64::from(new.quantity))
        .bind(new.price.cents())
        .execute(&self.pool)
        .await?;

        Ok(OrderItem {
            order_id: new.order_id,
            product_id: new.product_id,
            quantity: new.quantity,
            price: new.price,
        })
    }

    async fn list_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        let rows = sqlx::query(
            "SELECT * FROM order_items WHERE order_id = $1 ORDER BY position ASC",
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_order_item).collect()
    }

    async fn insert_payment(&self, new: NewPayment) -> Result<Payment> {
        let id = PaymentId::new();
        let created_at = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO payments (id, order_id, amount_cents, status, payment_method, created_at)
            VALUES ($1, $2, $3, $4, NULL, $5)
            "#,
        )
        .bind(id.as_uuid())
        .bind(new.order_id.as_uuid())
        .bind(new.amount.cents())
        .bind(new.status.as_str())
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Self::map_unique_violation(
                e,
                "unique_payment_order",
                "payment",
                "order_id",
                &new.order_id.to_string(),
            )
        })?;

        Ok(Payment {
            id,
            order_id: new.order_id,
            amount: new.amount,
            status: new.status,
            method: None,
            created_at,
        })
    }

    async fn get_payment(&self, id: PaymentId) -> Result<Option<Payment>> {
        let row = sqlx::query("SELECT * FROM payments WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_payment).transpose()
    }

    async fn get_payment_by_order(&self, order_id: OrderId) -> Result<Option<Payment>> {
        let row = sqlx::query("SELECT * FROM payments WHERE order_id = $1")
            .bind(order_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_payment).transpose()
    }

    async fn update_payment_state(
        &self,
        id: PaymentId,
        status: PaymentStatus,
        method: Option<PaymentMethod>,
    ) -> Result<Option<Payment>> {
        let row = sqlx::query(
            "UPDATE payments SET status = $2, payment_method = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id.as_uuid())
        .bind(status.as_str())
        .bind(method.map(|m| m.as_str()))
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_payment).transpose()
    }

    async fn list_payments(&self, filter: PaymentFilter, limit: usize) -> Result<Vec<Payment>> {
        let rows = match filter.status {
            Some(status) => {
                sqlx::query(
                    "SELECT * FROM payments WHERE status = $1 ORDER BY created_at ASC LIMIT $2",
                )
                .bind(status.as_str())
                .bind(limit_i64(limit))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query("SELECT * FROM payments ORDER BY created_at ASC LIMIT $1")
                    .bind(limit_i64(limit))
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.into_iter().map(Self::row_to_payment).collect()
    }
}
