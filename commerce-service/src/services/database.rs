//! Database service for commerce-service.

use crate::models::{
    ActivityEntry, ActivityKind, AdminDashboard, Category, CategoryProductCount, CreateCategory,
    CreateProduct, CreateTask, Invoice, InvoiceStatus, ListOrdersFilter, ListProductsFilter, Order,
    OrderItemRecord, OrderStatus, PlaceOrder, PlatformTotals, Product, ProductSearch, RecentOrder,
    RecentTask, SalesPoint, Task, UpdateCategory, UpdateProduct, UpdateTask, UpdateUserProfile,
    UpdateUserSettings, UserDashboard, UserProfile, UserSettings, invoice_number, payment_due_date,
};
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::placement::{PlacementError, ProductLine, check_line, line_total};
use chrono::Utc;
use platform_core::error::AppError;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "commerce-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["health_check"])
            .start_timer();

        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;

        timer.observe_duration();
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // =========================================================================
    // Category Operations
    // =========================================================================

    /// List every category, alphabetically.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_categories"])
            .start_timer();

        let categories = sqlx::query_as::<_, Category>(
            "SELECT category_id, name, description, created_utc FROM categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list categories: {}", e))
        })?;

        timer.observe_duration();
        Ok(categories)
    }

    /// Get a category by id.
    #[instrument(skip(self), fields(category_id = %category_id))]
    pub async fn get_category(&self, category_id: Uuid) -> Result<Option<Category>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_category"])
            .start_timer();

        let category = sqlx::query_as::<_, Category>(
            "SELECT category_id, name, description, created_utc FROM categories WHERE category_id = $1",
        )
        .bind(category_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get category: {}", e)))?;

        timer.observe_duration();
        Ok(category)
    }

    /// Create a new category.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_category(&self, input: &CreateCategory) -> Result<Category, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_category"])
            .start_timer();

        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (category_id, name, description)
            VALUES ($1, $2, $3)
            RETURNING category_id, name, description, created_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to create category: {}", e))
        })?;

        timer.observe_duration();
        info!(category_id = %category.category_id, "Category created");

        Ok(category)
    }

    /// Update a category. Absent fields are left unchanged.
    #[instrument(skip(self, input), fields(category_id = %category_id))]
    pub async fn update_category(
        &self,
        category_id: Uuid,
        input: &UpdateCategory,
    ) -> Result<Option<Category>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_category"])
            .start_timer();

        let category = sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET name = COALESCE($2, name),
                description = COALESCE($3, description)
            WHERE category_id = $1
            RETURNING category_id, name, description, created_utc
            "#,
        )
        .bind(category_id)
        .bind(&input.name)
        .bind(&input.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update category: {}", e))
        })?;

        timer.observe_duration();
        Ok(category)
    }

    // =========================================================================
    // Product Operations
    // =========================================================================

    /// List products, optionally restricted to a category or to active rows.
    #[instrument(skip(self, filter))]
    pub async fn list_products(
        &self,
        filter: &ListProductsFilter,
    ) -> Result<Vec<Product>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_products"])
            .start_timer();

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT p.product_id, p.name, p.description, p.category_id, c.name AS category_name,
                   p.price, p.image_url, p.stock, p.is_active, p.created_utc, p.updated_utc
            FROM products p
            LEFT JOIN categories c ON c.category_id = p.category_id
            WHERE ($1::uuid IS NULL OR p.category_id = $1)
              AND (NOT $2 OR p.is_active = TRUE)
            ORDER BY p.created_utc DESC
            "#,
        )
        .bind(filter.category_id)
        .bind(filter.active_only)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list products: {}", e)))?;

        timer.observe_duration();
        Ok(products)
    }

    /// Storefront search: active products matching a substring of the name or
    /// description, optionally within one category.
    #[instrument(skip(self, search))]
    pub async fn search_products(&self, search: &ProductSearch) -> Result<Vec<Product>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["search_products"])
            .start_timer();

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT p.product_id, p.name, p.description, p.category_id, c.name AS category_name,
                   p.price, p.image_url, p.stock, p.is_active, p.created_utc, p.updated_utc
            FROM products p
            LEFT JOIN categories c ON c.category_id = p.category_id
            WHERE p.is_active = TRUE
              AND ($1::text IS NULL
                   OR p.name ILIKE '%' || $1 || '%'
                   OR p.description ILIKE '%' || $1 || '%')
              AND ($2::uuid IS NULL OR p.category_id = $2)
            ORDER BY p.name
            "#,
        )
        .bind(&search.query)
        .bind(search.category_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to search products: {}", e))
        })?;

        timer.observe_duration();
        Ok(products)
    }

    /// Get a product by id.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_product(&self, product_id: Uuid) -> Result<Option<Product>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_product"])
            .start_timer();

        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT p.product_id, p.name, p.description, p.category_id, c.name AS category_name,
                   p.price, p.image_url, p.stock, p.is_active, p.created_utc, p.updated_utc
            FROM products p
            LEFT JOIN categories c ON c.category_id = p.category_id
            WHERE p.product_id = $1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get product: {}", e)))?;

        timer.observe_duration();
        Ok(product)
    }

    /// Create a new product.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(&self, input: &CreateProduct) -> Result<Product, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_product"])
            .start_timer();

        let product = sqlx::query_as::<_, Product>(
            r#"
            WITH inserted AS (
                INSERT INTO products (product_id, name, description, category_id, price, image_url, stock, is_active)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING product_id, name, description, category_id, price, image_url, stock, is_active, created_utc, updated_utc
            )
            SELECT i.product_id, i.name, i.description, i.category_id, c.name AS category_name,
                   i.price, i.image_url, i.stock, i.is_active, i.created_utc, i.updated_utc
            FROM inserted i
            LEFT JOIN categories c ON c.category_id = i.category_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.category_id)
        .bind(input.price)
        .bind(&input.image_url)
        .bind(input.stock)
        .bind(input.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create product: {}", e)))?;

        timer.observe_duration();
        info!(product_id = %product.product_id, "Product created");

        Ok(product)
    }

    /// Update a product. Absent fields are left unchanged.
    #[instrument(skip(self, input), fields(product_id = %product_id))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        input: &UpdateProduct,
    ) -> Result<Option<Product>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_product"])
            .start_timer();

        let product = sqlx::query_as::<_, Product>(
            r#"
            WITH updated AS (
                UPDATE products
                SET name = COALESCE($2, name),
                    description = COALESCE($3, description),
                    category_id = COALESCE($4, category_id),
                    price = COALESCE($5, price),
                    image_url = COALESCE($6, image_url),
                    stock = COALESCE($7, stock),
                    is_active = COALESCE($8, is_active),
                    updated_utc = NOW()
                WHERE product_id = $1
                RETURNING product_id, name, description, category_id, price, image_url, stock, is_active, created_utc, updated_utc
            )
            SELECT u.product_id, u.name, u.description, u.category_id, c.name AS category_name,
                   u.price, u.image_url, u.stock, u.is_active, u.created_utc, u.updated_utc
            FROM updated u
            LEFT JOIN categories c ON c.category_id = u.category_id
            "#,
        )
        .bind(product_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.category_id)
        .bind(input.price)
        .bind(&input.image_url)
        .bind(input.stock)
        .bind(input.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update product: {}", e)))?;

        timer.observe_duration();
        Ok(product)
    }

    // =========================================================================
    // Order Operations
    // =========================================================================

    /// Place an order: validate every line, decrement stock and raise the
    /// invoice, all in one transaction. Any failure rolls the whole
    /// placement back.
    #[instrument(skip(self, input), fields(user_id = %input.user_id, line_count = input.items.len()))]
    pub async fn place_order(
        &self,
        input: &PlaceOrder,
    ) -> Result<(Order, Vec<OrderItemRecord>), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["place_order"])
            .start_timer();

        if input.items.is_empty() {
            return Err(PlacementError::NoItems.into());
        }

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        // Each product row is locked for the duration of the transaction.
        // `reserved` carries quantities claimed by earlier lines so duplicate
        // lines of one product cannot jointly oversell it.
        let mut reserved: HashMap<Uuid, i32> = HashMap::new();
        let mut lines = Vec::with_capacity(input.items.len());
        let mut total = Decimal::ZERO;

        for item in &input.items {
            let row = sqlx::query_as::<_, ProductLine>(
                "SELECT product_id, name, price, stock, is_active FROM products WHERE product_id = $1 FOR UPDATE",
            )
            .bind(item.product_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to read product: {}", e))
            })?;

            let already = reserved.get(&item.product_id).copied().unwrap_or(0);
            let product = match check_line(row, item.product_id, item.quantity, already) {
                Ok(product) => product,
                Err(err) => {
                    tx.rollback().await.ok();
                    return Err(err.into());
                }
            };

            *reserved.entry(item.product_id).or_insert(0) += item.quantity;
            total += line_total(product.price, item.quantity);
            lines.push((product, item.quantity, already));
        }

        let order_id = Uuid::new_v4();
        let order = sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (order_id, user_id, username, total_amount, status, shipping_address, phone_number, email)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING order_id, user_id, username, total_amount, status, shipping_address, phone_number, email, created_utc, updated_utc
            "#,
        )
        .bind(order_id)
        .bind(input.user_id)
        .bind(&input.username)
        .bind(total)
        .bind(OrderStatus::Pending.as_str())
        .bind(&input.shipping_address)
        .bind(&input.phone_number)
        .bind(&input.email)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create order: {}", e)))?;

        for (product, quantity, already) in &lines {
            sqlx::query(
                "INSERT INTO order_items (order_item_id, order_id, product_id, quantity, price) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(Uuid::new_v4())
            .bind(order_id)
            .bind(product.product_id)
            .bind(*quantity)
            .bind(product.price)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to create order item: {}", e))
            })?;

            // The row is locked, so the guard cannot be beaten by a
            // concurrent placement; a zero row count still aborts rather
            // than let stock go negative.
            let updated = sqlx::query(
                "UPDATE products SET stock = stock - $2, updated_utc = NOW() WHERE product_id = $1 AND stock >= $2",
            )
            .bind(product.product_id)
            .bind(*quantity)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to decrement stock: {}", e))
            })?;

            if updated.rows_affected() == 0 {
                tx.rollback().await.ok();
                return Err(PlacementError::InsufficientStock {
                    name: product.name.clone(),
                    available: (product.stock - already).max(0),
                }
                .into());
            }
        }

        let today = Utc::now().date_naive();
        sqlx::query(
            "INSERT INTO invoices (invoice_id, order_id, invoice_number, status, due_date) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(Uuid::new_v4())
        .bind(order_id)
        .bind(invoice_number(order_id, today))
        .bind(InvoiceStatus::Unpaid.as_str())
        .bind(payment_due_date(today))
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create invoice: {}", e)))?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        let items = self.get_order_items(order_id).await?;

        timer.observe_duration();
        info!(order_id = %order_id, total = %order.total_amount, "Order placed");

        Ok((order, items))
    }

    /// List orders, newest first. A `user_id` filter scopes to one owner.
    #[instrument(skip(self, filter))]
    pub async fn list_orders(&self, filter: &ListOrdersFilter) -> Result<Vec<Order>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_orders"])
            .start_timer();

        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT order_id, user_id, username, total_amount, status, shipping_address, phone_number, email, created_utc, updated_utc
            FROM orders
            WHERE ($1::uuid IS NULL OR user_id = $1)
            ORDER BY created_utc DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list orders: {}", e)))?;

        timer.observe_duration();
        Ok(orders)
    }

    /// Get one order. `scope_user` hides other users' orders entirely.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(
        &self,
        order_id: Uuid,
        scope_user: Option<Uuid>,
    ) -> Result<Option<Order>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_order"])
            .start_timer();

        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT order_id, user_id, username, total_amount, status, shipping_address, phone_number, email, created_utc, updated_utc
            FROM orders
            WHERE order_id = $1 AND ($2::uuid IS NULL OR user_id = $2)
            "#,
        )
        .bind(order_id)
        .bind(scope_user)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get order: {}", e)))?;

        timer.observe_duration();
        Ok(order)
    }

    /// Items of one order, joined with current product names.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order_items(&self, order_id: Uuid) -> Result<Vec<OrderItemRecord>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_order_items"])
            .start_timer();

        let items = sqlx::query_as::<_, OrderItemRecord>(
            r#"
            SELECT oi.order_item_id, oi.order_id, oi.product_id, p.name AS product_name, oi.quantity, oi.price
            FROM order_items oi
            JOIN products p ON p.product_id = oi.product_id
            WHERE oi.order_id = $1
            ORDER BY oi.order_item_id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get order items: {}", e))
        })?;

        timer.observe_duration();
        Ok(items)
    }

    /// Items for a whole page of orders in one query.
    #[instrument(skip(self, order_ids))]
    pub async fn get_items_for_orders(
        &self,
        order_ids: &[Uuid],
    ) -> Result<Vec<OrderItemRecord>, AppError> {
        if order_ids.is_empty() {
            return Ok(Vec::new());
        }

        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_items_for_orders"])
            .start_timer();

        let items = sqlx::query_as::<_, OrderItemRecord>(
            r#"
            SELECT oi.order_item_id, oi.order_id, oi.product_id, p.name AS product_name, oi.quantity, oi.price
            FROM order_items oi
            JOIN products p ON p.product_id = oi.product_id
            WHERE oi.order_id = ANY($1)
            ORDER BY oi.order_id, oi.order_item_id
            "#,
        )
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get order items: {}", e))
        })?;

        timer.observe_duration();
        Ok(items)
    }

    /// Transition an order's status. Cancelling restores every item's stock
    /// in the same transaction; a cancelled order rejects any further
    /// transition so the restore can never run twice.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn update_order_status(
        &self,
        order_id: Uuid,
        scope_user: Option<Uuid>,
        new_status: OrderStatus,
    ) -> Result<Option<(Order, Vec<OrderItemRecord>)>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_order_status"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let existing = sqlx::query_as::<_, Order>(
            r#"
            SELECT order_id, user_id, username, total_amount, status, shipping_address, phone_number, email, created_utc, updated_utc
            FROM orders
            WHERE order_id = $1 AND ($2::uuid IS NULL OR user_id = $2)
            FOR UPDATE
            "#,
        )
        .bind(order_id)
        .bind(scope_user)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to read order: {}", e)))?;

        let Some(existing) = existing else {
            tx.rollback().await.ok();
            return Ok(None);
        };

        // A cancelled order already had its stock restored; a second
        // transition would either repeat the restore or strand it.
        if existing.status == OrderStatus::Cancelled.as_str() {
            tx.rollback().await.ok();
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Cancelled orders cannot change status"
            )));
        }

        let order = sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders
            SET status = $2, updated_utc = NOW()
            WHERE order_id = $1
            RETURNING order_id, user_id, username, total_amount, status, shipping_address, phone_number, email, created_utc, updated_utc
            "#,
        )
        .bind(order_id)
        .bind(new_status.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update order: {}", e)))?;

        if new_status == OrderStatus::Cancelled {
            // Quantities are summed per product first; duplicate lines of
            // one product would otherwise collapse into a single joined row.
            sqlx::query(
                r#"
                UPDATE products p
                SET stock = p.stock + restored.quantity, updated_utc = NOW()
                FROM (
                    SELECT product_id, SUM(quantity)::int AS quantity
                    FROM order_items
                    WHERE order_id = $1
                    GROUP BY product_id
                ) restored
                WHERE p.product_id = restored.product_id
                "#,
            )
            .bind(order_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to restore stock: {}", e))
            })?;
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        let items = self.get_order_items(order_id).await?;

        timer.observe_duration();
        info!(order_id = %order_id, status = %order.status, "Order status updated");

        Ok(Some((order, items)))
    }

    // =========================================================================
    // Invoice Operations
    // =========================================================================

    /// List invoices, newest first. `scope_user` restricts to invoices whose
    /// owning order belongs to that user.
    #[instrument(skip(self))]
    pub async fn list_invoices(&self, scope_user: Option<Uuid>) -> Result<Vec<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_invoices"])
            .start_timer();

        let invoices = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT i.invoice_id, i.order_id, i.invoice_number, o.username AS customer_name,
                   i.status, i.due_date, i.payment_method, i.payment_date, i.created_utc
            FROM invoices i
            JOIN orders o ON o.order_id = i.order_id
            WHERE ($1::uuid IS NULL OR o.user_id = $1)
            ORDER BY i.created_utc DESC
            "#,
        )
        .bind(scope_user)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list invoices: {}", e)))?;

        timer.observe_duration();
        Ok(invoices)
    }

    /// Unpaid invoices past their due date.
    #[instrument(skip(self))]
    pub async fn list_overdue_invoices(
        &self,
        scope_user: Option<Uuid>,
    ) -> Result<Vec<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_overdue_invoices"])
            .start_timer();

        let invoices = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT i.invoice_id, i.order_id, i.invoice_number, o.username AS customer_name,
                   i.status, i.due_date, i.payment_method, i.payment_date, i.created_utc
            FROM invoices i
            JOIN orders o ON o.order_id = i.order_id
            WHERE ($1::uuid IS NULL OR o.user_id = $1)
              AND i.status = 'unpaid'
              AND i.due_date < CURRENT_DATE
            ORDER BY i.due_date
            "#,
        )
        .bind(scope_user)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list overdue invoices: {}", e))
        })?;

        timer.observe_duration();
        Ok(invoices)
    }

    /// Get one invoice, scoped through its owning order.
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub async fn get_invoice(
        &self,
        invoice_id: Uuid,
        scope_user: Option<Uuid>,
    ) -> Result<Option<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_invoice"])
            .start_timer();

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT i.invoice_id, i.order_id, i.invoice_number, o.username AS customer_name,
                   i.status, i.due_date, i.payment_method, i.payment_date, i.created_utc
            FROM invoices i
            JOIN orders o ON o.order_id = i.order_id
            WHERE i.invoice_id = $1 AND ($2::uuid IS NULL OR o.user_id = $2)
            "#,
        )
        .bind(invoice_id)
        .bind(scope_user)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get invoice: {}", e)))?;

        timer.observe_duration();
        Ok(invoice)
    }

    /// Transition an invoice's status. Moving to `paid` stamps the payment
    /// date and method; nothing else touches payment metadata, and the due
    /// date never changes.
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub async fn update_invoice_status(
        &self,
        invoice_id: Uuid,
        scope_user: Option<Uuid>,
        new_status: InvoiceStatus,
        payment_method: Option<&str>,
    ) -> Result<Option<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_invoice_status"])
            .start_timer();

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            UPDATE invoices i
            SET status = $3,
                payment_date = CASE WHEN $3 = 'paid' THEN CURRENT_DATE ELSE i.payment_date END,
                payment_method = CASE WHEN $3 = 'paid' THEN COALESCE($4, '') ELSE i.payment_method END
            FROM orders o
            WHERE i.invoice_id = $1
              AND i.order_id = o.order_id
              AND ($2::uuid IS NULL OR o.user_id = $2)
            RETURNING i.invoice_id, i.order_id, i.invoice_number, o.username AS customer_name,
                      i.status, i.due_date, i.payment_method, i.payment_date, i.created_utc
            "#,
        )
        .bind(invoice_id)
        .bind(scope_user)
        .bind(new_status.as_str())
        .bind(payment_method)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update invoice: {}", e))
        })?;

        timer.observe_duration();

        if let Some(ref invoice) = invoice {
            info!(invoice_id = %invoice.invoice_id, status = %invoice.status, "Invoice status updated");
        }

        Ok(invoice)
    }

    // =========================================================================
    // Task Operations
    // =========================================================================

    /// List the caller's tasks, newest first.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_tasks(&self, user_id: Uuid) -> Result<Vec<Task>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_tasks"])
            .start_timer();

        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT task_id, user_id, username, title, description, status, due_date, created_utc, updated_utc
            FROM tasks
            WHERE user_id = $1
            ORDER BY created_utc DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list tasks: {}", e)))?;

        timer.observe_duration();
        Ok(tasks)
    }

    /// Get one of the caller's tasks. Tasks are private: other users' ids
    /// resolve to nothing.
    #[instrument(skip(self), fields(task_id = %task_id))]
    pub async fn get_task(&self, task_id: Uuid, user_id: Uuid) -> Result<Option<Task>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_task"])
            .start_timer();

        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT task_id, user_id, username, title, description, status, due_date, created_utc, updated_utc
            FROM tasks
            WHERE task_id = $1 AND user_id = $2
            "#,
        )
        .bind(task_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get task: {}", e)))?;

        timer.observe_duration();
        Ok(task)
    }

    /// Create a task.
    #[instrument(skip(self, input), fields(user_id = %input.user_id))]
    pub async fn create_task(&self, input: &CreateTask) -> Result<Task, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_task"])
            .start_timer();

        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (task_id, user_id, username, title, description, status, due_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING task_id, user_id, username, title, description, status, due_date, created_utc, updated_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.user_id)
        .bind(&input.username)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.status.as_str())
        .bind(input.due_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create task: {}", e)))?;

        timer.observe_duration();
        info!(task_id = %task.task_id, "Task created");

        Ok(task)
    }

    /// Update one of the caller's tasks. Absent fields are left unchanged.
    #[instrument(skip(self, input), fields(task_id = %task_id))]
    pub async fn update_task(
        &self,
        task_id: Uuid,
        user_id: Uuid,
        input: &UpdateTask,
    ) -> Result<Option<Task>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_task"])
            .start_timer();

        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET title = COALESCE($3, title),
                description = COALESCE($4, description),
                status = COALESCE($5, status),
                due_date = COALESCE($6, due_date),
                updated_utc = NOW()
            WHERE task_id = $1 AND user_id = $2
            RETURNING task_id, user_id, username, title, description, status, due_date, created_utc, updated_utc
            "#,
        )
        .bind(task_id)
        .bind(user_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.status.map(|s| s.as_str()))
        .bind(input.due_date)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update task: {}", e)))?;

        timer.observe_duration();
        Ok(task)
    }

    /// Delete one of the caller's tasks. Returns false when the id does not
    /// resolve within the caller's scope.
    #[instrument(skip(self), fields(task_id = %task_id))]
    pub async fn delete_task(&self, task_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_task"])
            .start_timer();

        let deleted = sqlx::query("DELETE FROM tasks WHERE task_id = $1 AND user_id = $2")
            .bind(task_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to delete task: {}", e)))?;

        timer.observe_duration();
        Ok(deleted.rows_affected() > 0)
    }

    // =========================================================================
    // User Profile Operations
    // =========================================================================

    /// Get a profile by user id.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_profile"])
            .start_timer();

        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT profile_id, user_id, username, email, avatar_url, bio, location, phone, website, created_utc, updated_utc
            FROM user_profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get profile: {}", e)))?;

        timer.observe_duration();
        Ok(profile)
    }

    /// Get the caller's profile, creating an empty one on first access.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_or_create_profile(
        &self,
        user_id: Uuid,
        username: &str,
        email: Option<&str>,
    ) -> Result<UserProfile, AppError> {
        if let Some(profile) = self.get_profile(user_id).await? {
            return Ok(profile);
        }

        let created = sqlx::query(
            r#"
            INSERT INTO user_profiles (profile_id, user_id, username, email)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(username)
        .bind(email)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create profile: {}", e)))?;

        if created.rows_affected() > 0 {
            info!(user_id = %user_id, "User profile created");
        }

        self.get_profile(user_id).await?.ok_or_else(|| {
            AppError::DatabaseError(anyhow::anyhow!("Profile row missing after insert"))
        })
    }

    /// Update the caller's profile. A new email must not be claimed by any
    /// other profile.
    #[instrument(skip(self, input), fields(user_id = %user_id))]
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        input: &UpdateUserProfile,
    ) -> Result<Option<UserProfile>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_profile"])
            .start_timer();

        if let Some(email) = &input.email {
            let taken = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM user_profiles WHERE email = $1 AND user_id <> $2)",
            )
            .bind(email)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to check email: {}", e))
            })?;

            if taken {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Email is already in use"
                )));
            }
        }

        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
            UPDATE user_profiles
            SET email = COALESCE($2, email),
                avatar_url = COALESCE($3, avatar_url),
                bio = COALESCE($4, bio),
                location = COALESCE($5, location),
                phone = COALESCE($6, phone),
                website = COALESCE($7, website),
                updated_utc = NOW()
            WHERE user_id = $1
            RETURNING profile_id, user_id, username, email, avatar_url, bio, location, phone, website, created_utc, updated_utc
            "#,
        )
        .bind(user_id)
        .bind(&input.email)
        .bind(&input.avatar_url)
        .bind(&input.bio)
        .bind(&input.location)
        .bind(&input.phone)
        .bind(&input.website)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update profile: {}", e)))?;

        timer.observe_duration();
        Ok(profile)
    }

    /// Get settings by user id.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_settings(&self, user_id: Uuid) -> Result<Option<UserSettings>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_settings"])
            .start_timer();

        let settings = sqlx::query_as::<_, UserSettings>(
            r#"
            SELECT settings_id, user_id, username, email_notifications, sms_notifications, browser_notifications, updated_utc
            FROM user_settings
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get settings: {}", e)))?;

        timer.observe_duration();
        Ok(settings)
    }

    /// Get the caller's notification settings, creating the default row on
    /// first access.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_or_create_settings(
        &self,
        user_id: Uuid,
        username: &str,
    ) -> Result<UserSettings, AppError> {
        if let Some(settings) = self.get_settings(user_id).await? {
            return Ok(settings);
        }

        let created = sqlx::query(
            r#"
            INSERT INTO user_settings (settings_id, user_id, username)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(username)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to create settings: {}", e))
        })?;

        if created.rows_affected() > 0 {
            info!(user_id = %user_id, "User settings created");
        }

        self.get_settings(user_id).await?.ok_or_else(|| {
            AppError::DatabaseError(anyhow::anyhow!("Settings row missing after insert"))
        })
    }

    /// Update the caller's notification settings. Absent fields are left
    /// unchanged.
    #[instrument(skip(self, input), fields(user_id = %user_id))]
    pub async fn update_settings(
        &self,
        user_id: Uuid,
        input: &UpdateUserSettings,
    ) -> Result<Option<UserSettings>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_settings"])
            .start_timer();

        let settings = sqlx::query_as::<_, UserSettings>(
            r#"
            UPDATE user_settings
            SET email_notifications = COALESCE($2, email_notifications),
                sms_notifications = COALESCE($3, sms_notifications),
                browser_notifications = COALESCE($4, browser_notifications),
                updated_utc = NOW()
            WHERE user_id = $1
            RETURNING settings_id, user_id, username, email_notifications, sms_notifications, browser_notifications, updated_utc
            "#,
        )
        .bind(user_id)
        .bind(input.email_notifications)
        .bind(input.sms_notifications)
        .bind(input.browser_notifications)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update settings: {}", e))
        })?;

        timer.observe_duration();
        Ok(settings)
    }

    // =========================================================================
    // Dashboard Operations
    // =========================================================================

    /// Dashboard for a regular user: their counts plus recent rows.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn user_dashboard(&self, user_id: Uuid) -> Result<UserDashboard, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["user_dashboard"])
            .start_timer();

        let task_count = self.count_tasks(user_id).await?;
        let order_count = self.count_orders(user_id).await?;

        let recent_tasks = sqlx::query_as::<_, RecentTask>(
            r#"
            SELECT task_id, title, status, due_date
            FROM tasks
            WHERE user_id = $1
            ORDER BY created_utc DESC
            LIMIT 5
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to load recent tasks: {}", e))
        })?;

        let recent_orders = sqlx::query_as::<_, RecentOrder>(
            r#"
            SELECT order_id, username, total_amount, status, created_utc
            FROM orders
            WHERE user_id = $1
            ORDER BY created_utc DESC
            LIMIT 5
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to load recent orders: {}", e))
        })?;

        timer.observe_duration();

        Ok(UserDashboard {
            task_count,
            order_count,
            recent_tasks,
            recent_orders,
        })
    }

    /// Dashboard for an admin: their own counts plus platform totals, the
    /// latest orders, daily sales for the trailing week and per-category
    /// product counts.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn admin_dashboard(&self, user_id: Uuid) -> Result<AdminDashboard, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["admin_dashboard"])
            .start_timer();

        let task_count = self.count_tasks(user_id).await?;
        let order_count = self.count_orders(user_id).await?;

        let totals = sqlx::query_as::<_, PlatformTotals>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM user_profiles) AS total_users,
                (SELECT COUNT(*) FROM products) AS total_products,
                (SELECT COUNT(*) FROM orders) AS total_orders,
                (SELECT COALESCE(SUM(total_amount), 0) FROM orders) AS total_revenue,
                (SELECT COUNT(*) FROM invoices WHERE status = 'unpaid' AND due_date < CURRENT_DATE) AS overdue_invoices
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to load platform totals: {}", e))
        })?;

        let recent_orders = sqlx::query_as::<_, RecentOrder>(
            r#"
            SELECT order_id, username, total_amount, status, created_utc
            FROM orders
            ORDER BY created_utc DESC
            LIMIT 5
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to load recent orders: {}", e))
        })?;

        // Only days that saw orders produce a point.
        let sales = sqlx::query_as::<_, SalesPoint>(
            r#"
            SELECT created_utc::date AS day, SUM(total_amount) AS amount
            FROM orders
            WHERE created_utc::date >= CURRENT_DATE - 7
            GROUP BY day
            ORDER BY day
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to load sales data: {}", e))
        })?;

        let categories = sqlx::query_as::<_, CategoryProductCount>(
            r#"
            SELECT c.name, COUNT(p.product_id) AS count
            FROM categories c
            LEFT JOIN products p ON p.category_id = c.category_id
            GROUP BY c.category_id, c.name
            ORDER BY c.name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to load category counts: {}", e))
        })?;

        timer.observe_duration();

        Ok(AdminDashboard {
            task_count,
            order_count,
            totals,
            recent_orders,
            sales,
            categories,
        })
    }

    /// The caller's ten most recent task and order events, merged and sorted
    /// by date descending.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn activity_timeline(&self, user_id: Uuid) -> Result<Vec<ActivityEntry>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["activity_timeline"])
            .start_timer();

        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT task_id, user_id, username, title, description, status, due_date, created_utc, updated_utc
            FROM tasks
            WHERE user_id = $1
            ORDER BY created_utc DESC
            LIMIT 10
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to load tasks: {}", e)))?;

        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT order_id, user_id, username, total_amount, status, shipping_address, phone_number, email, created_utc, updated_utc
            FROM orders
            WHERE user_id = $1
            ORDER BY created_utc DESC
            LIMIT 10
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to load orders: {}", e)))?;

        let mut timeline: Vec<ActivityEntry> = Vec::with_capacity(tasks.len() + orders.len());
        for task in tasks {
            timeline.push(ActivityEntry {
                kind: ActivityKind::Task,
                id: task.task_id,
                title: task.title,
                status: task.status,
                date: task.created_utc,
            });
        }
        for order in orders {
            timeline.push(ActivityEntry {
                kind: ActivityKind::Order,
                id: order.order_id,
                title: format!("Order #{}", order.order_id),
                status: order.status,
                date: order.created_utc,
            });
        }
        timeline.sort_by(|a, b| b.date.cmp(&a.date));
        timeline.truncate(10);

        timer.observe_duration();
        Ok(timeline)
    }

    async fn count_tasks(&self, user_id: Uuid) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tasks WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to count tasks: {}", e)))
    }

    async fn count_orders(&self, user_id: Uuid) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to count orders: {}", e)))
    }
}
