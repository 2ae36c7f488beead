use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use common::{AddressId, CartItemId, CustomizationId, OrderId, OrderItemId, ProductId, UserId};
use domain::{
    Address, AddressSnapshot, CartItem, Customization, Money, NewAddress, NewCartItem,
    NewCustomization, NewProduct, NewUser, Order, OrderDraft, OrderItem, OrderItemRecord,
    OrderStatus, PaymentOrder, PaymentStatus, PlaceOrder, Product, ProductQuery, ProductSummary,
    Quantity, User, UserUpdate,
};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

use crate::{Result, StoreError, store::Store};

const USER_COLUMNS: &str =
    "user_id, email, name, password, phone_number, provider, picture, created_at";

const PRODUCT_COLUMNS: &str = "product_id, image_url, brand, title, colour, discounted_price, \
     price, percentage_discount, size, stock, top_level_category, second_level_category, \
     third_level_category, description, slug";

const ADDRESS_COLUMNS: &str = "address_id, user_id, address_line1, address_line2, city, state, \
     postal_code, country, is_default";

const PAYMENT_COLUMNS: &str = "gateway_order_id, user_id, address_id, amount, currency, receipt, \
     status, order_id, gateway_payment_id, created_at";

const CART_SELECT: &str = r#"
    SELECT c.cart_id, c.user_id, c.product_id, c.title, c.image_url, c.discounted_price,
           c.brand, c.quantity, c.size, c.custom_id, c.added_at,
           cp.customization_details
    FROM carts c
    LEFT JOIN customized_products cp ON cp.custom_id = c.custom_id
    WHERE c.user_id = $1
    ORDER BY c.cart_id ASC
"#;

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool and wraps it in a store.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
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

    fn row_to_user(row: PgRow) -> Result<User> {
        Ok(User {
            id: UserId::new(row.try_get("user_id")?),
            email: row.try_get("email")?,
            name: row.try_get("name")?,
            password_hash: row.try_get("password")?,
            phone_number: row.try_get("phone_number")?,
            provider: row.try_get::<String, _>("provider")?.parse()?,
            picture: row.try_get("picture")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        let sizes: serde_json::Value = row.try_get("size")?;
        Ok(Product {
            id: ProductId::new(row.try_get("product_id")?),
            image_url: row.try_get("image_url")?,
            brand: row.try_get("brand")?,
            title: row.try_get("title")?,
            colour: row.try_get("colour")?,
            discounted_price: Money::from_paise(row.try_get("discounted_price")?),
            price: Money::from_paise(row.try_get("price")?),
            percentage_discount: row.try_get("percentage_discount")?,
            sizes: serde_json::from_value(sizes)?,
            stock: row.try_get("stock")?,
            top_level_category: row.try_get("top_level_category")?,
            second_level_category: row.try_get("second_level_category")?,
            third_level_category: row.try_get("third_level_category")?,
            description: row.try_get("description")?,
            slug: row.try_get("slug")?,
        })
    }

    fn row_to_cart_item(row: PgRow) -> Result<CartItem> {
        Ok(CartItem {
            id: CartItemId::new(row.try_get("cart_id")?),
            user_id: UserId::new(row.try_get("user_id")?),
            product_id: ProductId::new(row.try_get("product_id")?),
            title: row.try_get("title")?,
            image_url: row.try_get("image_url")?,
            unit_price: Money::from_paise(row.try_get("discounted_price")?),
            brand: row.try_get("brand")?,
            quantity: quantity(&row)?,
            size: row.try_get("size")?,
            custom_id: row
                .try_get::<Option<i64>, _>("custom_id")?
                .map(CustomizationId::new),
            customization_details: row.try_get("customization_details")?,
            added_at: row.try_get("added_at")?,
        })
    }

    fn row_to_address(row: PgRow) -> Result<Address> {
        Ok(Address {
            id: AddressId::new(row.try_get("address_id")?),
            user_id: UserId::new(row.try_get("user_id")?),
            address_line1: row.try_get("address_line1")?,
            address_line2: row.try_get("address_line2")?,
            city: row.try_get("city")?,
            state: row.try_get("state")?,
            postal_code: row.try_get("postal_code")?,
            country: row.try_get("country")?,
            is_default: row.try_get("is_default")?,
        })
    }

    fn row_to_payment_order(row: PgRow) -> Result<PaymentOrder> {
        Ok(PaymentOrder {
            gateway_order_id: row.try_get("gateway_order_id")?,
            user_id: UserId::new(row.try_get("user_id")?),
            address_id: row
                .try_get::<Option<i64>, _>("address_id")?
                .map(AddressId::new),
            amount: Money::from_paise(row.try_get("amount")?),
            currency: row.try_get("currency")?,
            receipt: row.try_get("receipt")?,
            status: row.try_get::<String, _>("status")?.parse()?,
            order_id: row.try_get::<Option<i64>, _>("order_id")?.map(OrderId::new),
            gateway_payment_id: row.try_get("gateway_payment_id")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_order_item(row: &PgRow) -> Result<OrderItemRecord> {
        Ok(OrderItemRecord {
            order_item_id: OrderItemId::new(row.try_get("order_item_id")?),
            product_id: ProductId::new(row.try_get("product_id")?),
            custom_id: row
                .try_get::<Option<i64>, _>("custom_id")?
                .map(CustomizationId::new),
            quantity: quantity(row)?,
            unit_price: Money::from_paise(row.try_get("price")?),
            size: row.try_get("size")?,
        })
    }

    /// Loads the catalog entries referenced by order lines.
    async fn product_summaries(
        &self,
        ids: HashSet<i64>,
    ) -> Result<HashMap<ProductId, ProductSummary>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let ids: Vec<i64> = ids.into_iter().collect();
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE product_id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| Self::row_to_product(row).map(|p| (p.id, ProductSummary::from(&p))))
            .collect()
    }
}

fn quantity(row: &PgRow) -> Result<Quantity> {
    let raw: i32 = row.try_get("quantity")?;
    Ok(Quantity::new(i64::from(raw))?)
}

/// Returns true if the error is a violation of the named constraint.
fn violates(err: &sqlx::Error, constraint: &str) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.constraint() == Some(constraint))
}

#[async_trait]
impl Store for PostgresStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (email, name, password, phone_number, provider, picture)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(&user.phone_number)
        .bind(user.provider.as_str())
        .bind(&user.picture)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if violates(&e, "unique_user_email") {
                return StoreError::DuplicateEmail(user.email.clone());
            }
            StoreError::Database(e)
        })?;

        Self::row_to_user(row)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(Self::row_to_user)
            .transpose()
    }

    async fn find_user(&self, user_id: UserId) -> Result<Option<User>> {
        sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = $1"))
            .bind(user_id.get())
            .fetch_optional(&self.pool)
            .await?
            .map(Self::row_to_user)
            .transpose()
    }

    async fn update_user(&self, user_id: UserId, update: UserUpdate) -> Result<User> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users SET name = $2, email = $3, phone_number = $4
            WHERE user_id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id.get())
        .bind(&update.name)
        .bind(&update.email)
        .bind(&update.phone_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if violates(&e, "unique_user_email") {
                return StoreError::DuplicateEmail(update.email.clone());
            }
            StoreError::Database(e)
        })?
        .ok_or(StoreError::UserNotFound(user_id))?;

        Self::row_to_user(row)
    }

    async fn list_products(&self, query: ProductQuery) -> Result<Vec<Product>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE TRUE"));
        if let Some(category) = query.category {
            builder
                .push(" AND LOWER(top_level_category) = LOWER(")
                .push_bind(category)
                .push(")");
        }
        if let Some(exclude) = query.exclude {
            builder.push(" AND product_id <> ").push_bind(exclude.get());
        }
        builder.push(" ORDER BY product_id ASC");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn get_product(&self, product_id: ProductId) -> Result<Option<Product>> {
        sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE product_id = $1"
        ))
        .bind(product_id.get())
        .fetch_optional(&self.pool)
        .await?
        .map(Self::row_to_product)
        .transpose()
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product> {
        let sizes = serde_json::to_value(&product.sizes)?;
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO products (image_url, brand, title, colour, discounted_price, price,
                percentage_discount, size, stock, top_level_category, second_level_category,
                third_level_category, description, slug)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING product_id
            "#,
        )
        .bind(&product.image_url)
        .bind(&product.brand)
        .bind(&product.title)
        .bind(&product.colour)
        .bind(product.discounted_price.paise())
        .bind(product.price.paise())
        .bind(product.percentage_discount)
        .bind(sizes)
        .bind(product.stock)
        .bind(&product.top_level_category)
        .bind(&product.second_level_category)
        .bind(&product.third_level_category)
        .bind(&product.description)
        .bind(&product.slug)
        .fetch_one(&self.pool)
        .await?;

        Ok(product.with_id(ProductId::new(id)))
    }

    async fn create_customization(
        &self,
        customization: NewCustomization,
    ) -> Result<Customization> {
        let row = sqlx::query(
            r#"
            INSERT INTO customized_products (product_id, user_id, customization_details, price)
            VALUES ($1, $2, $3, $4)
            RETURNING custom_id, created_at
            "#,
        )
        .bind(customization.product_id.get())
        .bind(customization.user_id.get())
        .bind(&customization.details)
        .bind(customization.price.paise())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if violates(&e, "customized_products_product_id_fkey") {
                return StoreError::ProductNotFound(customization.product_id);
            }
            if violates(&e, "customized_products_user_id_fkey") {
                return StoreError::UserNotFound(customization.user_id);
            }
            StoreError::Database(e)
        })?;

        Ok(Customization {
            id: CustomizationId::new(row.try_get("custom_id")?),
            product_id: customization.product_id,
            user_id: customization.user_id,
            details: customization.details,
            price: customization.price,
            created_at: row.try_get("created_at")?,
        })
    }

    async fn add_to_cart(&self, item: NewCartItem) -> Result<CartItemId> {
        if let Some(custom_id) = item.custom_id {
            let owned: bool = sqlx::query_scalar(
                "SELECT EXISTS (SELECT 1 FROM customized_products WHERE custom_id = $1 AND user_id = $2)",
            )
            .bind(custom_id.get())
            .bind(item.user_id.get())
            .fetch_one(&self.pool)
            .await?;
            if !owned {
                return Err(StoreError::CustomizationNotFound(custom_id));
            }
        }

        // Quantities saturate at INTEGER max, matching Quantity::saturating_add
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO carts (user_id, product_id, title, image_url, discounted_price, brand,
                quantity, size, custom_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (user_id, product_id, (COALESCE(size, '')), (COALESCE(custom_id, 0)))
            DO UPDATE SET quantity =
                LEAST(carts.quantity::BIGINT + EXCLUDED.quantity, 2147483647)::INTEGER
            RETURNING cart_id
            "#,
        )
        .bind(item.user_id.get())
        .bind(item.product_id.get())
        .bind(&item.title)
        .bind(&item.image_url)
        .bind(item.unit_price.paise())
        .bind(&item.brand)
        .bind(item.quantity.as_i32())
        .bind(&item.size)
        .bind(item.custom_id.map(CustomizationId::get))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if violates(&e, "carts_product_id_fkey") {
                return StoreError::ProductNotFound(item.product_id);
            }
            if violates(&e, "carts_user_id_fkey") {
                return StoreError::UserNotFound(item.user_id);
            }
            StoreError::Database(e)
        })?;

        Ok(CartItemId::new(id))
    }

    async fn list_cart(&self, user_id: UserId) -> Result<Vec<CartItem>> {
        let rows = sqlx::query(CART_SELECT)
            .bind(user_id.get())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_cart_item).collect()
    }

    async fn update_cart_quantity(
        &self,
        user_id: UserId,
        cart_id: CartItemId,
        quantity: Quantity,
    ) -> Result<()> {
        let result =
            sqlx::query("UPDATE carts SET quantity = $3 WHERE cart_id = $1 AND user_id = $2")
                .bind(cart_id.get())
                .bind(user_id.get())
                .bind(quantity.as_i32())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::CartItemNotFound(cart_id));
        }
        Ok(())
    }

    async fn remove_cart_item(&self, user_id: UserId, cart_id: CartItemId) -> Result<()> {
        let result = sqlx::query("DELETE FROM carts WHERE cart_id = $1 AND user_id = $2")
            .bind(cart_id.get())
            .bind(user_id.get())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::CartItemNotFound(cart_id));
        }
        Ok(())
    }

    async fn add_address(&self, address: NewAddress) -> Result<Address> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO addresses (user_id, address_line1, address_line2, city, state,
                postal_code, country, is_default)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING address_id
            "#,
        )
        .bind(address.user_id.get())
        .bind(&address.address_line1)
        .bind(&address.address_line2)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.postal_code)
        .bind(&address.country)
        .bind(address.is_default)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if violates(&e, "addresses_user_id_fkey") {
                return StoreError::UserNotFound(address.user_id);
            }
            StoreError::Database(e)
        })?;

        Ok(address.with_id(AddressId::new(id)))
    }

    async fn list_addresses(&self, user_id: UserId) -> Result<Vec<Address>> {
        let rows = sqlx::query(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE user_id = $1 ORDER BY address_id ASC"
        ))
        .bind(user_id.get())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_address).collect()
    }

    async fn address_belongs_to(&self, address_id: AddressId, user_id: UserId) -> Result<bool> {
        let owned: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM addresses WHERE address_id = $1 AND user_id = $2)",
        )
        .bind(address_id.get())
        .bind(user_id.get())
        .fetch_one(&self.pool)
        .await?;

        Ok(owned)
    }

    async fn record_payment_order(&self, payment: PaymentOrder) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO payment_orders (gateway_order_id, user_id, address_id, amount, currency,
                receipt, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&payment.gateway_order_id)
        .bind(payment.user_id.get())
        .bind(payment.address_id.map(AddressId::get))
        .bind(payment.amount.paise())
        .bind(&payment.currency)
        .bind(&payment.receipt)
        .bind(payment.status.as_str())
        .bind(payment.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_payment_order(&self, gateway_order_id: &str) -> Result<Option<PaymentOrder>> {
        sqlx::query(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payment_orders WHERE gateway_order_id = $1"
        ))
        .bind(gateway_order_id)
        .fetch_optional(&self.pool)
        .await?
        .map(Self::row_to_payment_order)
        .transpose()
    }

    #[tracing::instrument(
        skip(self, command),
        fields(user_id = %command.user_id, gateway_order_id = %command.gateway_order_id)
    )]
    async fn place_order(&self, command: PlaceOrder) -> Result<OrderId> {
        // Dropping the transaction without commit rolls everything back
        let mut tx = self.pool.begin().await?;

        let payment = sqlx::query(
            r#"
            SELECT amount, status FROM payment_orders
            WHERE gateway_order_id = $1 AND user_id = $2
            FOR UPDATE
            "#,
        )
        .bind(&command.gateway_order_id)
        .bind(command.user_id.get())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::PaymentOrderNotFound(command.gateway_order_id.clone()))?;

        let status: PaymentStatus = payment.try_get::<String, _>("status")?.parse()?;
        if status != PaymentStatus::Created {
            return Err(StoreError::PaymentAlreadyCaptured(
                command.gateway_order_id.clone(),
            ));
        }
        let expected = Money::from_paise(payment.try_get("amount")?);

        let owns_address: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM addresses WHERE address_id = $1 AND user_id = $2)",
        )
        .bind(command.address_id.get())
        .bind(command.user_id.get())
        .fetch_one(&mut *tx)
        .await?;
        if !owns_address {
            return Err(StoreError::AddressNotOwned(command.address_id));
        }

        let cart_rows = sqlx::query(&format!("{CART_SELECT} FOR UPDATE OF c"))
            .bind(command.user_id.get())
            .fetch_all(&mut *tx)
            .await?;
        let cart = cart_rows
            .into_iter()
            .map(Self::row_to_cart_item)
            .collect::<Result<Vec<_>>>()?;

        let draft = OrderDraft::from_cart(&cart)?;
        if draft.total() != expected {
            return Err(StoreError::AmountMismatch {
                expected,
                actual: draft.total(),
            });
        }

        let order_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO orders (user_id, address_id, total_amount, status)
            VALUES ($1, $2, $3, $4)
            RETURNING order_id
            "#,
        )
        .bind(command.user_id.get())
        .bind(command.address_id.get())
        .bind(draft.total().paise())
        .bind(OrderStatus::Placed.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let mut items: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO order_items (order_id, product_id, custom_id, quantity, price, size) ",
        );
        items.push_values(draft.lines(), |mut row, line| {
            row.push_bind(order_id)
                .push_bind(line.product_id.get())
                .push_bind(line.custom_id.map(CustomizationId::get))
                .push_bind(line.quantity.as_i32())
                .push_bind(line.unit_price.paise())
                .push_bind(line.size.clone());
        });
        items.build().execute(&mut *tx).await?;

        // Only the locked lines that went into the order; a line added meanwhile stays
        let drafted: Vec<i64> = cart.iter().map(|item| item.id.get()).collect();
        sqlx::query("DELETE FROM carts WHERE user_id = $1 AND cart_id = ANY($2)")
            .bind(command.user_id.get())
            .bind(&drafted)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            UPDATE payment_orders
            SET status = $2, order_id = $3, gateway_payment_id = $4, paid_at = NOW()
            WHERE gateway_order_id = $1
            "#,
        )
        .bind(&command.gateway_order_id)
        .bind(PaymentStatus::Paid.as_str())
        .bind(order_id)
        .bind(&command.gateway_payment_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            order_id,
            items = draft.lines().len(),
            total_paise = draft.total().paise(),
            "order placed"
        );
        Ok(OrderId::new(order_id))
    }

    async fn list_orders(&self, user_id: UserId) -> Result<Vec<Order>> {
        let order_rows = sqlx::query(
            r#"
            SELECT o.order_id, o.total_amount, o.status, o.created_at, o.delivered_at,
                   a.address_line1, a.address_line2, a.city, a.state, a.postal_code, a.country
            FROM orders o
            JOIN addresses a ON a.address_id = o.address_id
            WHERE o.user_id = $1
            ORDER BY o.created_at DESC, o.order_id DESC
            "#,
        )
        .bind(user_id.get())
        .fetch_all(&self.pool)
        .await?;

        let item_rows = sqlx::query(
            r#"
            SELECT oi.order_id, oi.order_item_id, oi.product_id, oi.custom_id, oi.quantity,
                   oi.price, oi.size
            FROM order_items oi
            JOIN orders o ON o.order_id = oi.order_id
            WHERE o.user_id = $1
            ORDER BY oi.order_item_id ASC
            "#,
        )
        .bind(user_id.get())
        .fetch_all(&self.pool)
        .await?;

        let mut records: Vec<(OrderId, OrderItemRecord)> = Vec::with_capacity(item_rows.len());
        for row in &item_rows {
            let order_id = OrderId::new(row.try_get("order_id")?);
            records.push((order_id, Self::row_to_order_item(row)?));
        }

        let product_ids = records
            .iter()
            .map(|(_, record)| record.product_id.get())
            .collect();
        let summaries = self.product_summaries(product_ids).await?;

        let mut items_by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for (order_id, record) in records {
            let summary = summaries.get(&record.product_id).cloned();
            items_by_order
                .entry(order_id)
                .or_default()
                .push(OrderItem::describe(record, summary));
        }

        order_rows
            .into_iter()
            .map(|row| -> Result<Order> {
                let order_id = OrderId::new(row.try_get("order_id")?);
                Ok(Order {
                    order_id,
                    total_amount: Money::from_paise(row.try_get("total_amount")?),
                    status: row.try_get::<String, _>("status")?.parse()?,
                    created_at: row.try_get("created_at")?,
                    delivered_at: row.try_get("delivered_at")?,
                    address: AddressSnapshot {
                        address_line1: row.try_get("address_line1")?,
                        address_line2: row.try_get("address_line2")?,
                        city: row.try_get("city")?,
                        state: row.try_get("state")?,
                        postal_code: row.try_get("postal_code")?,
                        country: row.try_get("country")?,
                    },
                    items: items_by_order.remove(&order_id).unwrap_or_default(),
                })
            })
            .collect()
    }

    async fn cancel_order(&self, user_id: UserId, order_id: OrderId) -> Result<OrderStatus> {
        let mut tx = self.pool.begin().await?;

        let status: String = sqlx::query_scalar(
            "SELECT status FROM orders WHERE order_id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(order_id.get())
        .bind(user_id.get())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::OrderNotFound(order_id))?;

        let current: OrderStatus = status.parse()?;
        let next = current.transition(OrderStatus::Cancelled)?;

        sqlx::query("UPDATE orders SET status = $2 WHERE order_id = $1")
            .bind(order_id.get())
            .bind(next.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(next)
    }
}
