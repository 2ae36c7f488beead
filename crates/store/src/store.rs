use async_trait::async_trait;
use common::{AddressId, CartItemId, OrderId, ProductId, UserId};
use domain::{
    Address, CartItem, Customization, NewAddress, NewCartItem, NewCustomization, NewProduct,
    NewUser, Order, OrderStatus, PaymentOrder, PlaceOrder, Product, ProductQuery, Quantity, User,
    UserUpdate,
};

use crate::{Result, StoreError};

/// Core trait for storefront persistence.
///
/// Implementations must behave identically: the in-memory store is the
/// reference used by the API tests and the PostgreSQL store is used in
/// production. All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Store: Send + Sync {
    /// Creates a user. Fails with `DuplicateEmail` if the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User>;

    /// Looks a user up by normalized email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Looks a user up by id.
    async fn find_user(&self, user_id: UserId) -> Result<Option<User>>;

    /// Replaces a user's name, email and phone number.
    async fn update_user(&self, user_id: UserId, update: UserUpdate) -> Result<User>;

    /// Lists catalog products matching the query, ordered by id.
    async fn list_products(&self, query: ProductQuery) -> Result<Vec<Product>>;

    async fn get_product(&self, product_id: ProductId) -> Result<Option<Product>>;

    async fn insert_product(&self, product: NewProduct) -> Result<Product>;

    /// Stores a customer's design for a product.
    async fn create_customization(&self, customization: NewCustomization)
    -> Result<Customization>;

    /// Adds a line to the cart.
    ///
    /// If the user already has a line for the same product, size and
    /// customization, its quantity is increased instead. Returns the id of
    /// the line that now holds the quantity.
    async fn add_to_cart(&self, item: NewCartItem) -> Result<CartItemId>;

    /// Lists a user's cart lines with their customization details.
    async fn list_cart(&self, user_id: UserId) -> Result<Vec<CartItem>>;

    /// Sets the quantity of one of the user's cart lines.
    async fn update_cart_quantity(
        &self,
        user_id: UserId,
        cart_id: CartItemId,
        quantity: Quantity,
    ) -> Result<()>;

    /// Removes one of the user's cart lines.
    async fn remove_cart_item(&self, user_id: UserId, cart_id: CartItemId) -> Result<()>;

    async fn add_address(&self, address: NewAddress) -> Result<Address>;

    async fn list_addresses(&self, user_id: UserId) -> Result<Vec<Address>>;

    /// Returns true if the address exists and belongs to the user.
    async fn address_belongs_to(&self, address_id: AddressId, user_id: UserId) -> Result<bool>;

    /// Records a payment order opened with the gateway.
    async fn record_payment_order(&self, payment: PaymentOrder) -> Result<()>;

    async fn get_payment_order(&self, gateway_order_id: &str) -> Result<Option<PaymentOrder>>;

    /// Converts a verified payment and the user's cart into an order.
    ///
    /// Runs as one transaction: the payment order is locked and checked, the
    /// address ownership is checked, the cart is turned into an order whose
    /// total must match the payment amount, the cart is cleared and the
    /// payment order is marked paid. Any failure leaves every table untouched.
    async fn place_order(&self, command: PlaceOrder) -> Result<OrderId>;

    /// Lists a user's orders, newest first, with their address and items.
    async fn list_orders(&self, user_id: UserId) -> Result<Vec<Order>>;

    /// Cancels one of the user's orders and returns its new status.
    async fn cancel_order(&self, user_id: UserId, order_id: OrderId) -> Result<OrderStatus>;
}

/// Extension trait providing convenience methods for stores.
#[async_trait]
pub trait StoreExt: Store {
    /// Loads a product or fails with `ProductNotFound`.
    async fn require_product(&self, product_id: ProductId) -> Result<Product> {
        self.get_product(product_id)
            .await?
            .ok_or(StoreError::ProductNotFound(product_id))
    }

    /// Loads a user or fails with `UserNotFound`.
    async fn require_user(&self, user_id: UserId) -> Result<User> {
        self.find_user(user_id)
            .await?
            .ok_or(StoreError::UserNotFound(user_id))
    }

    /// Fails with `AddressNotOwned` unless the address belongs to the user.
    async fn require_address(&self, address_id: AddressId, user_id: UserId) -> Result<()> {
        if self.address_belongs_to(address_id, user_id).await? {
            Ok(())
        } else {
            Err(StoreError::AddressNotOwned(address_id))
        }
    }
}

// Blanket implementation for all Store implementations
impl<T: Store + ?Sized> StoreExt for T {}

