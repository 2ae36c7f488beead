use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{AddressId, CartItemId, CustomizationId, OrderId, OrderItemId, ProductId, UserId};
use domain::{
    Address, CartItem, Customization, Money, NewAddress, NewCartItem, NewCustomization,
    NewProduct, NewUser, Order, OrderDraft, OrderItem, OrderItemRecord, OrderStatus,
    PaymentOrder, PaymentStatus, PlaceOrder, Product, ProductQuery, ProductSummary, Quantity,
    User, UserUpdate,
};
use tokio::sync::RwLock;

use crate::{Result, StoreError, store::Store};

/// In-memory store implementation for tests and database-less runs.
///
/// All tables live behind one lock, so every operation is atomic with
/// respect to the others. `place_order` checks every precondition before
/// it mutates anything.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

#[derive(Default)]
struct State {
    users: BTreeMap<UserId, User>,
    products: BTreeMap<ProductId, Product>,
    customizations: BTreeMap<CustomizationId, Customization>,
    carts: BTreeMap<CartItemId, CartItem>,
    addresses: BTreeMap<AddressId, Address>,
    orders: BTreeMap<OrderId, OrderRow>,
    order_items: BTreeMap<OrderItemId, (OrderId, OrderItemRecord)>,
    payment_orders: HashMap<String, PaymentOrder>,
    sequences: Sequences,
}

struct OrderRow {
    user_id: UserId,
    address_id: AddressId,
    total: Money,
    status: OrderStatus,
    created_at: chrono::DateTime<Utc>,
    delivered_at: Option<chrono::DateTime<Utc>>,
}

/// Per-table id counters, mirroring BIGSERIAL columns.
#[derive(Default)]
struct Sequences {
    user: i64,
    product: i64,
    customization: i64,
    cart: i64,
    address: i64,
    order: i64,
    order_item: i64,
}

fn next(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

impl State {
    fn email_taken(&self, email: &str, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn owns_address(&self, address_id: AddressId, user_id: UserId) -> bool {
        self.addresses
            .get(&address_id)
            .is_some_and(|a| a.user_id == user_id)
    }

    fn cart_for(&self, user_id: UserId) -> Vec<CartItem> {
        self.carts
            .values()
            .filter(|item| item.user_id == user_id)
            .map(|item| {
                let mut item = item.clone();
                item.customization_details = item
                    .custom_id
                    .and_then(|id| self.customizations.get(&id))
                    .map(|c| c.details.clone());
                item
            })
            .collect()
    }

    fn owned_cart_line(&mut self, user_id: UserId, cart_id: CartItemId) -> Result<&mut CartItem> {
        self.carts
            .get_mut(&cart_id)
            .filter(|item| item.user_id == user_id)
            .ok_or(StoreError::CartItemNotFound(cart_id))
    }
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of orders placed so far.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Sets an order's status directly, bypassing the lifecycle rules.
    ///
    /// Stands in for the fulfilment back office, which is out of scope here.
    pub async fn force_order_status(&self, order_id: OrderId, status: OrderStatus) -> Result<()> {
        let mut state = self.state.write().await;
        let order = state
            .orders
            .get_mut(&order_id)
            .ok_or(StoreError::OrderNotFound(order_id))?;
        order.status = status;
        if status == OrderStatus::Delivered {
            order.delivered_at = Some(Utc::now());
        }
        Ok(())
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut state = self.state.write().await;
        if state.email_taken(&user.email, None) {
            return Err(StoreError::DuplicateEmail(user.email));
        }

        let user = User {
            id: UserId::new(next(&mut state.sequences.user)),
            email: user.email,
            name: user.name,
            password_hash: user.password_hash,
            phone_number: user.phone_number,
            provider: user.provider,
            picture: user.picture,
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user(&self, user_id: UserId) -> Result<Option<User>> {
        Ok(self.state.read().await.users.get(&user_id).cloned())
    }

    async fn update_user(&self, user_id: UserId, update: UserUpdate) -> Result<User> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&user_id) {
            return Err(StoreError::UserNotFound(user_id));
        }
        if state.email_taken(&update.email, Some(user_id)) {
            return Err(StoreError::DuplicateEmail(update.email));
        }

        let user = state
            .users
            .get_mut(&user_id)
            .ok_or(StoreError::UserNotFound(user_id))?;
        user.name = update.name;
        user.email = update.email;
        user.phone_number = update.phone_number;
        Ok(user.clone())
    }

    async fn list_products(&self, query: ProductQuery) -> Result<Vec<Product>> {
        let state = self.state.read().await;
        Ok(state
            .products
            .values()
            .filter(|p| query.matches(p))
            .cloned()
            .collect())
    }

    async fn get_product(&self, product_id: ProductId) -> Result<Option<Product>> {
        Ok(self.state.read().await.products.get(&product_id).cloned())
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product> {
        let mut state = self.state.write().await;
        let product = product.with_id(ProductId::new(next(&mut state.sequences.product)));
        state.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn create_customization(
        &self,
        customization: NewCustomization,
    ) -> Result<Customization> {
        let mut state = self.state.write().await;
        if !state.products.contains_key(&customization.product_id) {
            return Err(StoreError::ProductNotFound(customization.product_id));
        }
        if !state.users.contains_key(&customization.user_id) {
            return Err(StoreError::UserNotFound(customization.user_id));
        }

        let customization = Customization {
            id: CustomizationId::new(next(&mut state.sequences.customization)),
            product_id: customization.product_id,
            user_id: customization.user_id,
            details: customization.details,
            price: customization.price,
            created_at: Utc::now(),
        };
        state
            .customizations
            .insert(customization.id, customization.clone());
        Ok(customization)
    }

    async fn add_to_cart(&self, item: NewCartItem) -> Result<CartItemId> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&item.user_id) {
            return Err(StoreError::UserNotFound(item.user_id));
        }
        if !state.products.contains_key(&item.product_id) {
            return Err(StoreError::ProductNotFound(item.product_id));
        }
        if let Some(custom_id) = item.custom_id {
            let owned = state
                .customizations
                .get(&custom_id)
                .is_some_and(|c| c.user_id == item.user_id);
            if !owned {
                return Err(StoreError::CustomizationNotFound(custom_id));
            }
        }

        if let Some(line) = state.carts.values_mut().find(|line| line.same_line(&item)) {
            line.quantity = line.quantity.saturating_add(item.quantity);
            return Ok(line.id);
        }

        let id = CartItemId::new(next(&mut state.sequences.cart));
        state.carts.insert(
            id,
            CartItem {
                id,
                user_id: item.user_id,
                product_id: item.product_id,
                title: item.title,
                image_url: item.image_url,
                unit_price: item.unit_price,
                brand: item.brand,
                quantity: item.quantity,
                size: item.size,
                custom_id: item.custom_id,
                customization_details: None,
                added_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn list_cart(&self, user_id: UserId) -> Result<Vec<CartItem>> {
        Ok(self.state.read().await.cart_for(user_id))
    }

    async fn update_cart_quantity(
        &self,
        user_id: UserId,
        cart_id: CartItemId,
        quantity: Quantity,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        state.owned_cart_line(user_id, cart_id)?.quantity = quantity;
        Ok(())
    }

    async fn remove_cart_item(&self, user_id: UserId, cart_id: CartItemId) -> Result<()> {
        let mut state = self.state.write().await;
        state.owned_cart_line(user_id, cart_id)?;
        state.carts.remove(&cart_id);
        Ok(())
    }

    async fn add_address(&self, address: NewAddress) -> Result<Address> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&address.user_id) {
            return Err(StoreError::UserNotFound(address.user_id));
        }
        let address = address.with_id(AddressId::new(next(&mut state.sequences.address)));
        state.addresses.insert(address.id, address.clone());
        Ok(address)
    }

    async fn list_addresses(&self, user_id: UserId) -> Result<Vec<Address>> {
        let state = self.state.read().await;
        Ok(state
            .addresses
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn address_belongs_to(&self, address_id: AddressId, user_id: UserId) -> Result<bool> {
        Ok(self.state.read().await.owns_address(address_id, user_id))
    }

    async fn record_payment_order(&self, payment: PaymentOrder) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .payment_orders
            .insert(payment.gateway_order_id.clone(), payment);
        Ok(())
    }

    async fn get_payment_order(&self, gateway_order_id: &str) -> Result<Option<PaymentOrder>> {
        let state = self.state.read().await;
        Ok(state.payment_orders.get(gateway_order_id).cloned())
    }

    async fn place_order(&self, command: PlaceOrder) -> Result<OrderId> {
        let mut state = self.state.write().await;

        // Validate everything before touching any table
        let payment = state
            .payment_orders
            .get(&command.gateway_order_id)
            .filter(|p| p.user_id == command.user_id)
            .ok_or_else(|| StoreError::PaymentOrderNotFound(command.gateway_order_id.clone()))?;
        if payment.status != PaymentStatus::Created {
            return Err(StoreError::PaymentAlreadyCaptured(
                command.gateway_order_id.clone(),
            ));
        }
        let expected = payment.amount;

        if !state.owns_address(command.address_id, command.user_id) {
            return Err(StoreError::AddressNotOwned(command.address_id));
        }

        let cart = state.cart_for(command.user_id);
        let draft = OrderDraft::from_cart(&cart)?;
        if draft.total() != expected {
            return Err(StoreError::AmountMismatch {
                expected,
                actual: draft.total(),
            });
        }

        let order_id = OrderId::new(next(&mut state.sequences.order));
        state.orders.insert(
            order_id,
            OrderRow {
                user_id: command.user_id,
                address_id: command.address_id,
                total: draft.total(),
                status: OrderStatus::Placed,
                created_at: Utc::now(),
                delivered_at: None,
            },
        );

        for line in draft.into_lines() {
            let item_id = OrderItemId::new(next(&mut state.sequences.order_item));
            state.order_items.insert(
                item_id,
                (
                    order_id,
                    OrderItemRecord {
                        order_item_id: item_id,
                        product_id: line.product_id,
                        custom_id: line.custom_id,
                        quantity: line.quantity,
                        unit_price: line.unit_price,
                        size: line.size,
                    },
                ),
            );
        }

        state.carts.retain(|_, item| item.user_id != command.user_id);

        if let Some(payment) = state.payment_orders.get_mut(&command.gateway_order_id) {
            payment.status = PaymentStatus::Paid;
            payment.order_id = Some(order_id);
            payment.gateway_payment_id = Some(command.gateway_payment_id);
        }

        Ok(order_id)
    }

    async fn list_orders(&self, user_id: UserId) -> Result<Vec<Order>> {
        let state = self.state.read().await;

        let mut orders: Vec<Order> = state
            .orders
            .iter()
            .filter(|(_, row)| row.user_id == user_id)
            .filter_map(|(&order_id, row)| {
                let address = state.addresses.get(&row.address_id)?.snapshot();
                let items = state
                    .order_items
                    .values()
                    .filter(|(id, _)| *id == order_id)
                    .map(|(_, record)| {
                        let product = state
                            .products
                            .get(&record.product_id)
                            .map(ProductSummary::from);
                        OrderItem::describe(record.clone(), product)
                    })
                    .collect();
                Some(Order {
                    order_id,
                    total_amount: row.total,
                    status: row.status,
                    created_at: row.created_at,
                    delivered_at: row.delivered_at,
                    address,
                    items,
                })
            })
            .collect();

        orders.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.order_id.cmp(&a.order_id))
        });
        Ok(orders)
    }

    async fn cancel_order(&self, user_id: UserId, order_id: OrderId) -> Result<OrderStatus> {
        let mut state = self.state.write().await;
        let order = state
            .orders
            .get_mut(&order_id)
            .filter(|o| o.user_id == user_id)
            .ok_or(StoreError::OrderNotFound(order_id))?;

        order.status = order.status.transition(OrderStatus::Cancelled)?;
        Ok(order.status)
    }
}
