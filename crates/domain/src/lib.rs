//! Storefront domain layer.
//!
//! Value objects and business rules for the catalog, carts, addresses,
//! customizations, orders and payment records. Nothing here performs I/O;
//! persistence lives in the `store` crate.

pub mod address;
pub mod cart;
pub mod catalog;
pub mod customization;
pub mod error;
pub mod order;
pub mod payment;
pub mod user;
pub mod value_objects;

pub use address::{Address, AddressInput, AddressSnapshot, NewAddress};
pub use cart::{CartItem, NewCartItem, cart_total};
pub use catalog::{CatalogEntry, NewProduct, Product, ProductQuery};
pub use customization::{Customization, NewCustomization};
pub use error::DomainError;
pub use order::{
    Order, OrderDraft, OrderItem, OrderItemRecord, OrderLine, OrderStatus, ProductSummary,
};
pub use payment::{PaymentOrder, PaymentStatus, PlaceOrder, receipt_for};
pub use user::{
    AuthProvider, GoogleProfile, NewUser, Registration, User, UserProfile, UserUpdate,
    normalize_email,
};
pub use value_objects::{Money, Quantity};
