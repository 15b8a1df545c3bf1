//! Record store for the retail backend.
//!
//! The store exposes independent single-row operations per record kind
//! (get/insert/update/delete/list) over a remote relational database.
//! There is deliberately no transaction handle: every call is one
//! network round trip, and the consistency protocol in the `domain`
//! crate is built on exactly that constraint.
//!
//! Two implementations are provided:
//! - [`InMemoryRecordStore`] for tests, with failure injection
//! - [`PostgresRecordStore`] backed by `sqlx`

pub mod error;
pub mod memory;
pub mod postgres;
pub mod records;
pub mod store;

pub use error::{RecordStoreError, Result};
pub use memory::InMemoryRecordStore;
pub use postgres::PostgresRecordStore;
pub use records::{
    Customer, InvalidOrderStatus, InvalidPaymentMethod, InvalidPaymentStatus, NewCustomer,
    NewOrder, NewOrderItem, NewPayment, NewProduct, Order, OrderFilter, OrderItem, OrderStatus,
    Payment, PaymentFilter, PaymentMethod, PaymentStatus, Product, ProductFilter, ProductPatch,
};
pub use store::{DEFAULT_LIST_LIMIT, RecordStore};
