//! Domain entities persisted as MongoDB documents
//!
//! Every entity carries a UUID id and a creation timestamp. Serialized
//! representations go through the storage layer's JSON/BSON bridge, so the
//! field names here are the document field names.

pub mod category;
pub mod line_item;
pub mod order;
pub mod product;
pub mod user;

pub use category::Category;
pub use line_item::LineItem;
pub use order::{DEFAULT_ORDER_STATUS, Order, ShippingDetails};
pub use product::Product;
pub use user::{Address, User, UserProfile};
