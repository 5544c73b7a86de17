//! Route handlers, one module per resource

pub mod categories;
pub mod orders;
pub mod products;
pub mod users;
