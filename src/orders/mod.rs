//! The order workflow and its collaborators
//!
//! - [`pricing`]: subtotal/total arithmetic and quantity validation
//! - [`catalog`]: read-only product price resolution
//! - [`workflow`]: the creation state machine, deletion cascade, listings
//!   and read-side aggregates

pub mod catalog;
pub mod pricing;
pub mod workflow;

pub use catalog::Catalog;
pub use workflow::{NewOrder, NewOrderItem, OrderWorkflow, WorkflowOptions, WriteMode};
