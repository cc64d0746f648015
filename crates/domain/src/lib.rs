//! Domain layer for the bookstore admin core.
//!
//! This crate provides:
//! - Page arithmetic and paged lists
//! - Customer list aggregation over the denormalized join
//! - Customer administration and cascading deletion
//! - The manual order status workflow and its policy

pub mod customer;
pub mod error;
pub mod order_status;
pub mod pagination;

pub use customer::{
    CascadingDeleter, CustomerDraft, CustomerEditView, CustomerService, CustomerViewModel,
    DeletionSummary, OrderSummary, aggregate_customers,
};
pub use error::{DomainError, ValidationError};
pub use order_status::{OrderStatusWorkflow, StatusEditView, StatusPolicy};
pub use pagination::{PageInfo, PagedList, paginate};
