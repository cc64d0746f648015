//! Customer list aggregation, administration and cascading deletion.

mod aggregator;
mod deleter;
mod service;

pub use aggregator::{CustomerViewModel, aggregate_customers};
pub use deleter::{CascadingDeleter, DeletionSummary};
pub use service::{CustomerDraft, CustomerEditView, CustomerService, OrderSummary};
