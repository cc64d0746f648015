//! HTTP route handlers and the state they share.

pub mod customers;
pub mod health;
pub mod metrics;
pub mod orders;

use std::num::NonZeroUsize;

use domain::{CascadingDeleter, CustomerService, OrderStatusWorkflow};
use row_store::RowSource;

/// Shared application state accessible from all handlers.
pub struct AppState<S: RowSource> {
    pub customers: CustomerService<S>,
    pub deleter: CascadingDeleter<S>,
    pub workflow: OrderStatusWorkflow<S>,
    pub source: S,

    /// Page size used when a list request does not give one.
    pub default_page_size: NonZeroUsize,
}
