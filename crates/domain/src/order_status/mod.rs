//! Manual order status changes with an audit trail.

mod policy;
mod workflow;

pub use policy::StatusPolicy;
pub use workflow::{OrderStatusWorkflow, StatusEditView};
