//! Identifier types shared by every crate in the workspace.

pub mod types;

pub use types::{AddressId, BookId, CountryId, CustomerId, HistoryId, LineId, OrderId, StatusId};
