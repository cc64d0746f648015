//! Row-source abstraction for the bookstore admin core.
//!
//! The core never knows how rows are stored. It reads through the
//! [`RowSource`] trait and writes by handing a [`ChangeSet`] to
//! [`RowSource::commit`], which applies it as one unit of work.

pub mod changes;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod rows;
pub mod source;

pub use changes::{Change, ChangeSet, CommitSummary};
pub use common::{
    AddressId, BookId, CountryId, CustomerId, HistoryId, LineId, OrderId, StatusId,
};
pub use error::{Result, StoreError};
pub use memory::{InMemoryRowSource, default_status_catalog};
pub use postgres::PostgresRowSource;
pub use rows::{
    Address, Country, Customer, CustomerAddress, CustomerJoinRow, Order, OrderHistory, OrderLine,
    OrderStatus, UNKNOWN_COUNTRY,
};
pub use source::{RowSource, RowSourceExt};
