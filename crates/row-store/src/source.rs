use async_trait::async_trait;

use crate::{
    Address, ChangeSet, CommitSummary, Country, CountryId, Customer, CustomerId, CustomerJoinRow,
    Order, OrderHistory, OrderId, OrderStatus, Result, StatusId, StoreError,
};

/// Core trait for row source implementations.
///
/// A row source provides read access to the bookstore tables and applies
/// staged mutations as a single unit of work. All implementations must be
/// thread-safe (Send + Sync).
#[async_trait]
pub trait RowSource: Send + Sync {
    /// Returns the full customer ⟕ address ⟕ country join with per-customer
    /// order counts. No paging is applied.
    ///
    /// Rows are ordered by customer id, then address id, so the first row of
    /// each customer is the same on every call.
    async fn list_customer_join_rows(&self) -> Result<Vec<CustomerJoinRow>>;

    /// Retrieves a customer by id.
    async fn get_customer(&self, customer_id: CustomerId) -> Result<Option<Customer>>;

    /// Returns the highest customer id in use, or None for an empty table.
    async fn max_customer_id(&self) -> Result<Option<CustomerId>>;

    /// Retrieves all orders of a customer, ordered by order id.
    async fn list_orders_for_customer(&self, customer_id: CustomerId) -> Result<Vec<Order>>;

    /// Retrieves an order by id.
    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Returns the order status catalog, ordered by status id.
    async fn list_order_statuses(&self) -> Result<Vec<OrderStatus>>;

    /// Retrieves the status history of an order, oldest first.
    async fn list_history_for_order(&self, order_id: OrderId) -> Result<Vec<OrderHistory>>;

    /// Returns all countries, ordered by country id.
    async fn list_countries(&self) -> Result<Vec<Country>>;

    /// Resolves the country of a customer's first address link.
    async fn find_customer_country(&self, customer_id: CustomerId) -> Result<Option<Country>>;

    /// Returns the lowest-numbered address located in a country.
    async fn find_address_for_country(&self, country_id: CountryId) -> Result<Option<Address>>;

    /// Applies a change set atomically.
    ///
    /// Either every change is applied or none is. A write that targets a
    /// missing row fails with `ConcurrencyConflict`; a change that would
    /// orphan a dependent row fails with `ForeignKeyViolation`.
    async fn commit(&self, changes: ChangeSet) -> Result<CommitSummary>;
}

/// Extension trait providing convenience methods for row sources.
#[async_trait]
pub trait RowSourceExt: RowSource {
    /// Checks if a customer exists.
    async fn customer_exists(&self, customer_id: CustomerId) -> Result<bool> {
        Ok(self.get_customer(customer_id).await?.is_some())
    }

    /// Checks if an order exists.
    async fn order_exists(&self, order_id: OrderId) -> Result<bool> {
        Ok(self.get_order(order_id).await?.is_some())
    }

    /// Looks up the display text of a status id in the catalog.
    async fn status_value(&self, status_id: StatusId) -> Result<Option<String>> {
        Ok(self
            .list_order_statuses()
            .await?
            .into_iter()
            .find(|s| s.status_id == status_id)
            .map(|s| s.status_value))
    }
}

// Blanket implementation for all RowSource implementations
impl<T: RowSource + ?Sized> RowSourceExt for T {}

/// Rejects change sets that cannot be committed.
pub fn validate_change_set(changes: &ChangeSet) -> Result<()> {
    if changes.is_empty() {
        return Err(StoreError::EmptyChangeSet);
    }
    Ok(())
}
