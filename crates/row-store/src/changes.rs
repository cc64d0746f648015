use crate::{Customer, CustomerAddress, CustomerId, Order, OrderHistory, OrderId};

/// A single staged mutation.
#[derive(Debug, Clone)]
pub enum Change {
    InsertCustomer(Customer),
    UpdateCustomer(Customer),
    InsertCustomerAddress(CustomerAddress),
    RemoveCustomerAddresses(CustomerId),
    UpdateOrder(Order),
    AppendHistory(OrderHistory),
    RemoveOrderHistories(Vec<OrderId>),
    RemoveOrderLines(Vec<OrderId>),
    RemoveOrders(Vec<OrderId>),
    RemoveCustomer(CustomerId),
}

/// Builder for a unit of work.
///
/// Changes are applied in the order they were staged, and a row source
/// applies either all of them or none.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    /// Creates an empty change set.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_customer(mut self, customer: Customer) -> Self {
        self.changes.push(Change::InsertCustomer(customer));
        self
    }

    /// Overwrites name and email of an existing customer.
    pub fn update_customer(mut self, customer: Customer) -> Self {
        self.changes.push(Change::UpdateCustomer(customer));
        self
    }

    pub fn insert_customer_address(mut self, link: CustomerAddress) -> Self {
        self.changes.push(Change::InsertCustomerAddress(link));
        self
    }

    /// Removes every address link of a customer.
    pub fn remove_customer_addresses(mut self, customer_id: CustomerId) -> Self {
        self.changes.push(Change::RemoveCustomerAddresses(customer_id));
        self
    }

    /// Overwrites an existing order. Fails the commit if the order is gone.
    pub fn update_order(mut self, order: Order) -> Self {
        self.changes.push(Change::UpdateOrder(order));
        self
    }

    pub fn append_history(mut self, entry: OrderHistory) -> Self {
        self.changes.push(Change::AppendHistory(entry));
        self
    }

    /// Removes all history entries belonging to any of the given orders.
    pub fn remove_order_histories_by_order_ids(mut self, order_ids: Vec<OrderId>) -> Self {
        self.changes.push(Change::RemoveOrderHistories(order_ids));
        self
    }

    /// Removes all lines belonging to any of the given orders.
    pub fn remove_order_lines_by_order_ids(mut self, order_ids: Vec<OrderId>) -> Self {
        self.changes.push(Change::RemoveOrderLines(order_ids));
        self
    }

    pub fn remove_orders(mut self, order_ids: Vec<OrderId>) -> Self {
        self.changes.push(Change::RemoveOrders(order_ids));
        self
    }

    /// Removes the customer row. Fails the commit if the customer is gone.
    pub fn remove_customer(mut self, customer_id: CustomerId) -> Self {
        self.changes.push(Change::RemoveCustomer(customer_id));
        self
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Change> {
        self.changes.iter()
    }
}

impl IntoIterator for ChangeSet {
    type Item = Change;
    type IntoIter = std::vec::IntoIter<Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}

/// Affected-row counts reported by a successful commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitSummary {
    pub rows_inserted: usize,
    pub rows_updated: usize,
    pub order_histories_removed: usize,
    pub order_lines_removed: usize,
    pub orders_removed: usize,
    pub customer_addresses_removed: usize,
    pub customers_removed: usize,
}

impl CommitSummary {
    /// Total number of rows removed across all tables.
    pub fn rows_removed(&self) -> usize {
        self.order_histories_removed
            + self.order_lines_removed
            + self.orders_removed
            + self.customer_addresses_removed
            + self.customers_removed
    }
}
