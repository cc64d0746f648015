use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    Address, AddressId, Change, ChangeSet, CommitSummary, Country, CountryId, Customer,
    CustomerAddress, CustomerId, CustomerJoinRow, LineId, Order, OrderHistory, OrderId, OrderLine,
    OrderStatus, Result, StatusId, StoreError, UNKNOWN_COUNTRY,
    source::{RowSource, validate_change_set},
};

/// The bookstore tables held by [`InMemoryRowSource`].
#[derive(Debug, Clone, Default)]
struct Tables {
    customers: BTreeMap<CustomerId, Customer>,
    customer_addresses: Vec<CustomerAddress>,
    addresses: BTreeMap<AddressId, Address>,
    countries: BTreeMap<CountryId, Country>,
    orders: BTreeMap<OrderId, Order>,
    order_lines: BTreeMap<LineId, OrderLine>,
    statuses: BTreeMap<StatusId, OrderStatus>,
    history: Vec<OrderHistory>,
}

impl Tables {
    fn links_for(&self, customer_id: CustomerId) -> Vec<&CustomerAddress> {
        let mut links: Vec<_> = self
            .customer_addresses
            .iter()
            .filter(|ca| ca.customer_id == customer_id)
            .collect();
        links.sort_by_key(|ca| ca.address_id);
        links
    }

    fn country_of(&self, address_id: AddressId) -> Option<&Country> {
        self.addresses
            .get(&address_id)
            .and_then(|a| self.countries.get(&a.country_id))
    }

    fn apply(&mut self, change: Change, summary: &mut CommitSummary) -> Result<()> {
        match change {
            Change::InsertCustomer(customer) => {
                if self.customers.contains_key(&customer.customer_id) {
                    return Err(StoreError::DuplicateKey {
                        entity: "customer",
                        id: customer.customer_id.to_string(),
                    });
                }
                self.customers.insert(customer.customer_id, customer);
                summary.rows_inserted += 1;
            }
            Change::UpdateCustomer(customer) => {
                let existing = self.customers.get_mut(&customer.customer_id).ok_or_else(|| {
                    StoreError::ConcurrencyConflict {
                        entity: "customer",
                        id: customer.customer_id.to_string(),
                    }
                })?;
                *existing = customer;
                summary.rows_updated += 1;
            }
            Change::InsertCustomerAddress(link) => {
                if self
                    .customer_addresses
                    .iter()
                    .any(|ca| ca.customer_id == link.customer_id && ca.address_id == link.address_id)
                {
                    return Err(StoreError::DuplicateKey {
                        entity: "customer_address",
                        id: format!("{}/{}", link.customer_id, link.address_id),
                    });
                }
                self.customer_addresses.push(link);
                summary.rows_inserted += 1;
            }
            Change::RemoveCustomerAddresses(customer_id) => {
                let before = self.customer_addresses.len();
                self.customer_addresses
                    .retain(|ca| ca.customer_id != customer_id);
                summary.customer_addresses_removed += before - self.customer_addresses.len();
            }
            Change::UpdateOrder(order) => {
                let existing = self.orders.get_mut(&order.order_id).ok_or_else(|| {
                    StoreError::ConcurrencyConflict {
                        entity: "order",
                        id: order.order_id.to_string(),
                    }
                })?;
                *existing = order;
                summary.rows_updated += 1;
            }
            Change::AppendHistory(entry) => {
                if self.history.iter().any(|h| h.history_id == entry.history_id) {
                    return Err(StoreError::DuplicateKey {
                        entity: "order_history",
                        id: entry.history_id.to_string(),
                    });
                }
                self.history.push(entry);
                summary.rows_inserted += 1;
            }
            Change::RemoveOrderHistories(order_ids) => {
                let ids: HashSet<_> = order_ids.into_iter().collect();
                let before = self.history.len();
                self.history.retain(|h| !ids.contains(&h.order_id));
                summary.order_histories_removed += before - self.history.len();
            }
            Change::RemoveOrderLines(order_ids) => {
                let ids: HashSet<_> = order_ids.into_iter().collect();
                let before = self.order_lines.len();
                self.order_lines.retain(|_, l| !ids.contains(&l.order_id));
                summary.order_lines_removed += before - self.order_lines.len();
            }
            Change::RemoveOrders(order_ids) => {
                for order_id in order_ids {
                    if self.orders.remove(&order_id).is_some() {
                        summary.orders_removed += 1;
                    }
                }
            }
            Change::RemoveCustomer(customer_id) => {
                if self.customers.remove(&customer_id).is_none() {
                    return Err(StoreError::ConcurrencyConflict {
                        entity: "customer",
                        id: customer_id.to_string(),
                    });
                }
                summary.customers_removed += 1;
            }
        }
        Ok(())
    }

    /// Mirrors the foreign keys of the relational schema.
    fn check_integrity(&self) -> Result<()> {
        for link in &self.customer_addresses {
            if !self.customers.contains_key(&link.customer_id) {
                return Err(StoreError::ForeignKeyViolation(format!(
                    "customer_address references missing customer {}",
                    link.customer_id
                )));
            }
            if !self.addresses.contains_key(&link.address_id) {
                return Err(StoreError::ForeignKeyViolation(format!(
                    "customer_address references missing address {}",
                    link.address_id
                )));
            }
        }
        for order in self.orders.values() {
            if !self.customers.contains_key(&order.customer_id) {
                return Err(StoreError::ForeignKeyViolation(format!(
                    "order {} references missing customer {}",
                    order.order_id, order.customer_id
                )));
            }
        }
        for line in self.order_lines.values() {
            if !self.orders.contains_key(&line.order_id) {
                return Err(StoreError::ForeignKeyViolation(format!(
                    "order_line {} references missing order {}",
                    line.line_id, line.order_id
                )));
            }
        }
        for entry in &self.history {
            if !self.orders.contains_key(&entry.order_id) {
                return Err(StoreError::ForeignKeyViolation(format!(
                    "order_history {} references missing order {}",
                    entry.history_id, entry.order_id
                )));
            }
            if !self.statuses.contains_key(&entry.status_id) {
                return Err(StoreError::ForeignKeyViolation(format!(
                    "order_history {} references missing status {}",
                    entry.history_id, entry.status_id
                )));
            }
        }
        Ok(())
    }
}

/// In-memory row source implementation for testing and demos.
///
/// Stores every table in memory and provides the same interface as the
/// PostgreSQL implementation. Commits are applied to a copy of the tables
/// and swapped in only when every change and every foreign key check passes.
#[derive(Clone, Default)]
pub struct InMemoryRowSource {
    tables: Arc<RwLock<Tables>>,
    failing_commits: Arc<RwLock<Option<String>>>,
}

impl InMemoryRowSource {
    /// Creates a new empty in-memory row source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a row source seeded with the standard order status catalog.
    pub fn with_status_catalog() -> Self {
        let statuses = default_status_catalog()
            .into_iter()
            .map(|s| (s.status_id, s))
            .collect();
        Self {
            tables: Arc::new(RwLock::new(Tables {
                statuses,
                ..Default::default()
            })),
            failing_commits: Arc::default(),
        }
    }

    /// Makes the next commit fail with `Unavailable` without touching data.
    pub async fn fail_next_commit(&self, reason: impl Into<String>) {
        *self.failing_commits.write().await = Some(reason.into());
    }

    // Seeding helpers write straight into the tables and skip integrity checks.

    pub async fn insert_country(&self, country_id: i32, country_name: &str) {
        let country = Country {
            country_id: CountryId::new(country_id),
            country_name: country_name.to_string(),
        };
        self.tables
            .write()
            .await
            .countries
            .insert(country.country_id, country);
    }

    pub async fn insert_address(&self, address_id: i32, country_id: i32) {
        let address = Address {
            address_id: AddressId::new(address_id),
            country_id: CountryId::new(country_id),
        };
        self.tables
            .write()
            .await
            .addresses
            .insert(address.address_id, address);
    }

    pub async fn insert_customer(&self, customer: Customer) {
        self.tables
            .write()
            .await
            .customers
            .insert(customer.customer_id, customer);
    }

    pub async fn link_customer_address(&self, customer_id: i32, address_id: i32) {
        self.tables
            .write()
            .await
            .customer_addresses
            .push(CustomerAddress::active(
                CustomerId::new(customer_id),
                AddressId::new(address_id),
            ));
    }

    pub async fn insert_order(&self, order: Order) {
        self.tables
            .write()
            .await
            .orders
            .insert(order.order_id, order);
    }

    pub async fn insert_order_line(&self, line: OrderLine) {
        self.tables
            .write()
            .await
            .order_lines
            .insert(line.line_id, line);
    }

    pub async fn insert_status(&self, status: OrderStatus) {
        self.tables
            .write()
            .await
            .statuses
            .insert(status.status_id, status);
    }

    pub async fn insert_history(&self, entry: OrderHistory) {
        self.tables.write().await.history.push(entry);
    }

    pub async fn customer_count(&self) -> usize {
        self.tables.read().await.customers.len()
    }

    pub async fn order_count(&self) -> usize {
        self.tables.read().await.orders.len()
    }

    pub async fn order_line_count(&self) -> usize {
        self.tables.read().await.order_lines.len()
    }

    pub async fn history_count(&self) -> usize {
        self.tables.read().await.history.len()
    }

    pub async fn customer_address_count(&self) -> usize {
        self.tables.read().await.customer_addresses.len()
    }

    /// Returns the address links of a customer, ordered by address id.
    pub async fn addresses_of(&self, customer_id: CustomerId) -> Vec<CustomerAddress> {
        let tables = self.tables.read().await;
        tables.links_for(customer_id).into_iter().cloned().collect()
    }

    /// Clears all tables, including the status catalog.
    pub async fn clear(&self) {
        *self.tables.write().await = Tables::default();
    }
}

#[async_trait]
impl RowSource for InMemoryRowSource {
    async fn list_customer_join_rows(&self) -> Result<Vec<CustomerJoinRow>> {
        let tables = self.tables.read().await;
        let mut rows = Vec::with_capacity(tables.customers.len());

        for customer in tables.customers.values() {
            let order_count = tables
                .orders
                .values()
                .filter(|o| o.customer_id == customer.customer_id)
                .count() as i64;

            let links = tables.links_for(customer.customer_id);
            if links.is_empty() {
                rows.push(CustomerJoinRow::new(customer, UNKNOWN_COUNTRY, order_count));
                continue;
            }

            // Left join: a dangling address or country still yields a row
            for link in links {
                let country_name = tables
                    .country_of(link.address_id)
                    .map(|c| c.country_name.as_str())
                    .unwrap_or(UNKNOWN_COUNTRY);
                rows.push(CustomerJoinRow::new(customer, country_name, order_count));
            }
        }

        Ok(rows)
    }

    async fn get_customer(&self, customer_id: CustomerId) -> Result<Option<Customer>> {
        Ok(self.tables.read().await.customers.get(&customer_id).cloned())
    }

    async fn max_customer_id(&self) -> Result<Option<CustomerId>> {
        Ok(self.tables.read().await.customers.keys().next_back().copied())
    }

    async fn list_orders_for_customer(&self, customer_id: CustomerId) -> Result<Vec<Order>> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .values()
            .filter(|o| o.customer_id == customer_id)
            .cloned()
            .collect())
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.tables.read().await.orders.get(&order_id).cloned())
    }

    async fn list_order_statuses(&self) -> Result<Vec<OrderStatus>> {
        Ok(self.tables.read().await.statuses.values().cloned().collect())
    }

    async fn list_history_for_order(&self, order_id: OrderId) -> Result<Vec<OrderHistory>> {
        let tables = self.tables.read().await;
        let mut entries: Vec<_> = tables
            .history
            .iter()
            .filter(|h| h.order_id == order_id)
            .cloned()
            .collect();
        entries.sort_by_key(|h| h.status_date);
        Ok(entries)
    }

    async fn list_countries(&self) -> Result<Vec<Country>> {
        Ok(self.tables.read().await.countries.values().cloned().collect())
    }

    async fn find_customer_country(&self, customer_id: CustomerId) -> Result<Option<Country>> {
        let tables = self.tables.read().await;
        Ok(tables
            .links_for(customer_id)
            .into_iter()
            .find_map(|link| tables.country_of(link.address_id))
            .cloned())
    }

    async fn find_address_for_country(&self, country_id: CountryId) -> Result<Option<Address>> {
        let tables = self.tables.read().await;
        Ok(tables
            .addresses
            .values()
            .find(|a| a.country_id == country_id)
            .cloned())
    }

    async fn commit(&self, changes: ChangeSet) -> Result<CommitSummary> {
        validate_change_set(&changes)?;

        if let Some(reason) = self.failing_commits.write().await.take() {
            return Err(StoreError::Unavailable(reason));
        }

        let mut tables = self.tables.write().await;
        let mut staged = tables.clone();
        let mut summary = CommitSummary::default();

        for change in changes {
            staged.apply(change, &mut summary)?;
        }
        staged.check_integrity()?;

        *tables = staged;
        tracing::debug!(?summary, "in-memory commit applied");
        Ok(summary)
    }
}

/// Status catalog seeded into new bookstores.
///
/// Statuses from `Delivered` onwards are set by fulfilment, not by hand.
pub fn default_status_catalog() -> Vec<OrderStatus> {
    vec![
        OrderStatus::new(1, "Order Received"),
        OrderStatus::new(2, "Pending Delivery"),
        OrderStatus::new(3, "Delivery In Progress"),
        OrderStatus::new(4, "Delivered"),
        OrderStatus::new(5, "Cancelled"),
        OrderStatus::new(6, "Returned"),
    ]
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::{BookId, RowSourceExt};

    fn customer(id: i32, first: &str, last: &str) -> Customer {
        Customer {
            customer_id: CustomerId::new(id),
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: format!("{}@example.com", first.to_lowercase()),
        }
    }

    fn order(id: i32, customer_id: i32) -> Order {
        Order {
            order_id: OrderId::new(id),
            customer_id: CustomerId::new(customer_id),
            order_date: Utc::now(),
            status_id: StatusId::new(1),
        }
    }

    fn line(id: i32, order_id: i32) -> OrderLine {
        OrderLine {
            line_id: LineId::new(id),
            order_id: OrderId::new(order_id),
            book_id: BookId::new(100 + id),
            price: Some(9.99),
        }
    }

    #[tokio::test]
    async fn join_rows_fan_out_per_address_link() {
        let source = InMemoryRowSource::new();
        source.insert_country(1, "US").await;
        source.insert_country(2, "UK").await;
        source.insert_address(10, 1).await;
        source.insert_address(20, 2).await;
        source.insert_customer(customer(1, "A", "Z")).await;
        source.insert_customer(customer(2, "B", "Y")).await;
        source.link_customer_address(1, 20).await;
        source.link_customer_address(1, 10).await;
        source.insert_order(order(1, 1)).await;
        source.insert_order(order(2, 1)).await;

        let rows = source.list_customer_join_rows().await.unwrap();
        assert_eq!(rows.len(), 3);

        // Ordered by customer id then address id
        assert_eq!(rows[0].customer_id, CustomerId::new(1));
        assert_eq!(rows[0].country_name, "US");
        assert_eq!(rows[1].country_name, "UK");
        assert_eq!(rows[0].order_count, 2);

        assert_eq!(rows[2].customer_id, CustomerId::new(2));
        assert_eq!(rows[2].country_name, UNKNOWN_COUNTRY);
        assert_eq!(rows[2].order_count, 0);
    }

    #[tokio::test]
    async fn dangling_address_reports_unknown_country() {
        let source = InMemoryRowSource::new();
        source.insert_customer(customer(1, "A", "Z")).await;
        source.link_customer_address(1, 99).await;

        let rows = source.list_customer_join_rows().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].country_name, UNKNOWN_COUNTRY);
    }

    #[tokio::test]
    async fn max_customer_id_tracks_highest_key() {
        let source = InMemoryRowSource::new();
        assert_eq!(source.max_customer_id().await.unwrap(), None);

        source.insert_customer(customer(7, "G", "Seven")).await;
        source.insert_customer(customer(3, "C", "Three")).await;
        assert_eq!(
            source.max_customer_id().await.unwrap(),
            Some(CustomerId::new(7))
        );
    }

    #[tokio::test]
    async fn commit_applies_all_changes() {
        let source = InMemoryRowSource::with_status_catalog();
        source.insert_customer(customer(1, "A", "Z")).await;
        source.insert_order(order(1, 1)).await;

        let mut updated = order(1, 1);
        updated.status_id = StatusId::new(3);
        let entry = OrderHistory::record(OrderId::new(1), StatusId::new(3));

        let summary = source
            .commit(
                ChangeSet::new()
                    .update_order(updated)
                    .append_history(entry.clone()),
            )
            .await
            .unwrap();

        assert_eq!(summary.rows_updated, 1);
        assert_eq!(summary.rows_inserted, 1);
        let stored = source.get_order(OrderId::new(1)).await.unwrap().unwrap();
        assert_eq!(stored.status_id, StatusId::new(3));
        let history = source.list_history_for_order(OrderId::new(1)).await.unwrap();
        assert_eq!(history, vec![entry]);
    }

    #[tokio::test]
    async fn commit_is_all_or_nothing_on_stale_write() {
        let source = InMemoryRowSource::with_status_catalog();
        source.insert_customer(customer(1, "A", "Z")).await;
        source.insert_order(order(1, 1)).await;

        // The history entry is valid, the order update targets a missing row
        let result = source
            .commit(
                ChangeSet::new()
                    .append_history(OrderHistory::record(OrderId::new(1), StatusId::new(2)))
                    .update_order(order(42, 1)),
            )
            .await;

        assert!(matches!(
            result,
            Err(StoreError::ConcurrencyConflict { entity: "order", .. })
        ));
        assert_eq!(source.history_count().await, 0);
    }

    #[tokio::test]
    async fn commit_rejects_orphaned_rows() {
        let source = InMemoryRowSource::with_status_catalog();
        source.insert_customer(customer(1, "A", "Z")).await;
        source.insert_order(order(1, 1)).await;
        source.insert_order_line(line(1, 1)).await;

        // Removing the order but not its line must fail and change nothing
        let result = source
            .commit(ChangeSet::new().remove_orders(vec![OrderId::new(1)]))
            .await;

        assert!(matches!(result, Err(StoreError::ForeignKeyViolation(_))));
        assert_eq!(source.order_count().await, 1);
        assert_eq!(source.order_line_count().await, 1);
    }

    #[tokio::test]
    async fn commit_rejects_duplicate_customer() {
        let source = InMemoryRowSource::new();
        source.insert_customer(customer(1, "A", "Z")).await;

        let result = source
            .commit(ChangeSet::new().insert_customer(customer(1, "Again", "Z")))
            .await;

        assert!(matches!(result, Err(StoreError::DuplicateKey { .. })));
    }

    #[tokio::test]
    async fn empty_commit_is_rejected() {
        let source = InMemoryRowSource::new();
        let result = source.commit(ChangeSet::new()).await;
        assert!(matches!(result, Err(StoreError::EmptyChangeSet)));
    }

    #[tokio::test]
    async fn injected_failure_affects_only_next_commit() {
        let source = InMemoryRowSource::new();
        source.insert_country(1, "US").await;
        source.insert_address(10, 1).await;
        source.fail_next_commit("disk full").await;

        let first = source
            .commit(ChangeSet::new().insert_customer(customer(1, "A", "Z")))
            .await;
        assert!(matches!(first, Err(StoreError::Unavailable(_))));
        assert_eq!(source.customer_count().await, 0);

        let second = source
            .commit(ChangeSet::new().insert_customer(customer(1, "A", "Z")))
            .await;
        assert!(second.is_ok());
        assert_eq!(source.customer_count().await, 1);
    }

    #[tokio::test]
    async fn customer_country_follows_first_link() {
        let source = InMemoryRowSource::new();
        source.insert_country(1, "US").await;
        source.insert_country(2, "UK").await;
        source.insert_address(10, 1).await;
        source.insert_address(20, 2).await;
        source.insert_customer(customer(1, "A", "Z")).await;

        assert!(source
            .find_customer_country(CustomerId::new(1))
            .await
            .unwrap()
            .is_none());

        source.link_customer_address(1, 20).await;
        let country = source
            .find_customer_country(CustomerId::new(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(country.country_name, "UK");

        let address = source
            .find_address_for_country(CountryId::new(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(address.address_id, AddressId::new(10));
    }

    #[tokio::test]
    async fn status_value_resolves_from_catalog() {
        let source = InMemoryRowSource::with_status_catalog();
        assert_eq!(
            source.status_value(StatusId::new(3)).await.unwrap().as_deref(),
            Some("Delivery In Progress")
        );
        assert_eq!(source.status_value(StatusId::new(99)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn exists_helpers() {
        let source = InMemoryRowSource::new();
        source.insert_customer(customer(1, "A", "Z")).await;
        source.insert_order(order(5, 1)).await;

        assert!(source.customer_exists(CustomerId::new(1)).await.unwrap());
        assert!(!source.customer_exists(CustomerId::new(2)).await.unwrap());
        assert!(source.order_exists(OrderId::new(5)).await.unwrap());
        assert!(!source.order_exists(OrderId::new(6)).await.unwrap());
    }
}
