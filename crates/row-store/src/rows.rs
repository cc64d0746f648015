use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AddressId, BookId, CountryId, CustomerId, HistoryId, LineId, OrderId, StatusId};

/// Country name reported for a customer with no address link.
pub const UNKNOWN_COUNTRY: &str = "Unknown";

/// A customer record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Link between a customer and one of its addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerAddress {
    pub customer_id: CustomerId,
    pub address_id: AddressId,

    /// Address status (1 = active). Unrelated to the order status catalog.
    pub status_id: i32,
}

impl CustomerAddress {
    /// Status assigned to links created by the admin screens.
    pub const ACTIVE_STATUS: i32 = 1;

    /// Creates an active link.
    pub fn active(customer_id: CustomerId, address_id: AddressId) -> Self {
        Self {
            customer_id,
            address_id,
            status_id: Self::ACTIVE_STATUS,
        }
    }
}

/// A postal address. Each address resolves to exactly one country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub address_id: AddressId,
    pub country_id: CountryId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub country_id: CountryId,
    pub country_name: String,
}

/// A customer order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub order_date: DateTime<Utc>,

    /// Current status of the order.
    ///
    /// Persisted in the `shipping_method_id` column of `cust_order`; the admin
    /// screens overwrite it on every status change while the history table
    /// keeps the full trail.
    pub status_id: StatusId,
}

/// A single book on an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub line_id: LineId,
    pub order_id: OrderId,
    pub book_id: BookId,
    pub price: Option<f64>,
}

/// An entry in the order status catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatus {
    pub status_id: StatusId,
    pub status_value: String,
}

impl OrderStatus {
    pub fn new(status_id: i32, status_value: impl Into<String>) -> Self {
        Self {
            status_id: StatusId::new(status_id),
            status_value: status_value.into(),
        }
    }
}

/// Immutable audit record of a status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderHistory {
    pub history_id: HistoryId,
    pub order_id: OrderId,
    pub status_id: StatusId,
    pub status_date: DateTime<Utc>,
}

impl OrderHistory {
    /// Records a status change happening now, under a fresh history id.
    pub fn record(order_id: OrderId, status_id: StatusId) -> Self {
        Self {
            history_id: HistoryId::new(),
            order_id,
            status_id,
            status_date: Utc::now(),
        }
    }
}

/// One row of the customer ⟕ address ⟕ country join.
///
/// A customer with several address links produces several rows that differ
/// only in `country_name`; a customer without links produces one row with
/// [`UNKNOWN_COUNTRY`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerJoinRow {
    pub customer_id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub country_name: String,
    pub order_count: i64,
}

impl CustomerJoinRow {
    pub fn new(
        customer: &Customer,
        country_name: impl Into<String>,
        order_count: i64,
    ) -> Self {
        Self {
            customer_id: customer.customer_id,
            first_name: customer.first_name.clone(),
            last_name: customer.last_name.clone(),
            email: customer.email.clone(),
            country_name: country_name.into(),
            order_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorded_history_entries_get_distinct_ids() {
        let a = OrderHistory::record(OrderId::new(1), StatusId::new(2));
        let b = OrderHistory::record(OrderId::new(1), StatusId::new(2));
        assert_ne!(a.history_id, b.history_id);
        assert_eq!(a.order_id, OrderId::new(1));
        assert_eq!(a.status_id, StatusId::new(2));
    }

    #[test]
    fn active_link_uses_active_status() {
        let link = CustomerAddress::active(CustomerId::new(1), AddressId::new(7));
        assert_eq!(link.status_id, CustomerAddress::ACTIVE_STATUS);
    }

    #[test]
    fn join_row_copies_customer_fields() {
        let customer = Customer {
            customer_id: CustomerId::new(5),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
        };
        let row = CustomerJoinRow::new(&customer, "UK", 3);
        assert_eq!(row.customer_id, CustomerId::new(5));
        assert_eq!(row.last_name, "Lovelace");
        assert_eq!(row.country_name, "UK");
        assert_eq!(row.order_count, 3);
    }
}
