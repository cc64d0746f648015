use std::collections::HashSet;
use std::num::NonZeroUsize;

use common::CustomerId;
use row_store::CustomerJoinRow;
use serde::{Deserialize, Serialize};

use crate::pagination::PagedList;

/// One customer on the admin list screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerViewModel {
    pub customer_id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub country_name: String,
    pub order_count: i64,
}

impl From<CustomerJoinRow> for CustomerViewModel {
    fn from(row: CustomerJoinRow) -> Self {
        Self {
            customer_id: row.customer_id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            country_name: row.country_name,
            order_count: row.order_count,
        }
    }
}

/// Collapses join rows to one view model per customer, sorts by last name
/// and cuts out the requested page.
///
/// The first row seen for a customer supplies its country; later rows for the
/// same customer are dropped. The sort is stable, so customers sharing a last
/// name keep their row-source order. `total_items` counts distinct customers.
pub fn aggregate_customers(
    rows: Vec<CustomerJoinRow>,
    page: i64,
    size: NonZeroUsize,
) -> PagedList<CustomerViewModel> {
    let mut seen = HashSet::new();
    let mut customers: Vec<CustomerViewModel> = rows
        .into_iter()
        .filter(|row| seen.insert(row.customer_id))
        .map(CustomerViewModel::from)
        .collect();

    customers.sort_by(|a, b| a.last_name.cmp(&b.last_name));

    PagedList::from_sequence(customers, page, size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i32, first: &str, last: &str, country: &str, orders: i64) -> CustomerJoinRow {
        CustomerJoinRow {
            customer_id: CustomerId::new(id),
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: format!("{}@x", first.to_lowercase()),
            country_name: country.to_string(),
            order_count: orders,
        }
    }

    fn size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn collapses_fan_out_and_sorts_by_last_name() {
        let rows = vec![
            row(1, "A", "Z", "US", 2),
            row(1, "A", "Z", "UK", 2),
            row(2, "B", "Y", "Unknown", 0),
        ];

        let page = aggregate_customers(rows, 1, size(10));

        assert_eq!(page.info.total_items, 2);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].customer_id, CustomerId::new(2));
        assert_eq!(page.items[0].country_name, "Unknown");
        assert_eq!(page.items[0].order_count, 0);
        assert_eq!(page.items[1].customer_id, CustomerId::new(1));
        assert_eq!(page.items[1].country_name, "US");
        assert_eq!(page.items[1].order_count, 2);
    }

    #[test]
    fn equal_last_names_keep_source_order() {
        let rows = vec![
            row(3, "C", "Smith", "US", 0),
            row(1, "A", "Smith", "US", 0),
            row(2, "B", "Jones", "US", 0),
        ];

        let page = aggregate_customers(rows, 1, size(10));
        let ids: Vec<i32> = page.items.iter().map(|c| c.customer_id.value()).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn total_counts_customers_not_rows() {
        let rows = (1..=12)
            .flat_map(|id| {
                vec![
                    row(id, "F", &format!("L{id:02}"), "US", 1),
                    row(id, "F", &format!("L{id:02}"), "UK", 1),
                ]
            })
            .collect();

        let page = aggregate_customers(rows, 2, size(5));
        assert_eq!(page.info.total_items, 12);
        assert_eq!(page.info.total_pages, 3);
        let names: Vec<&str> = page.items.iter().map(|c| c.last_name.as_str()).collect();
        assert_eq!(names, vec!["L06", "L07", "L08", "L09", "L10"]);
    }

    #[test]
    fn no_rows_gives_empty_first_page() {
        let page = aggregate_customers(Vec::new(), 3, size(10));
        assert!(page.is_empty());
        assert_eq!(page.info.page, 1);
        assert!(page.info.is_last);
    }
}
