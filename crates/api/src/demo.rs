//! Sample bookstore used when no database is configured.

use chrono::{Duration, Utc};
use row_store::{
    BookId, Customer, CustomerId, InMemoryRowSource, LineId, Order, OrderHistory, OrderId,
    OrderLine, StatusId,
};

const COUNTRIES: [(i32, &str); 4] = [
    (1, "United States"),
    (2, "United Kingdom"),
    (3, "Ireland"),
    (4, "Australia"),
];

// (customer id, first name, last name, address id)
const CUSTOMERS: [(i32, &str, &str, i32); 5] = [
    (1, "Ursola", "Purdy", 10),
    (2, "Ruthanne", "Vatini", 20),
    (3, "Reidar", "Turbitt", 30),
    (4, "Rich", "Kirsz", 10),
    (5, "Carline", "Kupis", 20),
];

/// Builds an in-memory row source seeded with countries, customers and orders.
pub async fn demo_bookstore() -> InMemoryRowSource {
    let source = InMemoryRowSource::with_status_catalog();

    for (country_id, name) in COUNTRIES {
        source.insert_country(country_id, name).await;
        source.insert_address(country_id * 10, country_id).await;
    }

    for (customer_id, first, last, address_id) in CUSTOMERS {
        source
            .insert_customer(Customer {
                customer_id: CustomerId::new(customer_id),
                first_name: first.to_string(),
                last_name: last.to_string(),
                email: format!("{}.{}@example.com", first, last).to_lowercase(),
            })
            .await;
        source.link_customer_address(customer_id, address_id).await;
    }

    let now = Utc::now();
    let mut line_id = 1;
    for order_id in 1..=8 {
        let customer_id = (order_id % 4) + 1;
        source
            .insert_order(Order {
                order_id: OrderId::new(order_id),
                customer_id: CustomerId::new(customer_id),
                order_date: now - Duration::days(i64::from(order_id) * 3),
                status_id: StatusId::new(1),
            })
            .await;
        for book in 0..2 {
            source
                .insert_order_line(OrderLine {
                    line_id: LineId::new(line_id),
                    order_id: OrderId::new(order_id),
                    book_id: BookId::new(100 + book + order_id),
                    price: Some(9.99 + f64::from(book) * 5.0),
                })
                .await;
            line_id += 1;
        }
        source
            .insert_history(OrderHistory::record(OrderId::new(order_id), StatusId::new(1)))
            .await;
    }

    tracing::info!(
        customers = CUSTOMERS.len(),
        orders = 8,
        "seeded in-memory demo bookstore"
    );
    source
}
