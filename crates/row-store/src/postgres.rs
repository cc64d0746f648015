use async_trait::async_trait;
use futures_util::{StreamExt, TryStreamExt};
use sqlx::error::ErrorKind;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};
use uuid::Uuid;

use crate::{
    Address, AddressId, Change, ChangeSet, CommitSummary, Country, CountryId, Customer,
    CustomerId, CustomerJoinRow, HistoryId, Order, OrderHistory, OrderId, OrderStatus, Result,
    StatusId, StoreError, UNKNOWN_COUNTRY,
    source::{RowSource, validate_change_set},
};

/// PostgreSQL-backed row source over the bookstore schema.
///
/// Every [`RowSource::commit`] runs in its own transaction; the schema's
/// foreign keys provide the integrity checks.
#[derive(Clone)]
pub struct PostgresRowSource {
    pool: PgPool,
}

impl PostgresRowSource {
    /// Creates a new PostgreSQL row source.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_customer(row: PgRow) -> Result<Customer> {
        Ok(Customer {
            customer_id: CustomerId::new(row.try_get("customer_id")?),
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            email: row.try_get("email")?,
        })
    }

    fn row_to_join_row(row: PgRow) -> Result<CustomerJoinRow> {
        Ok(CustomerJoinRow {
            customer_id: CustomerId::new(row.try_get("customer_id")?),
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            email: row.try_get("email")?,
            country_name: row.try_get("country_name")?,
            order_count: row.try_get("order_count")?,
        })
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        Ok(Order {
            order_id: OrderId::new(row.try_get("order_id")?),
            customer_id: CustomerId::new(row.try_get("customer_id")?),
            order_date: row.try_get("order_date")?,
            status_id: StatusId::new(row.try_get("shipping_method_id")?),
        })
    }

    fn row_to_country(row: PgRow) -> Result<Country> {
        Ok(Country {
            country_id: CountryId::new(row.try_get("country_id")?),
            country_name: row.try_get("country_name")?,
        })
    }

    fn row_to_history(row: PgRow) -> Result<OrderHistory> {
        Ok(OrderHistory {
            history_id: HistoryId::from_uuid(row.try_get::<Uuid, _>("history_id")?),
            order_id: OrderId::new(row.try_get("order_id")?),
            status_id: StatusId::new(row.try_get("status_id")?),
            status_date: row.try_get("status_date")?,
        })
    }

    /// Executes one staged change inside the commit transaction.
    async fn apply(
        conn: &mut PgConnection,
        change: Change,
        summary: &mut CommitSummary,
    ) -> Result<()> {
        match change {
            Change::InsertCustomer(customer) => {
                let id = customer.customer_id;
                sqlx::query(
                    r#"
                    INSERT INTO customer (customer_id, first_name, last_name, email)
                    VALUES ($1, $2, $3, $4)
                    "#,
                )
                .bind(id.value())
                .bind(&customer.first_name)
                .bind(&customer.last_name)
                .bind(&customer.email)
                .execute(&mut *conn)
                .await
                .map_err(|e| map_write_error(e, "customer", id.to_string()))?;
                summary.rows_inserted += 1;
            }
            Change::UpdateCustomer(customer) => {
                let id = customer.customer_id;
                let result = sqlx::query(
                    r#"
                    UPDATE customer SET first_name = $2, last_name = $3, email = $4
                    WHERE customer_id = $1
                    "#,
                )
                .bind(id.value())
                .bind(&customer.first_name)
                .bind(&customer.last_name)
                .bind(&customer.email)
                .execute(&mut *conn)
                .await
                .map_err(|e| map_write_error(e, "customer", id.to_string()))?;

                if result.rows_affected() == 0 {
                    return Err(StoreError::ConcurrencyConflict {
                        entity: "customer",
                        id: id.to_string(),
                    });
                }
                summary.rows_updated += 1;
            }
            Change::InsertCustomerAddress(link) => {
                sqlx::query(
                    r#"
                    INSERT INTO customer_address (customer_id, address_id, status_id)
                    VALUES ($1, $2, $3)
                    "#,
                )
                .bind(link.customer_id.value())
                .bind(link.address_id.value())
                .bind(link.status_id)
                .execute(&mut *conn)
                .await
                .map_err(|e| {
                    map_write_error(
                        e,
                        "customer_address",
                        format!("{}/{}", link.customer_id, link.address_id),
                    )
                })?;
                summary.rows_inserted += 1;
            }
            Change::RemoveCustomerAddresses(customer_id) => {
                let result = sqlx::query("DELETE FROM customer_address WHERE customer_id = $1")
                    .bind(customer_id.value())
                    .execute(&mut *conn)
                    .await
                    .map_err(|e| map_write_error(e, "customer_address", customer_id.to_string()))?;
                summary.customer_addresses_removed += result.rows_affected() as usize;
            }
            Change::UpdateOrder(order) => {
                let id = order.order_id;
                let result = sqlx::query(
                    r#"
                    UPDATE cust_order
                    SET customer_id = $2, order_date = $3, shipping_method_id = $4
                    WHERE order_id = $1
                    "#,
                )
                .bind(id.value())
                .bind(order.customer_id.value())
                .bind(order.order_date)
                .bind(order.status_id.value())
                .execute(&mut *conn)
                .await
                .map_err(|e| map_write_error(e, "order", id.to_string()))?;

                if result.rows_affected() == 0 {
                    return Err(StoreError::ConcurrencyConflict {
                        entity: "order",
                        id: id.to_string(),
                    });
                }
                summary.rows_updated += 1;
            }
            Change::AppendHistory(entry) => {
                sqlx::query(
                    r#"
                    INSERT INTO order_history (history_id, order_id, status_id, status_date)
                    VALUES ($1, $2, $3, $4)
                    "#,
                )
                .bind(entry.history_id.as_uuid())
                .bind(entry.order_id.value())
                .bind(entry.status_id.value())
                .bind(entry.status_date)
                .execute(&mut *conn)
                .await
                .map_err(|e| map_write_error(e, "order_history", entry.history_id.to_string()))?;
                summary.rows_inserted += 1;
            }
            Change::RemoveOrderHistories(order_ids) => {
                let result = sqlx::query("DELETE FROM order_history WHERE order_id = ANY($1)")
                    .bind(raw_order_ids(&order_ids))
                    .execute(&mut *conn)
                    .await
                    .map_err(|e| map_write_error(e, "order_history", format!("{order_ids:?}")))?;
                summary.order_histories_removed += result.rows_affected() as usize;
            }
            Change::RemoveOrderLines(order_ids) => {
                let result = sqlx::query("DELETE FROM order_line WHERE order_id = ANY($1)")
                    .bind(raw_order_ids(&order_ids))
                    .execute(&mut *conn)
                    .await
                    .map_err(|e| map_write_error(e, "order_line", format!("{order_ids:?}")))?;
                summary.order_lines_removed += result.rows_affected() as usize;
            }
            Change::RemoveOrders(order_ids) => {
                let result = sqlx::query("DELETE FROM cust_order WHERE order_id = ANY($1)")
                    .bind(raw_order_ids(&order_ids))
                    .execute(&mut *conn)
                    .await
                    .map_err(|e| map_write_error(e, "order", format!("{order_ids:?}")))?;
                summary.orders_removed += result.rows_affected() as usize;
            }
            Change::RemoveCustomer(customer_id) => {
                let result = sqlx::query("DELETE FROM customer WHERE customer_id = $1")
                    .bind(customer_id.value())
                    .execute(&mut *conn)
                    .await
                    .map_err(|e| map_write_error(e, "customer", customer_id.to_string()))?;

                if result.rows_affected() == 0 {
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
}

fn raw_order_ids(order_ids: &[OrderId]) -> Vec<i32> {
    order_ids.iter().map(OrderId::value).collect()
}

/// Translates constraint violations into store errors.
fn map_write_error(e: sqlx::Error, entity: &'static str, id: String) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e {
        match db_err.kind() {
            ErrorKind::ForeignKeyViolation => {
                return StoreError::ForeignKeyViolation(db_err.message().to_string());
            }
            ErrorKind::UniqueViolation => return StoreError::DuplicateKey { entity, id },
            _ => {}
        }
    }
    StoreError::Database(e)
}

#[async_trait]
impl RowSource for PostgresRowSource {
    async fn list_customer_join_rows(&self) -> Result<Vec<CustomerJoinRow>> {
        sqlx::query(
            r#"
            SELECT c.customer_id, c.first_name, c.last_name, c.email,
                   COALESCE(co.country_name, $1) AS country_name,
                   (SELECT COUNT(*) FROM cust_order o WHERE o.customer_id = c.customer_id)
                       AS order_count
            FROM customer c
            LEFT JOIN customer_address ca ON ca.customer_id = c.customer_id
            LEFT JOIN address a ON a.address_id = ca.address_id
            LEFT JOIN country co ON co.country_id = a.country_id
            ORDER BY c.customer_id ASC, ca.address_id ASC NULLS FIRST
            "#,
        )
        .bind(UNKNOWN_COUNTRY)
        .fetch(&self.pool)
        .map(|result| match result {
            Ok(row) => Self::row_to_join_row(row),
            Err(e) => Err(StoreError::Database(e)),
        })
        .try_collect::<Vec<_>>()
        .await
    }

    async fn get_customer(&self, customer_id: CustomerId) -> Result<Option<Customer>> {
        let row = sqlx::query(
            "SELECT customer_id, first_name, last_name, email FROM customer WHERE customer_id = $1",
        )
        .bind(customer_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_customer).transpose()
    }

    async fn max_customer_id(&self) -> Result<Option<CustomerId>> {
        let max: Option<i32> = sqlx::query_scalar("SELECT MAX(customer_id) FROM customer")
            .fetch_one(&self.pool)
            .await?;
        Ok(max.map(CustomerId::new))
    }

    async fn list_orders_for_customer(&self, customer_id: CustomerId) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT order_id, customer_id, order_date, shipping_method_id
            FROM cust_order
            WHERE customer_id = $1
            ORDER BY order_id ASC
            "#,
        )
        .bind(customer_id.value())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT order_id, customer_id, order_date, shipping_method_id
            FROM cust_order
            WHERE order_id = $1
            "#,
        )
        .bind(order_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn list_order_statuses(&self) -> Result<Vec<OrderStatus>> {
        let rows = sqlx::query("SELECT status_id, status_value FROM order_status ORDER BY status_id")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| {
                Ok(OrderStatus {
                    status_id: StatusId::new(row.try_get("status_id")?),
                    status_value: row.try_get("status_value")?,
                })
            })
            .collect()
    }

    async fn list_history_for_order(&self, order_id: OrderId) -> Result<Vec<OrderHistory>> {
        let rows = sqlx::query(
            r#"
            SELECT history_id, order_id, status_id, status_date
            FROM order_history
            WHERE order_id = $1
            ORDER BY status_date ASC
            "#,
        )
        .bind(order_id.value())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_history).collect()
    }

    async fn list_countries(&self) -> Result<Vec<Country>> {
        let rows = sqlx::query("SELECT country_id, country_name FROM country ORDER BY country_id")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_country).collect()
    }

    async fn find_customer_country(&self, customer_id: CustomerId) -> Result<Option<Country>> {
        let row = sqlx::query(
            r#"
            SELECT co.country_id, co.country_name
            FROM customer_address ca
            JOIN address a ON a.address_id = ca.address_id
            JOIN country co ON co.country_id = a.country_id
            WHERE ca.customer_id = $1
            ORDER BY ca.address_id ASC
            LIMIT 1
            "#,
        )
        .bind(customer_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_country).transpose()
    }

    async fn find_address_for_country(&self, country_id: CountryId) -> Result<Option<Address>> {
        let row = sqlx::query(
            r#"
            SELECT address_id, country_id
            FROM address
            WHERE country_id = $1
            ORDER BY address_id ASC
            LIMIT 1
            "#,
        )
        .bind(country_id.value())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Address {
                address_id: AddressId::new(row.try_get("address_id")?),
                country_id: CountryId::new(row.try_get("country_id")?),
            })),
            None => Ok(None),
        }
    }

    async fn commit(&self, changes: ChangeSet) -> Result<CommitSummary> {
        validate_change_set(&changes)?;

        // Dropping the transaction on an early return rolls it back
        let mut tx = self.pool.begin().await?;
        let mut summary = CommitSummary::default();

        for change in changes {
            Self::apply(&mut tx, change, &mut summary).await?;
        }

        tx.commit().await?;
        tracing::debug!(?summary, "postgres commit applied");
        Ok(summary)
    }
}
