use common::{CustomerId, OrderId};
use row_store::{ChangeSet, RowSource, RowSourceExt, StoreError};
use serde::Serialize;

use crate::error::DomainError;

/// Rows removed by a customer deletion, per table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeletionSummary {
    pub customer_id: CustomerId,
    pub order_histories_removed: usize,
    pub order_lines_removed: usize,
    pub orders_removed: usize,
    pub customer_addresses_removed: usize,
}

/// Removes a customer together with everything that references it.
///
/// Dependents are staged leaf-first (histories, lines, orders, address
/// links, then the customer) and committed as a single unit, so a failure
/// anywhere leaves every row in place.
pub struct CascadingDeleter<S: RowSource> {
    source: S,
}

impl<S: RowSource> CascadingDeleter<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<DeletionSummary, DomainError> {
        if !self.source.customer_exists(customer_id).await? {
            return Err(DomainError::not_found("customer", customer_id));
        }

        let order_ids: Vec<OrderId> = self
            .source
            .list_orders_for_customer(customer_id)
            .await?
            .into_iter()
            .map(|o| o.order_id)
            .collect();

        let changes = ChangeSet::new()
            .remove_order_histories_by_order_ids(order_ids.clone())
            .remove_order_lines_by_order_ids(order_ids.clone())
            .remove_orders(order_ids)
            .remove_customer_addresses(customer_id)
            .remove_customer(customer_id);

        match self.source.commit(changes).await {
            Ok(summary) => {
                metrics::counter!("customers_deleted_total").increment(1);
                tracing::info!(
                    %customer_id,
                    orders_removed = summary.orders_removed,
                    "Customer deleted"
                );
                Ok(DeletionSummary {
                    customer_id,
                    order_histories_removed: summary.order_histories_removed,
                    order_lines_removed: summary.order_lines_removed,
                    orders_removed: summary.orders_removed,
                    customer_addresses_removed: summary.customer_addresses_removed,
                })
            }
            Err(e) => {
                metrics::counter!("customer_deletions_failed_total").increment(1);
                tracing::error!(%customer_id, error = %e, "Customer deletion failed");
                Err(self.deletion_failure(customer_id, e).await)
            }
        }
    }

    /// A customer removed concurrently is reported as missing rather than as
    /// a failed deletion.
    async fn deletion_failure(&self, customer_id: CustomerId, error: StoreError) -> DomainError {
        if error.is_concurrency_conflict() {
            match self.source.customer_exists(customer_id).await {
                Ok(false) => return DomainError::not_found("customer", customer_id),
                Ok(true) => {}
                Err(e) => return DomainError::Persistence(e),
            }
        }
        DomainError::Deletion {
            customer_id,
            source: error,
        }
    }
}
