use common::{CustomerId, OrderId, StatusId};
use row_store::{
    ChangeSet, Order, OrderHistory, OrderStatus, RowSource, RowSourceExt, StoreError,
};
use serde::Serialize;

use super::StatusPolicy;
use crate::error::DomainError;

/// Data for the status edit form of one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEditView {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub current_status_id: StatusId,
    pub current_status: Option<String>,
    pub statuses: Vec<OrderStatus>,

    /// Subset of `statuses` the policy lets an administrator pick.
    pub selectable: Vec<StatusId>,
}

/// Applies manual status changes to orders.
///
/// A change overwrites the order's current status and appends a history
/// entry; both land in one commit.
pub struct OrderStatusWorkflow<S: RowSource> {
    source: S,
    policy: StatusPolicy,
}

impl<S: RowSource> OrderStatusWorkflow<S> {
    /// Creates a workflow with the default status policy.
    pub fn new(source: S) -> Self {
        Self::with_policy(source, StatusPolicy::default())
    }

    pub fn with_policy(source: S, policy: StatusPolicy) -> Self {
        Self { source, policy }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn policy(&self) -> StatusPolicy {
        self.policy
    }

    /// Moves an order to `new_status` and records the change.
    ///
    /// Returns the appended history entry.
    #[tracing::instrument(skip(self))]
    pub async fn apply_status_change(
        &self,
        order_id: OrderId,
        new_status: StatusId,
    ) -> Result<OrderHistory, DomainError> {
        let mut order = self.find_order(order_id).await?;

        if let Err(e) = self.policy.check(new_status) {
            metrics::counter!("order_status_rejections_total").increment(1);
            tracing::warn!(%order_id, %new_status, "Status change rejected");
            return Err(e.into());
        }

        let previous = order.status_id;
        order.status_id = new_status;
        let entry = OrderHistory::record(order_id, new_status);
        let changes = ChangeSet::new()
            .update_order(order)
            .append_history(entry.clone());

        match self.source.commit(changes).await {
            Ok(_) => {
                metrics::counter!("order_status_changes_total").increment(1);
                tracing::info!(
                    %order_id,
                    %previous,
                    %new_status,
                    history_id = %entry.history_id,
                    "Order status changed"
                );
                Ok(entry)
            }
            Err(e) if e.is_concurrency_conflict() => Err(self.recheck(order_id, e).await),
            Err(e) => Err(DomainError::Persistence(e)),
        }
    }

    /// Display text of an order's current status, if the catalog knows it.
    pub async fn current_status_text(&self, order: &Order) -> Result<Option<String>, DomainError> {
        Ok(self.source.status_value(order.status_id).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn status_edit_view(&self, order_id: OrderId) -> Result<StatusEditView, DomainError> {
        let order = self.find_order(order_id).await?;
        let statuses = self.source.list_order_statuses().await?;
        let current_status = statuses
            .iter()
            .find(|s| s.status_id == order.status_id)
            .map(|s| s.status_value.clone());
        let selectable = self
            .policy
            .selectable(&statuses)
            .map(|s| s.status_id)
            .collect();

        Ok(StatusEditView {
            order_id,
            customer_id: order.customer_id,
            current_status_id: order.status_id,
            current_status,
            statuses,
            selectable,
        })
    }

    /// Status history of an order, oldest first.
    pub async fn order_history(&self, order_id: OrderId) -> Result<Vec<OrderHistory>, DomainError> {
        self.find_order(order_id).await?;
        Ok(self.source.list_history_for_order(order_id).await?)
    }

    async fn find_order(&self, order_id: OrderId) -> Result<Order, DomainError> {
        self.source
            .get_order(order_id)
            .await?
            .ok_or_else(|| DomainError::not_found("order", order_id))
    }

    async fn recheck(&self, order_id: OrderId, error: StoreError) -> DomainError {
        match self.source.order_exists(order_id).await {
            Ok(false) => DomainError::not_found("order", order_id),
            Ok(true) => DomainError::ConcurrencyConflict(error),
            Err(e) => DomainError::Persistence(e),
        }
    }
}
