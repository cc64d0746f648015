use common::StatusId;
use row_store::OrderStatus;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Which statuses an administrator may set by hand.
///
/// Every status id below `first_forbidden` is allowed; the rest belong to
/// fulfilment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPolicy {
    first_forbidden: StatusId,
}

impl StatusPolicy {
    pub const DEFAULT_FIRST_FORBIDDEN: i32 = 4;

    pub fn new(first_forbidden: StatusId) -> Self {
        Self { first_forbidden }
    }

    pub fn first_forbidden(&self) -> StatusId {
        self.first_forbidden
    }

    pub fn allows(&self, target: StatusId) -> bool {
        target < self.first_forbidden
    }

    pub fn check(&self, target: StatusId) -> Result<(), ValidationError> {
        if self.allows(target) {
            Ok(())
        } else {
            Err(ValidationError::InvalidTransition {
                target,
                first_forbidden: self.first_forbidden,
            })
        }
    }

    /// Filters a status catalog down to the entries this policy allows.
    pub fn selectable<'a>(
        &self,
        statuses: &'a [OrderStatus],
    ) -> impl Iterator<Item = &'a OrderStatus> + use<'a> {
        let policy = *self;
        statuses.iter().filter(move |s| policy.allows(s.status_id))
    }
}

impl Default for StatusPolicy {
    fn default() -> Self {
        Self::new(StatusId::new(Self::DEFAULT_FIRST_FORBIDDEN))
    }
}

#[cfg(test)]
mod tests {
    use row_store::default_status_catalog;

    use super::*;

    #[test]
    fn default_allows_below_four() {
        let policy = StatusPolicy::default();
        assert!(policy.allows(StatusId::new(1)));
        assert!(policy.allows(StatusId::new(3)));
        assert!(!policy.allows(StatusId::new(4)));
        assert!(!policy.allows(StatusId::new(6)));
    }

    #[test]
    fn check_reports_configured_threshold() {
        let policy = StatusPolicy::new(StatusId::new(6));
        assert!(policy.check(StatusId::new(5)).is_ok());
        let err = policy.check(StatusId::new(6)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot change status to a value of 6 or higher"
        );
    }

    #[test]
    fn selectable_filters_catalog() {
        let catalog = default_status_catalog();
        let names: Vec<&str> = StatusPolicy::default()
            .selectable(&catalog)
            .map(|s| s.status_value.as_str())
            .collect();
        assert_eq!(
            names,
            vec!["Order Received", "Pending Delivery", "Delivery In Progress"]
        );
    }
}
