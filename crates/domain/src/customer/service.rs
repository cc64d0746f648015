//! Customer administration: listing, creation, editing and lookups.

use std::num::NonZeroUsize;

use chrono::{DateTime, Utc};
use common::{CountryId, CustomerId, OrderId};
use row_store::{
    Address, ChangeSet, Country, Customer, CustomerAddress, RowSource, RowSourceExt, StoreError,
};
use serde::{Deserialize, Serialize};

use super::aggregator::{CustomerViewModel, aggregate_customers};
use crate::error::{DomainError, ValidationError};
use crate::pagination::PagedList;

/// Name and email of a customer being created or edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl CustomerDraft {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
        }
    }

    /// Rejects blank fields, reporting the first one found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("first_name", "FirstName", &self.first_name),
            ("last_name", "LastName", &self.last_name),
            ("email", "Email", &self.email),
        ];
        for (field, label, value) in fields {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField {
                    field,
                    message: format!("The {label} field is required."),
                });
            }
        }
        Ok(())
    }

    fn into_customer(self, customer_id: CustomerId) -> Customer {
        Customer {
            customer_id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
        }
    }
}

impl From<Customer> for CustomerDraft {
    fn from(customer: Customer) -> Self {
        Self {
            first_name: customer.first_name,
            last_name: customer.last_name,
            email: customer.email,
        }
    }
}

/// Everything the edit form needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerEditView {
    pub customer: Customer,

    /// Country of the customer's first address link, if any.
    pub country: Option<Country>,
    pub countries: Vec<Country>,
}

/// An order as listed on a customer's order screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub order_id: OrderId,
    pub order_date: DateTime<Utc>,
}

/// Service for the customer admin screens.
pub struct CustomerService<S: RowSource> {
    source: S,
}

impl<S: RowSource> CustomerService<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Lists one page of customers, sorted by last name.
    #[tracing::instrument(skip(self))]
    pub async fn list_customers(
        &self,
        page: i64,
        size: NonZeroUsize,
    ) -> Result<PagedList<CustomerViewModel>, DomainError> {
        let rows = self.source.list_customer_join_rows().await?;
        Ok(aggregate_customers(rows, page, size))
    }

    #[tracing::instrument(skip(self))]
    pub async fn find_customer(&self, customer_id: CustomerId) -> Result<Customer, DomainError> {
        self.source
            .get_customer(customer_id)
            .await?
            .ok_or_else(|| DomainError::not_found("customer", customer_id))
    }

    /// Creates a customer living in `country_id`.
    ///
    /// The new id is one past the highest id in use. The customer row and its
    /// address link are committed together.
    #[tracing::instrument(skip(self))]
    pub async fn create_customer(
        &self,
        draft: CustomerDraft,
        country_id: Option<CountryId>,
    ) -> Result<Customer, DomainError> {
        draft.validate()?;
        let address = self.address_for(country_id).await?;

        let customer_id = self
            .source
            .max_customer_id()
            .await?
            .map_or(CustomerId::new(1), |max| max.next());
        let customer = draft.into_customer(customer_id);

        let changes = ChangeSet::new()
            .insert_customer(customer.clone())
            .insert_customer_address(CustomerAddress::active(customer_id, address.address_id));
        self.source
            .commit(changes)
            .await
            .map_err(DomainError::Persistence)?;

        tracing::info!(%customer_id, address_id = %address.address_id, "Customer created");
        Ok(customer)
    }

    /// Overwrites a customer and moves it to `country_id`.
    ///
    /// `customer_id` is the id the request addressed; `customer` must carry
    /// the same id. Prior address links are replaced in the same commit as
    /// the row update.
    #[tracing::instrument(skip(self))]
    pub async fn edit_customer(
        &self,
        customer_id: CustomerId,
        customer: Customer,
        country_id: Option<CountryId>,
    ) -> Result<Customer, DomainError> {
        if customer.customer_id != customer_id {
            return Err(DomainError::not_found("customer", customer_id));
        }
        CustomerDraft::from(customer.clone()).validate()?;
        let address = self.address_for(country_id).await?;

        let changes = ChangeSet::new()
            .update_customer(customer.clone())
            .remove_customer_addresses(customer_id)
            .insert_customer_address(CustomerAddress::active(customer_id, address.address_id));

        match self.source.commit(changes).await {
            Ok(_) => {
                tracing::info!(%customer_id, "Customer updated");
                Ok(customer)
            }
            Err(e) if e.is_concurrency_conflict() => Err(self.recheck(customer_id, e).await),
            Err(e) => Err(DomainError::Persistence(e)),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn customer_for_edit(
        &self,
        customer_id: CustomerId,
    ) -> Result<CustomerEditView, DomainError> {
        let customer = self.find_customer(customer_id).await?;
        let country = self.source.find_customer_country(customer_id).await?;
        let countries = self.source.list_countries().await?;

        Ok(CustomerEditView {
            customer,
            country,
            countries,
        })
    }

    /// Lists a customer's orders by order id.
    #[tracing::instrument(skip(self))]
    pub async fn customer_orders(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<OrderSummary>, DomainError> {
        if !self.source.customer_exists(customer_id).await? {
            return Err(DomainError::not_found("customer", customer_id));
        }

        let orders = self.source.list_orders_for_customer(customer_id).await?;
        Ok(orders
            .into_iter()
            .map(|o| OrderSummary {
                order_id: o.order_id,
                order_date: o.order_date,
            })
            .collect())
    }

    pub async fn countries(&self) -> Result<Vec<Country>, DomainError> {
        Ok(self.source.list_countries().await?)
    }

    async fn address_for(&self, country_id: Option<CountryId>) -> Result<Address, DomainError> {
        let country_id = country_id.ok_or_else(|| ValidationError::MissingField {
            field: "country_id",
            message: "Please select a country.".to_string(),
        })?;

        self.source
            .find_address_for_country(country_id)
            .await?
            .ok_or_else(|| {
                ValidationError::InvalidField {
                    field: "country_id",
                    message: format!("No address is registered in country {country_id}."),
                }
                .into()
            })
    }

    async fn recheck(&self, customer_id: CustomerId, error: StoreError) -> DomainError {
        match self.source.customer_exists(customer_id).await {
            Ok(false) => DomainError::not_found("customer", customer_id),
            Ok(true) => DomainError::ConcurrencyConflict(error),
            Err(e) => DomainError::Persistence(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use row_store::{InMemoryRowSource, Order, StatusId};

    use super::*;

    fn size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    async fn bookstore() -> InMemoryRowSource {
        let source = InMemoryRowSource::with_status_catalog();
        source.insert_country(1, "US").await;
        source.insert_country(2, "UK").await;
        source.insert_country(3, "Atlantis").await;
        source.insert_address(10, 1).await;
        source.insert_address(11, 1).await;
        source.insert_address(20, 2).await;
        source
    }

    #[tokio::test]
    async fn create_assigns_next_id_and_links_address() {
        let source = bookstore().await;
        source
            .insert_customer(Customer {
                customer_id: CustomerId::new(41),
                first_name: "Old".to_string(),
                last_name: "Timer".to_string(),
                email: "old@example.com".to_string(),
            })
            .await;
        let service = CustomerService::new(source.clone());

        let created = service
            .create_customer(
                CustomerDraft::new("Ada", "Lovelace", "ada@example.com"),
                Some(CountryId::new(1)),
            )
            .await
            .unwrap();

        assert_eq!(created.customer_id, CustomerId::new(42));
        let links = source.addresses_of(CustomerId::new(42)).await;
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].address_id.value(), 10);
        assert_eq!(links[0].status_id, CustomerAddress::ACTIVE_STATUS);
    }

    #[tokio::test]
    async fn first_customer_gets_id_one() {
        let service = CustomerService::new(bookstore().await);
        let created = service
            .create_customer(
                CustomerDraft::new("A", "B", "a@b"),
                Some(CountryId::new(2)),
            )
            .await
            .unwrap();
        assert_eq!(created.customer_id, CustomerId::new(1));
    }

    #[tokio::test]
    async fn create_without_country_is_rejected() {
        let source = bookstore().await;
        let service = CustomerService::new(source.clone());

        let err = service
            .create_customer(CustomerDraft::new("A", "B", "a@b"), None)
            .await
            .unwrap_err();

        match err {
            DomainError::Validation(e) => {
                assert_eq!(e.to_string(), "Please select a country.");
                assert_eq!(e.field(), Some("country_id"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(source.customer_count().await, 0);
    }

    #[tokio::test]
    async fn create_in_country_without_addresses_is_rejected() {
        let source = bookstore().await;
        let service = CustomerService::new(source.clone());

        let result = service
            .create_customer(CustomerDraft::new("A", "B", "a@b"), Some(CountryId::new(3)))
            .await;

        assert!(matches!(
            result,
            Err(DomainError::Validation(ValidationError::InvalidField { .. }))
        ));
        assert_eq!(source.customer_count().await, 0);
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let service = CustomerService::new(bookstore().await);
        let err = service
            .create_customer(CustomerDraft::new("A", "  ", "a@b"), Some(CountryId::new(1)))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: The LastName field is required."
        );
    }

    #[tokio::test]
    async fn failed_create_leaves_no_partial_rows() {
        let source = bookstore().await;
        source.fail_next_commit("connection reset").await;
        let service = CustomerService::new(source.clone());

        let result = service
            .create_customer(CustomerDraft::new("A", "B", "a@b"), Some(CountryId::new(1)))
            .await;

        assert!(matches!(result, Err(DomainError::Persistence(_))));
        assert_eq!(source.customer_count().await, 0);
        assert_eq!(source.customer_address_count().await, 0);
    }

    #[tokio::test]
    async fn edit_replaces_address_link() {
        let source = bookstore().await;
        let service = CustomerService::new(source.clone());
        let created = service
            .create_customer(CustomerDraft::new("A", "B", "a@b"), Some(CountryId::new(1)))
            .await
            .unwrap();

        let mut changed = created.clone();
        changed.email = "new@b".to_string();
        service
            .edit_customer(created.customer_id, changed, Some(CountryId::new(2)))
            .await
            .unwrap();

        let stored = service.find_customer(created.customer_id).await.unwrap();
        assert_eq!(stored.email, "new@b");
        let links = source.addresses_of(created.customer_id).await;
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].address_id.value(), 20);

        let view = service.customer_for_edit(created.customer_id).await.unwrap();
        assert_eq!(view.country.unwrap().country_name, "UK");
        assert_eq!(view.countries.len(), 3);
    }

    #[tokio::test]
    async fn edit_with_mismatched_id_is_not_found() {
        let source = bookstore().await;
        let service = CustomerService::new(source.clone());
        let created = service
            .create_customer(CustomerDraft::new("A", "B", "a@b"), Some(CountryId::new(1)))
            .await
            .unwrap();

        let result = service
            .edit_customer(CustomerId::new(99), created, Some(CountryId::new(2)))
            .await;

        assert!(matches!(result, Err(DomainError::NotFound { .. })));
        assert_eq!(source.addresses_of(CustomerId::new(1)).await[0].address_id.value(), 10);
    }

    #[tokio::test]
    async fn edit_of_vanished_customer_is_not_found() {
        let service = CustomerService::new(bookstore().await);
        let ghost = Customer {
            customer_id: CustomerId::new(5),
            first_name: "G".to_string(),
            last_name: "H".to_string(),
            email: "g@h".to_string(),
        };

        let result = service
            .edit_customer(CustomerId::new(5), ghost, Some(CountryId::new(1)))
            .await;

        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn edit_without_country_keeps_old_link() {
        let source = bookstore().await;
        let service = CustomerService::new(source.clone());
        let created = service
            .create_customer(CustomerDraft::new("A", "B", "a@b"), Some(CountryId::new(1)))
            .await
            .unwrap();

        let result = service
            .edit_customer(created.customer_id, created.clone(), None)
            .await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert_eq!(source.addresses_of(created.customer_id).await.len(), 1);
    }

    #[tokio::test]
    async fn lists_customers_with_countries() {
        let source = bookstore().await;
        let service = CustomerService::new(source.clone());
        service
            .create_customer(CustomerDraft::new("A", "Zed", "a@x"), Some(CountryId::new(1)))
            .await
            .unwrap();
        service
            .create_customer(CustomerDraft::new("B", "Young", "b@x"), Some(CountryId::new(2)))
            .await
            .unwrap();

        let page = service.list_customers(1, size(10)).await.unwrap();

        assert_eq!(page.info.total_items, 2);
        assert_eq!(page.items[0].last_name, "Young");
        assert_eq!(page.items[0].country_name, "UK");
        assert_eq!(page.items[1].country_name, "US");
    }

    #[tokio::test]
    async fn customer_orders_lists_summaries() {
        let source = bookstore().await;
        let service = CustomerService::new(source.clone());
        let created = service
            .create_customer(CustomerDraft::new("A", "B", "a@b"), Some(CountryId::new(1)))
            .await
            .unwrap();
        for id in [3, 1] {
            source
                .insert_order(Order {
                    order_id: OrderId::new(id),
                    customer_id: created.customer_id,
                    order_date: Utc::now(),
                    status_id: StatusId::new(1),
                })
                .await;
        }

        let orders = service.customer_orders(created.customer_id).await.unwrap();
        let ids: Vec<i32> = orders.iter().map(|o| o.order_id.value()).collect();
        assert_eq!(ids, vec![1, 3]);

        let missing = service.customer_orders(CustomerId::new(99)).await;
        assert!(matches!(missing, Err(DomainError::NotFound { .. })));
    }
}
