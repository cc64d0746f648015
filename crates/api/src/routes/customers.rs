//! Customer list, create, edit and delete endpoints.

use std::num::NonZeroUsize;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{CountryId, CustomerId};
use domain::{
    CustomerDraft, CustomerEditView, CustomerViewModel, DeletionSummary, OrderSummary, PagedList,
};
use row_store::{Country, Customer, RowSource};
use serde::Deserialize;

use super::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub size: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCustomerRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub country_id: Option<CountryId>,
}

#[derive(Debug, Deserialize)]
pub struct EditCustomerRequest {
    pub customer_id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub country_id: Option<CountryId>,
}

// -- Handlers --

/// GET /customers: one page of customers sorted by last name.
#[tracing::instrument(skip(state))]
pub async fn list<S: RowSource + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<PagedList<CustomerViewModel>>, ApiError> {
    let size = match query.size {
        Some(size) => NonZeroUsize::new(size)
            .ok_or_else(|| ApiError::BadRequest("size must be at least 1".to_string()))?,
        None => state.default_page_size,
    };
    let page = query.page.unwrap_or(1);

    Ok(Json(state.customers.list_customers(page, size).await?))
}

/// POST /customers: create a customer in the selected country.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: RowSource + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    let draft = CustomerDraft::new(req.first_name, req.last_name, req.email);
    let customer = state
        .customers
        .create_customer(draft, req.country_id)
        .await?;

    Ok((StatusCode::CREATED, Json(customer)))
}

/// GET /customers/{id}: customer with its country and the country catalog.
#[tracing::instrument(skip(state))]
pub async fn get<S: RowSource + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<CustomerId>,
) -> Result<Json<CustomerEditView>, ApiError> {
    Ok(Json(state.customers.customer_for_edit(id).await?))
}

/// PUT /customers/{id}: overwrite a customer and move it to a country.
#[tracing::instrument(skip(state, req))]
pub async fn edit<S: RowSource + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<CustomerId>,
    Json(req): Json<EditCustomerRequest>,
) -> Result<Json<Customer>, ApiError> {
    let customer = Customer {
        customer_id: req.customer_id,
        first_name: req.first_name,
        last_name: req.last_name,
        email: req.email,
    };
    let customer = state
        .customers
        .edit_customer(id, customer, req.country_id)
        .await?;

    Ok(Json(customer))
}

/// DELETE /customers/{id}: remove a customer with its orders and links.
#[tracing::instrument(skip(state))]
pub async fn delete<S: RowSource + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<CustomerId>,
) -> Result<Json<DeletionSummary>, ApiError> {
    Ok(Json(state.deleter.delete_customer(id).await?))
}

/// GET /customers/{id}/orders: the customer's orders by order id.
#[tracing::instrument(skip(state))]
pub async fn orders<S: RowSource + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<CustomerId>,
) -> Result<Json<Vec<OrderSummary>>, ApiError> {
    Ok(Json(state.customers.customer_orders(id).await?))
}

/// GET /countries: the country catalog.
pub async fn countries<S: RowSource + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Country>>, ApiError> {
    Ok(Json(state.customers.countries().await?))
}
