//! Customer route handlers.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::get,
};

use scoop_core::{CustomerId, Email};

use super::{AppJson, AppPath, AppQuery, ListQuery, positive, required};
use crate::db::CustomerRepository;
use crate::db::customers::CustomerSort;
use crate::error::{AppError, Result};
use crate::models::customer::{Customer, CustomerStatistics, CustomerUpdate, NewCustomer};
use crate::response::ApiResponse;
use crate::state::AppState;

/// Build the customer router (mounted at `/api/customers`).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index).post(create))
        .route("/statistics", get(statistics))
        .route("/email/{email}", get(by_email))
        .route("/search/{query}", get(search))
        .route("/city/{city}", get(by_city))
        .route("/{id}", get(show).put(update).delete(destroy))
}

fn customer_id(raw: i32) -> Result<CustomerId> {
    positive(raw, CustomerId::positive, "customer id")
}

/// Validate and normalize an email field in a request body.
fn normalize_email(email: &mut Option<String>) -> Result<()> {
    if let Some(raw) = email.as_deref() {
        let parsed = Email::parse(raw)
            .map_err(|e| AppError::BadRequest(format!("Invalid email address: {e}")))?;
        *email = Some(parsed.into_inner());
    }
    Ok(())
}

/// All customers.
///
/// # Errors
///
/// Returns 400 for invalid sort or paging parameters.
pub async fn index(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListQuery>,
) -> Result<ApiResponse<Vec<Customer>>> {
    let options = query.into_options::<CustomerSort>()?;
    let customers = CustomerRepository::new(state.pool())
        .find_all(options)
        .await?;
    Ok(ApiResponse::list(customers))
}

/// One customer.
///
/// # Errors
///
/// Returns 400 for a non-positive id and 404 if the customer does not exist.
pub async fn show(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<Customer>> {
    let customer = CustomerRepository::new(state.pool())
        .find_by_id(customer_id(id)?)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))?;
    Ok(ApiResponse::data(customer))
}

/// One customer by email.
///
/// # Errors
///
/// Returns 400 for a malformed email and 404 if no customer has it.
pub async fn by_email(
    State(state): State<AppState>,
    AppPath(email): AppPath<String>,
) -> Result<ApiResponse<Customer>> {
    let email = Email::parse(&email)
        .map_err(|e| AppError::BadRequest(format!("Invalid email address: {e}")))?;
    let customer = CustomerRepository::new(state.pool())
        .find_by_email(email.as_str())
        .await?
        .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))?;
    Ok(ApiResponse::data(customer))
}

/// Customers whose first, last or full name or email contains the term.
///
/// # Errors
///
/// Returns 400 for a blank term.
pub async fn search(
    State(state): State<AppState>,
    AppPath(query): AppPath<String>,
) -> Result<ApiResponse<Vec<Customer>>> {
    let term = required(Some(&query), "Search term")?;
    let customers = CustomerRepository::new(state.pool()).search(term).await?;
    Ok(ApiResponse::list(customers))
}

/// Customers living in a city.
///
/// # Errors
///
/// Returns 400 for a blank city.
pub async fn by_city(
    State(state): State<AppState>,
    AppPath(city): AppPath<String>,
) -> Result<ApiResponse<Vec<Customer>>> {
    let city = required(Some(&city), "City")?;
    let customers = CustomerRepository::new(state.pool())
        .find_by_city(city)
        .await?;
    Ok(ApiResponse::list(customers))
}

/// Customer counts.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn statistics(State(state): State<AppState>) -> Result<ApiResponse<CustomerStatistics>> {
    let stats = CustomerRepository::new(state.pool()).statistics().await?;
    Ok(ApiResponse::data(stats))
}

/// Create a customer.
///
/// # Errors
///
/// Returns 400 if a required field is missing and 409 if the email is taken.
pub async fn create(
    State(state): State<AppState>,
    AppJson(mut input): AppJson<NewCustomer>,
) -> Result<(StatusCode, ApiResponse<Customer>)> {
    if let Some(field) = input.missing_field() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    normalize_email(&mut input.email)?;

    let customer = CustomerRepository::new(state.pool()).create(&input).await?;
    tracing::info!(customer_id = %customer.id, "customer created");

    Ok((
        StatusCode::CREATED,
        ApiResponse::data(customer).with_message("Customer created successfully"),
    ))
}

/// Update the provided fields of a customer.
///
/// # Errors
///
/// Returns 400 for an empty update and 404 if the customer does not exist.
pub async fn update(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(mut update): AppJson<CustomerUpdate>,
) -> Result<ApiResponse<Customer>> {
    let id = customer_id(id)?;
    if update.is_empty() {
        return Err(AppError::BadRequest("No fields to update".to_string()));
    }
    normalize_email(&mut update.email)?;

    let customer = CustomerRepository::new(state.pool())
        .update(id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))?;

    Ok(ApiResponse::data(customer).with_message("Customer updated successfully"))
}

/// Delete a customer.
///
/// # Errors
///
/// Returns 400 for a non-positive id and 404 if the customer does not exist.
pub async fn destroy(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<()>> {
    let id = customer_id(id)?;
    if !CustomerRepository::new(state.pool()).delete(id).await? {
        return Err(AppError::NotFound("Customer not found".to_string()));
    }
    tracing::info!(customer_id = %id, "customer deleted");
    Ok(ApiResponse::message("Customer deleted successfully"))
}
