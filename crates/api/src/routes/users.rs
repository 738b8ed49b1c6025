//! User account, address book and favorites handlers.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, post, put},
};

use scoop_core::{AddressId, CustomerId, Email, ProductId, UserId, UserRole};

use super::{AppJson, AppPath, AppQuery, ListQuery, positive, required};
use crate::db::users::UserSort;
use crate::db::{
    AddressRepository, CustomerRepository, RepositoryError, UserRepository, WishlistRepository,
};
use crate::error::{AppError, Result};
use crate::models::address::{Address, NewAddress};
use crate::models::customer::Customer;
use crate::models::user::{
    LoginRequest, ProfileUpdate, RegisterCustomer, RegisterWithRole, User, UserWithProfile,
};
use crate::models::wishlist::{FavoriteAdded, WishlistItem};
use crate::response::ApiResponse;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Build the user router (mounted at `/api/users`).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/guests", get(guests))
        .route("/email/{email}", get(by_email))
        .route("/role/{role}", get(by_role))
        .route("/register-customer", post(register_customer))
        .route("/register-with-role", post(register_with_role))
        .route("/login-customer", post(login_customer))
        .route("/{id}", get(show))
        .route("/{id}/profile", put(update_profile))
        .route("/{id}/link-customer/{customer_id}", post(link_customer))
        .route("/{id}/addresses", get(addresses).post(add_address))
        .route("/{id}/addresses/{address_id}", delete(delete_address))
        .route("/{id}/favorites", get(favorites))
        .route(
            "/{id}/favorites/{product_id}",
            post(add_favorite).delete(remove_favorite),
        )
}

fn user_id(raw: i32) -> Result<UserId> {
    positive(raw, UserId::positive, "user id")
}

fn parse_email(raw: &str) -> Result<Email> {
    Email::parse(raw).map_err(|e| AppError::BadRequest(format!("Invalid email address: {e}")))
}

/// The customer profile of a user, or 404.
async fn customer_of(state: &AppState, user_id: UserId) -> Result<CustomerId> {
    UserRepository::new(state.pool())
        .customer_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer profile not found".to_string()))
}

// =============================================================================
// Accounts
// =============================================================================

/// All users with their customer profiles.
///
/// # Errors
///
/// Returns 400 for invalid sort or paging parameters.
pub async fn index(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListQuery>,
) -> Result<ApiResponse<Vec<UserWithProfile>>> {
    let options = query.into_options::<UserSort>()?;
    let users = UserRepository::new(state.pool())
        .find_all_with_profiles(options)
        .await?;
    Ok(ApiResponse::list(users))
}

/// Customers that have no user account.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn guests(State(state): State<AppState>) -> Result<ApiResponse<Vec<Customer>>> {
    let guests = CustomerRepository::new(state.pool()).find_guests().await?;
    Ok(ApiResponse::list(guests))
}

/// One user with profile.
///
/// # Errors
///
/// Returns 400 for a non-positive id and 404 if the user does not exist.
pub async fn show(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<UserWithProfile>> {
    let user = UserRepository::new(state.pool())
        .get_by_id(user_id(id)?)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(ApiResponse::data(user))
}

/// One user with profile, by email.
///
/// # Errors
///
/// Returns 400 for a malformed email and 404 if no user has it.
pub async fn by_email(
    State(state): State<AppState>,
    AppPath(email): AppPath<String>,
) -> Result<ApiResponse<UserWithProfile>> {
    let email = parse_email(&email)?;
    let user = UserRepository::new(state.pool())
        .get_by_email(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(ApiResponse::data(user))
}

/// Users holding a role.
///
/// # Errors
///
/// Returns 400 for an unknown role.
pub async fn by_role(
    State(state): State<AppState>,
    AppPath(role): AppPath<String>,
) -> Result<ApiResponse<Vec<User>>> {
    let role: UserRole = role
        .parse()
        .map_err(|e: scoop_core::RoleError| AppError::BadRequest(e.to_string()))?;
    let users = UserRepository::new(state.pool()).find_by_role(role).await?;
    Ok(ApiResponse::list(users))
}

/// Customer sign-up: creates the account and its customer profile.
///
/// # Errors
///
/// Returns 400 for missing fields, a malformed email or a weak password,
/// and 409 if the email is already registered.
pub async fn register_customer(
    State(state): State<AppState>,
    AppJson(body): AppJson<RegisterCustomer>,
) -> Result<(StatusCode, ApiResponse<UserWithProfile>)> {
    if let Some(field) = body.missing_field() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    let email = required(body.email.as_deref(), "email")?;
    let password = body.password.as_deref().unwrap_or_default();

    let user = AuthService::new(state.pool())
        .register_customer(email, password, &body)
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::data(user).with_message("Customer registered successfully"),
    ))
}

/// Create a staff account (`admin` or `rider`).
///
/// # Errors
///
/// Returns 400 for missing fields or a non-staff role and 409 if the email is
/// already registered.
pub async fn register_with_role(
    State(state): State<AppState>,
    AppJson(body): AppJson<RegisterWithRole>,
) -> Result<(StatusCode, ApiResponse<User>)> {
    if let Some(field) = body.missing_field() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    let email = required(body.email.as_deref(), "email")?;
    let role = required(body.role.as_deref(), "role")?;
    let password = body.password.as_deref().unwrap_or_default();

    let user = AuthService::new(state.pool())
        .register_with_role(email, password, body.phone.as_deref(), role)
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::data(user).with_message("User registered successfully"),
    ))
}

/// Verify customer credentials and return the profile.
///
/// # Errors
///
/// Returns 400 for missing fields and 401 for bad credentials.
pub async fn login_customer(
    State(state): State<AppState>,
    AppJson(body): AppJson<LoginRequest>,
) -> Result<ApiResponse<UserWithProfile>> {
    let email = required(body.email.as_deref(), "email")?;
    let password = body
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::BadRequest("password is required".to_string()))?;

    let user = AuthService::new(state.pool())
        .login_customer(email, password)
        .await?;

    tracing::info!(user_id = %user.user.id, "customer logged in");
    Ok(ApiResponse::data(user).with_message("Login successful"))
}

/// Update account email/phone and profile fields.
///
/// # Errors
///
/// Returns 400 for a malformed email, 404 if the user does not exist and 409
/// if the new email is taken.
pub async fn update_profile(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(update): AppJson<ProfileUpdate>,
) -> Result<ApiResponse<UserWithProfile>> {
    let id = user_id(id)?;
    let email = update.email.as_deref().map(parse_email).transpose()?;

    let users = UserRepository::new(state.pool());
    if !users.save_profile(id, email.as_ref(), &update).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let user = users
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(ApiResponse::data(user).with_message("Profile updated successfully"))
}

/// Attach an existing customer profile to a user.
///
/// # Errors
///
/// Returns 404 if the user or customer does not exist and 409 if the user
/// already has a profile.
pub async fn link_customer(
    State(state): State<AppState>,
    AppPath((id, customer_id)): AppPath<(i32, i32)>,
) -> Result<ApiResponse<()>> {
    let id = user_id(id)?;
    let customer_id = positive(customer_id, CustomerId::positive, "customer id")?;

    if UserRepository::new(state.pool()).get_by_id(id).await?.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }
    if !CustomerRepository::new(state.pool())
        .link_user(customer_id, id)
        .await?
    {
        return Err(AppError::NotFound("Customer not found".to_string()));
    }

    tracing::info!(user_id = %id, customer_id = %customer_id, "customer linked to user");
    Ok(ApiResponse::message("Customer linked successfully"))
}

// =============================================================================
// Addresses
// =============================================================================

/// The user's address book.
///
/// # Errors
///
/// Returns 404 if the user has no customer profile.
pub async fn addresses(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<Vec<Address>>> {
    let customer_id = customer_of(&state, user_id(id)?).await?;
    let addresses = AddressRepository::new(state.pool())
        .list_for_customer(customer_id)
        .await?;
    Ok(ApiResponse::list(addresses))
}

/// Add an address.
///
/// # Errors
///
/// Returns 400 for missing fields and 404 if the user has no customer profile.
pub async fn add_address(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(input): AppJson<NewAddress>,
) -> Result<(StatusCode, ApiResponse<Address>)> {
    let id = user_id(id)?;
    if let Some(field) = input.missing_field() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }

    let customer_id = customer_of(&state, id).await?;
    let address = AddressRepository::new(state.pool())
        .create(customer_id, &input)
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::data(address).with_message("Address added successfully"),
    ))
}

/// Remove an address.
///
/// # Errors
///
/// Returns 404 if the address does not belong to the user.
pub async fn delete_address(
    State(state): State<AppState>,
    AppPath((id, address_id)): AppPath<(i32, i32)>,
) -> Result<ApiResponse<()>> {
    let id = user_id(id)?;
    let address_id = positive(address_id, AddressId::positive, "address id")?;

    let customer_id = customer_of(&state, id).await?;
    if !AddressRepository::new(state.pool())
        .delete(customer_id, address_id)
        .await?
    {
        return Err(AppError::NotFound("Address not found".to_string()));
    }
    Ok(ApiResponse::message("Address deleted successfully"))
}

// =============================================================================
// Favorites
// =============================================================================

/// The user's favorite products.
///
/// # Errors
///
/// Returns 400 for a non-positive id.
pub async fn favorites(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<Vec<WishlistItem>>> {
    let items = WishlistRepository::new(state.pool())
        .list(user_id(id)?)
        .await?;
    Ok(ApiResponse::list(items))
}

/// Add a product to the favorites. Adding twice is a no-op.
///
/// # Errors
///
/// Returns 404 if the user or product does not exist.
pub async fn add_favorite(
    State(state): State<AppState>,
    AppPath((id, product_id)): AppPath<(i32, i32)>,
) -> Result<ApiResponse<FavoriteAdded>> {
    let id = user_id(id)?;
    let product_id = positive(product_id, ProductId::positive, "product id")?;

    let wishlist_id = WishlistRepository::new(state.pool())
        .add(id, product_id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => {
                AppError::NotFound("User or product not found".to_string())
            }
            other => other.into(),
        })?;

    Ok(ApiResponse::data(FavoriteAdded {
        wishlist_id,
        product_id,
    })
    .with_message("Product added to favorites"))
}

/// Remove a product from the favorites.
///
/// # Errors
///
/// Returns 404 if the product was not a favorite.
pub async fn remove_favorite(
    State(state): State<AppState>,
    AppPath((id, product_id)): AppPath<(i32, i32)>,
) -> Result<ApiResponse<()>> {
    let id = user_id(id)?;
    let product_id = positive(product_id, ProductId::positive, "product id")?;

    if !WishlistRepository::new(state.pool())
        .remove(id, product_id)
        .await?
    {
        return Err(AppError::NotFound("Favorite not found".to_string()));
    }
    Ok(ApiResponse::message("Product removed from favorites"))
}
