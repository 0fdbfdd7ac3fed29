//! Screen-level flows that pair a gateway call with the store update the
//! screen performs afterwards. Gateway errors are returned untouched so the
//! caller can show the platform's message.

use tracing::{info, instrument, warn};

use crate::auth::dto::{CreateUserParams, SignInParams, UpdateUserParams};
use crate::auth::services::{self, is_valid_email};
use crate::auth::User;
use crate::error::GatewayError;
use crate::session::store::SessionStore;
use crate::state::AppState;

const FILL_ALL_FIELDS: &str = "Please fill in all fields";

fn require_email(email: &str) -> Result<(), GatewayError> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(GatewayError::Validation("Please enter a valid email address".into()))
    }
}

/// Register, then reconcile the session with the new account.
#[instrument(skip(st, store, params), fields(email = %params.email))]
pub async fn sign_up(
    st: &AppState,
    store: &SessionStore,
    mut params: CreateUserParams,
) -> Result<(), GatewayError> {
    params.email = params.email.trim().to_string();
    params.name = params.name.trim().to_string();
    if params.email.is_empty() || params.name.is_empty() || params.password.is_empty() {
        return Err(GatewayError::Validation(FILL_ALL_FIELDS.into()));
    }
    require_email(&params.email)?;

    services::create_user(st, params).await?;
    store.fetch_authenticated_user(st).await;
    Ok(())
}

/// Sign in, then reconcile the session.
#[instrument(skip(st, store, params), fields(email = %params.email))]
pub async fn sign_in_and_refresh(
    st: &AppState,
    store: &SessionStore,
    mut params: SignInParams,
) -> Result<(), GatewayError> {
    params.email = params.email.trim().to_string();
    if params.email.is_empty() || params.password.is_empty() {
        return Err(GatewayError::Validation(FILL_ALL_FIELDS.into()));
    }

    services::sign_in(st, params).await?;
    store.fetch_authenticated_user(st).await;
    Ok(())
}

/// Save edited profile fields for the signed-in user and publish the
/// updated record to the store.
///
/// `name` and `email` are trimmed before anything else. A field that is
/// blank after trimming fails with [`GatewayError::Validation`] ("Please fill
/// in all fields"), as does an email that is not shaped like an address.
/// With no user in the store this is [`GatewayError::NotSignedIn`]. None of
/// these cases reach the backend. Only the trimmed values are sent.
#[instrument(skip(st, store, params))]
pub async fn save_profile(
    st: &AppState,
    store: &SessionStore,
    params: UpdateUserParams,
) -> Result<User, GatewayError> {
    let name = params.name.trim();
    let email = params.email.trim();
    if name.is_empty() || email.is_empty() {
        return Err(GatewayError::Validation(FILL_ALL_FIELDS.into()));
    }
    require_email(email)?;

    let user_id = store
        .snapshot()
        .user
        .map(|u| u.id)
        .ok_or(GatewayError::NotSignedIn)?;

    let changes = UpdateUserParams {
        name: name.to_string(),
        email: email.to_string(),
    };
    let updated = services::update_user(st, &user_id, changes).await?;
    store.set_user(Some(updated.clone()));
    info!(user_id = %updated.id, "profile saved");
    Ok(updated)
}

/// End the backend session and clear the store. On failure the store keeps
/// its current state.
#[instrument(skip(st, store))]
pub async fn sign_out_and_clear(st: &AppState, store: &SessionStore) -> Result<(), GatewayError> {
    if let Err(e) = services::sign_out(st).await {
        warn!(error = %e, "sign out failed");
        return Err(e);
    }
    store.set_is_authenticated(false);
    store.set_user(None);
    Ok(())
}
