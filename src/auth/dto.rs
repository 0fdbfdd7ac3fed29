use serde::{Deserialize, Serialize};

/// Input for account registration.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserParams {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Input for email/password sign-in.
#[derive(Debug, Clone, Deserialize)]
pub struct SignInParams {
    pub email: String,
    pub password: String,
}

/// Editable profile fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateUserParams {
    pub name: String,
    pub email: String,
}
