//! Account routes: login and registration.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::UserSummary;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserSummary,
}

/// `POST /auth/login` - password login.
///
/// Returns a bearer token and the account summary. Unknown email and
/// wrong password produce the same 401.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let (token, user) = state
        .auth()
        .login(&body.email, &body.password)
        .await
        .map_err(AppError::from)?;

    tracing::info!(user = %user.email, "login");

    Ok(Json(LoginResponse {
        token,
        user: UserSummary::from(&user),
    }))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub username: String,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: UserSummary,
}

/// `POST /auth/register` - create an account.
///
/// Returns 201 with the account summary. A duplicate email is a 409.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    let user = state
        .auth()
        .register(&body.email, &body.password, &body.username, body.phone)
        .await
        .map_err(AppError::from)?;

    tracing::info!(user = %user.email, "account registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: UserSummary::from(&user),
        }),
    ))
}
