use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use crate::error::{ApiError, AppJson, FieldErrors};
use crate::state::AppState;

use super::dto::{CreateUserRequest, LoginRequest, LoginResponse, PublicUser, Role};
use super::jwt::{AuthUser, JwtKeys};
use super::password::{hash_password, verify_password};
use super::repo::CreateUserError;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/admin/users", post(create_user))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let username = payload.username.trim();
    if username.is_empty() || payload.role.is_empty() {
        return Err(ApiError::BadRequest("Username and role are required".into()));
    }
    if payload.password.is_empty() {
        return Err(ApiError::BadRequest("Password is required".into()));
    }
    let requested_role = Role::parse(&payload.role)
        .ok_or_else(|| ApiError::BadRequest("Invalid role".into()))?;

    let user = state
        .users
        .find_by_username(username)
        .await?
        .ok_or_else(|| {
            warn!(username, "login with unknown username");
            ApiError::Unauthorized("Invalid username or password".into())
        })?;

    // Accounts from the password-less era have no hash and cannot log in.
    let Some(hash) = user.password_hash.as_deref() else {
        warn!(username = %user.username, "login attempt on account without password");
        return Err(ApiError::Unauthorized(
            "Account requires password setup. Please contact admin.".into(),
        ));
    };

    if !verify_password(&payload.password, hash)? {
        warn!(username = %user.username, "login with invalid password");
        return Err(ApiError::Unauthorized("Invalid username or password".into()));
    }

    let stored_role = Role::parse(&user.role)
        .ok_or_else(|| anyhow::anyhow!("unrecognized stored role {:?}", user.role))?;

    // Deliberately distinct from "Invalid username or password": the account
    // is authenticated but asked for the wrong role. Carried over from the
    // original behavior; see DESIGN.md for the disclosure trade-off.
    if stored_role != requested_role {
        warn!(
            username = %user.username,
            stored = %stored_role,
            requested = %requested_role,
            "login role mismatch"
        );
        return Err(ApiError::Forbidden(format!(
            "Login failed. User is registered as {}, not {}.",
            stored_role, requested_role
        )));
    }

    let token = JwtKeys::from_ref(&state).sign(user.id)?;
    info!(user_id = %user.id, username = %user.username, role = %stored_role, "user logged in");
    Ok(Json(LoginResponse {
        user: PublicUser {
            id: user.id,
            username: user.username,
            role: stored_role,
        },
        token,
    }))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let username = payload.username.trim().to_string();

    let mut errors = FieldErrors::new();
    if username.chars().count() < 3 {
        errors.push("username", "Username must be at least 3 characters long.");
    }
    if payload.password.chars().count() < 6 {
        errors.push("password", "Password must be at least 6 characters long.");
    }
    let role = Role::parse(&payload.role);
    if role.is_none() {
        errors.push("role", "Role must be either hew or officer.");
    }
    let Some(role) = role else {
        return Err(ApiError::validation("Invalid user data", errors));
    };
    if !errors.is_empty() {
        return Err(ApiError::validation("Invalid user data", errors));
    }

    if state.users.find_by_username(&username).await?.is_some() {
        warn!(username = %username, "duplicate username");
        return Err(ApiError::Conflict("Username already exists".into()));
    }

    let hash = hash_password(&payload.password)?;
    let user = match state.users.create(&username, &hash, role.as_str()).await {
        Ok(u) => u,
        // Lost the check-then-insert race; the constraint still holds.
        Err(CreateUserError::DuplicateUsername) => {
            warn!(username = %username, "duplicate username");
            return Err(ApiError::Conflict("Username already exists".into()));
        }
        Err(CreateUserError::Other(e)) => return Err(ApiError::Internal(e)),
    };

    info!(user_id = %user.id, username = %user.username, role = %role, "user created");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User created successfully",
            "user": PublicUser {
                id: user.id,
                username: user.username,
                role,
            },
        })),
    ))
}

/// Session check on app load: resolves a bearer token back to its account.
#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Value>, ApiError> {
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;

    let role = Role::parse(&user.role)
        .ok_or_else(|| anyhow::anyhow!("unrecognized stored role {:?}", user.role))?;

    Ok(Json(json!({
        "user": PublicUser {
            id: user.id,
            username: user.username,
            role,
        },
    })))
}
