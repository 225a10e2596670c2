use axum::body::Bytes;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::Duration;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{role, role_permission, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{ACCESS_COOKIE, AuthUser, REFRESH_COOKIE};
use crate::extractors::json::AppJson;
use crate::models::auth::{
    ChangePasswordRequest, LoginRequest, LoginResponse, MeResponse, RefreshRequest,
    RegisterRequest, RegisterResponse, validate_change_password_request, validate_login_request,
    validate_register_request,
};
use crate::state::AppState;
use crate::utils::jwt::TokenKind;
use crate::utils::{hash, jwt};

#[utoipa::path(
    post,
    path = "/register",
    tag = "Auth",
    operation_id = "register",
    summary = "Register a new account",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Username or email in use (USERNAME_TAKEN, EMAIL_TAKEN)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_register_request(&payload)?;

    let username = payload.username.trim().to_string();
    let email = payload.email.trim().to_lowercase();

    let taken = user::Entity::find()
        .filter(
            Condition::any()
                .add(user::Column::Username.eq(&username))
                .add(user::Column::Email.eq(&email)),
        )
        .one(&state.db)
        .await?;
    if let Some(existing) = taken {
        return Err(if existing.username == username {
            AppError::UsernameTaken
        } else {
            AppError::EmailTaken
        });
    }

    let hash = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let now = chrono::Utc::now();
    let new_user = user::ActiveModel {
        username: Set(username),
        email: Set(email),
        password: Set(hash),
        role: Set(role::DEFAULT_ROLE.to_string()),
        refresh_token: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let user = new_user.insert(&state.db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            tracing::debug!("Registration race condition: unique constraint caught on insert");
            AppError::UsernameTaken
        }
        _ => AppError::from(e),
    })?;

    Ok((StatusCode::CREATED, Json(RegisterResponse::from(user))))
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Log in and receive access and refresh tokens",
    description = "Returns both tokens in the body and sets them as http-only cookies. Logging in again invalidates the previous refresh token.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Bad credentials (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, jar, payload), fields(username = %payload.username))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    validate_login_request(&payload)?;

    let username = payload.username.trim();

    let user = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let is_valid = hash::verify_password(&payload.password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;

    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    let response = issue_tokens(&state, user).await?;
    Ok((set_auth_cookies(&state, jar, &response), Json(response)))
}

#[utoipa::path(
    post,
    path = "/refresh",
    tag = "Auth",
    operation_id = "refreshTokens",
    summary = "Exchange a refresh token for a new token pair",
    description = "Reads the refresh token from the JSON body or, when absent, from the `refresh_token` cookie. Only the most recently issued refresh token is accepted.",
    request_body(content = RefreshRequest, description = "Optional when the cookie is present"),
    responses(
        (status = 200, description = "Tokens rotated", body = LoginResponse),
        (status = 401, description = "Missing or stale token (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
)]
#[instrument(skip_all)]
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let from_body = if body.is_empty() {
        None
    } else {
        serde_json::from_slice::<RefreshRequest>(&body)
            .map_err(|e| AppError::Validation(e.to_string()))?
            .refresh_token
    };
    let token = from_body
        .or_else(|| jar.get(REFRESH_COOKIE).map(|c| c.value().to_string()))
        .ok_or(AppError::TokenMissing)?;

    let claims = jwt::verify(&token, TokenKind::Refresh, &state.config.auth.jwt_secret)
        .map_err(|_| AppError::TokenInvalid)?;

    let user = user::Entity::find_by_id(claims.uid)
        .one(&state.db)
        .await?
        .ok_or(AppError::TokenInvalid)?;
    if user.refresh_token.as_deref() != Some(token.as_str()) {
        return Err(AppError::TokenInvalid);
    }

    let response = issue_tokens(&state, user).await?;
    Ok((set_auth_cookies(&state, jar, &response), Json(response)))
}

#[utoipa::path(
    post,
    path = "/logout",
    tag = "Auth",
    operation_id = "logout",
    summary = "Revoke the refresh token and clear auth cookies",
    responses(
        (status = 204, description = "Logged out"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, jar), fields(user_id = auth_user.user_id))]
pub async fn logout(
    auth_user: AuthUser,
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode), AppError> {
    if let Some(user) = user::Entity::find_by_id(auth_user.user_id)
        .one(&state.db)
        .await?
    {
        let mut active: user::ActiveModel = user.into();
        active.refresh_token = Set(None);
        active.update(&state.db).await?;
    }

    let jar = jar
        .remove(Cookie::build(ACCESS_COOKIE).path("/"))
        .remove(Cookie::build(REFRESH_COOKIE).path("/"));
    Ok((jar, StatusCode::NO_CONTENT))
}

#[utoipa::path(
    post,
    path = "/change-password",
    tag = "Auth",
    operation_id = "changePassword",
    summary = "Change the caller's password",
    description = "Requires the current password. Revokes the stored refresh token.",
    request_body = ChangePasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Wrong current password (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn change_password(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<ChangePasswordRequest>,
) -> Result<StatusCode, AppError> {
    validate_change_password_request(&payload)?;

    let user = user::Entity::find_by_id(auth_user.user_id)
        .one(&state.db)
        .await?
        .ok_or(AppError::TokenInvalid)?;

    let is_valid = hash::verify_password(&payload.password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;
    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    let hash = hash::hash_password(&payload.new_password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let mut active: user::ActiveModel = user.into();
    active.password = Set(hash);
    active.refresh_token = Set(None);
    active.updated_at = Set(chrono::Utc::now());
    active.update(&state.db).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Auth",
    operation_id = "me",
    summary = "Current user",
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(auth_user), fields(user_id = auth_user.user_id))]
pub async fn me(auth_user: AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        id: auth_user.user_id,
        username: auth_user.username,
        role: auth_user.role,
        permissions: auth_user.permissions,
    })
}

/// Sign a fresh access/refresh pair and remember the refresh token on the user row.
async fn issue_tokens(state: &AppState, user: user::Model) -> Result<LoginResponse, AppError> {
    let permissions: Vec<String> = role_permission::Entity::find()
        .filter(role_permission::Column::Role.eq(&user.role))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|rp| rp.permission)
        .collect();

    let auth = &state.config.auth;
    let sign = |kind, ttl| {
        jwt::sign(
            user.id,
            &user.username,
            &user.role,
            permissions.clone(),
            kind,
            ttl,
            &auth.jwt_secret,
        )
        .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))
    };
    let token = sign(
        TokenKind::Access,
        Duration::minutes(auth.access_token_ttl_minutes),
    )?;
    let refresh_token = sign(
        TokenKind::Refresh,
        Duration::days(auth.refresh_token_ttl_days),
    )?;

    let username = user.username.clone();
    let role = user.role.clone();
    let mut active: user::ActiveModel = user.into();
    active.refresh_token = Set(Some(refresh_token.clone()));
    active.update(&state.db).await?;

    Ok(LoginResponse {
        token,
        refresh_token,
        username,
        role,
        permissions,
    })
}

fn set_auth_cookies(state: &AppState, jar: CookieJar, tokens: &LoginResponse) -> CookieJar {
    let secure = state.config.auth.secure_cookies;
    let cookie = |name: &'static str, value: String| {
        Cookie::build((name, value))
            .path("/")
            .http_only(true)
            .secure(secure)
            .same_site(SameSite::Lax)
            .build()
    };
    jar.add(cookie(ACCESS_COOKIE, tokens.token.clone()))
        .add(cookie(REFRESH_COOKIE, tokens.refresh_token.clone()))
}
