use axum::{extract::State, Json};
use argon2::{Argon2, PasswordHash, PasswordVerifier};
use sqlx::PgPool;

use crate::{
    auth::{create_token, AuthUser},
    error::{AppError, Result},
    models::user::{LoginRequest, LoginResponse, User, UserProfile},
    AppState,
};

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, org_id, first_name, last_name, email, phone, password_hash,
               role, is_platform_admin, is_active, created_at, updated_at
        FROM users
        WHERE email = $1 AND is_active = true
        "#,
    )
    .bind(&req.email)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::Unauthorized)?;

    let parsed = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid stored hash")))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed)
        .map_err(|_| {
            tracing::info!(user_id = %user.id, "Login rejected: bad password");
            AppError::Unauthorized
        })?;

    let token = create_token(
        user.id,
        user.org_id,
        user.role,
        &state.jwt_secret,
        state.jwt_expiry_hours,
    )
    .map_err(AppError::Internal)?;

    tracing::info!(user_id = %user.id, org_id = %user.org_id, "User logged in");

    Ok(Json(LoginResponse {
        token,
        user: user.into(),
    }))
}

pub async fn me(State(pool): State<PgPool>, auth: AuthUser) -> Result<Json<UserProfile>> {
    let profile = sqlx::query_as::<_, UserProfile>(
        r#"
        SELECT id, org_id, first_name, last_name, email, phone,
               role, is_platform_admin, is_active
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(auth.id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(Json(profile))
}
