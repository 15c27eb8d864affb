use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "app_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    CareWorker,
    SupportCoordinator,
}

impl Role {
    /// Admins and managers may schedule, edit, cancel and no-show any shift
    /// in their organization.
    pub fn can_manage_shifts(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,    // user id
    pub org_id: Uuid, // organization id
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

/// The verified caller. `platform_admin` is a separately granted capability
/// (cross-tenant support tooling) and never follows from `role`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub org_id: Uuid,
    pub role: Role,
    pub platform_admin: bool,
}

/// Internal row type for the auth DB check query.
#[derive(sqlx::FromRow)]
struct AuthUserRow {
    role: Role,
    is_active: bool,
    is_platform_admin: bool,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let token = extract_bearer_token(&parts.headers).ok_or(AppError::Unauthorized)?;

        let key = DecodingKey::from_secret(app_state.jwt_secret.as_bytes());
        let claims = decode::<Claims>(&token, &key, &Validation::new(Algorithm::HS256))
            .map_err(|e| {
                tracing::warn!("JWT decode failed: {}", e);
                AppError::Unauthorized
            })?
            .claims;

        // Role, active flag and platform capability are re-read on every
        // request so revocations take effect before the token expires.
        let row = sqlx::query_as::<_, AuthUserRow>(
            "SELECT role, is_active, is_platform_admin FROM users WHERE id = $1 AND org_id = $2",
        )
        .bind(claims.sub)
        .bind(claims.org_id)
        .fetch_optional(&app_state.pool)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Auth DB check failed: {}", e)))?
        .ok_or(AppError::Unauthorized)?;

        if !row.is_active {
            return Err(AppError::Unauthorized);
        }

        Ok(AuthUser {
            id: claims.sub,
            org_id: claims.org_id,
            role: row.role,
            platform_admin: row.is_platform_admin,
        })
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth = headers.get("Authorization")?.to_str().ok()?;
    let token = auth.strip_prefix("Bearer ")?;
    Some(token.to_string())
}

pub fn create_token(
    user_id: Uuid,
    org_id: Uuid,
    role: Role,
    secret: &str,
    expiry_hours: u64,
) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let now = OffsetDateTime::now_utc();
    let exp = now + time::Duration::hours(expiry_hours as i64);

    let claims = Claims {
        sub: user_id,
        org_id,
        role,
        exp: exp.unix_timestamp(),
        iat: now.unix_timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(extract_bearer_token(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn other_schemes_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", "Basic dXNlcjpwdw==".parse().unwrap());
        assert_eq!(extract_bearer_token(&headers), None);
        assert_eq!(extract_bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn issued_token_round_trips_claims() {
        let secret = "test-secret-that-is-at-least-32-chars-long!!";
        let (user, org) = (Uuid::new_v4(), Uuid::new_v4());
        let token = create_token(user, org, Role::CareWorker, secret, 12).unwrap();

        let claims = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .unwrap()
        .claims;
        assert_eq!(claims.sub, user);
        assert_eq!(claims.org_id, org);
        assert_eq!(claims.role, Role::CareWorker);
        assert_eq!(claims.exp - claims.iat, 12 * 3600);
    }

    #[test]
    fn only_admins_and_managers_manage_shifts() {
        assert!(Role::Admin.can_manage_shifts());
        assert!(Role::Manager.can_manage_shifts());
        assert!(!Role::CareWorker.can_manage_shifts());
        assert!(!Role::SupportCoordinator.can_manage_shifts());
    }
}
