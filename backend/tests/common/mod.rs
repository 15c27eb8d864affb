#![allow(dead_code)]
use std::net::SocketAddr;

use argon2::{password_hash::SaltString, Argon2, PasswordHasher};
use rand_core::OsRng;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use careroster_backend::{api, AppState};

pub const JWT_SECRET: &str = "test-secret-that-is-at-least-32-chars-long!!";
const JWT_EXPIRY_HOURS: u64 = 12;

fn database_url() -> String {
    std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must be set; these tests write and delete rows, so never point it at a shared database")
}

/// Spin up a real Axum server on a random port, returning its address and the
/// database pool. All tests share one database; isolation comes from creating
/// unique orgs/users per test and cleaning up afterwards.
///
/// Tests that call this are `#[ignore]`d and run with `cargo test -- --ignored`.
pub async fn setup_test_app() -> (SocketAddr, PgPool) {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url())
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let state = AppState {
        pool: pool.clone(),
        jwt_secret: JWT_SECRET.to_string(),
        jwt_expiry_hours: JWT_EXPIRY_HOURS,
    };
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, pool)
}

pub fn unique_email(prefix: &str) -> String {
    format!("{}+{}@test.local", prefix, &Uuid::new_v4().to_string()[..8])
}

/// Create a test organization with a unique slug. Returns the org ID.
pub async fn create_test_org(pool: &PgPool, suffix: &str) -> Uuid {
    let id = Uuid::new_v4();
    let slug = format!("test-org-{}-{}", suffix, &id.to_string()[..8]);
    let name = format!("Test Org {}", suffix);

    sqlx::query("INSERT INTO organizations (id, name, slug, timezone) VALUES ($1, $2, $3, 'UTC')")
        .bind(id)
        .bind(&name)
        .bind(&slug)
        .execute(pool)
        .await
        .expect("Failed to create test org");

    id
}

async fn insert_user(pool: &PgPool, org_id: Uuid, role: &str, email: &str, active: bool) -> (Uuid, String) {
    let user_id = Uuid::new_v4();
    let password = "testpass123";
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .expect("Failed to hash password")
        .to_string();

    sqlx::query(
        "INSERT INTO users (id, org_id, first_name, last_name, email, password_hash, role, is_active) \
         VALUES ($1, $2, 'Test', 'User', $3, $4, $5::app_role, $6)",
    )
    .bind(user_id)
    .bind(org_id)
    .bind(email)
    .bind(&hash)
    .bind(role)
    .bind(active)
    .execute(pool)
    .await
    .expect("Failed to create test user");

    (user_id, password.to_string())
}

/// Create a test user with Argon2-hashed password. Returns (user_id, plaintext_password).
pub async fn create_test_user(pool: &PgPool, org_id: Uuid, role: &str, email: &str) -> (Uuid, String) {
    insert_user(pool, org_id, role, email, true).await
}

pub async fn create_inactive_user(pool: &PgPool, org_id: Uuid, email: &str) -> (Uuid, String) {
    insert_user(pool, org_id, "care_worker", email, false).await
}

pub async fn grant_platform_admin(pool: &PgPool, user_id: Uuid) {
    sqlx::query("UPDATE users SET is_platform_admin = true WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await
        .expect("Failed to grant platform admin");
}

pub async fn create_test_participant(pool: &PgPool, org_id: Uuid) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO participants (id, org_id, first_name, last_name, is_active) \
         VALUES ($1, $2, 'Test', 'Participant', true)",
    )
    .bind(id)
    .bind(org_id)
    .execute(pool)
    .await
    .expect("Failed to create test participant");
    id
}

/// A signed-in user plus the org they belong to.
pub struct Actor {
    pub id: Uuid,
    pub token: String,
}

pub async fn sign_in_as(addr: SocketAddr, pool: &PgPool, org_id: Uuid, role: &str) -> Actor {
    let email = unique_email(role);
    let (id, password) = create_test_user(pool, org_id, role, &email).await;
    let token = get_auth_token(addr, &email, &password).await;
    Actor { id, token }
}

/// Log in via the HTTP API and return the JWT token.
pub async fn get_auth_token(addr: SocketAddr, email: &str, password: &str) -> String {
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://{}/api/auth/login", addr))
        .json(&serde_json::json!({
            "email": email,
            "password": password,
        }))
        .send()
        .await
        .expect("Login request failed");

    assert_eq!(resp.status(), 200, "Login should return 200");

    let body: serde_json::Value = resp.json().await.expect("Failed to parse login response");
    body["token"]
        .as_str()
        .expect("Response should contain token")
        .to_string()
}

/// Create a JWT token that is already expired (exp in the past).
/// Uses the same secret as the test app.
pub fn create_expired_token(user_id: Uuid, org_id: Uuid) -> String {
    use careroster_backend::auth::{Claims, Role};
    use jsonwebtoken::{encode, EncodingKey, Header};

    let now = time::OffsetDateTime::now_utc();
    let claims = Claims {
        sub: user_id,
        org_id,
        role: Role::CareWorker,
        exp: (now - time::Duration::hours(1)).unix_timestamp(),
        iat: (now - time::Duration::hours(2)).unix_timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("Failed to create expired token")
}

/// Build a reqwest client (reusable across requests in a test).
pub fn http_client() -> reqwest::Client {
    reqwest::Client::new()
}

/// Clean up all test data for a given org. Call this at the end of tests.
pub async fn cleanup_test_org(pool: &PgPool, org_id: Uuid) {
    // Delete in dependency order (child tables first)
    let cleanup_queries = [
        "DELETE FROM shifts WHERE participant_id IN (SELECT id FROM participants WHERE org_id = $1)",
        "DELETE FROM shifts WHERE staff_id IN (SELECT id FROM users WHERE org_id = $1)",
        "DELETE FROM participants WHERE org_id = $1",
        "DELETE FROM users WHERE org_id = $1",
        "DELETE FROM organizations WHERE id = $1",
    ];

    for q in cleanup_queries {
        let _ = sqlx::query(q).bind(org_id).execute(pool).await;
    }
}
