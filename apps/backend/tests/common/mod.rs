//! Common test utilities and fixtures for integration tests.
//!
//! This module provides shared test infrastructure including:
//! - TestContext for setting up the test environment with a database
//! - Helper functions for creating test data
//! - Authentication helpers
//!
//! # Requirements
//! Integration tests require a PostgreSQL database (set DATABASE_URL).

pub mod fixtures;

use std::sync::Arc;

use axum::Router;
use uuid::Uuid;

use exercise_core::MissingChildPolicy;
use vocal_backend::db::Database;
use vocal_backend::services::auth::hash_password;
use vocal_backend::{build_router, AppState};

/// Password that satisfies every strength requirement.
pub const TEST_PASSWORD: &str = "Tr4ining!Day";

/// Test context containing database connection and test server.
///
/// Requires DATABASE_URL environment variable to be set.
pub struct TestContext {
    pub db: Arc<Database>,
    app: Router,
}

impl TestContext {
    /// Create a new test context.
    ///
    /// # Panics
    /// Panics if DATABASE_URL is not set or database connection fails.
    pub async fn new() -> Self {
        Self::with_policy(MissingChildPolicy::Keep).await
    }

    /// Create a test context with an explicit missing-child policy.
    pub async fn with_policy(policy: MissingChildPolicy) -> Self {
        dotenvy::dotenv().ok();

        let database_url =
            std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");

        let db = Database::connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        db.run_migrations()
            .await
            .expect("Failed to run migrations");

        let db = Arc::new(db);

        let state = AppState {
            db: db.clone(),
            missing_child_policy: policy,
        };

        let app = build_router(state);

        Self { db, app }
    }

    /// Get the router for use with axum-test.
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    /// Create a test user and return its ID and bearer token.
    pub async fn create_test_user(&self) -> (Uuid, String) {
        let email = format!("test-{}@example.com", Uuid::new_v4());
        let password_hash = hash_password(TEST_PASSWORD).expect("hashing failed");
        let user = self
            .db
            .create_user(&email, &password_hash)
            .await
            .expect("Failed to create test user");
        (user.id, user.token)
    }

    /// Create a test user with the admin flag set.
    pub async fn create_admin_user(&self) -> (Uuid, String) {
        let (user_id, token) = self.create_test_user().await;
        sqlx::query("UPDATE users SET is_admin = TRUE WHERE id = $1")
            .bind(user_id)
            .execute(self.db.pool())
            .await
            .expect("Failed to grant admin");
        (user_id, token)
    }

    /// Format authorization header value.
    pub fn auth_header_value(token: &str) -> String {
        format!("Bearer {}", token)
    }

    /// Remove test exercises (and their component rows) by ID.
    pub async fn cleanup_exercises(&self, ids: &[Uuid]) {
        let _ = sqlx::query("DELETE FROM compound_exercise_component WHERE parent_exercise_id = ANY($1) OR child_exercise_id = ANY($1)")
            .bind(ids)
            .execute(self.db.pool())
            .await;

        let _ = sqlx::query("DELETE FROM exercise WHERE id = ANY($1)")
            .bind(ids)
            .execute(self.db.pool())
            .await;
    }

    /// Remove test routines by ID.
    pub async fn cleanup_routines(&self, ids: &[Uuid]) {
        let _ = sqlx::query("DELETE FROM routine WHERE id = ANY($1)")
            .bind(ids)
            .execute(self.db.pool())
            .await;
    }

    /// Remove a test user.
    pub async fn cleanup_user(&self, user_id: Uuid) {
        let _ = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(self.db.pool())
            .await;
    }
}
