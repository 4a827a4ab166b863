//! Users API routes
//!
//! Wires the users domain to MongoDB, Argon2 and the JWT principal middleware.

use axum::{Router, middleware::from_fn_with_state};
use axum_helpers::{JwtAuth, jwt_auth_middleware};
use domain_users::{Argon2Hasher, MongoUserRepository, UserService, handlers};
use mongodb::Database;

use crate::state::AppState;

/// Every users route requires a verified principal
pub fn router(state: &AppState) -> eyre::Result<Router> {
    let repository = MongoUserRepository::new(state.db.clone());
    let hasher = Argon2Hasher::new(state.config.hasher)?;
    let service = UserService::new(repository, hasher);

    let auth = JwtAuth::new(&state.config.jwt);

    Ok(handlers::router(service).layer(from_fn_with_state(auth, jwt_auth_middleware)))
}

pub async fn init_indexes(db: &Database) -> eyre::Result<()> {
    MongoUserRepository::new(db.clone()).ensure_indexes().await?;
    Ok(())
}
