use crate::handlers::auth::{create_user, login_for_access_token};
use axum::Router;
use axum::routing::post;
use sqlx::PgPool;

pub fn auth_routes() -> Router<PgPool> {
    Router::new()
        .route("/auth/user", post(create_user))
        .route("/auth/token", post(login_for_access_token))
}
