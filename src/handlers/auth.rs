use axum::{Json, extract::State, http::StatusCode};
use serde_json::Value;
use sqlx::PgPool;

use crate::auth::{authenticate_user, generate_access_token, hash_password};
use crate::helpers::{ApiResult, created, to_500, unauthorized, unique_or_500};
use crate::models::user::{CreateUser, LoginUser, TokenResponse};

pub async fn create_user(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateUser>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let hashed = hash_password(&payload.password).map_err(|_| to_500("Hash failed"))?;
    let role = payload.role.unwrap_or_default();

    sqlx::query_scalar::<_, i32>(
        r#"
        INSERT INTO users (username, hashed_password, role)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(&payload.username)
    .bind(&hashed)
    .bind(role)
    .fetch_one(&pool)
    .await
    .map_err(unique_or_500)?;

    created("User created.")
}

pub async fn login_for_access_token(
    State(pool): State<PgPool>,
    Json(payload): Json<LoginUser>,
) -> ApiResult<Json<TokenResponse>> {
    let user = authenticate_user(&pool, &payload.username, &payload.password)
        .await
        .map_err(to_500)?;

    // Utilisateur inconnu et mot de passe faux donnent la même réponse.
    let Some(user) = user else {
        return Err(unauthorized("Could not validate user"));
    };

    let token = generate_access_token(&user.username, user.id, user.role).map_err(to_500)?;

    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer".into(),
        role: user.role,
    }))
}
