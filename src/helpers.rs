use axum::Json;
use axum::http::StatusCode;
use serde_json::{Value, json};

pub type ApiError = (StatusCode, Json<Value>);
pub type ApiResult<T> = Result<T, ApiError>;

fn detail(status: StatusCode, msg: impl Into<String>) -> ApiError {
    (status, Json(json!({ "detail": msg.into() })))
}

pub fn to_500<E: std::fmt::Display>(e: E) -> ApiError {
    detail(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

pub fn unique_or_500(e: sqlx::Error) -> ApiError {
    if let sqlx::Error::Database(db) = &e {
        if db.code().as_deref() == Some("23505") {
            return detail(StatusCode::CONFLICT, "User already exists.");
        }
    }
    to_500(e)
}

/// Filet pour les écritures qui contournent le pré-contrôle d'id
/// (course entre deux POST, PUT qui renumérote vers un id pris).
pub fn id_conflict_or_500(e: sqlx::Error) -> ApiError {
    if let sqlx::Error::Database(db) = &e {
        if db.code().as_deref() == Some("23505") {
            return conflict("Pokemon with this id already exists.");
        }
    }
    to_500(e)
}

pub fn ok(msg: impl Into<String>) -> ApiResult<(StatusCode, Json<Value>)> {
    Ok((StatusCode::OK, Json(json!({ "detail": msg.into() }))))
}

pub fn created(msg: impl Into<String>) -> ApiResult<(StatusCode, Json<Value>)> {
    Ok((StatusCode::CREATED, Json(json!({ "detail": msg.into() }))))
}

pub fn bad_request(msg: impl Into<String>) -> ApiError {
    detail(StatusCode::BAD_REQUEST, msg)
}

pub fn unprocessable(msg: impl Into<String>) -> ApiError {
    detail(StatusCode::UNPROCESSABLE_ENTITY, msg)
}

pub fn conflict(msg: impl Into<String>) -> ApiError {
    detail(StatusCode::NOT_ACCEPTABLE, msg)
}

pub fn not_found(msg: impl Into<String>) -> ApiError {
    detail(StatusCode::NOT_FOUND, msg)
}

pub fn unauthorized(msg: impl Into<String>) -> ApiError {
    detail(StatusCode::UNAUTHORIZED, msg)
}

pub fn forbidden(msg: impl Into<String>) -> ApiError {
    detail(StatusCode::FORBIDDEN, msg)
}

pub fn upstream(status: StatusCode, msg: impl Into<String>) -> ApiError {
    detail(status, msg)
}
