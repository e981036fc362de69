use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use sea_orm::Order;
use std::sync::Arc;

use super::error::FieldError;
use super::{ApiError, AppState, PageDto, PageQuery, UserDto, UserInsertRequest, UserUpdateRequest};
use crate::db::UserData;
use crate::db::repositories::user::hash_password_blocking;
use crate::entities::users;

fn sort_params(query: &PageQuery) -> Result<(users::Column, Order), ApiError> {
    let Some(sort) = query.sort.as_deref() else {
        return Ok((users::Column::Id, Order::Asc));
    };

    let (field, direction) = sort.split_once(',').unwrap_or((sort, "asc"));

    let column = match field {
        "id" => users::Column::Id,
        "firstName" => users::Column::FirstName,
        "lastName" => users::Column::LastName,
        "email" => users::Column::Email,
        other => {
            return Err(ApiError::validation(format!(
                "Unknown sort field: {other}"
            )));
        }
    };

    let order = match direction {
        "asc" => Order::Asc,
        "desc" => Order::Desc,
        other => {
            return Err(ApiError::validation(format!(
                "Unknown sort direction: {other}"
            )));
        }
    };

    Ok((column, order))
}

fn validate_identity(first_name: &str, email: &str) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if first_name.trim().is_empty() {
        errors.push(FieldError {
            field_name: "firstName".to_string(),
            message: "Required field".to_string(),
        });
    }
    if !email.contains('@') {
        errors.push(FieldError {
            field_name: "email".to_string(),
            message: "Invalid email".to_string(),
        });
    }

    errors
}

/// GET /users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageDto<UserDto>>, ApiError> {
    let sort = sort_params(&query)?;
    let size = query.size();

    let (users, total) = state.store.list_users(query.page, size, sort).await?;
    let content = users.into_iter().map(UserDto::from).collect();

    Ok(Json(PageDto::new(content, total, query.page, size)))
}

/// GET /users/{id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<UserDto>, ApiError> {
    let user = state
        .store
        .get_user(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", id))?;

    Ok(Json(user.into()))
}

/// POST /users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UserInsertRequest>,
) -> Result<(StatusCode, Json<UserDto>), ApiError> {
    let mut errors = validate_identity(&payload.first_name, &payload.email);

    if payload.password.is_empty() {
        errors.push(FieldError {
            field_name: "password".to_string(),
            message: "Required field".to_string(),
        });
    }

    // Friendly duplicate check; the unique index stays authoritative.
    if state
        .store
        .find_user_id_by_email(&payload.email)
        .await?
        .is_some()
    {
        errors.push(FieldError {
            field_name: "email".to_string(),
            message: "Email already in use".to_string(),
        });
    }

    if !errors.is_empty() {
        return Err(ApiError::field_errors(errors));
    }

    let password_hash = hash_password_blocking(&payload.password).await?;
    let role_ids: Vec<i64> = payload.roles.iter().map(|r| r.id).collect();

    let user = state
        .store
        .insert_user(
            UserData {
                first_name: payload.first_name,
                last_name: payload.last_name,
                email: payload.email,
            },
            password_hash,
            &role_ids,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// PUT /users/{id}
/// The password is not updatable through this endpoint.
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<UserUpdateRequest>,
) -> Result<Json<UserDto>, ApiError> {
    let mut errors = validate_identity(&payload.first_name, &payload.email);

    // Another user already holding the email is a duplicate; the same
    // user keeping its own email is not.
    if let Some(owner_id) = state.store.find_user_id_by_email(&payload.email).await?
        && owner_id != id
    {
        errors.push(FieldError {
            field_name: "email".to_string(),
            message: "Email already in use".to_string(),
        });
    }

    if !errors.is_empty() {
        return Err(ApiError::field_errors(errors));
    }

    let role_ids: Vec<i64> = payload.roles.iter().map(|r| r.id).collect();

    let user = state
        .store
        .update_user(
            id,
            UserData {
                first_name: payload.first_name,
                last_name: payload.last_name,
                email: payload.email,
            },
            &role_ids,
        )
        .await?
        .ok_or_else(|| ApiError::not_found("User", id))?;

    Ok(Json(user.into()))
}

/// DELETE /users/{id}
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = state.store.delete_user(id).await?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("User", id))
    }
}
