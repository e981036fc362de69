use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use sea_orm::Order;
use std::sync::Arc;

use super::{ApiError, AppState, CategoryDto, CategoryRequest, PageDto, PageQuery};
use crate::entities::categories;

fn sort_params(query: &PageQuery) -> Result<(categories::Column, Order), ApiError> {
    let Some(sort) = query.sort.as_deref() else {
        return Ok((categories::Column::Id, Order::Asc));
    };

    let (field, direction) = sort.split_once(',').unwrap_or((sort, "asc"));

    let column = match field {
        "id" => categories::Column::Id,
        "name" => categories::Column::Name,
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

fn validate(payload: &CategoryRequest) -> Result<(), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::field_errors(vec![super::error::FieldError {
            field_name: "name".to_string(),
            message: "Required field".to_string(),
        }]));
    }
    Ok(())
}

/// GET /categories
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageDto<CategoryDto>>, ApiError> {
    let sort = sort_params(&query)?;
    let size = query.size();

    let (categories, total) = state.store.list_categories(query.page, size, sort).await?;
    let content = categories.into_iter().map(CategoryDto::from).collect();

    Ok(Json(PageDto::new(content, total, query.page, size)))
}

/// GET /categories/{id}
pub async fn get_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<CategoryDto>, ApiError> {
    let category = state
        .store
        .get_category(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Category", id))?;

    Ok(Json(category.into()))
}

/// POST /categories
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<CategoryDto>), ApiError> {
    validate(&payload)?;

    let category = state.store.insert_category(payload.name).await?;

    Ok((StatusCode::CREATED, Json(category.into())))
}

/// PUT /categories/{id}
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<CategoryRequest>,
) -> Result<Json<CategoryDto>, ApiError> {
    validate(&payload)?;

    let category = state
        .store
        .update_category(id, payload.name)
        .await?
        .ok_or_else(|| ApiError::not_found("Category", id))?;

    Ok(Json(category.into()))
}

/// DELETE /categories/{id}
/// Fails with a conflict while products still reference the category.
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = state.store.delete_category(id).await?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Category", id))
    }
}
