use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use sea_orm::Order;
use std::sync::Arc;

use super::{ApiError, AppState, PageDto, PageQuery, ProductDto, ProductRequest};
use crate::db::ProductData;
use crate::entities::products;

fn sort_params(query: &PageQuery) -> Result<(products::Column, Order), ApiError> {
    let Some(sort) = query.sort.as_deref() else {
        return Ok((products::Column::Id, Order::Asc));
    };

    let (field, direction) = sort.split_once(',').unwrap_or((sort, "asc"));

    let column = match field {
        "id" => products::Column::Id,
        "name" => products::Column::Name,
        "price" => products::Column::Price,
        "date" => products::Column::Date,
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

fn validate(payload: &ProductRequest) -> Result<(), ApiError> {
    let mut errors = Vec::new();

    if payload.name.trim().is_empty() {
        errors.push(super::error::FieldError {
            field_name: "name".to_string(),
            message: "Required field".to_string(),
        });
    }
    if payload.price <= 0.0 {
        errors.push(super::error::FieldError {
            field_name: "price".to_string(),
            message: "Price must be positive".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::field_errors(errors))
    }
}

fn to_data(payload: ProductRequest) -> (ProductData, Vec<i64>) {
    let category_ids = payload.categories.iter().map(|c| c.id).collect();
    let date = if payload.date.is_empty() {
        chrono::Utc::now().to_rfc3339()
    } else {
        payload.date
    };

    (
        ProductData {
            name: payload.name,
            description: payload.description,
            price: payload.price,
            img_url: payload.img_url,
            date,
        },
        category_ids,
    )
}

/// GET /products
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageDto<ProductDto>>, ApiError> {
    let sort = sort_params(&query)?;
    let size = query.size();

    let (products, total) = state.store.list_products(query.page, size, sort).await?;
    let content = products.into_iter().map(ProductDto::from).collect();

    Ok(Json(PageDto::new(content, total, query.page, size)))
}

/// GET /products/{id}
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ProductDto>, ApiError> {
    let product = state
        .store
        .get_product(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))?;

    Ok(Json(product.into()))
}

/// POST /products
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ProductRequest>,
) -> Result<(StatusCode, Json<ProductDto>), ApiError> {
    validate(&payload)?;

    let (data, category_ids) = to_data(payload);
    let product = state.store.insert_product(data, &category_ids).await?;

    Ok((StatusCode::CREATED, Json(product.into())))
}

/// PUT /products/{id}
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<ProductRequest>,
) -> Result<Json<ProductDto>, ApiError> {
    validate(&payload)?;

    let (data, category_ids) = to_data(payload);
    let product = state
        .store
        .update_product(id, data, &category_ids)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))?;

    Ok(Json(product.into()))
}

/// DELETE /products/{id}
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = state.store.delete_product(id).await?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Product", id))
    }
}
