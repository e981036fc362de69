use serde::{Deserialize, Serialize};

use crate::db::{Product, User};
use crate::entities::{categories, roles};

/// Standard pagination query parameters. `sort` takes `field` or
/// `field,asc` / `field,desc`.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub size: u64,
    pub sort: Option<String>,
}

const fn default_page_size() -> u64 {
    12
}

impl PageQuery {
    /// Page size with the zero guard applied.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size.max(1)
    }
}

#[derive(Debug, Serialize)]
pub struct PageDto<T> {
    pub content: Vec<T>,
    #[serde(rename = "totalElements")]
    pub total_elements: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u64,
    pub number: u64,
    pub size: u64,
}

impl<T> PageDto<T> {
    pub fn new(content: Vec<T>, total_elements: u64, number: u64, size: u64) -> Self {
        Self {
            content,
            total_elements,
            total_pages: total_elements.div_ceil(size),
            number,
            size,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryDto {
    pub id: i64,
    pub name: String,
}

impl From<categories::Model> for CategoryDto {
    fn from(model: categories::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductDto {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: f64,
    #[serde(rename = "imgUrl")]
    pub img_url: String,
    pub date: String,
    pub categories: Vec<CategoryDto>,
}

impl From<Product> for ProductDto {
    fn from(product: Product) -> Self {
        Self {
            id: product.model.id,
            name: product.model.name,
            description: product.model.description,
            price: product.model.price,
            img_url: product.model.img_url,
            date: product.model.date,
            categories: product.categories.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RoleDto {
    pub id: i64,
    pub authority: String,
}

impl From<roles::Model> for RoleDto {
    fn from(model: roles::Model) -> Self {
        Self {
            id: model.id,
            authority: model.authority,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: i64,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    pub email: String,
    pub roles: Vec<RoleDto>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            roles: user.roles.into_iter().map(Into::into).collect(),
        }
    }
}

/// Bare id reference used when a payload links to existing rows.
#[derive(Debug, Deserialize)]
pub struct IdRef {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(rename = "imgUrl", default)]
    pub img_url: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub categories: Vec<IdRef>,
}

#[derive(Debug, Deserialize)]
pub struct UserInsertRequest {
    #[serde(rename = "firstName", default)]
    pub first_name: String,
    #[serde(rename = "lastName", default)]
    pub last_name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub roles: Vec<IdRef>,
}

#[derive(Debug, Deserialize)]
pub struct UserUpdateRequest {
    #[serde(rename = "firstName", default)]
    pub first_name: String,
    #[serde(rename = "lastName", default)]
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub roles: Vec<IdRef>,
}

/// OAuth2-style token response, carrying the extra claims clients read
/// without decoding the JWT.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub scope: &'static str,
    #[serde(rename = "userFirstName")]
    pub user_first_name: String,
    #[serde(rename = "userId")]
    pub user_id: i64,
}
