use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait, QueryOrder, Set,
};

use crate::entities::{categories, prelude::*};

pub struct CategoryRepository {
    conn: DatabaseConnection,
}

impl CategoryRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list_paged(
        &self,
        page: u64,
        size: u64,
        sort: (categories::Column, Order),
    ) -> Result<(Vec<categories::Model>, u64)> {
        let (column, order) = sort;
        let paginator = Categories::find()
            .order_by(column, order)
            .paginate(&self.conn, size);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page).await?;

        Ok((items, total))
    }

    pub async fn get(&self, id: i64) -> Result<Option<categories::Model>> {
        Categories::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query category by id")
    }

    pub async fn insert(&self, name: String) -> Result<categories::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let model = categories::ActiveModel {
            name: Set(name),
            created_at: Set(now),
            updated_at: Set(None),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;

        Ok(model)
    }

    pub async fn update(&self, id: i64, name: String) -> Result<Option<categories::Model>> {
        let Some(model) = Categories::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: categories::ActiveModel = model.into();
        active.name = Set(name);
        active.updated_at = Set(Some(chrono::Utc::now().to_rfc3339()));

        Ok(Some(active.update(&self.conn).await?))
    }

    /// No join-row cleanup here: a category referenced by products must
    /// fail with a foreign-key violation, which the API reports as a
    /// conflict.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = Categories::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }
}
