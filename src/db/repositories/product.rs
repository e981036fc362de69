use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, LoaderTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::entities::{categories, prelude::*, product_categories, products};

/// Product row together with its linked categories.
#[derive(Debug, Clone)]
pub struct Product {
    pub model: products::Model,
    pub categories: Vec<categories::Model>,
}

/// Scalar fields accepted on create/update; category links travel
/// separately as ids.
#[derive(Debug, Clone)]
pub struct ProductData {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub img_url: String,
    pub date: String,
}

pub struct ProductRepository {
    conn: DatabaseConnection,
}

impl ProductRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list_paged(
        &self,
        page: u64,
        size: u64,
        sort: (products::Column, Order),
    ) -> Result<(Vec<Product>, u64)> {
        let (column, order) = sort;
        let paginator = Products::find()
            .order_by(column, order)
            .paginate(&self.conn, size);

        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page).await?;

        let categories = models
            .load_many_to_many(Categories, ProductCategories, &self.conn)
            .await?;

        let products = models
            .into_iter()
            .zip(categories)
            .map(|(model, categories)| Product { model, categories })
            .collect();

        Ok((products, total))
    }

    pub async fn get(&self, id: i64) -> Result<Option<Product>> {
        let model = Products::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query product by id")?;

        let Some(model) = model else {
            return Ok(None);
        };

        let categories = vec![model.clone()]
            .load_many_to_many(Categories, ProductCategories, &self.conn)
            .await?
            .pop()
            .unwrap_or_default();

        Ok(Some(Product { model, categories }))
    }

    pub async fn insert(&self, data: ProductData, category_ids: &[i64]) -> Result<Product> {
        let txn = self.conn.begin().await?;

        let result = Products::insert(products::ActiveModel {
            name: Set(data.name),
            description: Set(data.description),
            price: Set(data.price),
            img_url: Set(data.img_url),
            date: Set(data.date),
            ..Default::default()
        })
        .exec(&txn)
        .await?;

        let product_id = result.last_insert_id;
        link_categories(&txn, product_id, category_ids).await?;

        txn.commit().await?;

        self.get(product_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created product"))
    }

    /// Replaces scalar fields and category links in one transaction.
    /// Returns `None` when the id does not exist.
    pub async fn update(
        &self,
        id: i64,
        data: ProductData,
        category_ids: &[i64],
    ) -> Result<Option<Product>> {
        let txn = self.conn.begin().await?;

        let Some(model) = Products::find_by_id(id).one(&txn).await? else {
            return Ok(None);
        };

        let mut active: products::ActiveModel = model.into();
        active.name = Set(data.name);
        active.description = Set(data.description);
        active.price = Set(data.price);
        active.img_url = Set(data.img_url);
        active.date = Set(data.date);
        active.update(&txn).await?;

        ProductCategories::delete_many()
            .filter(product_categories::Column::ProductId.eq(id))
            .exec(&txn)
            .await?;
        link_categories(&txn, id, category_ids).await?;

        txn.commit().await?;

        self.get(id).await
    }

    /// The product owns its category links, so they go with it; anything
    /// else referencing the product keeps the delete from committing.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let txn = self.conn.begin().await?;

        ProductCategories::delete_many()
            .filter(product_categories::Column::ProductId.eq(id))
            .exec(&txn)
            .await?;

        let result = Products::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        Ok(result.rows_affected > 0)
    }
}

async fn link_categories(
    txn: &sea_orm::DatabaseTransaction,
    product_id: i64,
    category_ids: &[i64],
) -> Result<()> {
    // Repeated ids in the payload would trip the composite PK.
    let mut category_ids = category_ids.to_vec();
    category_ids.sort_unstable();
    category_ids.dedup();

    if category_ids.is_empty() {
        return Ok(());
    }

    let links: Vec<product_categories::ActiveModel> = category_ids
        .iter()
        .map(|&category_id| product_categories::ActiveModel {
            product_id: Set(product_id),
            category_id: Set(category_id),
        })
        .collect();

    ProductCategories::insert_many(links).exec(txn).await?;
    Ok(())
}
