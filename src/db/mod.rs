use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Order, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::entities::{categories, products, users};

pub mod migrator;
pub mod repositories;

pub use repositories::product::{Product, ProductData};
pub use repositories::user::{User, UserData};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn product_repo(&self) -> repositories::product::ProductRepository {
        repositories::product::ProductRepository::new(self.conn.clone())
    }

    fn category_repo(&self) -> repositories::category::CategoryRepository {
        repositories::category::CategoryRepository::new(self.conn.clone())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    // ========== Products ==========

    pub async fn list_products(
        &self,
        page: u64,
        size: u64,
        sort: (products::Column, Order),
    ) -> Result<(Vec<Product>, u64)> {
        self.product_repo().list_paged(page, size, sort).await
    }

    pub async fn get_product(&self, id: i64) -> Result<Option<Product>> {
        self.product_repo().get(id).await
    }

    pub async fn insert_product(&self, data: ProductData, category_ids: &[i64]) -> Result<Product> {
        self.product_repo().insert(data, category_ids).await
    }

    pub async fn update_product(
        &self,
        id: i64,
        data: ProductData,
        category_ids: &[i64],
    ) -> Result<Option<Product>> {
        self.product_repo().update(id, data, category_ids).await
    }

    pub async fn delete_product(&self, id: i64) -> Result<bool> {
        self.product_repo().delete(id).await
    }

    // ========== Categories ==========

    pub async fn list_categories(
        &self,
        page: u64,
        size: u64,
        sort: (categories::Column, Order),
    ) -> Result<(Vec<categories::Model>, u64)> {
        self.category_repo().list_paged(page, size, sort).await
    }

    pub async fn get_category(&self, id: i64) -> Result<Option<categories::Model>> {
        self.category_repo().get(id).await
    }

    pub async fn insert_category(&self, name: String) -> Result<categories::Model> {
        self.category_repo().insert(name).await
    }

    pub async fn update_category(&self, id: i64, name: String) -> Result<Option<categories::Model>> {
        self.category_repo().update(id, name).await
    }

    pub async fn delete_category(&self, id: i64) -> Result<bool> {
        self.category_repo().delete(id).await
    }

    // ========== Users ==========

    pub async fn list_users(
        &self,
        page: u64,
        size: u64,
        sort: (users::Column, Order),
    ) -> Result<(Vec<User>, u64)> {
        self.user_repo().list_paged(page, size, sort).await
    }

    pub async fn get_user(&self, id: i64) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn find_user_id_by_email(&self, email: &str) -> Result<Option<i64>> {
        self.user_repo().find_id_by_email(email).await
    }

    pub async fn insert_user(
        &self,
        data: UserData,
        password_hash: String,
        role_ids: &[i64],
    ) -> Result<User> {
        self.user_repo().insert(data, password_hash, role_ids).await
    }

    pub async fn update_user(
        &self,
        id: i64,
        data: UserData,
        role_ids: &[i64],
    ) -> Result<Option<User>> {
        self.user_repo().update(id, data, role_ids).await
    }

    pub async fn delete_user(&self, id: i64) -> Result<bool> {
        self.user_repo().delete(id).await
    }

    pub async fn verify_user_password(&self, email: &str, password: &str) -> Result<bool> {
        self.user_repo().verify_password(email, password).await
    }
}
