use anyhow::{Context, Result};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, LoaderTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tokio::task;

use crate::entities::{prelude::*, roles, user_roles, users};

/// User data returned from the repository (without the password hash).
/// Roles are always loaded alongside the user.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub roles: Vec<roles::Model>,
}

impl User {
    fn from_model(model: users::Model, roles: Vec<roles::Model>) -> Self {
        Self {
            id: model.id,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            roles,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UserData {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        self.with_roles(user).await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by id")?;

        self.with_roles(user).await
    }

    /// Id of the user owning `email`, if any. Used for the pre-insert
    /// duplicate-email check; the unique index remains the backstop.
    pub async fn find_id_by_email(&self, email: &str) -> Result<Option<i64>> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(|u| u.id))
    }

    pub async fn list_paged(
        &self,
        page: u64,
        size: u64,
        sort: (users::Column, Order),
    ) -> Result<(Vec<User>, u64)> {
        let (column, order) = sort;
        let paginator = Users::find()
            .order_by(column, order)
            .paginate(&self.conn, size);

        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page).await?;

        let roles = models.load_many_to_many(Roles, UserRoles, &self.conn).await?;
        let users = models
            .into_iter()
            .zip(roles)
            .map(|(m, r)| User::from_model(m, r))
            .collect();

        Ok((users, total))
    }

    pub async fn insert(&self, data: UserData, password_hash: String, role_ids: &[i64]) -> Result<User> {
        let txn = self.conn.begin().await?;

        let result = Users::insert(users::ActiveModel {
            first_name: Set(data.first_name),
            last_name: Set(data.last_name),
            email: Set(data.email),
            password_hash: Set(password_hash),
            ..Default::default()
        })
        .exec(&txn)
        .await?;

        let user_id = result.last_insert_id;
        link_roles(&txn, user_id, role_ids).await?;

        txn.commit().await?;

        self.get_by_id(user_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created user"))
    }

    /// Updates identity fields and role assignments. The password is never
    /// touched on update.
    pub async fn update(&self, id: i64, data: UserData, role_ids: &[i64]) -> Result<Option<User>> {
        let txn = self.conn.begin().await?;

        let Some(user) = Users::find_by_id(id).one(&txn).await? else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();
        active.first_name = Set(data.first_name);
        active.last_name = Set(data.last_name);
        active.email = Set(data.email);
        active.update(&txn).await?;

        UserRoles::delete_many()
            .filter(user_roles::Column::UserId.eq(id))
            .exec(&txn)
            .await?;
        link_roles(&txn, id, role_ids).await?;

        txn.commit().await?;

        self.get_by_id(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<bool> {
        let txn = self.conn.begin().await?;

        UserRoles::delete_many()
            .filter(user_roles::Column::UserId.eq(id))
            .exec(&txn)
            .await?;

        let result = Users::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        Ok(result.rows_affected > 0)
    }

    /// Verify a password for the given email.
    /// Argon2 verification is CPU-bound, so it runs on a blocking task.
    pub async fn verify_password(&self, email: &str, password: &str) -> Result<bool> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(false);
        };

        let password_hash = user.password_hash;
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            Ok::<bool, anyhow::Error>(
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid)
    }

    async fn with_roles(&self, user: Option<users::Model>) -> Result<Option<User>> {
        let Some(user) = user else {
            return Ok(None);
        };

        let roles = vec![user.clone()]
            .load_many_to_many(Roles, UserRoles, &self.conn)
            .await?
            .pop()
            .unwrap_or_default();

        Ok(Some(User::from_model(user, roles)))
    }
}

async fn link_roles(
    txn: &sea_orm::DatabaseTransaction,
    user_id: i64,
    role_ids: &[i64],
) -> Result<()> {
    // Repeated ids in the payload would trip the composite PK.
    let mut role_ids = role_ids.to_vec();
    role_ids.sort_unstable();
    role_ids.dedup();

    if role_ids.is_empty() {
        return Ok(());
    }

    let links: Vec<user_roles::ActiveModel> = role_ids
        .iter()
        .map(|&role_id| user_roles::ActiveModel {
            user_id: Set(user_id),
            role_id: Set(role_id),
        })
        .collect();

    UserRoles::insert_many(links).exec(txn).await?;
    Ok(())
}

/// Hash a password using Argon2id with default parameters.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Async wrapper around [`hash_password`] for use on the request path.
pub async fn hash_password_blocking(password: &str) -> Result<String> {
    let password = password.to_string();
    task::spawn_blocking(move || hash_password(&password))
        .await
        .context("Password hashing task panicked")?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password("123456").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();

        assert!(
            Argon2::default()
                .verify_password(b"123456", &parsed)
                .is_ok()
        );
        assert!(
            Argon2::default()
                .verify_password(b"wrong-password", &parsed)
                .is_err()
        );
    }
}
