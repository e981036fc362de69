use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;
use sea_orm_migration::sea_query::Query;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Password for the seeded accounts. Meant for development and the test
/// suite; rotate the accounts before exposing a real deployment.
const SEED_PASSWORD: &str = "123456";

const LOREM: &str =
    "Lorem ipsum dolor sit amet, consectetur adipiscing elit. Proin ac tellus et quam faucibus semper.";

const SEED_DATE: &str = "2020-07-13T20:50:07.123450Z";

/// (name, price, category id) for every seeded product, in insertion
/// order so the first row gets id 1.
const SEED_PRODUCTS: &[(&str, f64, i64)] = &[
    ("The Lord of the Rings", 90.5, 1),
    ("Smart TV", 2190.0, 2),
    ("Macbook Pro", 1250.0, 3),
    ("PC Gamer", 1200.0, 3),
    ("Rails for Dummies", 100.99, 1),
    ("PC Gamer Ex", 1350.0, 3),
    ("PC Gamer X", 1350.0, 3),
    ("PC Gamer Alfa", 1850.0, 3),
    ("PC Gamer Tera", 1950.0, 3),
    ("PC Gamer Y", 1700.0, 3),
    ("PC Gamer Nitro", 1450.0, 3),
    ("PC Gamer Card", 1850.0, 3),
    ("PC Gamer Plus", 1350.0, 3),
    ("PC Gamer Hera", 2250.0, 3),
    ("PC Gamer Weed", 2200.0, 3),
    ("PC Gamer Max", 2340.0, 3),
    ("PC Gamer Turbo", 1280.0, 3),
    ("PC Gamer Hot", 1450.0, 3),
    ("PC Gamer Ed", 2000.0, 3),
    ("PC Gamer Tr", 1650.0, 3),
    ("PC Gamer Tx", 1680.0, 3),
    ("PC Gamer Er", 1850.0, 3),
    ("PC Gamer Min", 2250.0, 3),
    ("PC Gamer Boo", 2350.0, 3),
    ("PC Gamer Foo", 4170.0, 3),
];

fn hash_seed_password() -> String {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(SEED_PASSWORD.as_bytes(), &salt)
        .expect("Failed to hash seed password")
        .to_string()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Roles)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Users)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(UserRoles)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Categories)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Products)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(ProductCategories)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        seed_roles(manager).await?;
        seed_users(manager).await?;
        seed_categories(manager).await?;
        seed_products(manager).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProductCategories).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Products).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserRoles).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Roles).to_owned())
            .await?;

        Ok(())
    }
}

async fn seed_roles(manager: &SchemaManager<'_>) -> Result<(), DbErr> {
    use crate::entities::roles::Column;

    for (id, authority) in [(1i64, "ROLE_OPERATOR"), (2, "ROLE_ADMIN")] {
        let insert = Query::insert()
            .into_table(Roles)
            .columns([Column::Id, Column::Authority])
            .values_panic([id.into(), authority.into()])
            .to_owned();
        manager.exec_stmt(insert).await?;
    }

    Ok(())
}

async fn seed_users(manager: &SchemaManager<'_>) -> Result<(), DbErr> {
    use crate::entities::user_roles::Column as LinkColumn;
    use crate::entities::users::Column;

    let seed_users: [(i64, &str, &str, &str, &[i64]); 2] = [
        (1, "Alex", "Brown", "alex@gmail.com", &[1]),
        (2, "Maria", "Green", "maria@gmail.com", &[1, 2]),
    ];

    for (id, first_name, last_name, email, role_ids) in seed_users {
        let insert = Query::insert()
            .into_table(Users)
            .columns([
                Column::Id,
                Column::FirstName,
                Column::LastName,
                Column::Email,
                Column::PasswordHash,
            ])
            .values_panic([
                id.into(),
                first_name.into(),
                last_name.into(),
                email.into(),
                hash_seed_password().into(),
            ])
            .to_owned();
        manager.exec_stmt(insert).await?;

        for &role_id in role_ids {
            let link = Query::insert()
                .into_table(UserRoles)
                .columns([LinkColumn::UserId, LinkColumn::RoleId])
                .values_panic([id.into(), role_id.into()])
                .to_owned();
            manager.exec_stmt(link).await?;
        }
    }

    Ok(())
}

async fn seed_categories(manager: &SchemaManager<'_>) -> Result<(), DbErr> {
    use crate::entities::categories::Column;

    for (id, name) in [(1i64, "Livros"), (2, "Eletr\u{f4}nicos"), (3, "Computadores")] {
        let insert = Query::insert()
            .into_table(Categories)
            .columns([Column::Id, Column::Name, Column::CreatedAt])
            .values_panic([id.into(), name.into(), SEED_DATE.into()])
            .to_owned();
        manager.exec_stmt(insert).await?;
    }

    Ok(())
}

async fn seed_products(manager: &SchemaManager<'_>) -> Result<(), DbErr> {
    use crate::entities::product_categories::Column as LinkColumn;
    use crate::entities::products::Column;

    for (index, &(name, price, category_id)) in SEED_PRODUCTS.iter().enumerate() {
        let id = index as i64 + 1;
        let img_url = format!(
            "https://raw.githubusercontent.com/devsuperior/dscatalog-resources/master/backend/img/{id}-big.jpg"
        );

        let insert = Query::insert()
            .into_table(Products)
            .columns([
                Column::Id,
                Column::Name,
                Column::Description,
                Column::Price,
                Column::ImgUrl,
                Column::Date,
            ])
            .values_panic([
                id.into(),
                name.into(),
                LOREM.into(),
                price.into(),
                img_url.into(),
                SEED_DATE.into(),
            ])
            .to_owned();
        manager.exec_stmt(insert).await?;

        let link = Query::insert()
            .into_table(ProductCategories)
            .columns([LinkColumn::ProductId, LinkColumn::CategoryId])
            .values_panic([id.into(), category_id.into()])
            .to_owned();
        manager.exec_stmt(link).await?;
    }

    Ok(())
}
