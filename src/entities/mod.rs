pub mod prelude;

pub mod categories;
pub mod product_categories;
pub mod products;
pub mod roles;
pub mod user_roles;
pub mod users;
