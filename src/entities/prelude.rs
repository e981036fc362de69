pub use super::categories::Entity as Categories;
pub use super::product_categories::Entity as ProductCategories;
pub use super::products::Entity as Products;
pub use super::roles::Entity as Roles;
pub use super::user_roles::Entity as UserRoles;
pub use super::users::Entity as Users;
