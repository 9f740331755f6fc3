//! Categories group expenses. They are shared by all users and seeded when the database is created.

mod domain;
mod list;
mod store;

pub use domain::{Category, CategoryId, CategoryName};
pub use list::get_categories_endpoint;
pub use store::{CategoryStore, DEFAULT_CATEGORIES, SQLiteCategoryStore, seed_categories};
