pub mod auth_routes;
pub mod catalog_routes;
pub mod recipe_routes;
pub mod user_routes;
