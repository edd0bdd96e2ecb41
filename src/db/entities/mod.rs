//! SeaORM Entity Crate
//!
//! Defines the SeaORM entities that map to database tables.

pub mod favorite_recipe;
pub mod ingredient;
pub mod recipe;
pub mod recipe_ingredient;
pub mod recipe_tag;
pub mod shopping_cart;
pub mod subscription;
pub mod tag;
pub mod user;

// Prelude module for easy importing of all entities
pub mod prelude {
    pub use super::favorite_recipe::Entity as FavoriteRecipe;
    pub use super::ingredient::Entity as Ingredient;
    pub use super::recipe::Entity as Recipe;
    pub use super::recipe_ingredient::Entity as RecipeIngredient;
    pub use super::recipe_tag::Entity as RecipeTag;
    pub use super::shopping_cart::Entity as ShoppingCart;
    pub use super::subscription::Entity as Subscription;
    pub use super::tag::Entity as Tag;
    pub use super::user::Entity as User;
}
