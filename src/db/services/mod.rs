//! The `services` module provides a high-level API for interacting with the database.
//! It encapsulates the query logic so the HTTP handlers work with domain models
//! without needing to know about the underlying schema.
//!
//! Every function takes the acting user's id explicitly where ownership or
//! per-user state matters.

pub mod catalog_service;
pub mod collection_service;
pub mod recipe_service;
pub mod shopping_list_service;
pub mod subscription_service;
pub mod user_service;

pub use catalog_service::*;
pub use collection_service::*;
pub use recipe_service::*;
pub use shopping_list_service::*;
pub use subscription_service::*;
pub use user_service::*;

use sea_orm::{DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, Select};

use crate::web::models::PageRequest;

/// Fetches one page of `select` together with the total row count.
pub async fn fetch_page<E>(
    db: &DatabaseConnection,
    select: Select<E>,
    page: PageRequest,
) -> Result<(Vec<E::Model>, u64), DbErr>
where
    E: EntityTrait,
    E::Model: Sync,
{
    let paginator = select.paginate(db, page.limit);
    let count = paginator.num_items().await?;
    let items = paginator.fetch_page(page.page - 1).await?;
    Ok((items, count))
}
