use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use crate::error::CatalogResult;
use crate::models::{Category, Product};
use crate::query::{CategoryQuery, Paged, ProductQuery};
use crate::reports::{CategoryBreakdown, InventorySummary};

/// Repository trait for Category persistence
///
/// Entities are built by the service; repositories store them as given.
/// Unique-name violations surface as [`CatalogError::Duplicate`](crate::CatalogError::Duplicate).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Store a new category, keeping its id
    async fn insert(&self, category: Category) -> CatalogResult<Category>;

    async fn find_by_id(&self, id: ObjectId) -> CatalogResult<Option<Category>>;

    async fn exists(&self, id: ObjectId) -> CatalogResult<bool>;

    /// Active categories matching the query, one page at a time
    async fn list(&self, query: CategoryQuery) -> CatalogResult<Paged<Category>>;

    /// Overwrite a stored category; `None` if it no longer exists
    async fn replace(&self, category: Category) -> CatalogResult<Option<Category>>;

    /// Remove a category, returning what was removed
    async fn delete(&self, id: ObjectId) -> CatalogResult<Option<Category>>;
}

/// Repository trait for Product persistence
///
/// SKUs are unique across all products; violations surface as
/// [`CatalogError::Duplicate`](crate::CatalogError::Duplicate).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Store a new product, keeping its id
    async fn insert(&self, product: Product) -> CatalogResult<Product>;

    async fn find_by_id(&self, id: ObjectId) -> CatalogResult<Option<Product>>;

    /// Active products matching the query, one page at a time
    async fn list(&self, query: ProductQuery) -> CatalogResult<Paged<Product>>;

    /// Overwrite a stored product; `None` if it no longer exists
    async fn replace(&self, product: Product) -> CatalogResult<Option<Product>>;

    /// Remove a product, returning what was removed
    async fn delete(&self, id: ObjectId) -> CatalogResult<Option<Product>>;

    /// Products of any status that reference `category`
    async fn count_by_category(&self, category: ObjectId) -> CatalogResult<u64>;

    /// Active products with a variant at or below `threshold`
    async fn low_stock(&self, threshold: i64) -> CatalogResult<Vec<Product>>;

    async fn inventory_summary(&self) -> CatalogResult<InventorySummary>;

    async fn category_breakdown(&self) -> CatalogResult<Vec<CategoryBreakdown>>;
}
