//! Catalog Domain
//!
//! Products with variants, the categories they belong to, and inventory
//! reports over both, stored in MongoDB or in memory.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints, query/body validation, envelopes
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │  Services   │  ← Reference integrity, rollback on concurrent change
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Data access (traits + MongoDB and in-memory implementations)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entities, payloads, queries, reports
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use domain_catalog::{
//!     CategoryService, MongoCategoryRepository, MongoProductRepository, ProductService,
//!     handlers,
//! };
//! use mongodb::Client;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::with_uri_str("mongodb://localhost:27017").await?;
//! let db = client.database("product_catalog");
//!
//! let products = Arc::new(MongoProductRepository::new(&db));
//! let categories = Arc::new(MongoCategoryRepository::new(&db));
//!
//! let router = handlers::router(
//!     ProductService::new(products.clone(), categories.clone()),
//!     CategoryService::new(categories, products),
//! );
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod mongodb;
pub mod query;
pub mod reports;
pub mod repository;
pub mod service;

pub use error::{CatalogError, CatalogResult};
pub use handlers::ApiDoc;
pub use memory::{InMemoryCatalog, InMemoryCategoryRepository, InMemoryProductRepository};
pub use models::{
    Category, CategoryInput, ListedProduct, Product, ProductInput, Variant, VariantInput,
};
pub use mongodb::{MongoCategoryRepository, MongoProductRepository};
pub use query::{
    Bounds, CategoryFilter, CategoryQuery, PageRequest, Paged, ProductFilter, ProductQuery, Sort,
    SortOrder,
};
pub use reports::{CategoryBreakdown, InventorySummary};
pub use repository::{CategoryRepository, ProductRepository};
pub use service::{CategoryService, ProductService};
