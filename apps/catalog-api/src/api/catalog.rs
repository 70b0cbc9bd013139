//! Product, category and report routes

use std::sync::Arc;

use axum::Router;
use domain_catalog::{
    handlers, CategoryRepository, CategoryService, MongoCategoryRepository,
    MongoProductRepository, ProductRepository, ProductService,
};
use tracing::info;

use crate::state::{AppState, Storage};

fn build<P, C>(products: P, categories: C) -> Router
where
    P: ProductRepository + 'static,
    C: CategoryRepository + 'static,
{
    let products = Arc::new(products);
    let categories = Arc::new(categories);
    handlers::router(
        ProductService::new(products.clone(), categories.clone()),
        CategoryService::new(categories, products),
    )
}

/// Create the catalog router over the configured storage
pub fn router(state: &AppState) -> Router {
    match &state.storage {
        Storage::MongoDb { db, .. } => build(
            MongoProductRepository::new(db),
            MongoCategoryRepository::new(db),
        ),
        Storage::Memory(catalog) => build(catalog.products(), catalog.categories()),
    }
}

/// Initialize product and category indexes
pub async fn init_indexes(state: &AppState) -> eyre::Result<()> {
    let Storage::MongoDb { db, .. } = &state.storage else {
        return Ok(());
    };

    MongoProductRepository::new(db).init_indexes().await?;
    MongoCategoryRepository::new(db).init_indexes().await?;
    info!("Catalog indexes initialized");
    Ok(())
}
