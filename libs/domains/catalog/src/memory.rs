//! In-memory repositories.
//!
//! Used when the service runs without a database (`CATALOG_STORAGE=memory`)
//! and by the handler tests. Both repositories share one store so product
//! reports can see category names, and uniqueness is enforced the way the
//! MongoDB indexes enforce it.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use crate::error::{CatalogError, CatalogResult};
use crate::models::{Category, Product};
use crate::query::{
    CategoryFilter, CategoryQuery, CategorySortField, PageRequest, Paged, ProductFilter,
    ProductQuery, ProductSortField, SortOrder,
};
use crate::reports::{self, CategoryBreakdown, InventorySummary};
use crate::repository::{CategoryRepository, ProductRepository};

#[derive(Debug, Default)]
struct Store {
    categories: HashMap<ObjectId, Category>,
    products: HashMap<ObjectId, Product>,
}

impl Store {
    fn check_category_name(&self, category: &Category) -> CatalogResult<()> {
        let taken = self
            .categories
            .values()
            .any(|c| c.id != category.id && c.name == category.name);
        if taken {
            return Err(CatalogError::Duplicate {
                field: "name".to_string(),
                value: category.name.clone(),
            });
        }
        Ok(())
    }

    fn check_skus(&self, product: &Product) -> CatalogResult<()> {
        let clash = product.variants.iter().find(|variant| {
            self.products
                .values()
                .filter(|p| p.id != product.id)
                .flat_map(|p| &p.variants)
                .any(|other| other.sku == variant.sku)
        });
        match clash {
            Some(variant) => Err(CatalogError::Duplicate {
                field: "variants.sku".to_string(),
                value: variant.sku.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Shared in-memory catalog handing out both repositories
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    store: Arc<RwLock<Store>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn categories(&self) -> InMemoryCategoryRepository {
        InMemoryCategoryRepository {
            store: self.store.clone(),
        }
    }

    pub fn products(&self) -> InMemoryProductRepository {
        InMemoryProductRepository {
            store: self.store.clone(),
        }
    }
}

fn paginate<T>(mut items: Vec<T>, page: PageRequest) -> Paged<T> {
    let total = items.len() as u64;
    let start = (page.skip() as usize).min(items.len());
    let end = start.saturating_add(page.limit as usize).min(items.len());
    Paged {
        items: items.drain(start..end).collect(),
        total,
    }
}

fn directed(ordering: Ordering, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

/// Lowercased alphanumeric words, approximating a text index
fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

/// Any search term equal to any word of name, description or tags
fn text_matches(product: &Product, search: &str) -> bool {
    let terms: Vec<String> = words(search).collect();
    let mut fields = words(&product.name)
        .chain(words(&product.description))
        .chain(product.tags.iter().flat_map(|t| words(t)));
    fields.any(|word| terms.contains(&word))
}

fn product_matches(product: &Product, filter: &ProductFilter) -> bool {
    product.is_active
        && filter.search.as_deref().is_none_or(|s| text_matches(product, s))
        && filter.category.is_none_or(|c| product.category == c)
        && filter.price.contains(&product.base_price)
        && filter.created.contains(&product.created_at)
        && (!filter.in_stock || product.in_stock())
}

fn category_matches(category: &Category, filter: &CategoryFilter) -> bool {
    let search_matches = || {
        let Some(search) = filter.search.as_deref() else {
            return true;
        };
        let needle = search.to_lowercase();
        category.name.to_lowercase().contains(&needle)
            || category
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle))
    };

    category.is_active && filter.created.contains(&category.created_at) && search_matches()
}

fn compare_products(a: &Product, b: &Product, field: ProductSortField) -> Ordering {
    let primary = match field {
        ProductSortField::CreatedAt => a.created_at.cmp(&b.created_at),
        ProductSortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        ProductSortField::Name => a.name.cmp(&b.name),
        ProductSortField::BasePrice => a.base_price.total_cmp(&b.base_price),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

fn compare_categories(a: &Category, b: &Category, field: CategorySortField) -> Ordering {
    let primary = match field {
        CategorySortField::CreatedAt => a.created_at.cmp(&b.created_at),
        CategorySortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        CategorySortField::Name => a.name.cmp(&b.name),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

/// In-memory implementation of the CategoryRepository
#[derive(Debug, Clone)]
pub struct InMemoryCategoryRepository {
    store: Arc<RwLock<Store>>,
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn insert(&self, category: Category) -> CatalogResult<Category> {
        let mut store = self.store.write().await;
        store.check_category_name(&category)?;
        store.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn find_by_id(&self, id: ObjectId) -> CatalogResult<Option<Category>> {
        Ok(self.store.read().await.categories.get(&id).cloned())
    }

    async fn exists(&self, id: ObjectId) -> CatalogResult<bool> {
        Ok(self.store.read().await.categories.contains_key(&id))
    }

    async fn list(&self, query: CategoryQuery) -> CatalogResult<Paged<Category>> {
        let store = self.store.read().await;
        let mut matches: Vec<Category> = store
            .categories
            .values()
            .filter(|c| category_matches(c, &query.filter))
            .cloned()
            .collect();
        matches.sort_by(|a, b| {
            directed(compare_categories(a, b, query.sort.field), query.sort.order)
        });
        Ok(paginate(matches, query.page))
    }

    async fn replace(&self, category: Category) -> CatalogResult<Option<Category>> {
        let mut store = self.store.write().await;
        if !store.categories.contains_key(&category.id) {
            return Ok(None);
        }
        store.check_category_name(&category)?;
        store.categories.insert(category.id, category.clone());
        Ok(Some(category))
    }

    async fn delete(&self, id: ObjectId) -> CatalogResult<Option<Category>> {
        Ok(self.store.write().await.categories.remove(&id))
    }
}

/// In-memory implementation of the ProductRepository
#[derive(Debug, Clone)]
pub struct InMemoryProductRepository {
    store: Arc<RwLock<Store>>,
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn insert(&self, product: Product) -> CatalogResult<Product> {
        let mut store = self.store.write().await;
        store.check_skus(&product)?;
        store.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn find_by_id(&self, id: ObjectId) -> CatalogResult<Option<Product>> {
        Ok(self.store.read().await.products.get(&id).cloned())
    }

    async fn list(&self, query: ProductQuery) -> CatalogResult<Paged<Product>> {
        let store = self.store.read().await;
        let mut matches: Vec<Product> = store
            .products
            .values()
            .filter(|p| product_matches(p, &query.filter))
            .cloned()
            .collect();
        matches.sort_by(|a, b| directed(compare_products(a, b, query.sort.field), query.sort.order));
        Ok(paginate(matches, query.page))
    }

    async fn replace(&self, product: Product) -> CatalogResult<Option<Product>> {
        let mut store = self.store.write().await;
        if !store.products.contains_key(&product.id) {
            return Ok(None);
        }
        store.check_skus(&product)?;
        store.products.insert(product.id, product.clone());
        Ok(Some(product))
    }

    async fn delete(&self, id: ObjectId) -> CatalogResult<Option<Product>> {
        Ok(self.store.write().await.products.remove(&id))
    }

    async fn count_by_category(&self, category: ObjectId) -> CatalogResult<u64> {
        let store = self.store.read().await;
        Ok(store.products.values().filter(|p| p.category == category).count() as u64)
    }

    async fn low_stock(&self, threshold: i64) -> CatalogResult<Vec<Product>> {
        let store = self.store.read().await;
        Ok(reports::low_stock(store.products.values(), threshold))
    }

    async fn inventory_summary(&self) -> CatalogResult<InventorySummary> {
        let store = self.store.read().await;
        Ok(reports::inventory_summary(store.products.values()))
    }

    async fn category_breakdown(&self) -> CatalogResult<Vec<CategoryBreakdown>> {
        let store = self.store.read().await;
        let names: HashMap<ObjectId, String> = store
            .categories
            .values()
            .map(|c| (c.id, c.name.clone()))
            .collect();
        Ok(reports::category_breakdown(store.products.values(), &names))
    }
}
