//! Catalog services - business rules over the repositories
//!
//! Category references are checked twice around every product write, and
//! product counts twice around every category delete. When the second check
//! shows a concurrent change broke the rule, the write is rolled back before
//! the error is returned.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum_helpers::FieldError;
use mongodb::bson::oid::ObjectId;
use observability::CatalogMetrics;
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::error::{CatalogError, CatalogResult};
use crate::models::{Category, CategoryInput, ListedProduct, Product, ProductInput};
use crate::query::{CategoryQuery, Paged, ProductQuery};
use crate::reports::{CategoryBreakdown, InventorySummary};
use crate::repository::{CategoryRepository, ProductRepository};

fn record_duplicate(resource: &'static str, reason: &'static str) -> impl Fn(&CatalogError) {
    move |err| {
        if matches!(err, CatalogError::Duplicate { .. }) {
            CatalogMetrics::record_conflict(resource, reason);
        }
    }
}

/// Product operations and inventory reports
pub struct ProductService<P: ProductRepository, C: CategoryRepository> {
    products: Arc<P>,
    categories: Arc<C>,
}

impl<P: ProductRepository, C: CategoryRepository> Clone for ProductService<P, C> {
    fn clone(&self) -> Self {
        Self {
            products: Arc::clone(&self.products),
            categories: Arc::clone(&self.categories),
        }
    }
}

impl<P: ProductRepository, C: CategoryRepository> ProductService<P, C> {
    pub fn new(products: Arc<P>, categories: Arc<C>) -> Self {
        Self {
            products,
            categories,
        }
    }

    fn category_ref(input: &ProductInput) -> CatalogResult<ObjectId> {
        input.category_id().ok_or_else(|| {
            CatalogError::Validation(vec![FieldError::body(
                "category",
                "Valid category ID required",
                Value::String(input.category.clone()),
            )])
        })
    }

    async fn require_category(&self, category: ObjectId) -> CatalogResult<()> {
        if self.categories.exists(category).await? {
            Ok(())
        } else {
            Err(CatalogError::MissingCategory(category))
        }
    }

    /// Pairs each product with its category's name, one lookup per category
    async fn with_category_names(
        &self,
        products: Vec<Product>,
    ) -> CatalogResult<Vec<ListedProduct>> {
        let mut names: HashMap<ObjectId, Option<String>> = HashMap::new();
        for product in &products {
            if !names.contains_key(&product.category) {
                let name = self
                    .categories
                    .find_by_id(product.category)
                    .await?
                    .map(|category| category.name);
                names.insert(product.category, name);
            }
        }

        Ok(products
            .into_iter()
            .map(|product| ListedProduct {
                category_name: names.get(&product.category).cloned().flatten(),
                product,
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn list(&self, query: ProductQuery) -> CatalogResult<Paged<ListedProduct>> {
        let page = self.products.list(query).await?;
        Ok(Paged {
            items: self.with_category_names(page.items).await?,
            total: page.total,
        })
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: ObjectId) -> CatalogResult<Product> {
        self.products
            .find_by_id(id)
            .await?
            .ok_or(CatalogError::ProductNotFound(id))
    }

    #[instrument(skip(self, input), fields(product_name = %input.name))]
    pub async fn create(&self, input: ProductInput) -> CatalogResult<Product> {
        let category = Self::category_ref(&input)?;
        self.require_category(category).await?;

        let product = self
            .products
            .insert(Product::new(input, category))
            .await
            .inspect_err(record_duplicate("product", "duplicate_sku"))?;

        if let Err(err) = self.require_category(category).await {
            warn!(product_id = %product.id, category_id = %category, "Category removed during create, rolling back");
            self.products.delete(product.id).await?;
            return Err(err);
        }

        CatalogMetrics::record_product_created();
        info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    /// Replaces a product's fields. Absent variants, tags and `isActive` keep
    /// their stored values.
    #[instrument(skip(self, input))]
    pub async fn update(&self, id: ObjectId, input: ProductInput) -> CatalogResult<Product> {
        let category = Self::category_ref(&input)?;
        self.require_category(category).await?;

        let previous = self.get(id).await?;
        let mut product = previous.clone();
        product.apply(input, category);

        let product = self
            .products
            .replace(product)
            .await
            .inspect_err(record_duplicate("product", "duplicate_sku"))?
            .ok_or(CatalogError::ProductNotFound(id))?;

        if let Err(err) = self.require_category(category).await {
            warn!(product_id = %id, category_id = %category, "Category removed during update, restoring");
            self.products.replace(previous).await?;
            return Err(err);
        }

        CatalogMetrics::record_product_updated();
        info!(product_id = %id, "Product updated");
        Ok(product)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: ObjectId) -> CatalogResult<Product> {
        let removed = self
            .products
            .delete(id)
            .await?
            .ok_or(CatalogError::ProductNotFound(id))?;

        CatalogMetrics::record_product_deleted();
        info!(product_id = %id, "Product deleted");
        Ok(removed)
    }

    #[instrument(skip(self))]
    pub async fn low_stock(&self, threshold: i64) -> CatalogResult<Vec<ListedProduct>> {
        let started = Instant::now();
        let products = self.products.low_stock(threshold).await?;
        let products = self.with_category_names(products).await?;
        CatalogMetrics::record_report("low_stock", started.elapsed());
        Ok(products)
    }

    #[instrument(skip(self))]
    pub async fn inventory_summary(&self) -> CatalogResult<InventorySummary> {
        let started = Instant::now();
        let summary = self.products.inventory_summary().await?;
        CatalogMetrics::record_report("inventory_summary", started.elapsed());
        Ok(summary)
    }

    #[instrument(skip(self))]
    pub async fn category_breakdown(&self) -> CatalogResult<Vec<CategoryBreakdown>> {
        let started = Instant::now();
        let rows = self.products.category_breakdown().await?;
        CatalogMetrics::record_report("by_category", started.elapsed());
        Ok(rows)
    }
}

/// Category operations
pub struct CategoryService<C: CategoryRepository, P: ProductRepository> {
    categories: Arc<C>,
    products: Arc<P>,
}

impl<C: CategoryRepository, P: ProductRepository> Clone for CategoryService<C, P> {
    fn clone(&self) -> Self {
        Self {
            categories: Arc::clone(&self.categories),
            products: Arc::clone(&self.products),
        }
    }
}

impl<C: CategoryRepository, P: ProductRepository> CategoryService<C, P> {
    pub fn new(categories: Arc<C>, products: Arc<P>) -> Self {
        Self {
            categories,
            products,
        }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, query: CategoryQuery) -> CatalogResult<Paged<Category>> {
        self.categories.list(query).await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: ObjectId) -> CatalogResult<Category> {
        self.categories
            .find_by_id(id)
            .await?
            .ok_or(CatalogError::CategoryNotFound(id))
    }

    #[instrument(skip(self, input), fields(category_name = %input.name))]
    pub async fn create(&self, input: CategoryInput) -> CatalogResult<Category> {
        let category = self
            .categories
            .insert(Category::new(input))
            .await
            .inspect_err(record_duplicate("category", "duplicate_name"))?;

        CatalogMetrics::record_category_created();
        info!(category_id = %category.id, "Category created");
        Ok(category)
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: ObjectId, input: CategoryInput) -> CatalogResult<Category> {
        let mut category = self.get(id).await?;
        category.apply(input);

        let category = self
            .categories
            .replace(category)
            .await
            .inspect_err(record_duplicate("category", "duplicate_name"))?
            .ok_or(CatalogError::CategoryNotFound(id))?;

        CatalogMetrics::record_category_updated();
        info!(category_id = %id, "Category updated");
        Ok(category)
    }

    /// Deletes a category that no product references, active or not.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: ObjectId) -> CatalogResult<Category> {
        if self.products.count_by_category(id).await? > 0 {
            CatalogMetrics::record_conflict("category", "category_in_use");
            return Err(CatalogError::CategoryInUse(id));
        }

        let removed = self
            .categories
            .delete(id)
            .await?
            .ok_or(CatalogError::CategoryNotFound(id))?;

        if self.products.count_by_category(id).await? > 0 {
            warn!(category_id = %id, "Product added during delete, restoring category");
            self.categories.insert(removed).await?;
            CatalogMetrics::record_conflict("category", "category_in_use");
            return Err(CatalogError::CategoryInUse(id));
        }

        CatalogMetrics::record_category_deleted();
        info!(category_id = %id, "Category deleted");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::now;
    use crate::repository::{MockCategoryRepository, MockProductRepository};
    use mockall::predicate::eq;

    fn product_input(category: &str) -> ProductInput {
        serde_json::from_value(serde_json::json!({
            "name": "Classic Tee",
            "description": "Soft cotton",
            "category": category,
            "basePrice": 19.99,
            "variants": [{ "sku": "TEE-M", "price": 19.99, "inventory": 3 }]
        }))
        .unwrap()
    }

    fn stored_category(id: ObjectId) -> Category {
        let at = now();
        Category {
            id,
            name: "Shirts".into(),
            description: None,
            is_active: true,
            created_at: at,
            updated_at: at,
        }
    }

    fn product_service(
        products: MockProductRepository,
        categories: MockCategoryRepository,
    ) -> ProductService<MockProductRepository, MockCategoryRepository> {
        ProductService::new(Arc::new(products), Arc::new(categories))
    }

    fn category_service(
        categories: MockCategoryRepository,
        products: MockProductRepository,
    ) -> CategoryService<MockCategoryRepository, MockProductRepository> {
        CategoryService::new(Arc::new(categories), Arc::new(products))
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_category() {
        let category = ObjectId::new();
        let mut products = MockProductRepository::new();
        let mut categories = MockCategoryRepository::new();

        categories
            .expect_exists()
            .with(eq(category))
            .returning(|_| Ok(false));
        products.expect_insert().never();

        let service = product_service(products, categories);
        let err = service
            .create(product_input(&category.to_hex()))
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::MissingCategory(id) if id == category));
    }

    #[tokio::test]
    async fn test_create_rolls_back_when_category_disappears() {
        let category = ObjectId::new();
        let mut products = MockProductRepository::new();
        let mut categories = MockCategoryRepository::new();

        let mut first = true;
        categories.expect_exists().times(2).returning(move |_| {
            let exists = first;
            first = false;
            Ok(exists)
        });
        products.expect_insert().times(1).returning(Ok);
        products.expect_delete().times(1).returning(|_| Ok(None));

        let service = product_service(products, categories);
        let err = service
            .create(product_input(&category.to_hex()))
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::MissingCategory(_)));
    }

    #[tokio::test]
    async fn test_create_stores_product() {
        let category = ObjectId::new();
        let mut products = MockProductRepository::new();
        let mut categories = MockCategoryRepository::new();

        categories.expect_exists().times(2).returning(|_| Ok(true));
        products.expect_insert().times(1).returning(Ok);

        let service = product_service(products, categories);
        let product = service
            .create(product_input(&category.to_hex()))
            .await
            .unwrap();

        assert_eq!(product.category, category);
        assert_eq!(product.variants[0].sku, "TEE-M");
    }

    #[tokio::test]
    async fn test_list_names_categories_once_each() {
        let shirts = ObjectId::new();
        let removed = ObjectId::new();
        let items = vec![
            Product::new(product_input(&shirts.to_hex()), shirts),
            Product::new(product_input(&shirts.to_hex()), shirts),
            Product::new(product_input(&removed.to_hex()), removed),
        ];

        let mut products = MockProductRepository::new();
        let mut categories = MockCategoryRepository::new();
        products
            .expect_list()
            .returning(move |_| Ok(Paged { items: items.clone(), total: 3 }));
        categories
            .expect_find_by_id()
            .with(eq(shirts))
            .times(1)
            .returning(|id| Ok(Some(stored_category(id))));
        categories
            .expect_find_by_id()
            .with(eq(removed))
            .times(1)
            .returning(|_| Ok(None));

        let service = product_service(products, categories);
        let page = service.list(ProductQuery::default()).await.unwrap();

        assert_eq!(page.total, 3);
        let names: Vec<_> = page.items.iter().map(|p| p.category_name.as_deref()).collect();
        assert_eq!(names, vec![Some("Shirts"), Some("Shirts"), None]);
    }

    #[tokio::test]
    async fn test_update_restores_previous_when_category_disappears() {
        let old_category = ObjectId::new();
        let new_category = ObjectId::new();
        let previous = Product::new(product_input(&old_category.to_hex()), old_category);
        let id = previous.id;

        let mut products = MockProductRepository::new();
        let mut categories = MockCategoryRepository::new();

        let mut first = true;
        categories.expect_exists().times(2).returning(move |_| {
            let exists = first;
            first = false;
            Ok(exists)
        });
        let stored = previous.clone();
        products
            .expect_find_by_id()
            .with(eq(id))
            .returning(move |_| Ok(Some(stored.clone())));
        products
            .expect_replace()
            .withf(move |p| p.category == new_category)
            .times(1)
            .returning(|p| Ok(Some(p)));
        products
            .expect_replace()
            .withf(move |p| p.category == old_category)
            .times(1)
            .returning(|p| Ok(Some(p)));

        let service = product_service(products, categories);
        let err = service
            .update(id, product_input(&new_category.to_hex()))
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::MissingCategory(c) if c == new_category));
    }

    #[tokio::test]
    async fn test_update_missing_product() {
        let category = ObjectId::new();
        let id = ObjectId::new();
        let mut products = MockProductRepository::new();
        let mut categories = MockCategoryRepository::new();

        categories.expect_exists().returning(|_| Ok(true));
        products.expect_find_by_id().returning(|_| Ok(None));
        products.expect_replace().never();

        let service = product_service(products, categories);
        let err = service
            .update(id, product_input(&category.to_hex()))
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::ProductNotFound(missing) if missing == id));
    }

    #[tokio::test]
    async fn test_delete_missing_product() {
        let mut products = MockProductRepository::new();
        products.expect_delete().returning(|_| Ok(None));

        let service = product_service(products, MockCategoryRepository::new());
        let err = service.delete(ObjectId::new()).await.unwrap_err();

        assert!(matches!(err, CatalogError::ProductNotFound(_)));
    }

    #[tokio::test]
    async fn test_category_delete_blocked_by_products() {
        let id = ObjectId::new();
        let mut products = MockProductRepository::new();
        let mut categories = MockCategoryRepository::new();

        products
            .expect_count_by_category()
            .with(eq(id))
            .returning(|_| Ok(2));
        categories.expect_delete().never();

        let service = category_service(categories, products);
        let err = service.delete(id).await.unwrap_err();

        assert!(matches!(err, CatalogError::CategoryInUse(_)));
    }

    #[tokio::test]
    async fn test_category_delete_restores_when_product_appears() {
        let id = ObjectId::new();
        let mut products = MockProductRepository::new();
        let mut categories = MockCategoryRepository::new();

        let mut calls = 0;
        products.expect_count_by_category().times(2).returning(move |_| {
            calls += 1;
            Ok(if calls == 1 { 0 } else { 1 })
        });
        categories
            .expect_delete()
            .with(eq(id))
            .returning(move |id| Ok(Some(stored_category(id))));
        categories
            .expect_insert()
            .withf(move |c| c.id == id)
            .times(1)
            .returning(Ok);

        let service = category_service(categories, products);
        let err = service.delete(id).await.unwrap_err();

        assert!(matches!(err, CatalogError::CategoryInUse(_)));
    }

    #[tokio::test]
    async fn test_category_delete_missing() {
        let mut products = MockProductRepository::new();
        let mut categories = MockCategoryRepository::new();

        products.expect_count_by_category().returning(|_| Ok(0));
        categories.expect_delete().returning(|_| Ok(None));

        let service = category_service(categories, products);
        let err = service.delete(ObjectId::new()).await.unwrap_err();

        assert!(matches!(err, CatalogError::CategoryNotFound(_)));
    }

    #[tokio::test]
    async fn test_category_update_keeps_active_flag() {
        let id = ObjectId::new();
        let mut categories = MockCategoryRepository::new();

        categories.expect_find_by_id().returning(move |id| {
            let mut category = stored_category(id);
            category.is_active = false;
            Ok(Some(category))
        });
        categories.expect_replace().returning(|c| Ok(Some(c)));

        let service = category_service(categories, MockProductRepository::new());
        let updated = service
            .update(
                id,
                CategoryInput {
                    name: "Tops".into(),
                    description: None,
                    is_active: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Tops");
        assert!(!updated.is_active);
    }
}
