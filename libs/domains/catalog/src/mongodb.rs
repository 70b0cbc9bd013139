//! MongoDB implementations of the catalog repositories

use std::future::IntoFuture;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{Bson, DateTime as BsonDateTime, Document, doc, from_document, oid::ObjectId},
    options::{FindOptions, IndexOptions},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::CatalogResult;
use crate::models::{Category, Product, Variant};
use crate::query::{
    Bounds, CategoryFilter, CategoryQuery, Paged, ProductFilter, ProductQuery, SortOrder,
};
use crate::reports::{
    CategoryBreakdown, InventorySummary, SUMMARY_LOW_STOCK_LEVEL, round_to_cents, sort_breakdown,
};
use crate::repository::{CategoryRepository, ProductRepository};

pub const PRODUCTS_COLLECTION: &str = "products";
pub const CATEGORIES_COLLECTION: &str = "categories";

fn to_bson_datetime(at: DateTime<Utc>) -> BsonDateTime {
    BsonDateTime::from_millis(at.timestamp_millis())
}

fn from_bson_datetime(at: BsonDateTime) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(at.timestamp_millis()).unwrap_or_default()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoryDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    is_active: bool,
    created_at: BsonDateTime,
    updated_at: BsonDateTime,
}

impl From<&Category> for CategoryDocument {
    fn from(c: &Category) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            description: c.description.clone(),
            is_active: c.is_active,
            created_at: to_bson_datetime(c.created_at),
            updated_at: to_bson_datetime(c.updated_at),
        }
    }
}

impl From<CategoryDocument> for Category {
    fn from(d: CategoryDocument) -> Self {
        Self {
            id: d.id,
            name: d.name,
            description: d.description,
            is_active: d.is_active,
            created_at: from_bson_datetime(d.created_at),
            updated_at: from_bson_datetime(d.updated_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    name: String,
    description: String,
    category: ObjectId,
    base_price: f64,
    #[serde(default)]
    variants: Vec<Variant>,
    #[serde(default)]
    tags: Vec<String>,
    is_active: bool,
    created_at: BsonDateTime,
    updated_at: BsonDateTime,
}

impl From<&Product> for ProductDocument {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            description: p.description.clone(),
            category: p.category,
            base_price: p.base_price,
            variants: p.variants.clone(),
            tags: p.tags.clone(),
            is_active: p.is_active,
            created_at: to_bson_datetime(p.created_at),
            updated_at: to_bson_datetime(p.updated_at),
        }
    }
}

impl From<ProductDocument> for Product {
    fn from(d: ProductDocument) -> Self {
        Self {
            id: d.id,
            name: d.name,
            description: d.description,
            category: d.category,
            base_price: d.base_price,
            variants: d.variants,
            tags: d.tags,
            is_active: d.is_active,
            created_at: from_bson_datetime(d.created_at),
            updated_at: from_bson_datetime(d.updated_at),
        }
    }
}

// ---------------------------------------------------------------------------
// Query translation
// ---------------------------------------------------------------------------

/// `{ "$gte": min, "$lte": max }` with open sides left out
fn range_document<T: Into<Bson>>(min: Option<T>, max: Option<T>) -> Option<Document> {
    let mut range = Document::new();
    if let Some(min) = min {
        range.insert("$gte", min);
    }
    if let Some(max) = max {
        range.insert("$lte", max);
    }
    (!range.is_empty()).then_some(range)
}

fn created_range(created: &Bounds<DateTime<Utc>>) -> Option<Document> {
    range_document(
        created.min.map(to_bson_datetime),
        created.max.map(to_bson_datetime),
    )
}

pub(crate) fn product_filter_document(filter: &ProductFilter) -> Document {
    let mut doc = doc! { "isActive": true };

    if let Some(ref search) = filter.search {
        doc.insert("$text", doc! { "$search": search.as_str() });
    }
    if let Some(category) = filter.category {
        doc.insert("category", category);
    }
    if let Some(price) = range_document(filter.price.min, filter.price.max) {
        doc.insert("basePrice", price);
    }
    if let Some(created) = created_range(&filter.created) {
        doc.insert("createdAt", created);
    }
    if filter.in_stock {
        doc.insert("variants.inventory", doc! { "$gt": 0 });
    }

    doc
}

pub(crate) fn category_filter_document(filter: &CategoryFilter) -> Document {
    let mut doc = doc! { "isActive": true };

    if let Some(ref search) = filter.search {
        let pattern = regex::escape(search);
        doc.insert(
            "$or",
            vec![
                doc! { "name": { "$regex": pattern.as_str(), "$options": "i" } },
                doc! { "description": { "$regex": pattern.as_str(), "$options": "i" } },
            ],
        );
    }
    if let Some(created) = created_range(&filter.created) {
        doc.insert("createdAt", created);
    }

    doc
}

/// Sort on `field`, then `_id` so pages never overlap on ties
pub(crate) fn sort_document(field: &str, order: SortOrder) -> Document {
    let mut sort = Document::new();
    sort.insert(field, order.direction());
    sort.insert("_id", order.direction());
    sort
}

fn find_options(sort: Document, skip: u64, limit: u64) -> FindOptions {
    FindOptions::builder()
        .sort(sort)
        .skip(skip)
        .limit(limit as i64)
        .build()
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// MongoDB implementation of the CategoryRepository
#[derive(Clone)]
pub struct MongoCategoryRepository {
    collection: Collection<CategoryDocument>,
}

impl MongoCategoryRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(CATEGORIES_COLLECTION),
        }
    }

    /// Initialize indexes for uniqueness and listing
    pub async fn init_indexes(&self) -> CatalogResult<()> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "name": 1 })
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .name("idx_name_unique".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "isActive": 1, "createdAt": -1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_active_created".to_string())
                        .build(),
                )
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        tracing::info!("Category indexes created successfully");
        Ok(())
    }
}

#[async_trait]
impl CategoryRepository for MongoCategoryRepository {
    #[instrument(skip(self, category), fields(category_id = %category.id))]
    async fn insert(&self, category: Category) -> CatalogResult<Category> {
        self.collection
            .insert_one(CategoryDocument::from(&category))
            .await?;
        Ok(category)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: ObjectId) -> CatalogResult<Option<Category>> {
        let found = self.collection.find_one(doc! { "_id": id }).await?;
        Ok(found.map(Category::from))
    }

    #[instrument(skip(self))]
    async fn exists(&self, id: ObjectId) -> CatalogResult<bool> {
        let count = self.collection.count_documents(doc! { "_id": id }).await?;
        Ok(count > 0)
    }

    #[instrument(skip(self))]
    async fn list(&self, query: CategoryQuery) -> CatalogResult<Paged<Category>> {
        let filter = category_filter_document(&query.filter);
        let options = find_options(
            sort_document(query.sort.field.into(), query.sort.order),
            query.page.skip(),
            query.page.limit,
        );

        let (cursor, total) = tokio::try_join!(
            self.collection
                .find(filter.clone())
                .with_options(options)
                .into_future(),
            self.collection.count_documents(filter).into_future(),
        )?;
        let docs: Vec<CategoryDocument> = cursor.try_collect().await?;

        Ok(Paged {
            items: docs.into_iter().map(Category::from).collect(),
            total,
        })
    }

    #[instrument(skip(self, category), fields(category_id = %category.id))]
    async fn replace(&self, category: Category) -> CatalogResult<Option<Category>> {
        let result = self
            .collection
            .replace_one(doc! { "_id": category.id }, CategoryDocument::from(&category))
            .await?;
        Ok((result.matched_count > 0).then_some(category))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: ObjectId) -> CatalogResult<Option<Category>> {
        let removed = self.collection.find_one_and_delete(doc! { "_id": id }).await?;
        Ok(removed.map(Category::from))
    }
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

/// MongoDB implementation of the ProductRepository
#[derive(Clone)]
pub struct MongoProductRepository {
    collection: Collection<ProductDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryRow {
    total_products: i64,
    total_variants: i64,
    total_inventory: i64,
    average_price: Option<f64>,
    low_stock_count: i64,
    out_of_stock_count: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BreakdownRow {
    category_id: ObjectId,
    category_name: String,
    product_count: i64,
    total_inventory: i64,
    average_price: Option<f64>,
}

impl MongoProductRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(PRODUCTS_COLLECTION),
        }
    }

    /// Initialize indexes for search, filters and SKU uniqueness
    pub async fn init_indexes(&self) -> CatalogResult<()> {
        let indexes = vec![
            // Unique across products; products without variants are not indexed
            IndexModel::builder()
                .keys(doc! { "variants.sku": 1 })
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .partial_filter_expression(doc! { "variants.sku": { "$exists": true } })
                        .name("idx_variant_sku_unique".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "name": "text", "description": "text", "tags": "text" })
                .options(
                    IndexOptions::builder()
                        .name("idx_text_search".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "category": 1, "isActive": 1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_category_active".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "basePrice": 1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_base_price".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "createdAt": -1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_created_at".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "variants.inventory": 1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_variant_inventory".to_string())
                        .build(),
                )
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        tracing::info!("Product indexes created successfully");
        Ok(())
    }

    async fn aggregate_rows<T: serde::de::DeserializeOwned>(
        &self,
        pipeline: Vec<Document>,
    ) -> CatalogResult<Vec<T>> {
        let docs: Vec<Document> = self.collection.aggregate(pipeline).await?.try_collect().await?;
        docs.into_iter()
            .map(|d| from_document(d).map_err(Into::into))
            .collect()
    }
}

fn summary_pipeline() -> Vec<Document> {
    vec![
        doc! { "$match": { "isActive": true } },
        doc! { "$unwind": "$variants" },
        doc! { "$group": {
            "_id": Bson::Null,
            "products": { "$addToSet": "$_id" },
            "totalVariants": { "$sum": 1 },
            "totalInventory": { "$sum": "$variants.inventory" },
            "averagePrice": { "$avg": "$variants.price" },
            "lowStockCount": { "$sum": {
                "$cond": [{ "$lte": ["$variants.inventory", SUMMARY_LOW_STOCK_LEVEL] }, 1, 0]
            } },
            "outOfStockCount": { "$sum": {
                "$cond": [{ "$eq": ["$variants.inventory", 0] }, 1, 0]
            } },
        } },
        doc! { "$project": {
            "_id": 0,
            "totalProducts": { "$size": "$products" },
            "totalVariants": 1,
            "totalInventory": 1,
            "averagePrice": 1,
            "lowStockCount": 1,
            "outOfStockCount": 1,
        } },
    ]
}

fn breakdown_pipeline() -> Vec<Document> {
    vec![
        doc! { "$match": { "isActive": true } },
        doc! { "$group": {
            "_id": "$category",
            "productCount": { "$sum": 1 },
            "totalInventory": { "$sum": { "$sum": "$variants.inventory" } },
            "averagePrice": { "$avg": "$basePrice" },
        } },
        doc! { "$lookup": {
            "from": CATEGORIES_COLLECTION,
            "localField": "_id",
            "foreignField": "_id",
            "as": "category",
        } },
        doc! { "$unwind": "$category" },
        doc! { "$project": {
            "_id": 0,
            "categoryId": "$_id",
            "categoryName": "$category.name",
            "productCount": 1,
            "totalInventory": 1,
            "averagePrice": 1,
        } },
    ]
}

#[async_trait]
impl ProductRepository for MongoProductRepository {
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    async fn insert(&self, product: Product) -> CatalogResult<Product> {
        self.collection
            .insert_one(ProductDocument::from(&product))
            .await?;
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: ObjectId) -> CatalogResult<Option<Product>> {
        let found = self.collection.find_one(doc! { "_id": id }).await?;
        Ok(found.map(Product::from))
    }

    #[instrument(skip(self))]
    async fn list(&self, query: ProductQuery) -> CatalogResult<Paged<Product>> {
        let filter = product_filter_document(&query.filter);
        let options = find_options(
            sort_document(query.sort.field.into(), query.sort.order),
            query.page.skip(),
            query.page.limit,
        );

        let (cursor, total) = tokio::try_join!(
            self.collection
                .find(filter.clone())
                .with_options(options)
                .into_future(),
            self.collection.count_documents(filter).into_future(),
        )?;
        let docs: Vec<ProductDocument> = cursor.try_collect().await?;

        Ok(Paged {
            items: docs.into_iter().map(Product::from).collect(),
            total,
        })
    }

    #[instrument(skip(self, product), fields(product_id = %product.id))]
    async fn replace(&self, product: Product) -> CatalogResult<Option<Product>> {
        let result = self
            .collection
            .replace_one(doc! { "_id": product.id }, ProductDocument::from(&product))
            .await?;
        Ok((result.matched_count > 0).then_some(product))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: ObjectId) -> CatalogResult<Option<Product>> {
        let removed = self.collection.find_one_and_delete(doc! { "_id": id }).await?;
        Ok(removed.map(Product::from))
    }

    #[instrument(skip(self))]
    async fn count_by_category(&self, category: ObjectId) -> CatalogResult<u64> {
        let count = self
            .collection
            .count_documents(doc! { "category": category })
            .await?;
        Ok(count)
    }

    #[instrument(skip(self))]
    async fn low_stock(&self, threshold: i64) -> CatalogResult<Vec<Product>> {
        let filter = doc! {
            "isActive": true,
            "variants.inventory": { "$lte": threshold },
        };
        let cursor = self
            .collection
            .find(filter)
            .sort(doc! { "name": 1, "_id": 1 })
            .await?;
        let docs: Vec<ProductDocument> = cursor.try_collect().await?;
        Ok(docs.into_iter().map(Product::from).collect())
    }

    #[instrument(skip(self))]
    async fn inventory_summary(&self) -> CatalogResult<InventorySummary> {
        let rows: Vec<SummaryRow> = self.aggregate_rows(summary_pipeline()).await?;

        Ok(rows
            .into_iter()
            .next()
            .map(|row| InventorySummary {
                total_products: row.total_products.max(0) as u64,
                total_variants: row.total_variants.max(0) as u64,
                total_inventory: row.total_inventory,
                average_price: round_to_cents(row.average_price.unwrap_or_default()),
                low_stock_count: row.low_stock_count.max(0) as u64,
                out_of_stock_count: row.out_of_stock_count.max(0) as u64,
            })
            .unwrap_or_default())
    }

    #[instrument(skip(self))]
    async fn category_breakdown(&self) -> CatalogResult<Vec<CategoryBreakdown>> {
        let rows: Vec<BreakdownRow> = self.aggregate_rows(breakdown_pipeline()).await?;

        let mut breakdown: Vec<_> = rows
            .into_iter()
            .map(|row| CategoryBreakdown {
                category_id: row.category_id,
                category_name: row.category_name,
                product_count: row.product_count.max(0) as u64,
                total_inventory: row.total_inventory,
                average_price: round_to_cents(row.average_price.unwrap_or_default()),
            })
            .collect();
        sort_breakdown(&mut breakdown);
        Ok(breakdown)
    }
}
