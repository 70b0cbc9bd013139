//! HTTP handlers for the catalog API

use axum::{Router, extract::State, routing::get};
use axum_helpers::{
    ApiResponse, Created, ObjectIdPath, ValidatedJson, ValidatedQuery,
    errors::responses::{
        BadRequestInvalidIdResponse, BadRequestValidationResponse, ConflictResponse,
        InternalServerErrorResponse, NotFoundResponse, TooManyRequestsResponse,
    },
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::CatalogResult;
use crate::models::{
    Category, CategoryInput, ListedProduct, Product, ProductInput, Variant, VariantInput,
};
use crate::query::{
    CategoryQuery, CategoryQueryParams, LowStockParams, LowStockQuery, ProductQuery,
    ProductQueryParams,
};
use crate::reports::{CategoryBreakdown, InventorySummary};
use crate::repository::{CategoryRepository, ProductRepository};
use crate::service::{CategoryService, ProductService};

pub const PRODUCTS_RETRIEVED: &str = "Products retrieved successfully";
pub const PRODUCT_RETRIEVED: &str = "Product retrieved successfully";
pub const PRODUCT_CREATED: &str = "Product created successfully";
pub const PRODUCT_UPDATED: &str = "Product updated successfully";
pub const PRODUCT_DELETED: &str = "Product deleted successfully";
pub const CATEGORIES_RETRIEVED: &str = "Categories retrieved successfully";
pub const CATEGORY_RETRIEVED: &str = "Category retrieved successfully";
pub const CATEGORY_CREATED: &str = "Category created successfully";
pub const CATEGORY_UPDATED: &str = "Category updated successfully";
pub const CATEGORY_DELETED: &str = "Category deleted successfully";
pub const LOW_STOCK_RETRIEVED: &str = "Low stock products retrieved successfully";
pub const SUMMARY_RETRIEVED: &str = "Inventory summary retrieved successfully";
pub const BREAKDOWN_RETRIEVED: &str = "Category report retrieved successfully";

/// OpenAPI documentation for the catalog endpoints
#[derive(OpenApi)]
#[openapi(
    paths(
        list_products,
        create_product,
        get_product,
        update_product,
        delete_product,
        low_stock_report,
        inventory_summary_report,
        category_report,
        list_categories,
        create_category,
        get_category,
        update_category,
        delete_category,
    ),
    components(
        schemas(
            Product, ListedProduct, Variant, ProductInput, VariantInput, Category, CategoryInput,
            InventorySummary, CategoryBreakdown
        ),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestInvalidIdResponse,
            ConflictResponse,
            TooManyRequestsResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Products", description = "Product management endpoints"),
        (name = "Categories", description = "Category management endpoints"),
        (name = "Reports", description = "Inventory reports")
    )
)]
pub struct ApiDoc;

type Products<P, C> = State<Arc<ProductService<P, C>>>;
type Categories<C, P> = State<Arc<CategoryService<C, P>>>;

/// Routes for `/products` and `/categories`
pub fn router<P, C>(products: ProductService<P, C>, categories: CategoryService<C, P>) -> Router
where
    P: ProductRepository + 'static,
    C: CategoryRepository + 'static,
{
    let product_routes = Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/reports/low-stock", get(low_stock_report))
        .route("/reports/inventory-summary", get(inventory_summary_report))
        .route("/reports/by-category", get(category_report))
        .route(
            "/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .with_state(Arc::new(products));

    let category_routes = Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/{id}",
            get(get_category).put(update_category).delete(delete_category),
        )
        .with_state(Arc::new(categories));

    Router::new()
        .nest("/products", product_routes)
        .nest("/categories", category_routes)
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

/// List active products
///
/// Filters combine with AND; results are paginated.
#[utoipa::path(
    get,
    path = "/products",
    tag = "Products",
    params(ProductQueryParams),
    responses(
        (status = 200, description = "Page of products", body = ApiResponse<Vec<ListedProduct>>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 429, response = TooManyRequestsResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_products<P: ProductRepository, C: CategoryRepository>(
    State(service): Products<P, C>,
    ValidatedQuery(query): ValidatedQuery<ProductQuery>,
) -> CatalogResult<ApiResponse<Vec<ListedProduct>>> {
    let page = query.page;
    let result = service.list(query).await?;
    Ok(ApiResponse::paginated(result.items, page.page, page.limit, result.total)
        .with_message(PRODUCTS_RETRIEVED))
}

/// Create a product under an existing category
#[utoipa::path(
    post,
    path = "/products",
    tag = "Products",
    request_body = ProductInput,
    responses(
        (status = 201, description = "Product created", body = ApiResponse<Product>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_product<P: ProductRepository, C: CategoryRepository>(
    State(service): Products<P, C>,
    ValidatedJson(input): ValidatedJson<ProductInput>,
) -> CatalogResult<Created<Product>> {
    let product = service.create(input).await?;
    Ok(Created(ApiResponse::ok(product).with_message(PRODUCT_CREATED)))
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/products/{id}",
    tag = "Products",
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product found", body = ApiResponse<Product>),
        (status = 400, response = BadRequestInvalidIdResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_product<P: ProductRepository, C: CategoryRepository>(
    State(service): Products<P, C>,
    ObjectIdPath(id): ObjectIdPath,
) -> CatalogResult<ApiResponse<Product>> {
    let product = service.get(id).await?;
    Ok(ApiResponse::ok(product).with_message(PRODUCT_RETRIEVED))
}

/// Replace a product
///
/// Omitted `variants`, `tags` and `isActive` keep their stored values.
#[utoipa::path(
    put,
    path = "/products/{id}",
    tag = "Products",
    params(("id" = String, Path, description = "Product id")),
    request_body = ProductInput,
    responses(
        (status = 200, description = "Product updated", body = ApiResponse<Product>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_product<P: ProductRepository, C: CategoryRepository>(
    State(service): Products<P, C>,
    ObjectIdPath(id): ObjectIdPath,
    ValidatedJson(input): ValidatedJson<ProductInput>,
) -> CatalogResult<ApiResponse<Product>> {
    let product = service.update(id, input).await?;
    Ok(ApiResponse::ok(product).with_message(PRODUCT_UPDATED))
}

/// Delete a product
#[utoipa::path(
    delete,
    path = "/products/{id}",
    tag = "Products",
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product deleted"),
        (status = 400, response = BadRequestInvalidIdResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_product<P: ProductRepository, C: CategoryRepository>(
    State(service): Products<P, C>,
    ObjectIdPath(id): ObjectIdPath,
) -> CatalogResult<ApiResponse<()>> {
    service.delete(id).await?;
    Ok(ApiResponse::message(PRODUCT_DELETED))
}

/// Active products with any variant at or below the threshold
#[utoipa::path(
    get,
    path = "/products/reports/low-stock",
    tag = "Reports",
    params(LowStockParams),
    responses(
        (status = 200, description = "Low-stock products", body = ApiResponse<Vec<ListedProduct>>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn low_stock_report<P: ProductRepository, C: CategoryRepository>(
    State(service): Products<P, C>,
    ValidatedQuery(query): ValidatedQuery<LowStockQuery>,
) -> CatalogResult<ApiResponse<Vec<ListedProduct>>> {
    let products = service.low_stock(query.threshold).await?;
    Ok(ApiResponse::ok(products).with_message(LOW_STOCK_RETRIEVED))
}

/// Catalog-wide inventory totals
#[utoipa::path(
    get,
    path = "/products/reports/inventory-summary",
    tag = "Reports",
    responses(
        (status = 200, description = "Inventory summary", body = ApiResponse<InventorySummary>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn inventory_summary_report<P: ProductRepository, C: CategoryRepository>(
    State(service): Products<P, C>,
) -> CatalogResult<ApiResponse<InventorySummary>> {
    let summary = service.inventory_summary().await?;
    Ok(ApiResponse::ok(summary).with_message(SUMMARY_RETRIEVED))
}

/// Product counts, inventory and average base price per category
#[utoipa::path(
    get,
    path = "/products/reports/by-category",
    tag = "Reports",
    responses(
        (status = 200, description = "Per-category breakdown", body = ApiResponse<Vec<CategoryBreakdown>>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn category_report<P: ProductRepository, C: CategoryRepository>(
    State(service): Products<P, C>,
) -> CatalogResult<ApiResponse<Vec<CategoryBreakdown>>> {
    let rows = service.category_breakdown().await?;
    Ok(ApiResponse::ok(rows).with_message(BREAKDOWN_RETRIEVED))
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// List active categories
#[utoipa::path(
    get,
    path = "/categories",
    tag = "Categories",
    params(CategoryQueryParams),
    responses(
        (status = 200, description = "Page of categories", body = ApiResponse<Vec<Category>>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_categories<C: CategoryRepository, P: ProductRepository>(
    State(service): Categories<C, P>,
    ValidatedQuery(query): ValidatedQuery<CategoryQuery>,
) -> CatalogResult<ApiResponse<Vec<Category>>> {
    let page = query.page;
    let result = service.list(query).await?;
    Ok(ApiResponse::paginated(result.items, page.page, page.limit, result.total)
        .with_message(CATEGORIES_RETRIEVED))
}

#[utoipa::path(
    post,
    path = "/categories",
    tag = "Categories",
    request_body = CategoryInput,
    responses(
        (status = 201, description = "Category created", body = ApiResponse<Category>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_category<C: CategoryRepository, P: ProductRepository>(
    State(service): Categories<C, P>,
    ValidatedJson(input): ValidatedJson<CategoryInput>,
) -> CatalogResult<Created<Category>> {
    let category = service.create(input).await?;
    Ok(Created(ApiResponse::ok(category).with_message(CATEGORY_CREATED)))
}

#[utoipa::path(
    get,
    path = "/categories/{id}",
    tag = "Categories",
    params(("id" = String, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category found", body = ApiResponse<Category>),
        (status = 400, response = BadRequestInvalidIdResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_category<C: CategoryRepository, P: ProductRepository>(
    State(service): Categories<C, P>,
    ObjectIdPath(id): ObjectIdPath,
) -> CatalogResult<ApiResponse<Category>> {
    let category = service.get(id).await?;
    Ok(ApiResponse::ok(category).with_message(CATEGORY_RETRIEVED))
}

/// Replace a category; an omitted `isActive` or `description` is kept
#[utoipa::path(
    put,
    path = "/categories/{id}",
    tag = "Categories",
    params(("id" = String, Path, description = "Category id")),
    request_body = CategoryInput,
    responses(
        (status = 200, description = "Category updated", body = ApiResponse<Category>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_category<C: CategoryRepository, P: ProductRepository>(
    State(service): Categories<C, P>,
    ObjectIdPath(id): ObjectIdPath,
    ValidatedJson(input): ValidatedJson<CategoryInput>,
) -> CatalogResult<ApiResponse<Category>> {
    let category = service.update(id, input).await?;
    Ok(ApiResponse::ok(category).with_message(CATEGORY_UPDATED))
}

/// Delete a category no product references
#[utoipa::path(
    delete,
    path = "/categories/{id}",
    tag = "Categories",
    params(("id" = String, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category deleted"),
        (status = 400, response = BadRequestInvalidIdResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_category<C: CategoryRepository, P: ProductRepository>(
    State(service): Categories<C, P>,
    ObjectIdPath(id): ObjectIdPath,
) -> CatalogResult<ApiResponse<()>> {
    service.delete(id).await?;
    Ok(ApiResponse::message(CATEGORY_DELETED))
}
