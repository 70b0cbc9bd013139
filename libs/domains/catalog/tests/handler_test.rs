//! Handler tests for the catalog domain
//!
//! These run the real handlers and services over the in-memory repositories:
//! - Request validation and the error envelope
//! - Success envelopes and pagination metadata
//! - Reference integrity between products and categories
//! - Inventory reports

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use domain_catalog::*;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt; // For oneshot()

fn app() -> Router {
    let catalog = InMemoryCatalog::new();
    let products = Arc::new(catalog.products());
    let categories = Arc::new(catalog.categories());

    handlers::router(
        ProductService::new(products.clone(), categories.clone()),
        CategoryService::new(categories, products),
    )
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn create_category(app: &Router, name: &str) -> String {
    let (status, body) = send(app, "POST", "/categories", Some(json!({ "name": name }))).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["id"].as_str().unwrap().to_string()
}

fn product_body(name: &str, category: &str, price: f64, variants: Value) -> Value {
    json!({
        "name": name,
        "description": format!("{name} made from organic cotton"),
        "category": category,
        "basePrice": price,
        "variants": variants,
        "tags": ["cotton"]
    })
}

async fn create_product(app: &Router, body: Value) -> Value {
    let (status, body) = send(app, "POST", "/products", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"].clone()
}

#[tokio::test]
async fn test_create_and_get_product() {
    let app = app();
    let category = create_category(&app, "Shirts").await;

    let (status, body) = send(
        &app,
        "POST",
        "/products",
        Some(product_body(
            "  Classic Tee ",
            &category,
            19.99,
            json!([{ "size": "M", "color": "red", "sku": "TEE-RED-M", "price": 21.5, "inventory": 7 }]),
        )),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Product created successfully");
    assert_eq!(body["data"]["name"], "Classic Tee");
    assert_eq!(body["data"]["category"], category.as_str());
    assert_eq!(body["data"]["variants"][0]["discount"], 0.0);
    assert_eq!(body["data"]["isActive"], true);

    let id = body["data"]["id"].as_str().unwrap();
    let (status, fetched) = send(&app, "GET", &format!("/products/{id}"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["data"], body["data"]);
}

#[tokio::test]
async fn test_create_product_reports_every_invalid_field() {
    let app = app();

    let (status, body) = send(
        &app,
        "POST",
        "/products",
        Some(json!({
            "name": "",
            "description": "ok",
            "category": "nope",
            "basePrice": -2,
            "variants": [
                { "sku": "A", "price": 1, "inventory": -1 },
                { "sku": "A", "price": 1, "discount": 101 }
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Validation error");

    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(
        fields,
        vec![
            "basePrice",
            "category",
            "name",
            "variants[0].inventory",
            "variants[1].discount",
            "variants[1].sku",
        ]
    );
    assert!(body["errors"].as_array().unwrap().iter().all(|e| e["location"] == "body"));
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let app = app();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/categories")
                .header("content-type", "application/json")
                .body(Body::from("{\"name\": "))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_mistyped_fields_are_listed_with_other_violations() {
    let app = app();
    let category = create_category(&app, "Shirts").await;

    let (status, body) = send(
        &app,
        "POST",
        "/products",
        Some(json!({
            "name": "",
            "description": "Loose fit",
            "category": category,
            "basePrice": "abc",
            "variants": [{ "sku": "A", "price": 1.0, "inventory": 2.5 }]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation error");
    let errors = body["errors"].as_array().unwrap();
    let fields: Vec<&str> = errors.iter().map(|e| e["field"].as_str().unwrap()).collect();
    assert_eq!(fields, vec!["basePrice", "name", "variants[0].inventory"]);
    assert_eq!(errors[0]["message"], "Base price must be a positive number");
    assert_eq!(errors[0]["value"], "abc");
    assert_eq!(errors[2]["value"], 2.5);
    assert!(errors.iter().all(|e| e["location"] == "body"));
}

#[tokio::test]
async fn test_oversized_inventory_is_rejected() {
    let app = app();
    let category = create_category(&app, "Shirts").await;

    let (status, body) = send(
        &app,
        "POST",
        "/products",
        Some(product_body(
            "Bulk Tee",
            &category,
            9.0,
            json!([{ "sku": "BULK-1", "price": 9.0, "inventory": i64::MAX }]),
        )),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "variants[0].inventory");
    assert_eq!(body["errors"][0]["message"], "Inventory cannot exceed 1000000000");

    let (status, body) = send(&app, "GET", "/products/reports/inventory-summary", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalInventory"], 0);
}

#[tokio::test]
async fn test_product_requires_existing_category() {
    let app = app();
    let missing = "665f1c2e8b3e4a0012a4b7c1";

    let (status, body) = send(
        &app,
        "POST",
        "/products",
        Some(product_body("Tee", missing, 10.0, json!([]))),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Category not found");
}

#[tokio::test]
async fn test_duplicate_sku_across_products_conflicts() {
    let app = app();
    let category = create_category(&app, "Shirts").await;
    create_product(
        &app,
        product_body("Tee", &category, 10.0, json!([{ "sku": "SKU-1", "price": 10 }])),
    )
    .await;

    let (status, body) = send(
        &app,
        "POST",
        "/products",
        Some(product_body("Polo", &category, 20.0, json!([{ "sku": "SKU-1", "price": 20 }]))),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Duplicate variants.sku: SKU-1");
}

#[tokio::test]
async fn test_invalid_and_unknown_ids() {
    let app = app();

    let (status, body) = send(&app, "GET", "/products/not-an-id", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "id");
    assert_eq!(body["errors"][0]["message"], "Invalid ID format");
    assert_eq!(body["errors"][0]["location"], "params");

    let (status, body) = send(&app, "GET", "/products/665f1c2e8b3e4a0012a4b7c1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Product not found");

    let (status, body) = send(&app, "DELETE", "/categories/665f1c2e8b3e4a0012a4b7c1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Category not found");
}

#[tokio::test]
async fn test_list_paginates_and_filters() {
    let app = app();
    let shirts = create_category(&app, "Shirts").await;
    let hats = create_category(&app, "Hats").await;

    for i in 0..12 {
        create_product(
            &app,
            product_body(
                &format!("Shirt {i:02}"),
                &shirts,
                10.0 + i as f64,
                json!([{ "sku": format!("SH-{i}"), "price": 10, "inventory": i % 2 }]),
            ),
        )
        .await;
    }
    create_product(&app, product_body("Cap", &hats, 5.0, json!([]))).await;

    let (status, body) = send(&app, "GET", "/products?page=2&limit=5&sortBy=name&order=asc", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Products retrieved successfully");
    assert_eq!(body["data"].as_array().unwrap().len(), 5);
    assert_eq!(body["data"][0]["name"], "Shirt 04");
    assert_eq!(body["data"][0]["category"], shirts.as_str());
    assert_eq!(body["data"][0]["categoryName"], "Shirts");
    assert_eq!(
        body["meta"]["pagination"],
        json!({
            "currentPage": 2,
            "totalPages": 3,
            "totalItems": 13,
            "itemsPerPage": 5,
            "hasNextPage": true,
            "hasPrevPage": true,
            "nextPage": 3,
            "prevPage": 1
        })
    );

    let uri = format!("/products?category={shirts}&inStock=true&minPrice=15&maxPrice=21");
    let (_, body) = send(&app, "GET", &uri, None).await;
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Shirt 11", "Shirt 09", "Shirt 07", "Shirt 05"]);

    let (_, body) = send(&app, "GET", "/products?page=9", None).await;
    assert_eq!(body["data"], json!([]));
    assert_eq!(body["meta"]["pagination"]["totalItems"], 13);
    assert_eq!(body["meta"]["pagination"]["hasNextPage"], false);
}

#[tokio::test]
async fn test_list_rejects_bad_query_parameters() {
    let app = app();

    let (status, body) = send(&app, "GET", "/products?limit=500&page=0&sortBy=sku", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["sortBy", "page", "limit"]);
    assert_eq!(body["errors"][2]["message"], "Limit must be between 1 and 100");
    assert_eq!(body["errors"][2]["location"], "query");
}

#[tokio::test]
async fn test_unreachable_page_is_rejected() {
    let app = app();

    for uri in [
        "/products?page=18446744073709551615&limit=100",
        "/categories?page=18446744073709551615&limit=100",
    ] {
        let (status, body) = send(&app, "GET", uri, None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["errors"][0]["field"], "page");
        assert_eq!(body["errors"][0]["message"], "Page is out of range");
        assert_eq!(body["errors"][0]["value"], "18446744073709551615");
    }
}

#[tokio::test]
async fn test_update_product_keeps_omitted_collections() {
    let app = app();
    let category = create_category(&app, "Shirts").await;
    let product = create_product(
        &app,
        product_body("Tee", &category, 10.0, json!([{ "sku": "TEE-1", "price": 10, "inventory": 3 }])),
    )
    .await;
    let id = product["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/products/{id}"),
        Some(json!({
            "name": "Tee v2",
            "description": "Heavier cotton",
            "category": category,
            "basePrice": 12.5,
            "isActive": false
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Product updated successfully");
    assert_eq!(body["data"]["name"], "Tee v2");
    assert_eq!(body["data"]["variants"][0]["sku"], "TEE-1");
    assert_eq!(body["data"]["tags"], json!(["cotton"]));
    assert_eq!(body["data"]["isActive"], false);
    assert_eq!(body["data"]["createdAt"], product["createdAt"]);

    // Inactive products drop out of listings but stay addressable by id
    let (_, list) = send(&app, "GET", "/products", None).await;
    assert_eq!(list["data"], json!([]));
    let (status, _) = send(&app, "GET", &format!("/products/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_category_lifecycle() {
    let app = app();
    let category = create_category(&app, "Shirts").await;

    let (status, body) = send(&app, "POST", "/categories", Some(json!({ "name": "Shirts" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Duplicate name: Shirts");

    let product = create_product(&app, product_body("Tee", &category, 10.0, json!([]))).await;

    let uri = format!("/categories/{category}");
    let (status, body) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Cannot delete category with existing products");

    let product_uri = format!("/products/{}", product["id"].as_str().unwrap());
    let (status, body) = send(&app, "DELETE", &product_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Product deleted successfully");

    let (status, body) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Category deleted successfully");

    let (status, _) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_category_list_and_update() {
    let app = app();
    create_category(&app, "Outerwear").await;
    let shoes = create_category(&app, "Shoes").await;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/categories/{shoes}"),
        Some(json!({ "name": "Footwear", "description": "Shoes and boots" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Footwear");
    assert_eq!(body["data"]["isActive"], true);

    let (_, body) = send(&app, "GET", "/categories", None).await;
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Footwear", "Outerwear"]);

    let (_, body) = send(&app, "GET", "/categories?search=BOOT", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["meta"]["pagination"]["totalItems"], 1);
}

#[tokio::test]
async fn test_reports() {
    let app = app();
    let shirts = create_category(&app, "Shirts").await;
    let hats = create_category(&app, "Hats").await;

    create_product(
        &app,
        product_body(
            "Tee",
            &shirts,
            20.0,
            json!([
                { "sku": "T-1", "price": 10.0, "inventory": 0 },
                { "sku": "T-2", "price": 20.0, "inventory": 5 },
                { "sku": "T-3", "price": 30.0, "inventory": 15 }
            ]),
        ),
    )
    .await;
    create_product(
        &app,
        product_body("Cap", &hats, 8.0, json!([{ "sku": "C-1", "price": 12.5, "inventory": 100 }])),
    )
    .await;
    create_product(&app, product_body("Beanie", &hats, 9.0, json!([]))).await;

    let (status, body) = send(&app, "GET", "/products/reports/inventory-summary", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"],
        json!({
            "totalProducts": 2,
            "totalVariants": 4,
            "totalInventory": 120,
            "averagePrice": 18.13,
            "lowStockCount": 2,
            "outOfStockCount": 1
        })
    );

    let (_, body) = send(&app, "GET", "/products/reports/low-stock?threshold=5", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["name"], "Tee");
    assert_eq!(body["data"][0]["categoryName"], "Shirts");

    let (_, body) = send(&app, "GET", "/products/reports/low-stock?threshold=-1", None).await;
    assert_eq!(body["success"], false);

    let (_, body) = send(&app, "GET", "/products/reports/by-category", None).await;
    assert_eq!(body["data"][0]["categoryName"], "Hats");
    assert_eq!(body["data"][0]["productCount"], 2);
    assert_eq!(body["data"][0]["averagePrice"], 8.5);
    assert_eq!(body["data"][1]["categoryName"], "Shirts");
    assert_eq!(body["data"][1]["totalInventory"], 20);
}

#[tokio::test]
async fn test_empty_catalog_summary_is_zero() {
    let app = app();

    let (status, body) = send(&app, "GET", "/products/reports/inventory-summary", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalProducts"], 0);
    assert_eq!(body["data"]["averagePrice"], 0.0);
    assert_eq!(body["data"]["outOfStockCount"], 0);
}
