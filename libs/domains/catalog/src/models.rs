use std::collections::HashMap;

use chrono::{DateTime, SubsecRound, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Serializes an [`ObjectId`] as its 24-character hex string
pub mod object_id_hex {
    use mongodb::bson::oid::ObjectId;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(id: &ObjectId, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&id.to_hex())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ObjectId, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ObjectId::parse_str(&raw).map_err(D::Error::custom)
    }
}

/// Current time at the millisecond precision the database keeps
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

fn trimmed<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(String::deserialize(deserializer)?.trim().to_string())
}

fn trimmed_opt<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.map(|s| s.trim().to_string()))
}

fn trimmed_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<String>>, D::Error> {
    Ok(Option::<Vec<String>>::deserialize(deserializer)?
        .map(|list| list.into_iter().map(|s| s.trim().to_string()).collect()))
}

fn rejected(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

fn validate_object_id(value: &str) -> Result<(), ValidationError> {
    if ObjectId::parse_str(value).is_err() {
        let mut error = rejected("object_id", "Valid category ID required");
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}

fn validate_sku(sku: &str) -> Result<(), ValidationError> {
    let message = match sku.chars().count() {
        0 => "SKU is required for variants",
        1..=50 => return Ok(()),
        _ => "SKU must be 1-50 characters",
    };
    let mut error = rejected("sku", message);
    error.add_param("value".into(), &sku);
    Err(error)
}

/// Largest stock level a single variant may record
pub const MAX_INVENTORY: i64 = 1_000_000_000;

fn validate_inventory(inventory: i64) -> Result<(), ValidationError> {
    let message = match inventory {
        i64::MIN..0 => "Inventory must be non-negative",
        0..=MAX_INVENTORY => return Ok(()),
        _ => "Inventory cannot exceed 1000000000",
    };
    let mut error = rejected("inventory", message);
    error.add_param("value".into(), &inventory);
    Err(error)
}

fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    match tags.iter().find(|t| !(1..=30).contains(&t.chars().count())) {
        Some(tag) => {
            let mut error = rejected("tag_length", "Each tag must be 1-30 characters");
            error.add_param("value".into(), tag);
            Err(error)
        }
        None => Ok(()),
    }
}

/// Rejects a payload that repeats a SKU across its own variants.
///
/// The store enforces uniqueness across products; this catches the case a
/// multikey unique index lets through.
fn validate_unique_skus(input: &ProductInput) -> Result<(), ValidationError> {
    let Some(variants) = &input.variants else {
        return Ok(());
    };

    let mut seen = HashMap::new();
    for (index, variant) in variants.iter().enumerate() {
        if variant.sku.is_empty() {
            continue;
        }
        if seen.insert(variant.sku.as_str(), index).is_some() {
            let mut error = rejected("duplicate_sku", "SKU must be unique within a product");
            error.add_param("field".into(), &format!("variants[{index}].sku"));
            error.add_param("value".into(), &variant.sku);
            return Err(error);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Category entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(with = "object_id_hex")]
    #[schema(value_type = String, example = "665f1c2e8b3e4a0012a4b7c1")]
    pub id: ObjectId,
    #[schema(example = "Apparel")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating or replacing a category
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    #[schema(example = "Apparel")]
    pub name: String,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(max = 200, message = "Description cannot exceed 200 characters"))]
    pub description: Option<String>,
    /// Defaults to `true` on create; left unchanged on update when absent
    pub is_active: Option<bool>,
}

impl Category {
    pub fn new(input: CategoryInput) -> Self {
        let now = now();
        Self {
            id: ObjectId::new(),
            name: input.name,
            description: input.description,
            is_active: input.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces the editable fields; absent optional fields keep their value
    pub fn apply(&mut self, input: CategoryInput) {
        self.name = input.name;
        if let Some(description) = input.description {
            self.description = Some(description);
        }
        if let Some(is_active) = input.is_active {
            self.is_active = is_active;
        }
        self.updated_at = now();
    }
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

/// A purchasable variation of a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "M")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "red")]
    pub color: Option<String>,
    #[schema(example = "TS-RED-M")]
    pub sku: String,
    #[schema(example = 24.99)]
    pub price: f64,
    pub inventory: i64,
    /// Percentage, 0 to 100
    pub discount: f64,
}

/// Product entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(with = "object_id_hex")]
    #[schema(value_type = String, example = "665f1c2e8b3e4a0012a4b7d9")]
    pub id: ObjectId,
    #[schema(example = "Classic T-Shirt")]
    pub name: String,
    pub description: String,
    /// Id of the owning category
    #[serde(with = "object_id_hex")]
    #[schema(value_type = String, example = "665f1c2e8b3e4a0012a4b7c1")]
    pub category: ObjectId,
    #[schema(example = 19.99)]
    pub base_price: f64,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product as listed, with its category's name while that category exists
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListedProduct {
    #[serde(flatten)]
    pub product: Product,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "Apparel")]
    pub category_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VariantInput {
    #[serde(default, deserialize_with = "trimmed_opt")]
    pub size: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    pub color: Option<String>,
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(custom(function = "validate_sku"))]
    pub sku: String,
    #[validate(
        required(message = "Variant price must be positive"),
        range(min = 0.0, message = "Variant price must be positive")
    )]
    pub price: Option<f64>,
    #[serde(default)]
    #[validate(custom(function = "validate_inventory"))]
    pub inventory: i64,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 100.0, message = "Discount must be between 0 and 100%"))]
    pub discount: f64,
}

impl VariantInput {
    fn into_variant(self) -> Variant {
        Variant {
            size: self.size,
            color: self.color,
            sku: self.sku,
            price: self.price.unwrap_or_default(),
            inventory: self.inventory,
            discount: self.discount,
        }
    }
}

/// Payload for creating or replacing a product
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_unique_skus", skip_on_field_errors = false))]
pub struct ProductInput {
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    #[schema(example = "Classic T-Shirt")]
    pub name: String,
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 1000, message = "Description must be 1-1000 characters"))]
    pub description: String,
    /// Id of an existing category
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(custom(function = "validate_object_id"))]
    #[schema(example = "665f1c2e8b3e4a0012a4b7c1")]
    pub category: String,
    #[validate(
        required(message = "Base price must be a positive number"),
        range(min = 0.0, message = "Base price must be a positive number")
    )]
    #[schema(example = 19.99)]
    pub base_price: Option<f64>,
    /// Replaces all variants; kept as-is on update when absent
    #[validate(nested)]
    pub variants: Option<Vec<VariantInput>>,
    #[serde(default, deserialize_with = "trimmed_list")]
    #[validate(custom(function = "validate_tags"))]
    pub tags: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

impl ProductInput {
    /// The validated category reference.
    ///
    /// Call after validation; an unparseable id yields `None`.
    pub fn category_id(&self) -> Option<ObjectId> {
        ObjectId::parse_str(&self.category).ok()
    }
}

impl Product {
    pub fn new(input: ProductInput, category: ObjectId) -> Self {
        let now = now();
        Self {
            id: ObjectId::new(),
            name: input.name,
            description: input.description,
            category,
            base_price: input.base_price.unwrap_or_default(),
            variants: input
                .variants
                .unwrap_or_default()
                .into_iter()
                .map(VariantInput::into_variant)
                .collect(),
            tags: input.tags.unwrap_or_default(),
            is_active: input.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces the editable fields; absent collections and flags keep their value
    pub fn apply(&mut self, input: ProductInput, category: ObjectId) {
        self.name = input.name;
        self.description = input.description;
        self.category = category;
        if let Some(price) = input.base_price {
            self.base_price = price;
        }
        if let Some(variants) = input.variants {
            self.variants = variants.into_iter().map(VariantInput::into_variant).collect();
        }
        if let Some(tags) = input.tags {
            self.tags = tags;
        }
        if let Some(is_active) = input.is_active {
            self.is_active = is_active;
        }
        self.updated_at = now();
    }

    pub fn total_inventory(&self) -> i64 {
        self.variants
            .iter()
            .fold(0, |total, v| total.saturating_add(v.inventory))
    }

    pub fn in_stock(&self) -> bool {
        self.variants.iter().any(|v| v.inventory > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_helpers::{FieldLocation, field_errors};
    use serde_json::json;

    fn product_json() -> serde_json::Value {
        json!({
            "name": "  Classic T-Shirt  ",
            "description": "Soft cotton tee",
            "category": "665f1c2e8b3e4a0012a4b7c1",
            "basePrice": 19.99,
            "variants": [
                { "size": "M", "color": "red", "sku": "TS-RED-M", "price": 24.99, "inventory": 5 },
                { "size": "L", "color": "red", "sku": "TS-RED-L", "price": 24.99, "inventory": 0, "discount": 10 }
            ],
            "tags": [" cotton ", "summer"]
        })
    }

    fn errors_for(value: serde_json::Value) -> Vec<(String, String)> {
        let input: ProductInput = serde_json::from_value(value).unwrap();
        match input.validate() {
            Ok(()) => vec![],
            Err(e) => field_errors(&e, FieldLocation::Body)
                .into_iter()
                .map(|e| (e.field, e.message))
                .collect(),
        }
    }

    #[test]
    fn test_valid_product_is_trimmed_and_built() {
        let input: ProductInput = serde_json::from_value(product_json()).unwrap();
        assert!(input.validate().is_ok());

        let category = input.category_id().unwrap();
        let product = Product::new(input, category);

        assert_eq!(product.name, "Classic T-Shirt");
        assert_eq!(product.tags, vec!["cotton", "summer"]);
        assert_eq!(product.variants[0].discount, 0.0);
        assert_eq!(product.variants[1].discount, 10.0);
        assert_eq!(product.total_inventory(), 5);
        assert!(product.in_stock());
        assert!(product.is_active);
        assert_eq!(product.created_at, product.updated_at);
    }

    #[test]
    fn test_product_rules() {
        let mut body = product_json();
        body["name"] = json!("");
        body["basePrice"] = json!(-1);
        body["category"] = json!("not-an-id");
        body["variants"][0]["inventory"] = json!(-3);
        body["variants"][1]["discount"] = json!(150);
        body["tags"] = json!(["ok", "this tag is definitely longer than thirty"]);

        assert_eq!(
            errors_for(body),
            vec![
                ("basePrice".into(), "Base price must be a positive number".into()),
                ("category".into(), "Valid category ID required".into()),
                ("name".into(), "Name must be 1-100 characters".into()),
                ("tags".into(), "Each tag must be 1-30 characters".into()),
                ("variants[0].inventory".into(), "Inventory must be non-negative".into()),
                ("variants[1].discount".into(), "Discount must be between 0 and 100%".into()),
            ]
        );
    }

    #[test]
    fn test_inventory_is_capped() {
        let mut body = product_json();
        body["variants"][0]["inventory"] = json!(MAX_INVENTORY);
        assert!(errors_for(body.clone()).is_empty());

        body["variants"][0]["inventory"] = json!(i64::MAX);
        assert_eq!(
            errors_for(body),
            vec![(
                "variants[0].inventory".into(),
                "Inventory cannot exceed 1000000000".into()
            )]
        );
    }

    #[test]
    fn test_total_inventory_saturates() {
        let input: ProductInput = serde_json::from_value(product_json()).unwrap();
        let category = input.category_id().unwrap();
        let mut product = Product::new(input, category);
        for variant in &mut product.variants {
            variant.inventory = i64::MAX;
        }

        assert_eq!(product.total_inventory(), i64::MAX);
    }

    #[test]
    fn test_missing_required_fields() {
        let errors = errors_for(json!({ "variants": [{ "price": 1.0 }] }));
        let fields: Vec<_> = errors.iter().map(|(f, _)| f.as_str()).collect();

        assert_eq!(
            fields,
            vec!["basePrice", "category", "description", "name", "variants[0].sku"]
        );
        assert_eq!(errors[4].1, "SKU is required for variants");
    }

    #[test]
    fn test_duplicate_sku_in_payload() {
        let mut body = product_json();
        body["variants"][1]["sku"] = json!("TS-RED-M");

        assert_eq!(
            errors_for(body),
            vec![(
                "variants[1].sku".into(),
                "SKU must be unique within a product".into()
            )]
        );
    }

    #[test]
    fn test_update_keeps_absent_fields() {
        let input: ProductInput = serde_json::from_value(product_json()).unwrap();
        let category = input.category_id().unwrap();
        let mut product = Product::new(input, category);
        product.is_active = false;

        let update: ProductInput = serde_json::from_value(json!({
            "name": "Renamed",
            "description": "Still soft",
            "category": category.to_hex(),
            "basePrice": 21.0
        }))
        .unwrap();
        product.apply(update, category);

        assert_eq!(product.name, "Renamed");
        assert_eq!(product.base_price, 21.0);
        assert_eq!(product.variants.len(), 2);
        assert_eq!(product.tags.len(), 2);
        assert!(!product.is_active);
    }

    #[test]
    fn test_category_rules() {
        let input: CategoryInput = serde_json::from_value(json!({
            "name": "   ",
            "description": "x".repeat(201)
        }))
        .unwrap();
        let errors = field_errors(&input.validate().unwrap_err(), FieldLocation::Body);

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "description");
        assert_eq!(errors[0].message, "Description cannot exceed 200 characters");
        assert_eq!(errors[1].field, "name");
        assert_eq!(errors[1].message, "Name must be 1-50 characters");
        assert_eq!(errors[1].value, json!(""));
    }

    #[test]
    fn test_category_serializes_hex_id() {
        let category = Category::new(CategoryInput {
            name: "Apparel".into(),
            description: None,
            is_active: None,
        });
        let value = serde_json::to_value(&category).unwrap();

        assert_eq!(value["id"], json!(category.id.to_hex()));
        assert_eq!(value["isActive"], json!(true));
        assert!(value.get("description").is_none());

        let back: Category = serde_json::from_value(value).unwrap();
        assert_eq!(back, category);
    }
}
