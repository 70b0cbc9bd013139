//! Inventory reports.
//!
//! The MongoDB backend computes raw sums and averages in aggregation
//! pipelines; the in-memory backend folds over products with the functions
//! here. Both round averages and order breakdowns through this module so the
//! two agree to the cent.

use std::cmp::Ordering;
use std::collections::HashMap;

use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Product, object_id_hex};

/// Threshold used by the low-stock report when none is given
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;

/// Inventory level at or below which the summary counts a variant as low
pub const SUMMARY_LOW_STOCK_LEVEL: i64 = 10;

/// Catalog-wide inventory totals over active products
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventorySummary {
    /// Active products with at least one variant
    pub total_products: u64,
    pub total_variants: u64,
    pub total_inventory: i64,
    /// Mean variant price, rounded to cents
    pub average_price: f64,
    /// Variants at or below 10 units
    pub low_stock_count: u64,
    /// Variants with zero units
    pub out_of_stock_count: u64,
}

/// Per-category totals over active products
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    #[serde(with = "object_id_hex")]
    #[schema(value_type = String)]
    pub category_id: ObjectId,
    pub category_name: String,
    pub product_count: u64,
    pub total_inventory: i64,
    /// Mean base price, rounded to cents
    pub average_price: f64,
}

pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn is_low_stock(product: &Product, threshold: i64) -> bool {
    product.variants.iter().any(|v| v.inventory <= threshold)
}

/// Largest product count first, then category name
pub fn sort_breakdown(rows: &mut [CategoryBreakdown]) {
    rows.sort_by(|a, b| {
        b.product_count
            .cmp(&a.product_count)
            .then_with(|| a.category_name.cmp(&b.category_name))
    });
}

pub fn inventory_summary<'a>(products: impl IntoIterator<Item = &'a Product>) -> InventorySummary {
    let mut summary = InventorySummary::default();
    let mut price_total = 0.0;

    for product in products.into_iter().filter(|p| p.is_active) {
        if product.variants.is_empty() {
            continue;
        }
        summary.total_products += 1;
        for variant in &product.variants {
            summary.total_variants += 1;
            summary.total_inventory = summary.total_inventory.saturating_add(variant.inventory);
            price_total += variant.price;
            if variant.inventory <= SUMMARY_LOW_STOCK_LEVEL {
                summary.low_stock_count += 1;
            }
            if variant.inventory == 0 {
                summary.out_of_stock_count += 1;
            }
        }
    }

    if summary.total_variants > 0 {
        summary.average_price = round_to_cents(price_total / summary.total_variants as f64);
    }
    summary
}

/// Groups active products by category.
///
/// Products whose category no longer exists are left out.
pub fn category_breakdown<'a>(
    products: impl IntoIterator<Item = &'a Product>,
    category_names: &HashMap<ObjectId, String>,
) -> Vec<CategoryBreakdown> {
    struct Totals {
        count: u64,
        inventory: i64,
        price_total: f64,
    }

    let mut totals: HashMap<ObjectId, Totals> = HashMap::new();
    for product in products.into_iter().filter(|p| p.is_active) {
        if !category_names.contains_key(&product.category) {
            continue;
        }
        let entry = totals.entry(product.category).or_insert(Totals {
            count: 0,
            inventory: 0,
            price_total: 0.0,
        });
        entry.count += 1;
        entry.inventory = entry.inventory.saturating_add(product.total_inventory());
        entry.price_total += product.base_price;
    }

    let mut rows: Vec<_> = totals
        .into_iter()
        .filter_map(|(id, t)| {
            Some(CategoryBreakdown {
                category_id: id,
                category_name: category_names.get(&id)?.clone(),
                product_count: t.count,
                total_inventory: t.inventory,
                average_price: round_to_cents(t.price_total / t.count as f64),
            })
        })
        .collect();
    sort_breakdown(&mut rows);
    rows
}

/// Active products with any variant at or below `threshold`, by name
pub fn low_stock<'a>(
    products: impl IntoIterator<Item = &'a Product>,
    threshold: i64,
) -> Vec<Product> {
    let mut matches: Vec<Product> = products
        .into_iter()
        .filter(|p| p.is_active && is_low_stock(p, threshold))
        .cloned()
        .collect();
    matches.sort_by(|a, b| by_name_then_id(a, b));
    matches
}

fn by_name_then_id(a: &Product, b: &Product) -> Ordering {
    a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id))
}
