//! List queries: filters, pagination and sorting.
//!
//! Query strings arrive as raw strings (`*Params`) and are checked field by
//! field into typed queries. Every malformed parameter is reported at once;
//! out-of-range values are rejected rather than clamped. Backends translate
//! the typed filters into their own match expressions.

use axum_helpers::{FieldError, FromQueryParams};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::Deserialize;
use serde_json::Value;
use strum::{Display, EnumString, IntoStaticStr};
use utoipa::IntoParams;

use crate::reports::DEFAULT_LOW_STOCK_THRESHOLD;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;
pub const MAX_SEARCH_LENGTH: usize = 100;
/// Largest offset a page may start at; MongoDB stores skips as `i64`
pub const MAX_SKIP: u64 = i64::MAX as u64;

/// Inclusive lower and upper bound; either side may be open
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds<T> {
    pub min: Option<T>,
    pub max: Option<T>,
}

impl<T> Default for Bounds<T> {
    fn default() -> Self {
        Self {
            min: None,
            max: None,
        }
    }
}

impl<T: PartialOrd> Bounds<T> {
    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub fn contains(&self, value: &T) -> bool {
        self.min.as_ref().is_none_or(|min| value >= min)
            && self.max.as_ref().is_none_or(|max| value <= max)
    }
}

/// Conditions a listed product must meet, combined with AND.
///
/// Only active products are ever listed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    /// Full-text terms over name, description and tags
    pub search: Option<String>,
    pub category: Option<ObjectId>,
    pub price: Bounds<f64>,
    pub created: Bounds<DateTime<Utc>>,
    /// At least one variant with inventory above zero
    pub in_stock: bool,
}

/// Conditions a listed category must meet.
///
/// Only active categories are ever listed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryFilter {
    /// Case-insensitive substring of name or description
    pub search: Option<String>,
    pub created: Bounds<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based
    pub page: u64,
    pub limit: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Documents before this page, saturating at [`MAX_SKIP`]
    pub fn skip(&self) -> u64 {
        self.page
            .saturating_sub(1)
            .saturating_mul(self.limit)
            .min(MAX_SKIP)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// `1` or `-1`, as MongoDB sort documents expect
    pub fn direction(self) -> i32 {
        match self {
            SortOrder::Asc => 1,
            SortOrder::Desc => -1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "camelCase")]
pub enum ProductSortField {
    CreatedAt,
    Name,
    BasePrice,
    UpdatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "camelCase")]
pub enum CategorySortField {
    CreatedAt,
    Name,
    UpdatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort<F> {
    pub field: F,
    pub order: SortOrder,
}

impl Default for Sort<ProductSortField> {
    fn default() -> Self {
        Self {
            field: ProductSortField::CreatedAt,
            order: SortOrder::Desc,
        }
    }
}

impl Default for Sort<CategorySortField> {
    fn default() -> Self {
        Self {
            field: CategorySortField::Name,
            order: SortOrder::Asc,
        }
    }
}

/// One page of results plus the size of the whole filtered set
#[derive(Debug, Clone, PartialEq)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductQuery {
    pub filter: ProductFilter,
    pub page: PageRequest,
    pub sort: Sort<ProductSortField>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryQuery {
    pub filter: CategoryFilter,
    pub page: PageRequest,
    pub sort: Sort<CategorySortField>,
}

// ---------------------------------------------------------------------------
// Raw query strings
// ---------------------------------------------------------------------------

/// Query string accepted by `GET /products`
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductQueryParams {
    /// Full-text search, 1-100 characters
    pub search: Option<String>,
    /// Category id
    pub category: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    /// `true` keeps only products with inventory
    pub in_stock: Option<String>,
    /// ISO 8601 date or date-time, inclusive
    pub date_from: Option<String>,
    /// ISO 8601 date or date-time, inclusive
    pub date_to: Option<String>,
    /// createdAt (default), name, basePrice or updatedAt
    pub sort_by: Option<String>,
    /// asc or desc (default)
    pub order: Option<String>,
    /// Default 1
    pub page: Option<String>,
    /// 1-100, default 10
    pub limit: Option<String>,
}

/// Query string accepted by `GET /categories`
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CategoryQueryParams {
    /// Substring of name or description, 1-100 characters
    pub search: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    /// name (default), createdAt or updatedAt
    pub sort_by: Option<String>,
    /// asc (default) or desc
    pub order: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Query string accepted by the low-stock report
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LowStockParams {
    /// Inventory at or below this level counts as low, default 10
    pub threshold: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LowStockQuery {
    pub threshold: i64,
}

impl Default for LowStockQuery {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Collects every rejected parameter instead of stopping at the first
#[derive(Default)]
struct Checker {
    errors: Vec<FieldError>,
}

impl Checker {
    fn check<T>(
        &mut self,
        field: &str,
        raw: Option<String>,
        parse: impl FnOnce(&str) -> Result<T, &'static str>,
    ) -> Option<T> {
        let raw = raw?;
        match parse(&raw) {
            Ok(value) => Some(value),
            Err(message) => {
                self.errors
                    .push(FieldError::query(field, message, Value::String(raw)));
                None
            }
        }
    }

    fn finish<T>(self, value: T) -> Result<T, Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self.errors)
        }
    }
}

fn parse_page(raw: &str) -> Result<u64, &'static str> {
    match raw.trim().parse::<u64>() {
        Ok(page) if page >= 1 => Ok(page),
        _ => Err("Page must be a positive integer"),
    }
}

fn parse_limit(raw: &str) -> Result<u64, &'static str> {
    match raw.trim().parse::<u64>() {
        Ok(limit) if (1..=MAX_LIMIT).contains(&limit) => Ok(limit),
        _ => Err("Limit must be between 1 and 100"),
    }
}

fn parse_search(raw: &str) -> Result<String, &'static str> {
    let term = raw.trim();
    match term.chars().count() {
        1..=MAX_SEARCH_LENGTH => Ok(term.to_string()),
        _ => Err("Search term must be 1-100 characters"),
    }
}

fn parse_price(message: &'static str) -> impl FnOnce(&str) -> Result<f64, &'static str> {
    move |raw| match raw.trim().parse::<f64>() {
        Ok(price) if price.is_finite() && price >= 0.0 => Ok(price),
        _ => Err(message),
    }
}

fn parse_flag(raw: &str) -> Result<bool, &'static str> {
    match raw.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err("inStock must be true or false"),
    }
}

/// Accepts RFC 3339 date-times, naive date-times (read as UTC) and plain
/// dates (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    if let Ok(at) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(at.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|at| at.and_utc())
}

fn parse_date(message: &'static str) -> impl FnOnce(&str) -> Result<DateTime<Utc>, &'static str> {
    move |raw| parse_timestamp(raw).ok_or(message)
}

fn parse_object_id(raw: &str) -> Result<ObjectId, &'static str> {
    ObjectId::parse_str(raw.trim()).map_err(|_| "Valid category ID required")
}

fn parse_order(raw: &str) -> Result<SortOrder, &'static str> {
    raw.trim().parse().map_err(|_| "order must be asc or desc")
}

impl Checker {
    fn page(&mut self, page: Option<String>, limit: Option<String>) -> PageRequest {
        let defaults = PageRequest::default();
        let raw_page = page.clone();
        let request = PageRequest {
            page: self.check("page", page, parse_page).unwrap_or(defaults.page),
            limit: self.check("limit", limit, parse_limit).unwrap_or(defaults.limit),
        };

        let reachable = (request.page - 1)
            .checked_mul(request.limit)
            .is_some_and(|skip| skip <= MAX_SKIP);
        if reachable {
            return request;
        }
        self.errors.push(FieldError::query(
            "page",
            "Page is out of range",
            raw_page.map(Value::String).unwrap_or(Value::Null),
        ));
        PageRequest {
            page: defaults.page,
            ..request
        }
    }

    fn created(&mut self, from: Option<String>, to: Option<String>) -> Bounds<DateTime<Utc>> {
        Bounds {
            min: self.check("dateFrom", from, parse_date("dateFrom must be a valid ISO 8601 date")),
            max: self.check("dateTo", to, parse_date("dateTo must be a valid ISO 8601 date")),
        }
    }
}

impl FromQueryParams for ProductQuery {
    type Params = ProductQueryParams;

    fn from_query_params(params: ProductQueryParams) -> Result<Self, Vec<FieldError>> {
        let mut checker = Checker::default();
        let default_sort = Sort::<ProductSortField>::default();

        let filter = ProductFilter {
            search: checker.check("search", params.search, parse_search),
            category: checker.check("category", params.category, parse_object_id),
            price: Bounds {
                min: checker.check(
                    "minPrice",
                    params.min_price,
                    parse_price("Minimum price must be non-negative"),
                ),
                max: checker.check(
                    "maxPrice",
                    params.max_price,
                    parse_price("Maximum price must be non-negative"),
                ),
            },
            created: checker.created(params.date_from, params.date_to),
            in_stock: checker
                .check("inStock", params.in_stock, parse_flag)
                .unwrap_or(false),
        };
        let sort = Sort {
            field: checker
                .check("sortBy", params.sort_by, |raw| {
                    raw.trim()
                        .parse()
                        .map_err(|_| "sortBy must be one of: createdAt, name, basePrice, updatedAt")
                })
                .unwrap_or(default_sort.field),
            order: checker
                .check("order", params.order, parse_order)
                .unwrap_or(default_sort.order),
        };
        let page = checker.page(params.page, params.limit);

        checker.finish(ProductQuery { filter, page, sort })
    }
}

impl FromQueryParams for CategoryQuery {
    type Params = CategoryQueryParams;

    fn from_query_params(params: CategoryQueryParams) -> Result<Self, Vec<FieldError>> {
        let mut checker = Checker::default();
        let default_sort = Sort::<CategorySortField>::default();

        let filter = CategoryFilter {
            search: checker.check("search", params.search, parse_search),
            created: checker.created(params.date_from, params.date_to),
        };
        let sort = Sort {
            field: checker
                .check("sortBy", params.sort_by, |raw| {
                    raw.trim()
                        .parse()
                        .map_err(|_| "sortBy must be one of: createdAt, name, updatedAt")
                })
                .unwrap_or(default_sort.field),
            order: checker
                .check("order", params.order, parse_order)
                .unwrap_or(default_sort.order),
        };
        let page = checker.page(params.page, params.limit);

        checker.finish(CategoryQuery { filter, page, sort })
    }
}

impl FromQueryParams for LowStockQuery {
    type Params = LowStockParams;

    fn from_query_params(params: LowStockParams) -> Result<Self, Vec<FieldError>> {
        let mut checker = Checker::default();
        let threshold = checker
            .check("threshold", params.threshold, |raw| {
                match raw.trim().parse::<i64>() {
                    Ok(n) if n >= 0 => Ok(n),
                    _ => Err("Threshold must be a non-negative integer"),
                }
            })
            .unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);

        checker.finish(LowStockQuery { threshold })
    }
}
