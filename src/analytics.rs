//! Sales analytics for the admin console
//!
//! [`compute_analytics`] is a pure function over snapshots of the orders,
//! products and ratings tables. Nothing is cached; every call recomputes
//! from scratch.
//!
//! Ties always go to the entry encountered first in file order. With no
//! orders every order-derived field is `None`, and with no ratings the
//! rating leaders are [`RatingLeader::NoData`].

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::Serialize;

use crate::model::{category_label, round_currency, Order, Product, Rating};

/// Order statistics for one catalogue product
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProductOrderStats {
    pub product_id: String,
    pub name: String,
    pub price: Decimal,
    /// Units currently in stock
    pub quantity: i64,
    /// Number of order lines naming the product
    pub order_count: u64,
    /// Units ordered across all orders
    pub total_ordered: u64,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotal {
    #[serde(rename = "orderID")]
    pub order_id: String,
    pub total_price: Decimal,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CategorySales {
    pub category: String,
    pub label: Option<&'static str>,
    pub total_quantity: u64,
    pub total_sales: Decimal,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RatedProduct {
    pub product_id: String,
    pub product_name: String,
    pub average_rating: Decimal,
    pub rating_count: u64,
}

/// Best or worst rated product, or an explicit absence of ratings
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RatingLeader {
    NoData,
    Rated(RatedProduct),
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub order_count: usize,
    pub total_revenue: Decimal,
    pub most_ordered_product: Option<ProductOrderStats>,
    pub least_ordered_product: Option<ProductOrderStats>,
    pub most_quantity_ordered_product: Option<ProductOrderStats>,
    pub least_quantity_ordered_product: Option<ProductOrderStats>,
    pub highest_total_price_order: Option<OrderTotal>,
    pub lowest_total_price_order: Option<OrderTotal>,
    /// Average order value
    pub aov: Option<Decimal>,
    /// Keyed by the product id prefix, in ascending key order
    pub sales_by_category: Vec<CategorySales>,
    pub best_rated_product: RatingLeader,
    pub worst_rated_product: RatingLeader,
}

pub fn compute_analytics(orders: &[Order], products: &[Product], ratings: &[Rating]) -> AnalyticsReport {
    let catalogue: HashMap<&str, &Product> = products
        .iter()
        .map(|product| (product.id.as_str(), product))
        .collect();

    let product_stats = product_order_stats(orders, &catalogue);
    let total_revenue = sum_totals(orders);

    AnalyticsReport {
        order_count: orders.len(),
        total_revenue: round_currency(total_revenue),
        most_ordered_product: pick(&product_stats, |a, b| a.order_count > b.order_count),
        least_ordered_product: pick(&product_stats, |a, b| a.order_count < b.order_count),
        most_quantity_ordered_product: pick(&product_stats, |a, b| a.total_ordered > b.total_ordered),
        least_quantity_ordered_product: pick(&product_stats, |a, b| a.total_ordered < b.total_ordered),
        highest_total_price_order: pick(orders, |a, b| a.total_price > b.total_price).map(order_total),
        lowest_total_price_order: pick(orders, |a, b| a.total_price < b.total_price).map(order_total),
        aov: average_order_value(orders),
        sales_by_category: sales_by_category(orders, &catalogue),
        best_rated_product: rating_leader(ratings, |a, b| a > b),
        worst_rated_product: rating_leader(ratings, |a, b| a < b),
    }
}

/// Mean order total, rounded to 2 decimals; `None` without orders
pub fn average_order_value(orders: &[Order]) -> Option<Decimal> {
    if orders.is_empty() {
        return None;
    }
    Some(round_currency(sum_totals(orders) / Decimal::from(orders.len())))
}

/// Sum of order totals, saturating at the decimal range instead of panicking
fn sum_totals(orders: &[Order]) -> Decimal {
    orders
        .iter()
        .fold(Decimal::ZERO, |total, order| total.saturating_add(order.total_price))
}

/// First element that no later element beats under `better`
fn pick<T: Clone>(items: &[T], better: impl Fn(&T, &T) -> bool) -> Option<T> {
    let mut best: Option<&T> = None;
    for item in items {
        if best.map_or(true, |current| better(item, current)) {
            best = Some(item);
        }
    }
    best.cloned()
}

fn order_total(order: Order) -> OrderTotal {
    OrderTotal {
        order_id: order.order_id,
        total_price: order.total_price,
    }
}

/// Per-product counts in order of first appearance; unknown products are skipped
fn product_order_stats(orders: &[Order], catalogue: &HashMap<&str, &Product>) -> Vec<ProductOrderStats> {
    let mut stats: Vec<ProductOrderStats> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for line in orders.iter().flat_map(|order| &order.products) {
        let Some(product) = catalogue.get(line.product_id.as_str()) else {
            continue;
        };
        let slot = *index.entry(line.product_id.as_str()).or_insert_with(|| {
            stats.push(ProductOrderStats {
                product_id: product.id.clone(),
                name: product.name.clone(),
                price: product.price,
                quantity: product.quantity,
                order_count: 0,
                total_ordered: 0,
            });
            stats.len() - 1
        });
        stats[slot].order_count += 1;
        stats[slot].total_ordered += u64::from(line.quantity);
    }

    stats
}

/// Units and revenue per category, valued at current catalogue prices
fn sales_by_category(orders: &[Order], catalogue: &HashMap<&str, &Product>) -> Vec<CategorySales> {
    let mut categories: BTreeMap<&str, (u64, Decimal)> = BTreeMap::new();

    for line in orders.iter().flat_map(|order| &order.products) {
        let Some(product) = catalogue.get(line.product_id.as_str()) else {
            continue;
        };
        let entry = categories
            .entry(product.category())
            .or_insert((0, Decimal::ZERO));
        entry.0 += u64::from(line.quantity);
        let line_sales = round_currency(product.price.saturating_mul(Decimal::from(line.quantity)));
        entry.1 = entry.1.saturating_add(line_sales);
    }

    categories
        .into_iter()
        .map(|(category, (total_quantity, total_sales))| CategorySales {
            category: category.to_string(),
            label: category_label(category),
            total_quantity,
            total_sales: round_currency(total_sales),
        })
        .collect()
}

fn rating_leader(ratings: &[Rating], better: impl Fn(Decimal, Decimal) -> bool) -> RatingLeader {
    let mut rated: Vec<(&Rating, i64, u64)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for rating in ratings {
        let slot = *index.entry(rating.product_id.as_str()).or_insert_with(|| {
            rated.push((rating, 0, 0));
            rated.len() - 1
        });
        rated[slot].1 = rated[slot].1.saturating_add(rating.rating);
        rated[slot].2 += 1;
    }

    let averages: Vec<RatedProduct> = rated
        .into_iter()
        .map(|(first, sum, count)| RatedProduct {
            product_id: first.product_id.clone(),
            product_name: first.product_name.clone(),
            average_rating: round_currency(Decimal::from(sum) / Decimal::from(count)),
            rating_count: count,
        })
        .collect();

    match pick(&averages, |a, b| better(a.average_rating, b.average_rating)) {
        Some(product) => RatingLeader::Rated(product),
        None => RatingLeader::NoData,
    }
}
