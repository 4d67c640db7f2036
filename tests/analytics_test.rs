use chrono::NaiveDate;
use rust_decimal::Decimal;

use flatmart::analytics::{average_order_value, compute_analytics, RatingLeader};
use flatmart::model::{round_currency, Order, OrderLine, OrderStatus, Product, Rating};

fn dec(value: &str) -> Decimal {
    value.parse().unwrap()
}

fn order(id: &str, total: &str, lines: &[(&str, u32)]) -> Order {
    Order {
        order_id: id.to_string(),
        username: "alice".to_string(),
        order_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        total_price: dec(total),
        status: OrderStatus::Pending,
        address: "1 Palm St".to_string(),
        products: lines
            .iter()
            .map(|(product_id, quantity)| OrderLine {
                product_id: product_id.to_string(),
                quantity: *quantity,
            })
            .collect(),
    }
}

fn product(id: &str, price: &str) -> Product {
    Product {
        id: id.to_string(),
        name: format!("Product {id}"),
        price: dec(price),
        quantity: 10,
        description: String::new(),
    }
}

fn rating(username: &str, product_id: &str, score: i64) -> Rating {
    Rating {
        username: username.to_string(),
        product_id: product_id.to_string(),
        product_name: format!("Product {product_id}"),
        rating: score,
    }
}

#[test]
fn test_average_order_value() {
    let orders = vec![
        order("201-0001", "100", &[("101-001", 1)]),
        order("201-0002", "300", &[("101-001", 3)]),
    ];

    assert_eq!(average_order_value(&orders), Some(dec("200.00")));
    assert_eq!(average_order_value(&[]), None);
}

#[test]
fn test_average_order_value_rounds_half_away_from_zero() {
    let orders = vec![
        order("201-0001", "0.01", &[("101-001", 1)]),
        order("201-0002", "0.02", &[("101-001", 1)]),
    ];

    // 0.015 rounds up, not to even
    assert_eq!(average_order_value(&orders), Some(dec("0.02")));
    assert_eq!(round_currency(dec("2.345")), dec("2.35"));
    assert_eq!(round_currency(dec("-2.345")), dec("-2.35"));
}

#[test]
fn test_empty_store_has_no_leaders() {
    let report = compute_analytics(&[], &[product("101-001", "10")], &[]);

    assert_eq!(report.order_count, 0);
    assert_eq!(report.total_revenue, Decimal::ZERO);
    assert!(report.most_ordered_product.is_none());
    assert!(report.highest_total_price_order.is_none());
    assert!(report.aov.is_none());
    assert!(report.sales_by_category.is_empty());
    assert_eq!(report.best_rated_product, RatingLeader::NoData);
    assert_eq!(report.worst_rated_product, RatingLeader::NoData);
}

#[test]
fn test_most_and_least_ordered_products() {
    let products = vec![
        product("101-001", "10"),
        product("102-001", "20"),
        product("103-001", "5"),
    ];
    let orders = vec![
        order("201-0001", "30", &[("101-001", 1), ("102-001", 1)]),
        order("201-0002", "50", &[("101-001", 1), ("103-001", 8)]),
        order("201-0003", "10", &[("101-001", 1)]),
    ];

    let report = compute_analytics(&orders, &products, &[]);

    let most = report.most_ordered_product.unwrap();
    assert_eq!(most.product_id, "101-001");
    assert_eq!(most.order_count, 3);
    // 102-001 and 103-001 both appear once; the first seen wins
    assert_eq!(report.least_ordered_product.unwrap().product_id, "102-001");
    assert_eq!(report.most_quantity_ordered_product.unwrap().product_id, "103-001");
    assert_eq!(report.least_quantity_ordered_product.unwrap().product_id, "102-001");
    assert_eq!(report.highest_total_price_order.unwrap().order_id, "201-0002");
    assert_eq!(report.lowest_total_price_order.unwrap().order_id, "201-0003");
    assert_eq!(report.total_revenue, dec("90"));
}

#[test]
fn test_tied_order_totals_go_to_first_order() {
    let products = vec![product("101-001", "10")];
    let orders = vec![
        order("201-0001", "10", &[("101-001", 1)]),
        order("201-0002", "10", &[("101-001", 1)]),
    ];

    let report = compute_analytics(&orders, &products, &[]);

    assert_eq!(report.highest_total_price_order.unwrap().order_id, "201-0001");
    assert_eq!(report.lowest_total_price_order.unwrap().order_id, "201-0001");
}

#[test]
fn test_sales_by_category_uses_catalogue_prices() {
    let products = vec![
        product("101-001", "10.50"),
        product("101-002", "3.333"),
        product("102-001", "20"),
    ];
    let orders = vec![
        order("201-0001", "999", &[("101-001", 2), ("102-001", 1)]),
        order("201-0002", "999", &[("101-002", 3), ("109-404", 4)]),
    ];

    let report = compute_analytics(&orders, &products, &[]);

    assert_eq!(report.sales_by_category.len(), 2);
    let men = &report.sales_by_category[0];
    assert_eq!(men.category, "101");
    assert_eq!(men.label, Some("Men"));
    assert_eq!(men.total_quantity, 5);
    // 21.00 + round(9.999) = 31.00
    assert_eq!(men.total_sales, dec("31.00"));
    let women = &report.sales_by_category[1];
    assert_eq!(women.category, "102");
    assert_eq!(women.total_sales, dec("20"));
}

#[test]
fn test_orders_for_deleted_products_are_skipped_in_stats() {
    let products = vec![product("101-001", "10")];
    let orders = vec![order("201-0001", "40", &[("109-404", 4)])];

    let report = compute_analytics(&orders, &products, &[]);

    assert_eq!(report.order_count, 1);
    assert!(report.most_ordered_product.is_none());
    assert_eq!(report.aov, Some(dec("40")));
}

#[test]
fn test_rating_leaders() {
    let ratings = vec![
        rating("alice", "101-001", 4),
        rating("bob", "101-001", 5),
        rating("alice", "102-001", 2),
        rating("alice", "103-001", 5),
        rating("bob", "103-001", 4),
    ];

    let report = compute_analytics(&[], &[], &ratings);

    match report.best_rated_product {
        RatingLeader::Rated(best) => {
            assert_eq!(best.product_id, "101-001");
            assert_eq!(best.average_rating, dec("4.5"));
            assert_eq!(best.rating_count, 2);
        }
        RatingLeader::NoData => panic!("expected a best rated product"),
    }
    match report.worst_rated_product {
        RatingLeader::Rated(worst) => assert_eq!(worst.product_id, "102-001"),
        RatingLeader::NoData => panic!("expected a worst rated product"),
    }
}

#[test]
fn test_huge_totals_saturate_instead_of_panicking() {
    let max = Decimal::MAX.to_string();
    let products = vec![product("101-001", &max)];
    let orders = vec![
        order("201-0001", &max, &[("101-001", 2)]),
        order("201-0002", &max, &[("101-001", 1)]),
    ];

    let report = compute_analytics(&orders, &products, &[]);

    assert_eq!(report.total_revenue, Decimal::MAX);
    assert_eq!(report.sales_by_category[0].total_sales, Decimal::MAX);
    assert!(report.aov.is_some());
}
