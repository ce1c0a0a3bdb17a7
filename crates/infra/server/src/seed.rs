//! Demo data for all three analytics types.
//!
//! Rows are drawn from a fixed-seed generator, so the same anchor time
//! always yields the same dataset.

use chrono::{Duration, NaiveDateTime};
use polystat_core::error::AnalyticsResult;
use polystat_core::schema::{food_order_entity, sales_entity, subscription_entity};
use polystat_core::traits::StorageAdapter;
use polystat_core::types::Row;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::info;

use crate::config::DemoConfig;

const SEED: u64 = 0x5eed_da7a;

// ==================== Catalogues ====================

const SALES_PRODUCTS: &[(&str, &str, &str, &str)] = &[
    ("Laptop Pro", "Electronics", "North", "credit_card"),
    ("Laptop Pro", "Electronics", "South", "debit_card"),
    ("Laptop Pro", "Electronics", "East", "paypal"),
    ("Laptop Pro", "Electronics", "West", "credit_card"),
    ("Smartphone X", "Electronics", "North", "credit_card"),
    ("Smartphone X", "Electronics", "South", "debit_card"),
    ("Smartphone X", "Electronics", "East", "paypal"),
    ("Wireless Mouse", "Electronics", "North", "credit_card"),
    ("Office Chair", "Furniture", "North", "credit_card"),
    ("Office Chair", "Furniture", "South", "debit_card"),
    ("Desk Lamp", "Furniture", "East", "paypal"),
    ("Coffee Maker", "Appliances", "North", "credit_card"),
    ("Coffee Maker", "Appliances", "South", "debit_card"),
    ("Running Shoes", "Sports", "North", "credit_card"),
    ("Yoga Mat", "Sports", "South", "paypal"),
];

const FOOD_RESTAURANTS: &[(&str, &str, &str)] = &[
    ("Pizza Palace", "Italian", "Mumbai"),
    ("Pizza Palace", "Italian", "Delhi"),
    ("Burger King", "Fast Food", "Mumbai"),
    ("Burger King", "Fast Food", "Bangalore"),
    ("Spice Garden", "Indian", "Delhi"),
    ("Spice Garden", "Indian", "Mumbai"),
    ("Sushi House", "Japanese", "Bangalore"),
    ("Sushi House", "Japanese", "Delhi"),
    ("Taco Bell", "Mexican", "Mumbai"),
    ("Taco Bell", "Mexican", "Bangalore"),
    ("Curry Corner", "Indian", "Delhi"),
    ("Curry Corner", "Indian", "Mumbai"),
];

const DELIVERY_STATUSES: &[&str] = &[
    "pending",
    "preparing",
    "out_for_delivery",
    "delivered",
    "cancelled",
];

const SAAS_PLANS: &[(&str, &str, f64)] = &[
    ("Basic", "monthly", 9.99),
    ("Basic", "annual", 99.99),
    ("Pro", "monthly", 29.99),
    ("Pro", "annual", 299.99),
    ("Enterprise", "monthly", 99.99),
    ("Enterprise", "annual", 999.99),
];

const SUBSCRIPTION_STATUSES: &[&str] = &["active", "cancelled", "past_due", "trialing"];

// ==================== Generators ====================

fn pick<'a, T>(rng: &mut StdRng, items: &'a [T]) -> &'a T {
    &items[rng.gen_range(0..items.len())]
}

fn cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn customer(rng: &mut StdRng) -> String {
    format!("CUST_{}", rng.gen_range(1000..=9999))
}

fn offset(rng: &mut StdRng, base: NaiveDateTime, days: i64) -> NaiveDateTime {
    base + Duration::days(rng.gen_range(0..=days))
        + Duration::hours(rng.gen_range(0..24))
        + Duration::minutes(rng.gen_range(0..60))
}

/// Sales transactions over the year before `now`.
pub fn sales_rows(count: usize, now: NaiveDateTime) -> Vec<Row> {
    let mut rng = StdRng::seed_from_u64(SEED);
    let base = now - Duration::days(365);

    (0..count)
        .map(|i| {
            let &(product, category, region, payment) = pick(&mut rng, SALES_PRODUCTS);
            let (amount, quantity) = match product {
                p if p.contains("Laptop") => (rng.gen_range(800.0..1500.0), rng.gen_range(1..=3)),
                p if p.contains("Smartphone") => {
                    (rng.gen_range(400.0..800.0), rng.gen_range(1..=5))
                }
                p if p.contains("Chair") => (rng.gen_range(150.0..400.0), rng.gen_range(1..=2)),
                _ => (rng.gen_range(20.0..200.0), rng.gen_range(1..=10)),
            };

            Row::new()
                .with("id", (i + 1) as i64)
                .with("product_name", product)
                .with("category", category)
                .with("amount", cents(amount))
                .with("quantity", quantity as i64)
                .with("region", region)
                .with("customer_id", customer(&mut rng))
                .with("payment_method", payment)
                .with("sale_date", offset(&mut rng, base, 365))
        })
        .collect()
}

/// Food delivery orders over the half year before `now`.
pub fn food_order_rows(count: usize, now: NaiveDateTime) -> Vec<Row> {
    let mut rng = StdRng::seed_from_u64(SEED ^ 0xf00d);
    let base = now - Duration::days(180);

    (0..count)
        .map(|i| {
            let &(restaurant, cuisine, city) = pick(&mut rng, FOOD_RESTAURANTS);
            let order_amount = cents(rng.gen_range(200.0..1500.0));
            let delivery_fee = cents(rng.gen_range(20.0..50.0));
            let tip_amount = cents(rng.gen_range(0.0..=order_amount * 0.15));
            let status = *pick(&mut rng, DELIVERY_STATUSES);
            let minutes = (status == "delivered").then(|| rng.gen_range(15..=60_i64));

            Row::new()
                .with("order_id", format!("ORD_{:08X}", i + 1))
                .with("restaurant_name", restaurant)
                .with("cuisine_type", cuisine)
                .with("order_amount", order_amount)
                .with("delivery_fee", delivery_fee)
                .with("tip_amount", tip_amount)
                .with("total_amount", cents(order_amount + delivery_fee + tip_amount))
                .with("customer_id", customer(&mut rng))
                .with("city", city)
                .with("delivery_status", status)
                .with("order_date", offset(&mut rng, base, 180))
                .with("delivery_time_minutes", minutes)
        })
        .collect()
}

/// SaaS subscriptions started over the two years before `now`.
pub fn subscription_rows(count: usize, now: NaiveDateTime) -> Vec<Row> {
    let mut rng = StdRng::seed_from_u64(SEED ^ 0x5aa5);
    let base = now - Duration::days(730);

    (0..count)
        .map(|i| {
            let &(plan, plan_type, amount) = pick(&mut rng, SAAS_PLANS);
            let cycle_days = if plan_type == "monthly" { 30 } else { 365 };
            let start = base + Duration::days(rng.gen_range(0..=730));
            let end = (start + Duration::days(cycle_days)).min(now);
            let status = *pick(&mut rng, SUBSCRIPTION_STATUSES);
            let cancelled_at = (status == "cancelled")
                .then(|| start + Duration::days(rng.gen_range(1..cycle_days)));
            let mrr = if plan_type == "monthly" { amount } else { amount / 12.0 };

            Row::new()
                .with("subscription_id", format!("SUB_{:08X}", i + 1))
                .with("customer_id", customer(&mut rng))
                .with("plan_name", plan)
                .with("plan_type", plan_type)
                .with("amount", amount)
                .with("status", status)
                .with("currency", "USD")
                .with("billing_cycle_start", start)
                .with("billing_cycle_end", end)
                .with("cancelled_at", cancelled_at)
                .with("mrr", cents(mrr))
        })
        .collect()
}

/// Rows written per analytics type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub sales: usize,
    pub food_orders: usize,
    pub subscriptions: usize,
}

/// Inserts the configured amount of demo data.
pub async fn seed_all(
    storage: &dyn StorageAdapter,
    demo: &DemoConfig,
    now: NaiveDateTime,
) -> AnalyticsResult<SeedReport> {
    let sales = storage
        .insert_rows(&sales_entity(), sales_rows(demo.sales, now))
        .await?;
    let food_orders = storage
        .insert_rows(&food_order_entity(), food_order_rows(demo.food_orders, now))
        .await?;
    let subscriptions = storage
        .insert_rows(&subscription_entity(), subscription_rows(demo.subscriptions, now))
        .await?;

    let report = SeedReport {
        sales: sales.inserted,
        food_orders: food_orders.inserted,
        subscriptions: subscriptions.inserted,
    };
    info!(
        sales = report.sales,
        food_orders = report.food_orders,
        subscriptions = report.subscriptions,
        "seeded demo data"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_rows_fit_their_entities() {
        for row in sales_rows(50, now()) {
            sales_entity().validate_row(&row).unwrap();
        }
        for row in food_order_rows(50, now()) {
            food_order_entity().validate_row(&row).unwrap();
        }
        for row in subscription_rows(50, now()) {
            subscription_entity().validate_row(&row).unwrap();
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        assert_eq!(sales_rows(20, now()), sales_rows(20, now()));
        assert_eq!(subscription_rows(20, now()), subscription_rows(20, now()));
    }

    #[test]
    fn test_dates_stay_in_window() {
        let start = now() - Duration::days(181);
        for row in food_order_rows(100, now()) {
            let at = row.get("order_date").as_timestamp().unwrap();
            assert!(at >= start && at <= now() + Duration::days(1));
        }
    }

    #[test]
    fn test_delivery_time_only_when_delivered() {
        for row in food_order_rows(100, now()) {
            let delivered = row.get("delivery_status").as_text() == Some("delivered");
            assert_eq!(delivered, !row.get("delivery_time_minutes").is_null());
        }
    }
}
