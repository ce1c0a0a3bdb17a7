//! Integration tests for the analytics routes
//!
//! This test suite drives the router in-process and covers:
//! - Service endpoints
//! - Aggregation, chart, summary and field discovery
//! - Import through the HTTP surface
//! - Error status mapping

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use polystat_adapter_memory::MemoryAdapter;
use polystat_axum::analytics_routes;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const SALES_CSV: &str = "\
product_name,category,amount,quantity,region,customer_id,payment_method,sale_date
Laptop Pro,Electronics,1200,1,North,CUST_1,credit_card,2024-01-10 09:00:00
Smartphone X,Electronics,700,1,South,CUST_2,paypal,2024-01-20 09:00:00
Office Chair,Furniture,300,2,North,CUST_1,debit_card,2024-02-05 09:00:00
";

fn app() -> Router {
    analytics_routes(Arc::new(MemoryAdapter::new()))
}

async fn send(app: &Router, method: Method, uri: &str, body: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, "").await
}

async fn seeded_app() -> Router {
    let app = app();
    let (status, body) = send(&app, Method::POST, "/api/v1/import/sales/csv", SALES_CSV).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    app
}

mod service_tests {
    use super::*;

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get(&app(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "healthy", "service": "analytics-backend"}));
    }

    #[tokio::test]
    async fn test_root_lists_types() {
        let (status, body) = get(&app(), "/").await;
        assert_eq!(status, StatusCode::OK);
        let types = body["supported_analytics_types"].as_object().unwrap();
        assert!(types.contains_key("sales"));
        assert!(types.contains_key("food_delivery"));
        assert!(types.contains_key("saas"));
    }
}

mod query_tests {
    use super::*;

    #[tokio::test]
    async fn test_grouped_aggregate() {
        let app = seeded_app().await;
        let (status, body) = get(
            &app,
            "/api/v1/aggregate?analytics_type=sales&aggregation_type=sum&field=amount&group_by=category",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["group_by"], "category");
        assert_eq!(body["groups"][0]["group"], "Electronics");
        assert_eq!(body["groups"][0]["value"], 1900.0);
        assert_eq!(body["groups"][1]["group"], "Furniture");
        assert_eq!(body["groups"][1]["value"], 300.0);
    }

    #[tokio::test]
    async fn test_filtered_aggregate_echoes_filters() {
        let app = seeded_app().await;
        let (status, body) = get(
            &app,
            "/api/v1/aggregate?aggregation_type=count&field=amount&region=North&start_date=2024-01-01",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["analytics_type"], "sales");
        assert_eq!(body["value"], 2.0);
        assert_eq!(body["filters_applied"]["region"], "North");
        assert_eq!(body["filters_applied"]["start_date"], "2024-01-01");
    }

    #[tokio::test]
    async fn test_no_data_is_null() {
        let app = seeded_app().await;
        let (status, body) = get(
            &app,
            "/api/v1/aggregate?aggregation_type=avg&field=amount&customer_id=CUST_404",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["value"].is_null());
        assert_eq!(body["row_count"], 0);
    }

    #[tokio::test]
    async fn test_chart() {
        let app = seeded_app().await;
        let (status, body) = get(
            &app,
            "/api/v1/chart?chart_type=pie&field=amount&group_by=region",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["chart_type"], "pie");
        assert_eq!(body["metadata"]["total_points"], 2);
        assert_eq!(body["metadata"]["aggregation_type"], "sum");
        assert_eq!(body["data"][0]["label"], "North");
        assert_eq!(body["data"][0]["value"], 1500.0);
        assert_eq!(body["data"][0]["metadata"]["row_count"], 2);
    }

    #[tokio::test]
    async fn test_summary() {
        let app = seeded_app().await;
        let (status, body) = get(&app, "/api/v1/metrics/summary?analytics_type=sales").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 3);
        assert_eq!(body["total"], 2200.0);
        assert_eq!(body["primary_metric"], "amount");
        assert_eq!(body["breakdown"]["groups"][0]["group"], "Electronics");
    }

    #[tokio::test]
    async fn test_fields() {
        let (status, body) = get(&app(), "/api/v1/fields?analytics_type=saas").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["aggregatable_fields"], json!(["amount", "mrr"]));
        assert_eq!(body["date_field"], "billing_cycle_start");
    }
}

mod error_tests {
    use super::*;

    async fn assert_error(uri: &str, expected: StatusCode, kind: &str) {
        let (status, body) = get(&seeded_app().await, uri).await;
        assert_eq!(status, expected, "{uri}: {body}");
        assert_eq!(body["kind"], kind, "{uri}");
        assert_eq!(body["code"], expected.as_u16());
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_unknown_analytics_type_is_not_found() {
        assert_error(
            "/api/v1/aggregate?analytics_type=crm&aggregation_type=sum&field=amount",
            StatusCode::NOT_FOUND,
            "unknown_analytics_type",
        )
        .await;
        assert_error(
            "/api/v1/fields?analytics_type=crm",
            StatusCode::NOT_FOUND,
            "unknown_analytics_type",
        )
        .await;
    }

    #[tokio::test]
    async fn test_invalid_parameters_are_bad_requests() {
        let cases = [
            ("/api/v1/aggregate?aggregation_type=sum&field=region", "invalid_field"),
            ("/api/v1/aggregate?aggregation_type=median&field=amount", "aggregation_error"),
            ("/api/v1/aggregate?aggregation_type=sum&field=amount&plan_name=Pro", "invalid_filter_key"),
            ("/api/v1/aggregate?aggregation_type=sum&field=amount&end_date=not-a-date", "unparseable_date"),
            ("/api/v1/aggregate?aggregation_type=sum", "missing_parameter"),
            ("/api/v1/chart?field=amount", "chart_requires_grouping"),
            ("/api/v1/chart?field=amount&group_by=region&chart_type=donut", "invalid_chart_type"),
        ];
        for (uri, kind) in cases {
            assert_error(uri, StatusCode::BAD_REQUEST, kind).await;
        }
    }

    #[tokio::test]
    async fn test_import_errors() {
        let app = app();

        let (status, body) = send(&app, Method::POST, "/api/v1/import/sales/xml", "<a/>").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "unsupported_format");

        let (status, _) = send(&app, Method::POST, "/api/v1/import/crm/csv", SALES_CSV).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/import/food_delivery/json",
            r#"[{"restaurant_name": "Pizza Palace"}]"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_record");
    }

    #[tokio::test]
    async fn test_import_reports_duplicates() {
        let app = app();
        let payload = r#"[{"order_id": "ORD_1", "restaurant_name": "Pizza Palace",
            "cuisine_type": "Italian", "city": "Mumbai", "total_amount": 18.5}]"#;

        let (status, body) =
            send(&app, Method::POST, "/api/v1/import/food_delivery/json", payload).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["records_imported"], 1);

        let (_, body) =
            send(&app, Method::POST, "/api/v1/import/food_delivery/json", payload).await;
        assert_eq!(body["records_imported"], 0);
        assert_eq!(body["skipped_duplicates"], 1);
    }
}
