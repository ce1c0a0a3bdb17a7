//! Integration tests for bulk import
//!
//! This test suite covers:
//! - Importing into the memory adapter
//! - Duplicate handling on unique identifiers
//! - All-or-nothing parsing
//! - File imports

use polystat_adapter_memory::MemoryAdapter;
use polystat_core::{
    AggregationRequest, AggregationVerb, AnalyticsEngine, AnalyticsType, Measure,
};
use polystat_import::{ImportError, ImportFormat, Importer};
use std::sync::Arc;

const SUBSCRIPTIONS_CSV: &str = "\
subscription_id,customer_id,plan_name,plan_type,amount,status,billing_cycle_start,billing_cycle_end,mrr
SUB_0001,CUST_1,Pro,monthly,49.99,active,2024-01-01,2024-02-01,49.99
SUB_0002,CUST_2,Enterprise,annual,1999,active,2024-01-05,2025-01-05,166.58
SUB_0003,CUST_3,Pro,monthly,49.99,cancelled,2024-01-09,2024-02-09,0
";

fn setup() -> (Arc<MemoryAdapter>, Importer) {
    let adapter = Arc::new(MemoryAdapter::new());
    let importer = Importer::new(adapter.clone());
    (adapter, importer)
}

mod import_tests {
    use super::*;

    #[tokio::test]
    async fn test_csv_import_is_queryable() {
        let (adapter, importer) = setup();
        let report = importer
            .import(AnalyticsType::Saas, ImportFormat::Csv, SUBSCRIPTIONS_CSV.as_bytes())
            .await
            .unwrap();

        assert_eq!(report.records_imported, 3);
        assert_eq!(report.skipped_duplicates, 0);
        assert_eq!(report.message(), "Successfully imported 3 subscriptions");

        let engine = AnalyticsEngine::new(adapter);
        let request = AggregationRequest::new(AnalyticsType::Saas, AggregationVerb::Sum, "amount")
            .filter("plan_name", "Pro");
        let result = engine.aggregate(&request).await.unwrap();
        let total = result.value().and_then(|m| m.as_f64()).unwrap();
        assert!((total - 99.98).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_reimport_skips_duplicates() {
        let (adapter, importer) = setup();
        importer
            .import(AnalyticsType::Saas, ImportFormat::Csv, SUBSCRIPTIONS_CSV.as_bytes())
            .await
            .unwrap();
        let report = importer
            .import(AnalyticsType::Saas, ImportFormat::Csv, SUBSCRIPTIONS_CSV.as_bytes())
            .await
            .unwrap();

        assert_eq!(report.records_imported, 0);
        assert_eq!(report.skipped_duplicates, 3);
        assert_eq!(adapter.row_count("subscriptions").await, 3);
    }

    #[tokio::test]
    async fn test_invalid_record_writes_nothing() {
        let (adapter, importer) = setup();
        let json = r#"[
            {"product_name": "Desk", "category": "Furniture", "amount": 300, "region": "West"},
            {"product_name": "Lamp", "category": "Furniture", "region": "West"}
        ]"#;

        let err = importer
            .import(AnalyticsType::Sales, ImportFormat::Json, json.as_bytes())
            .await
            .unwrap_err();

        assert!(matches!(err, ImportError::InvalidRecord { record: 2, .. }));
        assert_eq!(err.status_code(), 400);
        assert_eq!(adapter.row_count("sales_transactions").await, 0);
    }

    #[tokio::test]
    async fn test_non_finite_amount_is_rejected() {
        let (adapter, importer) = setup();
        for amount in ["NaN", "inf", "-inf"] {
            let csv = format!(
                "product_name,category,amount,region\n\
                 A,Books,10,North\n\
                 B,Books,{amount},North\n"
            );
            let err = importer
                .import(AnalyticsType::Sales, ImportFormat::Csv, csv.as_bytes())
                .await
                .unwrap_err();

            match err {
                ImportError::InvalidRecord { record, field, reason } => {
                    assert_eq!(record, 2);
                    assert_eq!(field, "amount");
                    assert!(reason.contains("finite"), "{reason}");
                }
                other => panic!("unexpected error for {amount}: {other:?}"),
            }
        }
        assert_eq!(adapter.row_count("sales_transactions").await, 0);
    }

    #[tokio::test]
    async fn test_malformed_json_is_rejected() {
        let (_, importer) = setup();
        let err = importer
            .import(AnalyticsType::Sales, ImportFormat::Json, b"{\"not\": \"a list\"}")
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::Json(_)));
        assert_eq!(err.kind(), "invalid_json");
    }
}

mod file_tests {
    use super::*;

    #[tokio::test]
    async fn test_import_file_uses_extension() {
        let (adapter, importer) = setup();
        let path = std::env::temp_dir().join(format!(
            "polystat-import-{}.csv",
            std::process::id()
        ));
        tokio::fs::write(&path, SUBSCRIPTIONS_CSV).await.unwrap();

        let report = importer.import_file(AnalyticsType::Saas, &path).await;
        tokio::fs::remove_file(&path).await.unwrap();

        assert_eq!(report.unwrap().records_imported, 3);

        let engine = AnalyticsEngine::new(adapter);
        let request = AggregationRequest::new(AnalyticsType::Saas, AggregationVerb::Count, "mrr")
            .filter("status", "cancelled");
        let result = engine.aggregate(&request).await.unwrap();
        assert_eq!(result.value(), Some(Measure::Value(1.0)));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let (_, importer) = setup();
        let err = importer
            .import_file(AnalyticsType::Sales, "/nonexistent/polystat/sales.csv")
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::Io(_)));
    }
}
