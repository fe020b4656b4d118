//! Integration tests for dashboard analytics endpoints.
//!
//! These tests require a running PostgreSQL instance.
//! Set TEST_DATABASE_URL environment variable or use docker-compose.

mod common;

use axum::http::{header, Method, StatusCode};
use common::{
    application_payload, cleanup_tenant, create_application, create_test_app, create_test_pool,
    get_request, json_request, parse_response_body, response_text, run_migrations, test_config,
    token_for, unique_tenant_email,
};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_report_counts_current_window() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;

    let config = test_config();
    let tenant = unique_tenant_email();
    let token = token_for(&config, &tenant);
    let app = create_test_app(config, pool.clone());

    let approved =
        create_application(&app, &token, application_payload("Ahmed", "Khan", "Japan")).await;
    create_application(&app, &token, application_payload("Sara", "Ali", "Canada")).await;

    let response = app
        .clone()
        .oneshot(json_request(
            Method::PUT,
            &format!("/api/v1/applications/{}/status", approved["id"]),
            json!({ "status": "APPROVED" }),
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get_request("/api/v1/analytics?window=year", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let report = parse_response_body(response).await;

    assert_eq!(report["window"], "year");
    assert_eq!(report["current"]["total_applications"], 2);
    assert_eq!(report["current"]["approved_count"], 1);
    assert_eq!(report["current"]["pending_count"], 1);
    assert_eq!(report["current"]["total_revenue"], 530.0);
    assert_eq!(report["current"]["pending_revenue"], 530.0);
    assert_eq!(report["current"]["success_rate"], 50);
    assert_eq!(report["previous"]["total_applications"], 0);
    assert_eq!(report["status_breakdown"].as_array().unwrap().len(), 3);

    let cards = report["cards"].as_array().unwrap();
    assert!(!cards.is_empty());
    assert!(cards
        .iter()
        .all(|card| card["period_label"] == "vs last year"));

    cleanup_tenant(&pool, &tenant).await;
}

#[tokio::test]
async fn test_report_defaults_to_month_and_rejects_unknown_window() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;

    let config = test_config();
    let tenant = unique_tenant_email();
    let token = token_for(&config, &tenant);
    let app = create_test_app(config, pool.clone());

    let response = app
        .clone()
        .oneshot(get_request("/api/v1/analytics", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let report = parse_response_body(response).await;
    assert_eq!(report["window"], "month");
    assert_eq!(report["current"]["total_applications"], 0);
    assert_eq!(report["current"]["success_rate"], 0);

    let response = app
        .oneshot(get_request("/api/v1/analytics?window=decade", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_monthly_history_has_twelve_buckets() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;

    let config = test_config();
    let tenant = unique_tenant_email();
    let token = token_for(&config, &tenant);
    let app = create_test_app(config, pool.clone());

    create_application(&app, &token, application_payload("Omar", "Farouk", "Japan")).await;

    let response = app
        .oneshot(get_request("/api/v1/analytics/monthly", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;

    let months = body["months"].as_array().unwrap();
    assert_eq!(months.len(), 12);
    let latest = months.last().unwrap();
    assert_eq!(latest["applications"], 1);
    assert_eq!(latest["pending"], 1);
    let earlier: u64 = months[..11]
        .iter()
        .map(|m| m["applications"].as_u64().unwrap())
        .sum();
    assert_eq!(earlier, 0);

    cleanup_tenant(&pool, &tenant).await;
}

#[tokio::test]
async fn test_monthly_export_csv() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;

    let config = test_config();
    let tenant = unique_tenant_email();
    let token = token_for(&config, &tenant);
    let app = create_test_app(config, pool.clone());

    let response = app
        .oneshot(get_request("/api/v1/analytics/monthly/export", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"analytics_month.csv\""
    );

    let text = response_text(response).await;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 13);
    assert_eq!(lines[0], "month,year,applications,revenue,success_rate,pending");
}
