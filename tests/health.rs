use storefront_api::routes::health::health_check;

#[tokio::test]
async fn health_check_reports_ok() {
    let response = health_check().await;
    assert_eq!(response.0.message, "Health check");
    assert!(response.0.data.is_some());

    let body = serde_json::to_value(&response.0).expect("serialize");
    assert_eq!(body["data"]["status"], "ok");
}
