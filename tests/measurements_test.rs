//! Calibration measurements: recording, tolerance derivation, history and export.

mod common;

use axum::http::{header, Method, StatusCode};
use common::{response_json, response_text, TestApp};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn measurement_round_trip_with_tolerance() {
    let app = TestApp::new().await;
    let lab = app.seed_work_center("Metrology Lab").await;
    let employee = app.seed_employee("E-700").await;
    let tool = app.seed_tool("MEAS-0001", None).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/measurements",
            Some(json!({
                "tool_id": tool.id,
                "employee_id": employee.id,
                "work_center_id": lab.id,
                "size_measured": "10.0049",
                "expected_size": 10.0,
                "tolerance": "0.005",
                "notes": "after regrind"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    let data = &body["data"];
    assert_eq!(data["within_tolerance"], true);
    assert_eq!(data["size_measured"], "10.0049");
    assert_eq!(data["expected_size"], "10.0000");
    assert_eq!(data["tolerance"], "0.0050");
    assert_eq!(data["variance"], "0.0049");
    assert_eq!(data["condition"], "good");
    assert_eq!(data["condition_label"], "Good");
    assert_eq!(data["work_center_name"], "Metrology Lab");
    assert_eq!(data["tool_serial_number"], "MEAS-0001");
    let id = data["id"].as_str().unwrap().to_string();

    let fetched = response_json(
        app.request(Method::GET, &format!("/api/v1/measurements/{}", id), None)
            .await,
    )
    .await;
    assert_eq!(fetched["data"]["notes"], "after regrind");

    let response = app
        .request(Method::DELETE, &format!("/api/v1/measurements/{}", id), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = app
        .request(Method::DELETE, &format!("/api/v1/measurements/{}", id), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn tolerance_is_unknown_without_expected_size() {
    let app = TestApp::new().await;
    let employee = app.seed_employee("E-701").await;
    let tool = app.seed_tool("MEAS-0002", None).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/measurements",
            Some(json!({
                "tool_id": tool.id,
                "employee_id": employee.id,
                "size_measured": 4.2,
                "condition": "needs_repair"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert!(body["data"]["within_tolerance"].is_null());
    assert!(body["data"]["variance"].is_null());
    assert!(body["data"]["work_center_name"].is_null());
    assert_eq!(body["data"]["condition_label"], "Needs Repair");
}

#[tokio::test]
async fn measurement_references_must_exist() {
    let app = TestApp::new().await;
    let employee = app.seed_employee("E-702").await;
    let tool = app.seed_tool("MEAS-0003", None).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/measurements",
            Some(json!({
                "tool_id": tool.id,
                "employee_id": Uuid::new_v4(),
                "size_measured": 1.0
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .request(
            Method::POST,
            "/api/v1/measurements",
            Some(json!({
                "tool_id": tool.id,
                "employee_id": employee.id,
                "size_measured": 1.0,
                "tolerance": -0.1
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn optional_sizes_outside_the_column_range_are_rejected() {
    let app = TestApp::new().await;
    let employee = app.seed_employee("E-705").await;
    let tool = app.seed_tool("MEAS-0007", None).await;

    for (field, value) in [("expected_size", "2500000"), ("tolerance", "1000000.5")] {
        let mut payload = json!({
            "tool_id": tool.id,
            "employee_id": employee.id,
            "size_measured": "1.0"
        });
        payload[field] = json!(value);

        let response = app
            .request(Method::POST, "/api/v1/measurements", Some(payload))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{field}");
        let body = response_json(response).await;
        assert!(body["message"].as_str().unwrap().contains(field));
    }

    let history = response_json(app.request(Method::GET, "/api/v1/measurements", None).await)
        .await;
    assert_eq!(history["data"]["total"], 0);
}

#[tokio::test]
async fn measurement_history_is_paged_and_filtered_by_tool() {
    let app = TestApp::new().await;
    let employee = app.seed_employee("E-703").await;
    let busy = app.seed_tool("MEAS-0004", None).await;
    let quiet = app.seed_tool("MEAS-0005", None).await;

    for i in 0..12 {
        app.request(
            Method::POST,
            "/api/v1/measurements",
            Some(json!({
                "tool_id": busy.id,
                "employee_id": employee.id,
                "size_measured": 5.0 + f64::from(i) / 1000.0
            })),
        )
        .await;
    }
    app.request(
        Method::POST,
        "/api/v1/measurements",
        Some(json!({
            "tool_id": quiet.id,
            "employee_id": employee.id,
            "size_measured": 7.0
        })),
    )
    .await;

    let first_page = response_json(app.request(Method::GET, "/api/v1/measurements", None).await)
        .await;
    assert_eq!(first_page["data"]["total"], 13);
    assert_eq!(first_page["data"]["limit"], 10);
    assert_eq!(first_page["data"]["items"].as_array().unwrap().len(), 10);

    let filtered = response_json(
        app.request(
            Method::GET,
            &format!("/api/v1/measurements?tool_id={}", quiet.id),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(filtered["data"]["total"], 1);
    assert_eq!(filtered["data"]["items"][0]["size_measured"], "7.0000");
}

#[tokio::test]
async fn export_is_csv_attachment() {
    let app = TestApp::new().await;
    let employee = app.seed_employee("E-704").await;
    let tool = app.seed_tool("MEAS-0006", None).await;

    app.request(
        Method::POST,
        "/api/v1/measurements",
        Some(json!({
            "tool_id": tool.id,
            "employee_id": employee.id,
            "measurement_date": "2024-03-05T08:30:00Z",
            "size_measured": 2.5,
            "condition": "fair",
            "notes": "slight wear"
        })),
    )
    .await;

    let response = app
        .request(Method::GET, "/api/v1/measurements/export", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
    assert!(response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains("attachment"));

    let csv = response_text(response).await;
    let mut lines = csv.lines();
    assert_eq!(
        lines.next().unwrap(),
        "Date,Tool,Serial Number,Employee,Work Center,Size Measured,Expected Size,Tolerance,Condition,Notes"
    );
    assert_eq!(
        lines.next().unwrap(),
        "03/05/2024,Caliper MEAS-0006,MEAS-0006,Sam Operator E-704,N/A,2.5000,N/A,N/A,Fair,slight wear"
    );
    assert!(lines.next().is_none());
}
