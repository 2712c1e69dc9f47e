//! End-to-end tests for the checkout/return lifecycle.

mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use common::{response_json, send, TestApp};
use sea_orm::{ActiveModelTrait, Set};
use serde_json::json;
use tokio::task::JoinSet;
use tooltrack_api::entities::{tool_transaction, TransactionStatus};
use uuid::Uuid;

#[tokio::test]
async fn checkout_then_return_round_trip() {
    let app = TestApp::new().await;
    let crib = app.seed_work_center("Tool Crib").await;
    let line = app.seed_work_center("Assembly Line A").await;
    let employee = app.seed_employee("E-1001").await;
    let tool = app.seed_tool("T001-TORQUE", Some(crib.id)).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/tool-tracker/checkouts",
            Some(json!({
                "tool_id": tool.id,
                "employee_id": employee.id,
                "to_location_id": line.id,
                "expected_return_date": "2031-01-15",
                "notes": "night shift"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["success"], true);

    let checked_out = &body["data"]["tool"];
    assert_eq!(checked_out["status"], "checked_out");
    assert_eq!(checked_out["assigned_to_id"], employee.id.to_string());
    assert_eq!(checked_out["current_location_id"], line.id.to_string());
    assert!(checked_out["checked_out_date"].is_string());
    assert!(checked_out["due_date"]
        .as_str()
        .unwrap()
        .starts_with("2031-01-15T00:00:00"));

    let txn = &body["data"]["transaction"];
    assert_eq!(txn["status"], "checked_out");
    assert_eq!(txn["from_location_id"], crib.id.to_string());
    assert_eq!(txn["to_location_id"], line.id.to_string());
    assert_eq!(txn["notes"], "night shift");
    assert_eq!(txn["is_overdue"], false);
    let txn_id = txn["id"].as_str().unwrap().to_string();

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/tool-tracker/transactions/{}/return", txn_id),
            Some(json!({ "returned_by": employee.id })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;

    let returned = &body["data"]["tool"];
    assert_eq!(returned["status"], "available");
    assert!(returned["assigned_to_id"].is_null());
    assert!(returned["checked_out_date"].is_null());
    assert!(returned["due_date"].is_null());
    assert!(returned["last_checked_in"].is_string());
    assert_eq!(returned["current_location_id"], crib.id.to_string());

    let txn = &body["data"]["transaction"];
    assert_eq!(txn["status"], "returned");
    assert_eq!(txn["return_employee_id"], employee.id.to_string());
    assert!(txn["return_date"].is_string());
}

#[tokio::test]
async fn second_checkout_of_same_tool_conflicts() {
    let app = TestApp::new().await;
    let line = app.seed_work_center("Paint Booth").await;
    let first = app.seed_employee("E-2001").await;
    let second = app.seed_employee("E-2002").await;
    let tool = app.seed_tool("T002-GAUGE", None).await;

    let checkout = |employee_id: Uuid| {
        json!({
            "tool_id": tool.id,
            "employee_id": employee_id,
            "to_location_id": line.id
        })
    };

    let response = app
        .request(
            Method::POST,
            "/api/v1/tool-tracker/checkouts",
            Some(checkout(first.id)),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .request(
            Method::POST,
            "/api/v1/tool-tracker/checkouts",
            Some(checkout(second.id)),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = response_json(response).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("already checked out"));

    // The first borrower keeps the tool
    let tool_now = app.state.services.tools.get(tool.id).await.unwrap();
    assert_eq!(tool_now.assigned_to_id, Some(first.id));
}

#[tokio::test]
async fn concurrent_checkouts_admit_exactly_one() {
    let app = TestApp::new().await;
    let line = app.seed_work_center("Machining").await;
    let a = app.seed_employee("E-3001").await;
    let b = app.seed_employee("E-3002").await;
    let tool = app.seed_tool("T003-BORE", None).await;

    let body = |employee_id: Uuid| {
        Some(json!({
            "tool_id": tool.id,
            "employee_id": employee_id,
            "to_location_id": line.id
        }))
    };
    let (left, right) = tokio::join!(
        app.request(Method::POST, "/api/v1/tool-tracker/checkouts", body(a.id)),
        app.request(Method::POST, "/api/v1/tool-tracker/checkouts", body(b.id)),
    );

    let mut statuses = vec![left.status(), right.status()];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::CONFLICT]);

    let history = app.state.services.tools.transactions(tool.id).await.unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_checkouts_on_a_pooled_database_lose_with_conflict() {
    const TOOLS: usize = 6;
    const CONTENDERS: usize = 8;

    let app = TestApp::with_pool_size(CONTENDERS as u32).await;
    let line = app.seed_work_center("Press Shop").await;
    let mut employees = Vec::new();
    for n in 0..CONTENDERS {
        employees.push(app.seed_employee(&format!("E-35{:02}", n)).await);
    }

    for t in 0..TOOLS {
        let tool = app.seed_tool(&format!("RACE-{:04}", t), None).await;

        let mut contenders = JoinSet::new();
        for employee in &employees {
            let router = app.router();
            let body = json!({
                "tool_id": tool.id,
                "employee_id": employee.id,
                "to_location_id": line.id
            });
            contenders.spawn(async move {
                send(
                    router,
                    Method::POST,
                    "/api/v1/tool-tracker/checkouts",
                    Some(body),
                )
                .await
                .status()
            });
        }

        let mut created = 0;
        let mut conflicts = 0;
        while let Some(status) = contenders.join_next().await {
            match status.unwrap() {
                StatusCode::CREATED => created += 1,
                StatusCode::CONFLICT => conflicts += 1,
                other => panic!("tool {}: unexpected status {}", tool.serial_number, other),
            }
        }
        assert_eq!(created, 1, "tool {}", tool.serial_number);
        assert_eq!(conflicts, CONTENDERS - 1, "tool {}", tool.serial_number);

        let history = app.state.services.tools.transactions(tool.id).await.unwrap();
        assert_eq!(history.len(), 1);
        let stored = app.state.services.tools.get(tool.id).await.unwrap();
        assert_eq!(stored.assigned_to_id, Some(history[0].employee_id));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_returns_close_the_transaction_once() {
    let app = TestApp::with_pool_size(4).await;
    let crib = app.seed_work_center("Gauge Crib").await;
    let line = app.seed_work_center("Line 4").await;
    let employee = app.seed_employee("E-3600").await;
    let tool = app.seed_tool("RACE-RET1", Some(crib.id)).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/tool-tracker/checkouts",
            Some(json!({
                "tool_id": tool.id,
                "employee_id": employee.id,
                "to_location_id": line.id
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    let transaction_id = body["data"]["transaction"]["id"].as_str().unwrap().to_string();

    let mut returns = JoinSet::new();
    for _ in 0..4 {
        let router = app.router();
        let uri = format!("/api/v1/tool-tracker/transactions/{}/return", transaction_id);
        returns.spawn(async move {
            send(router, Method::POST, &uri, Some(json!({}))).await.status()
        });
    }

    let mut statuses = Vec::new();
    while let Some(status) = returns.join_next().await {
        statuses.push(status.unwrap());
    }
    statuses.sort();
    assert_eq!(
        statuses,
        vec![
            StatusCode::OK,
            StatusCode::NOT_FOUND,
            StatusCode::NOT_FOUND,
            StatusCode::NOT_FOUND
        ]
    );

    let stored = app.state.services.tools.get(tool.id).await.unwrap();
    assert_eq!(stored.current_location_id, Some(crib.id));
    assert!(stored.assigned_to_id.is_none());
}

#[tokio::test]
async fn checkout_of_tool_in_maintenance_conflicts() {
    let app = TestApp::new().await;
    let line = app.seed_work_center("Welding").await;
    let employee = app.seed_employee("E-4001").await;
    let tool = app.seed_tool("T004-WELD", None).await;

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/tools/{}", tool.id),
            Some(json!({ "status": "in_maintenance" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(
            Method::POST,
            "/api/v1/tool-tracker/checkouts",
            Some(json!({
                "tool_id": tool.id,
                "employee_id": employee.id,
                "to_location_id": line.id
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn checkout_with_unknown_references_is_not_found() {
    let app = TestApp::new().await;
    let line = app.seed_work_center("Inspection").await;
    let employee = app.seed_employee("E-5001").await;
    let tool = app.seed_tool("T005-SCOPE", None).await;

    for payload in [
        json!({ "tool_id": Uuid::new_v4(), "employee_id": employee.id, "to_location_id": line.id }),
        json!({ "tool_id": tool.id, "employee_id": Uuid::new_v4(), "to_location_id": line.id }),
        json!({ "tool_id": tool.id, "employee_id": employee.id, "to_location_id": Uuid::new_v4() }),
    ] {
        let response = app
            .request(Method::POST, "/api/v1/tool-tracker/checkouts", Some(payload))
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    // Nothing changed
    let unchanged = app.state.services.tools.get(tool.id).await.unwrap();
    assert!(unchanged.is_available());
    assert!(unchanged.assigned_to_id.is_none());
}

#[tokio::test]
async fn checkout_missing_fields_is_bad_request() {
    let app = TestApp::new().await;
    let tool = app.seed_tool("T006-DRILL", None).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/tool-tracker/checkouts",
            Some(json!({ "tool_id": tool.id })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn returning_unknown_or_returned_transaction_is_not_found() {
    let app = TestApp::new().await;
    let line = app.seed_work_center("Stamping").await;
    let employee = app.seed_employee("E-6001").await;
    let tool = app.seed_tool("T007-PRESS", None).await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/tool-tracker/transactions/{}/return", Uuid::new_v4()),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let checkout = app
        .request(
            Method::POST,
            "/api/v1/tool-tracker/checkouts",
            Some(json!({
                "tool_id": tool.id,
                "employee_id": employee.id,
                "to_location_id": line.id
            })),
        )
        .await;
    let txn_id = response_json(checkout).await["data"]["transaction"]["id"]
        .as_str()
        .unwrap()
        .to_string();
    let return_uri = format!("/api/v1/tool-tracker/transactions/{}/return", txn_id);

    let first = app.request(Method::POST, &return_uri, None).await;
    assert_eq!(first.status(), StatusCode::OK);
    let returned_at = response_json(first).await["data"]["transaction"]["return_date"].clone();

    let second = app.request(Method::POST, &return_uri, None).await;
    assert_eq!(second.status(), StatusCode::NOT_FOUND);
    let body = response_json(second).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("already been returned"));

    // The second attempt left the ledger alone
    let detail = app
        .request(
            Method::GET,
            &format!("/api/v1/tool-tracker/transactions/{}", txn_id),
            None,
        )
        .await;
    let detail = response_json(detail).await;
    assert_eq!(detail["data"]["return_date"], returned_at);
    assert_eq!(detail["data"]["tool_serial_number"], "T007-PRESS");
}

#[tokio::test]
async fn tool_can_be_checked_out_again_after_return() {
    let app = TestApp::new().await;
    let line = app.seed_work_center("Final Assembly").await;
    let employee = app.seed_employee("E-7001").await;
    let tool = app.seed_tool("T008-RIVET", None).await;
    let payload = json!({
        "tool_id": tool.id,
        "employee_id": employee.id,
        "to_location_id": line.id
    });

    for _ in 0..2 {
        let response = app
            .request(
                Method::POST,
                "/api/v1/tool-tracker/checkouts",
                Some(payload.clone()),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let txn_id = response_json(response).await["data"]["transaction"]["id"]
            .as_str()
            .unwrap()
            .to_string();
        let response = app
            .request(
                Method::POST,
                &format!("/api/v1/tool-tracker/transactions/{}/return", txn_id),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/tools/{}/transactions", tool.id),
            None,
        )
        .await;
    let body = response_json(response).await;
    let history = body["data"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|t| t["status"] == "returned"));
}

#[tokio::test]
async fn transaction_list_defaults_to_open_checkouts() {
    let app = TestApp::new().await;
    let line = app.seed_work_center("Packaging").await;
    let employee = app.seed_employee("E-8001").await;
    let kept = app.seed_tool("T009-TAPE", None).await;
    let returned = app.seed_tool("T010-KNIFE", None).await;

    let mut returned_txn = String::new();
    for tool_id in [kept.id, returned.id] {
        let response = app
            .request(
                Method::POST,
                "/api/v1/tool-tracker/checkouts",
                Some(json!({
                    "tool_id": tool_id,
                    "employee_id": employee.id,
                    "to_location_id": line.id
                })),
            )
            .await;
        returned_txn = response_json(response).await["data"]["transaction"]["id"]
            .as_str()
            .unwrap()
            .to_string();
    }
    app.request(
        Method::POST,
        &format!("/api/v1/tool-tracker/transactions/{}/return", returned_txn),
        None,
    )
    .await;

    let open = response_json(
        app.request(Method::GET, "/api/v1/tool-tracker/transactions", None)
            .await,
    )
    .await;
    assert_eq!(open["data"]["total"], 1);
    assert_eq!(open["data"]["items"][0]["tool_id"], kept.id.to_string());
    assert_eq!(open["data"]["items"][0]["days_out"], 0);

    let all = response_json(
        app.request(
            Method::GET,
            "/api/v1/tool-tracker/transactions?status=all",
            None,
        )
        .await,
    )
    .await;
    assert_eq!(all["data"]["total"], 2);

    let closed = response_json(
        app.request(
            Method::GET,
            "/api/v1/tool-tracker/transactions?status=returned",
            None,
        )
        .await,
    )
    .await;
    assert_eq!(closed["data"]["total"], 1);
    assert_eq!(closed["data"]["items"][0]["id"], returned_txn);
}

#[tokio::test]
async fn overdue_tools_lists_open_checkouts_past_their_promise() {
    let app = TestApp::new().await;
    let line = app.seed_work_center("Test Cell").await;
    let employee = app.seed_employee("E-9001").await;
    let late = app.seed_tool("T011-PROBE", None).await;
    let on_time = app.seed_tool("T012-METER", None).await;

    let yesterday = (Utc::now() - Duration::days(1)).date_naive();
    let next_week = (Utc::now() + Duration::days(7)).date_naive();
    for (tool_id, promised) in [(late.id, yesterday), (on_time.id, next_week)] {
        let response = app
            .request(
                Method::POST,
                "/api/v1/tool-tracker/checkouts",
                Some(json!({
                    "tool_id": tool_id,
                    "employee_id": employee.id,
                    "to_location_id": line.id,
                    "expected_return_date": promised
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/employees/{}/overdue-tools", employee.id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    let overdue = body["data"].as_array().unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0]["tool_id"], late.id.to_string());
    assert_eq!(overdue[0]["is_overdue"], true);
    assert_eq!(overdue[0]["tool_serial_number"], "T011-PROBE");
}

#[tokio::test]
async fn store_rejects_a_second_open_transaction_for_a_tool() {
    let app = TestApp::new().await;
    let employee = app.seed_employee("E-9101").await;
    let tool = app.seed_tool("T013-LEVEL", None).await;

    let open = || tool_transaction::ActiveModel {
        id: Set(Uuid::new_v4()),
        tool_id: Set(tool.id),
        employee_id: Set(employee.id),
        from_location_id: Set(None),
        to_location_id: Set(None),
        checkout_date: Set(Utc::now()),
        expected_return_date: Set(None),
        return_date: Set(None),
        return_employee_id: Set(None),
        status: Set(TransactionStatus::CheckedOut),
        notes: Set(String::new()),
        ..Default::default()
    };

    open().insert(app.state.db.as_ref()).await.unwrap();
    assert!(open().insert(app.state.db.as_ref()).await.is_err());
}

async fn lookup(app: &TestApp, serial: &str) -> String {
    let response = app
        .request(
            Method::POST,
            "/api/v1/tool-tracker/work-center-lookup",
            Some(json!({ "serial": serial })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    response_json(response).await["wc"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn work_center_lookup_by_serial_fragment() {
    let app = TestApp::new().await;
    let crib = app.seed_work_center("Tool Crib").await;
    app.seed_tool("ABC-123456", Some(crib.id)).await;
    app.seed_tool("XYZ-999999", None).await;

    assert_eq!(lookup(&app, "c-1234").await, "Tool Crib");
    assert_eq!(lookup(&app, "abc-1").await, "", "five characters is too short");
    assert_eq!(lookup(&app, "999999").await, "", "tool without a location");
    assert_eq!(lookup(&app, "NOPE-00000").await, "");
}
