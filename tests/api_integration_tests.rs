//! End-to-end tests driving the router over an in-memory database.

mod test_utils;

use axum::http::{StatusCode, header::LOCATION};
use serde_json::{Value, json};
use test_utils::{ALICE_TOKEN, BOB_TOKEN, get, post, send, test_app};

async fn create_greenhouse(app: &axum::Router, token: &str) -> String {
    let (status, body) = post(
        app,
        "/controllers",
        token,
        json!({"name": "Greenhouse", "location": "Backyard"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["controller_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn greenhouse_scenario() {
    let app = test_app().await.unwrap();

    let (status, response, body) = send(
        &app,
        "POST",
        "/controllers",
        Some(ALICE_TOKEN),
        Some(json!({"name": "Greenhouse", "location": "Backyard"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let cid = body["controller_id"].as_str().unwrap().to_string();
    assert_eq!(cid.len(), 40);
    assert_eq!(
        response.headers().get(LOCATION).unwrap(),
        &format!("/controllers/{}", cid)
    );
    assert_eq!(body["nodes"], format!("/controllers/{}/nodes", cid));

    let nodes = format!("/controllers/{}/nodes", cid);
    let (status, node) = post(&app, &nodes, ALICE_TOKEN, json!({"node_id": 1})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(node["name"], "New Node #1");

    let sensors = format!("{}/1/sensors", nodes);
    let (status, sensor) = post(
        &app,
        &sensors,
        ALICE_TOKEN,
        json!({"sensor_id": 1, "sensor_type": "temp"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let name = sensor["name"].as_str().unwrap();
    assert!(name.contains("temp"));
    assert!(name.contains("Greenhouse (Backyard)"));
    assert_eq!(sensor["latest_data"], Value::Null);

    let (status, reading) = post(
        &app,
        "/data",
        ALICE_TOKEN,
        json!({"controller_id": cid, "node_id": 1, "sensor_id": 1, "payload": "21.5"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reading["payload"], "21.5");

    let (status, sensor) = get(&app, &format!("{}/1", sensors), ALICE_TOKEN).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sensor["latest_data"], "21.5");
    assert!(sensor["last_update"].is_string());

    let (status, readings) = get(&app, &format!("{}/1/data", sensors), ALICE_TOKEN).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(readings.as_array().unwrap().len(), 1);

    let (_, types) = get(&app, &format!("/sensor-types/{}", cid), ALICE_TOKEN).await;
    assert_eq!(types, json!(["temp"]));

    let (_, by_type) = get(&app, "/sensor-types-global/temp", ALICE_TOKEN).await;
    assert_eq!(by_type.as_array().unwrap().len(), 1);
    assert_eq!(by_type[0]["controller_id"], cid.as_str());

    let (_, all) = get(&app, "/data", ALICE_TOKEN).await;
    assert_eq!(all.as_array().unwrap().len(), 1);
    assert_eq!(all[0]["sensor_id"], 1);

    let (_, controllers) = get(&app, "/controllers", ALICE_TOKEN).await;
    assert_eq!(controllers.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn other_users_get_not_found_everywhere() {
    let app = test_app().await.unwrap();
    let cid = create_greenhouse(&app, ALICE_TOKEN).await;
    let nodes = format!("/controllers/{}/nodes", cid);
    post(&app, &nodes, ALICE_TOKEN, json!({"node_id": 1})).await;
    post(
        &app,
        &format!("{}/1/sensors", nodes),
        ALICE_TOKEN,
        json!({"sensor_id": 1, "sensor_type": "temp"}),
    )
    .await;

    for uri in [
        format!("/controllers/{}", cid),
        nodes.clone(),
        format!("{}/1", nodes),
        format!("{}/1/sensors/1", nodes),
        format!("{}/1/sensors/1/data", nodes),
        format!("/sensor-types/{}", cid),
    ] {
        let (status, body) = get(&app, &uri, BOB_TOKEN).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["code"], "NOT_FOUND");
    }

    let (status, _) = post(
        &app,
        "/data",
        BOB_TOKEN,
        json!({"controller_id": cid, "node_id": 1, "sensor_id": 1, "payload": "1"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, all) = get(&app, "/data", BOB_TOKEN).await;
    assert_eq!(all, json!([]));
    let (_, by_type) = get(&app, "/sensor-types-global/temp", BOB_TOKEN).await;
    assert_eq!(by_type, json!([]));
    let (_, controllers) = get(&app, "/controllers", BOB_TOKEN).await;
    assert_eq!(controllers, json!([]));
}

#[tokio::test]
async fn duplicates_conflict() {
    let app = test_app().await.unwrap();
    let cid = create_greenhouse(&app, ALICE_TOKEN).await;

    let (status, body) = post(
        &app,
        "/controllers",
        ALICE_TOKEN,
        json!({"name": "Greenhouse", "location": "Elsewhere"}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    // Another user may reuse the name.
    create_greenhouse(&app, BOB_TOKEN).await;

    let nodes = format!("/controllers/{}/nodes", cid);
    post(&app, &nodes, ALICE_TOKEN, json!({"node_id": 1})).await;
    let (status, _) = post(&app, &nodes, ALICE_TOKEN, json!({"node_id": 1})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let sensors = format!("{}/1/sensors", nodes);
    post(
        &app,
        &sensors,
        ALICE_TOKEN,
        json!({"sensor_id": 1, "sensor_type": "temp"}),
    )
    .await;
    let (status, _) = post(
        &app,
        &sensors,
        ALICE_TOKEN,
        json!({"sensor_id": 1, "sensor_type": "humidity"}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn invalid_input_is_a_validation_failure() {
    let app = test_app().await.unwrap();

    let (status, body) = post(
        &app,
        "/controllers",
        ALICE_TOKEN,
        json!({"name": "  ", "location": "Backyard"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
    assert_eq!(body["details"]["name"], "must not be blank");

    let (status, body) = post(&app, "/controllers", ALICE_TOKEN, json!({"name": "x"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["location"], "is required");

    let cid = create_greenhouse(&app, ALICE_TOKEN).await;
    let nodes = format!("/controllers/{}/nodes", cid);

    let (status, _) = post(&app, &nodes, ALICE_TOKEN, json!({"node_id": "one"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get(&app, &format!("{}/abc", nodes), ALICE_TOKEN).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");

    post(&app, &nodes, ALICE_TOKEN, json!({"node_id": 1})).await;
    let sensors = format!("{}/1/sensors", nodes);
    post(
        &app,
        &sensors,
        ALICE_TOKEN,
        json!({"sensor_id": 1, "sensor_type": "temp"}),
    )
    .await;

    let (status, body) = post(
        &app,
        "/data",
        ALICE_TOKEN,
        json!({"controller_id": cid, "node_id": 1, "sensor_id": 1, "payload": ""}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["payload"], "must not be blank");

    let (status, _) = get(&app, &format!("{}/1/data/200/100", sensors), ALICE_TOKEN).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn range_endpoint_covers_the_end_day() {
    let app = test_app().await.unwrap();
    let cid = create_greenhouse(&app, ALICE_TOKEN).await;
    let nodes = format!("/controllers/{}/nodes", cid);
    post(&app, &nodes, ALICE_TOKEN, json!({"node_id": 1})).await;
    post(
        &app,
        &format!("{}/1/sensors", nodes),
        ALICE_TOKEN,
        json!({"sensor_id": 1, "sensor_type": "temp"}),
    )
    .await;
    post(
        &app,
        "/data",
        ALICE_TOKEN,
        json!({"controller_id": cid, "node_id": 1, "sensor_id": 1, "payload": "now"}),
    )
    .await;

    let today = chrono::Utc::now().timestamp() / 86_400 * 86_400;
    let data = format!("{}/1/sensors/1/data", nodes);

    let (status, readings) = get(
        &app,
        &format!("{}/{}/{}", data, today - 86_400, today),
        ALICE_TOKEN,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(readings.as_array().unwrap().len(), 1);

    let (_, readings) = get(
        &app,
        &format!("{}/{}/{}", data, today - 3 * 86_400, today - 86_400),
        ALICE_TOKEN,
    )
    .await;
    assert_eq!(readings, json!([]));
}

#[tokio::test]
async fn protected_routes_require_a_known_token() {
    let app = test_app().await.unwrap();

    let (status, _, body) = send(&app, "GET", "/controllers", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = get(&app, "/data", "nobody").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = send(&app, "GET", "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, body) = send(&app, "GET", "/healthz", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn responses_carry_a_trace_id() {
    let app = test_app().await.unwrap();

    let (_, response, body) = send(&app, "GET", "/controllers", None, None).await;
    let header = response
        .headers()
        .get("x-trace-id")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    assert_eq!(body["trace_id"], header.as_str());
}

#[tokio::test]
async fn users_may_reuse_each_others_controller_ids() {
    let app = test_app().await.unwrap();

    let (status, _) = post(
        &app,
        "/controllers",
        ALICE_TOKEN,
        json!({"name": "Greenhouse", "location": "Backyard", "controller_id": "gateway-01"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = post(
        &app,
        "/controllers",
        BOB_TOKEN,
        json!({"name": "Shed", "location": "Garden", "controller_id": "gateway-01"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let (_, alices) = get(&app, "/controllers/gateway-01", ALICE_TOKEN).await;
    let (_, bobs) = get(&app, "/controllers/gateway-01", BOB_TOKEN).await;
    assert_eq!(alices["name"], "Greenhouse");
    assert_eq!(bobs["name"], "Shed");

    let (status, _) = post(
        &app,
        "/controllers",
        BOB_TOKEN,
        json!({"name": "Barn", "location": "Field", "controller_id": "gateway-01"}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}
