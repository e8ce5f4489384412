use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn create_then_fetch_by_slug_and_id() {
    let app = TestApp::spawn().await;

    let created = app
        .create_place(json!({
            "name": "Тестовое место",
            "location": "Tbilisi, Georgia",
            "rating": 5,
            "review": "Quiet courtyard",
        }))
        .await;
    assert_eq!(created["slug"], "testovoe-mesto");
    assert_eq!(created["rating"], 5);
    assert_eq!(created["images"], json!([]));

    let by_slug = app.get(&routes::place("testovoe-mesto")).await;
    assert_eq!(by_slug.status, 200, "{}", by_slug.text);
    assert_eq!(by_slug.body["name"], "Тестовое место");

    let id = created["id"].as_i64().unwrap();
    let by_id = app.get(&routes::place(&id.to_string())).await;
    assert_eq!(by_id.status, 200, "{}", by_id.text);
    assert_eq!(by_id.body["slug"], "testovoe-mesto");
}

#[tokio::test]
async fn same_name_gets_distinct_slugs() {
    let app = TestApp::spawn().await;

    let mut slugs = Vec::new();
    for _ in 0..3 {
        let place = app.create_place(json!({ "name": "Sea View" })).await;
        slugs.push(place["slug"].as_str().unwrap().to_string());
    }

    assert_eq!(slugs[0], "sea-view");
    assert!(slugs[1].starts_with("sea-view-"));
    slugs.sort();
    slugs.dedup();
    assert_eq!(slugs.len(), 3);
}

#[tokio::test]
async fn blank_name_becomes_untitled() {
    let app = TestApp::spawn().await;

    let place = app.create_place(json!({ "name": "   ", "rating": 0 })).await;
    assert_eq!(place["name"], "Untitled");
    assert!(place["rating"].is_null());
    assert!(!place["slug"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn list_is_newest_first() {
    let app = TestApp::spawn().await;

    app.create_place(json!({ "name": "First" })).await;
    app.create_place(json!({ "name": "Second" })).await;

    let res = app.get(routes::PLACES).await;
    assert_eq!(res.status, 200);
    let names: Vec<&str> = res
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Second", "First"]);
}

#[tokio::test]
async fn routes_accept_missing_trailing_slash() {
    let app = TestApp::spawn().await;

    let res = app
        .post("/api/v1/places", &json!({ "name": "No Slash" }))
        .await;
    assert_eq!(res.status, 201, "{}", res.text);

    let res = app.get("/api/v1/places/no-slash").await;
    assert_eq!(res.status, 200, "{}", res.text);
}

#[tokio::test]
async fn unknown_place_is_404() {
    let app = TestApp::spawn().await;

    let res = app.get(&routes::place("nowhere")).await;
    assert_eq!(res.status, 404);
    assert_eq!(res.body["code"], "NOT_FOUND");

    let res = app.delete(&routes::place("999")).await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn dates_are_formatted_for_display() {
    let app = TestApp::spawn().await;

    let place = app
        .create_place(json!({ "name": "Summer", "dates": "01.06.2024 – 05.06.2024" }))
        .await;
    assert_eq!(place["dates"], "1–5 Jun 2024");

    let place = app
        .create_place(json!({ "name": "Someday", "dates": "sometime in spring" }))
        .await;
    assert_eq!(place["dates"], "sometime in spring");
}

#[tokio::test]
async fn invalid_payload_is_rejected() {
    let app = TestApp::spawn().await;

    let res = app
        .post(routes::PLACES, &json!({ "name": "Bad", "rating": 9 }))
        .await;
    assert_eq!(res.status, 400, "{}", res.text);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
    assert!(res.body["error"].is_string());

    let res = app
        .post(routes::PLACES, &json!({ "name": "x".repeat(300) }))
        .await;
    assert_eq!(res.status, 400);

    let res = app.get(routes::PLACES).await;
    assert_eq!(res.body, json!([]));
}

#[tokio::test]
async fn update_changes_fields_but_not_slug() {
    let app = TestApp::spawn().await;

    app.create_place(json!({
        "name": "Old Name",
        "location": "Riga",
        "dates": "01.06.2024 – 05.06.2024",
    }))
    .await;

    let res = app
        .patch(
            &routes::place("old-name"),
            &json!({ "name": "New Name", "location": null, "rating": 4 }),
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["slug"], "old-name");
    assert_eq!(res.body["name"], "New Name");
    assert!(res.body["location"].is_null());
    assert_eq!(res.body["rating"], 4);
    // Absent dates are cleared.
    assert_eq!(res.body["dates"], "");

    let res = app
        .put(&routes::place("old-name"), &json!({ "dates": "sometime" }))
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["name"], "New Name");
    assert_eq!(res.body["dates"], "sometime");
}

#[tokio::test]
async fn update_of_unknown_place_is_404() {
    let app = TestApp::spawn().await;

    let res = app
        .put(&routes::place("ghost"), &json!({ "name": "Boo" }))
        .await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn delete_place_removes_it() {
    let app = TestApp::spawn().await;

    app.create_place(json!({ "name": "Short Stay" })).await;

    let res = app.delete(&routes::place("short-stay")).await;
    assert_eq!(res.status, 204);

    let res = app.get(&routes::place("short-stay")).await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn json_body_requires_content_type() {
    let app = TestApp::spawn().await;

    let res = app
        .client
        .post(app.url(routes::PLACES))
        .body(r#"{"name":"Plain"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);
}
