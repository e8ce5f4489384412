use serde_json::{Value, json};

use crate::common::{TestApp, jpeg, png, routes};

fn ids(images: &[Value]) -> Vec<i64> {
    images.iter().map(|i| i["id"].as_i64().unwrap()).collect()
}

fn orders(images: &[Value]) -> Vec<i64> {
    images.iter().map(|i| i["order"].as_i64().unwrap()).collect()
}

#[tokio::test]
async fn batch_gets_orders_by_position() {
    let app = TestApp::spawn().await;
    app.create_place(json!({ "name": "Gallery" })).await;

    let images = app
        .upload_ok(
            "gallery",
            vec![
                ("a.jpg", jpeg(40, 30)),
                ("b.png", png(20, 20)),
                ("c.JPEG", jpeg(10, 10)),
            ],
        )
        .await;
    assert_eq!(orders(&images), [0, 1, 2]);
    assert_eq!(app.stored_file_count(), 3);

    let place = app.get(&routes::place("gallery")).await;
    assert_eq!(ids(place.body["images"].as_array().unwrap()), ids(&images));
}

#[tokio::test]
async fn large_images_are_downscaled() {
    let app = TestApp::spawn().await;
    app.create_place(json!({ "name": "Panorama" })).await;

    let images = app
        .upload_ok("panorama", vec![("wide.jpg", jpeg(2400, 1000))])
        .await;
    assert_eq!(images[0]["width"], 1200);
    assert_eq!(images[0]["height"], 500);

    let images = app
        .upload_ok("panorama", vec![("small.png", png(300, 200))])
        .await;
    assert_eq!(images[0]["width"], 300);
    assert_eq!(images[0]["height"], 200);
}

#[tokio::test]
async fn one_bad_file_rejects_the_batch() {
    let app = TestApp::spawn().await;
    app.create_place(json!({ "name": "Strict" })).await;

    let res = app
        .upload(
            &routes::upload_images("strict"),
            vec![("good.jpg", jpeg(10, 10)), ("notes.txt", b"hello".to_vec())],
        )
        .await;
    assert_eq!(res.status, 400, "{}", res.text);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");

    let res = app
        .upload(
            &routes::upload_images("strict"),
            vec![("good.jpg", jpeg(10, 10)), ("fake.png", b"not a png".to_vec())],
        )
        .await;
    assert_eq!(res.status, 400, "{}", res.text);

    assert_eq!(app.stored_file_count(), 0);
    let place = app.get(&routes::place("strict")).await;
    assert_eq!(place.body["images"], json!([]));
}

#[tokio::test]
async fn upload_without_files_is_rejected() {
    let app = TestApp::spawn().await;
    app.create_place(json!({ "name": "Empty" })).await;

    let res = app.upload(&routes::upload_images("empty"), Vec::new()).await;
    assert_eq!(res.status, 400, "{}", res.text);
}

#[tokio::test]
async fn upload_to_unknown_place_is_404() {
    let app = TestApp::spawn().await;

    let res = app
        .upload(&routes::upload_images("missing"), vec![("a.jpg", jpeg(10, 10))])
        .await;
    assert_eq!(res.status, 404, "{}", res.text);
    assert_eq!(app.stored_file_count(), 0);
}

#[tokio::test]
async fn reorder_sets_positions() {
    let app = TestApp::spawn().await;
    app.create_place(json!({ "name": "Order" })).await;
    let images = app
        .upload_ok(
            "order",
            vec![("a.jpg", jpeg(8, 8)), ("b.jpg", jpeg(8, 8)), ("c.jpg", jpeg(8, 8))],
        )
        .await;
    let [a, b, c] = ids(&images)[..] else {
        panic!("expected three images");
    };

    let res = app
        .post(
            &routes::update_image_order("order"),
            &json!({ "image_ids": [c, a, b] }),
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);

    let place = app.get(&routes::place("order")).await;
    let listed = place.body["images"].as_array().unwrap();
    assert_eq!(ids(listed), [c, a, b]);
    assert_eq!(orders(listed), [0, 1, 2]);

    // Comma-separated string form.
    let res = app
        .post(
            &routes::update_image_order("order"),
            &json!({ "image_ids": format!("{b},{c},{a}") }),
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(ids(res.body.as_array().unwrap()), [b, c, a]);
}

#[tokio::test]
async fn reorder_with_foreign_id_changes_nothing() {
    let app = TestApp::spawn().await;
    app.create_place(json!({ "name": "Mine" })).await;
    app.create_place(json!({ "name": "Theirs" })).await;
    let mine = ids(&app
        .upload_ok("mine", vec![("a.jpg", jpeg(8, 8)), ("b.jpg", jpeg(8, 8))])
        .await);
    let theirs = ids(&app.upload_ok("theirs", vec![("x.jpg", jpeg(8, 8))]).await);

    let res = app
        .post(
            &routes::update_image_order("mine"),
            &json!({ "image_ids": [mine[1], theirs[0], mine[0]] }),
        )
        .await;
    assert_eq!(res.status, 400, "{}", res.text);

    let place = app.get(&routes::place("mine")).await;
    let listed = place.body["images"].as_array().unwrap();
    assert_eq!(ids(listed), mine);
    assert_eq!(orders(listed), [0, 1]);
}

#[tokio::test]
async fn reorder_rejects_malformed_ids() {
    let app = TestApp::spawn().await;
    app.create_place(json!({ "name": "Typo" })).await;

    let res = app
        .post(
            &routes::update_image_order("typo"),
            &json!({ "image_ids": "1,abc" }),
        )
        .await;
    assert_eq!(res.status, 400, "{}", res.text);
}

#[tokio::test]
async fn update_deletes_listed_images_of_this_place_only() {
    let app = TestApp::spawn().await;
    app.create_place(json!({ "name": "Keep" })).await;
    app.create_place(json!({ "name": "Other" })).await;
    let keep = ids(&app
        .upload_ok(
            "keep",
            vec![("a.jpg", jpeg(8, 8)), ("b.jpg", jpeg(8, 8)), ("c.jpg", jpeg(8, 8))],
        )
        .await);
    let other = ids(&app.upload_ok("other", vec![("x.jpg", jpeg(8, 8))]).await);
    assert_eq!(app.stored_file_count(), 4);

    let res = app
        .patch(
            &routes::place("keep"),
            &json!({ "deleted_image_ids": format!("{},{},{}", keep[0], keep[2], other[0]) }),
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(ids(res.body["images"].as_array().unwrap()), [keep[1]]);
    assert_eq!(app.stored_file_count(), 2);

    let other_place = app.get(&routes::place("other")).await;
    assert_eq!(ids(other_place.body["images"].as_array().unwrap()), other);
}

#[tokio::test]
async fn delete_single_image() {
    let app = TestApp::spawn().await;
    app.create_place(json!({ "name": "Single" })).await;
    let images = ids(&app
        .upload_ok("single", vec![("a.jpg", jpeg(8, 8)), ("b.jpg", jpeg(8, 8))])
        .await);

    let res = app.delete(&routes::image("single", images[0])).await;
    assert_eq!(res.status, 204, "{}", res.text);
    assert_eq!(app.stored_file_count(), 1);

    let res = app.delete(&routes::image("single", images[0])).await;
    assert_eq!(res.status, 404);

    let place = app.get(&routes::place("single")).await;
    assert_eq!(ids(place.body["images"].as_array().unwrap()), [images[1]]);
}

#[tokio::test]
async fn deleting_a_place_removes_its_images_and_files() {
    let app = TestApp::spawn().await;
    app.create_place(json!({ "name": "Cascade" })).await;
    app.create_place(json!({ "name": "Bystander" })).await;
    app.upload_ok(
        "cascade",
        vec![("a.jpg", jpeg(8, 8)), ("b.png", png(8, 8))],
    )
    .await;
    app.upload_ok("bystander", vec![("c.jpg", jpeg(8, 8))]).await;
    assert_eq!(app.stored_file_count(), 3);

    let res = app.delete(&routes::place("cascade")).await;
    assert_eq!(res.status, 204, "{}", res.text);
    assert_eq!(app.stored_file_count(), 1);

    let bystander = app.get(&routes::place("bystander")).await;
    assert_eq!(bystander.body["images"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn stored_image_is_served_with_etag() {
    let app = TestApp::spawn().await;
    app.create_place(json!({ "name": "Served" })).await;
    let images = app.upload_ok("served", vec![("a.png", png(16, 16))]).await;

    let url = images[0]["image_url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/media/places/"), "{url}");
    assert!(url.ends_with(".png"), "{url}");

    let res = app.client.get(app.url(&url)).send().await.unwrap();
    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(res.headers()["content-type"], "image/png");
    let etag = res.headers()["etag"].to_str().unwrap().to_string();
    let bytes = res.bytes().await.unwrap();
    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (16, 16));

    let res = app
        .client
        .get(app.url(&url))
        .header("If-None-Match", etag)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 304);

    let res = app.get("/media/places/missing.jpg").await;
    assert_eq!(res.status, 404);
}
