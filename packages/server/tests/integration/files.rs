use chrono::{Duration, Utc};
use ::common::PutOptions;

use crate::common::TestApp;

async fn put_private(app: &TestApp, key: &str) {
    app.store
        .put(key, b"secret".to_vec(), PutOptions::new("image/png"))
        .await
        .unwrap();
}

#[tokio::test]
async fn valid_signature_serves_object_with_its_content_type() {
    let app = TestApp::spawn().await;
    put_private(&app, "albums/a/page-1.png").await;
    let url = app
        .store
        .signed_url("albums/a/page-1.png", std::time::Duration::from_secs(60))
        .await
        .unwrap();

    let res = app.client.get(&url).send().await.unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "image/png");
    assert_eq!(res.bytes().await.unwrap().as_ref(), b"secret");
}

#[tokio::test]
async fn tampered_or_expired_signature_is_forbidden() {
    let app = TestApp::spawn().await;
    put_private(&app, "albums/a/page-1.png").await;
    put_private(&app, "albums/a/page-2.png").await;
    let signer = app.signer();

    let expires = (Utc::now() + Duration::hours(1)).timestamp();
    let sig = signer.sign("albums/a/page-1.png", expires);
    let other_key = app
        .get_without_token(&format!(
            "/api/v1/files/albums/a/page-2.png?expires={expires}&signature={sig}"
        ))
        .await;
    assert_eq!(other_key.status, 403);

    let past = (Utc::now() - Duration::hours(1)).timestamp();
    let sig = signer.sign("albums/a/page-1.png", past);
    let expired = app
        .get_without_token(&format!(
            "/api/v1/files/albums/a/page-1.png?expires={past}&signature={sig}"
        ))
        .await;
    assert_eq!(expired.status, 403);

    let unsigned = app.get_without_token("/api/v1/files/albums/a/page-1.png").await;
    assert_eq!(unsigned.status, 403);
}

#[tokio::test]
async fn public_route_only_serves_public_objects() {
    let app = TestApp::spawn().await;
    put_private(&app, "albums/a/page-1.png").await;
    app.store
        .put(
            "event-thumbnails/1_a.webp",
            b"webp".to_vec(),
            PutOptions::new("image/webp").public(),
        )
        .await
        .unwrap();

    let public = app
        .get_without_token("/api/v1/public/event-thumbnails/1_a.webp")
        .await;
    assert_eq!(public.status, 200);

    let private = app
        .get_without_token("/api/v1/public/albums/a/page-1.png")
        .await;
    assert_eq!(private.status, 404);
}
