use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn admin_posts_and_members_read_newest_first() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let (_, member) = app.member("nolle@example.org").await;

    for title in ["Välkommen", "Schema"] {
        let res = app
            .post_with_token(
                routes::POSTS,
                &json!({"title": title, "description": "Läs mer på hemsidan."}),
                &token,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["success"], true);
        assert!(res.body["postId"].is_string());
    }

    let res = app.get_with_token(routes::POSTS, &member).await;

    assert_eq!(res.status, 200);
    let titles: Vec<_> = res.body["posts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, ["Schema", "Välkommen"]);
}

#[tokio::test]
async fn member_cannot_post() {
    let app = TestApp::spawn().await;
    let (_, member) = app.member("nolle@example.org").await;

    let res = app
        .post_with_token(
            routes::POSTS,
            &json!({"title": "Hej", "description": "text"}),
            &member,
        )
        .await;

    assert_eq!(res.status, 403);
}

#[tokio::test]
async fn blank_title_is_rejected() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    let res = app
        .post_with_token(
            routes::POSTS,
            &json!({"title": "", "description": "text"}),
            &token,
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}
