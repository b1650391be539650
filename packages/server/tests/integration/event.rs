use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::json;

use crate::common::{TestApp, event_body, routes};

const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDR";

mod create {
    use super::*;

    #[tokio::test]
    async fn admin_creates_event_with_public_webp_thumbnail() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app
            .post_with_token(
                routes::EVENTS,
                &event_body("Nollningsfest", "2024-08-20T18:00"),
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["success"], true);
        assert_eq!(res.body["message"], "Event created successfully");

        let list = app.get_with_token(routes::EVENTS, &token).await;
        let event = &list.body["events"][0];
        assert_eq!(event["name"], "Nollningsfest");
        assert_eq!(event["uploadedBy"]["username"], "Överste");

        let thumbnails = app.store.list("event-thumbnails/").await.unwrap();
        assert_eq!(thumbnails.len(), 1);
        assert_eq!(thumbnails[0].content_type.as_deref(), Some("image/webp"));
        assert!(thumbnails[0].key.ends_with("_Omslag_bild.webp"));

        let thumbnail = app.get_url(event["thumbnailUrl"].as_str().unwrap()).await;
        assert_eq!(thumbnail.status, 200);
    }

    #[tokio::test]
    async fn member_is_forbidden_and_nothing_is_stored() {
        let app = TestApp::spawn().await;
        let (_, token) = app.member("nolle@example.org").await;

        let res = app
            .post_with_token(routes::EVENTS, &event_body("Fest", "2024-08-20"), &token)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
        assert!(app.store.list("event-thumbnails/").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_fields_are_rejected() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app
            .post_with_token(routes::EVENTS, &json!({"name": "Fest"}), &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn unparseable_date_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app
            .post_with_token(routes::EVENTS, &event_body("Fest", "next friday"), &token)
            .await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn non_webp_thumbnail_is_rejected_and_nothing_is_stored() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let mut body = event_body("Fest", "2024-08-20");
        body["thumbnailData"] = json!(format!(
            "data:image/png;base64,{}",
            STANDARD.encode(PNG_HEADER)
        ));

        let res = app.post_with_token(routes::EVENTS, &body, &token).await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(app.store.list("event-thumbnails/").await.unwrap().is_empty());
        let list = app.get_with_token(routes::EVENTS, &token).await;
        assert!(list.body["events"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn hostless_drive_url_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let mut body = event_body("Fest", "2024-08-20");
        body["driveUrl"] = json!("https://:@");

        let res = app.post_with_token(routes::EVENTS, &body, &token).await;

        assert_eq!(res.status, 400);
        assert!(app.store.list("event-thumbnails/").await.unwrap().is_empty());
    }
}

mod update {
    use super::*;

    #[tokio::test]
    async fn partial_update_keeps_other_fields() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let id = app.create_event(&token, "Fest", "2024-08-20").await;

        let res = app
            .put_with_token(&routes::event(&id), &json!({"name": "Sittning"}), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["eventId"], id.as_str());
        assert_eq!(res.body["message"], "Event updated successfully");

        let list = app.get_with_token(routes::EVENTS, &token).await;
        assert_eq!(list.body["events"][0]["name"], "Sittning");
        assert_eq!(
            list.body["events"][0]["driveUrl"],
            "https://drive.google.com/drive/folders/abc"
        );
    }

    #[tokio::test]
    async fn unknown_event_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app
            .put_with_token(
                &routes::event("0190f5a2-c1e9-7c3d-9b6a-4f1e2d3c4b5a"),
                &json!({"name": "x"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn non_webp_thumbnail_keeps_the_old_one() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let id = app.create_event(&token, "Fest", "2024-08-20").await;
        let before = app.store.list("event-thumbnails/").await.unwrap();

        let res = app
            .put_with_token(
                &routes::event(&id),
                &json!({
                    "thumbnailData": STANDARD.encode(PNG_HEADER),
                    "thumbnailFileName": "ny.png",
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        let after = app.store.list("event-thumbnails/").await.unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].key, before[0].key);
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn update_then_delete_leaves_nothing_behind() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let id = app.create_event(&token, "Fest", "2024-08-20").await;

        let mut body = event_body("Fest", "2024-08-21");
        body["thumbnailFileName"] = json!("ny.png");
        let res = app.put_with_token(&routes::event(&id), &body, &token).await;
        assert_eq!(res.status, 200, "{}", res.text);

        let res = app.delete_with_token(&routes::event(&id), &token).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["success"], true);

        let list = app.get_with_token(routes::EVENTS, &token).await;
        assert_eq!(list.body["events"].as_array().unwrap().len(), 0);
        assert!(app.store.list("event-thumbnails/").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn member_cannot_delete() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let id = app.create_event(&token, "Fest", "2024-08-20").await;
        let (_, member) = app.member("nolle@example.org").await;

        let res = app.delete_with_token(&routes::event(&id), &member).await;

        assert_eq!(res.status, 403);
        let list = app.get_with_token(routes::EVENTS, &member).await;
        assert_eq!(list.body["events"].as_array().unwrap().len(), 1);
    }
}

mod list {
    use super::*;

    #[tokio::test]
    async fn newest_event_date_first() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        app.create_event(&token, "early", "2024-08-01").await;
        app.create_event(&token, "late", "2024-09-01").await;
        app.create_event(&token, "middle", "2024-08-15").await;

        let res = app.get_with_token(routes::EVENTS, &token).await;

        let names: Vec<_> = res.body["events"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["late", "middle", "early"]);
    }

    #[tokio::test]
    async fn requires_a_token() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::EVENTS).await;

        assert_eq!(res.status, 401);
    }
}
