use serde_json::json;

use crate::common::{TestApp, routes};

const PAGE: &[u8] = b"\x89PNG\r\n\x1a\nfake page";

mod upload {
    use super::*;

    #[tokio::test]
    async fn admin_uploads_album_with_metadata() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app
            .upload_album(
                "Bländaren 2024",
                Some("Bländaren, vecka 1"),
                &[("page-1.png", PAGE), ("page-2.png", PAGE)],
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["success"], true);
        assert_eq!(
            res.body["uploaded"],
            json!([
                "albums/Blandaren_2024/page-1.png",
                "albums/Blandaren_2024/page-2.png"
            ])
        );

        let keys: Vec<_> = app
            .store
            .list("albums/Blandaren_2024/")
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.key)
            .collect();
        assert!(keys.contains(&"albums/Blandaren_2024/metadata.json".to_string()));
    }

    #[tokio::test]
    async fn second_upload_with_same_key_conflicts() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let first = app
            .upload_album("Bländaren", None, &[("page-1.png", PAGE)], &token)
            .await;
        assert_eq!(first.status, 201, "{}", first.text);

        let res = app
            .upload_album("Blandaren", None, &[("other.png", PAGE)], &token)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
        let objects = app.store.list("albums/Blandaren/").await.unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].key, "albums/Blandaren/page-1.png");
    }

    #[tokio::test]
    async fn member_is_forbidden() {
        let app = TestApp::spawn().await;
        let (_, token) = app.member("nolle@example.org").await;

        let res = app
            .upload_album("Album", None, &[("page-1.png", PAGE)], &token)
            .await;

        assert_eq!(res.status, 403);
        assert!(app.store.list("albums/").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn upload_without_images_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app.upload_album("Album", None, &[], &token).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod list {
    use super::*;

    #[tokio::test]
    async fn lists_albums_with_signed_urls_in_page_order() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        app.upload_album(
            "Vecka 1",
            Some("Första veckan"),
            &[("page-10.png", PAGE), ("page-2.png", PAGE), ("page-1.png", PAGE)],
            &token,
        )
        .await;
        let (_, member) = app.member("nolle@example.org").await;

        let res = app.get_with_token(routes::ALBUMS, &member).await;

        assert_eq!(res.status, 200, "{}", res.text);
        let album = &res.body["blandare"][0];
        assert_eq!(album["name"], "Vecka_1");
        assert_eq!(album["displayName"], "Första veckan");

        let images: Vec<_> = album["images"]
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u.as_str().unwrap().to_string())
            .collect();
        assert_eq!(images.len(), 3);
        assert!(images[0].contains("/files/albums/Vecka_1/page-1.png?expires="));
        assert!(images[1].contains("page-2.png"));
        assert!(images[2].contains("page-10.png"));
        assert_eq!(res.body["allImages"][0].as_array().unwrap().len(), 3);

        let page = app.get_url(&images[0]).await;
        assert_eq!(page.status, 200);
    }

    #[tokio::test]
    async fn display_name_falls_back_to_folder_key() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        app.upload_album("Utan namn", None, &[("page-1.png", PAGE)], &token)
            .await;

        let res = app.get_with_token(routes::ALBUMS, &token).await;

        assert_eq!(res.body["blandare"][0]["displayName"], "Utan_namn");
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn delete_removes_every_object_including_metadata() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        app.upload_album(
            "Vecka 1",
            Some("Första veckan"),
            &[("page-1.png", PAGE), ("page-2.png", PAGE)],
            &token,
        )
        .await;

        let res = app
            .delete_json_with_token(routes::ALBUMS, &json!({"folderName": "Vecka_1"}), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["deletedFiles"], 3);
        assert!(app.store.list("albums/").await.unwrap().is_empty());

        let list = app.get_with_token(routes::ALBUMS, &token).await;
        assert_eq!(list.body["blandare"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn unknown_folder_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app
            .delete_json_with_token(routes::ALBUMS, &json!({"folderName": "missing"}), &token)
            .await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn blank_folder_name_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app
            .delete_json_with_token(routes::ALBUMS, &json!({"folderName": " "}), &token)
            .await;

        assert_eq!(res.status, 400);
    }
}
