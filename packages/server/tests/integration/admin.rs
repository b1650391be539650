use serde_json::json;

use crate::common::{TINY_WEBP, TestApp, routes};

mod set_claim {
    use super::*;

    #[tokio::test]
    async fn granted_claim_shows_up_in_new_tokens() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let (uid, _) = app.member("nolle@example.org").await;

        let res = app
            .post_with_token(routes::SET_CLAIM, &json!({"uid": uid}), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["message"], "User is now an admin.");

        let member_token = app.login("nolle@example.org", "member-password").await;
        let me = app.get_with_token(routes::ME, &member_token).await;
        assert_eq!(me.body["isAdmin"], true);
    }

    #[tokio::test]
    async fn revoking_reports_the_new_state() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let (uid, _) = app.member("nolle@example.org").await;

        let res = app
            .post_with_token(
                routes::SET_CLAIM,
                &json!({"uid": uid, "isAdmin": false}),
                &token,
            )
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["message"], "User is no longer an admin.");
    }

    #[tokio::test]
    async fn unknown_uid_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app
            .post_with_token(routes::SET_CLAIM, &json!({"uid": "nobody"}), &token)
            .await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn member_cannot_promote_itself() {
        let app = TestApp::spawn().await;
        let (uid, token) = app.member("nolle@example.org").await;

        let res = app
            .post_with_token(routes::SET_CLAIM, &json!({"uid": uid}), &token)
            .await;

        assert_eq!(res.status, 403);
        let again = app.login("nolle@example.org", "member-password").await;
        let me = app.get_with_token(routes::ME, &again).await;
        assert_eq!(me.body["isAdmin"], false);
    }
}

mod bulk_create {
    use super::*;

    #[tokio::test]
    async fn failing_entries_do_not_abort_the_batch() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app
            .post_with_token(
                routes::BULK_CREATE,
                &json!({"users": [
                    {"identifier": "a@example.org", "password": "password-a", "username": "a"},
                    {"identifier": "b@example.org"},
                    {"identifier": "c@example.org", "password": "password-c", "team": "Röd"},
                ]}),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["message"], "Bulk user creation finished.");
        let statuses: Vec<_> = res.body["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["status"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(statuses, ["success", "error", "success"]);

        let users = app.get_with_token(routes::USERS, &token).await;
        let users = users.body["users"].as_array().unwrap();
        // Bootstrap admin plus the two created entries.
        assert_eq!(users.len(), 3);
        let c = users
            .iter()
            .find(|u| u["email"] == "c@example.org")
            .unwrap();
        assert_eq!(c["extra"]["team"], "Röd");
        assert_eq!(c["profilePic"], "/defaultprofile.svg");
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn admins_lists_only_claim_holders() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        app.member("nolle@example.org").await;

        let res = app.get_with_token(routes::ADMINS, &token).await;

        assert_eq!(res.status, 200);
        let admins = res.body["admins"].as_array().unwrap();
        assert_eq!(admins.len(), 1);
        assert_eq!(admins[0]["email"], "admin@example.org");
        assert_eq!(admins[0]["isAdmin"], true);
    }

    #[tokio::test]
    async fn member_cannot_list_users() {
        let app = TestApp::spawn().await;
        let (_, token) = app.member("nolle@example.org").await;

        let res = app.get_with_token(routes::USERS, &token).await;

        assert_eq!(res.status, 403);
    }
}

mod purge {
    use super::*;

    #[tokio::test]
    async fn removes_everyone_outside_the_whitelist() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let me = app.get_with_token(routes::ME, &token).await;
        let admin_uid = me.body["uid"].as_str().unwrap().to_string();
        let (keep, _) = app.member("keep@example.org").await;
        let (gone, _) = app.member("gone@example.org").await;

        let res = app
            .post_with_token(
                routes::PURGE,
                &json!({"whitelist": [admin_uid, keep]}),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["deletedCount"], 1);
        assert_eq!(res.body["keptCount"], 2);
        assert_eq!(res.body["deletedUids"], json!([gone]));

        let users = app.get_with_token(routes::USERS, &token).await;
        assert_eq!(users.body["users"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn empty_whitelist_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app
            .post_with_token(routes::PURGE, &json!({"whitelist": []}), &token)
            .await;

        assert_eq!(res.status, 400);
        let users = app.get_with_token(routes::USERS, &token).await;
        assert_eq!(users.body["users"].as_array().unwrap().len(), 1);
    }
}

mod profile {
    use super::*;

    #[tokio::test]
    async fn display_name_and_picture_are_reflected_in_listing() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let (uid, _) = app.member("nolle@example.org").await;

        let res = app
            .put_with_token(
                &routes::display_name(&uid),
                &json!({"displayName": "Loke"}),
                &token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let res = app
            .put_bytes_with_token(
                &routes::profile_picture(&uid),
                TINY_WEBP.to_vec(),
                "image/webp",
                &token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["key"], format!("profilepics/{uid}.webp"));

        let users = app.get_with_token(routes::USERS, &token).await;
        let user = users.body["users"]
            .as_array()
            .unwrap()
            .iter()
            .find(|u| u["uid"] == uid.as_str())
            .unwrap()
            .clone();
        assert_eq!(user["displayName"], "Loke");
        let pic = user["profilePic"].as_str().unwrap();
        assert!(pic.contains(&format!("/files/profilepics/{uid}.webp?expires=")));
        assert_eq!(app.get_url(pic).await.status, 200);
    }

    #[tokio::test]
    async fn non_webp_picture_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let (uid, _) = app.member("nolle@example.org").await;

        let res = app
            .put_bytes_with_token(
                &routes::profile_picture(&uid),
                b"\x89PNG\r\n\x1a\n".to_vec(),
                "image/png",
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
    }
}
