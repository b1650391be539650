use serde_json::json;

use crate::common::{ADMIN_EMAIL, ADMIN_PASSWORD, TestApp, routes};

mod login {
    use super::*;

    #[tokio::test]
    async fn bootstrap_admin_can_log_in() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": ADMIN_EMAIL, "password": ADMIN_PASSWORD}),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["token"].is_string());
        assert!(res.body["uid"].is_string());
        assert_eq!(res.body["isAdmin"], true);
        assert!(res.body["expiresAt"].is_string());
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": ADMIN_EMAIL, "password": "not-the-password"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn unknown_email_is_rejected_the_same_way() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "nobody@example.org", "password": "whatever"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn blank_email_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::LOGIN, &json!({"email": "  ", "password": "x"}))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod me {
    use super::*;

    #[tokio::test]
    async fn returns_identity_from_token() {
        let app = TestApp::spawn().await;
        let (uid, token) = app.member("nolle@example.org").await;

        let res = app.get_with_token(routes::ME, &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["uid"], uid.as_str());
        assert_eq!(res.body["email"], "nolle@example.org");
        assert_eq!(res.body["isAdmin"], false);
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::ME).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::ME, "not.a.jwt").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }
}
