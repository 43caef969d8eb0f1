use ::common::Role;
use serde_json::json;

use crate::common::{TestApp, routes};

mod registration {
    use super::*;

    #[tokio::test]
    async fn new_user_registers_as_student() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({"email": "ada@example.edu", "password": "securepass"}),
            )
            .await;

        assert_eq!(res.status, 201);
        assert!(res.body["id"].is_number());
        assert_eq!(res.body["email"], "ada@example.edu");
        assert_eq!(res.body["role"], "student");
    }

    #[tokio::test]
    async fn email_is_matched_case_insensitively() {
        let app = TestApp::spawn().await;

        let first = app
            .post_without_token(
                routes::REGISTER,
                &json!({"email": "ada@example.edu", "password": "securepass"}),
            )
            .await;
        assert_eq!(first.status, 201, "First registration failed: {}", first.text);

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({"email": "  ADA@Example.edu", "password": "securepass"}),
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "EMAIL_TAKEN");
    }

    #[tokio::test]
    async fn short_password_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({"email": "ada@example.edu", "password": "short"}),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn malformed_email_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({"email": "not-an-email", "password": "securepass"}),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod login {
    use super::*;

    #[tokio::test]
    async fn login_returns_token_with_role_permissions() {
        let app = TestApp::spawn().await;
        app.create_user_with_role("prof@example.edu", "securepass", Role::Instructor)
            .await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "prof@example.edu", "password": "securepass"}),
            )
            .await;

        assert_eq!(res.status, 200);
        assert!(res.body["token"].is_string());
        assert_eq!(res.body["role"], "instructor");
        assert_eq!(
            res.body["permissions"],
            json!(["conversation:use", "analytics:view"])
        );
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let app = TestApp::spawn().await;
        app.create_authenticated_user("ada@example.edu", "securepass")
            .await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "ada@example.edu", "password": "wrongpass"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn unknown_email_gets_the_same_error_as_wrong_password() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "ghost@example.edu", "password": "securepass"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }
}

mod me {
    use super::*;

    #[tokio::test]
    async fn me_returns_the_caller() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("ada@example.edu", "securepass")
            .await;

        let res = app.get_with_token(routes::ME, &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["email"], "ada@example.edu");
        assert_eq!(res.body["role"], "student");
        assert_eq!(res.body["permissions"], json!(["conversation:use"]));
    }

    #[tokio::test]
    async fn missing_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::ME).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::ME, "not-a-jwt").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }
}
