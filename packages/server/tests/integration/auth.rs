use inventory_server::entity::{session, user};
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;

use crate::common::{TEST_PASSWORD, TestApp, routes};

mod registration {
    use super::*;

    #[tokio::test]
    async fn matching_passwords_create_exactly_one_account() {
        let app = TestApp::spawn().await;

        let res = app
            .post(
                routes::REGISTER,
                &json!({
                    "username": "anna",
                    "password": TEST_PASSWORD,
                    "confirm_password": TEST_PASSWORD,
                }),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert!(res.body["id"].is_number());
        assert_eq!(res.body["username"], "anna");
        assert_eq!(res.body["login_url"], routes::LOGIN);
        assert_eq!(res.header("location"), Some(routes::LOGIN));

        let count = user::Entity::find().count(&app.db).await.unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn mismatched_confirmation_creates_no_account() {
        let app = TestApp::spawn().await;

        let res = app
            .post(
                routes::REGISTER,
                &json!({
                    "username": "anna",
                    "password": TEST_PASSWORD,
                    "confirm_password": "something-else-1",
                }),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(res.body["field"], "confirm_password");

        let count = user::Entity::find().count(&app.db).await.unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn cannot_register_a_taken_username() {
        let app = TestApp::spawn().await;
        app.register("anna").await;

        let res = app
            .post(
                routes::REGISTER,
                &json!({
                    "username": "anna",
                    "password": TEST_PASSWORD,
                    "confirm_password": TEST_PASSWORD,
                }),
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "USERNAME_TAKEN");
        let count = user::Entity::find().count(&app.db).await.unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn entirely_numeric_password_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post(
                routes::REGISTER,
                &json!({
                    "username": "anna",
                    "password": "1234567890",
                    "confirm_password": "1234567890",
                }),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["field"], "password");
    }

    #[tokio::test]
    async fn malformed_json_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .post(routes::REGISTER, &json!({"username": "anna"}))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod login {
    use super::*;

    #[tokio::test]
    async fn valid_credentials_set_a_session_cookie() {
        let app = TestApp::spawn().await;
        app.register("anna").await;

        let res = app.login("anna", TEST_PASSWORD).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["username"], "anna");
        assert!(res.body["token"].is_string());
        let cookie = res.header("set-cookie").expect("session cookie should be set");
        assert!(cookie.starts_with("session="));
        assert!(cookie.contains("HttpOnly"));

        let me = app.get(routes::ME).await;
        assert_eq!(me.status, 200);
        assert_eq!(me.body["username"], "anna");
    }

    #[tokio::test]
    async fn wrong_password_establishes_no_session() {
        let app = TestApp::spawn().await;
        app.register("anna").await;

        let res = app.login("anna", "not-the-password").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
        assert!(res.header("set-cookie").is_none());

        let me = app.get(routes::ME).await;
        assert_eq!(me.status, 401);
        assert_eq!(me.body["code"], "SESSION_MISSING");
    }

    #[tokio::test]
    async fn unknown_user_gets_the_same_response_as_a_wrong_password() {
        let app = TestApp::spawn().await;
        app.register("anna").await;

        let unknown = app.login("nobody", TEST_PASSWORD).await;
        let wrong = app.login("anna", "not-the-password").await;

        assert_eq!(unknown.status, 401);
        assert_eq!(unknown.body, wrong.body);
    }

    #[tokio::test]
    async fn returned_token_works_as_a_bearer_token() {
        let app = TestApp::spawn().await;
        app.register("anna").await;
        let res = app.login("anna", TEST_PASSWORD).await;
        let token = res.body["token"].as_str().unwrap();

        let me = app.get_with_token(routes::ME, token).await;

        assert_eq!(me.status, 200);
        assert_eq!(me.body["username"], "anna");
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let app = TestApp::spawn().await;

        let me = app.get_with_token(routes::ME, "not.a.jwt").await;

        assert_eq!(me.status, 401);
        assert_eq!(me.body["code"], "SESSION_INVALID");
    }
}

mod logout {
    use super::*;

    #[tokio::test]
    async fn logout_ends_the_session() {
        let app = TestApp::spawn_logged_in().await;
        assert_eq!(app.get(routes::ME).await.status, 200);

        let res = app.post(routes::LOGOUT, &json!({})).await;
        assert_eq!(res.status, 204);

        let me = app.get(routes::ME).await;
        assert_eq!(me.status, 401);
    }

    #[tokio::test]
    async fn logged_out_token_is_rejected_as_bearer() {
        let app = TestApp::spawn().await;
        app.register("anna").await;
        let res = app.login("anna", TEST_PASSWORD).await;
        let token = res.body["token"].as_str().unwrap().to_string();

        let res = app.post(routes::LOGOUT, &json!({})).await;
        assert_eq!(res.status, 204);

        let me = app.get_with_token(routes::ME, &token).await;
        assert_eq!(me.status, 401);
        assert_eq!(me.body["code"], "SESSION_INVALID");

        let dashboard = app.get_with_token(routes::DASHBOARD, &token).await;
        assert_eq!(dashboard.status, 303);
        assert_eq!(dashboard.header("location"), Some(routes::LOGIN));
        assert_eq!(session::Entity::find().count(&app.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn bearer_logout_closes_only_that_session() {
        let app = TestApp::spawn().await;
        app.register("anna").await;
        let first = app.login("anna", TEST_PASSWORD).await;
        let second = app.login("anna", TEST_PASSWORD).await;
        let first = first.body["token"].as_str().unwrap();
        let second = second.body["token"].as_str().unwrap();

        let res = app
            .anonymous_client()
            .post(app.url(routes::LOGOUT))
            .header("Authorization", format!("Bearer {first}"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 204);

        assert_eq!(app.get_with_token(routes::ME, first).await.status, 401);
        assert_eq!(app.get_with_token(routes::ME, second).await.status, 200);
        assert_eq!(session::Entity::find().count(&app.db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn logout_without_a_session_still_succeeds() {
        let app = TestApp::spawn().await;

        let res = app.post(routes::LOGOUT, &json!({})).await;

        assert_eq!(res.status, 204);
    }
}
