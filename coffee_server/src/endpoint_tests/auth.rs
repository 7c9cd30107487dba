use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::Duration;
use coffee_engine::{
    db_types::{Role, User},
    UserApi,
    UserApiError,
};
use serde_json::json;

use super::{
    helpers::{authed_request, get_auth_config, issue_token, public_request, timestamp, user},
    mocks::MockBackend,
};
use crate::{
    auth::{JwtClaims, TokenIssuer},
    config::AuthConfig,
    routes::{ListUsersRoute, LoginRoute, SignupRoute},
};

fn configure_users(backend: MockBackend) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(UserApi::new(backend)))
            .service(LoginRoute::<MockBackend>::new())
            .service(SignupRoute::<MockBackend>::new())
            .service(ListUsersRoute::<MockBackend>::new());
    }
}

fn backend_with_user(password: &str) -> MockBackend {
    let mut backend = MockBackend::new();
    let account = user(3, "ada@example.com", password, Role::User);
    backend.expect_fetch_user_by_email().returning(move |email| {
        if email == "ada@example.com" {
            Ok(Some(account.clone()))
        } else {
            Ok(None)
        }
    });
    backend
}

#[actix_web::test]
async fn login_issues_a_valid_token() {
    let backend = backend_with_user("s3cret!");
    let req = TestRequest::post().uri("/login").set_json(json!({"email": "Ada@Example.com ", "password": "s3cret!"}));
    let (status, body) = public_request(req, configure_users(backend)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], true);
    assert_eq!(body["message"], "Login successful");
    let token = body["data"]["token"].as_str().expect("token is missing");
    let claims = TokenIssuer::new(&get_auth_config()).validate_token(token).expect("token should validate");
    assert_eq!(claims, JwtClaims::new(3, Role::User));
}

#[actix_web::test]
async fn login_with_wrong_password() {
    let backend = backend_with_user("s3cret!");
    let req = TestRequest::post().uri("/login").set_json(json!({"email": "ada@example.com", "password": "guess"}));
    let (status, body) = public_request(req, configure_users(backend)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"status": false, "message": "invalid credentials", "data": null}));
}

#[actix_web::test]
async fn login_with_unknown_email_looks_like_wrong_password() {
    let backend = backend_with_user("s3cret!");
    let req = TestRequest::post().uri("/login").set_json(json!({"email": "bob@example.com", "password": "s3cret!"}));
    let (status, body) = public_request(req, configure_users(backend)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "invalid credentials");
}

#[actix_web::test]
async fn login_with_malformed_body() {
    let req = TestRequest::post().uri("/login").set_json(json!({"email": "ada@example.com"}));
    let (status, body) = public_request(req, configure_users(MockBackend::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], false);
    assert!(body["message"].as_str().unwrap().starts_with("Could not read request body"));
}

#[actix_web::test]
async fn signup_creates_a_user() {
    let mut backend = MockBackend::new();
    backend.expect_insert_user().times(1).returning(|new_user| {
        assert_eq!(new_user.email, "grace@example.com");
        assert_eq!(new_user.role, Role::Admin);
        assert_ne!(new_user.password_hash, "hunter2");
        Ok(User {
            id: 11,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            role: new_user.role,
            created_at: timestamp(),
            updated_at: timestamp(),
        })
    });
    let req = TestRequest::post().uri("/users").set_json(json!({
        "first_name": "Grace",
        "last_name": "Hopper",
        "email": "Grace@Example.com",
        "password": "hunter2",
        "role": "admin"
    }));
    let (status, body) = public_request(req, configure_users(backend)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "User created successfully");
    assert_eq!(body["data"]["id"], 11);
    assert_eq!(body["data"]["role"], "admin");
    assert!(body["data"].get("password_hash").is_none());
    assert!(body["data"].get("password").is_none());
}

#[actix_web::test]
async fn signup_with_invalid_role() {
    let mut backend = MockBackend::new();
    backend.expect_insert_user().never();
    let req = TestRequest::post().uri("/users").set_json(json!({
        "first_name": "Grace",
        "last_name": "Hopper",
        "email": "grace@example.com",
        "password": "hunter2",
        "role": "superuser"
    }));
    let (status, body) = public_request(req, configure_users(backend)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "invalid role entered");
}

#[actix_web::test]
async fn signup_with_taken_email() {
    let mut backend = MockBackend::new();
    backend
        .expect_insert_user()
        .returning(|u| Err(UserApiError::EmailAlreadyExists(u.email)));
    let req = TestRequest::post().uri("/users").set_json(json!({
        "first_name": "Ada",
        "last_name": "Lovelace",
        "email": "ada@example.com",
        "password": "s3cret!",
        "role": "user"
    }));
    let (status, body) = public_request(req, configure_users(backend)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "A user with the email ada@example.com already exists");
}

#[actix_web::test]
async fn protected_route_without_token() {
    let (status, body) = authed_request("", TestRequest::get().uri("/users"), configure_users(MockBackend::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"status": false, "message": "Authorization token not provided", "data": null}));
}

#[actix_web::test]
async fn protected_route_with_tampered_token() {
    let mut token = issue_token(1, Role::Admin);
    token.replace_range(token.len() - 10..token.len() - 5, "AAAAA");
    let (status, body) =
        authed_request(&token, TestRequest::get().uri("/users"), configure_users(MockBackend::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].as_str().unwrap().starts_with("Invalid token"));
}

#[actix_web::test]
async fn protected_route_with_foreign_token() {
    let other = TokenIssuer::new(&AuthConfig::new("some-other-deployment-secret-9f8e7d6c5b4a", Duration::hours(1)));
    let token = other.issue_token(JwtClaims::new(1, Role::Admin), None).unwrap();
    let (status, _) = authed_request(&token, TestRequest::get().uri("/users"), configure_users(MockBackend::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn admin_route_as_user() {
    let mut backend = MockBackend::new();
    backend.expect_fetch_users().never();
    let token = issue_token(3, Role::User);
    let (status, body) = authed_request(&token, TestRequest::get().uri("/users"), configure_users(backend)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({"status": false, "message": "Insufficient permissions", "data": null}));
}

#[actix_web::test]
async fn admin_route_as_admin() {
    let mut backend = MockBackend::new();
    backend.expect_fetch_users().times(1).returning(|| {
        Ok(vec![user(1, "root@example.com", "pw", Role::Admin), user(3, "ada@example.com", "pw", Role::User)])
    });
    let token = issue_token(1, Role::Admin);
    let (status, body) = authed_request(&token, TestRequest::get().uri("/users"), configure_users(backend)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Users retrieved successfully");
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"][1]["email"], "ada@example.com");
}
