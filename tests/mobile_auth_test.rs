//! 移动端 ID token 登录：RS256 签名、JWKS 拉取与缓存

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn jwks_server(expected_fetches: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/certs"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(common::FIXTURE_JWKS, "application/json"))
        .expect(expected_fetches)
        .mount(&server)
        .await;
    server
}

fn claims(audience: &str, exp: i64) -> Value {
    json!({
        "iss": "https://accounts.google.com",
        "aud": audience,
        "sub": "sub123",
        "email": "m@x.com",
        "name": "Mo",
        "iat": common::now(),
        "exp": exp
    })
}

fn login_request(body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/auth/mobile")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn google_login(token: &str) -> Value {
    json!({
        "providerName": "google",
        "token": token,
        "clientId": common::MOBILE_CLIENT_ID
    })
}

#[tokio::test]
async fn valid_id_token_issues_session() {
    let server = jwks_server(1).await;
    let exp = common::now() + 3600;
    let id_token = common::sign_id_token(&claims(common::MOBILE_CLIENT_ID, exp));

    let app = common::router(common::test_config(&server.uri()));
    let response = common::send(app, login_request(&google_login(&id_token))).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["message"], "Authentication successful");
    assert_eq!(body["user"]["id"], "sub123");
    assert_eq!(body["user"]["email"], "m@x.com");

    let record = common::codec()
        .decode(body["token"].as_str().unwrap())
        .unwrap();
    assert_eq!(record.user.id, "sub123");
    assert_eq!(record.provider_name.as_str(), "google");
    assert_eq!(record.access_token, None);
    assert_eq!(record.refresh_token, None);
    assert_eq!(record.exp, exp);
}

#[tokio::test]
async fn audience_mismatch_is_rejected() {
    let server = jwks_server(1).await;
    let id_token = common::sign_id_token(&claims("someone-else", common::now() + 3600));

    let app = common::router(common::test_config(&server.uri()));
    let response = common::send(app, login_request(&google_login(&id_token))).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        common::body_json(response).await,
        json!({ "error": "Authentication failed" })
    );
}

#[tokio::test]
async fn expired_id_token_is_rejected() {
    let server = jwks_server(1).await;
    let id_token = common::sign_id_token(&claims(common::MOBILE_CLIENT_ID, common::now() - 3600));

    let app = common::router(common::test_config(&server.uri()));
    let response = common::send(app, login_request(&google_login(&id_token))).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn foreign_issuer_is_rejected() {
    let server = jwks_server(1).await;
    let mut token_claims = claims(common::MOBILE_CLIENT_ID, common::now() + 3600);
    token_claims["iss"] = json!("https://evil.example.com");
    let id_token = common::sign_id_token(&token_claims);

    let app = common::router(common::test_config(&server.uri()));
    let response = common::send(app, login_request(&google_login(&id_token))).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_fields_are_bad_request() {
    let server = jwks_server(0).await;
    let app = common::router(common::test_config(&server.uri()));

    let response = common::send(
        app.clone(),
        login_request(&json!({ "providerName": "google", "token": "x" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        common::body_json(response).await,
        json!({ "error": "providerName, token and clientId are required" })
    );

    let garbage = Request::builder()
        .method("POST")
        .uri("/auth/mobile")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("not json"))
        .unwrap();
    let response = common::send(app, garbage).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn only_google_is_supported() {
    let server = jwks_server(0).await;
    let app = common::router(common::test_config(&server.uri()));

    let response = common::send(
        app,
        login_request(&json!({
            "providerName": "github",
            "token": "x",
            "clientId": common::MOBILE_CLIENT_ID
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        common::body_json(response).await,
        json!({ "error": "Unsupported provider" })
    );
}

#[tokio::test]
async fn jwks_is_fetched_once_for_repeated_logins() {
    let server = jwks_server(1).await;
    let app = common::router(common::test_config(&server.uri()));

    for _ in 0..3 {
        let id_token = common::sign_id_token(&claims(common::MOBILE_CLIENT_ID, common::now() + 600));
        let response = common::send(app.clone(), login_request(&google_login(&id_token))).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}

fn token_with_kid(kid: &str) -> String {
    let key = jsonwebtoken::EncodingKey::from_rsa_pem(include_bytes!("fixtures/id_token_rsa.pem"))
        .unwrap();
    let mut header = jsonwebtoken::Header::new(jsonwebtoken::Algorithm::RS256);
    header.kid = Some(kid.to_string());
    jsonwebtoken::encode(
        &header,
        &claims(common::MOBILE_CLIENT_ID, common::now() + 600),
        &key,
    )
    .unwrap()
}

#[tokio::test]
async fn unknown_key_id_refetches_jwks_once() {
    let server = jwks_server(2).await;
    let app = common::router(common::test_config(&server.uri()));

    let response = common::send(app, login_request(&google_login(&token_with_kid("rotated-key")))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn repeated_unknown_key_ids_do_not_hammer_jwks_endpoint() {
    // 首次拉取 + 一次强制刷新，之后的伪造 kid 只查缓存
    let server = jwks_server(2).await;
    let app = common::router(common::test_config(&server.uri()));

    for kid in ["forged-1", "forged-2", "forged-3", "forged-4"] {
        let response = common::send(app.clone(), login_request(&google_login(&token_with_kid(kid)))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let id_token = common::sign_id_token(&claims(common::MOBILE_CLIENT_ID, common::now() + 600));
    let response = common::send(app, login_request(&google_login(&id_token))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn allowed_client_ids_restrict_audience() {
    let server = jwks_server(0).await;
    let mut config = common::test_config(&server.uri());
    config.mobile.allowed_client_ids = vec!["ios-app".to_string()];
    let app = common::router(config);

    let id_token = common::sign_id_token(&claims(common::MOBILE_CLIENT_ID, common::now() + 600));
    let response = common::send(app, login_request(&google_login(&id_token))).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
