use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, AccountBody, SessionBody, StatusBody, TokenBody};
use tower::ServiceExt;

const KEY: &str = "test-api-key";

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

// --- request token ---

#[tokio::test]
async fn new_token_returns_token() {
    let resp = app()
        .oneshot(get(&format!("/authentication/token/new?api_key={KEY}")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: TokenBody = body_json(resp).await;
    assert!(body.success);
    assert!(!body.request_token.is_empty());
}

#[tokio::test]
async fn new_token_rejects_bad_key() {
    let resp = app()
        .oneshot(get("/authentication/token/new?api_key=wrong"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: StatusBody = body_json(resp).await;
    assert!(!body.success);
    assert_eq!(body.status_code, 7);
}

#[tokio::test]
async fn new_token_requires_key() {
    let resp = app()
        .oneshot(get("/authentication/token/new"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_bytes(resp).await;
    assert!(!body.is_empty());
}

// --- validate ---

#[tokio::test]
async fn validate_unknown_token() {
    let resp = app()
        .oneshot(get(&format!(
            "/authentication/token/validate_with_login?api_key={KEY}&request_token=nope&username=moviefan&password=popcorn"
        )))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: StatusBody = body_json(resp).await;
    assert_eq!(body.status_code, 33);
}

#[tokio::test]
async fn validate_missing_password_is_422() {
    let resp = app()
        .oneshot(get(&format!(
            "/authentication/token/validate_with_login?api_key={KEY}&request_token=t&username=moviefan"
        )))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: StatusBody = body_json(resp).await;
    assert_eq!(body.status_code, 5);
}

// --- session ---

#[tokio::test]
async fn session_unknown_token() {
    let resp = app()
        .oneshot(get(&format!(
            "/authentication/session/new?api_key={KEY}&request_token=nope"
        )))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: StatusBody = body_json(resp).await;
    assert_eq!(body.status_code, 33);
}

// --- account ---

#[tokio::test]
async fn account_unknown_session() {
    let resp = app()
        .oneshot(get(&format!("/account?api_key={KEY}&session_id=nope")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: StatusBody = body_json(resp).await;
    assert_eq!(body.status_code, 3);
}

// --- full login flow ---

#[tokio::test]
async fn login_lifecycle() {
    // Clones of the router share one token/session store.
    let app = app();

    async fn call(app: &axum::Router, uri: String) -> axum::response::Response {
        app.clone().oneshot(get(&uri)).await.unwrap()
    }

    // token
    let resp = call(&app, format!("/authentication/token/new?api_key={KEY}")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let token = body_json::<TokenBody>(resp).await.request_token;

    // session before validation is denied
    let resp = call(
        &app,
        format!("/authentication/session/new?api_key={KEY}&request_token={token}"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json::<StatusBody>(resp).await.status_code, 17);

    // wrong password
    let resp = call(
        &app,
        format!(
            "/authentication/token/validate_with_login?api_key={KEY}&request_token={token}&username=moviefan&password=butter"
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json::<StatusBody>(resp).await.status_code, 30);

    // right password, same token comes back
    let resp = call(
        &app,
        format!(
            "/authentication/token/validate_with_login?api_key={KEY}&request_token={token}&username=moviefan&password=popcorn"
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let validated: TokenBody = body_json(resp).await;
    assert_eq!(validated.request_token, token);

    // session
    let resp = call(
        &app,
        format!("/authentication/session/new?api_key={KEY}&request_token={token}"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let session: SessionBody = body_json(resp).await;
    assert!(session.success);

    // token is spent
    let resp = call(
        &app,
        format!("/authentication/session/new?api_key={KEY}&request_token={token}"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json::<StatusBody>(resp).await.status_code, 33);

    // account
    let resp = call(
        &app,
        format!("/account?api_key={KEY}&session_id={}", session.session_id),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let account: AccountBody = body_json(resp).await;
    assert_eq!(account.id, 548);
    assert_eq!(account.username, "moviefan");
}
