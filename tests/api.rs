use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use foodgram::db::{connect, schema, services::catalog_service};
use foodgram::server::config::ServerConfig;
use foodgram::web::create_axum_router;

const PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

struct TestApp {
    router: Router,
    _media: tempfile::TempDir,
}

async fn setup() -> TestApp {
    let media = tempfile::tempdir().unwrap();
    let db = connect("sqlite::memory:", 1).await.unwrap();
    schema::create_tables(&db).await.unwrap();
    catalog_service::insert_default_tags(&db).await.unwrap();
    catalog_service::insert_ingredients(&db, "name,measurement_unit\nsalt,g\npepper,g\n".as_bytes())
        .await
        .unwrap();

    let config = ServerConfig {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "integration-secret".to_string(),
        listen_addr: "127.0.0.1:0".to_string(),
        media_dir: media.path().to_string_lossy().into_owned(),
        media_url: "/media/".to_string(),
        log_dir: "logs".to_string(),
        auto_create_schema: false,
        db_max_connections: 1,
        bcrypt_cost: 4,
    };
    TestApp {
        router: create_axum_router(db, Arc::new(config)),
        _media: media,
    }
}

impl TestApp {
    async fn send(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let (status, _, bytes) = self.send_raw(method, uri, token, body).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn send_raw(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Token {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes().to_vec();
        (status, headers, bytes)
    }

    /// Registers a user and returns (user id, token).
    async fn sign_up(&self, name: &str) -> (i64, String) {
        let (status, user) = self
            .send(
                "POST",
                "/api/users/",
                None,
                Some(json!({
                    "email": format!("{name}@example.com"),
                    "username": name,
                    "first_name": name,
                    "last_name": "Tester",
                    "password": "correct-horse"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, token) = self
            .send(
                "POST",
                "/api/auth/token/login/",
                None,
                Some(json!({ "email": format!("{name}@example.com"), "password": "correct-horse" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        (
            user["id"].as_i64().unwrap(),
            token["auth_token"].as_str().unwrap().to_string(),
        )
    }

    async fn create_recipe(&self, token: &str, ingredients: Value) -> Value {
        let (status, recipe) = self
            .send(
                "POST",
                "/api/recipes/",
                Some(token),
                Some(json!({
                    "ingredients": ingredients,
                    "tags": [1],
                    "image": PNG,
                    "name": "Soup",
                    "text": "Boil everything.",
                    "cooking_time": 30
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{recipe}");
        recipe
    }
}

#[tokio::test]
async fn health_check_responds_ok() {
    let app = setup().await;
    let (status, _, body) = app.send_raw("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn account_flow() {
    let app = setup().await;
    let (id, token) = app.sign_up("ann").await;

    let (status, me) = app.send("GET", "/api/users/me/", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"].as_i64(), Some(id));
    assert_eq!(me["is_subscribed"], json!(false));

    let (status, _) = app.send("GET", "/api/users/me/", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send("GET", "/api/users/me/", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .send(
            "POST",
            "/api/auth/token/login/",
            None,
            Some(json!({ "email": "ann@example.com", "password": "wrong-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = app
        .send(
            "POST",
            "/api/users/",
            None,
            Some(json!({
                "email": "ann@example.com",
                "username": "ann2",
                "first_name": "Ann",
                "last_name": "Again",
                "password": "correct-horse"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            "POST",
            "/api/users/set_password/",
            Some(&token),
            Some(json!({ "current_password": "correct-horse", "new_password": "battery-staple" })),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.send("POST", "/api/auth/token/logout/", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn catalog_is_public() {
    let app = setup().await;

    let (status, tags) = app.send("GET", "/api/tags/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tags.as_array().unwrap().len(), 3);
    assert_eq!(tags[0]["slug"], json!("breakfast"));

    let (status, found) = app.send("GET", "/api/ingridients/?search=sa", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found.as_array().unwrap().len(), 1);
    assert_eq!(found[0]["name"], json!("salt"));

    let (status, _) = app.send("GET", "/api/ingridients/99/", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn recipe_lifecycle_and_permissions() {
    let app = setup().await;
    let (_, chef) = app.sign_up("chef").await;
    let (_, guest) = app.sign_up("guest").await;

    let recipe = app
        .create_recipe(&chef, json!([{ "id": 1, "amount": 5 }, { "id": 2, "amount": 2 }]))
        .await;
    let id = recipe["id"].as_i64().unwrap();
    let image = recipe["image"].as_str().unwrap();
    assert!(image.starts_with("/media/recipes/images/"));
    assert_eq!(recipe["ingredients"][0]["name"], json!("salt"));
    assert_eq!(recipe["tags"][0]["slug"], json!("breakfast"));

    let (status, list) = app.send("GET", "/api/recipes/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["count"], json!(1));
    assert_eq!(list["results"][0]["is_favorited"], json!(false));

    let (status, _) = app.send("GET", "/api/recipes/?tags=dinner&tags=evening_meal", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(
            "PATCH",
            &format!("/api/recipes/{id}/"),
            Some(&guest),
            Some(json!({ "name": "Stolen" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.send("POST", "/api/recipes/", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, updated) = app
        .send(
            "PATCH",
            &format!("/api/recipes/{id}/"),
            Some(&chef),
            Some(json!({ "cooking_time": 45 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["cooking_time"], json!(45));
    assert_eq!(updated["name"], json!("Soup"));
    assert_eq!(updated["ingredients"].as_array().unwrap().len(), 2);

    let (status, _) = app
        .send(
            "PATCH",
            &format!("/api/recipes/{id}/"),
            Some(&chef),
            Some(json!({ "ingredients": [{ "id": 1, "amount": 1 }, { "id": 1, "amount": 2 }] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            "PATCH",
            &format!("/api/recipes/{id}/"),
            Some(&chef),
            Some(json!({ "ingredients": [{ "id": 77, "amount": 1 }] })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.send("DELETE", &format!("/api/recipes/{id}/"), Some(&guest), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.send("DELETE", &format!("/api/recipes/{id}/"), Some(&chef), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.send("GET", &format!("/api/recipes/{id}/"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn favorites_cart_and_shopping_list() {
    let app = setup().await;
    let (_, token) = app.sign_up("cook").await;
    let a = app
        .create_recipe(&token, json!([{ "id": 1, "amount": 5 }, { "id": 2, "amount": 2 }]))
        .await;
    let b = app.create_recipe(&token, json!([{ "id": 1, "amount": 3 }])).await;

    let favorite = format!("/api/recipes/{}/favorite/", a["id"]);
    let (status, short) = app.send("POST", &favorite, Some(&token), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(short["name"], json!("Soup"));
    assert!(short.get("ingredients").is_none());
    let (status, _) = app.send("POST", &favorite, Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, favorited) = app.send("GET", "/api/recipes/?is_favorited=1", Some(&token), None).await;
    assert_eq!(favorited["count"], json!(1));
    assert_eq!(favorited["results"][0]["is_favorited"], json!(true));

    for recipe in [&a, &b] {
        let (status, _) = app
            .send("POST", &format!("/api/recipes/{}/shopping_cart/", recipe["id"]), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, headers, body) = app
        .send_raw("GET", "/api/recipes/download_shopping_cart/", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "text/plain; charset=utf-8");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"shopping_list.txt\""
    );
    assert_eq!(
        String::from_utf8(body).unwrap(),
        " *  Salt (g) - 8\n *  Pepper (g) - 2\n"
    );

    let (status, _) = app.send("DELETE", &favorite, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.send("DELETE", &favorite, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn subscriptions() {
    let app = setup().await;
    let (reader_id, reader) = app.sign_up("reader").await;
    let (author_id, author) = app.sign_up("author").await;
    app.create_recipe(&author, json!([{ "id": 1, "amount": 1 }])).await;
    app.create_recipe(&author, json!([{ "id": 2, "amount": 1 }])).await;

    let (status, _) = app
        .send("POST", &format!("/api/users/{reader_id}/subscribe/"), Some(&reader), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let subscribe = format!("/api/users/{author_id}/subscribe/");
    let (status, body) = app.send("POST", &subscribe, Some(&reader), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["is_subscribed"], json!(true));
    assert_eq!(body["recipes_count"], json!(2));

    let (status, _) = app.send("POST", &subscribe, Some(&reader), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, page) = app
        .send("GET", "/api/users/subscriptions/?recipes_limit=1", Some(&reader), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["count"], json!(1));
    assert_eq!(page["results"][0]["recipes"].as_array().unwrap().len(), 1);

    let (status, _) = app
        .send("GET", "/api/users/subscriptions/?recipes_limit=-1", Some(&reader), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, profile) = app
        .send("GET", &format!("/api/users/{author_id}/"), Some(&reader), None)
        .await;
    assert_eq!(profile["is_subscribed"], json!(true));

    let (status, _) = app.send("DELETE", &subscribe, Some(&reader), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn pagination_validation() {
    let app = setup().await;
    let (status, _) = app.send("GET", "/api/users/?limit=0", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, page) = app.send("GET", "/api/recipes/?page=5", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["results"], json!([]));
    assert_eq!(page["next"], Value::Null);
    assert_eq!(page["previous"], json!(4));
}

#[tokio::test]
async fn oversized_numeric_params_are_rejected() {
    let app = setup().await;
    let (_, reader) = app.sign_up("reader").await;
    let (author_id, _) = app.sign_up("author").await;

    for uri in [
        "/api/recipes/?page=18446744073709551615",
        "/api/recipes/?page=999999999999999999&limit=100",
        "/api/users/?page=18446744073709551615",
    ] {
        let (status, body) = app.send("GET", uri, None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(body["error"].is_string());
    }

    let (status, _) = app
        .send(
            "POST",
            &format!("/api/users/{author_id}/subscribe/?recipes_limit=18446744073709551615"),
            Some(&reader),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            "GET",
            "/api/users/subscriptions/?recipes_limit=18446744073709551615",
            Some(&reader),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Still subscribable with a sane limit.
    let (status, _) = app
        .send(
            "POST",
            &format!("/api/users/{author_id}/subscribe/?recipes_limit=2"),
            Some(&reader),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}
