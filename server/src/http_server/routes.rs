use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use super::api;
use crate::{AppConfig, AppState};

/// Base64 inflates images by a third and a recipe carries several of them.
const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

pub(crate) fn make_router(config: &AppConfig) -> Router<AppState> {
    Router::new()
        .route("/api/health", get(api::health::health))
        .nest("/api/users", user_routes())
        .nest("/api/notifications", notification_routes())
        .nest("/api/areas", area_routes())
        .nest("/api/categories", category_routes())
        .nest("/api/ingredients", ingredient_routes())
        .nest("/api/recipes", recipe_routes())
        .route("/api/attachments/{id}", get(api::attachments::show))
        .route("/api/admin/stats", get(api::admin::stats))
        .route("/api/query/natural", post(api::query::natural))
        .fallback(api::not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors_layer(config))
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(api::users::index).post(api::users::create))
        .route(
            "/{id}",
            get(api::users::show)
                .put(api::users::update)
                .delete(api::users::destroy),
        )
        .route("/{id}/recipes", get(api::users::recipes))
        .route("/{id}/voted-recipes", get(api::users::voted_recipes))
        .route("/{id}/notifications", get(api::notifications::index))
        .route(
            "/{id}/notifications/read-all",
            post(api::notifications::read_all),
        )
}

fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(api::notifications::create))
        .route(
            "/{id}",
            patch(api::notifications::update).delete(api::notifications::destroy),
        )
}

fn area_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(api::areas::index).post(api::areas::create))
        .route(
            "/{id}",
            get(api::areas::show)
                .put(api::areas::update)
                .delete(api::areas::destroy),
        )
}

fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(api::categories::index).post(api::categories::create))
        .route(
            "/{id}",
            get(api::categories::show)
                .put(api::categories::update)
                .delete(api::categories::destroy),
        )
}

fn ingredient_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(api::ingredients::index).post(api::ingredients::create),
        )
        .route(
            "/{id}",
            get(api::ingredients::show)
                .put(api::ingredients::update)
                .delete(api::ingredients::destroy),
        )
}

fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(api::recipes::index).post(api::recipes::create))
        .route("/search", get(api::recipes::search))
        .route("/new", get(api::recipes::newest))
        .route("/top-voted-today", get(api::recipes::top_voted_today))
        .route("/random", get(api::recipes::random))
        .route(
            "/{id}",
            get(api::recipes::show)
                .put(api::recipes::update)
                .delete(api::recipes::destroy),
        )
        .route("/{id}/votes", post(api::votes::create))
        .route("/{id}/votes/{user_id}", delete(api::votes::destroy))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let Some(origins) = &config.cors_allowed_origins else {
        return CorsLayer::permissive();
    };

    let origins = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt as _;

    use crate::http_server::test_helpers::{
        create_test_app, get_request, json_request, lazy_pool, response_body_json, CANNED_ANSWER,
    };

    async fn send(request: axum::http::Request<axum::body::Body>) -> (StatusCode, Value) {
        let response = create_test_app(lazy_pool()).oneshot(request).await.unwrap();
        let status = response.status();

        (status, response_body_json(response).await)
    }

    #[tokio::test]
    async fn health_reports_the_version() {
        let (status, body) = send(get_request("/api/health")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["data"]["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn unknown_routes_use_the_error_envelope() {
        let (status, body) = send(get_request("/api/nope")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"status": "error", "message": "Route not found"}));
    }

    #[tokio::test]
    async fn blank_ingredient_names_are_rejected() {
        let (status, body) = send(json_request(
            Method::POST,
            "/api/ingredients",
            &json!({"name": "   "}),
        ))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Name is required");
    }

    #[tokio::test]
    async fn recipes_need_name_description_and_area() {
        let (status, body) = send(json_request(
            Method::POST,
            "/api/recipes",
            &json!({"name": "Phở", "userId": 1, "categoryIds": [1]}),
        ))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Name, description, and areaId are required");
    }

    #[tokio::test]
    async fn malformed_json_is_a_client_error() {
        let request = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/api/categories")
            .header("content-type", "application/json")
            .body(axum::body::Body::from("{\"name\": "))
            .unwrap();

        let (status, body) = send(request).await;

        assert!(status.is_client_error());
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn non_numeric_ids_use_the_error_envelope() {
        let (status, body) = send(get_request("/api/recipes/pho")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert!(body["message"].as_str().unwrap().contains("pho"));
    }

    #[tokio::test]
    async fn non_numeric_vote_paths_use_the_error_envelope() {
        let request = axum::http::Request::builder()
            .method(Method::DELETE)
            .uri("/api/recipes/3/votes/mai")
            .body(axum::body::Body::empty())
            .unwrap();

        let (status, body) = send(request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn search_rejects_bad_id_lists() {
        let (status, body) = send(get_request("/api/recipes/search?areaIds=1,hanoi")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "areaIds must be a comma separated list of ids");
    }

    #[tokio::test]
    async fn votes_need_a_user() {
        let (status, body) =
            send(json_request(Method::POST, "/api/recipes/3/votes", &json!({}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "userId is required");
    }

    #[tokio::test]
    async fn marking_a_notification_needs_is_read() {
        let (status, body) =
            send(json_request(Method::PATCH, "/api/notifications/9", &json!({}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "isRead is required");
    }

    #[tokio::test]
    async fn users_need_a_valid_email() {
        let (status, body) = send(json_request(
            Method::POST,
            "/api/users",
            &json!({"name": "Lan", "email": "lan.example.com"}),
        ))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Email is not valid");
    }

    #[tokio::test]
    async fn blank_prompts_are_rejected() {
        let (status, body) = send(json_request(
            Method::POST,
            "/api/query/natural",
            &json!({"prompt": " ", "chatHistory": []}),
        ))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Prompt is required");
    }

    #[tokio::test]
    async fn prompts_are_answered_by_the_assistant() {
        let (status, body) = send(json_request(
            Method::POST,
            "/api/query/natural",
            &json!({
                "prompt": "Something sour for dinner?",
                "chatHistory": [{"role": "user", "content": "Hi"}]
            }),
        ))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["answer"], CANNED_ANSWER);
        assert_eq!(body["data"]["isNewRecipe"], true);
        assert!(body["data"].get("recipeId").is_none());
    }

    #[sqlx::test(migrations = "../db/migrations")]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn recipe_lifecycle_over_http(pool: sqlx::PgPool) {
        let call = |request: axum::http::Request<axum::body::Body>| {
            let app = create_test_app(pool.clone());
            async move {
                let response = app.oneshot(request).await.unwrap();
                let status = response.status();
                let body: Value = if status == StatusCode::NO_CONTENT {
                    Value::Null
                } else {
                    response_body_json(response).await
                };
                (status, body)
            }
        };

        let (_, user) = call(json_request(
            Method::POST,
            "/api/users",
            &json!({"name": "Mai", "email": "mai@example.com"}),
        ))
        .await;
        let (_, area) = call(json_request(Method::POST, "/api/areas", &json!({"name": "Hue"}))).await;
        let (_, category) =
            call(json_request(Method::POST, "/api/categories", &json!({"name": "Soup"}))).await;
        let (_, beef) =
            call(json_request(Method::POST, "/api/ingredients", &json!({"name": "Beef"}))).await;

        let (status, body) =
            call(json_request(Method::POST, "/api/ingredients", &json!({"name": "Beef"}))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "Ingredient name already exists");

        let (status, created) = call(json_request(
            Method::POST,
            "/api/recipes",
            &json!({
                "name": "Bún bò Huế",
                "description": "Lemongrass beef noodle soup",
                "userId": user["data"]["id"],
                "areaId": area["data"]["id"],
                "categoryIds": [category["data"]["id"]],
                "steps": [
                    {"order": 2, "description": "Simmer"},
                    {"order": 1, "description": "Blanch the bones"}
                ],
                "recipeIngredients": [
                    {"ingredientId": beef["data"]["id"], "quantity": 500, "unit": "g"}
                ]
            }),
        ))
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["data"]["id"].as_i64().unwrap();
        assert_eq!(created["data"]["steps"][0]["description"], "Blanch the bones");

        let (status, fetched) = call(get_request(&format!("/api/recipes/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["data"]["name"], "Bún bò Huế");

        let (status, found) = call(get_request("/api/recipes/search?ingredientNames=BEEF")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found["data"]["total"], 1);

        let uri = format!("/api/recipes/{id}");
        let delete = axum::http::Request::builder()
            .method(Method::DELETE)
            .uri(&uri)
            .body(axum::body::Body::empty())
            .unwrap();
        let (status, _) = call(delete).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = call(get_request(&uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
