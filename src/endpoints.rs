//! Request handlers for the master class resource.
//!
//! Each request is validated before the store is touched, so rejected requests never
//! have side effects.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    routing::get,
};
use serde_json::{Value, json};

use crate::{
    database::MasterClassStore,
    model::{
        locale::Locale,
        master_class::{MasterClass, MasterClassRequest},
    },
    response_object::ApiError,
    validation::{self, Validation},
};

/// Shared handles every handler needs. Built once by `main`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MasterClassStore>,
    pub locale: Locale,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/master-classes",
            get(list_master_classes).post(create_master_class),
        )
        .route("/api/health", get(health))
        .with_state(state)
}

/// Lists every stored master class in creation order
pub async fn list_master_classes(
    State(state): State<AppState>,
) -> Result<Json<Vec<MasterClass>>, ApiError> {
    Ok(Json(state.store.list_all().await?))
}

/// Validates and stores a new master class
///
/// Answers 201 with the stored record, 400 with a field map when validation fails, and a
/// bare 400 when the body is not a JSON master class at all.
pub async fn create_master_class(
    State(state): State<AppState>,
    payload: Result<Json<MasterClassRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MasterClass>), ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::Malformed(e.body_text()))?;

    match validation::validate(request, state.locale) {
        Validation::Accepted(new) => {
            let stored = state.store.insert(new).await?;
            Ok((StatusCode::CREATED, Json(stored)))
        }
        Validation::Rejected(errors) => {
            tracing::debug!("Rejected master class: {errors:?}");
            Err(ApiError::Validation(errors))
        }
    }
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, header::CONTENT_TYPE},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::database::{MemoryStore, StoreError};
    use crate::model::master_class::NewMasterClass;

    const URI: &str = "/api/master-classes";

    fn app(store: Arc<dyn MasterClassStore>) -> Router {
        router(AppState {
            store,
            locale: Locale::Ru,
        })
    }

    async fn send(app: &Router, method: Method, body: Option<&str>) -> (StatusCode, String) {
        let mut request = Request::builder().method(method).uri(URI);
        if body.is_some() {
            request = request.header(CONTENT_TYPE, "application/json");
        }
        let request = request
            .body(body.map(|b| Body::from(b.to_owned())).unwrap_or_default())
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn post(app: &Router, body: &str) -> (StatusCode, Value) {
        let (status, text) = send(app, Method::POST, Some(body)).await;
        (status, serde_json::from_str(&text).unwrap_or(Value::Null))
    }

    async fn list(app: &Router) -> Value {
        let (status, text) = send(app, Method::GET, None).await;
        assert_eq!(status, StatusCode::OK);
        serde_json::from_str(&text).unwrap()
    }

    #[tokio::test]
    async fn lists_empty_array_when_nothing_stored() {
        let app = app(Arc::new(MemoryStore::default()));
        assert_eq!(list(&app).await, json!([]));
    }

    #[tokio::test]
    async fn creates_and_echoes_record() {
        let app = app(Arc::new(MemoryStore::default()));
        let before = chrono::Utc::now();

        let (status, body) = post(
            &app,
            r#"{"title":"Intro","description":"Basics","instructor":"A. Smith","durationMinutes":120,"price":5000.00}"#,
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert!(body["id"].is_i64());
        assert_eq!(body["title"], "Intro");
        assert_eq!(body["description"], "Basics");
        assert_eq!(body["instructor"], "A. Smith");
        assert_eq!(body["durationMinutes"], 120);
        assert_eq!(body["price"].as_f64(), Some(5000.0));

        let created_at: chrono::DateTime<chrono::Utc> =
            serde_json::from_value(body["createdAt"].clone()).unwrap();
        assert!(created_at >= before);
    }

    #[tokio::test]
    async fn created_record_is_listed_with_same_id() {
        let app = app(Arc::new(MemoryStore::default()));

        let (_, created) = post(
            &app,
            r#"{"title":"React с нуля","description":"Изучите React с нуля до профи","instructor":"Мария Сидорова","durationMinutes":240,"price":10000.00}"#,
        )
        .await;

        let listed = list(&app).await;
        assert_eq!(listed.as_array().map(Vec::len), Some(1));
        assert_eq!(listed[0]["id"], created["id"]);
        assert_eq!(listed[0]["title"], "React с нуля");
        assert_eq!(listed, list(&app).await);
    }

    #[tokio::test]
    async fn lists_records_in_creation_order() {
        let app = app(Arc::new(MemoryStore::default()));
        for (title, minutes) in [("Java для начинающих", 120), ("Spring Boot продвинутый", 180)] {
            let body = json!({
                "title": title,
                "description": "Описание",
                "instructor": "Инструктор",
                "durationMinutes": minutes,
                "price": 8000.00,
            });
            let (status, _) = post(&app, &body.to_string()).await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let listed = list(&app).await;
        assert_eq!(listed[0]["title"], "Java для начинающих");
        assert_eq!(listed[1]["title"], "Spring Boot продвинутый");
    }

    #[tokio::test]
    async fn ignores_client_supplied_identity() {
        let app = app(Arc::new(MemoryStore::default()));

        let (status, body) = post(
            &app,
            r#"{"id":999,"createdAt":"2000-01-01T00:00:00Z","title":"Курс","description":"Описание","instructor":"Инструктор","durationMinutes":60,"price":100}"#,
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], 1);
        assert_ne!(body["createdAt"], "2000-01-01T00:00:00Z");
    }

    #[tokio::test]
    async fn keeps_price_digits_exactly() {
        let store = Arc::new(MemoryStore::default());
        let app = app(store.clone());

        let (status, text) = send(
            &app,
            Method::POST,
            Some(
                r#"{"title":"Intro","description":"Basics","instructor":"A. Smith","durationMinutes":120,"price":1234567890123.456789}"#,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert!(text.contains(r#""price":1234567890123.456789"#), "{text}");

        let stored = store.list_all().await.unwrap();
        assert_eq!(
            stored[0].price,
            "1234567890123.456789".parse::<rust_decimal::Decimal>().unwrap()
        );

        let (_, listed) = send(&app, Method::GET, None).await;
        assert!(listed.contains(r#""price":1234567890123.456789"#), "{listed}");
    }

    #[tokio::test]
    async fn echoes_price_as_written() {
        let app = app(Arc::new(MemoryStore::default()));

        let (status, text) = send(
            &app,
            Method::POST,
            Some(
                r#"{"title":"Intro","description":"Basics","instructor":"A. Smith","durationMinutes":120,"price":5000.00}"#,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert!(text.contains(r#""price":5000.00"#), "{text}");
    }

    #[tokio::test]
    async fn accepts_whole_duration_written_as_float() {
        let app = app(Arc::new(MemoryStore::default()));

        let (status, body) = post(
            &app,
            r#"{"title":"Intro","description":"Basics","instructor":"A. Smith","durationMinutes":120.0,"price":5000.00}"#,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["durationMinutes"], 120);

        let (status, text) = send(
            &app,
            Method::POST,
            Some(
                r#"{"title":"Intro","description":"Basics","instructor":"A. Smith","durationMinutes":120.5,"price":5000.00}"#,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(text.is_empty());
    }

    #[tokio::test]
    async fn rejects_blank_title_and_stores_nothing() {
        let store = Arc::new(MemoryStore::default());
        let app = app(store.clone());

        let (status, body) = post(
            &app,
            r#"{"title":"","description":"Basics","instructor":"A. Smith","durationMinutes":120,"price":5000.00}"#,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "title": "Название мастер-класса обязательно" }));
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_negative_duration() {
        let app = app(Arc::new(MemoryStore::default()));

        let (status, body) = post(
            &app,
            r#"{"title":"Intro","description":"Basics","instructor":"A. Smith","durationMinutes":-5,"price":5000.00}"#,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({ "durationMinutes": "Длительность должна быть положительным числом" })
        );
    }

    #[tokio::test]
    async fn distinguishes_null_and_zero_price() {
        let app = app(Arc::new(MemoryStore::default()));
        let base = r#""title":"Курс","description":"Описание","instructor":"Инструктор","durationMinutes":120"#;

        let (status, body) = post(&app, &format!("{{{base},\"price\":null}}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["price"], "Цена обязательна");

        let (status, body) = post(&app, &format!("{{{base},\"price\":0.00}}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["price"], "Цена должна быть положительным числом");
    }

    #[tokio::test]
    async fn reports_all_missing_fields() {
        let app = app(Arc::new(MemoryStore::default()));

        let (status, body) = post(&app, r#"{"title":"Intro"}"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({
                "description": "Описание обязательно",
                "instructor": "Имя инструктора обязательно",
                "durationMinutes": "Длительность обязательна",
                "price": "Цена обязательна",
            })
        );
    }

    #[tokio::test]
    async fn malformed_bodies_get_bare_bad_request() {
        let store = Arc::new(MemoryStore::default());
        let app = app(store.clone());

        for body in ["{invalid json}", r#"{"title":"Intro","durationMinutes":"long"}"#, "42"] {
            let (status, text) = send(&app, Method::POST, Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
            assert!(text.is_empty(), "body: {body}");
        }

        let request = Request::builder()
            .method(Method::POST)
            .uri(URI)
            .body(Body::from(r#"{"title":"Intro"}"#))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let app = app(Arc::new(MemoryStore::default()));
        let request = Request::builder()
            .uri("/api/health")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    struct UnavailableStore;

    #[async_trait]
    impl MasterClassStore for UnavailableStore {
        async fn insert(&self, _new: NewMasterClass) -> Result<MasterClass, StoreError> {
            Err(StoreError::Query(sqlx::Error::PoolTimedOut))
        }

        async fn list_all(&self) -> Result<Vec<MasterClass>, StoreError> {
            Err(StoreError::Query(sqlx::Error::PoolTimedOut))
        }

        async fn clear(&self) -> Result<(), StoreError> {
            Err(StoreError::Query(sqlx::Error::PoolTimedOut))
        }
    }

    #[tokio::test]
    async fn storage_failures_are_server_errors() {
        let app = app(Arc::new(UnavailableStore));

        let (status, _) = send(&app, Method::GET, None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let (status, body) = post(
            &app,
            r#"{"title":"Intro","description":"Basics","instructor":"A. Smith","durationMinutes":120,"price":5000.00}"#,
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal Server Error.");
    }

    #[tokio::test]
    async fn validation_runs_before_storage() {
        let app = app(Arc::new(UnavailableStore));

        let (status, body) = post(&app, r#"{"title":"Intro"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.get("price").is_some());
    }
}
