//! Customer CRUD endpoints and the similar-customer lookup.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderName, StatusCode},
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use rolodex_core::domain::customer::{Customer, CustomerId};
use rolodex_core::errors::DomainError;
use rolodex_core::pagination::{CustomerPage, PageRequest};
use rolodex_db::repositories::{CustomerRepository, RepositoryError};

#[derive(Clone)]
pub struct CustomersState {
    repository: Arc<dyn CustomerRepository>,
}

#[derive(Debug, Deserialize)]
struct CustomerPayload {
    email: String,
    first_name: String,
    last_name: String,
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default)]
    page: Option<i64>,
    #[serde(default)]
    page_size: Option<i64>,
    #[serde(default)]
    like_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
struct ApiError {
    error: String,
}

pub fn router(repository: Arc<dyn CustomerRepository>) -> Router {
    Router::new()
        .route("/customers", get(list_customers).post(create_customer))
        .route(
            "/customers/{id}",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .with_state(CustomersState { repository })
}

async fn create_customer(
    State(state): State<CustomersState>,
    Json(payload): Json<CustomerPayload>,
) -> Result<(StatusCode, [(HeaderName, String); 1], Json<Customer>), (StatusCode, Json<ApiError>)>
{
    let customer = Customer::new(&payload.email, &payload.first_name, &payload.last_name)
        .map_err(invalid_customer)?;

    state.repository.save(customer.clone()).await.map_err(repository_error)?;

    info!(
        event_name = "customer.created",
        customer_id = %customer.id,
        "customer record created"
    );

    let location = format!("/customers/{}", customer.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(customer)))
}

async fn get_customer(
    State(state): State<CustomersState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Customer>, (StatusCode, Json<ApiError>)> {
    let id = CustomerId(id);
    let customer = state
        .repository
        .find_by_id(&id)
        .await
        .map_err(repository_error)?
        .ok_or_else(|| customer_not_found(&id))?;

    Ok(Json(customer))
}

/// Without `like_id`, lists every customer one page at a time. With
/// `like_id`, lists the likely duplicates of that customer instead; the
/// probe itself is part of its own result set.
async fn list_customers(
    State(state): State<CustomersState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<CustomerPage>, (StatusCode, Json<ApiError>)> {
    let request = PageRequest::resolve(query.page, query.page_size);

    let page = match query.like_id {
        Some(like_id) => {
            let id = CustomerId(like_id);
            let probe = state
                .repository
                .find_by_id(&id)
                .await
                .map_err(repository_error)?
                .ok_or_else(|| customer_not_found(&id))?;
            state.repository.find_similar(&probe, request).await.map_err(repository_error)?
        }
        None => state.repository.list(request).await.map_err(repository_error)?,
    };

    Ok(Json(page))
}

/// Full update under the path id, with upsert semantics: an unknown id
/// creates the record. An email change re-derives the normalized cache.
async fn update_customer(
    State(state): State<CustomersState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CustomerPayload>,
) -> Result<Json<Customer>, (StatusCode, Json<ApiError>)> {
    let id = CustomerId(id);
    let mut customer =
        Customer::with_id(id, &payload.email, &payload.first_name, &payload.last_name)
            .map_err(invalid_customer)?;

    if let Some(existing) = state.repository.find_by_id(&id).await.map_err(repository_error)? {
        customer.created_at = existing.created_at;
    }

    state.repository.save(customer.clone()).await.map_err(repository_error)?;
    Ok(Json(customer))
}

async fn delete_customer(
    State(state): State<CustomersState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    let id = CustomerId(id);
    if state.repository.delete(&id).await.map_err(repository_error)? {
        info!(
            event_name = "customer.deleted",
            customer_id = %id,
            "customer record deleted"
        );
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(customer_not_found(&id))
    }
}

fn invalid_customer(error: DomainError) -> (StatusCode, Json<ApiError>) {
    (StatusCode::BAD_REQUEST, Json(ApiError { error: error.to_string() }))
}

fn customer_not_found(id: &CustomerId) -> (StatusCode, Json<ApiError>) {
    (StatusCode::NOT_FOUND, Json(ApiError { error: format!("customer `{id}` not found") }))
}

fn repository_error(error: RepositoryError) -> (StatusCode, Json<ApiError>) {
    error!(error = %error, "customer repository error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiError { error: "an internal repository error occurred".to_string() }),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use rolodex_db::repositories::InMemoryCustomerRepository;

    use super::router;

    fn app() -> Router {
        router(Arc::new(InMemoryCustomerRepository::default()))
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.expect("request handled");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body read");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, body)
    }

    fn post_customer(email: &str, first_name: &str, last_name: &str) -> Request<Body> {
        let payload = json!({
            "email": email,
            "first_name": first_name,
            "last_name": last_name,
        });
        Request::builder()
            .method("POST")
            .uri("/customers")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .expect("request built")
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).expect("request built")
    }

    async fn create(app: &Router, email: &str, first_name: &str, last_name: &str) -> Value {
        let (status, body) = send(app, post_customer(email, first_name, last_name)).await;
        assert_eq!(status, StatusCode::CREATED);
        body
    }

    #[tokio::test]
    async fn create_returns_the_stored_customer_with_location() {
        let app = app();

        let response =
            app.clone().oneshot(post_customer("l.nimoy@gmail.com", "Leonard", "Nimoy")).await
                .expect("request handled");
        assert_eq!(response.status(), StatusCode::CREATED);

        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .expect("location header")
            .to_string();

        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body read");
        let body: Value = serde_json::from_slice(&bytes).expect("json body");

        assert_eq!(body["email"], "l.nimoy@gmail.com");
        assert_eq!(body["first_name"], "Leonard");
        assert_eq!(body["last_name"], "Nimoy");
        assert_eq!(location, format!("/customers/{}", body["id"].as_str().expect("id")));
        assert!(body.get("normalized_email").is_none(), "cache field is not exposed");
    }

    #[tokio::test]
    async fn create_rejects_an_email_without_at() {
        let app = app();
        let (status, body) = send(&app, post_customer("not-an-email", "Leonard", "Nimoy")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().expect("message").contains("not-an-email"));
    }

    #[tokio::test]
    async fn get_returns_a_stored_customer() {
        let app = app();
        let franklin = create(&app, "fdr@whitehouse.gov", "Franklin", "Roosevelt").await;
        let id = franklin["id"].as_str().expect("id");

        let (status, body) = send(&app, get(&format!("/customers/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], franklin["id"]);
        assert_eq!(body["email"], "fdr@whitehouse.gov");
    }

    #[tokio::test]
    async fn get_unknown_customer_is_not_found() {
        let app = app();
        let (status, _) =
            send(&app, get("/customers/00000000-0000-4000-8000-000000000000")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_paginates_with_first_and_last_flags() {
        let app = app();
        create(&app, "fdr@whitehouse.gov", "Franklin", "Roosevelt").await;
        create(&app, "teddy@whitehouse.gov", "Teddy", "Roosevelt").await;

        let (status, body) = send(&app, get("/customers")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["customers"].as_array().expect("customers").len(), 2);

        let (_, page0) = send(&app, get("/customers?page_size=1&page=0")).await;
        assert_eq!(page0["customers"].as_array().expect("customers").len(), 1);
        assert_eq!(page0["number_of_pages"], 2);
        assert_eq!(page0["first"], true);
        assert_eq!(page0["last"], false);

        let (_, page1) = send(&app, get("/customers?page_size=1&page=1")).await;
        assert_eq!(page1["customers"].as_array().expect("customers").len(), 1);
        assert_eq!(page1["last"], true);

        assert_ne!(page0["customers"][0]["id"], page1["customers"][0]["id"]);
    }

    #[tokio::test]
    async fn out_of_range_pagination_input_is_clamped() {
        let app = app();
        create(&app, "fdr@whitehouse.gov", "Franklin", "Roosevelt").await;

        let (status, body) = send(&app, get("/customers?page=-2&page_size=500")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["page"], 0);
        assert_eq!(body["page_size"], 20);
    }

    #[tokio::test]
    async fn like_id_lists_similar_customers_paginated() {
        let app = app();

        // Four share a normalized email, four share a name, two match nobody.
        let probe = create(&app, "leonardsnimoy@gmail.com", "Leonard", "Nimoy").await;
        create(&app, "leonard.s.nimoy@gmail.com", "L", "Nimoy").await;
        create(&app, "LeonardSNimoy-spam@gmail.com", "Leo", "Nimoy").await;
        create(&app, "LeonardSNimoy+autograph@gmail.com", "Lenny", "Nimoy").await;
        create(&app, "l.nimoy.1@gmail.com", "Leonard", "Nimoy").await;
        create(&app, "l.nimoy.2@gmail.com", "LEONARD", "Nimoy").await;
        create(&app, "l.nimoy.3@gmail.com", "LEONARD", "NIMOY").await;
        create(&app, "l.nimoy.4@gmail.com", "  Leonard  ", "  Nimoy  ").await;
        let geraldo = create(&app, "geraldo@foxnews.com", "Geraldo", "").await;
        create(&app, "nph@gmail.com", "Neal Patrick", "Harris").await;

        let probe_id = probe["id"].as_str().expect("id");
        let (status, body) = send(&app, get(&format!("/customers?like_id={probe_id}"))).await;
        assert_eq!(status, StatusCode::OK);

        let similar = body["customers"].as_array().expect("customers");
        assert_eq!(similar.len(), 8);
        assert!(similar.iter().any(|c| c["id"] == probe["id"]));
        assert!(similar.iter().all(|c| c["id"] != geraldo["id"]));

        let (_, page0) =
            send(&app, get(&format!("/customers?like_id={probe_id}&page_size=4&page=0"))).await;
        let (_, page1) =
            send(&app, get(&format!("/customers?like_id={probe_id}&page_size=4&page=1"))).await;
        assert_eq!(page0["customers"].as_array().expect("customers").len(), 4);
        assert_eq!(page0["last"], false);
        assert_eq!(page1["customers"].as_array().expect("customers").len(), 4);
        assert_eq!(page1["last"], true);
    }

    #[tokio::test]
    async fn like_id_for_an_unknown_customer_is_not_found() {
        let app = app();
        let (status, _) = send(
            &app,
            get("/customers?like_id=00000000-0000-4000-8000-000000000000"),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_replaces_the_record_under_the_path_id() {
        let app = app();
        let franklin = create(&app, "fdr@whitehouse.gov", "Franklin", "Roosevelt").await;
        let id = franklin["id"].as_str().expect("id");

        let payload = json!({
            "email": "franklin.d.roosevelt@gmail.com",
            "first_name": "Franklin",
            "last_name": "Roosevelt",
        });
        let request = Request::builder()
            .method("PUT")
            .uri(format!("/customers/{id}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .expect("request built");

        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"].as_str().expect("id"), id);
        assert_eq!(body["email"], "franklin.d.roosevelt@gmail.com");

        let (_, fetched) = send(&app, get(&format!("/customers/{id}"))).await;
        assert_eq!(fetched["email"], "franklin.d.roosevelt@gmail.com");
        assert_eq!(fetched["created_at"], franklin["created_at"]);
    }

    #[tokio::test]
    async fn delete_removes_the_record_and_reports_missing_ones() {
        let app = app();
        let franklin = create(&app, "fdr@whitehouse.gov", "Franklin", "Roosevelt").await;
        let id = franklin["id"].as_str().expect("id");

        let delete = |id: &str| {
            Request::builder()
                .method("DELETE")
                .uri(format!("/customers/{id}"))
                .body(Body::empty())
                .expect("request built")
        };

        let (status, _) = send(&app, delete(id)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, get(&format!("/customers/{id}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, delete(id)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
