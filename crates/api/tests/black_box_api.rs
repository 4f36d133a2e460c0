use std::sync::Arc;
use std::time::Duration;

use incentive_api::app::{self, services::AppServices};
use incentive_notifications::{EmailQueue, LogMailer, QueueConfig};
use reqwest::StatusCode;
use serde_json::json;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(fast_queue()).await
    }

    async fn spawn_with(config: QueueConfig) -> Self {
        // Same router as prod, ephemeral port.
        let queue = EmailQueue::new(Arc::new(LogMailer), config);
        let services = Arc::new(AppServices::new(queue, "admin@example.com"));
        let app = app::build_app(services);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn fast_queue() -> QueueConfig {
    QueueConfig::default()
        .with_retry_delay(Duration::from_millis(5))
        .with_send_interval(Duration::from_millis(1))
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn seed_region(client: &reqwest::Client, srv: &TestServer) -> String {
    let res = client
        .post(srv.url("/regions"))
        .json(&json!({
            "name": "EMEA",
            "categories": [
                { "name": "Software", "subcategories": ["Licenses", "Subscriptions"] }
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let region: serde_json::Value = res.json().await.unwrap();
    let region_id = region["id"].as_str().unwrap().to_string();

    let res = client
        .put(srv.url("/points/rates"))
        .json(&json!({ "region_id": region_id, "deal_type": "new_business", "rate": 1000 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    region_id
}

async fn invite(client: &reqwest::Client, srv: &TestServer, email: &str) -> String {
    let res = client
        .post(srv.url("/users/invite"))
        .json(&json!({ "email": email }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::ACCEPTED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["job_id"].is_string());
    body["user_id"].as_str().unwrap().to_string()
}

async fn queue_drains(client: &reqwest::Client, srv: &TestServer) -> serde_json::Value {
    // Delivery is asynchronous; poll until the queue is empty.
    for _ in 0..100 {
        let status: serde_json::Value = client
            .get(srv.url("/admin/email-queue"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        if status["total"] == 0 {
            return status;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("email queue did not drain within timeout");
}

#[tokio::test]
async fn health_is_ok() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn deal_registration_approval_and_goals() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let region_id = seed_region(&client, &srv).await;
    let user_id = invite(&client, &srv, "rep@example.com").await;

    let res = client
        .post(srv.url("/deals"))
        .json(&json!({
            "user_id": user_id,
            "region_id": region_id,
            "category": "software",
            "subcategory": "licenses",
            "deal_type": "new_business",
            "value": 12_500
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let deal: serde_json::Value = res.json().await.unwrap();
    assert_eq!(deal["goals"], 12);
    assert_eq!(deal["status"], "pending");
    assert_eq!(deal["placement"]["category"], "Software");
    let deal_id = deal["id"].as_str().unwrap().to_string();

    let res = client
        .post(srv.url(&format!("/deals/{deal_id}/approve")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let goals: serde_json::Value = client
        .get(srv.url(&format!("/users/{user_id}/goals")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(goals["goals"], 12);

    // Second decision is a conflict.
    let res = client
        .post(srv.url(&format!("/deals/{deal_id}/reject")))
        .json(&json!({ "reason": "too late" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // invite, approval request and decision notice all get delivered.
    let status = queue_drains(&client, &srv).await;
    assert_eq!(status["failed"], 0);
    assert!(status["jobs"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_placement_and_bad_ids_are_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let region_id = seed_region(&client, &srv).await;
    let user_id = invite(&client, &srv, "rep@example.com").await;

    let res = client
        .post(srv.url("/deals"))
        .json(&json!({
            "user_id": user_id,
            "region_id": region_id,
            "category": "Hardware",
            "subcategory": "Servers",
            "deal_type": "new_business",
            "value": 5_000
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    let res = client
        .post(srv.url("/deals/not-a-uuid/approve"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .get(srv.url(&format!("/deals/{}", uuid::Uuid::now_v7())))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn magic_link_is_queued_and_cleanup_reports_removed() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/auth/magic-link"))
        .json(&json!({ "email": "someone@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::ACCEPTED);

    let res = client
        .post(srv.url("/auth/magic-link"))
        .json(&json!({ "email": "not-an-email" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    queue_drains(&client, &srv).await;

    let body: serde_json::Value = client
        .post(srv.url("/admin/email-queue/cleanup"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["removed"], 0);
}

#[tokio::test]
async fn retained_job_is_visible_until_cleanup() {
    let srv = TestServer::spawn_with(fast_queue().with_retain_sent(true)).await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/auth/magic-link"))
        .json(&json!({ "email": "someone@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::ACCEPTED);
    let body: serde_json::Value = res.json().await.unwrap();
    let job_url = srv.url(&format!(
        "/admin/email-queue/jobs/{}",
        body["job_id"].as_str().unwrap()
    ));

    let mut job = serde_json::Value::Null;
    for _ in 0..100 {
        let res = client.get(&job_url).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        job = res.json().await.unwrap();
        if job["status"] == "sent" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(job["status"], "sent");
    assert_eq!(job["kind"], "magic_link");
    assert_eq!(job["recipient"], "someone@example.com");
    assert_eq!(job["attempts"], 1);

    let body: serde_json::Value = client
        .post(srv.url("/admin/email-queue/cleanup"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["removed"], 1);

    let res = client.get(&job_url).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "not_found");

    let res = client
        .get(srv.url("/admin/email-queue/jobs/not-a-uuid"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_id");
}
