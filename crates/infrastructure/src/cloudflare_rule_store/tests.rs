use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, put};
use axum::{Json, Router};
use edgelimit_application::{
    ReconcileOptions, ReconcileOutcome, RemoteRuleStore, RuleReconciliationService,
    ZoneDirectory,
};
use edgelimit_core::{AppError, RemoteRuleId, ZoneId};
use edgelimit_domain::{RateLimitRule, RateLimitRuleInput};
use serde_json::{Value, json};
use url::Url;

use super::{CloudflareCredentials, CloudflareRuleStore};

const ZONE_NAME: &str = "example.org";
const ZONE_ID: &str = "023e105f4ecef8ad9ca31a8372d0c353";
const API_EMAIL: &str = "ops@example.org";
const API_KEY: &str = "c2547eb745079dac9320b638f5e225cf483cc5cfdda41";
const SERVER_PAGE_SIZE: usize = 2;

#[derive(Default)]
struct FakeCloudflare {
    rules: Vec<Value>,
    next_id: u32,
    requests: Vec<String>,
}

type SharedFake = Arc<Mutex<FakeCloudflare>>;

type ApiResponse = (StatusCode, Json<Value>);

fn success(result: Value) -> ApiResponse {
    (
        StatusCode::OK,
        Json(json!({"success": true, "errors": [], "messages": [], "result": result})),
    )
}

fn failure(status: StatusCode, code: u32, message: &str) -> ApiResponse {
    (
        status,
        Json(json!({
            "success": false,
            "errors": [{"code": code, "message": message}],
            "messages": [],
            "result": null
        })),
    )
}

fn authorized(headers: &HeaderMap) -> bool {
    let header = |name: &str| headers.get(name).and_then(|value| value.to_str().ok());
    let api_key = header("x-auth-email") == Some(API_EMAIL) && header("x-auth-key") == Some(API_KEY);
    api_key || header("authorization") == Some("Bearer scoped-token")
}

fn record(fake: &SharedFake, request: String) {
    if let Ok(mut fake) = fake.lock() {
        fake.requests.push(request);
    }
}

async fn list_zones(
    State(fake): State<SharedFake>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResponse {
    record(&fake, "GET /zones".to_owned());
    if !authorized(&headers) {
        return failure(
            StatusCode::FORBIDDEN,
            9103,
            "Unknown X-Auth-Key or X-Auth-Email",
        );
    }

    if query.get("name").map(String::as_str) == Some(ZONE_NAME) {
        success(json!([{"id": ZONE_ID, "name": ZONE_NAME}]))
    } else {
        success(json!([]))
    }
}

async fn list_rules(
    State(fake): State<SharedFake>,
    headers: HeaderMap,
    Path(zone_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResponse {
    record(&fake, format!("GET /zones/{zone_id}/rate_limits"));
    if !authorized(&headers) {
        return failure(
            StatusCode::FORBIDDEN,
            9103,
            "Unknown X-Auth-Key or X-Auth-Email",
        );
    }

    let page = query
        .get("page")
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(1)
        .max(1);
    let Ok(fake) = fake.lock() else {
        return failure(StatusCode::INTERNAL_SERVER_ERROR, 1000, "poisoned");
    };

    let total_pages = fake.rules.len().div_ceil(SERVER_PAGE_SIZE);
    let page_rules: Vec<Value> = fake
        .rules
        .iter()
        .skip((page - 1) * SERVER_PAGE_SIZE)
        .take(SERVER_PAGE_SIZE)
        .cloned()
        .collect();

    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "errors": [],
            "messages": [],
            "result": page_rules,
            "result_info": {
                "page": page,
                "per_page": SERVER_PAGE_SIZE,
                "count": page_rules.len(),
                "total_count": fake.rules.len(),
                "total_pages": total_pages
            }
        })),
    )
}

async fn create_rule(
    State(fake): State<SharedFake>,
    headers: HeaderMap,
    Path(zone_id): Path<String>,
    Json(mut body): Json<Value>,
) -> ApiResponse {
    record(&fake, format!("POST /zones/{zone_id}/rate_limits"));
    if !authorized(&headers) {
        return failure(
            StatusCode::FORBIDDEN,
            9103,
            "Unknown X-Auth-Key or X-Auth-Email",
        );
    }

    let Ok(mut fake) = fake.lock() else {
        return failure(StatusCode::INTERNAL_SERVER_ERROR, 1000, "poisoned");
    };
    fake.next_id += 1;
    body["id"] = json!(format!("rule-{}", fake.next_id));
    fake.rules.push(body.clone());

    success(body)
}

async fn update_rule(
    State(fake): State<SharedFake>,
    headers: HeaderMap,
    Path((zone_id, rule_id)): Path<(String, String)>,
    Json(mut body): Json<Value>,
) -> ApiResponse {
    record(&fake, format!("PUT /zones/{zone_id}/rate_limits/{rule_id}"));
    if !authorized(&headers) {
        return failure(
            StatusCode::FORBIDDEN,
            9103,
            "Unknown X-Auth-Key or X-Auth-Email",
        );
    }

    let Ok(mut fake) = fake.lock() else {
        return failure(StatusCode::INTERNAL_SERVER_ERROR, 1000, "poisoned");
    };
    body["id"] = json!(rule_id);
    let Some(slot) = fake
        .rules
        .iter_mut()
        .find(|rule| rule["id"] == json!(rule_id))
    else {
        return failure(StatusCode::NOT_FOUND, 10001, "rate limit not found");
    };
    *slot = body.clone();

    success(body)
}

async fn spawn_fake(rules: Vec<Value>) -> (SharedFake, Url) {
    let fake: SharedFake = Arc::new(Mutex::new(FakeCloudflare {
        rules,
        ..FakeCloudflare::default()
    }));

    let api = Router::new()
        .route("/zones", get(list_zones))
        .route(
            "/zones/{zone_id}/rate_limits",
            get(list_rules).post(create_rule),
        )
        .route("/zones/{zone_id}/rate_limits/{rule_id}", put(update_rule))
        .with_state(fake.clone());
    let router = Router::new().nest("/client/v4", api);

    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap_or_else(|_| unreachable!());
    let address = listener.local_addr().unwrap_or_else(|_| unreachable!());
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    let base_url = Url::parse(&format!("http://{address}/client/v4"))
        .unwrap_or_else(|_| unreachable!());
    (fake, base_url)
}

fn store(base_url: Url, credentials: CloudflareCredentials) -> CloudflareRuleStore {
    CloudflareRuleStore::new(reqwest::Client::new(), base_url, credentials)
}

fn api_key() -> CloudflareCredentials {
    CloudflareCredentials::ApiKey {
        email: API_EMAIL.to_owned(),
        key: API_KEY.to_owned(),
    }
}

fn zone() -> ZoneId {
    ZoneId::new(ZONE_ID).unwrap_or_else(|_| unreachable!())
}

fn rule(url: &str, threshold: i64) -> RateLimitRule {
    RateLimitRule::new(RateLimitRuleInput {
        threshold,
        ..RateLimitRuleInput::new(url)
    })
    .unwrap_or_else(|_| unreachable!())
}

fn remote_payload(id: &str, url: &str, threshold: i64) -> Value {
    let mut value = serde_json::to_value(rule(url, threshold)).unwrap_or_default();
    value["id"] = json!(id);
    value["bypass"] = json!([]);
    value
}

fn requests(fake: &SharedFake) -> Vec<String> {
    fake.lock()
        .map(|fake| fake.requests.clone())
        .unwrap_or_default()
}

#[tokio::test]
async fn resolves_zone_by_name() {
    let (_fake, base_url) = spawn_fake(Vec::new()).await;
    let store = store(base_url, api_key());

    let zone_id = store.resolve_zone(ZONE_NAME).await;

    assert!(matches!(&zone_id, Ok(zone_id) if zone_id.as_str() == ZONE_ID));
}

#[tokio::test]
async fn unknown_zone_is_not_found() {
    let (_fake, base_url) = spawn_fake(Vec::new()).await;
    let store = store(base_url, api_key());

    let zone_id = store.resolve_zone("example.net").await;

    assert!(matches!(zone_id, Err(AppError::NotFound(message)) if message.contains("example.net")));
}

#[tokio::test]
async fn list_follows_every_page_in_order() {
    let (fake, base_url) = spawn_fake(vec![
        remote_payload("a", "example.org/a", 60),
        remote_payload("b", "example.org/b", 60),
        remote_payload("c", "example.org/c", 60),
    ])
    .await;
    let store = store(base_url, api_key());

    let rules = store.list_rules(&zone()).await.unwrap_or_default();

    let ids: Vec<&str> = rules.iter().map(|rule| rule.id().as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert_eq!(requests(&fake).len(), 2);
}

#[tokio::test]
async fn rejected_credentials_surface_remote_detail() {
    let (_fake, base_url) = spawn_fake(Vec::new()).await;
    let store = store(
        base_url,
        CloudflareCredentials::ApiKey {
            email: API_EMAIL.to_owned(),
            key: "wrong".to_owned(),
        },
    );

    let result = store.list_rules(&zone()).await;

    assert!(matches!(
        result,
        Err(AppError::RemoteStore(message))
            if message.contains("status 403") && message.contains("9103")
    ));
}

#[tokio::test]
async fn bearer_token_is_accepted() {
    let (_fake, base_url) = spawn_fake(Vec::new()).await;
    let store = store(
        base_url,
        CloudflareCredentials::ApiToken("scoped-token".to_owned()),
    );

    assert!(store.list_rules(&zone()).await.is_ok());
}

#[tokio::test]
async fn update_of_missing_rule_fails() {
    let (_fake, base_url) = spawn_fake(Vec::new()).await;
    let store = store(base_url, api_key());
    let rule_id = RemoteRuleId::new("missing").unwrap_or_else(|_| unreachable!());

    let result = store
        .update_rule(&zone(), &rule_id, &rule("example.org/login", 60))
        .await;

    assert!(matches!(result, Err(AppError::RemoteStore(message)) if message.contains("10001")));
}

#[tokio::test]
async fn unreachable_api_is_a_store_error() {
    let base_url = Url::parse("http://127.0.0.1:9/client/v4").unwrap_or_else(|_| unreachable!());
    let store = store(base_url, api_key());

    let result = store.list_rules(&zone()).await;

    assert!(matches!(result, Err(AppError::RemoteStore(_))));
}

#[tokio::test]
async fn reconciliation_round_trip_against_api() {
    let (fake, base_url) = spawn_fake(vec![
        remote_payload("other", "example.org/api/*", 60),
        remote_payload("login", "example.org/login", 10),
    ])
    .await;
    let service = RuleReconciliationService::new(Arc::new(store(base_url, api_key())));
    let desired = rule("example.org/login", 60);

    let first = service
        .reconcile(&zone(), &desired, ReconcileOptions::default())
        .await;
    let second = service
        .reconcile(&zone(), &desired, ReconcileOptions::default())
        .await;
    let third = service
        .reconcile(
            &zone(),
            &rule("example.org/signup", 60),
            ReconcileOptions::default(),
        )
        .await;

    assert!(matches!(&first, Ok(ReconcileOutcome::Updated(updated)) if updated.id().as_str() == "login"));
    assert!(matches!(second, Ok(ReconcileOutcome::Unchanged)));
    assert!(matches!(&third, Ok(ReconcileOutcome::Created(created)) if created.id().as_str() == "rule-1"));

    let mutating: Vec<String> = requests(&fake)
        .into_iter()
        .filter(|request| !request.starts_with("GET"))
        .collect();
    assert_eq!(
        mutating,
        vec![
            format!("PUT /zones/{ZONE_ID}/rate_limits/login"),
            format!("POST /zones/{ZONE_ID}/rate_limits"),
        ]
    );
}
