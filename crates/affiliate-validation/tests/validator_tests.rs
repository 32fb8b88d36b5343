//! End-to-end validation tests.
//!
//! A wiremock server stands in for the affiliate API; outcomes land in the
//! in-memory store.

use affiliate_auth::ApiEndpoint;
use affiliate_client::{AffiliateClient, ClientConfig};
use affiliate_validation::{
    CheckSource, MemoryValidationStore, ValidationError, ValidationStore, Validator,
    AFFILIATED_ACCOUNT_TYPE,
};
use chrono::NaiveDate;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const AFFILIATION: &str = "/api/partner/affiliation/";

struct Fixture {
    server: MockServer,
    store: Arc<MemoryValidationStore>,
    validator: Validator,
}

impl Fixture {
    async fn start() -> Self {
        let server = MockServer::start().await;

        let mut config = ClientConfig {
            default_timeout_secs: 5,
            login_spacing_ms: 0,
            ..ClientConfig::default()
        }
        .with_credentials("ops@example.com", "s3cret");
        config.api = ApiEndpoint::new(server.uri());

        let client = AffiliateClient::new(&config).expect("Should build client");
        let store = Arc::new(MemoryValidationStore::new());
        let validator = Validator::new(Arc::new(client), store.clone());

        Self {
            server,
            store,
            validator,
        }
    }

    async fn with_login(self) -> Self {
        Mock::given(method("POST"))
            .and(path("/api/auth/login/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "tok-1" })))
            .mount(&self.server)
            .await;
        self
    }

    async fn clients(&self, route: &str, filter: (&str, &str), body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(route))
            .and(query_param(filter.0, filter.1))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    async fn affiliation(&self, email: &str, response: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path(AFFILIATION))
            .and(body_json(json!({ "email": email })))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }
}

#[tokio::test]
async fn test_unregistered_client_is_persisted() {
    let fx = Fixture::start().await.with_login().await;
    fx.clients("/api/reports/clients/", ("client_account", "12345"), json!({ "data": [] }))
        .await;
    fx.clients("/api/v2/reports/clients/", ("client_account", "12345"), json!({ "data": [] }))
        .await;

    let report = fx
        .validator
        .validate(Some("12345"), None)
        .await
        .expect("Should validate");

    assert!(!report.is_registered());
    assert_eq!(report.source, CheckSource::Registration);

    let stored = fx.store.get("12345").await.unwrap().expect("Should be stored");
    assert!(!stored.outcome.is_registered);
    assert_eq!(stored.id, report.record.id);
}

#[tokio::test]
async fn test_registered_client_fields() {
    let fx = Fixture::start().await.with_login().await;
    fx.clients(
        "/api/reports/clients/",
        ("client_account", "12345"),
        json!({
            "data": [{
                "client_account": "12345",
                "client_account_type": "Pro",
                "reg_date": "2023-11-20",
                "volume_lots": "4.2",
                "volume_mln_usd": 0.5,
                "reward": 7.125,
                "reward_usd": 7.5
            }]
        }),
    )
    .await;

    let report = fx
        .validator
        .validate(Some("12345"), Some("ignored@example.com"))
        .await
        .expect("Should validate");

    let outcome = &report.record.outcome;
    assert!(outcome.is_registered);
    assert_eq!(outcome.client_key, "12345");
    assert_eq!(outcome.reg_date, NaiveDate::from_ymd_opt(2023, 11, 20));
    assert_eq!(outcome.account_type.as_deref(), Some("Pro"));
    assert_eq!(outcome.volume_lots, 4.2);
    assert_eq!(outcome.volume_mln_usd, 0.5);
    assert_eq!(outcome.reward_usd, 7.5);

    let requests = fx.server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.url.path() != AFFILIATION));
}

#[tokio::test]
async fn test_validate_twice_updates_one_record() {
    let fx = Fixture::start().await.with_login().await;
    fx.clients("/api/reports/clients/", ("client_account", "12345"), json!({ "data": [] }))
        .await;

    let first = fx.validator.validate(Some("12345"), None).await.unwrap();
    let second = fx.validator.validate(Some("12345"), None).await.unwrap();

    assert_eq!(fx.store.count().await.unwrap(), 1);
    assert_eq!(first.record.id, second.record.id);
    assert_eq!(first.record.outcome, second.record.outcome);
    assert_eq!(first.record.created_at, second.record.created_at);
}

#[tokio::test]
async fn test_affiliated_email_with_link_code() {
    let fx = Fixture::start().await.with_login().await;
    fx.affiliation(
        "a@b.com",
        ResponseTemplate::new(200)
            .set_body_json(json!({ "is_affiliated": "true", "link_code": "X1" })),
    )
    .await;

    let report = fx
        .validator
        .validate(None, Some("a@b.com"))
        .await
        .expect("Should validate");

    assert_eq!(report.source, CheckSource::Affiliation);
    assert!(report.is_registered());
    assert_eq!(report.link_code.as_deref(), Some("X1"));
    assert_eq!(report.record.client_key(), "a@b.com");
    assert_eq!(
        report.record.outcome.account_type.as_deref(),
        Some(AFFILIATED_ACCOUNT_TYPE)
    );
}

#[tokio::test]
async fn test_affiliated_accounts_key_the_record() {
    let fx = Fixture::start().await.with_login().await;
    fx.affiliation(
        "e@f.com",
        ResponseTemplate::new(200).set_body_json(json!({ "accounts": [{ "id": 555 }] })),
    )
    .await;

    let report = fx.validator.validate(None, Some("e@f.com")).await.unwrap();

    assert_eq!(report.record.client_key(), "555");
    assert_eq!(report.record.outcome.account_id.as_deref(), Some("555"));
    assert_eq!(report.record.outcome.volume_lots, 0.0);
    assert!(fx.store.get("e@f.com").await.unwrap().is_none());
}

#[tokio::test]
async fn test_not_found_email_is_persisted() {
    let fx = Fixture::start().await.with_login().await;
    fx.affiliation("c@d.com", ResponseTemplate::new(404)).await;

    let report = fx.validator.validate(None, Some("c@d.com")).await.unwrap();

    assert!(!report.is_registered());
    assert!(report.notice.is_none());
    assert!(fx.store.get("c@d.com").await.unwrap().is_some());
}

#[tokio::test]
async fn test_degraded_affiliation_is_persisted_with_notice() {
    let fx = Fixture::start().await.with_login().await;
    fx.affiliation("a@b.com", ResponseTemplate::new(502)).await;

    let report = fx.validator.validate(None, Some("a@b.com")).await.unwrap();

    assert!(!report.is_registered());
    assert_eq!(
        report.notice.as_deref(),
        Some("API request failed with status code: 502")
    );
    assert_eq!(fx.store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_registration_failure_is_not_persisted() {
    let fx = Fixture::start().await.with_login().await;
    Mock::given(method("GET"))
        .and(path("/api/reports/clients/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&fx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/reports/clients/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&fx.server)
        .await;

    let err = fx
        .validator
        .validate(Some("12345"), None)
        .await
        .expect_err("Should fail");

    assert!(matches!(err, ValidationError::ApiFailed { status: Some(500), .. }));
    assert_eq!(fx.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_auth_failure_is_not_persisted() {
    let fx = Fixture::start().await;

    let err = fx
        .validator
        .validate(None, Some("a@b.com"))
        .await
        .expect_err("Should fail");

    assert_eq!(err.error_code(), "AUTH_FAILED");
    assert_eq!(fx.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_no_identifier_makes_no_calls() {
    let fx = Fixture::start().await;

    let err = fx
        .validator
        .validate(None, Some(""))
        .await
        .expect_err("Should fail");

    assert!(matches!(err, ValidationError::NoIdentifierProvided));
    assert!(fx.server.received_requests().await.unwrap().is_empty());
    assert_eq!(fx.store.count().await.unwrap(), 0);
}
