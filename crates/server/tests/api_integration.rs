//! API tests with mocked external dependencies.
//!
//! These tests run the full router in-process with mock implementations of
//! the search backend and both email providers.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use scout_core::testing::RecordedLookup;
use scout_core::{EmailProviderError, VerificationStatus};

use common::{fixtures, TestConfig, TestFixture};

const HR_DIRECTOR_QUERY: &str = "\"HR Director\" \"Acme Partners\" site:linkedin.com/in";

// =============================================================================
// Basic API Tests
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/health").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert_eq!(response.body["config_hash"], "0123456789abcdef");
}

#[tokio::test]
async fn test_config_endpoint_hides_secrets() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/config").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["server"]["port"], 8080);
    assert_eq!(response.body["waterfall"]["directory_overrides"], 1);
    assert_eq!(response.body["pipeline"]["max_per_organization"], 5);
    assert!(!response.text.contains("api_key\""));
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new();
    fixture.get("/api/v1/health").await;

    let response = fixture.get("/metrics").await;

    assert_status!(response, StatusCode::OK);
    assert!(response.text.contains("scout_http_requests_total"));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/nope").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Targeting
// =============================================================================

#[tokio::test]
async fn test_band_in_scope() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/targeting/band?headcount=300").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["skip"], false);
    assert_eq!(response.body["label"], "mid");
    assert_eq!(
        response.body["roles"],
        json!(["Early Careers Head", "HR Director"])
    );
}

#[tokio::test]
async fn test_band_out_of_scope() {
    let fixture = TestFixture::new();

    for headcount in [24, 501, 800] {
        let response = fixture
            .get(&format!("/api/v1/targeting/band?headcount={}", headcount))
            .await;
        assert_status!(response, StatusCode::OK);
        assert_eq!(response.body["skip"], true);
        assert!(response.body.get("label").is_none());
    }
}

#[tokio::test]
async fn test_band_requires_headcount() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/targeting/band").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Pipeline
// =============================================================================

#[tokio::test]
async fn test_pipeline_run_happy_path() {
    let fixture = TestFixture::new();
    fixture
        .searcher
        .add_response(
            HR_DIRECTOR_QUERY,
            vec![fixtures::profile_hit(
                "Jane Doe",
                "HR Director",
                "Acme Partners",
                "jane-doe",
            )],
        )
        .await;
    fixture
        .primary
        .add_person_response("Jane Doe", Ok(fixtures::verified("jane.doe@acme.com", 0.92)))
        .await;

    let response = fixture
        .post(
            "/api/v1/pipeline/run",
            json!({
                "companies": [
                    { "company_name": "Acme Partners", "headcount": 300 },
                    { "company_name": "Globex", "headcount": 800 }
                ]
            }),
        )
        .await;

    assert_status!(response, StatusCode::OK);
    let body = &response.body;
    assert!(body["run_id"].is_string());
    assert_eq!(body["skipped"], json!(["Globex"]));
    assert_eq!(body["results"].as_array().unwrap().len(), 1);

    let result = &body["results"][0];
    assert_eq!(result["organization"], "Acme Partners");
    assert_eq!(result["band"], "mid");

    let contact = &result["candidates"][0];
    assert_eq!(contact["name"], "Jane Doe");
    assert_eq!(contact["role"], "HR Director");
    assert_eq!(contact["organization"], "Acme Partners");
    assert_eq!(contact["provenance"], "search");
    assert_eq!(contact["email"], "jane.doe@acme.com");
    assert_eq!(contact["confidence"], 0.92);
    assert_eq!(contact["provider"], "anymail");

    assert_eq!(body["stats"]["queries_issued"], 2);
    assert_eq!(fixture.secondary.call_count().await, 0);
}

#[tokio::test]
async fn test_pipeline_run_respects_max_per_company() {
    let fixture = TestFixture::new();
    fixture
        .searcher
        .set_query_handler(|_| {
            Some(
                (0..5)
                    .map(|i| {
                        fixtures::profile_hit(
                            &format!("Person {}", i),
                            "HR Director",
                            "Acme Partners",
                            &format!("person-{}", i),
                        )
                    })
                    .collect(),
            )
        })
        .await;

    let response = fixture
        .post(
            "/api/v1/pipeline/run",
            json!({
                "companies": [{ "company_name": "Acme Partners", "headcount": 120 }],
                "max_per_company": 2
            }),
        )
        .await;

    assert_status!(response, StatusCode::OK);
    let candidates = response.body["results"][0]["candidates"].as_array().unwrap();
    assert_eq!(candidates.len(), 2);
    assert!(candidates.iter().all(|c| c["email"].is_null()));
    assert!(candidates.iter().all(|c| c["confidence"] == 0.0));
}

#[tokio::test]
async fn test_pipeline_run_rejects_empty_company_name() {
    let fixture = TestFixture::new();

    let response = fixture
        .post(
            "/api/v1/pipeline/run",
            json!({
                "companies": [
                    { "company_name": "Acme Partners", "headcount": 300 },
                    { "company_name": "  ", "headcount": 300 }
                ]
            }),
        )
        .await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("position 1"));
    assert_eq!(fixture.searcher.search_count().await, 0);
}

#[tokio::test]
async fn test_pipeline_run_rejects_empty_list() {
    let fixture = TestFixture::new();
    let response = fixture
        .post("/api/v1/pipeline/run", json!({ "companies": [] }))
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_pipeline_run_without_searcher() {
    let fixture = TestFixture::with_config(TestConfig::without_searcher());
    let response = fixture
        .post(
            "/api/v1/pipeline/run",
            json!({ "companies": [{ "company_name": "Acme Partners", "headcount": 300 }] }),
        )
        .await;
    assert_status!(response, StatusCode::SERVICE_UNAVAILABLE);
}

// =============================================================================
// Email lookups
// =============================================================================

#[tokio::test]
async fn test_find_email_person() {
    let fixture = TestFixture::new();
    fixture
        .primary
        .set_person_response(Ok(fixtures::verified("jane.doe@acme.com", 0.92)))
        .await;

    let response = fixture
        .post(
            "/api/v1/email/find",
            json!({ "full_name": "Jane Doe", "company": "Acme Partners" }),
        )
        .await;

    assert_status!(response, StatusCode::OK);
    let body = &response.body;
    assert_eq!(body["email"], "jane.doe@acme.com");
    assert_eq!(body["confidence"], 0.92);
    assert_eq!(body["source"], "anymail");
    assert_eq!(body["emails"][0]["email"], "jane.doe@acme.com");
    assert!(body.get("error").is_none());

    let logs: Vec<&str> = body["logs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l.as_str().unwrap())
        .collect();
    assert_eq!(logs[0], "Input: person search for \"Jane Doe\" at \"Acme Partners\"");
    assert!(logs[1].starts_with("anymail (person): found jane.doe@acme.com"));
    assert_eq!(logs[2], "Found: jane.doe@acme.com (92% confidence)");
}

#[tokio::test]
async fn test_find_email_person_miss_has_attempt_trail() {
    let fixture = TestFixture::new();
    fixture
        .primary
        .set_person_response(Err(EmailProviderError::QuotaExceeded))
        .await;

    let response = fixture
        .post(
            "/api/v1/email/find",
            json!({ "full_name": "Jane Doe", "company": "Acme Partners" }),
        )
        .await;

    assert_status!(response, StatusCode::OK);
    let body = &response.body;
    assert!(body["email"].is_null());
    assert_eq!(body["confidence"], 0.0);
    assert_eq!(body["error"], "No verified email found.");

    let logs = body["logs"].as_array().unwrap();
    assert_eq!(logs.len(), 4);
    assert!(logs[1]
        .as_str()
        .unwrap()
        .starts_with("anymail (person): provider_unavailable"));
    assert!(logs[2]
        .as_str()
        .unwrap()
        .starts_with("hunter (person): no_match"));

    // The secondary got the directory domain
    assert_eq!(
        fixture.secondary.recorded_calls().await,
        vec![RecordedLookup::Person {
            full_name: "Jane Doe".to_string(),
            organization_or_domain: "acme.com".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_find_email_person_requires_fields() {
    let fixture = TestFixture::new();

    let response = fixture
        .post("/api/v1/email/find", json!({ "full_name": "Jane Doe" }))
        .await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(fixture.primary.call_count().await, 0);
}

#[tokio::test]
async fn test_find_email_company_filters_risky() {
    let fixture = TestFixture::new();
    fixture
        .primary
        .set_organization_response(Ok(vec![
            fixtures::with_status("info@acme.com", 0.99, VerificationStatus::Risky),
            fixtures::verified("jane.doe@acme.com", 0.9)
                .with_person(Some("Jane Doe".to_string()), Some("HR Director".to_string())),
        ]))
        .await;

    let response = fixture
        .post(
            "/api/v1/email/find",
            json!({ "search_type": "company", "company": "Acme Partners" }),
        )
        .await;

    assert_status!(response, StatusCode::OK);
    let emails = response.body["emails"].as_array().unwrap();
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0]["email"], "jane.doe@acme.com");
    assert_eq!(emails[0]["full_name"], "Jane Doe");
    assert_eq!(emails[0]["job_title"], "HR Director");
    assert_eq!(response.body["source"], "anymail");

    assert_eq!(
        fixture.primary.recorded_calls().await,
        vec![RecordedLookup::Organization {
            domain: "acme.com".to_string()
        }]
    );
}

#[tokio::test]
async fn test_find_email_company_exhausted() {
    let fixture = TestFixture::new();

    let response = fixture
        .post(
            "/api/v1/email/find",
            json!({ "search_type": "company", "domain": "acme.com" }),
        )
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["emails"], json!([]));
    assert_eq!(response.body["error"], "No verified email found.");
    assert_eq!(response.body["logs"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_find_email_decision_maker() {
    let fixture = TestFixture::new();
    fixture
        .secondary
        .set_role_response(Ok(vec![fixtures::verified("people@acme.com", 0.8)]))
        .await;

    let response = fixture
        .post(
            "/api/v1/email/find",
            json!({
                "search_type": "decision_maker",
                "company": "Acme Partners",
                "job_roles": "Head of People"
            }),
        )
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["source"], "hunter");
    assert_eq!(response.body["emails"][0]["email"], "people@acme.com");

    let missing_roles = fixture
        .post(
            "/api/v1/email/find",
            json!({ "search_type": "decision_maker", "company": "Acme Partners" }),
        )
        .await;
    assert_status!(missing_roles, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_find_email_linkedin_inferred_from_url() {
    let fixture = TestFixture::new();
    fixture
        .primary
        .set_profile_response(Ok(fixtures::verified("jane.doe@acme.com", 0.95)
            .with_person(Some("Jane Doe".to_string()), Some("HR Director".to_string()))
            .with_organization(Some("Acme Partners".to_string()))))
        .await;

    let response = fixture
        .post(
            "/api/v1/email/find",
            json!({ "linkedin_url": "https://www.linkedin.com/in/jane-doe" }),
        )
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["email"], "jane.doe@acme.com");
    assert_eq!(response.body["emails"][0]["full_name"], "Jane Doe");
    assert_eq!(response.body["emails"][0]["job_title"], "HR Director");
    assert_eq!(
        fixture.primary.recorded_calls().await,
        vec![RecordedLookup::Profile {
            profile_url: "https://www.linkedin.com/in/jane-doe".to_string()
        }]
    );
}

#[tokio::test]
async fn test_find_email_unknown_search_type() {
    let fixture = TestFixture::new();
    let response = fixture
        .post(
            "/api/v1/email/find",
            json!({ "search_type": "fax", "full_name": "Jane Doe", "company": "Acme" }),
        )
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_find_email_without_providers() {
    let fixture = TestFixture::with_config(TestConfig::without_providers());
    let response = fixture
        .post(
            "/api/v1/email/find",
            json!({ "full_name": "Jane Doe", "company": "Acme Partners" }),
        )
        .await;
    assert_status!(response, StatusCode::SERVICE_UNAVAILABLE);
}
