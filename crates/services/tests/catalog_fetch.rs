use std::sync::Arc;

use serde_json::json;
use services::auth::StaticToken;
use services::{CatalogError, CatalogService, TutorConfig};
use tutor_core::model::SeriesId;
use tutor_core::time::fixed_clock;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn catalog(server: &MockServer, token: StaticToken) -> CatalogService {
    let config = TutorConfig::default().with_base_url(server.uri());
    CatalogService::new(config, fixed_clock(), Arc::new(token))
}

#[tokio::test]
async fn fetches_and_normalizes_series() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/content/series/OT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "series": "OT",
            "title": "Orientation",
            "data": [
                {"id": "OT-1", "title": "Welcome", "chunks": [{"text": "hello"}, {"text": "world"}]},
                {"id": "OT-2", "title": "Next"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let catalog = catalog(&server, StaticToken::none());
    let series = catalog.get_series("ot").await.unwrap();
    assert_eq!(series.series_id(), SeriesId::Ot);
    assert_eq!(series.lessons().len(), 2);
    assert_eq!(series.lessons()[0].paragraphs(), ["hello", "world"]);

    // second call is served from memory
    let again = catalog.get_series("OT").await.unwrap();
    assert!(Arc::ptr_eq(&series, &again));
}

#[tokio::test]
async fn clearing_cache_refetches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/content/series/U"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"id": "U-1", "text": "t"}])),
        )
        .expect(2)
        .mount(&server)
        .await;

    let catalog = catalog(&server, StaticToken::none());
    catalog.get_series("U").await.unwrap();
    catalog.clear_cache();
    catalog.get_series("U").await.unwrap();
}

#[tokio::test]
async fn sends_bearer_token_when_available() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/content/series/L"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"lessons": [{"id": "L-1"}]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let series = catalog(&server, StaticToken::new("secret"))
        .get_series("L")
        .await
        .unwrap();
    assert_eq!(series.lessons()[0].lesson_id(), "L-1");
}

#[tokio::test]
async fn failures_carry_the_attempted_url() {
    let server = MockServer::start().await;
    Mock::given(path("/content/series/C"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(path("/content/series/OT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"lessons": []})))
        .mount(&server)
        .await;

    let catalog = catalog(&server, StaticToken::none());

    let err = catalog.get_series("C").await.unwrap_err();
    assert!(matches!(err, CatalogError::HttpStatus { .. }));
    assert_eq!(err.url(), format!("{}/content/series/C", server.uri()));
    assert!(err.to_string().contains("/content/series/C"));

    let err = catalog.get_series("OT").await.unwrap_err();
    assert!(matches!(err, CatalogError::NoLessons { .. }));
    assert_eq!(err.tried_urls(), [format!("{}/content/series/OT", server.uri())]);
}

#[tokio::test]
async fn non_json_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(path("/content/series/OT"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = catalog(&server, StaticToken::none())
        .get_series("OT")
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Decode { .. }));
}
