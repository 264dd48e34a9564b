use std::time::Duration;

use harvester_engine::{
    ApiKey, FailureKind, FetchOutcome, FetchSettings, Fetcher, HarvestConfig, ReqwestFetcher,
};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher_for(base_url: &str, settings: FetchSettings) -> ReqwestFetcher {
    let config = HarvestConfig {
        api_key: ApiKey::new("test-key"),
        base_url: base_url.to_string(),
        ..HarvestConfig::default()
    };
    ReqwestFetcher::new(config.endpoint().expect("endpoint"), settings).expect("client")
}

fn movie_payload() -> serde_json::Value {
    json!({
        "id": 603,
        "title": "The Matrix",
        "original_title": "The Matrix",
        "budget": 63000000,
        "revenue": 463517383,
        "release_date": "1999-03-31",
        "vote_average": 8.2,
        "vote_count": 24000,
        "popularity": 80.5,
        "overview": "A hacker learns the truth.",
        "original_language": "en",
        "runtime": 136,
        "tagline": "Welcome to the Real World.",
        "genres": [{"id": 28, "name": "Action"}, {"id": 878, "name": "Science Fiction"}],
        "belongs_to_collection": {"id": 2344, "name": "The Matrix Collection"},
        "keywords": {"keywords": [{"id": 1, "name": "simulated reality"}]},
        "credits": {
            "cast": [{"name": "Keanu Reeves", "gender": 2}],
            "crew": [{"name": "Lana Wachowski", "gender": 1, "job": "Director"}]
        },
        "release_dates": {"results": [
            {"iso_3166_1": "US", "release_dates": [{"certification": "R"}]}
        ]}
    })
}

#[tokio::test]
async fn found_payload_is_parsed_with_enrichments() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/603"))
        .and(query_param("api_key", "test-key"))
        .and(query_param(
            "append_to_response",
            "keywords,credits,release_dates",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(movie_payload()))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server.uri(), FetchSettings::default());
    let outcome = fetcher.fetch(603).await;

    let FetchOutcome::Found(record) = outcome else {
        panic!("expected Found, got {outcome:?}");
    };
    assert_eq!(record.id, Some(603));
    assert_eq!(record.title.as_deref(), Some("The Matrix"));
    let cast = record.credits.as_ref().and_then(|c| c.cast.as_ref()).unwrap();
    assert_eq!(cast[0].name.as_deref(), Some("Keanu Reeves"));
    assert_eq!(
        record.keywords.as_ref().and_then(|k| k.keywords.as_ref()).map(Vec::len),
        Some(1)
    );
}

#[tokio::test]
async fn not_found_status_is_classified_as_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/7"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"status_code": 34, "status_message": "not found"})),
        )
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server.uri(), FetchSettings::default());
    assert_eq!(fetcher.fetch(7).await, FetchOutcome::NotFound { status: 404 });
}

#[tokio::test]
async fn other_unsuccessful_status_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/8"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server.uri(), FetchSettings::default());
    assert_eq!(fetcher.fetch(8).await, FetchOutcome::NotFound { status: 500 });
}

#[tokio::test]
async fn invalid_json_is_transient_parse_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/9"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{not json", "application/json"))
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server.uri(), FetchSettings::default());
    match fetcher.fetch(9).await {
        FetchOutcome::Transient(err) => assert_eq!(err.kind, FailureKind::Parse),
        other => panic!("expected Transient, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_body_is_transient_parse_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/10"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server.uri(), FetchSettings::default());
    match fetcher.fetch(10).await {
        FetchOutcome::Transient(err) => assert_eq!(err.kind, FailureKind::Parse),
        other => panic!("expected Transient, got {other:?}"),
    }
}

#[tokio::test]
async fn slow_response_is_transient_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_json(movie_payload()),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        request_timeout: Duration::from_millis(50),
        ..FetchSettings::default()
    };
    let fetcher = fetcher_for(&server.uri(), settings);
    match fetcher.fetch(2).await {
        FetchOutcome::Transient(err) => assert_eq!(err.kind, FailureKind::Timeout),
        other => panic!("expected Transient, got {other:?}"),
    }
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/3"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "application/json")
                .set_body_string("{\"id\": 3, \"title\": \"x\"}"),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        max_bytes: 10,
        ..FetchSettings::default()
    };
    let fetcher = fetcher_for(&server.uri(), settings);
    match fetcher.fetch(3).await {
        FetchOutcome::Transient(err) => {
            assert!(matches!(err.kind, FailureKind::TooLarge { max_bytes: 10, .. }))
        }
        other => panic!("expected Transient, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_host_is_transient_and_hides_the_key() {
    // Port 9 (discard) on localhost is expected to refuse connections.
    let settings = FetchSettings {
        connect_timeout: Duration::from_millis(200),
        request_timeout: Duration::from_millis(500),
        ..FetchSettings::default()
    };
    let fetcher = fetcher_for("http://127.0.0.1:9", settings);
    match fetcher.fetch(1).await {
        FetchOutcome::Transient(err) => {
            assert!(matches!(err.kind, FailureKind::Network | FailureKind::Timeout));
            assert!(!err.message.contains("test-key"));
        }
        other => panic!("expected Transient, got {other:?}"),
    }
}
