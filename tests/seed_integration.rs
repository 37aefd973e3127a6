//! Integration tests for feed-backed seed sources.

use kitscan_core::{FeedKind, FeedSource, ReaderSource, SeedError, SeedSource};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_feed_source_concatenates_feeds_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/online-valid.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[{"url":"http://a.test/login","phish_id":1},{"url":"http://b.test/x"}]"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/feed.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("http://c.test/\n\nhttp://d.test/y\n"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/csv_recent/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "# URLhaus dump\n\"1\",\"2024-01-01 00:00:00\",\"http://e.test/kit.exe\",\"online\"\n",
        ))
        .mount(&server)
        .await;

    let mut source = FeedSource::with_endpoints(vec![
        (FeedKind::PhishTank, format!("{}/online-valid.json", server.uri())),
        (FeedKind::OpenPhish, format!("{}/feed.txt", server.uri())),
        (FeedKind::UrlHaus, format!("{}/csv_recent/", server.uri())),
    ])
    .unwrap();

    let seeds = source.seeds().await.unwrap();
    assert_eq!(
        seeds,
        vec![
            "http://a.test/login",
            "http://b.test/x",
            "http://c.test/",
            "http://d.test/y",
            "http://e.test/kit.exe",
        ]
    );
}

#[tokio::test]
async fn test_feed_source_error_status_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed.txt"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut source = FeedSource::with_endpoints(vec![(
        FeedKind::OpenPhish,
        format!("{}/feed.txt", server.uri()),
    )])
    .unwrap();

    let result = source.seeds().await;
    assert!(matches!(result, Err(SeedError::Status { status: 503, .. })), "got {result:?}");
}

#[tokio::test]
async fn test_feed_source_malformed_json_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/online-valid.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>rate limited</html>"))
        .mount(&server)
        .await;

    let mut source = FeedSource::with_endpoints(vec![(
        FeedKind::PhishTank,
        format!("{}/online-valid.json", server.uri()),
    )])
    .unwrap();

    let result = source.seeds().await;
    assert!(matches!(result, Err(SeedError::Decode { .. })), "got {result:?}");
}

#[tokio::test]
async fn test_reader_source_reads_piped_lines() {
    let input: &[u8] = b"  http://a.test/one  \n\n\thttp://b.test/two\r\n";
    let mut source = ReaderSource::new(input);

    assert_eq!(
        source.seeds().await.unwrap(),
        vec!["http://a.test/one", "http://b.test/two"]
    );
    assert!(source.seeds().await.unwrap().is_empty());
}
