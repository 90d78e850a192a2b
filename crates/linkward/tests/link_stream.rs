mod common;

use std::path::PathBuf;
use std::time::Duration;

use common::{MockServer, Reply, clock};
use linkward::{Clock, Link, LinkStream, RequestsPerInterval, count_at_least, count_at_most};

fn rendered(errors: &linkward::ValidationErrorStream) -> Vec<String> {
    errors.results().iter().map(ToString::to_string).collect()
}

#[tokio::test]
async fn test_retry_succeeds_after_retry_after() {
    let clock = clock();
    let server = MockServer::new(clock.clone()).route(
        "https://x.org/flaky",
        [Reply::status(503).header("Retry-After", "1"), Reply::status(200)],
    );

    let errors = LinkStream::from_uris(["https://x.org/flaky"])
        .retry_attempts(1)
        .clock(clock.clone())
        .validate(server.clone())
        .await
        .unwrap();

    assert!(errors.is_empty());
    let log = server.log();
    assert_eq!(log.len(), 2);
    assert_eq!(log[1].at_ms - log[0].at_ms, 1000);
}

#[tokio::test]
async fn test_retry_exhausted() {
    let clock = clock();
    let server = MockServer::new(clock.clone())
        .route("https://x.org/busy", [Reply::status(503).header("Retry-After", "1")]);

    let errors = LinkStream::from_uris(["https://x.org/busy"])
        .retry_attempts(1)
        .clock(clock)
        .validate(server.clone())
        .await
        .unwrap();

    assert_eq!(
        rendered(&errors),
        ["https://x.org/busy: 503, Retry-After: 1, attempted 2 times"]
    );
    assert_eq!(errors.results()[0].attempts(), 2);
    assert_eq!(server.log().len(), 2);
}

#[tokio::test]
async fn test_overall_timeout_before_first_try() {
    let clock = clock();
    let server = MockServer::with_latency(clock.clone(), Duration::from_millis(200))
        .page("https://x.org/slow")
        .page("https://x.org/queued");

    let errors = LinkStream::from_uris(["https://x.org/slow", "https://x.org/queued"])
        .overall_timeout(Duration::from_millis(100))
        .clock(clock)
        .validate(server.clone())
        .await
        .unwrap();

    assert_eq!(
        rendered(&errors),
        ["https://x.org/queued: Did not try, overall timeout of 100 ms expired, attempted 0 times"]
    );
    assert_eq!(server.requested(), ["https://x.org/slow"]);
}

#[tokio::test]
async fn test_retry_after_deadline_is_not_attempted() {
    let clock = clock();
    let server = MockServer::new(clock.clone())
        .route("https://x.org/busy", [Reply::status(503).header("Retry-After", "60")]);

    let errors = LinkStream::from_uris(["https://x.org/busy"])
        .retry_attempts(3)
        .overall_timeout(Duration::from_secs(10))
        .clock(clock)
        .validate(server.clone())
        .await
        .unwrap();

    assert_eq!(
        rendered(&errors),
        ["https://x.org/busy: Did not try again, overall timeout of 10000 ms expired, attempted 1 times"]
    );
    assert_eq!(server.log().len(), 1);
}

#[tokio::test]
async fn test_rate_limit_spreads_requests() {
    let clock = clock();
    let uris: Vec<String> = (1..=4).map(|i| format!("https://x.org/{i}")).collect();
    let server = uris
        .iter()
        .fold(MockServer::new(clock.clone()), |server, uri| server.page(uri));

    let errors = LinkStream::from_uris(uris.clone())
        .clock(clock)
        .group("https://x\\.org/.*")
        .unwrap()
        .rate_limit(RequestsPerInterval::new(2, Duration::from_millis(1010)))
        .end_group()
        .unwrap()
        .validate(server.clone())
        .await
        .unwrap();

    assert!(errors.is_empty());
    let log = server.log();
    assert_eq!(log.len(), 4);
    assert!(log[3].at_ms - log[0].at_ms > 999);
    let offsets: Vec<u64> = log.iter().map(|access| access.at_ms - log[0].at_ms).collect();
    assert_eq!(offsets, [0, 0, 1010, 1010]);
}

#[tokio::test]
async fn test_rate_limit_applies_to_fragments_of_one_page() {
    let clock = clock();
    let server = MockServer::new(clock.clone()).route(
        "https://x.org/p",
        [Reply::html(
            r#"<html><body><h2 id="a">A</h2><h2 id="b">B</h2><h2 id="c">C</h2><h2 id="d">D</h2></body></html>"#,
        )],
    );
    let start = clock.now_millis();

    let errors = LinkStream::from_uris(["a", "b", "c", "d"].map(|id| format!("https://x.org/p#{id}")))
        .clock(clock.clone())
        .group("https://x\\.org/.*")
        .unwrap()
        .rate_limit(RequestsPerInterval::new(2, Duration::from_millis(1010)))
        .end_group()
        .unwrap()
        .validate(server.clone())
        .await
        .unwrap();

    assert!(errors.is_empty(), "{}", rendered(&errors).join("\n"));
    assert_eq!(server.requested(), ["https://x.org/p"]);
    assert!(clock.now_millis() - start >= 1010);
}

#[tokio::test]
async fn test_rate_limit_delay_past_deadline() {
    let clock = clock();
    let server = MockServer::new(clock.clone())
        .page("https://x.org/1")
        .page("https://x.org/2");

    let errors = LinkStream::from_uris(["https://x.org/1", "https://x.org/2"])
        .overall_timeout(Duration::from_secs(10))
        .clock(clock)
        .group("https://x\\.org/.*")
        .unwrap()
        .rate_limit(RequestsPerInterval::new(1, Duration::from_secs(60)))
        .end_group()
        .unwrap()
        .validate(server.clone())
        .await
        .unwrap();

    assert_eq!(
        rendered(&errors),
        ["https://x.org/2: Did not try again, overall timeout of 10000 ms expired, attempted 0 times"]
    );
    assert_eq!(server.requested(), ["https://x.org/1"]);
}

#[tokio::test]
async fn test_fragments_share_one_fetch() {
    let clock = clock();
    let server = MockServer::new(clock.clone()).route(
        "https://x.org/api.html",
        [Reply::html(
            r#"<html><body><a id="parse(java.lang.CharSequence)"></a><h2 id="usage">Usage</h2></body></html>"#,
        )],
    );

    let errors = LinkStream::from_uris([
        "https://x.org/api.html#parse(java.lang.CharSequence)",
        "https://x.org/api.html#usage",
        "https://x.org/api.html#missing",
        "https://x.org/api.html",
    ])
    .clock(clock)
    .validate(server.clone())
    .await
    .unwrap();

    assert_eq!(
        rendered(&errors),
        ["https://x.org/api.html#missing: Could not find #missing, attempted 1 times"]
    );
    assert_eq!(server.log().len(), 1);
}

#[tokio::test]
async fn test_final_policy_reports_group_pattern() {
    let clock = clock();
    let server = MockServer::new(clock.clone())
        .page("https://x.org/1")
        .page("https://x.org/2")
        .page("https://x.org/3");

    let errors = LinkStream::from_uris(["https://x.org/1", "https://x.org/2", "https://x.org/3"])
        .clock(clock)
        .group("https://x\\.org/.*")
        .unwrap()
        .final_policy(count_at_least(200, 4))
        .end_group()
        .unwrap()
        .validate(server)
        .await
        .unwrap();

    assert_eq!(
        rendered(&errors),
        ["https://x\\.org/.*: Expected at least 4 200 responses, but found 3 200 responses, attempted 0 times"]
    );
}

#[tokio::test]
async fn test_give_up_after_first_429() {
    let clock = clock();
    let api: Vec<String> = (1..=5).map(|i| format!("https://api.x.org/{i}")).collect();
    let server = api.iter().fold(
        MockServer::new(clock.clone()).page("https://x.org/home"),
        |server, uri| server.route(uri, [Reply::status(429).header("Retry-After", "1")]),
    );

    let links = std::iter::once("https://x.org/home".to_string()).chain(api);
    let errors = LinkStream::from_uris(links)
        .retry_attempts(2)
        .clock(clock)
        .group("https://api\\.x\\.org/.*")
        .unwrap()
        .continuation_policy(count_at_most(429, 0))
        .end_group()
        .unwrap()
        .validate(server.clone())
        .await
        .unwrap();

    assert!(errors.is_empty());
    assert_eq!(server.requested(), ["https://x.org/home", "https://api.x.org/1"]);
}

#[tokio::test]
async fn test_final_policy_runs_after_continuation_stops_group() {
    let clock = clock();
    let server = MockServer::new(clock.clone())
        .page("https://api.x.org/1")
        .route("https://api.x.org/2", [Reply::status(429).header("Retry-After", "1")])
        .page("https://api.x.org/3")
        .page("https://api.x.org/4");

    let errors = LinkStream::from_uris((1..=4).map(|i| format!("https://api.x.org/{i}")))
        .retry_attempts(2)
        .clock(clock)
        .group("https://api\\.x\\.org/.*")
        .unwrap()
        .continuation_policy(count_at_most(429, 0))
        .final_policy(count_at_least(200, 3))
        .end_group()
        .unwrap()
        .validate(server.clone())
        .await
        .unwrap();

    assert_eq!(
        rendered(&errors),
        ["https://api\\.x\\.org/.*: Expected at least 3 200 responses, but found 1 200 responses, attempted 0 times"]
    );
    assert_eq!(server.requested(), ["https://api.x.org/1", "https://api.x.org/2"]);
}

#[tokio::test]
async fn test_basic_auth() {
    const AUTHORIZATION: &str = "Basic am9lOnNlY3JldDEyMzQ=";
    let check = |username: &'static str, password: &'static str| async move {
        let clock = clock();
        let server = MockServer::new(clock.clone())
            .page("https://x.org/private")
            .protect("https://x.org/private", AUTHORIZATION);
        LinkStream::from_uris(["https://x.org/private"])
            .clock(clock)
            .group("https://x\\.org/.*")
            .unwrap()
            .basic_auth(username, password)
            .end_group()
            .unwrap()
            .validate(server)
            .await
            .unwrap()
    };

    assert!(check("joe", "secret1234").await.is_empty());
    assert_eq!(
        rendered(&check("joe", "wrong").await),
        ["https://x.org/private: 401, attempted 1 times"]
    );

    let clock = clock();
    let server = MockServer::new(clock.clone())
        .page("https://x.org/private")
        .protect("https://x.org/private", AUTHORIZATION);
    let anonymous = LinkStream::from_uris(["https://x.org/private"])
        .clock(clock)
        .validate(server)
        .await
        .unwrap();
    assert_eq!(anonymous.results()[0].status(), 401);
}

#[tokio::test]
async fn test_bearer_token_goes_to_matching_group_only() {
    let clock = clock();
    let server = MockServer::new(clock.clone())
        .page("https://api.x.org/me")
        .protect("https://api.x.org/me", "Bearer deadbeef")
        .page("https://x.org/public");

    let errors = LinkStream::from_uris(["https://api.x.org/me", "https://x.org/public"])
        .clock(clock)
        .group("https://api\\.x\\.org/.*")
        .unwrap()
        .bearer_token("deadbeef")
        .end_group()
        .unwrap()
        .validate(server.clone())
        .await
        .unwrap();

    assert!(errors.is_empty());
    let log = server.log();
    assert_eq!(log[0].headers, [("Authorization".to_string(), "Bearer deadbeef".to_string())]);
    assert!(log[1].headers.is_empty());
}

#[tokio::test]
async fn test_first_matching_group_wins() {
    let clock = clock();
    let server = MockServer::new(clock.clone()).page("https://x.org/a");

    LinkStream::from_uris(["https://x.org/a"])
        .clock(clock)
        .group("https://x\\.org/.*")
        .unwrap()
        .header("X-Group", "first")
        .end_group()
        .unwrap()
        .group("https://x\\.org/a")
        .unwrap()
        .header("X-Group", "second")
        .end_group()
        .unwrap()
        .validate(server.clone())
        .await
        .unwrap();

    assert_eq!(server.log()[0].headers[0].1, "first");
}

#[tokio::test]
async fn test_random_order_keeps_other_links_first() {
    let clock = clock();
    let members: Vec<String> = (0..10).map(|i| format!("https://x.org/r/{i}")).collect();
    let others: Vec<String> = (0..3).map(|i| format!("https://x.org/o/{i}")).collect();
    let mut interleaved = members.clone();
    for (i, other) in others.iter().enumerate() {
        interleaved.insert(2 * i + 1, other.clone());
    }
    let server = interleaved
        .iter()
        .fold(MockServer::new(clock.clone()), |server, uri| server.page(uri));

    let errors = LinkStream::from_uris(interleaved)
        .clock(clock)
        .group("https://x\\.org/r/.*")
        .unwrap()
        .random_order()
        .end_group()
        .unwrap()
        .validate(server.clone())
        .await
        .unwrap();

    assert!(errors.is_empty());
    let requested = server.requested();
    assert_eq!(requested[..3], others[..]);
    let mut tail = requested[3..].to_vec();
    tail.sort();
    let mut expected = members;
    expected.sort();
    assert_eq!(tail, expected);
}

#[tokio::test]
async fn test_link_mapper_reports_original_link() {
    let clock = clock();
    let server = MockServer::new(clock.clone()).route("https://mirror.x.org/doc", [Reply::status(410)]);

    let errors = LinkStream::new([Link::new(
        "doc",
        "https://x.org/doc",
        [PathBuf::from("/site/index.html")],
    )])
    .clock(clock)
    .group("https://x\\.org/.*")
    .unwrap()
    .link_mapper(|link| link.map_to_uri(link.resolved_uri().replace("//x.org", "//mirror.x.org")))
    .end_group()
    .unwrap()
    .validate(server.clone())
    .await
    .unwrap();

    assert_eq!(server.requested(), ["https://mirror.x.org/doc"]);
    let result = &errors.results()[0];
    assert_eq!(result.status(), 410);
    assert_eq!(result.link().mapped_from().map(Link::resolved_uri), Some("https://x.org/doc"));
    assert_eq!(result.link().original_uri(), "doc");
}

#[tokio::test]
async fn test_transport_errors_are_terminal() {
    let clock = clock();
    let server = MockServer::new(clock.clone());

    let errors = LinkStream::from_uris(["http://refused.invalid/"])
        .retry_attempts(3)
        .clock(clock)
        .validate(server.clone())
        .await
        .unwrap();

    assert_eq!(
        rendered(&errors),
        ["http://refused.invalid/: Unable to connect: Connection refused, attempted 1 times"]
    );
    assert_eq!(server.log().len(), 1);
}

#[tokio::test]
async fn test_concurrent_dispatch_keeps_link_order() {
    let clock = clock();
    let server = MockServer::new(clock.clone())
        .route("https://x.org/a", [Reply::status(404)])
        .page("https://x.org/b")
        .route("https://x.org/c", [Reply::status(500).header("Retry-After", "1")])
        .route("https://x.org/d", [Reply::status(403)]);

    let errors = LinkStream::from_uris(["https://x.org/a", "https://x.org/b", "https://x.org/c", "https://x.org/d"])
        .concurrency(4)
        .retry_attempts(1)
        .clock(clock)
        .validate(server)
        .await
        .unwrap();

    assert_eq!(
        rendered(&errors),
        [
            "https://x.org/a: 404, attempted 1 times",
            "https://x.org/d: 403, attempted 1 times",
            "https://x.org/c: 500, Retry-After: 1, attempted 2 times",
        ]
    );
}
