//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock sites and run the full crawl
//! cycle end-to-end against an in-memory page cache.

use site_sage::cache::{PageCache, SqliteCache};
use site_sage::config::{CrawlerConfig, RobotsPolicy, UserAgentConfig};
use site_sage::crawler::{build_http_client, CrawlEngine, PageFetcher};
use site_sage::state::PageState;
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a fast test configuration for the given seed
fn create_test_config(seed: &str) -> CrawlerConfig {
    CrawlerConfig {
        seed_url: seed.to_string(),
        max_depth: 5,
        max_concurrent_fetches: 4,
        crawl_delay_ms: 5,
        request_timeout_secs: 10,
        crawl_timeout_secs: 30,
        max_retries: 0,
        retry_backoff_ms: 10,
        robots_policy: RobotsPolicy::Respect,
    }
}

fn create_engine(config: &CrawlerConfig, cache: Arc<dyn PageCache>) -> CrawlEngine {
    let client = build_http_client(
        &UserAgentConfig {
            value: "TestBot/1.0".to_string(),
        },
        Duration::from_secs(config.request_timeout_secs),
    )
    .expect("Failed to build client");
    CrawlEngine::new(config, "TestBot", PageFetcher::new(client), cache)
}

fn memory_cache() -> Arc<SqliteCache> {
    Arc::new(SqliteCache::new_in_memory().expect("Failed to open cache"))
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, page_path: &str, body: &str, times: u64) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(html(body))
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_cyclic_site_visits_each_page_once() {
    let server = MockServer::start().await;

    // A -> B, C; B -> D; C -> nothing; D -> A
    mount_page(&server, "/", r#"<p>alpha</p><a href="/b">x</a><a href="/c">x</a>"#, 1).await;
    mount_page(&server, "/b", r#"<p>bravo</p><a href="/d">x</a>"#, 1).await;
    mount_page(&server, "/c", "<p>charlie</p>", 1).await;
    mount_page(&server, "/d", r#"<p>delta</p><a href="/">x</a>"#, 1).await;

    let config = create_test_config(&format!("{}/", server.uri()));
    let engine = create_engine(&config, memory_cache());

    let result = engine.crawl(&config.seed_url, 5).await.unwrap();

    assert_eq!(result.visited.len(), 4);
    assert_eq!(result.count(PageState::Processed), 4);
    for word in ["alpha", "bravo", "charlie", "delta"] {
        assert_eq!(result.text.matches(word).count(), 1, "{} not exactly once", word);
    }

    // Pre-order over the discovery tree: A, B, D, C
    let pos = |word: &str| result.text.find(word).unwrap();
    assert!(pos("alpha") < pos("bravo"));
    assert!(pos("bravo") < pos("delta"));
    assert!(pos("delta") < pos("charlie"));
    assert!(!result.timed_out);
}

#[tokio::test]
async fn test_shared_link_fetched_once_under_concurrency() {
    let server = MockServer::start().await;

    let links: String = (0..10)
        .map(|i| format!(r#"<a href="/p{}">p</a>"#, i))
        .collect();
    mount_page(&server, "/", &links, 1).await;
    for i in 0..10 {
        mount_page(
            &server,
            &format!("/p{}", i),
            r#"<a href="/shared">s</a><a href="/">home</a>"#,
            1,
        )
        .await;
    }
    mount_page(&server, "/shared", "<p>shared page</p>", 1).await;

    let mut config = create_test_config(&format!("{}/", server.uri()));
    config.max_concurrent_fetches = 8;
    config.crawl_delay_ms = 0;
    let engine = create_engine(&config, memory_cache());

    let result = engine.crawl_site().await.unwrap();

    assert_eq!(result.visited.len(), 12);
    assert_eq!(result.text.matches("shared page").count(), 1);
}

#[tokio::test]
async fn test_depth_bound() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<p>zero</p><a href="/one">x</a>"#, 1).await;
    mount_page(&server, "/one", r#"<p>one</p><a href="/two">x</a>"#, 1).await;
    mount_page(&server, "/two", r#"<p>two</p><a href="/three">x</a>"#, 1).await;
    mount_page(&server, "/three", "<p>three</p>", 0).await;

    let config = create_test_config(&format!("{}/", server.uri()));
    let engine = create_engine(&config, memory_cache());

    let result = engine.crawl(&config.seed_url, 2).await.unwrap();

    assert_eq!(result.visited.len(), 3);
    assert!(result.pages.iter().all(|p| p.depth <= 2));
    assert!(!result.text.contains("three"));
}

#[tokio::test]
async fn test_depth_zero_fetches_only_seed() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<p>seed</p><a href="/next">x</a>"#, 1).await;
    mount_page(&server, "/next", "<p>next</p>", 0).await;

    let config = create_test_config(&format!("{}/", server.uri()));
    let engine = create_engine(&config, memory_cache());

    let result = engine.crawl(&config.seed_url, 0).await.unwrap();
    assert_eq!(result.visited, vec![config.seed_url.clone()]);
}

#[tokio::test]
async fn test_same_origin_containment() {
    let server = MockServer::start().await;
    let other = MockServer::start().await;

    mount_page(
        &server,
        "/",
        &format!(
            r#"<p>home</p><a href="{}/foreign">x</a><a href="/local">x</a>"#,
            other.uri()
        ),
        1,
    )
    .await;
    mount_page(&server, "/local", "<p>local</p>", 1).await;
    mount_page(&other, "/foreign", "<p>foreign</p>", 0).await;

    let config = create_test_config(&format!("{}/", server.uri()));
    let engine = create_engine(&config, memory_cache());

    let result = engine.crawl_site().await.unwrap();

    assert_eq!(result.visited.len(), 2);
    assert!(result
        .visited
        .iter()
        .all(|u| u.starts_with(&server.uri())));
    assert!(!result.text.contains("foreign"));
}

#[tokio::test]
async fn test_cache_short_circuit() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<p>home</p><a href="/cached">x</a>"#, 1).await;
    mount_page(&server, "/cached", "<p>live</p>", 0).await;

    let cache = memory_cache();
    cache
        .put(&format!("{}/cached", server.uri()), "from cache")
        .unwrap();

    let config = create_test_config(&format!("{}/", server.uri()));
    let engine = create_engine(&config, cache);

    let result = engine.crawl_site().await.unwrap();

    assert!(result.text.contains("from cache"));
    assert!(!result.text.contains("live"));
    assert_eq!(result.count(PageState::Cached), 1);
}

#[tokio::test]
async fn test_fresh_fetch_writes_through_and_second_crawl_uses_cache() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<p>home</p><a href="/about">x</a>"#, 1).await;
    mount_page(&server, "/about", "<p>about us</p>", 1).await;

    let cache = memory_cache();
    let config = create_test_config(&format!("{}/", server.uri()));
    let engine = create_engine(&config, cache.clone());

    let first = engine.crawl_site().await.unwrap();
    assert!(first.text.contains("about us"));
    assert_eq!(cache.count().unwrap(), 2);
    assert_eq!(
        cache.get(&config.seed_url).unwrap().as_deref(),
        Some("home x")
    );

    // A cached seed is not expanded again
    let second = engine.crawl_site().await.unwrap();
    assert_eq!(second.text, "home x");
    assert_eq!(second.visited.len(), 1);
    assert_eq!(second.count(PageState::Cached), 1);
}

#[tokio::test]
async fn test_unreachable_seed_degrades_to_empty() {
    let config = create_test_config("http://127.0.0.1:9/");
    let engine = create_engine(&config, memory_cache());

    let result = engine.crawl_site().await.unwrap();

    assert!(result.is_empty());
    assert_eq!(result.visited.len(), 1);
    assert_eq!(result.pages[0].state, PageState::Failed);
}

#[tokio::test]
async fn test_failed_branch_does_not_stop_siblings() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<p>home</p><a href="/gone">x</a><a href="/ok">x</a>"#, 1).await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/ok", "<p>still here</p>", 1).await;

    let config = create_test_config(&format!("{}/", server.uri()));
    let engine = create_engine(&config, memory_cache());

    let result = engine.crawl_site().await.unwrap();

    assert!(result.text.contains("still here"));
    assert_eq!(result.count(PageState::Failed), 1);
}

#[tokio::test]
async fn test_invalid_seed_is_an_error() {
    let config = create_test_config("https://example.test/");
    let engine = create_engine(&config, memory_cache());

    assert!(engine.crawl("not a url", 3).await.is_err());
    assert!(engine.crawl("ftp://example.test/", 3).await.is_err());
}

async fn mount_robots_site(server: &MockServer, private_hits: u64) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private/"))
        .mount(server)
        .await;
    mount_page(
        server,
        "/",
        r#"<p>home</p><a href="/private/page">x</a><a href="/public">x</a>"#,
        1,
    )
    .await;
    mount_page(server, "/public", "<p>public</p>", 1).await;
    mount_page(server, "/private/page", "<p>secret</p>", private_hits).await;
}

#[tokio::test]
async fn test_robots_respect_mode_skips_disallowed() {
    let server = MockServer::start().await;
    mount_robots_site(&server, 0).await;

    let config = create_test_config(&format!("{}/", server.uri()));
    let engine = create_engine(&config, memory_cache());

    let result = engine.crawl_site().await.unwrap();

    assert!(result.text.contains("public"));
    assert!(!result.text.contains("secret"));
    assert_eq!(result.count(PageState::Denied), 1);
}

#[tokio::test]
async fn test_robots_log_only_mode_fetches_disallowed() {
    let server = MockServer::start().await;
    mount_robots_site(&server, 1).await;

    let mut config = create_test_config(&format!("{}/", server.uri()));
    config.robots_policy = RobotsPolicy::LogOnly;
    let engine = create_engine(&config, memory_cache());

    let result = engine.crawl_site().await.unwrap();

    assert!(result.text.contains("secret"));
    assert_eq!(result.count(PageState::Denied), 0);
}

#[tokio::test]
async fn test_robots_fetched_once_per_site() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nAllow: /"))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/", "<p>home</p>", 1).await;

    let config = create_test_config(&format!("{}/", server.uri()));
    let engine = create_engine(&config, memory_cache());

    engine.crawl_site().await.unwrap();
    engine.crawl_site().await.unwrap();
    assert_eq!(
        engine.robots_txt(&config.seed_url).await.unwrap(),
        "User-agent: *\nAllow: /"
    );
}

#[tokio::test]
async fn test_retry_on_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/", "<p>recovered</p>", 1).await;

    let mut config = create_test_config(&format!("{}/", server.uri()));
    config.max_retries = 2;
    let engine = create_engine(&config, memory_cache());

    let result = engine.crawl_site().await.unwrap();

    assert_eq!(result.text, "recovered");
    assert_eq!(result.pages[0].state, PageState::Processed);
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = create_test_config(&format!("{}/", server.uri()));
    config.max_retries = 3;
    let engine = create_engine(&config, memory_cache());

    let result = engine.crawl_site().await.unwrap();
    assert_eq!(result.pages[0].state, PageState::Failed);
}

#[tokio::test]
async fn test_deadline_returns_partial_result() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<p>fast</p><a href="/slow">x</a>"#, 1).await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html("<p>slow</p>").set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let config = create_test_config(&format!("{}/", server.uri()));
    let engine = create_engine(&config, memory_cache());

    let start = Instant::now();
    let deadline = tokio::time::Instant::now() + Duration::from_millis(500);
    let result = engine
        .crawl_until(&config.seed_url, 5, Some(deadline))
        .await
        .unwrap();

    assert!(result.timed_out);
    assert!(result.text.contains("fast"));
    assert!(!result.text.contains("slow"));
    assert!(start.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn test_crawl_delay_spaces_requests() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r#"<a href="/a">x</a><a href="/b">x</a><a href="/c">x</a>"#,
        1,
    )
    .await;
    for p in ["/a", "/b", "/c"] {
        mount_page(&server, p, "<p>leaf</p>", 1).await;
    }

    let mut config = create_test_config(&format!("{}/", server.uri()));
    config.crawl_delay_ms = 100;
    let engine = create_engine(&config, memory_cache());

    let start = Instant::now();
    let result = engine.crawl_site().await.unwrap();

    assert_eq!(result.visited.len(), 4);
    // Four request starts need at least three intervals
    assert!(start.elapsed() >= Duration::from_millis(300));
}

#[tokio::test]
async fn test_off_site_redirect_is_not_followed() {
    let server = MockServer::start().await;
    let other = MockServer::start().await;

    mount_page(&server, "/", r#"<p>home</p><a href="/go">x</a>"#, 1).await;
    Mock::given(method("GET"))
        .and(path("/go"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("{}/foreign", other.uri()).as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(html("<p>foreign secret</p>"))
        .expect(0)
        .mount(&other)
        .await;

    let config = create_test_config(&format!("{}/", server.uri()));
    let cache = memory_cache();
    let engine = create_engine(&config, cache.clone());

    let result = engine.crawl_site().await.unwrap();

    assert_eq!(result.text, "home x");
    let go = result.pages.iter().find(|p| p.url.ends_with("/go")).unwrap();
    assert_eq!(go.state, PageState::Failed);
    assert_eq!(cache.get(&format!("{}/go", server.uri())).unwrap(), None);
}

#[tokio::test]
async fn test_seed_redirect_moves_crawl_to_target_site() {
    let old_site = MockServer::start().await;
    let new_site = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("location", format!("{}/", new_site.uri()).as_str()),
        )
        .expect(1)
        .mount(&old_site)
        .await;
    mount_page(&new_site, "/", r#"<p>welcome</p><a href="/about">x</a>"#, 1).await;
    mount_page(&new_site, "/about", "<p>about us</p>", 1).await;

    let config = create_test_config(&format!("{}/", old_site.uri()));
    let engine = create_engine(&config, memory_cache());

    let result = engine.crawl_site().await.unwrap();

    assert_eq!(result.text, "welcome x about us");
    assert_eq!(result.visited.len(), 3);
    assert!(result
        .visited
        .contains(&format!("{}/about", new_site.uri())));
}

#[tokio::test]
async fn test_oversized_robots_crawl_delay_is_not_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nCrawl-delay: 1e30"))
        .mount(&server)
        .await;
    mount_page(&server, "/", "<p>still here</p>", 1).await;

    let config = create_test_config(&format!("{}/", server.uri()));
    let engine = create_engine(&config, memory_cache());

    let result = engine.crawl_site().await.unwrap();

    assert_eq!(result.text, "still here");
}

#[tokio::test]
async fn test_concurrency_cap_bounds_in_flight_fetches() {
    let server = MockServer::start().await;

    let links: String = (0..6)
        .map(|i| format!(r#"<a href="/leaf{}">x</a>"#, i))
        .collect();
    mount_page(&server, "/", &links, 1).await;
    for i in 0..6 {
        Mock::given(method("GET"))
            .and(path(format!("/leaf{}", i).as_str()))
            .respond_with(html("<p>leaf</p>").set_delay(Duration::from_millis(200)))
            .expect(1)
            .mount(&server)
            .await;
    }

    let mut config = create_test_config(&format!("{}/", server.uri()));
    config.max_concurrent_fetches = 2;
    config.crawl_delay_ms = 0;
    let engine = create_engine(&config, memory_cache());

    let start = Instant::now();
    let result = engine.crawl_site().await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(result.count(PageState::Processed), 7);
    // Six 200ms leaves two at a time take at least three rounds
    assert!(
        elapsed >= Duration::from_millis(590),
        "leaves overlapped beyond the cap: {:?}",
        elapsed
    );
}
