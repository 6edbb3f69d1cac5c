//! Integration tests for the feed and community-search clients using
//! wiremock HTTP mocks.

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use venturepulse_core::SourceType;
use venturepulse_signals::{FeedClient, RedditClient, SearchOptions};
use venturepulse_signals::sources::RedditCredentials;

// ---------------------------------------------------------------------------
// Hacker News
// ---------------------------------------------------------------------------

fn hn_story(id: i64, score: i32, descendants: i32) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "type": "story",
        "title": format!("Story {id}"),
        "url": format!("https://example.com/{id}"),
        "time": 1_756_000_000_i64,
        "score": score,
        "descendants": descendants
    })
}

#[tokio::test]
async fn hackernews_fetch_keeps_list_order_and_tolerates_item_failures() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/topstories.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json([1, 2, 3, 4]))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/item/1.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hn_story(1, 300, 80)))
        .mount(&server)
        .await;
    // Item 2: detail fetch blows up — dropped, not fatal.
    Mock::given(method("GET"))
        .and(path("/item/2.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    // Item 3: not a story — dropped by the adapter.
    Mock::given(method("GET"))
        .and(path("/item/3.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 3, "type": "job", "title": "Hiring", "url": "https://example.com/3",
            "time": 1_756_000_000_i64
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/item/4.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hn_story(4, 50, 10)))
        .mount(&server)
        .await;

    let client = FeedClient::new(5)
        .expect("client construction should not fail")
        .with_hackernews_base_url(&server.uri());

    let items = client
        .fetch_top_items(SourceType::HackerNews, None, 50)
        .await
        .expect("fetch should succeed despite item 2 failing");

    let ids: Vec<&str> = items.iter().map(|i| i.external_id.as_str()).collect();
    assert_eq!(ids, vec!["1", "4"], "list order preserved, bad items dropped");
    assert_eq!(items[0].comment_count, 80, "descendants is the comment count");
}

#[tokio::test]
async fn hackernews_limit_bounds_detail_fetches() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/topstories.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json([10, 11, 12]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/item/10.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hn_story(10, 5, 1)))
        .expect(1)
        .mount(&server)
        .await;
    // Items beyond the limit must never be requested.
    Mock::given(method("GET"))
        .and(path("/item/11.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hn_story(11, 5, 1)))
        .expect(0)
        .mount(&server)
        .await;

    let client = FeedClient::new(5)
        .expect("client construction should not fail")
        .with_hackernews_base_url(&server.uri());

    let items = client
        .fetch_top_items(SourceType::HackerNews, None, 1)
        .await
        .expect("fetch");
    assert_eq!(items.len(), 1);
}

#[tokio::test]
async fn hackernews_unreachable_top_list_is_a_fetch_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/topstories.json"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = FeedClient::new(5)
        .expect("client construction should not fail")
        .with_hackernews_base_url(&server.uri());

    let result = client.fetch_top_items(SourceType::HackerNews, None, 10).await;
    assert!(result.is_err(), "expected fetch error, got {result:?}");
}

#[tokio::test]
async fn unsupported_source_types_are_rejected() {
    let client = FeedClient::new(5).expect("client construction should not fail");
    let result = client
        .fetch_top_items(SourceType::ProductHunt, None, 10)
        .await;
    assert!(matches!(
        result,
        Err(venturepulse_signals::SignalError::UnsupportedSource(
            SourceType::ProductHunt
        ))
    ));
}

// ---------------------------------------------------------------------------
// Reddit
// ---------------------------------------------------------------------------

fn reddit_listing() -> serde_json::Value {
    serde_json::json!({
        "data": {
            "children": [
                {
                    "data": {
                        "id": "aaa111",
                        "title": "Anyone using an AI note app?",
                        "selftext": "Looking for recommendations",
                        "subreddit": "startups",
                        "score": 42,
                        "num_comments": 17,
                        "permalink": "/r/startups/comments/aaa111/",
                        "created_utc": 1_756_000_000.0
                    }
                },
                {
                    "data": {
                        "id": "bbb222",
                        "title": "Note taking pain points",
                        "selftext": "",
                        "subreddit": "startups",
                        "score": 9,
                        "num_comments": 2,
                        "permalink": "/r/startups/comments/bbb222/",
                        "created_utc": 1_756_000_100.0
                    }
                }
            ],
            "after": null
        }
    })
}

async fn connected_client(server: &MockServer) -> RedditClient {
    Mock::given(method("POST"))
        .and(path("/api/v1/access_token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "access_token": "test-token" })),
        )
        .mount(server)
        .await;

    let creds = RedditCredentials {
        client_id: "id".to_string(),
        client_secret: "secret".to_string(),
        user_agent: "VenturePulse/test".to_string(),
    };
    RedditClient::connect_with_base_urls(
        &creds,
        &format!("{}/api/v1/access_token", server.uri()),
        &server.uri(),
    )
    .await
    .expect("token exchange should succeed")
}

#[tokio::test]
async fn reddit_search_returns_normalized_posts() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/r/startups/search"))
        .and(query_param("q", "note taking ai"))
        .and(query_param("restrict_sr", "true"))
        .and(query_param("sort", "relevance"))
        .and(query_param("t", "month"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reddit_listing()))
        .mount(&server)
        .await;

    let items = client
        .search_target("note taking ai", "startups", &SearchOptions::default())
        .await
        .expect("search should succeed");

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].external_id, "aaa111");
    assert_eq!(items[0].url, "https://reddit.com/r/startups/comments/aaa111/");
    assert!(items[1].content.is_none(), "empty selftext becomes None");
}

#[tokio::test]
async fn reddit_search_error_status_surfaces_per_target() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/r/banned/search"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let result = client
        .search_target("q", "banned", &SearchOptions::default())
        .await;
    assert!(matches!(
        result,
        Err(venturepulse_signals::SignalError::Reddit(_))
    ));
}

#[tokio::test]
async fn reddit_token_exchange_failure_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/access_token"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let creds = RedditCredentials {
        client_id: "id".to_string(),
        client_secret: "bad".to_string(),
        user_agent: "VenturePulse/test".to_string(),
    };
    let result = RedditClient::connect_with_base_urls(
        &creds,
        &format!("{}/api/v1/access_token", server.uri()),
        &server.uri(),
    )
    .await;

    assert!(matches!(
        result,
        Err(venturepulse_signals::SignalError::Reddit(_))
    ));
}
