//! Integration tests for the YouTube search provider against a mock API.

mod support;

use serde_json::json;
use support::socket_guard::start_mock_server_or_skip;
use tubefetch_core::{
    ItemId, ResultKind, SearchError, SearchHit, SearchPage, SearchProvider, YouTubeSearch,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

fn page(max_results: u32, skip_first: usize) -> SearchPage {
    SearchPage {
        max_results,
        skip_first,
    }
}

fn search_body() -> serde_json::Value {
    json!({
        "kind": "youtube#searchListResponse",
        "items": [
            { "kind": "youtube#searchResult", "id": { "kind": "youtube#video", "videoId": "dQw4w9WgXcQ" } },
            { "kind": "youtube#searchResult", "id": { "kind": "youtube#channel", "channelId": "UCuAXFkgsw1L7xaCfnd5JJOw" } },
            { "kind": "youtube#searchResult", "id": { "kind": "youtube#playlist", "playlistId": "PLFgquLnL59alCl_2TQvOiD5Vgm1hCaGSI" } },
            { "kind": "youtube#searchResult", "id": { "kind": "youtube#video", "videoId": "9bZkp7q19f0" } }
        ]
    })
}

#[tokio::test]
async fn test_search_sends_expected_query_parameters() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/youtube/v3/search"))
        .and(query_param("part", "id"))
        .and(query_param("q", "never gonna"))
        .and(query_param("maxResults", "20"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body()))
        .expect(1)
        .mount(&server)
        .await;

    let search = YouTubeSearch::with_base_url("test-key", server.uri()).unwrap();
    let hits = search.search("never gonna", &page(20, 0)).await.unwrap();

    assert_eq!(hits.len(), 4);
    assert_eq!(hits[0], SearchHit::video("dQw4w9WgXcQ"));
    assert_eq!(hits[1].kind, ResultKind::Channel);
    assert_eq!(hits[2].kind, ResultKind::Playlist);
    assert_eq!(hits[3], SearchHit::video("9bZkp7q19f0"));
}

#[tokio::test]
async fn test_only_videos_are_playable() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/youtube/v3/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body()))
        .mount(&server)
        .await;

    let search = YouTubeSearch::with_base_url("k", server.uri()).unwrap();
    let ids: Vec<ItemId> = search
        .search("anything", &page(20, 0))
        .await
        .unwrap()
        .into_iter()
        .filter_map(SearchHit::playable_id)
        .collect();

    assert_eq!(
        ids,
        vec![ItemId::from("dQw4w9WgXcQ"), ItemId::from("9bZkp7q19f0")]
    );
}

#[tokio::test]
async fn test_skip_first_drops_leading_results() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/youtube/v3/search"))
        .and(query_param("maxResults", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body()))
        .mount(&server)
        .await;

    let search = YouTubeSearch::with_base_url("k", server.uri()).unwrap();
    let hits = search.search("q", &page(5, 3)).await.unwrap();

    assert_eq!(hits, vec![SearchHit::video("9bZkp7q19f0")]);
}

#[tokio::test]
async fn test_skip_first_past_end_is_empty() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/youtube/v3/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body()))
        .mount(&server)
        .await;

    let search = YouTubeSearch::with_base_url("k", server.uri()).unwrap();
    let hits = search.search("q", &page(20, 10)).await.unwrap();

    assert!(hits.is_empty());
}

#[tokio::test]
async fn test_response_without_items_is_empty() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/youtube/v3/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "kind": "youtube#searchListResponse" })),
        )
        .mount(&server)
        .await;

    let search = YouTubeSearch::with_base_url("k", server.uri()).unwrap();
    assert!(search.search("q", &page(20, 0)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_api_error_message_is_surfaced() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/youtube/v3/search"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {
                "code": 403,
                "message": "The request cannot be completed because you have exceeded your quota."
            }
        })))
        .mount(&server)
        .await;

    let search = YouTubeSearch::with_base_url("k", server.uri()).unwrap();
    let error = search.search("cats", &page(20, 0)).await.unwrap_err();

    match error {
        SearchError::Api {
            query,
            status,
            message,
        } => {
            assert_eq!(query, "cats");
            assert_eq!(status, 403);
            assert!(message.contains("quota"));
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_error_without_json_body_uses_status_reason() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/youtube/v3/search"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let search = YouTubeSearch::with_base_url("k", server.uri()).unwrap();
    let error = search.search("cats", &page(20, 0)).await.unwrap_err();

    assert!(
        matches!(error, SearchError::Api { status: 503, ref message, .. } if message == "Service Unavailable")
    );
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/youtube/v3/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let search = YouTubeSearch::with_base_url("k", server.uri()).unwrap();
    let error = search.search("cats", &page(20, 0)).await.unwrap_err();

    assert!(matches!(error, SearchError::Decode { ref query, .. } if query == "cats"));
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let search = YouTubeSearch::with_base_url("k", "http://127.0.0.1:1").unwrap();
    let error = search.search("cats", &page(20, 0)).await.unwrap_err();

    assert!(matches!(error, SearchError::Network { .. }));
}
