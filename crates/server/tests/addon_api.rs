//! Addon HTTP surface tests with mock upstreams.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{encode_config, fixtures, TestFixture};

fn user_config() -> String {
    encode_config(&json!({
        "RES_TO_SHOW": ["1080p"],
        "LANG_TO_SHOW": ["MULTI"],
        "CODECS_TO_SHOW": ["x265"],
        "FILES_TO_SHOW": 5
    }))
}

#[tokio::test]
async fn test_health_and_config() {
    let fixture = TestFixture::new().await;

    let health = fixture.get("/api/v1/health").await;
    assert_status!(health, StatusCode::OK);
    assert_eq!(health.body["status"], "ok");

    let config = fixture.get("/api/v1/config").await;
    assert_status!(config, StatusCode::OK);
    assert_eq!(config.body["tmdb_configured"], true);
    assert_eq!(config.body["alldebrid_configured"], true);
    assert!(!config.body.to_string().contains("test-alldebrid-key"));
}

#[tokio::test]
async fn test_manifest_routes() {
    let fixture = TestFixture::new().await;

    let bare = fixture.get("/manifest.json").await;
    assert_status!(bare, StatusCode::OK);
    assert_eq!(bare.body["resources"], json!(["stream"]));
    assert_eq!(bare.body["types"], json!(["movie", "series"]));
    assert_eq!(bare.body["behaviorHints"]["configurationRequired"], true);

    let configured = fixture
        .get(&format!("/{}/manifest.json", user_config()))
        .await;
    assert_status!(configured, StatusCode::OK);
    assert_eq!(configured.body["behaviorHints"]["configurationRequired"], false);

    let invalid = fixture.get("/bm90IGpzb24/manifest.json").await;
    assert_status!(invalid, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_movie_streams() {
    let fixture = TestFixture::new().await;
    fixture
        .indexer
        .set_results_for(
            "Film",
            vec![fixtures::hashed_candidate("1", "Film MULTI 1080p x265", "aaa")],
        )
        .await;
    fixture
        .debrid
        .set_files(1, vec![fixtures::video_file("Film.1080p.BluRay.x265.mkv")])
        .await;

    let response = fixture
        .get(&format!("/{}/stream/movie/tt1.json", user_config()))
        .await;

    assert_status!(response, StatusCode::OK);
    let streams = response.body["streams"].as_array().unwrap();
    assert_eq!(streams.len(), 1);
    assert_eq!(streams[0]["name"], "Ygg + AD | 1080p | x265");
    assert_eq!(
        streams[0]["url"],
        "https://locked.test/Film.1080p.BluRay.x265.mkv?unlocked"
    );
}

#[tokio::test]
async fn test_episode_streams_with_encoded_id() {
    let fixture = TestFixture::new().await;
    fixture
        .indexer
        .set_results_for(
            "Show",
            vec![fixtures::hashed_candidate("1", "Show S01E02 MULTI 1080p x265", "ep")],
        )
        .await;
    fixture
        .debrid
        .set_files(1, vec![fixtures::video_file("Show.S01E02.1080p.x265.mkv")])
        .await;

    let response = fixture
        .get(&format!("/{}/stream/series/tt2%3A1%3A2.json", user_config()))
        .await;

    assert_status!(response, StatusCode::OK);
    let streams = response.body["streams"].as_array().unwrap();
    assert_eq!(streams.len(), 1);
    assert!(streams[0]["title"]
        .as_str()
        .unwrap()
        .starts_with("Show - S01E02\n"));
}

#[tokio::test]
async fn test_files_to_show_caps_output() {
    let fixture = TestFixture::new().await;
    fixture
        .indexer
        .set_results_for(
            "Film",
            vec![fixtures::hashed_candidate("1", "Film MULTI 1080p x265", "aaa")],
        )
        .await;
    fixture
        .debrid
        .set_files(
            1,
            vec![
                fixtures::video_file("Film.Part1.1080p.x265.mkv"),
                fixtures::video_file("Film.Part2.1080p.x265.mkv"),
            ],
        )
        .await;

    let config = encode_config(&json!({ "FILES_TO_SHOW": 1 }));
    let response = fixture
        .get(&format!("/{}/stream/movie/tt1.json", config))
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["streams"].as_array().unwrap().len(), 1);
    assert_eq!(fixture.debrid.unlock_count().await, 1);
}

#[tokio::test]
async fn test_empty_codec_list_yields_no_streams() {
    let fixture = TestFixture::new().await;
    fixture
        .indexer
        .set_results_for(
            "Film",
            vec![fixtures::hashed_candidate("1", "Film MULTI 1080p x265", "aaa")],
        )
        .await;

    let config = encode_config(&json!({ "CODECS_TO_SHOW": [] }));
    let response = fixture
        .get(&format!("/{}/stream/movie/tt1.json", config))
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body, json!({ "streams": [] }));
    assert!(fixture.debrid.upload_calls().await.is_empty());
}

#[tokio::test]
async fn test_invalid_config_is_bad_request() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/not-base64!/stream/movie/tt1.json").await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert!(response.body["error"].is_string());
    assert_eq!(fixture.metadata.lookup_count().await, 0);
}

#[tokio::test]
async fn test_unresolvable_requests_return_empty_streams() {
    let fixture = TestFixture::new().await;

    for path in [
        format!("/{}/stream/channel/tt1.json", user_config()),
        format!("/{}/stream/movie/tt404.json", user_config()),
        format!("/{}/stream/series/tt2.json", user_config()),
        format!("/{}/stream/series/tt2:x:1.json", user_config()),
    ] {
        let response = fixture.get(&path).await;
        assert_status!(response, StatusCode::OK);
        assert_eq!(response.body, json!({ "streams": [] }), "path {}", path);
    }
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new().await;
    fixture.get("/api/v1/health").await;

    let (status, body) = fixture.get_text("/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("relaystream_http_requests_total"));
}
