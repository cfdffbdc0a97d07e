mod common;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use deck_core::config::DirectoryConfig;
use deck_core::directory::{DirectoryError, SearchOutcome, StationDirectoryClient};
use serde_json::json;

type Seen = Arc<Mutex<Vec<String>>>;

async fn by_country(
    State(seen): State<Seen>,
    Path(country): Path<String>,
    Query(q): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    seen.lock()
        .unwrap()
        .push(format!("bycountry {} limit={}", country, q["limit"]));
    Json(json!([
        common::station_json("a", "Radio One", Some("http://a/stream")),
        common::station_json("b", "Dead Air", None),
        {
            "stationuuid": "c",
            "name": "Vividh Bharati",
            "url_resolved": "http://c/stream",
            "favicon": "https://img/c.png",
            "tags": "news,hindi",
            "country": "India"
        },
        {
            "stationuuid": "d",
            "name": "Relative Icon",
            "url_resolved": "http://d/stream",
            "favicon": "/favicon.ico"
        }
    ]))
}

async fn search(
    State(seen): State<Seen>,
    Query(q): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    seen.lock().unwrap().push(format!(
        "search country={} name={} limit={}",
        q["country"], q["name"], q["limit"]
    ));
    if q["name"] == "nothing" {
        return Json(json!([]));
    }
    Json(json!([common::station_json("m", "Mirchi", Some("http://m/stream"))]))
}

async fn directory() -> (String, Seen) {
    let seen: Seen = Arc::default();
    let app = Router::new()
        .route("/json/stations/bycountry/:country", get(by_country))
        .route("/json/stations/search", get(search))
        .with_state(seen.clone());
    (common::serve(app).await, seen)
}

fn client(base_url: String) -> StationDirectoryClient {
    StationDirectoryClient::new(&DirectoryConfig {
        base_url,
        ..DirectoryConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn blank_query_lists_country_and_drops_unplayable_entries() {
    let (base, seen) = directory().await;
    let stations = client(base).search(Some("   ")).await.unwrap();

    assert_eq!(seen.lock().unwrap().as_slice(), ["bycountry India limit=50"]);
    let ids: Vec<_> = stations.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, ["a", "c", "d"]);
    assert_eq!(stations[1].icon_url.as_deref(), Some("https://img/c.png"));
    assert_eq!(stations[1].tags.as_deref(), Some("news,hindi"));
    assert_eq!(stations[0].icon_url, None);
    assert_eq!(stations[2].icon_url, None);
    assert_eq!(stations[2].tags, None);
}

#[tokio::test]
async fn name_query_is_trimmed_and_scoped_to_country() {
    let (base, seen) = directory().await;
    let stations = client(base).search(Some("  Mirchi ")).await.unwrap();
    assert_eq!(stations.len(), 1);
    assert_eq!(
        seen.lock().unwrap().as_slice(),
        ["search country=India name=Mirchi limit=50"]
    );
}

#[tokio::test]
async fn empty_result_and_failure_render_differently() {
    let (base, _) = directory().await;
    let empty = SearchOutcome::from_result(client(base).search(Some("nothing")).await);
    assert_eq!(empty.placeholder(), Some("No stations found."));

    let broken = Router::new().route(
        "/json/stations/bycountry/:country",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "down") }),
    );
    let base = common::serve(broken).await;
    let result = client(base).search(None).await;
    assert!(matches!(result, Err(DirectoryError::Status(s)) if s == 500));
    let failed = SearchOutcome::from_result(result);
    assert_eq!(failed.placeholder(), Some("Failed to load."));
}

#[tokio::test]
async fn malformed_payload_is_a_decode_error() {
    let app = Router::new().route(
        "/json/stations/bycountry/:country",
        get(|| async { "<html>maintenance</html>" }),
    );
    let base = common::serve(app).await;
    assert!(matches!(
        client(base).search(None).await,
        Err(DirectoryError::Decode(_))
    ));
}

#[tokio::test]
async fn unreachable_directory_is_an_http_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    assert!(matches!(
        client(base).search(None).await,
        Err(DirectoryError::Http(_))
    ));
}
