//! Integration tests for ShelterMiddleware using wiremock.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::ACCEPT;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use shelter::{Shelter, ShelterConfig};
use shelter_moka::MokaBackend;
use shelter_reqwest::{ReqwestTransport, ShelterMiddleware};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(origin: &str) -> ClientWithMiddleware {
    let transport = ReqwestTransport::new(Client::new()).with_timeout(Duration::from_millis(500));
    let shelter = Shelter::builder()
        .store(MokaBackend::builder().max_entries(100).build())
        .transport(transport)
        .config(ShelterConfig::new(origin, "v1").with_shell(Vec::<String>::new()))
        .build()
        .unwrap();
    ClientBuilder::new(Client::new())
        .with(ShelterMiddleware::new(shelter))
        .build()
}

/// Static assets are fetched once and then served from the store.
#[tokio::test]
async fn static_asset_miss_then_hit() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/assets/app.js"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("console.log(1)")
                .insert_header("content-type", "text/javascript"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server.uri());
    let url = format!("{}/assets/app.js", mock_server.uri());

    let first = client.get(&url).send().await.unwrap();
    assert_eq!(first.status(), 200);
    assert_eq!(first.headers().get("x-cache-status").unwrap(), "MISS");
    assert_eq!(first.text().await.unwrap(), "console.log(1)");

    let second = client.get(&url).send().await.unwrap();
    assert_eq!(second.headers().get("x-cache-status").unwrap(), "HIT");
    assert_eq!(
        second.headers().get("content-type").unwrap(),
        "text/javascript"
    );
    assert_eq!(second.text().await.unwrap(), "console.log(1)");
}

/// API requests bypass the engine and reach the server every time.
#[tokio::test]
async fn api_requests_pass_through() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/recalls/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server.uri());
    let url = format!("{}/api/v1/recalls/", mock_server.uri());

    for _ in 0..2 {
        let response = client.get(&url).send().await.unwrap();
        assert_eq!(response.status(), 200);
        assert!(response.headers().get("x-cache-status").is_none());
    }
}

/// A page fetched while online is replayed as stale once the server stops
/// answering in time.
#[tokio::test]
async fn offline_replays_cached_page() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reports/42"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<h1>report</h1>"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/reports/42"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<h1>too late</h1>")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let client = client(&mock_server.uri());
    let url = format!("{}/reports/42", mock_server.uri());

    let online = client.get(&url).send().await.unwrap();
    assert_eq!(online.headers().get("x-cache-status").unwrap(), "MISS");

    let offline = client.get(&url).send().await.unwrap();
    assert_eq!(offline.status(), 200);
    assert_eq!(offline.headers().get("x-cache-status").unwrap(), "STALE");
    assert_eq!(offline.text().await.unwrap(), "<h1>report</h1>");
}

/// Nothing cached and no network: HTML gets an offline page, the rest a 503.
#[tokio::test]
async fn offline_without_cache_resolves_fallback() {
    // Nothing listens on a port released by a dropped listener.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let origin = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let client = client(&origin);
    let url = format!("{origin}/reports/7");

    let page = client
        .get(&url)
        .header(ACCEPT, "text/html")
        .send()
        .await
        .unwrap();
    assert_eq!(page.status(), 200);
    assert!(page.text().await.unwrap().contains("offline"));

    let data = client
        .get(&url)
        .header(ACCEPT, "application/json")
        .send()
        .await
        .unwrap();
    assert_eq!(data.status(), 503);
    assert_eq!(data.headers().get("x-cache-status").unwrap(), "MISS");
}
