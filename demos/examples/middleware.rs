//! reqwest client with the offline cache as middleware, configured from YAML.
//!
//! Every response carries an `x-cache-status` header showing whether it
//! came from the store.
//!
//! ```sh
//! cargo run -p shelter-demos --example middleware
//! ```

use axum::Json;
use axum::Router;
use axum::response::Html;
use axum::routing::get;
use reqwest::header::ACCEPT;
use reqwest_middleware::ClientBuilder;
use shelter_configuration::ConfigShelter;
use shelter_reqwest::{ReqwestTransport, ShelterMiddleware};
use tokio::net::TcpListener;

const CONFIG: &str = r#"
shelter:
  version: v1
  origin: "{origin}"
  shell: ["/", "/offline"]
policy:
  default: network_with_fallback
  rules:
    - prefix: /assets/
      strategy: cache_first
    - prefix: /reports/
      strategy: stale_while_revalidate
backend:
  type: Moka
  max_entries: 1000
"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("shelter=debug,middleware=info")
        .init();

    let app = Router::new()
        .route("/", get(|| async { Html("<h1>Home</h1>") }))
        .route("/offline", get(|| async { Html("<h1>Offline</h1>") }))
        .route("/assets/app.css", get(|| async { "body { margin: 0 }" }))
        .route("/reports/weekly", get(|| async { Html("<h1>Weekly</h1>") }))
        .route(
            "/api/recalls",
            get(|| async { Json(["R-2024-001", "R-2024-002"]) }),
        );
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let origin = format!("http://{}", listener.local_addr()?);
    tokio::spawn(async move { axum::serve(listener, app).await });

    let config = ConfigShelter::from_yaml(&CONFIG.replace("{origin}", &origin))?;
    let shelter = config.into_shelter(ReqwestTransport::default())?;
    shelter.lifecycle().install().await.activate().await?;

    let client = ClientBuilder::new(reqwest::Client::new())
        .with(ShelterMiddleware::new(shelter.clone()))
        .build();

    for path in [
        "/assets/app.css",
        "/assets/app.css",
        "/reports/weekly",
        "/reports/weekly",
        "/api/recalls",
        "/",
    ] {
        let response = client
            .get(format!("{origin}{path}"))
            .header(ACCEPT, "text/html")
            .send()
            .await?;
        let cache_status = response
            .headers()
            .get("x-cache-status")
            .and_then(|value| value.to_str().ok())
            .unwrap_or("-")
            .to_owned();
        println!("{path:<18} {} {cache_status}", response.status());
    }
    shelter.offload().wait_all().await;

    Ok(())
}
