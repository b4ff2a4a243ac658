//! Prometheus metrics for served responses, store errors and lifecycle
//! events.
//!
//! ```sh
//! cargo run -p shelter-demos --example observability --features observability
//! ```

use axum::Router;
use axum::response::Html;
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusBuilder;
use shelter::{RequestDescriptor, Shelter, ShelterConfig};
use shelter_moka::MokaBackend;
use shelter_reqwest::ReqwestTransport;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("shelter=info")
        .init();

    let handle = PrometheusBuilder::new().install_recorder()?;

    let app = Router::new()
        .route("/", get(|| async { Html("<h1>Home</h1>") }))
        .route("/offline", get(|| async { Html("<h1>Offline</h1>") }))
        .route("/assets/app.js", get(|| async { "console.log(1)" }))
        .route("/sites/7", get(|| async { Html("<h1>Site 7</h1>") }));
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let origin = format!("http://{}", listener.local_addr()?);
    tokio::spawn(async move { axum::serve(listener, app).await });

    let shelter = Shelter::builder()
        .store(MokaBackend::builder().max_entries(1_000).build())
        .transport(ReqwestTransport::default())
        .config(ShelterConfig::new(origin.as_str(), "v1").with_shell(["/", "/offline", "/missing"]))
        .build()?;
    shelter.lifecycle().install().await.activate().await?;

    for path in ["/assets/app.js", "/assets/app.js", "/sites/7", "/sites/7"] {
        let request = RequestDescriptor::get(&format!("{origin}{path}"))?.with_accept("text/html");
        shelter.serve(request).await?;
    }
    shelter.offload().wait_all().await;

    println!("{}", handle.render());
    Ok(())
}
