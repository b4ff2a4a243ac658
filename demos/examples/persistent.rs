//! Generations persisted on disk with FeOxDB survive a restart and are
//! pruned once the build version changes.
//!
//! ```sh
//! cargo run -p shelter-demos --example persistent
//! ```

use std::path::Path;

use axum::Router;
use axum::response::Html;
use axum::routing::get;
use shelter::{Backend, RequestDescriptor, Shelter, ShelterConfig};
use shelter_feoxdb::FeOxDbBackend;
use shelter_reqwest::ReqwestTransport;
use tokio::net::TcpListener;

async fn start(
    origin: &str,
    dir: &Path,
    version: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let shelter = Shelter::builder()
        .store(FeOxDbBackend::builder().path(dir).build()?)
        .transport(ReqwestTransport::default())
        .config(ShelterConfig::new(origin, version).with_shell(["/", "/offline"]))
        .build()?;
    println!(
        "[{version}] generations on disk: {:?}",
        shelter.store().generations().await?
    );

    let activated = shelter.lifecycle().install().await.activate().await?;
    let report = activated.activate_report();
    println!(
        "[{version}] pruned {:?}, retained {:?}",
        report.pruned, report.retained
    );

    let request = RequestDescriptor::get(&format!("{origin}/reports/1"))?.with_accept("text/html");
    let (response, context) = shelter.serve(request).await?;
    println!(
        "[{version}] /reports/1 {} {}",
        response.status(),
        context.status.as_str()
    );

    shelter.offload().wait_all().await;
    shelter.store().flush();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("shelter=info")
        .init();

    let app = Router::new()
        .route("/", get(|| async { Html("<h1>Home</h1>") }))
        .route("/offline", get(|| async { Html("<h1>Offline</h1>") }))
        .route("/reports/1", get(|| async { Html("<h1>Report 1</h1>") }));
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let origin = format!("http://{}", listener.local_addr()?);
    tokio::spawn(async move { axum::serve(listener, app).await });

    let dir = tempfile::tempdir()?;

    println!("=== First run ===");
    start(&origin, dir.path(), "v1").await?;

    println!("\n=== Restart, same build ===");
    start(&origin, dir.path(), "v1").await?;

    println!("\n=== Restart after deploy ===");
    start(&origin, dir.path(), "v2").await?;

    Ok(())
}
