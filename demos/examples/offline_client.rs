//! Offline behaviour of the engine against a local upstream.
//!
//! Starts an axum server, installs the application shell, then shuts the
//! server down and shows what each strategy serves without a network.
//!
//! ```sh
//! RUST_LOG=shelter=debug cargo run -p shelter-demos --example offline_client
//! ```

use axum::Router;
use axum::extract::Path;
use axum::response::Html;
use axum::routing::get;
use shelter::{RequestDescriptor, Shelter, ShelterConfig};
use shelter_moka::MokaBackend;
use shelter_reqwest::ReqwestTransport;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;

async fn page(title: &'static str) -> Html<String> {
    Html(format!("<!DOCTYPE html><h1>{title}</h1>"))
}

async fn report(Path(id): Path<u32>) -> Html<String> {
    Html(format!("<!DOCTYPE html><h1>Report {id}</h1>"))
}

async fn script() -> ([(http::HeaderName, &'static str); 1], &'static str) {
    (
        [(http::header::CONTENT_TYPE, "text/javascript")],
        "console.log('app booted')",
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("shelter=info")),
        )
        .init();

    let app = Router::new()
        .route("/", get(|| page("Home")))
        .route("/dashboard", get(|| page("Dashboard")))
        .route("/recalls", get(|| page("Recalls")))
        .route("/offline", get(|| page("You are offline, showing saved pages")))
        .route("/reports/{id}", get(report))
        .route("/assets/app.js", get(script));

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let origin = format!("http://{}", listener.local_addr()?);
    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = stopped.await;
            })
            .await
    });

    let shelter = Shelter::builder()
        .store(MokaBackend::builder().max_entries(1_000).build())
        .transport(ReqwestTransport::new(reqwest::Client::new()))
        .config(ShelterConfig::new(origin.as_str(), "v1"))
        .build()?;

    let installed = shelter.lifecycle().install().await;
    println!("installed: {:?}", installed.install_report());
    let activated = installed.activate().await?;
    println!("pruned: {:?}", activated.activate_report().pruned);

    let navigate = |path: &str| -> Result<RequestDescriptor, Box<dyn std::error::Error>> {
        Ok(RequestDescriptor::get(&format!("{origin}{path}"))?.with_accept("text/html"))
    };

    println!("\n=== Online ===");
    for path in ["/assets/app.js", "/reports/1", "/dashboard"] {
        let (response, context) = shelter.serve(navigate(path)?).await?;
        println!(
            "{path:<16} {} {:<6} from {}",
            response.status(),
            context.status.as_str(),
            context.source.as_str()
        );
    }
    shelter.offload().wait_all().await;

    let _ = stop.send(());
    server.await??;

    println!("\n=== Offline ===");
    for path in ["/assets/app.js", "/reports/1", "/dashboard", "/reports/2"] {
        let (response, context) = shelter.serve(navigate(path)?).await?;
        println!(
            "{path:<16} {} {:<6} from {}: {}",
            response.status(),
            context.status.as_str(),
            context.source.as_str(),
            String::from_utf8_lossy(response.body())
        );
    }
    shelter.offload().wait_all().await;

    Ok(())
}
