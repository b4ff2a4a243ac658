//! Install and activation against the mock store and a persistent store.

use http::StatusCode;
use pretty_assertions::assert_eq;
use shelter::lifecycle::ShellSkip;
use shelter::{Backend, GenerationName, LifecycleError, Shelter, ShelterConfig};
use shelter_feoxdb::FeOxDbBackend;
use shelter_test::{MockBackend, MockTransport, ORIGIN, navigate, shelter};

fn names(raw: &[&str]) -> Vec<GenerationName> {
    raw.iter().map(|name| GenerationName::from(*name)).collect()
}

fn shell_upstream() -> MockTransport {
    let transport = MockTransport::new();
    transport
        .page("/", "<h1>home</h1>")
        .page("/dashboard", "<h1>dashboard</h1>")
        .page("/offline", "<h1>offline</h1>")
        .status("/recalls", StatusCode::BAD_GATEWAY);
    transport
}

#[tokio::test]
async fn activation_prunes_superseded_generations() {
    let backend =
        MockBackend::with_generations(["static-v1", "pages-v1", "static-v2", "pages-v2"]);
    let shelter = shelter(&backend, &shell_upstream(), "v2");

    let activated = shelter
        .lifecycle()
        .install()
        .await
        .activate()
        .await
        .unwrap();

    assert_eq!(
        activated.activate_report().pruned,
        names(&["pages-v1", "static-v1"])
    );
    assert_eq!(
        activated.activate_report().retained,
        names(&["pages-v2", "static-v2"])
    );
    assert_eq!(backend.generation_names(), vec!["pages-v2", "static-v2"]);
}

#[tokio::test]
async fn activating_twice_changes_nothing_the_second_time() {
    let backend = MockBackend::with_generations(["static-v1", "pages-v1", "runtime-legacy"]);
    let transport = shell_upstream();
    let shelter = shelter(&backend, &transport, "v2");

    shelter.lifecycle().install().await.activate().await.unwrap();
    let after_first = backend.generation_names();
    assert_eq!(after_first, vec!["pages-v2", "static-v2"]);

    let second = shelter
        .lifecycle()
        .install()
        .await
        .activate()
        .await
        .unwrap();
    assert!(second.activate_report().pruned.is_empty());
    assert_eq!(backend.generation_names(), after_first);
}

#[tokio::test]
async fn install_warms_the_shell_and_reports_failures() {
    let backend = MockBackend::new();
    let shelter = shelter(&backend, &shell_upstream(), "v3");

    let installed = shelter.lifecycle().install().await;
    let report = installed.install_report();

    assert_eq!(report.warmed, vec!["/", "/dashboard", "/offline"]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].path, "/recalls");
    assert_eq!(
        report.skipped[0].reason,
        ShellSkip::Status(StatusCode::BAD_GATEWAY)
    );
    assert_eq!(backend.entry_count("pages-v3"), 3);
    assert_eq!(backend.entry_count("static-v3"), 0);
}

#[tokio::test]
async fn install_while_offline_still_completes() {
    let backend = MockBackend::new();
    let transport = shell_upstream();
    transport.set_offline(true);
    let shelter = shelter(&backend, &transport, "v1");

    let installed = shelter.lifecycle().install().await;
    assert!(installed.install_report().warmed.is_empty());
    assert_eq!(installed.install_report().skipped.len(), 4);
    assert_eq!(backend.generation_names(), vec!["pages-v1", "static-v1"]);
}

#[tokio::test]
async fn prune_failure_is_reported_and_leaves_the_generation() {
    let backend = MockBackend::with_generations(["pages-v1"]);
    backend.fail_drops(true);
    let shelter = shelter(&backend, &shell_upstream(), "v2");

    let error = shelter
        .lifecycle()
        .install()
        .await
        .activate()
        .await
        .unwrap_err();
    match error {
        LifecycleError::Prune { generation, .. } => {
            assert_eq!(generation, GenerationName::from("pages-v1"))
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(backend.generation_names().contains(&"pages-v1".to_owned()));

    // A later lifecycle retries the prune.
    backend.fail_drops(false);
    shelter.lifecycle().install().await.activate().await.unwrap();
    assert_eq!(backend.generation_names(), vec!["pages-v2", "static-v2"]);
}

#[tokio::test]
async fn version_bump_after_restart_prunes_persisted_generations() {
    let dir = tempfile::tempdir().unwrap();
    let transport = shell_upstream();

    {
        let shelter = Shelter::builder()
            .store(FeOxDbBackend::builder().path(dir.path()).build().unwrap())
            .transport(transport.clone())
            .config(ShelterConfig::new(ORIGIN, "v1"))
            .build()
            .unwrap();
        shelter.lifecycle().install().await.activate().await.unwrap();
        shelter.serve(navigate("/reports/1")).await.unwrap();
        shelter.offload().wait_all().await;
        shelter.store().flush();
    }

    let shelter = Shelter::builder()
        .store(FeOxDbBackend::builder().path(dir.path()).build().unwrap())
        .transport(transport.clone())
        .config(ShelterConfig::new(ORIGIN, "v2"))
        .build()
        .unwrap();
    assert_eq!(
        shelter.store().generations().await.unwrap(),
        names(&["pages-v1", "static-v1"])
    );

    let activated = shelter
        .lifecycle()
        .install()
        .await
        .activate()
        .await
        .unwrap();
    assert_eq!(
        activated.activate_report().pruned,
        names(&["pages-v1", "static-v1"])
    );
    assert_eq!(
        shelter.store().generations().await.unwrap(),
        names(&["pages-v2", "static-v2"])
    );
}
