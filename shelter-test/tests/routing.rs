//! Request filter and policy table through the full engine.

use http::Method;
use pretty_assertions::assert_eq;
use shelter::filter::{Classification, SkipReason};
use shelter::{CacheContext, CacheStatus, RequestDescriptor, Strategy};
use shelter_test::{MockBackend, MockTransport, navigate, request, shelter};

#[tokio::test]
async fn paths_select_their_strategy() {
    let shelter = shelter(&MockBackend::new(), &MockTransport::new(), "v1");
    let cases = [
        ("/assets/app.js", Strategy::CacheFirst),
        ("/fonts/inter.woff2", Strategy::CacheFirst),
        ("/img/logo.PNG", Strategy::CacheFirst),
        ("/dashboard", Strategy::StaleWhileRevalidate),
        ("/recalls/2024-17", Strategy::StaleWhileRevalidate),
        ("/reports/1", Strategy::NetworkWithFallback),
        ("/", Strategy::NetworkWithFallback),
    ];
    for (path, expected) in cases {
        assert_eq!(shelter.strategy_for(&request(path)), Some(expected), "{path}");
    }
}

#[tokio::test]
async fn api_requests_bypass_the_engine() {
    let backend = MockBackend::new();
    let transport = MockTransport::new();
    transport.page("/api/v1/recalls/", "[]");
    let shelter = shelter(&backend, &transport, "v1");

    let api = request("/api/v1/recalls/");
    assert_eq!(
        shelter.classify(&api),
        Classification::Skip(SkipReason::Api)
    );
    assert_eq!(shelter.strategy_for(&api), None);

    let (served, context) = shelter.serve(api).await.unwrap();
    assert_eq!(served.body().as_ref(), b"[]");
    assert_eq!(context, CacheContext::bypass());
    assert_eq!(backend.read_count(), 0);
    assert_eq!(backend.write_count(), 0);
}

#[tokio::test]
async fn filtered_request_surfaces_network_errors() {
    let backend = MockBackend::new();
    let transport = MockTransport::new();
    transport.set_offline(true);
    let shelter = shelter(&backend, &transport, "v1");

    let error = shelter.serve(request("/api/v1/recalls/")).await.unwrap_err();
    assert!(error.is_timeout());
}

#[tokio::test]
async fn other_methods_and_origins_are_skipped() {
    let shelter = shelter(&MockBackend::new(), &MockTransport::new(), "v1");

    let post = RequestDescriptor::new(
        Method::POST,
        "https://site.example/recalls".parse().unwrap(),
    )
    .unwrap();
    assert_eq!(
        shelter.classify(&post),
        Classification::Skip(SkipReason::Method(Method::POST))
    );

    let foreign = RequestDescriptor::get("https://cdn.example/assets/app.js").unwrap();
    assert_eq!(
        shelter.classify(&foreign),
        Classification::Skip(SkipReason::CrossOrigin)
    );

    let dev = navigate("/_next/webpack-hmr");
    assert!(matches!(
        shelter.classify(&dev),
        Classification::Skip(SkipReason::Excluded(_))
    ));
}

#[tokio::test]
async fn skipped_requests_report_bypass_status() {
    let transport = MockTransport::new();
    transport.page("/api/health", "ok");
    let shelter = shelter(&MockBackend::new(), &transport, "v1");

    let (_, context) = shelter.serve(request("/api/health")).await.unwrap();
    assert_eq!(context.status, CacheStatus::Bypass);
    assert_eq!(context.strategy, None);
}
