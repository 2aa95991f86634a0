use std::sync::Arc;

use tefas_api::{FundDataClient, QueryKind, QueryParams, SessionManager, TransportProfile};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn load_fixture(name: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap()
}

/// Bootstrap page handing out the session cookies. `expected_hits` is
/// enforced on server shutdown.
async fn mount_bootstrap(server: &MockServer, expected_hits: u64) {
    Mock::given(method("GET"))
        .and(path("/FonKarsilastirma.aspx"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html>comparison page</html>")
                .append_header("set-cookie", "ASP.NET_SessionId=abc123; path=/; HttpOnly")
                .append_header("set-cookie", "tefas_lb=node7; Path=/"),
        )
        .expect(expected_hits)
        .mount(server)
        .await;
}

#[tokio::test]
async fn returns_query_success_sends_session_and_form() {
    let server = MockServer::start().await;
    mount_bootstrap(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/api/DB/BindComparisonFundReturns"))
        .and(header("cookie", "ASP.NET_SessionId=abc123; tefas_lb=node7"))
        .and(header("x-requested-with", "XMLHttpRequest"))
        .and(body_string_contains("fontip=YAT"))
        .and(body_string_contains("bastarih="))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("returns.json")))
        .expect(1)
        .mount(&server)
        .await;

    let client = FundDataClient::with_base_url(&server.uri()).unwrap();
    let rows = client
        .execute(QueryKind::CurrentReturns, &QueryParams::default())
        .await
        .unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["FONKODU"], "MAC");
}

#[tokio::test]
async fn falls_back_to_next_candidate_after_retry() {
    let server = MockServer::start().await;
    // Initial acquire + one refresh provoked by candidate A.
    mount_bootstrap(&server, 2).await;

    // Candidate A answers 500 on both the first try and the
    // post-refresh retry.
    Mock::given(method("POST"))
        .and(path("/api/DB/BindComparisonFundReturns"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/DB/BindComparisonFonReturns"))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("returns.json")))
        .expect(1)
        .mount(&server)
        .await;

    let client = FundDataClient::with_base_url(&server.uri()).unwrap();
    let rows = client
        .execute(QueryKind::CurrentReturns, &QueryParams::default())
        .await
        .unwrap();
    assert_eq!(rows.len(), 3);
}

#[tokio::test]
async fn html_body_triggers_exactly_one_session_refresh() {
    let server = MockServer::start().await;
    mount_bootstrap(&server, 2).await;

    // First answer is the portal's HTML error page despite the 200;
    // the refreshed session then gets real JSON.
    Mock::given(method("POST"))
        .and(path("/api/DB/BindComparisonFundReturns"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><body>Oturum sonlandı</body></html>"),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/DB/BindComparisonFundReturns"))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("returns.json")))
        .expect(1)
        .mount(&server)
        .await;

    let client = FundDataClient::with_base_url(&server.uri()).unwrap();
    let rows = client
        .execute(QueryKind::CurrentReturns, &QueryParams::default())
        .await
        .unwrap();
    assert_eq!(rows.len(), 3);
}

#[tokio::test]
async fn failed_refresh_is_retried_with_backoff_mid_walk() {
    let server = MockServer::start().await;

    // Initial acquire succeeds, the refresh provoked by the HTML body
    // fails once with a 500, and the retried refresh succeeds again.
    Mock::given(method("GET"))
        .and(path("/FonKarsilastirma.aspx"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html>comparison page</html>")
                .append_header("set-cookie", "ASP.NET_SessionId=abc123; path=/"),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/FonKarsilastirma.aspx"))
        .respond_with(ResponseTemplate::new(500).set_body_string("bootstrap hiccup"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/FonKarsilastirma.aspx"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html>comparison page</html>")
                .append_header("set-cookie", "ASP.NET_SessionId=def456; path=/"),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/DB/BindComparisonFundReturns"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><body>Oturum sonlandı</body></html>"),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/DB/BindComparisonFundReturns"))
        .and(header("cookie", "ASP.NET_SessionId=def456"))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("returns.json")))
        .expect(1)
        .mount(&server)
        .await;

    let client = FundDataClient::with_base_url(&server.uri()).unwrap();
    let rows = client
        .execute(QueryKind::CurrentReturns, &QueryParams::default())
        .await
        .unwrap();
    assert_eq!(rows.len(), 3);
}

#[tokio::test]
async fn exhausted_candidates_report_every_attempt() {
    let server = MockServer::start().await;
    // Initial acquire plus one refresh per candidate.
    mount_bootstrap(&server, 3).await;

    for endpoint in [
        "/api/DB/BindComparisonFundReturns",
        "/api/DB/BindComparisonFonReturns",
    ] {
        Mock::given(method("POST"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(404).set_body_string("not here anymore"))
            .expect(2)
            .mount(&server)
            .await;
    }

    let client = FundDataClient::with_base_url(&server.uri()).unwrap();
    let err = client
        .execute(QueryKind::CurrentReturns, &QueryParams::default())
        .await
        .unwrap_err();
    match err {
        tefas_api::Error::NoUsableEndpoint { attempts, .. } => {
            assert_eq!(attempts.len(), 2);
            assert_eq!(attempts[0].endpoint, "BindComparisonFundReturns");
            assert_eq!(attempts[1].endpoint, "BindComparisonFonReturns");
            assert!(attempts[0].reason.contains("404"));
        }
        other => panic!("expected NoUsableEndpoint, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_data_array_is_a_data_gap_not_a_failure() {
    let server = MockServer::start().await;
    mount_bootstrap(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/api/DB/BindHistoryInfo"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"draw":0,"data":[]}"#))
        .expect(1)
        .mount(&server)
        .await;

    let client = FundDataClient::with_base_url(&server.uri()).unwrap();
    let rows = client
        .execute(
            QueryKind::History,
            &QueryParams {
                fund_code: Some("MAC".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn bootstrap_without_cookies_fails_acquisition() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/FonKarsilastirma.aspx"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>no cookies</html>"))
        .mount(&server)
        .await;

    let client = FundDataClient::with_base_url(&server.uri()).unwrap();
    let err = client
        .execute(QueryKind::CurrentReturns, &QueryParams::default())
        .await
        .unwrap_err();
    assert!(matches!(err, tefas_api::Error::SessionAcquisition(_)));
}

#[tokio::test]
async fn connect_failure_is_transport_negotiation_not_retried() {
    // A bare (unpooled) server: dropping it actually closes the
    // listener, which pooled `MockServer::start()` servers do not.
    let server = MockServer::builder().start().await;
    mount_bootstrap(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/api/DB/BindComparisonFundReturns"))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("returns.json")))
        .expect(1)
        .mount(&server)
        .await;

    let client = FundDataClient::with_base_url(&server.uri()).unwrap();
    client
        .execute(QueryKind::CurrentReturns, &QueryParams::default())
        .await
        .unwrap();

    // The portal goes away while the session is still cached. The
    // next query must surface the connect failure immediately instead
    // of churning sessions or walking fallback candidates.
    drop(server);
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let err = client
        .execute(QueryKind::CurrentReturns, &QueryParams::default())
        .await
        .unwrap_err();
    assert!(matches!(err, tefas_api::Error::TransportNegotiation(_)));
}

#[tokio::test]
async fn concurrent_stale_callers_share_one_bootstrap() {
    let server = MockServer::start().await;
    // One initial acquire + exactly one shared refresh.
    mount_bootstrap(&server, 2).await;

    let http = TransportProfile::default().build_client().unwrap();
    let manager = Arc::new(SessionManager::new(
        http,
        &server.uri(),
        "/FonKarsilastirma.aspx",
    ));
    let stale = manager.acquire().await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let manager = Arc::clone(&manager);
        let stale = stale.clone();
        handles.push(tokio::spawn(async move {
            manager.refresh(&stale).await.unwrap()
        }));
    }
    let mut cookies = Vec::new();
    for handle in handles {
        cookies.push(handle.await.unwrap().cookie);
    }

    assert_eq!(manager.bootstrap_count(), 2);
    assert!(cookies.iter().all(|c| c == &cookies[0]));
}

#[tokio::test]
async fn invalidate_only_drops_the_current_session() {
    let server = MockServer::start().await;
    // Initial acquire + re-acquire after invalidation.
    mount_bootstrap(&server, 2).await;

    let http = TransportProfile::default().build_client().unwrap();
    let manager = SessionManager::new(http, &server.uri(), "/FonKarsilastirma.aspx");

    let first = manager.acquire().await.unwrap();
    manager.invalidate(&first).await;
    let second = manager.acquire().await.unwrap();
    assert_eq!(second.attempt, 2);

    // Invalidating with an already-replaced session is a no-op.
    manager.invalidate(&first).await;
    let third = manager.acquire().await.unwrap();
    assert_eq!(third.attempt, 2);
}

#[tokio::test]
async fn history_query_posts_fund_code_and_range() {
    let server = MockServer::start().await;
    mount_bootstrap(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/api/DB/BindHistoryInfo"))
        .and(body_string_contains("fonkod=MAC"))
        .and(body_string_contains("bastarih=03.06.2024"))
        .and(body_string_contains("bittarih=14.06.2024"))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("history.json")))
        .expect(1)
        .mount(&server)
        .await;

    let client = FundDataClient::with_base_url(&server.uri()).unwrap();
    let rows = client
        .execute(
            QueryKind::History,
            &QueryParams {
                fund_code: Some("MAC".to_string()),
                range: Some((
                    chrono::NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
                    chrono::NaiveDate::from_ymd_opt(2024, 6, 14).unwrap(),
                )),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 4);
}
