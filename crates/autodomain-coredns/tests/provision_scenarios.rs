//! End-to-end provisioning scenarios against a mock certificate log

use mockall::mock;
use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use autodomain_coredns::{
    ArtifactWriter, CorednsConfig, CorednsError, CorednsResult, DnsServerRestarter,
    ProvisionRequest, Provisioner, RestartOutcome,
};
use autodomain_discovery::{CertificateLogConfig, DiscoveryAggregator, Service};

mock! {
    Restarter {}
    #[async_trait::async_trait]
    impl DnsServerRestarter for Restarter {
        async fn restart(&self) -> CorednsResult<()>;
        fn manual_command(&self) -> String;
    }
}

/// Certificate log that fails every request
async fn offline_certificate_log() -> MockServer {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;
    mock_server
}

fn certificate_log_config(mock_server: &MockServer) -> CertificateLogConfig {
    CertificateLogConfig {
        base_url: mock_server.uri(),
        max_attempts: 3,
        retry_delay: Duration::ZERO,
        timeout: Duration::from_secs(2),
    }
}

fn coredns_config(temp: &TempDir) -> CorednsConfig {
    CorednsConfig::default()
        .with_conf_dir(temp.path().join("coredns/conf.d"))
        .with_hosts_dir(temp.path().join("unblocker"))
}

fn provisioner(
    mock_server: &MockServer,
    config: CorednsConfig,
    restarter: Option<Arc<dyn DnsServerRestarter>>,
) -> Provisioner {
    let aggregator =
        DiscoveryAggregator::with_default_sources(certificate_log_config(mock_server)).unwrap();
    Provisioner::new(aggregator, ArtifactWriter::new(config), restarter)
}

fn request(service: &str, proxy_ip: &str) -> ProvisionRequest {
    ProvisionRequest {
        service: Service::parse(service).unwrap(),
        proxy_ip: proxy_ip.parse::<IpAddr>().unwrap(),
    }
}

fn restarter_expecting(times: usize) -> Arc<dyn DnsServerRestarter> {
    let mut restarter = MockRestarter::new();
    restarter.expect_restart().times(times).returning(|| Ok(()));
    restarter
        .expect_manual_command()
        .returning(|| "sudo systemctl restart coredns".to_string());
    Arc::new(restarter)
}

fn is_empty_dir(dir: &Path) -> bool {
    !dir.exists() || std::fs::read_dir(dir).unwrap().next().is_none()
}

#[tokio::test]
async fn test_spotify_with_certificate_log_offline() {
    let mock_server = offline_certificate_log().await;
    let temp = TempDir::new().unwrap();
    let config = coredns_config(&temp);
    let provisioner = provisioner(&mock_server, config.clone(), Some(restarter_expecting(1)));

    let report = provisioner
        .provision(&request("spotify", "10.0.0.5"))
        .await
        .unwrap();

    // Fallback entries survive a dead certificate log, curated ones join them
    for domain in ["spotify.com", "scdn.co", "spotifycdn.com", "open.spotify.com"] {
        assert!(report.domains.contains(domain), "missing {}", domain);
    }
    assert_eq!(report.domain_count, 12);
    assert_eq!(report.primary_domain, "spotify.com");
    assert_eq!(report.restart, RestartOutcome::Restarted);

    let hosts = std::fs::read_to_string(config.hosts_file("spotify")).unwrap();
    let lines: Vec<&str> = hosts.lines().collect();
    assert_eq!(lines.len(), 12);
    assert!(lines.contains(&"10.0.0.5 spotify.com"));
    let mut sorted = lines.clone();
    sorted.sort();
    assert_eq!(lines, sorted);

    let conf = std::fs::read_to_string(config.conf_file("spotify")).unwrap();
    assert!(conf.starts_with("spotify.com {\n"));
    assert!(conf.contains(&format!(
        "hosts {} {{",
        config.hosts_file("spotify").display()
    )));
    assert!(conf.contains("        fallthrough\n        ttl 300\n"));

    // 3 attempts against the dead endpoint
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_gemini_uses_primary_domain_override() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json"))
        .and(query_param("q", "gemini.google.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"common_name": "gemini.google.com", "name_value": "gemini.google.com\n*.gemini.google.com\nrobin.gemini.google.com"}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let temp = TempDir::new().unwrap();
    let config = coredns_config(&temp);
    let provisioner = provisioner(&mock_server, config.clone(), Some(restarter_expecting(1)));

    let report = provisioner
        .provision(&request("Gemini", "10.0.0.5"))
        .await
        .unwrap();

    assert_eq!(report.primary_domain, "gemini.google.com");
    assert!(report.domains.contains("robin.gemini.google.com"));
    assert!(report.domains.contains("generativelanguage.googleapis.com"));

    let conf = std::fs::read_to_string(config.conf_file("gemini")).unwrap();
    assert!(conf.starts_with("gemini.google.com {\n"));
    assert!(!conf.contains("gemini.com {"));
}

#[tokio::test]
async fn test_unknown_service_aborts_without_artifacts() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json"))
        .and(query_param("q", "doesnotexist.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&mock_server)
        .await;

    let temp = TempDir::new().unwrap();
    let config = coredns_config(&temp);
    let provisioner = provisioner(&mock_server, config.clone(), Some(restarter_expecting(0)));

    let result = provisioner
        .provision(&request("doesnotexist", "10.0.0.5"))
        .await;

    match result {
        Err(CorednsError::NoDomainsDiscovered(service)) => assert_eq!(service, "doesnotexist"),
        other => panic!("Expected NoDomainsDiscovered, got {:?}", other),
    }
    assert!(is_empty_dir(&config.hosts_dir));
    assert!(is_empty_dir(&config.conf_dir));
}

#[tokio::test]
async fn test_restart_failure_is_not_fatal() {
    let mock_server = offline_certificate_log().await;
    let temp = TempDir::new().unwrap();
    let config = coredns_config(&temp);

    let mut restarter = MockRestarter::new();
    restarter.expect_restart().times(1).returning(|| {
        Err(CorednsError::RestartFailed {
            command: "sudo systemctl restart coredns".to_string(),
            status: "exit status: 1".to_string(),
        })
    });
    restarter
        .expect_manual_command()
        .returning(|| "sudo systemctl restart coredns".to_string());

    let provisioner = provisioner(&mock_server, config.clone(), Some(Arc::new(restarter)));
    let report = provisioner
        .provision(&request("spotify", "10.0.0.5"))
        .await
        .unwrap();

    match report.restart {
        RestartOutcome::Failed { manual_command, .. } => {
            assert_eq!(manual_command, "sudo systemctl restart coredns")
        }
        other => panic!("Expected Failed restart, got {:?}", other),
    }
    assert!(config.hosts_file("spotify").exists());
    assert!(config.conf_file("spotify").exists());
}

#[tokio::test]
async fn test_without_restarter_restart_is_skipped() {
    let mock_server = offline_certificate_log().await;
    let temp = TempDir::new().unwrap();
    let config = coredns_config(&temp);
    let provisioner = provisioner(&mock_server, config, None);

    let report = provisioner
        .provision(&request("spotify", "10.0.0.5"))
        .await
        .unwrap();

    assert_eq!(report.restart, RestartOutcome::Skipped);
}

#[tokio::test]
async fn test_write_failure_is_fatal_and_skips_restart() {
    let mock_server = offline_certificate_log().await;
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("blocker");
    std::fs::write(&blocker, "").unwrap();

    let config = CorednsConfig::default()
        .with_conf_dir(temp.path().join("conf.d"))
        .with_hosts_dir(blocker.join("hosts"));
    let provisioner = provisioner(&mock_server, config, Some(restarter_expecting(0)));

    let result = provisioner
        .provision(&request("spotify", "10.0.0.5"))
        .await;
    assert!(matches!(result, Err(CorednsError::CreateDirectory { .. })));
}

#[tokio::test]
async fn test_plan_writes_nothing() {
    let mock_server = offline_certificate_log().await;
    let temp = TempDir::new().unwrap();
    let config = coredns_config(&temp);
    let provisioner = provisioner(&mock_server, config.clone(), Some(restarter_expecting(0)));

    let plan = provisioner
        .plan(&request("spotify", "192.168.1.20"))
        .await
        .unwrap();

    assert!(plan
        .artifacts
        .hosts_content
        .contains("192.168.1.20 spotifycdn.com\n"));
    assert!(plan.artifacts.conf_content.starts_with("spotify.com {\n"));
    assert!(!config.hosts_dir.exists());
    assert!(!config.conf_dir.exists());
}

#[tokio::test]
async fn test_report_serializes_to_json() {
    let mock_server = offline_certificate_log().await;
    let temp = TempDir::new().unwrap();
    let provisioner = provisioner(&mock_server, coredns_config(&temp), None);

    let report = provisioner
        .provision(&request("spotify", "10.0.0.5"))
        .await
        .unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["service"], "spotify");
    assert_eq!(json["proxy_ip"], "10.0.0.5");
    assert_eq!(json["domain_count"], 12);
    assert_eq!(json["restart"]["status"], "skipped");
    assert_eq!(json["domains"][0], "ap-http-lb.spotify.com");
}
