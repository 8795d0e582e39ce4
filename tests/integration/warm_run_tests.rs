//! End-to-end warming runs
//!
//! One mock server acts as the sites' outbound proxy (every proxied request
//! for `http://warm.test/...` lands there), a second one plays the purge
//! API and a third one the export webhook.

use edge_warmer::config::parse_config;
use edge_warmer::output::FlushOutcome;
use edge_warmer::Coordinator;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Servers {
    proxy: MockServer,
    purge_api: MockServer,
    webhook: MockServer,
}

impl Servers {
    async fn start() -> Self {
        Self {
            proxy: MockServer::start().await,
            purge_api: MockServer::start().await,
            webhook: MockServer::start().await,
        }
    }

    fn config_toml(&self) -> String {
        self.config_toml_with_purge(&format!(
            "[purge]\nzone-id = \"zone123\"\napi-token = \"secret-token\"\napi-base = \"{}\"\n",
            self.purge_api.uri()
        ))
    }

    fn config_toml_with_purge(&self, purge_section: &str) -> String {
        format!(
            r#"
[warmer]
batch-size = 3
batch-delay-ms = 20
retry-delay-ms = 10

[[site]]
code = "se"
base-url = "http://warm.test"
proxy = "{proxy}"
user-agent = "Example-SE-CacheWarmer/1.0"

{purge_section}
[export]
webhook-url = "{webhook}/exec"
"#,
            proxy = self.proxy.uri(),
            purge_section = purge_section,
            webhook = self.webhook.uri(),
        )
    }
}

async fn mount_xml(server: &MockServer, at: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/xml")
                .set_body_string(body),
        )
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, at: &str, origin_cache: &str) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("cf-cache-status", "HIT")
                .insert_header("x-vercel-cache", origin_cache)
                .insert_header("cf-ray", "8a1b2c3d4e5f6789-ARN")
                .set_body_string("<html></html>"),
        )
        .expect(1)
        .mount(server)
        .await;
}

/// Sitemap index with two sub-sitemaps of two pages each; `/b1` is cold
async fn mount_site(proxy: &MockServer) {
    mount_xml(
        proxy,
        "/sitemap.xml",
        r#"<?xml version="1.0" encoding="UTF-8"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>http://warm.test/sitemap-a.xml</loc></sitemap>
  <sitemap><loc>http://warm.test/sitemap-b.xml</loc></sitemap>
</sitemapindex>"#,
    )
    .await;
    mount_xml(
        proxy,
        "/sitemap-a.xml",
        r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>http://warm.test/a1</loc></url>
  <url><loc>http://warm.test/a2</loc></url>
</urlset>"#,
    )
    .await;
    mount_xml(
        proxy,
        "/sitemap-b.xml",
        r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>http://warm.test/b1</loc></url>
  <url><loc>http://warm.test/b2</loc></url>
</urlset>"#,
    )
    .await;

    mount_page(proxy, "/a1", "HIT").await;
    mount_page(proxy, "/a2", "HIT").await;
    mount_page(proxy, "/b1", "MISS").await;
    mount_page(proxy, "/b2", "HIT").await;
}

async fn exported_body(webhook: &MockServer) -> Value {
    let requests = webhook.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1, "rows must be exported in one request");
    serde_json::from_slice(&requests[0].body).unwrap()
}

#[tokio::test]
async fn test_full_run_warms_purges_and_exports_once() {
    let servers = Servers::start().await;
    mount_site(&servers.proxy).await;

    Mock::given(method("POST"))
        .and(path("/zones/zone123/purge_cache"))
        .and(body_json(json!({ "files": ["http://warm.test/b1"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&servers.purge_api)
        .await;

    Mock::given(method("POST"))
        .and(path("/exec"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "inserted": 5,
            "sheet": "run"
        })))
        .mount(&servers.webhook)
        .await;

    let config = parse_config(&servers.config_toml(), |_| None).unwrap();
    let mut coordinator = Coordinator::new(config).unwrap();
    let report = coordinator.run().await;

    assert_eq!(report.statistics.urls_found, 4);
    assert_eq!(report.statistics.warmed_ok, 4);
    assert_eq!(report.statistics.warmed_error, 0);
    assert_eq!(report.statistics.purges_requested, 1);
    assert!(matches!(report.export, FlushOutcome::Exported { rows: 5, .. }));
    assert!(coordinator.run_log().is_empty());

    let body = exported_body(&servers.webhook).await;
    assert_eq!(body["sheetName"], Value::from(report.sheet_name.clone()));
    assert!(report.sheet_name.ends_with("_WITA"));

    let rows = body["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 5);
    assert!(rows.iter().all(|r| r.as_array().unwrap().len() == 12));
    assert!(rows.iter().all(|r| r[0] == Value::from(report.run_id.clone())));

    // Every row shares one completion time
    let finished = &rows[0][2];
    assert!(finished.is_string());
    assert!(rows.iter().all(|r| &r[2] == finished));

    // Summary row first, then the pages in sitemap order
    assert_eq!(rows[0][11], "Found 4 URLs for se");
    let urls: Vec<&str> = rows[1..].iter().map(|r| r[4].as_str().unwrap()).collect();
    assert_eq!(
        urls,
        vec![
            "http://warm.test/a1",
            "http://warm.test/a2",
            "http://warm.test/b1",
            "http://warm.test/b2",
        ]
    );

    let cold = &rows[3];
    assert_eq!(cold[3], "ARN");
    assert_eq!(cold[5], 200);
    assert_eq!(cold[6], "HIT");
    assert_eq!(cold[7], "MISS");
    assert_eq!(cold[8], "8a1b2c3d4e5f6789-ARN");
    assert_eq!(cold[10], 0);
}

#[tokio::test]
async fn test_rejected_export_keeps_rows() {
    let servers = Servers::start().await;
    mount_site(&servers.proxy).await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&servers.purge_api)
        .await;

    Mock::given(method("POST"))
        .and(path("/exec"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"ok": false, "error": "quota"})),
        )
        .mount(&servers.webhook)
        .await;

    let config = parse_config(&servers.config_toml(), |_| None).unwrap();
    let mut coordinator = Coordinator::new(config).unwrap();
    let report = coordinator.run().await;

    assert!(matches!(report.export, FlushOutcome::Failed { retained: 5, .. }));
    assert_eq!(report.statistics.rows_exported, 0);
    assert_eq!(coordinator.run_log().len(), 5);
    assert!(coordinator
        .run_log()
        .rows()
        .iter()
        .all(|r| r.finished_at.is_some()));
}

#[tokio::test]
async fn test_failing_pages_are_recorded_not_fatal() {
    let servers = Servers::start().await;
    mount_xml(
        &servers.proxy,
        "/sitemap.xml",
        r#"<sitemapindex><sitemap><loc>http://warm.test/pages.xml</loc></sitemap></sitemapindex>"#,
    )
    .await;
    mount_xml(
        &servers.proxy,
        "/pages.xml",
        r#"<urlset><url><loc>http://warm.test/gone</loc></url><url><loc>http://warm.test/ok</loc></url></urlset>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&servers.proxy)
        .await;
    mount_page(&servers.proxy, "/ok", "HIT").await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "inserted": 3})))
        .mount(&servers.webhook)
        .await;

    let config = parse_config(&servers.config_toml(), |_| None).unwrap();
    let mut coordinator = Coordinator::new(config).unwrap();
    let report = coordinator.run().await;

    assert_eq!(report.statistics.warmed_ok, 1);
    assert_eq!(report.statistics.warmed_error, 1);
    assert_eq!(report.statistics.purges_requested, 0);

    let body = exported_body(&servers.webhook).await;
    let gone = &body["rows"][1];
    assert_eq!(gone[4], "http://warm.test/gone");
    assert_eq!(gone[3], "se");
    assert_eq!(gone[5], 404);
    assert_eq!(gone[10], 1);
    assert!(gone[11].as_str().unwrap().contains("404"));
    assert!(servers.purge_api.received_requests().await.unwrap().is_empty());
}

async fn run_without_purge_credentials(purge_section: impl Fn(&Servers) -> String) {
    let servers = Servers::start().await;
    mount_site(&servers.proxy).await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(0)
        .mount(&servers.purge_api)
        .await;

    Mock::given(method("POST"))
        .and(path("/exec"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "inserted": 5})))
        .mount(&servers.webhook)
        .await;

    let config = parse_config(&servers.config_toml_with_purge(&purge_section(&servers)), |_| {
        None
    })
    .unwrap();
    let mut coordinator = Coordinator::new(config).unwrap();
    let report = coordinator.run().await;

    // The cold page is still warmed and recorded, only the purge is skipped
    assert_eq!(report.statistics.warmed_ok, 4);
    assert!(matches!(report.export, FlushOutcome::Exported { rows: 5, .. }));
    let body = exported_body(&servers.webhook).await;
    assert_eq!(body["rows"][3][7], "MISS");
    assert!(servers.purge_api.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_run_without_purge_section_never_purges() {
    run_without_purge_credentials(|_| String::new()).await;
}

#[tokio::test]
async fn test_run_with_zone_only_never_purges() {
    run_without_purge_credentials(|servers| {
        format!(
            "[purge]\nzone-id = \"zone123\"\napi-base = \"{}\"\n",
            servers.purge_api.uri()
        )
    })
    .await;
}
