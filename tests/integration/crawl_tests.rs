//! Integration tests for the crawl pipeline
//!
//! These tests use wiremock to serve a small site and drive it through the
//! orchestrator, the HTTP runner, the tree builder and both storage sinks.

use site_atlas::config::{Config, CrawlerConfig, OrchestratorConfig, OutputConfig, UserAgentConfig};
use site_atlas::output::{read_site_tree_json, write_site_tree_json};
use site_atlas::storage::{MemoryObjectStore, SqliteRecordSink};
use site_atlas::tree::SiteTreeNode;
use site_atlas::{HttpCrawlRunner, Orchestrator, TaskStatus};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const POLL: Duration = Duration::from_millis(20);

fn create_test_config() -> Config {
    Config {
        crawler: CrawlerConfig {
            max_pages: 20,
            page_timeout_secs: 5,
            crawl_timeout_secs: 30,
            excluded_extensions: vec![".pdf".to_string()],
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        orchestrator: OrchestratorConfig {
            max_attempts: 3,
            retry_delay_ms: 10,
            retention_secs: 3600,
            sweep_interval_secs: 60,
        },
        output: OutputConfig {
            database_path: ":memory:".to_string(),
            snapshot_dir: "./snapshots".to_string(),
            site_tree_dir: "./site-trees".to_string(),
        },
    }
}

fn html(title: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">{}</a>"#, href, href))
        .collect();
    format!(
        "<html><head><title>{}</title></head><body>{}</body></html>",
        title, anchors
    )
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .mount(server)
        .await;
}

async fn mount_site(server: &MockServer) {
    mount_page(
        server,
        "/",
        html(
            "Home",
            &["/en", "/docs/guide", "/manual.pdf", "https://elsewhere.org/"],
        ),
    )
    .await;
    mount_page(server, "/en", html("English", &["/en/about", "/"])).await;
    mount_page(server, "/en/about", html("About us", &["/en"])).await;
    mount_page(server, "/docs/guide", html("Guide", &[])).await;
}

/// Completed crawls are recorded right after the task turns completed
async fn wait_for_rows(sink: &SqliteRecordSink, rows: u64) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while sink.count_crawls().unwrap() < rows {
            tokio::time::sleep(POLL).await;
        }
    })
    .await
    .expect("crawl row was not recorded");
}

struct Harness {
    orchestrator: Orchestrator,
    objects: Arc<MemoryObjectStore>,
    sink: Arc<SqliteRecordSink>,
}

fn start(config: &Config) -> Harness {
    let objects = Arc::new(MemoryObjectStore::new());
    let sink = Arc::new(SqliteRecordSink::new_in_memory().unwrap());
    let runner = HttpCrawlRunner::new(config, objects.clone()).unwrap();

    let orchestrator = Orchestrator::builder(Arc::new(runner))
        .settings(config.orchestrator.clone())
        .record_sink(sink.clone())
        .start();

    Harness {
        orchestrator,
        objects,
        sink,
    }
}

#[tokio::test]
async fn test_full_crawl_builds_site_tree() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let harness = start(&create_test_config());
    let id = harness
        .orchestrator
        .submit("user-1", &server.uri())
        .unwrap();
    let task = harness.orchestrator.wait_for(&id, POLL).await.unwrap();

    assert_eq!(task.status, TaskStatus::Completed, "error: {:?}", task.error);
    assert_eq!(task.progress, Some(100));
    assert_eq!(task.attempts, 1);

    let tree = task.result.expect("completed task carries a tree");
    assert_eq!(tree.page_count(), 4);
    assert_eq!(tree.top.page.as_ref().unwrap().title, "Home");

    let en = tree.get(&["en"]).unwrap();
    assert!(en.is_leaf());
    assert_eq!(en.title(), "English");
    assert_eq!(en.level(), 1);

    let about = tree.get(&["en", "about"]).unwrap();
    assert_eq!(about.title(), "About us");
    assert_eq!(about.level(), 2);

    let docs = tree.get(&["docs"]).unwrap();
    assert!(matches!(docs, SiteTreeNode::Interior { .. }));
    assert_eq!(docs.url(), "top/docs");
    assert_eq!(tree.get(&["docs", "guide"]).unwrap().title(), "Guide");

    assert!(tree.get(&["manual.pdf"]).is_none());

    harness.orchestrator.shutdown().await;
}

#[tokio::test]
async fn test_snapshots_uploaded_under_owner_prefix() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let harness = start(&create_test_config());
    let id = harness
        .orchestrator
        .submit("user-1", &server.uri())
        .unwrap();
    harness.orchestrator.wait_for(&id, POLL).await.unwrap();

    assert_eq!(
        harness.objects.keys(),
        vec![
            "private/user-1/127.0.0.1-docs-guide.html".to_string(),
            "private/user-1/127.0.0.1-en-about.html".to_string(),
            "private/user-1/127.0.0.1-en.html".to_string(),
            "private/user-1/127.0.0.1-top.html".to_string(),
        ]
    );

    let home = harness
        .objects
        .get("private/user-1/127.0.0.1-top.html")
        .unwrap();
    assert!(String::from_utf8(home).unwrap().contains("<title>Home</title>"));
}

#[tokio::test]
async fn test_completed_crawl_recorded_in_database() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let harness = start(&create_test_config());
    let id = harness
        .orchestrator
        .submit("user-1", &server.uri())
        .unwrap();
    let task = harness.orchestrator.wait_for(&id, POLL).await.unwrap();
    wait_for_rows(&harness.sink, 1).await;

    let crawls = harness.sink.list_crawls(10).unwrap();
    assert_eq!(crawls.len(), 1);

    let row = &crawls[0];
    assert_eq!(row.user_id, "user-1");
    assert_eq!(row.site_url, task.target_url);
    assert_eq!(
        row.thumbnail_path.as_deref(),
        Some("private/user-1/127.0.0.1-top.html")
    );

    let stored: serde_json::Value = serde_json::from_str(&row.json_data).unwrap();
    let expected = serde_json::to_value(task.result.as_ref().unwrap()).unwrap();
    assert_eq!(stored, expected);
}

#[tokio::test]
async fn test_unreachable_site_fails_after_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let harness = start(&create_test_config());
    let id = harness
        .orchestrator
        .submit("user-1", &server.uri())
        .unwrap();
    let task = harness.orchestrator.wait_for(&id, POLL).await.unwrap();

    assert_eq!(task.status, TaskStatus::Error);
    assert_eq!(task.attempts, 3);
    assert!(task.error.unwrap().contains("HTTP 500"));
    assert!(task.result.is_none());
    assert_eq!(harness.sink.count_crawls().unwrap(), 0);
}

#[tokio::test]
async fn test_transient_failure_recovers_on_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_site(&server).await;

    let harness = start(&create_test_config());
    let id = harness
        .orchestrator
        .submit("user-1", &server.uri())
        .unwrap();
    let task = harness.orchestrator.wait_for(&id, POLL).await.unwrap();

    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.attempts, 2);
    wait_for_rows(&harness.sink, 1).await;
    assert_eq!(harness.sink.count_crawls().unwrap(), 1);
}

#[tokio::test]
async fn test_site_tree_written_as_json() {
    let server = MockServer::start().await;
    mount_site(&server).await;
    let temp_dir = TempDir::new().unwrap();

    let harness = start(&create_test_config());
    let id = harness
        .orchestrator
        .submit("user-1", &server.uri())
        .unwrap();
    let task = harness.orchestrator.wait_for(&id, POLL).await.unwrap();
    let tree = task.result.unwrap();

    let path = write_site_tree_json(temp_dir.path(), &id, &tree).unwrap();
    assert_eq!(path.file_name().unwrap().to_str().unwrap(), format!("{}.json", id));
    assert_eq!(read_site_tree_json(&path).unwrap(), tree);
}
