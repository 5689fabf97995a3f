use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct IssuesResponse {
    source: String,
    count: usize,
}

#[derive(Debug, Deserialize)]
struct Totals {
    open_issues: usize,
}

#[derive(Debug, Deserialize)]
struct DashboardResponse {
    source: String,
    status: String,
    notice: Option<String>,
    totals: Totals,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("realm_board_http_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

/// Waits until the server answers and its one-shot load decision is made.
async fn wait_until_loaded(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/issues")).send().await {
            if resp.status().is_success() {
                if let Ok(issues) = resp.json::<IssuesResponse>().await {
                    if issues.source != "not_fetched" {
                        return;
                    }
                }
            }
        }
        if Instant::now() > deadline {
            panic!("server did not finish loading");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    // Nothing listens here, so every GitHub call fails at the network level.
    let github_port = pick_free_port();
    let data_path = unique_data_path();
    let child = Command::new(env!("CARGO_BIN_EXE_realm_board"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", data_path)
        .env("GITHUB_API_BASE", format!("http://127.0.0.1:{github_port}"))
        .env("HTTP_TIMEOUT_SECS", "2")
        .env_remove("GITHUB_TOKEN")
        .env_remove("DASHBOARD_GITHUB_TOKEN")
        .env_remove("MOCK_FALLBACK")
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_loaded(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

#[tokio::test]
async fn http_unreachable_github_falls_back_to_mock() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let issues: IssuesResponse = client
        .get(format!("{}/api/issues", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(issues.source, "mock");
    assert_eq!(issues.count, 1019);

    let board: DashboardResponse = client
        .get(format!("{}/api/dashboard", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(board.source, "mock");
    assert_eq!(board.status, "Using Cache");
    assert_eq!(board.totals.open_issues, 900);
    assert!(board.notice.is_some());
}

#[tokio::test]
async fn http_index_renders_banner_and_dom_contract() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let html = client
        .get(format!("{}/", server.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(html.contains("id=\"cache-notice\""));
    assert!(html.contains("simulated issues"));
    for id in [
        "task-list",
        "user-level",
        "user-xp",
        "xp-progress",
        "user-coins",
        "memory-container",
        "skills-container",
        "total-xp",
        "total-coins",
        "open-issues",
        "portfolio-value",
        "memory-modal",
        "sprint-filter",
        "type-filter",
        "task-search",
        "api-status",
    ] {
        assert!(html.contains(&format!("id=\"{id}\"")), "missing #{id}");
    }
}

#[tokio::test]
async fn http_manual_retry_reenters_the_chain() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/refresh", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let board: DashboardResponse = response.json().await.unwrap();
    assert_eq!(board.source, "mock");
}

#[tokio::test]
async fn http_task_actions_require_a_token() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let complete = client
        .post(format!("{}/api/tasks/120/complete", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(complete.status(), StatusCode::UNAUTHORIZED);

    let claim = client
        .post(format!("{}/api/tasks/120/claim", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(claim.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn http_locked_memory_is_hidden() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let locked = client
        .get(format!("{}/api/memories/1", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(locked.status(), StatusCode::NOT_FOUND);

    let unknown = client
        .get(format!("{}/api/memories/50", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}
