use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use reqwest::Client;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::time::sleep;

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

#[cfg(unix)]
mod cleanup {
    use once_cell::sync::Lazy;
    use std::sync::{Mutex, Once};

    static REGISTER: Once = Once::new();
    static PIDS: Lazy<Mutex<Vec<i32>>> = Lazy::new(|| Mutex::new(Vec::new()));

    pub fn register(pid: u32) {
        if let Ok(mut pids) = PIDS.lock() {
            pids.push(pid as i32);
        }
        REGISTER.call_once(|| unsafe {
            libc::atexit(on_exit);
        });
    }

    extern "C" fn on_exit() {
        if let Ok(pids) = PIDS.lock() {
            for pid in pids.iter().copied().filter(|pid| *pid > 0) {
                unsafe {
                    libc::kill(pid, libc::SIGTERM);
                }
            }
        }
    }
}

/// Stand-in for the stats backend: replays scripted `/check` responses.
#[derive(Clone, Default)]
struct FakeBackend {
    responses: Arc<Mutex<VecDeque<(StatusCode, Value)>>>,
    hits: Arc<AtomicUsize>,
}

impl FakeBackend {
    fn push(&self, status: StatusCode, body: Value) {
        self.responses.lock().unwrap().push_back((status, body));
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    async fn serve(self) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route("/check", get(check)).with_state(self);
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{addr}")
    }
}

async fn check(State(backend): State<FakeBackend>) -> (StatusCode, Json<Value>) {
    backend.hits.fetch_add(1, Ordering::SeqCst);
    let mut responses = backend.responses.lock().unwrap();
    let (status, body) = if responses.len() > 1 {
        responses.pop_front().unwrap()
    } else {
        responses.front().cloned().unwrap()
    };
    (status, Json(body))
}

fn check_body(changed: bool, summary: &str, followers: i64) -> Value {
    json!({
        "changed": changed,
        "ai_summary": summary,
        "stats": {
            "posts": 10,
            "followers": followers,
            "following": 50,
            "lastChecked": "2024-01-01 10:00",
            "recentPosts": [
                { "id": "Cx1", "imageUrl": "http://img/1", "likes": 1500,
                  "comments": 12, "caption": "hello", "timestamp": "2024-01-01T09:00:00" }
            ]
        }
    })
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/health")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_tracker(backend_url: Option<&str>) -> TestServer {
    let port = pick_free_port();
    let mut command = Command::new(env!("CARGO_BIN_EXE_account_tracker"));
    command
        .env("PORT", port.to_string())
        .env("TRACKER_NOTIFIER", "off")
        .env("RUST_LOG", "info")
        .env_remove("TRACKER_BACKEND_URL")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    if let Some(url) = backend_url {
        command.env("TRACKER_BACKEND_URL", url);
    }
    let child = command.spawn().expect("failed to spawn tracker");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn tracker_state(client: &Client, server: &TestServer) -> Value {
    client
        .get(format!("{}/api/state", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn http_startup_configuration_records_change() {
    let backend = FakeBackend::default();
    backend.push(StatusCode::OK, check_body(true, "Gained 3 followers", 103));
    let backend_url = backend.clone().serve().await;

    let server = spawn_tracker(Some(&backend_url)).await;
    let client = Client::new();
    let state = tracker_state(&client, &server).await;

    assert_eq!(state["setup_visible"], json!(false));
    assert_eq!(state["request"]["status"], json!("idle"));
    assert_eq!(state["stats"]["followers"], json!(103));
    assert_eq!(state["history"].as_array().unwrap().len(), 1);
    assert_eq!(state["history"][0]["summary"], json!("Gained 3 followers"));
    assert_eq!(backend.hits(), 1);
}

#[tokio::test]
async fn http_setup_refresh_and_reconfigure() {
    let backend = FakeBackend::default();
    backend.push(StatusCode::OK, check_body(false, "No changes detected", 100));
    backend.push(StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "Failed" }));
    let backend_url = backend.clone().serve().await;

    let server = spawn_tracker(None).await;
    let client = Client::new();

    let state = tracker_state(&client, &server).await;
    assert_eq!(state["setup_visible"], json!(true));
    assert_eq!(state["stats"]["posts"], json!("Loading..."));

    let response = client
        .post(format!("{}/api/refresh", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    assert_eq!(backend.hits(), 0);

    let response = client
        .post(format!("{}/api/configure", server.base_url))
        .json(&json!({ "backend_url": "  " }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

    let state: Value = client
        .post(format!("{}/api/configure", server.base_url))
        .json(&json!({ "backend_url": backend_url }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(state["setup_visible"], json!(false));
    assert_eq!(state["stats"]["followers"], json!(100));
    assert!(state["history"].as_array().unwrap().is_empty());
    assert_eq!(backend.hits(), 1);

    let state: Value = client
        .post(format!("{}/api/refresh", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(state["request"]["status"], json!("errored"));
    assert_eq!(
        state["request"]["message"],
        json!("Failed to fetch data. Is backend running?")
    );
    assert_eq!(state["stats"]["followers"], json!(100));
    assert_eq!(backend.hits(), 2);

    let state: Value = client
        .post(format!("{}/api/reconfigure", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(state["setup_visible"], json!(true));
}

#[tokio::test]
async fn http_dashboard_setup_form_starts_tracking() {
    let backend = FakeBackend::default();
    backend.push(StatusCode::OK, check_body(true, "Posted 1 new post", 42));
    let backend_url = backend.clone().serve().await;

    let server = spawn_tracker(None).await;
    let client = Client::new();

    let page = client
        .get(format!("{}/", server.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Start Tracking"));

    let response = client
        .post(format!("{}/setup", server.base_url))
        .form(&[("backend_url", "   ")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

    let response = client
        .post(format!("{}/refresh", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    assert_eq!(backend.hits(), 0);

    let page = client
        .post(format!("{}/setup", server.base_url))
        .form(&[("backend_url", backend_url.as_str())])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Current Stats"));
    assert!(page.contains("<strong>Followers:</strong> 42"));
    assert!(page.contains(" - Posted 1 new post"));
    assert!(page.contains("1,500"));
    assert_eq!(backend.hits(), 1);
}
