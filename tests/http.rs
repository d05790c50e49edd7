use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct CountriesResponse {
    countries: Vec<String>,
    default_selection: Vec<String>,
    variant: String,
    window_length: usize,
    poly_order: usize,
}

#[derive(Debug, Deserialize)]
struct SeriesPoint {
    date: String,
    days_from_first: i64,
    confirmed: i64,
    daily_new: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct CountrySeries {
    country: String,
    points: Vec<SeriesPoint>,
}

#[derive(Debug, Deserialize)]
struct SmoothedSeries {
    derivative: usize,
    days_from_first: Vec<i64>,
    values: Vec<f64>,
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

/// Wide table with a leading zero column, a split-province country and a
/// quoted name containing a comma.
fn fixture_csv() -> String {
    let days = 30;
    let mut header = String::from("Province/State,Country/Region,Lat,Long");
    for day in 0..days {
        header.push_str(&format!(",3/{}/20", day + 1));
    }

    let mut rows = vec![header];
    let a: Vec<i64> = vec![0, 1, 1, 3, 6, 10];
    let mut row = String::from(",A,0.0,0.0");
    for day in 0..days {
        row.push_str(&format!(",{}", a.get(day).copied().unwrap_or(10)));
    }
    rows.push(row);

    for (province, offset) in [("North", 0), ("South", 1)] {
        let mut row = format!("{province},Italy,41.8,12.5");
        for day in 0..days as i64 {
            row.push_str(&format!(",{}", day * day + offset));
        }
        rows.push(row);
    }

    let mut row = String::from(",\"Korea, South\",36.0,128.0");
    for day in 0..days {
        row.push_str(&format!(",{}", 5 * (day + 1)));
    }
    rows.push(row);

    rows.join("\n") + "\n"
}

fn write_fixture() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("covid_dashboard_http_{}_{}.csv", std::process::id(), nanos));
    std::fs::write(&path, fixture_csv()).expect("write fixture");
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/health")).send().await {
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

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let source = write_fixture();
    let child = Command::new(env!("CARGO_BIN_EXE_covid-dashboard"))
        .env("PORT", port.to_string())
        .env("COVID_SOURCE", source)
        .env("DASHBOARD_VARIANT", "tunable")
        .env("DEFAULT_COUNTRIES", "Italy;Atlantis;Korea, South")
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

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

fn trace_countries(chart: &Value) -> BTreeSet<String> {
    chart["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|trace| trace["country"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn http_countries_lists_loaded_dataset() {
    let server = shared_server().await;
    let countries: CountriesResponse = Client::new()
        .get(format!("{}/api/countries", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(countries.countries, vec!["A", "Italy", "Korea, South"]);
    assert_eq!(countries.default_selection, vec!["Italy", "Korea, South"]);
    assert_eq!(countries.variant, "tunable");
    assert_eq!(countries.window_length, 21);
    assert_eq!(countries.poly_order, 2);
}

#[tokio::test]
async fn http_series_returns_derived_columns() {
    let server = shared_server().await;
    let series: CountrySeries = Client::new()
        .get(format!("{}/api/series/A", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(series.country, "A");
    let head: Vec<&SeriesPoint> = series.points.iter().take(5).collect();
    let days: Vec<i64> = head.iter().map(|p| p.days_from_first).collect();
    let confirmed: Vec<i64> = head.iter().map(|p| p.confirmed).collect();
    let daily: Vec<Option<i64>> = head.iter().map(|p| p.daily_new).collect();
    assert_eq!(days, vec![0, 1, 2, 3, 4]);
    assert_eq!(confirmed, vec![1, 1, 3, 6, 10]);
    assert_eq!(daily, vec![None, Some(0), Some(2), Some(3), Some(4)]);
    assert_eq!(head[0].date, "2020-03-02");
}

#[tokio::test]
async fn http_series_sums_provinces() {
    let server = shared_server().await;
    let series: CountrySeries = Client::new()
        .get(format!("{}/api/series/Italy", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // North starts at 0 and South at 1, so the first day already counts.
    assert_eq!(series.points[0].confirmed, 1);
    assert_eq!(series.points[1].confirmed, 3);
    assert_eq!(series.points[1].daily_new, Some(2));
}

#[tokio::test]
async fn http_unknown_series_is_not_found() {
    let server = shared_server().await;
    let response = Client::new()
        .get(format!("{}/api/series/Atlantis", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn http_charts_cover_known_selection() {
    let server = shared_server().await;
    let response = Client::new()
        .post(format!("{}/api/charts", server.base_url))
        .json(&serde_json::json!({
            "countries": ["Korea, South", "Atlantis", "Italy"],
            "window_length": 7,
            "poly_order": 2
        }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let specs: Value = response.json().await.unwrap();

    let expected: BTreeSet<String> = ["Italy", "Korea, South"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(trace_countries(&specs["cumulative"]), expected);
    assert_eq!(trace_countries(&specs["daily_new"]), expected);
    assert_eq!(trace_countries(&specs["derivative"]), expected);
    assert_eq!(specs["cumulative"]["layout"]["yaxis"]["type"], "log");
    assert_eq!(specs["params"]["window_length"], 7);
}

#[tokio::test]
async fn http_charts_reject_even_window() {
    let server = shared_server().await;
    let response = Client::new()
        .post(format!("{}/api/charts", server.base_url))
        .json(&serde_json::json!({
            "countries": ["Italy"],
            "window_length": 8,
            "poly_order": 2
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response.text().await.unwrap();
    assert!(body.contains("odd"));
}

#[tokio::test]
async fn http_smoothed_derivative_of_linear_daily_new() {
    let server = shared_server().await;
    let smoothed: SmoothedSeries = Client::new()
        .get(format!(
            "{}/api/smoothed/Korea,%20South?window_length=7&poly_order=2&derivative=first",
            server.base_url
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(smoothed.derivative, 1);
    assert_eq!(smoothed.days_from_first[0], 1);
    assert_eq!(smoothed.values.len(), 29);
    assert!(smoothed.values.iter().all(|v| v.abs() < 1e-8));
}

#[tokio::test]
async fn http_charts_reject_window_beyond_slider_range() {
    let server = shared_server().await;
    let response = Client::new()
        .post(format!("{}/api/charts", server.base_url))
        .json(&serde_json::json!({
            "countries": ["Italy"],
            "window_length": 229,
            "poly_order": 2
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response.text().await.unwrap();
    assert!(body.contains("window_length"));
}
