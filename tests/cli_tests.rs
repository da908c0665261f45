use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};
use std::thread;
use tempfile::TempDir;

fn rentreport_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("rentreport"))
}

/// Minimal backend answering the report endpoints with canned envelopes
struct StubBackend {
    base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubBackend {
    fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { continue };
                let request_line = read_request(&mut stream);
                seen.lock().unwrap().push(request_line.clone());

                let body = route(&request_line);
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });

        Self {
            base_url: format!("http://127.0.0.1:{port}/api"),
            requests,
        }
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// Read one request and return its request line, e.g. "GET /api/reports HTTP/1.1"
fn read_request(stream: &mut std::net::TcpStream) -> String {
    let mut data = Vec::new();
    let mut buf = [0u8; 1024];
    let header_end = loop {
        let n = stream.read(&mut buf).unwrap_or(0);
        if n == 0 {
            break data.len();
        }
        data.extend_from_slice(&buf[..n]);
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&data[..header_end]).to_string();
    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())?
        })
        .unwrap_or(0);
    let mut remaining = content_length.saturating_sub(data.len() - header_end);
    while remaining > 0 {
        let n = stream.read(&mut buf).unwrap_or(0);
        if n == 0 {
            break;
        }
        remaining = remaining.saturating_sub(n);
    }

    head.lines().next().unwrap_or_default().to_string()
}

fn route(request_line: &str) -> String {
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default();
    let target = parts.next().unwrap_or_default();
    let path = target.split('?').next().unwrap_or_default();

    match (method, path) {
        ("GET", "/api/reports/occupancy") => r#"{"success": true, "data": {
            "properties": [
                {"name": "A", "total_units": 10, "occupied_units": 7,
                 "vacant_units": 3, "occupancy_rate": 70}
            ]
        }}"#
        .to_string(),
        ("GET", "/api/reports/financial") => {
            r#"{"success": false, "message": "Database unavailable"}"#.to_string()
        }
        ("POST", "/api/reports/custom") => r#"{"success": true, "data": {
            "data": [{"unit_number": "B4", "monthly_rent": 45000}],
            "summary": {"totalRent": 45000}
        }}"#
        .to_string(),
        ("GET", "/api/reports") => r#"{"success": true, "data": [
            {"id": 1, "type": "financial", "title": "January financials",
             "createdAt": "2025-01-31"},
            {"id": 2, "type": "occupancy", "title": "Q1 occupancy",
             "createdAt": "2025-03-31"},
            {"id": 3, "type": "financial", "title": "February financials",
             "createdAt": "2025-02-28"}
        ]}"#
        .to_string(),
        ("GET", "/api/settings/company") => r#"{"success": true, "data": {
            "name": "Acme Rentals", "email": "hello@acme.test", "phone": "0711 000 000",
            "address": "Westlands, Nairobi", "logo": null
        }}"#
        .to_string(),
        _ => r#"{"success": false, "message": "Not found"}"#.to_string(),
    }
}

fn init_config(temp_dir: &TempDir) -> PathBuf {
    let config_path = temp_dir.path().join("rentreport-config");
    rentreport_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success();
    config_path
}

fn run_against(
    config_path: &Path,
    backend: &StubBackend,
    args: &[&str],
) -> assert_cmd::assert::Assert {
    rentreport_cmd()
        .env_remove("RENTREPORT_API_URL")
        .env_remove("RENTREPORT_API_TOKEN")
        .args(["-C", config_path.to_str().unwrap(), "--api-url", &backend.base_url])
        .args(args)
        .assert()
}

#[test]
fn test_help() {
    rentreport_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Property management reports"));
}

#[test]
fn test_version() {
    rentreport_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("rentreport"));
}

#[test]
fn test_init_creates_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("rentreport-config");

    rentreport_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized rentreport config"));

    assert!(config_path.join("config.toml").exists());
    assert!(config_path.join("exports").is_dir());
}

#[test]
fn test_init_fails_if_exists() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    rentreport_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_generate_without_init() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("nonexistent");

    rentreport_cmd()
        .args(["-C", config_path.to_str().unwrap(), "generate", "financial"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_generate_unknown_type() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    rentreport_cmd()
        .args(["-C", config_path.to_str().unwrap(), "generate", "tax"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown report type 'tax'"));
}

#[test]
fn test_generate_rejects_bad_date() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    rentreport_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "generate",
            "occupancy",
            "--from",
            "01/02/2025",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid date '01/02/2025'"));
}

#[test]
fn test_export_without_report_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);
    let out_dir = temp_dir.path().join("out");

    for format in ["pdf", "excel", "csv"] {
        rentreport_cmd()
            .args([
                "-C",
                config_path.to_str().unwrap(),
                "export",
                format,
                "--output-dir",
                out_dir.to_str().unwrap(),
            ])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No report has been generated yet"));
    }

    assert!(!out_dir.exists());
}

#[test]
fn test_export_unknown_format() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    rentreport_cmd()
        .args(["-C", config_path.to_str().unwrap(), "export", "docx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown export format 'docx'"));
}

#[test]
fn test_generate_occupancy_then_export_csv() {
    let backend = StubBackend::start();
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);
    let out_dir = temp_dir.path().join("out");

    run_against(
        &config_path,
        &backend,
        &["generate", "occupancy", "--period", "monthly"],
    )
    .success()
    .stdout(predicate::str::contains("Occupancy Report"))
    .stdout(predicate::str::contains("70%"));

    assert!(backend
        .requests()
        .iter()
        .any(|r| r.starts_with("GET /api/reports/occupancy?period=monthly")));

    run_against(
        &config_path,
        &backend,
        &["export", "csv", "--output-dir", out_dir.to_str().unwrap()],
    )
    .success()
    .stdout(predicate::str::contains("occupancy_report_"));

    let files: Vec<_> = fs::read_dir(&out_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(files.len(), 1);
    assert!(files[0].starts_with("occupancy_report_"));
    assert!(files[0].ends_with(".csv"));

    let csv = fs::read_to_string(out_dir.join(&files[0])).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "Property,Total Units,Occupied,Vacant,Occupancy %");
    assert_eq!(lines[1], "A,10,7,3,70%");
}

#[test]
fn test_show_reads_the_session() {
    let backend = StubBackend::start();
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run_against(&config_path, &backend, &["generate", "occupancy"]).success();

    rentreport_cmd()
        .args(["-C", config_path.to_str().unwrap(), "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Occupancy Report"))
        .stdout(predicate::str::contains("Total Units"));
}

#[test]
fn test_failed_generation_clears_current_report() {
    let backend = StubBackend::start();
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run_against(&config_path, &backend, &["generate", "occupancy"]).success();

    run_against(&config_path, &backend, &["generate", "financial"])
        .failure()
        .stderr(predicate::str::contains("Failed to generate financial report"))
        .stderr(predicate::str::contains("Database unavailable"));

    rentreport_cmd()
        .args(["-C", config_path.to_str().unwrap(), "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Last error: Failed to generate financial report"));
}

#[test]
fn test_failed_generation_is_reported_once_without_colors() {
    let backend = StubBackend::start();
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    let output = run_against(&config_path, &backend, &["generate", "financial"])
        .failure()
        .get_output()
        .clone();
    let stderr = String::from_utf8(output.stderr).unwrap();

    assert_eq!(stderr.matches("Failed to generate financial report").count(), 1);
    assert!(!stderr.contains('\u{1b}'));
}

#[test]
fn test_generate_custom_points_to_custom_command() {
    let backend = StubBackend::start();
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run_against(&config_path, &backend, &["generate", "custom"])
        .failure()
        .stderr(predicate::str::contains("rentreport custom --title"));

    assert!(backend
        .requests()
        .iter()
        .all(|line| !line.contains("/api/reports/custom")));
}

#[test]
fn test_custom_report_with_filters() {
    let backend = StubBackend::start();
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run_against(
        &config_path,
        &backend,
        &[
            "custom",
            "--title",
            "Rent roll",
            "--filter",
            "status=active",
        ],
    )
    .success()
    .stdout(predicate::str::contains("Rent roll"))
    .stdout(predicate::str::contains("Unit Number"))
    .stdout(predicate::str::contains("Total Rent: KES 45,000"));

    assert!(backend
        .requests()
        .iter()
        .any(|r| r.starts_with("POST /api/reports/custom")));
}

#[test]
fn test_custom_report_rejects_malformed_filter() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    rentreport_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "custom",
            "--title",
            "Rent roll",
            "--filter",
            "status",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid filter 'status'"));
}

#[test]
fn test_list_counts_by_type() {
    let backend = StubBackend::start();
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run_against(&config_path, &backend, &["list"])
        .success()
        .stdout(predicate::str::contains("January financials"))
        .stdout(predicate::str::contains("Total: 3"));

    // Loaded once; the second run is served from the session
    run_against(&config_path, &backend, &["list"]).success();
    let list_calls = backend
        .requests()
        .iter()
        .filter(|r| r.starts_with("GET /api/reports "))
        .count();
    assert_eq!(list_calls, 1);
}

#[test]
fn test_company_is_cached_between_runs() {
    let backend = StubBackend::start();
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run_against(&config_path, &backend, &["company"])
        .success()
        .stdout(predicate::str::contains("Acme Rentals"));
    run_against(&config_path, &backend, &["company"])
        .success()
        .stdout(predicate::str::contains("Acme Rentals"));
    run_against(&config_path, &backend, &["company", "--refresh"]).success();

    let company_calls = backend
        .requests()
        .iter()
        .filter(|r| r.starts_with("GET /api/settings/company"))
        .count();
    assert_eq!(company_calls, 2);
}

#[test]
fn test_company_falls_back_when_backend_is_down() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    // Nothing listens on port 9 in the test environment
    rentreport_cmd()
        .env_remove("RENTREPORT_API_URL")
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "--api-url",
            "http://127.0.0.1:9/api",
            "company",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Property Management"));
}
