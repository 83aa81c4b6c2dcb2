//! Tests de integración de la API HTTP
//! tests/integration_test.rs
//!
//! Cada test levanta su propio servidor en un puerto efímero, con un CSV
//! y un directorio de resultados temporales.

use serde_json::{json, Value};
use stats_server::analysis::ingestor::{QUESTIONS_BEST_IS_MAX, QUESTIONS_BEST_IS_MIN};
use stats_server::config::Config;
use stats_server::server::Server;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

struct TestServer {
    addr: SocketAddr,
    _dir: TempDir,
}

fn dataset() -> String {
    let min_q = QUESTIONS_BEST_IS_MIN[1];
    let max_q = QUESTIONS_BEST_IS_MAX[0];
    let mut csv = String::from(
        "YearStart,LocationDesc,Question,Data_Value,StratificationCategory1,Stratification1\n",
    );
    for (state, value) in [("Ohio", 30.0), ("Texas", 20.0), ("Utah", 10.0)] {
        csv.push_str(&format!("2020,{},{},{},Gender,Male\n", state, min_q, value));
        csv.push_str(&format!("2020,{},{},{},Gender,Female\n", state, min_q, value + 2.0));
        csv.push_str(&format!("2020,{},\"{}\",{},Total,Total\n", state, max_q, value));
    }
    csv
}

fn spawn_server() -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let data_file = dir.path().join("data.csv");
    std::fs::write(&data_file, dataset()).unwrap();

    let config = Config {
        port: 0,
        data_file: data_file.display().to_string(),
        results_dir: dir.path().join("results").display().to_string(),
        threads: Some("2".to_string()),
        ..Config::default()
    };

    let server = Server::from_config(&config).unwrap();
    let addr = server.local_addr().unwrap();
    thread::spawn(move || server.run());

    TestServer { addr, _dir: dir }
}

/// Envía un request crudo y devuelve (status, body)
fn send(addr: SocketAddr, method: &str, path: &str, body: Option<&str>) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(10))).unwrap();

    let request = match body {
        Some(body) => format!(
            "{} {} HTTP/1.0\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
            method,
            path,
            body.len(),
            body
        ),
        None => format!("{} {} HTTP/1.0\r\n\r\n", method, path),
    };
    stream.write_all(request.as_bytes()).unwrap();
    stream.flush().unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).unwrap();

    let status = response
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .unwrap_or(0);
    let body = response
        .split_once("\r\n\r\n")
        .map(|(_, body)| body.to_string())
        .unwrap_or_default();
    (status, body)
}

fn get_json(addr: SocketAddr, path: &str) -> Value {
    let (status, body) = send(addr, "GET", path, None);
    assert_eq!(status, 200, "GET {} -> {}", path, body);
    serde_json::from_str(&body).unwrap()
}

fn post_query(addr: SocketAddr, route: &str, body: &Value) -> u64 {
    let (status, text) = send(addr, "POST", route, Some(&body.to_string()));
    assert_eq!(status, 200, "POST {} -> {}", route, text);
    let value: Value = serde_json::from_str(&text).unwrap();
    value["job_id"].as_u64().unwrap()
}

/// Espera a que el job termine y devuelve su `data`
fn wait_result(addr: SocketAddr, job_id: u64) -> Value {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let reply = get_json(addr, &format!("/api/get_results/{}", job_id));
        match reply["status"].as_str() {
            Some("done") => return reply["data"].clone(),
            Some("running") => {
                assert!(Instant::now() < deadline, "job {} never finished", job_id);
                thread::sleep(Duration::from_millis(10));
            }
            other => panic!("unexpected status {:?}: {}", other, reply),
        }
    }
}

fn question(index: usize) -> Value {
    json!({ "question": QUESTIONS_BEST_IS_MIN[index] })
}

#[test]
fn test_job_ids_start_at_one_and_increase() {
    let server = spawn_server();

    assert_eq!(post_query(server.addr, "/api/global_mean", &question(1)), 1);
    assert_eq!(post_query(server.addr, "/api/states_mean", &question(1)), 2);
    assert_eq!(post_query(server.addr, "/api/best5", &question(1)), 3);
}

#[test]
fn test_states_mean_result() {
    let server = spawn_server();
    let job_id = post_query(server.addr, "/api/states_mean", &question(1));

    let data = wait_result(server.addr, job_id);
    let order: Vec<&str> = data.as_object().unwrap().keys().map(String::as_str).collect();

    assert_eq!(order, vec!["Utah", "Texas", "Ohio"]);
    assert_eq!(data["Ohio"], json!(31.0));
}

#[test]
fn test_global_and_state_queries() {
    let server = spawn_server();

    let job = post_query(server.addr, "/api/global_mean", &question(1));
    assert_eq!(wait_result(server.addr, job), json!({"global_mean": 21.0}));

    let body = json!({"question": QUESTIONS_BEST_IS_MIN[1], "state": "Texas"});
    let job = post_query(server.addr, "/api/state_diff_from_mean", &body);
    assert_eq!(wait_result(server.addr, job), json!({"Texas": 0.0}));

    let job = post_query(server.addr, "/api/state_mean_by_category", &body);
    assert_eq!(
        wait_result(server.addr, job),
        json!({"Texas": {"('Gender', 'Female')": 22.0, "('Gender', 'Male')": 20.0}})
    );
}

#[test]
fn test_best5_for_max_question() {
    let server = spawn_server();
    let body = json!({ "question": QUESTIONS_BEST_IS_MAX[0] });

    let job = post_query(server.addr, "/api/best5", &body);
    let data = wait_result(server.addr, job);
    let order: Vec<&str> = data.as_object().unwrap().keys().map(String::as_str).collect();

    assert_eq!(order, vec!["Ohio", "Texas", "Utah"]);
}

#[test]
fn test_invalid_question_is_stored_as_error() {
    let server = spawn_server();
    let job = post_query(server.addr, "/api/global_mean", &json!({"question": "What?"}));

    assert_eq!(
        wait_result(server.addr, job),
        json!({"error": "Invalid question"})
    );
}

#[test]
fn test_invalid_json_body() {
    let server = spawn_server();
    let (status, body) = send(server.addr, "POST", "/api/best5", Some("{not json"));

    assert_eq!(status, 400);
    assert_eq!(
        serde_json::from_str::<Value>(&body).unwrap(),
        json!({"status": "error", "reason": "Invalid JSON body"})
    );

    // No se consumió ningún id
    assert_eq!(post_query(server.addr, "/api/best5", &question(1)), 1);
}

#[test]
fn test_invalid_job_ids() {
    let server = spawn_server();
    post_query(server.addr, "/api/global_mean", &question(1));

    let invalid = json!({"status": "error", "reason": "Invalid job_id"});
    assert_eq!(get_json(server.addr, "/api/get_results/0"), invalid);
    assert_eq!(get_json(server.addr, "/api/get_results/2"), invalid);
    assert_eq!(get_json(server.addr, "/api/get_results/abc"), invalid);
}

#[test]
fn test_jobs_listing_and_num_jobs() {
    let server = spawn_server();
    assert_eq!(get_json(server.addr, "/api/jobs"), json!({}));
    assert_eq!(get_json(server.addr, "/api/num_jobs"), json!({"num_jobs": 0}));

    let first = post_query(server.addr, "/api/global_mean", &question(1));
    let second = post_query(server.addr, "/api/states_mean", &question(1));
    wait_result(server.addr, first);
    wait_result(server.addr, second);

    assert_eq!(
        get_json(server.addr, "/api/jobs"),
        json!({"job_id_1": "done", "job_id_2": "done"})
    );
    assert_eq!(get_json(server.addr, "/api/num_jobs"), json!({"num_jobs": 2}));
}

#[test]
fn test_graceful_shutdown() {
    let server = spawn_server();
    let job = post_query(server.addr, "/api/global_mean", &question(1));

    assert_eq!(
        get_json(server.addr, "/api/graceful_shutdown"),
        json!({"status": "shutting down"})
    );

    // El listener sigue vivo y reporta el apagado
    assert_eq!(
        get_json(server.addr, &format!("/api/get_results/{}", job)),
        json!({"status": "shutting down"})
    );

    let (status, body) = send(
        server.addr,
        "POST",
        "/api/global_mean",
        Some(&question(1).to_string()),
    );
    assert_eq!(status, 503);
    assert_eq!(
        serde_json::from_str::<Value>(&body).unwrap(),
        json!({"status": "error", "reason": "shutting down"})
    );

    // Segunda llamada (nombre histórico) no bloquea
    assert_eq!(
        get_json(server.addr, "/api/gracefull_shutdown"),
        json!({"status": "shutting down"})
    );
}

#[test]
fn test_index_and_unknown_routes() {
    let server = spawn_server();

    let (status, body) = send(server.addr, "GET", "/index", None);
    assert_eq!(status, 200);
    assert!(body.contains("<p>Endpoint: \"/api/states_mean\" Methods: \"POST\"</p>"));

    let (status, _) = send(server.addr, "GET", "/api/nope", None);
    assert_eq!(status, 404);

    let (status, _) = send(server.addr, "GET", "/api/best5", None);
    assert_eq!(status, 405);
}
