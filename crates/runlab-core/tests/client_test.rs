//! HTTP client tests against an in-process axum server.

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use runlab_core::store::load_experiments;
use runlab_core::{
    ClientConfig, CompareSession, LabApi, LabClient, LabError, LabId, RunStatus, RunStore, Settings, Toggle,
};

#[derive(Deserialize)]
struct TypeQuery {
    experiment_type: Option<String>,
}

#[derive(Deserialize)]
struct LimitQuery {
    limit: usize,
}

fn run_json(id: i64, kind: &str) -> Value {
    json!({
        "id": id,
        "experiment": {"name": format!("Experiment {}", id), "slug": format!("exp-{}", id), "experiment_type": kind},
        "status": "succeeded",
        "duration_ms": 100 + id,
        "metrics": {"acc": 0.5 + id as f64 / 100.0},
        "params": {"lr": 0.1, "seed": id},
        "output": {"ok": true},
        "created_at": "2024-05-01T10:00:00Z",
        "local_sqlite_path": null,
    })
}

async fn list_runs(Query(q): Query<TypeQuery>) -> Json<Value> {
    match q.experiment_type.as_deref() {
        Some(kind) => Json(json!({"count": 1, "results": [run_json(1, kind)]})),
        None => Json(json!([run_json(1, "ml"), run_json(2, "ml"), run_json(13, "sim")])),
    }
}

async fn get_run(Path(id): Path<String>) -> Json<Value> {
    match id.parse::<i64>() {
        Ok(n) => Json(run_json(n, "ml")),
        Err(_) => Json(json!({"id": id, "status": "failed"})),
    }
}

async fn run_logs(Path(id): Path<String>, Query(q): Query<LimitQuery>) -> Response {
    if id == "13" {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }
    Json(json!([
        {"level": "INFO", "message": format!("run {} limit {}", id, q.limit)},
        {"level": "WARN", "message": "slow"},
    ]))
    .into_response()
}

async fn list_experiments(Query(q): Query<TypeQuery>) -> Json<Value> {
    let all = vec![
        json!({"id": 1, "name": "Linear", "slug": "linear", "experiment_type": "ml"}),
        json!({"id": "mc", "name": "Monte Carlo", "slug": "monte-carlo", "experiment_type": "sim"}),
    ];
    let kept: Vec<Value> = all
        .into_iter()
        .filter(|e| q.experiment_type.as_deref().map_or(true, |t| e["experiment_type"] == t))
        .collect();
    Json(json!({"results": kept}))
}

async fn run_experiment(Path(id): Path<String>, Json(body): Json<Value>) -> Response {
    if id == "broken" {
        return (StatusCode::BAD_REQUEST, r#"{"error": "bad params"}"#).into_response();
    }
    Json(json!({
        "run_id": 77,
        "metrics": {"echo": body["params"]["x"].clone()},
        "output": {"experiment": id},
    }))
    .into_response()
}

async fn spawn_server() -> String {
    let app = Router::new()
        .route("/api/lab/runs", get(list_runs))
        .route("/api/lab/runs/{id}", get(get_run))
        .route("/api/lab/runs/{id}/logs", get(run_logs))
        .route("/api/lab/experiments", get(list_experiments))
        .route("/api/lab/experiments/{id}/run", post(run_experiment));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/api/", addr)
}

async fn client() -> LabClient {
    LabClient::new(ClientConfig::new(spawn_server().await)).unwrap()
}

#[tokio::test]
async fn test_list_runs_accepts_both_envelopes() {
    let client = client().await;

    let bare = client.list_runs(None).await.unwrap();
    assert_eq!(bare.len(), 3);
    assert_eq!(bare[0].status, RunStatus::Succeeded);
    assert_eq!(bare[0].duration_ms, Some(101));
    assert!(bare[0].created_at.is_some());

    let paged = client.list_runs(Some("vision")).await.unwrap();
    assert_eq!(paged.len(), 1);
    assert_eq!(paged[0].experiment.experiment_type.as_deref(), Some("vision"));
}

#[tokio::test]
async fn test_get_run() {
    let client = client().await;
    let run = client.get_run(&LabId::Int(5)).await.unwrap();
    assert_eq!(run.id, LabId::from("5"));
    assert_eq!(run.params["seed"], 5);
}

#[tokio::test]
async fn test_text_ids_are_encoded_as_one_segment() {
    let client = client().await;
    let id = LabId::from("grid/lr=0.1?seed=2");
    let run = client.get_run(&id).await.unwrap();
    assert_eq!(run.id, id);
    assert_eq!(run.status, RunStatus::Failed);
}

#[tokio::test]
async fn test_base_url_without_trailing_slash() {
    let base = spawn_server().await;
    let client = LabClient::new(ClientConfig::new(base.trim_end_matches('/'))).unwrap();
    assert_eq!(client.list_runs(None).await.unwrap().len(), 3);
}

#[test]
fn test_invalid_base_url_is_rejected() {
    let err = LabClient::new(ClientConfig::new("not a url")).err().unwrap();
    assert!(matches!(err, LabError::Other(_)));
}

#[tokio::test]
async fn test_run_logs_pass_limit() {
    let client = client().await;
    let logs = client.run_logs(&LabId::Int(2), 200).await.unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].message, "run 2 limit 200");
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let client = client().await;
    let err = client.run_logs(&LabId::Int(13), 10).await.unwrap_err();
    match err {
        LabError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_experiments_filtered_by_type() {
    let client = client().await;
    let all = load_experiments(&client, None).await;
    assert_eq!(all.len(), 2);
    assert_eq!(all[1].id, LabId::from("mc"));

    let sim = load_experiments(&client, Some("sim")).await;
    assert_eq!(sim.len(), 1);
    assert_eq!(sim[0].name, "Monte Carlo");
}

#[tokio::test]
async fn test_run_experiment_posts_params() {
    let client = client().await;
    let outcome = client
        .run_experiment(&LabId::Int(1), &json!({"x": 42}))
        .await
        .unwrap();
    assert_eq!(outcome.metrics["echo"], 42);
    assert_eq!(outcome.output["experiment"], "1");
    assert_eq!(outcome.extra["run_id"], 77);

    let err = client
        .run_experiment(&LabId::from("broken"), &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, LabError::Status { status: 400, .. }));
}

#[tokio::test]
async fn test_unreachable_api_gives_empty_store() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = LabClient::new(ClientConfig::new(format!("http://{}/api", addr))).unwrap();
    let mut store = RunStore::new();
    assert!(store.load(&client, None).await.is_empty());
    assert!(store.last_error().is_some());
    assert!(load_experiments(&client, None).await.is_empty());
}

#[tokio::test]
async fn test_session_over_http() {
    let mut session = CompareSession::new(client().await, Settings::default());
    assert_eq!(session.reload(None).await.len(), 3);

    assert_eq!(session.toggle(&LabId::Int(13)), Toggle::Added);
    assert_eq!(session.toggle(&LabId::Int(1)), Toggle::Added);
    session.sync_logs().await;

    assert_eq!(session.logs(&LabId::Int(1)).len(), 2);
    assert!(session.logs(&LabId::Int(13)).is_empty());

    let labels: Vec<String> = session.selected_runs().iter().map(|r| r.label()).collect();
    assert_eq!(labels, ["#1", "#13"]);

    let diff = session.param_diff();
    let keys: Vec<&str> = diff.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, ["lr", "seed"]);
    assert!(!diff[0].is_different);
    assert!(diff[1].is_different);
}
