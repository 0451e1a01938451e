// cargo test -p prompt-classifier --test classifier_test

use anyhow::Result;
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use prompt_classifier::{
    Action, ClassificationStatus, Classifier, ClassifierConfig, DegradeReason, Error,
};
use serde_json::{Value, json};
use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        OnceLock,
        atomic::{AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

#[derive(Clone, Default)]
struct FakeEndpoint {
    replies: Arc<Mutex<VecDeque<(StatusCode, String)>>>,
    requests: Arc<Mutex<Vec<(Option<String>, Value)>>>,
    hits: Arc<AtomicUsize>,
    stall: Option<Duration>,
}

impl FakeEndpoint {
    fn with_replies(replies: Vec<(StatusCode, String)>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into())),
            ..Default::default()
        }
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn classify_handler(
    State(fake): State<FakeEndpoint>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, String) {
    fake.hits.fetch_add(1, Ordering::SeqCst);

    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    fake.requests.lock().unwrap().push((auth, body));

    if let Some(stall) = fake.stall {
        tokio::time::sleep(stall).await;
    }

    fake.replies
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or((StatusCode::INTERNAL_SERVER_ERROR, "no reply queued".to_string()))
}

async fn serve(fake: FakeEndpoint) -> Result<String> {
    let app = Router::new()
        .route("/models/zero-shot", post(classify_handler))
        .with_state(fake);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        _ = axum::serve(listener, app).await;
    });

    Ok(format!("http://{addr}/models/zero-shot"))
}

fn config(api_url: String) -> ClassifierConfig {
    ClassifierConfig {
        api_url,
        api_key: "hf_test".to_string(),
        retry_base_delay_ms: 20,
        ..Default::default()
    }
}

fn ok_body() -> (StatusCode, String) {
    let body = json!({
        "sequence": "make it brighter and pop",
        "labels": [
            "increase brightness",
            "increase saturation",
            "no change needed",
            "remove background"
        ],
        "scores": [0.55, 0.35, 0.08, 0.02]
    });
    (StatusCode::OK, body.to_string())
}

fn loading() -> (StatusCode, String) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        r#"{"error": "Model facebook/bart-large-mnli is currently loading", "estimated_time": 20.0}"#
            .to_string(),
    )
}

#[tokio::test]
async fn test_classify_success() -> Result<()> {
    let fake = FakeEndpoint::with_replies(vec![ok_body()]);
    let classifier = Classifier::new(config(serve(fake.clone()).await?))?;

    let classification = classifier
        .classify_detailed("make it brighter and pop")
        .await?;

    assert_eq!(classification.status, ClassificationStatus::Classified);
    assert_eq!(
        classification.actions,
        vec![
            Action::new("increase brightness", 0.55),
            Action::new("increase saturation", 0.35),
        ]
    );
    assert_eq!(fake.hits(), 1);

    let requests = fake.requests.lock().unwrap();
    let (auth, body) = &requests[0];
    assert_eq!(auth.as_deref(), Some("Bearer hf_test"));
    assert_eq!(body["inputs"], "make it brighter and pop");
    assert_eq!(body["parameters"]["candidate_labels"].as_array().unwrap().len(), 8);
    assert_eq!(body["options"]["wait_for_model"], true);

    Ok(())
}

#[tokio::test]
async fn test_retries_while_model_loading() -> Result<()> {
    let fake = FakeEndpoint::with_replies(vec![loading(), loading(), loading(), ok_body()]);
    let classifier = Classifier::new(config(serve(fake.clone()).await?))?;

    let start = Instant::now();
    let actions = classifier.classify("make it brighter").await?;

    // 20ms + 40ms + 80ms of backoff
    assert!(start.elapsed() >= Duration::from_millis(140));
    assert_eq!(fake.hits(), 4);
    assert_eq!(actions.len(), 2);
    assert_eq!(actions[0].label, "increase brightness");

    Ok(())
}

#[tokio::test]
async fn test_loading_never_exceeds_retry_budget() -> Result<()> {
    let fake = FakeEndpoint::with_replies(vec![
        loading(),
        loading(),
        loading(),
        loading(),
        ok_body(),
    ]);
    let classifier = Classifier::new(config(serve(fake.clone()).await?))?;

    let classification = classifier.classify_detailed("brighter").await?;

    assert!(classification.actions.is_empty());
    assert_eq!(
        classification.status,
        ClassificationStatus::Degraded(DegradeReason::RetriesExhausted { attempts: 4 })
    );
    assert_eq!(fake.hits(), 4);

    Ok(())
}

#[tokio::test]
async fn test_forbidden_short_circuits() -> Result<()> {
    let fake = FakeEndpoint::with_replies(vec![
        (StatusCode::FORBIDDEN, r#"{"error": "Invalid credentials"}"#.to_string()),
        ok_body(),
    ]);
    let classifier = Classifier::new(config(serve(fake.clone()).await?))?;

    let classification = classifier.classify_detailed("brighter").await?;

    assert!(classification.actions.is_empty());
    assert_eq!(
        classification.status,
        ClassificationStatus::Degraded(DegradeReason::Rejected { status: 403 })
    );
    assert_eq!(fake.hits(), 1);

    Ok(())
}

#[tokio::test]
async fn test_unexpected_status_short_circuits() -> Result<()> {
    let fake = FakeEndpoint::with_replies(vec![
        (StatusCode::BAD_GATEWAY, "upstream".to_string()),
        ok_body(),
    ]);
    let classifier = Classifier::new(config(serve(fake.clone()).await?))?;

    assert!(classifier.classify("brighter").await?.is_empty());
    assert_eq!(fake.hits(), 1);

    Ok(())
}

// records every log line so tests can count warnings
struct RecordingLogger(Mutex<Vec<(log::Level, String)>>);

impl log::Log for RecordingLogger {
    fn enabled(&self, _: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        let line = record.args().to_string();
        self.0.lock().unwrap().push((record.level(), line));
    }

    fn flush(&self) {}
}

fn recording_logger() -> &'static RecordingLogger {
    static LOGGER: OnceLock<&'static RecordingLogger> = OnceLock::new();
    LOGGER.get_or_init(|| {
        let logger = Box::leak(Box::new(RecordingLogger(Mutex::new(vec![]))));
        log::set_logger(logger).unwrap();
        log::set_max_level(log::LevelFilter::Trace);
        logger
    })
}

#[tokio::test]
async fn test_rejected_status_warns_once() -> Result<()> {
    let logger = recording_logger();
    let fake = FakeEndpoint::with_replies(vec![(
        StatusCode::IM_A_TEAPOT,
        r#"{"error": "short and stout"}"#.to_string(),
    )]);
    let classifier = Classifier::new(config(serve(fake).await?))?;

    assert!(classifier.classify("brighter").await?.is_empty());

    let warnings = logger
        .0
        .lock()
        .unwrap()
        .iter()
        .filter(|(level, line)| *level == log::Level::Warn && line.contains("418"))
        .count();
    assert_eq!(warnings, 1);

    Ok(())
}

#[tokio::test]
async fn test_malformed_body_yields_no_actions() -> Result<()> {
    for body in [
        r#"{"labels": ["increase brightness"]}"#,
        r#"{"scores": [0.9]}"#,
        r#"{"labels": ["a", "b"], "scores": [0.9]}"#,
        "<html>oops</html>",
    ] {
        let fake = FakeEndpoint::with_replies(vec![(StatusCode::OK, body.to_string()), ok_body()]);
        let classifier = Classifier::new(config(serve(fake.clone()).await?))?;

        let classification = classifier.classify_detailed("brighter").await?;

        assert!(classification.actions.is_empty(), "{body}");
        assert_eq!(
            classification.status,
            ClassificationStatus::Degraded(DegradeReason::MalformedResponse)
        );
        assert_eq!(fake.hits(), 1);
    }

    Ok(())
}

#[tokio::test]
async fn test_timeout_after_retries() -> Result<()> {
    let fake = FakeEndpoint {
        stall: Some(Duration::from_secs(3)),
        ..FakeEndpoint::with_replies(vec![ok_body(), ok_body()])
    };
    let classifier = Classifier::new(ClassifierConfig {
        timeout_secs: 1,
        max_retries: 1,
        ..config(serve(fake.clone()).await?)
    })?;

    let result = classifier.classify("brighter").await;

    assert!(matches!(result, Err(Error::Timeout { attempts: 2 })));
    assert_eq!(fake.hits(), 2);

    Ok(())
}

#[tokio::test]
async fn test_network_failure_after_retries() -> Result<()> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let classifier = Classifier::new(config(format!("http://{addr}/models/zero-shot")))?;
    let result = classifier.classify("brighter").await;

    assert!(matches!(result, Err(Error::Network(_))));

    Ok(())
}
