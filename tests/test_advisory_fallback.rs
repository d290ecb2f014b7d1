//! Advisory evaluator integration and deterministic fallback
//!
//! Stub backends cover the parsing and budget paths; a local HTTP listener
//! stands in for the chat-completion API to exercise the configured provider.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serial_test::serial;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use loadbroker::llm::{BudgetedBackend, LlmBackend, LlmError, LlmInvocation, LlmResult};
use loadbroker::{
    AdvisoryEvaluator, Config, NegotiationOrchestrator, NegotiationPolicy, NegotiationRound,
    Status, evaluate, orchestrator_from_config,
};

struct ScriptedBackend {
    reply: String,
    calls: Arc<AtomicU32>,
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn invoke(&self, _inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(LlmResult::new(self.reply.clone(), "scripted", "scripted-model"))
    }
}

fn advisory(backend: Box<dyn LlmBackend>) -> NegotiationOrchestrator {
    let evaluator = AdvisoryEvaluator::new(backend, "scripted", Duration::from_secs(2));
    NegotiationOrchestrator::new(NegotiationPolicy::default())
        .with_advisory(Arc::new(evaluator), Duration::from_secs(2))
}

fn scripted(reply: &str) -> (Box<dyn LlmBackend>, Arc<AtomicU32>) {
    let calls = Arc::new(AtomicU32::new(0));
    let backend = ScriptedBackend {
        reply: reply.to_string(),
        calls: Arc::clone(&calls),
    };
    (Box::new(backend), calls)
}

fn deterministic(board: f64, offer: f64, attempt: u32) -> loadbroker::Decision {
    evaluate(
        &NegotiationPolicy::default(),
        &NegotiationRound::new(board, offer, attempt),
    )
    .unwrap()
}

#[tokio::test]
async fn test_valid_advisory_reply_is_used() {
    let (backend, calls) =
        scripted(r#"{"status":"counter","target_rate":"$2,350","message":"Could you do $2,350?"}"#);
    let outcome = advisory(backend)
        .negotiate_traced(NegotiationRound::new(2000.0, 2500.0, 1), Some("L1"))
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(outcome.provider, "scripted");
    assert!(!outcome.fallback);
    assert_eq!(outcome.decision.status, Status::Counter);
    assert_eq!(outcome.decision.target_rate, 2350.0);
    assert_eq!(outcome.decision.message, "Could you do $2,350?");
    assert_eq!(outcome.decision.attempts, 2);
}

#[tokio::test]
async fn test_malformed_reply_falls_back_to_policy() {
    for reply in [
        "I think you should counter around 2400",
        r#"{"status":"haggle","target_rate":2400}"#,
        r#"{"status":"counter","target_rate":0}"#,
    ] {
        let (backend, _) = scripted(reply);
        let outcome = advisory(backend)
            .negotiate_traced(NegotiationRound::new(2000.0, 2500.0, 1), None)
            .await
            .unwrap();

        assert!(outcome.fallback, "expected fallback for {reply}");
        assert_eq!(outcome.provider, "deterministic");
        assert_eq!(outcome.decision, deterministic(2000.0, 2500.0, 1));
    }
}

#[tokio::test]
async fn test_exhausted_budget_falls_back() {
    let (inner, calls) = scripted(r#"{"status":"accept","target_rate":1950}"#);
    let backend = BudgetedBackend::new(inner, 1);
    let orchestrator = advisory(Box::new(backend));

    let first = orchestrator
        .negotiate_traced(NegotiationRound::new(2000.0, 1950.0, 1), None)
        .await
        .unwrap();
    assert!(!first.fallback);

    let second = orchestrator
        .negotiate_traced(NegotiationRound::new(2000.0, 1500.0, 1), None)
        .await
        .unwrap();
    assert!(second.fallback);
    assert_eq!(second.decision, deterministic(2000.0, 1500.0, 1));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

/// Serve one HTTP response after reading the full request.
async fn serve_once(status: &'static str, body: String) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
            if request_complete(&request) {
                break;
            }
        }
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
    });

    format!("http://{addr}/v1")
}

fn request_complete(request: &[u8]) -> bool {
    let text = String::from_utf8_lossy(request);
    let Some(header_end) = text.find("\r\n\r\n") else {
        return false;
    };
    let content_length = text[..header_end]
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    request.len() >= header_end + 4 + content_length
}

fn advisory_config(base_url: &str) -> Config {
    let mut config = Config::builder()
        .advisory_enabled(true)
        .advisory_base_url(base_url)
        .advisory_timeout_secs(5)
        .build()
        .unwrap();
    config.advisory.api_key_env = Some("LOADBROKER_TEST_ADVISORY_KEY".to_string());
    config
}

#[tokio::test]
#[serial]
async fn test_configured_provider_over_http() {
    let content = r#"{\"status\":\"counter\",\"target_rate\":2300,\"message\":\"How about $2,300?\"}"#;
    let body = format!(
        r#"{{"choices":[{{"message":{{"role":"assistant","content":"{content}"}}}}],"usage":{{"prompt_tokens":120,"completion_tokens":20}}}}"#
    );
    let base_url = serve_once("200 OK", body).await;

    // SAFETY: serialized test; no other thread reads this variable
    unsafe { std::env::set_var("LOADBROKER_TEST_ADVISORY_KEY", "sk-test-0123456789") };
    let orchestrator = orchestrator_from_config(&advisory_config(&base_url)).unwrap();
    // SAFETY: as above
    unsafe { std::env::remove_var("LOADBROKER_TEST_ADVISORY_KEY") };

    assert!(orchestrator.has_advisory());
    let outcome = orchestrator
        .negotiate_traced(NegotiationRound::new(2000.0, 2500.0, 1), None)
        .await
        .unwrap();
    assert!(!outcome.fallback);
    assert_eq!(outcome.provider, "openai");
    assert_eq!(outcome.decision.target_rate, 2300.0);
    assert_eq!(outcome.decision.message, "How about $2,300?");
}

#[tokio::test]
#[serial]
async fn test_provider_outage_falls_back() {
    let base_url = serve_once("503 Service Unavailable", "{}".to_string()).await;

    // SAFETY: serialized test; no other thread reads this variable
    unsafe { std::env::set_var("LOADBROKER_TEST_ADVISORY_KEY", "sk-test-0123456789") };
    let orchestrator = orchestrator_from_config(&advisory_config(&base_url)).unwrap();
    // SAFETY: as above
    unsafe { std::env::remove_var("LOADBROKER_TEST_ADVISORY_KEY") };

    let outcome = orchestrator
        .negotiate_traced(NegotiationRound::new(2000.0, 1500.0, 1), None)
        .await
        .unwrap();
    assert!(outcome.fallback);
    assert_eq!(outcome.decision, deterministic(2000.0, 1500.0, 1));
}

#[tokio::test]
#[serial]
async fn test_missing_api_key_runs_deterministic_only() {
    // SAFETY: serialized test; no other thread reads this variable
    unsafe { std::env::remove_var("LOADBROKER_TEST_ADVISORY_KEY") };
    let orchestrator = orchestrator_from_config(&advisory_config("http://127.0.0.1:9/v1")).unwrap();
    assert!(!orchestrator.has_advisory());
}
