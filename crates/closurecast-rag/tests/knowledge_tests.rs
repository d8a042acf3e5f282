//! Knowledge pipeline integration tests
//!
//! Covers corpus loading, lexical ranking and prompt assembly end to end, and
//! the Gemini backend against a local stub server.

use async_trait::async_trait;
use axum::{extract::State, http::HeaderMap, http::StatusCode, Router};
use closurecast_core::Error;
use closurecast_rag::{
    ContextAssembler, Corpus, GeminiBackend, GeminiConfig, GenerationClient, LexicalIndex,
    Retriever, Sleeper,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const CORPUS: &str = "keywords: 위험, 신호, 경고
폐업 위험 신호: 최근 3개월 매출이 연속 감소한 점포 중 12%가 1년 안에 폐업했습니다.
---
keywords: 임대료, 고정비
임대료가 매출의 30%를 넘으면 고정비 부담이 커집니다.
---
keywords: 상권, 유동인구
유동인구 감소 상권에서는 업종 전환을 검토하세요.
---
keywords: 창업, 초기
창업 초기 2년의 생존율이 가장 낮습니다.
";

fn corpus() -> Arc<Corpus> {
    Arc::new(Corpus::parse_text(CORPUS).unwrap())
}

#[tokio::test]
async fn test_risk_signal_query_finds_entry() {
    let corpus = corpus();
    let index = LexicalIndex::new(corpus.clone()).unwrap();

    let scores = index.scores("위험 신호가 뭐야");
    assert!(scores[0] >= 2, "scores: {:?}", scores);

    let ranked = index.rank("위험 신호가 뭐야").await.unwrap();
    assert!(ranked.len() <= 3);
    assert!(ranked.iter().all(|d| d.score > 0));
    assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
    assert!(ranked.iter().any(|d| d.entry.text.contains("12%")));
}

#[tokio::test]
async fn test_keyword_removal_lowers_score_by_at_least_two() {
    let index = LexicalIndex::new(corpus()).unwrap();

    let with_keyword = index.scores("임대료 부담이 걱정돼요")[1];
    let without_keyword = index.scores("부담이 걱정돼요")[1];

    assert!(with_keyword >= without_keyword + 2);
}

#[tokio::test]
async fn test_prompt_contains_ranked_context_and_query() {
    let corpus = corpus();
    let index = Arc::new(LexicalIndex::new(corpus.clone()).unwrap());
    let assembler = ContextAssembler::new(index, corpus);

    let prompt = assembler.build_prompt("위험 신호가 뭐야").await.unwrap();

    assert!(prompt.contains("12%"));
    assert!(prompt.contains("위험 신호가 뭐야"));
    assert!(!prompt.contains("{context}"));
    assert!(!prompt.contains("창업 초기"));
}

#[tokio::test]
async fn test_unmatched_query_uses_first_three_entries() {
    let corpus = corpus();
    let index = Arc::new(LexicalIndex::new(corpus.clone()).unwrap());
    let assembler = ContextAssembler::new(index, corpus);

    let context = assembler.assemble("hello").await.unwrap();

    assert!(context.fallback);
    assert_eq!(context.documents.len(), 3);
    assert!(context.text.starts_with("폐업 위험 신호"));
    assert!(!context.text.contains("창업 초기"));
}

#[derive(Clone)]
struct StubState {
    responses: Arc<Mutex<VecDeque<(StatusCode, String)>>>,
    api_keys: Arc<Mutex<Vec<String>>>,
}

async fn stub_handler(
    State(state): State<StubState>,
    headers: HeaderMap,
    _body: String,
) -> (StatusCode, String) {
    if let Some(key) = headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) {
        state.api_keys.lock().unwrap().push(key.to_string());
    }
    state
        .responses
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or((StatusCode::INTERNAL_SERVER_ERROR, "script exhausted".to_string()))
}

async fn spawn_stub(responses: Vec<(StatusCode, String)>) -> (String, StubState) {
    let state = StubState {
        responses: Arc::new(Mutex::new(responses.into_iter().collect())),
        api_keys: Arc::new(Mutex::new(Vec::new())),
    };

    let app = Router::new()
        .fallback(stub_handler)
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/v1beta", addr), state)
}

#[derive(Default)]
struct CountingSleeper {
    count: Mutex<u32>,
}

#[async_trait]
impl Sleeper for CountingSleeper {
    async fn sleep(&self, _duration: Duration) {
        *self.count.lock().unwrap() += 1;
    }
}

fn quota_body() -> String {
    r#"{"error":{"code":429,"message":"Resource has been exhausted","status":"RESOURCE_EXHAUSTED"}}"#
        .to_string()
}

fn success_body(text: &str) -> String {
    serde_json::json!({
        "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}, "finishReason": "STOP"}]
    })
    .to_string()
}

#[tokio::test]
async fn test_gemini_retries_quota_then_succeeds() {
    let (base_url, state) = spawn_stub(vec![
        (StatusCode::TOO_MANY_REQUESTS, quota_body()),
        (StatusCode::OK, success_body("매출 감소가 대표적인 신호입니다.")),
    ])
    .await;

    let backend = GeminiBackend::new(GeminiConfig::new("test-key").with_base_url(base_url)).unwrap();
    let sleeper = Arc::new(CountingSleeper::default());
    let client = GenerationClient::new(Arc::new(backend)).with_sleeper(sleeper.clone());

    let text = client.generate("위험 신호가 뭐야").await.unwrap();

    assert_eq!(text, "매출 감소가 대표적인 신호입니다.");
    assert_eq!(*sleeper.count.lock().unwrap(), 1);
    assert_eq!(
        state.api_keys.lock().unwrap().as_slice(),
        &["test-key".to_string(), "test-key".to_string()]
    );
}

#[tokio::test]
async fn test_gemini_non_quota_error_is_not_retried() {
    let (base_url, _state) = spawn_stub(vec![(
        StatusCode::BAD_REQUEST,
        r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#
            .to_string(),
    )])
    .await;

    let backend = GeminiBackend::new(GeminiConfig::new("bad").with_base_url(base_url)).unwrap();
    let sleeper = Arc::new(CountingSleeper::default());
    let client = GenerationClient::new(Arc::new(backend)).with_sleeper(sleeper.clone());

    let err = client.generate("q").await.unwrap_err();

    assert!(matches!(err, Error::Generation(ref msg) if msg.contains("API key not valid")));
    assert_eq!(*sleeper.count.lock().unwrap(), 0);
}
