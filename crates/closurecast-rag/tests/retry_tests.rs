//! Retry policy integration tests
//!
//! Drives `GenerationClient` with a scripted backend and a recording sleeper
//! so every backoff is observed without waiting on the wall clock.

use async_trait::async_trait;
use closurecast_core::{Error, Result};
use closurecast_rag::{GenerationBackend, GenerationClient, RetryPolicy, Sleeper};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Copy)]
enum Step {
    Ok,
    Quota,
    Fail,
}

/// Backend that replays a fixed script of outcomes, then keeps succeeding
struct ScriptedBackend {
    script: Mutex<VecDeque<Step>>,
    call_count: AtomicU32,
}

impl ScriptedBackend {
    fn new(steps: &[Step]) -> Self {
        Self {
            script: Mutex::new(steps.iter().copied().collect()),
            call_count: AtomicU32::new(0),
        }
    }

    fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        let step = self.script.lock().unwrap().pop_front().unwrap_or(Step::Ok);
        match step {
            Step::Ok => Ok(format!("answer to {}", prompt)),
            Step::Quota => Err(Error::quota_exhausted("Resource has been exhausted")),
            Step::Fail => Err(Error::generation("400 Bad Request: API key not valid")),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Records requested sleeps instead of sleeping
#[derive(Default)]
struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

fn client(steps: &[Step]) -> (GenerationClient, Arc<ScriptedBackend>, Arc<RecordingSleeper>) {
    let backend = Arc::new(ScriptedBackend::new(steps));
    let sleeper = Arc::new(RecordingSleeper::default());
    let client = GenerationClient::new(backend.clone()).with_sleeper(sleeper.clone());
    (client, backend, sleeper)
}

#[tokio::test]
async fn test_first_attempt_success_never_sleeps() {
    let (client, backend, sleeper) = client(&[Step::Ok]);

    let text = client.generate("질문").await.unwrap();

    assert_eq!(text, "answer to 질문");
    assert_eq!(backend.call_count(), 1);
    assert!(sleeper.sleeps().is_empty());
}

#[tokio::test]
async fn test_quota_then_success() {
    let (client, backend, sleeper) = client(&[Step::Quota, Step::Quota, Step::Ok]);

    let text = client.generate("q").await.unwrap();

    assert_eq!(text, "answer to q");
    assert_eq!(backend.call_count(), 3);
    assert_eq!(sleeper.sleeps(), vec![Duration::from_secs(30); 2]);
}

#[tokio::test]
async fn test_persistent_quota_exhausts_after_three_sleeps() {
    let (client, backend, sleeper) =
        client(&[Step::Quota, Step::Quota, Step::Quota, Step::Quota, Step::Ok]);

    let err = client.generate("q").await.unwrap_err();

    assert!(matches!(err, Error::RetriesExhausted { attempts: 4 }));
    assert_eq!(backend.call_count(), 4);
    assert_eq!(sleeper.sleeps(), vec![Duration::from_secs(30); 3]);
}

#[tokio::test]
async fn test_third_retry_can_still_succeed() {
    let (client, backend, sleeper) = client(&[Step::Quota, Step::Quota, Step::Quota, Step::Ok]);

    assert!(client.generate("q").await.is_ok());
    assert_eq!(backend.call_count(), 4);
    assert_eq!(sleeper.sleeps().len(), 3);
}

#[tokio::test]
async fn test_other_error_propagates_immediately() {
    let (client, backend, sleeper) = client(&[Step::Fail]);

    let err = client.generate("q").await.unwrap_err();

    assert!(matches!(err, Error::Generation(_)));
    assert_eq!(backend.call_count(), 1);
    assert!(sleeper.sleeps().is_empty());
}

#[tokio::test]
async fn test_other_error_after_quota_adds_no_sleep() {
    let (client, backend, sleeper) = client(&[Step::Quota, Step::Fail, Step::Ok]);

    let err = client.generate("q").await.unwrap_err();

    assert!(matches!(err, Error::Generation(_)));
    assert_eq!(backend.call_count(), 2);
    assert_eq!(sleeper.sleeps().len(), 1);
}

#[tokio::test]
async fn test_custom_policy() {
    let (client, backend, sleeper) = client(&[Step::Quota, Step::Quota]);
    let client = client.with_policy(RetryPolicy::new(1, Duration::from_millis(5)));

    let err = client.generate("q").await.unwrap_err();

    assert!(matches!(err, Error::RetriesExhausted { attempts: 2 }));
    assert_eq!(backend.call_count(), 2);
    assert_eq!(sleeper.sleeps(), vec![Duration::from_millis(5)]);
}
