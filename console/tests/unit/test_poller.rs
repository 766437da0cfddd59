//! Poller worker tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;

use hugodeck::errors::ConsoleError;
use hugodeck::http::statuses::StatusSource;
use hugodeck::models::status::{DeployStatus, StatusRecord};
use hugodeck::workers::poller;

use crate::common::{eventually, recording_sleep, RunningSync};

/// Reports `s1` deploying at 10% per poll; fails every other poll when flaky
struct CountingSource {
    polls: AtomicUsize,
    flaky: bool,
}

impl CountingSource {
    fn new(flaky: bool) -> Self {
        Self {
            polls: AtomicUsize::new(0),
            flaky,
        }
    }

    fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatusSource for CountingSource {
    async fn fetch_statuses(&self) -> Result<HashMap<String, StatusRecord>, ConsoleError> {
        let poll = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.flaky && poll % 2 == 0 {
            return Err(ConsoleError::BackendError("503 Service Unavailable".to_string()));
        }

        let mut statuses = HashMap::new();
        statuses.insert(
            "s1".to_string(),
            StatusRecord {
                status: DeployStatus::Deploying,
                progress: (poll as u32 * 10).min(100),
                ..Default::default()
            },
        );
        Ok(statuses)
    }
}

async fn poll_until(source: Arc<CountingSource>, sync: &RunningSync, polls: usize) -> Vec<Duration> {
    let delays = Arc::new(Mutex::new(Vec::new()));
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task_source = source.clone();
    let handle = sync.handle.clone();
    let sleep_fn = recording_sleep(delays.clone());
    let task = tokio::spawn(async move {
        poller::run(
            &poller::Options::default(),
            task_source.as_ref(),
            &handle,
            sleep_fn,
            Box::pin(async move {
                let _ = shutdown_rx.await;
            }),
        )
        .await;
    });

    eventually(|| source.polls() >= polls).await;
    let _ = shutdown_tx.send(());
    task.await.unwrap();

    let delays = delays.lock().unwrap().clone();
    delays
}

#[tokio::test]
async fn test_polls_every_interval_and_applies_snapshot() {
    let sync = RunningSync::start("poller-apply").await;
    let source = Arc::new(CountingSource::new(false));

    let delays = poll_until(source.clone(), &sync, 3).await;
    assert!(delays.len() >= 3);
    assert!(delays.iter().all(|d| *d == Duration::from_millis(5000)));

    let polls = source.polls() as u32;
    let statuses = sync.handle.statuses().await.unwrap();
    assert_eq!(statuses["s1"].progress, (polls * 10).min(100));

    // polls never write the journal
    assert!(sync.handle.logs().await.unwrap().is_empty());

    let dir = sync.stop().await;
    dir.delete().await.unwrap();
}

#[tokio::test]
async fn test_failed_polls_do_not_stop_the_loop() {
    let sync = RunningSync::start("poller-flaky").await;
    let source = Arc::new(CountingSource::new(true));

    poll_until(source.clone(), &sync, 6).await;
    assert!(source.polls() >= 6);

    let statuses = sync.handle.statuses().await.unwrap();
    assert_eq!(statuses["s1"].status, DeployStatus::Deploying);

    let dir = sync.stop().await;
    dir.delete().await.unwrap();
}
