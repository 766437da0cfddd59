//! Push channel worker tests

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;
use url::Url;

use hugodeck::models::status::DeployStatus;
use hugodeck::push::channel::Frame;
use hugodeck::push::lifecycle::ConnectionState;
use hugodeck::utils::BackoffOptions;
use hugodeck::workers::push::{self, PushHandle};

use crate::common::{eventually, recording_sleep, secs, Attempt, RunningSync, ScriptedConnector};

struct RunningPush {
    handle: PushHandle,
    connector: Arc<ScriptedConnector>,
    delays: Arc<Mutex<Vec<Duration>>>,
    shutdown_tx: oneshot::Sender<()>,
    task: tokio::task::JoinHandle<()>,
}

impl RunningPush {
    fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }

    async fn stop(self) {
        let _ = self.shutdown_tx.send(());
        self.task.await.unwrap();
    }
}

fn start_push(sync: &RunningSync, script: Vec<Attempt>, connect_on_start: bool) -> RunningPush {
    let connector = Arc::new(ScriptedConnector::new(script));
    let delays = Arc::new(Mutex::new(Vec::new()));
    let (handle, control) = push::control();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let options = push::Options {
        backoff: BackoffOptions::default(),
        connect_on_start,
    };
    let url = Url::parse("ws://localhost:8080/ws/progress").unwrap();
    let task_connector = connector.clone();
    let sync_handle = sync.handle.clone();
    let sleep_fn = recording_sleep(delays.clone());

    let task = tokio::spawn(async move {
        push::run(
            &options,
            task_connector.as_ref(),
            url,
            sync_handle,
            control,
            sleep_fn,
            Box::pin(async move {
                let _ = shutdown_rx.await;
            }),
        )
        .await;
    });

    RunningPush {
        handle,
        connector,
        delays,
        shutdown_tx,
        task,
    }
}

fn event(server_id: &str, status: &str, progress: u32) -> Frame {
    Frame::Text(format!(
        r#"{{"type":"deploy","server_id":"{}","server_name":"{}-server","status":"{}","message":"working","progress":{}}}"#,
        server_id, server_id, status, progress
    ))
}

#[tokio::test]
async fn test_retries_stop_after_five_attempts() {
    let sync = RunningSync::start("push-retries").await;
    let push = start_push(&sync, vec![], true);

    // initial attempt plus five reconnects
    let connector = push.connector.clone();
    eventually(|| connector.opens() == 6).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(push.connector.opens(), 6);
    assert_eq!(push.delays(), secs(&[2, 4, 6, 8, 10]));
    assert_eq!(push.handle.state(), ConnectionState::Disconnected);

    push.stop().await;
    sync.stop().await;
}

#[tokio::test]
async fn test_connect_request_starts_fresh_episode() {
    let sync = RunningSync::start("push-fresh").await;
    let push = start_push(&sync, vec![], true);

    let connector = push.connector.clone();
    eventually(|| connector.opens() == 6).await;

    push.handle.connect();
    eventually(|| connector.opens() == 12).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(push.connector.opens(), 12);
    assert_eq!(
        push.delays(),
        secs(&[2, 4, 6, 8, 10, 2, 4, 6, 8, 10])
    );

    push.stop().await;
    sync.stop().await;
}

#[tokio::test]
async fn test_successful_open_resets_retry_count() {
    let sync = RunningSync::start("push-reset").await;
    let script = vec![
        Attempt::Refuse,
        Attempt::Refuse,
        Attempt::Deliver(vec![]),
    ];
    let push = start_push(&sync, script, true);

    let connector = push.connector.clone();
    eventually(|| connector.opens() == 8).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(push.delays(), secs(&[2, 4, 2, 4, 6, 8, 10]));

    push.stop().await;
    sync.stop().await;
}

#[tokio::test]
async fn test_frames_reach_the_board_and_malformed_frames_are_dropped() {
    let sync = RunningSync::start("push-frames").await;
    let script = vec![Attempt::Hold(vec![
        event("s1", "deploying", 40),
        Frame::Text("{not json".to_string()),
        Frame::Text(r#"{"server_id":"s1","message":"no status"}"#.to_string()),
        Frame::Error("reset by peer".to_string()),
        event("s1", "deploying", 60),
    ])];
    let push = start_push(&sync, script, true);

    let handle = push.handle.clone();
    eventually(|| handle.state() == ConnectionState::Connected).await;

    let sync_handle = sync.handle.clone();
    let mut progress = 0;
    for _ in 0..500 {
        let statuses = sync_handle.statuses().await.unwrap();
        if let Some(record) = statuses.get("s1") {
            progress = record.progress;
            if progress == 60 {
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(progress, 60);

    let statuses = sync.handle.statuses().await.unwrap();
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses["s1"].status, DeployStatus::Deploying);

    // one log line per valid event
    let logs = sync.handle.logs().await.unwrap();
    let lines: Vec<&str> = logs.iter().map(|entry| entry.message.as_str()).collect();
    assert_eq!(lines, vec!["[s1-server] working", "[s1-server] working"]);

    // the error frame did not close the channel
    assert_eq!(push.handle.state(), ConnectionState::Connected);
    assert_eq!(push.connector.opens(), 1);

    push.stop().await;
    sync.stop().await;
}

#[tokio::test]
async fn test_disconnect_does_not_reconnect() {
    let sync = RunningSync::start("push-disconnect").await;
    let push = start_push(&sync, vec![Attempt::Hold(vec![])], true);

    let handle = push.handle.clone();
    eventually(|| handle.state() == ConnectionState::Connected).await;

    push.handle.disconnect();
    eventually(|| handle.state() == ConnectionState::Disconnected).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(push.connector.opens(), 1);
    assert!(push.delays().is_empty());

    push.stop().await;
    sync.stop().await;
}

#[tokio::test]
async fn test_connect_is_ignored_while_connected() {
    let sync = RunningSync::start("push-idempotent").await;
    let push = start_push(&sync, vec![Attempt::Hold(vec![])], false);

    assert_eq!(push.handle.state(), ConnectionState::Disconnected);
    push.handle.connect();

    let handle = push.handle.clone();
    eventually(|| handle.state() == ConnectionState::Connected).await;

    push.handle.connect();
    push.handle.connect();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(push.connector.opens(), 1);
    assert_eq!(push.handle.state(), ConnectionState::Connected);

    push.stop().await;
    sync.stop().await;
}
