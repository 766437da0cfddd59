//! Deploy control tests

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio_test::{assert_err, assert_ok};

use hugodeck::deploy::action::{DeployAction, ServeCommand};
use hugodeck::deploy::dispatcher::{BatchFailure, Dispatcher};
use hugodeck::deploy::gate::BuildState;
use hugodeck::errors::ConsoleError;
use hugodeck::http::actions::ServeFailure;
use hugodeck::models::log_entry::LogKind;
use hugodeck::models::notice::NoticeLevel;

use crate::common::{target, FakeBackend, RunningSync};

fn dispatcher(sync: &RunningSync, backend: FakeBackend) -> (Dispatcher<FakeBackend>, Arc<FakeBackend>) {
    let backend = Arc::new(backend);
    (Dispatcher::new(backend.clone(), sync.handle.clone()), backend)
}

#[tokio::test]
async fn test_deploy_is_blocked_until_built() {
    let sync = RunningSync::start("dispatch-gate").await;
    let (dispatcher, backend) = dispatcher(&sync, FakeBackend::new(vec![target("s1", true)]));

    assert_eq!(dispatcher.build_state(), BuildState::NotBuilt);
    assert!(!dispatcher.deploy_enabled());

    let result = dispatcher.trigger(DeployAction::Deploy, "s1").await;
    assert!(matches!(result, Err(ConsoleError::DeployBlocked(_))));
    let result = dispatcher.trigger(DeployAction::IncrementalDeploy, "s1").await;
    assert!(matches!(result, Err(ConsoleError::DeployBlocked(_))));
    assert!(backend.calls().is_empty());

    sync.settle().await;
    let notices = sync.notices();
    assert_eq!(notices.len(), 2);
    assert!(notices.iter().all(|n| n.level == NoticeLevel::Warning));

    let dir = sync.stop().await;
    dir.delete().await.unwrap();
}

#[tokio::test]
async fn test_ungated_actions_pass_before_build() {
    let sync = RunningSync::start("dispatch-ungated").await;
    let (dispatcher, backend) = dispatcher(&sync, FakeBackend::new(vec![target("s1", true)]));

    for action in [
        DeployAction::BuildDeploy,
        DeployAction::IncrementalBuildDeploy,
        DeployAction::Pause,
        DeployAction::Resume,
        DeployAction::Stop,
    ] {
        assert_ok!(dispatcher.trigger(action, "s1").await);
    }
    assert_eq!(backend.calls().len(), 5);

    let dir = sync.stop().await;
    dir.delete().await.unwrap();
}

#[tokio::test]
async fn test_build_success_opens_gate_and_failure_closes_it() {
    let sync = RunningSync::start("dispatch-build").await;
    let (dispatcher, backend) = dispatcher(&sync, FakeBackend::new(vec![target("s1", true)]));

    let report = dispatcher.build().await.unwrap();
    assert_eq!(report.message, "Hugo build completed");
    assert_eq!(dispatcher.build_state(), BuildState::Built);
    assert!(dispatcher.deploy_enabled());

    dispatcher.trigger(DeployAction::Deploy, "s1").await.unwrap();
    assert_eq!(backend.calls(), vec![(DeployAction::Deploy, "s1".to_string())]);

    backend.build_ok.store(false, Ordering::SeqCst);
    let result = dispatcher.build().await;
    assert!(matches!(result, Err(ConsoleError::BuildFailed(_))));
    assert_eq!(dispatcher.build_state(), BuildState::Failed);
    assert!(!dispatcher.deploy_enabled());

    let logs = sync.handle.logs().await.unwrap();
    let lines: Vec<(&str, LogKind)> = logs
        .iter()
        .map(|entry| (entry.message.as_str(), entry.kind))
        .collect();
    assert_eq!(
        lines,
        vec![
            ("INFO: Starting Hugo build...", LogKind::Info),
            ("SUCCESS: Hugo build succeeded", LogKind::Success),
            ("Build output:\nTotal in 42 ms", LogKind::Info),
            ("INFO: Starting Hugo build...", LogKind::Info),
            (
                "ERROR: Hugo build failed - hugo exited with status 255",
                LogKind::Error
            ),
            (
                "Build output:\ntemplate: index.html:3: unexpected EOF",
                LogKind::Warning
            ),
        ]
    );

    let dir = sync.stop().await;
    dir.delete().await.unwrap();
}

#[tokio::test]
async fn test_action_failure_raises_alert() {
    let sync = RunningSync::start("dispatch-alert").await;
    let (dispatcher, _backend) = dispatcher(
        &sync,
        FakeBackend::new(vec![target("s1", true)]).failing_on("s1"),
    );

    let error = assert_err!(dispatcher.trigger(DeployAction::Stop, "s1").await);
    assert!(matches!(error, ConsoleError::ActionFailed { .. }));

    sync.settle().await;
    let notices = sync.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Alert);
    assert_eq!(notices[0].message, "stop failed: rsync exited 23");

    let dir = sync.stop().await;
    dir.delete().await.unwrap();
}

#[tokio::test]
async fn test_deploy_all_targets_enabled_only() {
    let sync = RunningSync::start("dispatch-batch").await;
    let backend = FakeBackend::new(vec![
        target("s1", true),
        target("s2", false),
        target("s3", true),
    ])
    .failing_on("s3");
    let (dispatcher, backend) = dispatcher(&sync, backend);

    dispatcher.build().await.unwrap();
    let report = dispatcher.deploy_all(true).await.unwrap();

    assert_eq!(report.accepted, vec!["s1".to_string()]);
    assert_eq!(
        report.failed,
        vec![BatchFailure {
            target_id: "s3".to_string(),
            error: "Action incremental-deploy failed: rsync exited 23".to_string(),
        }]
    );

    let mut calls = backend.calls();
    calls.sort_by(|a, b| a.1.cmp(&b.1));
    assert_eq!(
        calls,
        vec![
            (DeployAction::IncrementalDeploy, "s1".to_string()),
            (DeployAction::IncrementalDeploy, "s3".to_string()),
        ]
    );

    let dir = sync.stop().await;
    dir.delete().await.unwrap();
}

#[tokio::test]
async fn test_deploy_all_requires_build_and_targets() {
    let sync = RunningSync::start("dispatch-batch-gate").await;
    let (dispatcher, backend) = dispatcher(&sync, FakeBackend::new(vec![target("s1", false)]));

    let result = dispatcher.deploy_all(false).await;
    assert!(matches!(result, Err(ConsoleError::DeployBlocked(_))));

    dispatcher.build().await.unwrap();
    let result = dispatcher.deploy_all(false).await;
    assert!(matches!(result, Err(ConsoleError::DeployBlocked(_))));
    assert!(backend.calls().is_empty());

    let dir = sync.stop().await;
    dir.delete().await.unwrap();
}

#[tokio::test]
async fn test_cancelled_build_does_not_wedge_the_gate() {
    let sync = RunningSync::start("dispatch-cancel").await;
    let (dispatcher, backend) = dispatcher(&sync, FakeBackend::new(vec![target("s1", true)]));
    backend.build_hangs.store(true, Ordering::SeqCst);

    let result = tokio::time::timeout(Duration::from_millis(50), dispatcher.build()).await;
    assert!(result.is_err());
    assert_eq!(dispatcher.build_state(), BuildState::Failed);
    assert!(!dispatcher.deploy_enabled());

    backend.build_hangs.store(false, Ordering::SeqCst);
    assert_ok!(dispatcher.build().await);
    assert_eq!(dispatcher.build_state(), BuildState::Built);
    assert_ok!(dispatcher.trigger(DeployAction::Deploy, "s1").await);

    let dir = sync.stop().await;
    dir.delete().await.unwrap();
}

#[tokio::test]
async fn test_second_build_while_running_is_busy() {
    let sync = RunningSync::start("dispatch-busy").await;
    let (dispatcher, backend) = dispatcher(&sync, FakeBackend::new(vec![]));
    backend.build_hangs.store(true, Ordering::SeqCst);

    let first = dispatcher.build();
    tokio::pin!(first);
    tokio::select! {
        _ = &mut first => panic!("build should still be running"),
        _ = tokio::task::yield_now() => {}
    }
    assert_eq!(dispatcher.build_state(), BuildState::Building);

    let second = dispatcher.build().await;
    assert!(matches!(second, Err(ConsoleError::Busy(_))));

    drop(first);
    assert_eq!(dispatcher.build_state(), BuildState::Failed);

    let dir = sync.stop().await;
    dir.delete().await.unwrap();
}

#[tokio::test]
async fn test_serve_commands_log_and_notify() {
    let sync = RunningSync::start("dispatch-serve").await;
    let (dispatcher, _backend) = dispatcher(&sync, FakeBackend::new(vec![]));

    let report = dispatcher.serve(ServeCommand::Start, 1314).await.unwrap();
    assert!(report.status.running);
    assert_eq!(report.status.url.as_deref(), Some("http://localhost:1314"));
    assert!(dispatcher.serve_status().await.unwrap().running);

    dispatcher.serve(ServeCommand::Restart, 0).await.unwrap();
    let report = dispatcher.serve(ServeCommand::Stop, 0).await.unwrap();
    assert!(!report.status.running);
    assert_eq!(report.status.port, 1314);

    let logs = sync.handle.logs().await.unwrap();
    let lines: Vec<&str> = logs.iter().map(|entry| entry.message.as_str()).collect();
    assert_eq!(
        lines,
        vec![
            "SUCCESS: Hugo serve started",
            "SUCCESS: Hugo serve restarted",
            "SUCCESS: Hugo serve stopped",
        ]
    );
    assert!(logs.iter().all(|entry| entry.kind == LogKind::Success));

    let notices = sync.notices();
    assert_eq!(notices.len(), 3);
    assert!(notices.iter().all(|n| n.level == NoticeLevel::Success));

    let dir = sync.stop().await;
    dir.delete().await.unwrap();
}

#[tokio::test]
async fn test_serve_failure_logs_process_output() {
    let sync = RunningSync::start("dispatch-serve-fail").await;
    let backend = FakeBackend::new(vec![]).serve_failing(ServeFailure {
        error: "port 1313 in use".to_string(),
        stderr: "listen tcp :1313: bind: address already in use".to_string(),
        output: "Watching for changes".to_string(),
    });
    let (dispatcher, _backend) = dispatcher(&sync, backend);

    let error = assert_err!(dispatcher.serve(ServeCommand::Start, 1313).await);
    assert!(matches!(error, ConsoleError::ServeFailed(_)));

    let logs = sync.handle.logs().await.unwrap();
    let lines: Vec<(&str, LogKind)> = logs
        .iter()
        .map(|entry| (entry.message.as_str(), entry.kind))
        .collect();
    assert_eq!(
        lines,
        vec![
            ("ERROR: Hugo serve start failed: port 1313 in use", LogKind::Error),
            (
                "Hugo serve error output:\nlisten tcp :1313: bind: address already in use",
                LogKind::Error
            ),
            ("Hugo serve output:\nWatching for changes", LogKind::Warning),
        ]
    );

    let notices = sync.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert_eq!(notices[0].message, "Hugo serve start failed: port 1313 in use");

    let dir = sync.stop().await;
    dir.delete().await.unwrap();
}
