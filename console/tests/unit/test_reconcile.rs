//! Status reconciliation tests

use std::collections::HashMap;

use hugodeck::models::event::ProgressEvent;
use hugodeck::models::status::{DeployStatus, StatusRecord};
use hugodeck::render::view::{RowBody, RowView, StatusIcon};
use hugodeck::sync::board::{reconcile, StatusBoard, StatusesResponse, Update};

fn push(json: &str) -> Update {
    Update::Push(ProgressEvent::parse(json).unwrap())
}

fn poll(json: &str) -> Update {
    let response: StatusesResponse = serde_json::from_str(json).unwrap();
    Update::Poll(response.statuses)
}

#[test]
fn test_poll_after_push_replaces_record_exactly() {
    let board = reconcile(
        StatusBoard::new(),
        &push(
            r#"{"server_id":"s1","server_name":"prod","status":"deploying","message":"Uploading","progress":60,"current_file":"index.html","current":6,"total":10,"speed":"1.2MB/s"}"#,
        ),
    );
    assert_eq!(board.get("s1").unwrap().progress, 60);

    let board = reconcile(
        board,
        &poll(r#"{"statuses":{"s1":{"status":"success","message":"Done","progress":100}}}"#),
    );

    let expected = StatusRecord {
        status: DeployStatus::Success,
        message: "Done".to_string(),
        progress: 100,
        ..Default::default()
    };
    assert_eq!(board.get("s1"), Some(&expected));

    let row = RowView::build("s1", board.get("s1").unwrap());
    assert_eq!(row.label, "Succeeded");
    assert_eq!(
        row.body,
        RowBody::Icon {
            icon: StatusIcon::Check
        }
    );
}

#[test]
fn test_push_after_poll_drops_poll_only_fields() {
    let board = reconcile(
        StatusBoard::new(),
        &poll(
            r#"{"statuses":{"s1":{"status":"deploying","message":"Uploading","progress":30,"can_pause":true,"can_stop":true}}}"#,
        ),
    );
    assert!(board.get("s1").unwrap().can_pause);

    let board = reconcile(
        board,
        &push(r#"{"server_id":"s1","status":"paused","message":"Paused by operator","progress":30}"#),
    );
    let record = board.get("s1").unwrap();
    assert_eq!(record.status, DeployStatus::Paused);
    assert!(!record.can_pause);
    assert!(!record.can_stop);
}

#[test]
fn test_last_applied_wins() {
    let updates = vec![
        push(r#"{"server_id":"s1","status":"deploying","progress":10}"#),
        poll(r#"{"statuses":{"s1":{"status":"deploying","progress":5}}}"#),
        push(r#"{"server_id":"s1","status":"deploying","progress":20}"#),
    ];

    let board = updates.iter().fold(StatusBoard::new(), reconcile);
    assert_eq!(board.get("s1").unwrap().progress, 20);

    // a stale poll arriving last still wins
    let board = reconcile(
        board,
        &poll(r#"{"statuses":{"s1":{"status":"deploying","progress":15}}}"#),
    );
    assert_eq!(board.get("s1").unwrap().progress, 15);
}

#[test]
fn test_targets_missing_from_poll_keep_last_record() {
    let mut statuses = HashMap::new();
    statuses.insert(
        "s1".to_string(),
        StatusRecord {
            status: DeployStatus::Failed,
            message: "rsync exited 23".to_string(),
            ..Default::default()
        },
    );
    statuses.insert("s2".to_string(), StatusRecord::default());
    let board = reconcile(StatusBoard::new(), &Update::Poll(statuses));

    let board = reconcile(
        board,
        &poll(r#"{"statuses":{"s2":{"status":"building","progress":50}}}"#),
    );
    assert_eq!(board.len(), 2);
    assert_eq!(board.get("s1").unwrap().status, DeployStatus::Failed);
    assert_eq!(board.get("s2").unwrap().status, DeployStatus::Building);
}

#[test]
fn test_system_events_touch_no_rows() {
    let board = reconcile(
        StatusBoard::new(),
        &push(r#"{"type":"build","server_id":"","status":"building","message":"hugo","progress":50}"#),
    );
    assert!(board.is_empty());

    let board = reconcile(
        board,
        &push(r#"{"type":"build","status":"success","message":"hugo done","progress":100}"#),
    );
    assert!(board.is_empty());
}

#[test]
fn test_unknown_status_is_kept_verbatim() {
    let board = reconcile(
        StatusBoard::new(),
        &push(r#"{"server_id":"s1","status":"verifying","message":"checksums","progress":80}"#),
    );
    let record = board.get("s1").unwrap();
    assert_eq!(record.status, DeployStatus::Other("verifying".to_string()));

    let row = RowView::build("s1", record);
    assert_eq!(row.label, "verifying");
    assert_eq!(row.progress(), None);
}
