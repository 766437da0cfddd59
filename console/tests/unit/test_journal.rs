//! Journal persistence tests

use hugodeck::filesys::dir::Dir;
use hugodeck::filesys::file::File;
use hugodeck::journal::store::Journal;
use hugodeck::models::log_entry::{LogEntry, LogKind};

#[tokio::test]
async fn test_persisted_entries_are_capped_oldest_first() {
    let dir = Dir::create_temp_dir("journal-cap").await.unwrap();
    let file = dir.file("deploy-logs.json");
    let mut journal = Journal::load(file.clone(), 100).await;

    for i in 0..105 {
        journal.append(format!("entry {}", i), LogKind::Info).await;
    }

    // the view keeps everything appended in this process
    assert_eq!(journal.entries().len(), 105);
    assert_eq!(journal.persisted().len(), 100);
    assert_eq!(journal.persisted()[0].message, "entry 5");
    assert_eq!(journal.persisted()[99].message, "entry 104");

    let on_disk: Vec<LogEntry> = file.read_json().await.unwrap();
    assert_eq!(on_disk.len(), 100);
    assert_eq!(on_disk[0].message, "entry 5");

    dir.delete().await.unwrap();
}

#[tokio::test]
async fn test_reload_rebuilds_view_in_order() {
    let dir = Dir::create_temp_dir("journal-reload").await.unwrap();
    let file = dir.file("deploy-logs.json");

    {
        let mut journal = Journal::load(file.clone(), 100).await;
        journal.append("INFO: Starting Hugo build...", LogKind::Info).await;
        journal.append("SUCCESS: Hugo build succeeded", LogKind::Success).await;
        journal.append("[prod] rsync exited 23", LogKind::Error).await;
    }

    let journal = Journal::load(file, 100).await;
    let entries: Vec<(&str, LogKind)> = journal
        .entries()
        .iter()
        .map(|entry| (entry.message.as_str(), entry.kind))
        .collect();
    assert_eq!(
        entries,
        vec![
            ("INFO: Starting Hugo build...", LogKind::Info),
            ("SUCCESS: Hugo build succeeded", LogKind::Success),
            ("[prod] rsync exited 23", LogKind::Error),
        ]
    );

    dir.delete().await.unwrap();
}

#[tokio::test]
async fn test_corrupt_file_loads_as_empty() {
    let dir = Dir::create_temp_dir("journal-corrupt").await.unwrap();
    let file = dir.file("deploy-logs.json");
    file.write_atomic(b"[{\"timestamp\":").await.unwrap();

    let mut journal = Journal::load(file.clone(), 100).await;
    assert!(journal.entries().is_empty());

    // the next write replaces the unreadable file
    journal.append("first", LogKind::Info).await;
    let on_disk: Vec<LogEntry> = file.read_json().await.unwrap();
    assert_eq!(on_disk.len(), 1);

    dir.delete().await.unwrap();
}

#[tokio::test]
async fn test_clear_removes_file() {
    let dir = Dir::create_temp_dir("journal-clear").await.unwrap();
    let file = dir.file("deploy-logs.json");

    let mut journal = Journal::load(file.clone(), 100).await;
    journal.append("one", LogKind::Info).await;
    assert!(file.exists().await);

    journal.clear().await.unwrap();
    assert!(journal.entries().is_empty());
    assert!(!file.exists().await);

    let journal = Journal::load(file, 100).await;
    assert!(journal.entries().is_empty());

    dir.delete().await.unwrap();
}

#[tokio::test]
async fn test_failed_write_still_appends_to_view() {
    let dir = Dir::create_temp_dir("journal-unwritable").await.unwrap();
    let blocker = dir.file("blocker");
    blocker.write_atomic(b"not a directory").await.unwrap();

    // the parent of the journal path is a regular file, so every write fails
    let file = File::new(blocker.path().join("deploy-logs.json"));
    let mut journal = Journal::load(file.clone(), 100).await;
    assert!(journal.entries().is_empty());

    let entry = journal.append("ERROR: disk full", LogKind::Error).await;
    assert_eq!(entry.message, "ERROR: disk full");
    assert_eq!(entry.kind, LogKind::Error);

    assert_eq!(journal.entries().len(), 1);
    assert_eq!(journal.entries()[0].message, "ERROR: disk full");
    assert!(journal.persisted().is_empty());
    assert!(!file.exists().await);

    journal.append("second", LogKind::Info).await;
    assert_eq!(journal.entries().len(), 2);
    assert!(journal.persisted().is_empty());

    dir.delete().await.unwrap();
}
