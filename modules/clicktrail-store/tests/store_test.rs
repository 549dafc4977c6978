//! Integration tests for EventLog against a real file in a temp directory.

use chrono::{DateTime, Utc};
use clicktrail_common::{Environment, EventRecord};
use clicktrail_store::EventLog;
use futures::future::join_all;

fn environment() -> Environment {
    Environment::new(1280, 720, "StoreTest/1.0", "en-US")
}

fn temp_log() -> (tempfile::TempDir, EventLog) {
    let dir = tempfile::tempdir().unwrap();
    let log = EventLog::open(dir.path().join("logs/events.log")).unwrap();
    (dir, log)
}

fn is_well_formed(line: &str) -> bool {
    let parts: Vec<&str> = line.split(" -- ").collect();
    parts.len() >= 5
        && parts.iter().any(|p| p.starts_with("IP: "))
        && parts.iter().any(|p| p.starts_with("Device: "))
        && parts.last().is_some_and(|p| p.starts_with("TIME: ") && p.ends_with('Z'))
}

fn received_at(line: &str) -> DateTime<Utc> {
    let (_, time) = line.rsplit_once("TIME: ").unwrap();
    DateTime::parse_from_rfc3339(time).unwrap().with_timezone(&Utc)
}

// =========================================================================
// Round trip
// =========================================================================

#[tokio::test]
async fn click_event_lands_as_last_line() {
    let (_dir, log) = temp_log();
    let record = EventRecord::new(
        "Click Action",
        "Click Count: 1, Target Tag: BUTTON",
        &environment(),
    );

    log.append(&record, "127.0.0.1").await.unwrap();

    let content = log.read_all().await.unwrap();
    let last = content.lines().filter(|l| !l.is_empty()).last().unwrap();
    assert!(last.contains("Click Action"));
    assert!(last.contains("Click Count: 1"));
    assert!(last.contains("127.0.0.1"));
    assert!(last.contains("Device: 1280, 720, StoreTest/1.0, en-US"));
}

#[tokio::test]
async fn reads_are_idempotent() {
    let (_dir, log) = temp_log();
    log.append(&EventRecord::new("Page Action", "Page: /", &environment()), "::1")
        .await
        .unwrap();

    let first = log.read_all().await.unwrap();
    let second = log.read_all().await.unwrap();
    assert_eq!(first, second);
}

// =========================================================================
// Ordering and append-only
// =========================================================================

#[tokio::test]
async fn sequential_appends_keep_send_order() {
    let (_dir, log) = temp_log();

    log.append(&EventRecord::new("Window Action", "A", &environment()), "127.0.0.1")
        .await
        .unwrap();
    log.append(&EventRecord::new("Window Action", "B", &environment()), "127.0.0.1")
        .await
        .unwrap();

    let content = log.read_all().await.unwrap();
    let a = content.find("-- A --").unwrap();
    let b = content.find("-- B --").unwrap();
    assert!(a < b);
}

#[tokio::test]
async fn existing_lines_are_never_rewritten() {
    let (_dir, log) = temp_log();
    log.append(&EventRecord::new("Scroll Action", "%10.00", &environment()), "127.0.0.1")
        .await
        .unwrap();
    let before = log.read_all().await.unwrap();

    log.append(&EventRecord::new("Scroll Action", "%20.00", &environment()), "127.0.0.1")
        .await
        .unwrap();
    let after = log.read_all().await.unwrap();

    assert!(after.starts_with(&before));
    assert_eq!(after.lines().count(), 2);
}

#[tokio::test]
async fn appending_to_a_file_from_a_previous_run_extends_it() {
    let (_dir, log) = temp_log();
    std::fs::write(log.path(), "Page Action -- old -- IP: x -- Device: y -- TIME: t\n").unwrap();

    log.append(&EventRecord::new("Page Action", "new", &environment()), "127.0.0.1")
        .await
        .unwrap();

    let content = log.read_all().await.unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("-- old --"));
    assert!(lines[1].contains("-- new --"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_appends_produce_one_whole_line_each() {
    let (_dir, log) = temp_log();
    let n = 64;
    // Long payloads make torn writes visible if they ever happen.
    let padding = "x".repeat(2048);

    let appends = (0..n).map(|i| {
        let log = log.clone();
        let record = EventRecord::new("Form Action", format!("Field: f{i} -- Input: {padding}"), &environment());
        tokio::spawn(async move { log.append(&record, "192.168.1.20").await })
    });
    for result in join_all(appends).await {
        result.unwrap().unwrap();
    }

    let content = log.read_all().await.unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), n);
    assert!(lines.iter().all(|l| is_well_formed(l)), "torn line in log");
    for i in 0..n {
        let tag = format!("Field: f{i} -- ");
        assert_eq!(lines.iter().filter(|l| l.contains(&tag)).count(), 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn receipt_times_never_decrease_in_file_order() {
    let (_dir, log) = temp_log();

    for round in 0..10 {
        let appends = (0..200).map(|i| {
            let log = log.clone();
            let record = EventRecord::new("Click Action", format!("Click Count: {round}-{i}"), &environment());
            tokio::spawn(async move { log.append(&record, "10.1.1.1").await })
        });
        for result in join_all(appends).await {
            result.unwrap().unwrap();
        }
    }

    let content = log.read_all().await.unwrap();
    let times: Vec<DateTime<Utc>> = content.lines().map(received_at).collect();
    assert_eq!(times.len(), 2000);
    let inversions = times.windows(2).filter(|w| w[1] < w[0]).count();
    assert_eq!(inversions, 0, "log lines out of time order");
}
