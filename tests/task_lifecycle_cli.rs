mod support;

use predicates::str::contains;
use support::{new_task, wt_cmd, wt_json, TestDir};

#[test]
fn new_task_starts_pending_with_defaults() {
    let dir = TestDir::new();
    let value = wt_json(
        &dir,
        &[
            "new",
            "Build parser",
            "--description",
            "Tokenizer first",
            "--step",
            "design:30",
            "--step",
            "code:60",
            "--tag",
            "compiler",
        ],
    );

    let task = &value["data"];
    assert_eq!(value["command"].as_str(), Some("new"));
    assert_eq!(task["status"].as_str(), Some("pending"));
    assert_eq!(task["priority"].as_u64(), Some(3));
    assert_eq!(task["tags"][0].as_str(), Some("compiler"));
    assert_eq!(task["steps"][0]["order"].as_u64(), Some(1));
    assert_eq!(task["steps"][0]["estimatedTime"].as_u64(), Some(30));
    assert_eq!(task["steps"][1]["order"].as_u64(), Some(2));
    assert_eq!(task["createdAt"], task["updatedAt"]);
    assert!(task.get("actualStartDate").is_none());

    assert!(dir.tasks_file().exists());
}

#[test]
fn empty_description_fails_validation() {
    let dir = TestDir::new();
    wt_cmd(&dir)
        .args(["new", "Title", "--description", "  "])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("Validation failed"));
}

#[test]
fn priority_out_of_range_fails_validation() {
    let dir = TestDir::new();
    for priority in ["0", "6"] {
        wt_cmd(&dir)
            .args(["new", "T", "--description", "d", "--priority", priority])
            .assert()
            .failure()
            .code(2)
            .stderr(contains("priority"));
    }
    wt_json(&dir, &["new", "T", "--description", "d", "--priority", "1"]);
}

#[test]
fn start_then_complete_stamps_dates() {
    let dir = TestDir::new();
    let id = new_task(&dir, "Lifecycle", &[]);

    let started = wt_json(&dir, &["start", &id]);
    assert_eq!(started["data"]["status"].as_str(), Some("in_progress"));
    assert!(started["data"]["actualStartDate"].is_string());

    let completed = wt_json(&dir, &["complete", &id]);
    assert_eq!(completed["data"]["status"].as_str(), Some("completed"));
    assert!(completed["data"]["actualCompletionDate"].is_string());
}

#[test]
fn complete_straight_from_pending_is_allowed() {
    let dir = TestDir::new();
    let id = new_task(&dir, "Quick win", &[]);

    let completed = wt_json(&dir, &["complete", &id]);
    assert_eq!(completed["data"]["status"].as_str(), Some("completed"));
    assert!(completed["data"].get("actualStartDate").is_none());
}

#[test]
fn second_start_is_refused() {
    let dir = TestDir::new();
    let id = new_task(&dir, "Once", &[]);
    wt_json(&dir, &["start", &id]);

    wt_cmd(&dir)
        .args(["start", &id])
        .assert()
        .failure()
        .code(3)
        .stderr(contains("Cannot start"));
}

#[test]
fn update_cannot_set_status_completed() {
    let dir = TestDir::new();
    let id = new_task(&dir, "Guarded", &[]);

    wt_cmd(&dir)
        .args(["update", &id, "--status", "completed", "--title", "Sneaky"])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("complete operation"));

    // Nothing was merged.
    let shown = wt_json(&dir, &["show", &id]);
    assert_eq!(shown["data"]["title"].as_str(), Some("Guarded"));
    assert_eq!(shown["data"]["status"].as_str(), Some("pending"));
}

#[test]
fn cancel_goes_through_update() {
    let dir = TestDir::new();
    let id = new_task(&dir, "Doomed", &[]);

    let cancelled = wt_json(&dir, &["update", &id, "--status", "cancelled"]);
    assert_eq!(cancelled["data"]["status"].as_str(), Some("cancelled"));

    // A cancelled task can no longer be completed.
    wt_cmd(&dir)
        .args(["complete", &id])
        .assert()
        .failure()
        .code(3);
}

#[test]
fn complete_accepts_explicit_timestamp() {
    let dir = TestDir::new();
    let id = new_task(&dir, "Backfilled", &[]);

    let completed = wt_json(&dir, &["complete", &id, "--at", "2024-01-15T18:00:00Z"]);
    assert_eq!(
        completed["data"]["actualCompletionDate"].as_str(),
        Some("2024-01-15T18:00:00Z")
    );
}

#[test]
fn delete_is_permanent_and_absent_ids_are_user_errors() {
    let dir = TestDir::new();
    let id = new_task(&dir, "Ephemeral", &[]);

    let deleted = wt_json(&dir, &["delete", &id]);
    assert_eq!(deleted["data"]["deleted"].as_bool(), Some(true));

    wt_cmd(&dir)
        .args(["delete", &id])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("Task not found"));

    wt_cmd(&dir)
        .args(["show", &id])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("Task not found"));
}

#[test]
fn list_reflects_storage_order() {
    let dir = TestDir::new();
    let first = new_task(&dir, "First", &[]);
    let second = new_task(&dir, "Second", &[]);

    let listed = wt_json(&dir, &["list"]);
    let tasks = listed["data"].as_array().expect("task array");
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0]["id"].as_str(), Some(first.as_str()));
    assert_eq!(tasks[1]["id"].as_str(), Some(second.as_str()));
}
