use crate::common::{Harness, PROJECT};
use runplane_core::models::Status;
use runplane_core::services::EntityService;
use runplane_core::state_machine::State;
use serde_json::json;

const TASK_KEY: &str = "python+job://demo/train";

#[tokio::test]
async fn test_fire_creates_and_starts_one_run() {
    let h = Harness::new();
    h.task().await;
    let trigger = h.trigger(TASK_KEY, State::Ready).await;

    let fired = h.trigger_manager.fire(trigger.clone()).await;
    assert_eq!(fired.state(), State::Ready);
    assert_eq!(fired.status.extra.get("fired"), Some(&json!(true)));

    let runs = h.runs.list(Some(PROJECT)).await.unwrap();
    assert_eq!(runs.len(), 1);
    let run = &runs[0];
    assert_eq!(run.kind, "python+run");
    assert_eq!(run.user.as_deref(), Some("alice"));
    assert_eq!(run.produced_by(), Some(trigger.key().as_str()));
    assert_eq!(run.spec.task.as_deref(), Some(TASK_KEY));
    assert_eq!(run.spec.extra.get("epochs"), Some(&json!(3)));
    assert_eq!(run.state(), State::Ready);
    assert_eq!(h.runtime.calls(), vec!["build", "run"]);

    // firing reads the trigger; the stored row is not rewritten
    let stored = h.triggers.get(&trigger.id).await.unwrap();
    assert_eq!(stored, trigger);
}

#[tokio::test]
async fn test_fire_details_reach_returned_status() {
    let h = Harness::new();
    h.task().await;
    let trigger = h.trigger(TASK_KEY, State::Ready).await;
    let details = Status::default().with_extra("cron", json!("*/5 * * * *"));

    let fired = h.trigger_manager.fire_with(trigger, Some(details)).await;
    assert_eq!(fired.status.extra.get("cron"), Some(&json!("*/5 * * * *")));
    assert_eq!(fired.status.extra.get("fired"), Some(&json!(true)));
}

#[tokio::test]
async fn test_fire_with_missing_task_changes_nothing() {
    let h = Harness::new();
    let trigger = h.trigger("python+job://demo/missing", State::Ready).await;

    let returned = h.trigger_manager.fire(trigger.clone()).await;
    assert_eq!(returned, trigger);
    assert!(h.runs.list(None).await.unwrap().is_empty());
    assert!(h.runtime.calls().is_empty());
}

#[tokio::test]
async fn test_fire_with_malformed_or_foreign_task_changes_nothing() {
    let h = Harness::new();
    h.task().await;

    for key in ["not-a-task-key", "python+job://other/train"] {
        let trigger = h.trigger(key, State::Ready).await;
        let returned = h.trigger_manager.fire(trigger.clone()).await;
        assert_eq!(returned, trigger, "{key}");
    }
    assert!(h.runs.list(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_fire_outside_ready_is_ignored() {
    let h = Harness::new();
    h.task().await;
    let trigger = h.trigger(TASK_KEY, State::Stopped).await;

    let returned = h.trigger_manager.fire(trigger.clone()).await;
    assert_eq!(returned, trigger);
    assert!(h.runs.list(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_run_and_stop_trigger() {
    let h = Harness::new();
    let trigger = h.trigger(TASK_KEY, State::Created).await;

    let ready = h.trigger_manager.run(trigger).await.unwrap();
    assert_eq!(ready.state(), State::Ready);
    assert_eq!(ready.status.extra.get("scheduler"), Some(&json!("active")));
    assert_eq!(h.triggers.get(&ready.id).await.unwrap().state(), State::Ready);

    let stopped = h.trigger_manager.stop(ready).await.unwrap();
    assert_eq!(stopped.state(), State::Stopped);
    assert_eq!(stopped.status.extra.get("scheduler"), Some(&json!("stopped")));

    let history: Vec<State> = stopped
        .status
        .transitions
        .unwrap()
        .iter()
        .map(|t| t.state)
        .collect();
    assert_eq!(history, vec![State::Ready, State::Stopped]);
}

#[tokio::test]
async fn test_stop_on_stopped_trigger_is_a_no_op() {
    let h = Harness::new();
    let trigger = h.trigger(TASK_KEY, State::Stopped).await;

    let returned = h.trigger_manager.stop(trigger.clone()).await.unwrap();
    assert_eq!(returned, trigger);
}
