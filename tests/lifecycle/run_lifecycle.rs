use crate::common::{Harness, MockRuntime, FRAMEWORK};
use async_trait::async_trait;
use runplane_core::events::{BusEvent, EntityAction};
use runplane_core::models::{Run, Runnable, RunSpec, Status};
use runplane_core::processors::{Processor, ProcessorError, ProcessorResult};
use runplane_core::services::EntityService;
use runplane_core::state_machine::State;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn published_runnables(events: &[BusEvent]) -> Vec<&Runnable> {
    events
        .iter()
        .filter_map(|event| match event {
            BusEvent::RunnablePublished(runnable) => Some(runnable),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_run_lifecycle_end_to_end() {
    let mut h = Harness::new();
    let run = h.created_run().await;

    let built = h.run_manager.build(run).await.unwrap();
    assert_eq!(built.state(), State::Built);
    assert_eq!(built.spec.function.as_deref(), Some("main"));
    assert_eq!(built.spec.extra.get("image"), Some(&json!("python:3.11")));

    let ready = h.run_manager.run(built).await.unwrap();
    assert_eq!(ready.state(), State::Ready);

    let events = h.drain_events();
    let published = published_runnables(&events);
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].id, ready.id);
    assert_eq!(published[0].framework, FRAMEWORK);
    assert_eq!(published[0].state, State::Ready);
    let changed = events
        .iter()
        .filter(|e| matches!(e, BusEvent::EntityChanged(c) if c.action == EntityAction::Update))
        .count();
    assert_eq!(changed, 2);

    let report = published[0]
        .clone()
        .with_state(State::Running, Some("pod scheduled".to_string()));
    let running = h.run_manager.on_running(ready, Some(report)).await.unwrap();
    assert_eq!(running.state(), State::Running);
    assert_eq!(running.status.message.as_deref(), Some("pod scheduled"));

    let completed = h.run_manager.on_completed(running, None).await.unwrap();
    assert_eq!(completed.state(), State::Completed);
    assert_eq!(h.runtime.calls(), vec!["build", "run", "delete"]);

    let stored = h.stored_run(&completed.id).await.unwrap();
    assert_eq!(stored.state(), State::Completed);
    let history: Vec<State> = stored
        .status
        .transitions
        .unwrap()
        .iter()
        .map(|t| t.state)
        .collect();
    assert_eq!(
        history,
        vec![State::Built, State::Ready, State::Running, State::Completed]
    );
}

#[tokio::test]
async fn test_invalid_transition_is_a_no_op() {
    let mut h = Harness::new();
    let run = h.run_in_state(State::Completed).await;
    h.drain_events();

    let returned = h.run_manager.run(run.clone()).await.unwrap();
    assert_eq!(returned, run);

    let stored = h.stored_run(&run.id).await.unwrap();
    assert_eq!(
        serde_json::to_value(&stored.status).unwrap(),
        serde_json::to_value(&run.status).unwrap()
    );
    assert_eq!(stored.updated, run.updated);
    assert!(h.runtime.calls().is_empty());
    assert!(h.drain_events().is_empty());
}

#[tokio::test]
async fn test_transition_uses_persisted_state_over_caller_copy() {
    let h = Harness::new();
    let run = h.created_run().await;
    let stale = run.clone();

    h.run_manager.build(run).await.unwrap();

    // the caller still believes the run is CREATED
    let returned = h.run_manager.build(stale.clone()).await.unwrap();
    assert_eq!(returned, stale);
    assert_eq!(h.runtime.count("build"), 1);
    assert_eq!(h.stored_run(&stale.id).await.unwrap().state(), State::Built);
}

#[tokio::test]
async fn test_runtime_failure_surfaces_and_keeps_state() {
    let h = Harness::with_runtime(MockRuntime::new().with_failing_build(), Duration::from_secs(1));
    let run = h.created_run().await;

    let err = h.run_manager.build(run.clone()).await.unwrap_err();
    assert!(err.to_string().contains("registry unavailable"), "{err}");
    assert_eq!(h.stored_run(&run.id).await.unwrap().state(), State::Created);
}

#[tokio::test]
async fn test_stop_and_resume_publish_runnables() {
    let mut h = Harness::new();
    let run = h.run_in_state(State::Running).await;
    h.drain_events();

    let stopped = h.run_manager.stop(run).await.unwrap();
    assert_eq!(stopped.state(), State::Stopped);
    let resumed = h.run_manager.resume(stopped).await.unwrap();
    assert_eq!(resumed.state(), State::Running);

    let events = h.drain_events();
    let states: Vec<State> = published_runnables(&events).iter().map(|r| r.state).collect();
    assert_eq!(states, vec![State::Stopped, State::Running]);
}

#[tokio::test]
async fn test_repeated_terminal_report_cleans_up_once() {
    let mut h = Harness::new();
    let run = h.run_in_state(State::Running).await;

    let first = h.run_manager.on_completed(run.clone(), None).await.unwrap();
    let stored_before = h.stored_run(&run.id).await.unwrap();
    h.drain_events();

    let second = h.run_manager.on_completed(first.clone(), None).await.unwrap();

    assert_eq!(second.state(), State::Completed);
    assert_eq!(second.status, first.status);
    assert_eq!(h.runtime.count("delete"), 1);

    let stored_after = h.stored_run(&run.id).await.unwrap();
    assert_eq!(stored_after, stored_before);
    assert_eq!(stored_after.updated, stored_before.updated);
    assert!(!h
        .drain_events()
        .iter()
        .any(|e| matches!(e, BusEvent::EntityChanged(_))));
}

#[tokio::test]
async fn test_terminal_report_without_message_clears_previous_message() {
    let h = Harness::new();
    let run = h.run_in_state(State::Ready).await;
    let scheduled = Runnable::new(&run.id, FRAMEWORK, "python", &run.project, State::Running)
        .with_state(State::Running, Some("pod scheduled".to_string()));

    let running = h.run_manager.on_running(run, Some(scheduled)).await.unwrap();
    assert_eq!(running.status.message.as_deref(), Some("pod scheduled"));

    let completed = h.run_manager.on_completed(running, None).await.unwrap();
    assert_eq!(completed.state(), State::Completed);
    assert_eq!(completed.status.message, None);
    assert_eq!(h.stored_run(&completed.id).await.unwrap().status.message, None);
}

#[tokio::test]
async fn test_error_report_records_message() {
    let h = Harness::new();
    let run = h.run_in_state(State::Running).await;
    let runnable = Runnable::new(&run.id, FRAMEWORK, "python", &run.project, State::Error)
        .with_state(State::Error, Some("OOMKilled".to_string()));

    let failed = h.run_manager.on_error(run, Some(runnable)).await.unwrap();
    assert_eq!(failed.state(), State::Error);
    assert_eq!(failed.status.message.as_deref(), Some("OOMKilled"));
    assert_eq!(h.runtime.count("delete"), 1);
}

#[tokio::test]
async fn test_delete_without_runnable_reports_deleted() {
    let mut h = Harness::new();
    let run = h.run_in_state(State::Completed).await;
    h.drain_events();

    let deleting = h.run_manager.delete(run).await.unwrap();
    assert_eq!(deleting.state(), State::Deleting);

    let events = h.drain_events();
    let reports: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            BusEvent::RunnableChanged(report) => Some(report),
            _ => None,
        })
        .collect();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].id, deleting.id);
    assert_eq!(reports[0].state, State::Deleted);
    assert!(reports[0].runnable.is_none());
    assert!(published_runnables(&events).is_empty());

    let deleted = h.run_manager.on_deleted(deleting.clone(), None).await.unwrap();
    assert_eq!(deleted.state(), State::Deleted);
    assert!(h.stored_run(&deleting.id).await.is_none());

    // a duplicate report after removal changes nothing
    let again = h.run_manager.on_deleted(deleting.clone(), None).await.unwrap();
    assert_eq!(again, deleting);
}

#[tokio::test]
async fn test_delete_with_cleanup_runnable_publishes_it() {
    let mut h = Harness::with_runtime(
        MockRuntime::new().with_cleanup_runnable(),
        Duration::from_secs(1),
    );
    let run = h.run_in_state(State::Running).await;
    h.drain_events();

    let deleting = h.run_manager.delete(run).await.unwrap();
    assert_eq!(deleting.state(), State::Deleting);

    let events = h.drain_events();
    let published = published_runnables(&events);
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].state, State::Deleting);
    assert!(!events.iter().any(|e| matches!(e, BusEvent::RunnableChanged(_))));
}

#[tokio::test]
async fn test_deleted_report_outside_delete_flow_is_ignored() {
    let h = Harness::new();
    let run = h.run_in_state(State::Running).await;

    let returned = h.run_manager.on_deleted(run.clone(), None).await.unwrap();
    assert_eq!(returned.state(), State::Running);
    assert_eq!(h.stored_run(&run.id).await.unwrap().state(), State::Running);
}

#[tokio::test]
async fn test_build_without_task_is_ignored() {
    let h = Harness::new();
    let run = h
        .runs
        .create(Run::new("python+run", crate::common::PROJECT, RunSpec::default()))
        .await
        .unwrap();

    let returned = h.run_manager.build(run.clone()).await.unwrap();
    assert_eq!(returned.state(), State::Created);
    assert_eq!(h.runtime.count("build"), 0);
}

#[tokio::test]
async fn test_unknown_runtime_kind_is_an_error() {
    let h = Harness::new();
    let run = h
        .runs
        .create(Run::new("spark+run", crate::common::PROJECT, crate::common::run_spec()))
        .await
        .unwrap();

    let err = h.run_manager.build(run).await.unwrap_err();
    assert!(err.to_string().contains("spark"), "{err}");
}

/// Records every call and contributes a marker on `onRunning`
struct Observer {
    calls: AtomicUsize,
}

#[async_trait]
impl Processor<Run> for Observer {
    fn name(&self) -> &'static str {
        "observer"
    }

    fn stages(&self) -> Vec<String> {
        vec![State::Running.stage_key()]
    }

    async fn process(
        &self,
        _entity: &Run,
        runnable: Option<&Runnable>,
        _base: &Status,
    ) -> ProcessorResult<Option<Status>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut fragment = Status::base(State::Ready, Some("stale".to_string()))
            .with_extra("observed", json!(true));
        if let Some(runnable) = runnable {
            fragment = fragment.with_extra("framework", json!(runnable.framework));
        }
        Ok(Some(fragment))
    }
}

struct Broken;

#[async_trait]
impl Processor<Run> for Broken {
    fn name(&self) -> &'static str {
        "broken"
    }

    fn stages(&self) -> Vec<String> {
        vec!["onRunning".to_string()]
    }

    async fn process(
        &self,
        _entity: &Run,
        _runnable: Option<&Runnable>,
        _base: &Status,
    ) -> ProcessorResult<Option<Status>> {
        Err(ProcessorError::failed("broken", "metrics backend down"))
    }
}

#[tokio::test]
async fn test_processors_follow_stage_keys() {
    let h = Harness::new();
    let observer = Arc::new(Observer {
        calls: AtomicUsize::new(0),
    });
    h.run_processors.register(observer.clone());
    h.run_processors.register(Arc::new(Broken));

    let run = h.run_in_state(State::Ready).await;
    let report = Runnable::new(&run.id, FRAMEWORK, "python", &run.project, State::Running)
        .with_state(State::Running, Some("started".to_string()));
    let running = h.run_manager.on_running(run, Some(report)).await.unwrap();

    assert_eq!(observer.calls.load(Ordering::SeqCst), 1);
    // state and message from the transition beat the processor's stale values
    assert_eq!(running.state(), State::Running);
    assert_eq!(running.status.message.as_deref(), Some("started"));
    assert_eq!(running.status.extra.get("observed"), Some(&json!(true)));
    assert_eq!(running.status.extra.get("framework"), Some(&json!(FRAMEWORK)));

    // onStopped has no observer registered
    let stopped = h.run_manager.stop(running).await.unwrap();
    assert_eq!(stopped.state(), State::Stopped);
    assert_eq!(observer.calls.load(Ordering::SeqCst), 1);
}
