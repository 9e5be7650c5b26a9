use crate::common::{MockActuator, PROJECT};
use runplane_core::models::{Status, Trigger, TriggerSpec};
use runplane_core::state_machine::{
    StateMachineError, State, TriggerContext, TriggerEvent, TriggerStateMachineFactory,
};
use serde_json::{json, Map};
use std::sync::Arc;

fn trigger(task: &str) -> Trigger {
    Trigger::new(
        "scheduler",
        PROJECT,
        TriggerSpec {
            task: task.to_string(),
            function: None,
            template: Map::new(),
            extra: Map::new(),
        },
    )
}

#[tokio::test]
async fn test_run_starts_actuator() {
    let factory = TriggerStateMachineFactory::new().unwrap();
    let ctx = TriggerContext::new(trigger("python+job://demo/train"), Arc::new(MockActuator));

    let mut fsm = factory.create(State::Created, ctx);
    let fragment = fsm.perform(TriggerEvent::Run, None).await.unwrap().unwrap();

    assert_eq!(fsm.current_state(), State::Ready);
    assert_eq!(fragment.extra.get("scheduler"), Some(&json!("active")));
}

#[tokio::test]
async fn test_run_without_task_is_rejected_by_guard() {
    let factory = TriggerStateMachineFactory::new().unwrap();
    let ctx = TriggerContext::new(trigger("  "), Arc::new(MockActuator));

    let mut fsm = factory.create(State::Created, ctx);
    let err = fsm.perform(TriggerEvent::Run, None).await.unwrap_err();

    assert!(matches!(err, StateMachineError::InvalidTransition { .. }));
    assert_eq!(fsm.current_state(), State::Created);
}

#[tokio::test]
async fn test_fire_merges_details_over_actuator_fragment() {
    let factory = TriggerStateMachineFactory::new().unwrap();
    let ctx = TriggerContext::new(trigger("python+job://demo/train"), Arc::new(MockActuator));
    let details = Status::default()
        .with_extra("fired", json!("manual"))
        .with_extra("cron", json!("0 * * * *"));

    let mut fsm = factory.create(State::Ready, ctx);
    let fragment = fsm
        .perform(TriggerEvent::Fire, Some(&details))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(fsm.current_state(), State::Ready);
    assert_eq!(fragment.extra.get("fired"), Some(&json!("manual")));
    assert_eq!(fragment.extra.get("cron"), Some(&json!("0 * * * *")));
}

#[tokio::test]
async fn test_fire_outside_ready_is_invalid() {
    let factory = TriggerStateMachineFactory::new().unwrap();

    for state in [State::Created, State::Stopped, State::Error] {
        let ctx = TriggerContext::new(trigger("python+job://demo/train"), Arc::new(MockActuator));
        let mut fsm = factory.create(state, ctx);
        let err = fsm.perform(TriggerEvent::Fire, None).await.unwrap_err();
        assert!(matches!(err, StateMachineError::InvalidTransition { .. }), "{state}");
    }
}

#[tokio::test]
async fn test_stop_and_restart() {
    let factory = TriggerStateMachineFactory::new().unwrap();
    let ctx = TriggerContext::new(trigger("python+job://demo/train"), Arc::new(MockActuator));

    let mut fsm = factory.create(State::Ready, ctx);
    let fragment = fsm.perform(TriggerEvent::Stop, None).await.unwrap().unwrap();
    assert_eq!(fsm.current_state(), State::Stopped);
    assert_eq!(fragment.extra.get("scheduler"), Some(&json!("stopped")));

    fsm.perform(TriggerEvent::Run, None).await.unwrap();
    assert_eq!(fsm.current_state(), State::Ready);
}
