use std::sync::Arc;

use md2docx_launcher::supervisor::spawn::OsSpawner;
use md2docx_launcher::supervisor::{Supervisor, SupervisorState};
use md2docx_launcher::LaunchConfig;

fn test_supervisor() -> Supervisor {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = LaunchConfig::for_root(temp.path()).expect("config builds");
    Supervisor::new(Arc::new(config), Arc::new(OsSpawner))
}

#[test]
fn supervisor_starts_idle() {
    let supervisor = test_supervisor();
    assert_eq!(supervisor.state(), SupervisorState::Idle);
}

#[test]
fn state_subscription_sees_initial_state() {
    let supervisor = test_supervisor();
    let rx = supervisor.subscribe_state();
    assert_eq!(*rx.borrow(), SupervisorState::Idle);
}

#[test]
fn cancel_token_starts_uncancelled() {
    let supervisor = test_supervisor();
    assert!(!supervisor.cancel_token().is_cancelled());
}

#[test]
fn state_display_names() {
    assert_eq!(SupervisorState::Idle.to_string(), "idle");
    assert_eq!(SupervisorState::BackendStarting.to_string(), "backend starting");
    assert_eq!(SupervisorState::BackendReady.to_string(), "backend ready");
    assert_eq!(
        SupervisorState::FrontendStarting.to_string(),
        "frontend starting"
    );
    assert_eq!(SupervisorState::BothRunning.to_string(), "both running");
    assert_eq!(SupervisorState::ShuttingDown.to_string(), "shutting down");
    assert_eq!(SupervisorState::Terminated.to_string(), "terminated");
}

#[test]
fn missing_binaries_detected_before_spawn() {
    let supervisor = test_supervisor();
    let result = supervisor.verify_executables();
    assert!(result.is_err(), "empty project root has no binaries");
}
