use std::path::PathBuf;

use md2docx_launcher::supervisor::process::{ProcessExit, ProcessRole, ProcessSpec, ProcessState};

#[test]
fn role_names_are_log_tags() {
    assert_eq!(ProcessRole::Backend.as_str(), "backend");
    assert_eq!(ProcessRole::Frontend.as_str(), "frontend");
    assert_eq!(ProcessRole::Backend.to_string(), "backend");
}

#[test]
fn process_state_display() {
    assert_eq!(ProcessState::NotStarted.to_string(), "not started");
    assert_eq!(ProcessState::Starting.to_string(), "starting");
    assert_eq!(ProcessState::Running.to_string(), "running");
    assert_eq!(ProcessState::Stopping.to_string(), "stopping");
    assert_eq!(ProcessState::Stopped.to_string(), "stopped");
}

#[test]
fn exit_display_phrasing() {
    assert_eq!(ProcessExit::Code(0).to_string(), "exited with code 0");
    assert_eq!(ProcessExit::Code(137).to_string(), "exited with code 137");
    assert_eq!(ProcessExit::Signal.to_string(), "terminated by signal");
    assert_eq!(ProcessExit::Unknown.to_string(), "exit status unknown");
}

#[test]
fn wait_error_maps_to_unknown() {
    let err = std::io::Error::other("wait failed");
    assert_eq!(ProcessExit::from_status(Err(err)), ProcessExit::Unknown);
}

#[cfg(unix)]
#[test]
fn exit_status_maps_to_code() {
    use std::os::unix::process::ExitStatusExt;
    use std::process::ExitStatus;

    // Raw wait status: exit code lives in the high byte.
    let ok = ExitStatus::from_raw(0);
    assert_eq!(ProcessExit::from_status(Ok(ok)), ProcessExit::Code(0));

    let three = ExitStatus::from_raw(3 << 8);
    assert_eq!(ProcessExit::from_status(Ok(three)), ProcessExit::Code(3));
}

#[cfg(unix)]
#[test]
fn signal_death_maps_to_signal() {
    use std::os::unix::process::ExitStatusExt;
    use std::process::ExitStatus;

    // Raw wait status 15 == killed by SIGTERM, no exit code.
    let sigterm = ExitStatus::from_raw(15);
    assert_eq!(ProcessExit::from_status(Ok(sigterm)), ProcessExit::Signal);
}

#[test]
fn spec_carries_launch_parameters() {
    let spec = ProcessSpec {
        role: ProcessRole::Backend,
        program: PathBuf::from("/opt/md2docx/md2docx-server"),
        args: vec!["--port".into(), "8080".into()],
        workdir: PathBuf::from("/opt/md2docx"),
    };

    assert_eq!(spec.role, ProcessRole::Backend);
    assert_eq!(spec.program, PathBuf::from("/opt/md2docx/md2docx-server"));
    assert_eq!(spec.args.len(), 2);
    assert_eq!(spec.workdir, PathBuf::from("/opt/md2docx"));
}
