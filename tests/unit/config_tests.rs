use std::time::Duration;

use md2docx_launcher::LaunchConfig;

fn sample_toml(root: &str) -> String {
    format!(
        r#"
project_root = '{root}'

[backend]
binary = "md2docx-server"
port = 9090

[frontend]
binary = "frontend/md2docx-gui"

[timing]
startup_delay_ms = 100
poll_interval_ms = 50
probe_timeout_ms = 200
grace_period_ms = 300
"#
    )
}

#[test]
fn parses_valid_config() {
    let temp = tempfile::tempdir().expect("tempdir");
    let toml = sample_toml(temp.path().to_str().expect("utf8 path"));

    let config = LaunchConfig::from_toml_str(&toml).expect("config parses");

    assert_eq!(config.backend.port, 9090);
    assert_eq!(config.health_url(), "http://127.0.0.1:9090/api/health");
    assert_eq!(config.startup_delay(), Duration::from_millis(100));
    assert_eq!(config.poll_interval(), Duration::from_millis(50));
    assert_eq!(config.probe_timeout(), Duration::from_millis(200));
    assert_eq!(config.grace_period(), Duration::from_millis(300));

    let root = temp.path().canonicalize().expect("canonicalize temp path");
    assert_eq!(config.project_root, root);
    assert_eq!(config.backend_binary(), root.join("md2docx-server"));
    assert_eq!(config.frontend_binary(), root.join("frontend/md2docx-gui"));
}

#[test]
fn defaults_apply_when_sections_absent() {
    let temp = tempfile::tempdir().expect("tempdir");
    let toml = format!("project_root = '{}'\n", temp.path().to_str().expect("utf8"));

    let config = LaunchConfig::from_toml_str(&toml).expect("config parses");

    assert_eq!(config.backend.port, 8080);
    assert_eq!(config.startup_delay(), Duration::from_millis(2000));
    assert_eq!(config.poll_interval(), Duration::from_millis(1000));
    assert_eq!(config.grace_period(), Duration::from_millis(2000));

    let root = temp.path().canonicalize().expect("canonicalize");
    assert_eq!(config.backend_binary(), root.join("md2docx-server"));
    assert!(
        config
            .frontend_binary()
            .to_string_lossy()
            .contains("qt-frontend"),
        "default frontend binary should live under qt-frontend"
    );
}

#[test]
fn for_root_builds_default_config() {
    let temp = tempfile::tempdir().expect("tempdir");

    let config = LaunchConfig::for_root(temp.path()).expect("config builds");

    assert_eq!(config.backend.port, 8080);
    assert_eq!(
        config.project_root,
        temp.path().canonicalize().expect("canonicalize")
    );
}

#[test]
#[serial_test::serial]
fn for_root_dot_resolves_to_cwd() {
    let config = LaunchConfig::for_root(".").expect("cwd exists");
    let cwd = std::env::current_dir()
        .expect("cwd")
        .canonicalize()
        .expect("canonicalize cwd");
    assert_eq!(config.project_root, cwd);
}

#[test]
fn backend_runs_in_project_root() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = LaunchConfig::for_root(temp.path()).expect("config builds");

    assert_eq!(config.backend_workdir(), config.project_root);
}

#[test]
fn frontend_runs_in_its_binary_directory() {
    let temp = tempfile::tempdir().expect("tempdir");
    let toml = sample_toml(temp.path().to_str().expect("utf8"));
    let config = LaunchConfig::from_toml_str(&toml).expect("config parses");

    let root = temp.path().canonicalize().expect("canonicalize");
    assert_eq!(config.frontend_workdir(), root.join("frontend"));
}

#[test]
fn absolute_binary_path_is_not_rejoined() {
    let temp = tempfile::tempdir().expect("tempdir");
    let binary = temp.path().join("elsewhere/md2docx-server");
    let toml = format!(
        r#"
project_root = '{root}'

[backend]
binary = '{binary}'
"#,
        root = temp.path().to_str().expect("utf8"),
        binary = binary.to_str().expect("utf8"),
    );

    let config = LaunchConfig::from_toml_str(&toml).expect("config parses");
    assert_eq!(config.backend_binary(), binary);
}

#[test]
fn rejects_zero_port() {
    let temp = tempfile::tempdir().expect("tempdir");
    let toml = format!(
        "project_root = '{}'\n\n[backend]\nport = 0\n",
        temp.path().to_str().expect("utf8")
    );

    let result = LaunchConfig::from_toml_str(&toml);
    assert!(result.is_err());
}

#[test]
fn rejects_zero_poll_interval() {
    let temp = tempfile::tempdir().expect("tempdir");
    let toml = format!(
        "project_root = '{}'\n\n[timing]\npoll_interval_ms = 0\n",
        temp.path().to_str().expect("utf8")
    );

    let result = LaunchConfig::from_toml_str(&toml);
    assert!(result.is_err());
}

#[test]
fn rejects_zero_grace_period() {
    let temp = tempfile::tempdir().expect("tempdir");
    let toml = format!(
        "project_root = '{}'\n\n[timing]\ngrace_period_ms = 0\n",
        temp.path().to_str().expect("utf8")
    );

    let result = LaunchConfig::from_toml_str(&toml);
    assert!(result.is_err());
}

#[test]
fn rejects_nonexistent_project_root() {
    let toml = "project_root = '/definitely/not/a/real/md2docx/root'\n";

    let result = LaunchConfig::from_toml_str(toml);
    assert!(result.is_err());
}

#[test]
fn rejects_invalid_field_type() {
    let temp = tempfile::tempdir().expect("tempdir");
    let toml = format!(
        "project_root = '{}'\n\n[backend]\nport = \"not-a-number\"\n",
        temp.path().to_str().expect("utf8")
    );

    let result = LaunchConfig::from_toml_str(&toml);
    assert!(result.is_err());
}

#[test]
fn load_from_missing_file_fails() {
    let temp = tempfile::tempdir().expect("tempdir");
    let result = LaunchConfig::load_from_path(temp.path().join("launch.toml"));
    assert!(result.is_err());
}
