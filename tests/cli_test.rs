use plugin_host::api::testing::{CallLog, ScriptedPlugin};
use plugin_host::cli::CliApp;
use plugin_host::PluginCatalog;
use rstest::rstest;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn workspace(temp_dir: &TempDir) -> std::path::PathBuf {
    let root = temp_dir.path();
    let config = root.join("plugin-host.yaml");

    write(
        &config,
        &format!(
            r#"
version: "1.0"
discovery:
  packages_directory: {root}/node_modules
  local_directory: {root}/plugins
publish:
  base_directory: {root}/app
app:
  blog:
    per_page: 25
"#,
            root = root.display()
        ),
    );

    write(
        &root.join("plugins/blog/index.yaml"),
        r#"
name: blog
version: 1.0.0
hooks: blog
config:
  key: blog
  defaults:
    per_page: 10
publishable:
  - source: config/blog.yaml
    destination: config/blog.yaml
    tag: config
"#,
    );
    write(&root.join("plugins/blog/config/blog.yaml"), "per_page: 10\n");

    config
}

fn catalog(log: &CallLog) -> PluginCatalog {
    PluginCatalog::new().with_hooks(
        "blog",
        Arc::new(ScriptedPlugin::new("blog", log).with_command("blog:stats")),
    )
}

#[tokio::test]
async fn test_boot_command_runs_full_lifecycle() {
    let temp_dir = TempDir::new().unwrap();
    let config = workspace(&temp_dir);
    let log = CallLog::new();

    CliApp::run_from(
        ["plugin-host", "--config", config.to_str().unwrap(), "boot"],
        catalog(&log),
    )
    .await
    .unwrap();

    assert_eq!(
        log.all().await,
        vec![
            "register:blog",
            "commands:blog",
            "boot:blog",
            "routes:blog",
            "schedule:blog",
            "health:blog",
            "shutdown:blog",
        ]
    );
}

#[tokio::test]
async fn test_publish_command_copies_into_base_directory() {
    let temp_dir = TempDir::new().unwrap();
    let config = workspace(&temp_dir);
    let log = CallLog::new();

    CliApp::run_from(
        [
            "plugin-host",
            "--config",
            config.to_str().unwrap(),
            "publish",
            "--tag",
            "config",
        ],
        catalog(&log),
    )
    .await
    .unwrap();

    let published = temp_dir.path().join("app/config/blog.yaml");
    assert_eq!(fs::read_to_string(published).unwrap(), "per_page: 10\n");
}

#[tokio::test]
async fn test_plugin_command_runs_with_plugins_booted() {
    let temp_dir = TempDir::new().unwrap();
    let config = workspace(&temp_dir);
    let log = CallLog::new();

    CliApp::run_from(
        ["plugin-host", "--config", config.to_str().unwrap(), "blog:stats"],
        catalog(&log),
    )
    .await
    .unwrap();

    let calls = log.all().await;
    assert!(calls.contains(&"boot:blog".to_string()));
    assert_eq!(calls.last().map(String::as_str), Some("shutdown:blog"));
}

#[rstest]
#[case("list")]
#[case("health")]
#[case("events")]
#[tokio::test]
async fn test_builtin_commands_shut_plugins_down(#[case] command: &str) {
    let temp_dir = TempDir::new().unwrap();
    let config = workspace(&temp_dir);
    let log = CallLog::new();

    CliApp::run_from(
        ["plugin-host", "--config", config.to_str().unwrap(), command],
        catalog(&log),
    )
    .await
    .unwrap();

    let calls = log.all().await;
    assert!(calls.contains(&"boot:blog".to_string()));
    assert_eq!(calls.last().map(String::as_str), Some("shutdown:blog"));
}
