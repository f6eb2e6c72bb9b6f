//! CLI subprocess integration tests.
//!
//! These tests invoke the `steward` binary against a temporary directory
//! store and check exit codes, stdout content, and JSON output.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use steward_schema::{ObjectRef, ResourceKind, ScheduledJob};
use steward_store::{FileStore, ResourceStore, TypedStore};

struct Fixture {
    store: tempfile::TempDir,
    project: tempfile::TempDir,
}

impl Fixture {
    fn new() -> Self {
        let fixture = Self {
            store: tempfile::tempdir().unwrap(),
            project: tempfile::tempdir().unwrap(),
        };
        let files = fixture.project.path().join("files");
        std::fs::create_dir_all(&files).unwrap();
        std::fs::write(files.join("curator-config.yaml"), "days: 30\n").unwrap();
        std::fs::write(
            fixture.project.path().join("settings.toml"),
            format!(
                "curator_image = \"logging-curator:v1\"\nconfig_dir = \"{}\"\nworking_dir = \"{}\"\n",
                files.display(),
                fixture.project.path().display()
            ),
        )
        .unwrap();
        fixture
    }

    fn settings(&self) -> PathBuf {
        self.project.path().join("settings.toml")
    }

    fn write_cluster(&self, body: &str) -> PathBuf {
        let path = self.project.path().join("cluster.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    fn run(&self, args: &[&str]) -> Output {
        let store = self.store.path().to_string_lossy().into_owned();
        let settings = self.settings().to_string_lossy().into_owned();
        Command::new(env!("CARGO_BIN_EXE_steward"))
            .env_remove("STEWARD_LOG")
            .args(["--store", &store, "--settings", &settings])
            .args(args)
            .output()
            .unwrap()
    }

    fn file_store(&self) -> FileStore {
        FileStore::open(self.store.path()).unwrap()
    }
}

const CURATED: &str = r#"
[metadata]
name = "instance"
namespace = "openshift-logging"

[spec.curation]
type = "curator"
"#;

const DISABLED: &str = r#"
[metadata]
name = "instance"
namespace = "openshift-logging"
"#;

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn assert_ok(output: &Output) {
    assert!(
        output.status.success(),
        "exit {:?}. stderr: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[test]
fn cli_version_exits_zero() {
    let output = Command::new(env!("CARGO_BIN_EXE_steward"))
        .arg("--version")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).contains("steward"));
}

#[test]
fn cli_help_lists_commands() {
    let output = Command::new(env!("CARGO_BIN_EXE_steward"))
        .arg("--help")
        .output()
        .unwrap();
    assert!(output.status.success());
    let text = stdout(&output);
    for command in ["apply", "reconcile", "watch", "teardown", "status", "inspect", "gc"] {
        assert!(text.contains(command), "help must list '{command}'");
    }
}

#[test]
fn cli_completions_bash() {
    let output = Command::new(env!("CARGO_BIN_EXE_steward"))
        .args(["completions", "bash"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).contains("steward"));
}

#[test]
fn cli_apply_reconcile_status() {
    let fx = Fixture::new();
    let cluster = fx.write_cluster(CURATED);

    let applied = fx.run(&["--json", "apply", &path_arg(&cluster)]);
    assert_ok(&applied);
    assert_eq!(json(&applied)["action"], "created");

    let first = fx.run(&["--json", "reconcile"]);
    assert_ok(&first);
    let report = json(&first);
    assert_eq!(report["outcome"], "applied");
    assert_eq!(report["created"].as_array().unwrap().len(), 4);
    assert_eq!(report["status_written"], true);

    let second = fx.run(&["--json", "reconcile"]);
    assert_ok(&second);
    let report = json(&second);
    assert!(report["created"].as_array().unwrap().is_empty());
    assert_eq!(report["status_written"], false);

    let status = fx.run(&["--json", "status"]);
    assert_ok(&status);
    let entries = &json(&status)["curation"]["curator_status"];
    assert_eq!(entries[0]["cron_job"], "curator");
    assert_eq!(entries[0]["schedule"], "30 3,9,15,21 * * *");
}

#[test]
fn cli_reapply_keeps_status() {
    let fx = Fixture::new();
    let cluster = fx.write_cluster(CURATED);
    assert_ok(&fx.run(&["apply", &path_arg(&cluster)]));
    assert_ok(&fx.run(&["reconcile"]));

    let again = fx.run(&["--json", "apply", &path_arg(&cluster)]);
    assert_ok(&again);
    assert_eq!(json(&again)["action"], "updated");

    let status = fx.run(&["--json", "status"]);
    assert_eq!(
        json(&status)["curation"]["curator_status"]
            .as_array()
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn cli_inspect_reports_drift() {
    let fx = Fixture::new();
    let cluster = fx.write_cluster(CURATED);
    assert_ok(&fx.run(&["apply", &path_arg(&cluster)]));
    assert_ok(&fx.run(&["reconcile"]));

    let store = fx.file_store();
    let object = ObjectRef::new(ResourceKind::ScheduledJob, "openshift-logging", "curator");
    let mut job: ScheduledJob = store.get_as(&object).unwrap();
    job.spec.schedule = "0 0 * * *".to_owned();
    store.update(&job.into()).unwrap();

    let inspect = fx.run(&["--json", "inspect"]);
    assert_ok(&inspect);
    let rows = json(&inspect);
    let job_row = rows
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["kind"] == "ScheduledJob")
        .unwrap();
    assert_eq!(job_row["state"], "diverged");
    assert_eq!(job_row["drift"][0], "schedule");

    let fixed = fx.run(&["reconcile"]);
    assert_ok(&fixed);
    assert!(stdout(&fixed).contains("curator patched: schedule"));
}

#[test]
fn cli_disable_tears_down() {
    let fx = Fixture::new();
    let cluster = fx.write_cluster(CURATED);
    assert_ok(&fx.run(&["apply", &path_arg(&cluster)]));
    assert_ok(&fx.run(&["reconcile"]));

    let disabled = fx.write_cluster(DISABLED);
    assert_ok(&fx.run(&["apply", &path_arg(&disabled)]));
    let output = fx.run(&["--json", "reconcile"]);
    assert_ok(&output);
    assert_eq!(json(&output)["outcome"], "torn-down");

    let store = fx.file_store();
    assert!(store
        .list(ResourceKind::ScheduledJob, &"openshift-logging".into())
        .unwrap()
        .is_empty());

    let again = fx.run(&["teardown"]);
    assert_ok(&again);
    assert!(stdout(&again).contains("removed 0"));
}

#[test]
fn cli_gc_dry_run_reports_orphans() {
    let fx = Fixture::new();
    let cluster = fx.write_cluster(CURATED);
    assert_ok(&fx.run(&["apply", &path_arg(&cluster)]));
    assert_ok(&fx.run(&["reconcile"]));

    let store = fx.file_store();
    store
        .delete(&ObjectRef::new(
            ResourceKind::ClusterConfig,
            "openshift-logging",
            "instance",
        ))
        .unwrap();

    let dry = fx.run(&["--json", "gc", "--dry-run"]);
    assert_ok(&dry);
    let report = json(&dry);
    assert_eq!(report["orphaned"].as_array().unwrap().len(), 4);
    assert_eq!(report["removed"], 0);

    let real = fx.run(&["--json", "gc"]);
    assert_ok(&real);
    assert_eq!(json(&real)["removed"], 4);
}

#[test]
fn cli_bad_cluster_file_exits_with_config_code() {
    let fx = Fixture::new();
    let cluster = fx.write_cluster("[metadata]\nname = \"\"\nnamespace = \"x\"\n");
    let output = fx.run(&["apply", &path_arg(&cluster)]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("config error"));
}

#[test]
fn cli_status_of_missing_cluster_exits_with_store_code() {
    let fx = Fixture::new();
    let output = fx.run(&["status", "--name", "nobody"]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn cli_reconcile_missing_cluster_is_skipped() {
    let fx = Fixture::new();
    let output = fx.run(&["--json", "reconcile"]);
    assert_ok(&output);
    assert!(json(&output)["outcome"]["skipped"].is_string());
}
