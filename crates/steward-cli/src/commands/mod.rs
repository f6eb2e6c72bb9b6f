pub mod apply;
pub mod completions;
pub mod gc;
pub mod inspect;
pub mod reconcile;
pub mod status;
pub mod teardown;
pub mod watch;

use std::path::Path;
use steward_core::{CoreError, ReconcileReport, Reconciler};
use steward_schema::{
    parse_settings_file, ClusterConfig, ConfigError, ObjectRef, ReconcilerSettings, ResourceKind,
};
use steward_store::{FileStore, StoreError, TypedStore};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_CONFIG_ERROR: u8 = 2;
pub const EXIT_STORE_ERROR: u8 = 3;

/// Store, settings and output mode shared by every command.
pub struct Context {
    pub store: FileStore,
    pub settings: ReconcilerSettings,
    pub json: bool,
}

impl Context {
    pub fn open(store_path: &Path, settings: Option<&Path>, json: bool) -> Result<Self, String> {
        let settings = match settings {
            Some(path) => parse_settings_file(path).map_err(config_error)?,
            None => ReconcilerSettings::default(),
        };
        let store = FileStore::open(store_path).map_err(store_error)?;
        Ok(Self {
            store,
            settings,
            json,
        })
    }

    pub fn reconciler(&self) -> Reconciler<'_> {
        Reconciler::new(&self.store, self.settings.clone())
    }

    pub fn load_cluster(&self, name: &str, namespace: &str) -> Result<ClusterConfig, String> {
        self.store
            .get_as(&cluster_ref(name, namespace))
            .map_err(store_error)
    }
}

pub fn cluster_ref(name: &str, namespace: &str) -> ObjectRef {
    ObjectRef::new(ResourceKind::ClusterConfig, namespace, name)
}

pub fn config_error(e: ConfigError) -> String {
    format!("config error: {e}")
}

pub fn store_error(e: StoreError) -> String {
    format!("store error: {e}")
}

pub fn core_error(e: CoreError) -> String {
    match e {
        CoreError::Resource { .. } | CoreError::List { .. } => format!("store error: {e}"),
        other => other.to_string(),
    }
}

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn colorize_state(state: &str) -> String {
    use console::Style;
    match state {
        "in-sync" | "present" => Style::new().green().apply_to(state).to_string(),
        "created" => Style::new().cyan().apply_to(state).to_string(),
        "diverged" => Style::new().yellow().bold().apply_to(state).to_string(),
        "absent" | "deleted" => Style::new().dim().apply_to(state).to_string(),
        other => other.to_owned(),
    }
}

/// One-line human summary of a reconciliation pass.
pub fn print_report(report: &ReconcileReport) {
    println!(
        "{}: {}, {} created, {} patched, {} pruned, {} deleted, status {}",
        report.cluster,
        report.outcome,
        report.created.len(),
        report.patched_jobs(),
        report.pruned.len(),
        report.deleted.len(),
        if report.status_written {
            "updated"
        } else {
            "unchanged"
        }
    );
    for job in &report.jobs {
        if !job.patched.is_empty() {
            let fields: Vec<String> = job.patched.iter().map(ToString::to_string).collect();
            println!("  {} patched: {}", job.name, fields.join(", "));
        }
    }
}
