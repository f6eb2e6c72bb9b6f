use super::{cluster_ref, json_pretty, print_report, Context, EXIT_SUCCESS};
use std::time::Duration;
use steward_core::{shutdown_requested, sleep_unless_shutdown};
use tracing::{info, warn};

/// Reconcile every `interval` seconds until Ctrl-C. A failed pass is logged
/// and retried on the next tick.
pub fn run(ctx: &Context, name: &str, namespace: &str, interval: u64) -> Result<u8, String> {
    let object = cluster_ref(name, namespace);
    let reconciler = ctx.reconciler();
    let interval = Duration::from_secs(interval);
    info!("watching {object} every {interval:?}");

    while !shutdown_requested() {
        match reconciler.reconcile_stored(&object) {
            Ok(report) if ctx.json => println!("{}", json_pretty(&report)?),
            Ok(report) => print_report(&report),
            Err(e) => warn!("reconciliation of {object} failed: {e}"),
        }
        if !sleep_unless_shutdown(interval) {
            break;
        }
    }
    info!("stopped watching {object}");
    Ok(EXIT_SUCCESS)
}
