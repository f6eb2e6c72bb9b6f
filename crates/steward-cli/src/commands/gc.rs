use super::{json_pretty, store_error, Context, EXIT_SUCCESS};
use steward_schema::Namespace;
use steward_store::GarbageCollector;

pub fn run(ctx: &Context, namespace: &str, dry_run: bool) -> Result<u8, String> {
    let report = GarbageCollector::new(&ctx.store)
        .collect_with_cancel(&Namespace::from(namespace), dry_run, steward_core::shutdown_requested)
        .map_err(store_error)?;

    if ctx.json {
        let orphaned: Vec<String> = report.orphaned.iter().map(ToString::to_string).collect();
        let payload = serde_json::json!({
            "dry_run": dry_run,
            "orphaned": orphaned,
            "removed": report.removed,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        let prefix = if dry_run { "would remove" } else { "removed" };
        let count = if dry_run {
            report.orphaned.len()
        } else {
            report.removed
        };
        println!("gc: {prefix} {count} orphaned resources");
        for object in &report.orphaned {
            println!("  {object}");
        }
    }
    Ok(EXIT_SUCCESS)
}
