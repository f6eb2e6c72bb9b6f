use super::{core_error, json_pretty, Context, EXIT_SUCCESS};

pub fn run(ctx: &Context, name: &str, namespace: &str) -> Result<u8, String> {
    let cluster = ctx.load_cluster(name, namespace)?;
    let report = steward_core::teardown(&ctx.store, &cluster).map_err(core_error)?;

    if ctx.json {
        println!("{}", json_pretty(&report)?);
    } else if report.skipped {
        println!("{namespace}/{name} is unmanaged, nothing removed");
    } else {
        println!(
            "teardown: removed {}, {} already absent",
            report.deleted.len(),
            report.already_absent.len()
        );
        for object in &report.deleted {
            println!("  {object}");
        }
    }
    Ok(EXIT_SUCCESS)
}
