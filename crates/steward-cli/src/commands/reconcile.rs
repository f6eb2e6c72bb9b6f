use super::{cluster_ref, core_error, json_pretty, print_report, Context, EXIT_SUCCESS};

pub fn run(ctx: &Context, name: &str, namespace: &str) -> Result<u8, String> {
    let report = ctx
        .reconciler()
        .reconcile_stored(&cluster_ref(name, namespace))
        .map_err(core_error)?;
    if ctx.json {
        println!("{}", json_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(EXIT_SUCCESS)
}
