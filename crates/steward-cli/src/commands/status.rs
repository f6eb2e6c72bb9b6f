use super::{json_pretty, Context, EXIT_SUCCESS};

pub fn run(ctx: &Context, name: &str, namespace: &str) -> Result<u8, String> {
    let cluster = ctx.load_cluster(name, namespace)?;
    let entries = &cluster.status.curation.curator_status;
    if ctx.json {
        println!("{}", json_pretty(&cluster.status)?);
    } else if entries.is_empty() {
        println!("no curation jobs reported");
    } else {
        println!("{:<16} {:<24} SUSPENDED", "JOB", "SCHEDULE");
        for entry in entries {
            println!(
                "{:<16} {:<24} {}",
                entry.cron_job, entry.schedule, entry.suspended
            );
        }
    }
    Ok(EXIT_SUCCESS)
}
