use super::{colorize_state, json_pretty, store_error, Context, EXIT_SUCCESS};
use serde::Serialize;
use steward_core::{desired_job, diff_scheduled_job, DriftField, JobStream};
use steward_schema::{CurationMode, Object, Resource, ResourceKind, ScheduledJob};
use steward_store::ResourceStore;

#[derive(Debug, Serialize)]
struct Row {
    kind: ResourceKind,
    name: String,
    state: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    drift: Vec<DriftField>,
}

pub fn run(ctx: &Context, name: &str, namespace: &str) -> Result<u8, String> {
    let cluster = ctx.load_cluster(name, namespace)?;
    let curator = match cluster.curation_mode() {
        CurationMode::Curator(spec) => Some(spec),
        CurationMode::Disabled | CurationMode::Unsupported(_) => None,
    };

    let mut rows = Vec::new();
    for kind in ResourceKind::MANAGED {
        let resources = ctx
            .store
            .list(kind, &cluster.metadata.namespace)
            .map_err(store_error)?;
        for resource in resources {
            let owned = cluster
                .metadata
                .uid
                .as_ref()
                .is_some_and(|uid| resource.meta().is_owned_by(uid));
            if !owned {
                continue;
            }
            let name = resource.meta().name.to_string();
            let drift = match (&resource, curator) {
                (Resource::ScheduledJob(live), Some(spec)) => job_drift(ctx, &cluster, spec, live),
                _ => None,
            };
            let (state, drift) = match drift {
                Some(fields) if fields.is_empty() => ("in-sync", fields),
                Some(fields) => ("diverged", fields),
                None => ("present", Vec::new()),
            };
            rows.push(Row {
                kind,
                name,
                state,
                drift,
            });
        }
    }

    if ctx.json {
        println!("{}", json_pretty(&rows)?);
    } else if rows.is_empty() {
        println!("no managed resources found for {namespace}/{name}");
    } else {
        println!("{:<18} {:<16} STATE", "KIND", "NAME");
        for row in &rows {
            let mut state = colorize_state(row.state);
            if !row.drift.is_empty() {
                let fields: Vec<String> = row.drift.iter().map(ToString::to_string).collect();
                state = format!("{state} ({})", fields.join(", "));
            }
            println!("{:<18} {:<16} {state}", row.kind.as_str(), row.name);
        }
    }
    Ok(EXIT_SUCCESS)
}

/// Drifted fields of a live job, or `None` when it is not one of ours.
fn job_drift(
    ctx: &Context,
    cluster: &steward_schema::ClusterConfig,
    spec: &steward_schema::CuratorSpec,
    live: &ScheduledJob,
) -> Option<Vec<DriftField>> {
    let stream = JobStream::from_job_name(live.object_ref().name.as_str())?;
    let desired = desired_job(cluster, spec, &ctx.settings.curator_image, stream);
    Some(diff_scheduled_job(live, &desired).fields)
}
