use super::{config_error, json_pretty, store_error, Context, EXIT_SUCCESS};
use std::path::Path;
use steward_schema::{parse_cluster_file, ClusterConfig, Object};
use steward_store::{ResourceStore, TypedStore};

/// Create the cluster configuration, or replace the spec of the stored one
/// while keeping its identity and status.
pub fn run(ctx: &Context, path: &Path) -> Result<u8, String> {
    let mut cluster = parse_cluster_file(path).map_err(config_error)?;
    let object = cluster.object_ref();

    let action = match ctx.store.get_as::<ClusterConfig>(&object) {
        Ok(existing) => {
            cluster.metadata.uid = existing.metadata.uid;
            cluster.metadata.resource_version = existing.metadata.resource_version;
            cluster.metadata.creation_timestamp = existing.metadata.creation_timestamp;
            cluster.status = existing.status;
            ctx.store.update(&cluster.into()).map_err(store_error)?;
            "updated"
        }
        Err(e) if e.is_not_found() => {
            ctx.store.create(&cluster.into()).map_err(store_error)?;
            "created"
        }
        Err(e) => return Err(store_error(e)),
    };

    if ctx.json {
        let payload = serde_json::json!({
            "cluster": object.qualified_name(),
            "action": action,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("{action} {object}");
    }
    Ok(EXIT_SUCCESS)
}
