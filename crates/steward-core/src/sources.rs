use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Source file in the config directory and the bundle key it is stored under.
pub const CONFIG_FILES: [(&str, &str); 3] = [
    ("curator-actions.yaml", "actions.yaml"),
    ("curator5-config.yaml", "curator5.yaml"),
    ("curator-config.yaml", "config.yaml"),
];

/// Credential file in the working directory and the bundle keys it fills.
pub const CREDENTIAL_FILES: [(&str, [&str; 2]); 3] = [
    ("ca.crt", ["ca", "ops-ca"]),
    ("system.logging.curator.key", ["key", "ops-key"]),
    ("system.logging.curator.crt", ["cert", "ops-cert"]),
];

/// File contents copied verbatim into the configuration and credential bundles.
///
/// Loaded once per pass so the factory stays free of I/O.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleSources {
    pub config_files: BTreeMap<String, String>,
    pub credentials: BTreeMap<String, Vec<u8>>,
}

impl BundleSources {
    /// Read every known source file. Missing or unreadable files are logged and
    /// contribute empty contents so the bundles are still created.
    pub fn load(config_dir: &Path, working_dir: &Path) -> Self {
        let mut sources = Self::default();
        for (file, key) in CONFIG_FILES {
            let bytes = read_or_empty(&config_dir.join(file));
            sources
                .config_files
                .insert(key.to_owned(), String::from_utf8_lossy(&bytes).into_owned());
        }
        for (file, keys) in CREDENTIAL_FILES {
            let bytes = read_or_empty(&working_dir.join(file));
            for key in keys {
                sources.credentials.insert(key.to_owned(), bytes.clone());
            }
        }
        sources
    }

    pub fn config_data(&self) -> BTreeMap<String, String> {
        self.config_files.clone()
    }

    pub fn credential_data(&self) -> BTreeMap<String, Vec<u8>> {
        self.credentials.clone()
    }
}

fn read_or_empty(path: &Path) -> Vec<u8> {
    match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("unable to read '{}': {e}", path.display());
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_and_maps_keys() {
        let config = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        fs::write(config.path().join("curator-actions.yaml"), "actions: {}\n").unwrap();
        fs::write(config.path().join("curator-config.yaml"), "days: 30\n").unwrap();
        fs::write(work.path().join("ca.crt"), b"CA").unwrap();
        fs::write(work.path().join("system.logging.curator.key"), b"KEY").unwrap();

        let s = BundleSources::load(config.path(), work.path());
        assert_eq!(s.config_files["actions.yaml"], "actions: {}\n");
        assert_eq!(s.config_files["config.yaml"], "days: 30\n");
        assert_eq!(s.credentials["ca"], b"CA");
        assert_eq!(s.credentials["ops-ca"], b"CA");
        assert_eq!(s.credentials["key"], b"KEY");
        assert_eq!(s.credentials["ops-key"], b"KEY");
    }

    #[test]
    fn missing_files_become_empty_entries() {
        let empty = tempfile::tempdir().unwrap();
        let s = BundleSources::load(empty.path(), empty.path());
        assert_eq!(s.config_files.len(), 3);
        assert!(s.config_files["curator5.yaml"].is_empty());
        assert_eq!(s.credentials.len(), 6);
        assert!(s.credentials["cert"].is_empty());
        assert!(s.credentials["ops-cert"].is_empty());
    }
}
