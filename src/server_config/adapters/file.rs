//! Instance registry backed by the manager home and sandbox directories.

use crate::config::ManagerPaths;
use crate::instance::InstanceName;
use crate::server_config::{
    domain::ServerConfigDocument,
    ports::{InstanceRegistry, InstanceRegistryError, InstanceRegistryResult},
};
use crate::storage::{DocumentLease, JsonDocumentFile};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

#[derive(Debug, Default, Deserialize)]
struct InstanceRegistryDocument {
    #[serde(default)]
    instances: Map<String, Value>,
}

/// Reads `registry.json` for instance names and each sandbox's desktop
/// configuration for server entries.
#[derive(Debug, Clone)]
pub struct FileInstanceRegistry {
    paths: ManagerPaths,
}

impl FileInstanceRegistry {
    /// Creates a registry rooted at `paths`.
    #[must_use]
    pub const fn new(paths: ManagerPaths) -> Self {
        Self { paths }
    }

    fn config_file(&self, instance: &InstanceName) -> JsonDocumentFile {
        JsonDocumentFile::new(self.paths.instance_config_path(instance))
    }
}

impl InstanceRegistry for FileInstanceRegistry {
    fn list_instances(&self) -> InstanceRegistryResult<Vec<InstanceName>> {
        let registry = JsonDocumentFile::new(self.paths.instance_registry_path())
            .read::<InstanceRegistryDocument>()
            .map_err(InstanceRegistryError::persistence)?
            .unwrap_or_default();

        let names = registry
            .instances
            .keys()
            .filter_map(|name| match InstanceName::new(name.as_str()) {
                Ok(instance) => Some(instance),
                Err(err) => {
                    warn!(name = %name, error = %err, "skipping unusable instance name");
                    None
                }
            })
            .collect();
        Ok(names)
    }

    fn load_server_config(
        &self,
        instance: &InstanceName,
    ) -> InstanceRegistryResult<Option<ServerConfigDocument>> {
        self.config_file(instance)
            .read()
            .map_err(InstanceRegistryError::persistence)
    }

    fn save_server_config(
        &self,
        instance: &InstanceName,
        document: &ServerConfigDocument,
    ) -> InstanceRegistryResult<()> {
        self.config_file(instance)
            .write(document)
            .map_err(InstanceRegistryError::persistence)
    }

    fn lock_server_config(&self, instance: &InstanceName) -> InstanceRegistryResult<DocumentLease> {
        self.config_file(instance)
            .lock_exclusive()
            .map_err(InstanceRegistryError::lock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server_config::domain::ServerLaunchConfig;
    use camino::Utf8PathBuf;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    struct Harness {
        _dir: TempDir,
        paths: ManagerPaths,
        registry: FileInstanceRegistry,
    }

    #[fixture]
    fn harness() -> Harness {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .expect("temp dir should be UTF-8");
        let paths = ManagerPaths::new(root.join("cmgr"), root.join("sandboxes"));
        Harness {
            _dir: dir,
            registry: FileInstanceRegistry::new(paths.clone()),
            paths,
        }
    }

    fn instance(name: &str) -> InstanceName {
        InstanceName::new(name).expect("valid instance name")
    }

    #[rstest]
    fn missing_registry_lists_nothing(harness: Harness) {
        let instances = harness
            .registry
            .list_instances()
            .expect("listing should succeed");

        assert!(instances.is_empty());
    }

    #[rstest]
    fn instance_names_come_from_registry_keys(harness: Harness) {
        std::fs::create_dir_all(harness.paths.home()).expect("home should be created");
        std::fs::write(
            harness.paths.instance_registry_path(),
            r#"{"instances": {"beta": {}, "alpha": {"created": "x"}, "../bad": {}, " gamma ": {}}}"#,
        )
        .expect("registry should be written");

        let instances = harness
            .registry
            .list_instances()
            .expect("listing should succeed");

        assert_eq!(instances, vec![instance("alpha"), instance("beta")]);
    }

    #[rstest]
    fn saved_document_lands_in_sandbox(harness: Harness) {
        let alpha = instance("alpha");
        let mut document = ServerConfigDocument::with_baseline_defaults();
        document.upsert_server("memory", ServerLaunchConfig::default());

        harness
            .registry
            .save_server_config(&alpha, &document)
            .expect("save should succeed");

        assert!(harness.paths.instance_config_path(&alpha).exists());
        let reloaded = harness
            .registry
            .load_server_config(&alpha)
            .expect("load should succeed");
        assert_eq!(reloaded, Some(document));
    }

    #[rstest]
    fn missing_document_is_none(harness: Harness) {
        let loaded = harness
            .registry
            .load_server_config(&instance("alpha"))
            .expect("load should succeed");

        assert!(loaded.is_none());
    }
}
